/// XORs `payload` in place with the 4-byte `mask`.
///
/// Masking is its own inverse: applying it twice with the same key restores the input.
pub fn unmask(payload: &mut [u8], mask: [u8; 4]) {
    for (i, byte) in payload.iter_mut().enumerate() {
        *byte ^= mask[i & 3];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masking_is_its_own_inverse() {
        let original = *b"Hello, Webhouse!";
        let mask = [0x37, 0xfa, 0x21, 0x3d];

        let mut payload = original;

        unmask(&mut payload, mask);
        assert_ne!(payload, original);

        unmask(&mut payload, mask);
        assert_eq!(payload, original);
    }

    #[test]
    fn rfc_example() {
        // RFC 6455 section 5.7, a single-frame masked text message containing "Hello".
        let mut payload = [0x7f, 0x9f, 0x4d, 0x51, 0x58];

        unmask(&mut payload, [0x37, 0xfa, 0x21, 0x3d]);

        assert_eq!(&payload, b"Hello");
    }
}
