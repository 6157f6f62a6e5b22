//! Opening handshake: `Sec-WebSocket-Key` extraction and `Sec-WebSocket-Accept` derivation.

use core::fmt;

use base64::{Engine as _, engine::general_purpose};
use rand_core::RngCore;
use sha1::{Digest, Sha1};

use crate::error::HandshakeError;

/// The GUID every server appends to the client's key before hashing.
pub const MAGIC_GUID: &str = "258EAFA5-E914-47DA-95CA-C5AB0DC85B11";

/// The header whose value is the client's key.
pub const SEC_KEY_HEADER: &str = "Sec-WebSocket-Key";

/// Base64 of the SHA-1 digest of `key ++ MAGIC_GUID`. Always 28 characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AcceptToken(String);

impl AcceptToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AcceptToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for AcceptToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Derives the accept token for `key`. Pure and deterministic.
pub fn compute_accept_token(key: &str) -> Result<AcceptToken, HandshakeError> {
    if key.is_empty() {
        return Err(HandshakeError::InvalidKey);
    }

    let mut sha1 = Sha1::new();

    sha1.update(key.as_bytes());
    sha1.update(MAGIC_GUID.as_bytes());

    let hash = sha1.finalize();

    debug_assert!(hash.len() == 20, "SHA1 hash should be 20 bytes long");

    Ok(AcceptToken(general_purpose::STANDARD.encode(hash)))
}

/// Extracts the `Sec-WebSocket-Key` value from the raw text of an upgrade request.
///
/// The key is the second whitespace-delimited token on the first line naming the
/// header, so `Sec-WebSocket-Key: <value>` is expected with the value free of spaces.
pub fn parse_handshake_request(raw_text: &str) -> Result<&str, HandshakeError> {
    let line = raw_text
        .split(['\r', '\n'])
        .find(|line| line.contains(SEC_KEY_HEADER))
        .ok_or(HandshakeError::HeaderNotFound)?;

    line.split_whitespace()
        .nth(1)
        .ok_or(HandshakeError::InvalidKey)
}

/// Builds the `101 Switching Protocols` response for a raw upgrade request.
pub fn build_handshake_response(raw_text: &str) -> Result<String, HandshakeError> {
    let key = parse_handshake_request(raw_text)?;
    let token = compute_accept_token(key)?;

    Ok(handshake_response(&token))
}

/// Formats the response template around an already computed token.
pub fn handshake_response(token: &AcceptToken) -> String {
    format!(
        "HTTP/1.1 101 Switching Protocols\r\n\
         Upgrade: websocket\r\n\
         Connection: Upgrade\r\n\
         Sec-WebSocket-Accept: {token}\r\n\
         \r\n"
    )
}

/// Generates a random 24-character client key, as a browser would.
pub fn generate_sec_key<R: RngCore>(rng: &mut R) -> String {
    let mut key: [u8; 16] = [0; 16];

    rng.fill_bytes(&mut key);

    general_purpose::STANDARD.encode(key)
}
