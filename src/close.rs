/// A WebSocket Close code.
///
/// Indicate why an endpoint is closing the WebSocket connection.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum CloseCode {
    /// Indicates a normal closure, meaning that the purpose for
    /// which the connection was established has been fulfilled.
    Normal,
    /// Indicates that an endpoint is "going away", such as a server
    /// going down or a browser having navigated away from a page.
    Away,
    /// Indicates that an endpoint is terminating the connection due
    /// to a protocol error.
    Protocol,
    /// Indicates that an endpoint is terminating the connection
    /// because it has received a type of data it cannot accept.
    Unsupported,
    /// Indicates that an endpoint is terminating the connection
    /// because it has received data within a message that was not
    /// consistent with the type of the message.
    Invalid,
    /// Indicates that an endpoint is terminating the connection
    /// because it has received a message that violates its policy.
    Policy,
    /// Indicates that an endpoint is terminating the connection
    /// because it has received a message that is too big for it to
    /// process.
    Size,
    /// Indicates that a server is terminating the connection because
    /// it encountered an unexpected condition.
    Error,
    /// Any other code, registered or application defined.
    Other(u16),
}

impl From<u16> for CloseCode {
    fn from(code: u16) -> Self {
        match code {
            1000 => Self::Normal,
            1001 => Self::Away,
            1002 => Self::Protocol,
            1003 => Self::Unsupported,
            1007 => Self::Invalid,
            1008 => Self::Policy,
            1009 => Self::Size,
            1011 => Self::Error,
            _ => Self::Other(code),
        }
    }
}

impl From<CloseCode> for u16 {
    fn from(code: CloseCode) -> u16 {
        match code {
            CloseCode::Normal => 1000,
            CloseCode::Away => 1001,
            CloseCode::Protocol => 1002,
            CloseCode::Unsupported => 1003,
            CloseCode::Invalid => 1007,
            CloseCode::Policy => 1008,
            CloseCode::Size => 1009,
            CloseCode::Error => 1011,
            CloseCode::Other(code) => code,
        }
    }
}

/// The status carried by a peer's close frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseFrame<'a> {
    /// The reason as a code.
    code: CloseCode,
    /// The reason as text string.
    reason: &'a str,
}

impl<'a> CloseFrame<'a> {
    pub const fn new(code: CloseCode, reason: &'a str) -> Self {
        Self { code, reason }
    }

    /// Parses a close payload: a 2-byte big-endian code followed by an optional UTF-8 reason.
    ///
    /// Returns `None` for an empty payload, a lone byte or a reason that is not UTF-8.
    pub fn parse(payload: &'a [u8]) -> Option<Self> {
        let [hi, lo, reason @ ..] = payload else {
            return None;
        };

        let reason = core::str::from_utf8(reason).ok()?;

        Some(Self::new(CloseCode::from(u16::from_be_bytes([*hi, *lo])), reason))
    }

    /// Returns the close code.
    pub const fn code(&self) -> CloseCode {
        self.code
    }

    /// Returns the reason as a string slice.
    pub const fn reason(&self) -> &'a str {
        self.reason
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_code_and_reason() {
        let payload = [0x03, 0xE9, b'b', b'y', b'e'];

        let frame = CloseFrame::parse(&payload).unwrap();

        assert_eq!(frame.code(), CloseCode::Away);
        assert_eq!(frame.reason(), "bye");
    }

    #[test]
    fn parse_without_status() {
        assert_eq!(CloseFrame::parse(&[]), None);
        assert_eq!(CloseFrame::parse(&[0x03]), None);
    }

    #[test]
    fn parse_invalid_reason() {
        assert_eq!(CloseFrame::parse(&[0x03, 0xE8, 0xFF, 0xFE]), None);
    }

    #[test]
    fn code_conversions() {
        assert_eq!(CloseCode::from(4000), CloseCode::Other(4000));
        assert_eq!(u16::from(CloseCode::Normal), 1000);
    }
}
