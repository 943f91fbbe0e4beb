/// Close code reported when the peer sent a close frame without a status
pub const CLOSE_NO_STATUS: u16 = 1005;

/// Close code reported when the stream ended without any close frame
pub const CLOSE_ABNORMAL: u16 = 1006;

/// Close code used for locally initiated disconnects
pub const CLOSE_NORMAL: u16 = 1000;

/// A single WebSocket frame as seen by the client
///
/// Control frames (ping/pong) are answered by the socket layer and never
/// surface here. A close frame surfaces as its status code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WsMessage {
    Text(String),
    Binary(Vec<u8>),
    Close(u16),
}

impl WsMessage {
    /// Get the message as text, if it is text
    pub fn as_text(&self) -> Option<&str> {
        match self {
            WsMessage::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Get the message as binary, if it is binary
    pub fn as_binary(&self) -> Option<&[u8]> {
        match self {
            WsMessage::Binary(b) => Some(b),
            _ => None,
        }
    }

    /// Decode the payload as UTF-8 text
    ///
    /// Binary frames are accepted as long as they hold valid UTF-8.
    pub fn into_text(self) -> Option<String> {
        match self {
            WsMessage::Text(s) => Some(s),
            WsMessage::Binary(b) => String::from_utf8(b).ok(),
            WsMessage::Close(_) => None,
        }
    }

    /// Check if message is text
    pub fn is_text(&self) -> bool {
        matches!(self, WsMessage::Text(_))
    }

    /// Check if message is a close frame
    pub fn is_close(&self) -> bool {
        matches!(self, WsMessage::Close(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_utf8_decodes_as_text() {
        let msg = WsMessage::Binary(b"{\"id\":1}".to_vec());
        assert_eq!(msg.into_text().as_deref(), Some("{\"id\":1}"));
    }

    #[test]
    fn test_invalid_utf8_is_rejected() {
        let msg = WsMessage::Binary(vec![0xff, 0xfe]);
        assert!(msg.into_text().is_none());
        assert!(WsMessage::Close(1000).into_text().is_none());
    }
}
