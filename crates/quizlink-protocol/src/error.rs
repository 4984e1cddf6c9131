//! Error types for the protocol layer.
//!
//! Malformed *inbound* traffic is not an error here — the frame boundary
//! drops it silently by contract. These variants cover the paths where a
//! reason is worth reporting: encoding our own outbound frames and
//! explicit typed decodes.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serializing an outbound command failed. With the plain-data
    /// command types this is effectively unreachable, but the boundary
    /// propagates it rather than panicking.
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// An explicit typed decode (via [`RawMessage::decode`](crate::RawMessage::decode))
    /// did not match the target shape.
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),
}
