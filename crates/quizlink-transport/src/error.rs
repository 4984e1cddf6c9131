/// Errors that can occur in the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Establishing the connection failed (refused, DNS, handshake).
    #[error("connect failed: {0}")]
    ConnectFailed(String),

    /// Sending a frame failed.
    #[error("send failed: {0}")]
    SendFailed(String),

    /// Receiving a frame failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(String),

    /// No usable endpoint could be resolved from the configured inputs.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
}
