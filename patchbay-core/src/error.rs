//! Error types for channel wiring and dispatch.

/// Errors that can occur while wiring or driving a channel.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// A port or export was bound a second time.
    #[error("already bound: {port}")]
    AlreadyBound {
        /// Name of the port that rejected the bind.
        port: String,
    },

    /// A call was issued through a port that has no binding.
    #[error("not bound: {port}")]
    Unbound {
        /// Name of the port that could not resolve.
        port: String,
    },
}

/// Convenience alias for channel operations.
pub type ChannelResult<T> = Result<T, ChannelError>;
