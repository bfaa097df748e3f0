/// Errors that can occur in link operations.
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] nxlink_transport::TransportError),

    /// Frame-level error.
    #[error("frame error: {0}")]
    Frame(#[from] nxlink_frame::FrameError),

    /// `start` was called on a link that is already running.
    #[error("link already running")]
    AlreadyRunning,

    /// The reader side of the link went away.
    #[error("reader stopped: {0}")]
    ReaderStopped(String),

    /// A link thread could not be spawned.
    #[error("failed to spawn {name} thread: {source}")]
    Spawn {
        name: String,
        source: std::io::Error,
    },

    /// A link thread panicked.
    #[error("{0} thread panicked")]
    WorkerPanicked(String),

    /// The configuration could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, LinkError>;
