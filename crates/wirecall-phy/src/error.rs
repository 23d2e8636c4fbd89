use std::path::PathBuf;

/// Errors opening the physical channel.
#[derive(Debug, thiserror::Error)]
pub enum PhyError {
    /// Creating a FIFO at the given path failed.
    #[error("failed to create fifo {path:?}: {source}")]
    CreateFifo {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Opening an endpoint of the channel failed.
    #[error("failed to open {path:?}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, PhyError>;
