use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum TrainError {
    #[error("No usable accelerator device: {0}")]
    NoAccelerator(String),
    #[error("Failed to read dataset directory '{path}': {source}")]
    DatasetIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Couldn't find any class folder in '{0}'")]
    NoClasses(PathBuf),
    #[error("Found no valid file for the class '{class}' in '{root}'")]
    EmptyClass { class: String, root: PathBuf },
    #[error("Batch size must be at least 1")]
    EmptyBatch,
    #[error("Validation split must be in [0, 1), got {0}")]
    InvalidSplit(f64),
    #[error(transparent)]
    ImageDecode(#[from] DecodeFailure),
    #[error("Failed to install the application logger: {0}")]
    Logger(String),
}

/// An image the batcher could not decode.
///
/// Dataloader outputs must be `Clone`, so this carries the decoder message as text
/// instead of the `image` error itself.
#[derive(thiserror::Error, Clone, Debug, PartialEq)]
#[error("Failed to decode image '{path}': {reason}")]
pub struct DecodeFailure {
    pub path: PathBuf,
    pub reason: String,
}

pub type Result<T> = std::result::Result<T, TrainError>;
