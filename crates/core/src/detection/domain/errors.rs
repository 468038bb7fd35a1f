use thiserror::Error;

use crate::detection::infrastructure::model_resolver::ModelResolveError;

/// The detection model could not be made ready. Terminal for the session.
#[derive(Error, Debug)]
pub enum ModelLoadError {
    #[error(transparent)]
    Resolve(#[from] ModelResolveError),
    #[error("failed to create inference session: {0}")]
    Session(String),
    #[error("model loader stopped before finishing")]
    Abandoned,
}

/// A single inference call failed. The caller logs it and carries on.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DetectionError {
    #[error("inference failed: {0}")]
    Inference(String),
    #[error("unexpected model output: {0}")]
    Output(String),
    #[error("an inference call is already outstanding")]
    Busy,
    #[error("inference worker is gone")]
    Disconnected,
}
