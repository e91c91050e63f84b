use std::path::PathBuf;

/// Every way a single classification run can fail.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("device `{device}` is unavailable: {reason}")]
    DeviceUnavailable { device: String, reason: String },

    #[error("failed to parse model {}: {reason}", path.display())]
    ModelParse { path: PathBuf, reason: String },

    #[error("failed to bind network to device `{device}`: {reason}")]
    DeviceBind { device: String, reason: String },

    #[error("failed to read image {}: {reason}", path.display())]
    ImageRead { path: PathBuf, reason: String },

    #[error("shape mismatch for `{name}`: {reason}")]
    ShapeMismatch { name: String, reason: String },

    #[error("inference failed: {0}")]
    InferenceFailure(String),

    #[error("result for `{0}` is not ready; wait for a successful completion first")]
    ResultNotReady(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    pub fn shape(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::ShapeMismatch {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn inference(reason: impl std::fmt::Display) -> Self {
        Error::InferenceFailure(reason.to_string())
    }
}
