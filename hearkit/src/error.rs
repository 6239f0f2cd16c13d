use thiserror::Error;

/// Errors returned by hearkit operations.
#[derive(Debug, Error)]
pub enum HearError {
    /// The audio or frame array has the wrong rank or shape.
    #[error("hearkit: invalid input: {0}")]
    InvalidInput(String),

    /// The model does not satisfy the embedding contract.
    #[error("hearkit: model contract violated: {0}")]
    TypeMismatch(String),

    #[error("hearkit: not implemented: {0}")]
    NotImplemented(String),

    #[error("hearkit: invalid model config: {0}")]
    InvalidConfig(String),

    #[error("hearkit: unsupported device: {0}")]
    UnsupportedDevice(String),
}
