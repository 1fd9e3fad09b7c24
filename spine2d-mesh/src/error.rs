use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum Error {
    #[error("renderer has been disposed")]
    RendererDisposed,

    #[error("invalid attachment '{name}': {message}")]
    InvalidAttachment { name: String, message: String },

    #[error("invalid value: {message}")]
    InvalidValue { message: String },
}

impl Error {
    pub(crate) fn invalid_attachment(name: &str, message: impl Into<String>) -> Self {
        Self::InvalidAttachment {
            name: name.to_string(),
            message: message.into(),
        }
    }
}
