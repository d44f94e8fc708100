//! 错误处理

#[allow(unused)]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("py error, {0}")]
    PyErr(#[from] pyo3::PyErr),
    #[error("py downcast error, {0}")]
    PyDowncastError(String),

    #[error("strum error, {0}")]
    ParseEnumString(String),

    #[error("invalid parameter, {0}")]
    InvalidParameter(String),
}

impl From<strum::ParseError> for Error {
    fn from(e: strum::ParseError) -> Self {
        Error::ParseEnumString(e.to_string())
    }
}
