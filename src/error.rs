use thiserror::Error;

#[derive(Debug, Error)]
pub enum SvgError {
    #[error("invalid SVG data: {0}")]
    InvalidSvgData(String),
    #[error("SVG has no usable size (output {width}x{height})")]
    InvalidSizing { width: f64, height: f64 },
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SvgError>;

impl From<roxmltree::Error> for SvgError {
    fn from(value: roxmltree::Error) -> Self {
        SvgError::InvalidSvgData(value.to_string())
    }
}
