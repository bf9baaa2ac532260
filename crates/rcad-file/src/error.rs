//! 文件操作错误定义

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FileError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("DXF error: {0}")]
    Dxf(String),

    #[error("Unrecognized file format: {0}")]
    UnrecognizedFormat(String),

    #[error("Corrupt file: {0}")]
    Corrupt(String),

    #[error("Unsupported feature: {0}")]
    UnsupportedFeature(String),

    #[error("Failed to resolve external content '{name}': {message}")]
    ContentResolution { name: String, message: String },

    #[error("Format '{0}' is read-only")]
    ReadOnlyFormat(&'static str),

    #[error("Operation was cancelled")]
    Cancelled,
}
