use std::fmt;
use std::io;

#[derive(Debug)]
pub enum Error {
    Io(io::Error),
    InvalidExtension(String),
    UnsupportedColorType(String),
    UnsupportedFormat(String),
    InvalidColorFormat(String),
    InvalidDimensions(String),
    Encoding(String),
    EmptyCropWindow,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "IO error: {}", e),
            Error::InvalidExtension(ext) => write!(f, "Invalid file extension: {}", ext),
            Error::UnsupportedColorType(msg) => write!(f, "Unsupported color type: {}", msg),
            Error::UnsupportedFormat(msg) => write!(f, "Unsupported format: {}", msg),
            Error::InvalidColorFormat(msg) => write!(f, "Invalid color format: {}", msg),
            Error::InvalidDimensions(msg) => write!(f, "Invalid dimensions: {}", msg),
            Error::Encoding(msg) => write!(f, "Encoding error: {}", msg),
            Error::EmptyCropWindow => write!(f, "Crop window has zero area"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<::image::ImageError> for Error {
    fn from(e: ::image::ImageError) -> Self {
        match e {
            ::image::ImageError::IoError(e) => Error::Io(e),
            e => Error::Encoding(e.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
