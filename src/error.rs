use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    HttpError(String),
    ParseError(String),
    IoError(std::io::Error),
    ConfigError(String),
    MappingError {
        index: Option<usize>,
        cause: MappingError,
    },
    BackendError {
        index: Option<usize>,
        identity: String,
        cause: Box<Error>,
    },
    Cancelled {
        index: usize,
    },
}

impl Error {
    pub fn mapping(index: Option<usize>, cause: MappingError) -> Self {
        Error::MappingError { index, cause }
    }

    pub fn backend(index: Option<usize>, identity: impl Into<String>, cause: Error) -> Self {
        Error::BackendError {
            index,
            identity: identity.into(),
            cause: Box::new(cause),
        }
    }

    /// Index of the input record the error belongs to, if any.
    pub fn index(&self) -> Option<usize> {
        match self {
            Error::MappingError { index, .. } | Error::BackendError { index, .. } => *index,
            Error::Cancelled { index } => Some(*index),
            _ => None,
        }
    }
}

impl std::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::HttpError(e) => write!(f, "HTTP error: {}", e),
            Error::ParseError(e) => write!(f, "Parse error: {}", e),
            Error::IoError(e) => write!(f, "IO error: {}", e),
            Error::ConfigError(e) => write!(f, "Config error: {}", e),
            Error::MappingError {
                index: Some(i),
                cause,
            } => write!(f, "Mapping error at record #{}: {}", i, cause),
            Error::MappingError { index: None, cause } => write!(f, "Mapping error: {}", cause),
            Error::BackendError {
                index: Some(i),
                identity,
                cause,
            } => write!(f, "Backend error at record #{} ({}): {}", i, identity, cause),
            Error::BackendError {
                index: None,
                identity,
                cause,
            } => write!(f, "Backend error ({}): {}", identity, cause),
            Error::Cancelled { index } => write!(f, "Cancelled before record #{}", index),
        }
    }
}

/// Failure to translate between a record and a backend resource.
#[derive(Debug, Clone, PartialEq)]
pub enum MappingError {
    InvalidAddress { name: String, value: String },
    TypeMismatch { name: String, rtype: String, value: String },
    OutOfRange { name: String, field: &'static str, value: i64 },
    InvalidTtl { name: String, ttl: std::time::Duration },
    MissingValue { name: String, field: &'static str },
    UnsupportedType { name: String, rtype: String },
}

impl std::error::Error for MappingError {}

impl fmt::Display for MappingError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MappingError::InvalidAddress { name, value } => {
                write!(f, "{}: invalid IP address '{}'", name, value)
            }
            MappingError::TypeMismatch { name, rtype, value } => {
                write!(f, "{}: '{}' is not a valid {} value", name, value, rtype)
            }
            MappingError::OutOfRange { name, field, value } => {
                write!(f, "{}: {} {} does not fit in 16 bits", name, field, value)
            }
            MappingError::InvalidTtl { name, ttl } => {
                write!(f, "{}: TTL {:?} is not a whole number of seconds in range", name, ttl)
            }
            MappingError::MissingValue { name, field } => {
                write!(f, "{}: {} is empty", name, field)
            }
            MappingError::UnsupportedType { name, rtype } => {
                write!(f, "{}: unsupported record type {}", name, rtype)
            }
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Error {
        Error::HttpError(err.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error::IoError(err)
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Error {
        Error::ParseError(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Error {
        Error::ParseError(err.to_string())
    }
}
