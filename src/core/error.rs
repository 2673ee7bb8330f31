use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad facet, range, aggregation or sort-type combination, or a bad config file
    Configuration,
    /// The index view failed to open or read
    Resource,
    Parse,
    InvalidState,
    Io,
}

#[derive(Debug)]
pub struct Error {
    pub kind: ErrorKind,
    pub context: String,
}

impl Error {
    pub fn new(kind: ErrorKind, context: String) -> Self {
        Error { kind, context }
    }

    pub fn configuration(context: impl Into<String>) -> Self {
        Error::new(ErrorKind::Configuration, context.into())
    }

    pub fn resource(context: impl Into<String>) -> Self {
        Error::new(ErrorKind::Resource, context.into())
    }

    pub fn is_configuration(&self) -> bool {
        self.kind == ErrorKind::Configuration
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.context)
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error {
            kind: ErrorKind::Io,
            context: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error {
            kind: ErrorKind::Configuration,
            context: format!("Invalid config: {}", err),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error {
            kind: ErrorKind::Configuration,
            context: format!("Invalid request: {}", err),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
