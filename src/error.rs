use std::fmt;

/// Everything that can abort a harness run.
///
/// All three variants are fatal: errors are raised as close to their source
/// as possible (construction / parse time where feasible) and propagate
/// straight out — no retry path exists anywhere in the harness.
#[derive(Debug)]
pub enum Error {
    /// Invalid selector, inconsistent fractions, layer/dataset dimension
    /// mismatch, minibatch larger than the training set, malformed weight
    /// range.
    Config(String),
    /// Dataset source unrecognized, or empty after loading.
    Data(String),
    /// A parameter snapshot whose layer count or shapes disagree with the
    /// network it is being restored into.
    StateMismatch(String),
    /// Snapshot file could not be read or written.
    Io(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(msg) => write!(f, "configuration error: {}", msg),
            Error::Data(msg) => write!(f, "data error: {}", msg),
            Error::StateMismatch(msg) => write!(f, "state mismatch: {}", msg),
            Error::Io(err) => write!(f, "i/o error: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
