use thiserror::Error;

/// Failure kinds shared by the parse builder and the pipeline driver.
///
/// Builder and pipeline operations return `Result<T>`; the driver
/// short-circuits on the first error and runs the single teardown path.
#[derive(Error, Debug)]
pub enum Error {
    #[error("parse error: {0}")]
    ParseError(String),

    #[error("not in a block of the expected kind")]
    NotInBlock,

    #[error("bad argument: {0}")]
    BadArg(String),

    #[error("no module name set")]
    NoModName,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn parse(message: impl Into<String>) -> Self {
        Self::ParseError(message.into())
    }

    pub fn bad_arg(message: impl Into<String>) -> Self {
        Self::BadArg(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}
