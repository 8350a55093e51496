use std::{
    cmp::PartialEq,
    error::Error as StdError,
    fmt::{self, Display},
    io,
};

/// The top-level result type for configuring and running
/// the workers.
pub type Result<T> = std::result::Result<T, Error>;

/// An Error type encapsulating the issues that may come up while
/// configuring and running a workload.
///
/// An empty list is never an `Error`: operations that find the list
/// empty report it through `Option` or `bool`.
#[derive(Debug)]
pub enum Error {
    /// The workload was configured with invalid or inconsistent options.
    InvalidConfig(String),
    /// An unexpected bug has happened, such as a worker thread panicking.
    ReportableBug(String),
    /// An IO error, for instance while spawning a worker thread.
    Io(io::Error),
}

impl Clone for Error {
    fn clone(&self) -> Self {
        use self::Error::*;

        match self {
            Io(ioe) => Io(io::Error::new(ioe.kind(), format!("{:?}", ioe))),
            InvalidConfig(why) => InvalidConfig(why.clone()),
            ReportableBug(what) => ReportableBug(what.clone()),
        }
    }
}

impl Eq for Error {}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        use self::Error::*;

        match (self, other) {
            (InvalidConfig(l), InvalidConfig(r)) => l == r,
            (ReportableBug(l), ReportableBug(r)) => l == r,
            _ => false,
        }
    }
}

impl From<io::Error> for Error {
    #[inline]
    fn from(io_error: io::Error) -> Self {
        Error::Io(io_error)
    }
}

impl StdError for Error {}

impl Display for Error {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> std::result::Result<(), fmt::Error> {
        use self::Error::*;

        match *self {
            InvalidConfig(ref e) => write!(f, "{}", e),
            ReportableBug(ref e) => write!(
                f,
                "Unexpected bug has happened: {}. \
                 PLEASE REPORT THIS BUG!",
                e
            ),
            Io(ref e) => write!(f, "IO error: {}", e),
        }
    }
}
