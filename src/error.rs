use std::io;
use trackable::error::TrackableError;
use trackable::error::{ErrorKind as TrackableErrorKind, ErrorKindExt};

/// This crate specific error type.
#[derive(Debug, Clone)]
pub struct Error(TrackableError<ErrorKind>);
derive_traits_for_trackable_error_newtype!(Error, ErrorKind);
impl From<io::Error> for Error {
    fn from(f: io::Error) -> Self {
        ErrorKind::Other.cause(f).into()
    }
}

/// The list of the possible error kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed name, label, help text or bucket scheme, or a handle
    /// that does not belong to the object it was passed to.
    InvalidInput,

    /// The registry, family or series has already been destroyed.
    Destroyed,

    /// An allocation was refused and `AllocationPolicy::Fail` is in effect.
    ResourceExhausted,

    /// Other errors (e.g., the scrape sink failed).
    Other,
}
impl TrackableErrorKind for ErrorKind {}
