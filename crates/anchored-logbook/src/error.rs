use std::{io::Error as IoError, path::PathBuf};

use thiserror::Error;


/// The failure taxonomy of the engine, generic over the backing store's error type.
///
/// A failed [`close`] surfaces its error to the caller and leaves the facility registered, so
/// the close may be retried. Per-record problems during a session never surface here: the worker
/// thread logs them and drops the one affected record.
///
/// [`close`]: crate::facility::LogFacility::close
#[derive(Error, Debug)]
pub enum FacilityError<StoreError> {
    /// A facility name or destination file was already taken. See [`AlreadyExists`].
    #[error(transparent)]
    AlreadyExists(#[from] AlreadyExists),
    /// No facility is registered under the given name.
    #[error("no facility is registered under the name {0:?}")]
    DoesNotExist(String),
    /// The backing store could not set up a record stream for a target.
    #[error("record stream setup failed in the backing store: {0}")]
    Registration(StoreError),
    /// The backing store failed after setup, while appending, clearing, or reading back records.
    #[error("the backing store failed: {0}")]
    Store(StoreError),
    /// A destination log file could not be created or written during finalization.
    #[error("write error while producing a destination log file: {0}")]
    FileWrite(IoError),
    /// A target's record stream could not be read back or decoded during finalization.
    #[error("read error while decoding a record stream: {0}")]
    FileRead(IoError),
    /// The worker thread for a new facility could not be spawned.
    #[error("could not spawn the worker thread for a facility: {0}")]
    WorkerSpawn(IoError),
    /// A remote peer rejected a forwarded command.
    #[error(transparent)]
    Remote(#[from] crate::remote::RemoteSubmitError),
    /// A configuration value was malformed. See [`InvalidValue`].
    #[error(transparent)]
    InvalidValue(#[from] InvalidValue),
}

/// What, precisely, already existed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AlreadyExists {
    /// A facility is already registered under this name. Names are case-insensitive.
    #[error("a facility is already registered under the name {0:?}")]
    Facility(String),
    /// The destination log file already exists, and the facility was created without the
    /// overwrite flag. The pre-existing file is left byte-for-byte unmodified.
    #[error("a log file already exists at {0:?}, and overwriting was not requested")]
    Destination(PathBuf),
}

/// A malformed configuration value, such as a negative truncation length.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid option value: {0}")]
pub struct InvalidValue(pub String);
