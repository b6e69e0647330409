use std::{error::Error as StdError, sync::PoisonError};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::{
    fs::{self, File},
    io::{BufWriter, Error as IoError, Write as _},
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use hashbrown::HashMap;

use crate::store_traits::{RecordStore, StoreError};
use crate::wire::{self, RecordOrigin, WireRevision};


/// A [`RecordStore`] backed by the standard filesystem. Each registered stream is one spool file
/// in the store's base directory.
///
/// The store is a cloneable handle; clones share the same open spool files, and any clone may be
/// used from any thread. Spool files persist across store instances: re-opening a store over the
/// same directory and registering the same stream name continues the existing spool.
#[derive(Debug, Clone)]
pub struct StdStore {
    inner:    Arc<Mutex<Inner>>,
    origin:   RecordOrigin,
    revision: WireRevision,
}

#[derive(Debug)]
struct Inner {
    directory: PathBuf,
    /// One open append handle per registered stream.
    spools:    HashMap<String, BufWriter<File>>,
}

impl StdStore {
    /// Open a store over the given base directory, creating the directory (and any missing
    /// parents) if necessary. Frames are written in [`WireRevision::Current`] layout.
    ///
    /// # Errors
    ///
    /// Returns an `Io` error if the directory cannot be created.
    pub fn open(directory: &Path) -> Result<Self, Error> {
        Self::open_with_revision(directory, WireRevision::Current)
    }

    /// Open a store over the given base directory, writing frames of the given revision.
    ///
    /// # Errors
    ///
    /// Returns an `Io` error if the directory cannot be created.
    pub fn open_with_revision(directory: &Path, revision: WireRevision) -> Result<Self, Error> {
        fs::create_dir_all(directory)?;

        Ok(Self {
            inner: Arc::new(Mutex::new(Inner {
                directory: directory.to_owned(),
                spools:    HashMap::new(),
            })),
            origin: RecordOrigin::local_process(),
            revision,
        })
    }

    /// Replace the origin identifiers stamped into every frame this store writes.
    #[must_use]
    pub fn with_origin(mut self, origin: RecordOrigin) -> Self {
        self.origin = origin;
        self
    }
}

impl Inner {
    /// The spool file path for a stream name.
    ///
    /// # Errors
    ///
    /// Returns an `InvalidStreamName` error if the name would escape the base directory:
    /// stream names must be plain file stems, without path separators or relative components.
    fn spool_path(&self, stream: &str) -> Result<PathBuf, Error> {
        let hostile = stream.is_empty()
            || stream.contains(['/', '\\'])
            || stream == "."
            || stream == "..";

        if hostile {
            return Err(Error::InvalidStreamName(stream.to_owned()));
        }

        Ok(self.directory.join(format!("{stream}.spool")))
    }

    fn spool_mut(&mut self, stream: &str) -> Result<&mut BufWriter<File>, Error> {
        self.spools
            .get_mut(stream)
            .ok_or_else(|| Error::NotRegistered(stream.to_owned()))
    }
}

impl RecordStore for StdStore {
    type RecordRead = File;
    type Error      = Error;

    #[inline]
    fn wire_revision(&self) -> WireRevision {
        self.revision
    }

    /// Open (or create) the spool file for the named stream. Registering an existing stream
    /// leaves its contents unchanged.
    ///
    /// # Errors
    ///
    /// Returns an `InvalidStreamName` error for names which are not plain file stems, an `Io`
    /// error if the spool file cannot be opened, and a `Poisoned` error if the internal mutex
    /// was poisoned.
    fn register(&mut self, stream: &str) -> Result<(), Self::Error> {
        let mut inner = self.inner.lock()?;

        if inner.spools.contains_key(stream) {
            return Ok(());
        }

        let path = inner.spool_path(stream)?;
        let file = File::options()
            .append(true)
            .create(true)
            .open(&path)?;

        inner.spools.insert(stream.to_owned(), BufWriter::new(file));
        Ok(())
    }

    /// Frame the payload and append the resulting record to the stream's spool file. The spool
    /// is flushed after every record, so a reader opened later observes whole frames.
    ///
    /// # Errors
    ///
    /// Returns a `NotRegistered` error if no stream exists under the given name, a `FieldTooLong`
    /// error if the payload cannot fit in a frame, an `Io` error for write failures, and a
    /// `Poisoned` error if the internal mutex was poisoned.
    fn append(&mut self, stream: &str, payload: &str) -> Result<(), Self::Error> {
        let frame = wire::frame_record(self.revision, &self.origin, payload)?;

        let mut inner = self.inner.lock()?;
        let spool = inner.spool_mut(stream)?;

        spool.write_all(&frame)?;
        spool.flush()?;
        Ok(())
    }

    /// Truncate the stream's spool file to zero bytes, leaving it registered and empty.
    ///
    /// # Errors
    ///
    /// Returns a `NotRegistered` error if no stream exists under the given name, an `Io` error
    /// if truncation fails, and a `Poisoned` error if the internal mutex was poisoned.
    fn clear(&mut self, stream: &str) -> Result<(), Self::Error> {
        let mut inner = self.inner.lock()?;
        let spool = inner.spool_mut(stream)?;

        spool.flush()?;
        spool.get_ref().set_len(0)?;
        Ok(())
    }

    /// Open a reader over the stream's spool file, after flushing any buffered writes.
    ///
    /// # Errors
    ///
    /// Returns a `NotRegistered` error if no stream exists under the given name, an `Io` error
    /// if the spool cannot be reopened for reading, and a `Poisoned` error if the internal
    /// mutex was poisoned.
    fn read_all(&self, stream: &str) -> Result<Self::RecordRead, Self::Error> {
        let mut inner = self.inner.lock()?;

        inner.spool_mut(stream)?.flush()?;

        let path = inner.spool_path(stream)?;
        File::open(&path).map_err(Error::Io)
    }
}


#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// No stream was registered under the given name.
    NotRegistered(String),
    /// The stream name is not usable as a spool file stem.
    InvalidStreamName(String),
    /// A string was too long for its byte count to fit in a frame's length prefix.
    FieldTooLong(usize),
    /// An underlying filesystem operation failed.
    Io(IoError),
    /// The mutex guarding the spool files was poisoned.
    Poisoned,
}

impl<T> From<PoisonError<T>> for Error {
    #[inline]
    fn from(_err: PoisonError<T>) -> Self {
        Self::Poisoned
    }
}

impl From<IoError> for Error {
    #[inline]
    fn from(err: IoError) -> Self {
        Self::Io(err)
    }
}

impl From<wire::FieldTooLong> for Error {
    #[inline]
    fn from(err: wire::FieldTooLong) -> Self {
        Self::FieldTooLong(err.0)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::NotRegistered(stream) => write!(
                f,
                "no stream is registered under the name {stream:?} in a StdStore",
            ),
            Self::InvalidStreamName(stream) => write!(
                f,
                "the stream name {stream:?} is not usable as a spool file stem in a StdStore",
            ),
            Self::FieldTooLong(len) => write!(
                f,
                "a string of {len} bytes cannot fit in a record frame's four-byte length prefix",
            ),
            Self::Io(err) => write!(
                f,
                "a filesystem operation failed in a StdStore: {err}",
            ),
            Self::Poisoned => write!(
                f,
                "the mutex guarding a StdStore's spool files was poisoned",
            ),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        if let Self::Io(err) = self {
            Some(err)
        } else {
            None
        }
    }
}

impl StoreError for Error {
    #[inline]
    fn is_not_found(&self) -> bool {
        matches!(self, Self::NotRegistered(_))
    }

    #[inline]
    fn is_poison_error(&self) -> bool {
        matches!(self, Self::Poisoned)
    }
}


#[cfg(test)]
mod tests {
    use std::io::Read as _;

    use super::*;


    /// A scratch directory unique to this process and test.
    fn scratch_dir(test: &str) -> PathBuf {
        std::env::temp_dir()
            .join("anchored-logstore-tests")
            .join(format!("{}-{test}", std::process::id()))
    }

    #[test]
    fn spool_survives_reopen() {
        let dir = scratch_dir("spool_survives_reopen");

        let mut store = StdStore::open(&dir).unwrap();
        store.register("stream").unwrap();
        store.append("stream", "persisted").unwrap();

        let mut reopened = StdStore::open(&dir).unwrap();
        reopened.register("stream").unwrap();

        let mut bytes = Vec::new();
        reopened.read_all("stream").unwrap().read_to_end(&mut bytes).unwrap();
        assert!(!bytes.is_empty());

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn clear_truncates_the_spool() {
        let dir = scratch_dir("clear_truncates_the_spool");

        let mut store = StdStore::open(&dir).unwrap();
        store.register("stream").unwrap();
        store.append("stream", "stale").unwrap();
        store.clear("stream").unwrap();

        let mut bytes = Vec::new();
        store.read_all("stream").unwrap().read_to_end(&mut bytes).unwrap();
        assert!(bytes.is_empty());

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn rejects_path_hostile_stream_names() {
        let dir = scratch_dir("rejects_path_hostile_stream_names");

        let mut store = StdStore::open(&dir).unwrap();
        for name in ["", ".", "..", "a/b", "a\\b"] {
            assert!(matches!(
                store.register(name),
                Err(Error::InvalidStreamName(_)),
            ));
        }

        fs::remove_dir_all(&dir).unwrap();
    }
}
