mod text;
mod xml;


pub(crate) use self::{text::TextLogTarget, xml::XmlLogTarget};


use std::{
    fs::{self, File},
    io::{BufWriter, Error as IoError, ErrorKind, Write},
    path::{Path, PathBuf},
};

use chrono::Local;

use anchored_logstore::{RecordStore, WireRevision};

use crate::codec::{DecodeError, ExportError, RecordDecoder, export_records};
use crate::error::{AlreadyExists, FacilityError};


/// The destination file name of one log target, derived from its facility's name.
#[derive(Debug, Clone, Copy)]
pub enum TargetFileName<'a> {
    Text { facility: &'a str },
    Xml  { facility: &'a str },
}

impl TargetFileName<'_> {
    #[must_use]
    pub fn file_name(self) -> String {
        match self {
            Self::Text { facility } => format!("{facility}.log"),
            Self::Xml  { facility } => format!("{facility}.xml"),
        }
    }

    #[must_use]
    pub fn file_path(self, directory: &Path) -> PathBuf {
        directory.join(self.file_name())
    }

    /// The name of the backing store stream this target appends to during its session.
    #[must_use]
    pub fn stream_name(self) -> String {
        match self {
            Self::Text { facility } => format!("{facility}-text"),
            Self::Xml  { facility } => format!("{facility}-xml"),
        }
    }
}


/// The local date and time, formatted the way banners and XML fragments carry them.
#[must_use]
pub(crate) fn date_and_time() -> (String, String) {
    let now = Local::now();
    (
        now.format("%Y%m%d").to_string(),
        now.format("%H:%M:%S").to_string(),
    )
}

/// Clip `text` to at most `max` bytes, on a character boundary, when a limit is configured.
#[must_use]
pub(crate) fn clip(text: &str, max: Option<usize>) -> &str {
    let Some(max) = max else {
        return text;
    };
    if text.len() <= max {
        return text;
    }

    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}


/// The state shared by both file-producing target kinds: one backing store stream appended to
/// during the session, and one destination file produced exactly once at close.
#[derive(Debug)]
pub(crate) struct TargetCore<S> {
    stream:          String,
    destination:     PathBuf,
    store:           S,
    /// Cached once at setup; selects the decoder's frame layout at finalization.
    revision:        WireRevision,
    /// Set exactly once, after a successful finalization. No further writes are accepted.
    closed:          bool,
    /// Whether the closing banner record has been appended, so a retried close does not
    /// append a second one.
    close_recorded:  bool,
    max_record_size: Option<usize>,
}

impl<S: RecordStore> TargetCore<S> {
    /// Set up the target: enforce the destination-file rule, register the backing stream,
    /// cache the store's wire revision, and clear any stale records under this stream's name.
    ///
    /// # Errors
    ///
    /// Returns an `AlreadyExists` error if the destination file exists and `overwrite` was not
    /// requested, before anything is written anywhere. With `overwrite`, the pre-existing
    /// destination is deleted here instead.
    ///
    /// Returns a `Registration` error if the store cannot set up or reset the stream.
    pub(crate) fn init(
        mut store:       S,
        stream:          String,
        destination:     PathBuf,
        overwrite:       bool,
        max_record_size: Option<usize>,
    ) -> Result<Self, FacilityError<S::Error>> {
        let pre_existing = destination
            .try_exists()
            .map_err(FacilityError::FileWrite)?;

        if pre_existing {
            if overwrite {
                fs::remove_file(&destination).map_err(FacilityError::FileWrite)?;
            } else {
                return Err(AlreadyExists::Destination(destination).into());
            }
        }

        store.register(&stream).map_err(FacilityError::Registration)?;
        let revision = store.wire_revision();
        store.clear(&stream).map_err(FacilityError::Registration)?;

        Ok(Self {
            stream,
            destination,
            store,
            revision,
            closed:          false,
            close_recorded:  false,
            max_record_size,
        })
    }

    #[inline]
    #[must_use]
    pub(crate) fn is_closed(&self) -> bool {
        self.closed
    }

    #[inline]
    #[must_use]
    pub(crate) fn destination(&self) -> &Path {
        &self.destination
    }

    #[inline]
    #[must_use]
    pub(crate) fn max_record_size(&self) -> Option<usize> {
        self.max_record_size
    }

    #[inline]
    #[must_use]
    pub(crate) fn revision(&self) -> WireRevision {
        self.revision
    }

    /// Append one formatted record to the backing stream.
    pub(crate) fn append(&mut self, payload: &str) -> Result<(), FacilityError<S::Error>> {
        self.store
            .append(&self.stream, payload)
            .map_err(FacilityError::Store)
    }

    /// Append the closing banner record, at most once across retried closes.
    pub(crate) fn append_close_record(
        &mut self,
        payload: &str,
    ) -> Result<(), FacilityError<S::Error>> {
        if !self.close_recorded {
            self.append(payload)?;
            self.close_recorded = true;
        }
        Ok(())
    }

    /// The race guard repeated at close time: the destination must still not exist.
    ///
    /// # Errors
    ///
    /// Returns an `AlreadyExists` error if the destination file now exists; the pre-existing
    /// file is left byte-for-byte unmodified.
    pub(crate) fn guard_destination(&self) -> Result<(), FacilityError<S::Error>> {
        let pre_existing = self.destination
            .try_exists()
            .map_err(FacilityError::FileWrite)?;

        if pre_existing {
            Err(AlreadyExists::Destination(self.destination.clone()).into())
        } else {
            Ok(())
        }
    }

    /// Exclusively create the destination file. Creation fails if the file appeared since the
    /// guard check, so the guard holds even against a racing creator.
    pub(crate) fn create_destination(
        &self,
    ) -> Result<BufWriter<File>, FacilityError<S::Error>> {
        match File::create_new(&self.destination) {
            Ok(file) => Ok(BufWriter::new(file)),
            Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                Err(AlreadyExists::Destination(self.destination.clone()).into())
            }
            Err(err) => Err(FacilityError::FileWrite(err)),
        }
    }

    /// Read the backing stream back in full and export every record into `out`, in append
    /// order. The backing stream itself is left untouched; its cleanup is the store owner's
    /// responsibility, not this pipeline's.
    pub(crate) fn export_into<W: Write>(
        &self,
        out: &mut W,
    ) -> Result<u64, FacilityError<S::Error>> {
        let stream = self.store
            .read_all(&self.stream)
            .map_err(FacilityError::Store)?;

        let mut decoder = RecordDecoder::new(stream, self.revision);

        export_records(&mut decoder, out).map_err(|err| match err {
            ExportError::Decode(DecodeError::StreamRead(io_err)) => {
                FacilityError::FileRead(io_err)
            }
            ExportError::Decode(decode_err) => {
                FacilityError::FileRead(IoError::new(ErrorKind::InvalidData, decode_err))
            }
            ExportError::Write(io_err) => FacilityError::FileWrite(io_err),
        })
    }

    /// Mark the target closed. Only called after a fully successful finalization.
    pub(crate) fn mark_closed(&mut self) {
        self.closed = true;
    }
}


#[cfg(test)]
mod tests {
    use super::*;


    /// Tests that the destination file names do not have directory components.
    #[test]
    fn file_name_has_no_slash() {
        for file_name in [
            TargetFileName::Text { facility: "tc1" },
            TargetFileName::Xml  { facility: "tc1" },
        ].map(TargetFileName::file_name) {
            let file_name = PathBuf::from(file_name);
            assert_eq!(file_name.file_name(), Some(file_name.as_os_str()));
        }
    }

    #[test]
    fn kinds_do_not_share_streams_or_files() {
        let text = TargetFileName::Text { facility: "tc1" };
        let xml  = TargetFileName::Xml  { facility: "tc1" };

        assert_ne!(text.file_name(),   xml.file_name());
        assert_ne!(text.stream_name(), xml.stream_name());
    }

    #[test]
    fn clip_respects_character_boundaries() {
        assert_eq!(clip("plain", None), "plain");
        assert_eq!(clip("plain", Some(3)), "pla");
        // 'ö' is two bytes; a limit landing inside it must back off to the boundary.
        assert_eq!(clip("öö", Some(3)), "ö");
        assert_eq!(clip("öö", Some(4)), "öö");
        assert_eq!(clip("", Some(0)), "");
    }
}
