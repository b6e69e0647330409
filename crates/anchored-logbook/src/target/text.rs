use std::{io::Write as _, path::Path};

use anchored_logstore::RecordStore;

use crate::error::FacilityError;
use crate::message::{MessageTypeInfo, generic_info};
use crate::request::WorkerRequest;
use super::{TargetCore, TargetFileName, clip, date_and_time};


/// The plain-text target kind: one severity-prefixed line per message, plus a
/// generic-prefixed line for each description, bracketed by open/close banner lines.
#[derive(Debug)]
pub(crate) struct TextLogTarget<S> {
    core: TargetCore<S>,
}

impl<S: RecordStore> TextLogTarget<S> {
    /// Set up the target and put the opening banner on record.
    pub(crate) fn init(
        store:           S,
        facility:        &str,
        directory:       &Path,
        overwrite:       bool,
        max_record_size: Option<usize>,
    ) -> Result<Self, FacilityError<S::Error>> {
        let name = TargetFileName::Text { facility };

        let mut core = TargetCore::init(
            store,
            name.stream_name(),
            name.file_path(directory),
            overwrite,
            max_record_size,
        )?;

        let (date, time) = date_and_time();
        core.append(&format!("Log OPENED {date} {time}"))?;

        Ok(Self { core })
    }

    #[must_use]
    pub(crate) fn destination(&self) -> &Path {
        self.core.destination()
    }

    /// Append the message (and its description, if present) as prefixed line records.
    /// No-op once closed, and for empty messages.
    pub(crate) fn log_message(
        &mut self,
        request: &WorkerRequest,
        info:    &MessageTypeInfo,
    ) -> Result<(), FacilityError<S::Error>> {
        if self.core.is_closed() || request.message.is_empty() {
            return Ok(());
        }

        let max = self.core.max_record_size();

        let message = clip(&request.message, max);
        self.core.append(&format!("{}{message}", info.prefix))?;

        if let Some(description) = request.description.as_deref() {
            if !description.is_empty() {
                let description = clip(description, max);
                self.core.append(&format!("{}{description}", generic_info().prefix))?;
            }
        }

        Ok(())
    }

    /// Put the closing banner on record, then transform every stream record into one
    /// destination line. No-op if the target is already closed.
    pub(crate) fn close(&mut self) -> Result<(), FacilityError<S::Error>> {
        if self.core.is_closed() {
            return Ok(());
        }

        self.core.guard_destination()?;

        let (date, time) = date_and_time();
        self.core.append_close_record(&format!("Log CLOSED {date} {time}"))?;

        let mut out = self.core.create_destination()?;
        self.core.export_into(&mut out)?;
        out.flush().map_err(FacilityError::FileWrite)?;

        self.core.mark_closed();
        Ok(())
    }
}
