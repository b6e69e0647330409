use std::path::PathBuf;

use anchored_logstore::RecordStore;

use crate::custom::{BYPASS_REPLY, CustomLogger};
use crate::error::FacilityError;
use crate::remote::{RemoteCommand, RemotePeer};
use crate::request::WorkerRequest;
use crate::target::{TextLogTarget, XmlLogTarget};
use crate::message;


/// A facility's write strategy: what actually happens to a request once the worker thread
/// dequeues it, and what closing the facility finalizes.
///
/// Both variants sit behind the same queue/worker contract; a facility does not know which one
/// it drives.
pub(crate) enum FacilityWriter<S: RecordStore> {
    /// Write directly into locally-owned file targets, optionally screened by a custom-logging
    /// collaborator.
    Local(LocalWriter<S>),
    /// Forward every request to a same-shaped facility hosted by a remote collaborator; owns no
    /// file targets of its own.
    Remote(RemoteWriter),
}

impl<S: RecordStore> FacilityWriter<S> {
    /// Write one log request. Errors here affect only the one record; the worker logs them and
    /// moves on.
    pub(crate) fn write(
        &mut self,
        request: &WorkerRequest,
    ) -> Result<(), FacilityError<S::Error>> {
        match self {
            Self::Local(local)   => local.write(request),
            Self::Remote(remote) => remote.write(request),
        }
    }

    /// Finalize the strategy: close every enabled target (local), or forward the close command
    /// (remote). Errors here fail the facility's close and leave it registered for retry.
    pub(crate) fn close_now(&mut self, cap_xml: bool) -> Result<(), FacilityError<S::Error>> {
        match self {
            Self::Local(local)   => local.close_now(cap_xml),
            Self::Remote(remote) => remote.close_now(cap_xml),
        }
    }

    /// The destination paths of every enabled file target. Empty for remote facilities.
    #[must_use]
    pub(crate) fn destinations(&self) -> Vec<PathBuf> {
        match self {
            Self::Local(local) => {
                let mut destinations = Vec::new();
                if let Some(text) = &local.text {
                    destinations.push(text.destination().to_owned());
                }
                if let Some(xml) = &local.xml {
                    destinations.push(xml.destination().to_owned());
                }
                destinations
            }
            Self::Remote(_) => Vec::new(),
        }
    }
}


pub(crate) struct LocalWriter<S: RecordStore> {
    text:    Option<TextLogTarget<S>>,
    xml:     Option<XmlLogTarget<S>>,
    /// Echo each formatted text line to standard error at log time.
    console: bool,
    custom:  Option<Box<dyn CustomLogger>>,
}

impl<S: RecordStore> LocalWriter<S> {
    #[must_use]
    pub(crate) fn new(
        text:    Option<TextLogTarget<S>>,
        xml:     Option<XmlLogTarget<S>>,
        console: bool,
        custom:  Option<Box<dyn CustomLogger>>,
    ) -> Self {
        Self { text, xml, console, custom }
    }

    fn write(&mut self, request: &WorkerRequest) -> Result<(), FacilityError<S::Error>> {
        if let Some(custom) = &mut self.custom {
            match custom.handle(request) {
                Ok(reply) if reply == BYPASS_REPLY => return Ok(()),
                Ok(_) => {}
                Err(err) => {
                    // A misbehaving collaborator never takes the facility down with it.
                    tracing::warn!(
                        "custom-logging collaborator failed, standard logging proceeds: {err}",
                    );
                }
            }
        }

        let Some(info) = message::type_info(request.message_type) else {
            tracing::warn!(
                message_type = request.message_type,
                "dropped a log request whose message type has no taxonomy entry",
            );
            return Ok(());
        };

        if self.console {
            eprintln!("{}{}", info.prefix, request.message);
        }

        if let Some(text) = &mut self.text {
            text.log_message(request, info)?;
        }
        if let Some(xml) = &mut self.xml {
            xml.log_message(request, info)?;
        }
        Ok(())
    }

    fn close_now(&mut self, cap_xml: bool) -> Result<(), FacilityError<S::Error>> {
        if let Some(custom) = &mut self.custom {
            custom.session_closing();
        }

        // A target which fails to close stays open, so a retried close picks it back up;
        // already-closed targets no-op.
        if let Some(text) = &mut self.text {
            text.close()?;
        }
        if let Some(xml) = &mut self.xml {
            xml.close(cap_xml)?;
        }
        Ok(())
    }
}


pub(crate) struct RemoteWriter {
    facility: String,
    peer:     Box<dyn RemotePeer>,
}

impl RemoteWriter {
    #[must_use]
    pub(crate) fn new(facility: &str, peer: Box<dyn RemotePeer>) -> Self {
        Self {
            facility: facility.to_owned(),
            peer,
        }
    }

    fn write<StoreError>(
        &mut self,
        request: &WorkerRequest,
    ) -> Result<(), FacilityError<StoreError>> {
        self.peer
            .submit(RemoteCommand::log(&self.facility, request))
            .map_err(Into::into)
    }

    fn close_now<StoreError>(
        &mut self,
        cap_xml: bool,
    ) -> Result<(), FacilityError<StoreError>> {
        self.peer
            .submit(RemoteCommand::Close {
                facility: self.facility.clone(),
                cap_xml,
            })
            .map_err(Into::into)
    }
}
