use std::{path::Path, thread::JoinHandle};
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::path::PathBuf;
use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicU8, Ordering},
};

use parking_lot::Mutex;

use anchored_logstore::RecordStore;

use crate::custom::CustomLogger;
use crate::error::FacilityError;
use crate::message::{self, Severity};
use crate::options::{FacilityOptions, TargetModes};
use crate::queue::RequestQueue;
use crate::remote::RemotePeer;
use crate::request::WorkerRequest;
use crate::target::{TextLogTarget, XmlLogTarget};
use crate::worker::spawn_worker;
use crate::writer::{FacilityWriter, LocalWriter, RemoteWriter};


/// One named logging session: a request queue, the single worker thread draining it, and a
/// write strategy (locally-owned file targets, or a remote counterpart).
///
/// Any number of caller threads may call [`log_message`] concurrently; the queue is the only
/// point of contention between them. No operation other than [`close`] blocks the caller.
///
/// The facility moves through three states: running, draining (a close has begun and new
/// messages are rejected), and closed. A failed close returns the facility to the running
/// state so the close may be retried; a successful close is terminal, and repeat calls are
/// no-ops.
///
/// [`log_message`]: LogFacility::log_message
/// [`close`]: LogFacility::close
pub struct LogFacility<S: RecordStore> {
    name:      String,
    modes:     TargetModes,
    /// The severity rank below which messages are discarded before they reach the queue.
    level:     AtomicU8,
    linked:    Option<String>,
    suspended: AtomicBool,
    /// The closing gate: set when a close begins, so no new message can slip in between the
    /// drain check and the exit sentinel. Lifted again if the close fails.
    closing:   AtomicBool,
    closed:    bool,
    queue:     Arc<RequestQueue>,
    writer:    Arc<Mutex<FacilityWriter<S>>>,
    worker:    Option<JoinHandle<()>>,
}

impl<S: RecordStore + Clone + Send + 'static> LogFacility<S> {
    /// Open a facility which writes into its own file targets under `directory`, one per
    /// enabled file-producing mode bit.
    ///
    /// # Errors
    ///
    /// Returns an `AlreadyExists` error if a target's destination file pre-exists without the
    /// overwrite option, a `Registration` error if the store cannot set up a target's stream,
    /// and a `WorkerSpawn` error if the worker thread cannot be started.
    pub fn open_local(
        store:     S,
        directory: &Path,
        name:      &str,
        options:   FacilityOptions,
        custom:    Option<Box<dyn CustomLogger>>,
    ) -> Result<Self, FacilityError<S::Error>> {
        let text = if options.modes.contains(TargetModes::TEXT) {
            Some(TextLogTarget::init(
                store.clone(),
                name,
                directory,
                options.overwrite,
                options.max_record_size,
            )?)
        } else {
            None
        };

        let xml = if options.modes.contains(TargetModes::XML) {
            Some(XmlLogTarget::init(
                store.clone(),
                name,
                directory,
                options.overwrite,
                options.max_record_size,
            )?)
        } else {
            None
        };

        let console = options.modes.contains(TargetModes::CONSOLE);
        let writer = FacilityWriter::Local(LocalWriter::new(text, xml, console, custom));

        Self::start(name, options, writer)
    }

    /// Open a facility which owns no targets and forwards every request through `peer` to a
    /// same-shaped facility that performs the real writing.
    ///
    /// # Errors
    ///
    /// Returns a `WorkerSpawn` error if the worker thread cannot be started.
    pub fn open_remote(
        name:    &str,
        options: FacilityOptions,
        peer:    Box<dyn RemotePeer>,
    ) -> Result<Self, FacilityError<S::Error>> {
        let writer = FacilityWriter::Remote(RemoteWriter::new(name, peer));
        Self::start(name, options, writer)
    }

    fn start(
        name:    &str,
        options: FacilityOptions,
        writer:  FacilityWriter<S>,
    ) -> Result<Self, FacilityError<S::Error>> {
        let queue = Arc::new(RequestQueue::new());
        let writer = Arc::new(Mutex::new(writer));

        let worker = spawn_worker(name, Arc::clone(&queue), Arc::clone(&writer))
            .map_err(FacilityError::WorkerSpawn)?;

        Ok(Self {
            name:      name.to_owned(),
            modes:     options.modes,
            level:     AtomicU8::new(options.level.rank()),
            linked:    options.linked_facility,
            suspended: AtomicBool::new(false),
            closing:   AtomicBool::new(false),
            closed:    false,
            queue,
            writer,
            worker:    Some(worker),
        })
    }
}

impl<S: RecordStore> LogFacility<S> {
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    #[must_use]
    pub fn level(&self) -> Severity {
        Severity::from_rank(self.level.load(Ordering::Acquire)).unwrap_or_default()
    }

    /// Raise or lower the severity filter. Takes effect for messages submitted afterwards.
    pub fn set_level(&self, level: Severity) {
        self.level.store(level.rank(), Ordering::Release);
    }

    #[must_use]
    pub fn is_suspended(&self) -> bool {
        self.suspended.load(Ordering::Acquire)
    }

    /// Stop accepting messages until [`resume`] is called. Touches only a flag, never the
    /// worker thread.
    ///
    /// [`resume`]: LogFacility::resume
    pub fn suspend(&self) {
        self.suspended.store(true, Ordering::Release);
    }

    pub fn resume(&self) {
        self.suspended.store(false, Ordering::Release);
    }

    /// Submit one message. Returns without blocking; the worker thread performs the write.
    ///
    /// The call is a no-op while the facility is suspended, once a close has begun, and for
    /// messages whose type's severity is below the facility's filter level. Type codes with no
    /// taxonomy entry (the custom range) carry no severity and are never filtered here; their
    /// disposition belongs to the custom-logging collaborator at write time.
    pub fn log_message(&self, message: &str, description: Option<&str>, message_type: u32) {
        if self.closed
            || self.suspended.load(Ordering::Acquire)
            || self.closing.load(Ordering::Acquire)
        {
            return;
        }

        if let Some(info) = message::type_info(message_type) {
            if info.severity.rank() < self.level.load(Ordering::Acquire) {
                return;
            }
        }

        self.queue.enqueue(WorkerRequest::log(message, description, message_type));
    }

    /// Drain the queue, finalize every target, and terminate the worker thread.
    ///
    /// Blocks, deliberately without a timeout, until every previously-submitted message has
    /// been fully processed, the destination files exist, and the worker thread has exited.
    /// New messages submitted after this call begins are rejected.
    ///
    /// # Errors
    ///
    /// A finalization failure is returned to the caller and the facility stays usable: the
    /// closing gate is lifted, targets which did close stay closed, and the close may be
    /// retried. Only a fully successful close is terminal; after one, repeat calls return
    /// `Ok` immediately.
    pub fn close(&mut self, cap_xml: bool) -> Result<(), FacilityError<S::Error>> {
        if self.closed {
            return Ok(());
        }

        self.closing.store(true, Ordering::Release);
        self.queue.wait_until_empty();

        let finalize_result = self.writer.lock().close_now(cap_xml);
        if let Err(err) = finalize_result {
            self.closing.store(false, Ordering::Release);
            return Err(err);
        }

        self.queue.enqueue(WorkerRequest::exit());
        if let Some(worker) = self.worker.take() {
            // A worker which panicked has nothing left to clean up.
            let _ = worker.join();
        }

        self.closed = true;
        Ok(())
    }

    /// A point-in-time description of the facility, as reported to queries.
    #[must_use]
    pub fn query(&self) -> FacilitySnapshot {
        FacilitySnapshot {
            name:            self.name.clone(),
            modes:           self.modes,
            level:           self.level(),
            suspended:       self.is_suspended(),
            linked_facility: self.linked.clone(),
            queued_requests: self.queue.len(),
            destinations:    self.writer.lock().destinations(),
        }
    }
}

impl<S: RecordStore> Debug for LogFacility<S> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("LogFacility")
            .field("name", &self.name)
            .field("modes", &self.modes)
            .field("level", &self.level())
            .field("suspended", &self.is_suspended())
            .field("closed", &self.closed)
            .field("queued", &self.queue.len())
            .finish_non_exhaustive()
    }
}

impl<S: RecordStore> Drop for LogFacility<S> {
    /// Terminate the worker thread without finalizing targets. A dropped-but-unclosed facility
    /// produces no destination files; only [`close`] does.
    ///
    /// [`close`]: LogFacility::close
    fn drop(&mut self) {
        if let Some(worker) = self.worker.take() {
            self.closing.store(true, Ordering::Release);
            self.queue.enqueue(WorkerRequest::exit());
            let _ = worker.join();
        }
    }
}


/// A point-in-time description of one facility, as reported by queries and listings.
#[derive(Debug, Clone)]
pub struct FacilitySnapshot {
    pub name:            String,
    pub modes:           TargetModes,
    pub level:           Severity,
    pub suspended:       bool,
    pub linked_facility: Option<String>,
    /// Requests accepted but not yet fully processed by the worker thread.
    pub queued_requests: usize,
    /// The destination paths of every enabled file target. Empty for remote facilities.
    pub destinations:    Vec<PathBuf>,
}
