//! An asynchronous session-logging engine.
//!
//! A [`FacilityRegistry`] owns any number of named [`LogFacility`] values. Each facility owns one
//! [`RequestQueue`] drained by one dedicated worker thread; any number of caller threads may
//! submit messages concurrently, and the queue is the only point of contention between them.
//! During a session, messages are formatted and appended as binary records to a [`RecordStore`]
//! stream; when a facility is closed, every record is read back in append order, decoded, and
//! materialized into the destination log file (plain text or XML, per target kind).
//!
//! [`RecordStore`]: anchored_logstore::RecordStore

mod codec;
mod error;
mod message;
mod options;
mod queue;
mod registry;
mod request;
mod worker;

mod facility;
mod target;
mod writer;

mod custom;
mod remote;


// ================================
//  Re-exports
// ================================

pub use self::{
    codec::{DecodeError, ExportError, RecordDecoder, export_records},
    custom::{BYPASS_REPLY, CustomLogger},
    error::{AlreadyExists, FacilityError, InvalidValue},
    facility::{FacilitySnapshot, LogFacility},
    message::{CUSTOM_TYPE_THRESHOLD, MessageTypeInfo, Severity, XmlShape, codes, type_info},
    options::{FacilityOptions, TargetModes},
    queue::RequestQueue,
    registry::FacilityRegistry,
    remote::{RemoteCommand, RemotePeer, RemoteSubmitError},
    request::{RequestKind, WorkerRequest},
    target::TargetFileName,
};
