use std::{io::Error as IoError, sync::Arc, time::Duration};
use std::thread::{self, JoinHandle};

use parking_lot::Mutex;

use anchored_logstore::RecordStore;

use crate::queue::RequestQueue;
use crate::request::RequestKind;
use crate::writer::FacilityWriter;


/// Upper bound on the worker's idle sleep. An enqueue interrupts the sleep immediately; this
/// bound only caps how long the thread stays asleep between wake signals.
pub(crate) const IDLE_WAIT: Duration = Duration::from_millis(100);

/// Spawn the single consumer thread of one facility's queue.
///
/// The worker peeks the oldest request, handles it, and only then dequeues it, so the queue
/// reports non-empty for as long as a request is in flight. A `Log` request which fails to
/// write is logged and dropped; it never stops the worker. The loop exits only after processing
/// an `Exit` request.
pub(crate) fn spawn_worker<S>(
    facility: &str,
    queue:    Arc<RequestQueue>,
    writer:   Arc<Mutex<FacilityWriter<S>>>,
) -> Result<JoinHandle<()>, IoError>
where
    S: RecordStore + Send + 'static,
{
    thread::Builder::new()
        .name(format!("logbook-{facility}"))
        .spawn(move || {
            let mut exiting = false;

            while !exiting {
                let Some(request) = queue.wait_for_request(IDLE_WAIT) else {
                    continue;
                };

                match request.kind {
                    RequestKind::Log => {
                        if let Err(err) = writer.lock().write(&request) {
                            // Drop this one record; the worker and its facility live on.
                            tracing::warn!("dropped one log record: {err}");
                        }
                    }
                    RequestKind::Exit => exiting = true,
                }

                queue.dequeue();
            }
        })
}
