use std::{collections::VecDeque, time::Duration};

use parking_lot::{Condvar, Mutex};

use crate::request::WorkerRequest;


/// A thread-safe FIFO of [`WorkerRequest`]s. Insertion order is processing order.
///
/// One mutex guards the whole queue; every method is mutually exclusive with every other. Two
/// condition variables carry the queue's signals, so neither the worker's idle wait nor a
/// drain wait ever has to poll:
///
/// - [`enqueue`] signals the worker, which sleeps in [`wait_for_request`] when idle, so a new
///   request is picked up promptly rather than after a full poll interval.
/// - [`dequeue`] (and [`clear`]) signal [`wait_until_empty`], which a close uses to drain.
///
/// The worker removes a request only *after* fully handling it (peek, handle, then dequeue), so
/// a concurrent "is the queue empty" drain check can never race past an in-flight request.
///
/// [`enqueue`]: RequestQueue::enqueue
/// [`dequeue`]: RequestQueue::dequeue
/// [`clear`]: RequestQueue::clear
/// [`wait_for_request`]: RequestQueue::wait_for_request
/// [`wait_until_empty`]: RequestQueue::wait_until_empty
#[derive(Debug, Default)]
pub struct RequestQueue {
    requests: Mutex<VecDeque<WorkerRequest>>,
    /// Signalled on enqueue.
    enqueued: Condvar,
    /// Signalled whenever requests are removed.
    dequeued: Condvar,
}

impl RequestQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a request to the back of the queue and wake the worker if it is idle.
    pub fn enqueue(&self, request: WorkerRequest) {
        let mut requests = self.requests.lock();
        requests.push_back(request);
        self.enqueued.notify_one();
    }

    /// Return a copy of the oldest request without removing it, or `None` if the queue is empty.
    #[must_use]
    pub fn peek(&self) -> Option<WorkerRequest> {
        self.requests.lock().front().cloned()
    }

    /// Remove and return the oldest request, or `None` if the queue is empty.
    pub fn dequeue(&self) -> Option<WorkerRequest> {
        let mut requests = self.requests.lock();
        let request = requests.pop_front();

        if request.is_some() {
            self.dequeued.notify_all();
        }
        request
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.requests.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.requests.lock().is_empty()
    }

    /// Remove every queued request without processing them.
    pub fn clear(&self) {
        let mut requests = self.requests.lock();
        requests.clear();
        self.dequeued.notify_all();
    }

    /// Return a copy of the oldest request, sleeping for at most `idle_wait` if the queue is
    /// currently empty. An [`enqueue`] interrupts the sleep immediately.
    ///
    /// Returns `None` if the wait timed out with the queue still empty.
    ///
    /// [`enqueue`]: RequestQueue::enqueue
    #[must_use]
    pub fn wait_for_request(&self, idle_wait: Duration) -> Option<WorkerRequest> {
        let mut requests = self.requests.lock();

        if let Some(request) = requests.front() {
            return Some(request.clone());
        }

        let _timed_out = self.enqueued.wait_for(&mut requests, idle_wait);
        requests.front().cloned()
    }

    /// Block until the queue is empty. Returns immediately if it already is.
    ///
    /// Because the worker dequeues only after handling a request, returning from this function
    /// means every previously-enqueued request has been fully processed, not merely claimed.
    pub fn wait_until_empty(&self) {
        let mut requests = self.requests.lock();

        while !requests.is_empty() {
            self.dequeued.wait(&mut requests);
        }
    }
}


#[cfg(test)]
mod tests {
    use std::{sync::Arc, thread, time::Instant};

    use crate::request::RequestKind;
    use super::*;


    #[test]
    fn fifo_order_is_preserved() {
        let queue = RequestQueue::new();

        for i in 0..10 {
            queue.enqueue(WorkerRequest::log(&format!("msg-{i}"), None, 1));
        }

        for i in 0..10 {
            let request = queue.dequeue().unwrap();
            assert_eq!(request.message, format!("msg-{i}"));
        }
        assert!(queue.is_empty());
    }

    #[test]
    fn peek_does_not_remove() {
        let queue = RequestQueue::new();
        queue.enqueue(WorkerRequest::exit());

        assert_eq!(queue.peek().unwrap().kind, RequestKind::Exit);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.dequeue().unwrap().kind, RequestKind::Exit);
        assert!(queue.dequeue().is_none());
    }

    #[test]
    fn enqueue_interrupts_an_idle_wait() {
        let queue = Arc::new(RequestQueue::new());

        let waiter = thread::spawn({
            let queue = Arc::clone(&queue);
            move || {
                let start = Instant::now();
                let request = queue.wait_for_request(Duration::from_secs(30));
                (request, start.elapsed())
            }
        });

        // Give the waiter a moment to actually start waiting.
        thread::sleep(Duration::from_millis(50));
        queue.enqueue(WorkerRequest::log("wake up", None, 1));

        let (request, waited) = waiter.join().unwrap();
        assert_eq!(request.unwrap().message, "wake up");
        // Far below the 30-second timeout: the enqueue signal woke the waiter.
        assert!(waited < Duration::from_secs(5));
    }

    #[test]
    fn wait_until_empty_blocks_for_the_drain() {
        let queue = Arc::new(RequestQueue::new());
        queue.enqueue(WorkerRequest::log("pending", None, 1));

        let drainer = thread::spawn({
            let queue = Arc::clone(&queue);
            move || {
                thread::sleep(Duration::from_millis(50));
                queue.dequeue();
            }
        });

        queue.wait_until_empty();
        assert!(queue.is_empty());
        drainer.join().unwrap();
    }
}
