// /////////////////////////////////////////////////////////////////////////////
// Image Loading Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Bounded, priority-aware operation queue (`spec.md` §4.3).
//!
//! A plain `tokio::sync::Semaphore` only gives FIFO admission; this queue
//! needs priority order with enqueue-time tie-breaking and the ability to
//! re-sort the waiting region when an already-enqueued item's priority
//! changes, so it is hand-rolled on top of `parking_lot::Mutex` +
//! `tokio::sync::oneshot`, in the spirit of this workspace's own
//! RAII-permit (`SemaphorePermit`-returning `acquire_cpu`/`acquire_io`)
//! idiom — generalized here from a single FIFO count to a priority-ordered
//! waiting region.

use std::sync::Arc;

use image_pipeline_domain::value_objects::{priority_then_fifo, Priority};
use parking_lot::Mutex;
use tokio::sync::oneshot;

struct Waiting {
    id: u64,
    priority: Priority,
    seq: u64,
    sender: Option<oneshot::Sender<()>>,
}

struct Inner {
    cap: usize,
    in_flight: usize,
    waiting: Vec<Waiting>,
    next_id: u64,
    next_seq: u64,
}

impl Inner {
    /// Admits waiting items, highest priority (then earliest enqueued)
    /// first, until the queue is full or the waiting region is empty.
    fn admit_more(&mut self) {
        while self.in_flight < self.cap {
            let best = self
                .waiting
                .iter()
                .enumerate()
                .min_by(|(_, a), (_, b)| priority_then_fifo((a.priority, a.seq), (b.priority, b.seq)))
                .map(|(idx, _)| idx);

            let Some(idx) = best else { break };
            let mut waiting = self.waiting.remove(idx);
            if let Some(sender) = waiting.sender.take() {
                if sender.send(()).is_ok() {
                    self.in_flight += 1;
                }
                // Receiver already gone (ticket was cancelled racing
                // admission) — its slot is simply not claimed this round.
            }
        }
    }
}

/// A handle to one enqueued operation, used to wait for admission or adjust
/// its priority while it is still waiting.
pub struct QueueTicket {
    id: u64,
    queue: OperationQueue,
    receiver: Option<oneshot::Receiver<()>>,
}

impl QueueTicket {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Waits for admission, or returns `None` if `token` cancels first.
    /// A cancelled ticket is removed from the waiting region immediately
    /// (`spec.md` §4.3).
    pub async fn admit(mut self, token: &image_pipeline_domain::CancellationToken) -> Option<Permit> {
        let Some(mut receiver) = self.receiver.take() else {
            return Some(Permit {
                queue: self.queue.clone(),
            });
        };

        if token.is_cancelled() {
            self.queue.cancel_waiting(self.id);
            return None;
        }

        let notify = Arc::new(tokio::sync::Notify::new());
        let notify_cb = Arc::clone(&notify);
        token.register(move || notify_cb.notify_one());

        tokio::select! {
            res = &mut receiver => {
                if res.is_ok() {
                    Some(Permit { queue: self.queue.clone() })
                } else {
                    None
                }
            }
            _ = notify.notified() => {
                self.queue.cancel_waiting(self.id);
                None
            }
        }
    }
}

/// An admitted in-flight slot. Releases its slot and admits the next
/// waiting item (by priority) when dropped.
pub struct Permit {
    queue: OperationQueue,
}

impl Drop for Permit {
    fn drop(&mut self) {
        let mut inner = self.queue.inner.lock();
        inner.in_flight = inner.in_flight.saturating_sub(1);
        inner.admit_more();
    }
}

/// A bounded, priority-ordered admission gate. Cheaply cloneable; all clones
/// share the same underlying waiting region and in-flight count.
#[derive(Clone)]
pub struct OperationQueue {
    inner: Arc<Mutex<Inner>>,
}

impl OperationQueue {
    pub fn new(cap: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                cap,
                in_flight: 0,
                waiting: Vec::new(),
                next_id: 0,
                next_seq: 0,
            })),
        }
    }

    /// Enqueues an operation at `priority`, returning a ticket that either
    /// admits immediately (queue has spare capacity) or must be awaited.
    pub fn enqueue(&self, priority: Priority) -> QueueTicket {
        let mut inner = self.inner.lock();
        let id = inner.next_id;
        inner.next_id += 1;

        if inner.in_flight < inner.cap {
            inner.in_flight += 1;
            QueueTicket {
                id,
                queue: self.clone(),
                receiver: None,
            }
        } else {
            let seq = inner.next_seq;
            inner.next_seq += 1;
            let (tx, rx) = oneshot::channel();
            inner.waiting.push(Waiting {
                id,
                priority,
                seq,
                sender: Some(tx),
            });
            QueueTicket {
                id,
                queue: self.clone(),
                receiver: Some(rx),
            }
        }
    }

    /// Re-sorts `id`'s position in the waiting region after its priority
    /// changed. A no-op if `id` has already been admitted or cancelled
    /// (in-flight items are never preempted — `spec.md` §4.3, §9).
    pub fn reprioritize(&self, id: u64, priority: Priority) {
        let mut inner = self.inner.lock();
        if let Some(waiting) = inner.waiting.iter_mut().find(|w| w.id == id) {
            waiting.priority = priority;
        }
    }

    fn cancel_waiting(&self, id: u64) {
        let mut inner = self.inner.lock();
        inner.waiting.retain(|w| w.id != id);
    }

    pub fn in_flight(&self) -> usize {
        self.inner.lock().in_flight
    }

    pub fn waiting_len(&self) -> usize {
        self.inner.lock().waiting.len()
    }
}
