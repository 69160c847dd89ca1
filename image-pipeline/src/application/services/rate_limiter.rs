// /////////////////////////////////////////////////////////////////////////////
// Image Loading Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Token-bucket rate limiter gating session admission (`spec.md` §4.2).
//!
//! Capacity `B = 30`, refill `R = 25/s`. A background tick task owns the
//! refill clock and hands a refilled token straight to the oldest waiter
//! rather than waking every waiter to race for it, avoiding a thundering
//! herd on the waiting queue.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use image_pipeline_domain::CancellationToken;
use parking_lot::Mutex;
use tokio::sync::{oneshot, Notify};
use tokio::time::interval;

/// Default bucket capacity per `spec.md` §4.2.
pub const DEFAULT_CAPACITY: u32 = 30;
/// Default refill rate (tokens/second) per `spec.md` §4.2.
pub const DEFAULT_REFILL_PER_SEC: u32 = 25;

struct Inner {
    tokens: u32,
    capacity: u32,
    waiters: VecDeque<oneshot::Sender<()>>,
}

/// A token-bucket gate shared by every load session awaiting admission.
pub struct RateLimiter {
    inner: Arc<Mutex<Inner>>,
}

impl RateLimiter {
    pub fn new(capacity: u32, refill_per_sec: u32) -> Self {
        let inner = Arc::new(Mutex::new(Inner {
            tokens: capacity,
            capacity,
            waiters: VecDeque::new(),
        }));

        let ticker_inner = Arc::clone(&inner);
        let period = Duration::from_secs_f64(1.0 / f64::from(refill_per_sec));
        tokio::spawn(async move {
            let mut tick = interval(period);
            loop {
                tick.tick().await;
                let mut guard = ticker_inner.lock();
                if guard.tokens < guard.capacity {
                    guard.tokens += 1;
                }
                while guard.tokens > 0 {
                    match guard.waiters.pop_front() {
                        Some(waiter) => {
                            guard.tokens -= 1;
                            // Receiver may already be gone (the waiting task
                            // was cancelled); the token is simply spent.
                            let _ = waiter.send(());
                            break;
                        }
                        None => break,
                    }
                }
            }
        });

        Self { inner }
    }

    /// Builds a limiter using the defaults from `spec.md` §4.2.
    pub fn default_pipeline() -> Self {
        Self::new(DEFAULT_CAPACITY, DEFAULT_REFILL_PER_SEC)
    }

    /// Waits until a token is available, or `token` cancels first.
    ///
    /// Returns `true` once a token has been consumed on this call's behalf,
    /// `false` if `token` cancelled before one became available — in which
    /// case the caller must drop the pending work silently (`spec.md` §4.2).
    pub async fn acquire(&self, token: &CancellationToken) -> bool {
        let pending = {
            let mut guard = self.inner.lock();
            if guard.tokens > 0 {
                guard.tokens -= 1;
                None
            } else {
                let (tx, rx) = oneshot::channel();
                guard.waiters.push_back(tx);
                Some(rx)
            }
        };

        let mut receiver = match pending {
            None => return true,
            Some(rx) => rx,
        };

        if token.is_cancelled() {
            return false;
        }

        let notify = Arc::new(Notify::new());
        let notify_cb = Arc::clone(&notify);
        token.register(move || notify_cb.notify_one());

        tokio::select! {
            res = &mut receiver => res.is_ok(),
            _ = notify.notified() => false,
        }
    }
}
