// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{
	sync::atomic::{AtomicI64, Ordering},
	thread,
	time::Duration,
};

/// Wall clock the timestamp part of an id is taken from.
pub trait Clock: Send + Sync {
	/// Milliseconds since the Unix epoch.
	fn now_ms(&self) -> i64;

	/// Blocks until at least one millisecond has passed.
	fn sleep_ms(&self) {
		thread::sleep(Duration::from_millis(1));
	}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
	fn now_ms(&self) -> i64 {
		chrono::Utc::now().timestamp_millis()
	}
}

/// A clock that only moves when told to. Sleeping advances it by one
/// millisecond.
#[derive(Debug)]
pub struct ManualClock {
	now: AtomicI64,
}

impl ManualClock {
	pub fn new(now_ms: i64) -> Self {
		Self {
			now: AtomicI64::new(now_ms),
		}
	}

	pub fn set(&self, now_ms: i64) {
		self.now.store(now_ms, Ordering::SeqCst);
	}

	pub fn advance(&self, ms: i64) {
		self.now.fetch_add(ms, Ordering::SeqCst);
	}
}

impl Clock for ManualClock {
	fn now_ms(&self) -> i64 {
		self.now.load(Ordering::SeqCst)
	}

	fn sleep_ms(&self) {
		self.advance(1);
	}
}
