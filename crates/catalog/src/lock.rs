// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{
	collections::HashMap,
	fmt::{Display, Formatter},
	time::{Duration, Instant},
};

use parking_lot::{Condvar, Mutex};
use seqdb_type::RelationId;
use tracing::{instrument, trace};

use crate::error::CatalogError;

/// Relation lock modes, weakest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LockMode {
	AccessShare,
	RowExclusive,
	ShareRowExclusive,
	AccessExclusive,
}

impl LockMode {
	pub fn conflicts_with(&self, other: LockMode) -> bool {
		use LockMode::*;
		match (*self, other) {
			(AccessExclusive, _) | (_, AccessExclusive) => true,
			(AccessShare, _) | (_, AccessShare) => false,
			(RowExclusive, RowExclusive) => false,
			_ => true,
		}
	}
}

impl Display for LockMode {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			LockMode::AccessShare => f.write_str("AccessShareLock"),
			LockMode::RowExclusive => f.write_str("RowExclusiveLock"),
			LockMode::ShareRowExclusive => f.write_str("ShareRowExclusiveLock"),
			LockMode::AccessExclusive => f.write_str("AccessExclusiveLock"),
		}
	}
}

/// Heavyweight relation locks, held by a transaction until it ends.
/// A holder never conflicts with itself, so upgrading succeeds as long as
/// nobody else holds a conflicting mode.
pub struct LockManager {
	held: Mutex<HashMap<RelationId, Vec<(u64, LockMode)>>>,
	released: Condvar,
	timeout: Duration,
}

impl LockManager {
	pub fn new(timeout: Duration) -> Self {
		Self {
			held: Mutex::new(HashMap::new()),
			released: Condvar::new(),
			timeout,
		}
	}

	/// Acquires `mode` on the relation for `owner`, waiting at most the lock
	/// timeout for conflicting holders to go away.
	#[instrument(name = "catalog::lock::acquire", level = "trace", skip(self, name))]
	pub fn acquire(&self, owner: u64, relation: RelationId, mode: LockMode, name: &str) -> crate::Result<()> {
		let deadline = Instant::now() + self.timeout;
		let mut held = self.held.lock();
		loop {
			let holders = held.entry(relation).or_default();
			let blocked = holders
				.iter()
				.any(|(holder, held_mode)| *holder != owner && held_mode.conflicts_with(mode));
			if !blocked {
				if !holders.contains(&(owner, mode)) {
					holders.push((owner, mode));
				}
				trace!(%mode, "lock granted");
				return Ok(());
			}

			if self.released.wait_until(&mut held, deadline).timed_out() {
				let still_blocked = held.get(&relation).is_some_and(|holders| {
					holders.iter().any(|(holder, held_mode)| *holder != owner && held_mode.conflicts_with(mode))
				});
				if still_blocked {
					return Err(CatalogError::LockTimeout {
						name: name.to_string(),
					}
					.into());
				}
			}
		}
	}

	pub fn holds(&self, owner: u64, relation: RelationId, mode: LockMode) -> bool {
		self.held.lock().get(&relation).is_some_and(|holders| holders.contains(&(owner, mode)))
	}

	/// Releases every lock of `owner`. Called at transaction end.
	pub fn release_all(&self, owner: u64) {
		let mut held = self.held.lock();
		held.retain(|_, holders| {
			holders.retain(|(holder, _)| *holder != owner);
			!holders.is_empty()
		});
		self.released.notify_all();
	}
}
