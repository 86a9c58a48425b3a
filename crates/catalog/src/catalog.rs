// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{
	ops::Deref,
	sync::{
		Arc,
		atomic::{AtomicU32, Ordering},
	},
	time::{Duration, Instant},
};

use parking_lot::{Condvar, Mutex, RwLock};
use seqdb_type::Oid;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, trace};

use crate::{
	error::CatalogError,
	state::{CatalogState, SessionId},
};

/// The catalog as it survives a crash: the last committed state and the
/// object id counter.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CatalogImage {
	pub state: CatalogState,
	pub next_oid: u32,
}

/// Committed catalog plus the single-writer slot.
///
/// A transaction that changes the catalog first claims the writer slot and
/// works on a private copy of the committed state. Commit publishes the copy,
/// abort discards it. Other transactions keep reading the committed state,
/// so uncommitted DDL is never visible outside its transaction.
pub struct Catalog {
	committed: RwLock<Arc<CatalogState>>,
	durable: Mutex<Vec<u8>>,
	next_oid: AtomicU32,
	writer: Mutex<Option<u64>>,
	writer_released: Condvar,
	lock_timeout: Duration,
}

/// Catalog side of a transaction.
#[derive(Debug)]
pub struct CatalogTxn {
	owner: u64,
	session: SessionId,
	pending: Option<CatalogState>,
}

impl CatalogTxn {
	pub fn new(owner: u64, session: SessionId) -> Self {
		Self {
			owner,
			session,
			pending: None,
		}
	}

	pub fn session(&self) -> SessionId {
		self.session
	}

	pub fn has_changes(&self) -> bool {
		self.pending.is_some()
	}
}

/// Read view of the catalog for one transaction.
pub enum StateRef<'a> {
	Pending(&'a CatalogState),
	Committed(Arc<CatalogState>),
}

impl Deref for StateRef<'_> {
	type Target = CatalogState;

	fn deref(&self) -> &Self::Target {
		match self {
			StateRef::Pending(state) => state,
			StateRef::Committed(state) => state,
		}
	}
}

impl Catalog {
	pub fn new(lock_timeout: Duration) -> Self {
		Self::from_parts(
			CatalogImage {
				state: CatalogState::default(),
				next_oid: Oid::FIRST_NORMAL.0,
			},
			lock_timeout,
		)
	}

	/// Reopens the catalog from the bytes written by the last commit.
	pub fn from_image(bytes: &[u8], lock_timeout: Duration) -> crate::Result<Self> {
		let image: CatalogImage = postcard::from_bytes(bytes).map_err(|err| CatalogError::Image {
			action: "decode",
			reason: err.to_string(),
		})?;
		let catalog = Self::from_parts(image, lock_timeout);
		*catalog.durable.lock() = bytes.to_vec();
		Ok(catalog)
	}

	fn from_parts(image: CatalogImage, lock_timeout: Duration) -> Self {
		Self {
			committed: RwLock::new(Arc::new(image.state)),
			durable: Mutex::new(Vec::new()),
			next_oid: AtomicU32::new(image.next_oid.max(Oid::FIRST_NORMAL.0)),
			writer: Mutex::new(None),
			writer_released: Condvar::new(),
			lock_timeout,
		}
	}

	/// Durable bytes of the catalog as of the last commit.
	pub fn image(&self) -> Vec<u8> {
		self.durable.lock().clone()
	}

	/// Object ids are never reused, not even after an abort.
	pub fn allocate_oid(&self) -> Oid {
		Oid(self.next_oid.fetch_add(1, Ordering::SeqCst))
	}

	pub fn state<'a>(&self, txn: &'a CatalogTxn) -> StateRef<'a> {
		match &txn.pending {
			Some(state) => StateRef::Pending(state),
			None => StateRef::Committed(self.committed.read().clone()),
		}
	}

	/// Mutable catalog state of the transaction, claiming the writer slot
	/// on first use.
	pub fn state_mut<'a>(&self, txn: &'a mut CatalogTxn) -> crate::Result<&'a mut CatalogState> {
		if txn.pending.is_none() {
			self.claim_writer(txn.owner)?;
			trace!(owner = txn.owner, "catalog writer claimed");
		}
		Ok(txn.pending.get_or_insert_with(|| self.committed.read().as_ref().clone()))
	}

	fn claim_writer(&self, owner: u64) -> crate::Result<()> {
		let deadline = Instant::now() + self.lock_timeout;
		let mut writer = self.writer.lock();
		loop {
			match *writer {
				None => {
					*writer = Some(owner);
					return Ok(());
				}
				Some(current) if current == owner => return Ok(()),
				Some(_) => {
					if self.writer_released.wait_until(&mut writer, deadline).timed_out() && writer.is_some()
					{
						return Err(CatalogError::CatalogLockTimeout.into());
					}
				}
			}
		}
	}

	fn release_writer(&self, owner: u64) {
		let mut writer = self.writer.lock();
		if *writer == Some(owner) {
			*writer = None;
			self.writer_released.notify_all();
		}
	}

	/// Publishes the transaction's changes and persists the new state.
	#[instrument(name = "catalog::commit", level = "debug", skip_all, fields(owner = txn.owner))]
	pub fn commit(&self, txn: &mut CatalogTxn) -> crate::Result<()> {
		let Some(state) = txn.pending.take() else {
			return Ok(());
		};

		let image = CatalogImage {
			state,
			next_oid: self.next_oid.load(Ordering::SeqCst),
		};
		let bytes = postcard::to_allocvec(&image).map_err(|err| CatalogError::Image {
			action: "encode",
			reason: err.to_string(),
		});

		match bytes {
			Ok(bytes) => {
				*self.committed.write() = Arc::new(image.state);
				*self.durable.lock() = bytes;
				debug!("catalog changes committed");
				self.release_writer(txn.owner);
				Ok(())
			}
			Err(err) => {
				self.release_writer(txn.owner);
				Err(err.into())
			}
		}
	}

	pub fn abort(&self, txn: &mut CatalogTxn) {
		if txn.pending.take().is_some() {
			debug!(owner = txn.owner, "catalog changes discarded");
			self.release_writer(txn.owner);
		}
	}
}
