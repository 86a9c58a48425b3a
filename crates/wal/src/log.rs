// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use parking_lot::Mutex;
use seqdb_storage::WalFlush;
use seqdb_type::Lsn;
use tracing::{instrument, trace};

use crate::{reader::WalReader, record::Record};

/// Position of the first record. Lsn 0 is reserved for "invalid" and the
/// first bytes mirror a segment header that is never written.
pub const FIRST_LSN: Lsn = Lsn(16);

/// The durable part of the log: everything flushed plus the redo pointer of
/// the last completed checkpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct WalImage {
	pub bytes: Vec<u8>,
	pub redo: Lsn,
}

impl Default for WalImage {
	fn default() -> Self {
		Self {
			bytes: Vec::new(),
			redo: FIRST_LSN,
		}
	}
}

struct WalInner {
	bytes: Vec<u8>,
	flushed: usize,
	redo: Lsn,
}

/// Append-only log. Records are assigned their position under the insert
/// lock, so positions are strictly increasing in insertion order.
pub struct Wal {
	inner: Mutex<WalInner>,
}

impl Wal {
	pub fn new(capacity_hint: usize) -> Self {
		Self {
			inner: Mutex::new(WalInner {
				bytes: Vec::with_capacity(capacity_hint),
				flushed: 0,
				redo: FIRST_LSN,
			}),
		}
	}

	/// Reopens a log from its durable image. Anything past the flushed
	/// prefix was lost with the crash.
	pub fn from_image(image: WalImage) -> Self {
		let flushed = image.bytes.len();
		Self {
			inner: Mutex::new(WalInner {
				bytes: image.bytes,
				flushed,
				redo: image.redo,
			}),
		}
	}

	pub fn image(&self) -> WalImage {
		let inner = self.inner.lock();
		WalImage {
			bytes: inner.bytes[..inner.flushed].to_vec(),
			redo: inner.redo,
		}
	}

	/// Appends a record and returns the position just past it. That end
	/// position is what callers stamp on the pages the record describes.
	#[instrument(name = "wal::log::insert", level = "trace", skip_all, fields(rmgr = %record.rmgr, info = record.info))]
	pub fn insert(&self, record: &Record) -> Lsn {
		let encoded = record.encode();
		let mut inner = self.inner.lock();
		inner.bytes.extend_from_slice(&encoded);
		let end = to_lsn(inner.bytes.len());
		trace!(%end, len = encoded.len(), "inserted record");
		end
	}

	pub fn insert_lsn(&self) -> Lsn {
		to_lsn(self.inner.lock().bytes.len())
	}

	pub fn flushed_lsn(&self) -> Lsn {
		to_lsn(self.inner.lock().flushed)
	}

	/// Makes the log durable at least up to `upto`. Group commit style: the
	/// whole inserted prefix is flushed at once.
	pub fn flush(&self, upto: Lsn) {
		let mut inner = self.inner.lock();
		if to_lsn(inner.flushed) >= upto {
			return;
		}
		inner.flushed = inner.bytes.len();
		trace!(flushed = %to_lsn(inner.flushed), "flushed log");
	}

	/// Redo pointer of the last checkpoint. Pages whose LSN is at or before
	/// it may be torn by a crash and get no help from replay.
	pub fn redo_ptr(&self) -> Lsn {
		self.inner.lock().redo
	}

	pub fn set_redo_ptr(&self, redo: Lsn) {
		self.inner.lock().redo = redo;
	}

	/// Iterates the records starting at `from`. The iterator works on a
	/// snapshot of the log taken now.
	pub fn reader(&self, from: Lsn) -> WalReader {
		let inner = self.inner.lock();
		WalReader::new(inner.bytes.clone(), FIRST_LSN, from)
	}
}

impl WalFlush for Wal {
	fn flush_wal(&self, upto: Lsn) -> seqdb_type::Result<()> {
		self.flush(upto);
		Ok(())
	}
}

fn to_lsn(offset: usize) -> Lsn {
	Lsn(FIRST_LSN.0 + offset as u64)
}
