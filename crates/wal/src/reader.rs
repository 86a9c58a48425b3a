// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use seqdb_type::Lsn;
use tracing::debug;

use crate::record::Record;

#[derive(Debug, Clone, PartialEq)]
pub struct DecodedRecord {
	pub start: Lsn,
	pub end: Lsn,
	pub record: Record,
}

/// Sequential reader. Iteration ends at the end of the log or at the first
/// record that does not decode, which marks a torn tail.
pub struct WalReader {
	bytes: Vec<u8>,
	base: Lsn,
	position: usize,
	done: bool,
}

impl WalReader {
	pub(crate) fn new(bytes: Vec<u8>, base: Lsn, from: Lsn) -> Self {
		let position = from.0.saturating_sub(base.0) as usize;
		Self {
			bytes,
			base,
			position,
			done: false,
		}
	}

	fn lsn(&self, offset: usize) -> Lsn {
		Lsn(self.base.0 + offset as u64)
	}
}

impl Iterator for WalReader {
	type Item = DecodedRecord;

	fn next(&mut self) -> Option<Self::Item> {
		if self.done || self.position >= self.bytes.len() {
			return None;
		}

		match Record::decode(&self.bytes[self.position..]) {
			Ok((record, len)) => {
				let start = self.lsn(self.position);
				self.position += len;
				Some(DecodedRecord {
					start,
					end: self.lsn(self.position),
					record,
				})
			}
			Err(err) => {
				debug!(at = %self.lsn(self.position), reason = %err.message, "end of log");
				self.done = true;
				None
			}
		}
	}
}
