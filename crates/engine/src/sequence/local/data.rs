// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use seqdb_storage::HeapTuple;

pub const SEQ_LOCAL_MAGIC: u32 = 0x1717;

/// Values fetched ahead of use and covered by one log record.
pub const SEQ_LOCAL_LOG_VALS: i64 = 32;

pub const SEQ_LOCAL_NATTS: u16 = 3;

/// `last_value i64 | log_cnt i64 | is_called u8`, little-endian.
pub const SEQ_LOCAL_DATA_SIZE: usize = 17;

/// The one row a local sequence stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalSequenceData {
	pub last_value: i64,
	/// Values that may still be handed out before the next log record.
	pub log_cnt: i64,
	pub is_called: bool,
}

impl LocalSequenceData {
	pub fn new(last_value: i64, is_called: bool) -> Self {
		Self {
			last_value,
			log_cnt: 0,
			is_called,
		}
	}

	pub fn decode(bytes: &[u8]) -> crate::Result<Self> {
		if bytes.len() < SEQ_LOCAL_DATA_SIZE {
			return seqdb_type::internal_err!("sequence tuple holds {} bytes, expected {}", bytes.len(), SEQ_LOCAL_DATA_SIZE);
		}

		let mut last_value = [0u8; 8];
		last_value.copy_from_slice(&bytes[0..8]);
		let mut log_cnt = [0u8; 8];
		log_cnt.copy_from_slice(&bytes[8..16]);

		Ok(Self {
			last_value: i64::from_le_bytes(last_value),
			log_cnt: i64::from_le_bytes(log_cnt),
			is_called: bytes[16] != 0,
		})
	}

	pub fn encode(&self) -> [u8; SEQ_LOCAL_DATA_SIZE] {
		let mut out = [0u8; SEQ_LOCAL_DATA_SIZE];
		self.write(&mut out);
		out
	}

	/// Overwrites the row in place, e.g. inside a locked page.
	pub fn write(&self, bytes: &mut [u8]) {
		bytes[0..8].copy_from_slice(&self.last_value.to_le_bytes());
		bytes[8..16].copy_from_slice(&self.log_cnt.to_le_bytes());
		bytes[16] = self.is_called as u8;
	}

	pub fn tuple(&self) -> HeapTuple {
		HeapTuple::form(SEQ_LOCAL_NATTS, &self.encode())
	}
}
