// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Heap tuple header.
//!
//! ```text
//! 0  xmin       u32
//! 4  xmax       u32
//! 8  cid        u32
//! 12 ctid       block hi u16, block lo u16, offset u16
//! 18 infomask2  u16   (low 11 bits: number of attributes)
//! 20 infomask   u16
//! 22 hoff       u8    (offset of the user data)
//! ```

use seqdb_type::{BlockNumber, OffsetNumber, TransactionId};

use crate::{error::StorageError, page::maxalign};

pub const SIZE_OF_HEAP_TUPLE_HEADER: usize = 23;

pub const HEAP_XMIN_COMMITTED: u16 = 0x0100;
pub const HEAP_XMIN_INVALID: u16 = 0x0200;
pub const HEAP_XMIN_FROZEN: u16 = HEAP_XMIN_COMMITTED | HEAP_XMIN_INVALID;
pub const HEAP_XMAX_COMMITTED: u16 = 0x0400;
pub const HEAP_XMAX_INVALID: u16 = 0x0800;
pub const HEAP_NATTS_MASK: u16 = 0x07FF;

pub const FIRST_COMMAND_ID: u32 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemPointer {
	pub block: BlockNumber,
	pub offset: OffsetNumber,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeapTupleHeader {
	pub xmin: TransactionId,
	pub xmax: TransactionId,
	pub cid: u32,
	pub ctid: ItemPointer,
	pub infomask2: u16,
	pub infomask: u16,
	pub hoff: u8,
}

impl HeapTupleHeader {
	/// Header of a tuple that is visible to everyone forever: xmin frozen,
	/// xmax invalid, pointing at itself in block 0 slot 1. Relations that
	/// are never vacuumed store their tuples this way.
	pub fn frozen(natts: u16) -> Self {
		Self {
			xmin: TransactionId::FROZEN,
			xmax: TransactionId::INVALID,
			cid: FIRST_COMMAND_ID,
			ctid: ItemPointer {
				block: 0,
				offset: 1,
			},
			infomask2: natts & HEAP_NATTS_MASK,
			infomask: HEAP_XMIN_FROZEN | HEAP_XMAX_INVALID,
			hoff: maxalign(SIZE_OF_HEAP_TUPLE_HEADER) as u8,
		}
	}

	pub fn natts(&self) -> u16 {
		self.infomask2 & HEAP_NATTS_MASK
	}

	pub fn is_xmin_frozen(&self) -> bool {
		self.infomask & HEAP_XMIN_FROZEN == HEAP_XMIN_FROZEN
	}

	pub fn read(bytes: &[u8]) -> crate::Result<Self> {
		if bytes.len() < SIZE_OF_HEAP_TUPLE_HEADER {
			return Err(StorageError::TupleTooShort {
				len: bytes.len(),
			}
			.into());
		}

		let header = Self {
			xmin: TransactionId(read_u32(bytes, 0)),
			xmax: TransactionId(read_u32(bytes, 4)),
			cid: read_u32(bytes, 8),
			ctid: ItemPointer {
				block: ((read_u16(bytes, 12) as u32) << 16) | read_u16(bytes, 14) as u32,
				offset: read_u16(bytes, 16),
			},
			infomask2: read_u16(bytes, 18),
			infomask: read_u16(bytes, 20),
			hoff: bytes[22],
		};

		if (header.hoff as usize) < SIZE_OF_HEAP_TUPLE_HEADER || header.hoff as usize > bytes.len() {
			return Err(StorageError::TupleTooShort {
				len: bytes.len(),
			}
			.into());
		}
		Ok(header)
	}

	pub fn write(&self, bytes: &mut [u8]) {
		bytes[0..4].copy_from_slice(&self.xmin.0.to_le_bytes());
		bytes[4..8].copy_from_slice(&self.xmax.0.to_le_bytes());
		bytes[8..12].copy_from_slice(&self.cid.to_le_bytes());
		bytes[12..14].copy_from_slice(&((self.ctid.block >> 16) as u16).to_le_bytes());
		bytes[14..16].copy_from_slice(&(self.ctid.block as u16).to_le_bytes());
		bytes[16..18].copy_from_slice(&self.ctid.offset.to_le_bytes());
		bytes[18..20].copy_from_slice(&self.infomask2.to_le_bytes());
		bytes[20..22].copy_from_slice(&self.infomask.to_le_bytes());
		bytes[22] = self.hoff;
	}
}

/// A complete tuple: header, alignment padding and user data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeapTuple {
	header: HeapTupleHeader,
	bytes: Vec<u8>,
}

impl HeapTuple {
	/// Forms a frozen tuple around `data`.
	pub fn form(natts: u16, data: &[u8]) -> Self {
		let header = HeapTupleHeader::frozen(natts);
		let mut bytes = vec![0u8; header.hoff as usize + data.len()];
		header.write(&mut bytes);
		bytes[header.hoff as usize..].copy_from_slice(data);
		Self {
			header,
			bytes,
		}
	}

	pub fn from_bytes(bytes: &[u8]) -> crate::Result<Self> {
		let header = HeapTupleHeader::read(bytes)?;
		Ok(Self {
			header,
			bytes: bytes.to_vec(),
		})
	}

	pub fn header(&self) -> &HeapTupleHeader {
		&self.header
	}

	pub fn data(&self) -> &[u8] {
		&self.bytes[self.header.hoff as usize..]
	}

	pub fn data_mut(&mut self) -> &mut [u8] {
		let hoff = self.header.hoff as usize;
		&mut self.bytes[hoff..]
	}

	pub fn as_bytes(&self) -> &[u8] {
		&self.bytes
	}

	pub fn len(&self) -> usize {
		self.bytes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.bytes.is_empty()
	}
}

/// Clears a raw xmax left behind on an in-page tuple. This is a hint-style
/// change: callers mark the buffer dirty but never WAL-log it. Returns
/// whether anything changed.
pub fn clear_stale_xmax(tuple: &mut [u8]) -> crate::Result<bool> {
	let mut header = HeapTupleHeader::read(tuple)?;
	if !header.xmax.is_valid() {
		return Ok(false);
	}
	header.xmax = TransactionId::INVALID;
	header.infomask &= !HEAP_XMAX_COMMITTED;
	header.infomask |= HEAP_XMAX_INVALID;
	header.write(tuple);
	Ok(true)
}

/// User data of an in-page tuple.
pub fn tuple_data(tuple: &[u8]) -> crate::Result<&[u8]> {
	let header = HeapTupleHeader::read(tuple)?;
	Ok(&tuple[header.hoff as usize..])
}

pub fn tuple_data_mut(tuple: &mut [u8]) -> crate::Result<&mut [u8]> {
	let header = HeapTupleHeader::read(tuple)?;
	Ok(&mut tuple[header.hoff as usize..])
}

fn read_u16(bytes: &[u8], at: usize) -> u16 {
	u16::from_le_bytes([bytes[at], bytes[at + 1]])
}

fn read_u32(bytes: &[u8], at: usize) -> u32 {
	u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

#[cfg(test)]
mod tests {
	use seqdb_type::TransactionId;

	use super::*;

	#[test]
	fn test_form_frozen() {
		let tuple = HeapTuple::form(3, &[1, 2, 3, 4]);

		assert_eq!(tuple.len(), 28);
		assert_eq!(tuple.data(), &[1, 2, 3, 4]);

		let header = HeapTupleHeader::read(tuple.as_bytes()).unwrap();
		assert_eq!(header.xmin, TransactionId::FROZEN);
		assert!(!header.xmax.is_valid());
		assert!(header.is_xmin_frozen());
		assert_ne!(header.infomask & HEAP_XMAX_INVALID, 0);
		assert_eq!(header.natts(), 3);
		assert_eq!(header.hoff, 24);
		assert_eq!(
			header.ctid,
			ItemPointer {
				block: 0,
				offset: 1
			}
		);
	}

	#[test]
	fn test_clear_stale_xmax() {
		let tuple = HeapTuple::form(1, &[9]);
		let mut bytes = tuple.as_bytes().to_vec();

		assert!(!clear_stale_xmax(&mut bytes).unwrap());

		let mut header = HeapTupleHeader::read(&bytes).unwrap();
		header.xmax = TransactionId(777);
		header.infomask = (header.infomask & !HEAP_XMAX_INVALID) | HEAP_XMAX_COMMITTED;
		header.write(&mut bytes);

		assert!(clear_stale_xmax(&mut bytes).unwrap());
		let header = HeapTupleHeader::read(&bytes).unwrap();
		assert_eq!(header.xmax, TransactionId::INVALID);
		assert_eq!(header.infomask & HEAP_XMAX_COMMITTED, 0);
		assert_ne!(header.infomask & HEAP_XMAX_INVALID, 0);
		assert_eq!(tuple_data(&bytes).unwrap(), &[9]);
	}

	#[test]
	fn test_short_tuple() {
		assert!(HeapTupleHeader::read(&[0u8; 10]).is_err());
	}
}
