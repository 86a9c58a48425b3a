// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Record wire format (little-endian):
//!
//! ```text
//! header   total_len u32 | xid u32 | rmgr u8 | info u8 | nblocks u8 | pad u8 | checksum u64
//! block    spc u32 | db u32 | rel u32 | fork u8 | flags u8 | block u32 [| image_len u32 | image]
//! data     data_len u32 | data
//! ```
//!
//! The checksum is the xxh3 hash of the whole record with the checksum
//! field zeroed.

use std::fmt::{Display, Formatter};

use seqdb_type::{BlockNumber, ForkNumber, RelFileLocator, RelFileNumber, TransactionId};
use xxhash_rust::xxh3::xxh3_64;

use crate::error::WalError;

pub const RECORD_HEADER_SIZE: usize = 20;
const CHECKSUM_OFFSET: usize = 12;

const BLOCK_WILL_INIT: u8 = 0x01;
const BLOCK_HAS_IMAGE: u8 = 0x02;

/// Identifies the resource manager that owns a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RmgrId(pub u8);

impl RmgrId {
	pub const XLOG: RmgrId = RmgrId(0);
	pub const XACT: RmgrId = RmgrId(1);
	pub const SMGR: RmgrId = RmgrId(2);
	pub const GENERIC: RmgrId = RmgrId(3);
	pub const SEQ_LOCAL: RmgrId = RmgrId(4);
}

impl Display for RmgrId {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		Display::fmt(&self.0, f)
	}
}

/// A page touched by a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockRef {
	pub locator: RelFileLocator,
	pub fork: ForkNumber,
	pub block: BlockNumber,
	/// Replay reinitializes the page from scratch.
	pub will_init: bool,
	/// Full page image to restore verbatim.
	pub image: Option<Vec<u8>>,
}

impl BlockRef {
	pub fn new(locator: RelFileLocator, fork: ForkNumber, block: BlockNumber) -> Self {
		Self {
			locator,
			fork,
			block,
			will_init: false,
			image: None,
		}
	}

	pub fn will_init(mut self) -> Self {
		self.will_init = true;
		self
	}

	pub fn with_image(mut self, image: Vec<u8>) -> Self {
		self.image = Some(image);
		self
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
	pub xid: TransactionId,
	pub rmgr: RmgrId,
	pub info: u8,
	pub blocks: Vec<BlockRef>,
	pub data: Vec<u8>,
}

impl Record {
	pub fn new(rmgr: RmgrId, info: u8) -> Self {
		Self {
			xid: TransactionId::INVALID,
			rmgr,
			info,
			blocks: Vec::new(),
			data: Vec::new(),
		}
	}

	pub fn with_xid(mut self, xid: TransactionId) -> Self {
		self.xid = xid;
		self
	}

	pub fn with_block(mut self, block: BlockRef) -> Self {
		self.blocks.push(block);
		self
	}

	/// Appends to the main data of the record.
	pub fn with_data(mut self, data: &[u8]) -> Self {
		self.data.extend_from_slice(data);
		self
	}

	pub fn encode(&self) -> Vec<u8> {
		let mut out = Vec::with_capacity(RECORD_HEADER_SIZE + self.data.len() + 32 * self.blocks.len());
		out.extend_from_slice(&0u32.to_le_bytes());
		out.extend_from_slice(&self.xid.0.to_le_bytes());
		out.push(self.rmgr.0);
		out.push(self.info);
		out.push(self.blocks.len() as u8);
		out.push(0);
		out.extend_from_slice(&0u64.to_le_bytes());

		for block in &self.blocks {
			out.extend_from_slice(&block.locator.spc.to_le_bytes());
			out.extend_from_slice(&block.locator.db.to_le_bytes());
			out.extend_from_slice(&block.locator.rel.0.to_le_bytes());
			out.push(block.fork.to_u8());
			let mut flags = 0u8;
			if block.will_init {
				flags |= BLOCK_WILL_INIT;
			}
			if block.image.is_some() {
				flags |= BLOCK_HAS_IMAGE;
			}
			out.push(flags);
			out.extend_from_slice(&block.block.to_le_bytes());
			if let Some(image) = &block.image {
				out.extend_from_slice(&(image.len() as u32).to_le_bytes());
				out.extend_from_slice(image);
			}
		}

		out.extend_from_slice(&(self.data.len() as u32).to_le_bytes());
		out.extend_from_slice(&self.data);

		let total = out.len() as u32;
		out[0..4].copy_from_slice(&total.to_le_bytes());
		let checksum = xxh3_64(&out);
		out[CHECKSUM_OFFSET..CHECKSUM_OFFSET + 8].copy_from_slice(&checksum.to_le_bytes());
		out
	}

	/// Decodes one record from the front of `bytes`, returning it together
	/// with the number of bytes it occupied.
	pub fn decode(bytes: &[u8]) -> crate::Result<(Record, usize)> {
		let mut cursor = Cursor::new(bytes);
		let total = cursor.u32()? as usize;
		if total < RECORD_HEADER_SIZE + 4 {
			return Err(WalError::InvalidRecord {
				reason: format!("record length {} is too small", total),
			}
			.into());
		}
		if bytes.len() < total {
			return Err(WalError::Truncated {
				needed: total,
				available: bytes.len(),
			}
			.into());
		}

		let mut copy = bytes[..total].to_vec();
		let expected = u64::from_le_bytes(copy_array(&copy[CHECKSUM_OFFSET..CHECKSUM_OFFSET + 8]));
		copy[CHECKSUM_OFFSET..CHECKSUM_OFFSET + 8].fill(0);
		let actual = xxh3_64(&copy);
		if expected != actual {
			return Err(WalError::ChecksumMismatch {
				expected,
				actual,
			}
			.into());
		}

		let mut cursor = Cursor::new(&bytes[..total]);
		cursor.skip(4)?;
		let xid = TransactionId(cursor.u32()?);
		let rmgr = RmgrId(cursor.u8()?);
		let info = cursor.u8()?;
		let nblocks = cursor.u8()?;
		cursor.skip(1 + 8)?;

		let mut blocks = Vec::with_capacity(nblocks as usize);
		for _ in 0..nblocks {
			let spc = cursor.u32()?;
			let db = cursor.u32()?;
			let rel = RelFileNumber(cursor.u32()?);
			let fork_raw = cursor.u8()?;
			let fork = ForkNumber::from_u8(fork_raw).ok_or_else(|| WalError::InvalidRecord {
				reason: format!("invalid fork number {}", fork_raw),
			})?;
			let flags = cursor.u8()?;
			let block = cursor.u32()?;
			let image = if flags & BLOCK_HAS_IMAGE != 0 {
				let len = cursor.u32()? as usize;
				Some(cursor.take(len)?.to_vec())
			} else {
				None
			};
			blocks.push(BlockRef {
				locator: RelFileLocator {
					spc,
					db,
					rel,
				},
				fork,
				block,
				will_init: flags & BLOCK_WILL_INIT != 0,
				image,
			});
		}

		let data_len = cursor.u32()? as usize;
		let data = cursor.take(data_len)?.to_vec();
		if cursor.position() != total {
			return Err(WalError::InvalidRecord {
				reason: format!("{} trailing bytes", total - cursor.position()),
			}
			.into());
		}

		Ok((
			Record {
				xid,
				rmgr,
				info,
				blocks,
				data,
			},
			total,
		))
	}
}

pub const LOCATOR_SIZE: usize = 12;

/// Serializes a file locator as record main data.
pub fn encode_locator(locator: &RelFileLocator) -> [u8; LOCATOR_SIZE] {
	let mut out = [0u8; LOCATOR_SIZE];
	out[0..4].copy_from_slice(&locator.spc.to_le_bytes());
	out[4..8].copy_from_slice(&locator.db.to_le_bytes());
	out[8..12].copy_from_slice(&locator.rel.0.to_le_bytes());
	out
}

pub fn decode_locator(bytes: &[u8]) -> crate::Result<RelFileLocator> {
	let mut cursor = Cursor::new(bytes);
	Ok(RelFileLocator {
		spc: cursor.u32()?,
		db: cursor.u32()?,
		rel: RelFileNumber(cursor.u32()?),
	})
}

fn copy_array<const N: usize>(slice: &[u8]) -> [u8; N] {
	let mut out = [0u8; N];
	out.copy_from_slice(slice);
	out
}

/// Bounds-checked little-endian reader over a record.
pub(crate) struct Cursor<'a> {
	bytes: &'a [u8],
	position: usize,
}

impl<'a> Cursor<'a> {
	pub(crate) fn new(bytes: &'a [u8]) -> Self {
		Self {
			bytes,
			position: 0,
		}
	}

	pub(crate) fn position(&self) -> usize {
		self.position
	}

	pub(crate) fn take(&mut self, len: usize) -> crate::Result<&'a [u8]> {
		let end = self.position + len;
		if end > self.bytes.len() {
			return Err(WalError::Truncated {
				needed: end,
				available: self.bytes.len(),
			}
			.into());
		}
		let slice = &self.bytes[self.position..end];
		self.position = end;
		Ok(slice)
	}

	pub(crate) fn skip(&mut self, len: usize) -> crate::Result<()> {
		self.take(len).map(|_| ())
	}

	pub(crate) fn u8(&mut self) -> crate::Result<u8> {
		Ok(self.take(1)?[0])
	}

	pub(crate) fn u32(&mut self) -> crate::Result<u32> {
		Ok(u32::from_le_bytes(copy_array(self.take(4)?)))
	}

	pub(crate) fn u64(&mut self) -> crate::Result<u64> {
		Ok(u64::from_le_bytes(copy_array(self.take(8)?)))
	}
}

#[cfg(test)]
mod tests {
	use seqdb_type::{ForkNumber, RelFileLocator, RelFileNumber, TransactionId};

	use super::*;

	fn sample() -> Record {
		Record::new(RmgrId::SEQ_LOCAL, 0)
			.with_xid(TransactionId(42))
			.with_block(BlockRef::new(RelFileLocator::new(5, RelFileNumber(16384)), ForkNumber::Init, 0).will_init())
			.with_data(&[1, 2, 3])
			.with_data(&[4])
	}

	#[test]
	fn test_decode_encoded() {
		let record = sample();
		let bytes = record.encode();
		let (decoded, len) = Record::decode(&bytes).unwrap();
		assert_eq!(len, bytes.len());
		assert_eq!(decoded, record);
		assert_eq!(decoded.data, vec![1, 2, 3, 4]);
	}

	#[test]
	fn test_image_block() {
		let record = Record::new(RmgrId::GENERIC, 0).with_block(
			BlockRef::new(RelFileLocator::new(5, RelFileNumber(1)), ForkNumber::Main, 3).with_image(vec![9; 64]),
		);
		let (decoded, _) = Record::decode(&record.encode()).unwrap();
		assert_eq!(decoded.blocks[0].image.as_deref(), Some(&[9u8; 64][..]));
		assert!(!decoded.blocks[0].will_init);
	}

	#[test]
	fn test_corruption_detected() {
		let mut bytes = sample().encode();
		let last = bytes.len() - 1;
		bytes[last] ^= 0xFF;
		let err = Record::decode(&bytes).unwrap_err();
		assert_eq!(err.code, "WAL_001");
	}

	#[test]
	fn test_truncated() {
		let bytes = sample().encode();
		assert!(Record::decode(&bytes[..bytes.len() - 2]).is_err());
		assert!(Record::decode(&bytes[..3]).is_err());
	}
}
