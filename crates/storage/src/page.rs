// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Slotted page layout.
//!
//! ```text
//! +----------------+---------------------+--------------+--------+---------+
//! | header (24 B)  | line pointers (4 B) |  free space  | items  | special |
//! +----------------+---------------------+--------------+--------+---------+
//!                  ^                     ^ lower        ^ upper  ^ special
//! ```
//!
//! All integers are little-endian. Line pointers pack `offset:15`,
//! `flags:2` and `length:15` into one `u32`.

use std::fmt::{Debug, Formatter};

use seqdb_type::{BlockNumber, Lsn, OffsetNumber};
use xxhash_rust::xxh3::xxh3_64_with_seed;

use crate::error::StorageError;

pub const BLCKSZ: usize = 8192;
pub const SIZE_OF_PAGE_HEADER: usize = 24;
pub const ITEM_ID_SIZE: usize = 4;
pub const PAGE_LAYOUT_VERSION: u16 = 4;
pub const MAXIMUM_ALIGNOF: usize = 8;

pub const INVALID_OFFSET_NUMBER: OffsetNumber = 0;
pub const FIRST_OFFSET_NUMBER: OffsetNumber = 1;

pub const LP_UNUSED: u8 = 0;
pub const LP_NORMAL: u8 = 1;

const OFF_LSN: usize = 0;
const OFF_CHECKSUM: usize = 8;
const OFF_FLAGS: usize = 10;
const OFF_LOWER: usize = 12;
const OFF_UPPER: usize = 14;
const OFF_SPECIAL: usize = 16;
const OFF_PAGESIZE_VERSION: usize = 18;
const OFF_PRUNE_XID: usize = 20;

pub const fn maxalign(len: usize) -> usize {
	(len + MAXIMUM_ALIGNOF - 1) & !(MAXIMUM_ALIGNOF - 1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemId {
	pub offset: u16,
	pub flags: u8,
	pub length: u16,
}

impl ItemId {
	fn decode(raw: u32) -> Self {
		Self {
			offset: (raw & 0x7FFF) as u16,
			flags: ((raw >> 15) & 0x3) as u8,
			length: ((raw >> 17) & 0x7FFF) as u16,
		}
	}

	fn encode(&self) -> u32 {
		(self.offset as u32 & 0x7FFF) | ((self.flags as u32 & 0x3) << 15) | ((self.length as u32 & 0x7FFF) << 17)
	}

	pub fn is_normal(&self) -> bool {
		self.flags == LP_NORMAL
	}
}

#[derive(Clone, PartialEq)]
pub struct Page {
	data: Box<[u8]>,
}

impl Debug for Page {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Page")
			.field("lsn", &self.lsn())
			.field("lower", &self.lower())
			.field("upper", &self.upper())
			.field("special", &self.special_offset())
			.field("items", &self.max_offset())
			.finish()
	}
}

impl Default for Page {
	fn default() -> Self {
		Self::new()
	}
}

impl Page {
	/// An all-zero page, as found after extending a file.
	pub fn new() -> Self {
		Self {
			data: vec![0u8; BLCKSZ].into_boxed_slice(),
		}
	}

	pub fn from_bytes(bytes: &[u8]) -> crate::Result<Self> {
		if bytes.len() != BLCKSZ {
			return Err(StorageError::InvalidPageSize {
				size: bytes.len(),
			}
			.into());
		}
		Ok(Self {
			data: bytes.to_vec().into_boxed_slice(),
		})
	}

	pub fn as_bytes(&self) -> &[u8] {
		&self.data
	}

	/// Formats the page with an empty item area and a special area of
	/// `special_size` bytes (rounded up to the alignment).
	pub fn init(&mut self, special_size: usize) {
		let special_size = maxalign(special_size);
		self.data.fill(0);
		self.set_lower(SIZE_OF_PAGE_HEADER as u16);
		self.set_upper((BLCKSZ - special_size) as u16);
		self.write_u16(OFF_SPECIAL, (BLCKSZ - special_size) as u16);
		self.write_u16(OFF_PAGESIZE_VERSION, BLCKSZ as u16 | PAGE_LAYOUT_VERSION);
	}

	pub fn copy_from(&mut self, other: &Page) {
		self.data.copy_from_slice(&other.data);
	}

	pub fn is_new(&self) -> bool {
		self.upper() == 0
	}

	pub fn lsn(&self) -> Lsn {
		Lsn(self.read_u64(OFF_LSN))
	}

	pub fn set_lsn(&mut self, lsn: Lsn) {
		self.write_u64(OFF_LSN, lsn.0);
	}

	pub fn checksum(&self) -> u16 {
		self.read_u16(OFF_CHECKSUM)
	}

	pub fn set_checksum(&mut self, checksum: u16) {
		self.write_u16(OFF_CHECKSUM, checksum);
	}

	pub fn flags(&self) -> u16 {
		self.read_u16(OFF_FLAGS)
	}

	pub fn lower(&self) -> u16 {
		self.read_u16(OFF_LOWER)
	}

	fn set_lower(&mut self, value: u16) {
		self.write_u16(OFF_LOWER, value);
	}

	pub fn upper(&self) -> u16 {
		self.read_u16(OFF_UPPER)
	}

	fn set_upper(&mut self, value: u16) {
		self.write_u16(OFF_UPPER, value);
	}

	pub fn special_offset(&self) -> u16 {
		self.read_u16(OFF_SPECIAL)
	}

	pub fn page_size_version(&self) -> u16 {
		self.read_u16(OFF_PAGESIZE_VERSION)
	}

	pub fn prune_xid(&self) -> u32 {
		self.read_u32(OFF_PRUNE_XID)
	}

	pub fn special(&self) -> &[u8] {
		&self.data[self.special_offset() as usize..]
	}

	pub fn special_mut(&mut self) -> &mut [u8] {
		let start = self.special_offset() as usize;
		&mut self.data[start..]
	}

	/// Free bytes between the line pointer array and the item area.
	pub fn free_space(&self) -> usize {
		(self.upper() as usize).saturating_sub(self.lower() as usize)
	}

	pub fn max_offset(&self) -> OffsetNumber {
		let lower = self.lower() as usize;
		if lower <= SIZE_OF_PAGE_HEADER {
			return 0;
		}
		((lower - SIZE_OF_PAGE_HEADER) / ITEM_ID_SIZE) as OffsetNumber
	}

	pub fn item_id(&self, offset: OffsetNumber) -> Option<ItemId> {
		if offset == INVALID_OFFSET_NUMBER || offset > self.max_offset() {
			return None;
		}
		let at = SIZE_OF_PAGE_HEADER + (offset as usize - 1) * ITEM_ID_SIZE;
		Some(ItemId::decode(self.read_u32(at)))
	}

	/// Appends an item. `offset` must be either [`INVALID_OFFSET_NUMBER`]
	/// (take the next free slot) or exactly the next free slot.
	pub fn add_item(&mut self, item: &[u8], offset: OffsetNumber) -> crate::Result<OffsetNumber> {
		let next = self.max_offset() + 1;
		if offset != INVALID_OFFSET_NUMBER && offset != next {
			return Err(StorageError::InvalidItem {
				offset,
			}
			.into());
		}

		let aligned = maxalign(item.len());
		if self.is_new() || self.free_space() < aligned + ITEM_ID_SIZE {
			return Err(StorageError::PageFull {
				needed: aligned + ITEM_ID_SIZE,
				available: self.free_space(),
			}
			.into());
		}

		let upper = self.upper() as usize - aligned;
		let lower = self.lower() as usize;

		let id = ItemId {
			offset: upper as u16,
			flags: LP_NORMAL,
			length: item.len() as u16,
		};
		self.write_u32(lower, id.encode());
		self.data[upper..upper + item.len()].copy_from_slice(item);

		self.set_lower((lower + ITEM_ID_SIZE) as u16);
		self.set_upper(upper as u16);

		Ok(next)
	}

	pub fn item(&self, offset: OffsetNumber) -> crate::Result<&[u8]> {
		let id = self.normal_item(offset)?;
		Ok(&self.data[id.offset as usize..id.offset as usize + id.length as usize])
	}

	pub fn item_mut(&mut self, offset: OffsetNumber) -> crate::Result<&mut [u8]> {
		let id = self.normal_item(offset)?;
		Ok(&mut self.data[id.offset as usize..id.offset as usize + id.length as usize])
	}

	fn normal_item(&self, offset: OffsetNumber) -> crate::Result<ItemId> {
		match self.item_id(offset) {
			Some(id) if id.is_normal() && id.offset as usize + id.length as usize <= BLCKSZ => Ok(id),
			_ => Err(StorageError::InvalidItem {
				offset,
			}
			.into()),
		}
	}

	/// Checksum of the page contents as stored on disk. The checksum field
	/// itself is excluded, the block number is mixed in so that a page
	/// written to the wrong location does not verify.
	pub fn compute_checksum(&self, block: BlockNumber) -> u16 {
		let mut copy = self.data.to_vec();
		copy[OFF_CHECKSUM..OFF_CHECKSUM + 2].fill(0);
		let hash = xxh3_64_with_seed(&copy, block as u64);
		((hash % 65535) + 1) as u16
	}

	pub fn verify_checksum(&self, block: BlockNumber) -> bool {
		if self.is_new() {
			return self.data.iter().all(|b| *b == 0);
		}
		self.checksum() == self.compute_checksum(block)
	}

	/// Zeroes the fields that legitimately differ between a page written
	/// during normal operation and its replayed counterpart.
	pub fn mask_lsn_and_checksum(&mut self) {
		self.set_lsn(Lsn::INVALID);
		self.set_checksum(0);
	}

	pub fn mask_unused_space(&mut self) {
		let lower = self.lower() as usize;
		let upper = self.upper() as usize;
		if lower < SIZE_OF_PAGE_HEADER || lower > upper || upper > BLCKSZ {
			return;
		}
		self.data[lower..upper].fill(0);
	}

	fn read_u16(&self, at: usize) -> u16 {
		u16::from_le_bytes([self.data[at], self.data[at + 1]])
	}

	fn read_u32(&self, at: usize) -> u32 {
		let mut bytes = [0u8; 4];
		bytes.copy_from_slice(&self.data[at..at + 4]);
		u32::from_le_bytes(bytes)
	}

	fn read_u64(&self, at: usize) -> u64 {
		let mut bytes = [0u8; 8];
		bytes.copy_from_slice(&self.data[at..at + 8]);
		u64::from_le_bytes(bytes)
	}

	fn write_u16(&mut self, at: usize, value: u16) {
		self.data[at..at + 2].copy_from_slice(&value.to_le_bytes());
	}

	fn write_u32(&mut self, at: usize, value: u32) {
		self.data[at..at + 4].copy_from_slice(&value.to_le_bytes());
	}

	fn write_u64(&mut self, at: usize, value: u64) {
		self.data[at..at + 8].copy_from_slice(&value.to_le_bytes());
	}
}
