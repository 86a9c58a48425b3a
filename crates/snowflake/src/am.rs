// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::sync::Arc;

use seqdb_engine::{
	NextValue, Relation, SequenceAccessMethod, SequenceError, SequenceLimits,
	sequence::page::{init_page, seq_tuple_data, seq_tuple_data_mut, verify_seq_page},
};
use seqdb_storage::{
	HeapTuple,
	page::{FIRST_OFFSET_NUMBER, INVALID_OFFSET_NUMBER},
};
use seqdb_type::{ForkNumber, Persistence};
use seqdb_wal::builtin::generic_page_image_record;
use tracing::{instrument, trace};

use crate::{
	MACHINE_ID_SETTING,
	clock::Clock,
	error::SnowflakeError,
	id::{SNOWFLAKE_COUNTER_MASK, SnowflakeId},
};

pub const SNOWFLAKE_MAGIC: u32 = 0x01;

pub const SNOWFLAKE_NATTS: u16 = 2;

const SNOWFLAKE_DATA_SIZE: usize = 3;

/// Largest counter value before it wraps back to 1.
const COUNTER_LIMIT: i16 = i16::MAX & SNOWFLAKE_COUNTER_MASK as i16;

/// `count i16 | is_called u8`, little-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnowflakeData {
	pub count: i16,
	pub is_called: bool,
}

impl SnowflakeData {
	pub fn new(value: i64, is_called: bool) -> Self {
		Self {
			count: (value as i16) & COUNTER_LIMIT,
			is_called,
		}
	}

	pub fn decode(bytes: &[u8]) -> seqdb_type::Result<Self> {
		if bytes.len() < SNOWFLAKE_DATA_SIZE {
			return Err(SnowflakeError::TupleTooShort {
				found: bytes.len(),
				expected: SNOWFLAKE_DATA_SIZE,
			}
			.into());
		}
		Ok(Self {
			count: i16::from_le_bytes([bytes[0], bytes[1]]),
			is_called: bytes[2] != 0,
		})
	}

	pub fn write(&self, bytes: &mut [u8]) {
		bytes[0..2].copy_from_slice(&self.count.to_le_bytes());
		bytes[2] = self.is_called as u8;
	}

	pub fn tuple(&self) -> HeapTuple {
		let mut data = [0u8; SNOWFLAKE_DATA_SIZE];
		self.write(&mut data);
		HeapTuple::form(SNOWFLAKE_NATTS, &data)
	}
}

pub struct SnowflakeSequenceAm {
	clock: Arc<dyn Clock>,
}

impl SnowflakeSequenceAm {
	pub fn new(clock: Arc<dyn Clock>) -> Self {
		Self {
			clock,
		}
	}

	fn read(rel: &Relation<'_>) -> seqdb_type::Result<SnowflakeData> {
		let buffer = rel.read_buffer(ForkNumber::Main, 0)?;
		let mut page = buffer.lock_exclusive();
		verify_seq_page(rel.name(), &buffer, &mut page, SNOWFLAKE_MAGIC)?;
		SnowflakeData::decode(seq_tuple_data(&page)?)
	}

	fn machine_id(rel: &Relation<'_>) -> seqdb_type::Result<u32> {
		rel.setting(MACHINE_ID_SETTING)
			.and_then(|value| value.as_int())
			.map(|machine| machine as u32)
			.ok_or_else(|| SnowflakeError::MachineIdUnset.into())
	}

	fn now_ms(&self) -> seqdb_type::Result<u64> {
		let now_ms = self.clock.now_ms();
		u64::try_from(now_ms).map_err(|_| {
			SnowflakeError::ClockBeforeEpoch {
				now_ms,
			}
			.into()
		})
	}
}

/// Writes the main fork and, unless the relation is temporary, an init fork
/// holding the same row. Only the init fork is logged.
fn fill_snowflake(rel: &mut Relation<'_>, data: &SnowflakeData) -> seqdb_type::Result<()> {
	fill_snowflake_fork(rel, data, ForkNumber::Main)?;

	if rel.persistence() == Persistence::Unlogged {
		rel.create_init_fork()?;
		fill_snowflake_fork(rel, data, ForkNumber::Init)?;
		rel.flush()?;
	}
	Ok(())
}

fn fill_snowflake_fork(rel: &mut Relation<'_>, data: &SnowflakeData, fork: ForkNumber) -> seqdb_type::Result<()> {
	let buffer = rel.extend(fork)?;
	if buffer.block() != 0 {
		return seqdb_type::internal_err!("snowflake sequence \"{}\" fork {} already has data", rel.name(), fork);
	}

	let tuple = data.tuple();
	let mut page = buffer.lock_exclusive();
	init_page(&mut page, SNOWFLAKE_MAGIC);
	buffer.mark_dirty();

	match page.add_item(tuple.as_bytes(), INVALID_OFFSET_NUMBER) {
		Ok(FIRST_OFFSET_NUMBER) => {}
		_ => return Err(SequenceError::AddTupleFailed.into()),
	}

	if fork == ForkNumber::Init {
		let xid = rel.assign_xid();
		let lsn = rel.insert_wal(generic_page_image_record(xid, rel.locator(), fork, 0, &page));
		page.set_lsn(lsn);
	}
	Ok(())
}

impl SequenceAccessMethod for SnowflakeSequenceAm {
	fn get_table_am(&self) -> &'static str {
		"heap"
	}

	/// Moves permanent sequences to unlogged storage before the first row
	/// is written.
	#[instrument(name = "snowflake::init", level = "debug", skip(self, rel), fields(relation = %rel.name()))]
	fn init(&self, rel: &mut Relation<'_>, last_value: i64, is_called: bool) -> seqdb_type::Result<()> {
		if rel.persistence() == Persistence::Permanent {
			rel.set_new_relfilenumber(Persistence::Unlogged)?;
		}
		fill_snowflake(rel, &SnowflakeData::new(last_value, is_called))
	}

	/// Ignores the sequence limits: the counter wraps at 4095 and the call
	/// waits for the next millisecond when it does.
	#[instrument(name = "snowflake::nextval", level = "trace", skip(self, rel, _limits), fields(relation = %rel.name()))]
	fn nextval(&self, rel: &mut Relation<'_>, _limits: &SequenceLimits) -> seqdb_type::Result<NextValue> {
		let machine = Self::machine_id(rel)?;

		let buffer = rel.read_buffer(ForkNumber::Main, 0)?;
		let mut page = buffer.lock_exclusive();
		verify_seq_page(rel.name(), &buffer, &mut page, SNOWFLAKE_MAGIC)?;
		let mut seq = SnowflakeData::decode(seq_tuple_data(&page)?)?;

		let mut count = seq.count as i32 + 1;
		if count > COUNTER_LIMIT as i32 {
			count = 1;
			self.clock.sleep_ms();
		}

		let id = SnowflakeId {
			time_ms: self.now_ms()?,
			machine,
			count: count as u32,
		};

		seq.count = count as i16;
		seq.is_called = true;
		seq.write(seq_tuple_data_mut(&mut page)?);
		buffer.mark_dirty();

		let value = id.encode();
		trace!(value, count, "nextval");
		Ok(NextValue {
			value,
			last: value,
		})
	}

	fn setval(&self, rel: &mut Relation<'_>, next: i64, is_called: bool) -> seqdb_type::Result<()> {
		let buffer = rel.read_buffer(ForkNumber::Main, 0)?;
		let mut page = buffer.lock_exclusive();
		verify_seq_page(rel.name(), &buffer, &mut page, SNOWFLAKE_MAGIC)?;

		SnowflakeData::new(next, is_called).write(seq_tuple_data_mut(&mut page)?);
		buffer.mark_dirty();
		Ok(())
	}

	#[instrument(name = "snowflake::reset", level = "debug", skip(self, rel), fields(relation = %rel.name()))]
	fn reset(&self, rel: &mut Relation<'_>, start: i64, is_called: bool, _reset_state: bool) -> seqdb_type::Result<()> {
		Self::read(rel)?;
		rel.set_new_relfilenumber(rel.persistence())?;
		fill_snowflake(rel, &SnowflakeData::new(start, is_called))
	}

	/// The counter only.
	fn get_state(&self, rel: &Relation<'_>) -> seqdb_type::Result<(i64, bool)> {
		let seq = Self::read(rel)?;
		Ok((seq.count as i64, seq.is_called))
	}

	/// Snowflake storage stays unlogged whatever the sequence is switched
	/// to.
	fn change_persistence(&self, _rel: &mut Relation<'_>, _persistence: Persistence) -> seqdb_type::Result<()> {
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::{COUNTER_LIMIT, SnowflakeData};

	#[test]
	fn test_counter_limit() {
		assert_eq!(COUNTER_LIMIT, 4095);
	}

	#[test]
	fn test_new_masks_value() {
		assert_eq!(SnowflakeData::new(4096 + 5, true).count, 5);
		assert_eq!(SnowflakeData::new(1, false).count, 1);
	}

	#[test]
	fn test_layout() {
		let mut bytes = [0u8; 3];
		SnowflakeData {
			count: 0x0102,
			is_called: true,
		}
		.write(&mut bytes);
		assert_eq!(bytes, [0x02, 0x01, 0x01]);
		assert_eq!(SnowflakeData::decode(&bytes).unwrap().count, 0x0102);
	}

	#[test]
	fn test_short_tuple_is_corrupt() {
		let err = SnowflakeData::decode(&[1, 2]).unwrap_err();
		assert_eq!(err.code, "SNOWFLAKE_001");
	}
}
