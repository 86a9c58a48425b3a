// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! `time_ms (41 bits) | machine (10 bits) | count (12 bits)`, from the most
//! significant bit down. The sign bit stays clear.

pub const SNOWFLAKE_COUNTER_MASK: u64 = 0x0000_0000_0000_0FFF;
pub const SNOWFLAKE_COUNTER_SHIFT: u32 = 0;
pub const SNOWFLAKE_MACHINE_ID_MASK: u64 = 0x0000_0000_0000_03FF;
pub const SNOWFLAKE_MACHINE_ID_SHIFT: u32 = 12;
pub const SNOWFLAKE_TIMESTAMP_MASK: u64 = 0x0000_01FF_FFFF_FFFF;
pub const SNOWFLAKE_TIMESTAMP_SHIFT: u32 = 22;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SnowflakeId {
	pub time_ms: u64,
	pub machine: u32,
	pub count: u32,
}

impl SnowflakeId {
	/// Packs the parts into an id. Bits beyond each field's width are
	/// dropped.
	pub fn encode(&self) -> i64 {
		let raw = ((self.count as u64) & SNOWFLAKE_COUNTER_MASK) << SNOWFLAKE_COUNTER_SHIFT
			| ((self.machine as u64) & SNOWFLAKE_MACHINE_ID_MASK) << SNOWFLAKE_MACHINE_ID_SHIFT
			| (self.time_ms & SNOWFLAKE_TIMESTAMP_MASK) << SNOWFLAKE_TIMESTAMP_SHIFT;
		raw as i64
	}

	pub fn decode(raw: i64) -> Self {
		let raw = raw as u64;
		Self {
			time_ms: (raw >> SNOWFLAKE_TIMESTAMP_SHIFT) & SNOWFLAKE_TIMESTAMP_MASK,
			machine: ((raw >> SNOWFLAKE_MACHINE_ID_SHIFT) & SNOWFLAKE_MACHINE_ID_MASK) as u32,
			count: ((raw >> SNOWFLAKE_COUNTER_SHIFT) & SNOWFLAKE_COUNTER_MASK) as u32,
		}
	}
}

/// Splits an id handed out by a snowflake sequence into its parts.
pub fn snowflake_get(raw: i64) -> SnowflakeId {
	SnowflakeId::decode(raw)
}
