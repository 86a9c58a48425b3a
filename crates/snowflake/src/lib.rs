// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Snowflake sequences: 64-bit ids made of a millisecond timestamp, a
//! machine id and a per-millisecond counter. Only the counter is stored, in
//! an unlogged relation, since the timestamp keeps ids unique across
//! crashes.

mod am;
mod clock;
mod error;
mod id;

use std::sync::Arc;

pub use am::{SNOWFLAKE_MAGIC, SNOWFLAKE_NATTS, SnowflakeData, SnowflakeSequenceAm};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::SnowflakeError;
pub use id::{
	SNOWFLAKE_COUNTER_MASK, SNOWFLAKE_COUNTER_SHIFT, SNOWFLAKE_MACHINE_ID_MASK, SNOWFLAKE_MACHINE_ID_SHIFT,
	SNOWFLAKE_TIMESTAMP_MASK, SNOWFLAKE_TIMESTAMP_SHIFT, SnowflakeId, snowflake_get,
};
use seqdb_engine::{Database, SequenceAccessMethod, SequenceAmHandler, SettingContext, SettingDef};
use tracing::info;

pub const SNOWFLAKE_HANDLER: &str = "snowflake_sequenceam_handler";

pub const MACHINE_ID_SETTING: &str = "snowflake.machine_id";

/// Handler producing snowflake routines that read time from `clock`.
pub fn handler(clock: Arc<dyn Clock>) -> SequenceAmHandler {
	Arc::new(move || Some(Arc::new(SnowflakeSequenceAm::new(clock.clone())) as Arc<dyn SequenceAccessMethod>))
}

/// Registers the handler and the `snowflake.machine_id` setting. An access
/// method still has to be created with
/// `CREATE ACCESS METHOD ... TYPE SEQUENCE HANDLER snowflake_sequenceam_handler`.
pub fn load(db: &Database) -> seqdb_type::Result<()> {
	load_with_clock(db, Arc::new(SystemClock))
}

pub fn load_with_clock(db: &Database, clock: Arc<dyn Clock>) -> seqdb_type::Result<()> {
	if !db.settings().is_defined(MACHINE_ID_SETTING) {
		db.define_setting(
			SettingDef::int(MACHINE_ID_SETTING, "Machine ID to use with snowflake sequence.", 1, 0, 1023)
				.with_context(SettingContext::SuperUser),
		)?;
	}
	db.register_sequence_am_handler(SNOWFLAKE_HANDLER, handler(clock));
	info!(handler = SNOWFLAKE_HANDLER, "snowflake sequences loaded");
	Ok(())
}
