// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! The default sequence engine. State lives in a single page holding one
//! row; values are WAL-logged in batches of [`SEQ_LOCAL_LOG_VALS`] ahead of
//! use so most calls touch only the buffer.

mod data;
mod xlog;

use std::sync::Arc;

pub use data::{LocalSequenceData, SEQ_LOCAL_DATA_SIZE, SEQ_LOCAL_LOG_VALS, SEQ_LOCAL_MAGIC, SEQ_LOCAL_NATTS};
use seqdb_storage::page::{FIRST_OFFSET_NUMBER, INVALID_OFFSET_NUMBER};
use seqdb_type::{ForkNumber, Persistence};
use tracing::{instrument, trace};
pub use xlog::{SeqLocalRmgr, XLOG_SEQ_LOCAL_LOG, seq_local_record};

use crate::{
	error::SequenceError,
	relation::Relation,
	sequence::{
		am::{NextValue, SequenceAccessMethod, SequenceLimits},
		page::{init_page, seq_tuple_data, seq_tuple_data_mut, verify_seq_page},
	},
};

pub const LOCAL_SEQUENCE_AM_HANDLER: &str = "local_sequenceam_handler";

pub fn local_sequenceam_handler() -> Option<Arc<dyn SequenceAccessMethod>> {
	Some(Arc::new(LocalSequenceAm))
}

pub struct LocalSequenceAm;

impl LocalSequenceAm {
	/// Reads the row under the exclusive content lock.
	fn read(rel: &Relation<'_>) -> crate::Result<LocalSequenceData> {
		let buffer = rel.read_buffer(ForkNumber::Main, 0)?;
		let mut page = buffer.lock_exclusive();
		verify_seq_page(rel.name(), &buffer, &mut page, SEQ_LOCAL_MAGIC)?;
		LocalSequenceData::decode(seq_tuple_data(&page)?)
	}
}

/// Writes the row into the main fork and, for unlogged sequences, into an
/// init fork that recovery resets the relation from.
fn fill_seq_with_data(rel: &mut Relation<'_>, data: &LocalSequenceData) -> crate::Result<()> {
	fill_seq_fork(rel, data, ForkNumber::Main)?;

	if rel.persistence() == Persistence::Unlogged {
		rel.create_init_fork()?;
		fill_seq_fork(rel, data, ForkNumber::Init)?;
		rel.flush()?;
	}
	Ok(())
}

fn fill_seq_fork(rel: &mut Relation<'_>, data: &LocalSequenceData, fork: ForkNumber) -> crate::Result<()> {
	let buffer = rel.extend(fork)?;
	if buffer.block() != 0 {
		return seqdb_type::internal_err!("sequence \"{}\" fork {} already has data", rel.name(), fork);
	}

	if rel.needs_wal() {
		rel.assign_xid();
	}

	let tuple = data.tuple();
	let mut page = buffer.lock_exclusive();
	init_page(&mut page, SEQ_LOCAL_MAGIC);
	buffer.mark_dirty();

	match page.add_item(tuple.as_bytes(), INVALID_OFFSET_NUMBER) {
		Ok(FIRST_OFFSET_NUMBER) => {}
		_ => return Err(SequenceError::AddTupleFailed.into()),
	}

	// Init forks are logged even for unlogged relations.
	if rel.needs_wal() || fork == ForkNumber::Init {
		let lsn = rel.insert_wal(seq_local_record(rel.locator(), fork, tuple.as_bytes()));
		page.set_lsn(lsn);
	}
	Ok(())
}

impl SequenceAccessMethod for LocalSequenceAm {
	fn get_table_am(&self) -> &'static str {
		"heap"
	}

	#[instrument(name = "engine::sequence::local::init", level = "debug", skip(self, rel), fields(relation = %rel.name()))]
	fn init(&self, rel: &mut Relation<'_>, last_value: i64, is_called: bool) -> crate::Result<()> {
		fill_seq_with_data(rel, &LocalSequenceData::new(last_value, is_called))
	}

	#[instrument(name = "engine::sequence::local::nextval", level = "trace", skip(self, rel), fields(relation = %rel.name()))]
	fn nextval(&self, rel: &mut Relation<'_>, limits: &SequenceLimits) -> crate::Result<NextValue> {
		let SequenceLimits {
			increment,
			max,
			min,
			cache,
			cycle,
		} = *limits;

		let buffer = rel.read_buffer(ForkNumber::Main, 0)?;
		let mut page = buffer.lock_exclusive();
		verify_seq_page(rel.name(), &buffer, &mut page, SEQ_LOCAL_MAGIC)?;
		let seq = LocalSequenceData::decode(seq_tuple_data(&page)?)?;

		let mut next = seq.last_value;
		let mut result = seq.last_value;
		let mut last = seq.last_value;
		let mut fetch = cache;
		let mut log = seq.log_cnt;
		let mut rescnt = 0i64;
		let mut logit = false;

		// A fresh sequence returns its start value first.
		if !seq.is_called {
			rescnt += 1;
			fetch -= 1;
		}

		// Log ahead when the logged values run out, and after a checkpoint:
		// replay from the new redo pointer must not hand out values again.
		if log < fetch || !seq.is_called || page.lsn() <= rel.redo_ptr() {
			fetch = fetch.saturating_add(SEQ_LOCAL_LOG_VALS);
			log = fetch;
			logit = true;
		}

		while fetch > 0 {
			if increment > 0 {
				if (max >= 0 && next > max - increment) || (max < 0 && next + increment > max) {
					if rescnt > 0 {
						break;
					}
					if !cycle {
						return Err(SequenceError::LimitExceeded {
							name: rel.name().to_string(),
							bound: "maximum",
							limit: max,
						}
						.into());
					}
					next = min;
				} else {
					next += increment;
				}
			} else if (min < 0 && next < min - increment) || (min >= 0 && next + increment < min) {
				if rescnt > 0 {
					break;
				}
				if !cycle {
					return Err(SequenceError::LimitExceeded {
						name: rel.name().to_string(),
						bound: "minimum",
						limit: min,
					}
					.into());
				}
				next = max;
			} else {
				next += increment;
			}

			fetch -= 1;
			if rescnt < cache {
				log -= 1;
				rescnt += 1;
				last = next;
				if rescnt == 1 {
					result = next;
				}
			}
		}

		// Values fetched for the log but never reached.
		log -= fetch;

		if logit && rel.needs_wal() {
			rel.assign_xid();
		}

		buffer.mark_dirty();

		if logit && rel.needs_wal() {
			// The record describes the state after every logged value is used.
			LocalSequenceData {
				last_value: next,
				log_cnt: 0,
				is_called: true,
			}
			.write(seq_tuple_data_mut(&mut page)?);
			let item = page.item(FIRST_OFFSET_NUMBER)?.to_vec();
			let lsn = rel.insert_wal(seq_local_record(rel.locator(), ForkNumber::Main, &item));
			page.set_lsn(lsn);
		}

		LocalSequenceData {
			last_value: last,
			log_cnt: log,
			is_called: true,
		}
		.write(seq_tuple_data_mut(&mut page)?);

		trace!(result, last, log, logit, "nextval");
		Ok(NextValue {
			value: result,
			last,
		})
	}

	fn setval(&self, rel: &mut Relation<'_>, next: i64, is_called: bool) -> crate::Result<()> {
		let buffer = rel.read_buffer(ForkNumber::Main, 0)?;
		let mut page = buffer.lock_exclusive();
		verify_seq_page(rel.name(), &buffer, &mut page, SEQ_LOCAL_MAGIC)?;

		LocalSequenceData::new(next, is_called).write(seq_tuple_data_mut(&mut page)?);
		buffer.mark_dirty();

		if rel.needs_wal() {
			let item = page.item(FIRST_OFFSET_NUMBER)?.to_vec();
			let lsn = rel.insert_wal(seq_local_record(rel.locator(), ForkNumber::Main, &item));
			page.set_lsn(lsn);
		}
		Ok(())
	}

	#[instrument(name = "engine::sequence::local::reset", level = "debug", skip(self, rel), fields(relation = %rel.name()))]
	fn reset(&self, rel: &mut Relation<'_>, start: i64, is_called: bool, reset_state: bool) -> crate::Result<()> {
		let mut seq = Self::read(rel)?;
		seq.last_value = start;
		seq.is_called = is_called;
		if reset_state {
			seq.log_cnt = 0;
		}

		rel.set_new_relfilenumber(rel.persistence())?;
		fill_seq_with_data(rel, &seq)
	}

	fn get_state(&self, rel: &Relation<'_>) -> crate::Result<(i64, bool)> {
		let seq = Self::read(rel)?;
		Ok((seq.last_value, seq.is_called))
	}

	fn change_persistence(&self, rel: &mut Relation<'_>, persistence: Persistence) -> crate::Result<()> {
		let seq = Self::read(rel)?;
		rel.set_new_relfilenumber(persistence)?;
		fill_seq_with_data(rel, &seq)
	}
}
