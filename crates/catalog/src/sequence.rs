// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use seqdb_type::RelationId;
use tracing::{debug, instrument};

use crate::{
	catalog::{Catalog, CatalogTxn},
	error::CatalogError,
	state::SequenceDef,
};

impl Catalog {
	/// Inserts or replaces the parameter row of a sequence.
	#[instrument(name = "catalog::sequence::store", level = "debug", skip(self, txn, sequence), fields(relid = %sequence.relid))]
	pub fn store_sequence(&self, txn: &mut CatalogTxn, sequence: SequenceDef) -> crate::Result<()> {
		let state = self.state_mut(txn)?;
		if !state.relations.contains_key(&sequence.relid) {
			return Err(CatalogError::RelationLookupFailed {
				id: sequence.relid,
			}
			.into());
		}
		debug!(
			increment = sequence.increment,
			min = sequence.min,
			max = sequence.max,
			cache = sequence.cache,
			cycle = sequence.cycle,
			"sequence parameters stored"
		);
		state.sequences.insert(sequence.relid, sequence);
		Ok(())
	}

	pub fn find_sequence(&self, txn: &CatalogTxn, relid: RelationId) -> Option<SequenceDef> {
		self.state(txn).sequences.get(&relid).cloned()
	}

	pub fn get_sequence(&self, txn: &CatalogTxn, relid: RelationId) -> crate::Result<SequenceDef> {
		self.find_sequence(txn, relid).ok_or_else(|| {
			CatalogError::SequenceLookupFailed {
				id: relid,
			}
			.into()
		})
	}

	pub fn list_sequences(&self, txn: &CatalogTxn) -> Vec<SequenceDef> {
		self.state(txn).sequences.values().cloned().collect()
	}
}
