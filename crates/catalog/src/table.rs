// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use seqdb_type::RelationId;

use crate::{
	catalog::{Catalog, CatalogTxn},
	error::CatalogError,
	state::{ColumnDef, TableDef},
};

impl Catalog {
	/// Stores the column list of a table relation.
	pub fn store_table(&self, txn: &mut CatalogTxn, relid: RelationId, columns: Vec<ColumnDef>) -> crate::Result<TableDef> {
		let state = self.state_mut(txn)?;
		if !state.relations.contains_key(&relid) {
			return Err(CatalogError::RelationLookupFailed {
				id: relid,
			}
			.into());
		}
		let table = TableDef {
			relid,
			columns,
		};
		state.tables.insert(relid, table.clone());
		Ok(table)
	}

	pub fn find_table(&self, txn: &CatalogTxn, relid: RelationId) -> Option<TableDef> {
		self.state(txn).tables.get(&relid).cloned()
	}

	/// Returns the column, or `ColumnNotFound` naming the relation.
	pub fn get_column(&self, txn: &CatalogTxn, relid: RelationId, column: &str) -> crate::Result<ColumnDef> {
		let relation = self.get_relation(txn, relid)?;
		self.find_table(txn, relid).and_then(|table| table.column(column).cloned()).ok_or_else(|| {
			CatalogError::ColumnNotFound {
				column: column.to_string(),
				relation: relation.name,
			}
			.into()
		})
	}
}
