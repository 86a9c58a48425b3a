// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use seqdb_catalog::{ColumnType, IdentityKind};
use seqdb_engine::{AlterSequence, ColumnSpec, CreateSequence, CreateTable, SequenceOption::*};
use seqdb_testing::{test_database, test_session};
use seqdb_type::SequenceType;

fn table_with_identity(name: &str) -> CreateTable {
	CreateTable::new(name)
		.column(ColumnSpec::new("id", ColumnType::Int8).identity(IdentityKind::Always))
		.column(ColumnSpec::new("label", ColumnType::Text))
}

#[test]
fn test_identity_column_gets_its_own_sequence() {
	let db = test_database();
	let mut session = test_session(&db);
	session.create_table(table_with_identity("t")).unwrap();

	assert_eq!(session.next_identity_value("t", "id").unwrap(), 1);
	assert_eq!(session.next_identity_value("t", "id").unwrap(), 2);
	assert_eq!(session.currval("t_id_seq").unwrap(), 2);

	let err = session.next_identity_value("t", "label").unwrap_err();
	assert_eq!(err.code, "SEQUENCE_022");
	assert_eq!(err.message, "column \"label\" of relation \"t\" is not an identity column");
}

#[test]
fn test_identity_sequence_follows_column_type_and_options() {
	let db = test_database();
	let mut session = test_session(&db);
	session
		.create_table(
			CreateTable::new("t").column(
				ColumnSpec::new("id", ColumnType::Int2)
					.identity(IdentityKind::ByDefault)
					.identity_options(vec![SequenceName("t_ids".to_string()), Start(100), Increment(10)]),
			),
		)
		.unwrap();

	let params = session.sequence_parameters("t_ids").unwrap();
	assert_eq!(params.seq_type, SequenceType::Int2);
	assert_eq!(params.max, i16::MAX as i64);
	assert_eq!(session.next_identity_value("t", "id").unwrap(), 100);
	assert_eq!(session.next_identity_value("t", "id").unwrap(), 110);
}

#[test]
fn test_identity_on_text_column_is_rejected() {
	let db = test_database();
	let mut session = test_session(&db);
	let err = session
		.create_table(CreateTable::new("t").column(ColumnSpec::new("id", ColumnType::Text).identity(IdentityKind::Always)))
		.unwrap_err();
	assert_eq!(err.code, "SEQUENCE_009");
	assert_eq!(err.message, "identity column type must be smallint, integer, or bigint");
}

#[test]
fn test_identity_sequence_name_is_made_unique() {
	let db = test_database();
	let mut session = test_session(&db);
	session.create_sequence(CreateSequence::new("t_id_seq")).unwrap();
	session.create_table(table_with_identity("t")).unwrap();

	session.next_identity_value("t", "id").unwrap();
	assert_eq!(session.currval("t_id_seq1").unwrap(), 1);
}

#[test]
fn test_identity_sequence_cannot_be_dropped_or_detached() {
	let db = test_database();
	let mut session = test_session(&db);
	session.create_table(table_with_identity("t")).unwrap();

	let err = session.drop_sequence("t_id_seq", false).unwrap_err();
	assert_eq!(err.code, "SEQUENCE_021");
	assert_eq!(err.message, "cannot drop sequence t_id_seq because column id of table t requires it");

	let err = session
		.alter_sequence(AlterSequence::new("t_id_seq").option(OwnedBy(vec!["none".to_string()])))
		.unwrap_err();
	assert_eq!(err.code, "SEQUENCE_019");

	session.drop_table("t", false).unwrap();
	assert_eq!(session.nextval("t_id_seq").unwrap_err().code, "CATALOG_002");
}

#[test]
fn test_truncate_restart_identity() {
	let db = test_database();
	let mut session = test_session(&db);
	session.create_table(table_with_identity("t")).unwrap();
	for _ in 0..5 {
		session.next_identity_value("t", "id").unwrap();
	}

	session.truncate_restart_identity("t").unwrap();
	assert_eq!(session.next_identity_value("t", "id").unwrap(), 1);
}

#[test]
fn test_truncate_restart_identity_rolls_back() {
	let db = test_database();
	let mut session = test_session(&db);
	session.create_table(table_with_identity("t")).unwrap();
	session.next_identity_value("t", "id").unwrap();
	session.next_identity_value("t", "id").unwrap();

	session.begin().unwrap();
	session.truncate_restart_identity("t").unwrap();
	assert_eq!(session.next_identity_value("t", "id").unwrap(), 1);
	session.rollback().unwrap();

	assert_eq!(session.next_identity_value("t", "id").unwrap(), 3);
}

#[test]
fn test_table_persistence_reaches_identity_sequence() {
	let db = test_database();
	let mut session = test_session(&db);
	session.create_table(table_with_identity("t")).unwrap();
	session.next_identity_value("t", "id").unwrap();

	session.alter_table_set_logged("t", false).unwrap();
	assert_eq!(session.next_identity_value("t", "id").unwrap(), 2);
	session.alter_table_set_logged("t", true).unwrap();
	assert_eq!(session.next_identity_value("t", "id").unwrap(), 3);
}

#[test]
fn test_temporary_table_gets_temporary_identity_sequence() {
	let db = test_database();
	let mut session = test_session(&db);
	session.create_table(table_with_identity("t").temporary()).unwrap();
	assert_eq!(session.next_identity_value("t", "id").unwrap(), 1);

	let err = session.alter_sequence_set_logged("t_id_seq", true).unwrap_err();
	assert_eq!(err.code, "SEQUENCE_025");

	drop(session);
	assert_eq!(test_session(&db).nextval("t_id_seq").unwrap_err().code, "CATALOG_002");
}
