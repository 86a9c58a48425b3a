// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use seqdb_catalog::ColumnType;
use seqdb_engine::{
	AlterSequence, ColumnSpec, CreateSequence, CreateTable, SequenceData, SequenceOption::*, SequenceParameters,
};
use seqdb_testing::{test_database, test_session};
use seqdb_type::SequenceType;

#[test]
fn test_create_if_not_exists() {
	let db = test_database();
	let mut session = test_session(&db);
	assert!(session.create_sequence(CreateSequence::new("s")).unwrap().is_some());

	let err = session.create_sequence(CreateSequence::new("s")).unwrap_err();
	assert_eq!(err.code, "CATALOG_001");

	assert_eq!(session.create_sequence(CreateSequence::new("s").if_not_exists()).unwrap(), None);
	assert_eq!(session.take_notices(), vec!["relation \"s\" already exists, skipping".to_string()]);
}

#[test]
fn test_invalid_options() {
	let db = test_database();
	let mut session = test_session(&db);
	let mut create = |options: Vec<seqdb_engine::SequenceOption>| {
		session.create_sequence(CreateSequence::new("s").options(options)).unwrap_err().code.clone()
	};

	assert_eq!(create(vec![Increment(0)]), "SEQUENCE_010");
	assert_eq!(create(vec![Increment(1), Increment(2)]), "SEQUENCE_007");
	assert_eq!(create(vec![As("text".to_string())]), "SEQUENCE_009");
	assert_eq!(create(vec![As("smallint".to_string()), MaxValue(Some(40000))]), "SEQUENCE_011");
	assert_eq!(create(vec![MinValue(Some(10)), MaxValue(Some(10))]), "SEQUENCE_012");
	assert_eq!(create(vec![Start(0)]), "SEQUENCE_013");
	assert_eq!(create(vec![Cache(0)]), "SEQUENCE_015");
	assert_eq!(create(vec![SequenceName("x".to_string())]), "SEQUENCE_008");
}

#[test]
fn test_parameters_and_options() {
	let db = test_database();
	let mut session = test_session(&db);
	session
		.create_sequence(CreateSequence::new("s").options(vec![
			As("integer".to_string()),
			Start(10),
			Increment(5),
			Cache(3),
			Cycle(true),
		]))
		.unwrap();

	assert_eq!(
		session.sequence_parameters("s").unwrap(),
		SequenceParameters {
			start: 10,
			min: 1,
			max: i32::MAX as i64,
			increment: 5,
			cycle: true,
			cache: 3,
			seq_type: SequenceType::Int4,
		}
	);
	assert_eq!(
		session.sequence_options("s").unwrap(),
		vec![Cache(3), Cycle(true), Increment(5), MaxValue(Some(i32::MAX as i64)), MinValue(Some(1)), Start(10)]
	);
}

#[test]
fn test_restart_is_idempotent() {
	let db = test_database();
	let mut session = test_session(&db);
	session.create_sequence(CreateSequence::new("s")).unwrap();
	for _ in 0..3 {
		session.nextval("s").unwrap();
	}

	session.alter_sequence(AlterSequence::new("s").option(Restart(None))).unwrap();
	session.alter_sequence(AlterSequence::new("s").option(Restart(None))).unwrap();
	assert_eq!(session.nextval("s").unwrap(), 1);

	session.alter_sequence(AlterSequence::new("s").option(Restart(Some(42)))).unwrap();
	assert_eq!(
		session.sequence_data("s").unwrap(),
		SequenceData {
			last_value: Some(42),
			is_called: Some(false),
		}
	);
	assert_eq!(session.nextval("s").unwrap(), 42);
}

#[test]
fn test_restart_rolls_back() {
	let db = test_database();
	let mut session = test_session(&db);
	session.create_sequence(CreateSequence::new("s")).unwrap();
	session.nextval("s").unwrap();
	session.nextval("s").unwrap();

	session.begin().unwrap();
	session.alter_sequence(AlterSequence::new("s").option(Restart(Some(500)))).unwrap();
	assert_eq!(session.nextval("s").unwrap(), 500);
	session.rollback().unwrap();

	assert_eq!(session.nextval("s").unwrap(), 3);
}

#[test]
fn test_restart_voids_cached_values() {
	let db = test_database();
	let mut session = test_session(&db);
	session.create_sequence(CreateSequence::new("s").option(Cache(20))).unwrap();
	assert_eq!(session.nextval("s").unwrap(), 1);

	let mut other = test_session(&db);
	other.alter_sequence(AlterSequence::new("s").option(Restart(Some(100)))).unwrap();

	// The new storage is noticed before the next cached value is used.
	assert_eq!(session.nextval("s").unwrap(), 100);
}

#[test]
fn test_alter_keeps_position() {
	let db = test_database();
	let mut session = test_session(&db);
	session.create_sequence(CreateSequence::new("s")).unwrap();
	session.nextval("s").unwrap();
	session.nextval("s").unwrap();

	session.alter_sequence(AlterSequence::new("s").option(Increment(10))).unwrap();
	assert_eq!(session.nextval("s").unwrap(), 12);

	let err = session.alter_sequence(AlterSequence::new("s").option(MaxValue(Some(5)))).unwrap_err();
	assert_eq!(err.code, "SEQUENCE_014");
}

#[test]
fn test_alter_type_moves_default_bounds() {
	let db = test_database();
	let mut session = test_session(&db);
	session.create_sequence(CreateSequence::new("s").option(As("smallint".to_string()))).unwrap();

	session.alter_sequence(AlterSequence::new("s").option(As("bigint".to_string()))).unwrap();
	let params = session.sequence_parameters("s").unwrap();
	assert_eq!(params.max, i64::MAX);
	assert_eq!(params.seq_type, SequenceType::Int8);
}

#[test]
fn test_alter_missing_sequence() {
	let db = test_database();
	let mut session = test_session(&db);

	assert_eq!(session.alter_sequence(AlterSequence::new("nope").if_exists()).unwrap(), None);
	assert_eq!(session.take_notices(), vec!["relation \"nope\" does not exist, skipping".to_string()]);
	assert_eq!(session.alter_sequence(AlterSequence::new("nope")).unwrap_err().code, "CATALOG_002");
}

#[test]
fn test_drop_sequence() {
	let db = test_database();
	let mut session = test_session(&db);
	session.create_sequence(CreateSequence::new("s")).unwrap();

	session.drop_sequence("s", false).unwrap();
	assert_eq!(session.nextval("s").unwrap_err().code, "CATALOG_002");

	session.drop_sequence("s", true).unwrap();
	assert_eq!(session.take_notices(), vec!["sequence \"s\" does not exist, skipping".to_string()]);
}

#[test]
fn test_drop_forgets_session_state() {
	let db = test_database();
	let mut session = test_session(&db);
	session.create_sequence(CreateSequence::new("s")).unwrap();
	session.create_sequence(CreateSequence::new("t")).unwrap();
	session.nextval("s").unwrap();
	session.nextval("t").unwrap();
	assert_eq!(session.cached_sequences(), 2);

	session.begin().unwrap();
	session.drop_sequence("s", false).unwrap();
	session.rollback().unwrap();
	assert_eq!(session.cached_sequences(), 2);
	assert_eq!(session.currval("s").unwrap(), 1);

	session.drop_sequence("s", false).unwrap();
	assert_eq!(session.cached_sequences(), 1);
	assert_eq!(session.currval("t").unwrap(), 1);
}

#[test]
fn test_owned_by_drops_with_table() {
	let db = test_database();
	let mut session = test_session(&db);
	session.create_table(CreateTable::new("t").column(ColumnSpec::new("c", ColumnType::Int8))).unwrap();
	session
		.create_sequence(CreateSequence::new("s").option(OwnedBy(vec!["t".to_string(), "c".to_string()])))
		.unwrap();
	session
		.create_sequence(CreateSequence::new("free").option(OwnedBy(vec!["t".to_string(), "c".to_string()])))
		.unwrap();
	session.alter_sequence(AlterSequence::new("free").option(OwnedBy(vec!["none".to_string()]))).unwrap();

	session.drop_table("t", false).unwrap();
	assert_eq!(session.nextval("s").unwrap_err().code, "CATALOG_002");
	assert_eq!(session.nextval("free").unwrap(), 1);
}

#[test]
fn test_owned_by_errors() {
	let db = test_database();
	let mut session = test_session(&db);
	session.create_table(CreateTable::new("t").column(ColumnSpec::new("c", ColumnType::Int8))).unwrap();
	session.create_sequence(CreateSequence::new("other")).unwrap();

	let mut owned_by = |names: &[&str]| {
		let names = names.iter().map(|name| name.to_string()).collect();
		session.create_sequence(CreateSequence::new("s").option(OwnedBy(names))).unwrap_err().code.clone()
	};
	assert_eq!(owned_by(&["c"]), "SEQUENCE_016");
	assert_eq!(owned_by(&["other", "c"]), "SEQUENCE_017");
	assert_eq!(owned_by(&["t", "missing"]), "CATALOG_010");
}

#[test]
fn test_set_logged_on_temporary_is_rejected() {
	let db = test_database();
	let mut session = test_session(&db);
	session.create_sequence(CreateSequence::new("t").temporary()).unwrap();

	let err = session.alter_sequence_set_logged("t", true).unwrap_err();
	assert_eq!(err.code, "SEQUENCE_025");
	assert_eq!(err.message, "cannot change logged status of sequence \"t\" because it is temporary");
}

#[test]
fn test_set_logged_round_trip_keeps_value() {
	let db = test_database();
	let mut session = test_session(&db);
	session.create_sequence(CreateSequence::new("s")).unwrap();
	session.nextval("s").unwrap();

	session.alter_sequence_set_logged("s", false).unwrap();
	assert_eq!(session.nextval("s").unwrap(), 2);
	session.alter_sequence_set_logged("s", true).unwrap();
	assert_eq!(session.nextval("s").unwrap(), 3);
}

#[test]
fn test_list_sequences() {
	let db = test_database();
	let mut session = test_session(&db);
	session.create_sequence(CreateSequence::new("a")).unwrap();
	session.create_sequence(CreateSequence::new("b").option(Start(7))).unwrap();
	session.nextval("b").unwrap();

	let listing = session.list_sequences().unwrap();
	let names: Vec<_> = listing.iter().map(|row| row.name.as_str()).collect();
	assert_eq!(names, vec!["a", "b"]);
	assert_eq!(listing[0].owner, "admin");
	assert_eq!(listing[0].last_value, None);
	assert_eq!(listing[1].last_value, Some(7));
	assert_eq!(listing[1].data_type, SequenceType::Int8);

	assert_eq!(session.sequence_last_value("a").unwrap(), None);
	assert_eq!(session.sequence_last_value("b").unwrap(), Some(7));
}

#[test]
fn test_failed_block_must_be_rolled_back() {
	let db = test_database();
	let mut session = test_session(&db);
	session.create_sequence(CreateSequence::new("s").option(MaxValue(Some(2)))).unwrap();
	session.create_sequence(CreateSequence::new("t")).unwrap();

	session.begin().unwrap();
	assert_eq!(session.begin().unwrap_err().code, "TXN_004");
	assert_eq!(session.nextval("s").unwrap(), 1);
	assert_eq!(session.nextval("s").unwrap(), 2);
	session.alter_sequence(AlterSequence::new("t").option(Restart(Some(50)))).unwrap();
	assert_eq!(session.nextval("s").unwrap_err().code, "SEQUENCE_001");
	assert_eq!(session.nextval("t").unwrap_err().code, "TXN_003");
	assert_eq!(session.currval("s").unwrap_err().code, "TXN_003");
	session.commit().unwrap();
	assert!(!session.in_transaction());
	assert_eq!(session.commit().unwrap_err().code, "TXN_005");

	// The commit rolled the block back, restart included.
	assert_eq!(session.nextval("t").unwrap(), 1);
	assert_eq!(session.nextval("s").unwrap_err().code, "SEQUENCE_001");
}
