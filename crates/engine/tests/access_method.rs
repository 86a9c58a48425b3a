// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::sync::{Arc, atomic::Ordering};

use seqdb_engine::{CreateAccessMethod, CreateSequence, LOCAL_SEQUENCE_AM, SequenceAccessMethod};
use seqdb_testing::{register_counting_am, test_database, test_session};
use seqdb_type::Severity;

const LOCAL_SEQUENCE_AM_HANDLER: &str = "local_sequenceam_handler";

#[test]
fn test_create_and_use_access_method() {
	let db = test_database();
	let calls = register_counting_am(&db, "counting_handler");
	let mut session = test_session(&db);

	session.create_access_method(CreateAccessMethod::sequence("counting", "counting_handler")).unwrap();
	session.create_sequence(CreateSequence::new("s").using("counting")).unwrap();
	assert_eq!(session.nextval("s").unwrap(), 1);
	assert_eq!(session.nextval("s").unwrap(), 2);
	assert_eq!(calls.load(Ordering::SeqCst), 2);

	let err = session.create_access_method(CreateAccessMethod::sequence("counting", "counting_handler")).unwrap_err();
	assert_eq!(err.code, "CATALOG_004");
}

#[test]
fn test_handler_must_exist_and_work() {
	let db = test_database();
	db.register_sequence_am_handler("broken_handler", Arc::new(|| -> Option<Arc<dyn SequenceAccessMethod>> { None }));
	let mut session = test_session(&db);

	let err = session.create_access_method(CreateAccessMethod::sequence("bad", "missing_handler")).unwrap_err();
	assert_eq!(err.code, "SEQUENCE_023");
	assert_eq!(err.message, "function missing_handler does not exist");

	let err = session.create_access_method(CreateAccessMethod::sequence("bad", "broken_handler")).unwrap_err();
	assert_eq!(err.code, "SEQUENCE_024");
	assert_eq!(err.severity, Severity::Fatal);
}

#[test]
fn test_table_access_methods() {
	let db = test_database();
	let mut session = test_session(&db);

	let err = session.create_access_method(CreateAccessMethod::table("columnar", "columnar_handler")).unwrap_err();
	assert_eq!(err.code, "SEQUENCE_023");
	session.create_access_method(CreateAccessMethod::table("heap2", "heap_tableam_handler")).unwrap();

	let err = session.create_sequence(CreateSequence::new("s").using("heap2")).unwrap_err();
	assert_eq!(err.code, "CATALOG_006");
}

#[test]
fn test_unknown_access_method() {
	let db = test_database();
	let mut session = test_session(&db);

	let err = session.create_sequence(CreateSequence::new("s").using("missing")).unwrap_err();
	assert_eq!(err.code, "CATALOG_005");
	assert_eq!(err.message, "access method \"missing\" does not exist");
}

#[test]
fn test_drop_access_method() {
	let db = test_database();
	register_counting_am(&db, "counting_handler");
	let mut session = test_session(&db);
	session.create_access_method(CreateAccessMethod::sequence("counting", "counting_handler")).unwrap();
	session.create_sequence(CreateSequence::new("s").using("counting")).unwrap();

	let err = session.drop_access_method("counting", false).unwrap_err();
	assert_eq!(err.code, "CATALOG_007");

	session.drop_sequence("s", false).unwrap();
	session.drop_access_method("counting", false).unwrap();
	assert_eq!(session.create_sequence(CreateSequence::new("s").using("counting")).unwrap_err().code, "CATALOG_005");

	session.drop_access_method("counting", true).unwrap();
	assert_eq!(session.take_notices(), vec!["access method \"counting\" does not exist, skipping".to_string()]);
	assert_eq!(session.drop_access_method("counting", false).unwrap_err().code, "CATALOG_005");
}

#[test]
fn test_recreated_access_method_resolves_again() {
	let db = test_database();
	let calls = register_counting_am(&db, "counting_handler");
	let mut session = test_session(&db);

	session.create_access_method(CreateAccessMethod::sequence("am", LOCAL_SEQUENCE_AM_HANDLER)).unwrap();
	session.drop_access_method("am", false).unwrap();
	session.create_access_method(CreateAccessMethod::sequence("am", "counting_handler")).unwrap();

	session.create_sequence(CreateSequence::new("s").using("am")).unwrap();
	session.nextval("s").unwrap();
	assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_access_method_survives_crash() {
	let db = test_database();
	register_counting_am(&db, "counting_handler");
	let mut session = test_session(&db);
	session.create_access_method(CreateAccessMethod::sequence("counting", "counting_handler")).unwrap();
	session.create_sequence(CreateSequence::new("s").using("counting")).unwrap();
	assert_eq!(session.nextval("s").unwrap(), 1);
	drop(session);

	let recovered = seqdb_testing::crash_and_recover(&db);
	let calls = register_counting_am(&recovered, "counting_handler");
	let mut session = test_session(&recovered);
	assert!(session.nextval("s").unwrap() > 1);
	assert_eq!(calls.load(Ordering::SeqCst), 1);

	// The built-in access method is always there.
	session.create_sequence(CreateSequence::new("t").using(LOCAL_SEQUENCE_AM)).unwrap();
}
