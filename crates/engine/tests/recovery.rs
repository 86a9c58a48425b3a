// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::collections::BTreeSet;

use seqdb_engine::{CreateSequence, SequenceData, SequenceOption::Cache};
use seqdb_testing::{crash_and_recover, standby_of, test_database, test_session};

#[test]
fn test_crash_never_hands_out_a_value_twice() {
	let db = test_database();
	let mut session = test_session(&db);
	session.create_sequence(CreateSequence::new("s")).unwrap();

	let mut seen = BTreeSet::new();
	for _ in 0..5 {
		seen.insert(session.nextval("s").unwrap());
	}
	drop(session);

	let recovered = crash_and_recover(&db);
	let mut session = test_session(&recovered);
	for _ in 0..40 {
		let value = session.nextval("s").unwrap();
		assert!(value > 5);
		assert!(seen.insert(value), "value {} handed out twice", value);
	}
}

#[test]
fn test_crash_inside_later_log_batch() {
	// Crash points before, at and after the edges of the 32 value batches.
	for calls in [1, 31, 33, 34, 45, 70, 100] {
		let db = test_database();
		let mut session = test_session(&db);
		session.create_sequence(CreateSequence::new("s")).unwrap();

		let mut last = 0;
		for _ in 0..calls {
			let value = session.nextval("s").unwrap();
			assert_eq!(value, last + 1);
			last = value;
		}
		drop(session);

		let recovered = crash_and_recover(&db);
		let next = test_session(&recovered).nextval("s").unwrap();
		assert!(next > last, "after {} calls the next value {} was already handed out", calls, next);
		assert!(next <= last + 33, "after {} calls the next value {} skips more than a batch", calls, next);
	}
}

#[test]
fn test_crash_with_session_caches() {
	let db = test_database();
	test_session(&db).create_sequence(CreateSequence::new("s").option(Cache(10))).unwrap();

	let mut first = test_session(&db);
	let mut second = test_session(&db);
	let mut seen = BTreeSet::new();
	for _ in 0..27 {
		assert!(seen.insert(first.nextval("s").unwrap()));
		assert!(seen.insert(second.nextval("s").unwrap()));
	}
	drop(first);
	drop(second);
	let highest = seen.iter().copied().max().unwrap();

	let recovered = crash_and_recover(&db);
	let mut first = test_session(&recovered);
	let mut second = test_session(&recovered);
	for _ in 0..40 {
		for session in [&mut first, &mut second] {
			let value = session.nextval("s").unwrap();
			assert!(value > highest);
			assert!(seen.insert(value), "value {} handed out twice", value);
		}
	}
}

#[test]
fn test_repeated_crashes_keep_moving_forward() {
	let mut db = test_database();
	test_session(&db).create_sequence(CreateSequence::new("s")).unwrap();

	let mut last = 0;
	for _ in 0..3 {
		let mut session = test_session(&db);
		let value = session.nextval("s").unwrap();
		assert!(value > last);
		last = value;
		drop(session);
		db = crash_and_recover(&db);
	}
}

#[test]
fn test_checkpoint_forces_a_new_log_record() {
	let db = test_database();
	let mut session = test_session(&db);
	session.create_sequence(CreateSequence::new("s")).unwrap();
	session.nextval("s").unwrap();

	// Values logged ahead are served without touching the log.
	let before = db.insert_lsn();
	assert_eq!(session.nextval("s").unwrap(), 2);
	assert_eq!(db.insert_lsn(), before);

	db.checkpoint().unwrap();
	let after_checkpoint = db.insert_lsn();
	assert_eq!(session.nextval("s").unwrap(), 3);
	let records = db.describe_wal(after_checkpoint);
	assert!(records.iter().any(|record| record.starts_with("rmgr: SequenceLocal")), "{:?}", records);
}

#[test]
fn test_setval_survives_crash() {
	let db = test_database();
	let mut session = test_session(&db);
	session.create_sequence(CreateSequence::new("s")).unwrap();
	session.setval("s", 1000).unwrap();
	drop(session);

	let recovered = crash_and_recover(&db);
	assert_eq!(test_session(&recovered).nextval("s").unwrap(), 1001);
}

#[test]
fn test_unlogged_sequence_resets_after_crash() {
	let db = test_database();
	let mut session = test_session(&db);
	session.create_sequence(CreateSequence::new("u").unlogged()).unwrap();
	for expected in 1..=3 {
		assert_eq!(session.nextval("u").unwrap(), expected);
	}
	drop(session);

	let recovered = crash_and_recover(&db);
	let mut session = test_session(&recovered);
	assert_eq!(
		session.sequence_data("u").unwrap(),
		SequenceData {
			last_value: Some(1),
			is_called: Some(false),
		}
	);
	assert_eq!(session.nextval("u").unwrap(), 1);
}

#[test]
fn test_set_unlogged_keeps_state_at_conversion() {
	let db = test_database();
	let mut session = test_session(&db);
	session.create_sequence(CreateSequence::new("s")).unwrap();
	for _ in 0..3 {
		session.nextval("s").unwrap();
	}
	session.alter_sequence_set_logged("s", false).unwrap();
	assert_eq!(session.nextval("s").unwrap(), 4);
	assert_eq!(session.nextval("s").unwrap(), 5);
	drop(session);

	let recovered = crash_and_recover(&db);
	assert_eq!(test_session(&recovered).nextval("s").unwrap(), 4);
}

#[test]
fn test_temporary_sequence_goes_with_session() {
	let db = test_database();
	let mut session = test_session(&db);
	session.create_sequence(CreateSequence::new("t").temporary()).unwrap();
	assert_eq!(session.nextval("t").unwrap(), 1);
	drop(session);

	let err = test_session(&db).nextval("t").unwrap_err();
	assert_eq!(err.code, "CATALOG_002");
}

#[test]
fn test_standby_reads_logged_state_only() {
	let db = test_database();
	let mut session = test_session(&db);
	session.create_sequence(CreateSequence::new("p")).unwrap();
	session.create_sequence(CreateSequence::new("u").unlogged()).unwrap();
	session.nextval("p").unwrap();
	session.nextval("u").unwrap();

	let standby = standby_of(&db);
	assert!(standby.is_in_recovery());
	let mut session = test_session(&standby);

	let data = session.sequence_data("p").unwrap();
	assert_eq!(data.is_called, Some(true));
	assert!(data.last_value.is_some());
	assert_eq!(session.sequence_data("u").unwrap(), SequenceData::default());

	let err = session.nextval("p").unwrap_err();
	assert_eq!(err.code, "TXN_001");
	assert_eq!(session.setval("p", 10).unwrap_err().code, "TXN_001");
	drop(session);

	standby.promote().unwrap();
	assert!(!standby.is_in_recovery());
	let mut session = test_session(&standby);
	assert!(session.nextval("p").unwrap() > 1);
	assert_eq!(session.nextval("u").unwrap(), 1);
}

#[test]
fn test_clean_shutdown_keeps_everything() {
	let db = test_database();
	let config = db.config().clone();
	let mut session = test_session(&db);
	session.create_sequence(CreateSequence::new("u").unlogged()).unwrap();
	session.nextval("u").unwrap();
	session.nextval("u").unwrap();
	drop(session);

	let image = db.shutdown().unwrap();
	let reopened = seqdb_engine::Database::recover(config, image).unwrap();
	assert_eq!(test_session(&reopened).nextval("u").unwrap(), 3);
}
