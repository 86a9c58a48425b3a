// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::sync::Arc;

use seqdb_engine::{
	AlterSequence, CreateAccessMethod, CreateSequence, Database, SequenceData, SequenceOption, Session,
};
use seqdb_snowflake::{ManualClock, SNOWFLAKE_HANDLER, SnowflakeId, load, load_with_clock, snowflake_get};
use seqdb_testing::{crash_and_recover, test_database, test_session};

const NOW: i64 = 1_700_000_000_000;

fn setup(clock: Arc<ManualClock>) -> (Database, Session) {
	let db = test_database();
	load_with_clock(&db, clock).unwrap();
	let mut session = test_session(&db);
	session.create_access_method(CreateAccessMethod::sequence("snowflake", SNOWFLAKE_HANDLER)).unwrap();
	(db, session)
}

fn create(session: &mut Session, name: &str) {
	session.create_sequence(CreateSequence::new(name).using("snowflake")).unwrap();
}

#[test]
fn test_nextval_encodes_clock_machine_and_counter() {
	let clock = Arc::new(ManualClock::new(NOW));
	let (_db, mut session) = setup(clock.clone());
	create(&mut session, "s");
	session.set_config("snowflake.machine_id", "7").unwrap();

	// The counter starts at the start value and nextval moves it first.
	let first = snowflake_get(session.nextval("s").unwrap());
	assert_eq!(
		first,
		SnowflakeId {
			time_ms: NOW as u64,
			machine: 7,
			count: 2,
		}
	);

	clock.advance(5);
	let second = snowflake_get(session.nextval("s").unwrap());
	assert_eq!(second.time_ms, NOW as u64 + 5);
	assert_eq!(second.count, 3);
	assert_eq!(session.currval("s").unwrap(), second.encode());
	assert_eq!(session.lastval().unwrap(), second.encode());
}

#[test]
fn test_default_machine_id_is_one() {
	let (_db, mut session) = setup(Arc::new(ManualClock::new(NOW)));
	create(&mut session, "s");
	assert_eq!(snowflake_get(session.nextval("s").unwrap()).machine, 1);
}

#[test]
fn test_counter_wraps_and_waits_a_millisecond() {
	let clock = Arc::new(ManualClock::new(NOW));
	let (_db, mut session) = setup(clock.clone());
	create(&mut session, "s");

	session.setval("s", 4095).unwrap();
	let id = snowflake_get(session.nextval("s").unwrap());
	assert_eq!(id.count, 1);
	assert_eq!(id.time_ms, NOW as u64 + 1);
}

#[test]
fn test_state_is_the_counter() {
	let (_db, mut session) = setup(Arc::new(ManualClock::new(NOW)));
	create(&mut session, "s");
	assert_eq!(
		session.sequence_data("s").unwrap(),
		SequenceData {
			last_value: Some(1),
			is_called: Some(false),
		}
	);

	session.nextval("s").unwrap();
	session.nextval("s").unwrap();
	assert_eq!(
		session.sequence_data("s").unwrap(),
		SequenceData {
			last_value: Some(3),
			is_called: Some(true),
		}
	);

	session.setval_with_called("s", 4096 + 10, false).unwrap();
	assert_eq!(
		session.sequence_data("s").unwrap(),
		SequenceData {
			last_value: Some(10),
			is_called: Some(false),
		}
	);
}

#[test]
fn test_restart_resets_counter() {
	let (_db, mut session) = setup(Arc::new(ManualClock::new(NOW)));
	create(&mut session, "s");
	session.nextval("s").unwrap();

	session.alter_sequence(AlterSequence::new("s").option(SequenceOption::Restart(Some(100)))).unwrap();
	assert_eq!(session.sequence_data("s").unwrap().last_value, Some(100));
	assert_eq!(snowflake_get(session.nextval("s").unwrap()).count, 101);
}

#[test]
fn test_crash_resets_counter_from_init_fork() {
	let clock = Arc::new(ManualClock::new(NOW));
	let (db, mut session) = setup(clock.clone());
	create(&mut session, "s");
	for _ in 0..4 {
		session.nextval("s").unwrap();
	}
	drop(session);

	let recovered = crash_and_recover(&db);
	load_with_clock(&recovered, clock.clone()).unwrap();
	let mut session = test_session(&recovered);

	assert_eq!(session.sequence_data("s").unwrap().last_value, Some(1));
	clock.advance(1);
	let id = snowflake_get(session.nextval("s").unwrap());
	assert_eq!(id.count, 2);
	assert_eq!(id.time_ms, NOW as u64 + 1);
}

#[test]
fn test_set_logged_keeps_counter() {
	let (_db, mut session) = setup(Arc::new(ManualClock::new(NOW)));
	create(&mut session, "s");
	session.nextval("s").unwrap();

	session.alter_sequence_set_logged("s", true).unwrap();
	assert_eq!(snowflake_get(session.nextval("s").unwrap()).count, 3);
}

#[test]
fn test_temporary_sequence() {
	let (_db, mut session) = setup(Arc::new(ManualClock::new(NOW)));
	session.create_sequence(CreateSequence::new("t").temporary().using("snowflake")).unwrap();
	assert_eq!(snowflake_get(session.nextval("t").unwrap()).count, 2);
}

#[test]
fn test_default_access_method_setting() {
	let (_db, mut session) = setup(Arc::new(ManualClock::new(NOW)));
	session.set_config("default_sequence_access_method", "snowflake").unwrap();
	session.create_sequence(CreateSequence::new("s")).unwrap();

	let id = snowflake_get(session.nextval("s").unwrap());
	assert_eq!(id.time_ms, NOW as u64);
}

#[test]
fn test_machine_id_setting() {
	let (db, mut session) = setup(Arc::new(ManualClock::new(NOW)));

	let err = session.set_config("snowflake.machine_id", "1024").unwrap_err();
	assert_eq!(err.code, "CONFIG_003");

	session.create_role("app", false).unwrap();
	let mut app = db.connect("app").unwrap();
	let err = app.set_config("snowflake.machine_id", "3").unwrap_err();
	assert_eq!(err.code, "CONFIG_004");
}

#[test]
fn test_ids_increase_with_system_clock() {
	let db = test_database();
	load(&db).unwrap();
	let mut session = test_session(&db);
	session.create_access_method(CreateAccessMethod::sequence("snowflake", SNOWFLAKE_HANDLER)).unwrap();
	create(&mut session, "s");

	// Crosses at least one counter wrap.
	let mut previous = 0;
	for _ in 0..5000 {
		let id = session.nextval("s").unwrap();
		assert!(id > previous);
		previous = id;
	}
}
