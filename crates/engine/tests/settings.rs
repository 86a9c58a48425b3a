// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::sync::atomic::Ordering;

use seqdb_engine::{CreateAccessMethod, CreateSequence, Database, SettingContext, SettingDef, SettingValue};
use seqdb_testing::{register_counting_am, test_config, test_database, test_session};

const DEFAULT_AM: &str = "default_sequence_access_method";

#[test]
fn test_default_is_local() {
	let db = test_database();
	let session = test_session(&db);
	assert_eq!(session.show_config(DEFAULT_AM).unwrap(), SettingValue::String("local".to_string()));
}

#[test]
fn test_default_access_method_applies_to_new_sequences() {
	let db = test_database();
	let calls = register_counting_am(&db, "counting_handler");
	let mut session = test_session(&db);
	session.create_access_method(CreateAccessMethod::sequence("counting", "counting_handler")).unwrap();

	session.set_config(DEFAULT_AM, "counting").unwrap();
	assert_eq!(session.show_config(DEFAULT_AM).unwrap(), SettingValue::String("counting".to_string()));

	session.create_sequence(CreateSequence::new("s")).unwrap();
	assert_eq!(session.nextval("s").unwrap(), 1);
	assert_eq!(calls.load(Ordering::SeqCst), 1);

	// Other sessions keep their own value.
	let mut other = test_session(&db);
	other.create_sequence(CreateSequence::new("t")).unwrap();
	assert_eq!(other.nextval("t").unwrap(), 1);
	assert_eq!(calls.load(Ordering::SeqCst), 1);

	session.reset_config(DEFAULT_AM).unwrap();
	assert_eq!(session.show_config(DEFAULT_AM).unwrap(), SettingValue::String("local".to_string()));
	session.create_sequence(CreateSequence::new("u")).unwrap();
	session.nextval("u").unwrap();
	assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_rejected_values() {
	let db = test_database();
	let mut session = test_session(&db);

	let err = session.set_config(DEFAULT_AM, "missing").unwrap_err();
	assert_eq!(err.code, "CONFIG_006");
	assert_eq!(err.message, "sequence access method \"missing\" does not exist");

	let err = session.set_config(DEFAULT_AM, "").unwrap_err();
	assert_eq!(err.code, "CONFIG_002");

	let err = session.set_config(DEFAULT_AM, "heap").unwrap_err();
	assert_eq!(err.code, "CATALOG_006");

	let err = session.set_config("no_such_setting", "1").unwrap_err();
	assert_eq!(err.code, "CONFIG_001");
	assert_eq!(err.message, "unrecognized configuration parameter \"no_such_setting\"");

	assert_eq!(session.show_config(DEFAULT_AM).unwrap(), SettingValue::String("local".to_string()));
}

#[test]
fn test_set_survives_rollback() {
	let db = test_database();
	register_counting_am(&db, "counting_handler");
	let mut session = test_session(&db);
	session.create_access_method(CreateAccessMethod::sequence("counting", "counting_handler")).unwrap();

	session.begin().unwrap();
	session.set_config(DEFAULT_AM, "counting").unwrap();
	session.rollback().unwrap();

	assert_eq!(session.show_config(DEFAULT_AM).unwrap(), SettingValue::String("counting".to_string()));
}

#[test]
fn test_startup_default_is_checked_on_use() {
	let config = test_config().with_default_sequence_access_method("missing");
	let db = Database::open(config).unwrap();
	let mut session = test_session(&db);

	assert_eq!(session.show_config(DEFAULT_AM).unwrap(), SettingValue::String("missing".to_string()));
	let err = session.create_sequence(CreateSequence::new("s")).unwrap_err();
	assert_eq!(err.code, "CATALOG_005");

	session.create_sequence(CreateSequence::new("s").using("local")).unwrap();
	assert_eq!(session.nextval("s").unwrap(), 1);
}

#[test]
fn test_custom_settings() {
	let db = test_database();
	db.define_setting(SettingDef::int("app.batch", "Batch size.", 10, 1, 100)).unwrap();
	db.define_setting(SettingDef::int("app.shards", "Shard count.", 4, 1, 64).with_context(SettingContext::Startup))
		.unwrap();

	let err = db.define_setting(SettingDef::int("app.batch", "Batch size.", 10, 1, 100)).unwrap_err();
	assert_eq!(err.code, "CONFIG_007");

	let mut session = test_session(&db);
	assert_eq!(session.show_config("app.batch").unwrap(), SettingValue::Int(10));
	session.set_config("app.batch", "25").unwrap();
	assert_eq!(session.show_config("app.batch").unwrap(), SettingValue::Int(25));

	assert_eq!(session.set_config("app.batch", "101").unwrap_err().code, "CONFIG_003");
	assert_eq!(session.set_config("app.batch", "many").unwrap_err().code, "CONFIG_002");
	assert_eq!(session.set_config("app.shards", "8").unwrap_err().code, "CONFIG_005");
}
