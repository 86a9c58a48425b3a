// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::time::Duration;

use seqdb_engine::{Database, DatabaseConfig, Session};
use seqdb_sub_tracing::TracingBuilder;
use tracing::info;

/// Installs a test subscriber once per process. `RUST_LOG` picks the level.
pub fn init_tracing() {
	TracingBuilder::new().with_level("warn").for_tests().try_init();
}

/// Short lock timeout so a blocked test fails fast.
pub fn test_config() -> DatabaseConfig {
	DatabaseConfig::default().with_lock_timeout(Duration::from_millis(500))
}

pub fn test_database() -> Database {
	init_tracing();
	Database::open(test_config()).unwrap()
}

/// A session of the bootstrap superuser.
pub fn test_session(db: &Database) -> Session {
	db.session().unwrap()
}

/// Crashes `db` and recovers a new database from what survived.
pub fn crash_and_recover(db: &Database) -> Database {
	let image = db.crash();
	info!(wal_bytes = image.wal.bytes.len(), "recovering from crash image");
	Database::recover(db.config().clone(), image).unwrap()
}

/// Opens the current durable state of `db` as a hot standby.
pub fn standby_of(db: &Database) -> Database {
	Database::standby(db.config().clone(), db.crash()).unwrap()
}
