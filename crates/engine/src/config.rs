// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Startup configuration of a database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
	/// Access method for sequences created without `USING`.
	pub default_sequence_access_method: String,
	/// How long lock waits last before failing, in milliseconds.
	pub lock_timeout_ms: u64,
	/// Bytes reserved up front for the write-ahead log.
	pub wal_segment_hint: usize,
	/// Write a checkpoint when the database shuts down cleanly.
	pub checkpoint_on_shutdown: bool,
}

impl Default for DatabaseConfig {
	fn default() -> Self {
		Self {
			default_sequence_access_method: "local".to_string(),
			lock_timeout_ms: 5_000,
			wal_segment_hint: 64 * 1024,
			checkpoint_on_shutdown: true,
		}
	}
}

impl DatabaseConfig {
	pub fn from_json(json: &str) -> crate::Result<Self> {
		serde_json::from_str(json).map_err(|err| {
			ConfigError::Parse {
				reason: err.to_string(),
			}
			.into()
		})
	}

	pub fn lock_timeout(&self) -> Duration {
		Duration::from_millis(self.lock_timeout_ms)
	}

	pub fn with_default_sequence_access_method(mut self, name: impl Into<String>) -> Self {
		self.default_sequence_access_method = name.into();
		self
	}

	pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
		self.lock_timeout_ms = timeout.as_millis() as u64;
		self
	}
}

#[cfg(test)]
mod tests {
	use std::time::Duration;

	use super::DatabaseConfig;

	#[test]
	fn test_partial_json_keeps_defaults() {
		let config = DatabaseConfig::from_json(r#"{ "lock_timeout_ms": 250 }"#).unwrap();
		assert_eq!(config.lock_timeout(), Duration::from_millis(250));
		assert_eq!(config.default_sequence_access_method, "local");
		assert!(config.checkpoint_on_shutdown);
	}

	#[test]
	fn test_unknown_field() {
		let err = DatabaseConfig::from_json(r#"{ "lock_timeout": 1 }"#).unwrap_err();
		assert_eq!(err.code, "CONFIG_008");
	}
}
