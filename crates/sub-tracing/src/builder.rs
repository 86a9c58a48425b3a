// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use once_cell::sync::OnceCell;
use seqdb_type::{Result, internal_err};
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt};

static INSTALLED: OnceCell<OutputFormat> = OnceCell::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
	#[default]
	Fmt,
	Json,
}

/// Builder for the global subscriber. `RUST_LOG`, when set, wins over the
/// configured level and directives.
#[derive(Debug, Clone)]
pub struct TracingBuilder {
	level: String,
	directives: Vec<String>,
	format: OutputFormat,
	with_target: bool,
	with_thread_names: bool,
	test_writer: bool,
}

impl Default for TracingBuilder {
	fn default() -> Self {
		Self::new()
	}
}

impl TracingBuilder {
	pub fn new() -> Self {
		Self {
			level: "info".to_string(),
			directives: Vec::new(),
			format: OutputFormat::Fmt,
			with_target: true,
			with_thread_names: false,
			test_writer: false,
		}
	}

	pub fn with_level(mut self, level: impl Into<String>) -> Self {
		self.level = level.into();
		self
	}

	/// Adds a filter directive such as `seqdb_wal=trace`.
	pub fn with_directive(mut self, directive: impl Into<String>) -> Self {
		self.directives.push(directive.into());
		self
	}

	pub fn with_format(mut self, format: OutputFormat) -> Self {
		self.format = format;
		self
	}

	pub fn with_target(mut self, with_target: bool) -> Self {
		self.with_target = with_target;
		self
	}

	pub fn with_thread_names(mut self, with_thread_names: bool) -> Self {
		self.with_thread_names = with_thread_names;
		self
	}

	/// Writes through the test harness so output is captured per test.
	pub fn for_tests(mut self) -> Self {
		self.test_writer = true;
		self
	}

	pub fn filter(&self) -> EnvFilter {
		if let Ok(filter) = EnvFilter::try_from_default_env() {
			return filter;
		}
		let mut filter = self.level.clone();
		for directive in &self.directives {
			filter.push(',');
			filter.push_str(directive);
		}
		EnvFilter::new(filter)
	}

	/// Installs the subscriber. Fails when another subscriber is already
	/// installed.
	pub fn build(self) -> Result<()> {
		let filter = self.filter();
		let builder = fmt()
			.with_env_filter(filter)
			.with_target(self.with_target)
			.with_thread_names(self.with_thread_names);

		let installed = match (self.format, self.test_writer) {
			(OutputFormat::Fmt, false) => builder.try_init(),
			(OutputFormat::Fmt, true) => builder.with_test_writer().try_init(),
			(OutputFormat::Json, false) => builder.json().try_init(),
			(OutputFormat::Json, true) => builder.json().with_test_writer().try_init(),
		};
		if let Err(err) = installed {
			return internal_err!("failed to install tracing subscriber: {}", err);
		}

		let _ = INSTALLED.set(self.format);
		debug!(format = ?self.format, "tracing subscriber installed");
		Ok(())
	}

	/// Like [`TracingBuilder::build`], but a second call is a no-op.
	/// Returns whether this call installed the subscriber.
	pub fn try_init(self) -> bool {
		if INSTALLED.get().is_some() {
			return false;
		}
		self.build().is_ok()
	}
}

#[cfg(test)]
mod tests {
	use super::{OutputFormat, TracingBuilder};

	#[test]
	fn test_defaults() {
		let builder = TracingBuilder::default();
		assert_eq!(builder.level, "info");
		assert_eq!(builder.format, OutputFormat::Fmt);
		assert!(builder.directives.is_empty());
	}

	#[test]
	fn test_directives_accumulate() {
		let builder = TracingBuilder::new()
			.with_level("warn")
			.with_directive("seqdb_engine=debug")
			.with_directive("seqdb_wal=trace")
			.with_format(OutputFormat::Json);
		assert_eq!(builder.directives, vec!["seqdb_engine=debug", "seqdb_wal=trace"]);
		assert_eq!(builder.format, OutputFormat::Json);
	}

	#[test]
	fn test_second_init_is_noop() {
		TracingBuilder::new().for_tests().try_init();
		assert!(!TracingBuilder::new().for_tests().try_init());
	}
}
