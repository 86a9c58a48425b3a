// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use super::{Diagnostic, ErrorKind, Severity};

/// Where an internal error was raised.
#[derive(Debug, Clone, Copy)]
pub struct Location<'a> {
	pub file: &'a str,
	pub line: u32,
	pub function: &'a str,
}

/// Diagnostic for a broken internal contract. The incident id combines the
/// wall clock with the source position so reports can be matched to logs.
pub fn internal_at(reason: impl Into<String>, location: Location<'_>) -> Diagnostic {
	let file = location.file.rsplit('/').next().unwrap_or(location.file);
	let incident = format!("{}@{}:{}", chrono::Utc::now().timestamp_millis(), file, location.line);

	Diagnostic {
		code: "INTERNAL_ERROR".to_string(),
		kind: ErrorKind::Internal,
		severity: Severity::Fatal,
		message: format!("internal error: {}", reason.into()),
		label: Some(format!("raised in {} ({}:{})", location.function, location.file, location.line)),
		detail: None,
		help: Some(format!(
			"please report this together with incident {} and seqdb {} on {}",
			incident,
			env!("CARGO_PKG_VERSION"),
			std::env::consts::OS
		)),
		notes: vec![format!("function: {}", location.function), format!("incident: {}", incident)],
		cause: None,
	}
}

pub fn internal(reason: impl Into<String>) -> Diagnostic {
	internal_at(
		reason,
		Location {
			file: "unknown",
			line: 0,
			function: "unknown",
		},
	)
}

/// Path of the enclosing function.
#[doc(hidden)]
#[macro_export]
macro_rules! __function_path {
	() => {{
		fn f() {}
		fn name_of<T>(_: T) -> &'static str {
			std::any::type_name::<T>()
		}
		let name = name_of(f);
		name.strip_suffix("::f").unwrap_or(name)
	}};
}

#[macro_export]
macro_rules! internal_error {
	($($arg:tt)+) => {
		$crate::error::diagnostic::internal_at(
			format!($($arg)+),
			$crate::error::diagnostic::Location {
				file: file!(),
				line: line!(),
				function: $crate::__function_path!(),
			},
		)
	};
}

#[macro_export]
macro_rules! internal_err {
	($($arg:tt)+) => {
		Err($crate::Error($crate::internal_error!($($arg)+)))
	};
}

#[macro_export]
macro_rules! return_internal_error {
	($($arg:tt)+) => {
		return $crate::internal_err!($($arg)+)
	};
}
