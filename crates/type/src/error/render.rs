// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::fmt::Write;

use super::Diagnostic;

pub(crate) fn render(diagnostic: &Diagnostic) -> String {
	let mut out = String::new();
	render_into(&mut out, diagnostic, 0);
	out
}

fn render_into(out: &mut String, diagnostic: &Diagnostic, depth: usize) {
	let indent = "  ".repeat(depth);

	let _ = writeln!(
		out,
		"{}{}: {} [{}] ({})",
		indent,
		diagnostic.severity,
		diagnostic.message,
		diagnostic.code,
		diagnostic.kind.sqlstate()
	);

	if let Some(label) = &diagnostic.label {
		let _ = writeln!(out, "{}  {}", indent, label);
	}
	if let Some(detail) = &diagnostic.detail {
		let _ = writeln!(out, "{}DETAIL: {}", indent, detail);
	}
	if let Some(help) = &diagnostic.help {
		let _ = writeln!(out, "{}HINT: {}", indent, help);
	}
	for note in &diagnostic.notes {
		let _ = writeln!(out, "{}NOTE: {}", indent, note);
	}
	if let Some(cause) = &diagnostic.cause {
		let _ = writeln!(out, "{}CAUSED BY:", indent);
		render_into(out, cause, depth + 1);
	}
}
