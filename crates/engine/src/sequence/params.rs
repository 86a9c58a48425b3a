// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use seqdb_catalog::SequenceDef;
use seqdb_type::SequenceType;

use crate::error::SequenceError;

/// One option of `CREATE SEQUENCE` or `ALTER SEQUENCE`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequenceOption {
	/// `AS type`
	As(String),
	Increment(i64),
	Start(i64),
	/// `RESTART [WITH value]`; without a value the start value is used.
	Restart(Option<i64>),
	/// `MAXVALUE value` or `NO MAXVALUE`.
	MaxValue(Option<i64>),
	MinValue(Option<i64>),
	Cache(i64),
	Cycle(bool),
	/// `OWNED BY table.column` or `OWNED BY NONE`.
	OwnedBy(Vec<String>),
	SequenceName(String),
}

impl SequenceOption {
	pub fn name(&self) -> &'static str {
		match self {
			SequenceOption::As(_) => "as",
			SequenceOption::Increment(_) => "increment",
			SequenceOption::Start(_) => "start",
			SequenceOption::Restart(_) => "restart",
			SequenceOption::MaxValue(_) => "maxvalue",
			SequenceOption::MinValue(_) => "minvalue",
			SequenceOption::Cache(_) => "cache",
			SequenceOption::Cycle(_) => "cycle",
			SequenceOption::OwnedBy(_) => "owned_by",
			SequenceOption::SequenceName(_) => "sequence_name",
		}
	}
}

/// Outcome of applying an option list to a sequence's parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceParams {
	/// Value the sequence restarts from; the current one when unchanged.
	pub last_value: i64,
	pub is_called: bool,
	/// Internal engine state (the local engine's log counter) must restart.
	pub reset_state: bool,
	/// The stored state must be rewritten; `OWNED BY` alone does not.
	pub need_seq_rewrite: bool,
	pub owned_by: Option<Vec<String>>,
}

#[derive(Default)]
struct Given<'a> {
	as_type: Option<&'a str>,
	increment: Option<i64>,
	start: Option<i64>,
	restart: Option<Option<i64>>,
	max: Option<Option<i64>>,
	min: Option<Option<i64>>,
	cache: Option<i64>,
	cycle: Option<bool>,
	owned_by: Option<&'a [String]>,
}

fn set_once<T>(slot: &mut Option<T>, value: T, option: &'static str) -> crate::Result<()> {
	if slot.is_some() {
		return Err(SequenceError::ConflictingOptions {
			option,
		}
		.into());
	}
	*slot = Some(value);
	Ok(())
}

/// Applies `options` to `form`. With `is_init` set this is `CREATE` and every
/// parameter not given takes its default; otherwise it is `ALTER` starting
/// from the current `last_value` and `is_called`.
pub fn init_params(
	options: &[SequenceOption],
	for_identity: bool,
	is_init: bool,
	form: &mut SequenceDef,
	last_value: i64,
	is_called: bool,
) -> crate::Result<SequenceParams> {
	let mut given = Given::default();
	let mut params = SequenceParams {
		last_value,
		is_called,
		reset_state: false,
		need_seq_rewrite: false,
		owned_by: None,
	};

	for option in options {
		let name = option.name();
		match option {
			SequenceOption::As(type_name) => set_once(&mut given.as_type, type_name.as_str(), name)?,
			SequenceOption::Increment(value) => set_once(&mut given.increment, *value, name)?,
			SequenceOption::Start(value) => set_once(&mut given.start, *value, name)?,
			SequenceOption::Restart(value) => set_once(&mut given.restart, *value, name)?,
			SequenceOption::MaxValue(value) => set_once(&mut given.max, *value, name)?,
			SequenceOption::MinValue(value) => set_once(&mut given.min, *value, name)?,
			SequenceOption::Cache(value) => set_once(&mut given.cache, *value, name)?,
			SequenceOption::Cycle(value) => set_once(&mut given.cycle, *value, name)?,
			SequenceOption::OwnedBy(names) => set_once(&mut given.owned_by, names.as_slice(), name)?,
			SequenceOption::SequenceName(_) => return Err(SequenceError::SequenceNameOption.into()),
		}
		if !matches!(option, SequenceOption::OwnedBy(_)) {
			params.need_seq_rewrite = true;
		}
	}
	params.owned_by = given.owned_by.map(<[String]>::to_vec);

	if is_init {
		params.reset_state = true;
	}

	let mut reset_max = false;
	let mut reset_min = false;
	if let Some(type_name) = given.as_type {
		let seq_type = SequenceType::from_name(type_name).ok_or_else(|| SequenceError::InvalidType {
			type_name: type_name.to_string(),
			object: if for_identity {
				"identity column"
			} else {
				"sequence"
			},
		})?;

		// Bounds still at the old type's limits follow the type change.
		if !is_init {
			reset_max = form.max == form.seq_type.max();
			reset_min = form.min == form.seq_type.min();
		}
		form.seq_type = seq_type;
	} else if is_init {
		form.seq_type = SequenceType::Int8;
	}

	if let Some(increment) = given.increment {
		if increment == 0 {
			return Err(SequenceError::ZeroIncrement.into());
		}
		form.increment = increment;
		params.reset_state = true;
	} else if is_init {
		form.increment = 1;
	}

	if let Some(cycle) = given.cycle {
		form.cycle = cycle;
		params.reset_state = true;
	} else if is_init {
		form.cycle = false;
	}

	match given.max {
		Some(Some(max)) => {
			form.max = max;
			params.reset_state = true;
		}
		Some(None) => {
			form.max = default_max(form, reset_max);
			params.reset_state = true;
		}
		None if is_init || reset_max => {
			form.max = default_max(form, reset_max);
			params.reset_state = true;
		}
		None => {}
	}
	if !form.seq_type.contains(form.max) {
		return Err(SequenceError::MaxOutOfRange {
			value: form.max,
			type_name: form.seq_type.name(),
		}
		.into());
	}

	match given.min {
		Some(Some(min)) => {
			form.min = min;
			params.reset_state = true;
		}
		Some(None) => {
			form.min = default_min(form, reset_min);
			params.reset_state = true;
		}
		None if is_init || reset_min => {
			form.min = default_min(form, reset_min);
			params.reset_state = true;
		}
		None => {}
	}
	if !form.seq_type.contains(form.min) {
		return Err(SequenceError::MinOutOfRange {
			value: form.min,
			type_name: form.seq_type.name(),
		}
		.into());
	}

	if form.min >= form.max {
		return Err(SequenceError::MinNotLessThanMax {
			min: form.min,
			max: form.max,
		}
		.into());
	}

	if let Some(start) = given.start {
		form.start = start;
	} else if is_init {
		form.start = if form.increment > 0 {
			form.min
		} else {
			form.max
		};
	}
	if form.start < form.min {
		return Err(SequenceError::StartBelowMin {
			start: form.start,
			min: form.min,
		}
		.into());
	}
	if form.start > form.max {
		return Err(SequenceError::StartAboveMax {
			start: form.start,
			max: form.max,
		}
		.into());
	}

	if let Some(restart) = given.restart {
		params.last_value = restart.unwrap_or(form.start);
		params.is_called = false;
		params.reset_state = true;
	} else if is_init {
		params.last_value = form.start;
		params.is_called = false;
	}

	// Also catches a current value left outside new bounds.
	if params.last_value < form.min {
		return Err(SequenceError::RestartBelowMin {
			value: params.last_value,
			min: form.min,
		}
		.into());
	}
	if params.last_value > form.max {
		return Err(SequenceError::RestartAboveMax {
			value: params.last_value,
			max: form.max,
		}
		.into());
	}

	if let Some(cache) = given.cache {
		if cache <= 0 {
			return Err(SequenceError::CacheNotPositive {
				cache,
			}
			.into());
		}
		form.cache = cache;
		params.reset_state = true;
	} else if is_init {
		form.cache = 1;
	}

	Ok(params)
}

fn default_max(form: &SequenceDef, reset_max: bool) -> i64 {
	if form.increment > 0 || reset_max {
		form.seq_type.max()
	} else {
		-1
	}
}

fn default_min(form: &SequenceDef, reset_min: bool) -> i64 {
	if form.increment < 0 || reset_min {
		form.seq_type.min()
	} else {
		1
	}
}

#[cfg(test)]
mod tests {
	use seqdb_catalog::SequenceDef;
	use seqdb_type::{Oid, RelationId, SequenceType};

	use super::{SequenceOption::*, init_params};

	fn blank() -> SequenceDef {
		SequenceDef {
			relid: RelationId(Oid(16384)),
			seq_type: SequenceType::Int8,
			start: 0,
			increment: 0,
			max: 0,
			min: 0,
			cache: 0,
			cycle: false,
		}
	}

	fn created(options: &[super::SequenceOption]) -> SequenceDef {
		let mut form = blank();
		init_params(options, false, true, &mut form, 0, false).unwrap();
		form
	}

	#[test]
	fn test_defaults_ascending() {
		let mut form = blank();
		let params = init_params(&[], false, true, &mut form, 0, false).unwrap();
		assert_eq!(form.seq_type, SequenceType::Int8);
		assert_eq!((form.increment, form.min, form.max, form.start, form.cache), (1, 1, i64::MAX, 1, 1));
		assert!(!form.cycle);
		assert_eq!(params.last_value, 1);
		assert!(!params.is_called);
		assert!(params.reset_state);
		assert!(!params.need_seq_rewrite);
	}

	#[test]
	fn test_defaults_descending() {
		let form = created(&[Increment(-1), As("int2".to_string())]);
		assert_eq!((form.min, form.max, form.start), (i16::MIN as i64, -1, -1));
	}

	#[test]
	fn test_duplicate_option() {
		let mut form = blank();
		let err = init_params(&[Cache(5), Cache(6)], false, true, &mut form, 0, false).unwrap_err();
		assert_eq!(err.code, "SEQUENCE_007");
		assert_eq!(err.message, "conflicting or redundant options");
	}

	#[test]
	fn test_sequence_name_rejected() {
		let mut form = blank();
		let err = init_params(&[SequenceName("x".to_string())], false, true, &mut form, 0, false).unwrap_err();
		assert_eq!(err.code, "SEQUENCE_008");
	}

	#[test]
	fn test_validation_messages() {
		let cases: Vec<(Vec<super::SequenceOption>, &str)> = vec![
			(vec![As("text".to_string())], "sequence type must be smallint, integer, or bigint"),
			(vec![Increment(0)], "INCREMENT must not be zero"),
			(vec![As("int2".to_string()), MaxValue(Some(40000))], "MAXVALUE (40000) is out of range for sequence data type smallint"),
			(vec![As("int4".to_string()), MinValue(Some(-3_000_000_000))], "MINVALUE (-3000000000) is out of range for sequence data type integer"),
			(vec![MinValue(Some(10)), MaxValue(Some(10))], "MINVALUE (10) must be less than MAXVALUE (10)"),
			(vec![Start(0)], "START value (0) cannot be less than MINVALUE (1)"),
			(vec![MaxValue(Some(5)), Start(6)], "START value (6) cannot be greater than MAXVALUE (5)"),
			(vec![Restart(Some(0))], "RESTART value (0) cannot be less than MINVALUE (1)"),
			(vec![MaxValue(Some(5)), Restart(Some(6))], "RESTART value (6) cannot be greater than MAXVALUE (5)"),
			(vec![Cache(0)], "CACHE (0) must be greater than zero"),
		];

		for (options, message) in cases {
			let mut form = blank();
			let err = init_params(&options, false, true, &mut form, 0, false).unwrap_err();
			assert_eq!(err.message, message);
		}
	}

	#[test]
	fn test_identity_type_message() {
		let mut form = blank();
		let err = init_params(&[As("text".to_string())], true, true, &mut form, 0, false).unwrap_err();
		assert_eq!(err.message, "identity column type must be smallint, integer, or bigint");
	}

	#[test]
	fn test_alter_keeps_unmentioned_parameters() {
		let mut form = created(&[Increment(5), Cache(20)]);
		let params = init_params(&[Cycle(true)], false, false, &mut form, 41, true).unwrap();
		assert_eq!((form.increment, form.cache), (5, 20));
		assert!(form.cycle);
		assert_eq!((params.last_value, params.is_called), (41, true));
		assert!(params.reset_state);
		assert!(params.need_seq_rewrite);
	}

	#[test]
	fn test_alter_type_moves_default_bounds() {
		let mut form = created(&[]);
		init_params(&[As("int2".to_string())], false, false, &mut form, 1, false).unwrap();
		assert_eq!(form.max, i16::MAX as i64);
		assert_eq!(form.min, 1);

		let mut form = created(&[MaxValue(Some(100))]);
		init_params(&[As("int4".to_string())], false, false, &mut form, 1, false).unwrap();
		assert_eq!(form.max, 100);
	}

	#[test]
	fn test_alter_restart() {
		let mut form = created(&[Start(10)]);
		let params = init_params(&[Restart(None)], false, false, &mut form, 77, true).unwrap();
		assert_eq!((params.last_value, params.is_called), (10, false));

		let params = init_params(&[Restart(Some(500))], false, false, &mut form, 77, true).unwrap();
		assert_eq!(params.last_value, 500);
	}

	#[test]
	fn test_alter_bounds_crosscheck_current_value() {
		let mut form = created(&[]);
		let err = init_params(&[MaxValue(Some(50))], false, false, &mut form, 60, true).unwrap_err();
		assert_eq!(err.message, "RESTART value (60) cannot be greater than MAXVALUE (50)");
	}

	#[test]
	fn test_owned_by_alone_needs_no_rewrite() {
		let mut form = created(&[]);
		let owned_by = vec!["t".to_string(), "id".to_string()];
		let params = init_params(&[OwnedBy(owned_by.clone())], false, false, &mut form, 1, false).unwrap();
		assert!(!params.need_seq_rewrite);
		assert!(!params.reset_state);
		assert_eq!(params.owned_by, Some(owned_by));
	}
}
