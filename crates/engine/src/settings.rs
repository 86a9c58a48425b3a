// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{
	fmt::{Debug, Display, Formatter},
	sync::Arc,
};

use indexmap::IndexMap;
use parking_lot::RwLock;
use seqdb_catalog::{Catalog, CatalogTxn};
use tracing::{debug, instrument};

use crate::error::ConfigError;

/// Who may change a setting at run time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingContext {
	User,
	SuperUser,
	/// Fixed once the database is open.
	Startup,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingKind {
	String,
	Int {
		min: i64,
		max: i64,
	},
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingValue {
	String(String),
	Int(i64),
}

impl SettingValue {
	pub fn as_str(&self) -> Option<&str> {
		match self {
			SettingValue::String(value) => Some(value),
			SettingValue::Int(_) => None,
		}
	}

	pub fn as_int(&self) -> Option<i64> {
		match self {
			SettingValue::Int(value) => Some(*value),
			SettingValue::String(_) => None,
		}
	}
}

impl Display for SettingValue {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			SettingValue::String(value) => f.write_str(value),
			SettingValue::Int(value) => Display::fmt(value, f),
		}
	}
}

/// What a check hook may consult. While the database starts up there is no
/// transaction, so the catalog is absent and values are taken on faith.
pub struct CheckContext<'a> {
	pub catalog: Option<(&'a Catalog, &'a CatalogTxn)>,
}

impl CheckContext<'_> {
	pub fn startup() -> Self {
		Self {
			catalog: None,
		}
	}
}

pub type CheckHook = Arc<dyn Fn(&SettingValue, &CheckContext<'_>) -> crate::Result<()> + Send + Sync>;

#[derive(Clone)]
pub struct SettingDef {
	pub name: String,
	pub description: String,
	pub context: SettingContext,
	pub kind: SettingKind,
	pub default: SettingValue,
	pub check: Option<CheckHook>,
}

impl Debug for SettingDef {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("SettingDef")
			.field("name", &self.name)
			.field("context", &self.context)
			.field("kind", &self.kind)
			.field("default", &self.default)
			.finish()
	}
}

impl SettingDef {
	pub fn string(name: &str, description: &str, default: &str) -> Self {
		Self {
			name: name.to_string(),
			description: description.to_string(),
			context: SettingContext::User,
			kind: SettingKind::String,
			default: SettingValue::String(default.to_string()),
			check: None,
		}
	}

	pub fn int(name: &str, description: &str, default: i64, min: i64, max: i64) -> Self {
		Self {
			name: name.to_string(),
			description: description.to_string(),
			context: SettingContext::User,
			kind: SettingKind::Int {
				min,
				max,
			},
			default: SettingValue::Int(default),
			check: None,
		}
	}

	pub fn with_context(mut self, context: SettingContext) -> Self {
		self.context = context;
		self
	}

	pub fn with_check(
		mut self,
		check: impl Fn(&SettingValue, &CheckContext<'_>) -> crate::Result<()> + Send + Sync + 'static,
	) -> Self {
		self.check = Some(Arc::new(check));
		self
	}

	/// Parses and range checks a raw value. Does not run the check hook.
	pub fn parse(&self, raw: &str) -> crate::Result<SettingValue> {
		match self.kind {
			SettingKind::String => Ok(SettingValue::String(raw.to_string())),
			SettingKind::Int {
				min,
				max,
			} => {
				let value: i64 = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
					name: self.name.clone(),
					value: raw.to_string(),
					detail: Some("an integer is required".to_string()),
				})?;
				if value < min || value > max {
					return Err(ConfigError::OutOfRange {
						name: self.name.clone(),
						value,
						min,
						max,
					}
					.into());
				}
				Ok(SettingValue::Int(value))
			}
		}
	}

	pub fn check(&self, value: &SettingValue, ctx: &CheckContext<'_>) -> crate::Result<()> {
		match &self.check {
			Some(check) => check(value, ctx),
			None => Ok(()),
		}
	}
}

/// Server wide settings: definitions plus the values every session starts
/// from. Extensions define their own settings when they are loaded.
#[derive(Default)]
pub struct Settings {
	defs: RwLock<IndexMap<String, SettingDef>>,
	values: RwLock<IndexMap<String, SettingValue>>,
}

impl Settings {
	pub fn new() -> Self {
		Self::default()
	}

	#[instrument(name = "engine::settings::define", level = "debug", skip_all, fields(name = %def.name))]
	pub fn define(&self, def: SettingDef) -> crate::Result<()> {
		let mut defs = self.defs.write();
		if defs.contains_key(&def.name) {
			return Err(ConfigError::DuplicateSetting {
				name: def.name,
			}
			.into());
		}
		self.values.write().insert(def.name.clone(), def.default.clone());
		defs.insert(def.name.clone(), def);
		Ok(())
	}

	pub fn is_defined(&self, name: &str) -> bool {
		self.defs.read().contains_key(name)
	}

	pub fn definition(&self, name: &str) -> crate::Result<SettingDef> {
		self.defs.read().get(name).cloned().ok_or_else(|| {
			ConfigError::UnknownSetting {
				name: name.to_string(),
			}
			.into()
		})
	}

	/// Sets the server wide value from startup configuration. The check hook
	/// runs without catalog access.
	pub fn load(&self, name: &str, raw: &str) -> crate::Result<()> {
		let def = self.definition(name)?;
		let value = def.parse(raw)?;
		def.check(&value, &CheckContext::startup())?;
		debug!(name, %value, "setting loaded");
		self.values.write().insert(def.name, value);
		Ok(())
	}

	pub fn get(&self, name: &str) -> Option<SettingValue> {
		self.values.read().get(name).cloned()
	}

	pub fn list(&self) -> Vec<(String, SettingValue)> {
		self.values.read().iter().map(|(name, value)| (name.clone(), value.clone())).collect()
	}
}

/// Values a session changed with `SET`.
#[derive(Debug, Clone, Default)]
pub struct SessionSettings {
	overrides: IndexMap<String, SettingValue>,
}

impl SessionSettings {
	pub fn get(&self, settings: &Settings, name: &str) -> Option<SettingValue> {
		self.overrides.get(name).cloned().or_else(|| settings.get(name))
	}

	pub fn set(&mut self, name: &str, value: SettingValue) {
		self.overrides.insert(name.to_string(), value);
	}

	pub fn reset(&mut self, name: &str) {
		self.overrides.shift_remove(name);
	}
}

#[cfg(test)]
mod tests {
	use super::{CheckContext, SessionSettings, SettingContext, SettingDef, SettingValue, Settings};
	use crate::error::ConfigError;

	#[test]
	fn test_int_range() {
		let settings = Settings::new();
		settings.define(SettingDef::int("worker.id", "", 1, 0, 1023).with_context(SettingContext::SuperUser))
			.unwrap();

		settings.load("worker.id", "512").unwrap();
		assert_eq!(settings.get("worker.id"), Some(SettingValue::Int(512)));

		let err = settings.load("worker.id", "1024").unwrap_err();
		assert_eq!(err.code, "CONFIG_003");
		assert_eq!(err.message, "1024 is outside the valid range for parameter \"worker.id\" (0 .. 1023)");

		let err = settings.load("worker.id", "abc").unwrap_err();
		assert_eq!(err.code, "CONFIG_002");
	}

	#[test]
	fn test_check_hook_runs_on_load() {
		let settings = Settings::new();
		settings.define(SettingDef::string("name", "", "x").with_check(|value, ctx: &CheckContext<'_>| {
			assert!(ctx.catalog.is_none());
			if value.as_str() == Some("") {
				return Err(ConfigError::InvalidValue {
					name: "name".to_string(),
					value: String::new(),
					detail: None,
				}
				.into());
			}
			Ok(())
		}))
		.unwrap();

		assert!(settings.load("name", "").is_err());
		settings.load("name", "y").unwrap();
	}

	#[test]
	fn test_session_overrides() {
		let settings = Settings::new();
		settings.define(SettingDef::string("name", "", "x")).unwrap();
		let mut session = SessionSettings::default();

		session.set("name", SettingValue::String("y".to_string()));
		assert_eq!(session.get(&settings, "name"), Some(SettingValue::String("y".to_string())));
		session.reset("name");
		assert_eq!(session.get(&settings, "name"), Some(SettingValue::String("x".to_string())));

		let err = settings.definition("missing").unwrap_err();
		assert_eq!(err.message, "unrecognized configuration parameter \"missing\"");
		assert!(settings.define(SettingDef::string("name", "", "z")).is_err());
	}
}
