// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Installs the process-wide `tracing` subscriber.

#![cfg_attr(not(debug_assertions), deny(warnings))]

pub mod builder;

pub use builder::{OutputFormat, TracingBuilder};
