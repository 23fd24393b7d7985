// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core types for the Faultline crash capture system.
//!
//! This crate provides the shared data model for crash capture:
//! durable crash reports with stack frames and cause chains, device
//! metadata captured at fault time, and listener attachments. It is
//! used by the client SDK (`faultline`) and by any tooling that reads
//! staged report artifacts off disk.
//!
//! # Overview
//!
//! The capture system supports:
//! - Panic capture with backtrace parsing and demangling
//! - Durable on-disk staging of reports that survives process death
//! - Listener enrichment (description, reporter identity, extra files)
//!   before a report is finalized
//! - Usage-time accounting per application version

pub mod context;
pub mod error;
pub mod report;

pub use context::DeviceMetadata;
pub use error::{ReportError, Result};
pub use report::{CauseSummary, Frame, ListenerAttachment, Report};

use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Unique ID of one crash report.
///
/// Report IDs are UUIDv7: time-ordered and collision-free across
/// concurrently faulting threads and across process restarts, so
/// artifact filenames derived from them sort in arrival order.
#[derive(
	Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct ReportId(pub Uuid);

impl ReportId {
	pub fn new() -> Self {
		Self(Uuid::now_v7())
	}
}

impl Default for ReportId {
	fn default() -> Self {
		Self::new()
	}
}

impl fmt::Display for ReportId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl FromStr for ReportId {
	type Err = uuid::Error;

	fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
		Ok(Self(Uuid::parse_str(s)?))
	}
}
