// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Crash report types: the durable record describing one fault.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::context::DeviceMetadata;
use crate::ReportId;

/// A single stack frame within a report.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Frame {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub module: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub function: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub filename: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub lineno: Option<u32>,
	#[serde(default)]
	pub in_app: bool,
}

/// One link in a fault's cause chain, outermost cause first.
///
/// The concrete type of a nested cause is not always recoverable (a
/// `source()` is an opaque trait object), so the type is optional
/// while the rendered message is not.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CauseSummary {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub exception_type: Option<String>,
	pub message: String,
}

/// Metadata attached by listeners before a report is persisted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListenerAttachment {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub reporter_identity: Option<String>,
	#[serde(default)]
	pub extra_files: Vec<PathBuf>,
}

impl ListenerAttachment {
	/// True if no listener contributed anything.
	pub fn is_empty(&self) -> bool {
		self.description.is_none()
			&& self.reporter_identity.is_none()
			&& self.extra_files.is_empty()
	}
}

/// The durable record describing one fault occurrence.
///
/// Once persisted a report is immutable: the store publishes each
/// artifact atomically, so a reader either sees the whole report or
/// nothing at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
	pub id: ReportId,
	pub timestamp: DateTime<Utc>,
	pub thread_name: String,
	pub exception_type: String,
	pub message: String,
	#[serde(default)]
	pub frames: Vec<Frame>,
	#[serde(default)]
	pub cause_chain: Vec<CauseSummary>,
	#[serde(default)]
	pub device: DeviceMetadata,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub attachment: Option<ListenerAttachment>,
	#[serde(default)]
	pub sdk_name: String,
	#[serde(default)]
	pub sdk_version: String,
}

impl Report {
	/// Creates an empty report skeleton with a fresh ID and the
	/// current timestamp. Frames, cause chain, device metadata, and
	/// SDK identity are filled in by the capture subsystem.
	pub fn new(
		thread_name: impl Into<String>,
		exception_type: impl Into<String>,
		message: impl Into<String>,
	) -> Self {
		Self {
			id: ReportId::new(),
			timestamp: Utc::now(),
			thread_name: thread_name.into(),
			exception_type: exception_type.into(),
			message: message.into(),
			frames: Vec::new(),
			cause_chain: Vec::new(),
			device: DeviceMetadata::default(),
			attachment: None,
			sdk_name: String::new(),
			sdk_version: String::new(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn skeleton_starts_empty() {
		let report = Report::new("main", "panic", "boom");
		assert!(report.frames.is_empty());
		assert!(report.cause_chain.is_empty());
		assert!(report.attachment.is_none());
		assert!(report.device.os_name.is_none());
	}

	#[test]
	fn deserializes_minimal_artifact() {
		// An artifact written by an older SDK may omit the defaulted
		// collections entirely.
		let json = format!(
			r#"{{
				"id": "{}",
				"timestamp": "2025-01-01T00:00:00Z",
				"thread_name": "main",
				"exception_type": "panic",
				"message": "boom"
			}}"#,
			ReportId::new()
		);
		let report: Report = serde_json::from_str(&json).unwrap();
		assert_eq!(report.message, "boom");
		assert!(report.frames.is_empty());
		assert!(report.sdk_name.is_empty());
	}

	#[test]
	fn attachment_emptiness() {
		let mut attachment = ListenerAttachment::default();
		assert!(attachment.is_empty());
		attachment.extra_files.push(PathBuf::from("/tmp/log.txt"));
		assert!(!attachment.is_empty());
	}
}
