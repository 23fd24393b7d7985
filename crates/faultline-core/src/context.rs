// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Device and application metadata captured at fault time.

use serde::{Deserialize, Serialize};

/// Device metadata captured at fault time, best-effort.
///
/// Every field is optional: metadata collection runs on the fault
/// path and must never prevent a report from being persisted, so a
/// resolution failure simply leaves the field empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceMetadata {
	/// "linux", "macos", "windows"
	pub os_name: Option<String>,
	pub os_version: Option<String>,
	pub app_version: Option<String>,
	pub free_memory_bytes: Option<u64>,
}

impl Default for DeviceMetadata {
	fn default() -> Self {
		Self {
			os_name: None,
			os_version: None,
			app_version: None,
			free_memory_bytes: None,
		}
	}
}
