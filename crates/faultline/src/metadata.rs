// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Application and host metadata collaborators.

use faultline_core::DeviceMetadata;

/// Supplies application and host metadata for reports and usage
/// accounting.
///
/// Every method is best-effort: a provider that cannot resolve a
/// value returns `None`, and that must never prevent a report from
/// being captured. Usage accounting treats an unresolvable
/// `app_version` as "tracking disabled".
pub trait AppMetadata: Send + Sync {
	/// Application version identifier used to scope usage accounting
	/// and stamped into reports.
	fn app_version(&self) -> Option<String>;

	fn os_name(&self) -> Option<String> {
		None
	}

	fn os_version(&self) -> Option<String> {
		None
	}

	fn free_memory_bytes(&self) -> Option<u64> {
		None
	}

	/// Snapshot of everything, for stamping into a report.
	fn device_metadata(&self) -> DeviceMetadata {
		DeviceMetadata {
			os_name: self.os_name(),
			os_version: self.os_version(),
			app_version: self.app_version(),
			free_memory_bytes: self.free_memory_bytes(),
		}
	}
}

/// Host-backed metadata provider: OS identity from the standard
/// library, free memory from `/proc/meminfo` where available.
pub struct HostMetadata {
	app_version: Option<String>,
}

impl HostMetadata {
	pub fn new(app_version: impl Into<String>) -> Self {
		Self {
			app_version: Some(app_version.into()),
		}
	}

	/// A provider with no resolvable application version. Capture
	/// still works; usage accounting becomes a no-op.
	pub fn without_version() -> Self {
		Self { app_version: None }
	}
}

impl AppMetadata for HostMetadata {
	fn app_version(&self) -> Option<String> {
		self.app_version.clone()
	}

	fn os_name(&self) -> Option<String> {
		Some(std::env::consts::OS.to_string())
	}

	fn free_memory_bytes(&self) -> Option<u64> {
		let meminfo = std::fs::read_to_string("/proc/meminfo").ok()?;
		parse_mem_available(&meminfo)
	}
}

/// Pull `MemAvailable` out of `/proc/meminfo` contents, in bytes.
fn parse_mem_available(meminfo: &str) -> Option<u64> {
	for line in meminfo.lines() {
		if let Some(rest) = line.strip_prefix("MemAvailable:") {
			let rest = rest.trim();
			let kib = rest.strip_suffix("kB").map(str::trim).unwrap_or(rest);
			return kib.parse::<u64>().ok().map(|k| k * 1024);
		}
	}
	None
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_mem_available() {
		let meminfo = "\
MemTotal:       16323480 kB
MemFree:         1751516 kB
MemAvailable:    8232784 kB
";
		assert_eq!(parse_mem_available(meminfo), Some(8_232_784 * 1024));
	}

	#[test]
	fn missing_mem_available_is_none() {
		assert_eq!(parse_mem_available("MemTotal: 1 kB\n"), None);
	}

	#[test]
	fn snapshot_carries_app_version() {
		let metadata = HostMetadata::new("1.2.3");
		let device = metadata.device_metadata();
		assert_eq!(device.app_version.as_deref(), Some("1.2.3"));
		assert_eq!(device.os_name.as_deref(), Some(std::env::consts::OS));
	}

	#[test]
	fn versionless_provider_resolves_none() {
		let metadata = HostMetadata::without_version();
		assert!(metadata.app_version().is_none());
	}
}
