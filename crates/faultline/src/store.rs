// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Durable on-disk staging area for crash reports.

use std::fs;
use std::path::{Path, PathBuf};

use faultline_core::{Report, ReportError, ReportId, Result};
use tracing::{debug, warn};

/// File suffix owned exclusively by the store. Nothing else in the
/// report directory is created or modified.
const REPORT_SUFFIX: &str = ".report";
const TMP_SUFFIX: &str = ".report.tmp";

/// Durable staging area for crash reports.
///
/// Each report is serialized to a uniquely named artifact and
/// published with a write-then-rename, so a reader never observes a
/// half-written file even if the process dies mid-write. Concurrent
/// writers target distinct filenames (UUIDv7 IDs) and need no
/// locking; `list_pending` and `remove` may race with writes, and a
/// concurrently written artifact may or may not be visible.
#[derive(Debug, Clone)]
pub struct ReportStore {
	dir: PathBuf,
}

impl ReportStore {
	/// Opens a store rooted at `dir`, creating the directory if
	/// needed.
	pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
		let dir = dir.into();
		fs::create_dir_all(&dir)?;
		Ok(Self { dir })
	}

	/// Default report directory under the platform data dir.
	pub fn default_dir() -> Option<PathBuf> {
		dirs::data_dir().map(|p| p.join("faultline").join("reports"))
	}

	pub fn dir(&self) -> &Path {
		&self.dir
	}

	/// Persists `report` atomically and returns its ID.
	pub fn write(&self, report: &Report) -> Result<ReportId> {
		let json = serde_json::to_vec_pretty(report)?;
		let tmp = self.dir.join(format!("{}{}", report.id, TMP_SUFFIX));
		let dest = self.dir.join(format!("{}{}", report.id, REPORT_SUFFIX));

		fs::write(&tmp, &json)?;
		if let Err(e) = fs::rename(&tmp, &dest) {
			let _ = fs::remove_file(&tmp);
			return Err(e.into());
		}

		debug!(id = %report.id, path = %dest.display(), "report persisted");
		Ok(report.id)
	}

	/// Returns all staged reports in arrival order.
	///
	/// Artifacts that fail to parse are skipped with a warning rather
	/// than failing the listing.
	pub fn list_pending(&self) -> Result<Vec<Report>> {
		let mut reports = Vec::new();
		for id in self.pending_ids()? {
			match self.read(&id) {
				Ok(report) => reports.push(report),
				Err(e) => {
					warn!(id = %id, error = %e, "skipping unreadable report artifact");
				}
			}
		}
		Ok(reports)
	}

	/// Returns the IDs of all staged artifacts in arrival order.
	///
	/// IDs are UUIDv7, so sorting them is sorting by arrival time.
	pub fn pending_ids(&self) -> Result<Vec<ReportId>> {
		let mut ids = Vec::new();
		for entry in fs::read_dir(&self.dir)? {
			let entry = entry?;
			let name = entry.file_name();
			let Some(name) = name.to_str() else { continue };
			let Some(stem) = name.strip_suffix(REPORT_SUFFIX) else {
				continue;
			};
			match stem.parse::<ReportId>() {
				Ok(id) => ids.push(id),
				Err(_) => {
					warn!(name = %name, "ignoring foreign file in report directory");
				}
			}
		}
		ids.sort();
		Ok(ids)
	}

	/// Reads one staged report.
	pub fn read(&self, id: &ReportId) -> Result<Report> {
		let path = self.artifact_path(id);
		let bytes = fs::read(&path).map_err(|e| {
			if e.kind() == std::io::ErrorKind::NotFound {
				ReportError::NotFound(id.to_string())
			} else {
				e.into()
			}
		})?;
		Ok(serde_json::from_slice(&bytes)?)
	}

	/// Deletes one staged artifact. Removing an ID that is not
	/// present is a no-op, not an error.
	pub fn remove(&self, id: &ReportId) -> Result<()> {
		let path = self.artifact_path(id);
		match fs::remove_file(&path) {
			Ok(()) => {
				debug!(id = %id, "report removed");
				Ok(())
			}
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
			Err(e) => Err(e.into()),
		}
	}

	fn artifact_path(&self, id: &ReportId) -> PathBuf {
		self.dir.join(format!("{}{}", id, REPORT_SUFFIX))
	}
}
