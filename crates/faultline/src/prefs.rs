// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Small persistent key-value store backing usage accounting.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use tracing::warn;

use crate::error::Result;

/// Fixed namespace applied to every key so the file can coexist with
/// unrelated settings without collision.
const KEY_PREFIX: &str = "faultline.";

/// Persistent key-value store for the SDK's own counters and
/// settings.
///
/// Values live in a single JSON file rewritten atomically
/// (write-then-rename) on every mutation. The in-memory map is
/// guarded by a mutex private to this store, which makes each
/// read-modify-write atomic with respect to concurrent callers.
/// Persistence failures are logged and swallowed: preference updates
/// are best-effort and must never fail the instrumented application.
pub struct PrefStore {
	path: PathBuf,
	values: Mutex<HashMap<String, serde_json::Value>>,
}

impl PrefStore {
	/// Opens the store at `path`. A missing or corrupt file loads as
	/// empty rather than failing.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
		let path = path.into();
		if let Some(parent) = path.parent() {
			fs::create_dir_all(parent)?;
		}

		let values = match fs::read(&path) {
			Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|e| {
				warn!(path = %path.display(), error = %e, "corrupt preference file, starting empty");
				HashMap::new()
			}),
			Err(_) => HashMap::new(),
		};

		Ok(Self {
			path,
			values: Mutex::new(values),
		})
	}

	/// Default preference file under the platform data dir.
	pub fn default_path() -> Option<PathBuf> {
		dirs::data_dir().map(|p| p.join("faultline").join("prefs.json"))
	}

	pub fn get_i64(&self, key: &str) -> Option<i64> {
		let values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
		values.get(&namespaced(key)).and_then(|v| v.as_i64())
	}

	pub fn put_i64(&self, key: &str, value: i64) {
		let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
		values.insert(namespaced(key), value.into());
		self.flush_locked(&values);
	}

	pub fn remove(&self, key: &str) {
		let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
		if values.remove(&namespaced(key)).is_some() {
			self.flush_locked(&values);
		}
	}

	/// Atomic read-modify-write of one slot: `f` sees the current
	/// value and returns the new one (`None` removes the key). The
	/// lock is held across read, update, and flush, so concurrent
	/// updates never lose increments.
	pub fn update_i64(
		&self,
		key: &str,
		f: impl FnOnce(Option<i64>) -> Option<i64>,
	) -> Option<i64> {
		let key = namespaced(key);
		let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
		let current = values.get(&key).and_then(|v| v.as_i64());
		let next = f(current);
		match next {
			Some(value) => {
				values.insert(key, value.into());
			}
			None => {
				values.remove(&key);
			}
		}
		self.flush_locked(&values);
		next
	}

	fn flush_locked(&self, values: &HashMap<String, serde_json::Value>) {
		let json = match serde_json::to_vec_pretty(values) {
			Ok(json) => json,
			Err(e) => {
				warn!(error = %e, "failed to serialize preferences");
				return;
			}
		};

		let tmp = self.path.with_extension("json.tmp");
		let result = fs::write(&tmp, &json).and_then(|()| fs::rename(&tmp, &self.path));
		if let Err(e) = result {
			let _ = fs::remove_file(&tmp);
			warn!(path = %self.path.display(), error = %e, "failed to persist preferences");
		}
	}
}

fn namespaced(key: &str) -> String {
	format!("{}{}", KEY_PREFIX, key)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn open(dir: &tempfile::TempDir) -> PrefStore {
		PrefStore::open(dir.path().join("prefs.json")).unwrap()
	}

	#[test]
	fn roundtrip() {
		let dir = tempfile::tempdir().unwrap();
		let prefs = open(&dir);
		prefs.put_i64("counter", 42);
		assert_eq!(prefs.get_i64("counter"), Some(42));
		prefs.remove("counter");
		assert_eq!(prefs.get_i64("counter"), None);
	}

	#[test]
	fn survives_reopen() {
		let dir = tempfile::tempdir().unwrap();
		open(&dir).put_i64("counter", 7);
		assert_eq!(open(&dir).get_i64("counter"), Some(7));
	}

	#[test]
	fn corrupt_file_loads_empty() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("prefs.json");
		fs::write(&path, b"{ not json at all").unwrap();
		let prefs = PrefStore::open(&path).unwrap();
		assert_eq!(prefs.get_i64("counter"), None);
	}

	#[test]
	fn keys_are_namespaced_on_disk() {
		let dir = tempfile::tempdir().unwrap();
		open(&dir).put_i64("counter", 1);
		let raw = fs::read_to_string(dir.path().join("prefs.json")).unwrap();
		assert!(raw.contains("faultline.counter"));
	}

	#[test]
	fn update_is_read_modify_write() {
		let dir = tempfile::tempdir().unwrap();
		let prefs = open(&dir);
		prefs.put_i64("counter", 10);
		let result = prefs.update_i64("counter", |v| v.map(|n| n + 5));
		assert_eq!(result, Some(15));
		assert_eq!(prefs.get_i64("counter"), Some(15));
	}

	#[test]
	fn concurrent_updates_lose_nothing() {
		let dir = tempfile::tempdir().unwrap();
		let prefs = std::sync::Arc::new(open(&dir));

		std::thread::scope(|scope| {
			for _ in 0..8 {
				let prefs = std::sync::Arc::clone(&prefs);
				scope.spawn(move || {
					for _ in 0..50 {
						prefs.update_i64("counter", |v| Some(v.unwrap_or(0) + 1));
					}
				});
			}
		});

		assert_eq!(prefs.get_i64("counter"), Some(400));
	}
}
