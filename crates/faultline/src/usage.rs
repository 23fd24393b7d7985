// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Usage-time tracking keyed by screen/activity lifecycle.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::metadata::AppMetadata;
use crate::prefs::PrefStore;

const START_TIME_KEY: &str = "start_time.";
const USAGE_TIME_KEY: &str = "usage_time.";

/// Millisecond wall clock, injectable for tests.
type Clock = Arc<dyn Fn() -> i64 + Send + Sync>;

/// Tracks elapsed foreground time per lifecycle entity and
/// accumulates it per application version.
///
/// Instrumentation is best-effort by contract: an absent entity key,
/// a stop without a start, clock rollback, and an unresolvable app
/// version are all silent no-ops. The accumulator never wraps - an
/// addition that would overflow is rejected, and a negative stored
/// value is treated as corrupt and reset to zero on read.
pub struct UsageTracker {
	prefs: Arc<PrefStore>,
	metadata: Arc<dyn AppMetadata>,
	clock: Clock,
}

impl UsageTracker {
	pub fn new(prefs: Arc<PrefStore>, metadata: Arc<dyn AppMetadata>) -> Self {
		Self {
			prefs,
			metadata,
			clock: Arc::new(|| chrono::Utc::now().timestamp_millis()),
		}
	}

	#[cfg(test)]
	fn with_clock(prefs: Arc<PrefStore>, metadata: Arc<dyn AppMetadata>, clock: Clock) -> Self {
		Self {
			prefs,
			metadata,
			clock,
		}
	}

	/// Records the current time as the start of a usage interval for
	/// `entity_key`. A second `start` without an intervening `stop`
	/// overwrites the earlier start time.
	pub fn start(&self, entity_key: Option<&str>) {
		let Some(entity) = entity_key else { return };
		if self.metadata.app_version().is_none() {
			return;
		}
		let now = (self.clock)();
		self.prefs
			.put_i64(&format!("{}{}", START_TIME_KEY, entity), now);
	}

	/// Ends the usage interval for `entity_key` and adds its duration
	/// to the current version's accumulator.
	///
	/// The start time is cleared whenever one was found. The duration
	/// is only accumulated when it is positive and the addition does
	/// not overflow; a clock that moved backwards contributes
	/// nothing.
	pub fn stop(&self, entity_key: Option<&str>) {
		let Some(entity) = entity_key else { return };
		let Some(version) = self.metadata.app_version() else {
			return;
		};

		let start_key = format!("{}{}", START_TIME_KEY, entity);
		let Some(start) = self.prefs.get_i64(&start_key) else {
			return;
		};
		self.prefs.remove(&start_key);

		let duration = (self.clock)() - start;
		if duration <= 0 {
			return;
		}

		self.prefs
			.update_i64(&format!("{}{}", USAGE_TIME_KEY, version), |sum| {
				let sum = sum.unwrap_or(0);
				match sum.checked_add(duration) {
					Some(new_sum) if new_sum >= 0 => Some(new_sum),
					// Reject wrap/overflow, keep the prior total.
					_ => Some(sum),
				}
			});
		debug!(entity = %entity, duration_ms = duration, "usage interval recorded");
	}

	/// Accumulated usage of the current application version, in whole
	/// seconds (truncating).
	///
	/// A negative stored accumulator is treated as corrupt: it is
	/// reset as a side effect and zero is returned.
	pub fn usage_seconds(&self) -> i64 {
		let Some(version) = self.metadata.app_version() else {
			return 0;
		};

		let key = format!("{}{}", USAGE_TIME_KEY, version);
		match self.prefs.get_i64(&key) {
			Some(sum) if sum < 0 => {
				warn!(version = %version, "negative usage accumulator, resetting");
				self.prefs.remove(&key);
				0
			}
			Some(sum) => sum / 1000,
			None => 0,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::metadata::HostMetadata;
	use proptest::prelude::*;
	use std::sync::atomic::{AtomicI64, Ordering};

	struct Fixture {
		_dir: tempfile::TempDir,
		prefs: Arc<PrefStore>,
		now: Arc<AtomicI64>,
	}

	impl Fixture {
		fn new() -> Self {
			let dir = tempfile::tempdir().unwrap();
			let prefs = Arc::new(PrefStore::open(dir.path().join("prefs.json")).unwrap());
			Self {
				_dir: dir,
				prefs,
				now: Arc::new(AtomicI64::new(1_000_000)),
			}
		}

		fn tracker(&self) -> UsageTracker {
			self.tracker_with_version(HostMetadata::new("1.0.0"))
		}

		fn tracker_with_version(&self, metadata: HostMetadata) -> UsageTracker {
			let now = Arc::clone(&self.now);
			UsageTracker::with_clock(
				Arc::clone(&self.prefs),
				Arc::new(metadata),
				Arc::new(move || now.load(Ordering::SeqCst)),
			)
		}

		fn advance(&self, millis: i64) {
			self.now.fetch_add(millis, Ordering::SeqCst);
		}

		fn rewind(&self, millis: i64) {
			self.now.fetch_sub(millis, Ordering::SeqCst);
		}
	}

	#[test]
	fn stop_without_start_is_noop() {
		let fx = Fixture::new();
		let tracker = fx.tracker();
		tracker.stop(Some("screen-1"));
		assert_eq!(tracker.usage_seconds(), 0);
	}

	#[test]
	fn absent_entity_key_is_noop() {
		let fx = Fixture::new();
		let tracker = fx.tracker();
		tracker.start(None);
		tracker.stop(None);
		assert_eq!(tracker.usage_seconds(), 0);
	}

	#[test]
	fn two_cycles_accumulate() {
		let fx = Fixture::new();
		let tracker = fx.tracker();

		tracker.start(Some("screen-1"));
		fx.advance(1_500);
		tracker.stop(Some("screen-1"));

		tracker.start(Some("screen-1"));
		fx.advance(2_700);
		tracker.stop(Some("screen-1"));

		// floor((1500 + 2700) / 1000)
		assert_eq!(tracker.usage_seconds(), 4);
	}

	#[test]
	fn backward_clock_contributes_nothing() {
		let fx = Fixture::new();
		let tracker = fx.tracker();

		tracker.start(Some("screen-1"));
		fx.rewind(500);
		tracker.stop(Some("screen-1"));

		assert_eq!(tracker.usage_seconds(), 0);
	}

	#[test]
	fn restart_overwrites_start_time() {
		let fx = Fixture::new();
		let tracker = fx.tracker();

		tracker.start(Some("screen-1"));
		fx.advance(10_000);
		// No stop in between: only the second interval counts.
		tracker.start(Some("screen-1"));
		fx.advance(2_000);
		tracker.stop(Some("screen-1"));

		assert_eq!(tracker.usage_seconds(), 2);
	}

	#[test]
	fn overflow_is_rejected_not_wrapped() {
		let fx = Fixture::new();
		let tracker = fx.tracker();
		fx.prefs.put_i64("usage_time.1.0.0", i64::MAX - 100);

		tracker.start(Some("screen-1"));
		fx.advance(1_000);
		tracker.stop(Some("screen-1"));

		assert_eq!(fx.prefs.get_i64("usage_time.1.0.0"), Some(i64::MAX - 100));
	}

	#[test]
	fn negative_accumulator_self_heals() {
		let fx = Fixture::new();
		let tracker = fx.tracker();
		fx.prefs.put_i64("usage_time.1.0.0", -42);

		assert_eq!(tracker.usage_seconds(), 0);
		// The corrupt value is gone on the next read as well.
		assert_eq!(fx.prefs.get_i64("usage_time.1.0.0"), None);
		assert_eq!(tracker.usage_seconds(), 0);
	}

	#[test]
	fn unresolvable_version_disables_tracking() {
		let fx = Fixture::new();
		let tracker = fx.tracker_with_version(HostMetadata::without_version());

		tracker.start(Some("screen-1"));
		fx.advance(5_000);
		tracker.stop(Some("screen-1"));

		assert_eq!(tracker.usage_seconds(), 0);
	}

	proptest! {
		#![proptest_config(ProptestConfig::with_cases(32))]

		/// Any sequence of forward-clock intervals accumulates to the
		/// truncated sum of their millisecond durations.
		#[test]
		fn accumulated_seconds_truncate(
			durations in proptest::collection::vec(1i64..600_000, 1..8),
		) {
			let fx = Fixture::new();
			let tracker = fx.tracker();

			let mut total = 0i64;
			for d in &durations {
				tracker.start(Some("screen-1"));
				fx.advance(*d);
				tracker.stop(Some("screen-1"));
				total += d;
			}

			prop_assert_eq!(tracker.usage_seconds(), total / 1000);
		}
	}

	#[test]
	fn entities_interleave_into_shared_accumulator() {
		let fx = Fixture::new();
		let tracker = fx.tracker();

		tracker.start(Some("screen-1"));
		fx.advance(1_000);
		tracker.start(Some("screen-2"));
		fx.advance(1_000);
		tracker.stop(Some("screen-1"));
		fx.advance(1_000);
		tracker.stop(Some("screen-2"));

		// screen-1: 2000ms, screen-2: 2000ms.
		assert_eq!(tracker.usage_seconds(), 4);
	}
}
