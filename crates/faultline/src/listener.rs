// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Listener pipeline: report enrichment before persistence.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::Arc;

use faultline_core::Report;
use tracing::warn;

/// A callback that enriches a crash report before it is persisted.
///
/// Each capability is independently optional; the defaults contribute
/// nothing. Implementations run synchronously on the faulting thread
/// and must not block. A panicking listener is isolated: its results
/// are excluded and the pipeline continues.
pub trait ReportListener: Send + Sync {
	/// Free-form description to attach to the report.
	fn description(&self) -> Option<String> {
		None
	}

	/// Identity of the reporter (user ID, contact handle).
	fn reporter_identity(&self) -> Option<String> {
		None
	}

	/// Paths of extra files to reference from the report.
	fn extra_files(&self) -> Vec<PathBuf> {
		Vec::new()
	}
}

/// Ordered set of registered listeners, invoked synchronously during
/// capture.
#[derive(Default)]
pub struct ListenerPipeline {
	listeners: Vec<Arc<dyn ReportListener>>,
}

impl ListenerPipeline {
	pub fn new() -> Self {
		Self {
			listeners: Vec::new(),
		}
	}

	/// Appends a listener; invocation follows registration order.
	pub fn register(&mut self, listener: Arc<dyn ReportListener>) {
		self.listeners.push(listener);
	}

	/// Removes a previously registered listener (pointer identity).
	pub fn unregister(&mut self, listener: &Arc<dyn ReportListener>) {
		self.listeners.retain(|l| !Arc::ptr_eq(l, listener));
	}

	pub fn len(&self) -> usize {
		self.listeners.len()
	}

	pub fn is_empty(&self) -> bool {
		self.listeners.is_empty()
	}

	/// Runs every listener against the report skeleton, merging the
	/// results into its attachment.
	///
	/// Registration order is priority order: the first non-empty
	/// description and reporter identity win, while extra files
	/// accumulate across all listeners. A listener that panics is
	/// logged and excluded from the merge.
	pub fn run(&self, report: &mut Report) {
		let mut attachment = report.attachment.take().unwrap_or_default();

		for listener in &self.listeners {
			let result = catch_unwind(AssertUnwindSafe(|| {
				(
					listener.description(),
					listener.reporter_identity(),
					listener.extra_files(),
				)
			}));

			match result {
				Ok((description, identity, files)) => {
					if attachment.description.is_none() {
						attachment.description = description;
					}
					if attachment.reporter_identity.is_none() {
						attachment.reporter_identity = identity;
					}
					attachment.extra_files.extend(files);
				}
				Err(_) => {
					warn!("report listener panicked, excluding it from the merge");
				}
			}
		}

		if !attachment.is_empty() {
			report.attachment = Some(attachment);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use faultline_core::Report;

	struct Describer(&'static str);

	impl ReportListener for Describer {
		fn description(&self) -> Option<String> {
			Some(self.0.to_string())
		}
	}

	struct FileAttacher(&'static str);

	impl ReportListener for FileAttacher {
		fn extra_files(&self) -> Vec<PathBuf> {
			vec![PathBuf::from(self.0)]
		}
	}

	struct Panicker;

	impl ReportListener for Panicker {
		fn description(&self) -> Option<String> {
			panic!("listener misbehaved")
		}
	}

	fn skeleton() -> Report {
		Report::new("main", "panic", "boom")
	}

	#[test]
	fn empty_pipeline_leaves_no_attachment() {
		let pipeline = ListenerPipeline::new();
		let mut report = skeleton();
		pipeline.run(&mut report);
		assert!(report.attachment.is_none());
	}

	#[test]
	fn first_description_wins() {
		let mut pipeline = ListenerPipeline::new();
		pipeline.register(Arc::new(Describer("first")));
		pipeline.register(Arc::new(Describer("second")));

		let mut report = skeleton();
		pipeline.run(&mut report);

		let attachment = report.attachment.unwrap();
		assert_eq!(attachment.description.as_deref(), Some("first"));
	}

	#[test]
	fn extra_files_accumulate_in_order() {
		let mut pipeline = ListenerPipeline::new();
		pipeline.register(Arc::new(FileAttacher("/tmp/a.log")));
		pipeline.register(Arc::new(FileAttacher("/tmp/b.log")));

		let mut report = skeleton();
		pipeline.run(&mut report);

		let attachment = report.attachment.unwrap();
		assert_eq!(
			attachment.extra_files,
			vec![PathBuf::from("/tmp/a.log"), PathBuf::from("/tmp/b.log")]
		);
	}

	#[test]
	fn panicking_listener_is_skipped() {
		let mut pipeline = ListenerPipeline::new();
		pipeline.register(Arc::new(Panicker));
		pipeline.register(Arc::new(Describer("survivor")));

		let mut report = skeleton();
		pipeline.run(&mut report);

		let attachment = report.attachment.unwrap();
		assert_eq!(attachment.description.as_deref(), Some("survivor"));
	}

	#[test]
	fn unregister_removes_only_named_listener() {
		let first: Arc<dyn ReportListener> = Arc::new(Describer("first"));
		let second: Arc<dyn ReportListener> = Arc::new(Describer("second"));

		let mut pipeline = ListenerPipeline::new();
		pipeline.register(Arc::clone(&first));
		pipeline.register(Arc::clone(&second));
		pipeline.unregister(&first);
		assert_eq!(pipeline.len(), 1);

		let mut report = skeleton();
		pipeline.run(&mut report);
		assert_eq!(
			report.attachment.unwrap().description.as_deref(),
			Some("second")
		);
	}
}
