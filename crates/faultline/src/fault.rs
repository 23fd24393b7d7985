// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Fault events: the in-memory description of one unhandled fault,
//! before it becomes a durable report.

use std::panic::PanicHookInfo;

use faultline_core::{CauseSummary, Frame};

use crate::backtrace::capture_frames;

/// An unhandled fault as observed by the capture subsystem.
#[derive(Debug, Clone)]
pub struct FaultEvent {
	pub exception_type: String,
	pub message: String,
	pub frames: Vec<Frame>,
	/// Nested causes, outermost first.
	pub cause_chain: Vec<CauseSummary>,
}

impl FaultEvent {
	/// Creates a fault event with no frames or cause chain.
	pub fn new(exception_type: impl Into<String>, message: impl Into<String>) -> Self {
		Self {
			exception_type: exception_type.into(),
			message: message.into(),
			frames: Vec::new(),
			cause_chain: Vec::new(),
		}
	}

	/// Builds a fault event from a panic, capturing the current
	/// backtrace. The payload is rendered through the usual string
	/// downcasts; an opaque payload yields a fixed message.
	pub fn from_panic(info: &PanicHookInfo<'_>) -> Self {
		let message = if let Some(s) = info.payload().downcast_ref::<&str>() {
			(*s).to_string()
		} else if let Some(s) = info.payload().downcast_ref::<String>() {
			s.clone()
		} else {
			"unknown panic payload".to_string()
		};

		let mut frames = capture_frames();
		if frames.is_empty() {
			// Backtraces may be disabled at build time; the hook still
			// knows the precise panic site.
			if let Some(location) = info.location() {
				frames.push(Frame {
					module: None,
					function: None,
					filename: Some(location.file().to_string()),
					lineno: Some(location.line()),
					in_app: true,
				});
			}
		}

		Self {
			exception_type: "panic".to_string(),
			message,
			frames,
			cause_chain: Vec::new(),
		}
	}

	/// Builds a fault event from an error value, walking `source()`
	/// into the cause chain (outermost cause first).
	pub fn from_error<E: std::error::Error + ?Sized>(error: &E) -> Self {
		let mut cause_chain = Vec::new();
		let mut source = error.source();
		while let Some(cause) = source {
			cause_chain.push(CauseSummary {
				exception_type: None,
				message: cause.to_string(),
			});
			source = cause.source();
		}

		Self {
			exception_type: std::any::type_name::<E>().to_string(),
			message: error.to_string(),
			frames: capture_frames(),
			cause_chain,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::fmt;

	#[derive(Debug)]
	struct Outer {
		inner: Inner,
	}

	#[derive(Debug)]
	struct Inner;

	impl fmt::Display for Outer {
		fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
			write!(f, "outer failed")
		}
	}

	impl fmt::Display for Inner {
		fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
			write!(f, "inner failed")
		}
	}

	impl std::error::Error for Outer {
		fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
			Some(&self.inner)
		}
	}

	impl std::error::Error for Inner {}

	#[test]
	fn from_error_walks_cause_chain() {
		let error = Outer { inner: Inner };
		let fault = FaultEvent::from_error(&error);
		assert_eq!(fault.message, "outer failed");
		assert!(fault.exception_type.contains("Outer"));
		assert_eq!(fault.cause_chain.len(), 1);
		assert_eq!(fault.cause_chain[0].message, "inner failed");
	}

	#[test]
	fn from_error_without_source() {
		let fault = FaultEvent::from_error(&Inner);
		assert!(fault.cause_chain.is_empty());
	}
}
