// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Faultline: crash capture and persistence for client applications.
//!
//! The SDK installs itself as the process-wide panic handler, records
//! a durable [`Report`] on disk before the process dies, and leaves
//! the staged artifacts for a separate upload stage. Registered
//! listeners enrich each report synchronously during capture, and a
//! small usage tracker accumulates per-version foreground time in a
//! persistent preference store.
//!
//! Nothing on the fault path propagates an error: a failure while
//! capturing a crash must never become a second crash.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use faultline::{install, ExceptionCapture, HostMetadata};
//!
//! let capture = Arc::new(
//! 	ExceptionCapture::builder()
//! 		.metadata(Arc::new(HostMetadata::new(env!("CARGO_PKG_VERSION"))))
//! 		.build()?,
//! );
//! install(Arc::clone(&capture));
//! ```

pub mod backtrace;
pub mod capture;
pub mod error;
pub mod fault;
pub mod listener;
pub mod metadata;
pub mod prefs;
pub mod store;
pub mod usage;

pub use capture::{
	install, installed, uninstall, ExceptionCapture, ExceptionCaptureBuilder, FaultHandler,
};
pub use error::{CaptureError, Result};
pub use fault::FaultEvent;
pub use listener::{ListenerPipeline, ReportListener};
pub use metadata::{AppMetadata, HostMetadata};
pub use prefs::PrefStore;
pub use store::ReportStore;
pub use usage::UsageTracker;

pub use faultline_core::{
	CauseSummary, DeviceMetadata, Frame, ListenerAttachment, Report, ReportId,
};
