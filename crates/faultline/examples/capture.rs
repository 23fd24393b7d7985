// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Example: capture a crash report with the faultline SDK.
//!
//! Run with:
//!   cargo run --example capture -p faultline

use std::sync::Arc;

use faultline::{install, ExceptionCapture, FaultEvent, HostMetadata, ReportListener};

struct CheckoutListener;

impl ReportListener for CheckoutListener {
	fn description(&self) -> Option<String> {
		Some("user was on the checkout screen".to_string())
	}

	fn reporter_identity(&self) -> Option<String> {
		Some("user_example_123".to_string())
	}
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
	let report_dir = std::env::temp_dir().join("faultline-example");

	println!("Initializing exception capture...");
	println!("  Report dir: {}", report_dir.display());

	let capture = Arc::new(
		ExceptionCapture::builder()
			.report_dir(&report_dir)
			.metadata(Arc::new(HostMetadata::new(env!("CARGO_PKG_VERSION"))))
			.listener(Arc::new(CheckoutListener))
			.build()?,
	);

	// From here on, any unhandled panic is persisted before the
	// process dies.
	install(Arc::clone(&capture));

	// Capture an explicitly reported (non-fatal) error as well.
	let error = std::fs::read_to_string("/does/not/exist").unwrap_err();
	let fault = FaultEvent::from_error(&error);
	capture.capture("main", &fault);

	println!("\nStaged reports:");
	for report in capture.store().list_pending()? {
		println!(
			"  {} [{}] {}: {}",
			report.id, report.thread_name, report.exception_type, report.message
		);
	}

	Ok(())
}
