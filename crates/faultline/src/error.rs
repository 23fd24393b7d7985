// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for the capture SDK.

use thiserror::Error;

/// Result type alias for capture operations.
pub type Result<T> = std::result::Result<T, CaptureError>;

/// Errors that can occur in the capture SDK.
///
/// Nothing on the fault path returns these; they surface only from
/// setup and from the store/preference APIs used outside capture.
#[derive(Debug, Error)]
pub enum CaptureError {
	/// No report directory was configured and none could be resolved
	/// from the platform data directory.
	#[error("no report directory available")]
	NoReportDir,

	/// Report handling failed.
	#[error(transparent)]
	Report(#[from] faultline_core::ReportError),

	/// Failed to serialize state.
	#[error("serialization error: {0}")]
	Serialization(#[from] serde_json::Error),

	/// Filesystem operation failed.
	#[error("io error: {0}")]
	Io(#[from] std::io::Error),
}
