// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for crash report handling.

use thiserror::Error;

/// Errors that can occur handling crash report artifacts.
#[derive(Debug, Error)]
pub enum ReportError {
	#[error("report not found: {0}")]
	NotFound(String),

	#[error("serialization error: {0}")]
	Serialization(#[from] serde_json::Error),

	#[error("io error: {0}")]
	Io(#[from] std::io::Error),
}

/// Result type for crash report operations.
pub type Result<T> = std::result::Result<T, ReportError>;
