// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Backtrace capture and parsing for panics.

use faultline_core::Frame;
use rustc_demangle::demangle;
use std::backtrace::Backtrace;

/// Capture a fresh backtrace from the current thread and parse it
/// into report frames.
pub fn capture_frames() -> Vec<Frame> {
	let backtrace = Backtrace::force_capture();
	parse_frames(&backtrace.to_string())
}

/// Parse rendered backtrace output into frames.
///
/// The renderer emits one symbol line per frame, optionally followed
/// by an `at file:line:col` continuation line which is folded into
/// the preceding frame.
pub(crate) fn parse_frames(rendered: &str) -> Vec<Frame> {
	let mut frames: Vec<Frame> = Vec::new();

	for raw in rendered.lines() {
		let line = raw.trim();
		if line.is_empty() {
			continue;
		}

		if let Some(location) = line.strip_prefix("at ") {
			if let Some(frame) = frames.last_mut() {
				let (filename, lineno) = parse_location(location);
				frame.filename = filename;
				frame.lineno = lineno;
			}
			continue;
		}

		if let Some(frame) = parse_symbol_line(line) {
			frames.push(frame);
		}
	}

	frames
}

/// Parse a symbol line such as `  12: my_app::module::function`.
fn parse_symbol_line(line: &str) -> Option<Frame> {
	let symbol = match line.split_once(':') {
		Some((index, rest)) if index.trim().parse::<u32>().is_ok() => rest.trim(),
		_ => line,
	};

	if symbol.is_empty() {
		return None;
	}

	let function = demangle(symbol).to_string();
	let module = function.rfind("::").map(|idx| function[..idx].to_string());
	let in_app = is_app_frame(&function);

	Some(Frame {
		module,
		function: Some(function),
		filename: None,
		lineno: None,
		in_app,
	})
}

/// Split `src/main.rs:10:5` into filename and line, tolerating a
/// missing column.
fn parse_location(location: &str) -> (Option<String>, Option<u32>) {
	let without_col = match location.rsplit_once(':') {
		Some((rest, col)) if col.parse::<u32>().is_ok() => rest,
		_ => return (Some(location.to_string()), None),
	};

	match without_col.rsplit_once(':') {
		Some((file, line)) if line.parse::<u32>().is_ok() => {
			(Some(file.to_string()), line.parse().ok())
		}
		// Only one numeric suffix was present: treat it as the line.
		_ => (Some(without_col.to_string()), location.rsplit(':').next().and_then(|s| s.parse().ok())),
	}
}

/// Determine whether a frame belongs to application code rather than
/// the standard library or async runtime plumbing.
fn is_app_frame(function: &str) -> bool {
	const RUNTIME_PREFIXES: &[&str] = &[
		"std::",
		"core::",
		"alloc::",
		"<std::",
		"<core::",
		"<alloc::",
		"backtrace::",
		"<backtrace::",
		"panic_unwind::",
		"rust_begin_unwind",
		"rust_panic",
		"__rust_",
		"_rust_",
		"__libc_start",
	];

	const RUNTIME_MARKERS: &[&str] = &[
		"::panic::",
		"::panicking::",
		"::thread::",
		"::rt::",
		"::sys::",
		"::sys_common::",
	];

	for prefix in RUNTIME_PREFIXES {
		if function.starts_with(prefix) {
			return false;
		}
	}

	for marker in RUNTIME_MARKERS {
		if function.contains(marker) {
			return false;
		}
	}

	true
}
