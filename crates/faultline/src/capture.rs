// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Process-wide exception capture: the panic hook, report assembly,
//! and chained delegation to the previously installed handler.

use std::cell::Cell;
use std::panic::{self, catch_unwind, AssertUnwindSafe, PanicHookInfo};
use std::path::PathBuf;
use std::sync::{Arc, OnceLock, RwLock};

use chrono::Utc;
use faultline_core::{DeviceMetadata, Report, ReportId};
use tracing::{debug, error, info, warn};

use crate::error::{CaptureError, Result};
use crate::fault::FaultEvent;
use crate::listener::{ListenerPipeline, ReportListener};
use crate::metadata::{AppMetadata, HostMetadata};
use crate::store::ReportStore;

/// SDK identification stamped into every report.
const SDK_NAME: &str = "faultline";
const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");

type PreviousHook = Box<dyn Fn(&PanicHookInfo<'_>) + Send + Sync>;

/// The capture instance the process-wide hook delivers faults to.
/// Locks here are private to the subsystem; the fault path only ever
/// takes the read side.
static CURRENT: RwLock<Option<Arc<ExceptionCapture>>> = RwLock::new(None);
/// The hook that was registered before ours. Taken exactly once so
/// default printing and termination behavior is preserved.
static PREVIOUS_HOOK: OnceLock<PreviousHook> = OnceLock::new();
static HOOK_REGISTERED: OnceLock<()> = OnceLock::new();

/// A handler for unhandled faults.
///
/// Chaining to whatever handler was installed before the SDK is
/// explicit composition over this trait rather than dynamic lookup.
pub trait FaultHandler: Send + Sync {
	fn handle(&self, thread_name: &str, fault: &FaultEvent);
}

/// Builder for constructing an [`ExceptionCapture`].
pub struct ExceptionCaptureBuilder {
	report_dir: Option<PathBuf>,
	metadata: Option<Arc<dyn AppMetadata>>,
	previous: Option<Box<dyn FaultHandler>>,
	listeners: Vec<Arc<dyn ReportListener>>,
}

impl ExceptionCaptureBuilder {
	pub fn new() -> Self {
		Self {
			report_dir: None,
			metadata: None,
			previous: None,
			listeners: Vec::new(),
		}
	}

	/// Directory where report artifacts are staged. Defaults to the
	/// platform data dir.
	pub fn report_dir(mut self, dir: impl Into<PathBuf>) -> Self {
		self.report_dir = Some(dir.into());
		self
	}

	/// Metadata provider for the device/app fields of each report.
	pub fn metadata(mut self, metadata: Arc<dyn AppMetadata>) -> Self {
		self.metadata = Some(metadata);
		self
	}

	/// Handler to chain to after capture, standing in for whatever
	/// fault handling existed before this subsystem.
	pub fn previous_handler(mut self, handler: Box<dyn FaultHandler>) -> Self {
		self.previous = Some(handler);
		self
	}

	/// Registers a report listener; invocation follows registration
	/// order.
	pub fn listener(mut self, listener: Arc<dyn ReportListener>) -> Self {
		self.listeners.push(listener);
		self
	}

	pub fn build(self) -> Result<ExceptionCapture> {
		let dir = self
			.report_dir
			.or_else(ReportStore::default_dir)
			.ok_or(CaptureError::NoReportDir)?;
		let store = ReportStore::new(dir)?;

		let mut pipeline = ListenerPipeline::new();
		for listener in self.listeners {
			pipeline.register(listener);
		}

		let metadata = self
			.metadata
			.unwrap_or_else(|| Arc::new(HostMetadata::without_version()));

		info!(dir = %store.dir().display(), "exception capture initialized");

		Ok(ExceptionCapture {
			store,
			pipeline: RwLock::new(pipeline),
			metadata,
			previous: RwLock::new(self.previous),
		})
	}
}

impl Default for ExceptionCaptureBuilder {
	fn default() -> Self {
		Self::new()
	}
}

/// Process-scoped crash capture.
///
/// One instance is installed per process via [`install`]. On an
/// unhandled fault it assembles a [`Report`], runs the listener
/// pipeline against it, persists it through the store, and chains to
/// the previously installed handler. Nothing on that path propagates
/// an error: a failure while capturing must never become a second
/// fault, so the only consequence of an internal failure is a missing
/// or partially populated report.
pub struct ExceptionCapture {
	store: ReportStore,
	pipeline: RwLock<ListenerPipeline>,
	metadata: Arc<dyn AppMetadata>,
	previous: RwLock<Option<Box<dyn FaultHandler>>>,
}

impl ExceptionCapture {
	pub fn builder() -> ExceptionCaptureBuilder {
		ExceptionCaptureBuilder::new()
	}

	/// The store holding staged report artifacts.
	pub fn store(&self) -> &ReportStore {
		&self.store
	}

	/// Registers a listener on the live pipeline.
	pub fn register_listener(&self, listener: Arc<dyn ReportListener>) {
		self.pipeline
			.write()
			.unwrap_or_else(|e| e.into_inner())
			.register(listener);
	}

	/// Unregisters a listener from the live pipeline.
	pub fn unregister_listener(&self, listener: &Arc<dyn ReportListener>) {
		self.pipeline
			.write()
			.unwrap_or_else(|e| e.into_inner())
			.unregister(listener);
	}

	/// Replaces the chained fault handler.
	pub fn set_previous_handler(&self, handler: Option<Box<dyn FaultHandler>>) {
		*self.previous.write().unwrap_or_else(|e| e.into_inner()) = handler;
	}

	/// Assembles and persists a report for `fault`.
	///
	/// Every failure is recovered locally: metadata gaps leave fields
	/// empty, a panicking listener is skipped, and a persistence
	/// error only costs the report. Concurrent faults on different
	/// threads each produce an independent report with a distinct ID.
	pub fn capture(&self, thread_name: &str, fault: &FaultEvent) -> Option<ReportId> {
		let mut report = self.build_report(thread_name, fault);

		{
			let pipeline = self.pipeline.read().unwrap_or_else(|e| e.into_inner());
			pipeline.run(&mut report);
		}

		match self.store.write(&report) {
			Ok(id) => {
				debug!(id = %id, thread = %thread_name, "crash report staged");
				Some(id)
			}
			Err(e) => {
				error!(error = %e, "failed to persist crash report");
				None
			}
		}
	}

	/// Full fault delivery: capture, then chain to the previous
	/// handler with the original fault, or terminate the process if
	/// there is nothing to chain to.
	pub fn on_fault(&self, thread_name: &str, fault: &FaultEvent) {
		self.capture(thread_name, fault);

		let previous = self.previous.read().unwrap_or_else(|e| e.into_inner());
		match previous.as_ref() {
			Some(handler) => handler.handle(thread_name, fault),
			None => {
				// Preserve crash semantics when no handler existed
				// before us.
				std::process::abort();
			}
		}
	}

	fn build_report(&self, thread_name: &str, fault: &FaultEvent) -> Report {
		let device = catch_unwind(AssertUnwindSafe(|| self.metadata.device_metadata()))
			.unwrap_or_else(|_| {
				warn!("metadata provider panicked, leaving device fields empty");
				DeviceMetadata::default()
			});

		Report {
			id: ReportId::new(),
			timestamp: Utc::now(),
			thread_name: thread_name.to_string(),
			exception_type: fault.exception_type.clone(),
			message: fault.message.clone(),
			frames: fault.frames.clone(),
			cause_chain: fault.cause_chain.clone(),
			device,
			attachment: None,
			sdk_name: SDK_NAME.to_string(),
			sdk_version: SDK_VERSION.to_string(),
		}
	}
}

/// Installs `capture` as the process-wide fault handler.
///
/// The first call takes the panic hook registered before the SDK and
/// chains to it after capture, so default printing and termination
/// behavior is preserved. Installation is idempotent: calling again
/// replaces the active capture instance while the hook itself stays
/// registered exactly once per process.
pub fn install(capture: Arc<ExceptionCapture>) {
	*CURRENT.write().unwrap_or_else(|e| e.into_inner()) = Some(capture);

	HOOK_REGISTERED.get_or_init(|| {
		let previous = panic::take_hook();
		let _ = PREVIOUS_HOOK.set(previous);
		panic::set_hook(Box::new(panic_hook));
		info!("panic hook installed");
	});
}

/// The currently installed capture instance, if any.
pub fn installed() -> Option<Arc<ExceptionCapture>> {
	CURRENT.read().unwrap_or_else(|e| e.into_inner()).clone()
}

/// Removes the installed capture instance. The hook itself stays
/// registered and becomes a pass-through to the previous handler.
pub fn uninstall() {
	CURRENT.write().unwrap_or_else(|e| e.into_inner()).take();
}

thread_local! {
	/// Set on the capture helper thread so that a panic raised by a
	/// listener or metadata provider during assembly does not recurse
	/// into capture again.
	static ASSEMBLING_REPORT: Cell<bool> = const { Cell::new(false) };
}

fn panic_hook(info: &PanicHookInfo<'_>) {
	if ASSEMBLING_REPORT.with(|flag| flag.get()) {
		// A listener or metadata provider panicked while a report was
		// being assembled on this thread; once this hook returns, the
		// pipeline's catch_unwind contains it.
		return;
	}

	if let Some(capture) = installed() {
		// The backtrace and thread identity belong to the faulting
		// thread and must be taken here.
		let fault = FaultEvent::from_panic(info);
		let thread = std::thread::current();
		let thread_name = thread.name().unwrap_or("unnamed").to_string();

		// This hook runs while the thread is already panicking, so a
		// panic raised here - by a listener, say - is a nested panic
		// and kills the process before the report reaches disk.
		// Assembly and enrichment run on a short-lived thread
		// instead, where an unwind is an ordinary unwind.
		let spawned = std::thread::Builder::new()
			.name("faultline-capture".to_string())
			.spawn(move || {
				ASSEMBLING_REPORT.with(|flag| flag.set(true));
				capture.capture(&thread_name, &fault);
			});
		match spawned {
			Ok(handle) => {
				if handle.join().is_err() {
					error!("capture thread panicked, report lost");
				}
			}
			Err(e) => {
				error!(error = %e, "failed to spawn capture thread, report lost");
			}
		}
	}

	if let Some(previous) = PREVIOUS_HOOK.get() {
		previous(info);
	}
}
