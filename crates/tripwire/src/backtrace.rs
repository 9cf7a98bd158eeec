// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Stack capture for reports.

use backtrace::{Backtrace, BacktraceSymbol};
use rustc_demangle::demangle;
use tripwire_core::StackFrame;

/// Frames at the top of a capture that belong to the reporter or to the
/// unwinding machinery rather than to the code that failed.
const INTERNAL_PREFIXES: &[&str] = &[
	"backtrace::",
	"<backtrace::",
	"tripwire::backtrace::",
	"tripwire::captured::",
	"tripwire::panic_hook::",
	"<alloc::boxed::Box<",
	"std::sys::",
	"std::sys_common::",
	"std::panicking::",
	"std::panic::",
	"core::panicking::",
	"core::panic::",
	"<core::panic::",
	"core::ops::function::",
	"<core::pin::Pin",
	"futures_util::future::future::catch_unwind",
	"<futures_util::future::future::catch_unwind",
	"rust_begin_unwind",
	"__rust_",
	"__rustc::",
];

/// Captures the current stack, innermost frame first, with the reporter's own
/// frames removed from the top.
pub fn capture_stacktrace() -> Vec<StackFrame> {
	let backtrace = Backtrace::new();
	let frames = backtrace
		.frames()
		.iter()
		.flat_map(|frame| frame.symbols())
		.filter_map(frame_from_symbol)
		.collect();
	skip_internal_frames(frames)
}

fn frame_from_symbol(symbol: &BacktraceSymbol) -> Option<StackFrame> {
	let name = symbol.name()?;
	let method = match name.as_str() {
		Some(raw) => format!("{:#}", demangle(raw)),
		None => name.to_string(),
	};

	Some(StackFrame {
		method,
		file: symbol
			.filename()
			.map(|path| path.display().to_string())
			.unwrap_or_default(),
		line_number: symbol.lineno().unwrap_or(0),
		in_project: false,
	})
}

fn skip_internal_frames(frames: Vec<StackFrame>) -> Vec<StackFrame> {
	let first_external = frames
		.iter()
		.position(|frame| !is_internal_frame(&frame.method))
		.unwrap_or(frames.len());
	frames.into_iter().skip(first_external).collect()
}

fn is_internal_frame(method: &str) -> bool {
	INTERNAL_PREFIXES.iter().any(|prefix| method.starts_with(prefix))
}

/// Determine if a frame is from application code vs standard library and
/// runtime crates.
pub fn is_in_app_frame(function: &str) -> bool {
	const SYSTEM_PREFIXES: &[&str] = &[
		"std::",
		"core::",
		"alloc::",
		"<std::",
		"<core::",
		"<alloc::",
		"tokio::",
		"<tokio::",
		"futures::",
		"<futures::",
		"futures_util::",
		"<futures_util::",
		"async_trait::",
		"tracing::",
		"<tracing::",
		"backtrace::",
		"<backtrace::",
		"panic_unwind::",
		"<panic_unwind::",
		"rust_begin_unwind",
		"rust_panic",
		"__rust_",
		"_rust_",
	];

	const SYSTEM_CONTAINS: &[&str] = &[
		"::panic::",
		"::panicking::",
		"::thread::",
		"::rt::",
		"::runtime::",
		"::sys_common::",
	];

	!SYSTEM_PREFIXES.iter().any(|prefix| function.starts_with(prefix))
		&& !SYSTEM_CONTAINS.iter().any(|needle| function.contains(needle))
}
