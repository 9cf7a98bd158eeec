// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Panic hook that records the stack at the panic site.
//!
//! By the time `catch_unwind` hands back a payload the stack has already been
//! unwound. The hook captures frames while the panicking frame is still live
//! and parks them in a thread-local slot, where [`CapturedError::from_panic`]
//! picks them up on the same thread.
//!
//! [`CapturedError::from_panic`]: crate::captured::CapturedError::from_panic

use std::cell::RefCell;
use std::panic::{self, AssertUnwindSafe, PanicHookInfo};
use std::sync::Once;

use tripwire_core::StackFrame;

use crate::backtrace::capture_stacktrace;
use crate::captured::panic_message;

static INSTALL: Once = Once::new();

struct PanicSite {
	message: String,
	stacktrace: Vec<StackFrame>,
}

thread_local! {
	static LAST_PANIC: RefCell<Option<PanicSite>> = const { RefCell::new(None) };
}

/// Installs the stack-recording panic hook.
///
/// The previous hook is chained, so default panic output is preserved. Only
/// the first call installs anything.
pub fn install_panic_hook() {
	INSTALL.call_once(|| {
		let previous_hook = panic::take_hook();

		panic::set_hook(Box::new(move |info| {
			// Never let stack capture turn a panic into an abort.
			let _ = panic::catch_unwind(AssertUnwindSafe(|| record_panic_site(info)));

			previous_hook(info);
		}));
	});
}

fn record_panic_site(info: &PanicHookInfo<'_>) {
	let site = PanicSite {
		message: panic_message(info.payload()),
		stacktrace: capture_stacktrace(),
	};
	let _ = LAST_PANIC.try_with(|slot| *slot.borrow_mut() = Some(site));
}

/// Takes the stack recorded for the most recent panic on this thread, if its
/// message matches `message`.
///
/// The slot is emptied either way so a stale stack is never attached to a
/// later, unrelated panic.
pub(crate) fn take_panic_stacktrace(message: &str) -> Option<Vec<StackFrame>> {
	LAST_PANIC
		.with(|slot| slot.borrow_mut().take())
		.filter(|site| site.message == message)
		.map(|site| site.stacktrace)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[inline(never)]
	fn reconcile_ledger() {
		panic!("ledger out of balance");
	}

	#[test]
	fn test_hook_records_panic_site() {
		install_panic_hook();

		let result = panic::catch_unwind(reconcile_ledger);
		assert!(result.is_err());

		let frames = take_panic_stacktrace("ledger out of balance").unwrap();
		assert!(frames.iter().any(|frame| frame.method.contains("reconcile_ledger")));
		assert!(take_panic_stacktrace("ledger out of balance").is_none());
	}

	#[test]
	fn test_mismatched_message_is_discarded() {
		install_panic_hook();

		let result = panic::catch_unwind(|| panic!("first"));
		assert!(result.is_err());

		assert!(take_panic_stacktrace("second").is_none());
		assert!(take_panic_stacktrace("first").is_none());
	}

	#[test]
	fn test_install_is_idempotent() {
		install_panic_hook();
		install_panic_hook();

		let result = panic::catch_unwind(|| panic!("once"));
		assert!(result.is_err());
		assert!(take_panic_stacktrace("once").is_some());
	}
}
