// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Session summary attached to reports raised inside a tracked session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user engagement session, as seen by the report that is being sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
	pub id: Uuid,
	pub started_at: DateTime<Utc>,
	/// Handled reports raised so far in this session.
	pub handled: u32,
	/// Unhandled reports raised so far in this session.
	pub unhandled: u32,
}

impl Session {
	/// Starts a new session now.
	pub fn start() -> Self {
		Self {
			id: Uuid::now_v7(),
			started_at: Utc::now(),
			handled: 0,
			unhandled: 0,
		}
	}

	/// Counts one more report against this session.
	pub fn record(&mut self, unhandled: bool) {
		if unhandled {
			self.unhandled = self.unhandled.saturating_add(1);
		} else {
			self.handled = self.handled.saturating_add(1);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_start_has_no_events() {
		let session = Session::start();
		assert_eq!(session.handled, 0);
		assert_eq!(session.unhandled, 0);
	}

	#[test]
	fn test_record_counts_by_kind() {
		let mut session = Session::start();
		session.record(false);
		session.record(true);
		session.record(true);

		assert_eq!(session.handled, 1);
		assert_eq!(session.unhandled, 2);
	}

	#[test]
	fn test_sessions_have_distinct_ids() {
		assert_ne!(Session::start().id, Session::start().id);
	}
}
