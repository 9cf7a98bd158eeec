// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Stack frame type.

use serde::{Deserialize, Serialize};

/// A single frame of a captured stack trace, innermost first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackFrame {
	pub method: String,
	pub file: String,
	pub line_number: u32,
	/// Whether the frame belongs to the application rather than a dependency.
	#[serde(default, skip_serializing_if = "is_false")]
	pub in_project: bool,
}

impl StackFrame {
	pub fn new(method: impl Into<String>, file: impl Into<String>, line_number: u32) -> Self {
		Self {
			method: method.into(),
			file: file.into(),
			line_number,
			in_project: false,
		}
	}
}

fn is_false(value: &bool) -> bool {
	!*value
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn test_in_project_only_serialized_when_true() {
		let mut frame = StackFrame::new("doA", "a.go", 65);
		assert_eq!(
			serde_json::to_value(&frame).unwrap(),
			json!({"method": "doA", "file": "a.go", "lineNumber": 65})
		);

		frame.in_project = true;
		assert_eq!(
			serde_json::to_value(&frame).unwrap(),
			json!({"method": "doA", "file": "a.go", "lineNumber": 65, "inProject": true})
		);
	}
}
