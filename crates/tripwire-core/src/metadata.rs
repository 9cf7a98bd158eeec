// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Tabbed metadata attached to reports.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::Result;

/// Arbitrary report metadata, grouped by tab name.
///
/// Values under the same tab are merged key by key; a later write to the
/// same `(tab, key)` replaces the earlier value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetaData(BTreeMap<String, BTreeMap<String, Value>>);

impl MetaData {
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds a single value under `tab`.
	pub fn add(&mut self, tab: impl Into<String>, key: impl Into<String>, value: impl Into<Value>) {
		self
			.0
			.entry(tab.into())
			.or_default()
			.insert(key.into(), value.into());
	}

	/// Adds any serializable value under `tab`.
	pub fn add_serializable<T: Serialize>(
		&mut self,
		tab: impl Into<String>,
		key: impl Into<String>,
		value: &T,
	) -> Result<()> {
		let value = serde_json::to_value(value)?;
		self.add(tab, key, value);
		Ok(())
	}

	/// Merges every tab of `other` into `self`.
	pub fn update(&mut self, other: &MetaData) {
		for (tab, values) in &other.0 {
			let target = self.0.entry(tab.clone()).or_default();
			for (key, value) in values {
				target.insert(key.clone(), value.clone());
			}
		}
	}

	pub fn tab(&self, tab: &str) -> Option<&BTreeMap<String, Value>> {
		self.0.get(tab)
	}

	pub fn get(&self, tab: &str, key: &str) -> Option<&Value> {
		self.0.get(tab).and_then(|values| values.get(key))
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}

impl<T, K> FromIterator<(T, K, Value)> for MetaData
where
	T: Into<String>,
	K: Into<String>,
{
	fn from_iter<I: IntoIterator<Item = (T, K, Value)>>(iter: I) -> Self {
		let mut meta_data = MetaData::new();
		for (tab, key, value) in iter {
			meta_data.add(tab, key, value);
		}
		meta_data
	}
}
