use crate::path::IndexPath;
use core::slice;
use serde::{de, Deserialize, Deserializer};
use thiserror::Error;
use tracing::warn;

/// One change to the direct children (or attributes) of the node addressed by the accompanying [`IndexPath`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit {
	/// Insert the first root node parsed from `markup` before child `at_index`.
	///
	/// `at_index <= 0` prepends, `at_index >= child count` appends.
	/// If the container is empty, its whole content is replaced with `markup` instead and `at_index` is ignored.
	Insert { at_index: i64, markup: String },
	Remove { at_index: i64 },
	SetAttribute { key: String, value: String },
	RemoveAttribute { key: String },
}

/// An [`Edit`] together with the node it targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchRecord {
	pub path: IndexPath,
	pub edit: Edit,
}
impl<'de> Deserialize<'de> for PatchRecord {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		EditRecord::deserialize(deserializer)?.into_patch().map_err(de::Error::custom)
	}
}

/// Edits delivered together. Each observes the tree as left by the ones before it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct EditBatch(Vec<PatchRecord>);
impl EditBatch {
	#[must_use]
	pub fn new(records: Vec<PatchRecord>) -> Self {
		Self(records)
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.0.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn iter(&self) -> slice::Iter<'_, PatchRecord> {
		self.0.iter()
	}
}
impl<'a> IntoIterator for &'a EditBatch {
	type Item = &'a PatchRecord;
	type IntoIter = slice::Iter<'a, PatchRecord>;

	fn into_iter(self) -> Self::IntoIter {
		self.iter()
	}
}

/// The record as the server's change log serializes it: every operation is a nullable field.
#[derive(Debug, Deserialize)]
struct EditRecord {
	/// The server writes `null` for the document node itself.
	#[serde(rename = "IPath")]
	path: Option<IndexPath>,
	#[serde(rename = "InsertNode")]
	insert_node: Option<InsertNode>,
	#[serde(rename = "Rmnode")]
	rm_node: Option<i64>,
	#[serde(rename = "Setattr")]
	set_attr: Option<SetAttr>,
	#[serde(rename = "Rmattr")]
	rm_attr: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InsertNode {
	html: String,
	index: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SetAttr {
	key: String,
	val: String,
}

#[derive(Debug, Error)]
#[error("edit record carries no operation")]
pub struct EmptyRecord;

impl EditRecord {
	fn into_patch(self) -> Result<PatchRecord, EmptyRecord> {
		let EditRecord {
			path,
			insert_node,
			rm_node,
			set_attr,
			rm_attr,
		} = self;

		let populated = usize::from(insert_node.is_some()) + usize::from(rm_node.is_some()) + usize::from(set_attr.is_some()) + usize::from(rm_attr.is_some());
		if populated > 1 {
			//TODO: Raise with the server side whether several operations per record are ever intended.
			warn!("Edit record populates {} operations. Only the first of InsertNode, Rmnode, Setattr, Rmattr is applied.", populated);
		}

		let edit = if let Some(InsertNode { html, index }) = insert_node {
			Edit::Insert { at_index: index, markup: html }
		} else if let Some(at_index) = rm_node {
			Edit::Remove { at_index }
		} else if let Some(SetAttr { key, val }) = set_attr {
			Edit::SetAttribute { key, value: val }
		} else if let Some(key) = rm_attr {
			Edit::RemoveAttribute { key }
		} else {
			return Err(EmptyRecord);
		};

		Ok(PatchRecord {
			path: path.unwrap_or_default(),
			edit,
		})
	}
}
