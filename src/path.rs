use crate::tree::DomTree;
use core::{fmt, slice};
use serde::Deserialize;
use thiserror::Error;

/// Child positions read from a root towards the addressed node.
///
/// Only meaningful against the tree state it is evaluated in: structural edits elsewhere may shift it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(transparent)]
pub struct IndexPath(Vec<usize>);
impl IndexPath {
	#[must_use]
	pub fn new(indices: Vec<usize>) -> Self {
		Self(indices)
	}

	#[must_use]
	pub fn root() -> Self {
		Self(Vec::new())
	}

	#[must_use]
	pub fn as_slice(&self) -> &[usize] {
		&self.0
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.0.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn iter(&self) -> slice::Iter<'_, usize> {
		self.0.iter()
	}
}
impl From<Vec<usize>> for IndexPath {
	fn from(indices: Vec<usize>) -> Self {
		Self(indices)
	}
}
impl<'a> IntoIterator for &'a IndexPath {
	type Item = &'a usize;
	type IntoIter = slice::Iter<'a, usize>;

	fn into_iter(self) -> Self::IntoIter {
		self.iter()
	}
}
impl fmt::Display for IndexPath {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{:?}", self.0)
	}
}

/// Resolution stopped at `depth` because the node there has no child `index`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no child {index} at depth {depth}")]
pub struct NotFound {
	pub depth: usize,
	pub index: usize,
	/// Child count of the node resolution stopped at, or [`None`] if it has no child collection at all.
	pub available: Option<usize>,
}

/// Walks `path` down from `root` in document order.
///
/// # Errors
///
/// [`NotFound`] iff any index is out of range or a node along the way has no children collection.
pub fn resolve<T: DomTree + ?Sized>(tree: &T, root: &T::Node, path: &IndexPath) -> Result<T::Node, NotFound> {
	let mut current = root.clone();
	for (depth, &index) in path.iter().enumerate() {
		let available = tree.child_count(&current);
		let next = match available {
			Some(len) if index < len => tree.child(&current, index),
			_ => None,
		};
		current = next.ok_or(NotFound { depth, index, available })?;
	}
	Ok(current)
}
