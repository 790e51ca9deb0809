//! The host document, as far as patching needs it.
//!
//! Node handles are owned by the host. Patching only borrows them for the duration of one edit.

use crate::error::HostError;
use core::fmt::Debug;

pub trait DomTree {
	type Node: Clone + Debug;

	/// The node index paths are resolved from.
	fn root(&self) -> Self::Node;

	/// [`None`] iff `node` has no child collection at all (as opposed to an empty one).
	fn child_count(&self, node: &Self::Node) -> Option<usize>;

	fn child(&self, node: &Self::Node, index: usize) -> Option<Self::Node>;

	/// Inserts `child` before `reference`, or appends it if `reference` is [`None`].
	///
	/// # Errors
	///
	/// Iff the host rejects the insertion.
	fn insert_before(&mut self, parent: &Self::Node, child: Self::Node, reference: Option<&Self::Node>) -> Result<(), HostError>;

	/// # Errors
	///
	/// Iff `child` is not a child of `parent` or the host rejects the removal.
	fn remove_child(&mut self, parent: &Self::Node, child: &Self::Node) -> Result<(), HostError>;

	/// # Errors
	///
	/// Iff `node` can't carry attributes.
	fn set_attribute(&mut self, node: &Self::Node, key: &str, value: &str) -> Result<(), HostError>;

	/// Removing an absent attribute is not an error.
	///
	/// # Errors
	///
	/// Iff `node` can't carry attributes.
	fn remove_attribute(&mut self, node: &Self::Node, key: &str) -> Result<(), HostError>;
}

/// Turns markup strings into live nodes of `T`.
///
/// Kept separate from [`DomTree`] since not every host comes with a native fragment parser.
pub trait FragmentParser<T: DomTree + ?Sized> {
	/// Replaces all of `container`'s content with the parsed `markup`.
	///
	/// # Errors
	///
	/// Iff `container` can't hold parsed content.
	fn replace_content(&self, tree: &mut T, container: &T::Node, markup: &str) -> Result<(), HostError>;

	/// Parses `markup` into a detached fragment and returns its first root node, if there is one.
	///
	/// # Errors
	///
	/// Iff the host fails to create the fragment.
	fn parse_first(&self, tree: &mut T, markup: &str) -> Result<Option<T::Node>, HostError>;
}
