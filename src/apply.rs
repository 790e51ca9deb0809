use crate::{
	edit::Edit,
	error::ApplyError,
	path::{self, IndexPath},
	tree::{DomTree, FragmentParser},
};
use tracing::trace;

/// What a successful [`PatchApplier::apply`] changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Applied<N> {
	/// A parsed node was inserted as a child of the container.
	Inserted(N),
	/// The (previously empty) container's content was replaced wholesale.
	ContentReplaced(N),
	Removed,
	AttributeSet,
	AttributeRemoved,
}
impl<N> Applied<N> {
	/// The root of new content, if any was added.
	pub fn into_new_subtree(self) -> Option<N> {
		match self {
			Applied::Inserted(node) | Applied::ContentReplaced(node) => Some(node),
			Applied::Removed | Applied::AttributeSet | Applied::AttributeRemoved => None,
		}
	}
}

/// Applies single [`Edit`]s to a [`DomTree`], parsing inserted markup with `P`.
///
/// Each edit only ever touches the direct children or attributes of one resolved container.
#[derive(Debug, Clone, Default)]
pub struct PatchApplier<P> {
	parser: P,
}
impl<P> PatchApplier<P> {
	#[must_use]
	pub fn new(parser: P) -> Self {
		Self { parser }
	}

	pub fn parser(&self) -> &P {
		&self.parser
	}

	/// Resolves `path` from `root` and applies `edit` to the node found there.
	///
	/// # Errors
	///
	/// - [`ApplyError::BadPath`] iff `path` doesn't resolve,
	/// - [`ApplyError::EmptyFragment`] iff indexed insertion markup yields no node,
	/// - [`ApplyError::IndexOutOfRange`] iff a removal targets a missing child,
	/// - [`ApplyError::Host`] iff the host rejects the mutation.
	///
	/// The tree is unchanged in all of these cases.
	pub fn apply<T>(&self, tree: &mut T, root: &T::Node, path: &IndexPath, edit: &Edit) -> Result<Applied<T::Node>, ApplyError>
	where
		T: DomTree + ?Sized,
		P: FragmentParser<T>,
	{
		let container = path::resolve(tree, root, path)?;
		match edit {
			Edit::Insert { at_index, markup } => self.insert(tree, container, *at_index, markup),
			Edit::Remove { at_index } => remove(tree, &container, *at_index),
			Edit::SetAttribute { key, value } => {
				#[cfg(feature = "dangerous-logging")]
				trace!("Setting attribute {:?} to {:?}.", key, value);
				#[cfg(not(feature = "dangerous-logging"))]
				trace!("Setting attribute {:?}.", key);
				tree.set_attribute(&container, key, value)?;
				Ok(Applied::AttributeSet)
			}
			Edit::RemoveAttribute { key } => {
				trace!("Removing attribute {:?}.", key);
				tree.remove_attribute(&container, key)?;
				Ok(Applied::AttributeRemoved)
			}
		}
	}

	fn insert<T>(&self, tree: &mut T, container: T::Node, at_index: i64, markup: &str) -> Result<Applied<T::Node>, ApplyError>
	where
		T: DomTree + ?Sized,
		P: FragmentParser<T>,
	{
		#[cfg(feature = "dangerous-logging")]
		trace!("Inserting {:?} at {}.", markup, at_index);

		let len = tree.child_count(&container).unwrap_or(0);
		if len == 0 {
			trace!("Empty container, replacing its content.");
			self.parser.replace_content(tree, &container, markup)?;
			return Ok(Applied::ContentReplaced(container));
		}

		let parsed = self.parser.parse_first(tree, markup)?.ok_or(ApplyError::EmptyFragment)?;
		let position = if at_index < 0 { 0 } else { usize::try_from(at_index).unwrap_or(usize::MAX) };
		let reference = if position < len { tree.child(&container, position) } else { None };
		trace!(position, len, appending = reference.is_none(), "Inserting parsed node.");
		tree.insert_before(&container, parsed.clone(), reference.as_ref())?;
		Ok(Applied::Inserted(parsed))
	}
}

fn remove<T: DomTree + ?Sized>(tree: &mut T, container: &T::Node, at_index: i64) -> Result<Applied<T::Node>, ApplyError> {
	let len = tree.child_count(container).unwrap_or(0);
	let child = usize::try_from(at_index)
		.ok()
		.filter(|&index| index < len)
		.and_then(|index| tree.child(container, index))
		.ok_or(ApplyError::IndexOutOfRange { index: at_index, len })?;
	trace!(at_index, len, "Removing child.");
	tree.remove_child(container, &child)?;
	Ok(Applied::Removed)
}
