//! A small arena-backed document plus a toy markup parser, so patching can be tested without a browser.
//!
//! The parser understands `<name key="value">…</name>` and text, nothing more. Attribute values can't contain spaces.

use crate::{
	error::HostError,
	tree::{DomTree, FragmentParser},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug)]
enum Kind {
	Document,
	Element { name: String, attributes: Vec<(String, String)> },
	Text(String),
}

#[derive(Debug)]
struct Slot {
	kind: Kind,
	parent: Option<NodeId>,
	children: Vec<NodeId>,
}

#[derive(Debug)]
pub struct Arena {
	slots: Vec<Slot>,
}
impl Arena {
	pub fn new() -> Self {
		Self {
			slots: vec![Slot {
				kind: Kind::Document,
				parent: None,
				children: Vec::new(),
			}],
		}
	}

	/// A document whose top-level children are parsed from `markup`.
	pub fn from_markup(markup: &str) -> Self {
		let mut arena = Self::new();
		let root = arena.root();
		for node in arena.parse(markup) {
			arena.attach(root, node, None);
		}
		arena
	}

	fn push(&mut self, kind: Kind) -> NodeId {
		self.slots.push(Slot {
			kind,
			parent: None,
			children: Vec::new(),
		});
		NodeId(self.slots.len() - 1)
	}

	fn detach(&mut self, node: NodeId) {
		if let Some(parent) = self.slots[node.0].parent.take() {
			self.slots[parent.0].children.retain(|&child| child != node);
		}
	}

	fn attach(&mut self, parent: NodeId, node: NodeId, position: Option<usize>) {
		self.detach(node);
		let children = &mut self.slots[parent.0].children;
		let position = position.unwrap_or(children.len());
		children.insert(position, node);
		self.slots[node.0].parent = Some(parent);
	}

	pub fn parent(&self, node: NodeId) -> Option<NodeId> {
		self.slots[node.0].parent
	}

	pub fn children(&self, node: NodeId) -> &[NodeId] {
		&self.slots[node.0].children
	}

	pub fn attribute(&self, node: NodeId, key: &str) -> Option<&str> {
		match &self.slots[node.0].kind {
			Kind::Element { attributes, .. } => attributes.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str()),
			_ => None,
		}
	}

	/// Parses `markup` into detached top-level nodes.
	pub fn parse(&mut self, mut markup: &str) -> Vec<NodeId> {
		let nodes = self.parse_nodes(&mut markup);
		assert!(markup.is_empty(), "unbalanced markup, left over: {:?}", markup);
		nodes
	}

	fn parse_nodes(&mut self, input: &mut &str) -> Vec<NodeId> {
		let mut nodes = Vec::new();
		while !input.is_empty() && !input.starts_with("</") {
			let current: &str = *input;
			if let Some(rest) = current.strip_prefix('<') {
				let end = rest.find('>').expect("unterminated tag");
				let mut parts = rest[..end].split_whitespace();
				let name = parts.next().expect("tag without a name").to_owned();
				let attributes = parts
					.map(|part| {
						let (key, value) = part.split_once('=').unwrap_or((part, "\"\""));
						(key.to_owned(), value.trim_matches('"').to_owned())
					})
					.collect();
				*input = &rest[end + 1..];

				let element = self.push(Kind::Element { name: name.clone(), attributes });
				for child in self.parse_nodes(input) {
					self.attach(element, child, None);
				}
				let current: &str = *input;
				*input = current.strip_prefix(format!("</{}>", name).as_str()).expect("missing closing tag");
				nodes.push(element);
			} else {
				let end = current.find('<').unwrap_or(current.len());
				nodes.push(self.push(Kind::Text(current[..end].to_owned())));
				*input = &current[end..];
			}
		}
		nodes
	}

	pub fn render_outer(&self, node: NodeId) -> String {
		match &self.slots[node.0].kind {
			Kind::Document => self.render_inner(node),
			Kind::Text(data) => data.clone(),
			Kind::Element { name, attributes } => {
				let attributes: String = attributes.iter().map(|(k, v)| format!(" {}=\"{}\"", k, v)).collect();
				format!("<{}{}>{}</{}>", name, attributes, self.render_inner(node), name)
			}
		}
	}

	pub fn render_inner(&self, node: NodeId) -> String {
		self.children(node).iter().map(|&child| self.render_outer(child)).collect()
	}

	pub fn render(&self) -> String {
		self.render_inner(self.root())
	}
}

impl DomTree for Arena {
	type Node = NodeId;

	fn root(&self) -> NodeId {
		NodeId(0)
	}

	fn child_count(&self, node: &NodeId) -> Option<usize> {
		match self.slots[node.0].kind {
			Kind::Text(_) => None,
			_ => Some(self.slots[node.0].children.len()),
		}
	}

	fn child(&self, node: &NodeId, index: usize) -> Option<NodeId> {
		self.slots[node.0].children.get(index).copied()
	}

	fn insert_before(&mut self, parent: &NodeId, child: NodeId, reference: Option<&NodeId>) -> Result<(), HostError> {
		if let Kind::Text(_) = self.slots[parent.0].kind {
			return Err(HostError::new("HierarchyRequestError: text nodes can't have children"));
		}
		let position = match reference {
			Some(reference) => Some(
				self.children(*parent)
					.iter()
					.position(|c| c == reference)
					.ok_or_else(|| HostError::new("NotFoundError: reference is not a child"))?,
			),
			None => None,
		};
		self.attach(*parent, child, position);
		Ok(())
	}

	fn remove_child(&mut self, parent: &NodeId, child: &NodeId) -> Result<(), HostError> {
		if self.parent(*child) != Some(*parent) {
			return Err(HostError::new("NotFoundError: not a child"));
		}
		self.detach(*child);
		Ok(())
	}

	fn set_attribute(&mut self, node: &NodeId, key: &str, value: &str) -> Result<(), HostError> {
		match &mut self.slots[node.0].kind {
			Kind::Element { attributes, .. } => {
				match attributes.iter_mut().find(|(k, _)| k == key) {
					Some((_, v)) => *v = value.to_owned(),
					None => attributes.push((key.to_owned(), value.to_owned())),
				}
				Ok(())
			}
			_ => Err(HostError::new("not an element")),
		}
	}

	fn remove_attribute(&mut self, node: &NodeId, key: &str) -> Result<(), HostError> {
		match &mut self.slots[node.0].kind {
			Kind::Element { attributes, .. } => {
				attributes.retain(|(k, _)| k != key);
				Ok(())
			}
			_ => Err(HostError::new("not an element")),
		}
	}
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ToyParser;
impl FragmentParser<Arena> for ToyParser {
	fn replace_content(&self, tree: &mut Arena, container: &NodeId, markup: &str) -> Result<(), HostError> {
		if let Kind::Text(_) = tree.slots[container.0].kind {
			return Err(HostError::new("text nodes have no content to replace"));
		}
		for child in tree.children(*container).to_vec() {
			tree.detach(child);
		}
		for node in tree.parse(markup) {
			tree.attach(*container, node, None);
		}
		Ok(())
	}

	fn parse_first(&self, tree: &mut Arena, markup: &str) -> Result<Option<NodeId>, HostError> {
		Ok(tree.parse(markup).into_iter().next())
	}
}
