//! [`DomTree`] and [`FragmentParser`] backed by the browser DOM through [`web_sys`].

use crate::{
	error::HostError,
	tree::{DomTree, FragmentParser},
};
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlTemplateElement, Node};

/// The live document, with index paths resolved from `root`.
#[derive(Debug, Clone)]
pub struct WebDom {
	document: Document,
	root: Node,
}
impl WebDom {
	/// Paths are resolved from the document node itself, so `[0]` is usually the `<html>` element.
	#[must_use]
	pub fn new(document: Document) -> Self {
		let root = document.clone().into();
		Self { document, root }
	}

	/// Resolves paths from `root` instead of the document node, e.g. to mount patches into part of a page.
	#[must_use]
	pub fn with_root(document: Document, root: Node) -> Self {
		Self { document, root }
	}

	#[must_use]
	pub fn document(&self) -> &Document {
		&self.document
	}
}

fn element(node: &Node) -> Result<&Element, HostError> {
	node.dyn_ref::<Element>()
		.ok_or_else(|| HostError::new(format!("{} is not an element", node.node_name())))
}

impl DomTree for WebDom {
	type Node = Node;

	fn root(&self) -> Node {
		self.root.clone()
	}

	fn child_count(&self, node: &Node) -> Option<usize> {
		Some(node.child_nodes().length() as usize)
	}

	fn child(&self, node: &Node, index: usize) -> Option<Node> {
		node.child_nodes().item(u32::try_from(index).ok()?)
	}

	fn insert_before(&mut self, parent: &Node, child: Node, reference: Option<&Node>) -> Result<(), HostError> {
		parent.insert_before(&child, reference)?;
		Ok(())
	}

	fn remove_child(&mut self, parent: &Node, child: &Node) -> Result<(), HostError> {
		parent.remove_child(child)?;
		Ok(())
	}

	fn set_attribute(&mut self, node: &Node, key: &str, value: &str) -> Result<(), HostError> {
		element(node)?.set_attribute(key, value)?;
		Ok(())
	}

	fn remove_attribute(&mut self, node: &Node, key: &str) -> Result<(), HostError> {
		element(node)?.remove_attribute(key)?;
		Ok(())
	}
}

/// Parses markup with an inert `<template>` element, so scripts in it don't run and table content survives.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateParser;
impl FragmentParser<WebDom> for TemplateParser {
	fn replace_content(&self, _tree: &mut WebDom, container: &Node, markup: &str) -> Result<(), HostError> {
		element(container)?.set_inner_html(markup);
		Ok(())
	}

	fn parse_first(&self, tree: &mut WebDom, markup: &str) -> Result<Option<Node>, HostError> {
		let template = tree
			.document
			.create_element("template")?
			.dyn_into::<HtmlTemplateElement>()
			.map_err(|element| HostError::new(format!("`template` created a {} instead", element.tag_name())))?;
		template.set_inner_html(markup);
		Ok(template.content().first_child())
	}
}
