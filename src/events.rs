use serde::Serialize;
use tracing::{error, instrument, trace, trace_span, warn};
use js_sys::Function;
use wasm_bindgen::{closure::Closure, JsCast, UnwrapThrowExt};
use web_sys::{Document, DocumentFragment, Element, Node, NodeList};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
	Click,
}

/// A user interaction forwarded to the server, serialized as `{"Type":"click","Message":…}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboundEvent {
	#[serde(rename = "Type")]
	pub kind: EventKind,
	/// Opaque to this crate, taken verbatim from the marker attribute.
	#[serde(rename = "Message")]
	pub payload: String,
}
impl OutboundEvent {
	#[must_use]
	pub fn click(payload: impl Into<String>) -> Self {
		Self {
			kind: EventKind::Click,
			payload: payload.into(),
		}
	}

	/// # Errors
	///
	/// Never in practice.
	pub fn to_json(&self) -> Result<String, serde_json::Error> {
		serde_json::to_string(self)
	}
}

/// Forwards clicks on marked elements to a sink.
///
/// All registered elements share one listener, so registering an element again is a no-op
/// and scopes can be rescanned freely.
///
/// The listener is handed over to the JavaScript garbage collector, so listeners left on elements
/// stay valid (and keep feeding the sink) after the dispatcher is dropped.
pub struct EventDispatcher {
	marker_attribute: String,
	click_handler: Function,
}
impl core::fmt::Debug for EventDispatcher {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		f.debug_struct("EventDispatcher").field("marker_attribute", &self.marker_attribute).finish_non_exhaustive()
	}
}
impl EventDispatcher {
	#[must_use]
	pub fn new(marker_attribute: impl Into<String>, sink: impl Fn(OutboundEvent) + 'static) -> Self {
		let marker_attribute = marker_attribute.into();
		let attribute = marker_attribute.clone();
		let click_handler = Closure::wrap(Box::new(move |event: web_sys::Event| {
			let span = trace_span!("click_handler", event_type = %event.type_());
			let _enter = span.enter();

			// `target` may be a descendant of the marked element.
			let element = match event.current_target().and_then(|target| target.dyn_into::<Element>().ok()) {
				Some(element) => element,
				None => return warn!("Click without an element as current target. Ignoring."),
			};
			match element.get_attribute(&attribute) {
				Some(payload) => {
					#[cfg(feature = "dangerous-logging")]
					trace!("Forwarding click {:?}.", payload);
					#[cfg(not(feature = "dangerous-logging"))]
					trace!("Forwarding click.");
					sink(OutboundEvent::click(payload));
				}
				None => warn!("Clicked element lost its {:?} attribute since registration. Ignoring.", attribute),
			}
		}) as Box<dyn Fn(web_sys::Event)>)
		.into_js_value()
		.unchecked_into();
		Self {
			marker_attribute,
			click_handler,
		}
	}

	#[must_use]
	pub fn marker_attribute(&self) -> &str {
		&self.marker_attribute
	}

	/// Attaches the click listener to `scope_root` (if marked) and all marked descendants.
	///
	/// Returns the number of marked elements found.
	#[instrument(skip(self))]
	pub fn register_listeners(&self, scope_root: &Node) -> u32 {
		let mut count = 0;
		if let Some(element) = scope_root.dyn_ref::<Element>() {
			if element.has_attribute(&self.marker_attribute) {
				self.listen(element);
				count += 1;
			}
		}

		let selector = format!("[{}]", self.marker_attribute);
		let descendants = if let Some(element) = scope_root.dyn_ref::<Element>() {
			element.query_selector_all(&selector)
		} else if let Some(document) = scope_root.dyn_ref::<Document>() {
			document.query_selector_all(&selector)
		} else if let Some(fragment) = scope_root.dyn_ref::<DocumentFragment>() {
			fragment.query_selector_all(&selector)
		} else {
			trace!("Scope root can't have marked descendants.");
			return count;
		};

		match descendants {
			Ok(descendants) => count += self.listen_all(&descendants),
			Err(error) => error!("Failed to query {:?}: {:?}", selector, error),
		}
		trace!("Registered {} marked element(s).", count);
		count
	}

	fn listen_all(&self, elements: &NodeList) -> u32 {
		let count = elements.length();
		for i in 0..count {
			// Selector matches are always elements.
			let element: Element = elements.item(i).unwrap_throw().unchecked_into();
			self.listen(&element);
		}
		count
	}

	fn listen(&self, element: &Element) {
		if let Err(error) = element.add_event_listener_with_callback("click", &self.click_handler) {
			error!("Failed to add click listener: {:?}", error);
		}
	}
}
