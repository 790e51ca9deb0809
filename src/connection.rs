use crate::{
	apply::PatchApplier,
	config::Config,
	error::{ConnectError, HostError, TransportError},
	events::{EventDispatcher, OutboundEvent},
	session::{FrameReport, PatchSession},
	web::{TemplateParser, WebDom},
};
use core::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use tracing::{debug, error, info, instrument, warn};
use wasm_bindgen::{closure::Closure, JsCast};
use web_sys::{MessageEvent, WebSocket};

/// `Connecting → Open → Closed`. [`Closed`](`ConnectionState::Closed`) is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
	Connecting,
	Open,
	Closed,
}
impl ConnectionState {
	/// Moves from [`Connecting`](`ConnectionState::Connecting`) to [`Open`](`ConnectionState::Open`).
	///
	/// Returns `false` and leaves the state alone from anywhere else.
	pub fn open(&mut self) -> bool {
		match self {
			ConnectionState::Connecting => {
				*self = ConnectionState::Open;
				true
			}
			ConnectionState::Open | ConnectionState::Closed => false,
		}
	}

	/// Returns `false` iff already closed.
	pub fn close(&mut self) -> bool {
		match self {
			ConnectionState::Closed => false,
			ConnectionState::Connecting | ConnectionState::Open => {
				*self = ConnectionState::Closed;
				true
			}
		}
	}

	#[must_use]
	pub fn is_open(self) -> bool {
		self == ConnectionState::Open
	}
}

struct SocketHandlers {
	on_open: Closure<dyn Fn()>,
	on_message: Closure<dyn Fn(MessageEvent)>,
	on_error: Closure<dyn Fn(web_sys::Event)>,
	on_close: Closure<dyn Fn(web_sys::Event)>,
}

/// Owns the WebSocket to the patch server.
///
/// Inbound frames are patched into the document, clicks on marked elements are sent back.
/// There is no reconnection: once [`Closed`](`ConnectionState::Closed`), a new manager has to be connected.
pub struct ConnectionManager {
	socket: WebSocket,
	state: Cell<ConnectionState>,
	session: RefCell<PatchSession<WebDom, TemplateParser>>,
	dispatcher: EventDispatcher,
	#[allow(dead_code)] // Only held so the socket callbacks stay valid.
	handlers: SocketHandlers,
}
impl core::fmt::Debug for ConnectionManager {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		f.debug_struct("ConnectionManager")
			.field("url", &self.socket.url())
			.field("state", &self.state.get())
			.field("dispatcher", &self.dispatcher)
			.finish_non_exhaustive()
	}
}
impl ConnectionManager {
	/// Opens the connection to `config.endpoint` and registers click listeners on the whole document.
	///
	/// # Errors
	///
	/// Iff there is no document or the socket can't be created (e.g. for a malformed endpoint).
	#[instrument(skip(config), fields(endpoint = %config.endpoint))]
	pub fn connect(config: Config) -> Result<Rc<Self>, ConnectError> {
		let document = web_sys::window().ok_or(ConnectError::NoWindow)?.document().ok_or(ConnectError::NoDocument)?;
		let socket = WebSocket::new(&config.endpoint).map_err(HostError::from)?;
		let session = PatchSession::new(WebDom::new(document.clone()), PatchApplier::new(TemplateParser), config.session);

		let manager = Rc::new_cyclic(|weak: &Weak<Self>| {
			let sink = weak.clone();
			let dispatcher = EventDispatcher::new(config.marker_attribute, move |event| {
				if let Some(manager) = sink.upgrade() {
					if let Err(error) = manager.send(&event) {
						error!("Failed to forward click: {}", error);
					}
				}
			});

			let handlers = SocketHandlers {
				on_open: {
					let weak = weak.clone();
					Closure::wrap(Box::new(move || {
						if let Some(manager) = weak.upgrade() {
							manager.opened();
						}
					}) as Box<dyn Fn()>)
				},
				on_message: {
					let weak = weak.clone();
					Closure::wrap(Box::new(move |event: MessageEvent| {
						let manager = match weak.upgrade() {
							Some(manager) => manager,
							None => return,
						};
						match event.data().as_string() {
							Some(frame) => drop(manager.handle_frame(&frame)),
							None => warn!("Ignoring non-text message."),
						}
					}) as Box<dyn Fn(MessageEvent)>)
				},
				on_error: {
					let weak = weak.clone();
					Closure::wrap(Box::new(move |event: web_sys::Event| {
						error!("Transport error: {:?}", event);
						if let Some(manager) = weak.upgrade() {
							manager.close();
						}
					}) as Box<dyn Fn(web_sys::Event)>)
				},
				on_close: {
					let weak = weak.clone();
					Closure::wrap(Box::new(move |_: web_sys::Event| {
						if let Some(manager) = weak.upgrade() {
							if manager.transition(ConnectionState::close) {
								info!("Connection closed by peer.");
							}
						}
					}) as Box<dyn Fn(web_sys::Event)>)
				},
			};
			socket.set_onopen(Some(handlers.on_open.as_ref().unchecked_ref()));
			socket.set_onmessage(Some(handlers.on_message.as_ref().unchecked_ref()));
			socket.set_onerror(Some(handlers.on_error.as_ref().unchecked_ref()));
			socket.set_onclose(Some(handlers.on_close.as_ref().unchecked_ref()));

			Self {
				socket,
				state: Cell::new(ConnectionState::Connecting),
				session: RefCell::new(session),
				dispatcher,
				handlers,
			}
		});

		manager.dispatcher.register_listeners(document.as_ref());
		Ok(manager)
	}

	#[must_use]
	pub fn state(&self) -> ConnectionState {
		self.state.get()
	}

	pub fn dispatcher(&self) -> &EventDispatcher {
		&self.dispatcher
	}

	fn transition(&self, change: fn(&mut ConnectionState) -> bool) -> bool {
		let mut state = self.state.get();
		let changed = change(&mut state);
		self.state.set(state);
		changed
	}

	fn opened(&self) {
		if self.transition(ConnectionState::open) {
			info!("Connection open.");
		} else {
			warn!("Ignoring open signal while {:?}.", self.state());
		}
	}

	/// Decodes `frame` and applies its batches to the document.
	///
	/// Frames arriving after close are dropped.
	#[instrument(skip(self, frame))]
	pub fn handle_frame(&self, frame: &str) -> FrameReport<web_sys::Node> {
		if self.state() == ConnectionState::Closed {
			warn!("Dropping frame received after close.");
			return FrameReport::default();
		}

		let mut report = self.session.borrow_mut().handle_frame(frame);
		for subtree in &report.inserted {
			report.listeners_registered += self.dispatcher.register_listeners(subtree);
		}
		report
	}

	/// Sends `event` as one text message.
	///
	/// # Errors
	///
	/// [`TransportError::NotOpen`] while [`Connecting`](`ConnectionState::Connecting`),
	/// [`TransportError::Closed`] once [`Closed`](`ConnectionState::Closed`).
	/// If the transport rejects the message, the connection is closed for good.
	#[cfg_attr(feature = "dangerous-logging", instrument(skip(self, event), fields(kind = ?event.kind, payload = %event.payload)))]
	#[cfg_attr(not(feature = "dangerous-logging"), instrument(skip(self, event), fields(kind = ?event.kind)))]
	pub fn send(&self, event: &OutboundEvent) -> Result<(), TransportError> {
		match self.state() {
			ConnectionState::Open => (),
			ConnectionState::Closed => return Err(TransportError::Closed),
			state @ ConnectionState::Connecting => return Err(TransportError::NotOpen(state)),
		}
		let message = event.to_json()?;
		if let Err(error) = self.socket.send_with_str(&message) {
			let error = HostError::from(error);
			error!("Send failed, closing the connection: {}", error);
			self.close();
			return Err(error.into());
		}
		debug!("Sent {} byte(s).", message.len());
		Ok(())
	}

	/// Idempotent.
	pub fn close(&self) {
		if self.transition(ConnectionState::close) {
			if let Err(error) = self.socket.close() {
				warn!("Failed to close the socket: {:?}", error);
			}
		}
	}
}
impl Drop for ConnectionManager {
	fn drop(&mut self) {
		self.socket.set_onopen(None);
		self.socket.set_onmessage(None);
		self.socket.set_onerror(None);
		self.socket.set_onclose(None);
		self.close();
	}
}

#[cfg(test)]
mod tests {
	use super::ConnectionState::{self, *};

	#[test]
	fn opens_only_from_connecting() {
		let mut state = Connecting;
		assert!(state.open());
		assert_eq!(state, Open);
		assert!(!state.open());
		assert_eq!(state, Open);
	}

	#[test]
	fn closes_from_anywhere_once() {
		for &start in &[Connecting, Open] {
			let mut state = start;
			assert!(state.close());
			assert_eq!(state, Closed);
			assert!(!state.close());
		}
	}

	#[test]
	fn closed_is_terminal() {
		let mut state = Closed;
		assert!(!state.open());
		assert_eq!(state, ConnectionState::Closed);
		assert!(!state.is_open());
	}
}
