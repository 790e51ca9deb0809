//! Page-load activation.

use crate::{
	config::Config,
	connection::ConnectionManager,
	error::{ConnectError, HostError},
};
use core::cell::RefCell;
use std::rc::Rc;
use tracing::{error, info};
use wasm_bindgen::{closure::Closure, prelude::wasm_bindgen, JsCast, JsValue};

thread_local! {
	static LIVE_CONNECTION: RefCell<Option<Rc<ConnectionManager>>> = RefCell::new(None);
}

/// Connects with [`Config::default`] once the page has loaded.
///
/// # Errors
///
/// Iff activation fails immediately. Failures after waiting for `load` are only logged.
#[wasm_bindgen]
pub fn start() -> Result<(), JsValue> {
	start_with(Config::default()).map_err(|error| JsValue::from_str(&error.to_string()))
}

/// Connects with `config` once the page has loaded, or right away if it already has.
///
/// The connection is kept alive until replaced by another activation.
///
/// # Errors
///
/// Iff there is no document, or connecting right away fails.
pub fn start_with(config: Config) -> Result<(), ConnectError> {
	install_console_subscriber();

	let window = web_sys::window().ok_or(ConnectError::NoWindow)?;
	let document = window.document().ok_or(ConnectError::NoDocument)?;
	if document.ready_state() == "complete" {
		return activate(config);
	}

	let on_load = Closure::once_into_js(move || {
		if let Err(error) = activate(config) {
			error!("Failed to connect after page load: {}", error);
		}
	});
	window
		.add_event_listener_with_callback("load", on_load.unchecked_ref())
		.map_err(HostError::from)?;
	info!("Waiting for the page to load.");
	Ok(())
}

#[cfg(feature = "console-log")]
fn install_console_subscriber() {
	if let Err(error) = tracing_wasm::try_set_as_global_default() {
		tracing::debug!("Keeping the existing subscriber: {}", error);
	}
}

#[cfg(not(feature = "console-log"))]
fn install_console_subscriber() {}

fn activate(config: Config) -> Result<(), ConnectError> {
	let manager = ConnectionManager::connect(config)?;
	let previous = LIVE_CONNECTION.with(|slot| slot.borrow_mut().replace(manager));
	if let Some(previous) = previous {
		previous.close();
	}
	Ok(())
}

/// The connection activated by [`start`] or [`start_with`], if any.
#[must_use]
pub fn live_connection() -> Option<Rc<ConnectionManager>> {
	LIVE_CONNECTION.with(|slot| slot.borrow().clone())
}
