use crate::{connection::ConnectionState, path::NotFound};
use thiserror::Error;
use wasm_bindgen::{JsCast, JsValue};

/// A failed operation on the host document, usually a JavaScript exception like `HierarchyRequestError`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("host DOM operation failed: {message}")]
pub struct HostError {
	message: String,
}
impl HostError {
	#[must_use]
	pub fn new(message: impl Into<String>) -> Self {
		Self { message: message.into() }
	}

	#[must_use]
	pub fn message(&self) -> &str {
		&self.message
	}
}
impl From<JsValue> for HostError {
	fn from(value: JsValue) -> Self {
		let message = value
			.dyn_ref::<js_sys::Error>()
			.map(|error| String::from(error.message()))
			.or_else(|| value.as_string())
			.unwrap_or_else(|| format!("{:?}", value));
		Self { message }
	}
}

/// Why a single edit (or a whole frame line) could not be applied.
///
/// None of these are fatal to the connection. The affected part of the document just stays stale.
#[derive(Debug, Error)]
pub enum ApplyError {
	#[error("no node at index path: {0}")]
	BadPath(#[from] NotFound),

	#[error("markup parsed to zero root nodes")]
	EmptyFragment,

	#[error("child index {index} is out of range for {len} child node(s)")]
	IndexOutOfRange { index: i64, len: usize },

	#[error("frame line {line} is not a valid edit batch: {source}")]
	MalformedFrame {
		line: usize,
		#[source]
		source: serde_json::Error,
	},

	#[error(transparent)]
	Host(#[from] HostError),
}
impl ApplyError {
	#[must_use]
	pub fn kind(&self) -> ErrorKind {
		match self {
			ApplyError::BadPath(_) => ErrorKind::BadPath,
			ApplyError::EmptyFragment => ErrorKind::EmptyFragment,
			ApplyError::IndexOutOfRange { .. } => ErrorKind::IndexOutOfRange,
			ApplyError::MalformedFrame { .. } => ErrorKind::MalformedFrame,
			ApplyError::Host(_) => ErrorKind::Host,
		}
	}
}

/// Fieldless mirror of [`ApplyError`], used to tally failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
	BadPath,
	EmptyFragment,
	IndexOutOfRange,
	MalformedFrame,
	Host,
}

/// Outbound failures. A failed send closes the connection for good.
#[derive(Debug, Error)]
pub enum TransportError {
	/// Still [`Connecting`](`ConnectionState::Connecting`).
	#[error("connection is not open (currently {0:?})")]
	NotOpen(ConnectionState),

	#[error("connection is closed")]
	Closed,

	#[error("failed to encode outbound event: {0}")]
	Encode(#[from] serde_json::Error),

	#[error(transparent)]
	Host(#[from] HostError),
}

#[derive(Debug, Error)]
pub enum ConnectError {
	#[error("no global `window` available")]
	NoWindow,

	#[error("the window has no document")]
	NoDocument,

	#[error("failed to open the connection: {0}")]
	Host(#[from] HostError),
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn kinds_follow_variants() {
		assert_eq!(ApplyError::EmptyFragment.kind(), ErrorKind::EmptyFragment);
		assert_eq!(ApplyError::IndexOutOfRange { index: 3, len: 1 }.kind(), ErrorKind::IndexOutOfRange);
		assert_eq!(ApplyError::from(HostError::new("nope")).kind(), ErrorKind::Host);

		let source = serde_json::from_str::<u8>("{").unwrap_err();
		assert_eq!(ApplyError::MalformedFrame { line: 0, source }.kind(), ErrorKind::MalformedFrame);
	}

	#[test]
	fn messages() {
		assert_eq!(
			ApplyError::IndexOutOfRange { index: 5, len: 2 }.to_string(),
			"child index 5 is out of range for 2 child node(s)"
		);
		assert_eq!(TransportError::NotOpen(ConnectionState::Connecting).to_string(), "connection is not open (currently Connecting)");
		assert_eq!(TransportError::Closed.to_string(), "connection is closed");
	}
}
