/// Where the patch stream comes from.
pub const DEFAULT_ENDPOINT: &str = "ws://localhost:8080/ws";

/// Elements carrying this attribute forward their clicks, with the attribute's value as message.
pub const DEFAULT_MARKER_ATTRIBUTE: &str = "sc-click";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
	pub endpoint: String,
	pub marker_attribute: String,
	pub session: SessionOptions,
}
impl Default for Config {
	fn default() -> Self {
		Self {
			endpoint: DEFAULT_ENDPOINT.to_owned(),
			marker_attribute: DEFAULT_MARKER_ATTRIBUTE.to_owned(),
			session: SessionOptions::default(),
		}
	}
}

/// How a [`PatchSession`](`crate::session::PatchSession`) reacts to failures and new content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionOptions {
	pub failure_policy: FailurePolicy,
	pub frame_mode: FrameMode,
	pub rescan: RescanPolicy,
}

/// Scope of a failed edit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
	/// Skip only the failed edit. Later edits of the same batch still run.
	#[default]
	IsolateEdit,
	/// Skip the rest of the batch the failed edit belongs to. Later batches still run.
	AbortBatch,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FrameMode {
	/// Decode and apply one line at a time.
	/// A malformed line stops the frame, but batches from earlier lines stay applied.
	#[default]
	Incremental,
	/// Decode every line before applying any. A malformed line discards the whole frame.
	Atomic,
}

/// Whether click listeners are registered on content that patches insert.
///
/// Without a rescan, new marker elements stay inert until something registers them explicitly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RescanPolicy {
	#[default]
	Never,
	InsertedSubtrees,
}
