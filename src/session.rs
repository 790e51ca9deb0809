use crate::{
	apply::PatchApplier,
	config::{FailurePolicy, FrameMode, RescanPolicy, SessionOptions},
	edit::EditBatch,
	error::{ApplyError, ErrorKind},
	frame,
	tree::{DomTree, FragmentParser},
};
use hashbrown::HashMap;
use tracing::{debug, error, instrument, warn};

/// A failure encountered while handling a frame.
#[derive(Debug)]
pub struct Failure {
	/// Index of the batch within its frame. [`None`] for decoding failures, which carry the line number instead.
	pub batch: Option<usize>,
	pub edit: Option<usize>,
	pub error: ApplyError,
}

#[derive(Debug)]
pub struct FrameReport<N> {
	/// Batches whose every edit succeeded.
	pub batches_applied: usize,
	pub edits_applied: usize,
	pub failures: Vec<Failure>,
	/// Roots of new content, collected only with [`RescanPolicy::InsertedSubtrees`].
	pub inserted: Vec<N>,
	/// Marked elements found when rescanning [`inserted`](`FrameReport::inserted`).
	///
	/// [`PatchSession`] leaves this at 0. The caller that owns the listeners fills it in.
	pub listeners_registered: u32,
}
impl<N> Default for FrameReport<N> {
	fn default() -> Self {
		Self {
			batches_applied: 0,
			edits_applied: 0,
			failures: Vec::new(),
			inserted: Vec::new(),
			listeners_registered: 0,
		}
	}
}
impl<N> FrameReport<N> {
	#[must_use]
	pub fn is_clean(&self) -> bool {
		self.failures.is_empty()
	}
}

/// Drives inbound frames through decoding and application against one host tree.
///
/// Failures are logged and tallied, never propagated: the connection outlives any bad edit.
#[derive(Debug)]
pub struct PatchSession<T, P> {
	tree: T,
	applier: PatchApplier<P>,
	options: SessionOptions,
	failure_counts: HashMap<ErrorKind, u64>,
}
impl<T, P> PatchSession<T, P>
where
	T: DomTree,
	P: FragmentParser<T>,
{
	#[must_use]
	pub fn new(tree: T, applier: PatchApplier<P>, options: SessionOptions) -> Self {
		Self {
			tree,
			applier,
			options,
			failure_counts: HashMap::new(),
		}
	}

	pub fn tree(&self) -> &T {
		&self.tree
	}

	pub fn tree_mut(&mut self) -> &mut T {
		&mut self.tree
	}

	#[must_use]
	pub fn options(&self) -> SessionOptions {
		self.options
	}

	/// Failures per kind since this session was created.
	pub fn failure_counts(&self) -> &HashMap<ErrorKind, u64> {
		&self.failure_counts
	}

	#[instrument(skip(self, frame), fields(frame_len = frame.len()))]
	pub fn handle_frame(&mut self, frame: &str) -> FrameReport<T::Node> {
		let mut report = FrameReport::default();
		match self.options.frame_mode {
			FrameMode::Incremental => {
				for (index, batch) in frame::batches(frame).enumerate() {
					match batch {
						Ok(batch) => self.apply_batch(index, &batch, &mut report),
						Err(error) => {
							warn!("Discarding the rest of the frame from batch {} on.", index);
							self.record(&mut report, None, None, error);
						}
					}
				}
			}
			FrameMode::Atomic => match frame::decode(frame) {
				Ok(batches) => {
					for (index, batch) in batches.iter().enumerate() {
						self.apply_batch(index, batch, &mut report);
					}
				}
				Err(error) => {
					warn!("Discarding the whole frame.");
					self.record(&mut report, None, None, error);
				}
			},
		}
		debug!(
			batches = report.batches_applied,
			edits = report.edits_applied,
			failures = report.failures.len(),
			"Frame handled."
		);
		report
	}

	/// Applies `batch` in order, each edit observing the ones before it.
	pub fn apply_batch(&mut self, batch_index: usize, batch: &EditBatch, report: &mut FrameReport<T::Node>) {
		let root = self.tree.root();
		let mut clean = true;
		for (edit_index, record) in batch.iter().enumerate() {
			match self.applier.apply(&mut self.tree, &root, &record.path, &record.edit) {
				Ok(applied) => {
					report.edits_applied += 1;
					if self.options.rescan == RescanPolicy::InsertedSubtrees {
						report.inserted.extend(applied.into_new_subtree());
					}
				}
				Err(error) => {
					#[cfg(feature = "log-paths")]
					error!(path = %record.path, "Edit {} of batch {} failed: {}", edit_index, batch_index, error);
					#[cfg(not(feature = "log-paths"))]
					error!("Edit {} of batch {} failed: {}", edit_index, batch_index, error);

					self.record(report, Some(batch_index), Some(edit_index), error);
					clean = false;
					if self.options.failure_policy == FailurePolicy::AbortBatch {
						let skipped = batch.len() - edit_index - 1;
						if skipped > 0 {
							warn!("Skipping the remaining {} edit(s) of batch {}.", skipped, batch_index);
						}
						break;
					}
				}
			}
		}
		if clean {
			report.batches_applied += 1;
		}
	}

	fn record(&mut self, report: &mut FrameReport<T::Node>, batch: Option<usize>, edit: Option<usize>, error: ApplyError) {
		if let ApplyError::MalformedFrame { .. } = error {
			error!("{}", error);
		}
		*self.failure_counts.entry(error.kind()).or_insert(0) += 1;
		report.failures.push(Failure { batch, edit, error });
	}
}
