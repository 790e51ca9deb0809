//! Inbound frames: newline-separated JSON arrays of edit records, one [`EditBatch`] per line.

use crate::{edit::EditBatch, error::ApplyError};
use core::{iter::Enumerate, str::Split};
use tracing::trace;

/// Decodes a single (already trimmed, non-empty) line.
///
/// A JSON `null` line is an empty batch.
///
/// # Errors
///
/// [`ApplyError::MalformedFrame`] iff `line` isn't a JSON array of valid edit records.
pub fn decode_line(line_number: usize, line: &str) -> Result<EditBatch, ApplyError> {
	serde_json::from_str::<Option<EditBatch>>(line)
		.map(Option::unwrap_or_default)
		.map_err(|source| ApplyError::MalformedFrame { line: line_number, source })
}

/// Lazily decodes `frame` line by line. Blank lines are skipped.
///
/// After the first malformed line has been yielded as error, the iterator is exhausted.
#[must_use]
pub fn batches(frame: &str) -> Batches<'_> {
	Batches {
		lines: frame.split('\n').enumerate(),
		failed: false,
	}
}

/// Decodes all of `frame` at once.
///
/// # Errors
///
/// [`ApplyError::MalformedFrame`] for the first malformed line. No batches are returned in that case.
pub fn decode(frame: &str) -> Result<Vec<EditBatch>, ApplyError> {
	batches(frame).collect()
}

#[derive(Debug, Clone)]
pub struct Batches<'a> {
	lines: Enumerate<Split<'a, char>>,
	failed: bool,
}
impl<'a> Iterator for Batches<'a> {
	type Item = Result<EditBatch, ApplyError>;

	fn next(&mut self) -> Option<Self::Item> {
		if self.failed {
			return None;
		}
		for (line_number, line) in &mut self.lines {
			let line = line.trim();
			if line.is_empty() {
				continue;
			}
			let batch = decode_line(line_number, line);
			match &batch {
				Ok(batch) => trace!(line_number, edits = batch.len(), "Decoded batch."),
				Err(_) => self.failed = true,
			}
			return Some(batch);
		}
		None
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::edit::Edit;

	const REMOVE_FIRST: &str = r#"[{"IPath":[0],"InsertNode":null,"Rmnode":0}]"#;

	#[test]
	fn blank_lines_contribute_nothing() {
		assert!(decode("").unwrap().is_empty());
		assert!(decode("\n \n\t\r\n").unwrap().is_empty());
	}

	#[test]
	fn two_lines_two_batches_in_order() {
		let frame = format!("{}\n[{{\"IPath\":[1],\"Rmnode\":5}}]\n", REMOVE_FIRST);
		let batches = decode(&frame).unwrap();
		assert_eq!(batches.len(), 2);
		assert_eq!(batches[0].iter().next().unwrap().edit, Edit::Remove { at_index: 0 });
		assert_eq!(batches[1].iter().next().unwrap().edit, Edit::Remove { at_index: 5 });
	}

	#[test]
	fn surrounding_blank_lines() {
		let frame = "\n[{\"IPath\":[],\"InsertNode\":{\"Html\":\"<span>x</span>\",\"Index\":5},\"Rmnode\":null}]\n";
		let batches = decode(frame).unwrap();
		assert_eq!(batches.len(), 1);
		assert_eq!(
			batches[0].iter().next().unwrap().edit,
			Edit::Insert {
				at_index: 5,
				markup: "<span>x</span>".to_owned()
			}
		);
	}

	#[test]
	fn null_and_empty_lines_are_empty_batches() {
		let batches = decode("null\n[]").unwrap();
		assert_eq!(batches.len(), 2);
		assert!(batches.iter().all(EditBatch::is_empty));
	}

	#[test]
	fn malformed_line_fails_whole_decode() {
		let frame = format!("{}\n[{{\"IPath\":\n{}", REMOVE_FIRST, REMOVE_FIRST);
		match decode(&frame) {
			Err(ApplyError::MalformedFrame { line, .. }) => assert_eq!(line, 1),
			other => panic!("expected MalformedFrame, got {:?}", other),
		}
	}

	#[test]
	fn incremental_decoding_keeps_earlier_batches() {
		let frame = format!("{}\nnot json\n{}", REMOVE_FIRST, REMOVE_FIRST);
		let mut batches = batches(&frame);
		assert!(batches.next().unwrap().is_ok());
		assert!(matches!(batches.next(), Some(Err(ApplyError::MalformedFrame { line: 1, .. }))));
		assert!(batches.next().is_none());
	}
}
