//! Target selection syntax: `0` for all, `N` for one, `N,M,K` for several.
//!
//! Indices are 1-based into the candidate list currently on screen. A
//! single bad index rejects the whole selection.

use crate::domain::errors::InputError;
use std::collections::HashSet;

/// Parsed selection, not yet checked against a candidate list
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    All,
    Indices(Vec<usize>),
}

impl Selection {
    pub fn parse(input: &str) -> Result<Self, InputError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(InputError::Empty);
        }
        if input == "0" {
            return Ok(Selection::All);
        }

        let mut indices = Vec::new();
        let mut seen = HashSet::new();
        for part in input.split(',') {
            let part = part.trim();
            if part.is_empty() {
                return Err(InputError::MalformedSelection(input.to_string()));
            }
            let index: usize = part
                .parse()
                .map_err(|_| InputError::MalformedSelection(input.to_string()))?;
            if index == 0 {
                // "0" only means "all" on its own
                return Err(InputError::MalformedSelection(input.to_string()));
            }
            if !seen.insert(index) {
                return Err(InputError::DuplicateIndex(index));
            }
            indices.push(index);
        }

        Ok(Selection::Indices(indices))
    }

    /// Pick the selected candidates, keeping the order they were typed in
    pub fn apply<T: Clone>(&self, candidates: &[T]) -> Result<Vec<T>, InputError> {
        match self {
            Selection::All => Ok(candidates.to_vec()),
            Selection::Indices(indices) => indices
                .iter()
                .map(|&index| {
                    candidates
                        .get(index - 1)
                        .cloned()
                        .ok_or(InputError::OutOfRange {
                            value: index,
                            min: 1,
                            max: candidates.len(),
                        })
                })
                .collect(),
        }
    }
}

/// Parse and apply in one step
pub fn select<T: Clone>(input: &str, candidates: &[T]) -> Result<Vec<T>, InputError> {
    Selection::parse(input)?.apply(candidates)
}
