//! Selection tracking for an in-progress answer
//!
//! This module holds the user's choice(s) before submission. Single-answer
//! questions track one optional index; multiple-answer questions track a
//! mapping from answer index to its checkbox state. The mapping is merged
//! one key at a time, so toggling one box never disturbs another.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::question::Mode;

/// One entry of the multiple-answer submission payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerSelection {
    /// Index of the answer option
    pub index: usize,
    /// Whether the option was checked at submission time
    pub checked: bool,
}

/// A raw input event coming from an answer row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputEvent {
    /// A radio button was clicked
    Click {
        /// Index of the clicked answer
        index: usize,
    },
    /// A checkbox value changed
    Change {
        /// Name of the changed input, the answer index in decimal
        name: String,
        /// New checked state of the input
        checked: bool,
    },
}

/// Errors that can occur while updating the selection
#[derive(Error, Serialize, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The answer index does not address an answer of the question
    #[error("answer index {index} is out of range for {count} answers")]
    IndexOutOfRange {
        /// The rejected index
        index: usize,
        /// Number of answers in the question
        count: usize,
    },
    /// The operation belongs to the other answer mode
    #[error("operation requires {expected:?} mode")]
    ModeMismatch {
        /// The mode the operation is meant for
        expected: Mode,
    },
    /// A checkbox name that is not an answer index
    #[error("input name {0:?} is not an answer index")]
    InvalidName(String),
}

/// The user's current, not yet submitted, choice
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Selected answer in single-answer mode, `None` before any click
    Single(Option<usize>),
    /// Checkbox states in multiple-answer mode; an absent key is unchecked
    Multiple(BTreeMap<usize, bool>),
}

impl Selection {
    /// Creates an empty selection for the given mode
    pub fn for_mode(mode: Mode) -> Self {
        match mode {
            Mode::Single => Self::Single(None),
            Mode::Multiple => Self::Multiple(BTreeMap::new()),
        }
    }

    /// Returns the mode this selection belongs to
    pub fn mode(&self) -> Mode {
        match self {
            Self::Single(_) => Mode::Single,
            Self::Multiple(_) => Mode::Multiple,
        }
    }

    /// Replaces the selected answer in single-answer mode
    ///
    /// # Arguments
    ///
    /// * `index` - Index of the chosen answer
    /// * `count` - Number of answers in the question
    ///
    /// # Errors
    ///
    /// Returns `Error::IndexOutOfRange` if `index >= count`, or
    /// `Error::ModeMismatch` when called on a multiple-answer selection.
    pub fn select(&mut self, index: usize, count: usize) -> Result<(), Error> {
        check_index(index, count)?;
        match self {
            Self::Single(selected) => {
                *selected = Some(index);
                Ok(())
            }
            Self::Multiple(_) => Err(Error::ModeMismatch {
                expected: Mode::Single,
            }),
        }
    }

    /// Sets one checkbox state in multiple-answer mode, keeping all others
    ///
    /// # Arguments
    ///
    /// * `index` - Index of the toggled answer
    /// * `checked` - New state of its checkbox
    /// * `count` - Number of answers in the question
    ///
    /// # Errors
    ///
    /// Returns `Error::IndexOutOfRange` if `index >= count`, or
    /// `Error::ModeMismatch` when called on a single-answer selection.
    pub fn toggle(&mut self, index: usize, checked: bool, count: usize) -> Result<(), Error> {
        check_index(index, count)?;
        match self {
            Self::Multiple(checked_by_index) => {
                checked_by_index.insert(index, checked);
                Ok(())
            }
            Self::Single(_) => Err(Error::ModeMismatch {
                expected: Mode::Multiple,
            }),
        }
    }

    /// Applies a raw input event
    ///
    /// Radios only react to clicks and checkboxes only to change events;
    /// the other kind is ignored.
    ///
    /// # Errors
    ///
    /// Propagates the errors of [`Selection::select`] and
    /// [`Selection::toggle`], and returns `Error::InvalidName` when a change
    /// event names something other than an answer index.
    pub fn apply(&mut self, event: &InputEvent, count: usize) -> Result<(), Error> {
        match (self.mode(), event) {
            (Mode::Single, InputEvent::Click { index }) => self.select(*index, count),
            (Mode::Multiple, InputEvent::Change { name, checked }) => {
                let index = name
                    .parse()
                    .map_err(|_| Error::InvalidName(name.clone()))?;
                self.toggle(index, *checked, count)
            }
            _ => Ok(()),
        }
    }

    /// Returns the selected answer in single-answer mode
    pub fn selected_answer(&self) -> Option<usize> {
        match self {
            Self::Single(selected) => *selected,
            Self::Multiple(_) => None,
        }
    }

    /// Whether the checkbox for `index` is currently checked
    pub fn is_checked(&self, index: usize) -> bool {
        match self {
            Self::Single(selected) => *selected == Some(index),
            Self::Multiple(checked_by_index) => {
                checked_by_index.get(&index).copied().unwrap_or(false)
            }
        }
    }

    /// Whether nothing has been selected yet
    ///
    /// A multiple-answer selection whose boxes were all unchecked again is
    /// not empty: its entries are still present.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Single(selected) => selected.is_none(),
            Self::Multiple(checked_by_index) => checked_by_index.is_empty(),
        }
    }

    /// Builds the multiple-answer payload in ascending index order
    ///
    /// Every entry of the mapping is kept, including unchecked ones.
    /// Indices that were never toggled are absent. A single-answer selection
    /// yields its selected index as the only checked entry.
    pub fn to_payload(&self) -> Vec<AnswerSelection> {
        match self {
            Self::Single(selected) => selected
                .iter()
                .map(|&index| AnswerSelection {
                    index,
                    checked: true,
                })
                .collect(),
            Self::Multiple(checked_by_index) => checked_by_index
                .iter()
                .map(|(&index, &checked)| AnswerSelection { index, checked })
                .collect(),
        }
    }
}

fn check_index(index: usize, count: usize) -> Result<(), Error> {
    if index < count {
        Ok(())
    } else {
        Err(Error::IndexOutOfRange { index, count })
    }
}
