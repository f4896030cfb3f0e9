//! Quiz question data model
//!
//! A [`Question`] is supplied from outside and stays immutable for the
//! lifetime of the form showing it. It is validated once, when it is loaded,
//! and its [`Mode`] is decided at that point from the number of correct
//! answers.

use std::{collections::HashSet, fmt::Display};

use garde::Validate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::question::{
    MAX_ANSWER_COUNT, MAX_ANSWER_LENGTH, MAX_EXPLANATION_LENGTH, MAX_TEXT_LENGTH,
};

/// Opaque identifier used to address the scoring service
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionId(String);

impl QuestionId {
    /// Creates an identifier from any string-like value
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for QuestionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// How answers are collected for a question
///
/// The mode is chosen once per question and never re-evaluated while the
/// question is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    /// Exactly one correct answer, picked with mutually exclusive radios
    Single,
    /// More than one correct answer, picked with independent checkboxes
    Multiple,
}

impl Mode {
    /// Derives the mode from the list of correct answer indices
    ///
    /// # Arguments
    ///
    /// * `correct_answers` - Indices of the correct answers
    ///
    /// # Returns
    ///
    /// `Mode::Multiple` when more than one answer is correct, `Mode::Single` otherwise
    pub fn of(correct_answers: &[usize]) -> Self {
        if correct_answers.len() > 1 {
            Self::Multiple
        } else {
            Self::Single
        }
    }
}

type ValidationResult = garde::Result;

/// Checks that every answer has exactly one explanation
fn validate_aligned(explanations: &[String], answer_count: usize) -> ValidationResult {
    if explanations.len() == answer_count {
        Ok(())
    } else {
        Err(garde::Error::new(format!(
            "expected {answer_count} explanations, found {}",
            explanations.len()
        )))
    }
}

/// Checks that correct answer indices address existing answers and are unique
fn validate_correct_answers(correct_answers: &[usize], answer_count: usize) -> ValidationResult {
    if let Some(index) = correct_answers.iter().find(|&&i| i >= answer_count) {
        return Err(garde::Error::new(format!(
            "correct answer {index} is outside of [0,{answer_count})"
        )));
    }

    let mut seen = HashSet::new();
    match correct_answers.iter().find(|&&i| !seen.insert(i)) {
        Some(index) => Err(garde::Error::new(format!(
            "correct answer {index} is listed more than once"
        ))),
        None => Ok(()),
    }
}

/// A single quiz question with its answers and explanations
///
/// Answer identity is the position in `answers`; `explanations` is aligned
/// with it index for index.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    /// Identifier passed to the scoring service
    #[garde(skip)]
    pub id: QuestionId,
    /// The question text shown as the form heading
    #[garde(length(chars, max = MAX_TEXT_LENGTH))]
    pub question: String,
    /// Answer options in display order
    #[garde(length(min = 1, max = MAX_ANSWER_COUNT), inner(length(chars, max = MAX_ANSWER_LENGTH)))]
    pub answers: Vec<String>,
    /// One explanation per answer option
    #[garde(
        inner(length(chars, max = MAX_EXPLANATION_LENGTH)),
        custom(|v, _| validate_aligned(v, self.answers.len()))
    )]
    pub explanations: Vec<String>,
    /// Indices of the correct answers; more than one switches to multiple-answer mode
    #[garde(
        length(min = 1),
        custom(|v, _| validate_correct_answers(v, self.answers.len()))
    )]
    pub correct_answers: Vec<usize>,
    /// Explanation for the question as a whole, shown after submission
    #[garde(length(chars, max = MAX_EXPLANATION_LENGTH))]
    pub question_explanation: String,
}

/// Errors raised when loading a question
#[derive(Error, Debug)]
pub enum Error {
    /// The question failed validation
    #[error("invalid question: {0}")]
    Invalid(#[from] garde::Report),
}

impl Question {
    /// Returns the answer mode of this question
    pub fn mode(&self) -> Mode {
        Mode::of(&self.correct_answers)
    }

    /// Number of answer options
    pub fn len(&self) -> usize {
        self.answers.len()
    }

    /// Whether the question has no answer options
    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    /// Validates the question, handing it back on success
    ///
    /// # Errors
    ///
    /// Returns `Error::Invalid` with the full validation report if any
    /// field is out of bounds or the indices do not line up with the answers.
    pub fn validated(self) -> Result<Self, Error> {
        self.validate()?;
        Ok(self)
    }
}
