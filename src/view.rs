//! Declarative view of a question form
//!
//! A [`FormView`] is everything a renderer needs to draw the form: the
//! heading, one row per answer, and the feedback that becomes visible once a
//! response has been received. It is computed from the form on demand and
//! never stored, so it cannot drift from the state it describes.

use itertools::Itertools;
use serde::Serialize;
use serde_with::skip_serializing_none;

use crate::{
    constants::markup::{ANSWER_ID_PREFIX, RADIO_GROUP_NAME, SUBMIT_LABEL},
    feedback::Feedback,
    form::{Failure, Phase, QuestionForm},
    question::Mode,
};

/// An explanation attached to an answer row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Explanation {
    /// Correctness the explanation is annotated with
    pub correct: bool,
    /// The explanation text
    pub text: String,
}

/// One answer row of the form
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum AnswerRow {
    /// A checkbox row, used in multiple-answer mode
    Checkbox {
        /// Element id of the input
        id: String,
        /// Input name, the answer index
        name: String,
        /// The answer text
        label: String,
        /// Whether the box is checked
        checked: bool,
        /// Explanation shown under the answer, if any
        explanation: Option<Explanation>,
    },
    /// A radio row, used in single-answer mode
    Radio {
        /// Element id of the input
        id: String,
        /// Radio group name, shared by all rows
        name: String,
        /// The answer text
        label: String,
        /// Whether this radio is the selected one
        selected: bool,
        /// Explanation shown under the answer, if any
        explanation: Option<Explanation>,
    },
}

impl AnswerRow {
    /// The explanation shown under this row, if any
    pub fn explanation(&self) -> Option<&Explanation> {
        match self {
            Self::Checkbox { explanation, .. } | Self::Radio { explanation, .. } => {
                explanation.as_ref()
            }
        }
    }
}

/// A scoring failure shown to the user, with the option to retry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorView {
    /// Human readable description of the failure
    pub message: String,
    /// Whether a retry is offered
    pub retry: bool,
}

/// Everything needed to render a question form
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormView {
    /// The question heading
    pub question: String,
    /// One row per answer, in answer order
    pub rows: Vec<AnswerRow>,
    /// Label of the submit button
    pub submit_label: String,
    /// Overall correctness, once a response has been received
    pub feedback: Option<bool>,
    /// Explanation for the whole question, once a response has been received
    pub question_explanation: Option<String>,
    /// The last scoring failure, if the form is in the failed phase
    pub error: Option<ErrorView>,
    /// Whether a scoring call is outstanding
    pub pending: bool,
}

impl FormView {
    /// Converts the view to a JSON string for a renderer
    ///
    /// # Panics
    ///
    /// This method panics if serialization fails, which should never happen
    /// with the default JSON serializer for well-formed data.
    pub fn to_message(&self) -> String {
        serde_json::to_string(self).expect("default serializer cannot fail")
    }
}

/// Element id of the answer row at `index`
pub fn answer_id(index: usize) -> String {
    format!("{ANSWER_ID_PREFIX}{index}")
}

impl QuestionForm {
    /// Builds the view of the form in its current state
    pub fn view(&self) -> FormView {
        let question = self.question();
        let feedback = self.feedback();

        let rows = question
            .answers
            .iter()
            .zip_eq(&question.explanations)
            .enumerate()
            .map(|(index, (answer, explanation))| {
                self.answer_row(index, answer, explanation, feedback)
            })
            .collect_vec();

        FormView {
            question: question.question.clone(),
            rows,
            submit_label: SUBMIT_LABEL.to_string(),
            feedback: feedback.map(Feedback::is_correct),
            question_explanation: feedback.map(|_| question.question_explanation.clone()),
            error: match self.phase() {
                Phase::Failed(Failure { error, .. }) => Some(ErrorView {
                    message: error.to_string(),
                    retry: true,
                }),
                _ => None,
            },
            pending: self.pending() > 0,
        }
    }

    fn answer_row(
        &self,
        index: usize,
        answer: &str,
        explanation: &str,
        feedback: Option<&Feedback>,
    ) -> AnswerRow {
        let explanation = feedback
            .filter(|feedback| feedback.shows_explanation(index))
            .map(|feedback| Explanation {
                correct: match self.mode() {
                    Mode::Single => feedback.is_correct(),
                    Mode::Multiple => false,
                },
                text: explanation.to_string(),
            });

        match self.mode() {
            Mode::Multiple => AnswerRow::Checkbox {
                id: answer_id(index),
                name: index.to_string(),
                label: answer.to_string(),
                checked: self.selection().is_checked(index),
                explanation,
            },
            Mode::Single => AnswerRow::Radio {
                id: answer_id(index),
                name: RADIO_GROUP_NAME.to_string(),
                label: answer.to_string(),
                selected: self.selection().selected_answer() == Some(index),
                explanation,
            },
        }
    }
}
