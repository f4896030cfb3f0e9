//! Feedback derived from a scoring response
//!
//! Whether an answer row shows its explanation is never stored per row. It
//! is recomputed from the stored [`Feedback`] every time it is asked for.

use serde::Serialize;

/// Whether `index` is one of the answers flagged for individual feedback
pub fn is_feedback_required(answers_requiring_feedback: &[usize], index: usize) -> bool {
    answers_requiring_feedback.contains(&index)
}

/// Result of a completed submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Feedback {
    /// Outcome of a single-answer submission
    Single {
        /// Whether the submitted answer is the correct one
        correct: bool,
        /// The submitted answer, whose explanation is shown
        explanation_idx: usize,
    },
    /// Outcome of a multiple-answer submission
    Multiple {
        /// Whether the whole answer set was judged correct
        correct: bool,
        /// Answers whose explanations are shown, regardless of `correct`
        answers_requiring_feedback: Vec<usize>,
    },
}

impl Feedback {
    /// Overall correctness of the submission
    pub fn is_correct(&self) -> bool {
        match self {
            Self::Single { correct, .. } | Self::Multiple { correct, .. } => *correct,
        }
    }

    /// The answer whose explanation is shown in single-answer mode
    pub fn explanation_idx(&self) -> Option<usize> {
        match self {
            Self::Single {
                explanation_idx, ..
            } => Some(*explanation_idx),
            Self::Multiple { .. } => None,
        }
    }

    /// The answers flagged for individual feedback in multiple-answer mode
    pub fn answers_requiring_feedback(&self) -> &[usize] {
        match self {
            Self::Single { .. } => &[],
            Self::Multiple {
                answers_requiring_feedback,
                ..
            } => answers_requiring_feedback,
        }
    }

    /// Whether the answer row at `index` shows its explanation
    ///
    /// In single-answer mode exactly the submitted answer does. In
    /// multiple-answer mode every flagged answer does.
    pub fn shows_explanation(&self, index: usize) -> bool {
        match self {
            Self::Single {
                explanation_idx, ..
            } => *explanation_idx == index,
            Self::Multiple {
                answers_requiring_feedback,
                ..
            } => is_feedback_required(answers_requiring_feedback, index),
        }
    }
}
