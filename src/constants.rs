//! Configuration constants for question forms
//!
//! This module contains the limits enforced when a question is loaded into a
//! form, and the fixed markup names the rendered form uses.

/// Question content limits
pub mod question {
    /// Maximum length of the question text in characters
    pub const MAX_TEXT_LENGTH: usize = 1000;
    /// Maximum number of answer options for a single question
    pub const MAX_ANSWER_COUNT: usize = 16;
    /// Maximum length of a single answer option
    pub const MAX_ANSWER_LENGTH: usize = 500;
    /// Maximum length of an explanation, per answer or for the whole question
    pub const MAX_EXPLANATION_LENGTH: usize = 4000;
}

/// Names used by the rendered form controls
pub mod markup {
    /// Prefix of each answer row's element id, followed by the answer index
    pub const ANSWER_ID_PREFIX: &str = "answer-";
    /// Shared name of the radio group in single-answer mode
    pub const RADIO_GROUP_NAME: &str = "answer";
    /// Label of the submit button
    pub const SUBMIT_LABEL: &str = "Submit";
}
