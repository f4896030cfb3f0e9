//! Scoring service contract
//!
//! This module defines the trait through which a form reaches the service
//! that decides correctness, along with the requests and responses that
//! travel through it. Requests are captured when the user submits and are
//! carried, unchanged, to the code that applies the response.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{form::InstanceId, question::QuestionId, selection::AnswerSelection};

/// Errors reported by, or about, the scoring service
#[derive(Error, Serialize, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The service call failed
    #[error("scoring request failed: {0}")]
    Rejected(String),
    /// The response does not belong to the kind of request that was sent
    #[error("scoring response does not match the request")]
    ResponseMismatch,
    /// The service flagged an answer the question does not have
    #[error("answer {index} flagged for feedback is out of range for {count} answers")]
    FeedbackIndexOutOfRange {
        /// The flagged index
        index: usize,
        /// Number of answers in the question
        count: usize,
    },
}

/// Response of the multiple-answer check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultipleAnswerResult {
    /// Whether the answer set as a whole is correct
    pub question_answered_correctly: bool,
    /// Answers whose explanations should be shown
    pub answers_requiring_feedback: Vec<usize>,
}

/// Trait for the service that scores submitted answers
///
/// Implementations might call a remote API or consult a local answer key.
/// Both operations are asynchronous and may fail.
pub trait Scorer: Send + Sync + 'static {
    /// Checks a single-answer submission
    ///
    /// # Arguments
    ///
    /// * `question_id` - The question being answered
    /// * `answer` - Index of the submitted answer
    fn is_answer_correct(
        &self,
        question_id: &QuestionId,
        answer: usize,
    ) -> impl Future<Output = Result<bool, Error>> + Send;

    /// Checks a multiple-answer submission
    ///
    /// # Arguments
    ///
    /// * `question_id` - The question being answered
    /// * `payload` - Checkbox states in ascending index order
    fn is_multiple_answers_correct(
        &self,
        question_id: &QuestionId,
        payload: &[AnswerSelection],
    ) -> impl Future<Output = Result<MultipleAnswerResult, Error>> + Send;
}

/// A scoring call, captured at the moment the user submitted
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ScoringRequest {
    /// Single-answer check
    Single {
        /// The question being answered
        question_id: QuestionId,
        /// The submitted answer
        answer: usize,
    },
    /// Multiple-answer check
    Multiple {
        /// The question being answered
        question_id: QuestionId,
        /// The submitted checkbox states
        payload: Vec<AnswerSelection>,
    },
}

/// What the scoring service answered
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_more::From)]
pub enum ScoringResponse {
    /// Correctness of a single submitted answer
    Single(bool),
    /// Correctness of a submitted answer set
    Multiple(MultipleAnswerResult),
}

impl ScoringRequest {
    /// Sends this request to the scoring service
    ///
    /// # Errors
    ///
    /// Returns whatever error the service reports.
    pub async fn dispatch<S: Scorer>(&self, scorer: &S) -> Result<ScoringResponse, Error> {
        match self {
            Self::Single {
                question_id,
                answer,
            } => scorer
                .is_answer_correct(question_id, *answer)
                .await
                .map(ScoringResponse::from),
            Self::Multiple {
                question_id,
                payload,
            } => scorer
                .is_multiple_answers_correct(question_id, payload)
                .await
                .map(ScoringResponse::from),
        }
    }
}

/// A request tagged with the form instance that issued it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ticket {
    /// The issuing form instance
    pub instance: InstanceId,
    /// The captured request
    pub request: ScoringRequest,
}

/// A finished scoring call, ready to be applied to its form
#[derive(Debug, Clone)]
pub struct Outcome {
    /// The ticket the call was made for
    pub ticket: Ticket,
    /// The service's answer
    pub result: Result<ScoringResponse, Error>,
}

impl Ticket {
    /// Runs the scoring call for this ticket and wraps up the result
    pub async fn run<S: Scorer>(self, scorer: &S) -> Outcome {
        let result = self.request.dispatch(scorer).await;
        Outcome {
            ticket: self,
            result,
        }
    }
}
