//! Answer submission state machine
//!
//! A [`QuestionForm`] holds everything that belongs to one question being
//! answered: the question itself, the user's selection, and the phase of the
//! submission. It moves through the phases in [`Phase`]:
//!
//! ```text
//! Unanswered -> Submitting -> Submitted
//!                   |  ^
//!                   v  |
//!                  Failed
//! ```
//!
//! Nothing moves back to `Unanswered` except replacing the question, which
//! resets every piece of state and gives the form a new [`InstanceId`].
//! Scoring calls are not made here. [`QuestionForm::submit`] hands out a
//! [`Ticket`] describing the call, and the finished [`Outcome`] is fed back
//! through [`QuestionForm::receive`].

use log::{debug, warn};
use serde_with::SerializeDisplay;
use uuid::Uuid;

use crate::{
    feedback::Feedback,
    question::{self, Mode, Question},
    scoring::{self, Outcome, ScoringRequest, ScoringResponse, Ticket},
    selection::{self, InputEvent, Selection},
};

/// Identifies one lifetime of a form, from question load to question change
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, SerializeDisplay, derive_more::Display)]
pub struct InstanceId(Uuid);

impl InstanceId {
    /// Generates a fresh random instance ID
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

/// A submit event coming from the form
///
/// The default action of the event is always suppressed before the form
/// looks at the selection.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SubmitEvent {
    default_prevented: bool,
}

impl SubmitEvent {
    /// Creates a fresh submit event
    pub fn new() -> Self {
        Self::default()
    }

    /// Suppresses the default action of the event
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    /// Whether the default action was suppressed
    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }
}

/// A scoring call that did not succeed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    /// What went wrong
    pub error: scoring::Error,
    /// The call that failed, kept so it can be retried unchanged
    pub ticket: Ticket,
}

/// Where the form is in the submission cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Phase {
    /// Nothing has been submitted yet
    #[default]
    Unanswered,
    /// A scoring call is outstanding
    Submitting,
    /// A scoring response arrived
    Submitted(Feedback),
    /// The last scoring call failed
    Failed(Failure),
}

/// The state of one question being answered
#[derive(Debug, Clone)]
pub struct QuestionForm {
    instance: InstanceId,
    question: Question,
    mode: Mode,
    selection: Selection,
    phase: Phase,
    pending: usize,
}

impl QuestionForm {
    /// Loads a question into a fresh form
    ///
    /// # Errors
    ///
    /// Returns `question::Error::Invalid` if the question fails validation.
    pub fn new(question: Question) -> Result<Self, question::Error> {
        let question = question.validated()?;
        let mode = question.mode();

        Ok(Self {
            instance: InstanceId::generate(),
            question,
            mode,
            selection: Selection::for_mode(mode),
            phase: Phase::Unanswered,
            pending: 0,
        })
    }

    /// Replaces the question, resetting selection and submission state
    ///
    /// Outcomes of calls issued before the replacement are ignored from now on.
    ///
    /// # Errors
    ///
    /// Returns `question::Error::Invalid` if the new question fails
    /// validation, in which case the form is left untouched.
    pub fn replace_question(&mut self, question: Question) -> Result<(), question::Error> {
        *self = Self::new(question)?;
        Ok(())
    }

    /// The question being answered
    pub fn question(&self) -> &Question {
        &self.question
    }

    /// The answer mode, fixed when the question was loaded
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// The identity of this form lifetime
    pub fn instance(&self) -> InstanceId {
        self.instance
    }

    /// The user's current selection
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// The current submission phase
    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    /// Number of scoring calls issued and not yet answered
    pub fn pending(&self) -> usize {
        self.pending
    }

    /// Selects an answer in single-answer mode
    ///
    /// # Errors
    ///
    /// See [`Selection::select`].
    pub fn select_answer(&mut self, index: usize) -> Result<(), selection::Error> {
        self.selection.select(index, self.question.len())
    }

    /// Checks or unchecks an answer in multiple-answer mode
    ///
    /// # Errors
    ///
    /// See [`Selection::toggle`].
    pub fn toggle_answer(&mut self, index: usize, checked: bool) -> Result<(), selection::Error> {
        self.selection.toggle(index, checked, self.question.len())
    }

    /// Applies a raw input event from an answer row
    ///
    /// # Errors
    ///
    /// See [`Selection::apply`].
    pub fn handle_input(&mut self, event: &InputEvent) -> Result<(), selection::Error> {
        self.selection.apply(event, self.question.len())
    }

    /// Whether a scoring response has been received
    pub fn is_submitted(&self) -> bool {
        matches!(self.phase, Phase::Submitted(_))
    }

    /// The received feedback, if any
    pub fn feedback(&self) -> Option<&Feedback> {
        match &self.phase {
            Phase::Submitted(feedback) => Some(feedback),
            _ => None,
        }
    }

    /// Overall correctness of the submission, `false` until one is received
    pub fn is_answer_correct(&self) -> bool {
        self.feedback().is_some_and(Feedback::is_correct)
    }

    /// The submitted answer whose explanation is shown in single-answer mode
    pub fn explanation_idx(&self) -> Option<usize> {
        self.feedback().and_then(Feedback::explanation_idx)
    }

    /// Answers flagged for individual feedback in multiple-answer mode
    pub fn answers_requiring_feedback(&self) -> &[usize] {
        self.feedback()
            .map(Feedback::answers_requiring_feedback)
            .unwrap_or_default()
    }

    /// Handles a submit event
    ///
    /// The event's default action is suppressed first, whatever happens
    /// next. Submitting with an empty selection does nothing. Submitting
    /// again after a response starts a new cycle whose response replaces
    /// the previous feedback.
    ///
    /// # Returns
    ///
    /// The ticket for the scoring call to make, or `None` when nothing is submitted
    pub fn submit(&mut self, event: &mut SubmitEvent) -> Option<Ticket> {
        event.prevent_default();

        if self.selection.is_empty() {
            debug!("ignoring submit of question {} with no selection", self.question.id);
            return None;
        }

        let question_id = self.question.id.clone();
        let request = match &self.selection {
            Selection::Single(selected) => ScoringRequest::Single {
                question_id,
                answer: (*selected)?,
            },
            Selection::Multiple(_) => ScoringRequest::Multiple {
                question_id,
                payload: self.selection.to_payload(),
            },
        };

        Some(self.issue(request))
    }

    /// Re-issues the scoring call that failed
    ///
    /// # Returns
    ///
    /// The ticket to retry, or `None` when the form is not in the failed phase
    pub fn retry(&mut self) -> Option<Ticket> {
        match &self.phase {
            Phase::Failed(failure) => {
                let request = failure.ticket.request.clone();
                debug!("retrying scoring of question {}", self.question.id);
                Some(self.issue(request))
            }
            _ => None,
        }
    }

    fn issue(&mut self, request: ScoringRequest) -> Ticket {
        self.phase = Phase::Submitting;
        self.pending += 1;

        Ticket {
            instance: self.instance,
            request,
        }
    }

    /// Applies a finished scoring call
    ///
    /// Outcomes issued by an earlier lifetime of the form are ignored.
    /// Outcomes are applied in the order they arrive, so a slow response to
    /// an older call can overwrite a newer one.
    ///
    /// # Returns
    ///
    /// `true` if the outcome changed the form, `false` if it was stale
    pub fn receive(&mut self, outcome: Outcome) -> bool {
        let Outcome { ticket, result } = outcome;

        if ticket.instance != self.instance {
            debug!(
                "discarding stale scoring outcome for form {} (current {})",
                ticket.instance, self.instance
            );
            return false;
        }

        self.pending = self.pending.saturating_sub(1);

        let feedback = result.and_then(|response| self.interpret(&ticket.request, response));
        self.phase = match feedback {
            Ok(feedback) => Phase::Submitted(feedback),
            Err(error) => {
                warn!("scoring question {} failed: {error}", self.question.id);
                Phase::Failed(Failure { error, ticket })
            }
        };

        true
    }

    /// Turns a response into feedback for the request it answers
    fn interpret(
        &self,
        request: &ScoringRequest,
        response: ScoringResponse,
    ) -> Result<Feedback, scoring::Error> {
        match (request, response) {
            (ScoringRequest::Single { answer, .. }, ScoringResponse::Single(correct)) => {
                Ok(Feedback::Single {
                    correct,
                    explanation_idx: *answer,
                })
            }
            (ScoringRequest::Multiple { .. }, ScoringResponse::Multiple(result)) => {
                let count = self.question.len();
                if let Some(&index) = result
                    .answers_requiring_feedback
                    .iter()
                    .find(|&&index| index >= count)
                {
                    return Err(scoring::Error::FeedbackIndexOutOfRange { index, count });
                }

                Ok(Feedback::Multiple {
                    correct: result.question_answered_correctly,
                    answers_requiring_feedback: result.answers_requiring_feedback,
                })
            }
            _ => Err(scoring::Error::ResponseMismatch),
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::{
        question::QuestionId,
        scoring::MultipleAnswerResult,
        selection::AnswerSelection,
    };

    fn create_test_question(correct_answers: Vec<usize>) -> Question {
        Question {
            id: QuestionId::new("capitals"),
            question: "Which cities are capitals?".to_string(),
            answers: vec![
                "Paris".into(),
                "Sydney".into(),
                "Ottawa".into(),
                "Zurich".into(),
            ],
            explanations: vec![
                "Capital of France".into(),
                "Canberra is the capital of Australia".into(),
                "Capital of Canada".into(),
                "Bern is the federal city of Switzerland".into(),
            ],
            correct_answers,
            question_explanation: "Large cities are not always capitals.".to_string(),
        }
    }

    fn single_form() -> QuestionForm {
        QuestionForm::new(create_test_question(vec![2])).unwrap()
    }

    fn multiple_form() -> QuestionForm {
        QuestionForm::new(create_test_question(vec![0, 2])).unwrap()
    }

    fn respond(ticket: Ticket, response: impl Into<ScoringResponse>) -> Outcome {
        Outcome {
            ticket,
            result: Ok(response.into()),
        }
    }

    #[test]
    fn test_new_form_is_unanswered() {
        let form = single_form();
        assert_eq!(form.mode(), Mode::Single);
        assert_eq!(form.phase(), &Phase::Unanswered);
        assert!(!form.is_submitted());
        assert!(!form.is_answer_correct());
        assert_eq!(form.explanation_idx(), None);
        assert!(form.answers_requiring_feedback().is_empty());
    }

    #[test]
    fn test_invalid_question_is_rejected() {
        let mut question = create_test_question(vec![2]);
        question.explanations.pop();
        assert!(QuestionForm::new(question).is_err());
    }

    #[test]
    fn test_submit_always_prevents_default() {
        let mut form = single_form();
        let mut event = SubmitEvent::new();

        assert!(form.submit(&mut event).is_none());
        assert!(event.default_prevented());
    }

    #[test]
    fn test_empty_submit_is_a_no_op() {
        let mut single = single_form();
        assert!(single.submit(&mut SubmitEvent::new()).is_none());
        assert_eq!(single.phase(), &Phase::Unanswered);
        assert_eq!(single.pending(), 0);

        let mut multiple = multiple_form();
        assert!(multiple.submit(&mut SubmitEvent::new()).is_none());
        assert_eq!(multiple.phase(), &Phase::Unanswered);
    }

    #[test]
    fn test_single_submission() {
        let mut form = single_form();
        form.select_answer(2).unwrap();

        let ticket = form.submit(&mut SubmitEvent::new()).unwrap();
        assert_eq!(form.phase(), &Phase::Submitting);
        assert!(!form.is_submitted());
        assert_eq!(
            ticket.request,
            ScoringRequest::Single {
                question_id: QuestionId::new("capitals"),
                answer: 2,
            }
        );

        assert!(form.receive(respond(ticket, true)));
        assert!(form.is_submitted());
        assert!(form.is_answer_correct());
        assert_eq!(form.explanation_idx(), Some(2));
        assert_eq!(form.pending(), 0);
    }

    #[test]
    fn test_explanation_follows_submitted_answer_not_live_selection() {
        let mut form = single_form();
        form.select_answer(1).unwrap();
        let ticket = form.submit(&mut SubmitEvent::new()).unwrap();

        form.select_answer(3).unwrap();
        form.receive(respond(ticket, false));

        assert_eq!(form.explanation_idx(), Some(1));
        assert!(!form.is_answer_correct());

        form.select_answer(0).unwrap();
        assert_eq!(form.explanation_idx(), Some(1));
    }

    #[test]
    fn test_multiple_submission() {
        let mut form = multiple_form();
        form.toggle_answer(0, true).unwrap();
        form.toggle_answer(1, true).unwrap();

        let ticket = form.submit(&mut SubmitEvent::new()).unwrap();
        assert_eq!(
            ticket.request,
            ScoringRequest::Multiple {
                question_id: QuestionId::new("capitals"),
                payload: vec![
                    AnswerSelection {
                        index: 0,
                        checked: true
                    },
                    AnswerSelection {
                        index: 1,
                        checked: true
                    },
                ],
            }
        );

        form.receive(respond(
            ticket,
            MultipleAnswerResult {
                question_answered_correctly: false,
                answers_requiring_feedback: vec![1, 2],
            },
        ));

        assert!(form.is_submitted());
        assert!(!form.is_answer_correct());
        assert_eq!(form.answers_requiring_feedback(), &[1, 2]);
        assert_eq!(form.explanation_idx(), None);
    }

    #[test]
    fn test_all_unchecked_is_still_submitted() {
        let mut form = multiple_form();
        for index in 0..4 {
            form.toggle_answer(index, true).unwrap();
            form.toggle_answer(index, false).unwrap();
        }

        let ticket = form.submit(&mut SubmitEvent::new()).unwrap();
        match ticket.request {
            ScoringRequest::Multiple { payload, .. } => {
                assert_eq!(payload.len(), 4);
                assert!(payload.iter().all(|a| !a.checked));
            }
            ScoringRequest::Single { .. } => panic!("expected a multiple-answer request"),
        }
    }

    #[test]
    fn test_resubmit_after_response_starts_new_cycle() {
        let mut form = single_form();
        form.select_answer(0).unwrap();
        let ticket = form.submit(&mut SubmitEvent::new()).unwrap();
        form.receive(respond(ticket, false));
        assert_eq!(form.explanation_idx(), Some(0));

        form.select_answer(2).unwrap();
        let mut event = SubmitEvent::new();
        let second = form.submit(&mut event).unwrap();
        assert!(event.default_prevented());
        assert_eq!(
            second.request,
            ScoringRequest::Single {
                question_id: QuestionId::new("capitals"),
                answer: 2,
            }
        );
        assert_eq!(form.phase(), &Phase::Submitting);

        form.receive(respond(second, true));
        assert!(form.is_answer_correct());
        assert_eq!(form.explanation_idx(), Some(2));
    }

    #[test]
    fn test_resubmit_replaces_flagged_answers_wholesale() {
        let mut form = multiple_form();
        form.toggle_answer(1, true).unwrap();
        let first = form.submit(&mut SubmitEvent::new()).unwrap();
        form.receive(respond(
            first,
            MultipleAnswerResult {
                question_answered_correctly: false,
                answers_requiring_feedback: vec![0, 1, 2],
            },
        ));

        form.toggle_answer(0, true).unwrap();
        form.toggle_answer(1, false).unwrap();
        let second = form.submit(&mut SubmitEvent::new()).unwrap();
        form.receive(respond(
            second,
            MultipleAnswerResult {
                question_answered_correctly: false,
                answers_requiring_feedback: vec![2],
            },
        ));

        assert_eq!(form.answers_requiring_feedback(), &[2]);
    }

    #[test]
    fn test_failure_and_retry() {
        let mut form = single_form();
        form.select_answer(2).unwrap();
        let ticket = form.submit(&mut SubmitEvent::new()).unwrap();

        form.receive(Outcome {
            ticket: ticket.clone(),
            result: Err(scoring::Error::Rejected("offline".into())),
        });
        assert!(matches!(
            form.phase(),
            Phase::Failed(Failure {
                error: scoring::Error::Rejected(_),
                ..
            })
        ));
        assert!(!form.is_submitted());

        form.select_answer(0).unwrap();
        let retried = form.retry().unwrap();
        assert_eq!(retried.request, ticket.request);
        assert_eq!(form.phase(), &Phase::Submitting);

        form.receive(respond(retried, true));
        assert_eq!(form.explanation_idx(), Some(2));
        assert!(form.retry().is_none());
    }

    #[test]
    fn test_mismatched_response_fails() {
        let mut form = single_form();
        form.select_answer(1).unwrap();
        let ticket = form.submit(&mut SubmitEvent::new()).unwrap();

        form.receive(respond(
            ticket,
            MultipleAnswerResult {
                question_answered_correctly: true,
                answers_requiring_feedback: vec![],
            },
        ));
        assert!(matches!(
            form.phase(),
            Phase::Failed(Failure {
                error: scoring::Error::ResponseMismatch,
                ..
            })
        ));
    }

    #[test]
    fn test_flagged_index_out_of_range_fails() {
        let mut form = multiple_form();
        form.toggle_answer(0, true).unwrap();
        let ticket = form.submit(&mut SubmitEvent::new()).unwrap();

        form.receive(respond(
            ticket,
            MultipleAnswerResult {
                question_answered_correctly: false,
                answers_requiring_feedback: vec![1, 7],
            },
        ));
        assert!(matches!(
            form.phase(),
            Phase::Failed(Failure {
                error: scoring::Error::FeedbackIndexOutOfRange { index: 7, count: 4 },
                ..
            })
        ));
    }

    #[test]
    fn test_replace_question_resets_and_discards_stale_outcomes() {
        let mut form = single_form();
        form.select_answer(2).unwrap();
        let ticket = form.submit(&mut SubmitEvent::new()).unwrap();
        let old_instance = form.instance();

        form.replace_question(create_test_question(vec![0, 1]))
            .unwrap();
        assert_ne!(form.instance(), old_instance);
        assert_eq!(form.mode(), Mode::Multiple);
        assert!(form.selection().is_empty());
        assert_eq!(form.phase(), &Phase::Unanswered);

        assert!(!form.receive(respond(ticket, true)));
        assert_eq!(form.phase(), &Phase::Unanswered);
    }

    #[test]
    fn test_second_submit_while_pending() {
        let mut form = multiple_form();
        form.toggle_answer(0, true).unwrap();
        let first = form.submit(&mut SubmitEvent::new()).unwrap();
        form.toggle_answer(2, true).unwrap();
        let second = form.submit(&mut SubmitEvent::new()).unwrap();
        assert_eq!(form.pending(), 2);

        form.receive(respond(
            second,
            MultipleAnswerResult {
                question_answered_correctly: true,
                answers_requiring_feedback: vec![],
            },
        ));
        form.receive(respond(
            first,
            MultipleAnswerResult {
                question_answered_correctly: false,
                answers_requiring_feedback: vec![2],
            },
        ));

        // Responses apply in arrival order.
        assert!(!form.is_answer_correct());
        assert_eq!(form.answers_requiring_feedback(), &[2]);
        assert_eq!(form.pending(), 0);
    }
}
