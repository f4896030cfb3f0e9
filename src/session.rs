//! Running a question form against a live scoring service
//!
//! A [`Session`] drives one [`QuestionForm`] on a single-threaded event loop.
//! Scoring calls are spawned onto the tokio runtime and never block input:
//! the user may keep clicking while a call is outstanding. Finished calls
//! come back through a channel and are applied by [`Session::settle`].
//!
//! Dropping or closing a session drops the receiving end of that channel,
//! so a response arriving afterwards is discarded instead of reaching a form
//! that no longer exists. A scorer that panics fails the submission it was
//! serving and leaves the session usable.

use std::sync::Arc;

use log::{debug, warn};
use tokio::{sync::mpsc, task::JoinHandle};

use crate::{
    form::{QuestionForm, SubmitEvent},
    question::{self, Question},
    scoring::{self, Outcome, Scorer, Ticket},
    selection::{self, InputEvent},
    view::FormView,
};

/// Trait for sending rendered views to whatever displays the form
///
/// Implementations might patch a DOM, redraw a terminal widget, or push
/// JSON over a socket.
pub trait Tunnel {
    /// Sends the current view of the form
    ///
    /// # Arguments
    ///
    /// * `view` - The view to display
    fn send_view(&self, view: &FormView);
}

/// A question form connected to a scoring service and a display
pub struct Session<S, T> {
    form: QuestionForm,
    scorer: Arc<S>,
    tunnel: T,
    outcome_sender: mpsc::UnboundedSender<Outcome>,
    outcome_receiver: mpsc::UnboundedReceiver<Outcome>,
    in_flight: usize,
    tasks: Vec<JoinHandle<()>>,
}

impl<S: Scorer, T: Tunnel> Session<S, T> {
    /// Starts a session for a question and sends its first view
    ///
    /// # Errors
    ///
    /// Returns `question::Error::Invalid` if the question fails validation.
    pub fn new(question: Question, scorer: Arc<S>, tunnel: T) -> Result<Self, question::Error> {
        let (outcome_sender, outcome_receiver) = mpsc::unbounded_channel();
        let session = Self {
            form: QuestionForm::new(question)?,
            scorer,
            tunnel,
            outcome_sender,
            outcome_receiver,
            in_flight: 0,
            tasks: Vec::new(),
        };
        session.publish();
        Ok(session)
    }

    /// The form driven by this session
    pub fn form(&self) -> &QuestionForm {
        &self.form
    }

    /// The display this session sends views to
    pub fn tunnel(&self) -> &T {
        &self.tunnel
    }

    fn publish(&self) {
        self.tunnel.send_view(&self.form.view());
    }

    /// Selects an answer in single-answer mode
    ///
    /// # Errors
    ///
    /// See [`QuestionForm::select_answer`].
    pub fn select_answer(&mut self, index: usize) -> Result<(), selection::Error> {
        self.form.select_answer(index)?;
        self.publish();
        Ok(())
    }

    /// Checks or unchecks an answer in multiple-answer mode
    ///
    /// # Errors
    ///
    /// See [`QuestionForm::toggle_answer`].
    pub fn toggle_answer(&mut self, index: usize, checked: bool) -> Result<(), selection::Error> {
        self.form.toggle_answer(index, checked)?;
        self.publish();
        Ok(())
    }

    /// Applies a raw input event from an answer row
    ///
    /// # Errors
    ///
    /// See [`QuestionForm::handle_input`].
    pub fn handle_input(&mut self, event: &InputEvent) -> Result<(), selection::Error> {
        self.form.handle_input(event)?;
        self.publish();
        Ok(())
    }

    /// Handles a submit event, starting a scoring call if there is something to submit
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Returns
    ///
    /// `true` if a scoring call was started
    pub fn submit(&mut self, event: &mut SubmitEvent) -> bool {
        let ticket = self.form.submit(event);
        self.start(ticket)
    }

    /// Retries the last failed scoring call
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Returns
    ///
    /// `true` if a scoring call was started
    pub fn retry(&mut self) -> bool {
        let ticket = self.form.retry();
        self.start(ticket)
    }

    fn start(&mut self, ticket: Option<Ticket>) -> bool {
        let Some(ticket) = ticket else {
            return false;
        };

        let scorer = Arc::clone(&self.scorer);
        let request = ticket.request.clone();
        let call = tokio::spawn(async move { request.dispatch(scorer.as_ref()).await });

        let sender = self.outcome_sender.clone();
        let task = tokio::spawn(async move {
            let result = call.await.unwrap_or_else(|err| {
                warn!("scoring task for {} did not finish: {err}", ticket.instance);
                Err(scoring::Error::Rejected(format!("scoring task failed: {err}")))
            });
            if sender.send(Outcome { ticket, result }).is_err() {
                debug!("session closed before the scoring response arrived");
            }
        });

        self.tasks.retain(|task| !task.is_finished());
        self.tasks.push(task);
        self.in_flight += 1;
        self.publish();
        true
    }

    /// Waits for the next scoring call to finish and applies it
    ///
    /// # Returns
    ///
    /// `None` if no call is outstanding, otherwise whether the outcome
    /// changed the form (`false` for outcomes of a replaced question)
    pub async fn settle(&mut self) -> Option<bool> {
        if self.in_flight == 0 {
            return None;
        }

        let outcome = self.outcome_receiver.recv().await?;
        self.in_flight -= 1;
        let applied = self.form.receive(outcome);
        if applied {
            self.publish();
        }
        Some(applied)
    }

    /// Replaces the question, resetting the form
    ///
    /// Calls still outstanding for the old question are left to finish;
    /// their outcomes are ignored when they arrive.
    ///
    /// # Errors
    ///
    /// Returns `question::Error::Invalid` if the new question fails
    /// validation, in which case the session keeps its current question.
    pub fn replace_question(&mut self, question: Question) -> Result<(), question::Error> {
        self.form.replace_question(question)?;
        self.publish();
        Ok(())
    }

    /// Ends the session without waiting for outstanding calls
    ///
    /// The form and the display are dropped at once; responses still on
    /// their way are discarded.
    ///
    /// # Returns
    ///
    /// Handles of the scoring calls that had not finished yet
    pub fn close(self) -> Vec<JoinHandle<()>> {
        let Self { tasks, .. } = self;
        tasks
            .into_iter()
            .filter(|task| !task.is_finished())
            .collect()
    }
}
