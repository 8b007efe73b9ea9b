use std::sync::Arc;

use chrono::Utc;
use rand::Rng;
use tracing::info;

use quizdoc::Document;

use crate::answers::{ClozeKey, QuestionIndex, VocabKey};
use crate::attempt::Attempt;
use crate::error::SessionError;
use crate::report::{Receipt, Respondent, ScoreReport};
use crate::scoring::Scores;
use crate::session::{Recorded, Session};
use crate::submission::{
    Dispatch, Resolution, SubmissionCoordinator, SubmissionStatus, Ticket, Transport, TransportError,
    Trigger,
};

/// A running quiz: the authored document plus the current session and the
/// state of its score submission.
pub struct Quiz<R: Rng> {
    document: Arc<Document>,
    rng: R,
    session: Session,
    coordinator: SubmissionCoordinator,
    respondent: Option<Respondent>,
}

/// The result of a successful check.
#[derive(Debug, Clone, PartialEq)]
pub struct Checked {
    pub scores: Scores,
    /// The automatic submission, if one should be sent now.
    pub dispatch: Dispatch,
}

impl<R: Rng> Quiz<R> {
    pub fn new(document: Arc<Document>, endpoint: Option<String>, mut rng: R) -> Self {
        let attempt = Attempt::generate(&document, &mut rng);
        Quiz {
            document,
            rng,
            session: Session::new(attempt, 0),
            coordinator: SubmissionCoordinator::new(endpoint),
            respondent: None,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn respondent(&self) -> Option<&Respondent> {
        self.respondent.as_ref()
    }

    pub fn submission_status(&self) -> &SubmissionStatus {
        self.coordinator.status()
    }

    pub fn set_endpoint(&mut self, endpoint: Option<String>) {
        self.coordinator.set_endpoint(endpoint);
    }

    /// Pass the gate: the attempt becomes visible and answers are accepted.
    pub fn unlock(&mut self, respondent: Respondent) -> Result<(), SessionError> {
        if respondent.name.trim().is_empty() {
            return Err(SessionError::MissingRespondent);
        }
        self.session.unlock()?;
        self.respondent = Some(respondent);
        Ok(())
    }

    pub fn answer_question(&mut self, index: QuestionIndex, option: impl Into<String>) -> Result<Recorded, SessionError> {
        self.session.answer_question(index, option)
    }

    pub fn choose_definition(&mut self, key: VocabKey, definition: impl Into<String>) -> Result<Recorded, SessionError> {
        self.session.choose_definition(key, definition)
    }

    pub fn fill_blank(&mut self, key: ClozeKey, text: impl Into<String>) -> Result<Recorded, SessionError> {
        self.session.fill_blank(key, text)
    }

    /// Check the session and start the automatic submission.
    pub fn check(&mut self) -> Result<Checked, SessionError> {
        let scores = self.session.check()?;
        let dispatch = self.dispatch(Trigger::Automatic)?;
        Ok(Checked { scores, dispatch })
    }

    /// Send the scores again after a failure, or after an endpoint was configured.
    pub fn resend(&mut self) -> Result<Dispatch, SessionError> {
        self.dispatch(Trigger::Manual)
    }

    pub fn complete_submission(&mut self, ticket: Ticket, result: Result<Receipt, TransportError>) -> Resolution {
        self.coordinator.complete(ticket, result)
    }

    /// Carry out `dispatch` synchronously over `transport`.
    pub fn submit_with(&mut self, dispatch: Dispatch, transport: &dyn Transport) -> Option<Resolution> {
        match dispatch {
            Dispatch::Send(submission) => {
                let result = transport.send(&submission);
                Some(self.complete_submission(submission.ticket, result))
            }
            Dispatch::Skipped(_) => None,
        }
    }

    /// The report for the current, checked session.
    pub fn report(&self) -> Result<ScoreReport, SessionError> {
        let scores = self.session.scores().ok_or(SessionError::NotChecked)?;
        let respondent = self.respondent.clone().ok_or(SessionError::MissingRespondent)?;
        Ok(ScoreReport::new(
            self.document.title.clone(),
            respondent,
            scores.combined(),
            Utc::now(),
        ))
    }

    /// Discard the current session and draw a fresh attempt. The new session
    /// starts locked.
    pub fn reset(&mut self) {
        let epoch = self.session.epoch() + 1;
        let attempt = Attempt::generate(&self.document, &mut self.rng);
        self.session = Session::new(attempt, epoch);
        self.coordinator.reset(epoch);
        info!(epoch, "quiz reset");
    }

    fn dispatch(&mut self, trigger: Trigger) -> Result<Dispatch, SessionError> {
        let report = self.report()?;
        Ok(self.coordinator.begin(self.session.epoch(), report, trigger))
    }
}
