use std::fmt;

use tracing::{debug, info};

use crate::answers::{AnswerSheet, ClozeKey, QuestionIndex, VocabKey};
use crate::attempt::Attempt;
use crate::error::SessionError;
use crate::scoring::{Feedback, Scores};

/// Where a session is in its lifecycle. A retry does not move a session
/// back to `Locked`; it replaces the session with a new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// The attempt exists but is not yet visible.
    Locked,
    /// Answers are accepted.
    Answering,
    /// Inputs are frozen and scores are available.
    Checked,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Locked => write!(f, "locked"),
            Phase::Answering => write!(f, "answering"),
            Phase::Checked => write!(f, "checked"),
        }
    }
}

/// Distinct answered items out of the items the attempt requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub answered: usize,
    pub required: usize,
}

impl Progress {
    pub fn is_complete(&self) -> bool {
        self.answered >= self.required
    }
}

/// What recording an answer did to the completeness gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recorded {
    Updated,
    /// This answer was the last one missing; checking is now possible.
    GateOpened,
}

/// The mutable state of one attempt. Owned by the running quiz and replaced
/// wholesale on retry.
#[derive(Debug, Clone)]
pub struct Session {
    epoch: u64,
    phase: Phase,
    attempt: Attempt,
    answers: AnswerSheet,
    feedback: Option<Feedback>,
}

impl Session {
    pub fn new(attempt: Attempt, epoch: u64) -> Self {
        Session {
            epoch,
            phase: Phase::Locked,
            attempt,
            answers: AnswerSheet::new(),
            feedback: None,
        }
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn attempt(&self) -> &Attempt {
        &self.attempt
    }

    pub fn answers(&self) -> &AnswerSheet {
        &self.answers
    }

    pub fn feedback(&self) -> Option<&Feedback> {
        self.feedback.as_ref()
    }

    pub fn scores(&self) -> Option<Scores> {
        self.feedback.as_ref().map(Feedback::scores)
    }

    pub fn unlock(&mut self) -> Result<(), SessionError> {
        if self.phase != Phase::Locked {
            return Err(SessionError::InvalidTransition {
                phase: self.phase,
                action: "unlock",
            });
        }
        self.phase = Phase::Answering;
        debug!(epoch = self.epoch, "session unlocked");
        Ok(())
    }

    pub fn answer_question(
        &mut self,
        index: QuestionIndex,
        option: impl Into<String>,
    ) -> Result<Recorded, SessionError> {
        self.ensure_answering("answer")?;
        let option = option.into();
        let question = self
            .attempt
            .question(index)
            .ok_or(SessionError::UnknownQuestion(index))?;
        if !question.options.contains(&option) {
            return Err(SessionError::OptionNotOffered {
                item: index.to_string(),
                option,
            });
        }
        Ok(self.record(|answers| answers.record_question(index, option)))
    }

    pub fn choose_definition(
        &mut self,
        key: VocabKey,
        definition: impl Into<String>,
    ) -> Result<Recorded, SessionError> {
        self.ensure_answering("answer")?;
        let definition = definition.into();
        let item = self
            .attempt
            .vocab_item(&key)
            .ok_or_else(|| SessionError::UnknownWord(key.clone()))?;
        if !item.choices.contains(&definition) {
            return Err(SessionError::OptionNotOffered {
                item: key.to_string(),
                option: definition,
            });
        }
        Ok(self.record(|answers| answers.record_choice(key, definition)))
    }

    pub fn fill_blank(&mut self, key: ClozeKey, text: impl Into<String>) -> Result<Recorded, SessionError> {
        self.ensure_answering("answer")?;
        if self.attempt.blank_word(&key).is_none() {
            return Err(SessionError::UnknownBlank(key));
        }
        let text = text.into();
        Ok(self.record(|answers| answers.record_blank(key, text)))
    }

    pub fn progress(&self) -> Progress {
        Progress {
            answered: self.answers.answered(),
            required: self.attempt.item_counts().total(),
        }
    }

    /// Every question answered, every word matched, every blank filled.
    pub fn is_complete(&self) -> bool {
        let counts = self.attempt.item_counts();
        self.answers.questions_answered() == counts.questions
            && self.answers.words_answered() == counts.vocabulary
            && self.answers.blanks_filled() == counts.cloze
    }

    /// Freeze inputs and compute scores.
    pub fn check(&mut self) -> Result<Scores, SessionError> {
        self.ensure_answering("check")?;
        if !self.is_complete() {
            return Err(SessionError::Incomplete(self.progress()));
        }
        let feedback = Feedback::grade(&self.attempt, &self.answers);
        let scores = feedback.scores();
        self.feedback = Some(feedback);
        self.phase = Phase::Checked;
        info!(epoch = self.epoch, score = %scores.combined(), "session checked");
        Ok(scores)
    }

    fn ensure_answering(&self, action: &'static str) -> Result<(), SessionError> {
        if self.phase == Phase::Answering {
            Ok(())
        } else {
            Err(SessionError::InvalidTransition {
                phase: self.phase,
                action,
            })
        }
    }

    fn record(&mut self, apply: impl FnOnce(&mut AnswerSheet)) -> Recorded {
        let was_complete = self.is_complete();
        apply(&mut self.answers);
        if !was_complete && self.is_complete() {
            debug!(epoch = self.epoch, "every item answered");
            Recorded::GateOpened
        } else {
            Recorded::Updated
        }
    }
}
