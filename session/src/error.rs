use std::fmt;

use crate::answers::{ClozeKey, QuestionIndex, VocabKey};
use crate::session::{Phase, Progress};

#[derive(Debug, Clone, PartialEq)]
pub enum SessionError {
    /// The action is not allowed in the current phase.
    InvalidTransition { phase: Phase, action: &'static str },
    MissingRespondent,
    UnknownQuestion(QuestionIndex),
    UnknownWord(VocabKey),
    UnknownBlank(ClozeKey),
    OptionNotOffered { item: String, option: String },
    Incomplete(Progress),
    NotChecked,
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::InvalidTransition { phase, action } => {
                write!(f, "cannot {} while the session is {}", action, phase)
            }
            SessionError::MissingRespondent => write!(f, "a respondent name is required to start"),
            SessionError::UnknownQuestion(index) => write!(f, "no such question: {}", index),
            SessionError::UnknownWord(key) => write!(f, "no such word: {}", key),
            SessionError::UnknownBlank(key) => write!(f, "no such blank: {}", key),
            SessionError::OptionNotOffered { item, option } => {
                write!(f, "'{}' is not one of the choices for {}", option, item)
            }
            SessionError::Incomplete(progress) => write!(
                f,
                "not every item is answered yet ({} of {})",
                progress.answered, progress.required
            ),
            SessionError::NotChecked => write!(f, "the session has not been checked yet"),
        }
    }
}

impl std::error::Error for SessionError {}
