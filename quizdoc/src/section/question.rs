use crate::section::{Anchor, effective_count};

/// A multiple choice question as authored.
#[derive(Debug, Clone, PartialEq)]
pub struct Question {
    pub prompt: String,
    /// Authored order. Presentation order is decided per attempt.
    pub options: Vec<String>,
    /// `None` when no option was marked `[correct]`; such a question can
    /// never be answered correctly.
    pub correct: Option<String>,
    pub explanation: Option<String>,
}

impl Question {
    pub fn new(prompt: impl Into<String>) -> Self {
        Question {
            prompt: prompt.into(),
            options: Vec::new(),
            correct: None,
            explanation: None,
        }
    }

    pub fn is_correct(&self, answer: &str) -> bool {
        self.correct.as_deref() == Some(answer)
    }
}

/// A bank of questions. The whole bank is kept; the attempt generator draws
/// `capacity` of them afresh on every try.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionGroup {
    /// The text or instructions section this group renders inside of.
    /// `None` means the group stands on its own.
    pub attached_to: Anchor,
    pub bank: Vec<Question>,
    pub capacity: Option<usize>,
}

impl QuestionGroup {
    pub fn is_tied(&self) -> bool {
        self.attached_to.is_some()
    }

    pub fn items_per_attempt(&self) -> usize {
        effective_count(self.capacity, self.bank.len())
    }
}
