pub mod cloze;
pub mod question;

use indexmap::IndexMap;

use crate::document::SectionId;

pub use cloze::{Cloze, ClozeSegment, Marker};
pub use question::{Question, QuestionGroup};

/// A reading passage.
#[derive(Debug, Clone, PartialEq)]
pub struct Text {
    pub body: String,
    /// Kept for narration only; a renderer must not show the body.
    pub listening_only: bool,
}

/// A headed block of instructions. The heading is the first non-blank line.
#[derive(Debug, Clone, PartialEq)]
pub struct Instructions {
    pub heading: String,
    pub body: String,
}

/// Word/definition pairs for a matching exercise.
#[derive(Debug, Clone, PartialEq)]
pub struct Vocabulary {
    /// Authored order; a repeated word overwrites the earlier definition in place.
    pub entries: IndexMap<String, String>,
    pub capacity: Option<usize>,
}

impl Vocabulary {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn definition(&self, word: &str) -> Option<&str> {
        self.entries.get(word).map(String::as_str)
    }

    /// Number of words a single attempt will use.
    pub fn items_per_attempt(&self) -> usize {
        effective_count(self.capacity, self.len())
    }
}

/// An audio clip. Without a source, narration falls back to speech synthesis.
#[derive(Debug, Clone, PartialEq)]
pub struct Audio {
    pub source_url: Option<String>,
}

/// The section a question group renders inside of, if any.
pub type Anchor = Option<SectionId>;

pub(crate) fn effective_count(capacity: Option<usize>, available: usize) -> usize {
    match capacity {
        Some(capacity) => capacity.min(available),
        None => available,
    }
}
