use std::collections::BTreeMap;
use std::fmt;

use quizdoc::SectionId;

/// Position of a question within an attempt, counted across every question
/// set in render order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QuestionIndex(pub usize);

/// A word within one vocabulary section.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VocabKey {
    pub section: SectionId,
    pub word: String,
}

/// A blank within one cloze section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClozeKey {
    pub section: SectionId,
    pub blank: usize,
}

impl VocabKey {
    pub fn new(section: SectionId, word: impl Into<String>) -> Self {
        VocabKey {
            section,
            word: word.into(),
        }
    }
}

impl ClozeKey {
    pub fn new(section: SectionId, blank: usize) -> Self {
        ClozeKey { section, blank }
    }
}

impl fmt::Display for QuestionIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "question {}", self.0 + 1)
    }
}

impl fmt::Display for VocabKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "word '{}' in section {}", self.word, self.section)
    }
}

impl fmt::Display for ClozeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "blank {} in section {}", self.blank + 1, self.section)
    }
}

/// Answers recorded so far. One entry per item; recording again replaces
/// the previous value, so counts are always counts of distinct keys.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnswerSheet {
    questions: BTreeMap<QuestionIndex, String>,
    vocabulary: BTreeMap<VocabKey, String>,
    cloze: BTreeMap<ClozeKey, String>,
}

impl AnswerSheet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_question(&mut self, index: QuestionIndex, option: String) {
        self.questions.insert(index, option);
    }

    pub fn record_choice(&mut self, key: VocabKey, definition: String) {
        self.vocabulary.insert(key, definition);
    }

    /// Blank text counts as no answer and clears the entry.
    pub fn record_blank(&mut self, key: ClozeKey, text: String) {
        if text.trim().is_empty() {
            self.cloze.remove(&key);
        } else {
            self.cloze.insert(key, text);
        }
    }

    pub fn question(&self, index: QuestionIndex) -> Option<&str> {
        self.questions.get(&index).map(String::as_str)
    }

    pub fn choice(&self, key: &VocabKey) -> Option<&str> {
        self.vocabulary.get(key).map(String::as_str)
    }

    pub fn blank(&self, key: &ClozeKey) -> Option<&str> {
        self.cloze.get(key).map(String::as_str)
    }

    pub fn questions_answered(&self) -> usize {
        self.questions.len()
    }

    pub fn words_answered(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn blanks_filled(&self) -> usize {
        self.cloze.len()
    }

    pub fn answered(&self) -> usize {
        self.questions.len() + self.vocabulary.len() + self.cloze.len()
    }
}
