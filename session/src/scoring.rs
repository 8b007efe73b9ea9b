use std::fmt;
use std::ops::Add;

use crate::answers::{AnswerSheet, ClozeKey, QuestionIndex, VocabKey};
use crate::attempt::{Attempt, Part};

/// Correct answers out of scorable items.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub correct: usize,
    pub total: usize,
}

impl Tally {
    pub fn new(correct: usize, total: usize) -> Self {
        Tally { correct, total }
    }

    fn count(&mut self, correct: bool) {
        self.total += 1;
        if correct {
            self.correct += 1;
        }
    }

    /// Fraction correct; an empty tally scores 0 rather than dividing by zero.
    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.correct as f64 / self.total as f64
        }
    }

    pub fn percent(&self) -> u32 {
        (self.ratio() * 100.0).round() as u32
    }
}

impl Add for Tally {
    type Output = Tally;

    fn add(self, other: Tally) -> Tally {
        Tally {
            correct: self.correct + other.correct,
            total: self.total + other.total,
        }
    }
}

impl fmt::Display for Tally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.correct, self.total)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Scores {
    pub vocabulary: Tally,
    pub cloze: Tally,
    pub questions: Tally,
}

impl Scores {
    pub fn combined(&self) -> Tally {
        self.vocabulary + self.cloze + self.questions
    }
}

/// Per-item outcome of a checked session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Feedback {
    pub questions: Vec<QuestionFeedback>,
    pub vocabulary: Vec<WordFeedback>,
    pub cloze: Vec<BlankFeedback>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuestionFeedback {
    pub index: QuestionIndex,
    pub selected: Option<String>,
    pub correct_option: Option<String>,
    pub explanation: Option<String>,
    pub is_correct: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WordFeedback {
    pub key: VocabKey,
    pub chosen: Option<String>,
    pub definition: String,
    pub is_correct: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlankFeedback {
    pub key: ClozeKey,
    pub typed: Option<String>,
    pub word: String,
    pub is_correct: bool,
}

/// Case-insensitive comparison of typed text against a blank word, ignoring
/// surrounding whitespace.
pub fn blank_matches(word: &str, typed: &str) -> bool {
    typed.trim().to_lowercase() == word.trim().to_lowercase()
}

impl Feedback {
    /// Compare recorded answers against the attempt. Questions and words
    /// must match exactly; blanks use [`blank_matches`].
    pub fn grade(attempt: &Attempt, answers: &AnswerSheet) -> Feedback {
        let mut feedback = Feedback::default();

        for part in attempt.parts() {
            match part {
                Part::Static(_) => {}
                Part::Questions(set) => {
                    for question in &set.questions {
                        let selected = answers.question(question.index);
                        let is_correct = match (selected, question.correct.as_deref()) {
                            (Some(selected), Some(correct)) => selected == correct,
                            _ => false,
                        };
                        feedback.questions.push(QuestionFeedback {
                            index: question.index,
                            selected: selected.map(str::to_string),
                            correct_option: question.correct.clone(),
                            explanation: question.explanation.clone(),
                            is_correct,
                        });
                    }
                }
                Part::Vocabulary(drill) => {
                    for item in &drill.items {
                        let key = VocabKey::new(drill.section, item.word.clone());
                        let chosen = answers.choice(&key);
                        let is_correct = chosen == Some(item.definition.as_str());
                        feedback.vocabulary.push(WordFeedback {
                            chosen: chosen.map(str::to_string),
                            definition: item.definition.clone(),
                            is_correct,
                            key,
                        });
                    }
                }
                Part::Cloze(drill) => {
                    for (blank, word) in drill.blanks.iter().enumerate() {
                        let key = ClozeKey::new(drill.section, blank);
                        let typed = answers.blank(&key);
                        let is_correct = typed.is_some_and(|typed| blank_matches(word, typed));
                        feedback.cloze.push(BlankFeedback {
                            key,
                            typed: typed.map(str::to_string),
                            word: word.clone(),
                            is_correct,
                        });
                    }
                }
            }
        }

        feedback
    }

    pub fn scores(&self) -> Scores {
        let mut scores = Scores::default();
        for item in &self.questions {
            scores.questions.count(item.is_correct);
        }
        for item in &self.vocabulary {
            scores.vocabulary.count(item.is_correct);
        }
        for item in &self.cloze {
            scores.cloze.count(item.is_correct);
        }
        scores
    }
}
