//! One randomized realization of a document. A new attempt is drawn on every
//! session start and every retry; nothing here is cached between attempts.

use rand::Rng;
use tracing::debug;

use quizdoc::document::ItemCounts;
use quizdoc::random::{sample, shuffle};
use quizdoc::section::{Cloze, QuestionGroup, Vocabulary};
use quizdoc::{Document, SectionId, SectionKind};

use crate::answers::{ClozeKey, QuestionIndex, VocabKey};

/// Distractors offered alongside the correct definition of a word.
pub const DISTRACTORS_PER_WORD: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct Attempt {
    parts: Vec<Part>,
}

/// The attempt's view of one document section, in document order.
#[derive(Debug, Clone, PartialEq)]
pub enum Part {
    /// Text, instructions or audio: shown as authored, nothing to answer.
    Static(SectionId),
    Vocabulary(VocabularyDrill),
    Cloze(ClozeDrill),
    Questions(QuestionSet),
}

#[derive(Debug, Clone, PartialEq)]
pub struct VocabularyDrill {
    pub section: SectionId,
    pub items: Vec<VocabItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VocabItem {
    pub word: String,
    pub definition: String,
    /// The correct definition plus distractors, shuffled.
    pub choices: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClozeDrill {
    pub section: SectionId,
    /// Fixed when the document was parsed, not per attempt.
    pub blanks: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuestionSet {
    pub section: SectionId,
    pub attached_to: Option<SectionId>,
    pub questions: Vec<PresentedQuestion>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PresentedQuestion {
    pub index: QuestionIndex,
    pub prompt: String,
    /// Shuffled for this attempt only.
    pub options: Vec<String>,
    pub correct: Option<String>,
    pub explanation: Option<String>,
}

impl Attempt {
    pub fn generate<R: Rng + ?Sized>(document: &Document, rng: &mut R) -> Attempt {
        let mut parts = Vec::with_capacity(document.sections.len());
        let mut next_question = 0;

        for section in &document.sections {
            let part = match &section.kind {
                SectionKind::Text(_) | SectionKind::Instructions(_) | SectionKind::Audio(_) => {
                    Part::Static(section.id)
                }
                SectionKind::Vocabulary(vocabulary) => {
                    Part::Vocabulary(VocabularyDrill::generate(section.id, vocabulary, rng))
                }
                SectionKind::Cloze(cloze) => Part::Cloze(ClozeDrill::from_cloze(section.id, cloze)),
                SectionKind::Questions(group) => Part::Questions(QuestionSet::generate(
                    section.id,
                    group,
                    &mut next_question,
                    rng,
                )),
            };
            parts.push(part);
        }

        let attempt = Attempt { parts };
        let counts = attempt.item_counts();
        debug!(
            questions = counts.questions,
            words = counts.vocabulary,
            blanks = counts.cloze,
            "attempt generated"
        );
        attempt
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    pub fn question_sets(&self) -> impl Iterator<Item = &QuestionSet> {
        self.parts.iter().filter_map(|part| match part {
            Part::Questions(set) => Some(set),
            _ => None,
        })
    }

    pub fn questions(&self) -> impl Iterator<Item = &PresentedQuestion> {
        self.question_sets().flat_map(|set| set.questions.iter())
    }

    pub fn question(&self, index: QuestionIndex) -> Option<&PresentedQuestion> {
        self.questions().find(|question| question.index == index)
    }

    pub fn vocabulary_drills(&self) -> impl Iterator<Item = &VocabularyDrill> {
        self.parts.iter().filter_map(|part| match part {
            Part::Vocabulary(drill) => Some(drill),
            _ => None,
        })
    }

    pub fn vocab_item(&self, key: &VocabKey) -> Option<&VocabItem> {
        self.vocabulary_drills()
            .find(|drill| drill.section == key.section)
            .and_then(|drill| drill.items.iter().find(|item| item.word == key.word))
    }

    pub fn cloze_drills(&self) -> impl Iterator<Item = &ClozeDrill> {
        self.parts.iter().filter_map(|part| match part {
            Part::Cloze(drill) => Some(drill),
            _ => None,
        })
    }

    pub fn blank_word(&self, key: &ClozeKey) -> Option<&str> {
        self.cloze_drills()
            .find(|drill| drill.section == key.section)
            .and_then(|drill| drill.blanks.get(key.blank))
            .map(String::as_str)
    }

    /// Question sets tied to `anchor`, in document order.
    pub fn sets_tied_to(&self, anchor: SectionId) -> impl Iterator<Item = &QuestionSet> {
        self.question_sets()
            .filter(move |set| set.attached_to == Some(anchor))
    }

    pub fn item_counts(&self) -> ItemCounts {
        let mut counts = ItemCounts::default();
        for part in &self.parts {
            match part {
                Part::Static(_) => {}
                Part::Vocabulary(drill) => counts.vocabulary += drill.items.len(),
                Part::Cloze(drill) => counts.cloze += drill.blanks.len(),
                Part::Questions(set) => counts.questions += set.questions.len(),
            }
        }
        counts
    }
}

impl VocabularyDrill {
    fn generate<R: Rng + ?Sized>(section: SectionId, vocabulary: &Vocabulary, rng: &mut R) -> Self {
        let entries: Vec<(&String, &String)> = vocabulary.entries.iter().collect();
        let chosen = sample(&entries, vocabulary.capacity, rng);

        // Distinct definitions in authored order.
        let mut pool: Vec<&String> = Vec::new();
        for definition in vocabulary.entries.values() {
            if !pool.contains(&definition) {
                pool.push(definition);
            }
        }

        let items = chosen
            .into_iter()
            .map(|(word, definition)| {
                let mut distractors: Vec<&String> = pool
                    .iter()
                    .copied()
                    .filter(|candidate| *candidate != definition)
                    .collect();
                shuffle(&mut distractors, rng);
                distractors.truncate(DISTRACTORS_PER_WORD);

                let mut choices: Vec<String> = distractors.into_iter().cloned().collect();
                choices.push(definition.clone());
                shuffle(&mut choices, rng);

                VocabItem {
                    word: word.clone(),
                    definition: definition.clone(),
                    choices,
                }
            })
            .collect();

        VocabularyDrill { section, items }
    }
}

impl ClozeDrill {
    fn from_cloze(section: SectionId, cloze: &Cloze) -> Self {
        ClozeDrill {
            section,
            blanks: cloze.blank_words.clone(),
        }
    }
}

impl QuestionSet {
    fn generate<R: Rng + ?Sized>(
        section: SectionId,
        group: &QuestionGroup,
        next_index: &mut usize,
        rng: &mut R,
    ) -> Self {
        let questions = sample(&group.bank, group.capacity, rng)
            .into_iter()
            .map(|question| {
                let mut options = question.options;
                shuffle(&mut options, rng);
                let index = QuestionIndex(*next_index);
                *next_index += 1;
                PresentedQuestion {
                    index,
                    prompt: question.prompt,
                    options,
                    correct: question.correct,
                    explanation: question.explanation,
                }
            })
            .collect();

        QuestionSet {
            section,
            attached_to: group.attached_to,
            questions,
        }
    }
}
