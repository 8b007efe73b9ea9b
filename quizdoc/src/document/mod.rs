use std::fmt;
use std::ops::Range;

use crate::section::{Audio, Cloze, Instructions, QuestionGroup, Text, Vocabulary};

/// Position of a section within [`Document::sections`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SectionId(pub usize);

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A parsed quiz. Built once by the parser and never mutated afterwards;
/// `sections` is in authoring order and is the only source of render order.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub title: String,
    pub sections: Vec<Section>,
}

/// One authored block.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub id: SectionId,
    /// Byte span of the block in the source, for diagnostics.
    pub span: Range<usize>,
    pub kind: SectionKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SectionKind {
    Text(Text),
    Instructions(Instructions),
    Vocabulary(Vocabulary),
    Cloze(Cloze),
    Questions(QuestionGroup),
    Audio(Audio),
}

impl SectionKind {
    /// The header keyword this kind is authored with.
    pub fn label(&self) -> &'static str {
        match self {
            SectionKind::Text(text) if text.listening_only => "text-listening",
            SectionKind::Text(_) => "text",
            SectionKind::Instructions(_) => "instructions",
            SectionKind::Vocabulary(_) => "vocab",
            SectionKind::Cloze(_) => "cloze",
            SectionKind::Questions(_) => "questions",
            SectionKind::Audio(_) => "audio",
        }
    }

    fn capacity(&self) -> Option<usize> {
        match self {
            SectionKind::Vocabulary(vocabulary) => vocabulary.capacity,
            SectionKind::Cloze(cloze) => cloze.capacity,
            SectionKind::Questions(group) => group.capacity,
            _ => None,
        }
    }
}

/// How many scorable items one attempt over a document contains.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ItemCounts {
    pub vocabulary: usize,
    pub cloze: usize,
    pub questions: usize,
}

impl ItemCounts {
    pub fn total(&self) -> usize {
        self.vocabulary + self.cloze + self.questions
    }
}

impl Document {
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn get(&self, id: SectionId) -> Option<&Section> {
        self.sections.get(id.0)
    }

    pub fn question_groups(&self) -> impl Iterator<Item = (SectionId, &QuestionGroup)> {
        self.sections.iter().filter_map(|section| match &section.kind {
            SectionKind::Questions(group) => Some((section.id, group)),
            _ => None,
        })
    }

    /// Question groups rendered inside the card of `anchor`, in authored order.
    pub fn groups_tied_to(&self, anchor: SectionId) -> impl Iterator<Item = (SectionId, &QuestionGroup)> {
        self.question_groups()
            .filter(move |(_, group)| group.attached_to == Some(anchor))
    }

    pub fn item_counts(&self) -> ItemCounts {
        let mut counts = ItemCounts::default();
        for section in &self.sections {
            match &section.kind {
                SectionKind::Vocabulary(vocabulary) => {
                    counts.vocabulary += vocabulary.items_per_attempt()
                }
                SectionKind::Cloze(cloze) => counts.cloze += cloze.blank_count(),
                SectionKind::Questions(group) => counts.questions += group.items_per_attempt(),
                _ => {}
            }
        }
        counts
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title)?;
        for section in &self.sections {
            writeln!(f, "---")?;
            write!(f, "{}", section)?;
        }
        Ok(())
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind.capacity() {
            Some(capacity) => writeln!(f, "{}-{}", self.kind.label(), capacity)?,
            None => writeln!(f, "{}", self.kind.label())?,
        }
        write!(f, "{}", self.kind)
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SectionKind::Text(text) => write_body(f, &text.body),
            SectionKind::Instructions(instructions) => {
                writeln!(f, "{}", instructions.heading)?;
                write_body(f, &instructions.body)
            }
            SectionKind::Vocabulary(vocabulary) => {
                for (word, definition) in &vocabulary.entries {
                    writeln!(f, "{}: {}", word, definition)?;
                }
                Ok(())
            }
            SectionKind::Cloze(cloze) => write_body(f, &cloze.body),
            SectionKind::Questions(group) => {
                for question in &group.bank {
                    writeln!(f, "Q: {}", question.prompt)?;
                    for option in &question.options {
                        if question.correct.as_deref() == Some(option.as_str()) {
                            writeln!(f, "A: {} [correct]", option)?;
                        } else {
                            writeln!(f, "A: {}", option)?;
                        }
                    }
                    if let Some(explanation) = &question.explanation {
                        writeln!(f, "E: {}", explanation)?;
                    }
                }
                Ok(())
            }
            SectionKind::Audio(audio) => match &audio.source_url {
                Some(url) => writeln!(f, "audio-src = {}", url),
                None => Ok(()),
            },
        }
    }
}

fn write_body(f: &mut fmt::Formatter<'_>, body: &str) -> fmt::Result {
    if body.is_empty() {
        Ok(())
    } else {
        writeln!(f, "{}", body)
    }
}
