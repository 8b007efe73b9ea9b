//! Assembles scanned chunks into a [`Document`], tying question groups to the
//! passage or instructions they follow.

use rand::Rng;
use tracing::debug;

use crate::document::{Document, Section, SectionId, SectionKind};
use crate::parser::diagnostic::Reporter;
use crate::parser::scanner::{Chunk, Header, Scan, Suffix};
use crate::parser::sections;

/// What the previous kept chunk was, for question group attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Previous {
    Passage,
    TiedQuestions,
    Other,
}

struct Builder<'r, R: Rng + ?Sized> {
    rng: &'r mut R,
    reporter: &'r mut Reporter,
    sections: Vec<Section>,
    previous: Option<Previous>,
    last_passage: Option<SectionId>,
}

pub(crate) fn build<R: Rng + ?Sized>(scan: Scan<'_>, rng: &mut R, reporter: &mut Reporter) -> Document {
    let title = scan.title.text.to_string();
    if title.is_empty() {
        reporter.note("quiz has no title", scan.title.span());
    }

    let mut builder = Builder {
        rng,
        reporter,
        sections: Vec::new(),
        previous: None,
        last_passage: None,
    };
    for chunk in scan.chunks {
        builder.push(chunk);
    }

    Document {
        title,
        sections: builder.sections,
    }
}

impl<R: Rng + ?Sized> Builder<'_, R> {
    fn push(&mut self, chunk: Chunk<'_>) {
        let Some(header) = chunk.kind else {
            if !chunk.header.text.is_empty() {
                self.reporter
                    .warning(
                        format!("unrecognized section header `{}`", chunk.header.text),
                        chunk.header.span(),
                    )
                    .add_note("this section was dropped");
            }
            debug!(header = chunk.header.text, "dropping chunk");
            self.previous = None;
            return;
        };

        let id = SectionId(self.sections.len());
        let body = chunk.body;

        let (kind, previous) = match header {
            Header::Text { listening } => {
                self.last_passage = Some(id);
                (
                    SectionKind::Text(sections::parse_text(body, listening)),
                    Previous::Passage,
                )
            }
            Header::Instructions => {
                self.last_passage = Some(id);
                (
                    SectionKind::Instructions(sections::parse_instructions(body)),
                    Previous::Passage,
                )
            }
            Header::Vocabulary(suffix) => {
                let capacity = self.capacity(suffix, &chunk);
                (
                    SectionKind::Vocabulary(sections::parse_vocabulary(body, capacity, self.reporter)),
                    Previous::Other,
                )
            }
            Header::Cloze(suffix) => {
                let capacity = self.capacity(suffix, &chunk);
                (
                    SectionKind::Cloze(sections::parse_cloze(body, capacity, self.rng, self.reporter)),
                    Previous::Other,
                )
            }
            Header::Questions(suffix) => {
                let capacity = self.capacity(suffix, &chunk);
                let mut group = sections::parse_questions(body, capacity, self.reporter);
                let follows_passage = matches!(
                    self.previous,
                    Some(Previous::Passage) | Some(Previous::TiedQuestions)
                );
                if follows_passage {
                    group.attached_to = self.last_passage;
                }
                let previous = if group.is_tied() {
                    Previous::TiedQuestions
                } else {
                    Previous::Other
                };
                (SectionKind::Questions(group), previous)
            }
            Header::Audio => (
                SectionKind::Audio(sections::parse_audio(body)),
                Previous::Other,
            ),
        };

        debug!(%id, kind = kind.label(), "section parsed");
        self.previous = Some(previous);
        self.sections.push(Section {
            id,
            span: chunk.span.clone(),
            kind,
        });
    }

    fn capacity(&mut self, suffix: Suffix, chunk: &Chunk<'_>) -> Option<usize> {
        if suffix.malformed {
            self.reporter
                .note(
                    format!("capacity in `{}` is not a number", chunk.header.text),
                    chunk.header.span(),
                )
                .add_note("every item of this section is used");
        }
        suffix.capacity
    }
}
