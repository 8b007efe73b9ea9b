//! Per-type parsers turning one chunk body into a typed section value.
//! None of these can fail; anything unusable is skipped and reported.

use std::ops::Range;

use indexmap::IndexMap;
use rand::Rng;
use tracing::debug;

use crate::parser::diagnostic::Reporter;
use crate::parser::scanner::Piece;
use crate::random;
use crate::section::{Audio, Cloze, Instructions, Marker, Question, QuestionGroup, Text, Vocabulary};

const CORRECT_MARKER: &str = "[correct]";

pub(crate) fn parse_text(body: Piece<'_>, listening_only: bool) -> Text {
    Text {
        body: body.text.to_string(),
        listening_only,
    }
}

pub(crate) fn parse_instructions(body: Piece<'_>) -> Instructions {
    let mut lines = body.lines().skip_while(|line| line.is_blank());
    let Some(heading) = lines.next() else {
        return Instructions {
            heading: String::new(),
            body: String::new(),
        };
    };
    let rest_start = heading.offset + heading.text.len() - body.offset;
    let rest = body.slice(rest_start..body.text.len()).trim();
    Instructions {
        heading: heading.text.trim().to_string(),
        body: rest.text.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Vocabulary
// ---------------------------------------------------------------------------

pub(crate) fn parse_vocabulary(body: Piece<'_>, capacity: Option<usize>, reporter: &mut Reporter) -> Vocabulary {
    let (mut entries, mut rejected) = read_pairs(body.lines());

    // Legacy single-line form: `a: 1, b: 2`
    if entries.len() <= 1 && body.text.contains(',') {
        debug!("vocabulary block re-read as comma separated pairs");
        (entries, rejected) = read_pairs(body.split(','));
    }

    for span in rejected {
        reporter
            .warning("vocabulary pair is not of the form `word: definition`", span)
            .add_note("this pair was skipped");
    }

    Vocabulary { entries, capacity }
}

fn read_pairs<'a>(pieces: impl Iterator<Item = Piece<'a>>) -> (IndexMap<String, String>, Vec<Range<usize>>) {
    let mut entries = IndexMap::new();
    let mut rejected = Vec::new();
    for piece in pieces.filter(|piece| !piece.is_blank()) {
        match read_pair(piece) {
            Some((word, definition)) => {
                entries.insert(word, definition);
            }
            None => rejected.push(piece.trim().span()),
        }
    }
    (entries, rejected)
}

fn read_pair(piece: Piece<'_>) -> Option<(String, String)> {
    let (word, definition) = piece.split_once(':')?;
    let word = word.text.trim();
    let definition = definition.text.trim().trim_end_matches(',').trim_end();
    if word.is_empty() || definition.is_empty() {
        return None;
    }
    Some((word.to_string(), definition.to_string()))
}

// ---------------------------------------------------------------------------
// Cloze
// ---------------------------------------------------------------------------

pub(crate) fn parse_cloze<R: Rng + ?Sized>(
    body: Piece<'_>,
    capacity: Option<usize>,
    rng: &mut R,
    reporter: &mut Reporter,
) -> Cloze {
    let pattern = regex!(r"\*([^*]+)\*");

    let mut markers: Vec<Marker> = pattern
        .captures_iter(body.text)
        .filter_map(|captures| {
            let whole = captures.get(0)?;
            let word = captures.get(1)?.as_str().trim();
            if word.is_empty() {
                return None;
            }
            Some(Marker {
                range: whole.range(),
                word: word.to_string(),
                blank: None,
            })
        })
        .collect();

    if markers.is_empty() {
        reporter
            .warning("cloze section has no `*marked*` words", body.span())
            .add_note("it will not contain any blanks");
    }

    // Chosen once here; every attempt over this document shares these blanks.
    let chosen = random::sample_positions(markers.len(), capacity, rng);
    let mut blank_words = Vec::with_capacity(chosen.len());
    for position in chosen {
        let marker = &mut markers[position];
        marker.blank = Some(blank_words.len());
        blank_words.push(marker.word.clone());
    }
    debug!(
        candidates = markers.len(),
        blanks = blank_words.len(),
        "cloze blanks selected"
    );

    Cloze {
        body: body.text.to_string(),
        markers,
        blank_words,
        capacity,
    }
}

// ---------------------------------------------------------------------------
// Questions
// ---------------------------------------------------------------------------

struct Draft {
    question: Question,
    span: Range<usize>,
    marked: usize,
}

impl Draft {
    fn add_option(&mut self, text: &str) {
        if text.contains(CORRECT_MARKER) {
            let option = text.replace(CORRECT_MARKER, "").trim().to_string();
            self.marked += 1;
            self.question.correct = Some(option.clone());
            self.question.options.push(option);
        } else {
            self.question.options.push(text.to_string());
        }
    }

    fn finish(self, reporter: &mut Reporter) -> Question {
        if self.question.options.is_empty() {
            reporter
                .warning("question has no options; the quiz cannot be completed", self.span)
                .add_note("add `A:` lines below the question");
            return self.question;
        }
        match self.marked {
            0 => {
                reporter
                    .warning("question has no option marked `[correct]`", self.span)
                    .add_note("it can never be scored as correct");
            }
            1 => {}
            _ => {
                reporter
                    .warning("question has more than one option marked `[correct]`", self.span)
                    .add_note("the last marked option is used");
            }
        }
        self.question
    }
}

pub(crate) fn parse_questions(body: Piece<'_>, capacity: Option<usize>, reporter: &mut Reporter) -> QuestionGroup {
    let mut bank = Vec::new();
    let mut current: Option<Draft> = None;

    for line in body.lines() {
        let text = line.text.trim();

        if let Some(prompt) = text.strip_prefix("Q:").or_else(|| text.strip_prefix("Q.")) {
            if let Some(draft) = current.take() {
                bank.push(draft.finish(reporter));
            }
            current = Some(Draft {
                question: Question::new(prompt.trim()),
                span: line.trim().span(),
                marked: 0,
            });
        } else if let Some(option) = text.strip_prefix("A:") {
            match current.as_mut() {
                Some(draft) => draft.add_option(option.trim()),
                None => {
                    reporter.note("answer line before any question is ignored", line.trim().span());
                }
            }
        } else if let Some(explanation) = text.strip_prefix("E:") {
            match current.as_mut() {
                Some(draft) => draft.question.explanation = Some(explanation.trim().to_string()),
                None => {
                    reporter.note("explanation line before any question is ignored", line.trim().span());
                }
            }
        }
    }

    if let Some(draft) = current.take() {
        bank.push(draft.finish(reporter));
    }

    QuestionGroup {
        attached_to: None,
        bank,
        capacity,
    }
}

// ---------------------------------------------------------------------------
// Audio
// ---------------------------------------------------------------------------

pub(crate) fn parse_audio(body: Piece<'_>) -> Audio {
    let pattern = regex!(r"(?m)^\s*audio-src\s*=\s*(\S.*?)\s*$");
    let source_url = pattern
        .captures(body.text)
        .and_then(|captures| captures.get(1))
        .map(|url| url.as_str().to_string());
    Audio { source_url }
}
