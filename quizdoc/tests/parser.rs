use rand::SeedableRng;
use rand::rngs::StdRng;

use quizdoc::section::ClozeSegment;
use quizdoc::{Document, Parsed, SectionId, SectionKind};

fn parse(source: &str) -> Parsed {
    let mut rng = StdRng::seed_from_u64(7);
    quizdoc::Parser::new(source.to_string(), 0).parse_with_rng(&mut rng)
}

fn document(source: &str) -> Document {
    parse(source).document
}

fn labels(document: &Document) -> Vec<&'static str> {
    document.sections.iter().map(|s| s.kind.label()).collect()
}

fn warnings(parsed: &Parsed) -> Vec<String> {
    parsed.warnings().map(|w| w.message.clone()).collect()
}

const EVERY_KIND: &str = "\
The Fox
---
instructions
Read carefully
Then answer.
---
text
The quick brown fox.
---
questions
Q: What colour is the fox?
A: Brown [correct]
A: Red
---
vocab
fox: a small wild dog
hen: a female chicken
---
cloze
The *quick* brown *fox*.
---
text-listening
Listen to this.
---
audio
audio-src = https://example.org/fox.mp3
";

#[test]
fn one_section_per_block_in_authored_order() {
    let parsed = parse(EVERY_KIND);
    assert!(parsed.diagnostics.is_empty(), "{:?}", parsed.diagnostics);
    let doc = parsed.document;
    assert_eq!(doc.title, "The Fox");
    assert_eq!(
        labels(&doc),
        vec!["instructions", "text", "questions", "vocab", "cloze", "text-listening", "audio"]
    );
    for (position, section) in doc.sections.iter().enumerate() {
        assert_eq!(section.id, SectionId(position));
    }
}

#[test]
fn title_is_first_non_blank_line() {
    let doc = document("\n\n   My Quiz  \nignored line\n---\ntext\nbody");
    assert_eq!(doc.title, "My Quiz");
    assert_eq!(doc.sections.len(), 1);
}

#[test]
fn empty_input_gives_empty_document() {
    let parsed = parse("");
    assert_eq!(parsed.document.title, "");
    assert!(parsed.document.is_empty());
    assert_eq!(warnings(&parsed), Vec::<String>::new());
}

#[test]
fn headers_are_case_insensitive_with_capacity() {
    let doc = document("T\n---\nQUESTIONS-2\nQ: a\nA: x [correct]\n---\nVocab-3\na: 1\n---\nCloze-1\n*a* *b*");
    match &doc.sections[0].kind {
        SectionKind::Questions(group) => assert_eq!(group.capacity, Some(2)),
        other => panic!("expected questions, got {:?}", other),
    }
    match &doc.sections[1].kind {
        SectionKind::Vocabulary(vocab) => assert_eq!(vocab.capacity, Some(3)),
        other => panic!("expected vocab, got {:?}", other),
    }
    match &doc.sections[2].kind {
        SectionKind::Cloze(cloze) => assert_eq!(cloze.capacity, Some(1)),
        other => panic!("expected cloze, got {:?}", other),
    }
}

#[test]
fn non_numeric_capacity_means_unbounded() {
    let parsed = parse("T\n---\nvocab-many\na: 1\nb: 2");
    match &parsed.document.sections[0].kind {
        SectionKind::Vocabulary(vocab) => {
            assert_eq!(vocab.capacity, None);
            assert_eq!(vocab.items_per_attempt(), 2);
        }
        other => panic!("expected vocab, got {:?}", other),
    }
    assert!(parsed.diagnostics.iter().any(|d| d.message.contains("not a number")));
    assert_eq!(parsed.warnings().count(), 0);
}

#[test]
fn text_requires_exact_header() {
    let parsed = parse("T\n---\ntextual\nbody\n---\ntext-listening\nheard");
    assert_eq!(labels(&parsed.document), vec!["text-listening"]);
    assert_eq!(warnings(&parsed), vec!["unrecognized section header `textual`"]);
}

#[test]
fn passage_keeps_paragraph_breaks() {
    let doc = document("T\n---\ntext\n\nFirst paragraph.\n\nSecond paragraph.\n\n");
    match &doc.sections[0].kind {
        SectionKind::Text(text) => {
            assert_eq!(text.body, "First paragraph.\n\nSecond paragraph.");
            assert!(!text.listening_only);
        }
        other => panic!("expected text, got {:?}", other),
    }
}

#[test]
fn instructions_split_heading_and_body() {
    let doc = document("T\n---\ninstructions\n\nPart One\nRead the text.\n\nThen answer.\n");
    match &doc.sections[0].kind {
        SectionKind::Instructions(instructions) => {
            assert_eq!(instructions.heading, "Part One");
            assert_eq!(instructions.body, "Read the text.\n\nThen answer.");
        }
        other => panic!("expected instructions, got {:?}", other),
    }
}

#[test]
fn empty_blocks_are_harmless() {
    let doc = document("T\n---\ninstructions\n---\nvocab\n---\nquestions\n---\ncloze\n---\naudio");
    assert_eq!(labels(&doc), vec!["instructions", "vocab", "questions", "cloze", "audio"]);
    assert_eq!(doc.item_counts().total(), 0);
}

// ---------------------------------------------------------------------------
// Vocabulary
// ---------------------------------------------------------------------------

fn vocabulary_entries(source: &str) -> Vec<(String, String)> {
    let doc = document(source);
    match &doc.sections[0].kind {
        SectionKind::Vocabulary(vocab) => vocab
            .entries
            .iter()
            .map(|(w, d)| (w.clone(), d.clone()))
            .collect(),
        other => panic!("expected vocab, got {:?}", other),
    }
}

fn pairs(list: &[(&str, &str)]) -> Vec<(String, String)> {
    list.iter().map(|(w, d)| (w.to_string(), d.to_string())).collect()
}

#[test]
fn vocabulary_comma_fallback() {
    assert_eq!(vocabulary_entries("T\n---\nvocab\na: 1, b: 2"), pairs(&[("a", "1"), ("b", "2")]));
}

#[test]
fn vocabulary_lines_ignore_trailing_commas() {
    let expected = pairs(&[("a", "1"), ("b", "2")]);
    assert_eq!(vocabulary_entries("T\n---\nvocab\na: 1\nb: 2"), expected);
    assert_eq!(vocabulary_entries("T\n---\nvocab\na: 1,\nb: 2,"), expected);
}

#[test]
fn vocabulary_definition_may_contain_colons() {
    assert_eq!(
        vocabulary_entries("T\n---\nvocab\ntime: 10:30 in the morning\nday: a day"),
        pairs(&[("time", "10:30 in the morning"), ("day", "a day")])
    );
}

#[test]
fn vocabulary_skips_invalid_pairs() {
    let parsed = parse("T\n---\nvocab\ndog: an animal\nno colon here\n: orphan\ncat:\nbird: flies");
    match &parsed.document.sections[0].kind {
        SectionKind::Vocabulary(vocab) => {
            assert_eq!(vocab.len(), 2);
            assert_eq!(vocab.definition("dog"), Some("an animal"));
            assert_eq!(vocab.definition("bird"), Some("flies"));
        }
        other => panic!("expected vocab, got {:?}", other),
    }
    assert_eq!(parsed.warnings().count(), 3);
}

#[test]
fn vocabulary_duplicate_words_overwrite() {
    assert_eq!(
        vocabulary_entries("T\n---\nvocab\na: first\nb: 2\na: second"),
        pairs(&[("a", "second"), ("b", "2")])
    );
}

// ---------------------------------------------------------------------------
// Cloze
// ---------------------------------------------------------------------------

#[test]
fn cloze_marks_every_starred_word() {
    let doc = document("T\n---\ncloze\nThe *quick* brown *fox* jumps.");
    let SectionKind::Cloze(cloze) = &doc.sections[0].kind else {
        panic!("expected cloze");
    };
    assert_eq!(cloze.body, "The *quick* brown *fox* jumps.");
    assert_eq!(cloze.blank_words, vec!["quick", "fox"]);
    assert_eq!(
        cloze.segments(),
        vec![
            ClozeSegment::Text("The "),
            ClozeSegment::Blank { index: 0, word: "quick" },
            ClozeSegment::Text(" brown "),
            ClozeSegment::Blank { index: 1, word: "fox" },
            ClozeSegment::Text(" jumps."),
        ]
    );
    assert_eq!(cloze.render_with(|i| format!("[{}]", i)), "The [0] brown [1] jumps.");
}

#[test]
fn cloze_capacity_picks_subset_once() {
    let source = "T\n---\ncloze-2\n*a* *b* *c* *d* *e*";
    for seed in 0..20 {
        let mut rng = StdRng::seed_from_u64(seed);
        let doc = quizdoc::Parser::new(source.to_string(), 0)
            .parse_with_rng(&mut rng)
            .document;
        let SectionKind::Cloze(cloze) = &doc.sections[0].kind else {
            panic!("expected cloze");
        };
        assert_eq!(cloze.blank_words.len(), 2);
        assert_eq!(cloze.markers.len(), 5);
        // authored order is kept
        let positions: Vec<usize> = cloze
            .blank_words
            .iter()
            .map(|w| ["a", "b", "c", "d", "e"].iter().position(|c| c == w).unwrap())
            .collect();
        assert!(positions[0] < positions[1]);
        let plain = cloze
            .segments()
            .iter()
            .filter(|s| matches!(s, ClozeSegment::Plain(_)))
            .count();
        assert_eq!(plain, 3);
    }
}

#[test]
fn cloze_without_markers_warns() {
    let parsed = parse("T\n---\ncloze\nnothing to fill");
    assert_eq!(warnings(&parsed), vec!["cloze section has no `*marked*` words"]);
}

// ---------------------------------------------------------------------------
// Questions
// ---------------------------------------------------------------------------

#[test]
fn questions_bank_is_parsed_whole() {
    let source = "T\n---\nquestions-1\n\
        stray line\n\
        Q: Capital of France?\n\
        A: Paris [correct]\n\
        A: Lyon\n\
        E: Paris is the capital.\n\
        Q. Two plus two?\n\
        A: 3\n\
        A:  4   [correct]\n\
        random chatter\n";
    let doc = document(source);
    let SectionKind::Questions(group) = &doc.sections[0].kind else {
        panic!("expected questions");
    };
    assert_eq!(group.capacity, Some(1));
    assert_eq!(group.bank.len(), 2);
    assert_eq!(group.items_per_attempt(), 1);

    let first = &group.bank[0];
    assert_eq!(first.prompt, "Capital of France?");
    assert_eq!(first.options, vec!["Paris", "Lyon"]);
    assert_eq!(first.correct.as_deref(), Some("Paris"));
    assert_eq!(first.explanation.as_deref(), Some("Paris is the capital."));

    let second = &group.bank[1];
    assert_eq!(second.prompt, "Two plus two?");
    assert_eq!(second.options, vec!["3", "4"]);
    assert!(second.is_correct("4"));
    assert_eq!(second.explanation, None);
}

#[test]
fn question_without_correct_option_is_kept() {
    let parsed = parse("T\n---\nquestions\nQ: Which?\nA: one\nA: two");
    let SectionKind::Questions(group) = &parsed.document.sections[0].kind else {
        panic!("expected questions");
    };
    assert_eq!(group.bank[0].correct, None);
    assert!(!group.bank[0].is_correct("one"));
    assert!(!group.bank[0].is_correct(""));
    assert_eq!(warnings(&parsed), vec!["question has no option marked `[correct]`"]);
}

#[test]
fn question_without_options_is_flagged_once() {
    let parsed = parse("T\n---\nquestions\nQ: Anyone?\nE: nothing to choose\nQ: Next?\nA: yes [correct]");
    let SectionKind::Questions(group) = &parsed.document.sections[0].kind else {
        panic!("expected questions");
    };
    assert_eq!(group.bank.len(), 2);
    assert!(group.bank[0].options.is_empty());
    assert_eq!(
        warnings(&parsed),
        vec!["question has no options; the quiz cannot be completed"]
    );
    let warning = parsed.warnings().next().expect("warning");
    assert_eq!(warning.span, 16..26);
}

#[test]
fn answer_lines_before_a_question_are_ignored() {
    let parsed = parse("T\n---\nquestions\nA: orphan\nE: why\nQ: real?\nA: yes [correct]");
    let SectionKind::Questions(group) = &parsed.document.sections[0].kind else {
        panic!("expected questions");
    };
    assert_eq!(group.bank.len(), 1);
    assert_eq!(group.bank[0].options, vec!["yes"]);
    assert_eq!(parsed.warnings().count(), 0);
    assert_eq!(parsed.diagnostics.len(), 2);
}

// ---------------------------------------------------------------------------
// Attachment
// ---------------------------------------------------------------------------

fn anchors(document: &Document) -> Vec<Option<SectionId>> {
    document.question_groups().map(|(_, g)| g.attached_to).collect()
}

#[test]
fn stacked_question_groups_tie_to_passage() {
    let doc = document("T\n---\ntext\nA\n---\nquestions\nQ: 1\n---\nquestions\nQ: 2");
    assert_eq!(anchors(&doc), vec![Some(SectionId(0)), Some(SectionId(0))]);
    assert_eq!(doc.groups_tied_to(SectionId(0)).count(), 2);
}

#[test]
fn questions_tie_to_instructions() {
    let doc = document("T\n---\ntext\nA\n---\ninstructions\nDo it\n---\nquestions\nQ: 1");
    assert_eq!(anchors(&doc), vec![Some(SectionId(1))]);
}

#[test]
fn questions_after_other_sections_are_global() {
    let doc = document(
        "T\n---\nquestions\nQ: 0\n---\ntext\nA\n---\nvocab\na: 1\n---\nquestions\nQ: 1\n---\nquestions\nQ: 2",
    );
    assert_eq!(anchors(&doc), vec![None, None, None]);
}

#[test]
fn audio_between_passage_and_questions_breaks_the_tie() {
    let doc = document("T\n---\ntext\nA\n---\naudio\n---\nquestions\nQ: 1");
    assert_eq!(anchors(&doc), vec![None]);
}

#[test]
fn dropped_chunk_resets_attachment() {
    let parsed = parse("T\n---\ntext\nA\n---\nbogus\nstuff\n---\nquestions\nQ: 1");
    assert_eq!(labels(&parsed.document), vec!["text", "questions"]);
    assert_eq!(anchors(&parsed.document), vec![None]);
    assert_eq!(parsed.diagnostics[0].span, 17..22);
}

// ---------------------------------------------------------------------------
// Audio
// ---------------------------------------------------------------------------

#[test]
fn audio_source_is_optional() {
    let doc = document("T\n---\naudio\naudio-src = https://x.test/a.mp3\n---\naudio\nvolume = 3");
    let sources: Vec<Option<String>> = doc
        .sections
        .iter()
        .map(|s| match &s.kind {
            SectionKind::Audio(audio) => audio.source_url.clone(),
            other => panic!("expected audio, got {:?}", other),
        })
        .collect();
    assert_eq!(sources, vec![Some("https://x.test/a.mp3".to_string()), None]);
}

#[test]
fn display_reparses_to_same_document() {
    let first = document(EVERY_KIND);
    let second = document(&first.to_string());
    assert_eq!(labels(&first), labels(&second));
    assert_eq!(first.title, second.title);
    for (a, b) in first.sections.iter().zip(&second.sections) {
        assert_eq!(a.kind, b.kind);
    }
}
