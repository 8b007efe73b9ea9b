//! Drives a quiz from the terminal, or from a scripted answer file.

use std::collections::BTreeMap;
use std::fmt;
use std::io::{self, BufRead, Write};

use rand::Rng;
use serde::Deserialize;
use tracing::{debug, warn};

use quizdoc::section::{Audio, Instructions, Text};
use quizdoc::{Document, SectionId, SectionKind};
use session::attempt::{ClozeDrill, QuestionSet, VocabularyDrill};
use session::{
    ClozeKey, Dispatch, Feedback, Part, Quiz, Respondent, Scores, SessionError, SubmissionFailure,
    SubmissionStatus, Transport, VocabKey,
};

#[derive(Debug)]
pub enum RunError {
    Io(io::Error),
    Session(SessionError),
    /// Input ran out before the quiz was finished.
    EndOfInput,
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunError::Io(e) => write!(f, "{}", e),
            RunError::Session(e) => write!(f, "{}", e),
            RunError::EndOfInput => write!(f, "input ended before the quiz was finished"),
        }
    }
}

impl std::error::Error for RunError {}

impl From<io::Error> for RunError {
    fn from(e: io::Error) -> Self {
        RunError::Io(e)
    }
}

impl From<SessionError> for RunError {
    fn from(e: SessionError) -> Self {
        RunError::Session(e)
    }
}

/// Answers for a non-interactive run. Questions are keyed by prompt and
/// words by the word itself, since neither position nor option order is
/// stable between attempts. Blanks are filled in document order.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnswerScript {
    pub name: Option<String>,
    pub questions: BTreeMap<String, String>,
    pub vocabulary: BTreeMap<String, String>,
    pub blanks: Vec<String>,
}

/// How to answer every item without a human.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    Correct,
    Incorrect,
}

// ---------------------------------------------------------------------------
// Scripted and automatic answering
// ---------------------------------------------------------------------------

pub fn apply_script<R: Rng>(quiz: &mut Quiz<R>, script: &AnswerScript) -> Result<(), SessionError> {
    let attempt = quiz.session().attempt().clone();

    for question in attempt.questions() {
        if let Some(option) = script.questions.get(&question.prompt) {
            quiz.answer_question(question.index, option.clone())?;
        } else {
            debug!(prompt = %question.prompt, "no scripted answer");
        }
    }

    for drill in attempt.vocabulary_drills() {
        for item in &drill.items {
            if let Some(definition) = script.vocabulary.get(&item.word) {
                quiz.choose_definition(VocabKey::new(drill.section, item.word.clone()), definition.clone())?;
            }
        }
    }

    let keys = attempt
        .cloze_drills()
        .flat_map(|drill| (0..drill.blanks.len()).map(|blank| ClozeKey::new(drill.section, blank)));
    for (key, text) in keys.zip(&script.blanks) {
        quiz.fill_blank(key, text.clone())?;
    }

    Ok(())
}

/// Answer every item of the current attempt right or wrong on purpose.
/// Where no wrong choice exists the only choice is taken.
pub fn answer_all<R: Rng>(quiz: &mut Quiz<R>, strategy: Strategy) -> Result<(), SessionError> {
    let attempt = quiz.session().attempt().clone();

    for question in attempt.questions() {
        let pick = match strategy {
            Strategy::Correct => question.correct.as_ref(),
            Strategy::Incorrect => question
                .options
                .iter()
                .find(|option| Some(*option) != question.correct.as_ref()),
        };
        if let Some(option) = pick.or_else(|| question.options.first()) {
            quiz.answer_question(question.index, option.clone())?;
        }
    }

    for drill in attempt.vocabulary_drills() {
        for item in &drill.items {
            let pick = match strategy {
                Strategy::Correct => Some(&item.definition),
                Strategy::Incorrect => item.choices.iter().find(|choice| **choice != item.definition),
            };
            let definition = pick.unwrap_or(&item.definition).clone();
            quiz.choose_definition(VocabKey::new(drill.section, item.word.clone()), definition)?;
        }
    }

    for drill in attempt.cloze_drills() {
        for (blank, word) in drill.blanks.iter().enumerate() {
            let text = match strategy {
                Strategy::Correct => word.clone(),
                Strategy::Incorrect => format!("{}?", word),
            };
            quiz.fill_blank(ClozeKey::new(drill.section, blank), text)?;
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Terminal session
// ---------------------------------------------------------------------------

struct Prompt<'a, I, O> {
    input: &'a mut I,
    out: &'a mut O,
}

impl<I: BufRead, O: Write> Prompt<'_, I, O> {
    fn line(&mut self, prompt: &str) -> Result<String, RunError> {
        write!(self.out, "{}", prompt)?;
        self.out.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(RunError::EndOfInput);
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    /// A 1-based choice among `count` options, returned 0-based.
    fn choose(&mut self, count: usize) -> Result<usize, RunError> {
        loop {
            let line = self.line("> ")?;
            match line.trim().parse::<usize>() {
                Ok(n) if (1..=count).contains(&n) => return Ok(n - 1),
                _ => writeln!(self.out, "Enter a number from 1 to {}.", count)?,
            }
        }
    }

    fn text(&mut self, prompt: &str) -> Result<String, RunError> {
        loop {
            let line = self.line(prompt)?;
            if !line.trim().is_empty() {
                return Ok(line);
            }
        }
    }

    /// Anything but an explicit yes, including the end of input, is a no.
    fn confirm(&mut self, question: &str) -> Result<bool, RunError> {
        match self.line(&format!("{} [y/N] ", question)) {
            Ok(answer) => Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")),
            Err(RunError::EndOfInput) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

pub fn interactive<R, I, O>(
    quiz: &mut Quiz<R>,
    respondent: Option<Respondent>,
    transport: &dyn Transport,
    input: &mut I,
    out: &mut O,
) -> Result<(), RunError>
where
    R: Rng,
    I: BufRead,
    O: Write,
{
    let mut prompt = Prompt { input, out };

    let respondent = match respondent {
        Some(respondent) => respondent,
        None => Respondent::named(prompt.text("Your name: ")?.trim()),
    };

    loop {
        quiz.unlock(respondent.clone())?;
        present(quiz, &mut prompt)?;

        let checked = quiz.check()?;
        if let Some(feedback) = quiz.session().feedback() {
            show_feedback(feedback, &checked.scores, prompt.out)?;
        }

        let mut dispatch = checked.dispatch;
        loop {
            quiz.submit_with(dispatch, transport);
            show_status(quiz.submission_status(), prompt.out)?;
            let retryable = matches!(
                quiz.submission_status(),
                SubmissionStatus::Failed(failure) if failure.is_retryable()
            );
            if retryable && prompt.confirm("Send again?")? {
                dispatch = quiz.resend()?;
                continue;
            }
            break;
        }

        if !prompt.confirm("Try again?")? {
            return Ok(());
        }
        quiz.reset();
    }
}

fn present<R, I, O>(quiz: &mut Quiz<R>, prompt: &mut Prompt<'_, I, O>) -> Result<(), RunError>
where
    R: Rng,
    I: BufRead,
    O: Write,
{
    let document = quiz.document().clone();
    let attempt = quiz.session().attempt().clone();

    if !document.title.is_empty() {
        writeln!(prompt.out, "{}", document.title)?;
        writeln!(prompt.out, "{}", "=".repeat(document.title.chars().count()))?;
    }

    for part in attempt.parts() {
        writeln!(prompt.out)?;
        match part {
            Part::Static(id) => show_static(&document, *id, prompt.out)?,
            Part::Questions(set) => ask_questions(quiz, set, prompt)?,
            Part::Vocabulary(drill) => ask_vocabulary(quiz, drill, prompt)?,
            Part::Cloze(drill) => ask_cloze(quiz, &document, drill, prompt)?,
        }
    }

    writeln!(prompt.out)?;
    Ok(())
}

fn show_static(document: &Document, id: SectionId, out: &mut impl Write) -> io::Result<()> {
    let Some(section) = document.get(id) else {
        return Ok(());
    };
    match &section.kind {
        SectionKind::Text(Text {
            listening_only: true, ..
        }) => writeln!(out, "(listening passage)"),
        SectionKind::Text(Text { body, .. }) => writeln!(out, "{}", body),
        SectionKind::Instructions(Instructions { heading, body }) => {
            writeln!(out, "{}", heading)?;
            if !body.is_empty() {
                writeln!(out, "{}", body)?;
            }
            Ok(())
        }
        SectionKind::Audio(Audio {
            source_url: Some(url),
        }) => writeln!(out, "[audio] {}", url),
        SectionKind::Audio(Audio { source_url: None }) => writeln!(out, "[audio] (read aloud)"),
        _ => Ok(()),
    }
}

fn ask_questions<R, I, O>(
    quiz: &mut Quiz<R>,
    set: &QuestionSet,
    prompt: &mut Prompt<'_, I, O>,
) -> Result<(), RunError>
where
    R: Rng,
    I: BufRead,
    O: Write,
{
    match set.attached_to {
        Some(anchor) => writeln!(prompt.out, "Questions on {}", anchor)?,
        None => writeln!(prompt.out, "Questions")?,
    }
    for question in &set.questions {
        writeln!(prompt.out, "{}. {}", question.index.0 + 1, question.prompt)?;
        for (n, option) in question.options.iter().enumerate() {
            writeln!(prompt.out, "   {}) {}", n + 1, option)?;
        }
        if question.options.is_empty() {
            warn!(question = %question.index, "question has no options");
            continue;
        }
        let choice = prompt.choose(question.options.len())?;
        quiz.answer_question(question.index, question.options[choice].clone())?;
    }
    Ok(())
}

fn ask_vocabulary<R, I, O>(
    quiz: &mut Quiz<R>,
    drill: &VocabularyDrill,
    prompt: &mut Prompt<'_, I, O>,
) -> Result<(), RunError>
where
    R: Rng,
    I: BufRead,
    O: Write,
{
    writeln!(prompt.out, "Vocabulary: pick the matching definition")?;
    for item in &drill.items {
        writeln!(prompt.out, "{}", item.word)?;
        for (n, choice) in item.choices.iter().enumerate() {
            writeln!(prompt.out, "   {}) {}", n + 1, choice)?;
        }
        let choice = prompt.choose(item.choices.len())?;
        quiz.choose_definition(
            VocabKey::new(drill.section, item.word.clone()),
            item.choices[choice].clone(),
        )?;
    }
    Ok(())
}

fn ask_cloze<R, I, O>(
    quiz: &mut Quiz<R>,
    document: &Document,
    drill: &ClozeDrill,
    prompt: &mut Prompt<'_, I, O>,
) -> Result<(), RunError>
where
    R: Rng,
    I: BufRead,
    O: Write,
{
    if let Some(SectionKind::Cloze(cloze)) = document.get(drill.section).map(|section| &section.kind) {
        writeln!(prompt.out, "Fill in the blanks")?;
        writeln!(prompt.out, "{}", cloze.render_with(|index| format!("[{}]", index + 1)))?;
    }
    for blank in 0..drill.blanks.len() {
        let text = prompt.text(&format!("[{}] ", blank + 1))?;
        quiz.fill_blank(ClozeKey::new(drill.section, blank), text)?;
    }
    Ok(())
}

pub fn show_feedback(feedback: &Feedback, scores: &Scores, out: &mut impl Write) -> io::Result<()> {
    let combined = scores.combined();
    writeln!(out, "Score: {} ({}%)", combined, combined.percent())?;
    writeln!(
        out,
        "  questions {}, vocabulary {}, cloze {}",
        scores.questions, scores.vocabulary, scores.cloze
    )?;

    for item in feedback.questions.iter().filter(|item| !item.is_correct) {
        let answer = item.correct_option.as_deref().unwrap_or("(none marked)");
        writeln!(out, "  x {}: answer is {}", item.index, answer)?;
        if let Some(explanation) = &item.explanation {
            writeln!(out, "    {}", explanation)?;
        }
    }
    for item in feedback.vocabulary.iter().filter(|item| !item.is_correct) {
        writeln!(out, "  x {}: {}", item.key.word, item.definition)?;
    }
    for item in feedback.cloze.iter().filter(|item| !item.is_correct) {
        writeln!(out, "  x {}: {}", item.key, item.word)?;
    }
    Ok(())
}

pub fn show_status(status: &SubmissionStatus, out: &mut impl Write) -> io::Result<()> {
    match status {
        SubmissionStatus::Idle | SubmissionStatus::Submitting => Ok(()),
        SubmissionStatus::Succeeded { message } => writeln!(out, "{}", message),
        SubmissionStatus::Failed(SubmissionFailure::NotConfigured) => {
            writeln!(out, "Scores were not sent: no results endpoint is configured.")
        }
        SubmissionStatus::Failed(failure) => writeln!(out, "Scores were not sent: {}", failure),
    }
}

/// Carry out a submission and report where it ended up.
pub fn submit<R: Rng>(
    quiz: &mut Quiz<R>,
    dispatch: Dispatch,
    transport: &dyn Transport,
    out: &mut impl Write,
) -> io::Result<()> {
    quiz.submit_with(dispatch, transport);
    show_status(quiz.submission_status(), out)
}
