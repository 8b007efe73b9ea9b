use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use codespan_reporting::term::termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Deserialize;
use tracing::{debug, warn};

use quizdoc::ParseDiagnostic;
use session::{Quiz, Respondent, Scores, SessionError};

use crate::run::{self, Strategy};

const EXTENSION: &str = ".test.quiz";

#[derive(Debug, Deserialize)]
pub struct ExpectedWarning {
    /// Substring that must appear in the warning message.
    pub contains: String,

    /// If set, the warning's span must start on this 1-based source line.
    #[serde(default)]
    pub line: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TestConfig {
    /// Human-readable test description.
    #[serde(default)]
    pub description: Option<String>,

    /// Seed for parsing and attempt generation.
    #[serde(default)]
    pub seed: u64,

    /// How to answer. Defaults to `correct` when a score is expected.
    #[serde(default)]
    pub answers: Option<Strategy>,

    /// Section labels in document order, e.g. `["text", "questions"]`.
    #[serde(default)]
    pub expect_sections: Option<Vec<String>>,

    /// Scorable items in one attempt.
    #[serde(default)]
    pub expect_items: Option<usize>,

    /// Combined score as `correct/total`.
    #[serde(default)]
    pub expect_score: Option<String>,

    /// Expected warnings. If present (even empty), warning count and content are checked.
    #[serde(default)]
    pub expect_warnings: Option<Vec<ExpectedWarning>>,
}

/// Split a `.test.quiz` file into its TOML config and quiz source.
fn parse_test_file(content: &str) -> Result<(TestConfig, &str), String> {
    let content = content.trim_start_matches('\u{feff}');

    // The frontmatter is fenced with `+++` so it cannot be mistaken for a
    // section delimiter.
    if !content.starts_with("+++") {
        return Err("missing opening +++ frontmatter delimiter".into());
    }

    let after_open = &content[3..];
    let after_open = after_open
        .strip_prefix('\n')
        .or_else(|| after_open.strip_prefix("\r\n"))
        .unwrap_or(after_open);

    let close_pos = after_open
        .find("\n+++")
        .ok_or("missing closing +++ frontmatter delimiter")?;

    let toml_str = after_open[..close_pos].trim_end_matches('\r');
    let rest = &after_open[close_pos + 4..];
    let source = rest
        .strip_prefix("\r\n")
        .or_else(|| rest.strip_prefix('\n'))
        .unwrap_or(rest);

    let config: TestConfig =
        toml::from_str(toml_str).map_err(|e| format!("TOML parse error: {}", e))?;

    Ok((config, source))
}

pub enum TestOutcome {
    Pass,
    Fail(String),
}

pub struct TestResult {
    pub path: PathBuf,
    pub description: Option<String>,
    pub outcome: TestOutcome,
}

fn run_single_test(path: &Path) -> TestResult {
    let fail = |description: Option<String>, reason: String| TestResult {
        path: path.to_path_buf(),
        description,
        outcome: TestOutcome::Fail(reason),
    };

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => return fail(None, format!("cannot read file: {}", e)),
    };

    let (config, source) = match parse_test_file(&content) {
        Ok(pair) => pair,
        Err(e) => return fail(None, format!("frontmatter error: {}", e)),
    };
    let description = config.description.clone();

    match check_test(&config, source) {
        Some(reason) => fail(description, reason),
        None => TestResult {
            path: path.to_path_buf(),
            description,
            outcome: TestOutcome::Pass,
        },
    }
}

/// Run one test's expectations against `source`. Returns `Some(reason)` on
/// the first mismatch.
fn check_test(config: &TestConfig, source: &str) -> Option<String> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let parsed = quizdoc::Parser::new(source.to_string(), 0).parse_with_rng(&mut rng);

    if let Some(expected) = &config.expect_sections {
        let actual: Vec<&str> = parsed
            .document
            .sections
            .iter()
            .map(|section| section.kind.label())
            .collect();
        if actual != *expected {
            return Some(format!(
                "section mismatch\n  expected: {}\n  actual:   {}",
                expected.join(", "),
                actual.join(", ")
            ));
        }
    }

    if let Some(expected_warnings) = &config.expect_warnings {
        if let Some(reason) = check_warnings(source, &parsed.diagnostics, expected_warnings) {
            return Some(reason);
        }
    }

    let mut quiz = Quiz::new(Arc::new(parsed.document), None, rng);

    if let Some(expected) = config.expect_items {
        let actual = quiz.session().attempt().item_counts().total();
        if actual != expected {
            return Some(format!("expected {} item(s) per attempt, got {}", expected, actual));
        }
    }

    let strategy = match (config.answers, &config.expect_score) {
        (Some(strategy), _) => strategy,
        (None, Some(_)) => Strategy::Correct,
        (None, None) => return None,
    };

    let scores = match take_quiz(&mut quiz, strategy) {
        Ok(scores) => scores,
        Err(e) => return Some(format!("session error: {}", e)),
    };

    match &config.expect_score {
        Some(expected) if scores.combined().to_string() != expected.trim() => Some(format!(
            "score mismatch\n  expected: {}\n  actual:   {}",
            expected.trim(),
            scores.combined()
        )),
        _ => None,
    }
}

fn take_quiz(quiz: &mut Quiz<StdRng>, strategy: Strategy) -> Result<Scores, SessionError> {
    quiz.unlock(Respondent::named("test"))?;
    run::answer_all(quiz, strategy)?;
    Ok(quiz.check()?.scores)
}

/// Convert a byte offset in `source` to a 1-based line number.
fn byte_offset_to_line(source: &str, offset: usize) -> usize {
    source[..offset.min(source.len())]
        .bytes()
        .filter(|&b| b == b'\n')
        .count()
        + 1
}

/// Check that actual warnings match expectations. Returns `Some(reason)` on mismatch.
fn check_warnings(
    source: &str,
    diagnostics: &[ParseDiagnostic],
    expected: &[ExpectedWarning],
) -> Option<String> {
    let actual_warnings: Vec<&ParseDiagnostic> =
        diagnostics.iter().filter(|d| d.is_warning()).collect();

    if actual_warnings.len() != expected.len() {
        let actual_msgs: Vec<String> = actual_warnings
            .iter()
            .map(|w| format!("  - {}", w.message))
            .collect();
        return Some(format!(
            "expected {} warning(s), got {}\n  actual warnings:\n{}",
            expected.len(),
            actual_warnings.len(),
            if actual_msgs.is_empty() {
                "    (none)".to_string()
            } else {
                actual_msgs.join("\n")
            }
        ));
    }

    for (i, (actual, expected)) in actual_warnings.iter().zip(expected.iter()).enumerate() {
        if !actual.message.contains(&expected.contains) {
            return Some(format!(
                "warning[{}]: expected message containing \"{}\", got: {}",
                i, expected.contains, actual.message
            ));
        }

        if let Some(expected_line) = expected.line {
            let actual_line = byte_offset_to_line(source, actual.span.start);
            if actual_line != expected_line {
                return Some(format!(
                    "warning[{}]: expected on line {}, but span is on line {}",
                    i, expected_line, actual_line
                ));
            }
        }
    }

    None
}

// ---------------------------------------------------------------------------
// Discovery
// ---------------------------------------------------------------------------

/// Test files under `root`, keyed by their folder relative to `root` ("" for
/// files directly inside it). Each list is sorted.
fn discover(root: &Path) -> BTreeMap<String, Vec<PathBuf>> {
    let mut found: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        let Ok(entries) = std::fs::read_dir(&dir) else {
            debug!(dir = %dir.display(), "skipping unreadable directory");
            continue;
        };
        for path in entries.flatten().map(|entry| entry.path()) {
            if path.is_dir() {
                pending.push(path);
            } else if is_test_file(&path) {
                let category = dir
                    .strip_prefix(root)
                    .map(|rel| rel.to_string_lossy().replace('\\', "/"))
                    .unwrap_or_default();
                found.entry(category).or_default().push(path);
            }
        }
    }
    for files in found.values_mut() {
        files.sort();
    }
    found
}

fn is_test_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.ends_with(EXTENSION))
}

fn category_label(category: &str) -> &str {
    if category.is_empty() { "(root)" } else { category }
}

pub fn list_categories(path: &Path) {
    if path.is_file() {
        eprintln!("(single file, no categories)");
        return;
    }
    let categories = discover(path);
    if categories.is_empty() {
        eprintln!("no {} files found in {}", EXTENSION, path.display());
        return;
    }
    eprintln!("available categories:");
    for (category, files) in &categories {
        eprintln!("  {} ({} tests)", category_label(category), files.len());
    }
}

/// Keep the requested categories along with their subfolders.
fn select_categories(
    all: BTreeMap<String, Vec<PathBuf>>,
    requested: &[String],
) -> BTreeMap<String, Vec<PathBuf>> {
    let wanted: Vec<&str> = requested.iter().map(|name| name.trim_matches('/')).collect();
    for &name in &wanted {
        if !all.keys().any(|category| in_category(category, name)) {
            let available: Vec<&str> = all.keys().map(|category| category_label(category)).collect();
            warn!(category = name, available = %available.join(", "), "category not found");
        }
    }
    all.into_iter()
        .filter(|(category, _)| wanted.iter().any(|name| in_category(category, name)))
        .collect()
}

fn in_category(category: &str, name: &str) -> bool {
    category == name
        || category
            .strip_prefix(name)
            .is_some_and(|rest| rest.starts_with('/'))
}

// ---------------------------------------------------------------------------
// Running and reporting
// ---------------------------------------------------------------------------

impl TestResult {
    /// The description, or the file name without its extension.
    fn name(&self) -> &str {
        self.description.as_deref().unwrap_or_else(|| {
            self.path
                .file_name()
                .and_then(|name| name.to_str())
                .map(|name| name.trim_end_matches(EXTENSION))
                .unwrap_or("?")
        })
    }
}

/// Test progress on stderr.
struct Console {
    out: StandardStream,
}

impl Console {
    fn new(no_color: bool) -> Self {
        let choice = if no_color { ColorChoice::Never } else { ColorChoice::Auto };
        Console {
            out: StandardStream::stderr(choice),
        }
    }

    fn styled(&mut self, text: &str, spec: &ColorSpec) -> io::Result<()> {
        self.out.set_color(spec)?;
        write!(self.out, "{}", text)?;
        self.out.reset()
    }

    fn heading(&mut self, category: &str) -> io::Result<()> {
        writeln!(self.out)?;
        self.styled(category_label(category), ColorSpec::new().set_bold(true))?;
        writeln!(self.out)
    }

    fn outcome(&mut self, result: &TestResult) -> io::Result<()> {
        write!(self.out, "  ")?;
        match &result.outcome {
            TestOutcome::Pass => self.styled("PASS", &colored(Color::Green))?,
            TestOutcome::Fail(_) => self.styled("FAIL", &colored(Color::Red))?,
        }
        writeln!(self.out, "  {}", result.name())
    }

    fn failures(&mut self, failures: &[TestResult]) -> io::Result<()> {
        writeln!(self.out, "\nfailures:")?;
        for failure in failures {
            writeln!(self.out, "\n  --- {} ---", failure.path.display())?;
            if let TestOutcome::Fail(reason) = &failure.outcome {
                for line in reason.lines() {
                    writeln!(self.out, "  {}", line)?;
                }
            }
        }
        Ok(())
    }

    fn summary(&mut self, passed: usize, failed: usize) -> io::Result<()> {
        write!(self.out, "\ntest result: ")?;
        if failed == 0 {
            self.styled("ok", &colored(Color::Green))?;
            writeln!(self.out, ". {} passed, 0 failed", passed)
        } else {
            self.styled("FAILED", &colored(Color::Red))?;
            writeln!(
                self.out,
                ". {} passed, {} failed (of {})",
                passed,
                failed,
                passed + failed
            )
        }
    }
}

fn colored(color: Color) -> ColorSpec {
    let mut spec = ColorSpec::new();
    spec.set_fg(Some(color));
    spec
}

/// Run all `.test.quiz` files under `path` (or a single file), optionally
/// limited to `categories`. Returns the process exit code.
pub fn run_tests(path: &Path, no_color: bool, categories: &[String]) -> i32 {
    let single = path.is_file();
    let selected = if single {
        BTreeMap::from([(String::new(), vec![path.to_path_buf()])])
    } else {
        let all = discover(path);
        if all.is_empty() {
            eprintln!("no {} files found in {}", EXTENSION, path.display());
            return 1;
        }
        if categories.is_empty() {
            all
        } else {
            select_categories(all, categories)
        }
    };

    if selected.is_empty() {
        eprintln!("no matching categories found");
        return 1;
    }

    let mut console = Console::new(no_color);
    match run_selected(&mut console, &selected, single) {
        Ok(0) => 0,
        Ok(_) => 1,
        Err(e) => {
            eprintln!("error: cannot write test report: {}", e);
            1
        }
    }
}

/// Returns the number of failed tests.
fn run_selected(
    console: &mut Console,
    selected: &BTreeMap<String, Vec<PathBuf>>,
    single: bool,
) -> io::Result<usize> {
    let mut passed = 0;
    let mut failures = Vec::new();
    for (category, files) in selected {
        if !single {
            console.heading(category)?;
        }
        for file in files {
            let result = run_single_test(file);
            console.outcome(&result)?;
            match result.outcome {
                TestOutcome::Pass => passed += 1,
                TestOutcome::Fail(_) => failures.push(result),
            }
        }
    }

    if !failures.is_empty() {
        console.failures(&failures)?;
    }
    console.summary(passed, failures.len())?;
    debug!(passed, failed = failures.len(), "test run finished");
    Ok(failures.len())
}
