use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

const ANIMALS: &str = "\
Animals
---
questions
Q: Which barks?
A: dog [correct]
---
cloze
The *fox* jumps.
";

fn fixtures() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/quizzes")
}

fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).expect("write fixture");
    path
}

#[test]
fn fixture_suite_passes() {
    let mut cmd = cargo_bin_cmd!("quiz");
    cmd.args(["--no-color", "test"]).arg(fixtures());
    cmd.assert()
        .success()
        .stderr(predicate::str::contains("test result: ok."));
}

#[test]
fn fixture_category_filter() {
    let mut cmd = cargo_bin_cmd!("quiz");
    cmd.args(["--no-color", "test", "-c", "parsing"]).arg(fixtures());
    cmd.assert().success().stderr(
        predicate::str::contains("parsing").and(predicate::str::contains("scoring").not()),
    );
}

#[test]
fn failing_fixture_is_reported() {
    let dir = TempDir::new().expect("tempdir");
    write(
        &dir,
        "wrong.test.quiz",
        "+++\ndescription = \"expects vocabulary\"\nexpect_sections = [\"vocab\"]\n+++\nT\n---\ntext\nPassage.\n",
    );
    let mut cmd = cargo_bin_cmd!("quiz");
    cmd.args(["--no-color", "test"]).arg(dir.path());
    cmd.assert().failure().stderr(
        predicate::str::contains("(root)")
            .and(predicate::str::contains("FAIL  expects vocabulary"))
            .and(predicate::str::contains("section mismatch"))
            .and(predicate::str::contains("test result: FAILED. 0 passed, 1 failed (of 1)")),
    );
}

#[test]
fn check_accepts_clean_quiz() {
    let dir = TempDir::new().expect("tempdir");
    let file = write(&dir, "animals.txt", ANIMALS);
    let mut cmd = cargo_bin_cmd!("quiz");
    cmd.args(["--no-color", "check"]).arg(&file);
    cmd.assert()
        .success()
        .stderr(predicate::str::contains("2 item(s) per attempt"));
}

#[test]
fn check_reports_dropped_sections() {
    let dir = TempDir::new().expect("tempdir");
    let file = write(&dir, "broken.txt", "Broken\n---\nquizzes\nnothing\n");
    let mut cmd = cargo_bin_cmd!("quiz");
    cmd.args(["--no-color", "check"]).arg(&file);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized section header `quizzes`"));
}

#[test]
fn check_flags_questions_without_options() {
    let dir = TempDir::new().expect("tempdir");
    let file = write(&dir, "empty.txt", "Empty\n---\nquestions\nQ: Nothing to pick?\n");
    let mut cmd = cargo_bin_cmd!("quiz");
    cmd.args(["--no-color", "check"]).arg(&file);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("the quiz cannot be completed"));
}

#[test]
fn check_lists_sections() {
    let dir = TempDir::new().expect("tempdir");
    let file = write(
        &dir,
        "listed.txt",
        "Listed\n---\ntext\nPassage.\n---\nquestions-1\nQ: a\nA: x [correct]\nQ: b\nA: y [correct]\n",
    );
    let mut cmd = cargo_bin_cmd!("quiz");
    cmd.args(["--no-color", "check", "--list-sections"]).arg(&file);
    cmd.assert().success().stdout(
        predicate::str::contains("#0 text")
            .and(predicate::str::contains("#1 questions (1 of 2 questions, tied to #0)")),
    );
}

#[test]
fn scripted_run_reports_score_without_endpoint() {
    let dir = TempDir::new().expect("tempdir");
    let file = write(&dir, "animals.txt", ANIMALS);
    write(&dir, "quiz.toml", "[respondent]\nname = \"Ada\"\n");
    let answers = write(
        &dir,
        "answers.toml",
        "blanks = [\" FOX \"]\n\n[questions]\n\"Which barks?\" = \"dog\"\n",
    );

    let mut cmd = cargo_bin_cmd!("quiz");
    cmd.args(["--no-color", "run", "--seed", "1", "--answers"])
        .arg(&answers)
        .arg(&file);
    cmd.assert().success().stdout(
        predicate::str::contains("Score: 2/2 (100%)")
            .and(predicate::str::contains("no results endpoint is configured")),
    );
}

#[test]
fn scripted_run_needs_every_answer() {
    let dir = TempDir::new().expect("tempdir");
    let file = write(&dir, "animals.txt", ANIMALS);
    let answers = write(&dir, "answers.toml", "name = \"Ada\"\nblanks = [\"fox\"]\n");

    let mut cmd = cargo_bin_cmd!("quiz");
    cmd.args(["--no-color", "run", "--answers"]).arg(&answers).arg(&file);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("not every item is answered yet (1 of 2)"));
}

#[test]
fn interactive_run_prompts_for_each_item() {
    let dir = TempDir::new().expect("tempdir");
    let file = write(&dir, "animals.txt", ANIMALS);

    // name, question choice, blank, then decline a retry
    let mut cmd = cargo_bin_cmd!("quiz");
    cmd.args(["--no-color", "run", "--seed", "5"])
        .arg(&file)
        .write_stdin("Ada\n1\nfox\nn\n");
    cmd.assert().success().stdout(
        predicate::str::contains("Which barks?")
            .and(predicate::str::contains("The [1] jumps."))
            .and(predicate::str::contains("Score: 2/2")),
    );
}

#[test]
fn shorthand_runs_the_file() {
    let dir = TempDir::new().expect("tempdir");
    let file = write(&dir, "animals.txt", ANIMALS);
    let mut cmd = cargo_bin_cmd!("quiz");
    cmd.arg("--no-color").arg(&file).write_stdin("Ada\n1\nwolf\n");
    cmd.assert().success().stdout(
        predicate::str::contains("Score: 1/2")
            .and(predicate::str::contains("x blank 1 in section #1: fox")),
    );
}

#[test]
fn invalid_config_is_an_error() {
    let dir = TempDir::new().expect("tempdir");
    let file = write(&dir, "animals.txt", ANIMALS);
    write(&dir, "quiz.toml", "endpoint = [not toml\n");
    let mut cmd = cargo_bin_cmd!("quiz");
    cmd.args(["--no-color", "run"]).arg(&file).write_stdin("");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("invalid config"));
}

#[test]
fn input_ending_early_is_an_error() {
    let dir = TempDir::new().expect("tempdir");
    let file = write(&dir, "animals.txt", ANIMALS);
    let mut cmd = cargo_bin_cmd!("quiz");
    cmd.args(["--no-color", "run"]).arg(&file).write_stdin("Ada\n");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("input ended before the quiz was finished"));
}
