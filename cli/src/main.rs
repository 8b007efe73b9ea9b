mod config;
mod http;
mod run;
mod test_runner;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use clap::{ArgAction, Parser, Subcommand};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::debug;
use tracing_subscriber::filter::LevelFilter;

use quizdoc::{Document, ParseDiagnostic, SectionKind};
use session::{Quiz, Respondent};

use crate::config::Config;
use crate::http::HttpTransport;
use crate::run::AnswerScript;

const SUBCOMMANDS: &[&str] = &["run", "check", "test", "help"];

#[derive(Parser)]
#[command(name = "quiz", version, about = "Comprehension quiz runner")]
struct Cli {
    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// More log output on stderr. Repeatable.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Take a quiz in the terminal
    Run(RunArgs),

    /// Parse a quiz and report authoring problems
    Check(CheckArgs),

    /// Run .test.quiz test files
    Test(TestArgs),
}

#[derive(clap::Args)]
struct RunArgs {
    /// Quiz source file
    file: PathBuf,

    /// Seed for a reproducible attempt
    #[arg(long)]
    seed: Option<u64>,

    /// Answer from a TOML file instead of prompting
    #[arg(long)]
    answers: Option<PathBuf>,

    /// Config file (default: quiz.toml next to the quiz)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Results endpoint, overriding the config
    #[arg(long)]
    endpoint: Option<String>,

    /// Respondent name, overriding the config
    #[arg(long)]
    name: Option<String>,
}

#[derive(clap::Args)]
struct CheckArgs {
    /// Quiz source file
    file: PathBuf,

    /// Dump the parsed document
    #[arg(long)]
    ast: bool,

    /// List sections with their capacities and anchors
    #[arg(long, conflicts_with = "ast")]
    list_sections: bool,
}

#[derive(clap::Args)]
struct TestArgs {
    /// Path to a .test.quiz file or directory containing them
    path: PathBuf,

    /// Run only tests in these categories (subfolder names). Repeatable.
    #[arg(short, long)]
    category: Vec<String>,

    /// List available categories and exit
    #[arg(long)]
    list_categories: bool,
}

fn main() {
    // `quiz lesson.txt` is shorthand for `quiz run lesson.txt`.
    let mut args: Vec<String> = std::env::args().collect();
    let first_positional = args
        .iter()
        .enumerate()
        .skip(1)
        .find(|(_, arg)| !arg.starts_with('-'))
        .map(|(pos, arg)| (pos, arg.clone()));
    if let Some((pos, first)) = first_positional {
        if !SUBCOMMANDS.contains(&first.as_str()) {
            args.insert(pos, "run".to_string());
        }
    }

    let cli = Cli::parse_from(&args);
    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Command::Run(run_args) => do_run(run_args, cli.no_color),
        Command::Check(check_args) => do_check(check_args, cli.no_color),
        Command::Test(test_args) => {
            if test_args.list_categories {
                test_runner::list_categories(&test_args.path);
                return;
            }
            let exit_code = test_runner::run_tests(&test_args.path, cli.no_color, &test_args.category);
            process::exit(exit_code);
        }
    }
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => LevelFilter::ERROR,
        (false, 0) => LevelFilter::WARN,
        (false, 1) => LevelFilter::INFO,
        (false, 2) => LevelFilter::DEBUG,
        (false, _) => LevelFilter::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn color_choice(no_color: bool) -> ColorChoice {
    if no_color {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    }
}

fn read_source(path: &Path) -> String {
    match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: cannot read '{}': {}", path.display(), e);
            process::exit(1);
        }
    }
}

fn emit_diagnostics(
    no_color: bool,
    files: &SimpleFiles<String, String>,
    diagnostics: &[ParseDiagnostic],
) {
    let writer = StandardStream::stderr(color_choice(no_color));
    let config = term::Config::default();
    for diagnostic in diagnostics {
        let _ = term::emit_to_write_style(
            &mut writer.lock(),
            &config,
            files,
            &diagnostic.to_diagnostic(),
        );
    }
}

fn do_check(args: CheckArgs, no_color: bool) {
    let source = read_source(&args.file);
    let mut files = SimpleFiles::new();
    let file_id = files.add(args.file.display().to_string(), source.clone());

    let parsed = quizdoc::Parser::new(source, file_id).parse();
    emit_diagnostics(no_color, &files, &parsed.diagnostics);

    if args.ast {
        println!("{:#?}", parsed.document);
    } else if args.list_sections {
        print_sections(&parsed.document);
    }

    let warnings = parsed.warnings().count();
    if warnings > 0 {
        eprintln!("{}: {} warning(s)", args.file.display(), warnings);
        process::exit(1);
    }
    let counts = parsed.document.item_counts();
    eprintln!(
        "ok: {} parsed: {} section(s), {} item(s) per attempt",
        args.file.display(),
        parsed.document.sections.len(),
        counts.total()
    );
}

fn print_sections(document: &Document) {
    for section in &document.sections {
        let detail = match &section.kind {
            SectionKind::Vocabulary(vocabulary) => {
                format!("{} of {} words", vocabulary.items_per_attempt(), vocabulary.len())
            }
            SectionKind::Cloze(cloze) => {
                format!("{} of {} marked words", cloze.blank_count(), cloze.markers.len())
            }
            SectionKind::Questions(group) => {
                let placement = match group.attached_to {
                    Some(anchor) => format!(", tied to {}", anchor),
                    None => String::new(),
                };
                format!(
                    "{} of {} questions{}",
                    group.items_per_attempt(),
                    group.bank.len(),
                    placement
                )
            }
            _ => String::new(),
        };
        if detail.is_empty() {
            println!("{} {}", section.id, section.kind.label());
        } else {
            println!("{} {} ({})", section.id, section.kind.label(), detail);
        }
    }
}

fn do_run(args: RunArgs, no_color: bool) {
    let source = read_source(&args.file);

    let config = match Config::load(args.config.as_deref(), &args.file) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(1);
        }
    };

    let script = args.answers.as_deref().map(|path| {
        let content = read_source(path);
        match toml::from_str::<AnswerScript>(&content) {
            Ok(script) => script,
            Err(e) => {
                eprintln!("error: invalid answer file '{}': {}", path.display(), e);
                process::exit(1);
            }
        }
    });

    let mut rng = match args.seed.or(config.seed) {
        Some(seed) => {
            debug!(seed, "seeded run");
            StdRng::seed_from_u64(seed)
        }
        None => StdRng::from_entropy(),
    };

    let mut files = SimpleFiles::new();
    let file_id = files.add(args.file.display().to_string(), source.clone());
    let parsed = quizdoc::Parser::new(source, file_id).parse_with_rng(&mut rng);
    emit_diagnostics(no_color, &files, &parsed.diagnostics);

    let endpoint = args.endpoint.or(config.endpoint.clone());
    let mut quiz = Quiz::new(Arc::new(parsed.document), endpoint, rng);

    let transport = match HttpTransport::new(http::DEFAULT_TIMEOUT) {
        Ok(transport) => transport,
        Err(e) => {
            eprintln!("error: cannot set up HTTP client: {}", e);
            process::exit(1);
        }
    };

    let name = args
        .name
        .or_else(|| script.as_ref().and_then(|script| script.name.clone()));
    let respondent = match name {
        Some(name) => Some(Respondent {
            name,
            ..config.respondent.respondent().unwrap_or_default()
        }),
        None => config.respondent.respondent(),
    };

    let mut stdout = io::stdout().lock();
    let result = match script {
        Some(script) => run_scripted(&mut quiz, respondent, &script, &transport, &mut stdout),
        None => {
            let mut stdin = io::stdin().lock();
            run::interactive(&mut quiz, respondent, &transport, &mut stdin, &mut stdout)
        }
    };

    if let Err(e) = result {
        eprintln!("error: {}", e);
        process::exit(1);
    }
}

fn run_scripted(
    quiz: &mut Quiz<StdRng>,
    respondent: Option<Respondent>,
    script: &AnswerScript,
    transport: &HttpTransport,
    out: &mut impl io::Write,
) -> Result<(), run::RunError> {
    quiz.unlock(respondent.unwrap_or_default())?;
    run::apply_script(quiz, script)?;
    let checked = quiz.check()?;
    if let Some(feedback) = quiz.session().feedback() {
        run::show_feedback(feedback, &checked.scores, out)?;
    }
    run::submit(quiz, checked.dispatch, transport, out)?;
    Ok(())
}
