//! Parser and document model for delimiter-based comprehension quizzes.

macro_rules! regex {
    ($pattern:expr) => {{
        use std::sync::OnceLock;
        static REGEX: OnceLock<regex::Regex> = OnceLock::new();
        REGEX.get_or_init(|| regex::Regex::new($pattern).unwrap_or_else(|e| panic!("{}", e)))
    }};
}

pub mod document;
pub mod parser;
pub mod random;
pub mod section;

pub use document::{Document, Section, SectionId, SectionKind};
pub use parser::{ParseDiagnostic, Parsed, Parser};
