pub mod diagnostic;
mod builder;
mod scanner;
mod sections;

pub use diagnostic::ParseDiagnostic;

use rand::Rng;
use tracing::debug;

use crate::document::Document;
use crate::parser::diagnostic::Reporter;

/// Parser entry point.
pub struct Parser {
    source: String,
    file_id: usize,
}

/// The result of parsing. There is always a document; anything that could
/// not be used is described in `diagnostics`.
#[derive(Debug, Clone)]
pub struct Parsed {
    pub document: Document,
    pub diagnostics: Vec<ParseDiagnostic>,
}

impl Parsed {
    pub fn warnings(&self) -> impl Iterator<Item = &ParseDiagnostic> {
        self.diagnostics.iter().filter(|d| d.is_warning())
    }
}

impl Parser {
    pub fn new(source: String, file_id: usize) -> Self {
        Parser { source, file_id }
    }

    /// Parse with thread-local entropy for cloze blank selection.
    pub fn parse(&self) -> Parsed {
        self.parse_with_rng(&mut rand::thread_rng())
    }

    /// Parse with a caller-supplied random source, so cloze blank selection
    /// is reproducible under a seeded generator.
    pub fn parse_with_rng<R: Rng + ?Sized>(&self, rng: &mut R) -> Parsed {
        let mut reporter = Reporter::new(self.file_id);
        let scan = scanner::scan(&self.source);
        let document = builder::build(scan, rng, &mut reporter);
        let diagnostics = reporter.finish();
        debug!(
            title = %document.title,
            sections = document.sections.len(),
            diagnostics = diagnostics.len(),
            "document parsed"
        );
        Parsed {
            document,
            diagnostics,
        }
    }
}
