use std::ops::Range;

use codespan_reporting::diagnostic::{Diagnostic, Label, Severity};

/// A problem found while reading an authored quiz. Never fatal: the parser
/// always produces a document, and these only tell the author what was
/// skipped or looks suspicious.
#[derive(Debug, Clone)]
pub struct ParseDiagnostic {
    pub message: String,
    pub span: Range<usize>,
    pub file_id: usize,
    pub severity: Severity,
    pub notes: Vec<String>,
}

impl ParseDiagnostic {
    pub fn warning(message: impl Into<String>, span: Range<usize>, file_id: usize) -> Self {
        ParseDiagnostic {
            message: message.into(),
            span,
            file_id,
            severity: Severity::Warning,
            notes: Vec::new(),
        }
    }

    pub fn note(message: impl Into<String>, span: Range<usize>, file_id: usize) -> Self {
        ParseDiagnostic {
            message: message.into(),
            span,
            file_id,
            severity: Severity::Note,
            notes: Vec::new(),
        }
    }

    pub fn add_note(&mut self, note: impl Into<String>) -> &mut Self {
        self.notes.push(note.into());
        self
    }

    pub fn is_warning(&self) -> bool {
        self.severity >= Severity::Warning
    }

    /// Convert to a codespan-reporting Diagnostic for display.
    pub fn to_diagnostic(&self) -> Diagnostic<usize> {
        Diagnostic::new(self.severity)
            .with_message(&self.message)
            .with_labels(vec![Label::primary(self.file_id, self.span.clone())])
            .with_notes(self.notes.clone())
    }
}

/// Collects diagnostics for one file.
pub(crate) struct Reporter {
    file_id: usize,
    diagnostics: Vec<ParseDiagnostic>,
}

impl Reporter {
    pub(crate) fn new(file_id: usize) -> Self {
        Reporter {
            file_id,
            diagnostics: Vec::new(),
        }
    }

    pub(crate) fn warning(&mut self, message: impl Into<String>, span: Range<usize>) -> &mut ParseDiagnostic {
        self.push(ParseDiagnostic::warning(message, span, self.file_id))
    }

    pub(crate) fn note(&mut self, message: impl Into<String>, span: Range<usize>) -> &mut ParseDiagnostic {
        self.push(ParseDiagnostic::note(message, span, self.file_id))
    }

    fn push(&mut self, diagnostic: ParseDiagnostic) -> &mut ParseDiagnostic {
        self.diagnostics.push(diagnostic);
        let last = self.diagnostics.len() - 1;
        &mut self.diagnostics[last]
    }

    pub(crate) fn finish(self) -> Vec<ParseDiagnostic> {
        self.diagnostics
    }
}
