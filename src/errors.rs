//! Organised Assembly error handling.
//!
//! Every user-facing failure is one [`OasmError`]: what went wrong
//! ([`ErrorKind`]), where ([`SourceInfo`]) and how to help ([`DiagnosticInfo`]).
//! Rendering goes through miette.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use miette::{Diagnostic, LabeledSpan, NamedSource, SourceSpan};

use crate::syntax::grammar::GrammarError;
use crate::syntax::input::Position;

// ============================================================================
// SOURCE CONTEXT
// ============================================================================

/// A named piece of source text that errors can point into.
#[derive(Debug, Clone)]
pub struct SourceContext {
    pub name: String,
    pub content: String,
}

impl SourceContext {
    /// Line endings are normalized: `\r\n` and a lone `\r` both become `\n`.
    pub fn from_file(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: normalize_newlines(content.into()),
        }
    }

    /// Stand-in for errors that have no source text, such as I/O failures.
    pub fn fallback(context: &str) -> Self {
        Self {
            name: context.to_string(),
            content: String::new(),
        }
    }

    pub fn to_named_source(&self) -> Arc<NamedSource<String>> {
        Arc::new(NamedSource::new(self.name.clone(), self.content.clone()))
    }
}

fn normalize_newlines(text: String) -> String {
    if !text.contains('\r') {
        return text;
    }
    text.replace("\r\n", "\n").replace('\r', "\n")
}

// ============================================================================
// ERROR TYPE
// ============================================================================

#[derive(Debug)]
pub struct OasmError {
    pub kind: ErrorKind,
    pub source_info: SourceInfo,
    pub diagnostic_info: DiagnosticInfo,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    // Parse failures, reported at the furthest point the parse reached.
    ReservedWord {
        word: String,
    },
    InvalidCharacter {
        character: char,
        expected: String,
    },
    UnexpectedToken {
        expected: String,
        found: String,
    },
    UnexpectedEnd {
        expected: String,
    },
    TrailingInput {
        found: String,
    },
    NestingTooDeep {
        limit: usize,
    },

    // Driver failures
    UnknownRule {
        rule: String,
    },
    Io {
        path: String,
        message: String,
    },
    Cache {
        path: String,
        message: String,
    },
    Grammar {
        message: String,
    },
}

#[derive(Debug, Clone)]
pub struct SourceInfo {
    pub source: Arc<NamedSource<String>>,
    pub primary_span: SourceSpan,
    /// 1-based location of the failure, when it is tied to source text.
    pub location: Option<Position>,
    pub phase: String,
}

#[derive(Debug, Clone)]
pub struct DiagnosticInfo {
    pub help: Option<String>,
    pub error_code: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Input matched no terminal where one was required.
    Lexical,
    /// A required element was missing or out of place.
    Structural,
    Io,
    Cache,
    Internal,
}

impl ErrorKind {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ReservedWord { .. } | Self::InvalidCharacter { .. } => ErrorCategory::Lexical,
            Self::UnexpectedToken { .. }
            | Self::UnexpectedEnd { .. }
            | Self::TrailingInput { .. }
            | Self::NestingTooDeep { .. } => ErrorCategory::Structural,
            Self::Io { .. } => ErrorCategory::Io,
            Self::Cache { .. } => ErrorCategory::Cache,
            Self::UnknownRule { .. } | Self::Grammar { .. } => ErrorCategory::Internal,
        }
    }

    pub const fn code_suffix(&self) -> &'static str {
        match self {
            Self::ReservedWord { .. } => "reserved_word",
            Self::InvalidCharacter { .. } => "invalid_character",
            Self::UnexpectedToken { .. } => "unexpected_token",
            Self::UnexpectedEnd { .. } => "unexpected_end",
            Self::TrailingInput { .. } => "trailing_input",
            Self::NestingTooDeep { .. } => "nesting_too_deep",
            Self::UnknownRule { .. } => "unknown_rule",
            Self::Io { .. } => "io",
            Self::Cache { .. } => "cache",
            Self::Grammar { .. } => "grammar",
        }
    }

    fn default_help(&self) -> Option<String> {
        match self {
            Self::ReservedWord { word } => Some(format!(
                "'{word}' is a reserved word and cannot be used as a name"
            )),
            Self::UnexpectedEnd { .. } => {
                Some("the file ended early; check for an unclosed '{', '(' or '['".into())
            }
            Self::TrailingInput { .. } => {
                Some("everything after the last complete statement must be removed".into())
            }
            Self::NestingTooDeep { .. } => {
                Some("split the nested expression or block into smaller pieces".into())
            }
            Self::Grammar { .. } => Some(
                "the built-in grammar is inconsistent; this is a bug, please report it".into(),
            ),
            _ => None,
        }
    }
}

impl std::error::Error for OasmError {}

impl fmt::Display for OasmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(at) = self.source_info.location {
            write!(f, "{}:{}:{}: ", self.source_info.source.name(), at.line, at.column)?;
        }
        match &self.kind {
            ErrorKind::ReservedWord { word } => {
                write!(f, "syntax error: reserved word '{word}' used as a name")
            }
            ErrorKind::InvalidCharacter {
                character,
                expected,
            } => write!(
                f,
                "syntax error: invalid character {character:?}, expected {expected}"
            ),
            ErrorKind::UnexpectedToken { expected, found } => {
                write!(f, "syntax error: expected {expected}, found {found}")
            }
            ErrorKind::UnexpectedEnd { expected } => {
                write!(f, "syntax error: expected {expected}, found end of input")
            }
            ErrorKind::TrailingInput { found } => {
                write!(f, "syntax error: expected end of input, found {found}")
            }
            ErrorKind::NestingTooDeep { limit } => {
                write!(f, "syntax error: nesting is deeper than {limit} rule levels")
            }
            ErrorKind::UnknownRule { rule } => write!(f, "no grammar rule named '{rule}'"),
            ErrorKind::Io { path, message } => write!(f, "cannot access {path}: {message}"),
            ErrorKind::Cache { path, message } => {
                write!(f, "cannot update parse cache {path}: {message}")
            }
            ErrorKind::Grammar { message } => write!(f, "invalid grammar: {message}"),
        }
    }
}

impl Diagnostic for OasmError {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(&self.diagnostic_info.error_code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.diagnostic_info
            .help
            .as_ref()
            .map(|h| Box::new(h) as Box<dyn fmt::Display>)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        self.source_info.location?;
        let label = LabeledSpan::new_with_span(
            Some(self.primary_label().into()),
            self.source_info.primary_span,
        );
        Some(Box::new(std::iter::once(label)))
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        self.source_info.location?;
        Some(&*self.source_info.source)
    }
}

impl OasmError {
    pub fn category(&self) -> ErrorCategory {
        self.kind.category()
    }

    fn primary_label(&self) -> &'static str {
        match &self.kind {
            ErrorKind::ReservedWord { .. } => "reserved word",
            ErrorKind::InvalidCharacter { .. } => "invalid character",
            ErrorKind::UnexpectedToken { .. } => "unexpected token",
            ErrorKind::UnexpectedEnd { .. } => "input ends here",
            ErrorKind::TrailingInput { .. } => "not part of any statement",
            ErrorKind::NestingTooDeep { .. } => "nesting limit reached here",
            ErrorKind::UnknownRule { .. }
            | ErrorKind::Io { .. }
            | ErrorKind::Cache { .. }
            | ErrorKind::Grammar { .. } => "here",
        }
    }

    /// An error pointing at `span` inside `source`.
    pub fn at(
        kind: ErrorKind,
        source: &SourceContext,
        span: SourceSpan,
        location: Position,
        phase: &str,
    ) -> Self {
        Self::build(kind, source.to_named_source(), span, Some(location), phase)
    }

    /// An error with no position in any source text.
    pub fn unspanned(kind: ErrorKind, context: &str, phase: &str) -> Self {
        let source = SourceContext::fallback(context).to_named_source();
        Self::build(kind, source, unspanned(), None, phase)
    }

    pub fn io(path: &Path, error: &std::io::Error) -> Self {
        let path = path.display().to_string();
        Self::unspanned(
            ErrorKind::Io {
                path: path.clone(),
                message: error.to_string(),
            },
            &path,
            "io",
        )
    }

    pub fn cache(path: &Path, message: impl Into<String>) -> Self {
        let path = path.display().to_string();
        Self::unspanned(
            ErrorKind::Cache {
                path: path.clone(),
                message: message.into(),
            },
            &path,
            "cache",
        )
    }

    fn build(
        kind: ErrorKind,
        source: Arc<NamedSource<String>>,
        span: SourceSpan,
        location: Option<Position>,
        phase: &str,
    ) -> Self {
        let error_code = format!("oasm::{}::{}", phase, kind.code_suffix());
        let help = kind.default_help();
        Self {
            kind,
            source_info: SourceInfo {
                source,
                primary_span: span,
                location,
                phase: phase.to_string(),
            },
            diagnostic_info: DiagnosticInfo { help, error_code },
        }
    }
}

impl From<GrammarError> for OasmError {
    fn from(error: GrammarError) -> Self {
        Self::unspanned(
            ErrorKind::Grammar {
                message: error.to_string(),
            },
            "grammar",
            "grammar",
        )
    }
}

/// Placeholder span for errors not tied to a source location.
pub fn unspanned() -> SourceSpan {
    SourceSpan::from(0..0)
}

// ============================================================================
// ERROR FORMATTING UTILITIES
// ============================================================================

/// Prints an error with full miette diagnostics to stderr.
pub fn print_error(error: OasmError) {
    use miette::Report;
    let report = Report::new(error);
    eprintln!("{report:?}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_combines_phase_and_kind() {
        let source = SourceContext::from_file("main.oasm", "byte[byte] = 1");
        let error = OasmError::at(
            ErrorKind::ReservedWord {
                word: "byte".into(),
            },
            &source,
            (5..9).into(),
            Position {
                offset: 5,
                line: 1,
                column: 6,
            },
            "parse",
        );
        assert_eq!(error.diagnostic_info.error_code, "oasm::parse::reserved_word");
        assert_eq!(error.category(), ErrorCategory::Lexical);
        assert_eq!(
            error.to_string(),
            "main.oasm:1:6: syntax error: reserved word 'byte' used as a name"
        );
    }

    #[test]
    fn source_line_endings_become_newlines() {
        let source = SourceContext::from_file("dos.oasm", "nop\r\nret\rnop\n");
        assert_eq!(source.content, "nop\nret\nnop\n");
    }

    #[test]
    fn unspanned_errors_have_no_labels() {
        let error = OasmError::io(
            Path::new("missing.oasm"),
            &std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        );
        assert!(error.labels().is_none());
        assert_eq!(error.category(), ErrorCategory::Io);
        assert!(error.to_string().starts_with("cannot access missing.oasm"));
    }
}
