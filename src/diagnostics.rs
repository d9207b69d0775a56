//! Shared diagnostic machinery. Every stage renders its errors through the
//! same line/caret utility so the compiler's output is uniform:
//!
//! ```text
//! error: <message>
//!   4 | return 1.0
//!     |        ^^^
//! ```

use itertools::Itertools;

use crate::frontend::{SourceFile, token::Pos};

/// A single rendered compiler error, pinned to a range of columns on one
/// source line.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Raw error message without formatting, eg. 'expected type'
    pub message: String,

    line: usize,
    line_str: String,
    from: usize,
    length: usize,
}

impl Diagnostic {
    /// Create a diagnostic underlining the columns `[from.col, to.col)`,
    /// where `to` is the position immediately after the offending range
    /// (a token's `end_pos`).
    pub fn span(file: &SourceFile, from: &Pos, to: &Pos, message: impl Into<String>) -> Self {
        Self::at(file, from, to.col.saturating_sub(from.col), message)
    }

    /// Create a diagnostic underlining `length` columns starting at `from`.
    pub fn at(file: &SourceFile, from: &Pos, length: usize, message: impl Into<String>) -> Self {
        Diagnostic {
            message: message.into(),
            line: from.row + 1,
            line_str: file.line(from.row).to_owned(),
            from: from.col,
            length,
        }
    }
}

impl core::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "error: {}\n{:>3} | {}\n    | {}{}",
            self.message,
            self.line,
            self.line_str,
            " ".repeat(self.from),
            "^".repeat(self.length.max(1)),
        )
    }
}

/// An append-only list of diagnostics owned by a compiler stage. Stages check
/// each other's counts at stage boundaries and refuse to run on erroneous
/// input.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticList {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Diagnostic> {
        self.diagnostics.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.diagnostics.iter()
    }
}

impl core::fmt::Display for DiagnosticList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.diagnostics.iter().join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_message_excerpt_and_underline() {
        let file = SourceFile::from_memory("func f() int {\n\treturn 1.0\n}");
        let from = Pos {
            col: 8,
            row: 1,
            offset: 23,
            line_begin: 15,
        };
        let to = Pos {
            col: 11,
            row: 1,
            offset: 26,
            line_begin: 15,
        };

        let rendered = Diagnostic::span(&file, &from, &to, "expected return type int, got float")
            .to_string();

        let mut lines = rendered.lines();
        assert_eq!(
            lines.next(),
            Some("error: expected return type int, got float")
        );
        assert_eq!(lines.next(), Some("  2 | \treturn 1.0"));
        assert_eq!(lines.next(), Some("    |         ^^^"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn underline_is_never_empty() {
        let file = SourceFile::from_memory("x");
        let pos = Pos {
            col: 0,
            row: 0,
            offset: 0,
            line_begin: 0,
        };

        let rendered = Diagnostic::at(&file, &pos, 0, "x is undefined").to_string();
        assert!(rendered.ends_with("| ^"));
    }

    #[test]
    fn list_joins_renderings_with_newlines() {
        let file = SourceFile::from_memory("?^");
        let pos = |col| Pos {
            col,
            row: 0,
            offset: col,
            line_begin: 0,
        };

        let mut list = DiagnosticList::new();
        list.add(Diagnostic::at(&file, &pos(0), 1, "illegal token"));
        list.add(Diagnostic::at(&file, &pos(1), 1, "illegal token"));

        assert_eq!(list.len(), 2);
        assert_eq!(list.to_string().lines().count(), 6);
    }
}
