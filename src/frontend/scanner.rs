use tracing::debug;

use crate::{
    diagnostics::{Diagnostic, DiagnosticList},
    frontend::{
        SourceFile,
        token::{DOUBLE_TOKENS, Pos, SINGLE_TOKENS, Token, TokenKind, lookup_word},
    },
};

/// Position preserving tokenizer for Koi source text. Only ASCII is
/// significant; whitespace is discarded but newlines produce tokens since
/// they terminate statements.
#[derive(Debug)]
pub struct Scanner<'src> {
    file: &'src SourceFile,

    /// Byte offset of the cursor
    pos: usize,
    row: usize,
    col: usize,
    /// Byte offset of the first character on the current line
    line_begin: usize,

    /// Byte offset of the first character of the token being scanned
    base: usize,
    /// Column of the first character of the token being scanned
    start_col: usize,

    diagnostics: DiagnosticList,
}

impl<'src> Scanner<'src> {
    pub fn new(file: &'src SourceFile) -> Self {
        Self {
            file,
            pos: 0,
            row: 0,
            col: 0,
            line_begin: 0,
            base: 0,
            start_col: 0,
            diagnostics: DiagnosticList::new(),
        }
    }

    /// Consumes and returns the next token. At end of input an EOF sentinel
    /// is returned on every call.
    pub fn scan(&mut self) -> Token {
        loop {
            self.skip_whitespace();

            if self.eof() {
                return Token::eof(self.position());
            }

            // A line comment consumes its body and the newline that ends it,
            // producing no tokens.
            if self.cur() == b'/' && self.peek() == Some(b'/') {
                self.skip_line_comment();
                continue;
            }

            break;
        }

        self.base = self.pos;
        self.start_col = self.col;

        match self.cur() {
            b'\n' => self.scan_newline(),
            c if c.is_ascii_alphabetic() || c == b'_' => self.scan_word(),
            c if c.is_ascii_digit() => self.scan_number(),
            b'"' => self.scan_string(),
            b'\'' => self.scan_byte_literal(),
            _ => self.scan_symbol(),
        }
    }

    /// Runs the scanner to completion, returning every token including the
    /// terminating EOF sentinel.
    pub fn scan_all(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();

        loop {
            let token = self.scan();
            let eof = token.eof;
            tokens.push(token);

            if eof {
                break;
            }
        }

        debug!(
            tokens = tokens.len(),
            errors = self.num_errors(),
            "scanned {}",
            self.file.origin
        );

        tokens
    }

    pub fn num_errors(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn diagnostics(&self) -> &DiagnosticList {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> DiagnosticList {
        self.diagnostics
    }

    fn scan_newline(&mut self) -> Token {
        self.advance();
        let token = self.make_token(TokenKind::Newline);

        self.row += 1;
        self.col = 0;
        self.line_begin = self.pos;

        token
    }

    fn scan_word(&mut self) -> Token {
        while !self.eof() && (self.cur().is_ascii_alphanumeric() || self.cur() == b'_') {
            self.advance();
        }

        self.make_token(lookup_word(&self.lexeme()))
    }

    fn scan_number(&mut self) -> Token {
        while !self.eof() && (self.cur().is_ascii_digit() || self.cur() == b'.') {
            self.advance();
        }

        let dots = self.file.contents[self.base..self.pos]
            .iter()
            .filter(|&&c| c == b'.')
            .count();

        match dots {
            0 => self.make_token(TokenKind::IntegerLiteral),
            1 => self.make_token(TokenKind::FloatLiteral),
            _ => self.make_invalid_token(
                TokenKind::FloatLiteral,
                "number literal can have at most one decimal point",
            ),
        }
    }

    fn scan_string(&mut self) -> Token {
        self.advance(); // Opening quote

        while !self.eof() && self.cur() != b'"' && self.cur() != b'\n' {
            self.advance();
        }

        if self.eof() || self.cur() == b'\n' {
            return self.make_invalid_token(TokenKind::StringLiteral, "expected end quote");
        }

        self.advance(); // Closing quote
        self.make_token(TokenKind::StringLiteral)
    }

    fn scan_byte_literal(&mut self) -> Token {
        self.advance(); // Opening quote

        while !self.eof() && self.cur() != b'\'' && self.cur() != b'\n' {
            self.advance();
        }

        if self.eof() || self.cur() == b'\n' {
            return self.make_invalid_token(TokenKind::ByteLiteral, "expected end quote");
        }

        self.advance(); // Closing quote

        // Quotes included, a valid byte literal is exactly 3 bytes long
        if self.pos - self.base != 3 {
            return self.make_invalid_token(
                TokenKind::ByteLiteral,
                "byte literal must be exactly one character",
            );
        }

        self.make_token(TokenKind::ByteLiteral)
    }

    /// Longest match first: try the two char symbol table, then the single
    /// char table, then give up and produce an illegal token.
    fn scan_symbol(&mut self) -> Token {
        if let Some(next) = self.peek() {
            if let Some(kind) = DOUBLE_TOKENS.get(&[self.cur(), next]) {
                self.advance();
                self.advance();
                return self.make_token(*kind);
            }
        }

        if let Some(kind) = SINGLE_TOKENS.get(&self.cur()) {
            self.advance();
            return self.make_token(*kind);
        }

        self.advance();
        self.make_invalid_token(TokenKind::Illegal, "illegal token")
    }

    fn skip_whitespace(&mut self) {
        while !self.eof() && matches!(self.cur(), b' ' | b'\t' | b'\r') {
            self.advance();
        }
    }

    fn skip_line_comment(&mut self) {
        while !self.eof() && self.cur() != b'\n' {
            self.advance();
        }

        if !self.eof() {
            self.advance(); // The newline itself
            self.row += 1;
            self.col = 0;
            self.line_begin = self.pos;
        }
    }

    fn make_token(&self, kind: TokenKind) -> Token {
        Token::new(kind, self.lexeme(), self.token_pos())
    }

    fn make_invalid_token(&mut self, kind: TokenKind, message: &str) -> Token {
        let token = Token::invalid(kind, self.lexeme(), self.token_pos());
        self.diagnostics.add(Diagnostic::at(
            self.file,
            &token.pos,
            token.lexeme.len(),
            message,
        ));

        token
    }

    fn lexeme(&self) -> String {
        String::from_utf8_lossy(&self.file.contents[self.base..self.pos]).into_owned()
    }

    /// Position of the first character of the token being scanned.
    fn token_pos(&self) -> Pos {
        Pos {
            col: self.start_col,
            row: self.row,
            offset: self.base,
            line_begin: self.line_begin,
        }
    }

    /// Position of the cursor.
    fn position(&self) -> Pos {
        Pos {
            col: self.col,
            row: self.row,
            offset: self.pos,
            line_begin: self.line_begin,
        }
    }

    fn advance(&mut self) {
        self.pos += 1;
        self.col += 1;
    }

    fn cur(&self) -> u8 {
        self.file.contents[self.pos]
    }

    fn peek(&self) -> Option<u8> {
        self.file.contents.get(self.pos + 1).copied()
    }

    fn eof(&self) -> bool {
        self.pos >= self.file.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::token::{Keyword, PrimitiveKind};

    fn scan_source(src: &str) -> (Vec<Token>, usize) {
        let file = SourceFile::from_memory(src);
        let mut scanner = Scanner::new(&file);
        let tokens = scanner.scan_all();
        (tokens, scanner.num_errors())
    }

    #[track_caller]
    fn assert_token(token: &Token, kind: TokenKind, lexeme: &str, col: usize, row: usize) {
        assert_eq!(token.kind, kind, "kind of '{}'", token.lexeme);
        assert_eq!(token.lexeme, lexeme);
        assert_eq!(token.pos.col, col, "col of '{}'", token.lexeme);
        assert_eq!(token.pos.row, row, "row of '{}'", token.lexeme);
    }

    #[test]
    fn identifiers_and_positions() {
        let (tokens, errors) = scan_source("hello foo_bar john");

        assert_eq!(errors, 0);
        assert_token(&tokens[0], TokenKind::Identifier, "hello", 0, 0);
        assert_token(&tokens[1], TokenKind::Identifier, "foo_bar", 6, 0);
        assert_token(&tokens[2], TokenKind::Identifier, "john", 14, 0);
        assert!(tokens[3].eof);
    }

    #[test]
    fn keyword_boundaries() {
        let (tokens, _) = scan_source("none nil preturn elsee");

        assert_token(&tokens[0], TokenKind::Identifier, "none", 0, 0);
        assert_token(&tokens[1], TokenKind::Keyword(Keyword::Nil), "nil", 5, 0);
        assert_token(&tokens[2], TokenKind::Identifier, "preturn", 9, 0);
        assert_token(&tokens[3], TokenKind::Identifier, "elsee", 17, 0);
    }

    #[test]
    fn primitive_type_names_are_keywords() {
        let (tokens, errors) = scan_source("int float string byte bool void");

        assert_eq!(errors, 0);
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Primitive(PrimitiveKind::Int),
                TokenKind::Primitive(PrimitiveKind::Float),
                TokenKind::Primitive(PrimitiveKind::String),
                TokenKind::Primitive(PrimitiveKind::Byte),
                TokenKind::Primitive(PrimitiveKind::Bool),
                TokenKind::Primitive(PrimitiveKind::Void),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn numbers() {
        let (tokens, errors) = scan_source("123 1.23");

        assert_eq!(errors, 0);
        assert_token(&tokens[0], TokenKind::IntegerLiteral, "123", 0, 0);
        assert_token(&tokens[1], TokenKind::FloatLiteral, "1.23", 4, 0);
    }

    #[test]
    fn invalid_numbers_keep_their_kind() {
        let (tokens, errors) = scan_source("1.1.2 123..4");

        assert_eq!(errors, 2);
        assert_token(&tokens[0], TokenKind::FloatLiteral, "1.1.2", 0, 0);
        assert!(tokens[0].invalid);
        assert_token(&tokens[1], TokenKind::FloatLiteral, "123..4", 6, 0);
        assert!(tokens[1].invalid);
    }

    #[test]
    fn invalid_number_diagnostic() {
        let file = SourceFile::from_memory("1.2.3");
        let mut scanner = Scanner::new(&file);
        let tokens = scanner.scan_all();

        assert_eq!(tokens.len(), 2); // literal + eof
        assert_eq!(tokens[0].kind, TokenKind::FloatLiteral);
        assert!(tokens[0].invalid);
        assert_eq!(scanner.num_errors(), 1);
        assert_eq!(
            scanner.diagnostics().get(0).unwrap().message,
            "number literal can have at most one decimal point"
        );
    }

    #[test]
    fn strings() {
        let (tokens, errors) = scan_source("\"hello\" \"there\"");

        assert_eq!(errors, 0);
        assert_token(&tokens[0], TokenKind::StringLiteral, "\"hello\"", 0, 0);
        assert_token(&tokens[1], TokenKind::StringLiteral, "\"there\"", 8, 0);
    }

    #[test]
    fn unterminated_string() {
        let (tokens, errors) = scan_source("\"no end quote");

        assert_eq!(errors, 1);
        assert_token(&tokens[0], TokenKind::StringLiteral, "\"no end quote", 0, 0);
        assert!(tokens[0].invalid);
    }

    #[test]
    fn string_stops_at_end_of_line() {
        let (tokens, errors) = scan_source("\"oops\nnext");

        assert_eq!(errors, 1);
        assert!(tokens[0].invalid);
        assert_eq!(tokens[0].lexeme, "\"oops");
        assert_token(&tokens[1], TokenKind::Newline, "\n", 5, 0);
        assert_token(&tokens[2], TokenKind::Identifier, "next", 0, 1);
    }

    #[test]
    fn byte_literals() {
        let (tokens, errors) = scan_source("'a' 'b'");

        assert_eq!(errors, 0);
        assert_token(&tokens[0], TokenKind::ByteLiteral, "'a'", 0, 0);
        assert_token(&tokens[1], TokenKind::ByteLiteral, "'b'", 4, 0);
    }

    #[test]
    fn byte_literal_must_be_one_character() {
        let (tokens, errors) = scan_source("'ab' ''");

        assert_eq!(errors, 2);
        assert!(tokens[0].invalid);
        assert_eq!(tokens[0].kind, TokenKind::ByteLiteral);
        assert!(tokens[1].invalid);
    }

    #[test]
    fn unterminated_byte_literal() {
        let (tokens, errors) = scan_source("'a");

        assert_eq!(errors, 1);
        assert!(tokens[0].invalid);
        assert_eq!(tokens[0].kind, TokenKind::ByteLiteral);
    }

    #[test]
    fn longest_symbol_match_first() {
        let (tokens, errors) = scan_source("++= == /= !!=");

        assert_eq!(errors, 0);
        assert_token(&tokens[0], TokenKind::Plus, "+", 0, 0);
        assert_token(&tokens[1], TokenKind::PlusEquals, "+=", 1, 0);
        assert_token(&tokens[2], TokenKind::DoubleEquals, "==", 4, 0);
        assert_token(&tokens[3], TokenKind::DivideEquals, "/=", 7, 0);
        assert_token(&tokens[4], TokenKind::Bang, "!", 10, 0);
        assert_token(&tokens[5], TokenKind::NotEquals, "!=", 11, 0);
    }

    #[test]
    fn comparison_symbols() {
        let (tokens, errors) = scan_source("<= >= && || != == :=");

        assert_eq!(errors, 0);
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::LessThanOrEqualTo,
                TokenKind::GreaterThanOrEqualTo,
                TokenKind::LogicalAnd,
                TokenKind::LogicalOr,
                TokenKind::NotEquals,
                TokenKind::DoubleEquals,
                TokenKind::ColonEquals,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn punctuation() {
        let (tokens, errors) = scan_source(".,:;(){}[]");

        assert_eq!(errors, 0);
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Dot,
                TokenKind::Comma,
                TokenKind::Colon,
                TokenKind::Semicolon,
                TokenKind::OpenParen,
                TokenKind::CloseParen,
                TokenKind::OpenBrace,
                TokenKind::CloseBrace,
                TokenKind::OpenBracket,
                TokenKind::CloseBracket,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn illegal_tokens() {
        let (tokens, errors) = scan_source("?^$");

        assert_eq!(errors, 3);
        assert_token(&tokens[0], TokenKind::Illegal, "?", 0, 0);
        assert!(tokens[0].invalid);
        assert_token(&tokens[1], TokenKind::Illegal, "^", 1, 0);
        assert_token(&tokens[2], TokenKind::Illegal, "$", 2, 0);
    }

    #[test]
    fn newlines_are_tokens_and_reset_columns() {
        let (tokens, errors) = scan_source("a\nb\n\nc");

        assert_eq!(errors, 0);
        assert_token(&tokens[0], TokenKind::Identifier, "a", 0, 0);
        assert_token(&tokens[1], TokenKind::Newline, "\n", 1, 0);
        assert_token(&tokens[2], TokenKind::Identifier, "b", 0, 1);
        assert_token(&tokens[3], TokenKind::Newline, "\n", 1, 1);
        assert_token(&tokens[4], TokenKind::Newline, "\n", 0, 2);
        assert_token(&tokens[5], TokenKind::Identifier, "c", 0, 3);
    }

    #[test]
    fn whitespace_is_discarded() {
        let (tokens, errors) = scan_source("   \t\n  hello   \n\tworld  ");

        assert_eq!(errors, 0);
        assert_token(&tokens[0], TokenKind::Newline, "\n", 4, 0);
        assert_token(&tokens[1], TokenKind::Identifier, "hello", 2, 1);
        assert_token(&tokens[2], TokenKind::Newline, "\n", 10, 1);
        assert_token(&tokens[3], TokenKind::Identifier, "world", 1, 2);
    }

    #[test]
    fn comments_consume_the_newline() {
        let (tokens, errors) = scan_source("// this is a comment\n  // another one\nvar//foo\n123");

        assert_eq!(errors, 0);
        assert_token(&tokens[0], TokenKind::Identifier, "var", 0, 2);
        assert_token(&tokens[1], TokenKind::IntegerLiteral, "123", 0, 3);
        assert!(tokens[2].eof);
    }

    #[test]
    fn mixed_tokens() {
        let (tokens, errors) = scan_source("var x = 42 + 3.14;");

        assert_eq!(errors, 0);
        assert_token(&tokens[0], TokenKind::Identifier, "var", 0, 0);
        assert_token(&tokens[1], TokenKind::Identifier, "x", 4, 0);
        assert_token(&tokens[2], TokenKind::Equals, "=", 6, 0);
        assert_token(&tokens[3], TokenKind::IntegerLiteral, "42", 8, 0);
        assert_token(&tokens[4], TokenKind::Plus, "+", 11, 0);
        assert_token(&tokens[5], TokenKind::FloatLiteral, "3.14", 13, 0);
        assert_token(&tokens[6], TokenKind::Semicolon, ";", 17, 0);
    }

    #[test]
    fn eof_sentinel_repeats() {
        let file = SourceFile::from_memory("x");
        let mut scanner = Scanner::new(&file);

        assert_eq!(scanner.scan().kind, TokenKind::Identifier);
        assert!(scanner.scan().eof);
        assert!(scanner.scan().eof);
        assert!(scanner.scan().eof);
    }

    #[test]
    fn empty_source_scans_to_eof() {
        let (tokens, errors) = scan_source("");

        assert_eq!(errors, 0);
        assert_eq!(tokens.len(), 1);
        assert!(tokens[0].eof);
    }

    #[test]
    fn whitespace_only_source_scans_to_eof() {
        let (tokens, errors) = scan_source("  \t \r ");

        assert_eq!(errors, 0);
        assert_eq!(tokens.len(), 1);
        assert!(tokens[0].eof);
    }

    #[test]
    fn comment_only_source_scans_to_eof() {
        let (tokens, errors) = scan_source("// one comment\n// two comments");

        assert_eq!(errors, 0);
        assert_eq!(tokens.len(), 1);
        assert!(tokens[0].eof);
    }

    #[test]
    fn spans_are_well_formed() {
        let (tokens, _) = scan_source("pub func main() int {\n\treturn 42\n}\n");

        for token in &tokens {
            assert!(token.pos.offset <= token.end_pos.offset, "{token}");
            assert!(token.pos.col <= token.end_pos.col, "{token}");
            assert_eq!(token.pos.row, token.end_pos.row, "{token}");
        }
    }
}
