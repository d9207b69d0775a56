use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use strum::{Display, EnumIter, EnumString};

/// A position in a source file. Rows and columns are 0-based; diagnostics
/// render rows as 1-based line numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pos {
    /// Column on the line
    pub col: usize,
    /// Row in the file, same as line number - 1
    pub row: usize,
    /// Byte offset in the file
    pub offset: usize,
    /// Byte offset of the first character on the same line
    pub line_begin: usize,
}

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    /// The token as it appears in the source. String literals keep their
    /// surrounding quotes.
    pub lexeme: String,
    /// Position of the first character in the token
    pub pos: Pos,
    /// Position of the character immediately after the token
    pub end_pos: Pos,
    /// True for illegal and malformed tokens. Malformed literals keep their
    /// literal kind (eg. a float with two decimal points is still a
    /// `FloatLiteral`) but are marked invalid.
    pub invalid: bool,
    pub eof: bool,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, pos: Pos) -> Token {
        let lexeme = lexeme.into();
        let end_pos = Pos {
            col: pos.col + lexeme.len(),
            row: pos.row,
            offset: pos.offset + lexeme.len(),
            line_begin: pos.line_begin,
        };

        Token {
            invalid: kind == TokenKind::Illegal,
            eof: kind == TokenKind::Eof,
            kind,
            lexeme,
            pos,
            end_pos,
        }
    }

    pub fn invalid(kind: TokenKind, lexeme: impl Into<String>, pos: Pos) -> Token {
        Token {
            invalid: true,
            ..Token::new(kind, lexeme, pos)
        }
    }

    pub fn eof(pos: Pos) -> Token {
        Token::new(TokenKind::Eof, "", pos)
    }
}

impl core::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{{{} '{}' c:{} r:{}}}",
            self.kind, self.lexeme, self.pos.col, self.pos.row
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /* Special */
    Illegal,
    Eof,
    /// Statement terminator. Whitespace is discarded but line feeds are not.
    Newline,

    /* Words */
    Keyword(Keyword),           // return
    Primitive(PrimitiveKind),   // int
    Identifier,                 // main

    /* Literals */
    IntegerLiteral, // 42
    FloatLiteral,   // 3.14
    StringLiteral,  // "hello, world"
    ByteLiteral,    // 'a'

    /* Delimiters */
    OpenParen,    // (
    CloseParen,   // )
    OpenBracket,  // [
    CloseBracket, // ]
    OpenBrace,    // {
    CloseBrace,   // }
    Comma,        // ,
    Semicolon,    // ;
    Colon,        // :
    Dot,          // .

    /* Operators */
    Plus,       // +
    Minus,      // -
    Asterisk,   // *
    Slash,      // /
    Percent,    // %
    BitwiseAnd, // &
    BitwiseOr,  // |
    Bang,       // !

    /* Comparison */
    Equals,               // =
    DoubleEquals,         // ==
    NotEquals,            // !=
    LessThan,             // <
    LessThanOrEqualTo,    // <=
    GreaterThan,          // >
    GreaterThanOrEqualTo, // >=
    LogicalAnd,           // &&
    LogicalOr,            // ||

    /* Assignment */
    PlusEquals,     // +=
    MinusEquals,    // -=
    MultiplyEquals, // *=
    DivideEquals,   // /=
    ColonEquals,    // :=
}

impl TokenKind {
    /// Literal tokens are the leaves of the expression grammar.
    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            Self::IntegerLiteral
                | Self::FloatLiteral
                | Self::StringLiteral
                | Self::ByteLiteral
                | Self::Keyword(Keyword::True | Keyword::False | Keyword::Nil)
        )
    }

    /// Tokens the parser synchronizes on when recovering from a syntax
    /// error: a statement boundary or a keyword that begins a statement.
    pub fn starts_statement(&self) -> bool {
        matches!(
            self,
            Self::Newline
                | Self::Keyword(Keyword::If | Keyword::Func | Keyword::For | Keyword::Return)
        )
    }
}

impl core::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TokenKind::Illegal => "illegal",
            TokenKind::Eof => "eof",
            TokenKind::Newline => "newline",
            TokenKind::Keyword(keyword) => return write!(f, "{keyword}"),
            TokenKind::Primitive(primitive) => return write!(f, "{primitive}"),
            TokenKind::Identifier => "identifier",
            TokenKind::IntegerLiteral => "integer",
            TokenKind::FloatLiteral => "float",
            TokenKind::StringLiteral => "string",
            TokenKind::ByteLiteral => "byte",
            TokenKind::OpenParen => "(",
            TokenKind::CloseParen => ")",
            TokenKind::OpenBracket => "[",
            TokenKind::CloseBracket => "]",
            TokenKind::OpenBrace => "{",
            TokenKind::CloseBrace => "}",
            TokenKind::Comma => ",",
            TokenKind::Semicolon => ";",
            TokenKind::Colon => ":",
            TokenKind::Dot => ".",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Asterisk => "*",
            TokenKind::Slash => "/",
            TokenKind::Percent => "%",
            TokenKind::BitwiseAnd => "&",
            TokenKind::BitwiseOr => "|",
            TokenKind::Bang => "!",
            TokenKind::Equals => "=",
            TokenKind::DoubleEquals => "==",
            TokenKind::NotEquals => "!=",
            TokenKind::LessThan => "<",
            TokenKind::LessThanOrEqualTo => "<=",
            TokenKind::GreaterThan => ">",
            TokenKind::GreaterThanOrEqualTo => ">=",
            TokenKind::LogicalAnd => "&&",
            TokenKind::LogicalOr => "||",
            TokenKind::PlusEquals => "+=",
            TokenKind::MinusEquals => "-=",
            TokenKind::MultiplyEquals => "*=",
            TokenKind::DivideEquals => "/=",
            TokenKind::ColonEquals => ":=",
        };

        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum Keyword {
    Pub,
    True,
    False,
    Return,
    Func,
    If,
    Else,
    For,
    Import,
    Package,
    Nil,
}

/// The primitive type names. All of them are keywords, and they double as
/// the complete set of semantic types in the current language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum PrimitiveKind {
    Int,
    Float,
    String,
    Byte,
    Bool,
    Void,
}

/// Classify a scanned word as a keyword, a primitive type name, or a plain
/// identifier.
pub fn lookup_word(lexeme: &str) -> TokenKind {
    if let Ok(keyword) = lexeme.parse() {
        return TokenKind::Keyword(keyword);
    }

    if let Ok(primitive) = lexeme.parse() {
        return TokenKind::Primitive(primitive);
    }

    TokenKind::Identifier
}

/// Table of single char tokens (matched after two char sequences are checked
/// for)
pub static SINGLE_TOKENS: Lazy<BTreeMap<u8, TokenKind>> = Lazy::new(|| {
    BTreeMap::from([
        (b'(', TokenKind::OpenParen),
        (b')', TokenKind::CloseParen),
        (b'[', TokenKind::OpenBracket),
        (b']', TokenKind::CloseBracket),
        (b'{', TokenKind::OpenBrace),
        (b'}', TokenKind::CloseBrace),
        (b',', TokenKind::Comma),
        (b';', TokenKind::Semicolon),
        (b':', TokenKind::Colon),
        (b'.', TokenKind::Dot),
        (b'+', TokenKind::Plus),
        (b'-', TokenKind::Minus),
        (b'*', TokenKind::Asterisk),
        (b'/', TokenKind::Slash),
        (b'%', TokenKind::Percent),
        (b'&', TokenKind::BitwiseAnd),
        (b'|', TokenKind::BitwiseOr),
        (b'!', TokenKind::Bang),
        (b'=', TokenKind::Equals),
        (b'<', TokenKind::LessThan),
        (b'>', TokenKind::GreaterThan),
    ])
});

/// Table of two char tokens, tried before the single char table so `==` does
/// not scan as two `=`
pub static DOUBLE_TOKENS: Lazy<BTreeMap<[u8; 2], TokenKind>> = Lazy::new(|| {
    BTreeMap::from([
        (*b"==", TokenKind::DoubleEquals),
        (*b"!=", TokenKind::NotEquals),
        (*b"<=", TokenKind::LessThanOrEqualTo),
        (*b">=", TokenKind::GreaterThanOrEqualTo),
        (*b"&&", TokenKind::LogicalAnd),
        (*b"||", TokenKind::LogicalOr),
        (*b"+=", TokenKind::PlusEquals),
        (*b"-=", TokenKind::MinusEquals),
        (*b"*=", TokenKind::MultiplyEquals),
        (*b"/=", TokenKind::DivideEquals),
        (*b":=", TokenKind::ColonEquals),
    ])
});
