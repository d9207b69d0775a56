use tracing::debug;

use crate::{
    diagnostics::{Diagnostic, DiagnosticList},
    frontend::{
        SourceFile,
        ast::{
            Ast, BlockNode, CallNode, Declaration, Expression, ExpressionStatement, Field,
            FunctionNode, IdentifierNode, LiteralNode, NamedTuple, NodeId, ReturnNode, Statement,
            TypeNode,
        },
        token::{Keyword, Token, TokenKind},
    },
};

/// Recursive descent parser over a scanned token vector.
///
/// Panic mode occurs when the parser encounters an unknown token sequence
/// and needs to synchronize to a 'clean' state. When panic mode starts, the
/// base position is set to the current position. While in panic mode all
/// `err_*` calls are ignored, so one syntax error produces exactly one
/// diagnostic.
///
/// Functions which parse statements have a check at the top for panic mode
/// and return early with no node if set. Recovery rewinds to the base
/// position and seeks the next statement boundary.
#[derive(Debug)]
pub struct Parser<'src> {
    file: &'src SourceFile,
    tokens: Vec<Token>,
    pos: usize,
    next_node_id: u32,

    panic_mode: bool,
    base: usize,

    diagnostics: DiagnosticList,
}

impl<'src> Parser<'src> {
    pub fn new(file: &'src SourceFile, tokens: Vec<Token>) -> Self {
        Self {
            file,
            tokens,
            pos: 0,
            next_node_id: 0,
            panic_mode: false,
            base: 0,
            diagnostics: DiagnosticList::new(),
        }
    }

    pub fn parse(&mut self) -> Ast {
        let mut nodes = Vec::new();

        if self.tokens.is_empty() {
            return Ast { nodes };
        }

        // True if we found a pub keyword. Reset after every declaration.
        let mut public = false;

        while !self.eof() {
            match self.cur().kind {
                TokenKind::Eof => break,

                TokenKind::Newline => {
                    self.next();
                }

                TokenKind::Keyword(Keyword::Pub) => {
                    public = true;
                    self.next();
                }

                TokenKind::Keyword(Keyword::Func) => {
                    if let Some(function) = self.parse_function(public) {
                        nodes.push(Declaration::Function(function));
                    }

                    if self.panic_mode {
                        self.recover_top_level();
                    }

                    public = false;
                }

                _ => {
                    // Unrecoverable error
                    let token = self.cur().clone();
                    self.err_token(
                        &token,
                        format!("unknown top level statement, found '{}'", token.lexeme),
                    );
                    break;
                }
            }
        }

        debug!(
            declarations = nodes.len(),
            errors = self.num_errors(),
            "parsed {}",
            self.file.origin
        );

        Ast { nodes }
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

    /// func name(param type, ...) type { ... }
    fn parse_function(&mut self, public: bool) -> Option<FunctionNode> {
        self.next(); // Func keyword which is guaranteed by the caller

        let name = self.expect(TokenKind::Identifier);
        let params = self.parse_named_tuple()?;

        if self.matches(TokenKind::OpenBrace) {
            let token = self.cur().clone();
            self.err_token(&token, "expected return type");
        }

        let return_type = self.parse_type()?;
        let block = self.parse_block()?;

        if self.panic_mode {
            return None;
        }

        Some(FunctionNode {
            public,
            name,
            params,
            return_type,
            block,
        })
    }

    /// (name string, age int)
    fn parse_named_tuple(&mut self) -> Option<NamedTuple> {
        if self.panic_mode {
            return None;
        }

        let lparen = self.expect(TokenKind::OpenParen);

        if self.matches(TokenKind::CloseParen) {
            let rparen = self.consume();
            return Some(NamedTuple {
                lparen,
                fields: Vec::new(),
                rparen,
            });
        }

        let mut fields = Vec::new();

        while !self.eof_or_panic() {
            let name = self.expect(TokenKind::Identifier);
            let ty = self.parse_type()?;

            fields.push(Field { name, ty });

            if self.matches(TokenKind::CloseParen) {
                break;
            }

            self.expect(TokenKind::Comma);
        }

        if self.panic_mode {
            return None;
        }

        let rparen = self.consume(); // Close paren
        Some(NamedTuple {
            lparen,
            fields,
            rparen,
        })
    }

    fn parse_type(&mut self) -> Option<TypeNode> {
        if self.panic_mode {
            return None;
        }

        if self.matches(TokenKind::Newline) {
            let token = self.cur().clone();
            self.err_token(&token, "expected type");
            return None;
        }

        if let TokenKind::Primitive(kind) = self.cur().kind {
            let token = self.consume();
            return Some(TypeNode { kind, token });
        }

        let token = self.cur().clone();
        self.err_token(&token, "invalid type");
        None
    }

    /// { stmt... }
    fn parse_block(&mut self) -> Option<BlockNode> {
        if self.panic_mode {
            return None;
        }

        let lbrace = self.expect(TokenKind::OpenBrace);
        let mut stmts = Vec::new();

        while !self.eof() && !self.matches(TokenKind::CloseBrace) {
            if self.panic_mode {
                self.recover();

                if self.panic_mode {
                    // No statement boundary left to synchronize on
                    break;
                }

                continue;
            }

            if self.matches(TokenKind::Newline) {
                self.next();
                continue;
            }

            let Some(stmt) = self.parse_stmt() else {
                continue;
            };

            // A statement must be terminated by a newline or the end of the
            // enclosing block.
            if !self.matches(TokenKind::Newline) && !self.matches(TokenKind::CloseBrace) && !self.eof()
            {
                let from = self.cur().clone();
                self.goto_end_of_stmt();
                let to = self.prev().clone();
                self.err(&from, &to, "expected end of statement");
                continue;
            }

            stmts.push(stmt);
        }

        if self.panic_mode {
            return None;
        }

        let rbrace = self.expect(TokenKind::CloseBrace);

        if self.panic_mode {
            return None;
        }

        Some(BlockNode {
            id: self.create_node_id(),
            lbrace,
            stmts,
            rbrace,
        })
    }

    fn parse_stmt(&mut self) -> Option<Statement> {
        if self.panic_mode {
            return None;
        }

        match self.cur().kind {
            TokenKind::Keyword(Keyword::Return) => self.parse_return().map(Statement::Return),
            TokenKind::OpenBrace => self.parse_block().map(Statement::Block),
            _ => {
                let expr = self.parse_expression()?;
                Some(Statement::Expression(ExpressionStatement { expr }))
            }
        }
    }

    fn parse_return(&mut self) -> Option<ReturnNode> {
        let ret = self.consume(); // Return keyword is guaranteed

        // The expressionless form. The terminator is left for the block to
        // verify.
        if self.matches(TokenKind::Newline) || self.matches(TokenKind::CloseBrace) || self.eof() {
            return Some(ReturnNode { ret, expr: None });
        }

        let expr = self.parse_expression()?;
        Some(ReturnNode {
            ret,
            expr: Some(expr),
        })
    }

    /// expression -> equality
    /// equality   -> comparison
    /// comparison -> term
    /// term       -> factor
    /// factor     -> unary
    /// unary      -> call
    /// call       -> atom ( "(" ( expression ( "," expression )* )? ")" )*
    /// atom       -> IDENTIFIER | literal
    ///
    /// The ladder above `call` is reserved for the binary and unary
    /// operators; the scanner already produces their tokens.
    fn parse_expression(&mut self) -> Option<Expression> {
        self.parse_equality()
    }

    fn parse_equality(&mut self) -> Option<Expression> {
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Option<Expression> {
        self.parse_term()
    }

    fn parse_term(&mut self) -> Option<Expression> {
        self.parse_factor()
    }

    fn parse_factor(&mut self) -> Option<Expression> {
        self.parse_unary()
    }

    fn parse_unary(&mut self) -> Option<Expression> {
        self.parse_call()
    }

    fn parse_call(&mut self) -> Option<Expression> {
        // The callee must be higher precedence, anything lower would create
        // infinite recursion. Chained calls are handled by wrapping the
        // previous callee whenever another lparen follows.
        let mut callee = self.parse_atom()?;

        while self.matches(TokenKind::OpenParen) {
            let lparen = self.consume();
            let mut args = Vec::new();

            if !self.matches(TokenKind::CloseParen) {
                loop {
                    let expr = self.parse_expression()?;
                    args.push(expr);

                    if !self.matches(TokenKind::Comma) {
                        break;
                    }

                    self.next(); // Comma
                }

                if !self.matches(TokenKind::CloseParen) {
                    let token = self.cur().clone();
                    self.err_token(&token, "expected ) after argument list");
                    return None;
                }
            }

            let rparen = self.consume();
            callee = Expression::Call(CallNode {
                callee: Box::new(callee),
                lparen,
                args,
                rparen,
            });
        }

        Some(callee)
    }

    fn parse_atom(&mut self) -> Option<Expression> {
        if self.matches(TokenKind::Identifier) {
            let token = self.consume();
            return Some(Expression::Identifier(IdentifierNode {
                name: token.lexeme.clone(),
                token,
            }));
        }

        if self.cur().kind.is_literal() {
            let token = self.consume();
            return Some(Expression::Literal(LiteralNode {
                value: token.lexeme.clone(),
                token,
            }));
        }

        let token = self.consume();
        self.err_token(&token, "invalid expression");
        None
    }

    /// Enter panic mode and record a diagnostic underlining the token range
    /// from..to. Errors raised while already in panic mode are dropped.
    fn err(&mut self, from: &Token, to: &Token, message: impl Into<String>) {
        if self.panic_mode {
            return;
        }

        self.diagnostics
            .add(Diagnostic::span(self.file, &from.pos, &to.end_pos, message));

        self.panic_mode = true;
        self.base = self.pos;
    }

    fn err_token(&mut self, token: &Token, message: impl Into<String>) {
        self.err(token, token, message);
    }

    /// Recover from panic mode inside a block: rewind to the base position
    /// and seek the next statement boundary. Panic mode stays set when no
    /// boundary is left before EOF so enclosing parsers bail quietly.
    fn recover(&mut self) {
        self.pos = self.base;

        while !self.eof() {
            if self.cur().kind.starts_statement() {
                self.panic_mode = false;
                return;
            }

            self.next();
        }
    }

    /// Recover from panic mode at the top level by seeking the next
    /// declaration keyword.
    fn recover_top_level(&mut self) {
        self.pos = self.base;

        while !self.eof() {
            if matches!(
                self.cur().kind,
                TokenKind::Keyword(Keyword::Func | Keyword::Pub)
            ) {
                self.panic_mode = false;
                return;
            }

            self.next();
        }
    }

    fn goto_end_of_stmt(&mut self) {
        while !self.eof()
            && !self.matches(TokenKind::Newline)
            && !self.matches(TokenKind::CloseBrace)
        {
            self.next();
        }
    }

    fn create_node_id(&mut self) -> NodeId {
        let id = NodeId(self.next_node_id);
        self.next_node_id += 1;
        id
    }

    fn cur(&self) -> &Token {
        self.tokens
            .get(self.pos)
            .unwrap_or_else(|| self.tokens.last().unwrap())
    }

    fn prev(&self) -> &Token {
        let pos = self.pos.min(self.tokens.len() - 1);
        &self.tokens[pos.saturating_sub(1)]
    }

    // Shorthand for self.cur().kind == kind
    fn matches(&self, kind: TokenKind) -> bool {
        self.cur().kind == kind
    }

    fn next(&mut self) {
        self.pos += 1;
    }

    // Same as next but also returns the token it consumed.
    fn consume(&mut self) -> Token {
        let token = self.cur().clone();
        self.next();
        token
    }

    /// Consume the current token, raising an error if it is not of the
    /// expected kind.
    fn expect(&mut self, kind: TokenKind) -> Token {
        let token = self.consume();

        if token.kind != kind {
            self.err_token(&token, format!("expected {kind}"));
        }

        token
    }

    fn eof(&self) -> bool {
        self.pos >= self.tokens.len() || self.cur().eof
    }

    fn eof_or_panic(&self) -> bool {
        self.eof() || self.panic_mode
    }
}
