//! Semantic analysis. A single walk over the AST that builds the scope tree
//! and symbol table, resolves identifiers, checks types against the
//! declared return types, and verifies that non-void functions return.
//!
//! Errors never abort the walk; the analyzer keeps going so one run reports
//! as many problems as possible.

use tracing::debug;

use crate::{
    diagnostics::{Diagnostic, DiagnosticList},
    frontend::{
        SourceFile,
        ast::{
            Ast, BlockNode, CallNode, Declaration, Expression, FunctionNode, LiteralNode,
            ReturnNode, Statement,
        },
        token::{Keyword, Pos, Token, TokenKind},
    },
    middle::{
        symtab::{Symbol, SymbolKind, SymbolTable},
        ty::Type,
    },
};

/// Analyze a parsed file. Returns the symbol table and any semantic
/// diagnostics; the table is complete for the parts of the tree that
/// checked out even when diagnostics are present.
pub fn analyze(file: &SourceFile, ast: &Ast) -> (SymbolTable, DiagnosticList) {
    let mut analyzer = Analyzer {
        file,
        table: SymbolTable::new(),
        diagnostics: DiagnosticList::new(),
    };

    analyzer.run(ast);

    debug!(
        errors = analyzer.diagnostics.len(),
        "analyzed {}",
        file.origin
    );

    (analyzer.table, analyzer.diagnostics)
}

struct Analyzer<'src> {
    file: &'src SourceFile,
    table: SymbolTable,
    diagnostics: DiagnosticList,
}

impl<'src> Analyzer<'src> {
    fn run(&mut self, ast: &Ast) {
        // Install every top level declaration before walking any body so
        // functions can reference functions declared later in the file.
        for node in &ast.nodes {
            match node {
                Declaration::Function(function) => self.declare_function(function),
            }
        }

        for node in &ast.nodes {
            match node {
                Declaration::Function(function) => self.check_function(function),
            }
        }
    }

    fn declare_function(&mut self, node: &FunctionNode) {
        if node.name.lexeme == "main" {
            self.check_main(node);
        }

        if let Some(prev) = self.table.local_symbol(&node.name.lexeme) {
            let line = prev.decl_pos.row + 1;
            self.error_token(
                &node.name,
                format!("'{}' is already declared (line {line})", node.name.lexeme),
            );
            return; // The first declaration wins
        }

        self.table.declare(Symbol::new(
            &node.name.lexeme,
            SymbolKind::Func,
            Type::from_node(&node.return_type),
            node.public,
            node.name.pos,
        ));
    }

    /// The program entry point has a fixed shape: public, no parameters,
    /// returns int. Violations are ordinary diagnostics, not hard stops.
    fn check_main(&mut self, node: &FunctionNode) {
        if !node.params.is_empty() {
            self.error_span(
                &node.params.lparen.pos,
                &node.params.rparen.end_pos,
                "main function must not take any arguments",
            );
        }

        if Type::from_node(&node.return_type) != Type::INT {
            self.error_token(&node.return_type.token, "main function must return 'int'");
        }

        if !node.public {
            self.error_token(&node.name, "main function must be public");
        }
    }

    fn check_function(&mut self, node: &FunctionNode) {
        let return_type = Type::from_node(&node.return_type);

        self.table.push_scope();
        self.table.bind_block(node.block.id);
        self.table.set_return_type(return_type);

        for field in &node.params.fields {
            if let Some(prev) = self.table.local_symbol(&field.name.lexeme) {
                let line = prev.decl_pos.row + 1;
                self.error_token(
                    &field.name,
                    format!("'{}' is already declared (line {line})", field.name.lexeme),
                );
                continue;
            }

            self.table.declare(Symbol::new(
                &field.name.lexeme,
                SymbolKind::Var,
                Type::from_node(&field.ty),
                false,
                field.name.pos,
            ));
        }

        for stmt in &node.block.stmts {
            self.check_stmt(stmt);
        }

        // Only the function scope's own flag counts; a return buried in a
        // nested block does not satisfy the check.
        if !return_type.is_void() && !self.table.has_returned() {
            self.error_token(&node.name, "function never returns");
        }

        self.table.pop_scope();
    }

    fn check_stmt(&mut self, stmt: &Statement) {
        match stmt {
            Statement::Return(node) => self.check_return(node),
            Statement::Block(node) => self.check_block(node),
            Statement::Expression(node) => {
                self.check_expr(&node.expr);
            }
        }
    }

    fn check_block(&mut self, node: &BlockNode) {
        self.table.push_scope();
        self.table.bind_block(node.id);

        for stmt in &node.stmts {
            self.check_stmt(stmt);
        }

        self.table.pop_scope();
    }

    fn check_return(&mut self, node: &ReturnNode) {
        let expected = self.table.return_type();

        match &node.expr {
            None => {
                if !expected.is_void() {
                    self.error_token(
                        &node.ret,
                        format!("expected return type {expected}, got void"),
                    );
                }
            }
            Some(expr) => {
                if let Some(actual) = self.check_expr(expr) {
                    if actual != expected {
                        self.error_span(
                            &expr.pos(),
                            &expr.end(),
                            format!("expected return type {expected}, got {actual}"),
                        );
                    }
                }
            }
        }

        self.table.mark_returned();
    }

    /// Type check an expression. Returns None when the expression does not
    /// resolve to a type; the error has already been reported in that case.
    fn check_expr(&mut self, expr: &Expression) -> Option<Type> {
        match expr {
            Expression::Literal(node) => Some(self.literal_type(node)),

            Expression::Identifier(node) => {
                let Some(symbol) = self.table.symbol(&node.name) else {
                    self.error_token(&node.token, format!("{} is undefined", node.name));
                    return None;
                };

                let (kind, ty) = (symbol.kind, symbol.ty);

                match kind {
                    SymbolKind::Var | SymbolKind::Const => Some(ty),
                    SymbolKind::Func | SymbolKind::Type => {
                        self.error_token(
                            &node.token,
                            format!("cannot use '{}' as identifier", node.name),
                        );
                        None
                    }
                }
            }

            Expression::Call(node) => self.check_call(node),
        }
    }

    fn check_call(&mut self, node: &CallNode) -> Option<Type> {
        let ty = match &*node.callee {
            Expression::Identifier(callee) => {
                match self.table.symbol(&callee.name).map(|s| (s.kind, s.ty)) {
                    None => {
                        self.error_token(&callee.token, format!("{} is undefined", callee.name));
                        None
                    }
                    Some((kind, _)) if kind != SymbolKind::Func => {
                        self.error_token(
                            &callee.token,
                            format!("'{}' is not a function", callee.name),
                        );
                        None
                    }
                    Some((_, ty)) => Some(ty),
                }
            }

            // A chained call's type is the return type of the inner call.
            Expression::Call(inner) => self.check_call(inner),

            Expression::Literal(_) => {
                self.error_span(
                    &node.callee.pos(),
                    &node.callee.end(),
                    "expression is not callable",
                );
                None
            }
        };

        // Argument expressions are checked for their own validity. Arity and
        // parameter types are not verified against the callee; a symbol only
        // carries its return type.
        for arg in &node.args {
            self.check_expr(arg);
        }

        ty
    }

    fn literal_type(&mut self, node: &LiteralNode) -> Type {
        match node.token.kind {
            TokenKind::IntegerLiteral => Type::INT,
            TokenKind::FloatLiteral => Type::FLOAT,
            TokenKind::StringLiteral => Type::STRING,
            TokenKind::ByteLiteral => Type::BYTE,
            TokenKind::Keyword(Keyword::True | Keyword::False) => Type::BOOL,
            // There is no nil type yet; a nil in a typed position falls out
            // as an ordinary mismatch against void.
            TokenKind::Keyword(Keyword::Nil) => Type::VOID,
            kind => unreachable!("literal node with token kind {kind:?}"),
        }
    }

    fn error_token(&mut self, token: &Token, message: impl Into<String>) {
        self.diagnostics
            .add(Diagnostic::span(self.file, &token.pos, &token.end_pos, message));
    }

    fn error_span(&mut self, from: &Pos, to: &Pos, message: impl Into<String>) {
        self.diagnostics
            .add(Diagnostic::span(self.file, from, to, message));
    }
}
