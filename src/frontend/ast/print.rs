//! Canonical source printer for the AST. The output is valid Koi and parses
//! back to an equivalent tree, which is what the parser round-trip tests
//! rely on.

use itertools::Itertools;

use crate::frontend::ast::{Ast, Declaration, Expression, FunctionNode, Statement};

pub fn print_ast(ast: &Ast) -> String {
    let mut printer = AstPrinter {
        out: String::new(),
        depth: 0,
    };

    printer.print(ast);
    printer.out
}

pub fn print_expression(expr: &Expression) -> String {
    match expr {
        Expression::Identifier(node) => node.name.clone(),
        Expression::Literal(node) => node.value.clone(),
        Expression::Call(node) => format!(
            "{}({})",
            print_expression(&node.callee),
            node.args.iter().map(print_expression).join(", ")
        ),
    }
}

struct AstPrinter {
    out: String,
    depth: usize,
}

impl AstPrinter {
    fn print(&mut self, ast: &Ast) {
        for (i, node) in ast.nodes.iter().enumerate() {
            if i > 0 {
                self.out.push('\n');
            }

            match node {
                Declaration::Function(function) => self.print_function(function),
            }
        }
    }

    fn writeln(&mut self, line: &str) {
        self.out.push_str(&"    ".repeat(self.depth));
        self.out.push_str(line);
        self.out.push('\n');
    }

    fn print_function(&mut self, node: &FunctionNode) {
        let params = node
            .params
            .fields
            .iter()
            .map(|field| format!("{} {}", field.name.lexeme, field.ty.name()))
            .join(", ");

        self.writeln(&format!(
            "{}func {}({}) {} {{",
            if node.public { "pub " } else { "" },
            node.name.lexeme,
            params,
            node.return_type.name(),
        ));

        self.depth += 1;
        for stmt in &node.block.stmts {
            self.print_stmt(stmt);
        }
        self.depth -= 1;

        self.writeln("}");
    }

    fn print_stmt(&mut self, stmt: &Statement) {
        match stmt {
            Statement::Return(node) => match &node.expr {
                Some(expr) => {
                    let expr = print_expression(expr);
                    self.writeln(&format!("return {expr}"));
                }
                None => self.writeln("return"),
            },
            Statement::Block(block) => {
                self.writeln("{");

                self.depth += 1;
                for stmt in &block.stmts {
                    self.print_stmt(stmt);
                }
                self.depth -= 1;

                self.writeln("}");
            }
            Statement::Expression(node) => {
                let expr = print_expression(&node.expr);
                self.writeln(&expr);
            }
        }
    }
}
