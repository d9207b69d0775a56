//! Lowers a checked AST to the linear IR. The analyzer has already verified
//! the tree, so shape violations here are compiler bugs and panic.

use tracing::debug;

use crate::{
    frontend::{
        ast::{Ast, BlockNode, Declaration, Expression, FunctionNode, LiteralNode, ReturnNode,
            Statement,
        },
        token::{Keyword, TokenKind},
    },
    index::Index,
    middle::{
        ir::{Instruction, Ir, VRegId, Value},
        symtab::{SymbolTable, TableReader},
    },
};

/// Build the IR for a fully analyzed tree.
pub fn build_ir(ast: &Ast, table: &SymbolTable) -> Ir {
    let mut builder = IrBuilder {
        reader: table.reader(),
        instructions: Vec::new(),
        counter: 0,
        current_dest: VRegId::new(0),
    };

    for node in &ast.nodes {
        match node {
            Declaration::Function(function) => builder.lower_function(function),
        }
    }

    debug!(instructions = builder.instructions.len(), "built ir");

    Ir {
        instructions: builder.instructions,
    }
}

struct IrBuilder<'a> {
    reader: TableReader<'a>,
    instructions: Vec<Instruction>,

    /// Virtual register counter, ascending across the whole compilation
    counter: usize,
    /// The register the expression currently being lowered must leave its
    /// result in
    current_dest: VRegId,
}

impl<'a> IrBuilder<'a> {
    fn next_vreg(&mut self) -> VRegId {
        let id = VRegId::new(self.counter);
        self.counter += 1;
        id
    }

    fn lower_function(&mut self, node: &FunctionNode) {
        let name = node.name.lexeme.clone();
        let return_type = self.reader.get(&name).ty;

        self.instructions.push(Instruction::Function {
            name,
            public: node.public,
            return_type,
        });

        // TODO: lower parameters once the calling convention lands
        assert!(
            node.params.is_empty(),
            "parameter lowering is not implemented"
        );

        self.lower_block(&node.block);
    }

    fn lower_block(&mut self, node: &BlockNode) {
        self.reader.push(node.id);

        for stmt in &node.stmts {
            match stmt {
                Statement::Return(ret) => self.lower_return(ret),
                Statement::Block(block) => self.lower_block(block),
                Statement::Expression(expr) => self.lower_expr_stmt(&expr.expr),
            }
        }

        self.reader.pop();
    }

    fn lower_return(&mut self, node: &ReturnNode) {
        let Some(expr) = &node.expr else {
            unimplemented!("return without a value");
        };

        let dest = self.next_vreg();
        self.current_dest = dest;
        self.lower_expr(expr);

        self.instructions.push(Instruction::Return {
            value: Value::VReg(dest),
        });
    }

    /// An expression in statement position lowers into a destination of its
    /// own; the result is simply never read.
    fn lower_expr_stmt(&mut self, expr: &Expression) {
        let dest = self.next_vreg();
        self.current_dest = dest;
        self.lower_expr(expr);
    }

    fn lower_expr(&mut self, expr: &Expression) {
        match expr {
            Expression::Literal(literal) => self.lower_literal(literal),
            // Identifier and call lowering depend on parameter and stack
            // slot assignment and are not emitted yet.
            Expression::Identifier(_) => {}
            Expression::Call(_) => {}
        }
    }

    fn lower_literal(&mut self, node: &LiteralNode) {
        let dest = self.current_dest;

        let instruction = match node.token.kind {
            TokenKind::IntegerLiteral => Instruction::StoreInt64 {
                dest,
                value: Value::Literal(node.value.clone()),
            },
            TokenKind::FloatLiteral => Instruction::StoreFloat64 {
                dest,
                value: Value::Literal(node.value.clone()),
            },
            TokenKind::StringLiteral => Instruction::StoreString {
                dest,
                value: Value::Literal(node.value.trim_matches('"').to_string()),
            },
            TokenKind::Keyword(Keyword::True | Keyword::False) => Instruction::StoreBool {
                dest,
                value: Value::Literal(node.value.clone()),
            },
            kind => panic!("unsupported literal kind in ir builder: {kind:?}"),
        };

        self.instructions.push(instruction);
    }
}
