use crate::frontend::token::{Pos, PrimitiveKind, Token};

pub mod print;

/// Root of a parsed source file. Declarations are the only top level
/// statements in Koi; they contain all other statements and expressions.
/// Functions that failed to parse are omitted entirely, so every node in the
/// tree is complete.
#[derive(Debug)]
pub struct Ast {
    pub nodes: Vec<Declaration>,
}

/// Identifies a block node within one parse. The semantic analyzer keys
/// scopes by these ids so later stages can navigate from a block to the
/// scope it opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u32);

#[derive(Debug)]
pub enum Declaration {
    Function(FunctionNode),
}

#[derive(Debug)]
pub struct FunctionNode {
    pub public: bool,
    pub name: Token,
    pub params: NamedTuple,
    pub return_type: TypeNode,
    pub block: BlockNode,
}

/// A named tuple is a list of fields within parenthesis.
/// Eg. "(name string, age int)"
#[derive(Debug)]
pub struct NamedTuple {
    pub lparen: Token,
    pub fields: Vec<Field>,
    pub rparen: Token,
}

impl NamedTuple {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// A field is a name-type combination. Eg. "foo int"
#[derive(Debug)]
pub struct Field {
    pub name: Token,
    pub ty: TypeNode,
}

/// A primitive type annotation. The kind always agrees with the lexeme of
/// the token it was parsed from.
#[derive(Debug)]
pub struct TypeNode {
    pub kind: PrimitiveKind,
    pub token: Token,
}

#[derive(Debug)]
pub enum Statement {
    Return(ReturnNode),
    Block(BlockNode),
    Expression(ExpressionStatement),
}

#[derive(Debug)]
pub struct BlockNode {
    pub id: NodeId,
    pub lbrace: Token,
    pub stmts: Vec<Statement>,
    pub rbrace: Token,
}

impl BlockNode {
    pub fn is_empty(&self) -> bool {
        self.stmts.is_empty()
    }
}

#[derive(Debug)]
pub struct ReturnNode {
    pub ret: Token,
    /// Absent for the expressionless `return` in void functions
    pub expr: Option<Expression>,
}

#[derive(Debug)]
pub struct ExpressionStatement {
    pub expr: Expression,
}

#[derive(Debug)]
pub enum Expression {
    Identifier(IdentifierNode),
    Literal(LiteralNode),
    Call(CallNode),
}

/// Single token identifier reference.
#[derive(Debug)]
pub struct IdentifierNode {
    pub name: String,
    pub token: Token,
}

/// Primitive literal, eg. string, number, bool etc.
#[derive(Debug)]
pub struct LiteralNode {
    pub token: Token,
    /// Copied from the token's lexeme for ease of use
    pub value: String,
}

#[derive(Debug)]
pub struct CallNode {
    pub callee: Box<Expression>,
    pub lparen: Token,
    pub args: Vec<Expression>,
    pub rparen: Token,
}

impl Declaration {
    pub fn pos(&self) -> Pos {
        match self {
            Declaration::Function(function) => function.pos(),
        }
    }

    pub fn end(&self) -> Pos {
        match self {
            Declaration::Function(function) => function.end(),
        }
    }
}

impl FunctionNode {
    pub fn pos(&self) -> Pos {
        self.name.pos
    }

    pub fn end(&self) -> Pos {
        self.block.end()
    }
}

impl TypeNode {
    pub fn pos(&self) -> Pos {
        self.token.pos
    }

    pub fn end(&self) -> Pos {
        self.token.end_pos
    }

    /// String representation of the type, identical to the type syntax.
    pub fn name(&self) -> &str {
        &self.token.lexeme
    }
}

impl Statement {
    pub fn pos(&self) -> Pos {
        match self {
            Statement::Return(node) => node.ret.pos,
            Statement::Block(node) => node.pos(),
            Statement::Expression(node) => node.expr.pos(),
        }
    }

    pub fn end(&self) -> Pos {
        match self {
            Statement::Return(node) => node
                .expr
                .as_ref()
                .map(|e| e.end())
                .unwrap_or(node.ret.end_pos),
            Statement::Block(node) => node.end(),
            Statement::Expression(node) => node.expr.end(),
        }
    }
}

impl BlockNode {
    pub fn pos(&self) -> Pos {
        self.lbrace.pos
    }

    pub fn end(&self) -> Pos {
        self.rbrace.end_pos
    }
}

impl Expression {
    pub fn pos(&self) -> Pos {
        match self {
            Expression::Identifier(node) => node.token.pos,
            Expression::Literal(node) => node.token.pos,
            Expression::Call(node) => node.callee.pos(),
        }
    }

    pub fn end(&self) -> Pos {
        match self {
            Expression::Identifier(node) => node.token.end_pos,
            Expression::Literal(node) => node.token.end_pos,
            Expression::Call(node) => node.rparen.end_pos,
        }
    }
}
