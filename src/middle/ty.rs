use crate::frontend::{ast::TypeNode, token::PrimitiveKind};

/// A semantic type. The current language only has primitive types, but
/// compound types get their own variants here rather than a new
/// representation.
///
/// `byte` and `int` are distinct types with no implicit coercion between
/// them, as are all other primitives. Equality is equality of the canonical
/// name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Type {
    Primitive(PrimitiveKind),
}

impl Type {
    pub const VOID: Type = Type::Primitive(PrimitiveKind::Void);
    pub const INT: Type = Type::Primitive(PrimitiveKind::Int);
    pub const FLOAT: Type = Type::Primitive(PrimitiveKind::Float);
    pub const STRING: Type = Type::Primitive(PrimitiveKind::String);
    pub const BYTE: Type = Type::Primitive(PrimitiveKind::Byte);
    pub const BOOL: Type = Type::Primitive(PrimitiveKind::Bool);

    pub fn from_node(node: &TypeNode) -> Type {
        Type::Primitive(node.kind)
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Type::Primitive(PrimitiveKind::Void))
    }
}

impl core::fmt::Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Type::Primitive(kind) => write!(f, "{kind}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_source_syntax() {
        assert_eq!(Type::INT.to_string(), "int");
        assert_eq!(Type::FLOAT.to_string(), "float");
        assert_eq!(Type::STRING.to_string(), "string");
        assert_eq!(Type::BYTE.to_string(), "byte");
        assert_eq!(Type::BOOL.to_string(), "bool");
        assert_eq!(Type::VOID.to_string(), "void");
    }

    #[test]
    fn byte_is_not_int() {
        assert_ne!(Type::BYTE, Type::INT);
    }
}
