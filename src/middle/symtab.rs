//! The symbol table produced by semantic analysis. Scopes form a tree rooted
//! at the global scope, stored as an arena of records addressed by
//! `ScopeId` rather than as a pointer graph. A secondary index keyed by
//! block node ids lets later stages jump straight to the scope a block
//! opened.

use std::cell::Cell;

use hashbrown::HashMap;

use crate::{
    frontend::{ast::NodeId, token::Pos},
    index::{IndexVec, simple_index},
    middle::ty::Type,
};

simple_index! {
    /// Identifies a scope within a symbol table
    pub struct ScopeId;
}

impl ScopeId {
    pub const GLOBAL: Self = Self(0);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Var,
    Const,
    Func,
    Type,
}

/// A Symbol is any declared name with a value: a variable, constant, type,
/// or function. Each symbol has a corresponding type; for functions it is
/// the return type.
#[derive(Debug)]
pub struct Symbol {
    /// Symbol name as it appears in the file
    pub name: String,
    pub kind: SymbolKind,
    pub ty: Type,
    /// If the symbol is public. A reference count of 0 is ok for exported
    /// symbols.
    pub exported: bool,
    /// Position of the declaring token
    pub decl_pos: Pos,

    /// How many times the symbol has been referenced. 0 means unused.
    /// Lookups bump this through a shared reference, hence the cell.
    ref_count: Cell<u32>,
}

impl Symbol {
    pub fn new(name: impl Into<String>, kind: SymbolKind, ty: Type, exported: bool, decl_pos: Pos) -> Self {
        Self {
            name: name.into(),
            kind,
            ty,
            exported,
            decl_pos,
            ref_count: Cell::new(0),
        }
    }

    pub fn ref_count(&self) -> u32 {
        self.ref_count.get()
    }
}

#[derive(Debug)]
pub struct Scope {
    /// None means this is the global scope
    pub parent: Option<ScopeId>,
    pub children: Vec<ScopeId>,
    symbols: HashMap<String, Symbol>,

    /// The expected return type for bodies in this scope. Defaults to void
    /// and is inherited by child scopes.
    pub return_type: Type,

    /// True if there has been a return statement in this scope (not counting
    /// child scopes). All succeeding statements in the scope are
    /// unreachable.
    pub has_returned: bool,
}

impl Scope {
    fn new(parent: Option<ScopeId>, return_type: Type) -> Self {
        Self {
            parent,
            children: Vec::new(),
            symbols: HashMap::new(),
            return_type,
            has_returned: false,
        }
    }

    /// The symbol mapped to name in this scope only.
    pub fn local_symbol(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }

    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.values()
    }
}

#[derive(Debug)]
pub struct SymbolTable {
    scopes: IndexVec<ScopeId, Scope>,
    block_scopes: HashMap<NodeId, ScopeId>,
    current: ScopeId,
}

impl SymbolTable {
    pub fn new() -> Self {
        let mut scopes = IndexVec::new();
        scopes.push(Scope::new(None, Type::VOID));

        Self {
            scopes,
            block_scopes: HashMap::new(),
            current: ScopeId::GLOBAL,
        }
    }

    pub fn current_scope(&self) -> ScopeId {
        self.current
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id]
    }

    /// Push a new scope, making it the child of the current one. The child
    /// inherits the expected return type.
    pub fn push_scope(&mut self) -> ScopeId {
        let scope = Scope::new(Some(self.current), self.scopes[self.current].return_type);
        let id = self.scopes.push(scope);

        self.scopes[self.current].children.push(id);
        self.current = id;
        id
    }

    /// Pop the current scope, returning to its parent.
    pub fn pop_scope(&mut self) {
        self.current = self.scopes[self.current]
            .parent
            .expect("cannot pop the global scope");
    }

    /// Associate a block node with the current scope so downstream stages
    /// can navigate to it.
    pub fn bind_block(&mut self, block: NodeId) {
        self.block_scopes.insert(block, self.current);
    }

    pub fn block_scope(&self, block: NodeId) -> Option<ScopeId> {
        self.block_scopes.get(&block).copied()
    }

    /// Declare a symbol in the current scope, overriding any existing one.
    pub fn declare(&mut self, symbol: Symbol) {
        self.scopes[self.current]
            .symbols
            .insert(symbol.name.clone(), symbol);
    }

    /// The symbol mapped to name in the current scope or any parent scope.
    /// Every successful lookup bumps the symbol's reference count.
    pub fn symbol(&self, name: &str) -> Option<&Symbol> {
        self.symbol_from(self.current, name)
    }

    fn symbol_from(&self, scope: ScopeId, name: &str) -> Option<&Symbol> {
        let mut cursor = Some(scope);

        while let Some(id) = cursor {
            if let Some(symbol) = self.scopes[id].symbols.get(name) {
                symbol.ref_count.set(symbol.ref_count.get() + 1);
                return Some(symbol);
            }

            cursor = self.scopes[id].parent;
        }

        None
    }

    /// The symbol mapped to name in the current scope only. Does not bump
    /// the reference count.
    pub fn local_symbol(&self, name: &str) -> Option<&Symbol> {
        self.scopes[self.current].local_symbol(name)
    }

    /// Set the expected return type for the current scope.
    pub fn set_return_type(&mut self, ty: Type) {
        self.scopes[self.current].return_type = ty;
    }

    /// The expected return type for the current scope. Defaults to void.
    pub fn return_type(&self) -> Type {
        self.scopes[self.current].return_type
    }

    /// Mark the current scope as having returned, making any succeeding
    /// statements in it unreachable.
    pub fn mark_returned(&mut self) {
        self.scopes[self.current].has_returned = true;
    }

    /// Whether the current scope has returned. Does not consult child
    /// scopes.
    pub fn has_returned(&self) -> bool {
        self.scopes[self.current].has_returned
    }

    pub fn reader(&self) -> TableReader<'_> {
        TableReader {
            table: self,
            current: ScopeId::GLOBAL,
        }
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Read-only view of a finished symbol table for downstream stages. The
/// analyzer has already verified every name, so a failed lookup here is a
/// compiler bug and panics.
#[derive(Debug)]
pub struct TableReader<'a> {
    table: &'a SymbolTable,
    current: ScopeId,
}

impl<'a> TableReader<'a> {
    /// Get a symbol by name in the current or any parent scope.
    pub fn get(&self, name: &str) -> &'a Symbol {
        self.table
            .symbol_from(self.current, name)
            .unwrap_or_else(|| panic!("undefined symbol after analysis: '{name}'"))
    }

    /// Enter the scope that was attached to the given block during
    /// analysis.
    pub fn push(&mut self, block: NodeId) {
        self.current = self
            .table
            .block_scope(block)
            .unwrap_or_else(|| panic!("block {block:?} has no scope"));
    }

    /// Return to the parent scope.
    pub fn pop(&mut self) {
        self.current = self.table.scope(self.current).parent.unwrap_or(ScopeId::GLOBAL);
    }

    /// All global symbols marked public, ordered by name.
    pub fn exported(&self) -> Vec<&'a Symbol> {
        let mut symbols: Vec<_> = self
            .table
            .scope(ScopeId::GLOBAL)
            .symbols()
            .filter(|symbol| symbol.exported)
            .collect();

        symbols.sort_by(|a, b| a.name.cmp(&b.name));
        symbols
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos() -> Pos {
        Pos {
            col: 0,
            row: 0,
            offset: 0,
            line_begin: 0,
        }
    }

    fn var(name: &str, ty: Type) -> Symbol {
        Symbol::new(name, SymbolKind::Var, ty, false, pos())
    }

    #[test]
    fn lookup_walks_parent_scopes() {
        let mut table = SymbolTable::new();
        table.declare(var("a", Type::INT));

        table.push_scope();
        table.push_scope();

        let symbol = table.symbol("a").expect("should find symbol in global scope");
        assert_eq!(symbol.ty, Type::INT);
        assert!(table.symbol("b").is_none());
    }

    #[test]
    fn inner_declarations_shadow_outer() {
        let mut table = SymbolTable::new();
        table.declare(var("x", Type::INT));

        table.push_scope();
        table.declare(var("x", Type::FLOAT));
        assert_eq!(table.symbol("x").unwrap().ty, Type::FLOAT);

        table.pop_scope();
        assert_eq!(table.symbol("x").unwrap().ty, Type::INT);
    }

    #[test]
    fn lookup_bumps_ref_count() {
        let mut table = SymbolTable::new();
        table.declare(var("used", Type::INT));
        table.declare(var("unused", Type::INT));

        table.symbol("used");
        table.symbol("used");

        assert_eq!(table.symbol("used").unwrap().ref_count(), 3);
        assert_eq!(table.local_symbol("unused").unwrap().ref_count(), 0);
    }

    #[test]
    fn local_symbol_is_scope_local() {
        let mut table = SymbolTable::new();
        table.declare(var("a", Type::INT));

        table.push_scope();
        assert!(table.local_symbol("a").is_none());
        assert!(table.symbol("a").is_some());
    }

    #[test]
    fn push_and_pop_balance() {
        let mut table = SymbolTable::new();

        let outer = table.push_scope();
        let inner = table.push_scope();
        assert_ne!(outer, inner);

        table.pop_scope();
        table.pop_scope();
        assert_eq!(table.current_scope(), ScopeId::GLOBAL);
    }

    #[test]
    fn children_inherit_return_type() {
        let mut table = SymbolTable::new();
        table.push_scope();
        table.set_return_type(Type::INT);

        table.push_scope();
        assert_eq!(table.return_type(), Type::INT);
    }

    #[test]
    fn reader_navigates_block_scopes() {
        let mut table = SymbolTable::new();
        table.declare(Symbol::new("f", SymbolKind::Func, Type::INT, true, pos()));

        let block = NodeId(7);
        table.push_scope();
        table.bind_block(block);
        table.declare(var("local", Type::STRING));
        table.pop_scope();

        let mut reader = table.reader();
        assert_eq!(reader.get("f").ty, Type::INT);

        reader.push(block);
        assert_eq!(reader.get("local").ty, Type::STRING);
        assert_eq!(reader.get("f").ty, Type::INT);

        reader.pop();
        assert_eq!(reader.exported().len(), 1);
    }

    #[test]
    #[should_panic(expected = "undefined symbol after analysis")]
    fn reader_get_panics_on_miss() {
        let table = SymbolTable::new();
        table.reader().get("ghost");
    }

    #[test]
    fn exported_is_sorted_and_filtered() {
        let mut table = SymbolTable::new();
        table.declare(Symbol::new("zeta", SymbolKind::Func, Type::VOID, true, pos()));
        table.declare(Symbol::new("alpha", SymbolKind::Func, Type::VOID, true, pos()));
        table.declare(Symbol::new("hidden", SymbolKind::Func, Type::VOID, false, pos()));

        let exported = table.reader().exported();
        let names: Vec<_> = exported.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
    }
}
