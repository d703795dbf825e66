use std::collections::HashMap;

use crate::{
    ast::declarations::DeclId,
    errors::errors::{Error, ErrorImpl},
    Position,
};

/// Scope holding the predefined classes.
pub const PREDEFINED_LEVEL: usize = 0;
/// Scope holding the name of the class being resolved.
pub const CLASS_LEVEL: usize = 1;
/// Scope holding the members of the class being resolved.
pub const MEMBER_LEVEL: usize = 2;
/// Scope holding method parameters; every deeper scope holds locals.
pub const PARAMETER_LEVEL: usize = 3;

/// The scope stack plus the class and member registries.
///
/// Names entered at [`PARAMETER_LEVEL`] or deeper can never be hidden by a
/// nested declaration. Lower levels can: a local may shadow a field.
#[derive(Debug, Default)]
pub struct ScopeTable {
    scopes: Vec<HashMap<String, DeclId>>,
    classes: HashMap<String, DeclId>,
    members: HashMap<DeclId, HashMap<String, DeclId>>,
}

impl ScopeTable {
    pub fn new() -> Self {
        ScopeTable {
            scopes: vec![HashMap::new()],
            classes: HashMap::new(),
            members: HashMap::new(),
        }
    }

    pub fn open_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    pub fn close_scope(&mut self) {
        self.scopes.pop();
    }

    /// Index of the innermost open scope.
    pub fn level(&self) -> usize {
        self.scopes.len().saturating_sub(1)
    }

    pub fn enter(&mut self, name: &str, decl: DeclId, position: Position) -> Result<(), Error> {
        if self.declared_in_current_scope(name) {
            return Err(Error::new(
                ErrorImpl::AlreadyDeclared {
                    name: name.to_string(),
                },
                position,
            ));
        }
        if self.declared_in_unhideable_scope(name) {
            return Err(Error::new(
                ErrorImpl::HidesLocal {
                    name: name.to_string(),
                },
                position,
            ));
        }
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), decl);
        }
        Ok(())
    }

    pub fn declared_in_current_scope(&self, name: &str) -> bool {
        self.scopes
            .last()
            .is_some_and(|scope| scope.contains_key(name))
    }

    fn declared_in_unhideable_scope(&self, name: &str) -> bool {
        self.scopes
            .iter()
            .skip(PARAMETER_LEVEL)
            .any(|scope| scope.contains_key(name))
    }

    /// Innermost parameter or local named `name`.
    pub fn lookup_local(&self, name: &str) -> Option<DeclId> {
        self.scopes
            .iter()
            .skip(PARAMETER_LEVEL)
            .rev()
            .find_map(|scope| scope.get(name).copied())
    }

    pub fn register_class(
        &mut self,
        name: &str,
        decl: DeclId,
        position: Position,
    ) -> Result<(), Error> {
        if self.classes.contains_key(name) {
            return Err(Error::new(
                ErrorImpl::DuplicateClass {
                    name: name.to_string(),
                },
                position,
            ));
        }
        self.classes.insert(name.to_string(), decl);
        self.members.entry(decl).or_default();
        Ok(())
    }

    /// Fields and methods of one class share a namespace.
    pub fn register_member(
        &mut self,
        class: DeclId,
        class_name: &str,
        name: &str,
        decl: DeclId,
        position: Position,
    ) -> Result<(), Error> {
        let members = self.members.entry(class).or_default();
        if members.contains_key(name) {
            return Err(Error::new(
                ErrorImpl::DuplicateMember {
                    class: class_name.to_string(),
                    name: name.to_string(),
                },
                position,
            ));
        }
        members.insert(name.to_string(), decl);
        Ok(())
    }

    pub fn class(&self, name: &str) -> Option<DeclId> {
        self.classes.get(name).copied()
    }

    pub fn member(&self, class: DeclId, name: &str) -> Option<DeclId> {
        self.members
            .get(&class)
            .and_then(|members| members.get(name).copied())
    }
}
