use std::fmt::{self, Display};

use crate::Position;

use super::declarations::DeclId;

/// Primitive type kinds. `Error` and `Unsupported` never come from source:
/// the checker produces `Error` to contain a failed rule and `Unsupported`
/// marks types that take part in no comparison (statements, `String`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Int,
    Boolean,
    Void,
    Null,
    Error,
    Unsupported,
}

impl Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            TypeKind::Int => "int",
            TypeKind::Boolean => "boolean",
            TypeKind::Void => "void",
            TypeKind::Null => "null",
            TypeKind::Error => "<error>",
            TypeKind::Unsupported => "<unsupported>",
        };
        f.write_str(text)
    }
}

/// A name as written in the source, with the declaration it resolves to once
/// the resolver has run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifier {
    pub spelling: String,
    pub decl: Option<DeclId>,
    pub position: Position,
}

impl Identifier {
    pub fn new(spelling: &str) -> Self {
        Identifier {
            spelling: spelling.to_string(),
            decl: None,
            position: Position::null(),
        }
    }

    pub fn resolved(spelling: &str, decl: DeclId) -> Self {
        Identifier {
            spelling: spelling.to_string(),
            decl: Some(decl),
            position: Position::null(),
        }
    }

    pub fn at(mut self, line: u32, column: u32) -> Self {
        self.position = Position::new(line, column);
        self
    }

    /// Fills the declaration slot unless an earlier run already did, and
    /// returns whatever the slot holds afterwards.
    pub fn bind(&mut self, decl: DeclId) -> DeclId {
        *self.decl.get_or_insert(decl)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassType {
    pub name: Identifier,
}

impl ClassType {
    pub fn new(name: &str) -> Self {
        ClassType {
            name: Identifier::new(name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeDenoter {
    Base(TypeKind),
    Class(ClassType),
    Array(Box<TypeDenoter>),
}

impl TypeDenoter {
    pub fn int() -> Self {
        TypeDenoter::Base(TypeKind::Int)
    }

    pub fn boolean() -> Self {
        TypeDenoter::Base(TypeKind::Boolean)
    }

    pub fn void() -> Self {
        TypeDenoter::Base(TypeKind::Void)
    }

    pub fn null() -> Self {
        TypeDenoter::Base(TypeKind::Null)
    }

    pub fn error() -> Self {
        TypeDenoter::Base(TypeKind::Error)
    }

    pub fn unsupported() -> Self {
        TypeDenoter::Base(TypeKind::Unsupported)
    }

    pub fn class(name: &str) -> Self {
        TypeDenoter::Class(ClassType::new(name))
    }

    pub fn array(element: TypeDenoter) -> Self {
        TypeDenoter::Array(Box::new(element))
    }

    pub fn is_kind(&self, kind: TypeKind) -> bool {
        matches!(self, TypeDenoter::Base(k) if *k == kind)
    }

    pub fn is_error(&self) -> bool {
        self.is_kind(TypeKind::Error)
    }

    pub fn is_void(&self) -> bool {
        self.is_kind(TypeKind::Void)
    }

    pub fn is_array(&self) -> bool {
        matches!(self, TypeDenoter::Array(_))
    }

    pub fn element_type(&self) -> Option<&TypeDenoter> {
        match self {
            TypeDenoter::Array(element) => Some(element),
            _ => None,
        }
    }

    pub fn class_type(&self) -> Option<&ClassType> {
        match self {
            TypeDenoter::Class(class_type) => Some(class_type),
            _ => None,
        }
    }
}

impl Display for TypeDenoter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDenoter::Base(kind) => write!(f, "{}", kind),
            TypeDenoter::Class(class_type) => write!(f, "{}", class_type.name.spelling),
            TypeDenoter::Array(element) => write!(f, "{}[]", element),
        }
    }
}
