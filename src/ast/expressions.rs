use std::fmt::{self, Display};

use crate::Position;

use super::{
    declarations::DeclId,
    types::{ClassType, Identifier, TypeDenoter},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Plus,
    Minus,
    Times,
    Divide,
    And,
    Or,
    Not,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Equal,
    NotEqual,
}

impl Operator {
    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            Operator::Plus | Operator::Minus | Operator::Times | Operator::Divide
        )
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            Operator::Less | Operator::LessEqual | Operator::Greater | Operator::GreaterEqual
        )
    }

    pub fn is_equality(self) -> bool {
        matches!(self, Operator::Equal | Operator::NotEqual)
    }

    pub fn is_logical(self) -> bool {
        matches!(self, Operator::And | Operator::Or)
    }
}

impl Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Operator::Plus => "+",
            Operator::Minus => "-",
            Operator::Times => "*",
            Operator::Divide => "/",
            Operator::And => "&&",
            Operator::Or => "||",
            Operator::Not => "!",
            Operator::Less => "<",
            Operator::LessEqual => "<=",
            Operator::Greater => ">",
            Operator::GreaterEqual => ">=",
            Operator::Equal => "==",
            Operator::NotEqual => "!=",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Literal {
    Int(i32),
    Boolean(bool),
    Null,
}

/// A use-site name: `this`, a bare identifier, or `base.member`.
#[derive(Debug, Clone, PartialEq)]
pub enum Reference {
    This {
        decl: Option<DeclId>,
        position: Position,
    },
    Id(Identifier),
    Qualified {
        base: Box<Reference>,
        member: Identifier,
        position: Position,
    },
}

impl Reference {
    pub fn this() -> Self {
        Reference::This {
            decl: None,
            position: Position::null(),
        }
    }

    pub fn id(name: &str) -> Self {
        Reference::Id(Identifier::new(name))
    }

    /// `self.name`
    pub fn member(self, name: &str) -> Self {
        let position = self.position();
        Reference::Qualified {
            base: Box::new(self),
            member: Identifier::new(name),
            position,
        }
    }

    pub fn at(mut self, line: u32, column: u32) -> Self {
        let at = Position::new(line, column);
        match &mut self {
            Reference::This { position, .. } => *position = at,
            Reference::Id(identifier) => identifier.position = at,
            Reference::Qualified {
                member, position, ..
            } => {
                *position = at;
                member.position = at;
            }
        }
        self
    }

    /// The declaration this reference resolved to, if the resolver has run.
    pub fn decl(&self) -> Option<DeclId> {
        match self {
            Reference::This { decl, .. } => *decl,
            Reference::Id(identifier) => identifier.decl,
            Reference::Qualified { member, .. } => member.decl,
        }
    }

    /// The last name in the reference.
    pub fn name(&self) -> &str {
        match self {
            Reference::This { .. } => "this",
            Reference::Id(identifier) => &identifier.spelling,
            Reference::Qualified { member, .. } => &member.spelling,
        }
    }

    pub fn position(&self) -> Position {
        match self {
            Reference::This { position, .. } => *position,
            Reference::Id(identifier) => identifier.position,
            Reference::Qualified { position, .. } => *position,
        }
    }

    pub fn is_this(&self) -> bool {
        matches!(self, Reference::This { .. })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub position: Position,
    /// Filled in by the type checker.
    pub ty: Option<TypeDenoter>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Unary {
        operator: Operator,
        operand: Box<Expr>,
    },
    Binary {
        operator: Operator,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Ref(Reference),
    Index {
        base: Reference,
        index: Box<Expr>,
    },
    Call {
        callee: Reference,
        arguments: Vec<Expr>,
    },
    Literal(Literal),
    NewObject(ClassType),
    NewArray {
        element: TypeDenoter,
        size: Box<Expr>,
    },
}

impl Expr {
    pub fn new(kind: ExprKind) -> Self {
        Expr {
            kind,
            position: Position::null(),
            ty: None,
        }
    }

    pub fn at(mut self, line: u32, column: u32) -> Self {
        self.position = Position::new(line, column);
        self
    }

    pub fn int(value: i32) -> Self {
        Expr::new(ExprKind::Literal(Literal::Int(value)))
    }

    pub fn boolean(value: bool) -> Self {
        Expr::new(ExprKind::Literal(Literal::Boolean(value)))
    }

    pub fn null() -> Self {
        Expr::new(ExprKind::Literal(Literal::Null))
    }

    pub fn reference(reference: Reference) -> Self {
        let position = reference.position();
        Expr {
            position,
            ..Expr::new(ExprKind::Ref(reference))
        }
    }

    /// Shorthand for a bare identifier expression.
    pub fn id(name: &str) -> Self {
        Expr::reference(Reference::id(name))
    }

    pub fn unary(operator: Operator, operand: Expr) -> Self {
        Expr::new(ExprKind::Unary {
            operator,
            operand: Box::new(operand),
        })
    }

    pub fn binary(operator: Operator, left: Expr, right: Expr) -> Self {
        let position = left.position;
        Expr {
            position,
            ..Expr::new(ExprKind::Binary {
                operator,
                left: Box::new(left),
                right: Box::new(right),
            })
        }
    }

    pub fn index(base: Reference, index: Expr) -> Self {
        let position = base.position();
        Expr {
            position,
            ..Expr::new(ExprKind::Index {
                base,
                index: Box::new(index),
            })
        }
    }

    pub fn call(callee: Reference, arguments: Vec<Expr>) -> Self {
        let position = callee.position();
        Expr {
            position,
            ..Expr::new(ExprKind::Call { callee, arguments })
        }
    }

    pub fn new_object(class_name: &str) -> Self {
        Expr::new(ExprKind::NewObject(ClassType::new(class_name)))
    }

    pub fn new_array(element: TypeDenoter, size: Expr) -> Self {
        Expr::new(ExprKind::NewArray {
            element,
            size: Box::new(size),
        })
    }
}
