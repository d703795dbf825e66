use crate::Position;

use super::{
    declarations::DeclId,
    expressions::{Expr, Reference},
};

#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    Block(Vec<Stmt>),
    /// `decl` is the local variable's entry in the declaration arena.
    VarDecl {
        decl: DeclId,
        init: Expr,
    },
    Assign {
        target: Reference,
        value: Expr,
    },
    IndexAssign {
        target: Reference,
        index: Expr,
        value: Expr,
    },
    Call {
        callee: Reference,
        arguments: Vec<Expr>,
    },
    Return(Option<Expr>),
    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },
    While {
        condition: Expr,
        body: Box<Stmt>,
    },
}

impl Stmt {
    pub fn new(kind: StmtKind) -> Self {
        Stmt {
            kind,
            position: Position::null(),
        }
    }

    pub fn at(mut self, line: u32, column: u32) -> Self {
        self.position = Position::new(line, column);
        self
    }

    pub fn block(statements: Vec<Stmt>) -> Self {
        Stmt::new(StmtKind::Block(statements))
    }

    pub fn var_decl(decl: DeclId, init: Expr) -> Self {
        Stmt::new(StmtKind::VarDecl { decl, init })
    }

    pub fn assign(target: Reference, value: Expr) -> Self {
        let position = target.position();
        Stmt {
            position,
            ..Stmt::new(StmtKind::Assign { target, value })
        }
    }

    pub fn index_assign(target: Reference, index: Expr, value: Expr) -> Self {
        let position = target.position();
        Stmt {
            position,
            ..Stmt::new(StmtKind::IndexAssign {
                target,
                index,
                value,
            })
        }
    }

    pub fn call(callee: Reference, arguments: Vec<Expr>) -> Self {
        let position = callee.position();
        Stmt {
            position,
            ..Stmt::new(StmtKind::Call { callee, arguments })
        }
    }

    pub fn return_value(value: Expr) -> Self {
        Stmt::new(StmtKind::Return(Some(value)))
    }

    pub fn return_void() -> Self {
        Stmt::new(StmtKind::Return(None))
    }

    pub fn if_then(condition: Expr, then_branch: Stmt) -> Self {
        Stmt::new(StmtKind::If {
            condition,
            then_branch: Box::new(then_branch),
            else_branch: None,
        })
    }

    pub fn if_else(condition: Expr, then_branch: Stmt, else_branch: Stmt) -> Self {
        Stmt::new(StmtKind::If {
            condition,
            then_branch: Box::new(then_branch),
            else_branch: Some(Box::new(else_branch)),
        })
    }

    pub fn while_loop(condition: Expr, body: Stmt) -> Self {
        Stmt::new(StmtKind::While {
            condition,
            body: Box::new(body),
        })
    }

    pub fn is_return(&self) -> bool {
        matches!(self.kind, StmtKind::Return(_))
    }

    pub fn is_var_decl(&self) -> bool {
        matches!(self.kind, StmtKind::VarDecl { .. })
    }
}
