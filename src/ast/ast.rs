use crate::Position;

use super::{
    declarations::{DeclId, DeclKind, Declaration, Declarations, Modifiers, Predefined},
    statements::Stmt,
    types::TypeDenoter,
};

/// A whole compilation unit: the declaration arena plus the user classes in
/// source order.
#[derive(Debug, Clone)]
pub struct Program {
    pub decls: Declarations,
    pub classes: Vec<ClassDecl>,
    pub predefined: Predefined,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassDecl {
    pub id: DeclId,
    /// Same order as the `methods` list of the class declaration.
    pub methods: Vec<MethodDecl>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodDecl {
    pub id: DeclId,
    pub body: Vec<Stmt>,
}

impl Default for Program {
    fn default() -> Self {
        Program::new()
    }
}

impl Program {
    pub fn new() -> Self {
        let mut decls = Declarations::default();
        let predefined = Predefined::install(&mut decls);
        Program {
            decls,
            classes: vec![],
            predefined,
        }
    }

    /// Starts a new class declaration.
    pub fn class(&mut self, name: &str) -> ClassBuilder<'_> {
        let id = self.decls.alloc(Declaration::new(
            name,
            TypeDenoter::class(name),
            DeclKind::Class {
                fields: vec![],
                methods: vec![],
            },
            Position::null(),
        ));
        self.classes.push(ClassDecl {
            id,
            methods: vec![],
        });
        let index = self.classes.len() - 1;
        ClassBuilder {
            program: self,
            index,
            last: id,
        }
    }

    /// Allocates a local variable declaration for use in a `VarDecl`
    /// statement.
    pub fn local(&mut self, name: &str, ty: TypeDenoter) -> DeclId {
        self.local_at(name, ty, Position::null())
    }

    pub fn local_at(&mut self, name: &str, ty: TypeDenoter, position: Position) -> DeclId {
        self.decls
            .alloc(Declaration::new(name, ty, DeclKind::LocalVar, position))
    }

    /// First user class with this name.
    pub fn find_class(&self, name: &str) -> Option<DeclId> {
        self.classes
            .iter()
            .map(|class| class.id)
            .find(|id| self.decls[*id].name == name)
    }

    /// First field or method named `name` of the class `class`.
    pub fn find_member(&self, class: DeclId, name: &str) -> Option<DeclId> {
        match &self.decls[class].kind {
            DeclKind::Class { fields, methods } => fields
                .iter()
                .chain(methods.iter())
                .copied()
                .find(|id| self.decls[*id].name == name),
            _ => None,
        }
    }

    pub fn method(&self, id: DeclId) -> Option<&MethodDecl> {
        self.classes
            .iter()
            .flat_map(|class| class.methods.iter())
            .find(|method| method.id == id)
    }
}

/// Appends members to the class most recently opened with
/// [`Program::class`]. `at` positions whichever item was added last.
pub struct ClassBuilder<'a> {
    program: &'a mut Program,
    index: usize,
    last: DeclId,
}

impl ClassBuilder<'_> {
    pub fn id(&self) -> DeclId {
        self.program.classes[self.index].id
    }

    pub fn at(mut self, line: u32, column: u32) -> Self {
        self.program.decls[self.last].position = Position::new(line, column);
        self
    }

    pub fn field(mut self, name: &str, ty: TypeDenoter, modifiers: Modifiers) -> Self {
        let owner = self.id();
        let field = self.program.decls.alloc(Declaration::new(
            name,
            ty,
            DeclKind::Field {
                modifiers,
                owner: Some(owner),
            },
            Position::null(),
        ));
        if let DeclKind::Class { fields, .. } = &mut self.program.decls[owner].kind {
            fields.push(field);
        }
        self.last = field;
        self
    }

    pub fn method(
        mut self,
        name: &str,
        return_type: TypeDenoter,
        modifiers: Modifiers,
        params: Vec<(&str, TypeDenoter)>,
        body: Vec<Stmt>,
    ) -> Self {
        let owner = self.id();
        let params = params
            .into_iter()
            .map(|(param_name, ty)| {
                self.program.decls.alloc(Declaration::new(
                    param_name,
                    ty,
                    DeclKind::Parameter,
                    Position::null(),
                ))
            })
            .collect();
        let method = self.program.decls.alloc(Declaration::new(
            name,
            return_type,
            DeclKind::Method {
                modifiers,
                owner,
                params,
            },
            Position::null(),
        ));
        if let DeclKind::Class { methods, .. } = &mut self.program.decls[owner].kind {
            methods.push(method);
        }
        self.program.classes[self.index]
            .methods
            .push(MethodDecl { id: method, body });
        self.last = method;
        self
    }

    /// The id of the member (or class) added last.
    pub fn last(&self) -> DeclId {
        self.last
    }
}
