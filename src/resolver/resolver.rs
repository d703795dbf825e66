use tracing::{debug, trace};

use crate::{
    ast::{
        ast::{ClassDecl, Program},
        declarations::{DeclId, DeclKind, Declarations, Predefined},
        expressions::{Expr, ExprKind, Reference},
        statements::{Stmt, StmtKind},
        types::TypeDenoter,
    },
    errors::errors::{Diagnostics, Error, ErrorImpl, ErrorPolicy},
    Position,
};

use super::scope_table::{ScopeTable, CLASS_LEVEL, MEMBER_LEVEL, PARAMETER_LEVEL};

/// Where a name is being resolved. Passed by value down the traversal.
#[derive(Debug, Clone, Copy)]
pub struct Context {
    pub class: DeclId,
    pub method_static: bool,
    /// Local whose initializing expression is being resolved.
    pub initializing: Option<DeclId>,
}

pub struct Resolver<'a> {
    pub decls: &'a mut Declarations,
    pub predefined: Predefined,
    pub table: ScopeTable,
    pub diagnostics: Diagnostics,
}

impl<'a> Resolver<'a> {
    pub fn new(decls: &'a mut Declarations, predefined: Predefined, policy: ErrorPolicy) -> Self {
        Resolver {
            decls,
            predefined,
            table: ScopeTable::new(),
            diagnostics: Diagnostics::new(policy),
        }
    }

    pub fn report(&mut self, error_impl: ErrorImpl, position: Position) -> Result<(), Error> {
        self.diagnostics.report(Error::new(error_impl, position))
    }

    /// Passes a scope-table failure through the diagnostics policy.
    fn check(&mut self, result: Result<(), Error>) -> Result<(), Error> {
        match result {
            Ok(()) => Ok(()),
            Err(error) => self.diagnostics.report(error),
        }
    }

    /// Binds every class name inside `ty`. Returns the first name that is
    /// not a declared class.
    fn bind_type(&self, ty: &mut TypeDenoter) -> Result<(), String> {
        match ty {
            TypeDenoter::Base(_) => Ok(()),
            TypeDenoter::Class(class_type) => match self.table.class(&class_type.name.spelling) {
                Some(class) => {
                    class_type.name.bind(class);
                    Ok(())
                }
                None => Err(class_type.name.spelling.clone()),
            },
            TypeDenoter::Array(element) => self.bind_type(element),
        }
    }

    fn resolve_decl_type(&mut self, id: DeclId) -> Result<(), Error> {
        let mut ty = self.decls[id].ty.clone();
        let bound = self.bind_type(&mut ty);
        self.decls[id].ty = ty;
        if let Err(name) = bound {
            let position = self.decls[id].position;
            self.report(ErrorImpl::UndeclaredType { name }, position)?;
        }
        Ok(())
    }

    fn resolve_type_at(&mut self, ty: &mut TypeDenoter, position: Position) -> Result<(), Error> {
        if let Err(name) = self.bind_type(ty) {
            self.report(ErrorImpl::UndeclaredType { name }, position)?;
        }
        Ok(())
    }
}

/// Binds every name in `program` to its declaration.
///
/// Under [`ErrorPolicy::FailFast`] the first violation is returned alone;
/// under [`ErrorPolicy::CollectAll`] every violation is returned and the
/// failing bindings stay empty.
pub fn resolve(program: &mut Program, policy: ErrorPolicy) -> Result<(), Vec<Error>> {
    let Program {
        decls,
        classes,
        predefined,
    } = program;
    let mut resolver = Resolver::new(decls, *predefined, policy);

    match resolve_program(&mut resolver, classes) {
        Err(error) => Err(vec![error]),
        Ok(()) if resolver.diagnostics.has_errors() => Err(resolver.diagnostics.into_errors()),
        Ok(()) => Ok(()),
    }
}

fn resolve_program(resolver: &mut Resolver, classes: &mut [ClassDecl]) -> Result<(), Error> {
    for id in resolver.predefined.classes() {
        let name = resolver.decls[id].name.clone();
        let registered = resolver.table.register_class(&name, id, Position::null());
        resolver.check(registered)?;
        let entered = resolver.table.enter(&name, id, Position::null());
        resolver.check(entered)?;

        for member in members_of(resolver.decls, id) {
            let member_name = resolver.decls[member].name.clone();
            let registered =
                resolver
                    .table
                    .register_member(id, &name, &member_name, member, Position::null());
            resolver.check(registered)?;
        }
    }

    register_classes(resolver, classes)?;

    for class in classes.iter_mut() {
        resolve_class(resolver, class)?;
    }

    Ok(())
}

fn members_of(decls: &Declarations, class: DeclId) -> Vec<DeclId> {
    match &decls[class].kind {
        DeclKind::Class { fields, methods } => fields.iter().chain(methods).copied().collect(),
        _ => vec![],
    }
}

/// First pass: class names and member names, then every declared type.
fn register_classes(resolver: &mut Resolver, classes: &[ClassDecl]) -> Result<(), Error> {
    for class in classes {
        let name = resolver.decls[class.id].name.clone();
        let position = resolver.decls[class.id].position;
        let registered = resolver.table.register_class(&name, class.id, position);
        resolver.check(registered)?;

        if let TypeDenoter::Class(class_type) = &mut resolver.decls[class.id].ty {
            class_type.name.bind(class.id);
        }

        for member in members_of(resolver.decls, class.id) {
            let member_name = resolver.decls[member].name.clone();
            let member_position = resolver.decls[member].position;
            let registered = resolver.table.register_member(
                class.id,
                &name,
                &member_name,
                member,
                member_position,
            );
            resolver.check(registered)?;
        }
    }

    for class in classes {
        for member in members_of(resolver.decls, class.id) {
            resolver.resolve_decl_type(member)?;
            for param in resolver.decls[member].params().to_vec() {
                resolver.resolve_decl_type(param)?;
            }
        }
    }

    debug!(
        target: "resolver",
        classes = classes.len(),
        "registered classes and members"
    );
    Ok(())
}

fn resolve_class(resolver: &mut Resolver, class: &mut ClassDecl) -> Result<(), Error> {
    let class_name = resolver.decls[class.id].name.clone();
    trace!(target: "resolver", class = %class_name, "resolving class");

    resolver.table.open_scope();
    debug_assert_eq!(resolver.table.level(), CLASS_LEVEL);
    let entered = resolver
        .table
        .enter(&class_name, class.id, resolver.decls[class.id].position);
    resolver.check(entered)?;

    resolver.table.open_scope();
    debug_assert_eq!(resolver.table.level(), MEMBER_LEVEL);
    for member in members_of(resolver.decls, class.id) {
        let member_name = resolver.decls[member].name.clone();
        // Duplicates were reported while registering.
        if resolver.table.member(class.id, &member_name) == Some(member) {
            let entered = resolver
                .table
                .enter(&member_name, member, resolver.decls[member].position);
            resolver.check(entered)?;
        }
    }

    for method in class.methods.iter_mut() {
        let context = Context {
            class: class.id,
            method_static: resolver.decls[method.id].is_static(),
            initializing: None,
        };

        resolver.table.open_scope();
        debug_assert_eq!(resolver.table.level(), PARAMETER_LEVEL);
        for param in resolver.decls[method.id].params().to_vec() {
            let param_name = resolver.decls[param].name.clone();
            let entered = resolver
                .table
                .enter(&param_name, param, resolver.decls[param].position);
            resolver.check(entered)?;
        }

        resolver.table.open_scope();
        for statement in method.body.iter_mut() {
            resolve_stmt(resolver, statement, context)?;
        }
        resolver.table.close_scope();
        resolver.table.close_scope();
    }

    resolver.table.close_scope();
    resolver.table.close_scope();
    Ok(())
}

pub fn resolve_stmt(
    resolver: &mut Resolver,
    statement: &mut Stmt,
    context: Context,
) -> Result<(), Error> {
    match &mut statement.kind {
        StmtKind::Block(statements) => {
            resolver.table.open_scope();
            for inner in statements.iter_mut() {
                resolve_stmt(resolver, inner, context)?;
            }
            resolver.table.close_scope();
        }
        StmtKind::VarDecl { decl, init } => {
            let decl = *decl;
            resolve_expr(
                resolver,
                init,
                Context {
                    initializing: Some(decl),
                    ..context
                },
            )?;
            resolver.resolve_decl_type(decl)?;

            let name = resolver.decls[decl].name.clone();
            let position = resolver.decls[decl].position;
            let entered = resolver.table.enter(&name, decl, position);
            resolver.check(entered)?;
        }
        StmtKind::Assign { target, value } => {
            resolve_reference(resolver, target, context)?;
            resolve_expr(resolver, value, context)?;
        }
        StmtKind::IndexAssign {
            target,
            index,
            value,
        } => {
            resolve_reference(resolver, target, context)?;
            resolve_expr(resolver, index, context)?;
            resolve_expr(resolver, value, context)?;
        }
        StmtKind::Call { callee, arguments } => {
            resolve_reference(resolver, callee, context)?;
            for argument in arguments.iter_mut() {
                resolve_expr(resolver, argument, context)?;
            }
        }
        StmtKind::Return(value) => {
            if let Some(value) = value {
                resolve_expr(resolver, value, context)?;
            }
        }
        StmtKind::If {
            condition,
            then_branch,
            else_branch,
        } => {
            resolve_expr(resolver, condition, context)?;
            resolve_branch(resolver, then_branch, context)?;
            if let Some(else_branch) = else_branch {
                resolve_branch(resolver, else_branch, context)?;
            }
        }
        StmtKind::While { condition, body } => {
            resolve_expr(resolver, condition, context)?;
            resolve_branch(resolver, body, context)?;
        }
    }
    Ok(())
}

/// An arm of an `if` or `while`. A declaration may not be the whole arm.
fn resolve_branch(resolver: &mut Resolver, branch: &mut Stmt, context: Context) -> Result<(), Error> {
    if branch.is_var_decl() {
        resolver.report(ErrorImpl::SolitaryDeclaration, branch.position)?;
        resolver.table.open_scope();
        let resolved = resolve_stmt(resolver, branch, context);
        resolver.table.close_scope();
        return resolved;
    }
    resolve_stmt(resolver, branch, context)
}

pub fn resolve_expr(resolver: &mut Resolver, expr: &mut Expr, context: Context) -> Result<(), Error> {
    let position = expr.position;
    match &mut expr.kind {
        ExprKind::Unary { operand, .. } => resolve_expr(resolver, operand, context)?,
        ExprKind::Binary { left, right, .. } => {
            resolve_expr(resolver, left, context)?;
            resolve_expr(resolver, right, context)?;
        }
        ExprKind::Ref(reference) => {
            resolve_reference(resolver, reference, context)?;
        }
        ExprKind::Index { base, index } => {
            resolve_reference(resolver, base, context)?;
            resolve_expr(resolver, index, context)?;
        }
        ExprKind::Call { callee, arguments } => {
            resolve_reference(resolver, callee, context)?;
            for argument in arguments.iter_mut() {
                resolve_expr(resolver, argument, context)?;
            }
        }
        ExprKind::Literal(_) => {}
        ExprKind::NewObject(class_type) => {
            match resolver.table.class(&class_type.name.spelling) {
                Some(class) => {
                    class_type.name.bind(class);
                }
                None => {
                    let name = class_type.name.spelling.clone();
                    resolver.report(ErrorImpl::UndeclaredType { name }, position)?;
                }
            }
        }
        ExprKind::NewArray { element, size } => {
            resolver.resolve_type_at(element, position)?;
            resolve_expr(resolver, size, context)?;
        }
    }
    Ok(())
}

/// Binds `reference` and returns the declaration it denotes, or `None` when
/// resolution failed and the failure was recorded.
pub fn resolve_reference(
    resolver: &mut Resolver,
    reference: &mut Reference,
    context: Context,
) -> Result<Option<DeclId>, Error> {
    match reference {
        Reference::This { decl, position } => {
            if context.method_static {
                resolver.report(ErrorImpl::ThisInStaticMethod, *position)?;
            }
            Ok(Some(*decl.get_or_insert(context.class)))
        }
        Reference::Id(identifier) => {
            let spelling = identifier.spelling.clone();
            let position = identifier.position;

            if let Some(local) = context.initializing {
                if resolver.decls[local].name == spelling {
                    resolver.report(ErrorImpl::SelfInitialization { name: spelling }, position)?;
                    return Ok(None);
                }
            }

            let found = resolver
                .table
                .lookup_local(&spelling)
                .or_else(|| resolver.table.member(context.class, &spelling))
                .or_else(|| resolver.table.class(&spelling));
            let Some(decl) = found else {
                resolver.report(ErrorImpl::UndeclaredIdentifier { name: spelling }, position)?;
                return Ok(None);
            };

            let declaration = &resolver.decls[decl];
            if (declaration.is_field() || declaration.is_method())
                && declaration.is_static() != context.method_static
            {
                resolver.report(ErrorImpl::StaticContext { name: spelling }, position)?;
                return Ok(None);
            }

            Ok(Some(identifier.bind(decl)))
        }
        Reference::Qualified {
            base,
            member,
            position,
        } => {
            let position = *position;
            let Some(base_decl) = resolve_reference(resolver, base, context)? else {
                return Ok(None);
            };

            let base_declaration = &resolver.decls[base_decl];
            if base_declaration.is_method() {
                let name = base_declaration.name.clone();
                resolver.report(ErrorImpl::MethodInQualifiedReference { name }, position)?;
                return Ok(None);
            }

            let spelling = member.spelling.clone();
            let through_class_name = base_declaration.is_class() && !base.is_this();

            let owner = if base.is_this() {
                context.class
            } else if through_class_name {
                base_decl
            } else {
                match &base_declaration.ty {
                    TypeDenoter::Class(class_type) => match class_type.name.decl {
                        Some(class) => class,
                        // The declared type was already reported as undeclared.
                        None => return Ok(None),
                    },
                    TypeDenoter::Array(_) if spelling == "length" => {
                        return Ok(Some(member.bind(resolver.predefined.array_length)));
                    }
                    TypeDenoter::Array(_) => {
                        let class = base_declaration.ty.to_string();
                        resolver.report(
                            ErrorImpl::UndeclaredMember {
                                class,
                                name: spelling,
                            },
                            position,
                        )?;
                        return Ok(None);
                    }
                    ty => {
                        let (name, type_) = (base_declaration.name.clone(), ty.to_string());
                        resolver.report(ErrorImpl::NotAnObject { name, type_ }, position)?;
                        return Ok(None);
                    }
                }
            };

            let class_name = resolver.decls[owner].name.clone();
            let Some(decl) = resolver.table.member(owner, &spelling) else {
                resolver.report(
                    ErrorImpl::UndeclaredMember {
                        class: class_name,
                        name: spelling,
                    },
                    position,
                )?;
                return Ok(None);
            };

            let declaration = &resolver.decls[decl];
            if declaration.is_private() && declaration.owner() != Some(context.class) {
                resolver.report(
                    ErrorImpl::PrivateAccess {
                        class: class_name,
                        name: spelling,
                    },
                    position,
                )?;
                return Ok(None);
            }
            if through_class_name && !declaration.is_static() {
                resolver.report(
                    ErrorImpl::NonStaticMember {
                        class: class_name,
                        name: spelling,
                    },
                    position,
                )?;
                return Ok(None);
            }

            Ok(Some(member.bind(decl)))
        }
    }
}
