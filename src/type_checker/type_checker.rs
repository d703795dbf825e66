use tracing::{debug, trace};

use crate::{
    ast::{
        ast::Program,
        declarations::{DeclId, Declarations, Predefined},
        expressions::{Expr, ExprKind, Literal, Operator, Reference},
        statements::{Stmt, StmtKind},
        types::TypeDenoter,
    },
    errors::errors::{Diagnostics, Error, ErrorImpl, ErrorPolicy},
    Position,
};

use super::equality::types_equal;

pub struct TypeChecker<'a> {
    pub decls: &'a Declarations,
    pub predefined: Predefined,
    pub diagnostics: Diagnostics,
}

impl<'a> TypeChecker<'a> {
    pub fn new(decls: &'a Declarations, predefined: Predefined, policy: ErrorPolicy) -> Self {
        TypeChecker {
            decls,
            predefined,
            diagnostics: Diagnostics::new(policy),
        }
    }

    pub fn equal(&self, a: &TypeDenoter, b: &TypeDenoter) -> bool {
        types_equal(self.decls, a, b)
    }

    /// Records a failed rule. The caller substitutes the error type.
    pub fn report(&mut self, error_impl: ErrorImpl, position: Position) -> Result<(), Error> {
        self.diagnostics.report(Error::new(error_impl, position))
    }

    /// Checks that `actual` satisfies `expected`, reporting through
    /// `make_error` otherwise.
    fn require(
        &mut self,
        expected: &TypeDenoter,
        actual: &TypeDenoter,
        position: Position,
        make_error: impl FnOnce(String, String) -> ErrorImpl,
    ) -> Result<bool, Error> {
        if self.equal(expected, actual) {
            return Ok(true);
        }
        self.report(
            make_error(expected.to_string(), actual.to_string()),
            position,
        )?;
        Ok(false)
    }
}

/// Annotates every expression of `program` with its type.
pub fn type_check(program: &mut Program, policy: ErrorPolicy) -> Result<(), Vec<Error>> {
    let Program {
        decls,
        classes,
        predefined,
    } = program;
    let mut type_checker = TypeChecker::new(decls, *predefined, policy);

    let mut checked = Ok(());
    'classes: for class in classes.iter_mut() {
        for method in class.methods.iter_mut() {
            trace!(
                target: "type_checker",
                method = %type_checker.decls[method.id].name,
                "checking method"
            );
            for statement in method.body.iter_mut() {
                if let Err(error) = type_check_stmt(&mut type_checker, statement, method.id) {
                    checked = Err(error);
                    break 'classes;
                }
            }
        }
    }

    match checked {
        Err(error) => Err(vec![error]),
        Ok(()) if type_checker.diagnostics.has_errors() => {
            debug!(
                target: "type_checker",
                errors = type_checker.diagnostics.errors().len(),
                "type checking failed"
            );
            Err(type_checker.diagnostics.into_errors())
        }
        Ok(()) => Ok(()),
    }
}

pub fn type_check_stmt(
    type_checker: &mut TypeChecker,
    statement: &mut Stmt,
    method: DeclId,
) -> Result<(), Error> {
    let position = statement.position;
    match &mut statement.kind {
        StmtKind::Block(statements) => {
            for inner in statements.iter_mut() {
                type_check_stmt(type_checker, inner, method)?;
            }
        }
        StmtKind::VarDecl { decl, init } => {
            let declared = type_checker.decls[*decl].ty.clone();
            let value = type_check_expr(type_checker, init)?;
            type_checker.require(&declared, &value, init.position, |expected, received| {
                ErrorImpl::TypeMatchError { expected, received }
            })?;
        }
        StmtKind::Assign { target, value } => {
            let target_type = type_check_assign_target(type_checker, target)?;
            let value_type = type_check_expr(type_checker, value)?;
            type_checker.require(&target_type, &value_type, value.position, |expected, received| {
                ErrorImpl::TypeMatchError { expected, received }
            })?;
        }
        StmtKind::IndexAssign {
            target,
            index,
            value,
        } => {
            let element = type_check_indexed(type_checker, target, index)?;
            let value_type = type_check_expr(type_checker, value)?;
            type_checker.require(&element, &value_type, value.position, |expected, received| {
                ErrorImpl::TypeMatchError { expected, received }
            })?;
        }
        StmtKind::Call { callee, arguments } => {
            type_check_call(type_checker, callee, arguments, position)?;
        }
        StmtKind::Return(value) => {
            let return_type = type_checker.decls[method].ty.clone();
            match value {
                Some(value) => {
                    let value_type = type_check_expr(type_checker, value)?;
                    type_checker.require(
                        &return_type,
                        &value_type,
                        value.position,
                        |expected, received| ErrorImpl::ReturnTypeMatchError { expected, received },
                    )?;
                }
                None if !return_type.is_void() => {
                    type_checker.report(ErrorImpl::MissingReturnValue, position)?;
                }
                None => {}
            }
        }
        StmtKind::If {
            condition,
            then_branch,
            else_branch,
        } => {
            type_check_condition(type_checker, condition)?;
            type_check_stmt(type_checker, then_branch, method)?;
            if let Some(else_branch) = else_branch {
                type_check_stmt(type_checker, else_branch, method)?;
            }
        }
        StmtKind::While { condition, body } => {
            type_check_condition(type_checker, condition)?;
            type_check_stmt(type_checker, body, method)?;
        }
    }
    Ok(())
}

fn type_check_condition(type_checker: &mut TypeChecker, condition: &mut Expr) -> Result<(), Error> {
    let condition_type = type_check_expr(type_checker, condition)?;
    if !type_checker.equal(&TypeDenoter::boolean(), &condition_type) {
        type_checker.report(
            ErrorImpl::ConditionNotBoolean {
                received: condition_type.to_string(),
            },
            condition.position,
        )?;
    }
    Ok(())
}

/// Computes the type of `expr` and stores it in the node's type slot. A slot
/// that is already filled keeps its value.
pub fn type_check_expr(type_checker: &mut TypeChecker, expr: &mut Expr) -> Result<TypeDenoter, Error> {
    let position = expr.position;
    let ty = match &mut expr.kind {
        ExprKind::Literal(literal) => match literal {
            Literal::Int(_) => TypeDenoter::int(),
            Literal::Boolean(_) => TypeDenoter::boolean(),
            Literal::Null => TypeDenoter::null(),
        },
        ExprKind::Unary { operator, operand } => {
            let operator = *operator;
            let operand_type = type_check_expr(type_checker, operand)?;
            let (expected, result) = match operator {
                Operator::Not => (TypeDenoter::boolean(), TypeDenoter::boolean()),
                Operator::Minus => (TypeDenoter::int(), TypeDenoter::int()),
                _ => {
                    type_checker.report(
                        ErrorImpl::UnsupportedOperator {
                            operator: operator.to_string(),
                        },
                        position,
                    )?;
                    (TypeDenoter::error(), TypeDenoter::error())
                }
            };
            if type_checker.equal(&expected, &operand_type) {
                result
            } else {
                type_checker.report(
                    ErrorImpl::OperandTypeError {
                        operator: operator.to_string(),
                        expected: expected.to_string(),
                        received: operand_type.to_string(),
                    },
                    position,
                )?;
                TypeDenoter::error()
            }
        }
        ExprKind::Binary {
            operator,
            left,
            right,
        } => {
            let operator = *operator;
            let left_type = type_check_expr(type_checker, left)?;
            let right_type = type_check_expr(type_checker, right)?;
            type_check_binary(type_checker, operator, &left_type, &right_type, position)?
        }
        ExprKind::Ref(reference) => type_check_value(type_checker, reference)?,
        ExprKind::Index { base, index } => type_check_indexed(type_checker, base, index)?,
        ExprKind::Call { callee, arguments } => {
            type_check_call(type_checker, callee, arguments, position)?
        }
        ExprKind::NewObject(class_type) => match class_type.name.decl {
            Some(_) => TypeDenoter::Class(class_type.clone()),
            None => TypeDenoter::error(),
        },
        ExprKind::NewArray { element, size } => {
            let element = element.clone();
            let size_type = type_check_expr(type_checker, size)?;
            if type_checker.equal(&TypeDenoter::int(), &size_type) {
                TypeDenoter::array(element)
            } else {
                type_checker.report(
                    ErrorImpl::ArraySizeNotInt {
                        received: size_type.to_string(),
                    },
                    size.position,
                )?;
                TypeDenoter::error()
            }
        }
    };
    Ok(annotate(expr, ty))
}

fn annotate(expr: &mut Expr, ty: TypeDenoter) -> TypeDenoter {
    expr.ty.get_or_insert(ty).clone()
}

fn type_check_binary(
    type_checker: &mut TypeChecker,
    operator: Operator,
    left: &TypeDenoter,
    right: &TypeDenoter,
    position: Position,
) -> Result<TypeDenoter, Error> {
    if operator.is_equality() {
        if type_checker.equal(left, right) {
            return Ok(TypeDenoter::boolean());
        }
        type_checker.report(
            ErrorImpl::OperandTypeError {
                operator: operator.to_string(),
                expected: left.to_string(),
                received: right.to_string(),
            },
            position,
        )?;
        return Ok(TypeDenoter::error());
    }

    let (operand, result) = if operator.is_arithmetic() {
        (TypeDenoter::int(), TypeDenoter::int())
    } else if operator.is_comparison() {
        (TypeDenoter::int(), TypeDenoter::boolean())
    } else if operator.is_logical() {
        (TypeDenoter::boolean(), TypeDenoter::boolean())
    } else {
        type_checker.report(
            ErrorImpl::UnsupportedOperator {
                operator: operator.to_string(),
            },
            position,
        )?;
        return Ok(TypeDenoter::error());
    };

    for received in [left, right] {
        if !type_checker.equal(&operand, received) {
            type_checker.report(
                ErrorImpl::OperandTypeError {
                    operator: operator.to_string(),
                    expected: operand.to_string(),
                    received: received.to_string(),
                },
                position,
            )?;
            return Ok(TypeDenoter::error());
        }
    }
    Ok(result)
}

/// The type of `reference` used as a value. Classes and methods are not
/// values.
fn type_check_value(type_checker: &mut TypeChecker, reference: &Reference) -> Result<TypeDenoter, Error> {
    let Some(decl) = reference.decl() else {
        return Ok(TypeDenoter::error());
    };
    let declaration = &type_checker.decls[decl];

    if reference.is_this() {
        return Ok(declaration.ty.clone());
    }
    if declaration.is_class() {
        let name = declaration.name.clone();
        type_checker.report(ErrorImpl::ClassAsValue { name }, reference.position())?;
        return Ok(TypeDenoter::error());
    }
    if declaration.is_method() {
        let name = declaration.name.clone();
        type_checker.report(ErrorImpl::MethodAsValue { name }, reference.position())?;
        return Ok(TypeDenoter::error());
    }
    Ok(declaration.ty.clone())
}

/// The declared type of an assignment target, or the error type when the
/// reference does not denote a writable variable.
fn type_check_assign_target(
    type_checker: &mut TypeChecker,
    target: &Reference,
) -> Result<TypeDenoter, Error> {
    let Some(decl) = target.decl() else {
        return Ok(TypeDenoter::error());
    };
    let position = target.position();

    if decl == type_checker.predefined.array_length {
        type_checker.report(ErrorImpl::ReadOnlyLength, position)?;
        return Ok(TypeDenoter::error());
    }
    let declaration = &type_checker.decls[decl];
    if target.is_this() || declaration.is_class() || declaration.is_method() {
        let name = target.name().to_string();
        type_checker.report(ErrorImpl::InvalidAssignmentTarget { name }, position)?;
        return Ok(TypeDenoter::error());
    }
    Ok(declaration.ty.clone())
}

/// Checks `base[index]` and returns the element type.
fn type_check_indexed(
    type_checker: &mut TypeChecker,
    base: &Reference,
    index: &mut Expr,
) -> Result<TypeDenoter, Error> {
    let base_type = type_check_value(type_checker, base)?;
    let index_type = type_check_expr(type_checker, index)?;

    if !type_checker.equal(&TypeDenoter::int(), &index_type) {
        type_checker.report(
            ErrorImpl::IndexNotInt {
                received: index_type.to_string(),
            },
            index.position,
        )?;
    }

    match base_type {
        TypeDenoter::Array(element) => Ok(*element),
        ty if ty.is_error() => Ok(ty),
        ty => {
            type_checker.report(
                ErrorImpl::NotAnArray {
                    received: ty.to_string(),
                },
                base.position(),
            )?;
            Ok(TypeDenoter::error())
        }
    }
}

/// Checks a call and returns the callee's declared return type.
fn type_check_call(
    type_checker: &mut TypeChecker,
    callee: &Reference,
    arguments: &mut [Expr],
    position: Position,
) -> Result<TypeDenoter, Error> {
    let mut argument_types = Vec::with_capacity(arguments.len());
    for argument in arguments.iter_mut() {
        argument_types.push(type_check_expr(type_checker, argument)?);
    }

    let Some(decl) = callee.decl() else {
        return Ok(TypeDenoter::error());
    };
    let declaration = &type_checker.decls[decl];
    if !declaration.is_method() {
        let name = declaration.name.clone();
        type_checker.report(ErrorImpl::NotCallable { name }, position)?;
        return Ok(TypeDenoter::error());
    }

    let return_type = declaration.ty.clone();
    let params = declaration.params().to_vec();
    if params.len() != argument_types.len() {
        type_checker.report(
            ErrorImpl::UnexpectedArguments {
                expected: params.len(),
                received: argument_types.len(),
            },
            position,
        )?;
        return Ok(TypeDenoter::error());
    }

    for (index, (param, argument_type)) in params.iter().zip(argument_types.iter()).enumerate() {
        let param_type = type_checker.decls[*param].ty.clone();
        let matched = type_checker.require(
            &param_type,
            argument_type,
            arguments[index].position,
            |expected, received| ErrorImpl::ArgumentTypeMatchError {
                index,
                expected,
                received,
            },
        )?;
        if !matched {
            return Ok(TypeDenoter::error());
        }
    }

    Ok(return_type)
}
