use crate::{
    ast::{
        declarations::{DeclId, RuntimeLocation},
        expressions::{Expr, ExprKind, Literal, Operator, Reference},
    },
    errors::errors::{Error, ErrorImpl},
    Position,
};

use super::{
    compiler::Compiler,
    machine::{Instruction, Primitive, Register, FALSE_REP, NULL_REP, TRUE_REP},
};

/// Emits code leaving the value of `expr` on the stack top.
pub fn gen_expression(compiler: &mut Compiler, expr: &Expr) -> Result<(), Error> {
    match &expr.kind {
        ExprKind::Literal(literal) => {
            let value = match literal {
                Literal::Int(value) => *value,
                Literal::Boolean(true) => TRUE_REP,
                Literal::Boolean(false) => FALSE_REP,
                Literal::Null => NULL_REP,
            };
            compiler.emit(Instruction::LoadL(value));
        }
        ExprKind::Unary { operator, operand } => {
            gen_expression(compiler, operand)?;
            let primitive = match operator {
                Operator::Minus => Primitive::Neg,
                Operator::Not => Primitive::Not,
                other => return Err(unsupported_operator(*other, expr.position)),
            };
            compiler.emit(Instruction::Prim(primitive));
        }
        ExprKind::Binary {
            operator: operator @ (Operator::And | Operator::Or),
            left,
            right,
        } => {
            // Keep a copy of the left value; it is the result when the jump
            // skips the right operand.
            let (short_circuit_on, primitive) = match operator {
                Operator::And => (FALSE_REP, Primitive::And),
                _ => (TRUE_REP, Primitive::Or),
            };
            gen_expression(compiler, left)?;
            compiler.emit(Instruction::Load {
                register: Register::ST,
                offset: -1,
            });
            let skip = compiler.emit(Instruction::JumpIf {
                value: short_circuit_on,
                target: 0,
            });
            gen_expression(compiler, right)?;
            compiler.emit(Instruction::Prim(primitive));
            let end = compiler.code.next_address();
            compiler.code.patch(skip, end)?;
        }
        ExprKind::Binary {
            operator,
            left,
            right,
        } => {
            gen_expression(compiler, left)?;
            gen_expression(compiler, right)?;
            let primitive = binary_primitive(*operator, expr.position)?;
            compiler.emit(Instruction::Prim(primitive));
        }
        ExprKind::Ref(reference) => gen_reference(compiler, reference)?,
        ExprKind::Index { base, index } => {
            gen_reference(compiler, base)?;
            gen_expression(compiler, index)?;
            compiler.emit(Instruction::Prim(Primitive::ArrayRef));
        }
        ExprKind::Call { callee, arguments } => {
            gen_call(compiler, callee, arguments, expr.position)?;
        }
        ExprKind::NewObject(class_type) => {
            let Some(class) = class_type.name.decl else {
                return Err(Error::new(
                    ErrorImpl::UndeclaredType {
                        name: class_type.name.spelling.clone(),
                    },
                    expr.position,
                ));
            };
            let size = compiler.location(class)?.offset();
            compiler.emit(Instruction::LoadL(-1));
            compiler.emit(Instruction::LoadL(size));
            compiler.emit(Instruction::Prim(Primitive::NewObj));
        }
        ExprKind::NewArray { size, .. } => {
            gen_expression(compiler, size)?;
            compiler.emit(Instruction::Prim(Primitive::NewArr));
        }
    }
    Ok(())
}

/// Emits code leaving the value `reference` denotes on the stack top.
/// Field chains evaluate their base, then dereference one field at a time.
pub fn gen_reference(compiler: &mut Compiler, reference: &Reference) -> Result<(), Error> {
    if reference.is_this() {
        compiler.emit(Instruction::LoadA {
            register: Register::OB,
            offset: 0,
        });
        return Ok(());
    }

    let decl = bound_decl(reference)?;
    if decl == compiler.predefined.array_length {
        let Reference::Qualified { base, .. } = reference else {
            return Err(not_a_value(compiler, reference, decl));
        };
        gen_reference(compiler, base)?;
        compiler.emit(Instruction::Prim(Primitive::ArrayLen));
        return Ok(());
    }
    if compiler.decls[decl].is_class() || compiler.decls[decl].is_method() {
        return Err(not_a_value(compiler, reference, decl));
    }

    match compiler.location(decl)? {
        RuntimeLocation::Frame(offset) => {
            compiler.emit(Instruction::Load {
                register: Register::LB,
                offset,
            });
        }
        RuntimeLocation::Static(offset) => {
            compiler.emit(Instruction::Load {
                register: Register::SB,
                offset,
            });
        }
        RuntimeLocation::Instance(offset) => match reference {
            Reference::Qualified { base, .. } => {
                gen_reference(compiler, base)?;
                compiler.emit(Instruction::LoadL(offset));
                compiler.emit(Instruction::Prim(Primitive::FieldRef));
            }
            _ => {
                compiler.emit(Instruction::Load {
                    register: Register::OB,
                    offset,
                });
            }
        },
        RuntimeLocation::Code(_) | RuntimeLocation::ClassSize(_) => {
            return Err(not_a_value(compiler, reference, decl));
        }
    }
    Ok(())
}

/// Emits a call and returns whether it leaves a result on the stack.
///
/// `System.out.println(n)` lowers to the `putintnl` primitive. Every other
/// call is emitted with a placeholder address and recorded for patching;
/// instance calls push their receiver after the arguments.
pub fn gen_call(
    compiler: &mut Compiler,
    callee: &Reference,
    arguments: &[Expr],
    position: Position,
) -> Result<bool, Error> {
    let decl = bound_decl(callee)?;
    let declaration = &compiler.decls[decl];
    if !declaration.is_method() {
        return Err(Error::new(
            ErrorImpl::NotAMethod {
                name: declaration.name.clone(),
            },
            position,
        ));
    }
    let is_static = declaration.is_static();
    let returns_value = !declaration.ty.is_void();

    for argument in arguments {
        gen_expression(compiler, argument)?;
    }

    if decl == compiler.predefined.println {
        compiler.emit(Instruction::Prim(Primitive::PutIntNl));
        return Ok(false);
    }

    if is_static {
        compiler.emit_call(Instruction::Call(0), decl);
    } else {
        match callee {
            Reference::Qualified { base, .. } => gen_reference(compiler, base)?,
            _ => {
                compiler.emit(Instruction::LoadA {
                    register: Register::OB,
                    offset: 0,
                });
            }
        }
        compiler.emit_call(Instruction::CallI(0), decl);
    }
    Ok(returns_value)
}

/// The declaration `reference` was bound to by the resolver.
pub fn bound_decl(reference: &Reference) -> Result<DeclId, Error> {
    reference.decl().ok_or_else(|| {
        Error::new(
            ErrorImpl::UndeclaredIdentifier {
                name: reference.name().to_string(),
            },
            reference.position(),
        )
    })
}

pub fn not_a_value(compiler: &Compiler, reference: &Reference, decl: DeclId) -> Error {
    let name = compiler.decls[decl].name.clone();
    let error_impl = if compiler.decls[decl].is_class() {
        ErrorImpl::ClassAsValue { name }
    } else if compiler.decls[decl].is_method() {
        ErrorImpl::MethodAsValue { name }
    } else {
        ErrorImpl::InvalidAssignmentTarget { name }
    };
    Error::new(error_impl, reference.position())
}

fn binary_primitive(operator: Operator, position: Position) -> Result<Primitive, Error> {
    let primitive = match operator {
        Operator::Plus => Primitive::Add,
        Operator::Minus => Primitive::Sub,
        Operator::Times => Primitive::Mult,
        Operator::Divide => Primitive::Div,
        Operator::And => Primitive::And,
        Operator::Or => Primitive::Or,
        Operator::Less => Primitive::Lt,
        Operator::LessEqual => Primitive::Le,
        Operator::Greater => Primitive::Gt,
        Operator::GreaterEqual => Primitive::Ge,
        Operator::Equal => Primitive::Eq,
        Operator::NotEqual => Primitive::Ne,
        Operator::Not => return Err(unsupported_operator(operator, position)),
    };
    Ok(primitive)
}

fn unsupported_operator(operator: Operator, position: Position) -> Error {
    Error::new(
        ErrorImpl::UnsupportedOperator {
            operator: operator.to_string(),
        },
        position,
    )
}
