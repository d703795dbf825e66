use crate::{
    ast::{
        declarations::RuntimeLocation,
        expressions::{Expr, Reference},
        statements::{Stmt, StmtKind},
    },
    errors::errors::Error,
};

use super::{
    compiler::Compiler,
    expr::{bound_decl, gen_call, gen_expression, gen_reference, not_a_value},
    machine::{Instruction, Primitive, Register, FALSE_REP, TRUE_REP},
};

pub fn gen_statement(compiler: &mut Compiler, statement: &Stmt) -> Result<(), Error> {
    match &statement.kind {
        StmtKind::Block(statements) => {
            compiler.block_locals.push(0);
            for inner in statements {
                gen_statement(compiler, inner)?;
            }
            let count = compiler.block_locals.pop().unwrap_or(0);
            if count > 0 {
                compiler.local_offset -= count;
                compiler.emit(Instruction::Pop(count));
            }
        }
        StmtKind::VarDecl { decl, init } => {
            compiler.allocate_local(*decl)?;
            // The initial value lands in the slot just allocated.
            gen_expression(compiler, init)?;
        }
        StmtKind::Assign { target, value } => gen_assignment(compiler, target, value)?,
        StmtKind::IndexAssign {
            target,
            index,
            value,
        } => {
            gen_reference(compiler, target)?;
            gen_expression(compiler, index)?;
            gen_expression(compiler, value)?;
            compiler.emit(Instruction::Prim(Primitive::ArrayUpd));
        }
        StmtKind::Call { callee, arguments } => {
            let returns_value = gen_call(compiler, callee, arguments, statement.position)?;
            if returns_value {
                compiler.emit(Instruction::Pop(1));
            }
        }
        StmtKind::Return(value) => {
            let args = compiler.param_count;
            match value {
                Some(value) => {
                    gen_expression(compiler, value)?;
                    compiler.emit(Instruction::Return { result: 1, args });
                }
                None => {
                    compiler.emit(Instruction::Return { result: 0, args });
                }
            }
        }
        StmtKind::If {
            condition,
            then_branch,
            else_branch,
        } => {
            gen_expression(compiler, condition)?;
            let skip_then = compiler.emit(Instruction::JumpIf {
                value: FALSE_REP,
                target: 0,
            });
            gen_statement(compiler, then_branch)?;
            let skip_else = compiler.emit(Instruction::Jump(0));

            let else_address = compiler.code.next_address();
            compiler.code.patch(skip_then, else_address)?;
            if let Some(else_branch) = else_branch {
                gen_statement(compiler, else_branch)?;
            }
            let end = compiler.code.next_address();
            compiler.code.patch(skip_else, end)?;
        }
        StmtKind::While { condition, body } => {
            // The test sits after the body and jumps back while true.
            let enter_test = compiler.emit(Instruction::Jump(0));
            gen_statement(compiler, body)?;

            let test = compiler.code.next_address();
            gen_expression(compiler, condition)?;
            compiler.emit(Instruction::JumpIf {
                value: TRUE_REP,
                target: enter_test + 1,
            });
            compiler.code.patch(enter_test, test)?;
        }
    }
    Ok(())
}

fn gen_assignment(
    compiler: &mut Compiler,
    target: &Reference,
    value: &Expr,
) -> Result<(), Error> {
    let decl = bound_decl(target)?;

    match compiler.location(decl)? {
        RuntimeLocation::Frame(offset) => {
            gen_expression(compiler, value)?;
            compiler.emit(Instruction::Store {
                register: Register::LB,
                offset,
            });
        }
        RuntimeLocation::Static(offset) => {
            gen_expression(compiler, value)?;
            compiler.emit(Instruction::Store {
                register: Register::SB,
                offset,
            });
        }
        RuntimeLocation::Instance(offset) => {
            match target {
                Reference::Qualified { base, .. } => gen_reference(compiler, base)?,
                _ => {
                    compiler.emit(Instruction::LoadA {
                        register: Register::OB,
                        offset: 0,
                    });
                }
            }
            compiler.emit(Instruction::LoadL(offset));
            gen_expression(compiler, value)?;
            compiler.emit(Instruction::Prim(Primitive::FieldUpd));
        }
        RuntimeLocation::Code(_) | RuntimeLocation::ClassSize(_) => {
            return Err(not_a_value(compiler, target, decl));
        }
    }
    Ok(())
}
