//! The target stack machine: registers, instructions, primitive operations
//! and the code buffer the generator emits into.

use std::fmt::{self, Display};

use crate::{
    ast::declarations::DeclId,
    errors::errors::{Error, ErrorImpl},
    Position,
};

pub const TRUE_REP: i32 = 1;
pub const FALSE_REP: i32 = 0;
pub const NULL_REP: i32 = 0;

/// Words between the frame base and the first local variable.
pub const LINKAGE_SIZE: i32 = 3;
/// Words at the start of every object, before its first field.
pub const OBJECT_HEADER_SIZE: i32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Register {
    /// Code base.
    CB,
    /// Static segment base.
    SB,
    /// Local (frame) base.
    LB,
    /// Object base of the current instance method.
    OB,
    /// Stack top.
    ST,
}

impl Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Register::CB => "CB",
            Register::SB => "SB",
            Register::LB => "LB",
            Register::OB => "OB",
            Register::ST => "ST",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    Not,
    And,
    Or,
    Add,
    Sub,
    Mult,
    Div,
    Neg,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    NewObj,
    NewArr,
    ArrayRef,
    ArrayUpd,
    FieldRef,
    FieldUpd,
    ArrayLen,
    PutIntNl,
}

impl Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Primitive::Not => "not",
            Primitive::And => "and",
            Primitive::Or => "or",
            Primitive::Add => "add",
            Primitive::Sub => "sub",
            Primitive::Mult => "mult",
            Primitive::Div => "div",
            Primitive::Neg => "neg",
            Primitive::Lt => "lt",
            Primitive::Le => "le",
            Primitive::Gt => "gt",
            Primitive::Ge => "ge",
            Primitive::Eq => "eq",
            Primitive::Ne => "ne",
            Primitive::NewObj => "newobj",
            Primitive::NewArr => "newarr",
            Primitive::ArrayRef => "arrayref",
            Primitive::ArrayUpd => "arrayupd",
            Primitive::FieldRef => "fieldref",
            Primitive::FieldUpd => "fieldupd",
            Primitive::ArrayLen => "arraylen",
            Primitive::PutIntNl => "putintnl",
        };
        f.write_str(name)
    }
}

/// One machine instruction. Code addresses are absolute indices into the
/// code segment (`CB`-relative).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    LoadL(i32),
    Load { register: Register, offset: i32 },
    LoadA { register: Register, offset: i32 },
    Store { register: Register, offset: i32 },
    Push(i32),
    Pop(i32),
    Jump(usize),
    /// Pops the stack top and jumps when it equals `value`.
    JumpIf { value: i32, target: usize },
    Call(usize),
    /// Calls an instance method; the receiver is on the stack top.
    CallI(usize),
    Prim(Primitive),
    /// Returns `result` words, discarding `args` argument words.
    Return { result: i32, args: i32 },
    Halt,
}

impl Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::LoadL(value) => write!(f, "LOADL {}", value),
            Instruction::Load { register, offset } => write!(f, "LOAD {}[{}]", offset, register),
            Instruction::LoadA { register, offset } => write!(f, "LOADA {}[{}]", offset, register),
            Instruction::Store { register, offset } => write!(f, "STORE {}[{}]", offset, register),
            Instruction::Push(words) => write!(f, "PUSH {}", words),
            Instruction::Pop(words) => write!(f, "POP {}", words),
            Instruction::Jump(target) => write!(f, "JUMP {}[CB]", target),
            Instruction::JumpIf { value, target } => write!(f, "JUMPIF ({}) {}[CB]", value, target),
            Instruction::Call(target) => write!(f, "CALL {}[CB]", target),
            Instruction::CallI(target) => write!(f, "CALLI {}[CB]", target),
            Instruction::Prim(primitive) => write!(f, "{}", primitive),
            Instruction::Return { result, args } => write!(f, "RETURN ({}) {}", result, args),
            Instruction::Halt => write!(f, "HALT"),
        }
    }
}

/// A call whose callee address was unknown when it was emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatchEntry {
    pub address: usize,
    pub target: DeclId,
}

/// Emitted code plus everything a loader needs to run it.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectCode {
    pub instructions: Vec<Instruction>,
    pub static_segment_size: i32,
    /// Address of the entry method's first instruction.
    pub entry_address: usize,
    pub patches: Vec<PatchEntry>,
}

impl ObjectCode {
    /// One instruction per line, prefixed with its address.
    pub fn listing(&self) -> String {
        self.instructions
            .iter()
            .enumerate()
            .map(|(address, instruction)| format!("{:>4}: {}\n", address, instruction))
            .collect()
    }
}

#[derive(Debug, Default)]
pub struct CodeBuffer {
    instructions: Vec<Instruction>,
}

impl CodeBuffer {
    pub fn next_address(&self) -> usize {
        self.instructions.len()
    }

    /// Appends `instruction` and returns its address.
    pub fn emit(&mut self, instruction: Instruction) -> usize {
        self.instructions.push(instruction);
        self.instructions.len() - 1
    }

    pub fn get(&self, address: usize) -> Option<&Instruction> {
        self.instructions.get(address)
    }

    /// Overwrites the operand of the jump, call or push at `address`.
    pub fn patch(&mut self, address: usize, operand: usize) -> Result<(), Error> {
        let unpatchable = || Error::new(ErrorImpl::UnpatchableInstruction { address }, Position::null());

        match self.instructions.get_mut(address).ok_or_else(unpatchable)? {
            Instruction::Jump(target)
            | Instruction::JumpIf { target, .. }
            | Instruction::Call(target)
            | Instruction::CallI(target) => *target = operand,
            Instruction::Push(words) => *words = operand as i32,
            _ => return Err(unpatchable()),
        }
        Ok(())
    }

    pub fn into_instructions(self) -> Vec<Instruction> {
        self.instructions
    }
}
