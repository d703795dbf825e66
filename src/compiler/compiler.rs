//! Main code generation module.
//!
//! This module contains the Compiler structure and the pipeline from a
//! checked program to object code: storage layout, entry method validation,
//! method body normalization, emission and final patch resolution.

use tracing::{debug, trace};

use crate::{
    ast::{
        ast::{ClassDecl, Program},
        declarations::{DeclId, DeclKind, Declarations, Predefined, RuntimeLocation},
        statements::Stmt,
    },
    errors::errors::{Error, ErrorImpl},
    Position,
};

use super::{
    machine::{
        CodeBuffer, Instruction, ObjectCode, PatchEntry, Primitive, LINKAGE_SIZE,
        OBJECT_HEADER_SIZE,
    },
    stmt::gen_statement,
};

/// Code generation state for one program.
pub struct Compiler<'a> {
    /// Declarations, receiving their runtime locations
    pub decls: &'a mut Declarations,
    pub predefined: Predefined,
    /// The code segment being emitted
    pub code: CodeBuffer,
    /// Calls awaiting their callee's address
    pub patches: Vec<PatchEntry>,

    /// Parameters of the method being emitted
    pub param_count: i32,
    /// Next free frame slot for a local variable
    pub local_offset: i32,
    /// Locals declared so far in each open block, innermost last
    pub block_locals: Vec<i32>,
}

impl<'a> Compiler<'a> {
    pub fn new(decls: &'a mut Declarations, predefined: Predefined) -> Self {
        Compiler {
            decls,
            predefined,
            code: CodeBuffer::default(),
            patches: vec![],
            param_count: 0,
            local_offset: LINKAGE_SIZE,
            block_locals: vec![],
        }
    }

    pub fn emit(&mut self, instruction: Instruction) -> usize {
        self.code.emit(instruction)
    }

    /// Emits a call to `target` with a placeholder address and records it
    /// for patching.
    pub fn emit_call(&mut self, instruction: Instruction, target: DeclId) -> usize {
        let address = self.code.emit(instruction);
        self.patches.push(PatchEntry { address, target });
        address
    }

    pub fn location(&self, id: DeclId) -> Result<RuntimeLocation, Error> {
        self.decls.location(id)
    }

    /// Gives a freshly declared local the next frame slot.
    pub fn allocate_local(&mut self, id: DeclId) -> Result<(), Error> {
        self.decls
            .set_location(id, RuntimeLocation::Frame(self.local_offset))?;
        self.local_offset += 1;
        if let Some(count) = self.block_locals.last_mut() {
            *count += 1;
        }
        Ok(())
    }
}

/// Generates object code for a resolved and type checked program.
///
/// Fails on the first contract violation; no partial code is returned.
pub fn compile(program: &mut Program) -> Result<ObjectCode, Error> {
    let Program {
        decls,
        classes,
        predefined,
    } = program;
    let mut compiler = Compiler::new(decls, *predefined);

    // Prologue: reserve the static segment, pass an empty argument array,
    // call the entry method and halt when it returns.
    let static_segment_address = compiler.emit(Instruction::Push(0));
    compiler.emit(Instruction::LoadL(0));
    compiler.emit(Instruction::Prim(Primitive::NewArr));
    let entry_call = compiler.emit(Instruction::Call(0));
    compiler.emit(Instruction::Halt);

    let static_segment_size = layout(compiler.decls, classes)?;
    compiler
        .code
        .patch(static_segment_address, static_segment_size as usize)?;

    let main = find_main(compiler.decls, classes)?;
    compiler.patches.push(PatchEntry {
        address: entry_call,
        target: main,
    });

    normalize_bodies(compiler.decls, classes)?;

    for class in classes.iter() {
        for method in class.methods.iter() {
            gen_method(&mut compiler, method.id, &method.body)?;
        }
    }

    resolve_patches(&mut compiler)?;
    let entry_address = compiler.location(main)?.offset() as usize;

    let object_code = ObjectCode {
        instructions: compiler.code.into_instructions(),
        static_segment_size,
        entry_address,
        patches: compiler.patches,
    };
    for (address, instruction) in object_code.instructions.iter().enumerate() {
        trace!(target: "compiler", "{:>4}: {}", address, instruction);
    }
    Ok(object_code)
}

/// Assigns static and instance field offsets plus class sizes. Returns the
/// size of the static segment.
pub fn layout(decls: &mut Declarations, classes: &[ClassDecl]) -> Result<i32, Error> {
    let mut static_offset = 0;
    for class in classes {
        let fields = match &decls[class.id].kind {
            DeclKind::Class { fields, .. } => fields.clone(),
            _ => vec![],
        };

        let mut instance_offset = OBJECT_HEADER_SIZE;
        for field in fields {
            if decls[field].is_static() {
                decls.set_location(field, RuntimeLocation::Static(static_offset))?;
                static_offset += 1;
            } else {
                decls.set_location(field, RuntimeLocation::Instance(instance_offset))?;
                instance_offset += 1;
            }
        }
        decls.set_location(class.id, RuntimeLocation::ClassSize(instance_offset))?;
    }

    debug!(target: "compiler", static_segment_size = static_offset, "laid out fields");
    Ok(static_offset)
}

/// Finds the entry method and validates its signature:
/// `public static void main(String[] args)`, declared exactly once.
pub fn find_main(decls: &Declarations, classes: &[ClassDecl]) -> Result<DeclId, Error> {
    let mut main = None;
    for method in classes.iter().flat_map(|class| class.methods.iter()) {
        let declaration = &decls[method.id];
        if declaration.name != "main" {
            continue;
        }
        if main.is_some() {
            return Err(Error::new(
                ErrorImpl::DuplicateMainMethod,
                declaration.position,
            ));
        }

        let invalid = |reason: &str| {
            Err(Error::new(
                ErrorImpl::InvalidMainMethod {
                    reason: reason.to_string(),
                },
                declaration.position,
            ))
        };
        if !declaration.is_static() {
            return invalid("main must be static");
        }
        if declaration.is_private() {
            return invalid("main must not be private");
        }
        if !declaration.ty.is_void() {
            return invalid("main must return void");
        }
        let [param] = declaration.params() else {
            return invalid("main takes exactly one parameter");
        };
        let is_string_array = decls[*param]
            .ty
            .element_type()
            .and_then(|element| element.class_type())
            .is_some_and(|class_type| class_type.name.spelling == "String");
        if !is_string_array {
            return invalid("the parameter of main must be a String[]");
        }

        main = Some(method.id);
    }

    main.ok_or_else(|| Error::new(ErrorImpl::MissingMainMethod, Position::null()))
}

/// Makes every method body end in a `return`. A non-void method must
/// already do so; an empty non-void body is rejected rather than given a
/// bare `return` it could not type check.
pub fn normalize_bodies(decls: &Declarations, classes: &mut [ClassDecl]) -> Result<(), Error> {
    for method in classes.iter_mut().flat_map(|class| class.methods.iter_mut()) {
        let declaration = &decls[method.id];
        let ends_in_return = method.body.last().is_some_and(Stmt::is_return);
        if ends_in_return {
            continue;
        }
        if !declaration.ty.is_void() {
            return Err(Error::new(
                ErrorImpl::MissingReturnStatement {
                    method: declaration.name.clone(),
                },
                declaration.position,
            ));
        }

        let position = method
            .body
            .last()
            .map_or(declaration.position, |last| last.position);
        method.body.push(Stmt {
            position,
            ..Stmt::return_void()
        });
    }
    Ok(())
}

fn gen_method(compiler: &mut Compiler, id: DeclId, body: &[Stmt]) -> Result<(), Error> {
    let params = compiler.decls[id].params().to_vec();
    compiler.param_count = params.len() as i32;
    for (index, param) in params.into_iter().enumerate() {
        let offset = index as i32 - compiler.param_count;
        compiler
            .decls
            .set_location(param, RuntimeLocation::Frame(offset))?;
    }

    let entry = compiler.code.next_address();
    compiler.decls.set_location(id, RuntimeLocation::Code(entry))?;
    trace!(target: "compiler", method = %compiler.decls[id].name, entry, "emitting method");

    compiler.local_offset = LINKAGE_SIZE;
    // The method body's own locals vanish with the frame on return.
    compiler.block_locals = vec![0];
    for statement in body {
        gen_statement(compiler, statement)?;
    }
    compiler.block_locals.clear();
    Ok(())
}

fn resolve_patches(compiler: &mut Compiler) -> Result<(), Error> {
    for entry in compiler.patches.iter() {
        let address = match compiler.decls.location(entry.target)? {
            RuntimeLocation::Code(address) => address,
            _ => {
                let name = compiler.decls[entry.target].name.clone();
                return Err(Error::new(ErrorImpl::NotAMethod { name }, Position::null()));
            }
        };
        compiler.code.patch(entry.address, address)?;
        debug!(
            target: "compiler",
            address = entry.address,
            callee = address,
            method = %compiler.decls[entry.target].name,
            "patched call"
        );
    }
    Ok(())
}

