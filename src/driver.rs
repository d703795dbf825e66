//! Pipeline driver.
//!
//! Reads a source file, hands it to a [`Frontend`] for parsing and runs the
//! resolver, the type checker and the code generator over the result. Each
//! stage runs only if the previous one reported nothing.

use std::{fs::read_to_string, path::Path, time::Instant};

use tracing::{error, info};

use crate::{
    ast::ast::Program,
    compiler::{compiler::compile, machine::ObjectCode},
    config::CompileOptions,
    errors::errors::{Error, ErrorImpl},
    logging::{init_logging, LogOptions},
    render_error,
    resolver::resolver::resolve,
    type_checker::type_checker::type_check,
    Position,
};

/// Turns source text into an unresolved program.
pub trait Frontend {
    fn parse(&self, source: &str, file_name: &str) -> Result<Program, Error>;
}

/// Process exit status of a compiler run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Success = 0,
    ParseFailure = 2,
    BadInputFile = 3,
    SemanticError = 4,
}

impl ExitStatus {
    pub fn code(self) -> i32 {
        self as i32
    }
}

#[derive(Debug)]
pub enum CompileOutcome {
    Compiled(ObjectCode),
    BadInputFile(Error),
    ParseFailure {
        source: String,
        error: Error,
    },
    SemanticErrors {
        source: String,
        errors: Vec<Error>,
    },
}

impl CompileOutcome {
    pub fn exit_status(&self) -> ExitStatus {
        match self {
            CompileOutcome::Compiled(_) => ExitStatus::Success,
            CompileOutcome::BadInputFile(_) => ExitStatus::BadInputFile,
            CompileOutcome::ParseFailure { .. } => ExitStatus::ParseFailure,
            CompileOutcome::SemanticErrors { .. } => ExitStatus::SemanticError,
        }
    }

    /// Every diagnostic of the run, rendered against its source.
    pub fn render(&self, file_name: &str) -> String {
        match self {
            CompileOutcome::Compiled(_) => String::new(),
            CompileOutcome::BadInputFile(error) => render_error(error, "", file_name),
            CompileOutcome::ParseFailure { source, error } => {
                render_error(error, source, file_name)
            }
            CompileOutcome::SemanticErrors { source, errors } => errors
                .iter()
                .map(|error| render_error(error, source, file_name))
                .collect(),
        }
    }
}

fn log_stage(trace_stages: bool, stage: &str, start: Instant) {
    if trace_stages {
        let elapsed_ms = start.elapsed().as_millis() as u64;
        info!(target: "pipeline", stage, status = "ok", elapsed_ms);
    }
}

/// Resolves, type checks and compiles `program`, stopping after the first
/// stage that reports any error.
pub fn compile_program(
    program: &mut Program,
    options: &CompileOptions,
) -> Result<ObjectCode, Vec<Error>> {
    let start = Instant::now();
    resolve(program, options.error_policy)?;
    log_stage(options.trace_stages, "resolve", start);

    let type_check_start = Instant::now();
    type_check(program, options.error_policy)?;
    log_stage(options.trace_stages, "type_check", type_check_start);

    let compile_start = Instant::now();
    let code = compile(program).map_err(|error| vec![error])?;
    log_stage(options.trace_stages, "codegen", compile_start);

    log_stage(options.trace_stages, "total", start);
    Ok(code)
}

pub fn compile_file(path: &Path, frontend: &dyn Frontend, options: &CompileOptions) -> CompileOutcome {
    let Ok(source) = read_to_string(path) else {
        return CompileOutcome::BadInputFile(Error::new(
            ErrorImpl::BadInputFile {
                path: path.display().to_string(),
            },
            Position::null(),
        ));
    };

    let parse_start = Instant::now();
    let mut program = match frontend.parse(&source, &file_name(path)) {
        Ok(program) => program,
        Err(error) => return CompileOutcome::ParseFailure { source, error },
    };
    log_stage(options.trace_stages, "parse", parse_start);

    match compile_program(&mut program, options) {
        Ok(code) => CompileOutcome::Compiled(code),
        Err(errors) => CompileOutcome::SemanticErrors { source, errors },
    }
}

/// Compiles the file named by `args[1]` with options taken from the
/// environment. Diagnostics go to stderr and the listing to stdout.
pub fn run(args: &[String], frontend: &dyn Frontend) -> ExitStatus {
    let options = CompileOptions::from_env();
    init_logging(&LogOptions::from_env(), options.trace_stages);

    let [_, path] = args else {
        eprintln!("usage: mjc <file.java>");
        return ExitStatus::BadInputFile;
    };
    let path = Path::new(path);

    let outcome = compile_file(path, frontend, &options);
    let status = outcome.exit_status();
    match &outcome {
        CompileOutcome::Compiled(code) => print!("{}", code.listing()),
        _ => {
            error!(target: "pipeline", status = status.code(), "compilation failed");
            eprint!("{}", outcome.render(&file_name(path)));
        }
    }
    status
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
