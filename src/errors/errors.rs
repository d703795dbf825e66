use std::fmt::Display;

use thiserror::Error;
use tracing::debug;

use crate::Position;

#[derive(Debug, Clone, PartialEq)]
pub struct Error {
    internal_error: ErrorImpl,
    position: Position,
}

impl Error {
    pub fn new(error_impl: ErrorImpl, position: Position) -> Self {
        Error {
            internal_error: error_impl,
            position,
        }
    }

    pub fn get_position(&self) -> &Position {
        &self.position
    }

    pub fn get_kind(&self) -> &ErrorImpl {
        &self.internal_error
    }

    pub fn get_error_name(&self) -> &str {
        match &self.internal_error {
            ErrorImpl::DuplicateClass { .. } => "DuplicateClass",
            ErrorImpl::DuplicateMember { .. } => "DuplicateMember",
            ErrorImpl::AlreadyDeclared { .. } => "AlreadyDeclared",
            ErrorImpl::HidesLocal { .. } => "HidesLocal",
            ErrorImpl::UndeclaredIdentifier { .. } => "UndeclaredIdentifier",
            ErrorImpl::UndeclaredMember { .. } => "UndeclaredMember",
            ErrorImpl::UndeclaredType { .. } => "UndeclaredType",
            ErrorImpl::SelfInitialization { .. } => "SelfInitialization",
            ErrorImpl::PrivateAccess { .. } => "PrivateAccess",
            ErrorImpl::StaticContext { .. } => "StaticContext",
            ErrorImpl::NonStaticMember { .. } => "NonStaticMember",
            ErrorImpl::ThisInStaticMethod => "ThisInStaticMethod",
            ErrorImpl::SolitaryDeclaration => "SolitaryDeclaration",
            ErrorImpl::MethodInQualifiedReference { .. } => "MethodInQualifiedReference",
            ErrorImpl::NotAnObject { .. } => "NotAnObject",
            ErrorImpl::TypeMatchError { .. } => "TypeMatchError",
            ErrorImpl::OperandTypeError { .. } => "OperandTypeError",
            ErrorImpl::ConditionNotBoolean { .. } => "ConditionNotBoolean",
            ErrorImpl::UnexpectedArguments { .. } => "UnexpectedArguments",
            ErrorImpl::ArgumentTypeMatchError { .. } => "ArgumentTypeMatchError",
            ErrorImpl::NotCallable { .. } => "NotCallable",
            ErrorImpl::NotAnArray { .. } => "NotAnArray",
            ErrorImpl::IndexNotInt { .. } => "IndexNotInt",
            ErrorImpl::ArraySizeNotInt { .. } => "ArraySizeNotInt",
            ErrorImpl::ClassAsValue { .. } => "ClassAsValue",
            ErrorImpl::MethodAsValue { .. } => "MethodAsValue",
            ErrorImpl::InvalidAssignmentTarget { .. } => "InvalidAssignmentTarget",
            ErrorImpl::ReadOnlyLength => "ReadOnlyLength",
            ErrorImpl::ReturnTypeMatchError { .. } => "ReturnTypeMatchError",
            ErrorImpl::MissingReturnValue => "MissingReturnValue",
            ErrorImpl::MissingMainMethod => "MissingMainMethod",
            ErrorImpl::DuplicateMainMethod => "DuplicateMainMethod",
            ErrorImpl::InvalidMainMethod { .. } => "InvalidMainMethod",
            ErrorImpl::MissingReturnStatement { .. } => "MissingReturnStatement",
            ErrorImpl::UnsupportedOperator { .. } => "UnsupportedOperator",
            ErrorImpl::NotAMethod { .. } => "NotAMethod",
            ErrorImpl::UnassignedLocation { .. } => "UnassignedLocation",
            ErrorImpl::LocationAlreadyAssigned { .. } => "LocationAlreadyAssigned",
            ErrorImpl::UnpatchableInstruction { .. } => "UnpatchableInstruction",
            ErrorImpl::BadInputFile { .. } => "BadInputFile",
            ErrorImpl::ParseFailure { .. } => "ParseFailure",
        }
    }

    pub fn get_tip(&self) -> ErrorTip {
        match &self.internal_error {
            ErrorImpl::DuplicateClass { name } => {
                ErrorTip::Suggestion(format!("Class `{}` is already declared", name))
            }
            ErrorImpl::DuplicateMember { class, name } => ErrorTip::Suggestion(format!(
                "Member `{}` is already declared in class `{}`; fields and methods share one namespace",
                name, class
            )),
            ErrorImpl::AlreadyDeclared { name } => ErrorTip::Suggestion(format!(
                "`{}` is already declared in this scope",
                name
            )),
            ErrorImpl::HidesLocal { name } => ErrorTip::Suggestion(format!(
                "`{}` would hide a parameter or local variable of the same name",
                name
            )),
            ErrorImpl::UndeclaredIdentifier { name } => {
                ErrorTip::Suggestion(format!("Identifier `{}` has not been declared", name))
            }
            ErrorImpl::UndeclaredMember { class, name } => ErrorTip::Suggestion(format!(
                "Class `{}` has no member named `{}`",
                class, name
            )),
            ErrorImpl::UndeclaredType { name } => {
                ErrorTip::Suggestion(format!("Unknown class `{}`", name))
            }
            ErrorImpl::SelfInitialization { name } => ErrorTip::Suggestion(format!(
                "`{}` cannot be used in its own initializing expression",
                name
            )),
            ErrorImpl::PrivateAccess { class, name } => ErrorTip::Suggestion(format!(
                "`{}` is private to class `{}`",
                name, class
            )),
            ErrorImpl::StaticContext { name } => ErrorTip::Suggestion(format!(
                "`{}` must have the same static-ness as the enclosing method when referenced by its bare name",
                name
            )),
            ErrorImpl::NonStaticMember { class, name } => ErrorTip::Suggestion(format!(
                "`{}` is not static and cannot be reached through the class name `{}`",
                name, class
            )),
            ErrorImpl::ThisInStaticMethod => {
                ErrorTip::Suggestion(String::from("`this` has no value inside a static method"))
            }
            ErrorImpl::SolitaryDeclaration => ErrorTip::Suggestion(String::from(
                "Wrap the declaration in a block, it cannot be the only statement of a branch",
            )),
            ErrorImpl::MethodInQualifiedReference { name } => ErrorTip::Suggestion(format!(
                "Method `{}` cannot be qualified",
                name
            )),
            ErrorImpl::NotAnObject { name, type_ } => ErrorTip::Suggestion(format!(
                "`{}` has type `{}` which has no members",
                name, type_
            )),
            ErrorImpl::TypeMatchError { expected, received } => ErrorTip::Suggestion(format!(
                "Expected type `{}`, received `{}`",
                expected, received
            )),
            ErrorImpl::OperandTypeError {
                operator,
                expected,
                received,
            } => ErrorTip::Suggestion(format!(
                "Operator `{}` expects `{}` operands, received `{}`",
                operator, expected, received
            )),
            ErrorImpl::ConditionNotBoolean { received } => ErrorTip::Suggestion(format!(
                "Condition must be `boolean`, received `{}`",
                received
            )),
            ErrorImpl::UnexpectedArguments { expected, received } => ErrorTip::Suggestion(format!(
                "Expected {} arguments, received {}",
                expected, received
            )),
            ErrorImpl::ArgumentTypeMatchError {
                index,
                expected,
                received,
            } => ErrorTip::Suggestion(format!(
                "Argument {} expected type `{}`, received `{}`",
                index + 1,
                expected,
                received
            )),
            ErrorImpl::NotCallable { name } => {
                ErrorTip::Suggestion(format!("`{}` is not a method", name))
            }
            ErrorImpl::NotAnArray { received } => ErrorTip::Suggestion(format!(
                "Only arrays can be indexed, received `{}`",
                received
            )),
            ErrorImpl::IndexNotInt { received } => ErrorTip::Suggestion(format!(
                "Index must be `int`, received `{}`",
                received
            )),
            ErrorImpl::ArraySizeNotInt { received } => ErrorTip::Suggestion(format!(
                "Array size must be `int`, received `{}`",
                received
            )),
            ErrorImpl::ClassAsValue { name } => ErrorTip::Suggestion(format!(
                "Class `{}` is not a value, did you mean `new {}()`?",
                name, name
            )),
            ErrorImpl::MethodAsValue { name } => ErrorTip::Suggestion(format!(
                "Method `{}` is not a value, did you forget the argument list?",
                name
            )),
            ErrorImpl::InvalidAssignmentTarget { name } => {
                ErrorTip::Suggestion(format!("`{}` cannot be assigned to", name))
            }
            ErrorImpl::ReadOnlyLength => ErrorTip::Suggestion(String::from(
                "The `length` of an array can only be read",
            )),
            ErrorImpl::ReturnTypeMatchError { expected, received } => {
                ErrorTip::Suggestion(format!(
                    "Method returns `{}`, but this statement returns `{}`",
                    expected, received
                ))
            }
            ErrorImpl::MissingReturnValue => ErrorTip::Suggestion(String::from(
                "A bare `return;` is only allowed in a `void` method",
            )),
            ErrorImpl::MissingMainMethod => ErrorTip::Suggestion(String::from(
                "Declare `public static void main(String[] args)`",
            )),
            ErrorImpl::DuplicateMainMethod => {
                ErrorTip::Suggestion(String::from("Only one `main` method may be declared"))
            }
            ErrorImpl::InvalidMainMethod { reason } => {
                ErrorTip::Suggestion(format!("Invalid `main` method: {}", reason))
            }
            ErrorImpl::MissingReturnStatement { method } => ErrorTip::Suggestion(format!(
                "The last statement of non-void method `{}` must be a return",
                method
            )),
            ErrorImpl::UnsupportedOperator { operator } => ErrorTip::Suggestion(format!(
                "Operator `{}` cannot be used here",
                operator
            )),
            ErrorImpl::NotAMethod { name } => {
                ErrorTip::Suggestion(format!("Call target `{}` is not a method", name))
            }
            ErrorImpl::UnassignedLocation { name } => ErrorTip::Suggestion(format!(
                "`{}` has no runtime location yet",
                name
            )),
            ErrorImpl::LocationAlreadyAssigned { name } => ErrorTip::Suggestion(format!(
                "`{}` already has a runtime location",
                name
            )),
            ErrorImpl::UnpatchableInstruction { address } => ErrorTip::Suggestion(format!(
                "Instruction at {} has no patchable operand",
                address
            )),
            ErrorImpl::BadInputFile { path } => {
                ErrorTip::Suggestion(format!("Input file {} not found", path))
            }
            ErrorImpl::ParseFailure { .. } => ErrorTip::None,
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.position.is_null() {
            write!(f, "*** {}", self.internal_error)
        } else {
            write!(f, "*** {} {}", self.position, self.internal_error)
        }
    }
}

impl std::error::Error for Error {}

pub enum ErrorTip {
    None,
    Suggestion(String),
}

impl Display for ErrorTip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorTip::None => write!(f, ""),
            ErrorTip::Suggestion(suggestion) => write!(f, "{}", suggestion),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ErrorImpl {
    // Scope resolution
    #[error("class {name:?} previously declared")]
    DuplicateClass { name: String },
    #[error("member name {name:?} previously declared in class {class:?}")]
    DuplicateMember { class: String, name: String },
    #[error("{name:?} already defined in current scope")]
    AlreadyDeclared { name: String },
    #[error("{name:?} attempts to hide a variable in an unhideable scope")]
    HidesLocal { name: String },
    #[error("identifier {name:?} has not been declared")]
    UndeclaredIdentifier { name: String },
    #[error("{name:?} is not a member of class {class:?}")]
    UndeclaredMember { class: String, name: String },
    #[error("type {name:?} has not been declared")]
    UndeclaredType { name: String },
    #[error("cannot use {name:?} in its initializing expression")]
    SelfInitialization { name: String },
    #[error("cannot access private member {name:?} of class {class:?}")]
    PrivateAccess { class: String, name: String },
    #[error("reference to {name:?} made in incorrect static context")]
    StaticContext { name: String },
    #[error("member {name:?} of class {class:?} does not have static access")]
    NonStaticMember { class: String, name: String },
    #[error("cannot have 'this' reference in static method")]
    ThisInStaticMethod,
    #[error("variable declaration cannot be the solitary statement in a branch of a conditional statement")]
    SolitaryDeclaration,
    #[error("method {name:?} embedded in qualified reference")]
    MethodInQualifiedReference { name: String },
    #[error("{name:?} of type {type_} cannot be qualified")]
    NotAnObject { name: String, type_: String },

    // Type checking
    #[error("types do not match: expected {expected}, received {received}")]
    TypeMatchError { expected: String, received: String },
    #[error("operator {operator} expects {expected} operands, received {received}")]
    OperandTypeError {
        operator: String,
        expected: String,
        received: String,
    },
    #[error("condition does not evaluate to boolean: received {received}")]
    ConditionNotBoolean { received: String },
    #[error("incorrect number of arguments: expected {expected:?}, received {received:?}")]
    UnexpectedArguments { expected: usize, received: usize },
    #[error("argument {index:?} has incorrect type: expected {expected}, received {received}")]
    ArgumentTypeMatchError {
        index: usize,
        expected: String,
        received: String,
    },
    #[error("attempts to call non-method {name:?}")]
    NotCallable { name: String },
    #[error("reference is not of array type: received {received}")]
    NotAnArray { received: String },
    #[error("index expression must be int: received {received}")]
    IndexNotInt { received: String },
    #[error("array size expression must be int: received {received}")]
    ArraySizeNotInt { received: String },
    #[error("class {name:?} used as a value")]
    ClassAsValue { name: String },
    #[error("method {name:?} used as a value")]
    MethodAsValue { name: String },
    #[error("cannot assign to {name:?}")]
    InvalidAssignmentTarget { name: String },
    #[error("length field can only be read not assigned")]
    ReadOnlyLength,
    #[error("method return type does not match return statement type: expected {expected}, received {received}")]
    ReturnTypeMatchError { expected: String, received: String },
    #[error("return without a value in a non-void method")]
    MissingReturnValue,

    // Code generation
    #[error("no main method present")]
    MissingMainMethod,
    #[error("non-unique main method")]
    DuplicateMainMethod,
    #[error("incorrect main method: {reason}")]
    InvalidMainMethod { reason: String },
    #[error("no return statement in non-void method {method:?}")]
    MissingReturnStatement { method: String },
    #[error("failed to identify operator {operator} in code generation")]
    UnsupportedOperator { operator: String },
    #[error("call target {name:?} did not resolve to a method")]
    NotAMethod { name: String },
    #[error("declaration {name:?} has no runtime location")]
    UnassignedLocation { name: String },
    #[error("declaration {name:?} already has a runtime location")]
    LocationAlreadyAssigned { name: String },
    #[error("instruction at address {address} cannot be patched")]
    UnpatchableInstruction { address: usize },

    // Driver
    #[error("input file {path} not found")]
    BadInputFile { path: String },
    #[error("parse error: {message}")]
    ParseFailure { message: String },
}

/// How a stage reacts to a diagnosable error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// Abort the stage on the first error.
    #[default]
    FailFast,
    /// Record the error, contain it locally and keep going.
    CollectAll,
}

impl ErrorPolicy {
    pub fn parse(spec: &str) -> Option<Self> {
        match spec.to_ascii_lowercase().as_str() {
            "fail-fast" | "failfast" | "first" => Some(Self::FailFast),
            "collect-all" | "collectall" | "all" => Some(Self::CollectAll),
            _ => None,
        }
    }
}

/// Error accumulator shared by the resolver and the type checker.
#[derive(Debug, Default)]
pub struct Diagnostics {
    policy: ErrorPolicy,
    errors: Vec<Error>,
}

impl Diagnostics {
    pub fn new(policy: ErrorPolicy) -> Self {
        Diagnostics {
            policy,
            errors: vec![],
        }
    }

    /// Records `error`. Under [`ErrorPolicy::FailFast`] the error is handed
    /// back instead, so callers can propagate it with `?`.
    pub fn report(&mut self, error: Error) -> Result<(), Error> {
        debug!(target: "diagnostics", kind = error.get_error_name(), %error);
        match self.policy {
            ErrorPolicy::FailFast => Err(error),
            ErrorPolicy::CollectAll => {
                self.errors.push(error);
                Ok(())
            }
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn errors(&self) -> &[Error] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<Error> {
        self.errors
    }
}
