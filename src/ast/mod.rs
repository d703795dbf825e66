/// AST (Abstract Syntax Tree) module
/// Contains all definitions related to the program tree handed over by the
/// parser
///
/// Submodules:
/// - ast: Program, class and method nodes plus the construction API
/// - declarations: The declaration arena and the predefined environment
/// - expressions: Expressions and name references
/// - statements: Statements
/// - types: Type denoters and identifiers
pub mod ast;
pub mod declarations;
pub mod expressions;
pub mod statements;
pub mod types;

#[cfg(test)]
mod tests;
