//! Scope resolution module.
//!
//! Binds every name reference of a program to its declaration. The pass
//! registers all classes and members first, then walks each method body
//! with a scope stack, rejecting:
//!
//! - Duplicate classes, duplicate members and illegal redeclarations
//! - References to undeclared names and types
//! - Private members reached from another class
//! - Members used in the wrong static context, and `this` in static methods
//! - Locals used in their own initializer and declarations as a lone branch

pub mod resolver;
pub mod scope_table;

#[cfg(test)]
mod tests;
