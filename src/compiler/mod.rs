//! Code generation module.
//!
//! Lowers a resolved and type checked program to instructions for a
//! stack machine. It handles:
//!
//! - Storage layout of static and instance fields
//! - Validation of the entry method
//! - Emission of statements and expressions, with jumps backpatched
//! - Resolution of call addresses once every method has been emitted

pub mod compiler;
pub mod expr;
pub mod machine;
pub mod stmt;
