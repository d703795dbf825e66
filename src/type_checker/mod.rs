//! Type checking module.
//!
//! Runs over a name-resolved program and annotates every expression with
//! its type. It verifies:
//!
//! - Operand types of unary and binary operators
//! - Argument counts and argument types of calls
//! - Assignment, declaration and return compatibility
//! - Boolean conditions, integer indices and array sizes
//!
//! A failed rule yields the internal error type at that node, which is
//! compatible with everything, so one mistake produces one diagnostic.

pub mod equality;
pub mod type_checker;

#[cfg(test)]
mod tests;
