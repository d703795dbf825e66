//! Error types and error handling for the compiler.
//!
//! This module defines the error types used throughout the compilation
//! pipeline. It includes:
//!
//! - Error structures with source position information
//! - Specific error variants for resolution, type checking, code generation
//!   and the driver
//! - Error tips for rendering
//! - The [`errors::Diagnostics`] accumulator and its [`errors::ErrorPolicy`]

pub mod errors;
