//! Intermediate document model.

pub mod ast;
