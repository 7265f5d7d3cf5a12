//! Shelf application library
//!
//! The `books` module and the bootstrap that wires it into the kernel.

pub mod app;
pub mod modules;

pub use modules::*;
