//! Versus: side-by-side evaluation of function versions
//!
//! Facade over [`versus_core`]; see that crate for the full API.

pub use versus_core::*;
