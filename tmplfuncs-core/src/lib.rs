//! tmplfuncs Core - Fundamental types
//!
//! This crate provides the types shared by every template function namespace:
//! - `Value`: Runtime values passed to and returned from template functions
//! - `FuncError`: Structured call errors, carried as values

mod value;
mod error;

pub use value::Value;
pub use error::{FuncError, codes};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{Value, FuncError};
    pub use crate::error::codes;
}
