//! tmplfuncs Registry
//!
//! Lets feature modules announce groups of template functions at startup:
//! - `Registry`: append-only namespace constructors, sealed before use
//! - `Namespace`: a context factory plus method mappings keyed by name
//! - `Method` / `NameResolver`: callables and how their names are derived

mod method;
mod namespace;
mod registry;
mod error;
mod config;

pub use method::{
    Method, MethodFn, Receiver, NameResolver, LastSegment,
    is_anonymous, last_segment, receiver, CLOSURE_MARKER,
};
pub use namespace::{Namespace, MethodMapping, Example, ContextFactory};
pub use registry::{Registry, SealedRegistry, Constructor};
pub use error::{RegistrationError, RegistrationErrors, ConfigError};
pub use config::{RegistryConfig, CollisionPolicy, COLLISIONS_ENV};

/// Re-export core types for namespace authors
pub mod prelude {
    pub use crate::{
        Method, Receiver, Namespace, Example, Registry,
        RegistrationError, receiver,
    };
    pub use tmplfuncs_core::prelude::*;
}
