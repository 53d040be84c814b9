//! Namespace constructor registry
//!
//! Feature modules append constructors while the registry is open. The
//! composition root then seals it; a sealed registry rejects every further
//! registration and hands out a read-only snapshot in insertion order.

use crate::{Namespace, RegistrationError};
use std::fmt;
use std::sync::Arc;

/// Builds a namespace from the host's dependency handle
pub type Constructor<D> = Box<dyn Fn(&D) -> Result<Namespace, RegistrationError> + Send + Sync>;

/// Append-only, sealable list of namespace constructors
pub struct Registry<D> {
    constructors: Vec<Constructor<D>>,
    sealed: Option<SealedRegistry<D>>,
}

impl<D> Registry<D> {
    pub fn new() -> Self {
        Self {
            constructors: Vec::new(),
            sealed: None,
        }
    }

    /// Append a namespace constructor. Fails once the registry is sealed.
    pub fn register<F>(&mut self, constructor: F) -> Result<(), RegistrationError>
    where
        F: Fn(&D) -> Result<Namespace, RegistrationError> + Send + Sync + 'static,
    {
        if self.sealed.is_some() {
            tracing::warn!("namespace constructor registered after the registry was sealed");
            return Err(RegistrationError::Sealed);
        }
        self.constructors.push(Box::new(constructor));
        tracing::debug!(position = self.constructors.len(), "namespace constructor registered");
        Ok(())
    }

    /// Close the registry and return its snapshot.
    ///
    /// Sealing is one-way. Calling it again returns the same snapshot.
    pub fn seal(&mut self) -> SealedRegistry<D> {
        if let Some(sealed) = &self.sealed {
            return sealed.clone();
        }
        let constructors: Arc<[Constructor<D>]> = std::mem::take(&mut self.constructors).into();
        tracing::debug!(constructors = constructors.len(), "registry sealed");
        let sealed = SealedRegistry { constructors };
        self.sealed = Some(sealed.clone());
        sealed
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed.is_some()
    }

    pub fn len(&self) -> usize {
        match &self.sealed {
            Some(sealed) => sealed.len(),
            None => self.constructors.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<D> Default for Registry<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D> fmt::Debug for Registry<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("constructors", &self.len())
            .field("sealed", &self.is_sealed())
            .finish()
    }
}

/// Read-only snapshot of a sealed registry
pub struct SealedRegistry<D> {
    constructors: Arc<[Constructor<D>]>,
}

impl<D> SealedRegistry<D> {
    /// Constructors in registration order
    pub fn iter(&self) -> impl Iterator<Item = &Constructor<D>> {
        self.constructors.iter()
    }

    /// Invoke every constructor with the same dependency handle, in order
    pub fn construct<'a>(
        &'a self,
        deps: &'a D,
    ) -> impl Iterator<Item = Result<Namespace, RegistrationError>> + 'a {
        self.constructors.iter().map(move |constructor| constructor(deps))
    }

    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }
}

impl<D> Clone for SealedRegistry<D> {
    fn clone(&self) -> Self {
        Self {
            constructors: Arc::clone(&self.constructors),
        }
    }
}

impl<D> fmt::Debug for SealedRegistry<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SealedRegistry")
            .field("constructors", &self.len())
            .finish()
    }
}
