//! Namespaces and method mappings

use crate::method::{LastSegment, Method, NameResolver, Receiver};
use crate::RegistrationError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use tmplfuncs_core::Value;

/// Produces the receiver a namespace's methods are dispatched on
pub type ContextFactory = Arc<dyn Fn(&[Value]) -> Receiver + Send + Sync>;

/// A literal template input and the output it is expected to render
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Example(pub String, pub String);

impl Example {
    pub fn new(input: impl Into<String>, expected: impl Into<String>) -> Self {
        Self(input.into(), expected.into())
    }

    pub fn input(&self) -> &str {
        &self.0
    }

    pub fn expected(&self) -> &str {
        &self.1
    }
}

impl<I: Into<String>, E: Into<String>> From<(I, E)> for Example {
    fn from((input, expected): (I, E)) -> Self {
        Self::new(input, expected)
    }
}

impl<S: Into<String>> From<[S; 2]> for Example {
    fn from([input, expected]: [S; 2]) -> Self {
        Self::new(input, expected)
    }
}

/// Aliases and examples for one method of a namespace
#[derive(Debug, Clone)]
pub struct MethodMapping {
    method: Method,

    // Aliases are global. They are merged across all namespaces and the
    // last registration of a given alias wins.
    aliases: Vec<String>,

    examples: Vec<Example>,
}

impl MethodMapping {
    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn examples(&self) -> &[Example] {
        &self.examples
    }
}

/// A named group of template methods sharing one context factory
pub struct Namespace {
    name: String,
    context: ContextFactory,
    method_mappings: IndexMap<String, MethodMapping>,
    resolver: Arc<dyn NameResolver>,
    overwritten: Vec<String>,
}

impl Namespace {
    pub fn new<F>(name: impl Into<String>, context: F) -> Self
    where
        F: Fn(&[Value]) -> Receiver + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            context: Arc::new(context),
            method_mappings: IndexMap::new(),
            resolver: Arc::new(LastSegment),
            overwritten: Vec::new(),
        }
    }

    /// Namespace whose context factory ignores its arguments and always
    /// hands out the same receiver.
    pub fn with_receiver<T: Any + Send + Sync>(name: impl Into<String>, value: T) -> Self {
        let shared: Receiver = Arc::new(value);
        Self::new(name, move |_args: &[Value]| Arc::clone(&shared))
    }

    /// Swap the strategy used to derive method names
    pub fn with_resolver<R: NameResolver + 'static>(mut self, resolver: R) -> Self {
        self.resolver = Arc::new(resolver);
        self
    }

    /// Register `method` with its aliases and examples.
    ///
    /// The mapping is stored under the name the namespace's resolver derives
    /// from `method`, replacing any earlier mapping with that name. Every
    /// alias and every example input must be non-empty; on violation nothing
    /// is stored. A method the resolver cannot name (a fn pointer or boxed
    /// callable without [`Method::with_name`]) is rejected the same way.
    pub fn add_method_mapping<A, E>(
        &mut self,
        method: Method,
        aliases: A,
        examples: E,
    ) -> Result<&mut Self, RegistrationError>
    where
        A: IntoIterator,
        A::Item: Into<String>,
        E: IntoIterator,
        E::Item: Into<Example>,
    {
        let Some(name) = self.resolver.resolve(&method) else {
            return Err(RegistrationError::UnnamedMethod {
                namespace: self.name.clone(),
                path: method.path().to_string(),
            });
        };
        let aliases: Vec<String> = aliases.into_iter().map(Into::into).collect();
        let examples: Vec<Example> = examples.into_iter().map(Into::into).collect();

        if examples.iter().any(|e| e.input().is_empty()) {
            return Err(RegistrationError::EmptyExample {
                namespace: self.name.clone(),
                method: name,
            });
        }
        if aliases.iter().any(String::is_empty) {
            return Err(RegistrationError::EmptyAlias {
                namespace: self.name.clone(),
                method: name,
            });
        }

        // Re-registration moves the entry to the end so merge order follows
        // the latest registration.
        if self.method_mappings.shift_remove(&name).is_some() {
            tracing::debug!(namespace = %self.name, method = %name, "replacing method mapping");
            self.overwritten.push(name.clone());
        }
        tracing::debug!(
            namespace = %self.name,
            method = %name,
            aliases = aliases.len(),
            examples = examples.len(),
            "method mapping added"
        );
        self.method_mappings.insert(name, MethodMapping { method, aliases, examples });
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn context_factory(&self) -> &ContextFactory {
        &self.context
    }

    /// Run the context factory
    pub fn receiver(&self, args: &[Value]) -> Receiver {
        (self.context)(args)
    }

    pub fn get(&self, method: &str) -> Option<&MethodMapping> {
        self.method_mappings.get(method)
    }

    /// Method mappings in registration order
    pub fn method_mappings(&self) -> impl Iterator<Item = (&str, &MethodMapping)> {
        self.method_mappings.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn method_names(&self) -> impl Iterator<Item = &str> {
        self.method_mappings.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.method_mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.method_mappings.is_empty()
    }

    /// Method names whose mapping was replaced by a later registration
    pub fn overwritten(&self) -> &[String] {
        &self.overwritten
    }
}

impl fmt::Debug for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Namespace")
            .field("name", &self.name)
            .field("method_mappings", &self.method_mappings)
            .finish_non_exhaustive()
    }
}
