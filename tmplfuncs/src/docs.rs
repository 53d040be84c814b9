//! Documentation export
//!
//! Serializable view of every namespace, method, alias and example in a
//! function table, for doc generators and self-check tooling.

use serde::Serialize;
use tmplfuncs_registry::{Example, Namespace};

/// All namespaces, sorted by name
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FuncsDoc {
    pub namespaces: Vec<NamespaceDoc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamespaceDoc {
    pub name: String,
    pub methods: Vec<MethodDoc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MethodDoc {
    pub name: String,
    pub aliases: Vec<String>,
    pub examples: Vec<Example>,
}

impl FuncsDoc {
    pub(crate) fn from_namespaces<'a, I>(namespaces: I) -> Self
    where
        I: IntoIterator<Item = &'a Namespace>,
    {
        let mut namespaces: Vec<NamespaceDoc> = namespaces
            .into_iter()
            .map(NamespaceDoc::from_namespace)
            .collect();
        namespaces.sort_by(|a, b| a.name.cmp(&b.name));
        Self { namespaces }
    }

    pub fn namespace(&self, name: &str) -> Option<&NamespaceDoc> {
        self.namespaces.iter().find(|ns| ns.name == name)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl NamespaceDoc {
    fn from_namespace(ns: &Namespace) -> Self {
        let mut methods: Vec<MethodDoc> = ns
            .method_mappings()
            .map(|(name, mapping)| MethodDoc {
                name: name.to_string(),
                aliases: mapping.aliases().to_vec(),
                examples: mapping.examples().to_vec(),
            })
            .collect();
        methods.sort_by(|a, b| a.name.cmp(&b.name));
        Self {
            name: ns.name().to_string(),
            methods,
        }
    }

    pub fn method(&self, name: &str) -> Option<&MethodDoc> {
        self.methods.iter().find(|m| m.name == name)
    }
}
