//! tmplfuncs - Template function namespaces
//!
//! Composition root for the namespace registry. Seal a `Registry`, hand it to
//! `FuncTable::build` together with the host's dependency handle, and the
//! template runtime gets one read-only table of namespaces and global aliases.

mod docs;
mod suggest;

pub use docs::{FuncsDoc, NamespaceDoc, MethodDoc};
pub use tmplfuncs_core::{Value, FuncError, codes};
pub use tmplfuncs_registry::{
    Method, Receiver, Namespace, MethodMapping, Example, NameResolver, LastSegment,
    Registry, SealedRegistry, RegistryConfig, CollisionPolicy,
    RegistrationError, RegistrationErrors, ConfigError, receiver,
};

use indexmap::IndexMap;
use std::collections::HashMap;
use std::sync::Arc;

/// Where a global alias points
#[derive(Debug, Clone, Copy)]
pub struct AliasTarget<'a> {
    pub namespace: &'a Namespace,
    pub method: &'a str,
    pub mapping: &'a MethodMapping,
}

#[derive(Debug, Clone)]
struct AliasEntry {
    namespace: Arc<Namespace>,
    method: String,
}

impl AliasEntry {
    fn target(&self) -> Option<AliasTarget<'_>> {
        let mapping = self.namespace.get(&self.method)?;
        Some(AliasTarget {
            namespace: &self.namespace,
            method: &self.method,
            mapping,
        })
    }

    fn qualified(&self) -> String {
        format!("{}.{}", self.namespace.name(), self.method)
    }
}

/// Every namespace and alias available to templates.
///
/// Built once at startup and immutable afterwards; share it freely between
/// rendering threads.
#[derive(Debug)]
pub struct FuncTable {
    namespaces: IndexMap<String, Arc<Namespace>>,
    aliases: HashMap<String, AliasEntry>,
}

impl FuncTable {
    /// Run every constructor of `registry` with `deps` and merge the results.
    ///
    /// Namespaces and aliases are merged in registration order. Under
    /// `CollisionPolicy::Overwrite` a later namespace or alias with the same
    /// name replaces the earlier one without any error, and a replaced
    /// namespace takes its aliases with it. Every failure from
    /// every constructor is collected before the build is rejected.
    pub fn build<D>(
        registry: &SealedRegistry<D>,
        deps: &D,
        config: &RegistryConfig,
    ) -> Result<Self, RegistrationErrors> {
        let strict = config.is_strict();
        let mut errors = Vec::new();
        let mut namespaces: IndexMap<String, Arc<Namespace>> = IndexMap::new();

        for result in registry.construct(deps) {
            let ns = match result {
                Ok(ns) => ns,
                Err(e) => {
                    errors.push(e);
                    continue;
                }
            };
            if ns.name().is_empty() {
                errors.push(RegistrationError::EmptyNamespaceName);
                continue;
            }
            if strict {
                errors.extend(ns.overwritten().iter().map(|method| {
                    RegistrationError::DuplicateMethod {
                        namespace: ns.name().to_string(),
                        method: method.clone(),
                    }
                }));
                if namespaces.contains_key(ns.name()) {
                    errors.push(RegistrationError::DuplicateNamespace(ns.name().to_string()));
                    continue;
                }
            }

            // A replacement moves to the end, so merge order stays registration order
            if namespaces.shift_remove(ns.name()).is_some() {
                tracing::debug!(namespace = %ns.name(), "namespace replaced");
            }
            namespaces.insert(ns.name().to_string(), Arc::new(ns));
        }

        // Aliases come only from namespaces that survived the merge
        let mut aliases: HashMap<String, AliasEntry> = HashMap::new();
        for ns in namespaces.values() {
            for (method, mapping) in ns.method_mappings() {
                for alias in mapping.aliases() {
                    if let Some(previous) = aliases.get(alias) {
                        if Arc::ptr_eq(&previous.namespace, ns) && previous.method == method {
                            continue;
                        }
                        if strict {
                            errors.push(RegistrationError::DuplicateAlias {
                                alias: alias.clone(),
                                namespace: ns.name().to_string(),
                                method: method.to_string(),
                                previous: previous.qualified(),
                            });
                            continue;
                        }
                        tracing::debug!(
                            alias = %alias,
                            previous = %previous.qualified(),
                            namespace = %ns.name(),
                            method = %method,
                            "alias rebound"
                        );
                    }
                    aliases.insert(
                        alias.clone(),
                        AliasEntry {
                            namespace: Arc::clone(ns),
                            method: method.to_string(),
                        },
                    );
                }
            }
        }

        if !errors.is_empty() {
            tracing::error!(errors = errors.len(), "template function table rejected");
            return Err(RegistrationErrors(errors));
        }

        tracing::info!(
            namespaces = namespaces.len(),
            aliases = aliases.len(),
            "template function table built"
        );
        Ok(Self { namespaces, aliases })
    }

    pub fn namespace(&self, name: &str) -> Option<&Namespace> {
        self.namespaces.get(name).map(|ns| ns.as_ref())
    }

    /// Namespaces in merge order
    pub fn namespaces(&self) -> impl Iterator<Item = &Namespace> {
        self.namespaces.values().map(|ns| ns.as_ref())
    }

    pub fn get(&self, namespace: &str, method: &str) -> Option<&MethodMapping> {
        self.namespace(namespace)?.get(method)
    }

    pub fn resolve_alias(&self, alias: &str) -> Option<AliasTarget<'_>> {
        self.aliases.get(alias)?.target()
    }

    /// All global aliases, sorted
    pub fn aliases(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.aliases.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Evaluate `namespace.method` the way templates do: build the receiver
    /// from `context_args`, then dispatch the method on it with `args`.
    pub fn invoke(
        &self,
        namespace: &str,
        method: &str,
        context_args: &[Value],
        args: &[Value],
    ) -> Value {
        let Some(ns) = self.namespaces.get(namespace) else {
            let similar = suggest::similar(namespace, self.namespaces.keys().map(String::as_str));
            let mut err = FuncError::undefined_namespace(namespace);
            if let Some(hint) = suggest::hint(&similar) {
                err = err.with_suggestion(hint);
            }
            return Value::Error(err);
        };
        let Some(mapping) = ns.get(method) else {
            let similar = suggest::similar(method, ns.method_names());
            let mut err = FuncError::undefined_func(&format!("{}.{}", namespace, method));
            if let Some(hint) = suggest::hint(&similar) {
                err = err.with_suggestion(hint);
            }
            return Value::Error(err);
        };
        let receiver = ns.receiver(context_args);
        mapping.method().call(&receiver, args)
    }

    /// Call a method through its global alias
    pub fn call_alias(&self, alias: &str, args: &[Value]) -> Value {
        match self.resolve_alias(alias) {
            Some(target) => {
                let receiver = target.namespace.receiver(&[]);
                target.mapping.method().call(&receiver, args)
            }
            None => {
                let similar = suggest::similar(alias, self.aliases.keys().map(String::as_str));
                let mut err = FuncError::undefined_func(alias);
                if let Some(hint) = suggest::hint(&similar) {
                    err = err.with_suggestion(hint);
                }
                Value::Error(err)
            }
        }
    }

    /// Every documented example as `(namespace, method, example)`
    pub fn examples(&self) -> impl Iterator<Item = (&str, &str, &Example)> {
        self.namespaces.values().flat_map(|ns| {
            ns.method_mappings().flat_map(move |(method, mapping)| {
                mapping.examples().iter().map(move |example| (ns.name(), method, example))
            })
        })
    }

    pub fn docs(&self) -> FuncsDoc {
        FuncsDoc::from_namespaces(self.namespaces())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Deps {
        thousands: &'static str,
    }

    struct Lang {
        thousands: String,
    }

    impl Lang {
        fn num_fmt(&self, args: &[Value]) -> Value {
            Value::Text(format!("fmt{}{}", self.thousands, args.len()))
        }

        fn translate(&self, _args: &[Value]) -> Value {
            Value::from("hello")
        }
    }

    struct Strings;

    impl Strings {
        fn num_fmt(&self, _args: &[Value]) -> Value {
            Value::from("strings")
        }
    }

    fn lang_examples() -> Vec<Example> {
        vec![
            Example::new("{{ numFmt 2 12345.6789 }}", "12,345.68"),
            Example::new(r#"{{ numFmt 0 -12345.6789 ", . " }}"#, "-12,346"),
        ]
    }

    fn lang(deps: &Deps) -> Result<Namespace, RegistrationError> {
        let mut ns = Namespace::with_receiver(
            "lang",
            Lang {
                thousands: deps.thousands.to_string(),
            },
        );
        ns.add_method_mapping(
            Method::bound(Lang::num_fmt).with_name("NumFmt"),
            ["numFmt"],
            lang_examples(),
        )?
        .add_method_mapping(
            Method::bound(Lang::translate),
            ["i18n", "T"],
            [("{{ T \"hello\" }}", "hello")],
        )?;
        Ok(ns)
    }

    fn strings(_deps: &Deps) -> Result<Namespace, RegistrationError> {
        let mut ns = Namespace::with_receiver("strings", Strings);
        ns.add_method_mapping(Method::bound(Strings::num_fmt), ["numFmt"], no_examples())?;
        Ok(ns)
    }

    fn no_examples() -> Vec<Example> {
        Vec::new()
    }

    fn deps() -> Deps {
        Deps { thousands: "," }
    }

    fn table_with<F>(register: F, config: &RegistryConfig) -> Result<FuncTable, RegistrationErrors>
    where
        F: FnOnce(&mut Registry<Deps>),
    {
        let mut registry = Registry::new();
        register(&mut registry);
        let sealed = registry.seal();
        FuncTable::build(&sealed, &deps(), config)
    }

    #[test]
    fn test_num_fmt_scenario() {
        let table = table_with(
            |r| r.register(lang).unwrap(),
            &RegistryConfig::default(),
        )
        .unwrap();

        let mapping = table.get("lang", "NumFmt").unwrap();
        assert_eq!(mapping.examples(), lang_examples().as_slice());
        assert_eq!(mapping.aliases(), ["numFmt"]);

        let target = table.resolve_alias("numFmt").unwrap();
        assert_eq!(target.namespace.name(), "lang");
        assert_eq!(target.method, "NumFmt");
        assert!(target.mapping.method().ptr_eq(mapping.method()));
    }

    #[test]
    fn test_alias_last_registration_wins() {
        let table = table_with(
            |r| {
                r.register(lang).unwrap();
                r.register(strings).unwrap();
            },
            &RegistryConfig::default(),
        )
        .unwrap();

        let target = table.resolve_alias("numFmt").unwrap();
        assert_eq!(target.namespace.name(), "strings");
        assert_eq!(table.call_alias("numFmt", &[]), Value::from("strings"));

        // Reversed order flips the winner
        let table = table_with(
            |r| {
                r.register(strings).unwrap();
                r.register(lang).unwrap();
            },
            &RegistryConfig::default(),
        )
        .unwrap();
        assert_eq!(table.resolve_alias("numFmt").unwrap().namespace.name(), "lang");
    }

    #[test]
    fn test_strict_policy_rejects_alias_collision() {
        let err = table_with(
            |r| {
                r.register(lang).unwrap();
                r.register(strings).unwrap();
            },
            &RegistryConfig::new().with_collisions(CollisionPolicy::Reject),
        )
        .unwrap_err();

        assert_eq!(
            err.0,
            vec![RegistrationError::DuplicateAlias {
                alias: "numFmt".to_string(),
                namespace: "strings".to_string(),
                method: "num_fmt".to_string(),
                previous: "lang.NumFmt".to_string(),
            }]
        );
    }

    #[test]
    fn test_strict_policy_rejects_duplicate_method_and_namespace() {
        let err = table_with(
            |r| {
                r.register(|_: &Deps| {
                    let mut ns = Namespace::with_receiver("strings", Strings);
                    ns.add_method_mapping(Method::bound(Strings::num_fmt), ["a"], no_examples())?
                        .add_method_mapping(Method::bound(Strings::num_fmt), ["a"], no_examples())?;
                    Ok(ns)
                })
                .unwrap();
                r.register(strings).unwrap();
            },
            &RegistryConfig::new().with_collisions(CollisionPolicy::Reject),
        )
        .unwrap_err();

        assert_eq!(
            err.0,
            vec![
                RegistrationError::DuplicateMethod {
                    namespace: "strings".to_string(),
                    method: "num_fmt".to_string(),
                },
                RegistrationError::DuplicateNamespace("strings".to_string()),
            ]
        );
    }

    #[test]
    fn test_duplicate_namespace_overwrites_by_default() {
        let table = table_with(
            |r| {
                r.register(lang).unwrap();
                r.register(|_: &Deps| Ok(Namespace::with_receiver("lang", ()))).unwrap();
            },
            &RegistryConfig::default(),
        )
        .unwrap();

        assert!(table.namespace("lang").unwrap().is_empty());
        // The replaced namespace's aliases are gone with it
        assert!(table.resolve_alias("i18n").is_none());
        let err = table.call_alias("i18n", &[]);
        assert_eq!(err.as_error().unwrap().code, codes::UNDEFINED_FUNC);
        assert!(table.aliases().is_empty());
    }

    #[test]
    fn test_replacement_keeps_aliases_of_other_namespaces() {
        let table = table_with(
            |r| {
                r.register(strings).unwrap();
                r.register(lang).unwrap();
                r.register(|_: &Deps| {
                    let mut ns = Namespace::with_receiver("lang", Strings);
                    let method = Method::bound(Strings::num_fmt);
                    ns.add_method_mapping(method, ["i18n"], no_examples())?;
                    Ok(ns)
                })
                .unwrap();
            },
            &RegistryConfig::default(),
        )
        .unwrap();

        assert_eq!(table.aliases(), ["i18n", "numFmt"]);
        assert_eq!(table.resolve_alias("numFmt").unwrap().namespace.name(), "strings");
        let target = table.resolve_alias("i18n").unwrap();
        assert_eq!(target.namespace.name(), "lang");
        assert_eq!(target.method, "num_fmt");
        assert_eq!(table.call_alias("i18n", &[]), Value::from("strings"));
    }

    #[test]
    fn test_docs_and_alias_listing_agree() {
        let table = table_with(
            |r| {
                r.register(lang).unwrap();
                r.register(strings).unwrap();
                r.register(|_: &Deps| Ok(Namespace::with_receiver("lang", ()))).unwrap();
            },
            &RegistryConfig::default(),
        )
        .unwrap();

        let mut documented: Vec<String> = table
            .docs()
            .namespaces
            .iter()
            .flat_map(|ns| ns.methods.iter().flat_map(|m| m.aliases.iter().cloned()))
            .collect();
        documented.sort_unstable();
        documented.dedup();
        assert_eq!(documented, table.aliases());
        for alias in table.aliases() {
            let target = table.resolve_alias(alias).unwrap();
            assert!(target.mapping.aliases().iter().any(|a| a == alias));
        }
    }

    #[test]
    fn test_errors_are_aggregated_across_constructors() {
        let err = table_with(
            |r| {
                r.register(|_: &Deps| {
                    let mut ns = Namespace::with_receiver("a", Strings);
                    let method = Method::bound(Strings::num_fmt);
                    ns.add_method_mapping(method, ["", "x"], no_examples())?;
                    Ok(ns)
                })
                .unwrap();
                r.register(lang).unwrap();
                r.register(|_: &Deps| Ok(Namespace::with_receiver("", ()))).unwrap();
                r.register(|_: &Deps| {
                    let mut ns = Namespace::with_receiver("b", Strings);
                    ns.add_method_mapping(Method::bound(Strings::num_fmt), ["y"], [("", "out")])?;
                    Ok(ns)
                })
                .unwrap();
            },
            &RegistryConfig::default(),
        )
        .unwrap_err();

        assert_eq!(err.len(), 3);
        assert!(matches!(err.0[0], RegistrationError::EmptyAlias { ref namespace, .. }
            if namespace == "a"));
        assert_eq!(err.0[1], RegistrationError::EmptyNamespaceName);
        assert!(matches!(err.0[2], RegistrationError::EmptyExample { ref namespace, .. }
            if namespace == "b"));
    }

    fn shout(_recv: &Receiver, _args: &[Value]) -> Value {
        Value::from("HEY")
    }

    fn whisper(_recv: &Receiver, _args: &[Value]) -> Value {
        Value::from("hey")
    }

    #[test]
    fn test_unnamed_fn_pointer_fails_the_build() {
        let err = table_with(
            |r| {
                r.register(|_: &Deps| {
                    let loud: fn(&Receiver, &[Value]) -> Value = shout;
                    let quiet: fn(&Receiver, &[Value]) -> Value = whisper;
                    let mut ns = Namespace::new("voice", |_: &[Value]| receiver(()));
                    ns.add_method_mapping(Method::new(loud), ["shout"], no_examples())?
                        .add_method_mapping(Method::new(quiet), ["whisper"], no_examples())?;
                    Ok(ns)
                })
                .unwrap();
            },
            &RegistryConfig::default(),
        )
        .unwrap_err();
        assert_eq!(err.len(), 1);
        assert!(matches!(err.0[0], RegistrationError::UnnamedMethod { ref namespace, .. }
            if namespace == "voice"));
    }

    #[test]
    fn test_named_fn_pointers_dispatch_separately() {
        let table = table_with(
            |r| {
                r.register(|_: &Deps| {
                    let loud: fn(&Receiver, &[Value]) -> Value = shout;
                    let quiet: fn(&Receiver, &[Value]) -> Value = whisper;
                    let mut ns = Namespace::new("voice", |_: &[Value]| receiver(()));
                    ns.add_method_mapping(
                        Method::new(loud).with_name("Shout"),
                        ["shout"],
                        no_examples(),
                    )?
                    .add_method_mapping(
                        Method::new(quiet).with_name("Whisper"),
                        ["whisper"],
                        no_examples(),
                    )?;
                    Ok(ns)
                })
                .unwrap();
            },
            &RegistryConfig::default(),
        )
        .unwrap();
        assert_eq!(table.call_alias("shout", &[]), Value::from("HEY"));
        assert_eq!(table.call_alias("whisper", &[]), Value::from("hey"));
        assert_eq!(table.invoke("voice", "Whisper", &[], &[]), Value::from("hey"));
    }

    #[test]
    fn test_namespaces_follow_registration_order() {
        let table = table_with(
            |r| {
                r.register(strings).unwrap();
                r.register(lang).unwrap();
            },
            &RegistryConfig::default(),
        )
        .unwrap();
        let names: Vec<&str> = table.namespaces().map(Namespace::name).collect();
        assert_eq!(names, ["strings", "lang"]);
    }

    #[test]
    fn test_invoke_builds_receiver_from_deps() {
        let table = table_with(|r| r.register(lang).unwrap(), &RegistryConfig::default()).unwrap();
        let args = [Value::from(2i64), Value::from(12345.6789)];
        let result = table.invoke("lang", "NumFmt", &[], &args);
        assert_eq!(result, Value::from("fmt,2"));
    }

    #[test]
    fn test_invoke_passes_context_args() {
        let table = table_with(
            |r| {
                r.register(|_: &Deps| {
                    let mut ns = Namespace::new("ctx", |args: &[Value]| receiver(args.len()));
                    let count = |count: &usize, _args: &[Value]| Value::from(*count as i64);
                    ns.add_method_mapping(
                        Method::bound(count).with_name("Count"),
                        Vec::<String>::new(),
                        no_examples(),
                    )?;
                    Ok(ns)
                })
                .unwrap();
            },
            &RegistryConfig::default(),
        )
        .unwrap();
        let result = table.invoke("ctx", "Count", &[Value::Null, Value::Null, Value::Null], &[]);
        assert_eq!(result, Value::from(3i64));
    }

    #[test]
    fn test_receiver_mismatch_names_the_registered_method() {
        let table = table_with(
            |r| {
                r.register(|_: &Deps| {
                    let mut ns = Namespace::with_receiver("ctx", "not a count");
                    let count = |count: &usize, _args: &[Value]| Value::from(*count as i64);
                    let examples = [("{{ count }}", "0")];
                    let method = Method::bound(count).with_name("Count");
                    ns.add_method_mapping(method, ["count"], examples)?;
                    Ok(ns)
                })
                .unwrap();
            },
            &RegistryConfig::default(),
        )
        .unwrap();

        for result in [table.invoke("ctx", "Count", &[], &[]), table.call_alias("count", &[])] {
            let err = result.as_error().unwrap();
            assert_eq!(err.code, codes::RECEIVER_TYPE);
            assert!(err.message.starts_with("Count()"), "{}", err.message);
        }
    }

    #[test]
    fn test_unknown_names_are_error_values() {
        let table = table_with(|r| r.register(lang).unwrap(), &RegistryConfig::default()).unwrap();

        let err = table.invoke("lng", "NumFmt", &[], &[]);
        let err = err.as_error().unwrap();
        assert_eq!(err.code, codes::UNDEFINED_NAMESPACE);

        let err = table.invoke("lang", "Num", &[], &[]);
        let err = err.as_error().unwrap();
        assert_eq!(err.code, codes::UNDEFINED_FUNC);
        assert_eq!(err.suggestion.as_deref(), Some("Similar: NumFmt"));

        let err = table.call_alias("numFm", &[]);
        assert_eq!(err.as_error().unwrap().code, codes::UNDEFINED_FUNC);
    }

    #[test]
    fn test_examples_iteration() {
        let table = table_with(|r| r.register(lang).unwrap(), &RegistryConfig::default()).unwrap();
        let examples: Vec<(&str, &str, &str)> = table
            .examples()
            .map(|(ns, method, e)| (ns, method, e.input()))
            .collect();
        assert_eq!(
            examples,
            [
                ("lang", "NumFmt", "{{ numFmt 2 12345.6789 }}"),
                ("lang", "NumFmt", r#"{{ numFmt 0 -12345.6789 ", . " }}"#),
                ("lang", "translate", "{{ T \"hello\" }}"),
            ]
        );
    }

    #[test]
    fn test_docs_export() {
        let table = table_with(
            |r| {
                r.register(strings).unwrap();
                r.register(lang).unwrap();
            },
            &RegistryConfig::default(),
        )
        .unwrap();
        let docs = table.docs();

        let names: Vec<&str> = docs.namespaces.iter().map(|ns| ns.name.as_str()).collect();
        assert_eq!(names, ["lang", "strings"]);

        let num_fmt = docs.namespace("lang").unwrap().method("NumFmt").unwrap();
        assert_eq!(num_fmt.aliases, ["numFmt"]);

        let json: serde_json::Value = serde_json::from_str(&docs.to_json().unwrap()).unwrap();
        let example = &json["namespaces"][0]["methods"][0]["examples"][0];
        assert_eq!(example[0], "{{ numFmt 2 12345.6789 }}");
        assert_eq!(example[1], "12,345.68");
    }

    #[test]
    fn test_aliases_listing() {
        let table = table_with(|r| r.register(lang).unwrap(), &RegistryConfig::default()).unwrap();
        assert_eq!(table.aliases(), ["T", "i18n", "numFmt"]);
    }

    #[test]
    fn test_table_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<FuncTable>();

        let table = table_with(|r| r.register(lang).unwrap(), &RegistryConfig::default()).unwrap();
        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    for _ in 0..100 {
                        let result = table.call_alias("numFmt", &[Value::Null]);
                        assert_eq!(result, Value::from("fmt,1"));
                    }
                });
            }
        });
    }
}
