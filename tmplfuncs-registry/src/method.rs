//! Callables and name resolution
//!
//! A `Method` is an opaque template callable plus the path it was declared
//! under. The short name a namespace stores it by is derived from that path
//! through a `NameResolver`, so the derivation strategy can be swapped
//! without touching registration call sites.

use std::any::{Any, TypeId};
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use tmplfuncs_core::{FuncError, Value};

/// Opaque receiver produced by a namespace context factory
pub type Receiver = Arc<dyn Any + Send + Sync>;

/// Signature every template method is erased to
pub type MethodFn = dyn Fn(&Receiver, &[Value]) -> Value + Send + Sync;

/// Suffix the compiler appends to closures in `std::any::type_name`
pub const CLOSURE_MARKER: &str = "{{closure}}";

// Type paths starting with these carry no declared name
const ANONYMOUS_PREFIXES: [&str; 5] = ["fn(", "for<", "dyn ", "unsafe ", "extern "];
const POINTER_TYPES: [&str; 3] = ["Box", "Arc", "Rc"];

/// Wrap a concrete receiver value
pub fn receiver<T: Any + Send + Sync>(value: T) -> Receiver {
    Arc::new(value)
}

/// A template-callable method
#[derive(Clone)]
pub struct Method {
    path: Cow<'static, str>,
    func: Arc<MethodFn>,
    receiver: Option<(TypeId, &'static str)>,
}

impl Method {
    /// Wrap a callable, recording its type path for name resolution.
    ///
    /// For a fn item such as `Lang::num_fmt` the path is the item's fully
    /// qualified name. Closures resolve to their enclosing function, and fn
    /// pointers or boxed callables have no name at all, so give those one
    /// with [`Method::with_name`].
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Receiver, &[Value]) -> Value + Send + Sync + 'static,
    {
        Self {
            path: Cow::Borrowed(std::any::type_name::<F>()),
            func: Arc::new(f),
            receiver: None,
        }
    }

    /// Wrap a method over a concrete receiver type.
    ///
    /// The receiver handed over at call time must be a `T`; a mismatch
    /// yields a `RECEIVER_TYPE` error value naming the method.
    pub fn bound<T, F>(f: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&T, &[Value]) -> Value + Send + Sync + 'static,
    {
        // Receiver type is checked in `call`
        let func = move |recv: &Receiver, args: &[Value]| {
            recv.downcast_ref::<T>().map_or(Value::Null, |target| f(target, args))
        };
        Self {
            path: Cow::Borrowed(std::any::type_name::<F>()),
            func: Arc::new(func),
            receiver: Some((TypeId::of::<T>(), std::any::type_name::<T>())),
        }
    }

    /// Replace the recorded path with an explicit name
    pub fn with_name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.path = name.into();
        self
    }

    /// Path the method was declared under (or its explicit name)
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn call(&self, receiver: &Receiver, args: &[Value]) -> Value {
        if let Some((expected, type_name)) = self.receiver {
            if (**receiver).type_id() != expected {
                return Value::Error(FuncError::receiver_type(last_segment(&self.path), type_name));
            }
        }
        (self.func)(receiver, args)
    }

    /// True if both handles point at the same callable
    pub fn ptr_eq(&self, other: &Method) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.func), Arc::as_ptr(&other.func))
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Method").field("path", &self.path).finish_non_exhaustive()
    }
}

/// Strategy deriving the stored name of a method
pub trait NameResolver: Send + Sync {
    /// `None` when the method carries no usable name
    fn resolve(&self, method: &Method) -> Option<String>;
}

/// Default strategy: the final unqualified path segment
#[derive(Debug, Clone, Copy, Default)]
pub struct LastSegment;

impl NameResolver for LastSegment {
    fn resolve(&self, method: &Method) -> Option<String> {
        if is_anonymous(method.path()) {
            return None;
        }
        let name = last_segment(method.path());
        (!name.is_empty()).then(|| name.to_string())
    }
}

/// True for type paths with no declared name: fn pointers, trait objects,
/// and `Box`/`Arc`/`Rc` around either.
pub fn is_anonymous(path: &str) -> bool {
    let path = path.trim().trim_start_matches('&').trim_start_matches("mut ").trim_start();
    if ANONYMOUS_PREFIXES.iter().any(|p| path.starts_with(p)) {
        return true;
    }
    match path.split_once('<') {
        Some((outer, inner)) => {
            POINTER_TYPES.contains(&last_segment(outer))
                && ANONYMOUS_PREFIXES.iter().any(|p| inner.trim_start().starts_with(p))
        }
        None => false,
    }
}

/// Reduce a qualified path to its declared name.
///
/// `lang::Lang::num_fmt` becomes `num_fmt`, `a::b<T>::f<u8>` becomes `f`,
/// and `lang::init::{{closure}}` becomes `init`. Separators nested in
/// generic arguments, parentheses or brackets are ignored.
pub fn last_segment(path: &str) -> &str {
    let mut path = path.trim();
    while let Some(rest) = path.strip_suffix(CLOSURE_MARKER) {
        path = rest.strip_suffix("::").unwrap_or(rest);
    }
    let path = strip_generic_suffix(path);

    let bytes = path.as_bytes();
    let mut angle = 0usize;
    let mut paren = 0usize;
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            // `->` is not a closing bracket
            b'-' if bytes.get(i + 1) == Some(&b'>') => i += 1,
            b'<' => angle += 1,
            b'>' => angle = angle.saturating_sub(1),
            b'(' | b'[' => paren += 1,
            b')' | b']' => paren = paren.saturating_sub(1),
            b':' if angle == 0 && paren == 0 && bytes.get(i + 1) == Some(&b':') => {
                start = i + 2;
                i += 1;
            }
            _ => {}
        }
        i += 1;
    }
    &path[start..]
}

fn strip_generic_suffix(path: &str) -> &str {
    if !path.ends_with('>') || path.ends_with("->") {
        return path;
    }
    let bytes = path.as_bytes();
    let mut depth = 0usize;
    let mut i = bytes.len();
    while i > 0 {
        i -= 1;
        match bytes[i] {
            b'>' if i > 0 && bytes[i - 1] == b'-' => i -= 1,
            b'>' => depth += 1,
            b'<' => {
                if depth <= 1 {
                    return &path[..i];
                }
                depth -= 1;
            }
            _ => {}
        }
    }
    path
}
