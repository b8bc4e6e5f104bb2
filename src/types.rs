//! Type identities and the recursion guard
//!
//! A `TypeDescriptor` is a generics-aware identity: a raw type plus the
//! ordered descriptors of its type arguments. Descriptors key the prefab cache
//! and make up the `TypeStack`, which is how cyclic type graphs are detected
//! without ever following live object pointers.

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::Serialize;

use crate::error::{VerifierError, VerifierResult};
use crate::shape::{Described, Shape};
use crate::value::Value;

/// Upper bound on the depth of a single resolution
pub const MAX_RESOLUTION_DEPTH: usize = 256;

/// Identity of a type without its type arguments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RawType(&'static str);

impl RawType {
    /// The unconstrained top type, represented by `Value`
    pub const TOP: RawType = RawType("any");

    /// A raw type with an explicit canonical name
    pub const fn named(name: &'static str) -> Self {
        RawType(name)
    }

    /// The raw type of `T`: its path with generic arguments stripped
    pub fn of<T: ?Sized + 'static>() -> Self {
        let full = std::any::type_name::<T>();
        let end = full.find('<').unwrap_or(full.len());
        RawType(&full[..end])
    }

    pub fn name(&self) -> &'static str {
        self.0
    }

    /// Last path segment, used in messages
    pub fn short_name(&self) -> &'static str {
        self.0.rsplit("::").next().unwrap_or(self.0)
    }
}

impl fmt::Display for RawType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.short_name())
    }
}

/// Generics-aware type identity
///
/// Two descriptors are equal iff their raw types and all of their type
/// arguments are equal, recursively. The shape function travels along so the
/// engine can find out how to build values of the type, but it takes no part
/// in identity. Neither does the wildcard, which names the instantiation
/// whose shape a raw use of the type borrows.
#[derive(Clone)]
pub struct TypeDescriptor {
    raw: RawType,
    args: Vec<TypeDescriptor>,
    shape: fn() -> Shape,
    wildcard: Option<fn() -> TypeDescriptor>,
}

impl TypeDescriptor {
    pub fn new(raw: RawType, args: Vec<TypeDescriptor>, shape: fn() -> Shape) -> Self {
        Self {
            raw,
            args,
            shape,
            wildcard: None,
        }
    }

    /// Sets the instantiation used when this type appears without arguments,
    /// usually `X<Value>`, or `X<Opaque>` where an argument must be hashable
    pub fn with_wildcard(mut self, wildcard: fn() -> TypeDescriptor) -> Self {
        self.wildcard = Some(wildcard);
        self
    }

    pub fn of<T: Described>() -> Self {
        T::descriptor()
    }

    /// Descriptor of the unconstrained top type
    pub fn top() -> Self {
        Value::descriptor()
    }

    pub fn raw(&self) -> RawType {
        self.raw
    }

    pub fn args(&self) -> &[TypeDescriptor] {
        &self.args
    }

    pub fn is_top(&self) -> bool {
        self.raw == RawType::TOP
    }

    /// Builds the shape of this type
    pub fn shape(&self) -> Shape {
        (self.shape)()
    }

    /// The same type used without type arguments, as in a raw or wildcard use
    ///
    /// Values of an erased type are built with the shape of its wildcard
    /// instantiation, so every missing argument can hold a top-type value.
    pub fn erased(&self) -> Self {
        let shape = match self.wildcard {
            Some(wildcard) => wildcard().shape,
            None => self.shape,
        };
        Self {
            raw: self.raw,
            args: Vec::new(),
            shape,
            wildcard: self.wildcard,
        }
    }

    /// Effective type of the nth type argument
    ///
    /// Positions beyond the known arguments resolve to the top type.
    pub fn type_argument(&self, n: usize) -> TypeDescriptor {
        self.args.get(n).cloned().unwrap_or_else(TypeDescriptor::top)
    }

    /// Effective type of the nth type argument, substituting `fallback` when
    /// generics information only yields the top type
    pub fn type_argument_or(&self, n: usize, fallback: &TypeDescriptor) -> TypeDescriptor {
        let argument = self.type_argument(n);
        if argument.is_top() {
            fallback.clone()
        } else {
            argument
        }
    }

    /// Builds a value of this type out of the values of its parts
    pub fn assemble(&self, parts: Vec<Value>) -> VerifierResult<Value> {
        self.shape().assemble(parts).map_err(|e| match e {
            VerifierError::Access { message } => {
                VerifierError::access(format!("cannot assemble {}: {}", self, message))
            }
            other => other,
        })
    }
}

impl PartialEq for TypeDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw && self.args == other.args
    }
}

impl Eq for TypeDescriptor {}

impl Hash for TypeDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
        self.args.hash(state);
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)?;
        if !self.args.is_empty() {
            write!(f, "<")?;
            for (i, arg) in self.args.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", arg)?;
            }
            write!(f, ">")?;
        }
        Ok(())
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeDescriptor({})", self)
    }
}

impl Serialize for TypeDescriptor {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Ordered, duplicate-free stack of the types currently being resolved
///
/// Stacks are never shared between sibling branches: descending into a type
/// argument or a field clones the stack with one more entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypeStack {
    entries: Vec<TypeDescriptor>,
}

impl TypeStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, descriptor: &TypeDescriptor) -> bool {
        self.entries.contains(descriptor)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TypeDescriptor> {
        self.entries.iter()
    }

    /// A copy of this stack with `descriptor` pushed on top
    ///
    /// Fails with a recursion error when `descriptor` is already being
    /// resolved further down, or when the depth bound is reached.
    pub fn clone_with(&self, descriptor: &TypeDescriptor) -> VerifierResult<TypeStack> {
        if self.contains(descriptor) || self.entries.len() >= MAX_RESOLUTION_DEPTH {
            log::debug!("Recursion detected on {} with stack [{}]", descriptor, self);
            return Err(VerifierError::Recursion { stack: self.clone() });
        }
        let mut entries = self.entries.clone();
        entries.push(descriptor.clone());
        Ok(TypeStack { entries })
    }
}

impl fmt::Display for TypeStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", entry)?;
        }
        Ok(())
    }
}
