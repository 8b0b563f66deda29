//! Structural cache keys
//!
//! A [`CacheKey`] names a logical key-space (`name` + `version`) plus zero
//! or more positional [`Component`]s. The key renders to a deterministic
//! string once at construction; equality and hashing are defined on that
//! rendered form, so two keys are equal exactly when their serializations
//! are equal.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::error::{CacheError, Result};

/// One positional component of a cache key
///
/// Collections are passed as explicit variants rather than dispatching on
/// runtime types: an ordered sequence renders as `[e1,e2,…]`, a mapping as
/// `{k1=v1,k2=v2,…}` in entry order. Unordered sets have no canonical
/// rendering here; callers that want set-equality must sort their elements
/// into a `List` themselves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Component {
    /// A scalar rendered as its text form
    Scalar(String),
    /// An ordered sequence of components
    List(Vec<Component>),
    /// An ordered sequence of key/value pairs
    Map(Vec<(Component, Component)>),
}

impl Component {
    /// Build a scalar component from anything renderable as text
    pub fn scalar(value: impl ToString) -> Self {
        Component::Scalar(value.to_string())
    }

    /// Build a list component
    pub fn list(items: impl IntoIterator<Item = Component>) -> Self {
        Component::List(items.into_iter().collect())
    }

    /// Build a map component from key/value pairs
    pub fn map(entries: impl IntoIterator<Item = (Component, Component)>) -> Self {
        Component::Map(entries.into_iter().collect())
    }

    fn render_into(&self, out: &mut String) {
        match self {
            Component::Scalar(text) => out.push_str(text),
            Component::List(items) => {
                out.push('[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    item.render_into(out);
                }
                out.push(']');
            }
            Component::Map(entries) => {
                out.push('{');
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    key.render_into(out);
                    out.push('=');
                    value.render_into(out);
                }
                out.push('}');
            }
        }
    }
}

macro_rules! scalar_from {
    ($($ty:ty),+) => {
        $(impl From<$ty> for Component {
            fn from(value: $ty) -> Self {
                Component::Scalar(value.to_string())
            }
        })+
    };
}

scalar_from!(&str, String, bool, i32, i64, u32, u64, usize);

impl From<Vec<Component>> for Component {
    fn from(items: Vec<Component>) -> Self {
        Component::List(items)
    }
}

/// An immutable, order-sensitive structural cache key
///
/// Serialized form: the rendered components in order, then the name, then
/// `v{version}`, joined with `-`. The region is never part of the key;
/// providers compose it into the storage key separately.
///
/// ```
/// use herdcache_core::{CacheKey, Component};
///
/// let key = CacheKey::new("user", 1, vec![Component::from(42)]).unwrap();
/// assert_eq!(key.serialized(), "42-user-v1");
/// ```
#[derive(Debug, Clone)]
pub struct CacheKey {
    name: Option<String>,
    version: u32,
    components: Vec<Component>,
    rendered: String,
}

impl CacheKey {
    /// Create a key with a name, a version and positional components
    ///
    /// Fails with an argument error when `name` is empty.
    pub fn new(
        name: impl Into<String>,
        version: u32,
        components: Vec<Component>,
    ) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(CacheError::argument("key name must not be empty"));
        }
        Ok(Self::build(Some(name), version, components))
    }

    /// Create a key with no components; renders as `name-vV`
    pub fn singleton(name: impl Into<String>, version: u32) -> Result<Self> {
        Self::new(name, version, Vec::new())
    }

    /// Create a key with exactly one scalar component; renders as
    /// `value-name-vV`
    pub fn mono(name: impl Into<String>, version: u32, value: impl ToString) -> Result<Self> {
        Self::new(name, version, vec![Component::scalar(value)])
    }

    /// Create a nameless single-scalar key; renders as `value-vV`
    pub fn mono_unnamed(version: u32, value: impl ToString) -> Self {
        Self::build(None, version, vec![Component::scalar(value)])
    }

    fn build(name: Option<String>, version: u32, components: Vec<Component>) -> Self {
        let mut rendered = String::new();
        for component in &components {
            component.render_into(&mut rendered);
            rendered.push('-');
        }
        if let Some(name) = &name {
            rendered.push_str(name);
            rendered.push('-');
        }
        rendered.push('v');
        rendered.push_str(&version.to_string());

        Self {
            name,
            version,
            components,
            rendered,
        }
    }

    /// The key-space name, if any
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The key-space version; bumping it invalidates all entries under
    /// this key-space
    pub fn version(&self) -> u32 {
        self.version
    }

    /// The positional components
    pub fn components(&self) -> &[Component] {
        &self.components
    }

    /// The memoized serialized form
    pub fn serialized(&self) -> &str {
        &self.rendered
    }
}

// Equality and hashing follow the serialized form, which already covers
// name, version and every component.
impl PartialEq for CacheKey {
    fn eq(&self, other: &Self) -> bool {
        self.rendered == other.rendered
    }
}

impl Eq for CacheKey {}

impl Hash for CacheKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rendered.hash(state);
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.rendered)
    }
}
