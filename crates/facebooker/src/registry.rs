//! Domain Object Registry.
//!
//! Maps a tag name to a [`Shape`]: the sub-tags it recognises, how each one is
//! coerced, and a constructor that assembles the typed object. The mapper
//! consults the registry for every element that has children; unregistered
//! tags fall back to [`crate::Record`].
//!
//! The process-wide table returned by [`Registry::shared`] holds the built-in
//! shapes and is never mutated after first use. Callers that need extra shapes
//! build their own [`Registry`] and hand it to the session.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use url::Url;

use crate::objects::{Album, DomainObject, FriendInfo, Photo, User};
use crate::{Friendship, Timestamp, UserId, Value};

/// How the text of a recognised sub-tag is coerced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Kept verbatim.
    Text,
    /// Signed 64-bit integer.
    Integer,
    /// Decimal number.
    Float,
    /// Absolute URL.
    Url,
    /// Seconds since the Unix epoch.
    Timestamp,
    /// `1`, `0`, or nil.
    TriState,
    /// Generic recursive coercion (lists, records, nested objects).
    Value,
}

/// One recognised sub-tag of a shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Sub-tag name.
    pub tag: &'static str,
    /// Coercion applied to the sub-tag.
    pub kind: FieldKind,
}

impl FieldSpec {
    /// Creates a field spec.
    pub const fn new(tag: &'static str, kind: FieldKind) -> Self {
        Self { tag, kind }
    }
}

/// A coerced field value, tagged with the kind that produced it.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// From [`FieldKind::Text`].
    Text(String),
    /// From [`FieldKind::Integer`].
    Integer(i64),
    /// From [`FieldKind::Float`].
    Float(f64),
    /// From [`FieldKind::Url`].
    Url(Url),
    /// From [`FieldKind::Timestamp`].
    Timestamp(Timestamp),
    /// From [`FieldKind::TriState`].
    TriState(Friendship),
    /// From [`FieldKind::Value`].
    Value(Value),
}

/// Coerced values for the sub-tags present under one element.
///
/// Sub-tags absent from the element have no entry; accessors return `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldValues {
    values: HashMap<&'static str, FieldValue>,
}

impl FieldValues {
    /// Records the value for `tag`, replacing any earlier occurrence.
    pub fn insert(&mut self, tag: &'static str, value: FieldValue) {
        self.values.insert(tag, value);
    }

    /// Removes and returns the raw value for `tag`.
    pub fn take(&mut self, tag: &str) -> Option<FieldValue> {
        self.values.remove(tag)
    }

    /// Text field.
    pub fn text(&mut self, tag: &str) -> Option<String> {
        match self.take(tag)? {
            FieldValue::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Integer field.
    pub fn integer(&mut self, tag: &str) -> Option<i64> {
        match self.take(tag)? {
            FieldValue::Integer(integer) => Some(integer),
            _ => None,
        }
    }

    /// Integer field that must be a non-negative count.
    pub fn count(&mut self, tag: &str) -> Option<u64> {
        self.integer(tag).and_then(|integer| u64::try_from(integer).ok())
    }

    /// Integer field interpreted as a user id.
    pub fn user_id(&mut self, tag: &str) -> Option<UserId> {
        self.count(tag).map(UserId::new)
    }

    /// Float field.
    pub fn float(&mut self, tag: &str) -> Option<f64> {
        match self.take(tag)? {
            FieldValue::Float(float) => Some(float),
            _ => None,
        }
    }

    /// URL field.
    pub fn url(&mut self, tag: &str) -> Option<Url> {
        match self.take(tag)? {
            FieldValue::Url(url) => Some(url),
            _ => None,
        }
    }

    /// Timestamp field.
    pub fn timestamp(&mut self, tag: &str) -> Option<Timestamp> {
        match self.take(tag)? {
            FieldValue::Timestamp(timestamp) => Some(timestamp),
            _ => None,
        }
    }

    /// Tri-state field.
    pub fn tri_state(&mut self, tag: &str) -> Option<Friendship> {
        match self.take(tag)? {
            FieldValue::TriState(friendship) => Some(friendship),
            _ => None,
        }
    }

    /// Generic nested value.
    pub fn value(&mut self, tag: &str) -> Option<Value> {
        match self.take(tag)? {
            FieldValue::Value(value) => Some(value),
            _ => None,
        }
    }
}

/// Builds a typed object from the coerced fields of one element.
pub type Constructor = fn(FieldValues) -> DomainObject;

/// A typed record the registry can build from a subtree.
pub trait DomainShape: Into<DomainObject> {
    /// Tag name that selects this shape.
    const TAG: &'static str;
    /// Sub-tags recognised under [`Self::TAG`].
    const FIELDS: &'static [FieldSpec];

    /// Assembles the record; unset fields stay `None`.
    fn from_fields(fields: FieldValues) -> Self;
}

/// Registered description of one domain concept.
#[derive(Debug, Clone, Copy)]
pub struct Shape {
    fields: &'static [FieldSpec],
    construct: Constructor,
}

impl Shape {
    /// Describes a shape from its field table and constructor.
    pub fn new(fields: &'static [FieldSpec], construct: Constructor) -> Self {
        Self { fields, construct }
    }

    /// Shape of a [`DomainShape`] implementor.
    pub fn of<T: DomainShape>() -> Self {
        Self::new(T::FIELDS, construct::<T>)
    }

    /// Spec for `tag`, if this shape recognises it.
    pub fn field(&self, tag: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|spec| spec.tag == tag)
    }

    /// All recognised sub-tags.
    pub fn fields(&self) -> &'static [FieldSpec] {
        self.fields
    }

    /// Runs the constructor.
    pub fn build(&self, values: FieldValues) -> DomainObject {
        (self.construct)(values)
    }
}

fn construct<T: DomainShape>(values: FieldValues) -> DomainObject {
    T::from_fields(values).into()
}

/// Tag-name → [`Shape`] table.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    shapes: HashMap<String, Shape>,
}

impl Registry {
    /// A registry with no shapes; every structured element maps to a record.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A registry holding `user`, `photo`, `album`, and `friend_info`.
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry.register_shape::<User>();
        registry.register_shape::<Photo>();
        registry.register_shape::<Album>();
        registry.register_shape::<FriendInfo>();
        registry
    }

    /// The process-wide built-in registry.
    pub fn shared() -> Arc<Self> {
        static SHARED: OnceLock<Arc<Registry>> = OnceLock::new();
        Arc::clone(SHARED.get_or_init(|| Arc::new(Self::builtin())))
    }

    /// Registers `shape` under `tag`, returning the shape it replaces.
    pub fn register(&mut self, tag: impl Into<String>, shape: Shape) -> Option<Shape> {
        self.shapes.insert(tag.into(), shape)
    }

    /// Registers a [`DomainShape`] implementor under its own tag.
    pub fn register_shape<T: DomainShape>(&mut self) -> Option<Shape> {
        self.register(T::TAG, Shape::of::<T>())
    }

    /// Shape registered for `tag`.
    pub fn lookup(&self, tag: &str) -> Option<&Shape> {
        self.shapes.get(tag)
    }

    /// Number of registered shapes.
    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    /// `true` if no shapes are registered.
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }
}
