//! Language-level values produced by the response mapper.
//!
//! A reply can carry scalars, lists, registered domain objects, or shapes the
//! client has never seen. [`Value`] is the closed set of those outcomes, with
//! [`Value::Record`] as the fallback for unrecognised shapes.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::objects::DomainObject;

/// A mapped reply value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// An element marked `xsi:nil="true"`.
    Null,
    /// Canonical integer text that fits in 64 bits.
    Integer(i64),
    /// Canonical decimal text with a fractional part.
    Float(f64),
    /// Any other text.
    Text(String),
    /// A `list="true"` element or a run of same-named children.
    List(Vec<Value>),
    /// An element whose tag is registered in the [`crate::Registry`].
    Object(DomainObject),
    /// An element with children whose tag is not registered.
    Record(Record),
}

impl Value {
    /// Coerces leaf text into the narrowest scalar that represents it.
    ///
    /// Only canonical decimal forms become numbers, so that identifiers such
    /// as `0042` or `3e45` survive as text.
    pub fn scalar(text: &str) -> Self {
        let (integer_part, fraction) = match text.split_once('.') {
            Some((integer_part, fraction)) => (integer_part, Some(fraction)),
            None => (text, None),
        };
        if !is_canonical_integer(integer_part) {
            return Self::Text(text.to_owned());
        }
        match fraction {
            None => text
                .parse()
                .map_or_else(|_| Self::Text(text.to_owned()), Self::Integer),
            Some(digits) if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) => {
                text.parse()
                    .map_or_else(|_| Self::Text(text.to_owned()), Self::Float)
            }
            Some(_) => Self::Text(text.to_owned()),
        }
    }

    /// `true` for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The text of a [`Value::Text`].
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// The integer of a [`Value::Integer`].
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(integer) => Some(*integer),
            _ => None,
        }
    }

    /// Any numeric value widened to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(float) => Some(*float),
            Self::Integer(integer) => Some(*integer as f64),
            _ => None,
        }
    }

    /// The object of a [`Value::Object`].
    pub fn as_object(&self) -> Option<&DomainObject> {
        match self {
            Self::Object(object) => Some(object),
            _ => None,
        }
    }

    /// The record of a [`Value::Record`].
    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Self::Record(record) => Some(record),
            _ => None,
        }
    }

    /// Renders a scalar back to its wire text. `None` for non-scalars.
    pub fn to_wire_text(&self) -> Option<String> {
        match self {
            Self::Integer(integer) => Some(integer.to_string()),
            Self::Float(float) => Some(float.to_string()),
            Self::Text(text) => Some(text.clone()),
            _ => None,
        }
    }

    /// Flattens a reply into its items: lists yield their elements, `Null`
    /// yields nothing, and anything else is a single item.
    pub fn into_items(self) -> Vec<Value> {
        match self {
            Self::List(items) => items,
            Self::Null => Vec::new(),
            other => vec![other],
        }
    }
}

fn is_canonical_integer(text: &str) -> bool {
    let digits = text.strip_prefix('-').unwrap_or(text);
    match digits.as_bytes() {
        [] => false,
        [b'0'] => true,
        [b'0', ..] => false,
        bytes => bytes.iter().all(u8::is_ascii_digit),
    }
}

/// Fields of an unrecognised element, in document order.
///
/// Duplicate tags are kept; [`Record::get`] returns the first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    /// Creates an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a field.
    pub fn push(&mut self, name: impl Into<String>, value: Value) {
        self.fields.push((name.into(), value));
    }

    /// First value recorded under `name`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    /// Iterates fields in document order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Number of fields, duplicates included.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// `true` if the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::integer("222332", Value::Integer(222332))]
    #[case::negative("-5", Value::Integer(-5))]
    #[case::decimal("2.5", Value::Float(2.5))]
    #[case::zero("0", Value::Integer(0))]
    #[case::fraction_below_one("0.75", Value::Float(0.75))]
    #[case::leading_zero_stays_text("0042", Value::Text("0042".to_owned()))]
    #[case::exponent_stays_text("3e45", Value::Text("3e45".to_owned()))]
    #[case::hex_token("3e4a22bb2f5ed751", Value::Text("3e4a22bb2f5ed751".to_owned()))]
    #[case::dangling_point("5.", Value::Text("5.".to_owned()))]
    #[case::words("Ari Steinberg", Value::Text("Ari Steinberg".to_owned()))]
    #[case::infinity_stays_text("inf", Value::Text("inf".to_owned()))]
    #[case::url(
        "http://profile.ak.facebook.com/profile2/1805/47/s211031_26434.jpg",
        Value::Text("http://profile.ak.facebook.com/profile2/1805/47/s211031_26434.jpg".to_owned())
    )]
    #[case::empty("", Value::Text(String::new()))]
    fn scalars_take_the_narrowest_type(#[case] text: &str, #[case] expected: Value) {
        assert_eq!(Value::scalar(text), expected);
    }

    #[test]
    fn records_keep_duplicate_fields_in_order() {
        let mut record = Record::new();
        record.push("caption", Value::scalar("first"));
        record.push("anon", Value::scalar("210"));
        record.push("caption", Value::scalar("second"));

        assert_eq!(record.len(), 3);
        assert_eq!(record.get("caption"), Some(&Value::Text("first".to_owned())));
        let names: Vec<&str> = record.iter().map(|(name, _)| name).collect();
        assert_eq!(names, ["caption", "anon", "caption"]);
    }

    #[test]
    fn values_serialize_without_variant_tags() {
        let mut record = Record::new();
        record.push("anon", Value::Float(2.5));
        record.push("missing", Value::Null);
        let json = serde_json::to_string(&Value::List(vec![Value::Record(record)])).unwrap();
        assert_eq!(json, r#"[{"anon":2.5,"missing":null}]"#);
    }

    #[test]
    fn items_flatten_lists_and_drop_null() {
        assert!(Value::Null.into_items().is_empty());
        assert_eq!(Value::Integer(1).into_items(), vec![Value::Integer(1)]);
        assert_eq!(
            Value::List(vec![Value::Integer(1), Value::Integer(2)]).into_items().len(),
            2
        );
    }
}
