//! Response Mapper: reply body → [`Value`].
//!
//! The element type of a reply is discovered per element, not declared per
//! call. Leaf elements become scalars, `list="true"` elements become lists,
//! registered tags become typed objects, and everything else becomes a
//! [`Record`]. A run of same-named children is read as a list only directly
//! under the reply root; deeper down it stays a record with repeated fields.

use std::sync::Arc;

use tracing::{debug, trace};
use url::Url;

use crate::document::{parse_document, Element};
use crate::registry::{FieldKind, FieldValue, FieldValues, Registry, Shape};
use crate::{FacebookerError, Friendship, Record, Result, Timestamp, Value};

const ERROR_ROOT: &str = "error_response";
const METHOD_NAMESPACE: &str = "facebook.";

/// Converts reply bodies into values using a [`Registry`].
#[derive(Debug, Clone)]
pub struct ResponseMapper {
    registry: Arc<Registry>,
}

impl Default for ResponseMapper {
    fn default() -> Self {
        Self::new(Registry::shared())
    }
}

impl ResponseMapper {
    /// Creates a mapper backed by `registry`.
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    /// The registry in use.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Parses the reply to `method` and converts it.
    ///
    /// # Errors
    ///
    /// - [`FacebookerError::MalformedReply`] if `body` is not well-formed XML.
    /// - [`FacebookerError::Service`] if the root is `error_response`.
    /// - [`FacebookerError::ProtocolMismatch`] if the root does not belong to
    ///   `method` or a typed field cannot be coerced.
    pub fn parse(&self, body: &str, method: &str) -> Result<Value> {
        let root = parse_document(body)?;
        if root.name() == ERROR_ROOT {
            return Err(service_error(&root));
        }

        let expected = expected_root(method);
        if root.name() != expected {
            return Err(FacebookerError::protocol_mismatch(format!(
                "reply to {method} has root <{}>, expected <{expected}>",
                root.name()
            )));
        }

        let value = self.convert_root(&root)?;
        debug!(method, root = root.name(), "mapped reply");
        Ok(value)
    }

    fn convert_root(&self, root: &Element) -> Result<Value> {
        if root.is_nil() {
            return Ok(Value::Null);
        }
        if root.is_list() || root.has_repeated_children() {
            return self.coerce_list(root);
        }
        match root.children() {
            [] => Ok(Value::scalar(root.text())),
            [only] => self.coerce(only),
            _ => self.coerce(root),
        }
    }

    /// Converts one element and its subtree.
    pub fn coerce(&self, element: &Element) -> Result<Value> {
        if element.is_nil() {
            return Ok(Value::Null);
        }
        if element.is_list() {
            return self.coerce_list(element);
        }
        if element.children().is_empty() {
            return Ok(Value::scalar(element.text()));
        }
        if let Some(shape) = self.registry.lookup(element.name()) {
            let values = self.populate(shape, element)?;
            return Ok(Value::Object(shape.build(values)));
        }

        let mut record = Record::new();
        for child in element.children() {
            record.push(child.name(), self.coerce(child)?);
        }
        Ok(Value::Record(record))
    }

    fn coerce_list(&self, element: &Element) -> Result<Value> {
        element
            .children()
            .iter()
            .map(|child| self.coerce(child))
            .collect::<Result<Vec<_>>>()
            .map(Value::List)
    }

    fn populate(&self, shape: &Shape, element: &Element) -> Result<FieldValues> {
        let mut values = FieldValues::default();
        for child in element.children() {
            let Some(spec) = shape.field(child.name()) else {
                trace!(
                    object = element.name(),
                    field = child.name(),
                    "ignoring unrecognised field"
                );
                continue;
            };
            if let Some(value) = self.coerce_field(child, spec.kind)? {
                values.insert(spec.tag, value);
            }
        }
        Ok(values)
    }

    fn coerce_field(&self, element: &Element, kind: FieldKind) -> Result<Option<FieldValue>> {
        if element.is_nil() {
            return Ok(match kind {
                FieldKind::TriState => Some(FieldValue::TriState(Friendship::Unknown)),
                FieldKind::Value => Some(FieldValue::Value(Value::Null)),
                _ => None,
            });
        }
        if kind == FieldKind::Value {
            return self.coerce(element).map(|value| Some(FieldValue::Value(value)));
        }
        if !element.children().is_empty() {
            return Err(field_mismatch(element, "a scalar"));
        }

        let text = element.text();
        if text.is_empty() {
            return Ok(None);
        }
        let value = match kind {
            FieldKind::Text => FieldValue::Text(text.to_owned()),
            FieldKind::Integer => FieldValue::Integer(
                text.parse()
                    .map_err(|_| field_mismatch(element, "an integer"))?,
            ),
            FieldKind::Float => FieldValue::Float(
                text.parse()
                    .map_err(|_| field_mismatch(element, "a number"))?,
            ),
            FieldKind::Url => FieldValue::Url(
                Url::parse(text).map_err(|_| field_mismatch(element, "a URL"))?,
            ),
            FieldKind::Timestamp => FieldValue::Timestamp(
                text.parse()
                    .ok()
                    .and_then(Timestamp::from_epoch_seconds)
                    .ok_or_else(|| field_mismatch(element, "epoch seconds"))?,
            ),
            FieldKind::TriState => FieldValue::TriState(match text {
                "1" => Friendship::Friends,
                "0" => Friendship::NotFriends,
                _ => return Err(field_mismatch(element, "1, 0, or nil")),
            }),
            FieldKind::Value => FieldValue::Value(self.coerce(element)?),
        };
        Ok(Some(value))
    }
}

/// Root element name expected in the reply to `method`.
///
/// `facebook.friends.areFriends` and `friends.areFriends` both expect
/// `friends_areFriends_response`.
pub fn expected_root(method: &str) -> String {
    let bare = method.strip_prefix(METHOD_NAMESPACE).unwrap_or(method);
    format!("{}_response", bare.replace('.', "_"))
}

fn service_error(root: &Element) -> FacebookerError {
    let code = root
        .child("error_code")
        .and_then(|element| element.text().parse::<i64>().ok());
    let message = root
        .child("error_msg")
        .map(|element| element.text().to_owned())
        .unwrap_or_default();
    match code {
        Some(code) => FacebookerError::Service { code, message },
        None => FacebookerError::protocol_mismatch("error_response without a numeric error_code"),
    }
}

fn field_mismatch(element: &Element, expected: &str) -> FacebookerError {
    FacebookerError::protocol_mismatch(format!(
        "field <{}> holds {:?}, expected {expected}",
        element.name(),
        element.text()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::DomainObject;

    fn mapper() -> ResponseMapper {
        ResponseMapper::default()
    }

    #[test]
    fn expected_root_drops_namespace_and_dots() {
        assert_eq!(expected_root("facebook.fql.query"), "fql_query_response");
        assert_eq!(expected_root("auth.createToken"), "auth_createToken_response");
    }

    #[test]
    fn scalar_root_becomes_a_scalar() {
        let value = mapper()
            .parse(
                r#"<auth_createToken_response xmlns="http://api.facebook.com/1.0/">3e4a22bb2f5ed75114b0fc9995ea85f1</auth_createToken_response>"#,
                "auth.createToken",
            )
            .unwrap();
        assert_eq!(value, Value::Text("3e4a22bb2f5ed75114b0fc9995ea85f1".to_owned()));
    }

    #[test]
    fn heterogeneous_root_becomes_a_record() {
        let value = mapper()
            .parse(
                "<auth_getSession_response>\
                   <session_key>5f34e11bfb97c762e439e6a5-8055</session_key>\
                   <uid>8055</uid>\
                   <expires>1173309298</expires>\
                 </auth_getSession_response>",
                "auth.getSession",
            )
            .unwrap();
        let record = value.as_record().unwrap();
        assert_eq!(record.get("uid"), Some(&Value::Integer(8055)));
        assert_eq!(
            record.get("session_key").and_then(Value::as_text),
            Some("5f34e11bfb97c762e439e6a5-8055")
        );
    }

    #[test]
    fn empty_list_root_becomes_an_empty_list() {
        let value = mapper()
            .parse(r#"<fql_query_response list="true"/>"#, "fql.query")
            .unwrap();
        assert_eq!(value, Value::List(Vec::new()));
    }

    #[test]
    fn repeated_scalars_become_a_list() {
        let value = mapper()
            .parse(
                "<friends_get_response><uid>222333</uid><uid>1240079</uid></friends_get_response>",
                "friends.get",
            )
            .unwrap();
        assert_eq!(
            value,
            Value::List(vec![Value::Integer(222333), Value::Integer(1240079)])
        );
    }

    #[test]
    fn unregistered_rows_keep_repeated_column_names() {
        let value = mapper()
            .parse(
                "<fql_query_response list=\"true\">\
                   <row><anon>2.5</anon></row>\
                   <row><anon>2.5</anon><anon>210</anon></row>\
                 </fql_query_response>",
                "fql.query",
            )
            .unwrap();
        let rows = value.into_items();
        let single = rows[0].as_record().unwrap();
        assert_eq!(single.get("anon"), Some(&Value::Float(2.5)));

        let repeated = rows[1].as_record().unwrap();
        let fields: Vec<(&str, &Value)> = repeated.iter().collect();
        assert_eq!(
            fields,
            [("anon", &Value::Float(2.5)), ("anon", &Value::Integer(210))]
        );
    }

    #[test]
    fn nil_fields_are_unset_on_typed_objects() {
        let value = mapper()
            .parse(
                r#"<users_getInfo_response xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" list="true">
                     <user><uid>8055</uid><pic xsi:nil="true"/><name></name></user>
                   </users_getInfo_response>"#,
                "users.getInfo",
            )
            .unwrap();
        match value.into_items().as_slice() {
            [Value::Object(DomainObject::User(user))] => {
                assert_eq!(user.uid.map(|uid| uid.as_u64()), Some(8055));
                assert_eq!(user.pic, None);
                assert_eq!(user.name, None);
            }
            other => panic!("expected one user, got {other:?}"),
        }
    }

    #[test]
    fn nested_generic_fields_are_coerced_recursively() {
        let value = mapper()
            .parse(
                "<users_getInfo_response list=\"true\"><user>\
                   <status><message>at the museum</message><time>1173309298</time></status>\
                   <affiliations list=\"true\">\
                     <affiliation><nid>50431648</nid><name>Facebook</name></affiliation>\
                   </affiliations>\
                 </user></users_getInfo_response>",
                "users.getInfo",
            )
            .unwrap();
        let items = value.into_items();
        let Some(Value::Object(DomainObject::User(user))) = items.first() else {
            panic!("expected a user");
        };
        let status = user.status.as_deref().and_then(Value::as_record).unwrap();
        assert_eq!(status.get("time"), Some(&Value::Integer(1173309298)));
    }

    #[test]
    fn uncoercible_typed_field_is_a_protocol_mismatch() {
        let error = mapper()
            .parse(
                "<users_getInfo_response list=\"true\"><user><uid>eighty</uid></user></users_getInfo_response>",
                "users.getInfo",
            )
            .unwrap_err();
        assert!(matches!(error, FacebookerError::ProtocolMismatch { .. }));
    }

    #[test]
    fn tri_state_rejects_other_digits() {
        let error = mapper()
            .parse(
                "<friends_areFriends_response list=\"true\"><friend_info><are_friends>2</are_friends></friend_info></friends_areFriends_response>",
                "friends.areFriends",
            )
            .unwrap_err();
        assert!(matches!(error, FacebookerError::ProtocolMismatch { .. }));
    }

    #[test]
    fn error_documents_become_service_errors() {
        let error = mapper()
            .parse(
                r#"<?xml version="1.0" encoding="UTF-8"?>
                <error_response xmlns="http://api.facebook.com/1.0/">
                  <error_code>5</error_code>
                  <error_msg>Unauthorized source IP address (ip was: 10.1.2.3)</error_msg>
                  <request_args list="true">
                    <arg><key>method</key><value>facebook.friends.get</value></arg>
                  </request_args>
                </error_response>"#,
                "friends.get",
            )
            .unwrap_err();
        match error {
            FacebookerError::Service { code, message } => {
                assert_eq!(code, 5);
                assert!(message.starts_with("Unauthorized source IP address"));
            }
            other => panic!("expected a service error, got {other:?}"),
        }
    }

    #[test]
    fn reply_for_another_method_is_rejected() {
        let error = mapper()
            .parse("<friends_get_response list=\"true\"/>", "fql.query")
            .unwrap_err();
        assert!(matches!(error, FacebookerError::ProtocolMismatch { .. }));
    }
}
