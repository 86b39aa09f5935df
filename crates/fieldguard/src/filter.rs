//! Response filtering.
//!
//! Projects a resolver result onto a whitelist. Every object keeps its full
//! key set; values of fields the whitelist does not mention are replaced
//! with `null`. Lists are filtered element by element, preserving order and
//! length.
//!
//! ```
//! use fieldguard::{ResponseFilter, WhitelistSpec};
//! use serde_json::json;
//!
//! let whitelist = WhitelistSpec::fields(["name", "username"]);
//! let user = json!({
//!     "id": 3,
//!     "name": "Greg",
//!     "email": "g@x.com",
//!     "username": "climber_guy123",
//! });
//!
//! let filtered = ResponseFilter::default().filter_value(&whitelist, user).unwrap();
//! assert_eq!(
//!     filtered,
//!     json!({ "id": null, "name": "Greg", "email": null, "username": "climber_guy123" })
//! );
//! ```

use serde_json::{Map, Value};

use crate::error::{AuthError, Result};
use crate::whitelist::WhitelistSpec;

/// Keys that are always copied verbatim, regardless of the whitelist.
///
/// They carry structural bookkeeping (record type and persistence metadata)
/// rather than caller-visible data.
pub const IMPLICIT_KEYS: [&str; 2] = ["__struct__", "__meta__"];

/// Applies whitelists to resolver results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseFilter {
    implicit_keys: Vec<String>,
}

impl Default for ResponseFilter {
    fn default() -> Self {
        Self::with_implicit_keys(IMPLICIT_KEYS)
    }
}

impl ResponseFilter {
    /// Creates a filter whose implicit keys replace [`IMPLICIT_KEYS`].
    pub fn with_implicit_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            implicit_keys: keys.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns the keys passed through unfiltered.
    pub fn implicit_keys(&self) -> &[String] {
        &self.implicit_keys
    }

    /// Filters a resolver outcome.
    ///
    /// Resolver failures pass through unchanged as [`AuthError::Resolver`].
    pub fn filter(
        &self,
        whitelist: &WhitelistSpec,
        result: std::result::Result<Value, String>,
    ) -> Result<Value> {
        let value = result.map_err(AuthError::Resolver)?;
        self.filter_value(whitelist, value)
    }

    /// Filters a resolved value: an object, a list of objects or `null`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MalformedWhitelistEntry`] when a scalar sits where
    /// an object is expected.
    pub fn filter_value(&self, whitelist: &WhitelistSpec, value: Value) -> Result<Value> {
        match value {
            Value::Array(items) => self.filter_list(whitelist, items, ""),
            other => self.filter_element(whitelist, other, ""),
        }
    }

    /// Filters a single object. The output has exactly the input's keys.
    pub fn filter_struct(
        &self,
        whitelist: &WhitelistSpec,
        obj: Map<String, Value>,
    ) -> Result<Map<String, Value>> {
        self.filter_struct_at(whitelist, obj, "")
    }

    fn filter_struct_at(
        &self,
        whitelist: &WhitelistSpec,
        obj: Map<String, Value>,
        path: &str,
    ) -> Result<Map<String, Value>> {
        obj.into_iter()
            .map(|(key, value)| -> Result<(String, Value)> {
                let filtered = if self.is_implicit(&key) || whitelist.has_field(&key) {
                    value
                } else {
                    match whitelist.sub_whitelist(&key) {
                        Some(sub) if !value.is_null() => {
                            self.filter_nested(sub, value, &child_path(path, &key))?
                        }
                        _ => Value::Null,
                    }
                };
                Ok((key, filtered))
            })
            .collect()
    }

    fn filter_nested(&self, whitelist: &WhitelistSpec, value: Value, path: &str) -> Result<Value> {
        match value {
            Value::Object(obj) => self
                .filter_struct_at(whitelist, obj, path)
                .map(Value::Object),
            Value::Array(items) => self.filter_list(whitelist, items, path),
            other => Err(malformed(path, &other)),
        }
    }

    fn filter_list(
        &self,
        whitelist: &WhitelistSpec,
        items: Vec<Value>,
        path: &str,
    ) -> Result<Value> {
        items
            .into_iter()
            .enumerate()
            .map(|(i, item)| self.filter_element(whitelist, item, &format!("{path}[{i}]")))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array)
    }

    /// Filters one list element or a top-level result.
    fn filter_element(&self, whitelist: &WhitelistSpec, value: Value, path: &str) -> Result<Value> {
        match value {
            Value::Object(obj) => self
                .filter_struct_at(whitelist, obj, path)
                .map(Value::Object),
            Value::Null => Ok(Value::Null),
            other => Err(malformed(path, &other)),
        }
    }

    fn is_implicit(&self, key: &str) -> bool {
        self.implicit_keys.iter().any(|k| k == key)
    }
}

fn child_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{parent}.{key}")
    }
}

fn malformed(path: &str, value: &Value) -> AuthError {
    AuthError::MalformedWhitelistEntry {
        path: if path.is_empty() {
            "<root>".to_string()
        } else {
            path.to_string()
        },
        found: value_kind(value),
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn user_with_posts() -> Value {
        json!({
            "id": 1,
            "name": "Greg",
            "company": "Climbing Co",
            "posts": [{
                "id": 10,
                "title": "Crimps",
                "body": "On crimping",
                "comments": [{ "id": 100, "body": "Nice" }]
            }]
        })
    }

    #[test]
    fn test_leaf_fields_survive_others_nulled() {
        let whitelist = WhitelistSpec::fields(["name", "username"]);
        let user = json!({
            "id": 3,
            "name": "Greg",
            "email": "g@x.com",
            "username": "climber_guy123"
        });

        let filtered = ResponseFilter::default()
            .filter(&whitelist, Ok(user))
            .unwrap();

        assert_eq!(
            filtered,
            json!({
                "id": null,
                "name": "Greg",
                "email": null,
                "username": "climber_guy123"
            })
        );
    }

    #[test]
    fn test_nested_whitelists_recurse_through_lists() {
        let whitelist = WhitelistSpec::new().field("name").nested(
            "posts",
            WhitelistSpec::new()
                .field("title")
                .field("body")
                .nested("comments", WhitelistSpec::fields(["body"])),
        );

        let filtered = ResponseFilter::default()
            .filter_value(&whitelist, user_with_posts())
            .unwrap();

        assert_eq!(
            filtered,
            json!({
                "id": null,
                "name": "Greg",
                "company": null,
                "posts": [{
                    "id": null,
                    "title": "Crimps",
                    "body": "On crimping",
                    "comments": [{ "id": null, "body": "Nice" }]
                }]
            })
        );
    }

    #[test]
    fn test_list_results_filtered_per_element() {
        let whitelist = WhitelistSpec::fields(["name"]);
        let users = json!([
            { "id": 1, "name": "Ann" },
            { "id": 2, "name": "Bob" },
            null
        ]);

        let filtered = ResponseFilter::default()
            .filter_value(&whitelist, users)
            .unwrap();

        assert_eq!(
            filtered,
            json!([{ "id": null, "name": "Ann" }, { "id": null, "name": "Bob" }, null])
        );
    }

    #[test]
    fn test_implicit_keys_pass_through() {
        let whitelist = WhitelistSpec::fields(["name"]);
        let record = json!({
            "__struct__": "User",
            "__meta__": { "state": "loaded" },
            "name": "Ann",
            "id": 1
        });

        let filtered = ResponseFilter::default()
            .filter_value(&whitelist, record)
            .unwrap();

        assert_eq!(filtered["__struct__"], json!("User"));
        assert_eq!(filtered["__meta__"], json!({ "state": "loaded" }));
        assert_eq!(filtered["id"], Value::Null);
    }

    #[test]
    fn test_custom_implicit_keys() {
        let filter = ResponseFilter::with_implicit_keys(["__typename"]);
        let filtered = filter
            .filter_value(
                &WhitelistSpec::new(),
                json!({ "__typename": "User", "__struct__": "User" }),
            )
            .unwrap();

        assert_eq!(
            filtered,
            json!({ "__typename": "User", "__struct__": null })
        );
    }

    #[test]
    fn test_null_nested_value_stays_null() {
        let whitelist = WhitelistSpec::new().nested("profile", WhitelistSpec::fields(["bio"]));

        let filtered = ResponseFilter::default()
            .filter_value(&whitelist, json!({ "profile": null }))
            .unwrap();

        assert_eq!(filtered, json!({ "profile": null }));
    }

    #[test]
    fn test_nested_empty_whitelist_redacts_everything() {
        let whitelist = WhitelistSpec::new().nested("profile", WhitelistSpec::new());

        let filtered = ResponseFilter::default()
            .filter_value(&whitelist, json!({ "profile": { "bio": "hi" } }))
            .unwrap();

        assert_eq!(filtered, json!({ "profile": { "bio": null } }));
    }

    #[test]
    fn test_branch_over_scalar_fails_with_path() {
        let whitelist = WhitelistSpec::new().nested(
            "posts",
            WhitelistSpec::new().nested("author", WhitelistSpec::fields(["name"])),
        );
        let value = json!({ "posts": [{ "author": "greg" }] });

        let err = ResponseFilter::default()
            .filter_value(&whitelist, value)
            .unwrap_err();

        assert_eq!(
            err,
            AuthError::MalformedWhitelistEntry {
                path: "posts[0].author".to_string(),
                found: "string",
            }
        );
    }

    #[test]
    fn test_scalar_result_is_rejected() {
        let err = ResponseFilter::default()
            .filter_value(&WhitelistSpec::fields(["name"]), json!(42))
            .unwrap_err();

        assert!(matches!(
            err,
            AuthError::MalformedWhitelistEntry { ref path, found: "number" } if path == "<root>"
        ));
    }

    #[test]
    fn test_null_result_passes_through() {
        let filtered = ResponseFilter::default()
            .filter_value(&WhitelistSpec::fields(["name"]), Value::Null)
            .unwrap();

        assert_eq!(filtered, Value::Null);
    }

    #[test]
    fn test_resolver_error_passes_through() {
        let err = ResponseFilter::default()
            .filter(
                &WhitelistSpec::fields(["name"]),
                Err("not found".to_string()),
            )
            .unwrap_err();

        assert_eq!(err, AuthError::Resolver("not found".to_string()));
    }

    // ------------------------------------------------------------------------
    // Property tests
    // ------------------------------------------------------------------------

    fn arb_key() -> impl Strategy<Value = String> {
        prop::sample::select(vec![
            "id", "name", "email", "posts", "comments", "body", "__meta__",
        ])
        .prop_map(String::from)
    }

    fn arb_json() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(Value::from),
            "[a-z]{0,8}".prop_map(Value::String),
        ];
        leaf.prop_recursive(3, 32, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
                prop::collection::btree_map(arb_key(), inner, 0..5)
                    .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        })
    }

    fn arb_object() -> impl Strategy<Value = Map<String, Value>> {
        prop::collection::btree_map(arb_key(), arb_json(), 0..6)
            .prop_map(|m| m.into_iter().collect())
    }

    fn arb_whitelist() -> impl Strategy<Value = WhitelistSpec> {
        let leaf = prop::collection::vec(arb_key(), 0..4).prop_map(WhitelistSpec::fields);
        leaf.prop_recursive(2, 16, 3, |inner| {
            (
                prop::collection::vec(arb_key(), 0..3),
                prop::collection::vec((arb_key(), inner), 0..3),
            )
                .prop_map(|(fields, nested)| {
                    nested
                        .into_iter()
                        .fold(WhitelistSpec::fields(fields), |spec, (key, sub)| {
                            spec.nested(key, sub)
                        })
                })
        })
    }

    proptest! {
        #[test]
        fn filter_struct_never_drops_a_key(whitelist in arb_whitelist(), obj in arb_object()) {
            let filter = ResponseFilter::default();
            if let Ok(filtered) = filter.filter_struct(&whitelist, obj.clone()) {
                let before: Vec<&String> = obj.keys().collect();
                let after: Vec<&String> = filtered.keys().collect();
                prop_assert_eq!(before, after);
            }
        }

        #[test]
        fn filter_struct_is_idempotent(whitelist in arb_whitelist(), obj in arb_object()) {
            let filter = ResponseFilter::default();
            if let Ok(once) = filter.filter_struct(&whitelist, obj) {
                let twice = filter.filter_struct(&whitelist, once.clone());
                prop_assert_eq!(twice, Ok(once));
            }
        }

        #[test]
        fn flat_whitelists_never_fail_on_objects(
            fields in prop::collection::vec(arb_key(), 0..5),
            obj in arb_object(),
        ) {
            let whitelist = WhitelistSpec::fields(fields.clone());
            let filtered = filter_ok(&whitelist, obj.clone());

            for (key, value) in &obj {
                let expected = if fields.contains(key) || IMPLICIT_KEYS.contains(&key.as_str()) {
                    value.clone()
                } else {
                    Value::Null
                };
                prop_assert_eq!(&filtered[key], &expected);
            }
        }
    }

    fn filter_ok(whitelist: &WhitelistSpec, obj: Map<String, Value>) -> Map<String, Value> {
        ResponseFilter::default()
            .filter_struct(whitelist, obj)
            .expect("flat whitelist cannot hit a malformed branch")
    }
}
