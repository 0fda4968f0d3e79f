// src/core/userpass/fields.rs

//! The `users/{username}/policies` path: its field schema, help text, and the
//! conversion of raw request fields into an `UpdatePoliciesRequest`.

use crate::core::UserpassError;
use crate::core::userpass::policies::PolicyInput;
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};

pub const USERNAME_FIELD: &str = "username";
pub const TOKEN_POLICIES_FIELD: &str = "token_policies";
/// Deprecated in favour of `token_policies`.
pub const LEGACY_POLICIES_FIELD: &str = "policies";

/// The character pattern a username must match, shared by every user path.
/// Word characters are ASCII only.
pub const USERNAME_PATTERN: &str = r"[A-Za-z0-9_](([A-Za-z0-9_\-.]+)?[A-Za-z0-9_])?";

lazy_static! {
    static ref USERNAME_REGEX: Regex = Regex::new(&format!("^{USERNAME_PATTERN}$"))
        .expect("username pattern is a valid regex");
    static ref POLICIES_PATH_REGEX: Regex =
        Regex::new(&format!("^users/(?P<username>{USERNAME_PATTERN})/policies$"))
            .expect("policies path pattern is a valid regex");
}

/// How a field's raw value is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    /// A comma-separated string or a list of strings.
    CommaStringSlice,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSchema {
    pub name: &'static str,
    pub field_type: FieldType,
    pub description: &'static str,
    pub deprecated: bool,
}

/// Static description of a backend path.
#[derive(Debug)]
pub struct PathSpec {
    /// Human-readable route, e.g. `users/{username}/policies`.
    pub route: &'static str,
    pub fields: &'static [FieldSchema],
    pub help_synopsis: &'static str,
    pub help_description: &'static str,
}

pub static POLICIES_PATH: PathSpec = PathSpec {
    route: "users/{username}/policies",
    fields: &[
        FieldSchema {
            name: USERNAME_FIELD,
            field_type: FieldType::String,
            description: "Username for this user.",
            deprecated: false,
        },
        FieldSchema {
            name: LEGACY_POLICIES_FIELD,
            field_type: FieldType::CommaStringSlice,
            description: "(DEPRECATED) Use 'token_policies' instead. If this and 'token_policies' are both specified only 'token_policies' will be used.",
            deprecated: true,
        },
        FieldSchema {
            name: TOKEN_POLICIES_FIELD,
            field_type: FieldType::CommaStringSlice,
            description: "Comma-separated list of policies",
            deprecated: false,
        },
    ],
    help_synopsis: "Update the policies associated with the username.",
    help_description: "This endpoint allows updating the policies associated with the username.",
};

impl PathSpec {
    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Extracts the username from a request path such as `users/alice/policies`.
    /// Returns `None` when the path does not belong to this route.
    pub fn match_path(&self, path: &str) -> Option<String> {
        POLICIES_PATH_REGEX
            .captures(path.trim_matches('/'))
            .and_then(|caps| caps.name("username"))
            .map(|m| m.as_str().to_string())
    }
}

/// Checks a username against the identity-name pattern.
pub fn validate_username(username: &str) -> Result<(), UserpassError> {
    if USERNAME_REGEX.is_match(username) {
        Ok(())
    } else {
        Err(UserpassError::InvalidUsername(username.to_string()))
    }
}

/// Reads a comma-string-slice field. Missing and `null` both mean "not supplied";
/// an empty string or empty array is a supplied, empty list.
pub fn comma_string_slice(
    fields: &Map<String, Value>,
    name: &str,
) -> Result<Option<PolicyInput>, UserpassError> {
    match fields.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(raw)) => Ok(Some(PolicyInput::Raw(raw.clone()))),
        Some(Value::Array(items)) => {
            let mut names = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    Value::String(s) => names.push(s.clone()),
                    Value::Number(n) => names.push(n.to_string()),
                    other => {
                        return Err(UserpassError::InvalidField {
                            field: name.to_string(),
                            reason: format!("list elements must be strings, got {other}"),
                        });
                    }
                }
            }
            Ok(Some(PolicyInput::List(names)))
        }
        Some(other) => Err(UserpassError::InvalidField {
            field: name.to_string(),
            reason: format!("expected a comma-separated string or a list, got {other}"),
        }),
    }
}
