//! Caller-supplied credentials
//!
//! Authorized values arrive in several dynamic shapes (a bare string, a
//! `{value, name, in}` wrapper, `{username, password}`, `{token: {...}}`).
//! They are resolved once into a `Credential` so the dialect applicators can
//! match on a closed set of variants.

use base64::{engine::general_purpose, Engine as _};
use indexmap::IndexMap;
use serde_json::Value;

use crate::spec::{parse_requirements, SecurityRequirement};

/// `username:password` pair for HTTP basic auth.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicAuth {
    pub username: String,
    pub password: String,
    /// Precomputed `authorization` header value (Swagger 2 only).
    pub header: Option<String>,
}

impl BasicAuth {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            header: None,
        }
    }

    /// `base64(username:password)`
    pub fn encoded(&self) -> String {
        general_purpose::STANDARD.encode(format!("{}:{}", self.username, self.password))
    }
}

/// The secret part of a credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialValue {
    /// API key or bearer token.
    Text(String),
    Basic(BasicAuth),
    /// OAuth2 token response.
    Token {
        access_token: Option<String>,
        token_type: Option<String>,
    },
}

/// An authorized credential with optional overrides of the scheme's
/// field name and location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub value: CredentialValue,
    pub name: Option<String>,
    pub location: Option<String>,
}

impl Credential {
    pub fn text(value: impl Into<String>) -> Self {
        Self::from(CredentialValue::Text(value.into()))
    }

    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::from(CredentialValue::Basic(BasicAuth::new(username, password)))
    }

    pub fn token(access_token: impl Into<String>, token_type: Option<&str>) -> Self {
        Self::from(CredentialValue::Token {
            access_token: Some(access_token.into()),
            token_type: token_type.map(str::to_string),
        })
    }

    /// Override the field name the scheme declares.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Override the location (`in`) the scheme declares.
    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Resolve a dynamic authorized value.
    ///
    /// Returns `None` for values that carry nothing usable (`null`, `false`,
    /// empty strings).
    pub fn from_value(auth: &Value) -> Option<Self> {
        let (inner, name, location) = match auth {
            Value::Object(obj) if obj.contains_key("token") => {
                let token = obj.get("token");
                let field = |key: &str| {
                    token
                        .and_then(|t| t.get(key))
                        .and_then(|v| v.as_str())
                        .map(str::to_string)
                };
                return Some(Self::from(CredentialValue::Token {
                    access_token: field("access_token"),
                    token_type: field("token_type"),
                }));
            }
            Value::Object(obj) => {
                let field = |key: &str| obj.get(key).and_then(|v| v.as_str()).map(str::to_string);
                let inner = obj.get("value").filter(|v| is_truthy(v)).unwrap_or(auth);
                (inner, field("name"), field("in"))
            }
            other => (other, None, None),
        };

        let value = match inner {
            Value::String(s) if !s.is_empty() => CredentialValue::Text(s.clone()),
            Value::Number(n) => CredentialValue::Text(n.to_string()),
            Value::Bool(true) => CredentialValue::Text("true".to_string()),
            Value::Object(obj) => {
                let field = |key: &str| obj.get(key).and_then(|v| v.as_str()).map(str::to_string);
                CredentialValue::Basic(BasicAuth {
                    username: field("username").unwrap_or_default(),
                    password: field("password").unwrap_or_default(),
                    header: field("header"),
                })
            }
            _ => return None,
        };

        Some(Self {
            value,
            name,
            location,
        })
    }
}

impl From<CredentialValue> for Credential {
    fn from(value: CredentialValue) -> Self {
        Self {
            value,
            name: None,
            location: None,
        }
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => false,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

/// Authorized credentials plus the Swagger 2 global requirement default.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Securities {
    /// Scheme name → credential.
    pub authorized: IndexMap<String, Credential>,
    /// Spec-level requirements used by Swagger 2 when the operation declares none.
    pub spec_security: Option<Vec<SecurityRequirement>>,
}

impl Securities {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn authorize(mut self, scheme: impl Into<String>, credential: Credential) -> Self {
        self.authorized.insert(scheme.into(), credential);
        self
    }

    pub fn spec_security(mut self, security: Vec<SecurityRequirement>) -> Self {
        self.spec_security = Some(security);
        self
    }

    /// Resolve an `{authorized: {...}, specSecurity: [...]}` value.
    ///
    /// Entries whose value carries nothing usable are dropped.
    pub fn from_value(value: &Value) -> Self {
        let authorized = value
            .get("authorized")
            .and_then(|a| a.as_object())
            .map(|obj| {
                obj.iter()
                    .filter_map(|(name, auth)| {
                        Credential::from_value(auth).map(|cred| (name.clone(), cred))
                    })
                    .collect()
            })
            .unwrap_or_default();

        let spec_security = value.get("specSecurity").and_then(parse_requirements);

        Self {
            authorized,
            spec_security,
        }
    }

    pub fn is_authorized(&self) -> bool {
        !self.authorized.is_empty()
    }

    pub fn get(&self, scheme: &str) -> Option<&Credential> {
        self.authorized.get(scheme)
    }
}
