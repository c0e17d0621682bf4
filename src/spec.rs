//! OpenAPI/Swagger document → typed views
//!
//! Extracts only what request building needs from an already dereferenced
//! spec document and one of its operations: security requirements, security
//! scheme definitions, `consumes` lists and request body media types.

use indexmap::IndexMap;
use serde_json::Value;

/// Which spec dialect a document is written in.
///
/// Selected explicitly by the caller; never inferred from document shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// Swagger 2.0
    Swagger2,
    /// OpenAPI 3.x
    OpenApi3,
}

/// One security requirement object: scheme name → scopes.
///
/// Scheme names keep their declaration order.
pub type SecurityRequirement = IndexMap<String, Vec<String>>;

/// A security scheme definition.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SecurityScheme {
    /// `type: apiKey`, with the field name and its location (`query`, `header`, `cookie`).
    ApiKey {
        name: Option<String>,
        location: Option<String>,
    },
    /// OAS3 `type: http`, with `scheme` (`basic`, `bearer`, ...).
    Http { scheme: Option<String> },
    /// Swagger 2 `type: basic`.
    Basic,
    OAuth2,
    /// Any other type (e.g. `openIdConnect`); never applied.
    Other(String),
}

impl SecurityScheme {
    /// Parse a single scheme definition.
    pub fn from_value(value: &Value) -> Option<Self> {
        let scheme_type = value.get("type")?.as_str()?;
        let field = |key: &str| value.get(key).and_then(|v| v.as_str()).map(str::to_string);

        let scheme = match scheme_type {
            "apiKey" => Self::ApiKey {
                name: field("name"),
                location: field("in"),
            },
            "http" => Self::Http {
                scheme: field("scheme"),
            },
            "basic" => Self::Basic,
            "oauth2" => Self::OAuth2,
            other => Self::Other(other.to_string()),
        };
        Some(scheme)
    }
}

/// Spec-level data consulted while building a request.
#[derive(Debug, Clone, PartialEq, Default)]
#[non_exhaustive]
pub struct Spec {
    /// Global security requirements (`security` at the document root).
    pub security: Option<Vec<SecurityRequirement>>,
    /// Swagger 2 global `consumes`.
    pub consumes: Option<Vec<String>>,
    /// `securityDefinitions` (Swagger 2) or `components.securitySchemes` (OAS3).
    pub security_schemes: IndexMap<String, SecurityScheme>,
}

impl Spec {
    /// Extract the spec-level data for the given dialect.
    pub fn from_value(dialect: Dialect, spec: &Value) -> Self {
        let schemes = match dialect {
            Dialect::Swagger2 => spec.get("securityDefinitions"),
            Dialect::OpenApi3 => spec
                .get("components")
                .and_then(|c| c.get("securitySchemes")),
        };

        let security_schemes = schemes
            .and_then(|s| s.as_object())
            .map(|obj| {
                obj.iter()
                    .filter_map(|(name, def)| {
                        SecurityScheme::from_value(def).map(|scheme| (name.clone(), scheme))
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            security: spec.get("security").and_then(parse_requirements),
            consumes: spec.get("consumes").and_then(parse_string_list),
            security_schemes,
        }
    }

    pub fn security_scheme(&self, name: &str) -> Option<&SecurityScheme> {
        self.security_schemes.get(name)
    }
}

/// An operation parameter as far as Content-Type selection cares.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct OperationParam {
    pub name: String,
    /// `in`: `query`, `header`, `path`, `formData`, `body`, ...
    pub location: String,
    /// Swagger 2 `type` (`file`, `string`, ...).
    pub param_type: Option<String>,
}

/// Operation-level data consulted while building a request.
#[derive(Debug, Clone, PartialEq, Default)]
#[non_exhaustive]
pub struct Operation {
    /// `None` when the operation does not declare `security`;
    /// `Some(vec![])` when it explicitly requires none.
    pub security: Option<Vec<SecurityRequirement>>,
    /// Swagger 2 `consumes`.
    pub consumes: Option<Vec<String>>,
    pub parameters: Vec<OperationParam>,
    /// OAS3 `requestBody.content` media types, in declaration order.
    pub request_body_media_types: Vec<String>,
}

impl Operation {
    pub fn from_value(operation: &Value) -> Self {
        let parameters = operation
            .get("parameters")
            .and_then(|p| p.as_array())
            .map(|params| params.iter().filter_map(parse_param).collect())
            .unwrap_or_default();

        let request_body_media_types = operation
            .get("requestBody")
            .and_then(|rb| rb.get("content"))
            .and_then(|c| c.as_object())
            .map(|content| content.keys().cloned().collect())
            .unwrap_or_default();

        Self {
            security: operation.get("security").and_then(parse_requirements),
            consumes: operation.get("consumes").and_then(parse_string_list),
            parameters,
            request_body_media_types,
        }
    }

    /// Whether the OAS3 request body declares this media type.
    pub fn declares_media_type(&self, media_type: &str) -> bool {
        self.request_body_media_types
            .iter()
            .any(|m| m == media_type)
    }
}

fn parse_param(param: &Value) -> Option<OperationParam> {
    let name = param.get("name")?.as_str()?.to_string();
    let location = param.get("in")?.as_str()?.to_string();
    let param_type = param
        .get("type")
        .and_then(|v| v.as_str())
        .map(str::to_string);

    Some(OperationParam {
        name,
        location,
        param_type,
    })
}

pub(crate) fn parse_requirements(value: &Value) -> Option<Vec<SecurityRequirement>> {
    let groups = value.as_array()?;
    let requirements = groups
        .iter()
        .filter_map(|group| group.as_object())
        .map(|group| {
            group
                .iter()
                .map(|(name, scopes)| {
                    let scopes = parse_string_list(scopes).unwrap_or_default();
                    (name.clone(), scopes)
                })
                .collect()
        })
        .collect();
    Some(requirements)
}

fn parse_string_list(value: &Value) -> Option<Vec<String>> {
    let items = value.as_array()?;
    Some(
        items
            .iter()
            .filter_map(|v| v.as_str())
            .map(str::to_string)
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn swagger2_spec_reads_security_definitions() {
        let spec = json!({
            "swagger": "2.0",
            "consumes": ["application/json"],
            "security": [{"api_key": []}],
            "securityDefinitions": {
                "api_key": {"type": "apiKey", "name": "X-Key", "in": "header"},
                "basic": {"type": "basic"},
                "petstore_auth": {"type": "oauth2", "flow": "implicit"}
            },
            "components": {"securitySchemes": {"ignored": {"type": "http", "scheme": "bearer"}}}
        });

        let spec = Spec::from_value(Dialect::Swagger2, &spec);
        assert_eq!(spec.consumes, Some(vec!["application/json".to_string()]));
        assert_eq!(spec.security.as_ref().unwrap().len(), 1);
        assert_eq!(spec.security_schemes.len(), 3);
        assert_eq!(
            spec.security_scheme("api_key"),
            Some(&SecurityScheme::ApiKey {
                name: Some("X-Key".into()),
                location: Some("header".into())
            })
        );
        assert_eq!(spec.security_scheme("basic"), Some(&SecurityScheme::Basic));
        assert!(spec.security_scheme("ignored").is_none());
    }

    #[test]
    fn oas3_spec_reads_components_security_schemes() {
        let spec = json!({
            "openapi": "3.0.0",
            "components": {
                "securitySchemes": {
                    "bearer": {"type": "http", "scheme": "bearer"},
                    "oidc": {"type": "openIdConnect", "openIdConnectUrl": "https://x"}
                }
            }
        });

        let spec = Spec::from_value(Dialect::OpenApi3, &spec);
        assert!(spec.security.is_none());
        assert_eq!(
            spec.security_scheme("bearer"),
            Some(&SecurityScheme::Http {
                scheme: Some("bearer".into())
            })
        );
        assert_eq!(
            spec.security_scheme("oidc"),
            Some(&SecurityScheme::Other("openIdConnect".into()))
        );
    }

    #[test]
    fn scheme_without_type_is_skipped() {
        let spec = json!({"securityDefinitions": {"broken": {"name": "x"}}});
        let spec = Spec::from_value(Dialect::Swagger2, &spec);
        assert!(spec.security_schemes.is_empty());
    }

    #[test]
    fn operation_distinguishes_absent_and_empty_security() {
        let absent = Operation::from_value(&json!({}));
        assert!(absent.security.is_none());

        let empty = Operation::from_value(&json!({"security": []}));
        assert_eq!(empty.security, Some(Vec::new()));
    }

    #[test]
    fn operation_keeps_requirement_and_scheme_order() {
        let op = Operation::from_value(&json!({
            "security": [
                {"zeta": [], "alpha": ["read", "write"]},
                {"mid": []}
            ]
        }));
        let security = op.security.unwrap();
        let first: Vec<&String> = security[0].keys().collect();
        assert_eq!(first, ["zeta", "alpha"]);
        assert_eq!(security[0]["alpha"], vec!["read", "write"]);
        assert!(security[1].contains_key("mid"));
    }

    #[test]
    fn operation_keeps_media_type_declaration_order() {
        let op = Operation::from_value(&json!({
            "requestBody": {
                "content": {
                    "application/xml": {"schema": {}},
                    "application/json": {"schema": {}}
                }
            }
        }));
        assert_eq!(
            op.request_body_media_types,
            vec!["application/xml", "application/json"]
        );
        assert!(op.declares_media_type("application/json"));
        assert!(!op.declares_media_type("text/plain"));
    }

    #[test]
    fn operation_reads_swagger2_parameters_and_consumes() {
        let op = Operation::from_value(&json!({
            "consumes": ["application/xml"],
            "parameters": [
                {"name": "upload", "in": "formData", "type": "file"},
                {"name": "id", "in": "path", "type": "string"},
                {"in": "query"}
            ]
        }));
        assert_eq!(op.consumes, Some(vec!["application/xml".to_string()]));
        assert_eq!(op.parameters.len(), 2);
        assert_eq!(op.parameters[0].location, "formData");
        assert_eq!(op.parameters[0].param_type.as_deref(), Some("file"));
    }
}
