//! OpenAPI 3.x request building.

use indexmap::IndexMap;
use serde_json::Value;
use tracing::debug;

use super::{
    effective_security, materialize, token_type, value_to_body, BuildContext, RequestBody,
    SpecDialect,
};
use crate::credential::CredentialValue;
use crate::request::{Parameter, Request};
use crate::spec::SecurityScheme;

const AUTHORIZATION: &str = "Authorization";
const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// Request building for OpenAPI 3.x documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenApi3Builder;

impl SpecDialect for OpenApi3Builder {
    fn apply_securities(&self, request: &Request, ctx: &BuildContext<'_>) -> Request {
        let mut result = materialize(request);
        let Some(security) =
            effective_security(ctx.operation, ctx.spec.security.as_ref(), ctx.securities)
        else {
            return result;
        };

        for group in security {
            for key in group.keys() {
                let Some(auth) = ctx.securities.get(key) else {
                    continue;
                };
                let Some(scheme) = ctx.spec.security_scheme(key) else {
                    debug!(scheme = %key, "no security scheme for authorized credential");
                    continue;
                };

                match scheme {
                    SecurityScheme::ApiKey { name, location } => {
                        let CredentialValue::Text(value) = &auth.value else {
                            debug!(scheme = %key, "apiKey credential is not a plain value");
                            continue;
                        };
                        let Some(name) = auth.name.as_ref().or(name.as_ref()).cloned() else {
                            debug!(scheme = %key, "apiKey scheme without a name");
                            continue;
                        };
                        match auth.location.as_deref().or(location.as_deref()) {
                            Some("query") => {
                                result
                                    .query
                                    .get_or_insert_with(Default::default)
                                    .insert(name, Parameter::from(value.clone()));
                            }
                            Some("header" | "headers") => {
                                result.headers.insert(name, value.clone());
                            }
                            Some("cookie" | "cookies") => {
                                result.cookies.insert(name, value.clone());
                            }
                            other => {
                                debug!(scheme = %key, location = ?other, "unknown apiKey location")
                            }
                        }
                    }
                    SecurityScheme::Http { scheme } => {
                        let scheme = scheme.as_deref().unwrap_or_default();
                        match &auth.value {
                            CredentialValue::Basic(basic) if scheme.eq_ignore_ascii_case("basic") => {
                                result.headers.insert(
                                    AUTHORIZATION.to_string(),
                                    format!("Basic {}", basic.encoded()),
                                );
                            }
                            CredentialValue::Text(token) if scheme.eq_ignore_ascii_case("bearer") => {
                                result
                                    .headers
                                    .insert(AUTHORIZATION.to_string(), format!("Bearer {token}"));
                            }
                            _ => debug!(scheme = %key, "credential does not match http scheme"),
                        }
                    }
                    SecurityScheme::OAuth2 => {
                        let (access_token, declared) = match &auth.value {
                            CredentialValue::Token {
                                access_token,
                                token_type,
                            } => (access_token.as_deref().unwrap_or_default(), token_type.as_deref()),
                            _ => ("", None),
                        };
                        result.headers.insert(
                            AUTHORIZATION.to_string(),
                            format!("{} {access_token}", token_type(declared)),
                        );
                    }
                    SecurityScheme::Basic | SecurityScheme::Other(_) => {
                        debug!(scheme = %key, "security scheme type not applied")
                    }
                }
            }
        }

        result
    }

    fn assemble_body(&self, mut request: Request, ctx: &BuildContext<'_>) -> Request {
        let Some(body) = ctx.request_body.filter(|b| b.is_present()) else {
            return request;
        };
        let operation = ctx.operation;

        let content_type = match ctx.explicit_content_type() {
            Some(explicit) => {
                if operation.declares_media_type(explicit) {
                    request.set_content_type(explicit);
                }
                Some(explicit.to_string())
            }
            None => {
                let first = operation.request_body_media_types.first().cloned();
                if let Some(first) = &first {
                    request.set_content_type(first.clone());
                }
                first
            }
        };

        let Some(content_type) = content_type else {
            // Nothing declared to check against; attach as given.
            attach_verbatim(&mut request, body);
            return request;
        };

        if !operation.declares_media_type(&content_type) {
            debug!(content_type = %content_type, "request body media type not declared; body dropped");
            return request;
        }

        match body {
            RequestBody::Value(Value::Object(fields)) if content_type == FORM_URLENCODED => {
                request.form = Some(form_fields(
                    fields.iter().map(|(name, value)| (name.clone(), value)),
                ));
            }
            RequestBody::Value(Value::Array(items)) if content_type == FORM_URLENCODED => {
                request.form = Some(form_fields(
                    items.iter().enumerate().map(|(i, value)| (i.to_string(), value)),
                ));
            }
            _ => attach_verbatim(&mut request, body),
        }
        request
    }
}

fn attach_verbatim(request: &mut Request, body: &RequestBody) {
    match body {
        RequestBody::Value(value) => request.body = Some(value_to_body(value)),
        RequestBody::Form(form) => request.form = Some(form.clone()),
    }
}

/// Flatten an object (or an array, keyed by index) into form fields:
/// primitives as-is, arrays comma-joined, anything else JSON-encoded.
fn form_fields<'a>(
    fields: impl Iterator<Item = (String, &'a Value)>,
) -> IndexMap<String, Parameter> {
    fields
        .map(|(name, value)| {
            let value = match value {
                Value::Array(items) => Value::String(
                    items
                        .iter()
                        .map(|item| match item {
                            Value::String(s) => s.clone(),
                            other => other.to_string(),
                        })
                        .collect::<Vec<_>>()
                        .join(","),
                ),
                Value::Object(_) | Value::Null => Value::String(value.to_string()),
                primitive => primitive.clone(),
            };
            (name, Parameter::from(value))
        })
        .collect()
}
