//! Swagger 2.0 request building.

use tracing::debug;

use super::{effective_security, materialize, token_type, BuildContext, SpecDialect};
use crate::credential::CredentialValue;
use crate::request::{Parameter, Request};
use crate::spec::SecurityScheme;

/// Swagger 2 keeps basic and OAuth2 credentials under a lower-cased
/// `authorization` header.
const AUTHORIZATION: &str = "authorization";

/// Request building for Swagger 2.0 documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct Swagger2Builder;

impl SpecDialect for Swagger2Builder {
    fn apply_securities(&self, request: &Request, ctx: &BuildContext<'_>) -> Request {
        let mut result = materialize(request);
        let Some(security) = effective_security(
            ctx.operation,
            ctx.securities.spec_security.as_ref(),
            ctx.securities,
        ) else {
            return result;
        };

        for group in security {
            for key in group.keys() {
                let Some(auth) = ctx.securities.get(key) else {
                    continue;
                };
                let Some(scheme) = ctx.spec.security_scheme(key) else {
                    debug!(scheme = %key, "no security definition for authorized scheme");
                    continue;
                };

                match (scheme, &auth.value) {
                    (SecurityScheme::ApiKey { name, location }, CredentialValue::Text(value)) => {
                        let Some(name) = auth.name.as_ref().or(name.as_ref()) else {
                            debug!(scheme = %key, "apiKey scheme without a name");
                            continue;
                        };
                        let location = auth.location.as_deref().or(location.as_deref());
                        if location == Some("query") {
                            result
                                .query
                                .get_or_insert_with(Default::default)
                                .insert(name.clone(), Parameter::from(value.clone()));
                        } else {
                            result.headers.insert(name.clone(), value.clone());
                        }
                    }
                    (SecurityScheme::Basic, CredentialValue::Basic(basic)) => {
                        let header = basic
                            .header
                            .clone()
                            .unwrap_or_else(|| format!("Basic {}", basic.encoded()));
                        result.headers.insert(AUTHORIZATION.to_string(), header);
                    }
                    (
                        SecurityScheme::OAuth2,
                        CredentialValue::Token {
                            access_token: Some(access_token),
                            token_type: declared,
                        },
                    ) if !access_token.is_empty() => {
                        let header = format!("{} {access_token}", token_type(declared.as_deref()));
                        result.headers.insert(AUTHORIZATION.to_string(), header);
                    }
                    _ => debug!(scheme = %key, "credential does not apply to scheme"),
                }
            }
        }

        result
    }

    fn assemble_body(&self, mut request: Request, ctx: &BuildContext<'_>) -> Request {
        if request.body.is_none() && request.form.is_none() {
            return request;
        }

        let operation = ctx.operation;
        let content_type = if let Some(explicit) = ctx.explicit_content_type() {
            Some(explicit.to_string())
        } else if let Some(consumes) = &operation.consumes {
            consumes.first().cloned()
        } else if let Some(consumes) = &ctx.spec.consumes {
            consumes.first().cloned()
        } else if operation
            .parameters
            .iter()
            .any(|p| p.param_type.as_deref() == Some("file"))
        {
            Some("multipart/form-data".to_string())
        } else if operation.parameters.iter().any(|p| p.location == "formData") {
            Some("application/x-www-form-urlencoded".to_string())
        } else {
            None
        };

        if let Some(content_type) = content_type {
            request.set_content_type(content_type);
        }
        request
    }
}
