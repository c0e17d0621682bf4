//! Query/form finalization
//!
//! Folds the structured `query` map into the URL and the `form` map into the
//! body. Runs once, immediately before the request is sent.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::format::{encode_form_or_query, format_value, Formatted};
use crate::request::{Body, MultipartValue, Request};

static MULTIPART: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)multipart/form-data").expect("multipart regex is valid"));

/// Whether a content type names a multipart form body.
pub fn is_multipart(content_type: Option<&str>) -> bool {
    content_type.is_some_and(|ct| MULTIPART.is_match(ct))
}

/// Merge `query` into `url` and `form` into `body`, removing both maps.
pub fn merge_in_query_or_form(mut req: Request) -> Request {
    if let Some(form) = req.form.take() {
        let has_file = form.values().any(|p| p.is_file());
        if has_file || is_multipart(req.content_type()) {
            let mut parts = Vec::with_capacity(form.len());
            for (name, param) in &form {
                match format_value(param, true) {
                    Formatted::Absent => {}
                    Formatted::Text(v) => parts.push((name.clone(), MultipartValue::Text(v))),
                    Formatted::Bool(b) => {
                        parts.push((name.clone(), MultipartValue::Text(b.to_string())))
                    }
                    Formatted::Multi(values) => parts.extend(
                        values
                            .into_iter()
                            .map(|v| (name.clone(), MultipartValue::Text(v))),
                    ),
                    Formatted::File(file) => parts.push((name.clone(), MultipartValue::File(file))),
                }
            }
            req.body = Some(Body::Multipart(parts));
        } else {
            req.body = Some(Body::Text(encode_form_or_query(&form)));
        }
    }

    if let Some(query) = req.query.take() {
        let (base, original_search) = match req.url.split_once('?') {
            Some((base, search)) => (base.to_string(), Some(search.to_string())),
            None => (req.url.clone(), None),
        };

        let kept = original_search
            .map(|search| {
                url::form_urlencoded::parse(search.as_bytes())
                    .filter(|(k, _)| !query.contains_key(&**k))
                    .map(|(k, v)| format!("{}={}", urlencoding::encode(&k), urlencoding::encode(&v)))
                    .collect::<Vec<_>>()
                    .join("&")
            })
            .unwrap_or_default();

        let encoded = encode_form_or_query(&query);
        req.url = base + &join_search(&[kept.as_str(), encoded.as_str()]);
    }

    req
}

fn join_search(parts: &[&str]) -> String {
    let search = parts
        .iter()
        .filter(|s| !s.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("&");
    if search.is_empty() {
        search
    } else {
        format!("?{search}")
    }
}
