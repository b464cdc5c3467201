use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use mime_guess::mime::{self, Mime};

use crate::error::AppError;

/// Content negotiation guard.
/// Rejects with 406 unless the `Accept` header admits `media`.
///
/// Install with `axum::middleware::from_fn_with_state(mime::APPLICATION_JSON, accept)`.
pub async fn accept(
    State(media): State<Mime>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if !accepts(request.headers(), &media) {
        tracing::debug!("Rejecting request: client does not accept {}", media);
        return Err(AppError::NotAcceptable(media));
    }

    Ok(next.run(request).await)
}

/// Body type guard.
/// Rejects with 415 unless the `Content-Type` essence equals `media`.
pub async fn require(
    State(media): State<Mime>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if !has_content_type(request.headers(), &media) {
        tracing::debug!("Rejecting request: body is not {}", media);
        return Err(AppError::UnsupportedMediaType(media));
    }

    Ok(next.run(request).await)
}

/// Whether the `Accept` header admits `media`. No header accepts anything.
pub fn accepts(headers: &HeaderMap, media: &Mime) -> bool {
    let values: Vec<&str> = headers
        .get_all(header::ACCEPT)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .collect();

    if values.is_empty() {
        return true;
    }

    values
        .iter()
        .flat_map(|v| v.split(','))
        .filter_map(|range| range.trim().parse::<Mime>().ok())
        .filter(|range| !refused(range))
        .any(|range| matches_range(&range, media))
}

/// `q=0` marks a range as not acceptable
fn refused(range: &Mime) -> bool {
    range
        .get_param("q")
        .and_then(|q| q.as_str().parse::<f32>().ok())
        .map(|q| q <= 0.0)
        .unwrap_or(false)
}

fn matches_range(range: &Mime, media: &Mime) -> bool {
    let type_ok = range.type_() == mime::STAR || range.type_() == media.type_();
    let subtype_ok = range.subtype() == mime::STAR || range.subtype() == media.subtype();
    type_ok && subtype_ok
}

/// Whether `Content-Type` names `media`, ignoring parameters such as
/// `charset` or `boundary`.
pub fn has_content_type(headers: &HeaderMap, media: &Mime) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<Mime>().ok())
        .map(|ct| ct.essence_str() == media.essence_str())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn with(name: header::HeaderName, value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(name, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn missing_accept_accepts_anything() {
        assert!(accepts(&HeaderMap::new(), &mime::APPLICATION_JSON));
    }

    #[test]
    fn accept_ranges() {
        let json = mime::APPLICATION_JSON;
        assert!(accepts(&with(header::ACCEPT, "application/json"), &json));
        assert!(accepts(&with(header::ACCEPT, "*/*"), &json));
        assert!(accepts(&with(header::ACCEPT, "application/*"), &json));
        assert!(accepts(
            &with(header::ACCEPT, "text/html, application/json;q=0.9"),
            &json
        ));
        assert!(!accepts(&with(header::ACCEPT, "text/html"), &json));
        assert!(!accepts(&with(header::ACCEPT, "text/*"), &json));
        assert!(!accepts(&with(header::ACCEPT, "application/json;q=0"), &json));
        assert!(!accepts(&with(header::ACCEPT, "garbage"), &json));
    }

    #[test]
    fn content_type_ignores_parameters() {
        assert!(has_content_type(
            &with(header::CONTENT_TYPE, "application/json; charset=utf-8"),
            &mime::APPLICATION_JSON
        ));
        assert!(has_content_type(
            &with(header::CONTENT_TYPE, "multipart/form-data; boundary=xyz"),
            &mime::MULTIPART_FORM_DATA
        ));
        assert!(!has_content_type(
            &with(header::CONTENT_TYPE, "text/plain"),
            &mime::APPLICATION_JSON
        ));
        assert!(!has_content_type(&HeaderMap::new(), &mime::APPLICATION_JSON));
    }
}
