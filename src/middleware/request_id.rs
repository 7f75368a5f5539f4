use axum::{
    body::Body,
    extract::Request,
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

/// HTTP header carrying the request ID
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest caller-supplied request ID that is propagated as-is
const MAX_REQUEST_ID_LEN: usize = 128;

/// Request ID stored in the request extensions
///
/// Upstream proxies and clients may send their own IDs, which are kept so that
/// log lines can be joined across services.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestId(String);

impl RequestId {
    /// Creates a new random request ID
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Accepts a caller-supplied ID if it is short, non-empty, printable ASCII
    pub fn from_header(value: &HeaderValue) -> Option<Self> {
        let value = value.to_str().ok()?.trim();
        let valid = !value.is_empty()
            && value.len() <= MAX_REQUEST_ID_LEN
            && value.chars().all(|c| c.is_ascii_graphic());
        valid.then(|| Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Attaches a request ID to the request extensions and echoes it in the response
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(RequestId::from_header)
        .unwrap_or_else(RequestId::generate);

    request.extensions_mut().insert(request_id.clone());

    let mut response = next.run(request).await;

    if let Ok(header_value) = HeaderValue::from_str(request_id.as_str()) {
        response
            .headers_mut()
            .insert(REQUEST_ID_HEADER, header_value);
    }

    response
}

/// Tracing span for a request, tagged with its request ID
pub fn make_span_with_request_id(request: &Request<Body>) -> tracing::Span {
    let request_id = request
        .extensions()
        .get::<RequestId>()
        .map_or("unknown", RequestId::as_str);

    tracing::info_span!(
        "http_request",
        method = %request.method(),
        uri = %request.uri(),
        request_id = %request_id,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caller_request_id_is_kept() {
        let header = HeaderValue::from_static("edge-7f3a-0001");

        assert_eq!(
            RequestId::from_header(&header).unwrap().as_str(),
            "edge-7f3a-0001"
        );
    }

    #[test]
    fn test_unusable_request_ids_are_rejected() {
        assert!(RequestId::from_header(&HeaderValue::from_static("  ")).is_none());
        assert!(RequestId::from_header(&HeaderValue::from_static("has space")).is_none());

        let too_long = "a".repeat(MAX_REQUEST_ID_LEN + 1);
        assert!(RequestId::from_header(&HeaderValue::from_str(&too_long).unwrap()).is_none());
    }

    #[test]
    fn test_generated_request_id_is_uuid() {
        let id = RequestId::generate();

        assert!(Uuid::parse_str(id.as_str()).is_ok());
    }
}
