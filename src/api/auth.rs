//! Authentication middleware for the REST API
//!
//! Provides optional API key authentication. When `ApiConfig::api_key` is
//! set, every request must carry the key in the `X-Api-Key` header or, for
//! clients that cannot set headers (browser `EventSource`), in the `api_key`
//! query parameter. Anything else receives 401 Unauthorized.

use crate::error::ApiError;
use axum::{
    Json,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};

/// Header carrying the API key
pub const API_KEY_HEADER: &str = "x-api-key";

/// Query parameter accepted in place of the header
pub const API_KEY_QUERY_PARAM: &str = "api_key";

/// Authentication middleware that checks for a valid API key
///
/// # Examples
///
/// ```no_run
/// use axum::{Router, middleware};
/// use playlist_dl::api::auth::require_api_key;
///
/// let api_key = Some("secret-key-123".to_string());
/// let router: Router = Router::new()
///     .layer(middleware::from_fn_with_state(
///         api_key,
///         require_api_key
///     ));
/// ```
pub async fn require_api_key(
    State(expected_api_key): State<Option<String>>,
    request: Request,
    next: Next,
) -> Response {
    let Some(expected_key) = expected_api_key else {
        return next.run(request).await;
    };

    let provided = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .or_else(|| query_api_key(request.uri().query()));

    match provided {
        Some(provided_key)
            if constant_time_eq(provided_key.as_bytes(), expected_key.as_bytes()) =>
        {
            next.run(request).await
        }
        Some(_) => unauthorized_response("Invalid API key"),
        None => unauthorized_response("Missing X-Api-Key header"),
    }
}

fn query_api_key(query: Option<&str>) -> Option<String> {
    url::form_urlencoded::parse(query?.as_bytes())
        .find(|(key, _)| key == API_KEY_QUERY_PARAM)
        .map(|(_, value)| value.into_owned())
}

/// Constant-time byte comparison to prevent timing side-channel attacks.
/// Always compares all bytes regardless of where the first mismatch occurs.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut result: u8 = 0;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

fn unauthorized_response(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(ApiError::unauthorized(message)),
    )
        .into_response()
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, body::Body, http::Request, middleware, routing::get};
    use tower::ServiceExt; // for oneshot

    async fn test_handler() -> impl IntoResponse {
        (StatusCode::OK, "Success")
    }

    fn app(api_key: Option<&str>) -> Router {
        Router::new()
            .route("/test", get(test_handler))
            .layer(middleware::from_fn_with_state(
                api_key.map(str::to_string),
                require_api_key,
            ))
    }

    async fn body_string(response: Response) -> String {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(body.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_no_api_key_configured() {
        let request = Request::builder().uri("/test").body(Body::empty()).unwrap();

        let response = app(None).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_valid_api_key_header() {
        let request = Request::builder()
            .uri("/test")
            .header("X-Api-Key", "test-secret-key")
            .body(Body::empty())
            .unwrap();

        let response = app(Some("test-secret-key")).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_valid_api_key_query_param() {
        let request = Request::builder()
            .uri("/test?foo=bar&api_key=test%20key")
            .body(Body::empty())
            .unwrap();

        let response = app(Some("test key")).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_invalid_api_key() {
        let request = Request::builder()
            .uri("/test")
            .header("X-Api-Key", "wrong-key")
            .body(Body::empty())
            .unwrap();

        let response = app(Some("correct-key")).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(body_string(response).await.contains("Invalid API key"));
    }

    #[tokio::test]
    async fn test_invalid_api_key_query_param() {
        let request = Request::builder()
            .uri("/test?api_key=wrong")
            .body(Body::empty())
            .unwrap();

        let response = app(Some("correct-key")).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_missing_api_key() {
        let request = Request::builder().uri("/test").body(Body::empty()).unwrap();

        let response = app(Some("required-key")).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body = body_string(response).await;
        assert!(body.contains("Missing X-Api-Key header"));
        assert!(body.contains("\"code\":\"unauthorized\""));
    }

    #[tokio::test]
    async fn test_api_key_case_sensitive() {
        let request = Request::builder()
            .uri("/test")
            .header("X-Api-Key", "casesensitivekey")
            .body(Body::empty())
            .unwrap();

        let response = app(Some("CaseSensitiveKey")).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"abcd"));
    }
}
