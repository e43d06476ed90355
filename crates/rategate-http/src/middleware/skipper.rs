//! Bypass predicates for the rate gate.

use std::sync::Arc;

use axum::extract::Request;

/// Returns true when a request should skip the rate gate entirely.
pub type Skipper = Arc<dyn Fn(&Request) -> bool + Send + Sync>;

/// Skips requests whose path starts with any of `prefixes`.
pub fn path_prefix_skipper(prefixes: Vec<String>) -> Skipper {
    Arc::new(move |req: &Request| {
        let path = req.uri().path();
        prefixes.iter().any(|p| path.starts_with(p.as_str()))
    })
}

#[cfg(test)]
mod tests {
    use axum::body::Body;

    use super::*;

    fn req(path: &str) -> Request {
        axum::http::Request::builder()
            .uri(path)
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn matches_prefix_only() {
        let skip = path_prefix_skipper(vec!["/api/v1/pub/".to_owned(), "/health".to_owned()]);
        assert!(skip(&req("/api/v1/pub/login")));
        assert!(skip(&req("/health")));
        assert!(!skip(&req("/api/v1/users")));
        assert!(!skip(&req("/api/v1/pub")));
    }
}
