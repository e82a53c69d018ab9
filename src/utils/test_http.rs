// src/utils/test_http.rs
//! Throwaway local HTTP servers for exercising the live clients in tests.
use axum::{http::StatusCode, Router};

/// Serves `router` on an ephemeral localhost port and returns its base URL.
pub async fn serve_router(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

/// A server answering every request with `status` and an empty body.
pub async fn serve_status(status: StatusCode) -> String {
    serve_router(Router::new().fallback(move || async move { status })).await
}
