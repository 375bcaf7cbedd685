//! Local HTTP server for source, search and mirror tests

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use std::net::SocketAddr;
use tokio::net::TcpListener;

/// Canned response returned for every matching request
#[derive(Clone)]
pub struct ServedResponse {
    pub status: StatusCode,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl ServedResponse {
    pub fn ok(content_type: &'static str, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: StatusCode::OK,
            content_type,
            body: body.into(),
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status: StatusCode::from_u16(status).unwrap(),
            content_type: "text/plain",
            body: Vec::new(),
        }
    }
}

impl IntoResponse for ServedResponse {
    fn into_response(self) -> Response {
        (
            self.status,
            [(header::CONTENT_TYPE, self.content_type)],
            self.body,
        )
            .into_response()
    }
}

/// Serve `response` for every path. Returns the bound address.
pub async fn serve(response: ServedResponse) -> SocketAddr {
    let router = Router::new().fallback(move || {
        let response = response.clone();
        async move { response }
    });
    spawn_router(router).await
}

/// Serve one canned response per path; anything else is 404
pub async fn serve_routes(routes: Vec<(&'static str, ServedResponse)>) -> SocketAddr {
    let mut router = Router::new();
    for (path, response) in routes {
        router = router.route(
            path,
            get(move || {
                let response = response.clone();
                async move { response }
            }),
        );
    }
    spawn_router(router).await
}

async fn spawn_router(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}
