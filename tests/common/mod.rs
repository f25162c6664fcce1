//! Shared harness: a local upstream target and a proxy pointed at it.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{any, get};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use url::Url;

use cors_proxy::config::ProxyConfig;
use cors_proxy::server::{self, AppState};

#[derive(Debug, Serialize, Deserialize)]
pub struct Echo {
    pub method: String,
    pub headers: BTreeMap<String, Vec<String>>,
    pub body: String,
    pub query: Option<String>,
}

pub struct Upstream {
    pub addr: SocketAddr,
    pub hits: Arc<AtomicUsize>,
    shutdown: tokio::sync::oneshot::Sender<()>,
}

impl Upstream {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn stop(self) {
        let _ = self.shutdown.send(());
    }
}

async fn echo(
    State(hits): State<Arc<AtomicUsize>>,
    method: Method,
    uri: axum::http::Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Json<Echo> {
    hits.fetch_add(1, Ordering::SeqCst);
    let mut map: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (name, value) in &headers {
        map.entry(name.to_string())
            .or_default()
            .push(value.to_str().unwrap_or_default().to_string());
    }
    Json(Echo {
        method: method.to_string(),
        headers: map,
        body: String::from_utf8_lossy(&body).into_owned(),
        query: uri.query().map(String::from),
    })
}

pub async fn start_upstream() -> Upstream {
    let hits = Arc::new(AtomicUsize::new(0));

    let router = Router::new()
        .route("/echo", any(echo))
        .route(
            "/redirect",
            get(|| async {
                (
                    StatusCode::FOUND,
                    [("location", "https://example.com/next")],
                    "moved",
                )
            }),
        )
        .route(
            "/redirect-local",
            get(|| async { (StatusCode::FOUND, [("location", "/echo?from=redirect")]) }),
        )
        .route(
            "/restricted",
            get(|| async {
                (
                    [
                        ("access-control-allow-origin", "https://only.example"),
                        ("content-type", "text/plain"),
                    ],
                    "restricted body",
                )
                    .into_response()
            }),
        )
        .route(
            "/hang",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                "too late"
            }),
        )
        .with_state(Arc::clone(&hits));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
            .unwrap();
    });

    Upstream {
        addr,
        hits,
        shutdown: shutdown_tx,
    }
}

/// Raw upstream that sends headers promising 100 bytes, writes a few, then
/// goes silent while holding the connection open.
pub async fn start_stalling_upstream() -> SocketAddr {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;
                let _ = socket
                    .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 100\r\n\r\npartial")
                    .await;
                let _ = socket.flush().await;
                tokio::time::sleep(Duration::from_secs(3600)).await;
                drop(socket);
            });
        }
    });

    addr
}

pub struct Proxy {
    pub addr: SocketAddr,
    shutdown: tokio::sync::oneshot::Sender<()>,
}

impl Proxy {
    pub fn base(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Proxy URL with the given query pairs, properly encoded.
    pub fn with_query(&self, pairs: &[(&str, &str)]) -> String {
        let mut url = Url::parse(&self.base()).unwrap();
        url.query_pairs_mut().extend_pairs(pairs);
        url.to_string()
    }

    pub fn stop(self) {
        let _ = self.shutdown.send(());
    }
}

pub async fn start_proxy() -> Proxy {
    start_proxy_with(|_| {}).await
}

pub async fn start_proxy_with(tweak: impl FnOnce(&mut ProxyConfig)) -> Proxy {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let mut config = ProxyConfig::new(Url::parse(&format!("http://{addr}")).unwrap());
    tweak(&mut config);

    let state = Arc::new(AppState::new(config));
    let router = server::build_router(state, 1_048_576);

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
            .unwrap();
    });

    Proxy {
        addr,
        shutdown: shutdown_tx,
    }
}

/// Client that never follows redirects on its own.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}
