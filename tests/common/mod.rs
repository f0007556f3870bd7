//! Minimal HTTP/1.1 server for driving the crawler against canned pages.

#![allow(dead_code)]

use reqwest::Url;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

#[derive(Debug, Clone)]
pub struct Route {
    pub status: u16,
    pub body: Vec<u8>,
    pub content_type: &'static str,
    /// Send a `Content-Length` header
    pub content_length: bool,
    /// Number of separate writes the body is split into
    pub chunks: usize,
    /// Bytes promised in `Content-Length` but never sent
    pub missing_bytes: usize,
}

impl Route {
    pub fn html(body: &str) -> Self {
        Self {
            status: 200,
            body: body.as_bytes().to_vec(),
            content_type: "text/html; charset=utf-8",
            content_length: true,
            chunks: 1,
            missing_bytes: 0,
        }
    }

    pub fn bytes(body: &[u8]) -> Self {
        Self {
            status: 200,
            body: body.to_vec(),
            content_type: "application/octet-stream",
            content_length: true,
            chunks: 1,
            missing_bytes: 0,
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            body: b"error".to_vec(),
            content_type: "text/plain",
            content_length: true,
            chunks: 1,
            missing_bytes: 0,
        }
    }

    pub fn without_length(mut self) -> Self {
        self.content_length = false;
        self
    }

    /// Close the connection before the advertised length was sent
    pub fn truncated(mut self, missing_bytes: usize) -> Self {
        self.missing_bytes = missing_bytes;
        self
    }

    pub fn in_chunks(mut self, chunks: usize) -> Self {
        self.chunks = chunks.max(1);
        self
    }
}

pub struct TestServer {
    base: Url,
    hits: Arc<Mutex<HashMap<String, usize>>>,
    handle: JoinHandle<()>,
}

impl TestServer {
    /// Serve `routes`, keyed by request target (path plus query)
    pub async fn start(routes: HashMap<String, Route>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let base = Url::parse(&format!("http://{}/", addr)).unwrap();

        let routes = Arc::new(routes);
        let hits = Arc::new(Mutex::new(HashMap::new()));

        let handle = {
            let hits = Arc::clone(&hits);
            tokio::spawn(async move {
                loop {
                    let Ok((stream, _)) = listener.accept().await else {
                        break;
                    };
                    let routes = Arc::clone(&routes);
                    let hits = Arc::clone(&hits);
                    tokio::spawn(async move {
                        let _ = serve(stream, &routes, &hits).await;
                    });
                }
            })
        };

        Self { base, hits, handle }
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    pub fn url(&self, target: &str) -> Url {
        self.base.join(target).unwrap()
    }

    pub fn hits(&self, target: &str) -> usize {
        self.hits.lock().unwrap().get(target).copied().unwrap_or(0)
    }

    /// Requests whose target starts with `prefix`
    pub fn hits_with_prefix(&self, prefix: &str) -> usize {
        self.hits
            .lock()
            .unwrap()
            .iter()
            .filter(|(target, _)| target.starts_with(prefix))
            .map(|(_, count)| count)
            .sum()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn serve(
    mut stream: TcpStream,
    routes: &HashMap<String, Route>,
    hits: &Mutex<HashMap<String, usize>>,
) -> std::io::Result<()> {
    let mut request = Vec::new();
    let mut buf = [0u8; 1024];
    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = stream.read(&mut buf).await?;
        if n == 0 {
            return Ok(());
        }
        request.extend_from_slice(&buf[..n]);
    }

    let request = String::from_utf8_lossy(&request);
    let target = request
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or("/")
        .to_string();

    *hits.lock().unwrap().entry(target.clone()).or_insert(0) += 1;

    let route = routes
        .get(&target)
        .cloned()
        .unwrap_or_else(|| Route::status(404));

    let mut head = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nConnection: close\r\n",
        route.status,
        reason(route.status),
        route.content_type
    );
    if route.content_length {
        head.push_str(&format!(
            "Content-Length: {}\r\n",
            route.body.len() + route.missing_bytes
        ));
    }
    head.push_str("\r\n");
    stream.write_all(head.as_bytes()).await?;

    let chunk_size = route.body.len().div_ceil(route.chunks).max(1);
    for chunk in route.body.chunks(chunk_size) {
        stream.write_all(chunk).await?;
        stream.flush().await?;
        if route.chunks > 1 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    stream.shutdown().await
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        404 => "Not Found",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}
