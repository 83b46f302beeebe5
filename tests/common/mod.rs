//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;

use page_engine::{Engine, EngineConfig, HttpServer, Shutdown};

/// A throwaway site instance on disk: route configs, templates, data files.
pub struct TestInstance {
    dir: tempfile::TempDir,
}

impl TestInstance {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("config/routes")).unwrap();
        std::fs::create_dir_all(dir.path().join("templates")).unwrap();
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn write_route(&self, name: &str, body: &str) {
        std::fs::write(self.dir.path().join("config/routes").join(name), body).unwrap();
    }

    pub fn write_template(&self, name: &str, body: &str) {
        std::fs::write(self.dir.path().join("templates").join(name), body).unwrap();
    }

    /// Write a data file at a path relative to the instance root.
    pub fn write_file(&self, relative: &str, body: &str) {
        let path = self.dir.path().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, body).unwrap();
    }

    pub fn config(&self) -> EngineConfig {
        let mut config = EngineConfig::default();
        config.instance_path = self.dir.path().to_path_buf();
        config
    }
}

/// An engine server bound to an ephemeral loopback port, torn down when
/// dropped.
pub struct TestServer {
    pub addr: SocketAddr,
    shutdown: Arc<Shutdown>,
    _instance: TestInstance,
}

impl TestServer {
    pub async fn start(instance: TestInstance, debug: bool) -> Self {
        let mut config = instance.config();
        config.debug = debug;

        let engine = Arc::new(Engine::new(config).unwrap());
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let shutdown = Arc::new(Shutdown::new());
        let server = HttpServer::new(engine);
        tokio::spawn({
            let shutdown = shutdown.clone();
            async move {
                let _ = server.run(listener, shutdown).await;
            }
        });

        // Give the accept loop a moment to come up.
        tokio::time::sleep(Duration::from_millis(20)).await;

        Self {
            addr,
            shutdown,
            _instance: instance,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Start a programmable mock upstream on an ephemeral port and return its
/// address. The closure decides status, content type, and body per request.
pub async fn start_upstream<F, Fut>(f: F) -> SocketAddr
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, &'static str, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        let (status, content_type, body) = f().await;
                        let status_text = match status {
                            200 => "200 OK",
                            404 => "404 Not Found",
                            500 => "500 Internal Server Error",
                            502 => "502 Bad Gateway",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };
                        let response_str = format!(
                            "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            content_type,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}
