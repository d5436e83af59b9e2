//! Loopback backend used by proxy tests

use bytes::Bytes;
use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Request, Response, Server, StatusCode};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

/// Handle to a running test backend
pub struct TestBackend {
    pub addr: SocketAddr,
    hits: Arc<AtomicUsize>,
}

impl TestBackend {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

/// Start a backend on an ephemeral port.
///
/// `/v1/models` answers JSON, `/v1/chat/completions` streams two SSE events;
/// the second is held back until `release` fires when one is given. Any other
/// path echoes request details as plain text.
pub fn spawn_backend(release: Option<oneshot::Receiver<()>>) -> TestBackend {
    spawn(release, false)
}

/// Like [`spawn_backend`], but the event-stream head goes out at once and
/// even the first event waits for `release`
pub fn spawn_slow_start_backend(release: oneshot::Receiver<()>) -> TestBackend {
    spawn(Some(release), true)
}

fn spawn(release: Option<oneshot::Receiver<()>>, hold_first: bool) -> TestBackend {
    let hits = Arc::new(AtomicUsize::new(0));
    let release = Arc::new(Mutex::new(release));

    let service_hits = Arc::clone(&hits);
    let make_svc = make_service_fn(move |_conn| {
        let hits = Arc::clone(&service_hits);
        let release = Arc::clone(&release);
        async move {
            Ok::<_, Infallible>(service_fn(move |req: Request<Body>| {
                hits.fetch_add(1, Ordering::SeqCst);
                let release = release.lock().unwrap().take();
                async move { Ok::<_, Infallible>(respond(req, release, hold_first)) }
            }))
        }
    });

    let server = Server::bind(&SocketAddr::from(([127, 0, 0, 1], 0))).serve(make_svc);
    let addr = server.local_addr();
    tokio::spawn(server);

    TestBackend { addr, hits }
}

fn respond(
    req: Request<Body>,
    release: Option<oneshot::Receiver<()>>,
    hold_first: bool,
) -> Response<Body> {
    match req.uri().path() {
        "/v1/models" => Response::builder()
            .header("content-type", "application/json")
            .body(Body::from(r#"{"object":"list","data":[]}"#))
            .unwrap(),
        "/v1/chat/completions" => {
            let (mut sender, body) = Body::channel();
            tokio::spawn(async move {
                let mut release = release;
                if hold_first {
                    if let Some(release) = release.take() {
                        let _ = release.await;
                    }
                }
                let _ = sender.send_data(Bytes::from_static(b"data: one\n\n")).await;
                if let Some(release) = release {
                    let _ = release.await;
                }
                let _ = sender.send_data(Bytes::from_static(b"data: two\n\n")).await;
            });
            Response::builder()
                .header("content-type", "text/event-stream")
                .header("cache-control", "max-age=60")
                .body(body)
                .unwrap()
        }
        _ => {
            let forwarded = req
                .headers()
                .get("x-forwarded-for")
                .and_then(|v| v.to_str().ok())
                .unwrap_or("-")
                .to_string();
            let host = req
                .headers()
                .get("host")
                .and_then(|v| v.to_str().ok())
                .unwrap_or("-")
                .to_string();
            Response::builder()
                .status(StatusCode::IM_A_TEAPOT)
                .header("content-type", "text/plain")
                .body(Body::from(format!(
                    "{} {} xff={} host={}",
                    req.method(),
                    req.uri(),
                    forwarded,
                    host
                )))
                .unwrap()
        }
    }
}
