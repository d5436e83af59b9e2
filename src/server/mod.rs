//! HTTP server bridging hyper connections to a [`Handler`]

use crate::handlers::Handler;
use crate::models::ClientAddr;
use crate::sink::HyperSink;
use crate::{log_debug, log_error, log_info, Error, Result};
use hyper::server::conn::AddrStream;
use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Request, Response, Server, StatusCode};
use std::convert::Infallible;
use std::future::Future;
use std::net::{SocketAddr, TcpListener};
use std::sync::Arc;
use tracing::{debug, error, info};

/// A bound listener waiting to serve a handler
pub struct HttpServer {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl HttpServer {
    /// Bind to `addr`. Port 0 picks an ephemeral port, see [`local_addr`](Self::local_addr).
    pub fn bind(addr: SocketAddr) -> Result<Self> {
        let listener = TcpListener::bind(addr)?;
        listener.set_nonblocking(true)?;
        let local_addr = listener.local_addr()?;
        Ok(Self {
            listener,
            local_addr,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Serve until the process ends
    pub async fn serve(self, handler: Arc<dyn Handler>) -> Result<()> {
        self.serve_with_shutdown(handler, std::future::pending()).await
    }

    /// Serve until `shutdown` resolves, then drain in-flight connections
    pub async fn serve_with_shutdown<F>(self, handler: Arc<dyn Handler>, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        info!("Listening on {}", self.local_addr);
        log_info!("Server bound to {}, waiting for connections", self.local_addr);

        let make_svc = make_service_fn(move |conn: &AddrStream| {
            let remote_addr = conn.remote_addr();
            let handler = Arc::clone(&handler);
            debug!("New connection from: {}", remote_addr);

            async move {
                Ok::<_, Infallible>(service_fn(move |req| {
                    dispatch(Arc::clone(&handler), req, remote_addr)
                }))
            }
        });

        let server = Server::from_tcp(self.listener)?
            .serve(make_svc)
            .with_graceful_shutdown(shutdown);

        if let Err(e) = server.await {
            error!("Server error: {}", e);
            log_error!("Server error: {}", e);
            return Err(Error::Http(e));
        }

        log_info!("Server on {} shut down", self.local_addr);
        Ok(())
    }
}

/// Run `handler` for one request and hand its response head back to hyper.
///
/// The handler runs on its own task so the head can be returned while the
/// body is still being produced.
pub async fn dispatch(
    handler: Arc<dyn Handler>,
    mut req: Request<Body>,
    remote_addr: SocketAddr,
) -> std::result::Result<Response<Body>, Infallible> {
    req.extensions_mut().insert(ClientAddr(remote_addr));
    let request_line = format!("{} {}", req.method(), req.uri().path());

    let (mut sink, head) = HyperSink::new();
    let task_line = request_line.clone();
    tokio::spawn(async move {
        match handler.serve(req, &mut sink).await {
            Ok(()) => sink.finish(),
            Err(e) => {
                log_debug!("Handler for {} ended with error: {}", task_line, e);
                sink.abort();
            }
        }
    });

    match head.await {
        Ok(response) => Ok(response),
        Err(_) => {
            log_error!("Handler for {} ended without a response", request_line);
            let mut response = Response::new(Body::empty());
            *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            Ok(response)
        }
    }
}
