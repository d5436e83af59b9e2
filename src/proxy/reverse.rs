//! Streaming-aware reverse proxy

use crate::handlers::Handler;
use crate::models::ClientAddr;
use crate::proxy::http_client::BackendClient;
use crate::proxy::streaming::disable_buffering_for_event_stream;
use crate::sink::ResponseSink;
use crate::utils::{build_target_uri, header_str, strip_hop_by_hop_headers};
use crate::{log_warning, Error, Result};
use async_trait::async_trait;
use futures::StreamExt;
use hyper::header::{HeaderName, HeaderValue, HOST};
use hyper::{Body, Request, StatusCode};
use tracing::debug;
use url::Url;

const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");

/// Forwards requests to a single backend origin and relays the response as
/// it arrives
pub struct ReverseProxy {
    target: Url,
    client: BackendClient,
}

impl ReverseProxy {
    pub fn new(target: Url, client: BackendClient) -> Self {
        Self { target, client }
    }

    pub fn target(&self) -> &Url {
        &self.target
    }

    /// Rewrite an inbound request for the backend
    fn outbound_request(&self, req: Request<Body>) -> Result<Request<Body>> {
        let (parts, body) = req.into_parts();
        let uri = build_target_uri(&self.target, &parts.uri)?;

        let mut headers = parts.headers;
        strip_hop_by_hop_headers(&mut headers);
        headers.remove(HOST);

        if let Some(ClientAddr(addr)) = parts.extensions.get::<ClientAddr>().copied() {
            let client_ip = addr.ip().to_string();
            let value = match header_str(&headers, X_FORWARDED_FOR) {
                Some(prior) => format!("{}, {}", prior, client_ip),
                None => client_ip,
            };
            if let Ok(value) = HeaderValue::from_str(&value) {
                headers.insert(X_FORWARDED_FOR, value);
            }
        }

        let mut outbound = Request::builder().method(parts.method).uri(uri).body(body)?;
        *outbound.headers_mut() = headers;
        Ok(outbound)
    }
}

#[async_trait]
impl Handler for ReverseProxy {
    async fn serve(&self, req: Request<Body>, sink: &mut dyn ResponseSink) -> Result<()> {
        let request_line = format!("{} {}", req.method(), req.uri().path());

        let outbound = match self.outbound_request(req) {
            Ok(outbound) => outbound,
            Err(e) => {
                log_warning!("Cannot build backend request for {}: {}", request_line, e);
                sink.set_status(StatusCode::BAD_GATEWAY);
                return Ok(());
            }
        };
        debug!("Proxying {} to {}", request_line, outbound.uri());

        let response = tokio::select! {
            response = self.client.request(outbound) => response,
            _ = sink.closed() => {
                return Err(Error::Cancelled(format!("{} abandoned while waiting for backend", request_line)));
            }
        };

        let response = match response {
            Ok(response) => response,
            Err(e) => {
                log_warning!("Backend {} unreachable for {}: {}", self.target, request_line, e);
                sink.set_status(StatusCode::BAD_GATEWAY);
                return Ok(());
            }
        };

        let (mut parts, mut body) = response.into_parts();
        strip_hop_by_hop_headers(&mut parts.headers);
        let event_stream = disable_buffering_for_event_stream(&mut parts.headers);

        let headers = sink.headers_mut();
        for (name, value) in parts.headers.iter() {
            headers.append(name.clone(), value.clone());
        }
        sink.set_status(parts.status);

        if event_stream {
            debug!("Relaying event stream for {} without buffering", request_line);
            sink.flush().await?;
        }

        loop {
            let chunk = tokio::select! {
                chunk = body.next() => chunk,
                _ = sink.closed() => {
                    return Err(Error::Cancelled(format!("{} abandoned mid-response", request_line)));
                }
            };
            let Some(chunk) = chunk else {
                break;
            };
            let chunk = chunk.map_err(|e| {
                Error::UpstreamConnection(format!("{} body interrupted: {}", request_line, e))
            })?;
            sink.write_all(chunk).await?;
        }

        Ok(())
    }
}
