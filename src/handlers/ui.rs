//! Chat UI server routes

use super::{not_found, Handler};
use crate::sink::ResponseSink;
use crate::utils::html_escape;
use crate::Result;
use async_trait::async_trait;
use bytes::Bytes;
use hyper::header::{
    HeaderValue, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN, CACHE_CONTROL, CONTENT_TYPE,
};
use hyper::{Body, Method, Request, StatusCode};
use tracing::debug;
use url::Url;

const CHAT_TEMPLATE: &str = include_str!("../../assets/chat-ui.html");
const API_URL_PLACEHOLDER: &str = "{{API_URL}}";

/// Paths relayed to the backend
pub const PROXIED_PATHS: [&str; 2] = ["/v1/chat/completions", "/v1/models"];

/// A file compiled into the binary
#[derive(Debug, PartialEq, Eq)]
pub struct StaticAsset {
    pub path: &'static str,
    pub content_type: &'static str,
    pub body: &'static [u8],
}

static ASSETS: [StaticAsset; 2] = [
    StaticAsset {
        path: "/favicon.svg",
        content_type: "image/svg+xml",
        body: include_bytes!("../../assets/favicon.svg"),
    },
    StaticAsset {
        path: "/site.webmanifest",
        content_type: "application/manifest+json",
        body: include_bytes!("../../assets/site.webmanifest"),
    },
];

/// Where a request path leads
#[derive(Debug, PartialEq, Eq)]
pub enum Route {
    Index,
    Static(&'static StaticAsset),
    Proxied,
    NotFound,
}

impl Route {
    pub fn resolve(path: &str) -> Route {
        if path == "/" {
            return Route::Index;
        }
        if PROXIED_PATHS.contains(&path) {
            return Route::Proxied;
        }
        ASSETS
            .iter()
            .find(|asset| asset.path == path)
            .map(Route::Static)
            .unwrap_or(Route::NotFound)
    }
}

/// Serves the chat page and its assets, and relays API calls to the backend
pub struct UiRouter {
    page: Bytes,
    proxy: Box<dyn Handler>,
}

impl UiRouter {
    /// Render the page for `api_url` and route API calls through `proxy`
    pub fn new(api_url: &Url, proxy: impl Handler) -> Self {
        let page = CHAT_TEMPLATE.replace(API_URL_PLACEHOLDER, &html_escape(api_url.as_str()));
        Self {
            page: Bytes::from(page),
            proxy: Box::new(proxy),
        }
    }

    async fn serve_index(&self, sink: &mut dyn ResponseSink) -> Result<()> {
        sink.headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("text/html; charset=utf-8"));
        sink.write_all(self.page.clone()).await?;
        Ok(())
    }

    async fn serve_asset(asset: &'static StaticAsset, sink: &mut dyn ResponseSink) -> Result<()> {
        let headers = sink.headers_mut();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(asset.content_type));
        headers.insert(
            CACHE_CONTROL,
            HeaderValue::from_static("no-cache, no-store, must-revalidate"),
        );
        sink.write_all(Bytes::from_static(asset.body)).await?;
        Ok(())
    }

    async fn serve_api(&self, req: Request<Body>, sink: &mut dyn ResponseSink) -> Result<()> {
        let headers = sink.headers_mut();
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
        headers.insert(
            ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("POST, GET, OPTIONS"),
        );
        headers.insert(
            ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("Content-Type"),
        );

        if req.method() == Method::OPTIONS {
            sink.set_status(StatusCode::OK);
            return Ok(());
        }

        self.proxy.serve(req, sink).await
    }
}

#[async_trait]
impl Handler for UiRouter {
    async fn serve(&self, req: Request<Body>, sink: &mut dyn ResponseSink) -> Result<()> {
        let route = Route::resolve(req.uri().path());
        debug!("{} {} -> {:?}", req.method(), req.uri().path(), route);

        match route {
            Route::Index => self.serve_index(sink).await,
            Route::Static(asset) => Self::serve_asset(asset, sink).await,
            Route::Proxied => self.serve_api(req, sink).await,
            Route::NotFound => not_found(sink).await,
        }
    }
}
