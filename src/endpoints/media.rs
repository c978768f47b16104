//! Image-engine media passthrough.
//!
//! A single host rewrite: media requests are fetched from the image-engine
//! host instead of the origin. No sanitization and no decision branching;
//! on transport failure or a 404 the origin serves the image itself.

use std::sync::Arc;

use axum::http::header::{HeaderMap, CONTENT_LENGTH, HOST};
use axum::http::StatusCode;
use axum::response::Response;

use crate::config::schema::{EndpointsConfig, OriginConfig};
use crate::http::client::{HttpSend, OutboundRequest};
use crate::http::request::RequestContext;
use crate::http::response::{self, is_hop_by_hop_header};

pub struct MediaPassthrough {
    client: Arc<dyn HttpSend>,
    media_host: String,
    origin: OriginConfig,
}

impl MediaPassthrough {
    pub fn new(client: Arc<dyn HttpSend>, endpoints: &EndpointsConfig, origin: OriginConfig) -> Self {
        Self {
            client,
            media_host: endpoints.media_host.clone(),
            origin,
        }
    }

    /// Serve a media request, falling back to the origin when the image
    /// engine fails or has no such asset.
    pub async fn serve(&self, ctx: &RequestContext) -> Response {
        let request = OutboundRequest {
            method: ctx.method.clone(),
            url: format!("http://{}{}", self.media_host, ctx.path_and_query()),
            headers: forward_headers(&ctx.headers),
            body: None,
            timeout: None,
        };

        match self.client.send(request).await {
            Ok(upstream) if upstream.status != StatusCode::NOT_FOUND => {
                response::from_outbound(upstream)
            }
            Ok(_) => {
                tracing::debug!(path = %ctx.path, "image engine 404, serving origin");
                self.from_origin(ctx).await
            }
            Err(err) => {
                tracing::warn!(error = %err, path = %ctx.path, "image engine unreachable, serving origin");
                self.from_origin(ctx).await
            }
        }
    }

    async fn from_origin(&self, ctx: &RequestContext) -> Response {
        let request = OutboundRequest {
            method: ctx.method.clone(),
            url: format!(
                "{}{}",
                self.origin.base_url.trim_end_matches('/'),
                ctx.path_and_query()
            ),
            headers: forward_headers(&ctx.headers),
            body: None,
            timeout: None,
        };
        match self.client.send(request).await {
            Ok(upstream) => response::from_outbound(upstream),
            Err(err) => {
                tracing::error!(error = %err, "origin media fetch failed");
                response::plain_text(StatusCode::BAD_GATEWAY, "Upstream request failed")
            }
        }
    }
}

fn forward_headers(incoming: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for (name, value) in incoming.iter() {
        if name == HOST || name == CONTENT_LENGTH || is_hop_by_hop_header(name.as_str()) {
            continue;
        }
        headers.append(name.clone(), value.clone());
    }
    headers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::client::fake::FakeClient;
    use crate::http::client::{ClientError, OutboundResponse};
    use axum::body::{Body, Bytes};
    use axum::http::Request;

    fn passthrough(client: Arc<FakeClient>) -> MediaPassthrough {
        MediaPassthrough::new(
            client,
            &EndpointsConfig {
                sitemap_url: String::new(),
                media_host: "media.test.imgeng.in".to_string(),
            },
            OriginConfig {
                base_url: "http://origin.test".to_string(),
            },
        )
    }

    async fn context(path: &str) -> RequestContext {
        let request = Request::builder()
            .uri(format!("http://ignored{path}"))
            .header("host", "www.example.com")
            .header("accept", "image/*")
            .body(Body::default())
            .unwrap();
        RequestContext::from_request(request, "http").await.unwrap()
    }

    fn image_response(status: StatusCode) -> OutboundResponse {
        OutboundResponse {
            status,
            headers: HeaderMap::new(),
            body: Bytes::from_static(b"img"),
        }
    }

    #[tokio::test]
    async fn test_rewrites_host_to_image_engine() {
        let client = Arc::new(FakeClient::new());
        client.push(Ok(image_response(StatusCode::OK)));
        let media = passthrough(client.clone());

        let response = media.serve(&context("/media/logo.png?w=100").await).await;
        assert_eq!(response.status(), StatusCode::OK);

        let calls = client.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].url, "http://media.test.imgeng.in/media/logo.png?w=100");
        assert!(calls[0].headers.get("host").is_none());
    }

    #[tokio::test]
    async fn test_404_falls_back_to_origin() {
        let client = Arc::new(FakeClient::new());
        client.push(Ok(image_response(StatusCode::NOT_FOUND)));
        client.push(Ok(image_response(StatusCode::OK)));
        let media = passthrough(client.clone());

        let response = media.serve(&context("/media/logo.png").await).await;
        assert_eq!(response.status(), StatusCode::OK);

        let calls = client.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].url, "http://origin.test/media/logo.png");
    }

    #[tokio::test]
    async fn test_transport_failure_falls_back_to_origin() {
        let client = Arc::new(FakeClient::new());
        client.push(Err(ClientError::Timeout));
        client.push(Ok(image_response(StatusCode::OK)));
        let media = passthrough(client);

        let response = media.serve(&context("/media/logo.png").await).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_both_dead_is_502() {
        let client = Arc::new(FakeClient::new());
        client.push(Err(ClientError::Timeout));
        client.push(Err(ClientError::Connect("refused".into())));
        let media = passthrough(client);

        let response = media.serve(&context("/media/logo.png").await).await;
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
