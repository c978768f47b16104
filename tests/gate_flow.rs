//! End-to-end tag-proxy gate flows against a real listener.
//!
//! The gate route is keyed on the listener's own host:port so the mock
//! client hits it without spoofing Host headers.

use std::net::SocketAddr;
use std::time::Duration;

use edgegate::config::schema::default_routes;
use edgegate::config::EdgeConfig;
use edgegate::http::HttpServer;

mod common;

fn gateway_config(proxy_addr: SocketAddr, tag_upstream: Option<SocketAddr>) -> EdgeConfig {
    let mut config = EdgeConfig::default();
    config.listener.bind_address = proxy_addr.to_string();
    // The reporter target; nothing listens there, failures are swallowed.
    config.decision.base_url = "http://127.0.0.1:1".to_string();
    config.decision.token = "tok".to_string();
    if let Some(upstream) = tag_upstream {
        config.tag.upstream_url = format!("http://{upstream}");
    }
    config.routes = default_routes(&proxy_addr.to_string());
    config
}

async fn start_gateway(proxy_addr: SocketAddr, config: EdgeConfig) {
    let server = HttpServer::new(config);
    let listener = tokio::net::TcpListener::bind(proxy_addr).await.unwrap();
    tokio::spawn(async move {
        let _ = server.run(listener).await;
    });
    tokio::time::sleep(Duration::from_millis(100)).await;
}

#[tokio::test]
async fn test_disallowed_method_is_405() {
    let proxy_addr: SocketAddr = "127.0.0.1:29211".parse().unwrap();
    start_gateway(proxy_addr, gateway_config(proxy_addr, None)).await;

    let res = common::test_client()
        .post(format!("http://{proxy_addr}/gtm.js?id=GTM-XXXXXX"))
        .send()
        .await
        .expect("gateway unreachable");

    assert_eq!(res.status(), 405);
    assert_eq!(res.headers().get("allow").unwrap(), "GET, HEAD");
    assert_eq!(res.text().await.unwrap(), "Method POST not allowed.");
}

#[tokio::test]
async fn test_missing_query_is_403() {
    let proxy_addr: SocketAddr = "127.0.0.1:29212".parse().unwrap();
    start_gateway(proxy_addr, gateway_config(proxy_addr, None)).await;

    let res = common::test_client()
        .get(format!("http://{proxy_addr}/gtm.js"))
        .send()
        .await
        .expect("gateway unreachable");

    assert_eq!(res.status(), 403);
    assert_eq!(res.text().await.unwrap(), "Missing URL query parameters");
}

#[tokio::test]
async fn test_unlisted_container_id_is_403() {
    let proxy_addr: SocketAddr = "127.0.0.1:29213".parse().unwrap();
    start_gateway(proxy_addr, gateway_config(proxy_addr, None)).await;

    let res = common::test_client()
        .get(format!("http://{proxy_addr}/gtm.js?id=GTM-XXXXXX1"))
        .send()
        .await
        .expect("gateway unreachable");

    assert_eq!(res.status(), 403);
    assert_eq!(
        res.text().await.unwrap(),
        "Missing whitelisted ID as URL query parameter: id"
    );
}

#[tokio::test]
async fn test_script_request_is_sanitized_and_rewritten() {
    let proxy_addr: SocketAddr = "127.0.0.1:29214".parse().unwrap();
    let upstream_addr: SocketAddr = "127.0.0.1:29215".parse().unwrap();

    let upstream_calls = common::start_recording_backend(
        upstream_addr,
        200,
        "application/javascript",
        "// container",
    )
    .await;
    start_gateway(proxy_addr, gateway_config(proxy_addr, Some(upstream_addr))).await;

    let res = common::test_client()
        .get(format!(
            "http://{proxy_addr}/gtm.js?id=GTM-XXXXXX&evil=1&gtm_auth=a"
        ))
        .send()
        .await
        .expect("gateway unreachable");

    assert_eq!(res.status(), 200);
    assert_eq!(
        res.headers().get("content-type").unwrap(),
        "text/javascript; charset=utf-8"
    );
    assert_eq!(
        res.headers().get("cache-control").unwrap(),
        "max-age=300, must-revalidate"
    );
    assert_eq!(res.headers().get("vary").unwrap(), "Accept-Encoding");
    assert_eq!(res.text().await.unwrap(), "// container");

    let calls = upstream_calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert!(
        calls[0].contains("/gtm.js?id=GTM-XXXXXX&gtm_auth=a "),
        "unexpected upstream request line: {}",
        calls[0]
    );
}

#[tokio::test]
async fn test_html_variant_forwards_to_ns_html() {
    let proxy_addr: SocketAddr = "127.0.0.1:29216".parse().unwrap();
    let upstream_addr: SocketAddr = "127.0.0.1:29217".parse().unwrap();

    let upstream_calls =
        common::start_recording_backend(upstream_addr, 200, "text/html", "<html></html>").await;
    start_gateway(proxy_addr, gateway_config(proxy_addr, Some(upstream_addr))).await;

    let res = common::test_client()
        .get(format!("http://{proxy_addr}/frame.html?id=GTM-XXXXXX"))
        .send()
        .await
        .expect("gateway unreachable");

    assert_eq!(res.status(), 200);
    assert_eq!(
        res.headers().get("cross-origin-resource-policy").unwrap(),
        "same-site"
    );
    // The variant is never cacheable; no policy override is applied.
    assert!(res
        .headers()
        .get("cache-control")
        .map(|v| !v.to_str().unwrap().contains("max-age"))
        .unwrap_or(true));

    let calls = upstream_calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert!(
        calls[0].starts_with("GET /ns.html?id=GTM-XXXXXX&rand="),
        "unexpected upstream request line: {}",
        calls[0]
    );
}

#[tokio::test]
async fn test_dead_upstream_is_502() {
    let proxy_addr: SocketAddr = "127.0.0.1:29218".parse().unwrap();
    // Nothing listens on the upstream port.
    let upstream_addr: SocketAddr = "127.0.0.1:29219".parse().unwrap();
    start_gateway(proxy_addr, gateway_config(proxy_addr, Some(upstream_addr))).await;

    let res = common::test_client()
        .get(format!("http://{proxy_addr}/gtm.js?id=GTM-XXXXXX"))
        .send()
        .await
        .expect("gateway unreachable");

    assert_eq!(res.status(), 502);
    assert_eq!(res.text().await.unwrap(), "Upstream request failed");
}
