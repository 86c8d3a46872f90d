//! HttpIpResolver against a mock echo service

use cfddns_core::Error;
use cfddns_core::traits::IpResolver;
use cfddns_ip_http::HttpIpResolver;
use std::net::Ipv4Addr;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn echo_server(response: ResponseTemplate) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(response)
        .expect(1)
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn resolves_trimmed_body() {
    let server = echo_server(ResponseTemplate::new(200).set_body_string("  5.6.7.8\n")).await;
    let resolver = HttpIpResolver::new(server.uri()).unwrap();

    let ip = resolver.resolve().await.expect("resolve succeeds");
    assert_eq!(ip, Ipv4Addr::new(5, 6, 7, 8));
}

#[tokio::test]
async fn non_success_status_is_network_error() {
    let server = echo_server(ResponseTemplate::new(503).set_body_string("busy")).await;
    let resolver = HttpIpResolver::new(server.uri()).unwrap();

    let err = resolver.resolve().await.unwrap_err();
    assert!(matches!(err, Error::Network(_)), "got {err:?}");
    assert!(err.to_string().contains("503"));
}

#[tokio::test]
async fn garbage_body_is_network_error() {
    let server = echo_server(ResponseTemplate::new(200).set_body_string("<html>hi</html>")).await;
    let resolver = HttpIpResolver::new(server.uri()).unwrap();

    let err = resolver.resolve().await.unwrap_err();
    assert!(matches!(err, Error::Network(_)), "got {err:?}");
}

#[tokio::test]
async fn ipv6_body_is_rejected() {
    let server = echo_server(ResponseTemplate::new(200).set_body_string("2001:db8::1")).await;
    let resolver = HttpIpResolver::new(server.uri()).unwrap();

    let err = resolver.resolve().await.unwrap_err();
    assert!(matches!(err, Error::Network(_)), "got {err:?}");
}

#[tokio::test]
async fn timeout_is_network_error() {
    let server = echo_server(
        ResponseTemplate::new(200)
            .set_body_string("5.6.7.8")
            .set_delay(Duration::from_secs(2)),
    )
    .await;
    let resolver = HttpIpResolver::with_timeout(server.uri(), Duration::from_millis(100)).unwrap();

    let err = resolver.resolve().await.unwrap_err();
    assert!(matches!(err, Error::Network(_)), "got {err:?}");
}

#[tokio::test]
async fn unreachable_endpoint_is_network_error() {
    // Port 9 (discard) on localhost is not listening in test environments
    let resolver =
        HttpIpResolver::with_timeout("http://127.0.0.1:9/", Duration::from_millis(500)).unwrap();

    let err = resolver.resolve().await.unwrap_err();
    assert!(matches!(err, Error::Network(_)), "got {err:?}");
}
