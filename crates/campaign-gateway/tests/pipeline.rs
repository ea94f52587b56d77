//! End-to-end tests of the request pipeline.
//!
//! Every backend, including the identity service, is a `wiremock` server.
//! Requests are driven through the real router with `tower::ServiceExt`.
//!
//! Run with:
//!   cargo test -p campaign-gateway --test pipeline

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use base64::prelude::*;
use futures::future::join_all;
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tower::ServiceExt;
use wiremock::matchers::{header as header_is, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use campaign_gateway::{create_router, GatewayConfig, GatewayState};
use campaign_gateway_auth::{issue_token, HmacValidator, IdentityClient};

const SECRET: &str = "pipeline-secret";

/// Client address used for rate limiting in these tests.
const CLIENT_IP: &str = "198.51.100.7";

// =============================================================================
// Harness
// =============================================================================

struct Gateway {
    identity: MockServer,
    campaign: MockServer,
    enhancement: MockServer,
    content: MockServer,
    app: Router,
}

impl Gateway {
    async fn start() -> Self {
        Self::start_with(|_| {}).await
    }

    async fn start_with(customize: impl FnOnce(&mut GatewayConfig)) -> Self {
        let identity = MockServer::start().await;
        let campaign = MockServer::start().await;
        let enhancement = MockServer::start().await;
        let content = MockServer::start().await;

        let mut config = GatewayConfig::default();
        config.auth.jwt_secret = SECRET.to_string();
        config.auth.identity_timeout_seconds = 2;
        for (service, server) in [
            ("identity", &identity),
            ("campaign", &campaign),
            ("enhancement", &enhancement),
            ("content", &content),
        ] {
            config.services.insert(service.to_string(), server.uri());
        }
        customize(&mut config);
        config.validate().unwrap();

        let auth = config.auth_config().unwrap();
        let state = GatewayState::from_config(
            config,
            Arc::new(HmacValidator::new(&auth.jwt_secret)),
            Arc::new(IdentityClient::new(&auth)),
        )
        .unwrap();

        Self {
            identity,
            campaign,
            enhancement,
            content,
            app: create_router(state),
        }
    }

    async fn send(&self, request: Request<Body>) -> Response {
        self.app.clone().oneshot(request).await.unwrap()
    }

    /// Make the identity service answer `/auth/me` for `token`.
    async fn known_account(&self, token: &str, account: Value) {
        Mock::given(method("GET"))
            .and(path("/auth/me"))
            .and(header_is("authorization", format!("Bearer {token}").as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(account))
            .mount(&self.identity)
            .await;
    }
}

fn token_for(subject: &str) -> String {
    issue_token(SECRET, subject, chrono::Duration::hours(1)).unwrap()
}

fn account(id: u64, role: &str, is_active: bool) -> Value {
    json!({
        "id": id,
        "email": format!("user{id}@example.com"),
        "role": role,
        "is_active": is_active,
    })
}

fn get(uri: &str) -> axum::http::request::Builder {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .header("x-forwarded-for", CLIENT_IP)
}

fn bearer(uri: &str, token: &str) -> Request<Body> {
    get(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

fn options(uri: &str) -> axum::http::request::Builder {
    Request::builder()
        .method(Method::OPTIONS)
        .uri(uri)
        .header("x-forwarded-for", CLIENT_IP)
}

/// A raw TCP backend that promises a 100-byte body, sends 7 bytes and hangs up.
async fn truncating_backend() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let mut buf = vec![0u8; 4096];
            let _ = socket.read(&mut buf).await;
            let _ = socket
                .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 100\r\n\r\npartial")
                .await;
            let _ = socket.shutdown().await;
        }
    });
    format!("http://{addr}")
}

async fn json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// =============================================================================
// Public endpoints
// =============================================================================

#[tokio::test]
async fn health_lists_backend_urls() {
    let gw = Gateway::start().await;

    let response = gw.send(get("/api/health").body(Body::empty()).unwrap()).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["services"]["identity"], gw.identity.uri());
    assert_eq!(body["services"]["campaign"], gw.campaign.uri());
    assert_eq!(body["services"]["enhancement"], gw.enhancement.uri());
    assert_eq!(body["services"]["content"], gw.content.uri());
}

#[tokio::test]
async fn login_relays_cookies_with_attributes() {
    let gw = Gateway::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .append_header(
                    "set-cookie",
                    "access_token=a.b.c; HttpOnly; Secure; SameSite=Strict; Max-Age=3600; Path=/",
                )
                .append_header(
                    "set-cookie",
                    "refresh_token=r.s.t; HttpOnly; Secure; SameSite=Strict; Path=/api/auth/refresh",
                )
                .set_body_json(json!({"message": "ok"})),
        )
        .expect(1)
        .mount(&gw.identity)
        .await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"email":"a@example.com","password":"pw"}"#))
        .unwrap();
    let response = gw.send(request).await;
    assert_eq!(response.status(), StatusCode::OK);

    let cookies: Vec<String> = response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect();
    assert_eq!(cookies.len(), 2);
    for cookie in &cookies {
        assert!(cookie.contains("HttpOnly"), "{cookie}");
        assert!(cookie.contains("Secure"), "{cookie}");
        assert!(cookie.contains("SameSite=Strict"), "{cookie}");
    }
    assert!(cookies[0].starts_with("access_token=a.b.c"));
    assert!(cookies[0].contains("Max-Age=3600"));
    assert!(cookies[1].contains("Path=/api/auth/refresh"));
}

#[tokio::test]
async fn public_path_ignores_corrupted_token() {
    let gw = Gateway::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&gw.identity)
        .await;
    Mock::given(path("/auth/me"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&gw.identity)
        .await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/auth/refresh")
        .header(header::AUTHORIZATION, "Bearer not.a.jwt")
        .header(header::COOKIE, "access_token=garbage")
        .body(Body::empty())
        .unwrap();
    assert_eq!(gw.send(request).await.status(), StatusCode::OK);
}

// =============================================================================
// Authentication
// =============================================================================

#[tokio::test]
async fn missing_token_is_unauthorized_without_backend_call() {
    let gw = Gateway::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&gw.campaign)
        .await;

    let response = gw.send(get("/api/campaigns").body(Body::empty()).unwrap()).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await["error"]["code"], "unauthorized");
}

#[tokio::test]
async fn options_without_token_is_unauthorized() {
    let gw = Gateway::start().await;
    Mock::given(method("OPTIONS"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&gw.campaign)
        .await;

    let response = gw.send(options("/api/campaigns/42").body(Body::empty()).unwrap()).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await["error"]["code"], "unauthorized");
}

#[tokio::test]
async fn options_with_token_is_forwarded() {
    let gw = Gateway::start().await;
    let token = token_for("7");
    gw.known_account(&token, account(7, "admin", true)).await;
    Mock::given(method("OPTIONS"))
        .and(path("/campaigns/42"))
        .and(header_is("x-user-id", "7"))
        .respond_with(ResponseTemplate::new(204).insert_header("allow", "GET, PUT, DELETE"))
        .expect(1)
        .mount(&gw.campaign)
        .await;

    let request = options("/api/campaigns/42")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    let response = gw.send(request).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(response.headers()[header::ALLOW], "GET, PUT, DELETE");
}

#[tokio::test]
async fn preflight_is_answered_without_token_or_backend_call() {
    let gw = Gateway::start_with(|config| {
        config.cors_origins = vec!["http://localhost:3000".to_string()];
    })
    .await;
    Mock::given(method("OPTIONS"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&gw.campaign)
        .await;

    let request = options("/api/campaigns/42")
        .header(header::ORIGIN, "http://localhost:3000")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "DELETE")
        .body(Body::empty())
        .unwrap();
    let response = gw.send(request).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "http://localhost:3000"
    );
}

#[tokio::test]
async fn wrong_signature_is_unauthorized() {
    let gw = Gateway::start().await;
    Mock::given(path("/auth/me"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&gw.identity)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&gw.campaign)
        .await;

    let forged = issue_token("some-other-secret", "7", chrono::Duration::hours(1)).unwrap();
    let response = gw.send(bearer("/api/campaigns", &forged)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn expired_token_is_unauthorized() {
    let gw = Gateway::start().await;
    let expired = issue_token(SECRET, "7", chrono::Duration::minutes(-5)).unwrap();
    let response = gw.send(bearer("/api/campaigns", &expired)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn deactivated_account_is_forbidden_and_never_proxied() {
    let gw = Gateway::start().await;
    let token = token_for("7");
    gw.known_account(&token, account(7, "marketing_manager", false))
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&gw.campaign)
        .await;

    let response = gw.send(bearer("/api/campaigns", &token)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unknown_account_is_unauthorized() {
    let gw = Gateway::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/me"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&gw.identity)
        .await;

    let response = gw.send(bearer("/api/campaigns", &token_for("99"))).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn identity_outage_is_service_unavailable() {
    let gw = Gateway::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/me"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&gw.identity)
        .await;

    let response = gw.send(bearer("/api/campaigns", &token_for("7"))).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn cookie_token_wins_over_bearer() {
    let gw = Gateway::start().await;
    let token = token_for("7");
    gw.known_account(&token, account(7, "admin", true)).await;
    Mock::given(method("GET"))
        .and(path("/campaigns"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&gw.campaign)
        .await;

    let request = get("/api/campaigns")
        .header(header::COOKIE, format!("access_token={token}"))
        .header(header::AUTHORIZATION, "Bearer not.a.jwt")
        .body(Body::empty())
        .unwrap();
    assert_eq!(gw.send(request).await.status(), StatusCode::OK);
}

// =============================================================================
// Header injection and forwarding
// =============================================================================

#[tokio::test]
async fn identity_headers_reach_backend() {
    let gw = Gateway::start().await;
    let token = token_for("7");
    gw.known_account(&token, account(7, "marketing_manager", true))
        .await;
    Mock::given(method("GET"))
        .and(path("/campaigns/42"))
        .and(query_param("include", "metrics"))
        .and(header_is("x-user-id", "7"))
        .and(header_is("x-user-email", "user7@example.com"))
        .and(header_is("x-user-role", "marketing_manager"))
        .and(header_is("x-user-is-active", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 42})))
        .expect(1)
        .mount(&gw.campaign)
        .await;

    let response = gw
        .send(bearer("/api/campaigns/42?include=metrics", &token))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["id"], 42);
}

#[tokio::test]
async fn non_ascii_role_is_base64_encoded() {
    let gw = Gateway::start().await;
    let token = token_for("8");
    gw.known_account(&token, account(8, "Diseñador", true)).await;

    let encoded = BASE64_STANDARD.encode("Diseñador");
    Mock::given(method("GET"))
        .and(path("/campaigns"))
        .and(header_is("x-user-role", encoded.as_str()))
        .and(header_is("x-user-email", "user8@example.com"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&gw.campaign)
        .await;

    let response = gw.send(bearer("/api/campaigns", &token)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn spoofed_identity_headers_are_replaced() {
    let gw = Gateway::start().await;
    let token = token_for("7");
    gw.known_account(&token, account(7, "viewer", true)).await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&gw.campaign)
        .await;

    let request = get("/api/campaigns")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header("x-user-id", "1")
        .header("x-user-role", "admin")
        .header("x-user-tenant", "other")
        .body(Body::empty())
        .unwrap();
    assert_eq!(gw.send(request).await.status(), StatusCode::OK);

    let received = gw.campaign.received_requests().await.unwrap();
    assert_eq!(received.len(), 1);
    let headers = &received[0].headers;
    assert_eq!(headers.get("x-user-id").unwrap(), "7");
    assert_eq!(headers.get("x-user-role").unwrap(), "viewer");
    assert!(headers.get("x-user-tenant").is_none());
}

#[tokio::test]
async fn public_requests_carry_no_identity_headers() {
    let gw = Gateway::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/register"))
        .respond_with(ResponseTemplate::new(201))
        .mount(&gw.identity)
        .await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/auth/register")
        .header("x-user-role", "admin")
        .header("x-request-id", "trace-abc")
        .body(Body::from("{}"))
        .unwrap();
    let response = gw.send(request).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(response.headers()["x-request-id"], "trace-abc");

    let received = gw.identity.received_requests().await.unwrap();
    let headers = &received[0].headers;
    assert!(headers.get("x-user-role").is_none());
    assert_eq!(headers.get("x-request-id").unwrap(), "trace-abc");
}

// =============================================================================
// Routing
// =============================================================================

#[tokio::test]
async fn prefixes_route_to_their_services() {
    let gw = Gateway::start().await;
    let token = token_for("7");
    gw.known_account(&token, account(7, "admin", true)).await;
    Mock::given(method("GET"))
        .and(path("/ai/generate"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&gw.content)
        .await;
    Mock::given(method("GET"))
        .and(path("/ai-interactions"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&gw.enhancement)
        .await;
    Mock::given(method("GET"))
        .and(path("/reports/weekly"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&gw.campaign)
        .await;

    for uri in ["/api/ai/generate", "/api/ai-interactions", "/api/reports/weekly"] {
        let response = gw.send(bearer(uri, &token)).await;
        assert_eq!(response.status(), StatusCode::OK, "{uri}");
    }
}

#[tokio::test]
async fn backend_errors_are_relayed_verbatim() {
    let gw = Gateway::start().await;
    let token = token_for("7");
    gw.known_account(&token, account(7, "admin", true)).await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"detail": "Campaign not found"})),
        )
        .mount(&gw.campaign)
        .await;

    let response = gw.send(bearer("/api/campaigns/missing", &token)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(response).await["detail"], "Campaign not found");
}

// =============================================================================
// Rate limiting
// =============================================================================

#[tokio::test]
async fn service_limit_rejects_the_sixty_first_request() {
    let gw = Gateway::start().await;
    let token = token_for("7");
    gw.known_account(&token, account(7, "admin", true)).await;
    Mock::given(method("GET"))
        .and(path("/campaigns"))
        .respond_with(ResponseTemplate::new(200))
        .expect(60)
        .mount(&gw.campaign)
        .await;

    for i in 0..60 {
        let response = gw.send(bearer("/api/campaigns", &token)).await;
        assert_eq!(response.status(), StatusCode::OK, "request {i}");
    }

    let response = gw.send(bearer("/api/campaigns", &token)).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let retry_after: u64 = response.headers()[header::RETRY_AFTER]
        .to_str()
        .unwrap()
        .parse()
        .unwrap();
    assert!(retry_after > 0 && retry_after <= 60);
    assert_eq!(json_body(response).await["error"]["code"], "rate_limited");
}

#[tokio::test]
async fn concurrent_requests_do_not_over_admit() {
    let gw = Gateway::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&gw.identity)
        .await;

    let requests = (0..25).map(|_| {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/auth/login")
            .header("x-forwarded-for", CLIENT_IP)
            .body(Body::empty())
            .unwrap();
        gw.send(request)
    });
    let statuses: Vec<StatusCode> = join_all(requests)
        .await
        .into_iter()
        .map(|r| r.status())
        .collect();

    let admitted = statuses.iter().filter(|s| **s == StatusCode::OK).count();
    let limited = statuses
        .iter()
        .filter(|s| **s == StatusCode::TOO_MANY_REQUESTS)
        .count();
    assert_eq!(admitted, 10);
    assert_eq!(limited, 15);
}

#[tokio::test]
async fn trailing_slash_shares_the_login_limit() {
    let gw = Gateway::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(10)
        .mount(&gw.identity)
        .await;

    let login = |uri: &str| {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header("x-forwarded-for", CLIENT_IP)
            .body(Body::empty())
            .unwrap()
    };

    for i in 0..10 {
        let uri = if i % 2 == 0 { "/api/auth/login" } else { "/api/auth/login/" };
        assert_eq!(gw.send(login(uri)).await.status(), StatusCode::OK, "request {i}");
    }
    assert_eq!(
        gw.send(login("/api/auth/login/")).await.status(),
        StatusCode::TOO_MANY_REQUESTS
    );
    assert_eq!(
        gw.send(login("/api/auth/login")).await.status(),
        StatusCode::TOO_MANY_REQUESTS
    );
}

#[tokio::test]
async fn limits_are_per_client() {
    let gw = Gateway::start_with(|config| {
        config
            .rate_limit
            .paths
            .insert("/api/auth/login".to_string(), "1/minute".into());
    })
    .await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&gw.identity)
        .await;

    let login = |ip: &str| {
        Request::builder()
            .method(Method::POST)
            .uri("/api/auth/login")
            .header("x-forwarded-for", ip)
            .body(Body::empty())
            .unwrap()
    };

    assert_eq!(gw.send(login("203.0.113.1")).await.status(), StatusCode::OK);
    assert_eq!(
        gw.send(login("203.0.113.1")).await.status(),
        StatusCode::TOO_MANY_REQUESTS
    );
    assert_eq!(gw.send(login("203.0.113.2")).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn disabled_limiter_admits_everything() {
    let gw = Gateway::start_with(|config| {
        config.rate_limit.enabled = false;
        config
            .rate_limit
            .paths
            .insert("/api/auth/login".to_string(), "1/minute".into());
    })
    .await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200))
        .expect(3)
        .mount(&gw.identity)
        .await;

    for _ in 0..3 {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/auth/login")
            .body(Body::empty())
            .unwrap();
        assert_eq!(gw.send(request).await.status(), StatusCode::OK);
    }
}

// =============================================================================
// Backend failures
// =============================================================================

#[tokio::test]
async fn refused_backend_is_service_unavailable() {
    let gw = Gateway::start_with(|config| {
        config
            .services
            .insert("campaign".to_string(), "http://127.0.0.1:9".to_string());
    })
    .await;
    let token = token_for("7");
    gw.known_account(&token, account(7, "admin", true)).await;

    let response = gw.send(bearer("/api/campaigns", &token)).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json_body(response).await["error"]["code"], "service_unavailable");
}

#[tokio::test]
async fn slow_backend_is_gateway_timeout() {
    let gw = Gateway::start_with(|config| config.proxy_timeout_seconds = 1).await;
    let token = token_for("7");
    gw.known_account(&token, account(7, "admin", true)).await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&gw.campaign)
        .await;

    let response = gw.send(bearer("/api/campaigns", &token)).await;
    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
}

#[tokio::test]
async fn truncated_backend_response_is_bad_gateway() {
    let backend = truncating_backend().await;
    let gw = Gateway::start_with(|config| {
        config.services.insert("campaign".to_string(), backend);
    })
    .await;
    let token = token_for("7");
    gw.known_account(&token, account(7, "admin", true)).await;

    let response = gw.send(bearer("/api/campaigns", &token)).await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(json_body(response).await["error"]["code"], "bad_gateway");
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let gw = Gateway::start_with(|config| config.max_body_bytes = 16).await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/auth/login")
        .body(Body::from(vec![b'x'; 64]))
        .unwrap();
    let response = gw.send(request).await;
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}
