use std::time::Duration;

use serde_json::json;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::policy::{Policy, fqdn, relative};
use super::restful_cli::next_backoff;
use super::*;
use crate::error::Error;
use crate::provider::ResourceBackend;
use crate::reconciler::Reconciler;
use crate::record::{Address, Record, Resource, ResourceValue};

const ZONE: &str = "example.com";
const POLICIES: &str = "/sites/site-1/dns/policies";

fn backend(server: &MockServer) -> Unifi {
    let mut cfg = UnifiCfg::new(
        server.uri(),
        "site-1",
        Auth::ApiKey("secret".to_string()),
    );
    cfg.backoff = Duration::from_millis(1);
    Unifi::new(cfg).unwrap()
}

fn a(name: &str, ip: &str, ttl: u64) -> Record {
    Record::Address(Address {
        name: name.to_string(),
        ip: ip.parse().unwrap(),
        ttl: Duration::from_secs(ttl),
    })
}

#[test]
fn test_fqdn_and_relative() {
    assert_eq!(fqdn("www", ZONE), "www.example.com");
    assert_eq!(fqdn("@", "example.com."), "example.com");
    assert_eq!(fqdn("", ZONE), "example.com");
    assert_eq!(fqdn("host.other.org.", ZONE), "host.other.org");

    assert_eq!(relative("www.example.com", ZONE), Some("www".to_string()));
    assert_eq!(relative("A.B.Example.COM.", ZONE), Some("A.B".to_string()));
    assert_eq!(relative("example.com", ZONE), Some("@".to_string()));
    assert_eq!(relative("wwwexample.com", ZONE), None);
    assert_eq!(relative("www.other.org", ZONE), None);
}

#[test]
fn test_policy_deserialize() {
    let json = r#"{
        "type": "SRV_RECORD",
        "id": "6f1c8e2a-0000-4000-8000-000000000001",
        "enabled": true,
        "domain": "example.com",
        "ttlSeconds": 3600,
        "service": "_sip",
        "protocol": "_tcp",
        "serverDomain": "sip.example.com",
        "port": 5060,
        "priority": 10,
        "weight": 60,
        "metadata": {"origin": "USER_DEFINED"}
    }"#;

    let policy: Policy = serde_json::from_str(json).unwrap();
    assert_eq!(policy.extra.len(), 1);

    let resource = policy.into_resource(ZONE);
    assert_eq!(resource.rtype, "SRV");
    assert_eq!(resource.name, "@");
    assert_eq!(resource.ttl, 3600);
    assert_eq!(
        resource.value,
        ResourceValue::Srv {
            service: "_sip".to_string(),
            transport: "_tcp".to_string(),
            priority: 10,
            weight: 60,
            port: 5060,
            target: "sip.example.com".to_string(),
        }
    );
}

#[test]
fn test_policy_unknown_type_is_opaque() {
    let json = r#"{
        "type": "FORWARD_DOMAIN",
        "id": "fwd-1",
        "domain": "corp.example.com",
        "ipAddress": "10.0.0.53"
    }"#;

    let policy: Policy = serde_json::from_str(json).unwrap();
    assert!(policy.enabled);

    let resource = policy.into_resource(ZONE);
    assert_eq!(resource.rtype, "FORWARD_DOMAIN");
    assert_eq!(resource.name, "corp");
    assert!(!resource.is_supported());
    match resource.value {
        ResourceValue::Opaque(raw) => assert_eq!(raw["ipAddress"], "10.0.0.53"),
        other => panic!("expected opaque payload, got {:?}", other),
    }
}

#[test]
fn test_policy_from_resource_rejects_mismatch() {
    let resource = Resource {
        id: None,
        rtype: "MX".to_string(),
        name: "@".to_string(),
        ttl: 60,
        value: ResourceValue::Content("mail.example.com".to_string()),
    };
    assert!(matches!(
        Policy::from_resource(&resource, ZONE),
        Err(Error::MappingError { .. })
    ));
}

#[test]
fn test_auth_debug_is_redacted() {
    let auth = Auth::ApiKey("1234567890".to_string());
    assert!(!format!("{:?}", auth).contains("1234567890"));
    let cfg = UnifiCfg::new("https://unifi.local", "default", auth);
    assert!(!format!("{:?}", cfg).contains("1234567890"));
}

#[test]
fn test_backoff_doubles_up_to_cap() {
    assert_eq!(
        next_backoff(Duration::from_millis(500)),
        Duration::from_secs(1)
    );
    assert_eq!(next_backoff(Duration::from_secs(20)), Duration::from_secs(30));
    assert_eq!(next_backoff(Duration::MAX), Duration::from_secs(30));

    let mut delay = Duration::from_millis(1);
    for _ in 0..200 {
        delay = next_backoff(delay);
    }
    assert_eq!(delay, Duration::from_secs(30));
}

fn resource(rtype: &str, name: &str, value: ResourceValue) -> Resource {
    Resource {
        id: Some(format!("id-{}", rtype.to_ascii_lowercase())),
        rtype: rtype.to_string(),
        name: name.to_string(),
        ttl: 300,
        value,
    }
}

#[test]
fn test_policy_wire_mapping_every_kind() {
    let cases = vec![
        (
            resource("A", "www", ResourceValue::Content("192.0.2.1".to_string())),
            json!({"type": "A_RECORD", "domain": "www.example.com", "ipv4Address": "192.0.2.1"}),
        ),
        (
            resource("AAAA", "www", ResourceValue::Content("2001:db8::1".to_string())),
            json!({"type": "AAAA_RECORD", "domain": "www.example.com", "ipv6Address": "2001:db8::1"}),
        ),
        (
            resource("CNAME", "alias", ResourceValue::Content("www.example.com".to_string())),
            json!({"type": "CNAME_RECORD", "domain": "alias.example.com", "targetDomain": "www.example.com"}),
        ),
        (
            resource("TXT", "@", ResourceValue::Content("v=spf1 -all".to_string())),
            json!({"type": "TXT_RECORD", "domain": "example.com", "text": "v=spf1 -all"}),
        ),
        (
            resource(
                "MX",
                "@",
                ResourceValue::Mx {
                    preference: 10,
                    target: "mail.example.com".to_string(),
                },
            ),
            json!({"type": "MX_RECORD", "domain": "example.com",
                   "mailServerDomain": "mail.example.com", "priority": 10}),
        ),
        (
            resource(
                "SRV",
                "@",
                ResourceValue::Srv {
                    service: "_sip".to_string(),
                    transport: "_tcp".to_string(),
                    priority: 1,
                    weight: 2,
                    port: 5060,
                    target: "sip.example.com".to_string(),
                },
            ),
            json!({"type": "SRV_RECORD", "domain": "example.com", "service": "_sip",
                   "protocol": "_tcp", "priority": 1, "weight": 2, "port": 5060,
                   "serverDomain": "sip.example.com"}),
        ),
    ];

    for (resource, expected) in cases {
        let policy = Policy::from_resource(&resource, ZONE).unwrap();
        let body = serde_json::to_string(&policy).unwrap();
        let wire: serde_json::Value = serde_json::from_str(&body).unwrap();

        for (key, value) in expected.as_object().unwrap() {
            assert_eq!(&wire[key], value, "{} in {}", key, body);
        }
        assert_eq!(wire["ttlSeconds"], 300, "{}", body);
        assert_eq!(wire["enabled"], true, "{}", body);

        let decoded: Policy = serde_json::from_str(&body).unwrap();
        assert_eq!(decoded.into_resource(ZONE), resource);
    }
}

#[tokio::test]
async fn test_list_paginates_and_filters_zone() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(POLICIES))
        .and(query_param("offset", "0"))
        .and(header("X-API-KEY", "secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "offset": 0, "limit": 200, "count": 2, "totalCount": 3,
            "data": [
                {"type": "A_RECORD", "id": "p1", "enabled": true,
                 "domain": "www.example.com", "ipv4Address": "192.0.2.1", "ttlSeconds": 3600},
                {"type": "A_RECORD", "id": "p2", "enabled": true,
                 "domain": "www.other.org", "ipv4Address": "192.0.2.2", "ttlSeconds": 3600}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(POLICIES))
        .and(query_param("offset", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "offset": 2, "limit": 200, "count": 1, "totalCount": 3,
            "data": [
                {"type": "FORWARD_DOMAIN", "id": "p3", "enabled": true,
                 "domain": "corp.example.com", "ipAddress": "10.0.0.53"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let backend = backend(&server);
    let resources = backend.list(ZONE).await.unwrap();
    let ids: Vec<_> = resources.iter().filter_map(|r| r.id.as_deref()).collect();
    assert_eq!(ids, vec!["p1", "p3"]);

    let reconciler = Reconciler::new(backend);
    let got = reconciler
        .get(ZONE, &CancellationToken::new())
        .await
        .into_result()
        .unwrap();
    assert_eq!(got, vec![a("www", "192.0.2.1", 3600)]);
}

#[tokio::test]
async fn test_append_posts_policy() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(POLICIES))
        .and(header("X-API-KEY", "secret"))
        .and(body_partial_json(json!({
            "type": "AAAA_RECORD",
            "enabled": true,
            "domain": "www.example.com",
            "ipv6Address": "2001:db8::1",
            "ttlSeconds": 300
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "type": "AAAA_RECORD", "id": "new-1", "enabled": true,
            "domain": "www.example.com", "ipv6Address": "2001:db8::1", "ttlSeconds": 300
        })))
        .expect(1)
        .mount(&server)
        .await;

    let reconciler = Reconciler::new(backend(&server));
    let record = a("www", "2001:db8::1", 300);
    let created = reconciler
        .append(ZONE, std::slice::from_ref(&record), &CancellationToken::new())
        .await
        .into_result()
        .unwrap();
    assert_eq!(created, vec![record]);
}

#[tokio::test]
async fn test_set_puts_existing_policy() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(POLICIES))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "offset": 0, "limit": 200, "count": 1, "totalCount": 1,
            "data": [
                {"type": "A_RECORD", "id": "p1", "enabled": true,
                 "domain": "www.example.com", "ipv4Address": "192.0.2.1", "ttlSeconds": 3600}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path(format!("{}/p1", POLICIES)))
        .and(body_partial_json(json!({
            "type": "A_RECORD",
            "domain": "www.example.com",
            "ipv4Address": "192.0.2.100",
            "ttlSeconds": 7200
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "type": "A_RECORD", "id": "p1", "enabled": true,
            "domain": "www.example.com", "ipv4Address": "192.0.2.100", "ttlSeconds": 7200
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(POLICIES))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let reconciler = Reconciler::new(backend(&server));
    let updated = reconciler
        .set(
            ZONE,
            &[a("www", "192.0.2.100", 7200)],
            &CancellationToken::new(),
        )
        .await
        .into_result()
        .unwrap();
    assert_eq!(updated, vec![a("www", "192.0.2.100", 7200)]);
}

#[tokio::test]
async fn test_delete_sends_delete_by_id() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(POLICIES))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "offset": 0, "limit": 200, "count": 2, "totalCount": 2,
            "data": [
                {"type": "A_RECORD", "id": "p1", "enabled": true,
                 "domain": "delete-me.example.com", "ipv4Address": "192.0.2.1", "ttlSeconds": 3600},
                {"type": "A_RECORD", "id": "p2", "enabled": true,
                 "domain": "keep-me.example.com", "ipv4Address": "192.0.2.2", "ttlSeconds": 3600}
            ]
        })))
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path(format!("{}/p1", POLICIES)))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let reconciler = Reconciler::new(backend(&server));
    let batch = reconciler
        .delete(
            ZONE,
            &[a("delete-me", "192.0.2.1", 3600)],
            &CancellationToken::new(),
        )
        .await;
    assert!(batch.is_complete());
    assert_eq!(batch.deleted().count(), 1);
}

#[tokio::test]
async fn test_error_status_is_http_error() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path(format!("{}/missing", POLICIES)))
        .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
        .expect(1)
        .mount(&server)
        .await;

    let err = backend(&server).delete(ZONE, "missing").await.unwrap_err();
    match err {
        Error::HttpError(msg) => {
            assert!(msg.contains("404"));
            assert!(msg.contains("not found"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_list_retries_server_errors() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(POLICIES))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(POLICIES))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "offset": 0, "limit": 200, "count": 0, "totalCount": 0, "data": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    let resources = backend(&server).list(ZONE).await.unwrap();
    assert!(resources.is_empty());
}

#[tokio::test]
async fn test_create_is_not_retried_on_server_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(POLICIES))
        .respond_with(ResponseTemplate::new(502))
        .expect(1)
        .mount(&server)
        .await;

    let reconciler = Reconciler::new(backend(&server));
    let batch = reconciler
        .append(
            ZONE,
            &[a("www", "192.0.2.1", 60)],
            &CancellationToken::new(),
        )
        .await;
    assert!(batch.is_empty());
    assert!(matches!(
        batch.error,
        Some(Error::BackendError { index: Some(0), .. })
    ));
}
