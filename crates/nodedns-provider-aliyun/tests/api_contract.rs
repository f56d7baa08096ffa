//! Contract Test: Alidns OpenAPI requests
//!
//! Runs the provider against a local mock server and checks the signed
//! RPC calls it sends and how responses are interpreted.

use nodedns_core::traits::DnsProvider;
use nodedns_core::Error;
use nodedns_provider_aliyun::AliyunProvider;
use serde_json::json;
use wiremock::matchers::{header, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn provider(server: &MockServer) -> AliyunProvider {
    AliyunProvider::new("LTAIexample", "secret")
        .unwrap()
        .with_endpoint(&server.uri())
        .unwrap()
}

fn signed(action: &str) -> wiremock::MockBuilder {
    Mock::given(method("POST"))
        .and(path("/"))
        .and(header("x-acs-action", action))
        .and(header("x-acs-version", "2015-01-09"))
        .and(header_exists("x-acs-date"))
        .and(header_exists("x-acs-signature-nonce"))
        .and(header_exists("x-acs-content-sha256"))
        .and(header_exists("authorization"))
}

#[tokio::test]
async fn lookup_picks_exact_rr_match() {
    let server = MockServer::start().await;
    signed("DescribeDomainRecords")
        .and(query_param("DomainName", "example.com"))
        .and(query_param("RRKeyWord", "home"))
        .and(query_param("Type", "A"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "TotalCount": 2,
            "DomainRecords": {
                "Record": [
                    {"RecordId": "111", "RR": "home2", "Type": "A", "Value": "9.9.9.9"},
                    {"RecordId": "222", "RR": "home", "Type": "A", "Value": "1.2.3.4"}
                ]
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let id = provider(&server)
        .get_record_id("home.example.com", "A")
        .await
        .expect("lookup succeeds");
    assert_eq!(id, "222");
}

#[tokio::test]
async fn lookup_ignores_name_case() {
    let server = MockServer::start().await;
    signed("DescribeDomainRecords")
        .and(query_param("DomainName", "Example.COM"))
        .and(query_param("RRKeyWord", "Home"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "DomainRecords": {
                "Record": [{"RecordId": "333", "RR": "home", "Type": "A"}]
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let id = provider(&server)
        .get_record_id("Home.Example.COM", "a")
        .await
        .expect("case-insensitive match");
    assert_eq!(id, "333");
}

#[tokio::test]
async fn lookup_without_exact_match_is_not_found() {
    let server = MockServer::start().await;
    signed("DescribeDomainRecords")
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "DomainRecords": {
                "Record": [{"RecordId": "111", "RR": "home2", "Type": "A"}]
            }
        })))
        .mount(&server)
        .await;

    let result = provider(&server).get_record_id("home.example.com", "A").await;
    assert!(matches!(result, Err(Error::NotFound(_))));
}

#[tokio::test]
async fn apex_name_uses_at_sign() {
    let server = MockServer::start().await;
    signed("DescribeDomainRecords")
        .and(query_param("DomainName", "example.com"))
        .and(query_param("RRKeyWord", "@"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "DomainRecords": {
                "Record": [{"RecordId": "apex", "RR": "@", "Type": "A"}]
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let id = provider(&server).get_record_id("example.com", "A").await.unwrap();
    assert_eq!(id, "apex");
}

#[tokio::test]
async fn update_sends_record_fields() {
    let server = MockServer::start().await;
    signed("UpdateDomainRecord")
        .and(query_param("RecordId", "222"))
        .and(query_param("RR", "a.b"))
        .and(query_param("Type", "CNAME"))
        .and(query_param("Value", "edge.example.net"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "RequestId": "req-1",
            "RecordId": "222"
        })))
        .expect(1)
        .mount(&server)
        .await;

    provider(&server)
        .update_record("222", "a.b.example.com", "CNAME", "edge.example.net")
        .await
        .expect("update succeeds");
}

#[tokio::test]
async fn add_sends_domain_and_language() {
    let server = MockServer::start().await;
    signed("AddDomainRecord")
        .and(query_param("Lang", "zh"))
        .and(query_param("DomainName", "example.cn"))
        .and(query_param("RR", "nas"))
        .and(query_param("Type", "AAAA"))
        .and(query_param("Value", "2001:db8::1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "RequestId": "req-2",
            "RecordId": "333"
        })))
        .expect(1)
        .mount(&server)
        .await;

    provider(&server)
        .add_record("nas.example.cn", "AAAA", "2001:db8::1")
        .await
        .expect("create succeeds");
}

#[tokio::test]
async fn api_error_carries_code_and_message() {
    let server = MockServer::start().await;
    signed("AddDomainRecord")
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "RequestId": "req-3",
            "Code": "DomainRecordDuplicate",
            "Message": "The DNS record already exists."
        })))
        .mount(&server)
        .await;

    let result = provider(&server)
        .add_record("home.example.com", "A", "1.2.3.4")
        .await;

    match result {
        Err(Error::Remote { provider, message }) => {
            assert_eq!(provider, "aliyun");
            assert!(message.contains("DomainRecordDuplicate"));
            assert!(message.contains("The DNS record already exists."));
        }
        other => panic!("expected remote error, got {:?}", other),
    }
}

#[tokio::test]
async fn malformed_name_never_hits_the_api() {
    let server = MockServer::start().await;
    signed("DescribeDomainRecords")
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let result = provider(&server).get_record_id("localhost", "A").await;
    assert!(matches!(result, Err(Error::InvalidInput(_))));
}
