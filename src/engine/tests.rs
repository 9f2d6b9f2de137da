//! Tests for engine module

use super::*;
use crate::error::Error;
use crate::http::{HttpClient, HttpClientConfig, RawResponse};
use async_trait::async_trait;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::Mutex;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Transport replaying canned responses and recording every request
#[derive(Default)]
struct ScriptedTransport {
    responses: Mutex<VecDeque<Result<RawResponse>>>,
    requests: Mutex<Vec<(String, Vec<(String, String)>)>>,
}

impl ScriptedTransport {
    fn new() -> Self {
        Self::default()
    }

    fn json(self, url: &str, body: serde_json::Value) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(RawResponse::ok(url, body.to_string())));
        self
    }

    fn text(self, url: &str, body: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(RawResponse::ok(url, body.to_string())));
        self
    }

    fn status(self, url: &str, status: u16, body: serde_json::Value) -> Self {
        self.responses.lock().unwrap().push_back(Ok(RawResponse {
            url: url.to_string(),
            status,
            body: body.to_string().into(),
        }));
        self
    }

    fn error(self, err: Error) -> Self {
        self.responses.lock().unwrap().push_back(Err(err));
        self
    }

    fn requests(&self) -> Vec<(String, Vec<(String, String)>)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(&self, url: &str, query: &[(String, String)]) -> Result<RawResponse> {
        self.requests
            .lock()
            .unwrap()
            .push((url.to_string(), query.to_vec()));
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("unexpected request to {url}"))
    }
}

fn param(key: &str, value: &str) -> (String, String) {
    (key.to_string(), value.to_string())
}

const THINGS: &str = "https://sta.example.com/v1.0/Things";

// ============================================================================
// FetchConfig / FetchStats Tests
// ============================================================================

#[test]
fn test_fetch_config_default() {
    let config = FetchConfig::default();
    assert_eq!(config.ceiling, None);
    assert_eq!(config.csv_page_size, 100);
    assert!(!config.ceiling_reached(1_000_000));
}

#[test]
fn test_fetch_config_ceiling() {
    let config = FetchConfig::new().with_ceiling(500).with_csv_page_size(50);
    assert_eq!(config.csv_page_size, 50);
    assert!(!config.ceiling_reached(499));
    assert!(config.ceiling_reached(500));
    assert!(config.ceiling_reached(600));
}

#[test]
fn test_fetch_stats_kilobytes_round_up() {
    let mut stats = FetchStats::new();
    assert_eq!(stats.kilobytes(), 0);

    stats.add(FetchStats {
        pages: 1,
        records: 10,
        bytes: 1001,
    });
    assert_eq!(stats.kilobytes(), 2);

    stats.add(FetchStats {
        pages: 2,
        records: 5,
        bytes: 999,
    });
    assert_eq!(stats.pages, 3);
    assert_eq!(stats.records, 15);
    assert_eq!(stats.kilobytes(), 2);
}

// ============================================================================
// JSON Collection Tests
// ============================================================================

#[tokio::test]
async fn test_fetch_collection_follows_next_links() {
    let transport = ScriptedTransport::new()
        .json(
            THINGS,
            json!({
                "@iot.count": 5,
                "value": [{"@iot.id": 1}, {"@iot.id": 2}],
                "@iot.nextLink": "https://sta.example.com/v1.0/Things?$skip=2"
            }),
        )
        .json(
            "https://sta.example.com/v1.0/Things?$skip=2",
            json!({
                "@iot.count": 5,
                "value": [{"@iot.id": 3}, {"@iot.id": 4}],
                "@iot.nextLink": "https://sta.example.com/v1.0/Things?$skip=4"
            }),
        )
        .json(
            "https://sta.example.com/v1.0/Things?$skip=4",
            json!({"value": [{"@iot.id": 5}]}),
        );

    let mut fetcher = CollectionFetcher::new(&transport);
    let outcome = fetcher
        .fetch_collection(THINGS, &[param("$expand", "Locations")], &FetchConfig::new())
        .await
        .unwrap();

    let ids: Vec<i64> = outcome
        .entities
        .iter()
        .map(|e| e["@iot.id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    assert_eq!(outcome.total_count, Some(5));
    assert_eq!(outcome.stats.pages, 3);
    assert_eq!(outcome.stats.records, 5);

    // The base query goes out once; next links are followed verbatim
    let requests = transport.requests();
    assert_eq!(requests.len(), 3);
    assert_eq!(requests[0].0, THINGS);
    assert_eq!(requests[0].1, vec![param("$expand", "Locations")]);
    assert_eq!(requests[1].0, "https://sta.example.com/v1.0/Things?$skip=2");
    assert!(requests[1].1.is_empty());
    assert_eq!(requests[2].0, "https://sta.example.com/v1.0/Things?$skip=4");
    assert!(requests[2].1.is_empty());
}

#[tokio::test]
async fn test_fetch_collection_ceiling_keeps_whole_last_page() {
    let transport = ScriptedTransport::new()
        .json(
            THINGS,
            json!({
                "value": [{"@iot.id": 1}],
                "@iot.nextLink": "https://sta.example.com/v1.0/Things?$skip=1"
            }),
        )
        .json(
            "https://sta.example.com/v1.0/Things?$skip=1",
            json!({
                "value": [{"@iot.id": 2}, {"@iot.id": 3}, {"@iot.id": 4}],
                "@iot.nextLink": "https://sta.example.com/v1.0/Things?$skip=4"
            }),
        );

    let mut fetcher = CollectionFetcher::new(&transport);
    let outcome = fetcher
        .fetch_collection(THINGS, &[], &FetchConfig::new().with_ceiling(2))
        .await
        .unwrap();

    // Overshoot is allowed; nothing is truncated
    assert_eq!(outcome.len(), 4);
    assert_eq!(transport.requests().len(), 2);
}

#[tokio::test]
async fn test_fetch_collection_ceiling_met_on_first_page() {
    let transport = ScriptedTransport::new().json(
        THINGS,
        json!({
            "value": [{"@iot.id": 1}, {"@iot.id": 2}, {"@iot.id": 3}],
            "@iot.nextLink": "https://sta.example.com/v1.0/Things?$skip=3"
        }),
    );

    let mut fetcher = CollectionFetcher::new(&transport);
    let outcome = fetcher
        .fetch_collection(THINGS, &[], &FetchConfig::new().with_ceiling(3))
        .await
        .unwrap();

    assert_eq!(outcome.len(), 3);
    assert_eq!(transport.requests().len(), 1);
}

#[tokio::test]
async fn test_fetch_collection_ceiling_equal_to_first_page_stops() {
    let transport = ScriptedTransport::new()
        .json(
            THINGS,
            json!({
                "value": [{"@iot.id": 1}, {"@iot.id": 2}],
                "@iot.nextLink": "https://sta.example.com/v1.0/Things?$skip=2"
            }),
        )
        .json(
            "https://sta.example.com/v1.0/Things?$skip=2",
            json!({"value": [{"@iot.id": 3}]}),
        );

    let mut fetcher = CollectionFetcher::new(&transport);
    let outcome = fetcher
        .fetch_collection(THINGS, &[], &FetchConfig::new().with_ceiling(2))
        .await
        .unwrap();

    // 2 >= 2, so the next link is not followed
    assert_eq!(transport.requests().len(), 1);
    assert_eq!(outcome.len(), 2);
    assert_eq!(outcome.stats.pages, 1);
}

#[tokio::test]
async fn test_fetch_collection_zero_ceiling_issues_no_request() {
    let transport = ScriptedTransport::new();

    let mut fetcher = CollectionFetcher::new(&transport);
    let outcome = fetcher
        .fetch_collection(THINGS, &[], &FetchConfig::new().with_ceiling(0))
        .await
        .unwrap();

    assert!(outcome.is_empty());
    assert!(transport.requests().is_empty());
    assert_eq!(fetcher.stats(), &FetchStats::default());
}

#[tokio::test]
async fn test_fetch_collection_rejects_error_status() {
    let transport = ScriptedTransport::new().status(
        THINGS,
        503,
        json!({"value": [{"@iot.id": 1}], "message": "maintenance"}),
    );

    let mut fetcher = CollectionFetcher::new(&transport);
    let err = fetcher
        .fetch_collection(THINGS, &[], &FetchConfig::new())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::HttpStatus { status: 503, .. }));
    assert!(err.is_transport());
    assert_eq!(fetcher.stats().pages, 0);
}

#[tokio::test]
async fn test_fetch_collection_empty() {
    let transport = ScriptedTransport::new().json(THINGS, json!({"value": []}));

    let mut fetcher = CollectionFetcher::new(&transport);
    let outcome = fetcher
        .fetch_collection(THINGS, &[], &FetchConfig::new())
        .await
        .unwrap();

    assert!(outcome.is_empty());
    assert_eq!(outcome.total_count, None);
    assert_eq!(outcome.stats.pages, 1);
}

#[tokio::test]
async fn test_fetch_first_page_ignores_next_link() {
    let transport = ScriptedTransport::new().json(
        THINGS,
        json!({
            "value": [{"@iot.id": 1}, {"@iot.id": 2}],
            "@iot.nextLink": "https://sta.example.com/v1.0/Things?$skip=2"
        }),
    );

    let mut fetcher = CollectionFetcher::new(&transport);
    let outcome = fetcher
        .fetch_first_page(THINGS, &[param("$top", "2")])
        .await
        .unwrap();

    assert_eq!(outcome.len(), 2);
    assert_eq!(transport.requests().len(), 1);
}

#[tokio::test]
async fn test_fetch_collection_missing_value_is_protocol_error() {
    let transport = ScriptedTransport::new().json(THINGS, json!({"@iot.count": 3}));

    let mut fetcher = CollectionFetcher::new(&transport);
    let err = fetcher
        .fetch_collection(THINGS, &[], &FetchConfig::new())
        .await
        .unwrap_err();

    assert!(err.is_protocol());
    assert!(err.to_string().contains(THINGS));
}

#[tokio::test]
async fn test_fetch_collection_error_mid_sequence_abandons_result() {
    let transport = ScriptedTransport::new()
        .json(
            THINGS,
            json!({
                "value": [{"@iot.id": 1}],
                "@iot.nextLink": "https://sta.example.com/v1.0/Things?$skip=1"
            }),
        )
        .error(Error::http_status(503, "Service Unavailable"));

    let mut fetcher = CollectionFetcher::new(&transport);
    let err = fetcher
        .fetch_collection(THINGS, &[], &FetchConfig::new())
        .await
        .unwrap_err();

    assert!(err.is_transport());
    assert_eq!(transport.requests().len(), 2);
    assert_eq!(fetcher.stats().records, 0);
}

#[tokio::test]
async fn test_fetch_entity() {
    let transport = ScriptedTransport::new().json(
        "https://sta.example.com/v1.0/Datastreams(46)",
        json!({"@iot.id": 46, "name": "Air Temperature"}),
    );

    let mut fetcher = CollectionFetcher::new(&transport);
    let entity = fetcher
        .fetch_entity("https://sta.example.com/v1.0/Datastreams(46)", &[])
        .await
        .unwrap();

    assert_eq!(entity["name"], json!("Air Temperature"));
    assert_eq!(fetcher.stats().pages, 1);
}

#[tokio::test]
async fn test_fetch_entity_rejects_error_status() {
    let url = "https://sta.example.com/v1.0/Datastreams(9999)";
    let transport = ScriptedTransport::new().status(url, 404, json!({"code": 404}));

    let mut fetcher = CollectionFetcher::new(&transport);
    let err = fetcher.fetch_entity(url, &[]).await.unwrap_err();

    assert!(matches!(err, Error::HttpStatus { status: 404, .. }));
}

#[tokio::test]
async fn test_fetch_entity_rejects_non_object() {
    let transport = ScriptedTransport::new().text(THINGS, "[1, 2, 3]");

    let mut fetcher = CollectionFetcher::new(&transport);
    let err = fetcher.fetch_entity(THINGS, &[]).await.unwrap_err();
    assert!(err.is_protocol());
}

#[tokio::test]
async fn test_stats_accumulate_across_fetches() {
    let page = json!({"value": [{"@iot.id": 1}]});
    let body_len = page.to_string().len() as u64;
    let transport = ScriptedTransport::new()
        .json(THINGS, page.clone())
        .json(THINGS, page);

    let mut fetcher = CollectionFetcher::new(&transport);
    fetcher.fetch_first_page(THINGS, &[]).await.unwrap();
    fetcher.fetch_first_page(THINGS, &[]).await.unwrap();

    assert_eq!(fetcher.stats().pages, 2);
    assert_eq!(fetcher.stats().records, 2);
    assert_eq!(fetcher.stats().bytes, body_len * 2);

    fetcher.reset_stats();
    assert_eq!(*fetcher.stats(), FetchStats::default());
}

// ============================================================================
// CSV Tests
// ============================================================================

const OBSERVATIONS: &str = "https://sta.example.com/v1.0/Datastreams(46)/Observations";

fn csv_query() -> Vec<(String, String)> {
    vec![
        param("$select", "phenomenonTime,result"),
        param("$resultFormat", "CSV"),
    ]
}

fn columns() -> Vec<String> {
    vec!["phenomenonTime".to_string(), "result".to_string()]
}

#[tokio::test]
async fn test_fetch_csv_pages_with_skip_top() {
    let transport = ScriptedTransport::new()
        .text(
            OBSERVATIONS,
            "phenomenonTime,result\n2018-02-07T16:24:13.000Z,13.858\n2018-02-07T16:34:13.000Z,6.306\n",
        )
        .text(
            OBSERVATIONS,
            "phenomenonTime,result\n2018-02-07T16:44:13.000Z,5.1\n",
        );

    let mut fetcher = CollectionFetcher::new(&transport);
    let cols = columns();
    let outcome = fetcher
        .fetch_csv(
            OBSERVATIONS,
            &csv_query(),
            Some(&cols),
            &FetchConfig::new().with_csv_page_size(2),
        )
        .await
        .unwrap();

    assert_eq!(outcome.table.headers, cols);
    assert_eq!(outcome.table.len(), 3);
    assert_eq!(outcome.table.rows[2][1], "5.1");
    assert_eq!(outcome.stats.pages, 2);

    let requests = transport.requests();
    assert_eq!(requests.len(), 2);

    let mut first = csv_query();
    first.extend([param("$top", "2"), param("$skip", "0")]);
    assert_eq!(requests[0].1, first);

    let mut second = csv_query();
    second.extend([param("$top", "2"), param("$skip", "2")]);
    assert_eq!(requests[1].1, second);
}

#[tokio::test]
async fn test_fetch_csv_ceiling_stops_paging() {
    let transport = ScriptedTransport::new().text(
        OBSERVATIONS,
        "phenomenonTime,result\n2018-02-07T16:24:13.000Z,1\n2018-02-07T16:34:13.000Z,2\n",
    );

    let mut fetcher = CollectionFetcher::new(&transport);
    let outcome = fetcher
        .fetch_csv(
            OBSERVATIONS,
            &csv_query(),
            None,
            &FetchConfig::new().with_ceiling(2).with_csv_page_size(2),
        )
        .await
        .unwrap();

    assert_eq!(outcome.table.len(), 2);
    assert_eq!(transport.requests().len(), 1);
}

#[tokio::test]
async fn test_fetch_csv_column_mismatch() {
    let transport = ScriptedTransport::new().text(OBSERVATIONS, "result,phenomenonTime\n1,x\n");

    let mut fetcher = CollectionFetcher::new(&transport);
    let cols = columns();
    let err = fetcher
        .fetch_csv(OBSERVATIONS, &csv_query(), Some(&cols), &FetchConfig::new())
        .await
        .unwrap_err();

    assert!(err.is_protocol());
}

#[tokio::test]
async fn test_fetch_csv_empty_body() {
    let transport = ScriptedTransport::new().text(OBSERVATIONS, "");

    let mut fetcher = CollectionFetcher::new(&transport);
    let outcome = fetcher
        .fetch_csv(OBSERVATIONS, &csv_query(), None, &FetchConfig::new())
        .await
        .unwrap();

    assert!(outcome.table.is_empty());
    assert_eq!(outcome.stats.pages, 1);
}

// ============================================================================
// Integration with HttpClient
// ============================================================================

fn test_client() -> HttpClient {
    HttpClient::with_config(HttpClientConfig::builder().no_rate_limit().build()).unwrap()
}

#[tokio::test]
async fn test_fetcher_over_http_ceiling_met_by_first_page() {
    let server = MockServer::start().await;
    let next = format!("{}/v1.0/Things?$skip=2", server.uri());

    Mock::given(method("GET"))
        .and(path("/v1.0/Things"))
        .and(query_param("$skip", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{"@iot.id": 3}]
        })))
        .expect(0)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1.0/Things"))
        .and(query_param("$expand", "Locations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{"@iot.id": 1}, {"@iot.id": 2}],
            "@iot.nextLink": next
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client();
    let mut fetcher = CollectionFetcher::new(client);
    let outcome = fetcher
        .fetch_collection(
            &format!("{}/v1.0/Things", server.uri()),
            &[param("$expand", "Locations")],
            &FetchConfig::new().with_ceiling(2),
        )
        .await
        .unwrap();

    // Ceiling of 2 is met by page 1 alone
    assert_eq!(outcome.len(), 2);
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_fetcher_over_http_overshoots_ceiling() {
    let server = MockServer::start().await;
    let next = format!("{}/v1.0/Things?$skip=2", server.uri());

    Mock::given(method("GET"))
        .and(path("/v1.0/Things"))
        .and(query_param("$skip", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{"@iot.id": 3}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1.0/Things"))
        .and(query_param("$top", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{"@iot.id": 1}, {"@iot.id": 2}],
            "@iot.nextLink": next
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut fetcher = CollectionFetcher::new(test_client());
    let outcome = fetcher
        .fetch_collection(
            &format!("{}/v1.0/Things", server.uri()),
            &[param("$top", "2")],
            &FetchConfig::new().with_ceiling(3),
        )
        .await
        .unwrap();

    assert_eq!(outcome.len(), 3);
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
    assert!(outcome.stats.bytes > 0);
}

#[tokio::test]
async fn test_fetcher_over_http_status_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1.0/Things"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad $filter"))
        .mount(&server)
        .await;

    let mut fetcher = CollectionFetcher::new(test_client());
    let err = fetcher
        .fetch_collection(
            &format!("{}/v1.0/Things", server.uri()),
            &[],
            &FetchConfig::new(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, Error::HttpStatus { status: 400, .. }));
}
