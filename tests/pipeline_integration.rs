//! Integration tests driving the full pricing pipeline over HTTP against a
//! mock trade API.

use poe_pricer::config::Config;
use poe_pricer::pricing::{AggregationMode, PricingPipeline};
use poe_pricer::trade::{ItemDescription, TradeClient, TradeError};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config(api_url: String) -> Config {
    Config {
        api_url,
        delay_ms: 0,
        delay_jitter_ms: 0,
        backoff_ms: 0,
        ..Config::default()
    }
}

fn rare_regalia() -> ItemDescription {
    serde_json::from_value(json!({
        "baseType": "Vaal Regalia",
        "rarity": "Rare",
        "itemLevel": 84
    }))
    .unwrap()
}

#[tokio::test]
async fn test_pipeline_prices_an_item_end_to_end() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/search/Standard"))
        .and(body_partial_json(json!({
            "query": {
                "status": {"option": "online"},
                "type": "Vaal Regalia",
                "filters": {
                    "type_filters": {"filters": {"rarity": {"option": "rare"}}},
                    "misc_filters": {"filters": {"ilvl": {"min": 84.0}}}
                }
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": ["a", "b", "c"],
            "id": "q1",
            "total": 3
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/fetch/a,b,c"))
        .and(query_param("query", "q1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": [
                {"id": "a", "listing": {"price": {"amount": 10, "currency": "chaos"}}},
                {"id": "b", "listing": {"price": {"amount": 12, "currency": "chaos"}}},
                {"id": "c", "listing": {"price": {"amount": 200, "currency": "divine"}}}
            ]
        })))
        .mount(&mock_server)
        .await;

    let config = test_config(mock_server.uri());
    let client = TradeClient::new(&config).unwrap();
    let pipeline = PricingPipeline::new(config);

    let report = pipeline
        .price_item(&client, "Standard", &rare_regalia(), AggregationMode::Median)
        .await
        .unwrap();

    let info = &report.price_info;
    assert_eq!(info.min.as_ref().unwrap().amount, 10.0);
    assert_eq!(info.min.as_ref().unwrap().currency, "chaos");
    assert_eq!(info.median.as_ref().unwrap().amount, 11.0);
    assert_eq!(info.max.as_ref().unwrap().amount, 12.0);
    assert_eq!(info.sample.len(), 3);
    assert_eq!(info.total_results, 3);
    assert!(report.search_url.ends_with("/Standard/q1"));
}

#[tokio::test]
async fn test_pipeline_short_circuits_on_zero_results() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/search/Standard"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": [],
            "id": "q9",
            "total": 0
        })))
        .mount(&mock_server)
        .await;

    // No fetch mock mounted: a fetch request would fail the test via the
    // unmatched-request error path.
    let config = test_config(mock_server.uri());
    let client = TradeClient::new(&config).unwrap();
    let pipeline = PricingPipeline::new(config);

    let report = pipeline
        .price_item(&client, "Standard", &rare_regalia(), AggregationMode::Median)
        .await
        .unwrap();

    assert!(report.price_info.is_empty());
    assert_eq!(report.price_info.total_results, 0);
    assert!(report.search_url.ends_with("/Standard/q9"));
}

#[tokio::test]
async fn test_pipeline_survives_one_rate_limit() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/search/Standard"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/search/Standard"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": ["a"],
            "id": "q1",
            "total": 1
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/fetch/a"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": [
                {"id": "a", "listing": {"price": {"amount": 7, "currency": "chaos"}}}
            ]
        })))
        .mount(&mock_server)
        .await;

    let config = test_config(mock_server.uri());
    let client = TradeClient::new(&config).unwrap();
    let pipeline = PricingPipeline::new(config);

    let report = pipeline
        .price_item(&client, "Standard", &rare_regalia(), AggregationMode::Median)
        .await
        .unwrap();

    assert_eq!(report.price_info.median.as_ref().unwrap().amount, 7.0);
}

#[tokio::test]
async fn test_pipeline_relaxes_a_rejected_query() {
    let mock_server = MockServer::start().await;

    // The item-level filter is rejected until the bounds relaxation strips
    // it; the retried query then matches.
    Mock::given(method("POST"))
        .and(path("/search/Standard"))
        .and(body_partial_json(json!({
            "query": {"filters": {"misc_filters": {"filters": {"ilvl": {"min": 84.0}}}}}
        })))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {"code": 2, "message": "Invalid query"}
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/search/Standard"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": ["a"],
            "id": "q1",
            "total": 1
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/fetch/a"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": [
                {"id": "a", "listing": {"price": {"amount": 5, "currency": "chaos"}}}
            ]
        })))
        .mount(&mock_server)
        .await;

    let config = test_config(mock_server.uri());
    let client = TradeClient::new(&config).unwrap();
    let pipeline = PricingPipeline::new(config);

    let report = pipeline
        .price_item(&client, "Standard", &rare_regalia(), AggregationMode::Median)
        .await
        .unwrap();

    assert_eq!(report.price_info.min.as_ref().unwrap().amount, 5.0);
}

#[tokio::test]
async fn test_pipeline_degrades_when_fetch_is_rejected() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/search/Standard"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": ["a", "b"],
            "id": "q1",
            "total": 2
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/fetch/a,b"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {"message": "Resource not found"}
        })))
        .mount(&mock_server)
        .await;

    let config = test_config(mock_server.uri());
    let client = TradeClient::new(&config).unwrap();
    let pipeline = PricingPipeline::new(config);

    let report = pipeline
        .price_item(&client, "Standard", &rare_regalia(), AggregationMode::Median)
        .await
        .unwrap();

    // A rejected fetch is "no priced listings", not a failure.
    assert!(report.price_info.is_empty());
    assert_eq!(report.price_info.total_results, 2);
    assert!(report.search_url.ends_with("/Standard/q1"));
}

#[tokio::test]
async fn test_pipeline_surfaces_terminal_search_failures() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/search/Standard"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": {"message": "Forbidden"}
        })))
        .mount(&mock_server)
        .await;

    let config = test_config(mock_server.uri());
    let client = TradeClient::new(&config).unwrap();
    let pipeline = PricingPipeline::new(config);

    let err = pipeline
        .price_item(&client, "Standard", &rare_regalia(), AggregationMode::Median)
        .await
        .unwrap_err();

    assert!(matches!(err, TradeError::Upstream { status: 403, .. }));
}
