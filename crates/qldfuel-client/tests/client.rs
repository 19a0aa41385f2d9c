//! Integration tests for `FuelPriceClient` using wiremock HTTP mocks.

use std::time::Duration;

use qldfuel_client::{FuelApiError, FuelPriceClient};
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SITES: &str = "/Subscriber/GetFullSiteDetails";
const PRICES: &str = "/Price/GetSitesPrices";

fn test_client(base_url: &str) -> FuelPriceClient {
    FuelPriceClient::with_base_url("test-token", 30, base_url)
        .expect("client construction should not fail")
}

fn sites_body() -> serde_json::Value {
    json!({
        "S": [
            {
                "S": 61_401_007,
                "N": "Shell Toowong",
                "A": "120 High St",
                "P": 4066,
                "Lat": -27.4845,
                "Lng": 152.9918,
                "B": 5
            },
            {
                "S": 61_401_008,
                "N": "BP Milton",
                "A": "1 Milton Rd",
                "P": "4064",
                "Lat": "-27.4700",
                "Lng": "153.0000",
                "B": 2
            }
        ]
    })
}

fn prices_body() -> serde_json::Value {
    json!({
        "SitePrices": [
            { "SiteId": 61_401_007, "FuelId": 12, "Price": 1859, "TransactionDateUtc": "2026-10-16T21:02:00" },
            { "SiteId": 61_401_008, "FuelId": 12, "Price": 1799, "TransactionDateUtc": "2026-10-16T22:15:00" },
            { "SiteId": 61_401_008, "FuelId": 3, "Price": null }
        ]
    })
}

async fn mount_ok(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(SITES))
        .respond_with(ResponseTemplate::new(200).set_body_json(sites_body()))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(PRICES))
        .respond_with(ResponseTemplate::new(200).set_body_json(prices_body()))
        .mount(server)
        .await;
}

#[tokio::test]
async fn fetch_all_returns_sites_and_prices() {
    let server = MockServer::start().await;
    mount_ok(&server).await;

    let payload = test_client(&server.uri())
        .fetch_all()
        .await
        .expect("fetch should succeed");

    assert_eq!(payload.sites.len(), 2);
    assert_eq!(payload.sites[0].site_id, "61401007");
    assert_eq!(payload.sites[1].latitude, Some(-27.47));
    assert_eq!(payload.prices.len(), 3);
    assert_eq!(payload.prices[1].price, Some(1799.0));
    assert_eq!(payload.prices[2].price, None);
}

#[tokio::test]
async fn fetch_all_sends_subscriber_token_and_region_query() {
    let server = MockServer::start().await;

    for endpoint in [SITES, PRICES] {
        Mock::given(method("GET"))
            .and(path(endpoint))
            .and(header("Authorization", "FPDAPI SubscriberToken=test-token"))
            .and(query_param("countryId", "21"))
            .and(query_param("geoRegionLevel", "3"))
            .and(query_param("geoRegionId", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;
    }

    let payload = test_client(&server.uri())
        .fetch_all()
        .await
        .expect("fetch should succeed");
    assert!(payload.sites.is_empty());
    assert!(payload.prices.is_empty());
}

#[tokio::test]
async fn non_200_on_either_endpoint_fails_with_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SITES))
        .respond_with(ResponseTemplate::new(200).set_body_json(sites_body()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(PRICES))
        .respond_with(ResponseTemplate::new(401).set_body_string("Invalid subscriber token"))
        .mount(&server)
        .await;

    let err = test_client(&server.uri())
        .fetch_all()
        .await
        .expect_err("401 must fail the fetch");

    match err {
        FuelApiError::UnexpectedStatus { status, body, url } => {
            assert_eq!(status, 401);
            assert_eq!(body, "Invalid subscriber token");
            assert!(url.contains("GetSitesPrices"), "{url}");
        }
        other => panic!("expected UnexpectedStatus, got {other:?}"),
    }
}

#[tokio::test]
async fn non_200_success_status_is_still_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let err = test_client(&server.uri()).fetch_all().await.unwrap_err();
    assert!(
        matches!(err, FuelApiError::UnexpectedStatus { status: 204, .. }),
        "got {err:?}"
    );
}

#[tokio::test]
async fn slow_endpoint_hits_the_deadline() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SITES))
        .respond_with(ResponseTemplate::new(200).set_body_json(sites_body()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(PRICES))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(prices_body())
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let client = FuelPriceClient::with_base_url("test-token", 1, &server.uri()).unwrap();
    let err = client.fetch_all().await.unwrap_err();
    assert!(
        matches!(err, FuelApiError::Timeout { secs: 1 }),
        "got {err:?}"
    );
}

#[tokio::test]
async fn non_json_body_is_a_deserialize_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let err = test_client(&server.uri()).fetch_all().await.unwrap_err();
    assert!(matches!(err, FuelApiError::Deserialize { .. }), "got {err:?}");
}

#[tokio::test]
async fn undecodable_records_are_skipped_not_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SITES))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "S": [ { "N": "missing id" }, { "S": 1, "N": "ok" } ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(PRICES))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "SitePrices": [ { "SiteId": 1, "FuelId": 12, "Price": 1650 }, 42 ]
        })))
        .mount(&server)
        .await;

    let payload = test_client(&server.uri()).fetch_all().await.unwrap();
    assert_eq!(payload.sites.len(), 1);
    assert_eq!(payload.sites[0].name.as_deref(), Some("ok"));
    assert_eq!(payload.prices.len(), 1);
}

#[tokio::test]
async fn connection_refused_is_an_http_error() {
    // Port 1 on localhost is never listening in the test environment.
    let client = test_client("http://127.0.0.1:1");
    let err = client.fetch_all().await.unwrap_err();
    assert!(matches!(err, FuelApiError::Http(_)), "got {err:?}");
}
