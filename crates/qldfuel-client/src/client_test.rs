use super::*;

fn test_client(base_url: &str) -> FuelPriceClient {
    FuelPriceClient::with_base_url("test-token", 30, base_url)
        .expect("client construction should not fail")
}

#[test]
fn endpoint_appends_path_and_region_query() {
    let client = test_client("https://fppdirectapi-prod.fuelpricesqld.com.au");
    let url = client.endpoint(SITES_PATH).unwrap();
    assert_eq!(
        url.as_str(),
        "https://fppdirectapi-prod.fuelpricesqld.com.au/Subscriber/GetFullSiteDetails?countryId=21&geoRegionLevel=3&geoRegionId=1"
    );
}

#[test]
fn endpoint_strips_trailing_slash() {
    let client = test_client("http://127.0.0.1:9999/");
    let url = client.endpoint(PRICES_PATH).unwrap();
    assert_eq!(
        url.as_str(),
        "http://127.0.0.1:9999/Price/GetSitesPrices?countryId=21&geoRegionLevel=3&geoRegionId=1"
    );
}

#[test]
fn endpoint_keeps_base_path_prefix() {
    let client = test_client("http://127.0.0.1:9999/proxy");
    let url = client.endpoint(PRICES_PATH).unwrap();
    assert!(url.path().starts_with("/proxy/Price/"), "{url}");
}

#[test]
fn auth_header_uses_subscriber_token_scheme() {
    assert_eq!(auth_header_value("abc"), "FPDAPI SubscriberToken=abc");
}

#[test]
fn invalid_base_url_is_rejected() {
    let result = FuelPriceClient::with_base_url("t", 30, "not a url");
    assert!(matches!(result, Err(FuelApiError::InvalidBaseUrl(_))));
}

#[test]
fn has_token_reflects_blank_tokens() {
    assert!(test_client("http://127.0.0.1:9999").has_token());
    let blank = FuelPriceClient::with_base_url("  ", 30, "http://127.0.0.1:9999").unwrap();
    assert!(!blank.has_token());
}
