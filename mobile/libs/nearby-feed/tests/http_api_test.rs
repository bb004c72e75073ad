/// Products API client against a mock HTTP server
use nearby_feed::{
    Coordinates, FeedConfig, FeedError, FeedQuery, HttpProductsApi, NearbyRequest, ProductsApi,
};
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn request(query: FeedQuery, page: u32) -> NearbyRequest {
    NearbyRequest::new(Coordinates::new(12.9716, 77.5946), 10.0, page, 10, &query)
}

fn nearby_body() -> serde_json::Value {
    json!({
        "products": [
            {
                "_id": "665f1c",
                "name": "Idli Plate",
                "price": 60,
                "merchantName": "Udupi Corner",
                "distance": 0.8,
                "images": ["https://cdn.example.com/idli.jpg"],
                "category": "Food",
                "description": "Two idlis with chutney"
            },
            {
                "id": "665f1d",
                "name": "Cold Coffee",
                "price": 90.5,
                "merchantName": "Brew Lab"
            }
        ],
        "pagination": { "total": 25, "pages": 3, "page": 1, "limit": 10 }
    })
}

#[tokio::test]
async fn test_fetch_sends_location_and_paging_params() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/products/nearby"))
        .and(query_param("lat", "12.9716"))
        .and(query_param("lng", "77.5946"))
        .and(query_param("radius", "10"))
        .and(query_param("page", "1"))
        .and(query_param("limit", "10"))
        .and(query_param_is_missing("search"))
        .and(query_param_is_missing("category"))
        .respond_with(ResponseTemplate::new(200).set_body_json(nearby_body()))
        .expect(1)
        .mount(&server)
        .await;

    let api = HttpProductsApi::new(&server.uri());
    let page = api
        .fetch_nearby(&request(FeedQuery::default(), 1))
        .await
        .unwrap();

    assert_eq!(page.products.len(), 2);
    assert_eq!(page.products[0].id, "665f1c");
    assert_eq!(page.products[0].merchant_name, "Udupi Corner");
    assert_eq!(page.products[1].id, "665f1d");
    assert_eq!(page.products[1].distance, None);
    assert_eq!(page.pagination.total, 25);
    assert_eq!(page.pagination.pages, 3);
}

#[tokio::test]
async fn test_fetch_sends_filters_and_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/products/nearby"))
        .and(query_param("search", "masala dosa"))
        .and(query_param("category", "Food"))
        .and(query_param("page", "2"))
        .and(header("authorization", "Bearer id-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(nearby_body()))
        .expect(1)
        .mount(&server)
        .await;

    let api = HttpProductsApi::new(&server.uri()).with_token("id-token");
    let query = FeedQuery::new(Some("masala dosa".to_string()), Some("Food".to_string()));
    api.fetch_nearby(&request(query, 2)).await.unwrap();
}

#[tokio::test]
async fn test_non_success_status_maps_to_status_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/products/nearby"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let api = HttpProductsApi::new(&server.uri());
    let err = api
        .fetch_nearby(&request(FeedQuery::default(), 1))
        .await
        .unwrap_err();

    match err {
        FeedError::Status { status, body } => {
            assert_eq!(status, 503);
            assert_eq!(body, "maintenance");
        }
        other => panic!("expected status error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unexpected_body_maps_to_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/products/nearby"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": [] })))
        .mount(&server)
        .await;

    let api = HttpProductsApi::new(&server.uri());
    let err = api
        .fetch_nearby(&request(FeedQuery::default(), 1))
        .await
        .unwrap_err();
    assert!(matches!(err, FeedError::Decode(_)));
}

#[tokio::test]
async fn test_unreachable_server_maps_to_network_error() {
    let api = HttpProductsApi::new("http://127.0.0.1:1");
    let err = api
        .fetch_nearby(&request(FeedQuery::default(), 1))
        .await
        .unwrap_err();
    assert!(matches!(err, FeedError::Network(_)));
}

#[tokio::test]
async fn test_from_config_uses_base_url_and_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/products/nearby"))
        .and(header("authorization", "Bearer cfg-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(nearby_body()))
        .expect(1)
        .mount(&server)
        .await;

    let config = FeedConfig {
        api_base_url: format!("{}/", server.uri()),
        api_token: Some("cfg-token".to_string()),
        request_timeout: Some(std::time::Duration::from_secs(5)),
        ..FeedConfig::default()
    };
    let api = HttpProductsApi::from_config(&config).unwrap();
    api.fetch_nearby(&request(FeedQuery::default(), 1))
        .await
        .unwrap();
}
