use assert_matches::assert_matches;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use dex_export::catalog::{CatalogClient, HttpCatalogClient};
use dex_export::error::DexError;
use dex_export::model::ListQuery;

#[tokio::test]
async fn species_record_decodes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v2/pokemon-species/bulbasaur"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 1,
            "name": "bulbasaur",
            "gender_rate": 1,
            "growth_rate": { "name": "medium-slow", "url": "" },
            "varieties": [{ "is_default": true, "pokemon": { "name": "bulbasaur", "url": "" } }]
        })))
        .mount(&server)
        .await;

    let client = HttpCatalogClient::new(&format!("{}/api/v2/", server.uri())).unwrap();
    let species = client.species("bulbasaur").await.unwrap();
    assert_eq!(species.id, 1);
    assert_eq!(species.gender_rate, 1);
    assert_eq!(species.varieties[0].pokemon.name, "bulbasaur");
}

#[tokio::test]
async fn list_passes_limit_and_offset() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/growth-rate"))
        .and(query_param("limit", "100"))
        .and(query_param("offset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 1,
            "results": [{ "name": "slow", "url": "" }]
        })))
        .mount(&server)
        .await;

    let client = HttpCatalogClient::new(&server.uri()).unwrap();
    let page = client
        .list_growth_rates(&ListQuery {
            limit: 100,
            offset: 0,
        })
        .await
        .unwrap();
    assert_eq!(page.count, 1);
    assert_eq!(page.results[0].name, "slow");
}

#[tokio::test]
async fn not_found_is_a_status_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ability/missingno"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Not Found"))
        .mount(&server)
        .await;

    let client = HttpCatalogClient::new(&server.uri()).unwrap();
    let result = client.ability("missingno").await;
    assert_matches!(result, Err(DexError::CatalogStatus { status: 404, .. }));
}

#[tokio::test]
async fn transient_failures_are_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/pokemon-form/bulbasaur"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/pokemon-form/bulbasaur"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 1,
            "name": "bulbasaur",
            "is_default": true
        })))
        .mount(&server)
        .await;

    let client = HttpCatalogClient::new(&server.uri()).unwrap();
    let form = client.pokemon_form("bulbasaur").await.unwrap();
    assert!(form.is_default);
}
