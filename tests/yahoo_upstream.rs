//! End-to-end tests against a fake Yahoo Finance upstream
//!
//! A local axum server stands in for Yahoo (cookie, crumb and options
//! endpoints); the real `YahooFinance` client and API router talk to it.

use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use options_margin_api::api::ApiServer;
use options_margin_api::config::{ServerConfig, YahooConfig};
use options_margin_api::error::AppError;
use options_margin_api::providers::types::{Expiration, Session};
use options_margin_api::providers::{MarketDataProvider, YahooFinance};
use options_margin_api::state::AppState;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

const CRUMB: &str = "s3cr3tCrumb";
const FIRST_EXPIRY: i64 = 1_705_622_400;
const SECOND_EXPIRY: i64 = 1_706_227_200;

#[derive(Clone)]
struct FakeYahoo {
    crumb_available: bool,
    /// `date` query parameter of every accepted options request
    dates: Arc<Mutex<Vec<Option<String>>>>,
    cookie_hits: Arc<AtomicUsize>,
    crumb_hits: Arc<AtomicUsize>,
}

async fn cookie(State(fake): State<FakeYahoo>) -> impl IntoResponse {
    fake.cookie_hits.fetch_add(1, Ordering::SeqCst);
    (
        StatusCode::NOT_FOUND,
        [(header::SET_COOKIE, "A3=session-token; Path=/")],
        "",
    )
}

async fn crumb(State(fake): State<FakeYahoo>) -> Response {
    fake.crumb_hits.fetch_add(1, Ordering::SeqCst);
    if fake.crumb_available {
        CRUMB.into_response()
    } else {
        (StatusCode::TOO_MANY_REQUESTS, "Too Many Requests").into_response()
    }
}

async fn options(
    State(fake): State<FakeYahoo>,
    Path(ticker): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if params.get("crumb").map(String::as_str) != Some(CRUMB) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"finance": {"result": null,
                "error": {"code": "Unauthorized", "description": "Invalid Crumb"}}})),
        )
            .into_response();
    }

    fake.dates.lock().unwrap().push(params.get("date").cloned());

    match ticker.as_str() {
        "XYZ" => Json(xyz_chain()).into_response(),
        "NOPE" => Json(json!({"optionChain": {"result": [], "error": null}})).into_response(),
        "BOOM" => (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded").into_response(),
        _ => (
            StatusCode::NOT_FOUND,
            Json(json!({"optionChain": {"result": null,
                "error": {"code": "Not Found", "description": "No data found, symbol may be delisted"}}})),
        )
            .into_response(),
    }
}

fn xyz_chain() -> Value {
    json!({
        "optionChain": {
            "result": [{
                "underlyingSymbol": "XYZ",
                "expirationDates": [FIRST_EXPIRY, SECOND_EXPIRY],
                "strikes": [50.0, 90.0, 95.0, 100.0],
                "options": [{
                    "expirationDate": FIRST_EXPIRY,
                    "hasMiniOptions": false,
                    "calls": [
                        {"contractSymbol": "XYZ240119C00100000", "strike": 100.0, "bid": 1.5, "ask": 1.6,
                         "volume": 10, "openInterest": 200, "impliedVolatility": 0.3, "inTheMoney": false},
                        {"contractSymbol": "XYZ240119C00090000", "strike": 90.0, "bid": 10.2, "ask": 10.6,
                         "openInterest": 15, "impliedVolatility": 0.28, "inTheMoney": true}
                    ],
                    "puts": [
                        {"contractSymbol": "XYZ240119P00050000", "strike": "50", "bid": 0, "ask": 0.05,
                         "volume": 1, "openInterest": 3, "impliedVolatility": 1.2, "inTheMoney": false},
                        {"contractSymbol": "XYZ240119P00095000", "strike": 95.0,
                         "impliedVolatility": 0.35, "inTheMoney": false}
                    ]
                }]
            }],
            "error": null
        }
    })
}

async fn spawn_fake_yahoo(crumb_available: bool) -> (YahooConfig, FakeYahoo) {
    let fake = FakeYahoo {
        crumb_available,
        dates: Arc::new(Mutex::new(Vec::new())),
        cookie_hits: Arc::new(AtomicUsize::new(0)),
        crumb_hits: Arc::new(AtomicUsize::new(0)),
    };

    let app = Router::new()
        .route("/cookie", get(cookie))
        .route("/v1/test/getcrumb", get(crumb))
        .route("/v7/finance/options/:ticker", get(options))
        .with_state(fake.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let config = YahooConfig {
        base_url: format!("http://{}", addr),
        cookie_url: format!("http://{}/cookie", addr),
        ..YahooConfig::default()
    };
    (config, fake)
}

fn api_router(yahoo: YahooConfig) -> Router {
    let static_dir = tempfile::tempdir().unwrap();
    let config = ServerConfig {
        static_dir: static_dir.path().to_string_lossy().to_string(),
        yahoo,
        ..ServerConfig::default()
    };
    let state = AppState::from_config(&config).unwrap();
    ApiServer::new(config, state).router().unwrap()
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn as_f64(v: &Value) -> f64 {
    v.as_f64().unwrap_or_else(|| panic!("expected number, got {}", v))
}

#[tokio::test]
async fn provider_lists_expirations_and_fetches_first_chain() {
    let (config, fake) = spawn_fake_yahoo(true).await;
    let yahoo = YahooFinance::new(config).unwrap();

    let session = yahoo.open_session().await;
    assert_eq!(session.crumb.as_deref(), Some(CRUMB));

    let expirations = yahoo.expiration_dates(&session, "XYZ").await.unwrap();
    assert_eq!(expirations, vec![Expiration(FIRST_EXPIRY), Expiration(SECOND_EXPIRY)]);

    let chain = yahoo.option_chain(&session, "XYZ", expirations[0]).await.unwrap();
    assert_eq!(chain.calls.len(), 2);
    assert_eq!(chain.puts.len(), 2);
    assert_eq!(chain.puts[0].strike, Some(50.0));
    assert_eq!(chain.calls[1].volume, None);
    assert!(chain.calls[1].in_the_money);

    assert_eq!(
        *fake.dates.lock().unwrap(),
        vec![None, Some(FIRST_EXPIRY.to_string())]
    );
}

#[tokio::test]
async fn handshake_runs_once_per_request() {
    let (config, fake) = spawn_fake_yahoo(true).await;
    let app = api_router(config);

    let (status, _) = get_json(app.clone(), "/get_options/XYZ").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fake.cookie_hits.load(Ordering::SeqCst), 1);
    assert_eq!(fake.crumb_hits.load(Ordering::SeqCst), 1);
    assert_eq!(fake.dates.lock().unwrap().len(), 2);

    // no crumb is carried over to the next request
    let (status, _) = get_json(app, "/get_options/XYZ").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fake.cookie_hits.load(Ordering::SeqCst), 2);
    assert_eq!(fake.crumb_hits.load(Ordering::SeqCst), 2);
    assert_eq!(fake.dates.lock().unwrap().len(), 4);
}

#[tokio::test]
async fn get_options_end_to_end() {
    let (config, _fake) = spawn_fake_yahoo(true).await;
    let (status, body) = get_json(api_router(config), "/get_options/XYZ").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));

    let data = body["data"].as_array().unwrap();
    let types: Vec<&str> = data.iter().map(|r| r["option_type"].as_str().unwrap()).collect();
    assert_eq!(types, vec!["call", "call", "put", "put"]);
    let strikes: Vec<f64> = data.iter().map(|r| as_f64(&r["strike"])).collect();
    assert_eq!(strikes, vec![100.0, 90.0, 50.0, 95.0]);

    assert_eq!(
        data[0],
        json!({
            "strike": 100.0, "bid": 1.5, "ask": 1.6, "volume": 10, "openInterest": 200,
            "impliedVolatility": 0.3, "inTheMoney": false, "option_type": "call",
            "margin_required": 20.0, "premium_earned": 150.0, "return_on_margin": 750.0
        })
    );

    let deep_call = &data[1];
    assert!((as_f64(&deep_call["margin_required"]) - 18.0).abs() < 1e-9);
    assert!((as_f64(&deep_call["premium_earned"]) - 1020.0).abs() < 1e-9);
    assert!((as_f64(&deep_call["return_on_margin"]) - 1020.0 / 18.0 * 100.0).abs() < 1e-6);
    assert_eq!(deep_call["volume"], Value::Null);

    assert_eq!(data[2]["margin_required"], json!(5.0));
    assert_eq!(data[2]["premium_earned"], json!(0.0));
    assert_eq!(data[2]["return_on_margin"], json!(0.0));

    let no_bid = &data[3];
    assert!((as_f64(&no_bid["margin_required"]) - 9.5).abs() < 1e-9);
    assert_eq!(no_bid["bid"], Value::Null);
    assert_eq!(no_bid["premium_earned"], Value::Null);
    assert_eq!(no_bid["return_on_margin"], Value::Null);
}

#[tokio::test]
async fn ticker_without_options_is_not_found() {
    let (config, _fake) = spawn_fake_yahoo(true).await;
    let (status, body) = get_json(api_router(config), "/get_options/NOPE").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"detail": "No options data available for NOPE"}));
}

#[tokio::test]
async fn upstream_rejection_is_server_error() {
    let (config, _fake) = spawn_fake_yahoo(true).await;

    let (status, body) = get_json(api_router(config.clone()), "/get_options/GONE").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body["detail"],
        json!("Error fetching options data: Yahoo Finance returned 404 Not Found: Not Found: No data found, symbol may be delisted")
    );

    let (status, body) = get_json(api_router(config), "/get_options/BOOM").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body["detail"],
        json!("Error fetching options data: Yahoo Finance returned 500 Internal Server Error")
    );
}

#[tokio::test]
async fn missing_crumb_surfaces_upstream_error() {
    let (config, fake) = spawn_fake_yahoo(false).await;
    let yahoo = YahooFinance::new(config).unwrap();

    let session = yahoo.open_session().await;
    assert_eq!(session, Session::default());

    match yahoo.expiration_dates(&session, "XYZ").await {
        Err(AppError::Upstream(msg)) => assert!(msg.contains("Invalid Crumb"), "{}", msg),
        other => panic!("expected upstream error, got {:?}", other),
    }
    assert!(fake.dates.lock().unwrap().is_empty());
}

#[tokio::test]
async fn unreachable_upstream_is_server_error() {
    // Reserve a port, then close it so nothing is listening there
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let config = YahooConfig {
        base_url: format!("http://{}", addr),
        cookie_url: format!("http://{}/cookie", addr),
        ..YahooConfig::default()
    };
    let (status, body) = get_json(api_router(config), "/get_options/XYZ").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let detail = body["detail"].as_str().unwrap();
    assert!(detail.starts_with("Error fetching options data: "));
    assert!(detail.len() > "Error fetching options data: ".len());
}
