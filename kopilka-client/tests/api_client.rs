use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use kopilka_client::api::{ApiError, FinanceApiClient, FinanceBackend, RequestOptions};
use shared_types::{TransactionFilter, TransactionKind};

#[derive(Debug, Clone)]
struct Recorded {
    method: String,
    path: String,
    query: String,
    user_id: Option<String>,
    body: String,
}

type Log = web::Data<Arc<Mutex<Vec<Recorded>>>>;

fn record(log: &Log, req: &HttpRequest, body: &web::Bytes) {
    log.lock().unwrap().push(Recorded {
        method: req.method().to_string(),
        path: req.path().to_string(),
        query: req.query_string().to_string(),
        user_id: req
            .headers()
            .get("x-user-id")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body: String::from_utf8_lossy(body).to_string(),
    });
}

async fn transactions(log: Log, req: HttpRequest, body: web::Bytes) -> HttpResponse {
    record(&log, &req, &body);
    HttpResponse::Ok().json(serde_json::json!([
        {
            "id": 7,
            "user_id": 42,
            "amount": 300.0,
            "type": "expense",
            "category": "Еда",
            "description": null,
            "date": "2024-05-01 10:00:00"
        }
    ]))
}

async fn monthly(log: Log, req: HttpRequest, body: web::Bytes) -> HttpResponse {
    record(&log, &req, &body);
    HttpResponse::Ok().json(serde_json::json!({
        "balance": 700.0,
        "total_income": 1000.0,
        "total_expense": 300.0,
        "categories": { "Еда": { "income": 0, "expense": 300 } }
    }))
}

async fn sync(log: Log, req: HttpRequest, body: web::Bytes) -> HttpResponse {
    record(&log, &req, &body);
    HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "updates": { "transactions": [] },
        "server_time": "2024-05-01T10:00:00.123456"
    }))
}

async fn family(log: Log, req: HttpRequest, body: web::Bytes) -> HttpResponse {
    record(&log, &req, &body);
    HttpResponse::Ok().json(serde_json::json!({}))
}

async fn delete_transaction(log: Log, req: HttpRequest, body: web::Bytes) -> HttpResponse {
    record(&log, &req, &body);
    HttpResponse::Ok().finish()
}

async fn slow_budgets(log: Log, req: HttpRequest, body: web::Bytes) -> HttpResponse {
    record(&log, &req, &body);
    actix_web::rt::time::sleep(Duration::from_secs(5)).await;
    HttpResponse::Ok().json(serde_json::json!([]))
}

async fn spawn_backend() -> (String, Arc<Mutex<Vec<Recorded>>>) {
    let log = Arc::new(Mutex::new(Vec::new()));
    let data = web::Data::new(log.clone());

    let server = HttpServer::new(move || {
        App::new()
            .app_data(data.clone())
            .route("/api/transactions", web::get().to(transactions))
            .route("/api/transactions/{id}", web::delete().to(delete_transaction))
            .route("/api/reports/monthly", web::get().to(monthly))
            .route("/api/sync", web::post().to(sync))
            .route("/api/family", web::get().to(family))
            .route("/api/budgets", web::get().to(slow_budgets))
    })
    .workers(1)
    .bind(("127.0.0.1", 0))
    .unwrap();

    let addr = server.addrs()[0];
    actix_web::rt::spawn(server.run());

    (format!("http://{}", addr), log)
}

fn client(base_url: &str) -> FinanceApiClient {
    FinanceApiClient::new(base_url, 42, Duration::from_secs(5)).unwrap()
}

#[actix_web::test]
async fn test_transactions_query_and_identity_header() {
    let (base_url, log) = spawn_backend().await;
    let client = client(&base_url);

    let filter = TransactionFilter {
        limit: Some(5),
        kind: Some(TransactionKind::Expense),
        category: Some(String::new()),
        date: None,
    };
    let transactions = client.get_transactions(&filter).await.unwrap();
    assert_eq!(transactions.len(), 1);
    assert_eq!(transactions[0].category, "Еда");
    assert_eq!(transactions[0].date.to_string(), "2024-05-01");

    let recorded = log.lock().unwrap()[0].clone();
    assert_eq!(recorded.method, "GET");
    assert_eq!(recorded.query, "user_id=42&limit=5&type=expense");
    assert_eq!(recorded.user_id.as_deref(), Some("42"));
}

#[actix_web::test]
async fn test_monthly_report_with_split_categories() {
    let (base_url, _log) = spawn_backend().await;

    let report = client(&base_url).get_monthly_report().await.unwrap();
    assert_eq!(report.balance, 700.0);
    assert_eq!(report.categories.len(), 1);
    assert_eq!(report.categories[0].total, 300.0);
}

#[actix_web::test]
async fn test_sync_sends_null_watermark() {
    let (base_url, log) = spawn_backend().await;
    let client = client(&base_url);

    let response = client.sync(None).await.unwrap();
    assert!(response.success);
    assert_eq!(response.server_time, "2024-05-01T10:00:00.123456");

    client.sync(Some("2024-05-01T10:00:00.123456")).await.unwrap();

    let log = log.lock().unwrap();
    let first: serde_json::Value = serde_json::from_str(&log[0].body).unwrap();
    assert_eq!(first, serde_json::json!({ "user_id": 42, "last_sync": null }));
    let second: serde_json::Value = serde_json::from_str(&log[1].body).unwrap();
    assert_eq!(second["last_sync"], "2024-05-01T10:00:00.123456");
    assert_eq!(log[1].user_id.as_deref(), Some("42"));
}

#[actix_web::test]
async fn test_no_family_means_no_members() {
    let (base_url, log) = spawn_backend().await;
    let client = client(&base_url);

    assert!(client.get_family().await.unwrap().is_none());
    assert!(client.get_family_members().await.unwrap().is_empty());

    let paths: Vec<String> = log.lock().unwrap().iter().map(|r| r.path.clone()).collect();
    assert_eq!(paths, vec!["/api/family", "/api/family"]);
}

#[actix_web::test]
async fn test_empty_delete_body_is_success() {
    let (base_url, log) = spawn_backend().await;

    let response = client(&base_url).delete_transaction(7).await.unwrap();
    assert!(response.success);
    assert_eq!(log.lock().unwrap()[0].path, "/api/transactions/7");
}

#[actix_web::test]
async fn test_non_2xx_is_request_error() {
    let (base_url, _log) = spawn_backend().await;

    let err = client(&base_url)
        .request::<serde_json::Value>(
            reqwest::Method::GET,
            "/api/missing",
            RequestOptions::default(),
        )
        .await
        .unwrap_err();

    match err {
        ApiError::Request {
            status,
            status_text,
        } => {
            assert_eq!(status, 404);
            assert_eq!(status_text, "Not Found");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[actix_web::test]
async fn test_unreachable_backend_is_network_error() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let err = client(&format!("http://127.0.0.1:{}", port))
        .get_monthly_report()
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Network(_)));
    assert!(err.status().is_none());
}

#[actix_web::test]
async fn test_slow_backend_times_out() {
    let (base_url, log) = spawn_backend().await;
    let client = FinanceApiClient::new(&base_url, 42, Duration::from_millis(300)).unwrap();

    let started = std::time::Instant::now();
    let err = client.get_budgets().await.unwrap_err();

    assert!(err.is_timeout(), "expected a timeout, got {}", err);
    assert!(matches!(err, ApiError::Network(_)));
    assert!(started.elapsed() < Duration::from_secs(4));
    assert_eq!(log.lock().unwrap().len(), 1);
}
