use actix_web::{web, HttpResponse, Result as ActixResult};
use chrono::{SecondsFormat, Utc};
use shared_types::HealthResponse;

/// Static facts shown by the status endpoints
#[derive(Debug, Clone)]
pub struct ServerInfo {
    pub hosting: String,
    pub bot_username: String,
}

pub async fn health(info: web::Data<ServerInfo>) -> ActixResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(HealthResponse {
        status: "ok".to_string(),
        hosting: info.hosting.clone(),
        time: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    }))
}

pub async fn index(info: web::Data<ServerInfo>) -> ActixResult<HttpResponse> {
    let html = format!(
        r#"<!DOCTYPE html>
<html lang="ru">
<head><meta charset="utf-8"><title>Копилка</title></head>
<body>
  <h1>🤖 Бот "Копилка" на {hosting}</h1>
  <p>Статус: <strong>Работает ✅</strong></p>
  <p>Вебхук: POST /webhook</p>
  <p>Telegram: @{username}</p>
  <p><a href="/health">Health check</a></p>
</body>
</html>
"#,
        hosting = info.hosting.trim_end_matches(".com"),
        username = info.bot_username,
    );

    Ok(HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(html))
}
