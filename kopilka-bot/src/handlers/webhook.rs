use actix_web::{web, HttpResponse, Result as ActixResult};
use futures::StreamExt;
use std::sync::Arc;

use crate::bot::{Dispatcher, ProcessingError};

/// Upper bound on a buffered webhook body
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

async fn read_body(mut payload: web::Payload) -> Result<web::BytesMut, ProcessingError> {
    let mut body = web::BytesMut::new();
    while let Some(chunk) = payload.next().await {
        let chunk = chunk.map_err(|e| ProcessingError::Payload(e.to_string()))?;
        if body.len() + chunk.len() > MAX_BODY_BYTES {
            return Err(ProcessingError::Payload(format!(
                "body exceeds {} bytes",
                MAX_BODY_BYTES
            )));
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

/// `POST /webhook`. Always acknowledges with `200 OK`; the update is handled
/// on a background task after the response is produced.
pub async fn webhook(
    dispatcher: web::Data<Arc<Dispatcher>>,
    payload: web::Payload,
) -> ActixResult<HttpResponse> {
    tracing::info!("POST /webhook received");

    let update = match read_body(payload).await {
        Ok(body) => Dispatcher::parse(&body),
        Err(e) => Err(e),
    };

    match update {
        Ok(update) => {
            if let Some(message) = &update.message {
                let from = message
                    .from
                    .as_ref()
                    .map(|user| user.first_name.as_str())
                    .unwrap_or("-");
                tracing::info!("From: {}", from);
                tracing::info!("Text: {:?}", message.text.as_deref().unwrap_or(""));
            }

            let dispatcher = Arc::clone(dispatcher.get_ref());
            tokio::spawn(async move {
                dispatcher.process(update).await;
            });
        }
        Err(e) => tracing::error!("Error processing update: {}", e),
    }

    Ok(HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body("OK"))
}
