use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::time::Instant;

pub static REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// 请求日志中间件
pub async fn request_logging(mut req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let uri = req.uri().path().to_string();
    let request_id = req
        .headers()
        .get(&REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    // 下游处理器也能读到同一个ID
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        req.headers_mut().insert(REQUEST_ID_HEADER.clone(), value);
    }

    let start_time = Instant::now();
    tracing::info!("Request started: {} {} - request_id={}", method, uri, request_id);

    let mut response = next.run(req).await;

    tracing::info!(
        "Request completed: {} {} - {} - {}ms - request_id={}",
        method,
        uri,
        response.status(),
        start_time.elapsed().as_millis(),
        request_id
    );

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER.clone(), value);
    }

    response
}
