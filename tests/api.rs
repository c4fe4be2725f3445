use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use base64::Engine;
use http_body_util::BodyExt;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use ndarray::{Array4, ArrayD, IxDyn};
use serde_json::Value;
use skin_analysis::{
    config::{AnalysisConfig, ServerConfig},
    models::{InferenceModel, InputLayout},
    web::{create_app, AppState},
    AnalysisPipeline, ModelSet, Result, SkinTypeMode,
};
use std::io::Cursor;
use std::sync::Arc;
use tower::ServiceExt;

/// 输出取决于输入均值的确定性模型
struct MeanModel {
    name: &'static str,
    layout: InputLayout,
    outputs: usize,
}

impl InferenceModel for MeanModel {
    fn name(&self) -> &str {
        self.name
    }

    fn input_layout(&self) -> InputLayout {
        self.layout
    }

    fn run(&self, input: Array4<f32>) -> Result<ArrayD<f32>> {
        let mean = input.mean().unwrap_or(0.0);
        let values: Vec<f32> = (0..self.outputs)
            .map(|i| 1.0 / (1.0 + (-(mean + i as f32 * 0.3)).exp()))
            .collect();
        Ok(ArrayD::from_shape_vec(IxDyn(&[1, self.outputs]), values).unwrap())
    }
}

fn app(mode: SkinTypeMode) -> Router {
    app_with_limit(mode, 10 * 1024 * 1024)
}

fn app_with_limit(mode: SkinTypeMode, max_request_size: usize) -> Router {
    let models = ModelSet::from_models(
        Arc::new(MeanModel { name: "disease", layout: InputLayout::Nchw, outputs: 2 }),
        Arc::new(MeanModel { name: "acne", layout: InputLayout::Nchw, outputs: 1 }),
        Arc::new(MeanModel { name: "skin_type", layout: InputLayout::Nhwc, outputs: 3 }),
    )
    .unwrap();

    let pipeline = AnalysisPipeline::new(
        Arc::new(models),
        AnalysisConfig {
            skin_type_mode: mode,
            max_image_bytes: 10 * 1024 * 1024,
        },
    );

    let server_config = ServerConfig { max_request_size };

    create_app(AppState::new(pipeline), &server_config)
}

fn encode(image: DynamicImage, format: ImageFormat) -> String {
    let mut buf = Cursor::new(Vec::new());
    image.write_to(&mut buf, format).unwrap();
    base64::engine::general_purpose::STANDARD.encode(buf.into_inner())
}

fn face_png() -> String {
    let img = RgbImage::from_fn(300, 200, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 128]));
    encode(DynamicImage::ImageRgb8(img), ImageFormat::Png)
}

fn json_request(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/predict")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn query_escape(value: &str) -> String {
    value
        .replace('+', "%2B")
        .replace('/', "%2F")
        .replace('=', "%3D")
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn assert_unit(value: &Value) {
    let v = value.as_f64().expect("number");
    assert!((0.0..=1.0).contains(&v), "{} outside [0,1]", v);
}

#[tokio::test]
async fn predicts_from_json_body() {
    let app = app(SkinTypeMode::Joined);
    let (status, body) = send(&app, json_request(serde_json::json!({ "image_base64": face_png() }))).await;

    assert_eq!(status, StatusCode::OK);
    let predictions = &body["predictions"];

    let disease = predictions["disease"].as_object().unwrap();
    let keys: Vec<&str> = disease.keys().map(|k| k.as_str()).collect();
    assert_eq!(keys.len(), 2);
    assert!(keys.contains(&"eczema"));
    assert!(keys.contains(&"seborrheic_keratosis"));
    disease.values().for_each(assert_unit);

    assert_unit(&predictions["acne"]);

    let skin_type = predictions["skin_type"].as_object().unwrap();
    for label in ["dry", "normal", "oily"] {
        assert!(skin_type.contains_key(label));
    }
}

#[tokio::test]
async fn predicts_from_query_parameter() {
    let app = app(SkinTypeMode::Joined);
    let uri = format!("/predict?image_base64={}", query_escape(&face_png()));
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_unit(&body["predictions"]["acne"]);
}

#[tokio::test]
async fn accepts_image_alias_and_alpha_channel() {
    let app = app(SkinTypeMode::Joined);
    let rgba = RgbaImage::from_pixel(40, 90, Rgba([200, 150, 100, 10]));
    let data = encode(DynamicImage::ImageRgba8(rgba), ImageFormat::Png);

    let (status, _) = send(&app, json_request(serde_json::json!({ "image": data }))).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn identical_input_gives_identical_output() {
    let app = app(SkinTypeMode::Joined);
    let data = face_png();

    let (_, first) = send(&app, json_request(serde_json::json!({ "image_base64": data.clone() }))).await;
    let (_, second) = send(&app, json_request(serde_json::json!({ "image_base64": data }))).await;

    assert_eq!(first["predictions"]["disease"], second["predictions"]["disease"]);
    assert_eq!(first["predictions"]["acne"], second["predictions"]["acne"]);
}

#[tokio::test]
async fn malformed_base64_is_a_server_error() {
    let app = app(SkinTypeMode::Joined);
    let (status, body) = send(&app, json_request(serde_json::json!({ "image_base64": "@@not*base64@@" }))).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["code"], "BASE64_DECODE_ERROR");
    assert!(!body["detail"].as_str().unwrap().contains("@@"));
}

#[tokio::test]
async fn corrupt_image_is_a_server_error() {
    let app = app(SkinTypeMode::Joined);
    let mut bytes = base64::engine::general_purpose::STANDARD
        .decode(face_png())
        .unwrap();
    bytes.truncate(40);
    let data = base64::engine::general_purpose::STANDARD.encode(bytes);

    let (status, body) = send(&app, json_request(serde_json::json!({ "image_base64": data }))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["code"], "IMAGE_DECODE_ERROR");
}

#[tokio::test]
async fn empty_and_missing_image_are_rejected() {
    let app = app(SkinTypeMode::Joined);

    let (status, body) = send(&app, json_request(serde_json::json!({ "image_base64": "" }))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["code"], "EMPTY_PAYLOAD");

    let (status, body) = send(&app, json_request(serde_json::json!({}))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["code"], "INVALID_INPUT");
}

#[tokio::test]
async fn oversized_body_is_a_json_server_error() {
    let app = app_with_limit(SkinTypeMode::Joined, 1000);
    let data = "A".repeat(4096);

    let (status, body) = send(&app, json_request(serde_json::json!({ "image_base64": data }))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["code"], "PAYLOAD_TOO_LARGE");
    assert_eq!(body["detail"], "Image payload is too large");
}

#[tokio::test]
async fn line_wrapped_base64_is_accepted() {
    let app = app(SkinTypeMode::Joined);
    let data = face_png();
    let wrapped = data
        .as_bytes()
        .chunks(76)
        .map(|chunk| std::str::from_utf8(chunk).unwrap())
        .collect::<Vec<_>>()
        .join("\r\n");

    let (status, body) = send(&app, json_request(serde_json::json!({ "image_base64": wrapped }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_unit(&body["predictions"]["acne"]);
}

#[tokio::test]
async fn detached_mode_omits_skin_type() {
    let app = app(SkinTypeMode::Detached);
    let (status, body) = send(&app, json_request(serde_json::json!({ "image_base64": face_png() }))).await;

    assert_eq!(status, StatusCode::OK);
    let predictions = body["predictions"].as_object().unwrap();
    assert!(predictions.contains_key("disease"));
    assert!(predictions.contains_key("acne"));
    // 客户端必须容忍缺失的 skin_type
    assert!(predictions.get("skin_type").is_none());
}

#[tokio::test]
async fn echoes_request_id() {
    let app = app(SkinTypeMode::Joined);
    let request = Request::builder()
        .method("POST")
        .uri("/predict")
        .header("content-type", "application/json")
        .header("x-request-id", "req-42")
        .body(Body::from(serde_json::json!({ "image_base64": face_png() }).to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.headers()["x-request-id"], "req-42");
}

#[tokio::test]
async fn only_predict_is_routed() {
    let app = app(SkinTypeMode::Joined);
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
