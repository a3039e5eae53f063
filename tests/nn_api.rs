use std::io::Cursor;
use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};

use caloriecam::nn::api::{self, GetPrediction};
use caloriecam::nn::preprocess::ImageTensor;
use caloriecam::nn::{ClassNames, Engine, EngineError, NeuralNetworkService};
use caloriecam::store::{BlobStore, MemoryBlobStore};

/// Scores `winner` highest and checks the tensor it was handed.
struct Scripted {
    winner: usize,
    outputs: usize,
}

impl Engine for Scripted {
    fn predict(&self, input: &ImageTensor) -> Result<Vec<f32>, EngineError> {
        if input.shape() != [1, 224, 224, 3] {
            return Err(EngineError::Inference(format!("bad shape {:?}", input.shape())));
        }
        let mut scores = vec![0.001; self.outputs];
        scores[self.winner] = 0.9;
        Ok(scores)
    }
}

fn food101() -> ClassNames {
    ClassNames::parse(include_str!("../resources/class_names.txt"))
}

fn jpeg_like_photo() -> Vec<u8> {
    let buffer = ImageBuffer::from_fn(32, 24, |x, y| Rgb([(x * 8) as u8, (y * 10) as u8, 90]));
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(buffer)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

fn nn_service(blobs: Arc<MemoryBlobStore>, engine: Scripted) -> web::Data<NeuralNetworkService> {
    web::Data::new(NeuralNetworkService::new(
        blobs,
        Arc::new(engine),
        food101(),
        101,
        (224, 224),
    ))
}

fn pizza_index() -> usize {
    food101().to_vec().iter().position(|n| n == "pizza").unwrap()
}

#[actix_web::test]
async fn stored_image_is_classified() {
    let blobs = Arc::new(MemoryBlobStore::new());
    let image_id = blobs.put(&jpeg_like_photo()).unwrap();
    let data = nn_service(
        blobs,
        Scripted {
            winner: pizza_index(),
            outputs: 101,
        },
    );
    let app = test::init_service(App::new().app_data(data).configure(api::configure)).await;

    let req = test::TestRequest::get()
        .uri(&format!("/nn/predict/{}", image_id))
        .to_request();
    let body: GetPrediction = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body.predicted_class, "pizza");
}

#[actix_web::test]
async fn missing_image_is_not_found() {
    let blobs = Arc::new(MemoryBlobStore::new());
    let data = nn_service(blobs, Scripted { winner: 0, outputs: 101 });
    let app = test::init_service(App::new().app_data(data).configure(api::configure)).await;

    for id in ["0123456789abcdef0123456789abcdef", "not-an-object-id"] {
        let req = test::TestRequest::get()
            .uri(&format!("/nn/predict/{}", id))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["detail"], "Image not found or prediction failed");
    }
}

#[actix_web::test]
async fn empty_image_is_not_found() {
    let blobs = Arc::new(MemoryBlobStore::new());
    let image_id = blobs.put(b"").unwrap();
    let data = nn_service(blobs, Scripted { winner: 0, outputs: 101 });
    let app = test::init_service(App::new().app_data(data).configure(api::configure)).await;

    let req = test::TestRequest::get()
        .uri(&format!("/nn/predict/{}", image_id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["detail"], "Image not found or prediction failed");
}

#[actix_web::test]
async fn undecodable_image_is_unprocessable() {
    let blobs = Arc::new(MemoryBlobStore::new());
    let image_id = blobs.put(b"plain text, not a photo").unwrap();
    let data = nn_service(blobs, Scripted { winner: 0, outputs: 101 });
    let app = test::init_service(App::new().app_data(data).configure(api::configure)).await;

    let req = test::TestRequest::get()
        .uri(&format!("/nn/predict/{}", image_id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[actix_web::test]
async fn output_beyond_the_label_set_is_an_error() {
    let blobs = Arc::new(MemoryBlobStore::new());
    let image_id = blobs.put(&jpeg_like_photo()).unwrap();
    let data = nn_service(
        blobs,
        Scripted {
            winner: 150,
            outputs: 200,
        },
    );
    let app = test::init_service(App::new().app_data(data).configure(api::configure)).await;

    let req = test::TestRequest::get()
        .uri(&format!("/nn/predict/{}", image_id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[actix_web::test]
async fn class_listing_and_count() {
    let blobs = Arc::new(MemoryBlobStore::new());
    let data = nn_service(blobs, Scripted { winner: 0, outputs: 101 });
    let app = test::init_service(App::new().app_data(data).configure(api::configure)).await;

    let req = test::TestRequest::get().uri("/nn/classes").to_request();
    let classes: Vec<String> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(classes.len(), 101);
    assert_eq!(classes[0], "apple_pie");
    assert_eq!(classes[100], "waffles");

    let req = test::TestRequest::get().uri("/nn/classes/count").to_request();
    let count: usize = test::call_and_read_body_json(&app, req).await;
    assert_eq!(count, 101);

    let req = test::TestRequest::get().uri("/").to_request();
    let greeting: String = test::call_and_read_body_json(&app, req).await;
    assert_eq!(greeting, "Hello, from NeuralNetworkService");
}
