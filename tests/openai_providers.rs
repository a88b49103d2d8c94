//! OpenAI providers against a local mock server.

use cocktailviz::{
    CocktailError, GenerationRequest, ImageProvider, OpenAiImageModel, OpenAiImageProvider,
    OpenAiVisionProvider, Role, UploadedImage, VisionProvider,
};
use mockito::Matcher;
use serde_json::json;

const JPEG: [u8; 12] = [0xFF, 0xD8, 0xFF, 0xE0, 0, 0x10, b'J', b'F', b'I', b'F', 0, 1];

fn vision(server: &mockito::ServerGuard) -> OpenAiVisionProvider {
    OpenAiVisionProvider::builder()
        .api_key("sk-test")
        .base_url(server.url())
        .build()
        .unwrap()
}

fn images(server: &mockito::ServerGuard) -> OpenAiImageProvider {
    OpenAiImageProvider::builder()
        .api_key("sk-test")
        .base_url(server.url())
        .build()
        .unwrap()
}

#[tokio::test]
async fn describe_sends_image_and_trims_reply() {
    let mut server = mockito::Server::new_async().await;
    let image = UploadedImage::new(Role::Glass, JPEG.to_vec()).unwrap();

    let mock = server
        .mock("POST", "/chat/completions")
        .match_header("authorization", "Bearer sk-test")
        .match_body(Matcher::PartialJson(json!({
            "model": "gpt-4o",
            "max_tokens": 100,
            "messages": [
                {
                    "role": "system",
                    "content": "You are a visual assistant. Briefly describe this glass for photorealistic image generation."
                },
                {
                    "role": "user",
                    "content": [{"type": "image_url", "image_url": {"url": image.to_data_url()}}]
                }
            ]
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"choices": [{"index": 0, "message": {"role": "assistant", "content": "  A frosted coupe glass.\n"}}]}"#,
        )
        .create_async()
        .await;

    let text = vision(&server).describe(&image).await.unwrap();
    assert_eq!(text, "A frosted coupe glass.");
    mock.assert_async().await;
}

#[tokio::test]
async fn describe_maps_auth_failure() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/chat/completions")
        .with_status(401)
        .with_body(r#"{"error": {"message": "Incorrect API key provided: sk-test"}}"#)
        .create_async()
        .await;

    let image = UploadedImage::new(Role::Bite, JPEG.to_vec()).unwrap();
    let err = vision(&server).describe(&image).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "authentication failed: Incorrect API key provided: sk-test"
    );
}

#[tokio::test]
async fn describe_without_choices_is_unexpected() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"choices": []}"#)
        .create_async()
        .await;

    let image = UploadedImage::new(Role::Garniture, JPEG.to_vec()).unwrap();
    let err = vision(&server).describe(&image).await.unwrap_err();
    assert!(matches!(err, CocktailError::UnexpectedResponse(_)));
}

#[tokio::test]
async fn generate_requests_one_square_standard_image() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/images/generations")
        .match_header("authorization", "Bearer sk-test")
        .match_body(Matcher::Json(json!({
            "model": "dall-e-3",
            "prompt": "A ruby negroni",
            "n": 1,
            "size": "1024x1024",
            "quality": "standard"
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"created": 1, "data": [{"url": "https://cdn.example/negroni.png", "revised_prompt": "A ruby negroni, studio lit"}]}"#,
        )
        .create_async()
        .await;

    let image = images(&server)
        .generate(&GenerationRequest::new("A ruby negroni"))
        .await
        .unwrap();

    assert_eq!(image.url, "https://cdn.example/negroni.png");
    assert_eq!(image.metadata.model.as_deref(), Some("dall-e-3"));
    assert_eq!(
        image.metadata.revised_prompt.as_deref(),
        Some("A ruby negroni, studio lit")
    );
    mock.assert_async().await;
}

#[tokio::test]
async fn generate_inline_image_can_be_saved() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/images/generations")
        .match_body(Matcher::Json(json!({
            "model": "gpt-image-1",
            "prompt": "A mojito",
            "n": 1,
            "size": "1024x1024"
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"data": [{"b64_json": "iVBORw0KGgo="}]}"#)
        .create_async()
        .await;

    let provider = OpenAiImageProvider::builder()
        .api_key("sk-test")
        .base_url(server.url())
        .model(OpenAiImageModel::GptImage1)
        .build()
        .unwrap();
    let image = provider
        .generate(&GenerationRequest::new("A mojito"))
        .await
        .unwrap();
    assert!(image.is_inline());
    mock.assert_async().await;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mojito.png");
    let written = image.save(provider.http_client(), &path).await.unwrap();
    assert_eq!(written, 8);
    assert_eq!(
        std::fs::read(&path).unwrap(),
        vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]
    );
}

#[tokio::test]
async fn generated_url_is_downloaded() {
    let mut server = mockito::Server::new_async().await;
    let _img = server
        .mock("GET", "/files/cocktail.png")
        .with_status(200)
        .with_header("content-type", "image/png")
        .with_body([1u8, 2, 3, 4])
        .create_async()
        .await;

    let image = cocktailviz::GeneratedImage::new(
        format!("{}/files/cocktail.png", server.url()),
        Default::default(),
    );
    let bytes = image.download(&reqwest::Client::new()).await.unwrap();
    assert_eq!(bytes, vec![1, 2, 3, 4]);
}

#[tokio::test]
async fn generate_maps_content_policy_rejection() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/images/generations")
        .with_status(400)
        .with_body(r#"{"error": {"code": "content_policy_violation", "message": "Your request was rejected as a result of our safety system."}}"#)
        .create_async()
        .await;

    let err = images(&server)
        .generate(&GenerationRequest::new("something"))
        .await
        .unwrap_err();
    assert!(matches!(err, CocktailError::ContentBlocked(_)));
}
