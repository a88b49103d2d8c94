//! Analyze, edit and generate through a session against a mock OpenAI server.

use cocktailviz::{
    CocktailError, OpenAiImageProvider, OpenAiVisionProvider, Role, Session, SessionState,
    UploadedImage,
};
use mockito::Matcher;
use serde_json::json;

const PNG: [u8; 12] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0x0D];

fn caption(text: &str) -> String {
    json!({"choices": [{"index": 0, "message": {"role": "assistant", "content": text}}]}).to_string()
}

async fn mock_caption(server: &mut mockito::ServerGuard, role: Role, text: &str) -> mockito::Mock {
    server
        .mock("POST", "/chat/completions")
        .match_body(Matcher::Regex(format!("describe this {} for", role)))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(caption(text))
        .create_async()
        .await
}

fn providers(server: &mockito::ServerGuard) -> (OpenAiVisionProvider, OpenAiImageProvider) {
    let vision = OpenAiVisionProvider::builder()
        .api_key("sk-test")
        .base_url(server.url())
        .build()
        .unwrap();
    let images = OpenAiImageProvider::builder()
        .api_key("sk-test")
        .base_url(server.url())
        .build()
        .unwrap();
    (vision, images)
}

fn session_with_uploads() -> Session {
    let mut session = Session::new();
    for role in Role::ALL {
        session.upload(UploadedImage::new(role, PNG.to_vec()).unwrap());
    }
    session
}

#[tokio::test]
async fn full_flow_sends_edited_prompt() {
    let mut server = mockito::Server::new_async().await;
    let glass = mock_caption(&mut server, Role::Glass, "a tall chilled highball glass").await;
    let garniture = mock_caption(&mut server, Role::Garniture, "a twisted lime peel").await;
    let bite = mock_caption(&mut server, Role::Bite, "a skewered red cherry").await;
    let generation = server
        .mock("POST", "/images/generations")
        .match_body(Matcher::PartialJson(json!({
            "prompt": "A ruby cocktail in a highball glass. White background.",
            "size": "1024x1024",
            "quality": "standard",
            "n": 1
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"data": [{"url": "https://cdn.example/cocktail.png"}]}"#)
        .create_async()
        .await;

    let (vision, images) = providers(&server);
    let mut session = session_with_uploads();
    session.set_color("ruby");

    let prompt = session.analyze(&vision).await.unwrap();
    assert_eq!(
        prompt.text(),
        "Create a photorealistic image of a cocktail in a glass that looks like this: a tall chilled highball glass. \
         Place a garniture on the rim that resembles this: a twisted lime peel, and a floating bite similar to this: a skewered red cherry. \
         The cocktail liquid should be ruby. No ice cube floating. White background."
    );
    assert_eq!(session.state(), SessionState::PromptReady);

    session
        .edit_prompt("A ruby cocktail in a highball glass. White background.")
        .unwrap();
    let image = session.generate(&images).await.unwrap();
    assert_eq!(image.url, "https://cdn.example/cocktail.png");
    assert_eq!(session.state(), SessionState::ImageShown);

    glass.assert_async().await;
    garniture.assert_async().await;
    bite.assert_async().await;
    generation.assert_async().await;
}

#[tokio::test]
async fn failed_description_is_embedded_in_prompt() {
    let mut server = mockito::Server::new_async().await;
    let _glass = mock_caption(&mut server, Role::Glass, "a martini glass").await;
    let _bite = mock_caption(&mut server, Role::Bite, "a green olive").await;
    let _garniture = server
        .mock("POST", "/chat/completions")
        .match_body(Matcher::Regex("describe this garniture for".into()))
        .with_status(500)
        .with_body(r#"{"error": {"message": "The server had an error"}}"#)
        .create_async()
        .await;

    let (vision, _) = providers(&server);
    let mut session = session_with_uploads();

    let prompt = session.analyze(&vision).await.unwrap();
    assert!(prompt
        .text()
        .contains("resembles this: Error analyzing garniture: API error: 500 - The server had an error,"));
    assert!(prompt.text().contains("a martini glass"));
    assert!(prompt.text().contains("a green olive"));
    assert_eq!(prompt.failed_roles(), &[Role::Garniture]);
    assert_eq!(session.state(), SessionState::PromptReady);
}

#[tokio::test]
async fn missing_upload_makes_no_request() {
    let mut server = mockito::Server::new_async().await;
    let any_call = server
        .mock("POST", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let (vision, _) = providers(&server);
    let mut session = session_with_uploads();
    session.clear_upload(Role::Bite);

    let err = session.analyze(&vision).await.unwrap_err();
    assert!(matches!(err, CocktailError::MissingImages(_)));
    assert_eq!(
        err.to_string(),
        "please upload all 3 images (missing: bite)"
    );
    any_call.assert_async().await;
}

#[tokio::test]
async fn generation_failure_leaves_no_image() {
    let mut server = mockito::Server::new_async().await;
    let mut captions = Vec::new();
    for role in Role::ALL {
        captions.push(mock_caption(&mut server, role, "something shiny").await);
    }
    let _generation = server
        .mock("POST", "/images/generations")
        .with_status(429)
        .with_header("retry-after", "30")
        .with_body(r#"{"error": {"message": "Rate limit reached"}}"#)
        .create_async()
        .await;

    let (vision, images) = providers(&server);
    let mut session = session_with_uploads();
    session.analyze(&vision).await.unwrap();

    let err = session.generate(&images).await.unwrap_err();
    assert!(matches!(err, CocktailError::RateLimited { .. }));
    assert!(session.image().is_none());
    assert_eq!(session.state(), SessionState::ErrorShown);
    assert!(session
        .error()
        .unwrap()
        .starts_with("Error generating image: rate limited"));
}

#[tokio::test]
async fn missing_credential_degrades_descriptions() {
    let server = mockito::Server::new_async().await;
    let vision = OpenAiVisionProvider::builder()
        .api_key("")
        .base_url(server.url())
        .build()
        .unwrap();

    let mut session = session_with_uploads();
    let prompt = session.analyze(&vision).await.unwrap();
    for role in Role::ALL {
        assert!(prompt
            .text()
            .contains(&format!("Error analyzing {}: authentication failed", role)));
    }
    assert_eq!(prompt.failed_roles(), &Role::ALL);
}
