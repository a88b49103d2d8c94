//! End-to-end cocktail generation from three local photos.
//!
//! Run with: `cargo run --example cocktail_studio -- glass.jpg lime.png cherry.jpg ruby`
//!
//! Requires `OPENAI_API_KEY` environment variable.

use cocktailviz::prelude::*;

#[tokio::main]
async fn main() -> cocktailviz::Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.len() < 3 {
        eprintln!("usage: cocktail_studio <glass> <garniture> <bite> [color]");
        std::process::exit(2);
    }

    let vision = OpenAiVisionProvider::builder().build()?;
    let images = OpenAiImageProvider::builder().build()?;

    let mut session = Session::new();
    for (role, path) in Role::ALL.into_iter().zip(&args) {
        session.upload_path(role, path)?;
    }
    if let Some(color) = args.get(3) {
        session.set_color(color.as_str());
    }

    let prompt = session.analyze(&vision).await?;
    println!("Prompt: {}", prompt.text());

    let image = session.generate(&images).await?.clone();
    let written = image.save(images.http_client(), "cocktail.png").await?;
    println!("Generated image: {} ({} bytes saved to cocktail.png)", image.url, written);

    Ok(())
}
