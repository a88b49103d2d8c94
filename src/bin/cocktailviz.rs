//! CLI for Cocktailviz - describe three cocktail components and render the drink.

use clap::{Args, Parser, Subcommand, ValueEnum};
use cocktailviz::{
    CocktailError, GeneratedImage, ImageProvider, OpenAiImageModel, OpenAiImageProvider,
    OpenAiVisionModel, OpenAiVisionProvider, PromptState, Role, Session, VisionProvider,
    API_KEY_ENV, DEFAULT_COLOR,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cocktailviz")]
#[command(about = "Describe a glass, garniture and bite with GPT-4o, then render the cocktail")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Session file carrying the prompt between commands
    #[arg(
        long,
        global = true,
        env = "COCKTAILVIZ_SESSION",
        default_value = ".cocktailviz-session.json"
    )]
    session: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Describe the three images and compose a prompt
    Analyze(AnalyzeArgs),

    /// Replace the prompt (opens $EDITOR without --prompt)
    Edit(EditArgs),

    /// Show the current prompt and last result
    Show,

    /// Generate the cocktail image from the current prompt
    Generate(GenerateArgs),

    /// Analyze, review and generate interactively
    Studio(StudioArgs),

    /// Check credentials and provider configuration
    Check,
}

#[derive(Args)]
struct UploadArgs {
    /// Glass image (JPEG or PNG)
    #[arg(long)]
    glass: Option<PathBuf>,

    /// Garniture on the rim (JPEG or PNG)
    #[arg(long)]
    garniture: Option<PathBuf>,

    /// Bite floating inside (JPEG or PNG)
    #[arg(long)]
    bite: Option<PathBuf>,

    /// Cocktail liquid color
    #[arg(short, long, default_value = DEFAULT_COLOR)]
    color: String,
}

#[derive(Args)]
struct VisionArgs {
    /// Vision model used for the descriptions
    #[arg(long, value_enum, default_value = "gpt-4o")]
    vision_model: VisionModelArg,

    /// Caption length cap in tokens
    #[arg(long, default_value_t = 100)]
    max_tokens: u32,
}

#[derive(Args)]
struct ImageArgs {
    /// Image model
    #[arg(long, value_enum, default_value = "dall-e-3")]
    image_model: ImageModelArg,

    /// Quality tier (dall-e-3: standard, hd; gpt-image-1: low, medium, high)
    #[arg(long)]
    quality: Option<String>,

    /// Download the generated image to this path
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Args)]
struct AnalyzeArgs {
    #[command(flatten)]
    uploads: UploadArgs,

    #[command(flatten)]
    vision: VisionArgs,
}

#[derive(Args)]
struct EditArgs {
    /// New prompt text
    #[arg(short, long)]
    prompt: Option<String>,
}

#[derive(Args)]
struct GenerateArgs {
    #[command(flatten)]
    image: ImageArgs,
}

#[derive(Args)]
struct StudioArgs {
    #[command(flatten)]
    uploads: UploadArgs,

    #[command(flatten)]
    vision: VisionArgs,

    #[command(flatten)]
    image: ImageArgs,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum VisionModelArg {
    #[value(name = "gpt-4o")]
    Gpt4o,
    #[value(name = "gpt-4o-mini")]
    Gpt4oMini,
}

impl From<VisionModelArg> for OpenAiVisionModel {
    fn from(arg: VisionModelArg) -> Self {
        match arg {
            VisionModelArg::Gpt4o => OpenAiVisionModel::Gpt4o,
            VisionModelArg::Gpt4oMini => OpenAiVisionModel::Gpt4oMini,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ImageModelArg {
    #[value(name = "dall-e-3")]
    DallE3,
    #[value(name = "gpt-image-1")]
    GptImage1,
}

impl From<ImageModelArg> for OpenAiImageModel {
    fn from(arg: ImageModelArg) -> Self {
        match arg {
            ImageModelArg::DallE3 => OpenAiImageModel::DallE3,
            ImageModelArg::GptImage1 => OpenAiImageModel::GptImage1,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<CocktailError>() {
                Some(err) if err.is_warning() => eprintln!("Warning: {err}"),
                _ => eprintln!("Error: {e:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Analyze(args) => analyze(args, &cli.session, cli.json).await,
        Commands::Edit(args) => edit(args, &cli.session, cli.json),
        Commands::Show => show(&cli.session, cli.json),
        Commands::Generate(args) => generate(args, &cli.session, cli.json).await,
        Commands::Studio(args) => studio(args, &cli.session).await,
        Commands::Check => check(cli.json).await,
    }
}

fn vision_provider(args: &VisionArgs) -> cocktailviz::Result<OpenAiVisionProvider> {
    OpenAiVisionProvider::builder()
        .model(args.vision_model.into())
        .max_tokens(args.max_tokens)
        .build()
}

fn image_provider(args: &ImageArgs) -> cocktailviz::Result<OpenAiImageProvider> {
    let mut builder = OpenAiImageProvider::builder().model(args.image_model.into());
    if let Some(quality) = &args.quality {
        builder = builder.quality(quality);
    }
    builder.build()
}

fn load_session(path: &Path) -> anyhow::Result<Session> {
    if !path.exists() {
        anyhow::bail!(
            "no session at {}; run `cocktailviz analyze` first",
            path.display()
        );
    }
    Ok(Session::load(path)?)
}

fn session_with_uploads(args: &UploadArgs) -> cocktailviz::Result<Session> {
    let mut session = Session::new();
    session.set_color(&args.color);
    for (role, path) in [
        (Role::Glass, &args.glass),
        (Role::Garniture, &args.garniture),
        (Role::Bite, &args.bite),
    ] {
        if let Some(path) = path {
            session.upload_path(role, path)?;
        }
    }
    Ok(session)
}

fn prompt_json(prompt: &PromptState) -> serde_json::Value {
    serde_json::json!({
        "prompt": prompt.text(),
        "failed_roles": prompt.failed_roles(),
        "edited": prompt.is_edited(),
    })
}

fn print_prompt(prompt: &PromptState) {
    println!("Final prompt:\n\n{}\n", prompt.text());
    for role in prompt.failed_roles() {
        eprintln!("Warning: the {} description failed; its error text is in the prompt", role);
    }
}

async fn analyze(args: AnalyzeArgs, session_path: &Path, json_output: bool) -> anyhow::Result<()> {
    let mut session = session_with_uploads(&args.uploads)?;
    let vision = vision_provider(&args.vision)?;

    if !json_output {
        eprintln!("Describing images with {}...", vision.model().as_str());
    }
    let prompt = session.analyze(&vision).await?.clone();
    session.save(session_path)?;

    if json_output {
        let mut result = prompt_json(&prompt);
        result["session"] = session_path.display().to_string().into();
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_prompt(&prompt);
        println!("Session saved to {}", session_path.display());
    }
    Ok(())
}

fn edit(args: EditArgs, session_path: &Path, json_output: bool) -> anyhow::Result<()> {
    let mut session = load_session(session_path)?;
    let current = session
        .prompt()
        .ok_or(CocktailError::NoPrompt)?
        .text()
        .to_string();

    let text = match args.prompt {
        Some(text) => Some(text),
        None => dialoguer::Editor::new().extension(".txt").edit(&current)?,
    };

    let Some(text) = text else {
        eprintln!("Prompt unchanged");
        return Ok(());
    };
    session.edit_prompt(text.trim_end())?;
    session.save(session_path)?;

    let prompt = session.prompt().ok_or(CocktailError::NoPrompt)?;
    if json_output {
        println!("{}", serde_json::to_string_pretty(&prompt_json(prompt))?);
    } else {
        print_prompt(prompt);
    }
    Ok(())
}

fn show(session_path: &Path, json_output: bool) -> anyhow::Result<()> {
    let session = load_session(session_path)?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&session)?);
        return Ok(());
    }

    println!("State: {}", session.state());
    println!("Color: {}", session.color());
    match session.prompt() {
        Some(prompt) => print_prompt(prompt),
        None => println!("No prompt yet"),
    }
    if let Some(image) = session.image() {
        print_image(image);
    }
    if let Some(error) = session.error() {
        println!("{}", error);
    }
    Ok(())
}

fn print_image(image: &GeneratedImage) {
    if image.is_inline() {
        println!("Generated image returned inline; use --output to save it");
    } else {
        println!("Generated cocktail: {}", image.url);
        println!("Download: {}", image.url);
    }
    if let Some(duration) = image.metadata.duration_ms {
        println!("Duration: {}ms", duration);
    }
}

async fn save_output(
    provider: &OpenAiImageProvider,
    image: &GeneratedImage,
    output: Option<&Path>,
    json_output: bool,
) -> anyhow::Result<Option<usize>> {
    let Some(output) = output else {
        return Ok(None);
    };
    let written = image.save(provider.http_client(), output).await?;
    if !json_output {
        println!("Saved {} ({} bytes)", output.display(), written);
    }
    Ok(Some(written))
}

async fn generate(args: GenerateArgs, session_path: &Path, json_output: bool) -> anyhow::Result<()> {
    let mut session = load_session(session_path)?;
    let provider = image_provider(&args.image)?;

    if !json_output {
        eprintln!("Generating image using {}...", provider.model().as_str());
    }
    let result = session.generate(&provider).await.cloned();
    session.save(session_path)?;
    let image = result?;

    let written = save_output(&provider, &image, args.image.output.as_deref(), json_output).await?;

    if json_output {
        let result = serde_json::json!({
            "type": "image",
            "success": true,
            "url": image.url,
            "output": args.image.output.as_ref().map(|p| p.display().to_string()),
            "size_bytes": written,
            "model": image.metadata.model,
            "duration_ms": image.metadata.duration_ms,
            "revised_prompt": image.metadata.revised_prompt,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_image(&image);
    }
    Ok(())
}

async fn studio(args: StudioArgs, session_path: &Path) -> anyhow::Result<()> {
    let mut session = session_with_uploads(&args.uploads)?;
    let vision = vision_provider(&args.vision)?;
    let images = image_provider(&args.image)?;

    for role in Role::ALL {
        if let Some(upload) = session.upload_for(role) {
            println!("{}: {:?}, {} bytes", role.slot_label(), upload.format(), upload.size());
        }
    }

    eprintln!("Describing images with {}...", vision.model().as_str());
    print_prompt(session.analyze(&vision).await?);
    session.save(session_path)?;

    let steps = ["Generate image", "Edit prompt", "Quit"];
    loop {
        let choice = dialoguer::Select::new()
            .with_prompt("Next step")
            .items(&steps)
            .default(0)
            .interact_opt()?;

        match choice {
            Some(0) => {
                eprintln!("Generating image using {}...", images.model().as_str());
                match session.generate(&images).await.cloned() {
                    Ok(image) => {
                        print_image(&image);
                        save_output(&images, &image, args.image.output.as_deref(), false).await?;
                    }
                    Err(_) => {
                        if let Some(error) = session.error() {
                            eprintln!("{}", error);
                        }
                    }
                }
                session.save(session_path)?;
            }
            Some(1) => {
                let current = session
                    .prompt()
                    .map(|p| p.text().to_string())
                    .unwrap_or_default();
                if let Some(text) = dialoguer::Editor::new().extension(".txt").edit(&current)? {
                    session.edit_prompt(text.trim_end())?;
                    session.save(session_path)?;
                }
                if let Some(prompt) = session.prompt() {
                    print_prompt(prompt);
                }
            }
            _ => break,
        }
    }
    Ok(())
}

async fn check(json_output: bool) -> anyhow::Result<()> {
    let vision = OpenAiVisionProvider::builder().build()?;
    let images = OpenAiImageProvider::builder().build()?;

    let vision_status = vision.health_check().await;
    let image_status = images.health_check().await;

    if json_output {
        let status = |r: &cocktailviz::Result<()>| match r {
            Ok(()) => serde_json::json!({"ok": true}),
            Err(e) => serde_json::json!({"ok": false, "error": e.to_string()}),
        };
        let result = serde_json::json!({
            "api_key_env": API_KEY_ENV,
            "api_key_set": vision.has_api_key(),
            "providers": {
                vision.name(): status(&vision_status),
                images.name(): status(&image_status),
            },
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        let key_status = if vision.has_api_key() { "set" } else { "missing" };
        println!("API key ({}): {}", API_KEY_ENV, key_status);
        for (name, result) in [(vision.name(), &vision_status), (images.name(), &image_status)] {
            match result {
                Ok(()) => println!("  ✓ {}", name),
                Err(e) => println!("  ✗ {}: {}", name, e),
            }
        }
    }
    Ok(())
}
