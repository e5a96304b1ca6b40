//! CLI for NanoChef - recipes from ingredient photos and AI image edits.

use clap::{Args, Parser, Subcommand, ValueEnum};
use nanochef::{
    AiGateway, EditSession, GeminiGateway, GeminiModel, ImageIntake, IntakePolicy, Mode, Recipe,
    RecipeSession, SessionState, Studio,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Parser)]
#[command(name = "nanochef")]
#[command(about = "Recipe ideas from an ingredients photo, and AI image edits (Gemini)")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Log request details to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// API key (defaults to GOOGLE_API_KEY, then API_KEY)
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Model used for recipe suggestions
    #[arg(long, global = true)]
    text_model: Option<String>,

    /// Model used for dish images and edits
    #[arg(long, global = true, value_enum, default_value = "nano-banana")]
    image_model: ImageModelArg,

    /// Fail on non-image files instead of ignoring them
    #[arg(long, global = true)]
    strict_intake: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Suggest recipes for a photo of ingredients
    Chef(ChefArgs),

    /// Edit an image with a natural-language instruction
    Edit(EditArgs),

    /// Interactive shell with both modes
    Studio,

    /// Verify the API key and model
    Check,
}

#[derive(Args)]
struct ChefArgs {
    /// Photo of the ingredients
    image: PathBuf,

    /// Directory to save dish illustrations into
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Skip waiting for dish illustrations
    #[arg(long)]
    no_illustrations: bool,
}

#[derive(Args)]
struct EditArgs {
    /// Image to edit
    image: PathBuf,

    /// What to change
    instruction: String,

    /// Output file path
    #[arg(short, long)]
    output: PathBuf,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ImageModelArg {
    NanoBanana,
    NanoBananaPro,
}

impl From<ImageModelArg> for GeminiModel {
    fn from(arg: ImageModelArg) -> Self {
        match arg {
            ImageModelArg::NanoBanana => GeminiModel::NanoBanana,
            ImageModelArg::NanoBananaPro => GeminiModel::NanoBananaPro,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "nanochef=debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let gateway = build_gateway(&cli);
    let intake = ImageIntake::new(if cli.strict_intake {
        IntakePolicy::Strict
    } else {
        IntakePolicy::Silent
    });

    match cli.command {
        Commands::Chef(args) => run_chef(args, gateway, intake, cli.json).await?,
        Commands::Edit(args) => run_edit(args, gateway, intake, cli.json).await?,
        Commands::Studio => run_studio(gateway, intake).await?,
        Commands::Check => run_check(gateway, cli.json).await?,
    }

    Ok(())
}

fn build_gateway(cli: &Cli) -> Arc<dyn AiGateway> {
    let mut builder = GeminiGateway::builder().image_model(cli.image_model.into());
    if let Some(ref key) = cli.api_key {
        builder = builder.api_key(key);
    }
    if let Some(ref model) = cli.text_model {
        builder = builder.text_model(model);
    }
    Arc::new(builder.build())
}

async fn run_chef(
    args: ChefArgs,
    gateway: Arc<dyn AiGateway>,
    intake: ImageIntake,
    json_output: bool,
) -> anyhow::Result<()> {
    let Some(photo) = intake.read_file(&args.image).await? else {
        anyhow::bail!("{} is not an image", args.image.display());
    };

    let session = RecipeSession::new(gateway);
    session.upload(photo);

    if session.generate().await != SessionState::Complete {
        let failure = session.failure();
        if let Some(ref f) = failure {
            tracing::debug!(detail = %f.detail, "recipe generation failed");
        }
        anyhow::bail!(session
            .error_message()
            .unwrap_or(nanochef::RECIPE_FAILURE_MESSAGE));
    }

    if !args.no_illustrations {
        session.wait_for_illustrations().await;
    }

    let mut saved = Vec::new();
    if let Some(ref dir) = args.output_dir {
        std::fs::create_dir_all(dir)?;
        for (index, image) in session.illustrations().iter() {
            let ext = image.format().map(|f| f.extension()).unwrap_or("png");
            let path = dir.join(format!("dish-{}.{}", index + 1, ext));
            image.save(&path)?;
            saved.push((index, path));
        }
    }

    let recipes = session.recipes();
    if json_output {
        let illustrations: Vec<_> = saved
            .iter()
            .map(|(index, path)| {
                serde_json::json!({ "index": index, "path": path.display().to_string() })
            })
            .collect();
        let result = serde_json::json!({
            "success": true,
            "recipes": recipes.recipes(),
            "illustrations": illustrations,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        for (index, recipe) in recipes.iter().enumerate() {
            print_recipe(index, recipes.len(), recipe);
            if let Some((_, path)) = saved.iter().find(|(i, _)| *i == index) {
                println!("  Illustration: {}", path.display());
            }
            println!();
        }
    }

    Ok(())
}

async fn run_edit(
    args: EditArgs,
    gateway: Arc<dyn AiGateway>,
    intake: ImageIntake,
    json_output: bool,
) -> anyhow::Result<()> {
    let Some(photo) = intake.read_file(&args.image).await? else {
        anyhow::bail!("{} is not an image", args.image.display());
    };

    let session = EditSession::new(gateway);
    session.upload(photo);
    session.set_instruction(&args.instruction);

    match session.submit().await {
        SessionState::Complete => {}
        SessionState::Idle => anyhow::bail!("instruction must not be empty"),
        _ => {
            if let Some(f) = session.failure() {
                tracing::debug!(kind = ?f.kind, detail = %f.detail, "image edit failed");
            }
            anyhow::bail!(session
                .error_message()
                .unwrap_or(nanochef::EDIT_FAILURE_MESSAGE));
        }
    }

    let result = session
        .result()
        .ok_or_else(|| anyhow::anyhow!("edit finished without a result"))?;
    let image = result
        .image
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("edit finished without an image"))?;
    image.save(&args.output)?;

    if json_output {
        let out = serde_json::json!({
            "success": true,
            "output": args.output.display().to_string(),
            "content_type": image.content_type,
            "text": result.text,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("Edited image: {}", args.output.display());
        if let Some(ref text) = result.text {
            println!("{}", text);
        }
    }

    Ok(())
}

async fn run_check(gateway: Arc<dyn AiGateway>, json_output: bool) -> anyhow::Result<()> {
    let result = gateway.health_check().await;

    if json_output {
        let out = serde_json::json!({
            "provider": gateway.kind().to_string(),
            "ok": result.is_ok(),
            "error": result.as_ref().err().map(|e| e.to_string()),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        match result {
            Ok(()) => println!("✓ {} is reachable", gateway.name()),
            Err(ref e) => println!("✗ {}: {}", gateway.name(), e),
        }
    }

    result.map_err(Into::into)
}

const STUDIO_HELP: &str = "\
Commands:
  mode chef|editor      switch mode
  upload <path>         load a photo into the current mode
  clear                 drop the photo and results
  generate              suggest recipes (chef)
  next / prev           browse recipes (chef)
  show                  show the current recipe or edit result
  wait                  wait for dish illustrations (chef)
  instruct <text>       set the edit instruction (editor)
  submit                run the edit (editor)
  save <path>           save the current illustration or edited image
  help                  this text
  quit                  exit";

async fn run_studio(gateway: Arc<dyn AiGateway>, intake: ImageIntake) -> anyhow::Result<()> {
    let mut studio = Studio::new(gateway, intake);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("NanoChef studio. Type 'help' for commands.");
    prompt(&studio);

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
        let rest = rest.trim();

        match command {
            "" => {}
            "quit" | "exit" => break,
            "help" => println!("{STUDIO_HELP}"),
            "mode" => match rest.parse::<Mode>() {
                Ok(mode) => studio.set_mode(mode),
                Err(e) => println!("{e}"),
            },
            "upload" => match studio.upload_file(rest).await {
                Ok(true) => println!("Loaded {rest}"),
                Ok(false) => {}
                Err(e) => println!("Could not load {rest}: {e}"),
            },
            "clear" => studio.clear(),
            "generate" => {
                studio.set_mode(Mode::Chef);
                match studio.chef().generate().await {
                    SessionState::Complete => show_chef(studio.chef()),
                    SessionState::Failed => print_error(studio.chef().error_message()),
                    _ => println!("Upload an ingredients photo first."),
                }
            }
            "next" => {
                studio.chef().advance();
                show_chef(studio.chef());
            }
            "prev" => {
                studio.chef().retreat();
                show_chef(studio.chef());
            }
            "wait" => {
                studio.chef().wait_for_illustrations().await;
                println!(
                    "{} illustration(s) ready",
                    studio.chef().illustrations().len()
                );
            }
            "instruct" => {
                studio.set_mode(Mode::Editor);
                studio.editor().set_instruction(rest);
            }
            "submit" => {
                studio.set_mode(Mode::Editor);
                match studio.editor().submit().await {
                    SessionState::Complete => show_editor(studio.editor()),
                    SessionState::Failed => print_error(studio.editor().error_message()),
                    _ => println!("Upload an image and set an instruction first."),
                }
            }
            "show" => match studio.mode() {
                Mode::Chef => show_chef(studio.chef()),
                Mode::Editor => show_editor(studio.editor()),
            },
            "save" => {
                if let Err(e) = save_current(&studio, Path::new(rest)) {
                    println!("{e}");
                }
            }
            other => println!("Unknown command '{other}'. Type 'help'."),
        }

        prompt(&studio);
    }

    Ok(())
}

fn prompt(studio: &Studio) {
    print!("[{} {}]> ", studio.mode(), studio.active_state());
    use std::io::Write;
    let _ = std::io::stdout().flush();
}

fn print_error(message: Option<&str>) {
    println!("Error: {}", message.unwrap_or("something went wrong"));
}

fn show_chef(session: &RecipeSession) {
    session.drain_illustrations();
    let recipes = session.recipes();
    let (Some(index), Some(recipe)) = (recipes.cursor(), recipes.current()) else {
        println!("No recipes yet.");
        return;
    };

    print_recipe(index, recipes.len(), recipe);
    if session.illustration(index).is_some() {
        println!("  Illustration: ready (use 'save <path>')");
    } else {
        println!("  Illustration: pending");
    }
}

fn show_editor(session: &EditSession) {
    match session.result() {
        Some(result) => {
            println!("Edited image ready (use 'save <path>')");
            if let Some(text) = result.text {
                println!("{text}");
            }
        }
        None => match session.error_message() {
            Some(message) => println!("Error: {message}"),
            None => println!("No edit yet."),
        },
    }
}

fn save_current(studio: &Studio, path: &Path) -> anyhow::Result<()> {
    if path.as_os_str().is_empty() {
        anyhow::bail!("save needs a path");
    }

    let image = match studio.mode() {
        Mode::Chef => {
            studio.chef().drain_illustrations();
            studio
                .chef()
                .cursor()
                .and_then(|i| studio.chef().illustration(i))
        }
        Mode::Editor => studio.editor().result_image(),
    };

    let image = image.ok_or_else(|| anyhow::anyhow!("nothing to save yet"))?;
    image.save(path)?;
    println!("Saved {}", path.display());
    Ok(())
}

fn print_recipe(index: usize, total: usize, recipe: &Recipe) {
    println!("[{}/{}] {}", index + 1, total, recipe.title);
    println!(
        "  Time: {}  Difficulty: {}",
        recipe.cooking_time,
        recipe
            .difficulty_level()
            .map(|d| d.to_string())
            .unwrap_or_else(|| recipe.difficulty.clone())
    );
    println!("  Ingredients:");
    for item in &recipe.ingredients {
        println!("    - {item}");
    }
    println!("  Instructions:");
    for (step, text) in recipe.instructions.iter().enumerate() {
        println!("    {}. {}", step + 1, text);
    }
}
