//! Command handlers for CLI subcommands.

use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use suffcal_adapters::{CalDavCalendar, ChatCompletionClient, MediaBridgeClient, TesseractOcr};
use suffcal_extract::Extractor;
use suffcal_models::Event;
use suffcal_persistence::PhotoStore;
use suffcal_runtime::{TrackerConfig, TrackerSlot};

use crate::cli::{Cli, Commands};
use crate::error::Result;
use crate::forward::CalendarForwarder;

/// The photo tracker of this process.
static TRACKER: TrackerSlot = TrackerSlot::new();

/// Execute a CLI command.
pub async fn execute(cli: &Cli) -> Result<()> {
    match cli.subcommand() {
        Commands::Run { once } => cmd_run(cli, once).await,
        Commands::Extract { image, json } => cmd_extract(cli, &image, json).await,
        Commands::Reprocess => cmd_reprocess(cli).await,
        Commands::Check => cmd_check(cli),
    }
}

/// Builds the extraction pipeline from the extraction settings.
pub fn build_extractor(cli: &Cli) -> Result<Extractor> {
    let args = &cli.extraction;
    let ocr = TesseractOcr::new(&args.ocr_lang)?;

    let mut model = ChatCompletionClient::new(&args.llm_api_url, &args.llm_model);
    if let Some(ref key) = args.llm_api_key {
        model = model.with_api_key(key);
    }

    Ok(Extractor::new(Arc::new(ocr), Arc::new(model)))
}

async fn cmd_run(cli: &Cli, once: bool) -> Result<()> {
    let (target_user, user, password) = cli.media.credentials()?;
    let (calendar_url, calendar_user, calendar_password) = cli.calendar.settings()?;

    let extractor = build_extractor(cli)?;
    let calendar = CalDavCalendar::new(calendar_url, calendar_user, calendar_password)?;
    let source = MediaBridgeClient::new(&cli.media.media_bridge_url)?;

    let config = TrackerConfig::new(target_user, user, password, cli.media.storage_root())
        .with_poll_interval(cli.media.poll_interval())
        .with_max_downloads(cli.media.max_downloads)
        .with_media_type(cli.media.media_type)
        .with_auto_update(!once && !cli.media.no_auto_update);

    let tracker = TRACKER.init(config, Arc::new(source)).await?;

    tracker
        .register_handler(Arc::new(CalendarForwarder::new(extractor, Arc::new(calendar))))
        .await;
    let handled = tracker.trigger_callbacks().await?;
    info!(handled, "processed pending photos");

    if !once {
        println!("Suffcal is running. Press Ctrl+C to exit.");
        tokio::signal::ctrl_c().await?;
        info!("interrupt received, shutting down");
    }

    tracker.shutdown().await?;
    Ok(())
}

async fn cmd_extract(cli: &Cli, image: &Path, json: bool) -> Result<()> {
    let extractor = build_extractor(cli)?;
    let events = extractor.extract(image).await?;
    print_events(&events, json)
}

async fn cmd_reprocess(cli: &Cli) -> Result<()> {
    let extractor = build_extractor(cli)?;
    let store = PhotoStore::open(cli.media.storage_root())?;

    for photo in store.list_processed()? {
        match extractor.extract(&photo.path).await {
            Ok(events) => print_events(&events, false)?,
            Err(e) => warn!(photo = %photo.path.display(), error = %e, "unable to process photo"),
        }
    }
    Ok(())
}

fn cmd_check(cli: &Cli) -> Result<()> {
    let ocr = TesseractOcr::new(&cli.extraction.ocr_lang)?;
    println!("tesseract: ok (language {})", ocr.language());

    let model = ChatCompletionClient::new(&cli.extraction.llm_api_url, &cli.extraction.llm_model);
    println!("language model: {}", model.model());

    let report = |name: &str, ok: bool| {
        println!("{}: {}", name, if ok { "ok" } else { "missing" });
    };
    report("media network settings", cli.media.credentials().is_ok());
    report("calendar settings", cli.calendar.settings().is_ok());
    report(
        "language model key",
        cli.extraction.llm_api_key.is_some()
            || cli.extraction.llm_api_url != suffcal_adapters::chat::OPENROUTER_API_URL,
    );
    println!("storage root: {}", cli.media.storage_root().display());
    Ok(())
}

fn print_events(events: &[Event], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(events)?);
    } else {
        for event in events {
            println!("{}", event);
        }
    }
    Ok(())
}
