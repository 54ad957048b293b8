use anyhow::Result;
use clap::Parser;
use console::style;
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use shorts_collector::cli::{Cli, Commands};
use shorts_collector::collect::{self, free};
use shorts_collector::config::Config;
use shorts_collector::extractors::{channel_shorts_url, youtube::YoutubeExtractor};
use shorts_collector::merge::{merge_records, TranscriptMap};
use shorts_collector::output::{self, StageReport};
use shorts_collector::providers::apify::ApifyClient;
use shorts_collector::providers::catalog::{METADATA_PROVIDERS, TRANSCRIPT_PROVIDERS};
use shorts_collector::providers::ProviderRunner;
use shorts_collector::transcribe::{CaptionThenSpeech, FallbackMode, SpeechFallback, WhisperCli};
use shorts_collector::{utils, CollectorError};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    match cli.command {
        Commands::Collect {
            channel,
            api_key,
            output,
        } => {
            let config = Config::load().await?;
            run_collect(&config, channel, api_key, output, !cli.quiet).await?;
        }
        Commands::Free {
            channel,
            output,
            whisper_model,
            no_whisper,
            cookies_from_browser,
        } => {
            let mut config = Config::load().await?;
            if let Some(model) = whisper_model {
                config.whisper.model = model;
            }
            if no_whisper {
                config.whisper.enabled = false;
            }
            if cookies_from_browser.is_some() {
                config.youtube.cookies_from_browser = cookies_from_browser;
            }
            run_free(&config, channel, output, !cli.quiet).await?;
        }
        Commands::Providers => print_providers(),
        Commands::Config { show } => {
            let config = Config::load().await?;
            if show {
                config.display();
            } else {
                config.interactive_setup().await?;
            }
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool, json: bool) {
    let default_directive = if verbose { "shorts_collector=debug" } else { "shorts_collector=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_directive.into());

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn resolve_channel(channel: Option<String>) -> Result<String> {
    let channel = match channel {
        Some(channel) => channel,
        None => output::prompt("YouTube channel URL or @handle")?,
    };
    channel_shorts_url(&channel)
}

async fn run_collect(
    config: &Config,
    channel: Option<String>,
    api_key: Option<String>,
    output_path: Option<PathBuf>,
    show_progress: bool,
) -> Result<()> {
    let channel_url = resolve_channel(channel)?;

    let api_key = match api_key.or_else(|| config.apify.api_key.clone()) {
        Some(key) if !key.trim().is_empty() => key,
        _ => output::prompt("Apify API key").map_err(|_| CollectorError::MissingApiKey)?,
    };

    let started = Instant::now();
    let client = ApifyClient::new(&config.apify, api_key);
    let runner = ProviderRunner::new(&client).with_item_delay(config.pacing.provider_item_delay());

    if show_progress {
        println!("{} {}", style("Collecting shorts from").bold(), style(&channel_url).cyan());
    }

    let metadata = collect::collect_metadata(&runner, METADATA_PROVIDERS, &channel_url).await;
    if metadata.records.is_empty() {
        return Err(CollectorError::NoMetadata { channel: channel_url }.into());
    }

    let transcripts = collect::collect_transcripts(&runner, TRANSCRIPT_PROVIDERS, &metadata.records).await;
    if !transcripts.succeeded() {
        tracing::warn!("No transcript provider succeeded; transcripts will be N/A");
    }

    let transcript_map = TranscriptMap::from_records(&transcripts.records);
    let records = merge_records(&metadata.records, &transcript_map);

    let path = output::resolve_output_path(output_path, config.app.output_dir.as_deref(), &channel_url);
    output::save_records(&records, &path)?;
    output::print_summary(
        &records,
        &StageReport::Providers {
            metadata: metadata.provider,
            transcripts: transcripts.provider,
        },
        &path,
        started.elapsed().as_secs_f64(),
    );

    Ok(())
}

async fn run_free(
    config: &Config,
    channel: Option<String>,
    output_path: Option<PathBuf>,
    show_progress: bool,
) -> Result<()> {
    let channel_url = resolve_channel(channel)?;

    let youtube = YoutubeExtractor::from_config(&config.youtube);
    youtube.ensure_available().await?;

    let whisper = WhisperCli::from_config(&config.whisper);
    let mode = whisper.fallback_mode(config.whisper.enabled).await;
    match mode {
        FallbackMode::Enabled => tracing::info!("Speech-to-text fallback enabled ({} model)", whisper.model()),
        FallbackMode::Disabled => tracing::info!("Speech-to-text fallback disabled"),
        FallbackMode::Unavailable => {
            tracing::warn!("whisper is not installed; videos without captions will have no transcript")
        }
    }

    if mode == FallbackMode::Enabled {
        let missing_deps = utils::check_dependencies().await;
        if !missing_deps.is_empty() {
            eprintln!("{}", style("Dependency check warnings:").yellow());
            for dep in missing_deps {
                eprintln!("   • {}", dep);
            }
        }
    }

    let started = Instant::now();
    let video_ids = free::list_shorts(&youtube, &channel_url).await?;
    let metadata = free::collect_metadata(&youtube, &video_ids, config.pacing.metadata_delay(), show_progress).await;

    let pipeline = CaptionThenSpeech::new(&youtube)
        .with_pacing(config.pacing.caption_delay(), config.pacing.audio_delay())
        .with_temp_root(config.app.temp_dir.clone())
        .with_progress(show_progress);
    let pipeline = if mode == FallbackMode::Enabled {
        pipeline.with_fallback(
            SpeechFallback {
                audio: &youtube,
                engine: &whisper,
            },
            mode,
        )
    } else {
        pipeline.without_fallback(mode)
    };

    let outcome = pipeline.run(&video_ids).await;
    let records = merge_records(&metadata, &outcome.to_map());

    let path = output::resolve_output_path(output_path, config.app.output_dir.as_deref(), &channel_url);
    output::save_records(&records, &path)?;
    output::print_summary(
        &records,
        &StageReport::Local {
            captions: outcome.caption_count(),
            transcribed: outcome.transcribed_count(),
            fallback: outcome.mode,
        },
        &path,
        started.elapsed().as_secs_f64(),
    );

    Ok(())
}

fn print_providers() {
    println!("Metadata providers (tried in order):");
    for (index, provider) in METADATA_PROVIDERS.iter().enumerate() {
        println!("  {}. {} [{}]", index + 1, provider.name, provider.mode.as_str());
    }

    println!("Transcript providers (tried in order):");
    for (index, provider) in TRANSCRIPT_PROVIDERS.iter().enumerate() {
        println!("  {}. {} [{}]", index + 1, provider.name, provider.mode.as_str());
    }
}
