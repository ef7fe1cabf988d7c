use anyhow::Result;
use clap::{CommandFactory, FromArgMatches};
use owo_colors::OwoColorize;
use speechcli::app::{
    SynthesisOptions, TranscriptionOptions, run_synthesis, run_transcription,
};
use speechcli::azure::{AzureRecognizer, AzureSynthesizer};
use speechcli::cli::{Cli, Commands, SynthesizeArgs, TranscribeArgs};
use speechcli::config::{Config, Credentials, expand_tilde};
use speechcli::diagnostics::check_dependencies;
use speechcli::output::{Console, init_logging};
use speechcli::tts::runner::RetryPolicy;
use speechcli::{FormatTranscoder, SpeechError, SystemCommandExecutor};
use std::time::Duration;

#[tokio::main]
async fn main() {
    let cli = parse_cli();
    let console = Console::new(cli.quiet);

    if let Err(e) = init_logging(cli.verbose) {
        eprintln!("speechcli: {e}");
    }

    if let Err(err) = run(cli, &console).await {
        std::process::exit(report_error(&err, &console));
    }
}

/// Parse arguments with the git-aware version string.
fn parse_cli() -> Cli {
    let matches = Cli::command()
        .version(speechcli::version_string())
        .get_matches();
    Cli::from_arg_matches(&matches).unwrap_or_else(|e| e.exit())
}

/// Print `err` and return the exit code for it.
fn report_error(err: &anyhow::Error, console: &Console) -> i32 {
    console.error(&format!("{err:#}"));
    match err.downcast_ref::<SpeechError>() {
        Some(e) => {
            if let Some(hint) = e.hint() {
                eprintln!("  {}", hint.dimmed());
            }
            e.exit_code()
        }
        None => 1,
    }
}

async fn run(cli: Cli, console: &Console) -> Result<()> {
    match cli.command {
        Commands::Transcribe(args) => {
            let config = load_config(cli.config.as_deref())?;
            transcribe(args, &config, console).await?;
        }
        Commands::Synthesize(args) => {
            let config = load_config(cli.config.as_deref())?;
            synthesize(args, &config, console).await?;
        }
        Commands::Check => {
            let config = load_config(cli.config.as_deref())?;
            if !check_dependencies(&config) {
                println!("{}", "Run `speechcli check` again after fixing the items above.".yellow());
            }
        }
        Commands::Completions { shell } => {
            clap_complete::generate(
                shell,
                &mut Cli::command(),
                "speechcli",
                &mut std::io::stdout(),
            );
        }
    }
    Ok(())
}

/// Load configuration from file or use defaults.
///
/// Priority order:
/// 1. Custom config path from CLI (--config)
/// 2. Default config path (~/.config/speechcli/config.toml)
/// 3. Built-in defaults with environment variable overrides
fn load_config(custom_path: Option<&std::path::Path>) -> Result<Config> {
    let config = if let Some(path) = custom_path {
        Config::load(path)?
    } else {
        Config::load_or_default(&Config::default_path())?
    };
    Ok(config.with_env_overrides())
}

async fn transcribe(args: TranscribeArgs, config: &Config, console: &Console) -> Result<()> {
    let credentials = Credentials::for_transcription()?;
    let recognizer = AzureRecognizer::new(&credentials, config.service.request_timeout())?;

    let options = TranscriptionOptions {
        input: expand_tilde(&args.input),
        language: args
            .lang
            .clone()
            .unwrap_or_else(|| config.transcribe.language.clone()),
        output_dir: expand_tilde(
            args.outdir
                .as_deref()
                .unwrap_or(&config.transcribe.output_dir),
        ),
        formats: args.requested_formats(),
        timeout: args
            .timeout
            .or(config.transcribe.timeout_secs.map(Duration::from_secs)),
    };

    let summary = run_transcription(&recognizer, &options, console).await?;
    tracing::info!(
        transcribed = summary.transcribed.len(),
        skipped = summary.skipped.len(),
        empty = summary.empty.len(),
        failed = summary.failed.len(),
        "transcription finished"
    );
    Ok(())
}

async fn synthesize(args: SynthesizeArgs, config: &Config, console: &Console) -> Result<()> {
    let credentials = Credentials::for_synthesis()?;
    let synthesizer = AzureSynthesizer::new(
        &credentials,
        config.synthesize.output_format.clone(),
        config.service.request_timeout(),
    )?;
    let transcoder = FormatTranscoder::new(
        SystemCommandExecutor::new(),
        config.synthesize.encoder(),
        config.synthesize.mp3_bitrate.clone(),
    );

    let options = SynthesisOptions {
        input: expand_tilde(&args.ssml),
        output_dir: expand_tilde(
            args.out
                .as_deref()
                .unwrap_or(&config.synthesize.output_dir),
        ),
        max_voices: args.max_voices.unwrap_or(config.synthesize.max_voices),
        no_split: args.no_split,
        to_mp3: args.to_mp3,
        retry: RetryPolicy {
            retries: args.retries.unwrap_or(config.synthesize.retries),
            backoff_step: config.synthesize.backoff_step(),
        },
    };

    run_synthesis(&synthesizer, &transcoder, &options, console).await?;
    Ok(())
}
