use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use pagelith::core::{capture_page, CaptureOptions};
use pagelith::network::driver::HttpRenderDriver;
use pagelith::translation::{HttpTranslator, TranslatorConfig};
use pagelith::utils::url::Url;

#[derive(Parser)]
#[command(
    name = "pagelith",
    about = "Capture a rendered web page into an offline, translated copy"
)]
struct Cli {
    /// Page URL to capture
    url: Url,

    /// Root directory where capture directories are created
    #[arg(short, long, default_value = "captures")]
    output: PathBuf,

    /// Target language for the translated variant (overrides PAGELITH_TARGET_LANG)
    #[arg(short = 'l', long)]
    language: Option<String>,

    /// Maximum concurrent asset fetches
    #[arg(long, default_value_t = 8)]
    asset_concurrency: usize,

    /// Maximum concurrent translation requests
    #[arg(long, default_value_t = 4)]
    translation_concurrency: usize,

    /// HTTP request timeout in seconds
    #[arg(long, default_value_t = 30)]
    timeout: u64,

    /// User-Agent header sent by the render driver
    #[arg(long)]
    user_agent: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut translator_config = match TranslatorConfig::from_env() {
        Ok(config) => config,
        Err(error) => {
            eprintln!("pagelith: {error}");
            return ExitCode::FAILURE;
        }
    };
    if let Some(language) = cli.language {
        translator_config.target_language = language;
    }

    let translator = match HttpTranslator::new(translator_config) {
        Ok(translator) => translator,
        Err(error) => {
            eprintln!("pagelith: {error}");
            return ExitCode::FAILURE;
        }
    };

    let driver = match HttpRenderDriver::new(
        Duration::from_secs(cli.timeout),
        cli.user_agent.as_deref(),
    ) {
        Ok(driver) => driver,
        Err(error) => {
            eprintln!("pagelith: {error}");
            return ExitCode::FAILURE;
        }
    };

    let options = CaptureOptions {
        asset_concurrency: cli.asset_concurrency,
        translation_concurrency: cli.translation_concurrency,
    };

    match capture_page(&driver, &translator, &cli.url, &cli.output, options).await {
        Ok(report) => {
            println!("Saved original: {}", report.original_path.display());
            println!("Saved translated: {}", report.translated_path.display());
            if report.error_count > 0 {
                println!(
                    "{} error(s) recorded in errors.md next to the captured page",
                    report.error_count
                );
            }
            ExitCode::SUCCESS
        }
        Err(error) => {
            eprintln!("pagelith: capture failed: {error}");
            ExitCode::FAILURE
        }
    }
}
