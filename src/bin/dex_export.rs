use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::Parser;
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use dex_export::app::App;
use dex_export::catalog::HttpCatalogClient;
use dex_export::config::ConfigLoader;
use dex_export::error::DexError;
use dex_export::output::{JsonOutput, TracingSink};
use dex_export::store::Store;

#[derive(Parser)]
#[command(name = "dex-export")]
#[command(about = "Export the creature catalog as one flat CSV table")]
#[command(version, author)]
struct Cli {
    /// Config file (defaults to ./dex-export.json when present)
    #[arg(long)]
    config: Option<String>,

    /// Output path, overriding the config file
    #[arg(long)]
    output: Option<String>,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(dex) = report.downcast_ref::<DexError>() {
            return ExitCode::from(map_exit_code(dex));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &DexError) -> u8 {
    match error {
        DexError::ConfigRead(_) | DexError::ConfigParse(_) | DexError::InvalidConfig(_) => 2,
        DexError::CatalogHttp(_) | DexError::CatalogStatus { .. } => 3,
        DexError::EmptyTable => 4,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = ConfigLoader::resolve(cli.config.as_deref())?;
    if let Some(output) = cli.output {
        config.output = Utf8PathBuf::from(output);
    }

    let store = match &config.cache_dir {
        Some(dir) => Store::new_with_paths(dir.clone()),
        None => Store::new()?,
    };
    let client = HttpCatalogClient::new(&config.base_url)?;
    let app = App::new(store, client, config);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .into_diagnostic()?;
    let result = runtime.block_on(app.export(&TracingSink))?;

    JsonOutput::print_export(&result).into_diagnostic()?;
    Ok(())
}
