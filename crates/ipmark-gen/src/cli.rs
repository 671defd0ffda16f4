//! CLI entry point for the table generator.

use std::io;
use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use ipmark_routes::provider::{FileProvider, HttpProvider};
use ipmark_routes::{Allocation, CompactMode, Mark, TableCompiler};

use crate::error::GenError;

/// Default delegation file of the domestic registry.
const DOMESTIC_URL: &str = "https://ftp.apnic.net/stats/apnic/delegated-apnic-latest";
/// Default delegation file of the foreign registry.
const FOREIGN_URL: &str = "https://ftp.arin.net/pub/stats/arin/delegated-arin-extended-latest";

/// Compaction strategy flag.
#[derive(ValueEnum, Debug, Clone, Copy, Default)]
pub enum Mode {
    /// Fewest routes reproducing the exact classification.
    #[default]
    MinRoutes,
    /// Conservative bottom-up merge.
    Merge,
}

impl From<Mode> for CompactMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::MinRoutes => CompactMode::MinRoutes,
            Mode::Merge => CompactMode::Merge,
        }
    }
}

/// CLI arguments for the generator.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "ipmark-gen",
    version,
    about = "Compile the IPv4 route classification table"
)]
pub struct GenArgs {
    /// Output path for the compiled route table (JSON).
    #[arg(short, long, default_value = "routes.json")]
    pub out: PathBuf,

    /// Compaction strategy.
    #[arg(long, value_enum, default_value_t = Mode::MinRoutes)]
    pub mode: Mode,

    /// URL of the domestic registry's delegation file.
    #[arg(long, default_value = DOMESTIC_URL)]
    pub domestic_url: String,

    /// URL of the foreign registry's delegation file.
    #[arg(long, default_value = FOREIGN_URL)]
    pub foreign_url: String,

    /// Entity code selecting domestic records.
    #[arg(long, default_value = "CN")]
    pub domestic_code: String,

    /// Entity code selecting foreign records.
    #[arg(long, default_value = "US")]
    pub foreign_code: String,

    /// Local delegation snapshot overriding --domestic-url.
    #[arg(long)]
    pub domestic_file: Option<PathBuf>,

    /// Local delegation snapshot overriding --foreign-url.
    #[arg(long)]
    pub foreign_file: Option<PathBuf>,

    /// Directory for cached delegation downloads.
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,

    /// Log level override (e.g. "info", "debug", "trace").
    #[arg(long)]
    pub log_level: Option<String>,
}

/// Run the generator with the given CLI arguments.
pub async fn run(args: GenArgs) -> Result<(), GenError> {
    init_tracing(args.log_level.as_deref().unwrap_or("info"));

    // The two feeds are independent reads; fetch them concurrently. Their
    // application to the trie below stays sequential because the overlap
    // policy is ordering-sensitive.
    let (domestic, foreign) = tokio::try_join!(
        load_source(
            &args.domestic_url,
            args.domestic_file.as_deref(),
            &args.domestic_code,
            args.cache_dir.as_deref(),
        ),
        load_source(
            &args.foreign_url,
            args.foreign_file.as_deref(),
            &args.foreign_code,
            args.cache_dir.as_deref(),
        ),
    )?;
    info!(
        domestic = domestic.len(),
        foreign = foreign.len(),
        "loaded allocation records"
    );

    let mut compiler = TableCompiler::new();
    compiler.insert_reserved();
    compiler.insert_allocations(&domestic, Mark::Domestic);
    compiler.insert_allocations(&foreign, Mark::Foreign);

    let table = compiler.compile(args.mode.into())?;
    info!(
        routes = table.len(),
        conflicts = compiler.conflicts().len(),
        mode = ?args.mode,
        "compiled route table"
    );

    write_atomic(&args.out, &table.to_json()).await?;
    info!(path = %args.out.display(), "wrote route table");
    Ok(())
}

/// Load one entity's allocations from a local snapshot or the network.
async fn load_source(
    url: &str,
    file: Option<&Path>,
    entity: &str,
    cache_dir: Option<&Path>,
) -> Result<Vec<Allocation>, GenError> {
    if let Some(path) = file {
        info!(path = %path.display(), entity, "loading local delegation snapshot");
        return Ok(FileProvider::load(path, entity)?);
    }
    let cache_path = cache_dir.map(|dir| dir.join(format!("delegated-{entity}.txt")));
    let provider = HttpProvider::new(url, cache_path, entity);
    Ok(provider.load().await?)
}

/// Write the table atomically (write-to-temp + rename) so consumers never
/// observe a truncated file.
async fn write_atomic(path: &Path, content: &str) -> Result<(), std::io::Error> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    let tmp_path = path.with_extension("tmp");
    tokio::fs::write(&tmp_path, content).await?;
    #[cfg(target_os = "windows")]
    {
        let _ = tokio::fs::remove_file(path).await;
    }
    tokio::fs::rename(&tmp_path, path).await
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr))
        .init();
}
