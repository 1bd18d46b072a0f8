use std::io::Write;
use std::path::PathBuf;

use camtime_core::metadata::{Backend, ExiftoolMetadata};
use camtime_core::{LogSink, ReconcileOptions, Tally};
use clap::Parser;
use log::{error, info, LevelFilter};

#[derive(Parser)]
#[command(
    name = "camtime",
    version,
    about = "Set file mtimes from camera filename timestamps, cross-checked against embedded metadata"
)]
struct Cli {
    /// Directories to scan recursively (e.g. DCIM/Camera)
    #[arg(required = true)]
    roots: Vec<PathBuf>,

    /// Print the equivalent `touch` commands instead of changing files
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// Skip the metadata cross-check and trust filenames alone
    #[arg(long)]
    no_metadata: bool,

    /// Metadata reader: "native" (built in) or "exiftool" (external tool)
    #[arg(long, default_value = "native")]
    backend: Backend,

    /// Only consider files whose name matches this pattern
    #[arg(long, default_value = camtime_core::scan::DEFAULT_INCLUDE)]
    include: String,

    /// Log per-file debug detail (RUST_LOG takes precedence)
    #[arg(short, long)]
    verbose: bool,
}

fn init_logger(verbose: bool) {
    env_logger::Builder::new()
        .filter_level(if verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        })
        .parse_default_env()
        .format(|buf, record| {
            writeln!(
                buf,
                "{} - {} - {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.args()
            )
        })
        .init();
}

/// Without a working exiftool every file would fail metadata extraction, so
/// fall back to filename dates alone.
fn check_exiftool(exiftool: &ExiftoolMetadata, options: &mut ReconcileOptions) {
    match exiftool.probe() {
        Ok(version) => info!("exiftool version: {}", version),
        Err(e) => {
            error!("{}; files will be processed without metadata cross-check", e);
            options.use_metadata = false;
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logger(cli.verbose);
    let t_total = std::time::Instant::now();

    let mut options = ReconcileOptions {
        roots: cli.roots,
        use_metadata: !cli.no_metadata,
        dry_run: cli.dry_run,
        include: cli.include,
        backend: cli.backend,
    };

    if options.use_metadata && options.backend == Backend::Exiftool {
        check_exiftool(&ExiftoolMetadata::default(), &mut options);
    }

    let mut log_sink = LogSink;
    let mut tally = Tally::new(&mut log_sink);
    camtime_core::reconcile_with_defaults(&options, &mut tally)?;

    info!(
        "Done! {} ({:.2}s)",
        tally.counts(),
        t_total.elapsed().as_secs_f64()
    );

    Ok(())
}
