//! ecstripe command line
//!
//! Encodes a file as a sequence of full stripes and writes one parity file
//! per parity cell index.
//!
//! ```text
//! ┌────────────┐    ┌──────────────┐    ┌───────────────┐    ┌──────────────┐
//! │   input    │───▶│  split into  │───▶│ StripeEncoder │───▶│ out/p0..p{m} │
//! │   file     │    │  IO vectors  │    │  (k+m, cell)  │    │ parity files │
//! └────────────┘    └──────────────┘    └───────────────┘    └──────────────┘
//! ```
//!
//! Parity file `pN` holds parity cell `N` of every stripe, in stripe order.
//! A trailing partial stripe is reported and left unencoded.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use serde::Serialize;
use tracing::{debug, info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use ecstripe::config::EncoderConfig;
use ecstripe::ec::{EncoderStatsSnapshot, ScatterGatherList, SglCursor, StripeEncoder, StripePhase};
use ecstripe::{CoderKind, EncodeTableCache, HeapAllocator};

// =============================================================================
// CLI Arguments
// =============================================================================

/// ecstripe - erasure-code a file into Reed-Solomon parity cells
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// File to encode
    #[arg(long, env = "ECSTRIPE_INPUT")]
    input: PathBuf,

    /// Directory for parity files (omit to only report)
    #[arg(long, env = "ECSTRIPE_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// YAML encoder configuration
    #[arg(long, env = "ECSTRIPE_CONFIG")]
    config: Option<PathBuf>,

    /// Cell size in bytes
    #[arg(long, env = "ECSTRIPE_CELL_SIZE")]
    cell_size: Option<usize>,

    /// Number of data cells per stripe (k)
    #[arg(long, env = "ECSTRIPE_DATA_CELLS")]
    data_cells: Option<usize>,

    /// Number of parity cells per stripe (m)
    #[arg(long, env = "ECSTRIPE_PARITY_CELLS")]
    parity_cells: Option<usize>,

    /// Size of the IO vectors the input is split into
    #[arg(long, env = "ECSTRIPE_IOV_SIZE")]
    iov_size: Option<usize>,

    /// GF(2^8) coder backend
    #[arg(long, env = "ECSTRIPE_CODER", value_enum)]
    coder: Option<CoderKind>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, env = "LOG_JSON")]
    log_json: bool,

    /// Print the run report as JSON on stdout
    #[arg(long, env = "ECSTRIPE_REPORT_JSON")]
    report_json: bool,
}

impl Args {
    /// Config file (or defaults) with command line values layered on top.
    fn encoder_config(&self) -> anyhow::Result<EncoderConfig> {
        let mut config = match &self.config {
            Some(path) => EncoderConfig::from_yaml_file(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => EncoderConfig::default(),
        };

        if let Some(cell_size) = self.cell_size {
            config.geometry.cell_size = cell_size;
        }
        if let Some(data_cells) = self.data_cells {
            config.geometry.data_cells = data_cells;
        }
        if let Some(parity_cells) = self.parity_cells {
            config.geometry.parity_cells = parity_cells;
        }
        if let Some(iov_size) = self.iov_size {
            config.iov_size = iov_size;
        }
        if let Some(coder) = self.coder {
            config.coder = coder;
        }

        config.validate()?;
        Ok(config)
    }
}

// =============================================================================
// Run Report
// =============================================================================

#[derive(Debug, Serialize)]
struct Report {
    input: PathBuf,
    input_bytes: usize,
    shape: String,
    cell_size: usize,
    coder: CoderKind,
    iov_size: usize,
    stripes: usize,
    tail_bytes: usize,
    parity_files: Vec<PathBuf>,
    elapsed_ms: u64,
    stats: EncoderStatsSnapshot,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_failure_phase: Option<StripePhase>,
}

// =============================================================================
// Main
// =============================================================================

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    init_logging(&args);

    let config = args.encoder_config()?;
    let geometry = config.geometry;

    info!("Starting ecstripe");
    info!("  Input: {}", args.input.display());
    info!("  Shape: {}", geometry.shape());
    info!("  Cell size: {} bytes", geometry.cell_size);
    info!("  Coder: {}", config.coder);

    let data = fs::read(&args.input)
        .with_context(|| format!("reading input {}", args.input.display()))?;
    let sgl: ScatterGatherList<'_> = data.chunks(config.iov_size).collect();
    debug!(iovs = sgl.nr(), bytes = data.len(), "split input");

    let allocator = Arc::new(HeapAllocator);
    let cache = Arc::new(EncodeTableCache::new(config.coder.build()?, allocator.clone()));
    let encoder = StripeEncoder::new(cache, allocator);

    let expected = data.len() / geometry.stripe_data_size();
    let mut parity = vec![vec![0u8; geometry.cell_size]; expected * geometry.parity_cells];
    let mut cursor = SglCursor::new();

    let started = Instant::now();
    let stripes = encoder.encode_stripes(&sgl, &mut cursor, &mut parity, &geometry)?;
    let elapsed = started.elapsed();
    let tail_bytes = sgl.remaining(&cursor)?;

    if tail_bytes > 0 {
        warn!(tail_bytes, "input ends in a partial stripe; trailing bytes not encoded");
    }

    let parity_files = match &args.output_dir {
        Some(dir) => write_parity(dir, &parity, geometry.parity_cells)?,
        None => Vec::new(),
    };

    let report = Report {
        input: args.input.clone(),
        input_bytes: data.len(),
        shape: geometry.shape().to_string(),
        cell_size: geometry.cell_size,
        coder: config.coder,
        iov_size: config.iov_size,
        stripes,
        tail_bytes,
        parity_files,
        elapsed_ms: elapsed.as_millis() as u64,
        stats: encoder.stats().snapshot(),
        last_failure_phase: encoder.last_failure_phase(),
    };

    if args.report_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        info!(
            stripes = report.stripes,
            bytes = report.stats.bytes_encoded,
            cells_copied = report.stats.cells_copied,
            elapsed_ms = report.elapsed_ms,
            "encode complete"
        );
    }

    Ok(())
}

/// Write parity cell `n` of every stripe to `dir/p{n}`.
fn write_parity(
    dir: &Path,
    parity: &[Vec<u8>],
    parity_cells: usize,
) -> anyhow::Result<Vec<PathBuf>> {
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;

    let mut files = Vec::with_capacity(parity_cells);
    for n in 0..parity_cells {
        let path = dir.join(format!("p{}", n));
        let bytes: Vec<u8> = parity
            .iter()
            .skip(n)
            .step_by(parity_cells)
            .flat_map(|cell| cell.iter().copied())
            .collect();
        fs::write(&path, &bytes).with_context(|| format!("writing {}", path.display()))?;
        debug!(path = %path.display(), bytes = bytes.len(), "wrote parity file");
        files.push(path);
    }
    Ok(files)
}

// =============================================================================
// Logging Setup
// =============================================================================

fn init_logging(args: &Args) {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    // Logs go to stderr so a JSON report on stdout stays parseable
    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}
