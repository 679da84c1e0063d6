//! DNA Ladder - store files in synthetic DNA oligo pools
//!
//! Usage:
//!   dna-ladder init                              - Write a default config
//!   dna-ladder encode <files...> -o <pool>       - Encode files into oligos
//!   dna-ladder decode <reads> -o <dir>           - Rebuild files from reads
//!   dna-ladder inspect                           - Show manifest geometry

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use dna_ladder::{
    framer::WordLayout,
    oligo,
    pipeline::compare_bytes,
    vt::find_smallest_n,
    CodecConfig, FileRegistry, LadderDecoder, LadderEncoder,
};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "dna-ladder")]
#[command(author = "dna-ladder Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Layered RS/VT codec for DNA data storage")]
struct Cli {
    /// Configuration file path (defaults apply when it does not exist)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Encode files into an oligo pool
    Encode {
        /// Input files; file ids follow argument order
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Oligo pool output, one strand per line
        #[arg(short, long)]
        out: PathBuf,

        /// Manifest output
        #[arg(short, long, default_value = "registry.json")]
        manifest: PathBuf,

        /// Override the RS interleave radix
        #[arg(long)]
        radix: Option<usize>,

        /// Override the keystream seed
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Decode a pool of reads back into files
    Decode {
        /// Read file, one read per line
        reads: PathBuf,

        /// Manifest written at encode time
        #[arg(short, long, default_value = "registry.json")]
        manifest: PathBuf,

        /// Directory for the decoded files
        #[arg(short, long)]
        out_dir: PathBuf,

        /// Original files, to count byte errors per file
        #[arg(long)]
        compare: Vec<PathBuf>,

        /// Write the decode report as JSON
        #[arg(long)]
        report: Option<PathBuf>,

        /// Override the RS interleave radix
        #[arg(long)]
        radix: Option<usize>,

        /// Override the keystream seed
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Show the geometry a manifest implies
    Inspect {
        /// Manifest to inspect
        #[arg(short, long, default_value = "registry.json")]
        manifest: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    // Setup logging; RUST_LOG wins over --verbose
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set subscriber");

    let config_path = cli
        .config
        .as_deref()
        .map(expand_tilde)
        .unwrap_or_else(CodecConfig::default_path);

    if let Err(e) = run_command(cli.command, &config_path) {
        error!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run_command(command: Commands, config_path: &Path) -> Result<()> {
    match command {
        Commands::Init { force } => cmd_init(config_path, force),

        Commands::Encode {
            inputs,
            out,
            manifest,
            radix,
            seed,
        } => {
            let config = load_config(config_path, radix, seed)?;
            cmd_encode(config, &inputs, &out, &manifest)
        }

        Commands::Decode {
            reads,
            manifest,
            out_dir,
            compare,
            report,
            radix,
            seed,
        } => {
            let config = load_config(config_path, radix, seed)?;
            cmd_decode(config, &reads, &manifest, &out_dir, &compare, report.as_deref())
        }

        Commands::Inspect { manifest } => {
            let config = load_config(config_path, None, None)?;
            cmd_inspect(&config, &manifest)
        }
    }
}

/// Config file if present, defaults otherwise, then CLI overrides
fn load_config(path: &Path, radix: Option<usize>, seed: Option<u64>) -> Result<CodecConfig> {
    let mut config = if path.exists() {
        CodecConfig::load(path).with_context(|| format!("loading {}", path.display()))?
    } else {
        CodecConfig::from_env()?
    };

    if let Some(radix) = radix {
        config.radix = radix;
    }
    if let Some(seed) = seed {
        config.seed = seed;
    }
    config.validate()?;
    Ok(config)
}

fn cmd_init(config_path: &Path, force: bool) -> Result<()> {
    if config_path.exists() && !force {
        bail!(
            "{} already exists (use --force to overwrite)",
            config_path.display()
        );
    }

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    CodecConfig::default().save(config_path)?;
    info!("Configuration saved to {:?}", config_path);
    Ok(())
}

fn cmd_encode(config: CodecConfig, inputs: &[PathBuf], out: &Path, manifest: &Path) -> Result<()> {
    let files = inputs
        .iter()
        .map(|path| std::fs::read(path).with_context(|| format!("reading {}", path.display())))
        .collect::<Result<Vec<_>>>()?;

    for (id, path) in inputs.iter().enumerate() {
        info!("File {}: {:?} ({} bytes)", id, path, files[id].len());
    }

    let encoder = LadderEncoder::new(config)?;
    let pool = encoder.encode(&files)?;

    let writer = BufWriter::new(
        File::create(out).with_context(|| format!("creating {}", out.display()))?,
    );
    oligo::write_pool(writer, &pool.codewords, &encoder.config().oligo)?;
    pool.registry
        .save(manifest)
        .with_context(|| format!("writing {}", manifest.display()))?;

    let stats = &pool.stats;
    println!("Files encoded:           {}", stats.files);
    println!("Bytes encoded:           {}", stats.raw_bytes);
    println!("Oligos written:          {}", stats.transmitted_oligos);
    println!("Zero chunks skipped:     {}", stats.skipped_zero_chunks);
    println!("Oligo length (nt):       {}", stats.codeword_len);
    println!("Information density:     {:.4} bits/nt", stats.information_density);
    println!("Manifest:                {}", manifest.display());

    Ok(())
}

fn cmd_decode(
    config: CodecConfig,
    reads_path: &Path,
    manifest: &Path,
    out_dir: &Path,
    compare: &[PathBuf],
    report_path: Option<&Path>,
) -> Result<()> {
    let registry = FileRegistry::load(manifest)
        .with_context(|| format!("loading manifest {}", manifest.display()))?;

    let reader = BufReader::new(
        File::open(reads_path).with_context(|| format!("opening {}", reads_path.display()))?,
    );
    let reads = oligo::read_pool(reader, &config.oligo)?;
    info!("Read {} sequences from {:?}", reads.len(), reads_path);

    let decoder = LadderDecoder::new(config)?;
    let decoded = decoder.decode(&reads, &registry)?;

    std::fs::create_dir_all(out_dir)?;
    for (id, data) in decoded.files.iter().enumerate() {
        let path = out_dir.join(format!("file{:03}.bin", id));
        std::fs::write(&path, data).with_context(|| format!("writing {}", path.display()))?;
    }

    let report = &decoded.report;
    println!("Reads:                   {}", report.reads);
    println!("VT failures:             {}", report.vt_failures);
    println!("Out-of-range discards:   {}", report.out_of_range_discards);
    println!("Empty chunk positions:   {}", report.empty_chunks);
    println!(
        "RS blocks failed:        {} of {}",
        report.rs.failed_blocks, report.rs.blocks
    );
    println!(
        "Files intact:            {} of {}",
        report.intact_files(),
        decoded.files.len()
    );

    for (id, original) in compare.iter().enumerate() {
        let Some(data) = decoded.files.get(id) else {
            warn!("No decoded file for comparison input {:?}", original);
            continue;
        };
        let expected =
            std::fs::read(original).with_context(|| format!("reading {}", original.display()))?;
        println!("File {} byte errors:     {}", id, compare_bytes(&expected, data));
    }

    if let Some(path) = report_path {
        let json = serde_json::to_string_pretty(report)?;
        std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    }

    Ok(())
}

fn cmd_inspect(config: &CodecConfig, manifest: &Path) -> Result<()> {
    let registry = FileRegistry::load(manifest)
        .with_context(|| format!("loading manifest {}", manifest.display()))?;
    let length_ary = config.length_ary();

    println!("Files:                   {}", registry.len());
    println!("Id tag width (bits):     {}", registry.id_len());
    println!("Payload width (digits):  {}", length_ary);

    if let Err(e) = LadderDecoder::new(config.clone())?.check_registry(&registry) {
        warn!("Manifest does not fit the current configuration: {}", e);
    }

    for (id, entry) in registry.iter() {
        let layout = WordLayout::new(registry.id_len(), entry.b_len(), length_ary);
        let strand = find_smallest_n(layout.word_len(), config.correct_substitutions);
        println!(
            "{:>5}  {:>10} bytes  {:>8} chunks  pos {:>2} bits  word {:>4}  strand {:>4} nt",
            id,
            entry.raw_length,
            entry.chunk_count,
            entry.b_len(),
            layout.word_len(),
            strand
        );
    }

    Ok(())
}

/// Expand ~ to home directory
fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    path.to_path_buf()
}
