// src/main.rs
mod log;
mod logger;

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use huffpress::{Header, Summary};
use tracing::{info, warn};

const TEMP_EXT: &str = "tmp"; // For atomic writes

#[derive(Parser)]
#[command(name = "huffpress", version)]
#[command(about = "Compress and decompress files with Huffman codes.", long_about = None)]
struct Cli {
    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    /// Append a JSON line for every finished command to this file
    #[arg(long, global = true)]
    log: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compress INPUT into OUTPUT
    Compress { output: PathBuf, input: PathBuf },
    /// Decompress INPUT into OUTPUT
    Decompress { output: PathBuf, input: PathBuf },
    /// Print the code table of a compressed file
    Inspect { input: PathBuf },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    if let Err(e) = logger::init(cli.verbose) {
        eprintln!("logging disabled: {e}");
    }

    let span = tracing::info_span!("command", command = ?std::env::args().collect::<Vec<_>>());
    let _enter = span.enter();

    match &cli.command {
        Commands::Compress { output, input } => {
            let summary = write_atomically(output, |out| {
                let reader = BufReader::new(open(input)?);
                huffpress::compress(reader, out)
                    .with_context(|| format!("failed to compress {}", input.display()))
            })?;
            report("compressed", input, output, &summary);
            record(cli.log.as_deref(), "compress", input, output, summary)?;
        }
        Commands::Decompress { output, input } => {
            let summary = write_atomically(output, |out| {
                let reader = BufReader::new(open(input)?);
                huffpress::decompress(reader, out)
                    .with_context(|| format!("failed to decompress {}", input.display()))
            })?;
            report("decompressed", input, output, &summary);
            record(cli.log.as_deref(), "decompress", input, output, summary)?;
        }
        Commands::Inspect { input } => inspect(input)?,
    }

    Ok(())
}

fn open(path: &Path) -> anyhow::Result<File> {
    File::open(path).with_context(|| format!("cannot open {}", path.display()))
}

/// Run `body` against a temporary file next to `path` and move it into
/// place only if `body` succeeds.
fn write_atomically<F>(path: &Path, body: F) -> anyhow::Result<Summary>
where
    F: FnOnce(&mut BufWriter<File>) -> anyhow::Result<Summary>,
{
    let mut temp_name = OsString::from(path.as_os_str());
    temp_name.push(".");
    temp_name.push(TEMP_EXT);
    let temp_path = PathBuf::from(temp_name);

    let file = File::create(&temp_path)
        .with_context(|| format!("cannot create {}", temp_path.display()))?;
    let mut writer = BufWriter::new(file);

    let result = body(&mut writer);
    drop(writer);

    match result {
        Ok(summary) => {
            fs::rename(&temp_path, path)
                .with_context(|| format!("cannot write {}", path.display()))?;
            Ok(summary)
        }
        Err(e) => {
            if let Err(cleanup) = fs::remove_file(&temp_path) {
                warn!(path = %temp_path.display(), error = %cleanup, "could not remove temporary file");
            }
            Err(e)
        }
    }
}

fn report(action: &str, input: &Path, output: &Path, summary: &Summary) {
    info!(
        original = summary.original_bytes,
        compressed = summary.compressed_bytes,
        symbols = summary.symbols,
        "{action} {}",
        input.display()
    );
    let ratio = summary
        .ratio()
        .map(|r| format!("{:.1}%", r * 100.0))
        .unwrap_or_else(|| "n/a".to_string());
    println!(
        "{} -> {}: {} {} bytes original, {} bytes compressed, {} symbols, ratio {}",
        input.display(),
        output.display(),
        action,
        summary.original_bytes,
        summary.compressed_bytes,
        summary.symbols,
        ratio
    );
}

fn record(
    log: Option<&Path>,
    action: &str,
    input: &Path,
    output: &Path,
    summary: Summary,
) -> anyhow::Result<()> {
    if let Some(log) = log {
        let entry = log::LogEntry::new(action, input, output, summary);
        log::log_action(log, &entry)
            .with_context(|| format!("cannot append to log {}", log.display()))?;
    }
    Ok(())
}

fn inspect(input: &Path) -> anyhow::Result<()> {
    let mut reader = BufReader::new(open(input)?);
    if reader.fill_buf()?.is_empty() {
        println!("{}: empty stream", input.display());
        return Ok(());
    }

    let header = Header::read(&mut reader)
        .with_context(|| format!("cannot read header of {}", input.display()))?;
    header
        .rebuild_tree()
        .with_context(|| format!("invalid code table in {}", input.display()))?;

    println!("symbols:         {}", header.entries.len());
    println!("original length: {}", header.original_length);
    println!("header bytes:    {}", header.encoded_len());
    for entry in &header.entries {
        let shown = if entry.symbol.is_ascii_graphic() {
            format!("'{}'", entry.symbol as char)
        } else {
            String::new()
        };
        println!(
            "{:#04x} {:>3} {:>2} {}",
            entry.symbol,
            shown,
            entry.code_length,
            entry.bit_string()
        );
    }
    Ok(())
}
