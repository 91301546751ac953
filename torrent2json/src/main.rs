mod cli;
mod storage;

use anyhow::Context;
use bencode_core::{read_torrent, torrent_to_json};
use clap::Parser;
use cli::Args;
use log::info;
use std::io::{self, Write};
use std::path::Path;
use storage::Storage;

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(args.log_level()))
        .init();

    let path = match &args.torrent {
        Some(p) => p.clone(),
        None => cli::prompt_path(&mut io::stdin().lock(), &mut io::stdout())
            .context("No .torrent file found! Please check path")?,
    };

    run(&args, &path, &mut io::stdout().lock())
}

/// Converts one torrent file, printing the JSON to `out` unless quiet.
fn run<W: Write>(args: &Args, path: &Path, out: &mut W) -> anyhow::Result<()> {
    let buf = read_torrent(path)?;
    info!("read {} bytes from {}", buf.len(), path.display());

    let json = torrent_to_json(&buf, &args.decode_options(), &args.render_options())
        .with_context(|| format!("Cannot read file {}", path.display()))?;

    if !args.quiet {
        out.write_all(&json)?;
        writeln!(out)?;
    }

    let storage = Storage::new(path, args.output.clone());
    storage
        .write(&json)
        .with_context(|| format!("Failed to write {}", storage.get_output_path_str()))?;
    writeln!(out, "File written to: {}", storage.get_output_path_str())?;
    Ok(())
}
