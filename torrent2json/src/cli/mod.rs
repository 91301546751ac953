use bencode_core::bencoding::{DEFAULT_MAX_DEPTH, DecodeOptions, MAX_DEPTH_LIMIT};
use bencode_core::{BytesPolicy, RenderOptions};
use clap::Parser;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Decode a .torrent file into pretty JSON", long_about = None)]
pub struct Args {
    /// Path to the torrent file (prompted for when omitted)
    pub torrent: Option<PathBuf>,

    /// Where to write the JSON instead of next to the torrent file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Maximum nesting depth accepted by the decoder
    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH, value_parser = parse_max_depth)]
    pub max_depth: usize,

    /// Replace invalid UTF-8 in byte strings instead of failing
    #[arg(long)]
    pub lossy: bool,

    /// Emit non-ASCII characters as-is instead of \u escapes
    #[arg(long)]
    pub unicode: bool,

    /// Do not print the JSON to stdout
    #[arg(short, long)]
    pub quiet: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    pub fn decode_options(&self) -> DecodeOptions {
        DecodeOptions {
            max_depth: self.max_depth,
        }
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            bytes: if self.lossy {
                BytesPolicy::Lossy
            } else {
                BytesPolicy::Strict
            },
            ascii_only: !self.unicode,
        }
    }

    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "debug",
            _ => "trace",
        }
    }
}

fn parse_max_depth(s: &str) -> Result<usize, String> {
    let depth: usize = s.parse().map_err(|e| format!("{e}"))?;
    if (1..=MAX_DEPTH_LIMIT).contains(&depth) {
        Ok(depth)
    } else {
        Err(format!("must be between 1 and {MAX_DEPTH_LIMIT}"))
    }
}

/// Asks for a path on `output` and reads one line from `input`.
pub fn prompt_path<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> io::Result<PathBuf> {
    write!(output, "Complete File path: ")?;
    output.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;
    let line = line.trim();
    if line.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "no torrent file path given",
        ));
    }
    Ok(PathBuf::from(line))
}
