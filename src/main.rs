// src/main.rs
//
// scrubhtml: clean HTML-bearing notification text from a file or stdin
//
// Every pipeline flag has a --flag / --no-flag pair. Flags that are not given
// keep the library default; if both halves of a pair are given, --no-flag wins.
//
// CLI:
//   scrubhtml [FLAGS] [INPUT] [OUTPUT]
//   INPUT   : file to read, '-' or omitted for stdin
//   OUTPUT  : file to write, '-' or omitted for stdout
//   Either way the cleaned text is followed by a single '\n'.
//   -v      : debug logging, -vv trace logging (RUST_LOG overrides)

use clap::{ArgAction, Parser};
use scrubhtml::{sanitize_bytes, SanitizeOption};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// CLI flags
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Decode HTML entities before cleaning
    #[arg(long, action = ArgAction::SetTrue)]
    unescape: bool,
    #[arg(long = "no-unescape", action = ArgAction::SetTrue)]
    no_unescape: bool,

    /// Escape the raw input before line processing
    #[arg(long = "escape-first", action = ArgAction::SetTrue)]
    escape_first: bool,
    #[arg(long = "no-escape-first", action = ArgAction::SetTrue)]
    no_escape_first: bool,

    /// HTML-escape and trim the result
    #[arg(long, action = ArgAction::SetTrue)]
    escape: bool,
    #[arg(long = "no-escape", action = ArgAction::SetTrue)]
    no_escape: bool,

    /// Drop lines that only hold a single <br>
    #[arg(long = "strip-single-breaks", action = ArgAction::SetTrue)]
    strip_single_breaks: bool,
    #[arg(long = "no-strip-single-breaks", action = ArgAction::SetTrue)]
    no_strip_single_breaks: bool,

    /// Collapse whitespace runs to one space
    #[arg(long = "collapse-spaces", action = ArgAction::SetTrue)]
    collapse_spaces: bool,
    #[arg(long = "no-collapse-spaces", action = ArgAction::SetTrue)]
    no_collapse_spaces: bool,

    /// Remove &nbsp; entities
    #[arg(long = "strip-nbsp", action = ArgAction::SetTrue)]
    strip_nbsp: bool,
    #[arg(long = "no-strip-nbsp", action = ArgAction::SetTrue)]
    no_strip_nbsp: bool,

    /// Do not emit CRLF between lines
    #[arg(long = "replace-newlines", action = ArgAction::SetTrue)]
    replace_newlines: bool,
    #[arg(long = "no-replace-newlines", action = ArgAction::SetTrue)]
    no_replace_newlines: bool,

    /// Join lines with " <br> "
    #[arg(long = "newlines-to-breaks", action = ArgAction::SetTrue)]
    newlines_to_breaks: bool,
    #[arg(long = "no-newlines-to-breaks", action = ArgAction::SetTrue)]
    no_newlines_to_breaks: bool,

    /// Join lines with a line end that becomes <br> after escaping
    #[arg(long = "newlines-to-lineend", action = ArgAction::SetTrue)]
    newlines_to_lineend: bool,
    #[arg(long = "no-newlines-to-lineend", action = ArgAction::SetTrue)]
    no_newlines_to_lineend: bool,

    /// Turn pending line ends into " <br> "
    #[arg(long = "lineend-to-breaks", action = ArgAction::SetTrue)]
    lineend_to_breaks: bool,
    #[arg(long = "no-lineend-to-breaks", action = ArgAction::SetTrue)]
    no_lineend_to_breaks: bool,

    /// More logging (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Input file (default: stdin)
    input: Option<PathBuf>,

    /// Output file (default: stdout); the cleaned text is written followed by a newline
    output: Option<PathBuf>,
}

impl Cli {
    /// Options for the flags actually given, in declaration order.
    fn options(&self) -> Vec<SanitizeOption> {
        let pairs: [(bool, bool, fn(bool) -> SanitizeOption); 10] = [
            (self.unescape, self.no_unescape, SanitizeOption::Unescape),
            (self.escape_first, self.no_escape_first, SanitizeOption::EscapeFirst),
            (self.escape, self.no_escape, SanitizeOption::Escape),
            (
                self.strip_single_breaks,
                self.no_strip_single_breaks,
                SanitizeOption::StripSingleBreaks,
            ),
            (
                self.collapse_spaces,
                self.no_collapse_spaces,
                SanitizeOption::ReplaceMultipleSpaces,
            ),
            (self.strip_nbsp, self.no_strip_nbsp, SanitizeOption::StripNbsp),
            (
                self.replace_newlines,
                self.no_replace_newlines,
                SanitizeOption::ReplaceNewlines,
            ),
            (
                self.newlines_to_breaks,
                self.no_newlines_to_breaks,
                SanitizeOption::ReplaceNewlinesWithBreaks,
            ),
            (
                self.newlines_to_lineend,
                self.no_newlines_to_lineend,
                SanitizeOption::ReplaceNewlinesWithLineend,
            ),
            (
                self.lineend_to_breaks,
                self.no_lineend_to_breaks,
                SanitizeOption::ReplaceLineEndWithBreaks,
            ),
        ];

        pairs
            .into_iter()
            .filter_map(|(on, off, make)| toggle(on, off).map(make))
            .collect()
    }
}

// Precedence: --no-flag wins if both are present.
fn toggle(on: bool, off: bool) -> Option<bool> {
    if off {
        Some(false)
    } else if on {
        Some(true)
    } else {
        None
    }
}

fn is_stdio(path: Option<&Path>) -> bool {
    path.map_or(true, |p| p.as_os_str() == "-")
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn main() -> io::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let src = match cli.input.as_deref() {
        Some(path) if !is_stdio(Some(path)) => fs::read(path)?,
        _ => {
            let mut buf = Vec::new();
            io::stdin().lock().read_to_end(&mut buf)?;
            buf
        }
    };

    let options = cli.options();
    debug!(?options, bytes = src.len(), "read input");

    let mut out = sanitize_bytes(&src, &options);
    out.push('\n');

    match cli.output.as_deref() {
        Some(path) if !is_stdio(Some(path)) => fs::write(path, out)?,
        _ => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(out.as_bytes())?;
            stdout.flush()?;
        }
    }
    Ok(())
}
