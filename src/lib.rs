// src/lib.rs
//
// scrubhtml: line-oriented cleanup of HTML-bearing notification text
//
// Pipeline, in this order:
//   1. optional entity decode of the whole input
//   2. optional early escape (escape_first) of the whole input
//   3. per line:
//        • drop lines that are only a single <br> / <br/> (any case, any
//          surrounding ASCII whitespace)
//        • collapse ASCII whitespace runs of 2+ to one space
//        • remove raw U+00A0
//        • append the line and its separator (CRLF, " <br> ", a pending line
//          end, or nothing)
//   4. optional late escape of the reassembled text, then trim
//   5. optional removal of &nbsp; entities (any case)
//   6. pending line ends become " <br> " (or vanish)
//
// Pending line ends are boundaries between buffer pieces, not text. Passes
// over the buffer run piece by piece and never see them.

use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;
use std::mem;
use tracing::{debug, trace, warn};

mod config;
mod escape;
mod lines;

pub use config::{Config, LineJoin, SanitizeOption};

use escape::{escape_html, escape_trimmed, unescape_html};
use lines::lines;

/* =============================== Patterns ================================ */

// `\s` here is the ASCII set only (\t \n \f \r space); U+00A0 is handled
// separately and must not count as whitespace for collapsing.
static SPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\t\n\x0C\r ]{2,}").unwrap());

static SINGLE_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^[\t\n\x0C\r ]*<br/?>[\t\n\x0C\r ]*$").unwrap());

static NBSP_ENTITY: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)&nbsp;").unwrap());

const BREAK: &str = " <br> ";
const CRLF: &str = "\r\n";
const NBSP: char = '\u{a0}';

/* ============================== Entry points ============================= */

/// Clean `input` using the default configuration overridden by `options`.
pub fn sanitize(input: &str, options: &[SanitizeOption]) -> String {
    Config::resolve(options).sanitize(input)
}

/// Like [`sanitize`] for raw bytes. Invalid UTF-8 is logged and replaced with
/// U+FFFD; processing always continues.
pub fn sanitize_bytes(input: &[u8], options: &[SanitizeOption]) -> String {
    match std::str::from_utf8(input) {
        Ok(text) => sanitize(text, options),
        Err(err) => {
            warn!(
                offset = err.valid_up_to(),
                "input is not valid UTF-8, continuing with replacement characters"
            );
            sanitize(&String::from_utf8_lossy(input), options)
        }
    }
}

/* ============================ Reassembly buffer ========================== */

/// Output text split at pending line ends. Each pending position has a
/// single space on either side, which lives in the neighbouring pieces.
struct Reassembly {
    done: Vec<String>,
    current: String,
}

impl Reassembly {
    fn with_capacity(cap: usize) -> Self {
        Reassembly {
            done: Vec::new(),
            current: String::with_capacity(cap),
        }
    }

    fn push_line(&mut self, line: &str) {
        if line.contains(NBSP) {
            self.current.extend(line.chars().filter(|&c| c != NBSP));
        } else {
            self.current.push_str(line);
        }
    }

    fn push_join(&mut self, join: LineJoin) {
        match join {
            LineJoin::Crlf => self.current.push_str(CRLF),
            LineJoin::Break => self.current.push_str(BREAK),
            LineJoin::LineEnd => {
                self.current.push(' ');
                let piece = mem::replace(&mut self.current, String::from(" "));
                self.done.push(piece);
            }
            LineJoin::Nothing => {}
        }
    }

    fn map_pieces<F>(&mut self, f: F)
    where
        F: Fn(&str) -> Cow<'_, str>,
    {
        for piece in self.done.iter_mut().chain(std::iter::once(&mut self.current)) {
            let replaced = match f(piece.as_str()) {
                Cow::Owned(s) => Some(s),
                Cow::Borrowed(_) => None,
            };
            if let Some(s) = replaced {
                *piece = s;
            }
        }
    }

    /// Trim whitespace at both ends of the whole text. A pending line end is
    /// not whitespace, so trimming stops at the first and last one.
    fn trim(&mut self) {
        let end = self.current.trim_end().len();
        self.current.truncate(end);

        let first = self.done.first_mut().unwrap_or(&mut self.current);
        let start = first.len() - first.trim_start().len();
        first.drain(..start);
    }

    fn escape(&mut self) {
        self.map_pieces(escape_html);
        self.trim();
    }

    fn strip_nbsp_entities(&mut self) {
        self.map_pieces(|piece| NBSP_ENTITY.replace_all(piece, ""));
    }

    /// Join the pieces, resolving every pending line end to a break or to
    /// nothing.
    fn finish(mut self, line_end_to_break: bool) -> String {
        if self.done.is_empty() {
            return self.current;
        }
        self.done.push(self.current);
        self.done.join(if line_end_to_break { BREAK } else { "" })
    }
}

/* ============================== Transform =============================== */

fn transform(cfg: &Config, input: &str) -> String {
    debug!(?cfg, len = input.len(), "sanitize");

    let mut text = Cow::Borrowed(input);
    if cfg.unescape {
        text = Cow::Owned(unescape_html(&text).into_owned());
    }
    if cfg.escape && cfg.escape_first {
        text = Cow::Owned(escape_trimmed(&text));
    }

    let join = cfg.line_join();
    let mut out = Reassembly::with_capacity(text.len() + text.len() / 8);
    let mut dropped = 0usize;

    for line in lines(&text) {
        if cfg.strip_single_breaks && SINGLE_BREAK.is_match(line) {
            dropped += 1;
            continue;
        }

        let line = if cfg.replace_multiple_spaces {
            SPACE_RUN.replace_all(line, " ")
        } else {
            Cow::Borrowed(line)
        };

        out.push_line(&line);
        out.push_join(join);
    }

    if dropped > 0 {
        trace!(dropped, "dropped single-break lines");
    }

    if cfg.escape && !cfg.escape_first {
        out.escape();
    }

    if cfg.strip_nbsp {
        out.strip_nbsp_entities();
    }

    out.finish(cfg.replace_lineend_with_breaks)
}
