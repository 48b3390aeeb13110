// src/config.rs
//
// Sanitizer configuration: ten independent flags with fixed defaults, and the
// option values that override them one at a time.

use crate::transform;

/// Resolved sanitizer flags.
///
/// Build one with [`Config::resolve`] or start from [`Config::default`] and
/// chain [`Config::with`]. Once resolved it is never mutated by the pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    /// Decode HTML entities before anything else.
    pub unescape: bool,
    /// Escape the raw input before line processing instead of after it.
    pub escape_first: bool,
    /// HTML-escape the text and trim the escaped result.
    pub escape: bool,
    /// Drop lines that hold nothing but a single `<br>` or `<br/>`.
    pub strip_single_breaks: bool,
    /// Collapse whitespace runs inside a line to one space.
    pub replace_multiple_spaces: bool,
    /// Remove `&nbsp;` entities from the final text.
    pub strip_nbsp: bool,
    /// Do not emit CRLF between lines.
    pub replace_newlines: bool,
    /// Join lines with `" <br> "`.
    pub replace_newlines_with_breaks: bool,
    /// Join lines with a pending line end resolved after escaping.
    pub replace_newlines_with_lineend: bool,
    /// Turn pending line ends into `" <br> "`.
    pub replace_lineend_with_breaks: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            unescape: false,
            escape_first: false,
            escape: true,
            strip_single_breaks: true,
            replace_multiple_spaces: true,
            strip_nbsp: true,
            replace_newlines: true,
            replace_newlines_with_breaks: false,
            replace_newlines_with_lineend: false,
            replace_lineend_with_breaks: true,
        }
    }
}

/// A single flag override, applied on top of the defaults in caller order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SanitizeOption {
    Unescape(bool),
    EscapeFirst(bool),
    Escape(bool),
    StripSingleBreaks(bool),
    ReplaceMultipleSpaces(bool),
    StripNbsp(bool),
    ReplaceNewlines(bool),
    ReplaceNewlinesWithBreaks(bool),
    ReplaceNewlinesWithLineend(bool),
    ReplaceLineEndWithBreaks(bool),
}

/// What goes between two reassembled lines.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineJoin {
    /// A literal `"\r\n"`.
    Crlf,
    /// A literal `" <br> "`.
    Break,
    /// A pending line end, decided after escaping.
    LineEnd,
    /// Lines run straight into each other.
    Nothing,
}

impl Config {
    /// Defaults with `options` applied in order; the last option for a flag wins.
    pub fn resolve(options: &[SanitizeOption]) -> Config {
        let mut cfg = Config::default();
        for &opt in options {
            cfg.apply(opt);
        }
        cfg
    }

    pub fn apply(&mut self, opt: SanitizeOption) {
        match opt {
            SanitizeOption::Unescape(b) => self.unescape = b,
            SanitizeOption::EscapeFirst(b) => self.escape_first = b,
            SanitizeOption::Escape(b) => self.escape = b,
            SanitizeOption::StripSingleBreaks(b) => self.strip_single_breaks = b,
            SanitizeOption::ReplaceMultipleSpaces(b) => self.replace_multiple_spaces = b,
            SanitizeOption::StripNbsp(b) => self.strip_nbsp = b,
            SanitizeOption::ReplaceNewlines(b) => self.replace_newlines = b,
            SanitizeOption::ReplaceNewlinesWithBreaks(b) => self.replace_newlines_with_breaks = b,
            SanitizeOption::ReplaceNewlinesWithLineend(b) => {
                self.replace_newlines_with_lineend = b
            }
            SanitizeOption::ReplaceLineEndWithBreaks(b) => self.replace_lineend_with_breaks = b,
        }
    }

    pub fn with(mut self, opt: SanitizeOption) -> Config {
        self.apply(opt);
        self
    }

    /// The separator emitted after each kept line.
    ///
    /// Priority: CRLF when neither `replace_newlines` nor
    /// `replace_newlines_with_breaks` is set, then breaks, then a pending line
    /// end, then nothing. `replace_newlines_with_lineend` only matters while
    /// `replace_newlines` is on and breaks are off.
    pub fn line_join(&self) -> LineJoin {
        if !self.replace_newlines && !self.replace_newlines_with_breaks {
            LineJoin::Crlf
        } else if self.replace_newlines_with_breaks {
            LineJoin::Break
        } else if self.replace_newlines_with_lineend {
            LineJoin::LineEnd
        } else {
            LineJoin::Nothing
        }
    }

    /// Run the pipeline over `input` with this configuration.
    pub fn sanitize(&self, input: &str) -> String {
        transform(self, input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = Config::default();
        assert!(cfg.escape && cfg.strip_single_breaks && cfg.replace_multiple_spaces);
        assert!(cfg.strip_nbsp && cfg.replace_newlines && cfg.replace_lineend_with_breaks);
        assert!(!cfg.unescape && !cfg.escape_first);
        assert!(!cfg.replace_newlines_with_breaks && !cfg.replace_newlines_with_lineend);
        assert_eq!(cfg.line_join(), LineJoin::Nothing);
    }

    #[test]
    fn later_option_wins() {
        let cfg = Config::resolve(&[
            SanitizeOption::Escape(false),
            SanitizeOption::Unescape(true),
            SanitizeOption::Escape(true),
        ]);
        assert!(cfg.escape);
        assert!(cfg.unescape);
    }

    #[test]
    fn each_option_touches_one_flag() {
        let opts = [
            SanitizeOption::Unescape(true),
            SanitizeOption::EscapeFirst(true),
            SanitizeOption::Escape(false),
            SanitizeOption::StripSingleBreaks(false),
            SanitizeOption::ReplaceMultipleSpaces(false),
            SanitizeOption::StripNbsp(false),
            SanitizeOption::ReplaceNewlines(false),
            SanitizeOption::ReplaceNewlinesWithBreaks(true),
            SanitizeOption::ReplaceNewlinesWithLineend(true),
            SanitizeOption::ReplaceLineEndWithBreaks(false),
        ];
        for opt in opts {
            let changed = Config::default().with(opt);
            assert_ne!(changed, Config::default(), "{opt:?} changed nothing");
        }
        let all = Config::resolve(&opts);
        assert_eq!(
            all,
            Config {
                unescape: true,
                escape_first: true,
                escape: false,
                strip_single_breaks: false,
                replace_multiple_spaces: false,
                strip_nbsp: false,
                replace_newlines: false,
                replace_newlines_with_breaks: true,
                replace_newlines_with_lineend: true,
                replace_lineend_with_breaks: false,
            }
        );
    }

    #[test]
    fn line_join_priority() {
        let base = Config::default();
        let crlf = base.with(SanitizeOption::ReplaceNewlines(false));
        assert_eq!(crlf.line_join(), LineJoin::Crlf);
        // lineend alone cannot override the CRLF case
        assert_eq!(
            crlf.with(SanitizeOption::ReplaceNewlinesWithLineend(true)).line_join(),
            LineJoin::Crlf
        );
        assert_eq!(
            crlf.with(SanitizeOption::ReplaceNewlinesWithBreaks(true)).line_join(),
            LineJoin::Break
        );
        let both = base
            .with(SanitizeOption::ReplaceNewlinesWithBreaks(true))
            .with(SanitizeOption::ReplaceNewlinesWithLineend(true));
        assert_eq!(both.line_join(), LineJoin::Break);
        assert_eq!(
            base.with(SanitizeOption::ReplaceNewlinesWithLineend(true)).line_join(),
            LineJoin::LineEnd
        );
    }
}
