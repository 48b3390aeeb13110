// src/escape.rs
//
// HTML entity encoding and decoding.
//
// Encoding uses the entity forms notification producers emit for text
// content: numeric references for quotes and '+', named ones for & < >.
//
// Decoding follows the WHATWG rules for character references in text:
//   • named references come from the full HTML5 table; the legacy names
//     (amp, lt, nbsp, copy, ...) also match without ';' and as a prefix of a
//     longer run of letters ("&copy2" -> "©2", "&notit;" -> "¬it;")
//   • numeric references may omit ';'; 0x80-0x9F map through Windows-1252;
//     NUL, surrogates and values past U+10FFFF become U+FFFD
//   • anything unrecognised is left as written

use memchr::memchr;
use std::borrow::Cow;

#[inline]
fn needs_escape(c: char) -> bool {
    matches!(c, '\0' | '"' | '&' | '\'' | '+' | '<' | '>')
}

/// Entity-encode HTML-significant characters. NUL becomes U+FFFD.
pub(crate) fn escape_html(text: &str) -> Cow<'_, str> {
    let Some(first) = text.find(needs_escape) else {
        return Cow::Borrowed(text);
    };

    let mut out = String::with_capacity(text.len() + text.len() / 8 + 8);
    out.push_str(&text[..first]);
    for c in text[first..].chars() {
        match c {
            '\0' => out.push('\u{FFFD}'),
            '"' => out.push_str("&#34;"),
            '&' => out.push_str("&amp;"),
            '\'' => out.push_str("&#39;"),
            '+' => out.push_str("&#43;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    Cow::Owned(out)
}

/// Escape, then trim surrounding whitespace. This is the form the pipeline
/// applies whenever escaping is enabled.
pub(crate) fn escape_trimmed(text: &str) -> String {
    escape_html(text).trim().to_owned()
}

/* ============================ Entity decoding =========================== */

/// Names that are recognised without a trailing ';'.
const LEGACY_ENTITIES: &[&str] = &[
    "AElig", "AMP", "Aacute", "Acirc", "Agrave", "Aring", "Atilde", "Auml", "COPY", "Ccedil",
    "ETH", "Eacute", "Ecirc", "Egrave", "Euml", "GT", "Iacute", "Icirc", "Igrave", "Iuml", "LT",
    "Ntilde", "Oacute", "Ocirc", "Ograve", "Oslash", "Otilde", "Ouml", "QUOT", "REG", "THORN",
    "Uacute", "Ucirc", "Ugrave", "Uuml", "Yacute", "aacute", "acirc", "acute", "aelig", "agrave",
    "amp", "aring", "atilde", "auml", "brvbar", "ccedil", "cedil", "cent", "copy", "curren",
    "deg", "divide", "eacute", "ecirc", "egrave", "eth", "euml", "frac12", "frac14", "frac34",
    "gt", "iacute", "icirc", "iexcl", "igrave", "iquest", "iuml", "laquo", "lt", "macr", "micro",
    "middot", "nbsp", "not", "ntilde", "oacute", "ocirc", "ograve", "ordf", "ordm", "oslash",
    "otilde", "ouml", "para", "plusmn", "pound", "quot", "raquo", "reg", "sect", "shy", "sup1",
    "sup2", "sup3", "szlig", "thorn", "times", "uacute", "ucirc", "ugrave", "uml", "uuml",
    "yacute", "yen", "yuml",
];

const LONGEST_LEGACY: usize = 6;

/// Code points for numeric references 0x80..=0x9F.
const WINDOWS_1252: [char; 32] = [
    '\u{20AC}', '\u{0081}', '\u{201A}', '\u{0192}', '\u{201E}', '\u{2026}', '\u{2020}', '\u{2021}',
    '\u{02C6}', '\u{2030}', '\u{0160}', '\u{2039}', '\u{0152}', '\u{008D}', '\u{017D}', '\u{008F}',
    '\u{0090}', '\u{2018}', '\u{2019}', '\u{201C}', '\u{201D}', '\u{2022}', '\u{2013}', '\u{2014}',
    '\u{02DC}', '\u{2122}', '\u{0161}', '\u{203A}', '\u{0153}', '\u{009D}', '\u{017E}', '\u{0178}',
];

/// Decode named and numeric HTML character references.
pub(crate) fn unescape_html(text: &str) -> Cow<'_, str> {
    let Some(first) = memchr(b'&', text.as_bytes()) else {
        return Cow::Borrowed(text);
    };

    let mut out = String::with_capacity(text.len());
    out.push_str(&text[..first]);
    let mut rest = &text[first..];
    loop {
        // `rest` starts with '&'
        let used = decode_reference(rest, &mut out);
        rest = &rest[used..];
        match memchr(b'&', rest.as_bytes()) {
            Some(amp) => {
                out.push_str(&rest[..amp]);
                rest = &rest[amp..];
            }
            None => {
                out.push_str(rest);
                break;
            }
        }
    }
    Cow::Owned(out)
}

/// Decode the reference at the start of `s` into `out` and return how many
/// bytes it took. An unrecognised reference yields the bare '&'.
fn decode_reference(s: &str, out: &mut String) -> usize {
    let b = s.as_bytes();
    let decoded = if b.get(1) == Some(&b'#') {
        numeric_reference(b).map(|(c, used)| {
            out.push(c);
            used
        })
    } else {
        named_reference(s, out)
    };
    decoded.unwrap_or_else(|| {
        out.push('&');
        1
    })
}

fn numeric_reference(b: &[u8]) -> Option<(char, usize)> {
    if b.len() <= 3 {
        return None;
    }
    let mut i = 2;
    let radix = if matches!(b[i], b'x' | b'X') {
        i += 1;
        16
    } else {
        10
    };

    let mut value: u32 = 0;
    while i < b.len() {
        match (b[i] as char).to_digit(radix) {
            Some(d) => {
                value = value.saturating_mul(radix).saturating_add(d);
                i += 1;
            }
            None => {
                if b[i] == b';' {
                    i += 1;
                }
                break;
            }
        }
    }
    if i <= 3 {
        return None;
    }

    let c = match value {
        0x80..=0x9F => WINDOWS_1252[(value - 0x80) as usize],
        v => char::from_u32(v).filter(|&c| c != '\0').unwrap_or('\u{FFFD}'),
    };
    Some((c, i))
}

fn named_reference(s: &str, out: &mut String) -> Option<usize> {
    let b = s.as_bytes();
    let mut end = 1;
    while end < b.len() && b[end].is_ascii_alphanumeric() {
        end += 1;
    }
    if end < b.len() && b[end] == b';' {
        end += 1;
    }
    let name = &s[1..end];
    if name.is_empty() {
        return None;
    }

    let full = match name.strip_suffix(';') {
        Some(bare) => lookup_entity(bare),
        None if LEGACY_ENTITIES.contains(&name) => lookup_entity(name),
        None => None,
    };
    if let Some(decoded) = full {
        out.push_str(&decoded);
        return Some(end);
    }

    let longest = (name.len() - 1).min(LONGEST_LEGACY);
    for len in (2..=longest).rev() {
        let prefix = &name[..len];
        if !LEGACY_ENTITIES.contains(&prefix) {
            continue;
        }
        if let Some(decoded) = lookup_entity(prefix) {
            out.push_str(&decoded);
            return Some(len + 1);
        }
    }
    None
}

fn lookup_entity(name: &str) -> Option<String> {
    let reference = format!("&{name};");
    let decoded = html_escape::decode_html_entities(&reference);
    if decoded == reference.as_str() {
        None
    } else {
        Some(decoded.into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn escapes_the_unsafe_set() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & 'Jerry' +1</a>"#),
            "&lt;a href=&#34;x&#34;&gt;Tom &amp; &#39;Jerry&#39; &#43;1&lt;/a&gt;"
        );
    }

    #[test]
    fn plain_text_is_borrowed() {
        assert!(matches!(escape_html("nothing to do/here"), Cow::Borrowed(_)));
        assert!(matches!(unescape_html("nothing to do"), Cow::Borrowed(_)));
    }

    #[test]
    fn nul_is_replaced() {
        assert_eq!(escape_html("a\0b"), "a\u{FFFD}b");
    }

    #[test]
    fn trimmed_has_no_trailing_newline() {
        assert_eq!(escape_trimmed("  <br>\r\n"), "&lt;br&gt;");
        assert_eq!(escape_trimmed("\u{a0}x\u{a0}"), "x");
    }

    #[test]
    fn unescape_named_and_numeric() {
        assert_eq!(unescape_html("&lt;b&gt;&amp;&#34;&#x27;&quot;"), "<b>&\"'\"");
        assert_eq!(unescape_html("caf&eacute; &copy;"), "café ©");
    }

    #[rstest]
    // legacy names without ';'
    #[case("&amp b", "& b")]
    #[case("&lt", "<")]
    #[case("x&gtY", "x>Y")]
    #[case("a&nbsp;b&nbspc", "a\u{a0}b\u{a0}c")]
    #[case("&copy2", "©2")]
    #[case("&ampx", "&x")]
    #[case("&notit;", "¬it;")]
    // numeric without ';'
    #[case("&#39", "'")]
    #[case("&#x41B", "\u{41B}")]
    #[case("&#65x", "Ax")]
    // invalid code points
    #[case("&#0;", "\u{FFFD}")]
    #[case("&#xD800;", "\u{FFFD}")]
    #[case("&#1114112;", "\u{FFFD}")]
    #[case("&#99999999999999;", "\u{FFFD}")]
    // C1 range through Windows-1252
    #[case("&#128;", "€")]
    #[case("&#x9F;", "\u{178}")]
    #[case("&#x81;", "\u{81}")]
    // left alone
    #[case("&bogus;", "&bogus;")]
    #[case("&ltx;", "<x;")]
    #[case("&#;", "&#;")]
    #[case("&#xg", "&#xg")]
    #[case("&#5", "&#5")]
    #[case("& &&", "& &&")]
    #[case("&x", "&x")]
    fn unescape_follows_whatwg(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(unescape_html(input), expected);
    }

    #[test]
    fn escape_is_not_idempotent_on_ampersands() {
        let once = escape_trimmed("a & b");
        assert_eq!(once, "a &amp; b");
        assert_eq!(escape_trimmed(&once), "a &amp;amp; b");
    }
}
