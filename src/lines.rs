// src/lines.rs
//
// Line scanner. A line ends at '\n'; a '\r' right before it belongs to the
// terminator. The last line keeps a trailing '\r' when no '\n' follows it.
// A final '\n' does not open an empty line.

use memchr::memchr;

pub(crate) struct Lines<'a> {
    rest: &'a str,
}

pub(crate) fn lines(text: &str) -> Lines<'_> {
    Lines { rest: text }
}

impl<'a> Iterator for Lines<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        if self.rest.is_empty() {
            return None;
        }
        match memchr(b'\n', self.rest.as_bytes()) {
            Some(nl) => {
                let line = &self.rest[..nl];
                self.rest = &self.rest[nl + 1..];
                Some(line.strip_suffix('\r').unwrap_or(line))
            }
            None => {
                let line = self.rest;
                self.rest = "";
                Some(line)
            }
        }
    }
}
