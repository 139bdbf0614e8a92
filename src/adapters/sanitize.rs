//! Log redaction for patient data.
//!
//! Formatted log lines pass through [`RedactingMakeWriter`] before reaching
//! the sink. Redacted:
//! - Biomarker values written as `field=value` or `"field": value`
//! - Report ids (UUIDs)
//! - Emails, phone numbers, SSN- and MRN-like identifiers
//!
//! Prefer keeping raw inputs out of log calls entirely; this is a fallback.
//!
//! Lines are scanned in chunks of at most `CARDIOSCORE_SANITIZE_MAX_BYTES`
//! (default 16 KiB) so a single huge line stays cheap to redact.

use std::io::Write;
use std::sync::OnceLock;

use regex::{Regex, RegexSet};
use tracing_subscriber::fmt::MakeWriter;

use crate::domain::FEATURE_NAMES;

/// Default chunk size for scanning long lines.
pub const DEFAULT_MAX_LINE_BYTES: usize = 16 * 1024;

fn max_line_bytes() -> usize {
    static LIMIT: OnceLock<usize> = OnceLock::new();
    *LIMIT.get_or_init(|| {
        std::env::var("CARDIOSCORE_SANITIZE_MAX_BYTES")
            .ok()
            .and_then(|v| v.trim().parse::<usize>().ok())
            .filter(|&v| v > 0)
            .unwrap_or(DEFAULT_MAX_LINE_BYTES)
    })
}

static RULES: OnceLock<Rules> = OnceLock::new();

struct Rule {
    regex: Regex,
    replacement: String,
}

struct Rules {
    any: RegexSet,
    rules: Vec<Rule>,
}

fn rules() -> &'static Rules {
    RULES.get_or_init(|| {
        let fields = FEATURE_NAMES.join("|");
        let specs: Vec<(String, String)> = vec![
            (
                format!(r#"(?i)(["']?\b(?:{fields})\b["']?\s*[:=]\s*)("[^"]*"|[^\s,}}\]]+)"#),
                "${1}[REDACTED]".to_string(),
            ),
            (
                r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}"
                    .to_string(),
                "[REDACTED-ID]".to_string(),
            ),
            (
                r"(?i)\b[a-z0-9._%+-]+@(?:[a-z0-9-]+\.)+[a-z]{2,}\b".to_string(),
                "[REDACTED-EMAIL]".to_string(),
            ),
            (r"\b\d{3}-\d{2}-\d{4}\b".to_string(), "[REDACTED-SSN]".to_string()),
            (r"\bMRN[:\s]?\d{6,10}\b".to_string(), "[REDACTED-MRN]".to_string()),
            (
                r"\(?\b[0-9]{3}\)?[-.\s][0-9]{3}[-.\s][0-9]{4}\b".to_string(),
                "[REDACTED-PHONE]".to_string(),
            ),
        ];

        let any = RegexSet::new(specs.iter().map(|(p, _)| p.as_str())).expect("Valid regex set");
        let rules = specs
            .into_iter()
            .map(|(pattern, replacement)| Rule {
                regex: Regex::new(&pattern).expect("Valid regex"),
                replacement,
            })
            .collect();
        Rules { any, rules }
    })
}

fn split_at_char_boundary(input: &str, max_bytes: usize) -> (&str, &str) {
    if input.len() <= max_bytes {
        return (input, "");
    }
    let mut end = max_bytes;
    while end > 0 && !input.is_char_boundary(end) {
        end -= 1;
    }
    if end == 0 {
        // Limit smaller than one character: take that character whole.
        end = input.chars().next().map_or(input.len(), char::len_utf8);
    } else if let Some(space) = input[..end].rfind(' ').filter(|&i| i > 0) {
        // Keep `field=value` tokens in one chunk where possible.
        end = space + 1;
    }
    input.split_at(end)
}

fn redact_chunk(chunk: &str, rules: &Rules) -> String {
    let mut out = chunk.to_string();
    for idx in rules.any.matches(chunk).into_iter() {
        let rule = &rules.rules[idx];
        out = rule
            .regex
            .replace_all(&out, rule.replacement.as_str())
            .into_owned();
    }
    out
}

/// Redact patient data from a piece of text.
#[must_use]
pub fn redact(input: &str) -> String {
    redact_with_limit(input, max_line_bytes())
}

/// Redact `input` in chunks of at most `max_bytes`; nothing is dropped.
///
/// Chunks end at a space when one is available; a single token longer than
/// `max_bytes` may still be split and only partly redacted.
fn redact_with_limit(input: &str, max_bytes: usize) -> String {
    let rules = rules();
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while !rest.is_empty() {
        let (chunk, tail) = split_at_char_boundary(rest, max_bytes);
        out.push_str(&redact_chunk(chunk, rules));
        rest = tail;
    }
    out
}

/// Whether the text contains anything [`redact`] would change.
#[must_use]
pub fn contains_patient_data(input: &str) -> bool {
    rules().any.is_match(input)
}

/// A `tracing_subscriber` writer factory that redacts each formatted line.
#[derive(Debug, Clone)]
pub struct RedactingMakeWriter<M> {
    inner: M,
}

impl<M> RedactingMakeWriter<M> {
    #[must_use]
    pub fn new(inner: M) -> Self {
        Self { inner }
    }
}

impl<'a, M> MakeWriter<'a> for RedactingMakeWriter<M>
where
    M: MakeWriter<'a>,
{
    type Writer = RedactingWriter<M::Writer>;

    fn make_writer(&'a self) -> Self::Writer {
        RedactingWriter {
            inner: self.inner.make_writer(),
            pending: Vec::new(),
        }
    }
}

/// Line-buffering writer; complete lines are redacted and forwarded.
pub struct RedactingWriter<W: std::io::Write> {
    inner: W,
    pending: Vec<u8>,
}

impl<W: std::io::Write> RedactingWriter<W> {
    fn forward_complete_lines(&mut self) -> std::io::Result<()> {
        while let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            self.inner
                .write_all(redact(&String::from_utf8_lossy(&line)).as_bytes())?;
        }
        Ok(())
    }

    fn forward_rest(&mut self) -> std::io::Result<()> {
        if !self.pending.is_empty() {
            let rest = std::mem::take(&mut self.pending);
            self.inner
                .write_all(redact(&String::from_utf8_lossy(&rest)).as_bytes())?;
        }
        Ok(())
    }
}

impl<W: std::io::Write> std::io::Write for RedactingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.pending.extend_from_slice(buf);
        self.forward_complete_lines()?;
        // No newline for a long time: don't buffer without bound.
        if self.pending.len() > max_line_bytes() * 2 {
            self.forward_rest()?;
            self.inner.write_all(b"\n")?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.forward_complete_lines()?;
        self.forward_rest()?;
        self.inner.flush()
    }
}

impl<W: std::io::Write> Drop for RedactingWriter<W> {
    fn drop(&mut self) {
        // tracing creates one writer per event; push out a trailing partial line.
        let _ = self.flush();
    }
}
