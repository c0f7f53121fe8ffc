//! Deterministic tidy-up of model output between stages.
//!
//! Models regularly wrap an answer in a ```` ```markdown ```` fence, emit
//! CRLF line endings, or drop the separator row of a GFM table. Left alone,
//! those artefacts are copied forward into the next stage's prompt and end
//! up in the printed report. Each rule below is a pure `&str → String` pass
//! that fixes formatting only; the words are never touched.
//!
//! ## Rule order
//!
//! Fences are stripped before line endings are normalised so the fence regex
//! sees the raw answer; blank-line collapsing runs after trailing whitespace
//! is trimmed so whitespace-only lines count as blank.
//!
//! The line rules (3, 4 and 5) leave the inside of fenced code blocks
//! untouched: terminal charts and code are content, not formatting.

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply every tidy-up rule to a stage output.
///
/// Rules (applied in order):
/// 1. Strip an outer ```` ```markdown ```` / ```` ```json ```` / bare fence
/// 2. Normalise line endings (CRLF → LF)
/// 3. Trim trailing whitespace per line (outside code fences)
/// 4. Collapse 3+ consecutive blank lines down to 2 (outside code fences)
/// 5. Insert a missing GFM table separator row after a header row (outside
///    code fences)
/// 6. Strip invisible Unicode (zero-width spaces, BOM, soft hyphens)
/// 7. Trim leading/trailing blank space of the whole answer
pub fn tidy_output(input: &str) -> String {
    let s = strip_outer_fence(input);
    let s = normalise_line_endings(&s);
    let s = trim_trailing_whitespace(&s);
    let s = collapse_blank_lines(&s);
    let s = fix_missing_table_separator(&s);
    let s = remove_invisible_chars(&s);
    s.trim().to_string()
}

// ── Rule 1: Strip outer fence ───────────────────────────────────────────────

static RE_OUTER_FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^```(?:markdown|md|json)?[ \t]*\r?\n(.*?)\r?\n```\s*$").unwrap()
});

fn strip_outer_fence(input: &str) -> String {
    let trimmed = input.trim();
    match RE_OUTER_FENCE.captures(trimmed) {
        // A fence inside the body means the "outer" fence is really two
        // separate code blocks; leave those alone.
        Some(caps) if !caps[1].contains("\n```") => caps[1].to_string(),
        _ => input.to_string(),
    }
}

// ── Rule 2: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Code fences ─────────────────────────────────────────────────────────────

fn is_fence_line(line: &str) -> bool {
    let t = line.trim_start();
    t.starts_with("```") || t.starts_with("~~~")
}

/// Pair each line with whether it sits inside a fenced code block.
/// Fence delimiter lines themselves count as outside.
fn lines_with_fence_state(input: &str) -> Vec<(&str, bool)> {
    let mut in_fence = false;
    input
        .lines()
        .map(|line| {
            if is_fence_line(line) {
                in_fence = !in_fence;
                (line, false)
            } else {
                (line, in_fence)
            }
        })
        .collect()
}

// ── Rule 3: Trim trailing whitespace per line ────────────────────────────────

fn trim_trailing_whitespace(input: &str) -> String {
    lines_with_fence_state(input)
        .into_iter()
        .map(|(line, fenced)| if fenced { line } else { line.trim_end() })
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Rule 4: Collapse excessive blank lines ───────────────────────────────────

/// At most two consecutive empty lines survive outside code fences.
fn collapse_blank_lines(input: &str) -> String {
    let mut out: Vec<&str> = Vec::new();
    let mut blank_run = 0;

    for (line, fenced) in lines_with_fence_state(input) {
        if !fenced && line.is_empty() {
            blank_run += 1;
            if blank_run > 2 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push(line);
    }

    out.join("\n")
}

// ── Rule 5: Missing table separator ──────────────────────────────────────────

/// A header row directly followed by a data row gets a `| --- |` row
/// inserted between them. Only the first row of each table is considered.
fn fix_missing_table_separator(input: &str) -> String {
    let lines = lines_with_fence_state(input);
    let mut out: Vec<String> = Vec::with_capacity(lines.len() + 4);
    let mut prev_was_table = false;

    for (i, &(line, fenced)) in lines.iter().enumerate() {
        out.push(line.to_string());
        if fenced {
            prev_was_table = false;
            continue;
        }
        let is_row = is_table_row(line);

        if is_row && !prev_was_table && !is_separator_row(line) {
            let (next, next_fenced) = lines.get(i + 1).copied().unwrap_or(("", false));
            if !next_fenced && is_table_row(next) && !is_separator_row(next) {
                let cols = line.trim().matches('|').count().saturating_sub(1).max(1);
                let sep: String = std::iter::once("|")
                    .chain(std::iter::repeat_n(" --- |", cols))
                    .collect();
                out.push(sep);
            }
        }
        prev_was_table = is_row;
    }

    out.join("\n")
}

fn is_table_row(line: &str) -> bool {
    let t = line.trim();
    t.len() > 2 && t.starts_with('|') && t.ends_with('|')
}

fn is_separator_row(line: &str) -> bool {
    let t = line.trim();
    t.starts_with('|')
        && t.contains('-')
        && t.chars().all(|c| matches!(c, '|' | '-' | ':' | ' '))
}

// ── Rule 6: Remove invisible Unicode characters ─────────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    input.replace(
        [
            '\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}',
        ],
        "",
    )
}
