//! Tolerant extraction of structured facts from free-text phase output.
//!
//! Nothing in this module returns an error: malformed, partial or empty input
//! yields fewer (or zero) entries.

use serde_json::Value;

use crate::result::{Contradiction, ResearchProposal};

/// Strip markdown wrappers (headings, quotes, list markers, emphasis) from one line.
fn clean_line(line: &str) -> String {
    let mut s = line.trim();
    s = s.trim_start_matches('#').trim_start();
    s = s.trim_start_matches('>').trim_start();
    s = strip_list_marker(s);
    s.replace("**", "")
        .replace("__", "")
        .trim_matches(|c: char| c == '*' || c == '_' || c == '`')
        .trim()
        .to_string()
}

/// Drop a leading bullet (`- `, `* `, `+ `) or ordinal (`1. `, `2) `).
fn strip_list_marker(s: &str) -> &str {
    for bullet in ["- ", "* ", "+ "] {
        if let Some(rest) = s.strip_prefix(bullet) {
            return rest.trim_start();
        }
    }

    let rest = s.trim_start_matches(|c: char| c.is_ascii_digit());
    if rest.len() == s.len() {
        return s;
    }
    match rest.strip_prefix(|c: char| c == '.' || c == ')') {
        Some(after) if after.starts_with(char::is_whitespace) => after.trim_start(),
        _ => s,
    }
}

/// Split a cleaned line at its first colon into (normalized label, body).
///
/// The label is uppercased with spaces and hyphens folded into underscores so that
/// `Research proposal 2` and `RESEARCH_PROPOSAL 2` compare equal. Lines without a
/// colon are all label and have an empty body.
fn split_label(line: &str) -> (String, String) {
    let (label, body) = match line.split_once(':') {
        Some((label, body)) => (label, body),
        None => (line, ""),
    };
    let label = label
        .trim()
        .trim_matches(|c: char| c == '*' || c == '_')
        .to_uppercase()
        .replace([' ', '-'], "_");
    let body = body
        .trim()
        .trim_matches(|c: char| c == '*' || c == '_')
        .trim()
        .to_string();
    (label, body)
}

/// Labels like `PREDICTION`, `PREDICTION_2` or `PREDICTION_#3`.
fn is_numbered_prediction(label: &str) -> bool {
    match label.strip_prefix("PREDICTION") {
        Some(rest) => rest
            .trim_start_matches('_')
            .chars()
            .all(|c| c.is_ascii_digit() || c == '#' || c == '.' || c == ')'),
        None => false,
    }
}

/// Extract contradictions from antithesis text.
///
/// A header is any line whose label starts with `CONTRADICTION` (an ordinal may
/// follow). A later `EVIDENCE` line attaches evidence and closes the entry. A header
/// without inline text takes its description from the next plain line, or from its
/// evidence when the evidence line comes first.
pub fn extract_contradictions(text: &str) -> Vec<Contradiction> {
    let mut out = Vec::new();
    let mut pending: Option<Contradiction> = None;

    fn flush(pending: &mut Option<Contradiction>, out: &mut Vec<Contradiction>) {
        if let Some(entry) = pending.take() {
            if !entry.description.is_empty() {
                out.push(entry);
            }
        }
    }

    for raw in text.lines() {
        let line = clean_line(raw);
        if line.is_empty() {
            continue;
        }
        let (label, body) = split_label(&line);

        if label.starts_with("CONTRADICTION") {
            flush(&mut pending, &mut out);
            pending = Some(Contradiction {
                description: body,
                evidence: None,
            });
        } else if label.starts_with("EVIDENCE") {
            if let Some(mut entry) = pending.take() {
                if !body.is_empty() {
                    if entry.description.is_empty() {
                        entry.description = body.clone();
                    }
                    entry.evidence = Some(body);
                }
                pending = Some(entry);
                flush(&mut pending, &mut out);
            }
        } else if let Some(entry) = pending.as_mut() {
            if entry.description.is_empty() {
                entry.description = line;
            }
        }
    }

    flush(&mut pending, &mut out);
    out
}

/// Extract research proposals from synthesis text.
///
/// Headers start with `RESEARCH_PROPOSAL`; predictions are labelled
/// `TESTABLE_PREDICTION` or `PREDICTION <n>`. A prediction with no open proposal
/// becomes an entry of its own.
pub fn extract_research_proposals(text: &str) -> Vec<ResearchProposal> {
    let mut out = Vec::new();
    let mut pending: Option<ResearchProposal> = None;

    fn flush(pending: &mut Option<ResearchProposal>, out: &mut Vec<ResearchProposal>) {
        if let Some(entry) = pending.take() {
            if !entry.description.is_empty() {
                out.push(entry);
            }
        }
    }

    for raw in text.lines() {
        let line = clean_line(raw);
        if line.is_empty() {
            continue;
        }
        let (label, body) = split_label(&line);

        if label.starts_with("RESEARCH_PROPOSAL") {
            flush(&mut pending, &mut out);
            pending = Some(ResearchProposal {
                description: body,
                testable_prediction: None,
            });
        } else if label.starts_with("TESTABLE_PREDICTION") || is_numbered_prediction(&label) {
            if body.is_empty() {
                continue;
            }
            match pending.take() {
                Some(mut entry) => {
                    entry.testable_prediction = Some(body);
                    pending = Some(entry);
                    flush(&mut pending, &mut out);
                }
                None => out.push(ResearchProposal {
                    description: body.clone(),
                    testable_prediction: Some(body),
                }),
            }
        } else if let Some(entry) = pending.as_mut() {
            if entry.description.is_empty() {
                entry.description = line;
            }
        }
    }

    flush(&mut pending, &mut out);
    out
}

/// Byte ranges of balanced `{...}` spans, in order of their opening brace.
fn brace_candidates(text: &str) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut spans = Vec::new();

    for (start, &b) in bytes.iter().enumerate() {
        if b != b'{' {
            continue;
        }
        let mut depth = 0usize;
        let mut in_string = false;
        let mut escaped = false;
        for (offset, &c) in bytes[start..].iter().enumerate() {
            if in_string {
                match c {
                    _ if escaped => escaped = false,
                    b'\\' => escaped = true,
                    b'"' => in_string = false,
                    _ => {}
                }
                continue;
            }
            match c {
                b'"' => in_string = true,
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        spans.push(&text[start..=start + offset]);
                        break;
                    }
                }
                _ => {}
            }
        }
    }
    spans
}

/// Parse a conflict estimate from a classifier response.
///
/// Scans every brace-delimited substring, returns the first that parses as a JSON
/// object with a numeric `conflict` field, clamped to `[0, 1]`. Returns `0.0` when
/// nothing parses.
pub fn parse_conflict_value(text: &str) -> f64 {
    try_parse_conflict_value(text).unwrap_or(0.0)
}

/// Like [`parse_conflict_value`] but distinguishes "nothing found".
pub fn try_parse_conflict_value(text: &str) -> Option<f64> {
    brace_candidates(text).into_iter().find_map(|candidate| {
        let value: Value = serde_json::from_str(candidate).ok()?;
        let conflict = value.get("conflict")?.as_f64()?;
        conflict.is_finite().then(|| conflict.clamp(0.0, 1.0))
    })
}
