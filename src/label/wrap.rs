//! Line wrapping and markup escaping.
//!
//! All lengths are counted in characters, never bytes, so a break can
//! never land inside a multi-byte character.

use crate::utils::config::TRANSCRIPT_WIDTH;
use serde_json::Value;

/// Insert line breaks into overlong lines
///
/// # Arguments
/// * `text` - Text to wrap; existing line breaks are kept
/// * `max_length` - Longest line (in characters) left untouched
/// * `cut_only` - `true` breaks at the word boundary nearest `max_length`
///   (hard cut when the line has no space); `false` breaks near the
///   midpoint of each overlong line, repeating on the halves
pub fn wrap(text: &str, max_length: usize, cut_only: bool) -> String {
    let max_length = max_length.max(1);

    text.split('\n')
        .map(|line| {
            let chars: Vec<char> = line.chars().collect();
            let mut out = Vec::new();
            if cut_only {
                cut_line(&chars, max_length, &mut out);
            } else {
                halve_line(&chars, max_length, &mut out);
            }
            out.join("\n")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn cut_line(chars: &[char], max_length: usize, out: &mut Vec<String>) {
    let mut rest = chars;

    while rest.len() > max_length {
        // Prefer the last space at or before the limit
        let split = rest[..=max_length]
            .iter()
            .rposition(|c| *c == ' ')
            .filter(|&pos| pos > 0);

        match split {
            Some(pos) => {
                out.push(rest[..pos].iter().collect());
                rest = &rest[pos + 1..];
            }
            None => {
                out.push(rest[..max_length].iter().collect());
                rest = &rest[max_length..];
            }
        }
    }

    out.push(rest.iter().collect());
}

fn halve_line(chars: &[char], max_length: usize, out: &mut Vec<String>) {
    if chars.len() <= max_length {
        out.push(chars.iter().collect());
        return;
    }

    let mid = chars.len() / 2;
    let nearest_space = chars
        .iter()
        .enumerate()
        .filter(|(_, c)| **c == ' ')
        .min_by_key(|(pos, _)| pos.abs_diff(mid))
        .map(|(pos, _)| pos);

    match nearest_space {
        Some(pos) => {
            halve_line(&chars[..pos], max_length, out);
            halve_line(&chars[pos + 1..], max_length, out);
        }
        None => {
            halve_line(&chars[..mid], max_length, out);
            halve_line(&chars[mid..], max_length, out);
        }
    }
}

/// Wrap transcript text at the transcript width
pub fn wrap_transcript(text: &str) -> String {
    wrap(text, TRANSCRIPT_WIDTH, true)
}

/// Escape markup-significant characters and turn line breaks into `<br/>`
///
/// The result is safe to embed inside an HTML-like table label cell.
pub fn sanitize_label(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\n' => out.push_str("<br/>"),
            other => out.push(other),
        }
    }
    out
}

/// Human-readable rendering of a parameter value
///
/// Strings are shown bare; everything else as compact JSON.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "None".to_string(),
        other => other.to_string(),
    }
}
