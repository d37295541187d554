// code-chat-markdown - Chat transcript markdown rendering for the terminal
// Copyright (C) 2025  Simon Peter Rothgang
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as
// published by the Free Software Foundation, either version 3 of the
// License, or (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Delimited math detection. No typesetting happens: math segments are shown
//! as their literal source.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LatexSegment {
    Text(String),
    Math(String),
}

const BLOCK_DELIMITERS: [(&str, &str); 3] = [("$$", "$$"), ("\\[", "\\]"), ("\\(", "\\)")];

/// Split paragraph source into text and math segments. Empty when the
/// paragraph contains no math at all.
pub fn paragraph_to_latex_segments(raw: &str) -> Vec<LatexSegment> {
    let mut segments = Vec::new();
    let mut found = false;
    let mut text_start = 0usize;
    let mut i = 0usize;

    while i < raw.len() {
        let rest = &raw[i..];
        if rest.starts_with("\\$") {
            i += 2;
            continue;
        }
        if rest.starts_with('`') {
            i += code_span_len(rest);
            continue;
        }
        if let Some(len) = math_len(rest) {
            if text_start < i {
                segments.push(LatexSegment::Text(raw[text_start..i].to_owned()));
            }
            segments.push(LatexSegment::Math(rest[..len].to_owned()));
            found = true;
            i += len;
            text_start = i;
            continue;
        }
        i += rest.chars().next().map_or(1, char::len_utf8);
    }

    if !found {
        return Vec::new();
    }
    if text_start < raw.len() {
        segments.push(LatexSegment::Text(raw[text_start..].to_owned()));
    }
    segments
}

/// Length of a code span starting at `rest`, or of the bare backtick run when
/// it never closes. Math inside code spans is literal code.
fn code_span_len(rest: &str) -> usize {
    let ticks = rest.len() - rest.trim_start_matches('`').len();
    let fence = &rest[..ticks];
    match rest[ticks..].find(fence) {
        Some(end) => ticks + end + ticks,
        None => ticks,
    }
}

fn math_len(rest: &str) -> Option<usize> {
    for (open, close) in BLOCK_DELIMITERS {
        if let Some(body) = rest.strip_prefix(open) {
            let end = body.find(close)?;
            if body[..end].trim().is_empty() {
                return None;
            }
            return Some(open.len() + end + close.len());
        }
    }

    // Inline `$…$`: content must hug both delimiters and the closing `$` must
    // not start a number, so prices like `$5 and $10` stay text.
    let body = rest.strip_prefix('$')?;
    if body.chars().next()?.is_whitespace() {
        return None;
    }
    let mut search = 0usize;
    while let Some(offset) = body[search..].find('$') {
        let end = search + offset;
        let prev = body[..end].chars().next_back();
        let next = body[end + 1..].chars().next();
        if prev.is_some_and(|c| !c.is_whitespace() && c != '\\')
            && !next.is_some_and(|c| c.is_ascii_digit())
        {
            return Some(1 + end + 1);
        }
        search = end + 1;
    }
    None
}
