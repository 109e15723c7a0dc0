//! Byte-level line primitives.
//!
//! Everything here is UTF-8-agnostic: a line is whatever sits between `\n`
//! bytes. Two boundary conventions coexist, matching the command semantics:
//!
//! * selection by *separator* (`head`, `lines`, `insert`): a trailing `\n`
//!   opens one more, empty, position;
//! * selection by *terminator* (`tail`, `delete`, `count`, line bands): a
//!   trailing `\n` belongs to the line it ends and opens nothing.

/// First `n` lines, without the newline that would terminate the last one.
pub fn head(content: &[u8], n: usize) -> &[u8] {
    if n == 0 {
        return &content[..0];
    }
    let mut seen = 0;
    for (i, &b) in content.iter().enumerate() {
        if b == b'\n' {
            seen += 1;
            if seen == n {
                return &content[..i];
            }
        }
    }
    content
}

/// Last `n` lines, each keeping its terminator.
pub fn tail(content: &[u8], n: usize) -> &[u8] {
    if n == 0 || content.is_empty() {
        return &content[..0];
    }
    let body = match content.split_last() {
        Some((&b'\n', body)) => body,
        _ => content,
    };
    let pos = newline_positions(body);
    let total = pos.len() + 1;
    if n >= total {
        return content;
    }
    &content[pos[total - n - 1] + 1..]
}

/// Number of lines under the terminator convention: empty content has none,
/// an unterminated final line still counts.
pub fn count(content: &[u8]) -> usize {
    if content.is_empty() {
        return 0;
    }
    let body = match content.split_last() {
        Some((&b'\n', body)) => body,
        _ => content,
    };
    newline_positions(body).len() + 1
}

/// Inclusive 1-indexed range of lines joined by their separators.
/// `end = None` reads to EOF; an out-of-range `start` yields nothing and an
/// out-of-range `end` clamps.
pub fn slice_range(content: &[u8], start: usize, end: Option<usize>) -> &[u8] {
    let pos = newline_positions(content);
    let elements = pos.len() + 1;
    if start > elements {
        return &content[..0];
    }
    let begin = if start == 1 { 0 } else { pos[start - 2] + 1 };
    let stop = match end {
        Some(e) if e < elements => pos[e - 1],
        _ => content.len(),
    };
    &content[begin..stop]
}

/// Insert `text` as new line content after 1-indexed line `after_line`.
/// `0` prepends, `-1` appends, a position past the last line appends.
/// The caller has already rejected anything below `-1`.
pub fn insert(content: &[u8], after_line: i64, text: &[u8]) -> Vec<u8> {
    let mut elements: Vec<&[u8]> = if content.is_empty() {
        Vec::new()
    } else {
        content.split(|&b| b == b'\n').collect()
    };
    let idx = match after_line {
        -1 => elements.len(),
        n => (n as usize).min(elements.len()),
    };
    elements.insert(idx, text);
    elements.join(&b"\n"[..])
}

/// Delete the inclusive 1-indexed line range, returning the new content and
/// the number of lines removed. Deleting the final line keeps the newline
/// that terminated the previous retained one.
pub fn delete(content: &[u8], start: usize, end: usize) -> (Vec<u8>, usize) {
    let total = count(content);
    if start > total {
        return (content.to_vec(), 0);
    }
    let end = end.min(total);
    let (a, b) = span(content, start, end);
    let mut out = Vec::with_capacity(content.len() - (b - a));
    out.extend_from_slice(&content[..a]);
    out.extend_from_slice(&content[b..]);
    (out, end - start + 1)
}

/// Line, word and byte counts.
pub fn counts(content: &[u8]) -> (u64, u64, u64) {
    let words = content
        .split(|b| b.is_ascii_whitespace())
        .filter(|w| !w.is_empty())
        .count() as u64;
    (count(content) as u64, words, content.len() as u64)
}

/// Exact byte-string replacement, optionally restricted to matches lying
/// entirely inside the byte span of lines `band = (start, end)`. Returns the
/// new content and the replacement count.
pub fn replace(
    content: &[u8],
    old: &[u8],
    new: &[u8],
    band: Option<(usize, usize)>,
    all: bool,
) -> (Vec<u8>, u64) {
    let limit = band.map(|(s, e)| {
        let total = count(content);
        if s > total {
            (0, 0)
        } else {
            span(content, s, e.min(total))
        }
    });
    let mut out = Vec::with_capacity(content.len());
    let mut done = 0u64;
    let mut i = 0;
    while i < content.len() {
        let allowed = match limit {
            None => true,
            Some((a, b)) => i >= a && i + old.len() <= b,
        };
        if (all || done == 0) && allowed && content[i..].starts_with(old) {
            out.extend_from_slice(new);
            i += old.len();
            done += 1;
        } else {
            out.push(content[i]);
            i += 1;
        }
    }
    (out, done)
}

/// Byte span covering lines `start..=end` under the terminator convention.
/// The caller guarantees `1 <= start <= end <= count(content)`.
fn span(content: &[u8], start: usize, end: usize) -> (usize, usize) {
    let pos = newline_positions(content);
    let begin = if start == 1 { 0 } else { pos[start - 2] + 1 };
    let stop = if end - 1 < pos.len() {
        pos[end - 1] + 1
    } else {
        content.len()
    };
    (begin, stop)
}

fn newline_positions(content: &[u8]) -> Vec<usize> {
    content
        .iter()
        .enumerate()
        .filter(|(_, &b)| b == b'\n')
        .map(|(i, _)| i)
        .collect()
}
