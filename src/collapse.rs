// src/collapse.rs - numeric-run normalization for log field values

/// Replacement for every numeric-shaped word run.
pub const PLACEHOLDER: &str = "<N>";

/// Collapse numeric runs in `s`, appending the result to `dst`.
///
/// The input is scanned as alternating separator runs and word runs.
/// Separators are copied verbatim; each word run is either replaced by
/// [`PLACEHOLDER`] (pure decimal, or hex of length >= 4 with at least one
/// letter) or copied verbatim. The scan is a single pass with one character
/// of lookahead and never fails.
pub fn append_collapse_nums(dst: &mut String, s: &str) {
    let mut word_start: Option<usize> = None;
    let mut prev: Option<char> = None;
    let mut iter = s.char_indices().peekable();

    while let Some((i, c)) = iter.next() {
        let next = iter.peek().map(|&(_, c)| c);
        if is_separator(c, prev, next) {
            if let Some(start) = word_start.take() {
                push_word(dst, &s[start..i]);
            }
            dst.push(c);
        } else if word_start.is_none() {
            word_start = Some(i);
        }
        prev = Some(c);
    }
    if let Some(start) = word_start {
        push_word(dst, &s[start..]);
    }
}

/// Convenience wrapper around [`append_collapse_nums`].
pub fn collapse_nums(s: &str) -> String {
    let mut dst = String::with_capacity(s.len());
    append_collapse_nums(&mut dst, s);
    dst
}

fn push_word(dst: &mut String, word: &str) {
    if is_num_word(word) {
        dst.push_str(PLACEHOLDER);
    } else {
        dst.push_str(word);
    }
}

fn is_separator(c: char, prev: Option<char>, next: Option<char>) -> bool {
    if !is_word_char(c) {
        return true;
    }
    // Timestamp markers, the version prefix and duration unit letters split
    // word runs only next to a digit: "30Z" and "43s" split, "Zoo" and
    // "release" do not.
    is_marker_char(c)
        && (prev.is_some_and(|p| p.is_ascii_digit()) || next.is_some_and(|n| n.is_ascii_digit()))
}

fn is_word_char(c: char) -> bool {
    c == '_' || c.is_alphanumeric()
}

fn is_marker_char(c: char) -> bool {
    // 'µ' U+00B5 (micro sign) and 'μ' U+03BC (greek mu) both appear in the
    // wild as the microseconds prefix.
    matches!(c, 'T' | 'Z' | 'v' | 'h' | 'm' | 's' | 'n' | 'u' | 'µ' | 'μ')
}

fn is_num_word(word: &str) -> bool {
    if word.bytes().all(|b| b.is_ascii_digit()) {
        return true;
    }
    // Hex runs of 4+ chars are probable hashes / ids; shorter hex-shaped
    // words ("ad", "bed") are too often ordinary words to touch.
    let mut has_letter = false;
    for b in word.bytes() {
        match b {
            b'0'..=b'9' => {}
            b'a'..=b'f' | b'A'..=b'F' => has_letter = true,
            _ => return false,
        }
    }
    has_letter && word.len() >= 4
}

/// Placeholder-skeleton shapes folded by [`prettify_placeholders`], longest
/// shape first so the scan can take the first match at each position.
const PRETTIFY_SHAPES: &[(&str, &str)] = &[
    ("<N>-<N>-<N>T<N>:<N>:<N>.<N>+<N>:<N>", "<DATETIME>"),
    ("<N>-<N>-<N>T<N>:<N>:<N>.<N>-<N>:<N>", "<DATETIME>"),
    ("<N>-<N>-<N>T<N>:<N>:<N>.<N>Z", "<DATETIME>"),
    ("<N>-<N>-<N>T<N>:<N>:<N>.<N>", "<DATETIME>"),
    ("<N>-<N>-<N>T<N>:<N>:<N>+<N>:<N>", "<DATETIME>"),
    ("<N>-<N>-<N>T<N>:<N>:<N>-<N>:<N>", "<DATETIME>"),
    ("<N>-<N>-<N>T<N>:<N>:<N>Z", "<DATETIME>"),
    ("<N>-<N>-<N>T<N>:<N>:<N>", "<DATETIME>"),
    ("<N>-<N>-<N>-<N>-<N>", "<UUID>"),
    ("<N>.<N>.<N>.<N>", "<IP4>"),
    ("<N>:<N>:<N>.<N>", "<TIME>"),
    ("<N>:<N>:<N>", "<TIME>"),
    ("<N>-<N>-<N>", "<DATE>"),
    ("<N>.<N>", "<FLOAT>"),
];

/// Fold common placeholder skeletons in already-collapsed text into single
/// readable placeholders (`<DATETIME>`, `<IP4>`, ...). Pure and idempotent;
/// text without skeletons passes through unchanged.
pub fn prettify_placeholders(s: &str) -> String {
    let mut dst = String::with_capacity(s.len());
    let mut rest = s;
    'outer: while let Some(c) = rest.chars().next() {
        if c == '<' {
            for &(shape, replacement) in PRETTIFY_SHAPES {
                if let Some(tail) = rest.strip_prefix(shape) {
                    dst.push_str(replacement);
                    rest = tail;
                    continue 'outer;
                }
            }
        }
        dst.push(c);
        rest = &rest[c.len_utf8()..];
    }
    dst
}
