//! Best-effort cleanup of JavaScript state blobs embedded in HTML pages.
//!
//! Pages assign a JS object literal to a global (`window.__INITIAL_STATE__=`).
//! The literal is close to JSON but may contain bare `undefined`, raw control
//! characters and assorted escapes. [`sanitize_state_json`] rewrites it into
//! something `serde_json` accepts while keeping string boundaries intact.

/// Return the balanced `{...}` object literal that follows `marker`.
///
/// Braces inside double-quoted strings are ignored. `None` when the marker is
/// absent, no object follows it, or the braces never balance.
pub fn extract_object_literal<'a>(script: &'a str, marker: &str) -> Option<&'a str> {
    let start = script.find(marker)? + marker.len();
    let rest = &script[start..];
    let open = rest.len() - rest.trim_start().len();
    if !rest[open..].starts_with('{') {
        return None;
    }

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in rest[open..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&rest[open..open + i + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Rewrite a JS object literal into parseable JSON.
///
/// Outside strings, bare `undefined` becomes `null` and control characters
/// become spaces. Inside strings, `\uXXXX` escapes are decoded (surrogate
/// pairs included), whitespace escapes become a space, `\/` and `\'` lose
/// their backslash, and `\"` / `\\` are kept. Whitespace runs are collapsed
/// and the result is trimmed. Applying it twice gives the same output.
pub fn sanitize_state_json(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len());
    let mut in_string = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if !in_string {
            if c == '"' {
                in_string = true;
                out.push(c);
            } else if c.is_control() {
                out.push(' ');
            } else if is_bare_undefined(&chars, i) {
                out.push_str("null");
                i += UNDEFINED.len();
                continue;
            } else {
                out.push(c);
            }
            i += 1;
            continue;
        }

        match c {
            '"' => {
                in_string = false;
                out.push(c);
                i += 1;
            }
            '\\' => {
                i = push_escape(&chars, i, &mut out);
            }
            c if c.is_control() => {
                if c.is_whitespace() {
                    out.push(' ');
                }
                i += 1;
            }
            c => {
                out.push(c);
                i += 1;
            }
        }
    }

    collapse_whitespace(&out)
}

const UNDEFINED: &str = "undefined";

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

fn is_bare_undefined(chars: &[char], i: usize) -> bool {
    let end = i + UNDEFINED.len();
    if end > chars.len() || !UNDEFINED.chars().eq(chars[i..end].iter().copied()) {
        return false;
    }
    let before_ok = i == 0 || !is_ident_char(chars[i - 1]);
    let after_ok = end == chars.len() || !is_ident_char(chars[end]);
    before_ok && after_ok
}

/// Handle the escape starting at `chars[i] == '\\'`; returns the next index.
fn push_escape(chars: &[char], i: usize, out: &mut String) -> usize {
    let Some(&next) = chars.get(i + 1) else {
        return i + 1;
    };

    match next {
        'u' => {
            let Some(unit) = hex4(chars, i + 2) else {
                // Malformed: drop the `\u` and keep what follows as text.
                return i + 2;
            };
            let mut consumed = 6;
            let decoded = if (0xD800..0xDC00).contains(&unit) {
                let low = (chars.get(i + 6) == Some(&'\\') && chars.get(i + 7) == Some(&'u'))
                    .then(|| hex4(chars, i + 8))
                    .flatten()
                    .filter(|low| (0xDC00..0xE000).contains(low));
                match low {
                    Some(low) => {
                        consumed = 12;
                        char::from_u32(0x10000 + ((unit - 0xD800) << 10) + (low - 0xDC00))
                    }
                    None => None,
                }
            } else {
                char::from_u32(unit)
            };
            if let Some(ch) = decoded {
                push_string_char(ch, out);
            }
            i + consumed
        }
        'n' | 'r' | 't' | 'f' | 'b' => {
            out.push(' ');
            i + 2
        }
        '"' | '\\' => {
            out.push('\\');
            out.push(next);
            i + 2
        }
        other => {
            push_string_char(other, out);
            i + 2
        }
    }
}

/// Push a decoded character that lands inside a JSON string.
fn push_string_char(ch: char, out: &mut String) {
    match ch {
        '"' => out.push_str("\\\""),
        '\\' => out.push_str("\\\\"),
        c if c.is_control() => {
            if c.is_whitespace() {
                out.push(' ');
            }
        }
        c => out.push(c),
    }
}

fn hex4(chars: &[char], start: usize) -> Option<u32> {
    let digits = chars.get(start..start + 4)?;
    digits
        .iter()
        .try_fold(0u32, |acc, c| c.to_digit(16).map(|d| acc * 16 + d))
}

fn collapse_whitespace(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut last_space = false;
    for c in s.chars() {
        if c.is_whitespace() {
            if !last_space {
                out.push(' ');
            }
            last_space = true;
        } else {
            out.push(c);
            last_space = false;
        }
    }
    out.trim().to_string()
}
