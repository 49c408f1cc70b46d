use std::borrow::Cow;
use std::fmt::Write;

#[derive(Clone, Copy)]
enum State<'a> {
    Normal,
    SingleQuoted,
    DoubleQuoted,
    LineComment,
    BlockComment(usize),
    DollarQuoted(&'a str),
}

/// Shifts every `$n` placeholder in `sql` up by `offset`.
///
/// Quoted strings, quoted identifiers, comments and dollar-quoted bodies are
/// copied untouched. Returns a borrowed `Cow` when nothing changes.
pub(crate) fn shift_placeholders(sql: &str, offset: usize) -> Cow<'_, str> {
    if offset == 0 {
        return Cow::Borrowed(sql);
    }

    let bytes = sql.as_bytes();
    let mut out = String::with_capacity(sql.len() + 8);
    let mut copied = 0;
    let mut state = State::Normal;
    let mut idx = 0;

    while idx < bytes.len() {
        let b = bytes[idx];
        match state {
            State::Normal => match b {
                b'\'' => state = State::SingleQuoted,
                b'"' => state = State::DoubleQuoted,
                b'-' if bytes.get(idx + 1) == Some(&b'-') => state = State::LineComment,
                b'/' if bytes.get(idx + 1) == Some(&b'*') => {
                    state = State::BlockComment(1);
                    idx += 1;
                }
                b'$' => {
                    let digits_end = scan_digits(bytes, idx + 1);
                    if digits_end > idx + 1 {
                        if let Ok(n) = sql[idx + 1..digits_end].parse::<usize>() {
                            out.push_str(&sql[copied..idx]);
                            // Writing to a String cannot fail.
                            let _ = write!(out, "${}", n + offset);
                            copied = digits_end;
                        }
                        idx = digits_end;
                        continue;
                    }
                    if let Some(tag_end) = dollar_tag_end(bytes, idx) {
                        state = State::DollarQuoted(&sql[idx..=tag_end]);
                        idx = tag_end + 1;
                        continue;
                    }
                }
                _ => {}
            },
            State::SingleQuoted | State::DoubleQuoted => {
                let quote = if matches!(state, State::SingleQuoted) {
                    b'\''
                } else {
                    b'"'
                };
                if b == quote {
                    if bytes.get(idx + 1) == Some(&quote) {
                        idx += 1; // doubled quote
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::LineComment => {
                if b == b'\n' {
                    state = State::Normal;
                }
            }
            State::BlockComment(depth) => {
                if b == b'/' && bytes.get(idx + 1) == Some(&b'*') {
                    state = State::BlockComment(depth + 1);
                    idx += 1;
                } else if b == b'*' && bytes.get(idx + 1) == Some(&b'/') {
                    state = if depth == 1 {
                        State::Normal
                    } else {
                        State::BlockComment(depth - 1)
                    };
                    idx += 1;
                }
            }
            State::DollarQuoted(tag) => {
                if bytes[idx..].starts_with(tag.as_bytes()) {
                    state = State::Normal;
                    idx += tag.len();
                    continue;
                }
            }
        }
        idx += 1;
    }

    if copied == 0 {
        return Cow::Borrowed(sql);
    }
    out.push_str(&sql[copied..]);
    Cow::Owned(out)
}

/// Index one past the run of ASCII digits starting at `start`.
fn scan_digits(bytes: &[u8], start: usize) -> usize {
    let mut end = start;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    end
}

/// Index of the closing `$` of a dollar-quote tag such as `$$` or `$body$`.
fn dollar_tag_end(bytes: &[u8], start: usize) -> Option<usize> {
    let mut idx = start + 1;
    while idx < bytes.len() {
        match bytes[idx] {
            b'$' => return Some(idx),
            b if b.is_ascii_alphanumeric() || b == b'_' => idx += 1,
            _ => return None,
        }
    }
    None
}
