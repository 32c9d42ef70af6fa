//! Balanced `{ ... }` body matching.
//!
//! A lazy "up to the next `}`" match stops at the first nested block. The
//! scanner below walks the body and keeps an explicit depth counter instead,
//! skipping braces that appear inside string and character literals and
//! comments.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Code,
    Str,
    Char,
    LineComment,
    BlockComment,
}

/// Given the byte offset of an opening `{`, return the offset just past its
/// matching `}`. `None` means the block never closes (or `open` is not a `{`).
pub fn match_balanced(text: &str, open: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    if bytes.get(open) != Some(&b'{') {
        return None;
    }

    let mut depth = 1usize;
    let mut state = State::Code;
    let mut i = open + 1;

    while i < bytes.len() {
        let b = bytes[i];
        match state {
            State::Code => match b {
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(i + 1);
                    }
                }
                b'"' => state = State::Str,
                b'\'' => state = State::Char,
                b'/' if bytes.get(i + 1) == Some(&b'/') => {
                    state = State::LineComment;
                    i += 1;
                }
                b'/' if bytes.get(i + 1) == Some(&b'*') => {
                    state = State::BlockComment;
                    i += 1;
                }
                _ => {}
            },
            State::Str | State::Char => {
                let quote = if state == State::Str { b'"' } else { b'\'' };
                if b == b'\\' {
                    i += 1;
                } else if b == quote || b == b'\n' {
                    state = State::Code;
                }
            }
            State::LineComment => {
                if b == b'\n' {
                    state = State::Code;
                }
            }
            State::BlockComment => {
                if b == b'*' && bytes.get(i + 1) == Some(&b'/') {
                    state = State::Code;
                    i += 1;
                }
            }
        }
        i += 1;
    }

    None
}
