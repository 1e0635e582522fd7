//! Text normalization ahead of pattern matching.

/// Keep only ASCII letters, digits, whitespace and `-():/`, then collapse
/// every whitespace run into one space.
pub fn sanitize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;

    for ch in text.chars() {
        if ch.is_whitespace() {
            if !in_space {
                out.push(' ');
                in_space = true;
            }
        } else if is_kept(ch) {
            out.push(ch);
            in_space = false;
        }
    }
    out
}

fn is_kept(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '-' | '(' | ')' | ':' | '/')
}
