/// Removes backslash escapes from `text`, keeping the escaped characters
/// themselves. A lone trailing backslash is preserved.
pub fn unescape(text: &str) -> String {
    let mut output = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some(escaped) => output.push(escaped),
                None => output.push('\\'),
            }
        }
        else {
            output.push(c);
        }
    }
    output
}

/// Appends `c` to a regular expression, escaping it if necessary.
pub fn push_escaped(pattern: &mut String, c: char) {
    if is_meta(c) {
        pattern.push('\\');
    }
    pattern.push(c);
}

// The set `regex-syntax` treats as meta characters.
const fn is_meta(c: char) -> bool {
    matches!(
        c,
        '\\' | '.'
            | '+'
            | '*'
            | '?'
            | '('
            | ')'
            | '|'
            | '['
            | ']'
            | '{'
            | '}'
            | '^'
            | '$'
            | '#'
            | '&'
            | '-'
            | '~'
    )
}

#[cfg(test)]
mod tests {
    use crate::escape::{push_escaped, unescape};

    #[test]
    fn unescape_removes_backslashes() {
        assert_eq!(unescape("a\\*b"), "a*b");
        assert_eq!(unescape("\\!\\(x\\)"), "!(x)");
        assert_eq!(unescape("plain"), "plain");
    }

    #[test]
    fn unescape_keeps_trailing_backslash() {
        assert_eq!(unescape("a\\"), "a\\");
    }

    #[test]
    fn unescape_handles_escaped_backslash() {
        assert_eq!(unescape("a\\\\b"), "a\\b");
    }

    #[test]
    fn escaped_meta_characters() {
        let mut pattern = String::new();
        for c in ".+(".chars() {
            push_escaped(&mut pattern, c);
        }
        assert_eq!(pattern, "\\.\\+\\(");

        let mut pattern = String::new();
        for c in "ab_".chars() {
            push_escaped(&mut pattern, c);
        }
        assert_eq!(pattern, "ab_");
    }
}
