//! Environment variable expansion for raw configuration text.
//!
//! Follows the rules of Go's `os.ExpandEnv`:
//! - `${NAME}` and `$NAME` become the variable's value, or nothing when unset.
//! - A single shell-special character (`*`, `#`, `$`, `@`, `!`, `?`, `-`
//!   or a digit) after `$` is a one-character name, so `$12` reads `1`.
//! - A `$` followed by anything else, or ending the text, is kept.
//! - `${}` is dropped, and so is the `${` of an unclosed brace. The text
//!   after it is kept.

/// Expand references using the process environment.
pub fn expand_env(input: &str) -> String {
    expand_with(input, |name| std::env::var(name).ok())
}

/// Expand references using `lookup` to resolve names.
pub fn expand_with<F>(input: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(pos) = rest.find('$') {
        let after = &rest[pos + 1..];
        if after.is_empty() {
            break;
        }
        out.push_str(&rest[..pos]);

        let (name, width) = shell_name(after);
        if !name.is_empty() {
            out.push_str(&lookup(name).unwrap_or_default());
        } else if width == 0 {
            out.push('$');
        }
        rest = &after[width..];
    }

    out.push_str(rest);
    out
}

fn is_shell_special(b: u8) -> bool {
    matches!(b, b'*' | b'#' | b'$' | b'@' | b'!' | b'?' | b'-' | b'0'..=b'9')
}

/// The name following a `$` and how many bytes it spans.
///
/// An empty name with a non-zero width is malformed syntax to be dropped.
fn shell_name(s: &str) -> (&str, usize) {
    let bytes = s.as_bytes();
    match bytes.first() {
        Some(b'{') => {
            if bytes.len() > 2 && is_shell_special(bytes[1]) && bytes[2] == b'}' {
                return (&s[1..2], 3);
            }
            match s[1..].find('}') {
                Some(0) => ("", 2),
                Some(end) => (&s[1..end + 1], end + 2),
                None => ("", 1),
            }
        }
        Some(&b) if is_shell_special(b) => (&s[..1], 1),
        _ => {
            let len = bytes
                .iter()
                .take_while(|b| b.is_ascii_alphanumeric() || **b == b'_')
                .count();
            (&s[..len], len)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(name: &str) -> Option<String> {
        match name {
            "HOME_DIR" => Some("/srv".to_string()),
            "PORT" => Some("8443".to_string()),
            "1" => Some("one".to_string()),
            _ => None,
        }
    }

    #[test]
    fn expands_braced_and_bare_names() {
        assert_eq!(expand_with("${HOME_DIR}/certs", lookup), "/srv/certs");
        assert_eq!(expand_with("port: $PORT", lookup), "port: 8443");
        assert_eq!(expand_with("$HOME_DIR$PORT", lookup), "/srv8443");
    }

    #[test]
    fn unset_variables_become_empty() {
        assert_eq!(expand_with("a${MISSING}b", lookup), "ab");
        assert_eq!(expand_with("a $MISSING b", lookup), "a  b");
    }

    #[test]
    fn lone_dollar_is_kept() {
        assert_eq!(expand_with("price: 5$", lookup), "price: 5$");
        assert_eq!(expand_with("a $ b", lookup), "a $ b");
    }

    #[test]
    fn special_characters_are_one_character_names() {
        assert_eq!(expand_with("$-x", lookup), "x");
        assert_eq!(expand_with("$12", lookup), "one2");
        assert_eq!(expand_with("${1}0", lookup), "one0");
        assert_eq!(expand_with("a$$b", lookup), "ab");
    }

    #[test]
    fn malformed_braces_are_dropped() {
        assert_eq!(expand_with("a${}b", lookup), "ab");
        assert_eq!(expand_with("a${UNCLOSED", lookup), "aUNCLOSED");
    }

    #[test]
    fn unclosed_brace_keeps_following_text() {
        let yaml = "body: \"cost ${5\"\n  redirects:\n    api.example.com: http://127.0.0.1:$PORT\n";
        assert_eq!(
            expand_with(yaml, lookup),
            "body: \"cost 5\"\n  redirects:\n    api.example.com: http://127.0.0.1:8443\n"
        );
    }

    #[test]
    fn text_without_references_is_unchanged() {
        let yaml = "environment: dev\nproxyConfig:\n  httpPort: 80\n";
        assert_eq!(expand_with(yaml, lookup), yaml);
    }
}
