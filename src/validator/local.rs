/// atext ASCII + '.' non initial/terminal, pas de ".."
pub(crate) fn is_local_atext(s: &str) -> bool {
    if s.starts_with('.') || s.ends_with('.') || s.contains("..") {
        return false;
    }
    s.chars().all(|c| {
        c.is_ascii_alphanumeric()
            || matches!(
                c,
                '!' | '#'
                    | '$'
                    | '%'
                    | '&'
                    | '\''
                    | '*'
                    | '+'
                    | '-'
                    | '/'
                    | '='
                    | '?'
                    | '^'
                    | '_'
                    | '`'
                    | '{'
                    | '|'
                    | '}'
                    | '~'
                    | '.'
            )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn dots() {
        assert!(!is_local_atext(".abc"));
        assert!(!is_local_atext("abc."));
        assert!(!is_local_atext("a..b"));
        assert!(is_local_atext("a.b"));
    }
    #[test]
    fn rejects_space_and_quotes() {
        assert!(!is_local_atext("a b"));
        assert!(!is_local_atext("\"ab\""));
    }
}
