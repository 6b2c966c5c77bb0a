/// Whitespace characters the line is trimmed and split on.
fn is_splitter(c: char) -> bool {
    c == ' ' || c == '\t'
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct TokenizedLine {
    pub tokens: Vec<String>,
    pub background: bool,
    pub auto_complete: bool,
}

/// Trim the line, record the trailing markers (`&` for background, `?` as a
/// completion request) and split into whitespace-delimited tokens. The
/// markers stay in the token stream; the parser discards a standalone `&`
/// instead of treating it as an argument.
pub fn tokenize(line: &str) -> TokenizedLine {
    let trimmed = line.trim_matches(is_splitter);
    let auto_complete = trimmed.ends_with('?');
    let background = trimmed.ends_with('&');
    let tokens = trimmed
        .split(is_splitter)
        .filter(|t| !t.is_empty())
        .map(str::to_owned)
        .collect();

    TokenizedLine {
        tokens,
        background,
        auto_complete,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trims_and_splits_on_whitespace() {
        let lexed = tokenize("  \tls  -l\t /tmp  ");
        assert_eq!(lexed.tokens, vec!["ls", "-l", "/tmp"]);
        assert!(!lexed.background);
        assert!(!lexed.auto_complete);
    }

    #[test]
    fn test_empty_and_blank_lines_yield_no_tokens() {
        assert_eq!(tokenize("").tokens.len(), 0);
        assert_eq!(tokenize(" \t \t ").tokens.len(), 0);
    }

    #[test]
    fn test_background_marker_is_detected_but_kept() {
        let lexed = tokenize("sleep 5 &");
        assert!(lexed.background);
        assert_eq!(lexed.tokens, vec!["sleep", "5", "&"]);
    }

    #[test]
    fn test_lone_ampersand() {
        let lexed = tokenize("&");
        assert!(lexed.background);
        assert_eq!(lexed.tokens, vec!["&"]);
    }

    #[test]
    fn test_completion_marker_is_detected() {
        let lexed = tokenize("ls /tm?");
        assert!(lexed.auto_complete);
        assert_eq!(lexed.tokens, vec!["ls", "/tm?"]);
    }

    #[test]
    fn test_quotes_do_not_split_tokens() {
        // splitting is strictly on whitespace; quotes are the parser's job
        let lexed = tokenize("echo 'a b'");
        assert_eq!(lexed.tokens, vec!["echo", "'a", "b'"]);
    }
}
