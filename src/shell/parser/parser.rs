use log::warn;

use super::ast::Command;
use super::lexer::{self, TokenizedLine};

pub struct Parser<'a> {
    line: &'a str,
}

impl<'a> Parser<'a> {
    pub fn new(line: &'a str) -> Self {
        Parser { line }
    }

    /// Parse the line into the head of an owned command-node chain.
    /// Malformed input degrades to a safe node; parsing never fails.
    pub fn parse(&self) -> Command {
        let TokenizedLine {
            tokens,
            background,
            auto_complete,
        } = lexer::tokenize(self.line);

        let mut head = parse_segment(&tokens);
        head.background = background;
        head.auto_complete = auto_complete;
        head
    }
}

/// segment := name arg*. A `|` token ends the segment and the remainder of
/// the token stream is parsed into the next node of the chain.
fn parse_segment(tokens: &[String]) -> Command {
    let mut command = Command::default();
    let mut named = false;

    for (index, token) in tokens.iter().enumerate() {
        if token == "|" {
            command.next = Some(Box::new(parse_segment(&tokens[index + 1..])));
            break;
        }
        if token == "&" {
            // already consumed as a flag by the tokenizer
            continue;
        }
        if !named {
            command.name = token.clone();
            named = true;
            continue;
        }
        // `>>` has to be recognized before `>`
        if let Some(path) = token.strip_prefix(">>") {
            assign_redirect(&mut command.redirects.append, path, token);
        } else if let Some(path) = token.strip_prefix('>') {
            assign_redirect(&mut command.redirects.truncate, path, token);
        } else if let Some(path) = token.strip_prefix('<') {
            assign_redirect(&mut command.redirects.input, path, token);
        } else {
            command.arguments.push(strip_quotes(token).to_owned());
        }
    }

    command
}

/// Redirect paths are the remainder of the operator's own token, verbatim.
/// An operator with nothing after it is dropped instead of read past.
fn assign_redirect(slot: &mut Option<String>, path: &str, token: &str) {
    if path.is_empty() {
        warn!("ignoring redirect with no target: {}", token);
        return;
    }
    // the last assignment to a slot wins
    *slot = Some(path.to_owned());
}

/// Strip one pair of matching wrapping quotes. Lexical only: no escapes,
/// no nesting, and nothing shorter than three characters qualifies.
fn strip_quotes(token: &str) -> &str {
    let bytes = token.as_bytes();
    if token.len() > 2 {
        let (first, last) = (bytes[0], bytes[token.len() - 1]);
        if (first == b'"' && last == b'"') || (first == b'\'' && last == b'\'') {
            return &token[1..token.len() - 1];
        }
    }
    token
}
