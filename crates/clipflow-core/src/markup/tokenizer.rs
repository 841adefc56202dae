/// Permissive HTML tokenizer.
use super::categories;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Token {
    Text(String),
    Open {
        name: String,
        attributes: Vec<(String, String)>,
        self_closing: bool,
    },
    Close(String),
}

/// Splits `source` into a flat token stream.
///
/// Tag names are lower-cased. A `<` that does not start a recognizable tag is
/// treated as literal text. Raw-text elements (script, style, title,
/// textarea) swallow everything up to their matching close tag.
pub(crate) fn tokenize(source: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut text = String::new();
    let bytes = source.as_bytes();
    let mut pos = 0;

    while pos < bytes.len() {
        if bytes[pos] != b'<' {
            // Fast-forward to the next tag candidate.
            let next = source[pos..]
                .find('<')
                .map(|i| pos + i)
                .unwrap_or(bytes.len());
            text.push_str(&source[pos..next]);
            pos = next;
            continue;
        }

        match read_markup(source, pos) {
            Some((Markup::Comment, next)) | Some((Markup::Declaration, next)) => {
                flush(&mut text, &mut tokens);
                pos = next;
            }
            Some((Markup::Close(name), next)) => {
                flush(&mut text, &mut tokens);
                tokens.push(Token::Close(name));
                pos = next;
            }
            Some((Markup::Open(name, attributes, self_closing), next)) => {
                flush(&mut text, &mut tokens);
                pos = next;
                if !self_closing && categories::is_raw_text(&name) {
                    let (content, after) = read_raw_text(source, pos, &name);
                    tokens.push(Token::Open {
                        name: name.clone(),
                        attributes,
                        self_closing: false,
                    });
                    if !content.is_empty() {
                        tokens.push(Token::Text(content));
                    }
                    tokens.push(Token::Close(name));
                    pos = after;
                } else {
                    tokens.push(Token::Open {
                        name,
                        attributes,
                        self_closing,
                    });
                }
            }
            None => {
                // Literal '<'.
                text.push('<');
                pos += 1;
            }
        }
    }

    flush(&mut text, &mut tokens);
    tokens
}

enum Markup {
    Open(String, Vec<(String, String)>, bool),
    Close(String),
    Comment,
    Declaration,
}

fn flush(text: &mut String, tokens: &mut Vec<Token>) {
    if !text.is_empty() {
        tokens.push(Token::Text(std::mem::take(text)));
    }
}

/// Reads one markup construct starting at the `<` at `start`.
/// Returns the construct and the position just past it, or None when the
/// bytes do not form a tag.
fn read_markup(source: &str, start: usize) -> Option<(Markup, usize)> {
    let rest = &source[start..];

    if let Some(after) = rest.strip_prefix("<!--") {
        let end = after.find("-->").map(|i| start + 4 + i + 3).unwrap_or(source.len());
        return Some((Markup::Comment, end));
    }
    if rest.starts_with("<!") || rest.starts_with("<?") {
        let end = rest.find('>').map(|i| start + i + 1).unwrap_or(source.len());
        return Some((Markup::Declaration, end));
    }

    let bytes = source.as_bytes();
    let mut pos = start + 1;
    let closing = bytes.get(pos) == Some(&b'/');
    if closing {
        pos += 1;
    }

    let name_start = pos;
    while pos < bytes.len() && is_name_byte(bytes[pos]) {
        pos += 1;
    }
    if pos == name_start {
        return None;
    }
    let name = source[name_start..pos].to_ascii_lowercase();

    if closing {
        // Skip anything up to '>' (attributes on close tags are invalid
        // anyway).
        let end = source[pos..].find('>').map(|i| pos + i + 1)?;
        return Some((Markup::Close(name), end));
    }

    let mut attributes = Vec::new();
    loop {
        while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        match bytes.get(pos) {
            None => return None,
            Some(b'>') => return Some((Markup::Open(name, attributes, false), pos + 1)),
            Some(b'/') if bytes.get(pos + 1) == Some(&b'>') => {
                return Some((Markup::Open(name, attributes, true), pos + 2));
            }
            _ => {
                let (attr, next) = read_attribute(source, pos)?;
                attributes.push(attr);
                pos = next;
            }
        }
    }
}

fn read_attribute(source: &str, start: usize) -> Option<((String, String), usize)> {
    let bytes = source.as_bytes();
    let mut pos = start;

    let name_start = pos;
    while pos < bytes.len() && !matches!(bytes[pos], b'=' | b'>' | b'/') && !bytes[pos].is_ascii_whitespace() {
        pos += 1;
    }
    if pos == name_start {
        return None;
    }
    let name = source[name_start..pos].to_ascii_lowercase();

    while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
        pos += 1;
    }
    if bytes.get(pos) != Some(&b'=') {
        return Some(((name, String::new()), pos));
    }
    pos += 1;
    while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
        pos += 1;
    }

    match bytes.get(pos) {
        Some(&quote @ (b'"' | b'\'')) => {
            pos += 1;
            let value_start = pos;
            while pos < bytes.len() && bytes[pos] != quote {
                pos += 1;
            }
            let value = source[value_start..pos].to_string();
            if pos < bytes.len() {
                pos += 1; // closing quote
            }
            Some(((name, value), pos))
        }
        _ => {
            let value_start = pos;
            while pos < bytes.len() && bytes[pos] != b'>' && !bytes[pos].is_ascii_whitespace() {
                pos += 1;
            }
            Some(((name, source[value_start..pos].to_string()), pos))
        }
    }
}

/// Captures the body of a raw-text element up to its close tag.
fn read_raw_text(source: &str, start: usize, name: &str) -> (String, usize) {
    let lower = source[start..].to_ascii_lowercase();
    let close = format!("</{name}");
    match lower.find(&close) {
        Some(i) => {
            let content = source[start..start + i].to_string();
            let after_name = start + i + close.len();
            let end = source[after_name..]
                .find('>')
                .map(|j| after_name + j + 1)
                .unwrap_or(source.len());
            (content, end)
        }
        None => (source[start..].to_string(), source.len()),
    }
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b':' || b == b'-'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_mixed() {
        let tokens = tokenize("a<B >b</b>");
        assert_eq!(
            tokens,
            vec![
                Token::Text("a".into()),
                Token::Open {
                    name: "b".into(),
                    attributes: vec![],
                    self_closing: false
                },
                Token::Text("b".into()),
                Token::Close("b".into()),
            ]
        );
    }

    #[test]
    fn test_tokenize_self_closing() {
        let tokens = tokenize("<br/>");
        assert_eq!(
            tokens,
            vec![Token::Open {
                name: "br".into(),
                attributes: vec![],
                self_closing: true
            }]
        );
    }

    #[test]
    fn test_tokenize_unquoted_attribute() {
        let tokens = tokenize("<div id=main>");
        assert_eq!(
            tokens,
            vec![Token::Open {
                name: "div".into(),
                attributes: vec![("id".into(), "main".into())],
                self_closing: false
            }]
        );
    }

    #[test]
    fn test_tokenize_bare_attribute() {
        let tokens = tokenize("<div data-surface>");
        assert_eq!(
            tokens,
            vec![Token::Open {
                name: "div".into(),
                attributes: vec![("data-surface".into(), String::new())],
                self_closing: false
            }]
        );
    }

    #[test]
    fn test_tokenize_unterminated_tag_is_text() {
        assert_eq!(tokenize("<div"), vec![Token::Text("<div".into())]);
    }

    #[test]
    fn test_tokenize_raw_text_ignores_lookalike_tags() {
        let tokens = tokenize("<script>if (a<b) { run() }</script>");
        assert_eq!(
            tokens,
            vec![
                Token::Open {
                    name: "script".into(),
                    attributes: vec![],
                    self_closing: false
                },
                Token::Text("if (a<b) { run() }".into()),
                Token::Close("script".into()),
            ]
        );
    }
}
