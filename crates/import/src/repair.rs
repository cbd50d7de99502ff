//! Turns OFX 1.x SGML "tag soup" into balanced markup.
//!
//! OFX 1.x leaves leaf elements unclosed (`<NAME>ACME` then the next tag). The
//! repair pass walks a flat token stream with a stack of open names and
//! closes a leaf as soon as a sibling opens after non-blank text. It assumes
//! aggregates (statements, lists) carry their own close tags; it is a bounded
//! heuristic, not an SGML parser.
//!
//! Known blind spot: an empty unclosed leaf (`<MEMO>` followed directly by the
//! next open tag) swallows its following siblings as children until an
//! enclosing aggregate closes.

use tracing::debug;

use crate::error::OfxError;
use crate::util::re;

re!(re_ofx_root, r"(?i)<OFX");
re!(re_entity, r"^&(?:amp|lt|gt|quot|apos|#[0-9]+|#[xX][0-9A-Fa-f]+);");

/// Drops everything before the first `<OFX` (including the `OFXHEADER:` block
/// and any XML prolog). A document without that marker is not OFX at all.
pub fn strip_header(text: &str) -> Result<&str, OfxError> {
    re_ofx_root()
        .find(text)
        .map(|m| &text[m.start()..])
        .ok_or(OfxError::MissingOfxRoot)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'a> {
    /// `<NAME attrs>`; `attrs` is everything after the name, verbatim.
    Open {
        name: String,
        attrs: &'a str,
        self_closing: bool,
    },
    Close {
        name: String,
    },
    Text(&'a str),
}

/// Splits markup into open tags, close tags and text runs. Tag names are
/// uppercased; comments, declarations and processing instructions are skipped.
pub struct Tokens<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Tokens<'a> {
    pub fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn skip_past(&mut self, terminator: &str) {
        let rest = &self.src[self.pos..];
        self.pos += rest
            .find(terminator)
            .map_or(rest.len(), |i| i + terminator.len());
    }
}

impl<'a> Iterator for Tokens<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        let src = self.src;
        loop {
            let rest = &src[self.pos..];
            if rest.is_empty() {
                return None;
            }

            if !rest.starts_with('<') {
                let end = rest.find('<').unwrap_or(rest.len());
                self.pos += end;
                return Some(Token::Text(&rest[..end]));
            }

            if rest.starts_with("<!--") {
                self.skip_past("-->");
                continue;
            }
            if let Some(cdata) = rest.strip_prefix("<![CDATA[") {
                let end = cdata.find("]]>").unwrap_or(cdata.len());
                self.skip_past("]]>");
                return Some(Token::Text(&cdata[..end]));
            }
            if rest.starts_with("<!") || rest.starts_with("<?") {
                self.skip_past(">");
                continue;
            }

            let inner = match rest.find('>') {
                Some(close) if !rest[1..close].contains('<') => &rest[1..close],
                _ => {
                    // A lone '<' that never becomes a tag is just text.
                    self.pos += 1;
                    return Some(Token::Text(&rest[..1]));
                }
            };

            let (is_close, body) = match inner.strip_prefix('/') {
                Some(body) => (true, body),
                None => (false, inner),
            };
            let name_len = body
                .find(|c: char| c.is_whitespace() || c == '/')
                .unwrap_or(body.len());
            let name = &body[..name_len];
            if !is_tag_name(name) {
                self.pos += 1;
                return Some(Token::Text(&rest[..1]));
            }

            self.pos += inner.len() + 2;
            let name = name.to_ascii_uppercase();
            return Some(if is_close {
                Token::Close { name }
            } else {
                let attrs = &body[name_len..];
                Token::Open {
                    name,
                    attrs,
                    self_closing: attrs.trim_end().ends_with('/'),
                }
            });
        }
    }
}

fn is_tag_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == ':' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_' | ':'))
}

/// Rebuilds `body` as balanced markup. Never fails.
pub fn repair(body: &str) -> String {
    let mut out = String::with_capacity(body.len() + body.len() / 4);
    let mut stack: Vec<String> = Vec::new();
    // Set once a leaf has received non-blank text: the next open ends it.
    let mut after_text = false;
    let mut synthesized = 0usize;
    let mut dropped = 0usize;

    for token in Tokens::new(body) {
        match token {
            Token::Open {
                name,
                attrs,
                self_closing,
            } => {
                if after_text {
                    if let Some(top) = stack.pop() {
                        push_close(&mut out, &top);
                        synthesized += 1;
                    }
                }
                out.push('<');
                out.push_str(&name);
                out.push_str(attrs);
                out.push('>');
                if !self_closing {
                    stack.push(name);
                }
                after_text = false;
            }
            Token::Close { name } => {
                match stack.iter().rposition(|open| *open == name) {
                    Some(idx) => {
                        synthesized += stack.len() - idx - 1;
                        while stack.len() > idx {
                            if let Some(top) = stack.pop() {
                                push_close(&mut out, &top);
                            }
                        }
                    }
                    None => dropped += 1,
                }
                after_text = false;
            }
            Token::Text(text) => {
                if !stack.is_empty() {
                    push_escaped(&mut out, text);
                    if !text.trim().is_empty() {
                        after_text = true;
                    }
                }
            }
        }
    }

    // Whatever is still open (the pending leaf first) closes innermost first.
    synthesized += stack.len();
    while let Some(top) = stack.pop() {
        push_close(&mut out, &top);
    }

    debug!(synthesized, dropped, bytes = out.len(), "repaired OFX markup");
    out
}

fn push_close(out: &mut String, name: &str) {
    out.push_str("</");
    out.push_str(name);
    out.push('>');
}

/// Escapes `<` and bare `&`. Predefined XML entities and character references
/// pass through untouched; any other `&name;` is escaped to its literal text.
fn push_escaped(out: &mut String, text: &str) {
    for (i, c) in text.char_indices() {
        match c {
            '<' => out.push_str("&lt;"),
            '&' if !re_entity().is_match(&text[i..]) => out.push_str("&amp;"),
            _ => out.push(c),
        }
    }
}
