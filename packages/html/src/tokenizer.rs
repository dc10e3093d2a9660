//! HTML tokenizer.
//!
//! Two logos lexers morph into each other: [`ContentToken`] runs between
//! tags, [`TagToken`] runs inside a start tag until its closing `>`.

use logos::{Lexer, Logos};
use std::fmt;
use std::ops::Range;

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"<![dD][oO][cC][tT][yY][pP][eE][^>]*>")]
#[logos(skip r"<\?[^>]*>")]
enum ContentToken<'src> {
    #[token("<!--", comment)]
    Comment(&'src str),

    #[regex(r"<[a-zA-Z][a-zA-Z0-9-]*", |lex| &lex.slice()[1..])]
    TagOpen(&'src str),

    #[regex(r"</[a-zA-Z][a-zA-Z0-9-]*[ \t\r\n]*>", close_name)]
    TagClose(&'src str),

    #[regex(r"[^<]+", |lex| lex.slice())]
    Text(&'src str),

    // `<` that does not open a tag is text
    #[token("<", |lex| lex.slice())]
    Lt(&'src str),
}

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\n\r\f]+")]
enum TagToken<'src> {
    #[regex(r#"[^ \t\n\r\f"'>=/][^ \t\n\r\f"'>=]*"#, |lex| lex.slice())]
    Name(&'src str),

    #[token("=")]
    Equals,

    #[regex(r#""[^"]*""#, unquote)]
    #[regex(r#"'[^']*'"#, unquote)]
    Quoted(&'src str),

    #[token(">")]
    End,

    #[token("/>")]
    SelfClose,

    #[token("/")]
    Slash,
}

fn comment<'src>(lex: &mut Lexer<'src, ContentToken<'src>>) -> &'src str {
    let rest = lex.remainder();
    let body_end = rest.find("-->").unwrap_or(rest.len());
    let consumed = (body_end + 3).min(rest.len());
    lex.bump(consumed);
    &rest[..body_end]
}

fn close_name<'src>(lex: &mut Lexer<'src, ContentToken<'src>>) -> &'src str {
    lex.slice()[2..].trim_end_matches('>').trim_end()
}

fn unquote<'src>(lex: &mut Lexer<'src, TagToken<'src>>) -> &'src str {
    let slice = lex.slice();
    &slice[1..slice.len() - 1]
}

/// Token handed to the tree builder. Tag and attribute names are lowercase;
/// text and attribute values are raw, entities not yet decoded.
#[derive(Debug, Clone, PartialEq)]
pub enum HtmlToken<'src> {
    StartTag {
        name: String,
        attributes: Vec<(String, String)>,
        self_closing: bool,
    },
    EndTag(String),
    Text(&'src str),
    Comment(&'src str),
}

impl fmt::Display for HtmlToken<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HtmlToken::StartTag { name, .. } => write!(f, "<{}>", name),
            HtmlToken::EndTag(name) => write!(f, "</{}>", name),
            HtmlToken::Text(text) => write!(f, "text {:?}", text),
            HtmlToken::Comment(_) => write!(f, "comment"),
        }
    }
}

/// Elements whose content is not markup
const RAW_TEXT: &[&str] = &["script", "style", "textarea", "title"];

pub fn tokenize(source: &str) -> Vec<(HtmlToken<'_>, Range<usize>)> {
    let mut tokens = Vec::new();
    let mut lex = ContentToken::lexer(source);

    while let Some(result) = lex.next() {
        let span = lex.span();
        match result {
            Ok(ContentToken::TagOpen(raw_name)) => {
                let name = raw_name.to_ascii_lowercase();
                let mut tag_lex = lex.morph::<TagToken>();
                let (attributes, self_closing) = read_attributes(&mut tag_lex);
                lex = tag_lex.morph::<ContentToken>();

                let end = source.len() - lex.remainder().len();
                let raw_text = !self_closing && RAW_TEXT.contains(&name.as_str());
                let close = format!("</{}", name);
                tokens.push((
                    HtmlToken::StartTag {
                        name,
                        attributes,
                        self_closing,
                    },
                    span.start..end,
                ));

                if raw_text {
                    let rest = lex.remainder();
                    let text_len = rest
                        .to_ascii_lowercase()
                        .find(&close)
                        .unwrap_or(rest.len());
                    if text_len > 0 {
                        tokens.push((HtmlToken::Text(&rest[..text_len]), end..end + text_len));
                        lex.bump(text_len);
                    }
                }
            }
            Ok(ContentToken::TagClose(name)) => {
                tokens.push((HtmlToken::EndTag(name.to_ascii_lowercase()), span));
            }
            Ok(ContentToken::Text(text)) | Ok(ContentToken::Lt(text)) => {
                tokens.push((HtmlToken::Text(text), span));
            }
            Ok(ContentToken::Comment(body)) => {
                let end = source.len() - lex.remainder().len();
                tokens.push((HtmlToken::Comment(body), span.start..end));
            }
            Err(()) => {
                tokens.push((HtmlToken::Text(&source[span.clone()]), span));
            }
        }
    }

    tokens
}

fn read_attributes<'src>(lex: &mut Lexer<'src, TagToken<'src>>) -> (Vec<(String, String)>, bool) {
    let mut attributes = Vec::new();
    let mut pending: Option<String> = None;
    let mut expect_value = false;

    while let Some(result) = lex.next() {
        match result {
            Ok(TagToken::Name(text)) | Ok(TagToken::Quoted(text)) if expect_value => {
                if let Some(name) = pending.take() {
                    attributes.push((name, text.to_string()));
                }
                expect_value = false;
            }
            Ok(TagToken::Name(name)) => {
                if let Some(previous) = pending.replace(name.to_ascii_lowercase()) {
                    attributes.push((previous, String::new()));
                }
            }
            Ok(TagToken::Equals) => expect_value = pending.is_some(),
            Ok(TagToken::End) => {
                flush(&mut attributes, pending);
                return (attributes, false);
            }
            Ok(TagToken::SelfClose) => {
                flush(&mut attributes, pending);
                return (attributes, true);
            }
            Ok(TagToken::Quoted(_)) | Ok(TagToken::Slash) | Err(()) => {}
        }
    }

    flush(&mut attributes, pending);
    (attributes, false)
}

fn flush(attributes: &mut Vec<(String, String)>, pending: Option<String>) {
    if let Some(name) = pending {
        attributes.push((name, String::new()));
    }
}
