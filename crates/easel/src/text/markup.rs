//! Text markup parser.
//!
//! # Syntax
//! Style directives begin with `@`, take optional braced arguments, and
//! apply to a braced body. Directives nest arbitrarily:
//!
//! `@bold{Bold text} non bold text`
//!
//! `@italic{Italicized @bold{and bolded}} plain`
//!
//! `@size{10}{10 px text}@size{50}{Very big text}`
//!
//! `@font{Times New Roman}{Times New Roman text}`
//!
//! `@color{rgba(180, 20, 20, 255)}{red text}`
//!
//! Icons are embedded by sprite name: `Icon: @icon{smiley_face}`
//!
//! To avoid injection attacks, user-provided strings should be applied
//! using variables: `%city_name` is replaced with the string the
//! resolver returns for `"city_name"`. Substituted values are treated
//! as literal text and never re-lexed.

use std::str::FromStr;

use logos::Logos;

use crate::{
    font::{Style, Weight},
    text::{Text, TextSection, TextStyle},
};

mod color;

pub use color::ColorParseError;

/// A markup parse failure, pointing at the offending byte of the input.
#[derive(Debug, thiserror::Error)]
#[error("{kind} at byte offset {offset}")]
pub struct MarkupError {
    pub offset: usize,
    pub kind: MarkupErrorKind,
}

#[derive(Debug, thiserror::Error)]
pub enum MarkupErrorKind {
    #[error("unterminated directive body")]
    UnterminatedDirective,
    #[error("'{0}' is not a recognized directive")]
    UnknownDirective(String),
    #[error("expected a directive name after '@'")]
    MissingDirectiveName,
    #[error("expected a braced argument")]
    MissingArgument,
    #[error("expected a braced body")]
    MissingBody,
    #[error("'}}' does not close any directive")]
    UnbalancedBrace,
    #[error("expected text or '@', found '{{'")]
    UnexpectedBrace,
    #[error("'{0}' is not a valid size")]
    BadSize(String),
    #[error(transparent)]
    BadColor(ColorParseError),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Logos)]
enum Token {
    #[token("@")]
    At,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,

    #[regex("[^@{}]+")]
    Text,

    #[error]
    Error,
}

/// Parses a markup string into [`Text`], starting from `default_style`.
///
/// `resolve_variable` is called synchronously, once per `%variable`
/// reference and never for static text; returning `None` substitutes
/// the empty string. Parsing touches no engine state.
pub fn parse(
    markup: &str,
    default_style: TextStyle,
    mut resolve_variable: impl FnMut(&str) -> Option<String>,
) -> Result<Text, MarkupError> {
    let mut parser = Parser::new(markup, &mut resolve_variable);
    parser.parse_sections(&default_style, None)?;
    Ok(Text::from_sections(parser.sections))
}

#[derive(Debug, Clone)]
struct Tok {
    token: Token,
    /// Token text, after variable substitution for `Token::Text`.
    text: String,
    /// Byte offset of the token in the original input.
    start: usize,
}

struct Parser {
    tokens: Vec<Tok>,
    cursor: usize,
    source_len: usize,
    sections: Vec<TextSection>,
}

impl Parser {
    fn new(markup: &str, resolve_variable: &mut dyn FnMut(&str) -> Option<String>) -> Self {
        let mut tokens = Vec::new();
        for (token, span) in Token::lexer(markup).spanned() {
            let start = span.start;
            let mut text = markup[span].to_owned();
            if token == Token::Text {
                substitute_variables(&mut text, resolve_variable);
            }
            tokens.push(Tok { token, text, start });
        }

        Self {
            tokens,
            cursor: 0,
            source_len: markup.len(),
            sections: Vec::new(),
        }
    }

    fn bump(&mut self) -> Option<Tok> {
        let tok = self.tokens.get(self.cursor).cloned();
        if tok.is_some() {
            self.cursor += 1;
        }
        tok
    }

    /// Parses sections until the end of input, or until the `}` closing
    /// the body opened at `opened_at`.
    fn parse_sections(
        &mut self,
        style: &TextStyle,
        opened_at: Option<usize>,
    ) -> Result<(), MarkupError> {
        loop {
            let tok = match self.bump() {
                Some(tok) => tok,
                None => {
                    return match opened_at {
                        Some(offset) => Err(MarkupError {
                            offset,
                            kind: MarkupErrorKind::UnterminatedDirective,
                        }),
                        None => Ok(()),
                    }
                }
            };

            match tok.token {
                Token::Text => {
                    if !tok.text.is_empty() {
                        self.sections.push(TextSection::Text {
                            text: tok.text,
                            style: style.clone(),
                        });
                    }
                }
                Token::At => self.parse_directive(tok.start, style)?,
                Token::RBrace => {
                    return match opened_at {
                        Some(_) => Ok(()),
                        None => Err(MarkupError {
                            offset: tok.start,
                            kind: MarkupErrorKind::UnbalancedBrace,
                        }),
                    }
                }
                Token::LBrace => {
                    return Err(MarkupError {
                        offset: tok.start,
                        kind: MarkupErrorKind::UnexpectedBrace,
                    })
                }
                Token::Error => {
                    return Err(MarkupError {
                        offset: tok.start,
                        kind: MarkupErrorKind::UnexpectedBrace,
                    })
                }
            }
        }
    }

    fn parse_directive(&mut self, at: usize, style: &TextStyle) -> Result<(), MarkupError> {
        let (name, name_start) = match self.bump() {
            Some(Tok {
                token: Token::Text,
                text,
                start,
            }) => (text.trim().to_owned(), start),
            _ => {
                return Err(MarkupError {
                    offset: at,
                    kind: MarkupErrorKind::MissingDirectiveName,
                })
            }
        };

        let mut nested = style.clone();
        match name.as_str() {
            "bold" => nested.font.weight = Weight::Bold,
            "italic" => nested.font.style = Style::Italic,
            "size" => {
                let (arg, arg_start) = self.argument()?;
                let arg = arg.trim();
                nested.size = f32::from_str(arg).map_err(|_| MarkupError {
                    offset: arg_start,
                    kind: MarkupErrorKind::BadSize(arg.to_owned()),
                })?;
            }
            "font" => {
                let (arg, _) = self.argument()?;
                nested.font.family = arg.trim().to_owned();
            }
            "color" => {
                let (arg, arg_start) = self.argument()?;
                nested.color = color::parse_color(arg.trim()).map_err(|source| MarkupError {
                    offset: arg_start,
                    kind: MarkupErrorKind::BadColor(source),
                })?;
            }
            "icon" => {
                // The braced argument is the sprite name; icons have no body.
                let (arg, _) = self.argument()?;
                self.sections.push(TextSection::Icon {
                    name: arg.trim().to_owned(),
                    size: style.size,
                });
                return Ok(());
            }
            _ => {
                return Err(MarkupError {
                    offset: name_start,
                    kind: MarkupErrorKind::UnknownDirective(name),
                })
            }
        }

        let body_open = match self.bump() {
            Some(Tok {
                token: Token::LBrace,
                start,
                ..
            }) => start,
            Some(tok) => {
                return Err(MarkupError {
                    offset: tok.start,
                    kind: MarkupErrorKind::MissingBody,
                })
            }
            None => {
                return Err(MarkupError {
                    offset: self.source_len,
                    kind: MarkupErrorKind::MissingBody,
                })
            }
        };

        self.parse_sections(&nested, Some(body_open))
    }

    /// Consumes a `{text}` argument, returning the text and its offset.
    fn argument(&mut self) -> Result<(String, usize), MarkupError> {
        let open = match self.bump() {
            Some(Tok {
                token: Token::LBrace,
                start,
                ..
            }) => start,
            Some(tok) => {
                return Err(MarkupError {
                    offset: tok.start,
                    kind: MarkupErrorKind::MissingArgument,
                })
            }
            None => {
                return Err(MarkupError {
                    offset: self.source_len,
                    kind: MarkupErrorKind::MissingArgument,
                })
            }
        };

        match self.bump() {
            Some(Tok {
                token: Token::RBrace,
                start,
                ..
            }) => Ok((String::new(), start)),
            Some(Tok {
                token: Token::Text,
                text,
                start,
            }) => match self.bump() {
                Some(Tok {
                    token: Token::RBrace,
                    ..
                }) => Ok((text, start)),
                _ => Err(MarkupError {
                    offset: open,
                    kind: MarkupErrorKind::UnterminatedDirective,
                }),
            },
            _ => Err(MarkupError {
                offset: open,
                kind: MarkupErrorKind::UnterminatedDirective,
            }),
        }
    }
}

/// Replaces every `%name` reference in `text` with the resolver's value.
///
/// Substituted values are skipped over, not rescanned, so a value
/// containing `%` or markup characters stays literal.
fn substitute_variables(text: &mut String, resolve_variable: &mut dyn FnMut(&str) -> Option<String>) {
    let mut cursor = 0;
    while let Some(found) = text[cursor..].find('%') {
        let var_start = cursor + found;
        let name_start = var_start + 1;
        let name_end = text[name_start..]
            .char_indices()
            .find(|(_, c)| !c.is_alphanumeric() && *c != '_')
            .map(|(i, _)| name_start + i)
            .unwrap_or(text.len());

        if name_end == name_start {
            // A bare '%' is literal text.
            cursor = name_start;
            continue;
        }

        let value = resolve_variable(&text[name_start..name_end]).unwrap_or_default();
        text.replace_range(var_start..name_end, &value);
        cursor = var_start + value.len();
    }
}
