//! `{variable}` template engine.
//!
//! # Syntax
//!
//! - `{name}` substitutes the value of `name` (surrounding whitespace inside
//!   the braces is ignored)
//! - `{{` renders a literal `{`
//! - `}}` renders a literal `}`; a lone `}` is kept as-is
//!
//! Undefined variables are an error rather than an empty substitution, so a
//! typo in a custom template is caught when the config is loaded.

use std::collections::HashMap;
use std::fmt;

/// Error type for template parsing and rendering failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    UndefinedVariable { name: String, position: usize },
    UnmatchedBrace { position: usize },
    EmptyVariableName { position: usize },
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateError::UndefinedVariable { name, position } => write!(
                f,
                "undefined variable '{}' at position {} in template",
                name, position
            ),
            TemplateError::UnmatchedBrace { position } => {
                write!(f, "unmatched '{{' at position {} in template", position)
            }
            TemplateError::EmptyVariableName { position } => write!(
                f,
                "empty variable name '{{}}' at position {} in template",
                position
            ),
        }
    }
}

impl std::error::Error for TemplateError {}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment<'a> {
    Text(String),
    Var { name: &'a str, position: usize },
}

fn parse(template: &str) -> Result<Vec<Segment<'_>>, TemplateError> {
    let mut segments = Vec::new();
    let mut text = String::new();
    let mut chars = template.char_indices().peekable();

    while let Some((pos, ch)) = chars.next() {
        match ch {
            '{' if matches!(chars.peek(), Some((_, '{'))) => {
                chars.next();
                text.push('{');
            }
            '}' if matches!(chars.peek(), Some((_, '}'))) => {
                chars.next();
                text.push('}');
            }
            '{' => {
                let close = template[pos + 1..]
                    .find('}')
                    .map(|offset| pos + 1 + offset)
                    .ok_or(TemplateError::UnmatchedBrace { position: pos })?;

                let raw = &template[pos + 1..close];
                if raw.is_empty() {
                    return Err(TemplateError::EmptyVariableName { position: pos });
                }

                // Skip past the closing brace.
                while chars.next_if(|(i, _)| *i <= close).is_some() {}

                if !text.is_empty() {
                    segments.push(Segment::Text(std::mem::take(&mut text)));
                }
                segments.push(Segment::Var {
                    name: raw.trim(),
                    position: pos,
                });
            }
            c => text.push(c),
        }
    }

    if !text.is_empty() {
        segments.push(Segment::Text(text));
    }
    Ok(segments)
}

/// Render `template`, substituting every `{name}` from `variables`.
pub fn render_template(
    template: &str,
    variables: &HashMap<String, String>,
) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(template.len());

    for segment in parse(template)? {
        match segment {
            Segment::Text(text) => out.push_str(&text),
            Segment::Var { name, position } => match variables.get(name) {
                Some(value) => out.push_str(value),
                None => {
                    return Err(TemplateError::UndefinedVariable {
                        name: name.to_string(),
                        position,
                    });
                }
            },
        }
    }

    Ok(out)
}

/// Check that `template` parses and references only `known` variables.
pub fn check_template(template: &str, known: &[&str]) -> Result<(), TemplateError> {
    for segment in parse(template)? {
        match segment {
            Segment::Var { name, position } if !known.contains(&name) => {
                return Err(TemplateError::UndefinedVariable {
                    name: name.to_string(),
                    position,
                });
            }
            _ => {}
        }
    }
    Ok(())
}

#[cfg(test)]
pub fn vars<I, K, V>(pairs: I) -> HashMap<String, String>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}
