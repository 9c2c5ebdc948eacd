//! Prompt templates with `{variable}` placeholders.
//!
//! `{{` and `}}` render as literal braces. A `{` without a closing brace
//! is kept as literal text.

use crate::chain::{ChainValues, value_to_text};
use crate::error::ChainError;

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Literal(String),
    Variable(String),
}

/// A parsed prompt template.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptTemplate {
    template: String,
    segments: Vec<Segment>,
    input_variables: Vec<String>,
}

impl PromptTemplate {
    /// Parse a template string, collecting its variables in first-seen order.
    pub fn from_template(template: impl Into<String>) -> Self {
        let template = template.into();
        let segments = parse_segments(&template);
        let mut input_variables: Vec<String> = Vec::new();
        for seg in &segments {
            if let Segment::Variable(name) = seg {
                if !input_variables.contains(name) {
                    input_variables.push(name.clone());
                }
            }
        }
        Self {
            template,
            segments,
            input_variables,
        }
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn input_variables(&self) -> &[String] {
        &self.input_variables
    }

    /// Render the template. Every variable must be present in `values`.
    pub fn format(&self, values: &ChainValues) -> Result<String, ChainError> {
        let missing: Vec<String> = self
            .input_variables
            .iter()
            .filter(|v| !values.contains_key(v))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(ChainError::MissingInputKeys {
                chain: "prompt_template".into(),
                keys: missing,
            });
        }

        let mut out = String::with_capacity(self.template.len());
        for seg in &self.segments {
            match seg {
                Segment::Literal(text) => out.push_str(text),
                Segment::Variable(name) => {
                    if let Some(value) = values.get(name) {
                        out.push_str(&value_to_text(value));
                    }
                }
            }
        }
        Ok(out)
    }
}

fn parse_segments(template: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                literal.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                literal.push('}');
            }
            '{' => {
                let mut name = String::new();
                let mut closed = false;
                for n in chars.by_ref() {
                    if n == '}' {
                        closed = true;
                        break;
                    }
                    name.push(n);
                }
                let trimmed = name.trim();
                if closed && !trimmed.is_empty() {
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Variable(trimmed.to_string()));
                } else {
                    literal.push('{');
                    literal.push_str(&name);
                    if closed {
                        literal.push('}');
                    }
                }
            }
            other => literal.push(other),
        }
    }
    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    segments
}
