//! Regex output parser.

use std::collections::BTreeMap;

use chainkit_core::error::ParseError;
use chainkit_core::message::Generation;
use regex_lite::Regex;

use crate::OutputParser;

/// Maps capture groups of a plain text reply onto output keys.
///
/// Group `i + 1` fills `output_keys[i]`. When the pattern does not match and
/// a default key is set, that key receives the whole text and the rest are
/// empty.
#[derive(Debug, Clone)]
pub struct RegexParser {
    regex: Regex,
    output_keys: Vec<String>,
    default_output_key: Option<String>,
}

impl RegexParser {
    pub fn new(pattern: &str, output_keys: Vec<String>) -> Result<Self, ParseError> {
        let regex = Regex::new(pattern).map_err(|e| ParseError::InvalidPattern(e.to_string()))?;
        Ok(Self {
            regex,
            output_keys,
            default_output_key: None,
        })
    }

    pub fn with_default_output_key(mut self, key: impl Into<String>) -> Self {
        self.default_output_key = Some(key.into());
        self
    }

    pub fn output_keys(&self) -> &[String] {
        &self.output_keys
    }

    pub fn parse(&self, text: &str) -> Result<BTreeMap<String, String>, ParseError> {
        if let Some(caps) = self.regex.captures(text) {
            return Ok(self
                .output_keys
                .iter()
                .enumerate()
                .map(|(i, key)| {
                    let value = caps.get(i + 1).map(|m| m.as_str()).unwrap_or_default();
                    (key.clone(), value.to_string())
                })
                .collect());
        }

        let Some(default_key) = &self.default_output_key else {
            return Err(ParseError::NoMatch { text: text.to_string() });
        };
        Ok(self
            .output_keys
            .iter()
            .map(|key| {
                let value = if key == default_key { text } else { "" };
                (key.clone(), value.to_string())
            })
            .collect())
    }

    pub fn format_instructions(&self) -> String {
        format!(
            "Your response should match the following regex: {}",
            self.regex.as_str()
        )
    }
}

impl OutputParser for RegexParser {
    type Output = BTreeMap<String, String>;

    fn parse_result(&self, generations: &[Generation]) -> Result<Self::Output, ParseError> {
        let first = generations.first().ok_or(ParseError::Empty)?;
        self.parse(first.text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn captures_map_to_keys() {
        let parser = RegexParser::new(r"Score: (\d+)\s+Reason: (.*)", keys(&["score", "reason"])).unwrap();
        let out = parser.parse("Score: 7\nReason: mostly right").unwrap();
        assert_eq!(out["score"], "7");
        assert_eq!(out["reason"], "mostly right");
    }

    #[test]
    fn unmatched_optional_group_is_empty() {
        let parser = RegexParser::new(r"a(b)?(c)", keys(&["b", "c"])).unwrap();
        let out = parser.parse("ac").unwrap();
        assert_eq!(out["b"], "");
        assert_eq!(out["c"], "c");
    }

    #[test]
    fn no_match_without_default_fails() {
        let parser = RegexParser::new(r"Answer: (.*)", keys(&["answer"])).unwrap();
        let err = parser.parse("no idea").unwrap_err();
        assert_eq!(err.to_string(), "Could not parse output: no idea");
    }

    #[test]
    fn no_match_uses_default_key() {
        let parser = RegexParser::new(r"Answer: (.*)", keys(&["answer", "source"]))
            .unwrap()
            .with_default_output_key("answer");
        let out = parser.parse("no idea").unwrap();
        assert_eq!(out["answer"], "no idea");
        assert_eq!(out["source"], "");
    }

    #[test]
    fn invalid_pattern_is_rejected() {
        let err = RegexParser::new("(unclosed", keys(&["a"])).unwrap_err();
        assert!(matches!(err, ParseError::InvalidPattern(_)));
    }

    #[test]
    fn instructions_quote_the_pattern() {
        let parser = RegexParser::new(r"(\w+)", keys(&["word"])).unwrap();
        assert_eq!(
            parser.format_instructions(),
            r"Your response should match the following regex: (\w+)"
        );
    }

    #[test]
    fn parses_first_generation() {
        let parser = RegexParser::new(r"(\w+)", keys(&["word"])).unwrap();
        let generations = vec![Generation::Text { text: "hello world".into() }];
        assert_eq!(parser.parse_result(&generations).unwrap()["word"], "hello");
    }
}
