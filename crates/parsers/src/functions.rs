//! Parsers for function-call style replies.

use chainkit_core::error::ParseError;
use chainkit_core::message::Generation;
use serde_json::Value;
use tracing::debug;

use crate::{OutputParser, payload};

/// Extracts the function call from the first generation.
///
/// With `args_only` (the default) the arguments string is returned as-is;
/// otherwise the whole call is returned as a JSON string.
#[derive(Debug, Clone)]
pub struct OutputFunctionsParser {
    pub args_only: bool,
}

impl Default for OutputFunctionsParser {
    fn default() -> Self {
        Self { args_only: true }
    }
}

impl OutputFunctionsParser {
    pub fn new(args_only: bool) -> Self {
        Self { args_only }
    }
}

impl OutputParser for OutputFunctionsParser {
    type Output = String;

    fn parse_result(&self, generations: &[Generation]) -> Result<String, ParseError> {
        let first = generations.first().ok_or(ParseError::Empty)?;
        let message = first.message().ok_or_else(|| ParseError::NoMessage {
            payload: payload(generations),
        })?;
        let call = message
            .function_call
            .as_ref()
            .ok_or_else(|| ParseError::NoFunctionCall {
                payload: payload(generations),
            })?;

        let arguments = match call.arguments.as_deref() {
            Some(args) if !args.is_empty() => args,
            _ => {
                return Err(ParseError::NoArguments {
                    payload: payload(generations),
                });
            }
        };

        if self.args_only {
            return Ok(arguments.to_string());
        }
        serde_json::to_string(call).map_err(|e| ParseError::InvalidJson {
            reason: e.to_string(),
        })
    }
}

fn parse_json(text: &str) -> Result<Value, ParseError> {
    serde_json::from_str(text).map_err(|e| ParseError::InvalidJson {
        reason: e.to_string(),
    })
}

/// [`OutputFunctionsParser`] followed by JSON parsing.
///
/// Without `args_only`, the nested `arguments` string is parsed as well.
#[derive(Debug, Clone, Default)]
pub struct JsonOutputFunctionsParser {
    inner: OutputFunctionsParser,
}

impl JsonOutputFunctionsParser {
    pub fn new(args_only: bool) -> Self {
        Self {
            inner: OutputFunctionsParser::new(args_only),
        }
    }
}

impl OutputParser for JsonOutputFunctionsParser {
    type Output = Value;

    fn parse_result(&self, generations: &[Generation]) -> Result<Value, ParseError> {
        let result = self.inner.parse_result(generations)?;
        if result.is_empty() {
            return Err(ParseError::NoResult {
                payload: payload(generations),
            });
        }

        let mut parsed = parse_json(&result)?;
        if self.inner.args_only {
            return Ok(parsed);
        }

        if let Some(Value::String(arguments)) = parsed.get("arguments") {
            let nested = parse_json(arguments)?;
            parsed["arguments"] = nested;
        }
        Ok(parsed)
    }
}

/// Returns one field of the parsed function arguments.
///
/// An absent field (or non-object arguments) yields `None` rather than an error.
#[derive(Debug, Clone)]
pub struct JsonKeyOutputFunctionsParser {
    inner: JsonOutputFunctionsParser,
    attr_name: String,
}

impl JsonKeyOutputFunctionsParser {
    pub fn new(attr_name: impl Into<String>) -> Self {
        Self {
            inner: JsonOutputFunctionsParser::default(),
            attr_name: attr_name.into(),
        }
    }

    pub fn attr_name(&self) -> &str {
        &self.attr_name
    }
}

impl OutputParser for JsonKeyOutputFunctionsParser {
    type Output = Option<Value>;

    fn parse_result(&self, generations: &[Generation]) -> Result<Option<Value>, ParseError> {
        let parsed = self.inner.parse_result(generations)?;
        let value = parsed.get(&self.attr_name).cloned();
        if value.is_none() {
            debug!(key = %self.attr_name, "Function arguments have no such key");
        }
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainkit_core::message::{FunctionCall, Message};
    use serde_json::json;

    fn call_generation(arguments: Option<&str>) -> Vec<Generation> {
        let call = FunctionCall {
            name: Some("extract".into()),
            arguments: arguments.map(str::to_string),
        };
        vec![Generation::from(Message::assistant("").with_function_call(call))]
    }

    #[test]
    fn returns_raw_arguments_by_default() {
        let parser = OutputFunctionsParser::default();
        let out = parser.parse_result(&call_generation(Some(r#"{"a":1}"#))).unwrap();
        assert_eq!(out, r#"{"a":1}"#);
    }

    #[test]
    fn whole_call_when_not_args_only() {
        let parser = OutputFunctionsParser::new(false);
        let out = parser.parse_result(&call_generation(Some("{}"))).unwrap();
        assert_eq!(out, r#"{"name":"extract","arguments":"{}"}"#);
    }

    #[test]
    fn text_generation_has_no_message() {
        let generations = vec![Generation::Text { text: "plain".into() }];
        let err = OutputFunctionsParser::default().parse_result(&generations).unwrap_err();
        assert!(matches!(err, ParseError::NoMessage { ref payload } if payload.contains("plain")));
    }

    #[test]
    fn message_without_function_call() {
        let generations = vec![Generation::from(Message::assistant("just text"))];
        let err = OutputFunctionsParser::default().parse_result(&generations).unwrap_err();
        assert!(err.to_string().starts_with("No function_call in message ["));
        assert!(err.to_string().contains("just text"));
    }

    #[test]
    fn function_call_without_arguments() {
        for args in [None, Some("")] {
            let err = OutputFunctionsParser::default()
                .parse_result(&call_generation(args))
                .unwrap_err();
            assert!(matches!(err, ParseError::NoArguments { .. }));
        }
    }

    #[test]
    fn empty_generations() {
        let err = OutputFunctionsParser::default().parse_result(&[]).unwrap_err();
        assert!(matches!(err, ParseError::Empty));
    }

    #[test]
    fn json_parser_parses_arguments() {
        let out = JsonOutputFunctionsParser::default()
            .parse_result(&call_generation(Some(r#"{"a":1,"b":[true]}"#)))
            .unwrap();
        assert_eq!(out, json!({"a": 1, "b": [true]}));
    }

    #[test]
    fn json_parser_reparses_nested_arguments() {
        let out = JsonOutputFunctionsParser::new(false)
            .parse_result(&call_generation(Some(r#"{"a":1}"#)))
            .unwrap();
        assert_eq!(out, json!({"name": "extract", "arguments": {"a": 1}}));
    }

    #[test]
    fn json_parser_rejects_invalid_json() {
        let err = JsonOutputFunctionsParser::default()
            .parse_result(&call_generation(Some("{not json")))
            .unwrap_err();
        assert!(matches!(err, ParseError::InvalidJson { .. }));
    }

    #[test]
    fn keyed_parser_present_and_absent() {
        let generations = call_generation(Some(r#"{"a":1,"b":2}"#));
        assert_eq!(
            JsonKeyOutputFunctionsParser::new("b").parse_result(&generations).unwrap(),
            Some(json!(2))
        );
        assert_eq!(
            JsonKeyOutputFunctionsParser::new("c").parse_result(&generations).unwrap(),
            None
        );
    }

    #[test]
    fn keyed_parser_on_non_object_is_none() {
        let generations = call_generation(Some("[1,2,3]"));
        assert_eq!(
            JsonKeyOutputFunctionsParser::new("a").parse_result(&generations).unwrap(),
            None
        );
    }

    #[test]
    fn keyed_parser_propagates_shape_errors() {
        let generations = vec![Generation::from(Message::assistant("no call"))];
        assert!(JsonKeyOutputFunctionsParser::new("a").parse_result(&generations).is_err());
    }
}
