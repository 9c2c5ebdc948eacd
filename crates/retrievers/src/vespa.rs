//! Vespa search adapter.
//!
//! The request body is the configured query body with `query` set to the
//! user's text. Each hit in `root.children` becomes one document whose
//! content is taken from the configured field and whose `metadata.id` is the
//! hit's Vespa id.

use chainkit_config::RetrieverConfig;
use chainkit_core::document::Document;
use chainkit_core::error::RetrieverError;
use serde_json::{Map, Value};

use crate::remote::{RemoteRetriever, RemoteRetrieverClient};

#[derive(Debug, Clone)]
pub struct VespaRetriever {
    url: String,
    query_body: Map<String, Value>,
    content_field: String,
}

impl VespaRetriever {
    pub fn new(
        url: impl AsRef<str>,
        query_body: Map<String, Value>,
        content_field: impl Into<String>,
    ) -> Self {
        Self {
            url: format!("{}/search/?", url.as_ref()),
            query_body,
            content_field: content_field.into(),
        }
    }

    /// Build an HTTP-backed retriever from the `[retriever]` section.
    pub fn from_config(
        config: &RetrieverConfig,
    ) -> Result<RemoteRetrieverClient<VespaRetriever>, RetrieverError> {
        let url = config.url.as_deref().ok_or_else(|| {
            RetrieverError::Request("No retriever url configured. Set [retriever].url".into())
        })?;
        let client = RemoteRetrieverClient::new(Self::new(
            url,
            config.query_body.clone(),
            config.content_field.clone(),
        ));
        Ok(match &config.auth_token {
            Some(token) => client.with_auth_token(token.clone()),
            None => client,
        })
    }

    pub fn content_field(&self) -> &str {
        &self.content_field
    }
}

impl RemoteRetriever for VespaRetriever {
    fn url(&self) -> &str {
        &self.url
    }

    fn create_json_body(&self, query: &str) -> Value {
        let mut body = self.query_body.clone();
        body.insert("query".into(), Value::String(query.to_string()));
        Value::Object(body)
    }

    fn process_json_response(&self, json: Value) -> Result<Vec<Document>, RetrieverError> {
        let children = json
            .pointer("/root/children")
            .and_then(Value::as_array)
            .ok_or_else(|| RetrieverError::ResponseShape("missing root.children array".into()))?;

        Ok(children
            .iter()
            .map(|hit| {
                let page_content = match hit.get("fields").and_then(|f| f.get(&self.content_field)) {
                    Some(Value::String(text)) => text.clone(),
                    Some(Value::Null) | None => String::new(),
                    Some(other) => other.to_string(),
                };
                let id = hit.get("id").cloned().unwrap_or(Value::Null);
                Document::new(page_content).with_metadata("id", id)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn retriever() -> VespaRetriever {
        let mut body = Map::new();
        body.insert("yql".into(), json!("select content from paragraph where userQuery()"));
        body.insert("hits".into(), json!(5));
        VespaRetriever::new("https://doc-search.vespa.oath.cloud", body, "content")
    }

    #[test]
    fn url_gets_search_suffix() {
        assert_eq!(retriever().url(), "https://doc-search.vespa.oath.cloud/search/?");
    }

    #[test]
    fn body_merges_query() {
        let body = retriever().create_json_body("what is vespa?");
        assert_eq!(body["query"], "what is vespa?");
        assert_eq!(body["hits"], 5);
        assert_eq!(body["yql"], "select content from paragraph where userQuery()");
    }

    #[test]
    fn query_overrides_configured_query_field() {
        let mut body = Map::new();
        body.insert("query".into(), json!("stale"));
        let vespa = VespaRetriever::new("http://localhost:8080", body, "content");
        assert_eq!(vespa.create_json_body("fresh")["query"], "fresh");
    }

    #[test]
    fn children_become_documents() {
        let response = json!({
            "root": {
                "id": "toplevel",
                "children": [
                    {"id": "id:doc:1", "relevance": 0.9, "source": "docs",
                     "fields": {"content": "Vespa is a search engine", "title": "Intro"}},
                    {"id": "id:doc:2", "relevance": 0.4, "source": "docs",
                     "fields": {"title": "No content"}}
                ]
            }
        });

        let docs = retriever().process_json_response(response).unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].page_content, "Vespa is a search engine");
        assert_eq!(docs[0].metadata["id"], "id:doc:1");
        assert_eq!(docs[0].metadata.len(), 1);
        assert_eq!(docs[1].page_content, "");
        assert_eq!(docs[1].metadata["id"], "id:doc:2");
    }

    #[test]
    fn no_hits_is_empty() {
        let docs = retriever()
            .process_json_response(json!({"root": {"children": []}}))
            .unwrap();
        assert!(docs.is_empty());
    }

    #[test]
    fn missing_children_is_shape_error() {
        let err = retriever()
            .process_json_response(json!({"root": {"fields": {"totalCount": 0}}}))
            .unwrap_err();
        assert!(matches!(err, RetrieverError::ResponseShape(_)));
    }

    #[test]
    fn from_config_requires_url() {
        let config = RetrieverConfig::default();
        assert!(VespaRetriever::from_config(&config).is_err());

        let config = RetrieverConfig {
            url: Some("http://localhost:8080".into()),
            ..RetrieverConfig::default()
        };
        let client = VespaRetriever::from_config(&config).unwrap();
        assert_eq!(client.backend().url(), "http://localhost:8080/search/?");
        assert_eq!(client.backend().content_field(), "content");
    }
}
