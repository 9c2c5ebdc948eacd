//! `chainkit search` - query the configured Vespa endpoint.

use chainkit_core::document::Retriever;
use chainkit_retrievers::VespaRetriever;

use super::load_config;

pub async fn run(query: &str) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    let retriever = VespaRetriever::from_config(&config.retriever)?;
    let documents = retriever.get_relevant_documents(query).await?;

    if documents.is_empty() {
        println!("No documents found for \"{query}\"");
        return Ok(());
    }
    for (i, doc) in documents.iter().enumerate() {
        let id = doc.metadata.get("id").and_then(|v| v.as_str()).unwrap_or("?");
        println!("{}. [{id}]", i + 1);
        println!("   {}", doc.page_content);
    }
    Ok(())
}
