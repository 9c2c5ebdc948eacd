//! `chainkit embed` - Vertex AI embeddings in batches.

use std::path::PathBuf;

use chainkit_core::embeddings::Embeddings;
use chainkit_providers::embeddings_from_config;

use super::load_config;

/// Non-empty lines of `file` appended to `texts`.
pub fn collect_texts(
    mut texts: Vec<String>,
    file: Option<&PathBuf>,
) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    if let Some(path) = file {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
        texts.extend(
            content
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(String::from),
        );
    }
    Ok(texts)
}

pub async fn run(
    texts: Vec<String>,
    file: Option<PathBuf>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let texts = collect_texts(texts, file.as_ref())?;
    if texts.is_empty() {
        return Err("Nothing to embed. Pass texts or --file".into());
    }

    let config = load_config()?;
    let embeddings = embeddings_from_config(&config)?;
    let vectors = embeddings.embed_documents(&texts).await?;

    if json {
        println!("{}", serde_json::to_string(&vectors)?);
        return Ok(());
    }

    println!(
        "Embedded {} of {} texts in chunks of {}",
        vectors.len(),
        texts.len(),
        embeddings.chunk_size()
    );
    for (text, vector) in texts.iter().zip(&vectors) {
        let preview: String = text.chars().take(40).collect();
        println!("  [{} dims] {preview}", vector.len());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn file_lines_are_appended() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "first\n\n  second  \n").unwrap();

        let path = file.path().to_path_buf();
        let texts = collect_texts(vec!["arg".into()], Some(&path)).unwrap();
        assert_eq!(texts, vec!["arg", "first", "second"]);
    }

    #[test]
    fn missing_file_is_an_error() {
        let path = PathBuf::from("/definitely/not/here.txt");
        assert!(collect_texts(Vec::new(), Some(&path)).is_err());
    }
}
