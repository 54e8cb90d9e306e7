//! Chroma vector store client
//!
//! Talks to the Chroma REST API: the collection id is resolved from its
//! name once, then every search is a nearest-neighbour query with a
//! precomputed embedding.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sonoreport_core::ReportError;
use std::time::Duration;
use tokio::sync::OnceCell;

use super::GuidelineStore;
use super::embeddings::OpenAIEmbedder;

pub const DEFAULT_COLLECTION: &str = "langchain";

pub struct ChromaStore {
    client: reqwest::Client,
    base_url: String,
    collection: String,
    collection_id: OnceCell<String>,
    embedder: OpenAIEmbedder,
}

#[derive(Deserialize)]
struct Collection {
    id: String,
}

#[derive(Serialize)]
struct QueryRequest<'a> {
    query_embeddings: Vec<Vec<f32>>,
    n_results: usize,
    include: [&'a str; 1],
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    documents: Option<Vec<Vec<Option<String>>>>,
}

impl ChromaStore {
    pub fn new(
        base_url: String,
        collection: Option<String>,
        embedder: OpenAIEmbedder,
        timeout: Duration,
    ) -> Result<Self, ReportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ReportError::Retrieval(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            collection: collection.unwrap_or_else(|| DEFAULT_COLLECTION.to_string()),
            collection_id: OnceCell::new(),
            embedder,
        })
    }

    async fn collection_id(&self) -> Result<&str, ReportError> {
        let id = self
            .collection_id
            .get_or_try_init(|| async {
                let url = format!("{}/api/v1/collections/{}", self.base_url, self.collection);
                let response = self.client.get(&url).send().await.map_err(|e| {
                    ReportError::Retrieval(format!("Vector store unreachable: {}", e))
                })?;

                if !response.status().is_success() {
                    return Err(ReportError::Retrieval(format!(
                        "Collection '{}' not available ({})",
                        self.collection,
                        response.status()
                    )));
                }

                let collection: Collection = response.json().await.map_err(|e| {
                    ReportError::Retrieval(format!("Failed to parse collection: {}", e))
                })?;
                tracing::info!(
                    collection = %self.collection,
                    id = %collection.id,
                    "Resolved guideline collection"
                );
                Ok::<_, ReportError>(collection.id)
            })
            .await?;
        Ok(id.as_str())
    }
}

#[async_trait]
impl GuidelineStore for ChromaStore {
    async fn search(&self, query: &str, k: usize) -> Result<Vec<String>, ReportError> {
        let embedding = self.embedder.embed(query).await?;
        let id = self.collection_id().await?;

        let request = QueryRequest {
            query_embeddings: vec![embedding],
            n_results: k,
            include: ["documents"],
        };

        let response = self
            .client
            .post(format!("{}/api/v1/collections/{}/query", self.base_url, id))
            .json(&request)
            .send()
            .await
            .map_err(|e| ReportError::Retrieval(format!("Vector query failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ReportError::Retrieval(format!(
                "Vector query error {}: {}",
                status, body
            )));
        }

        let result: QueryResponse = response
            .json()
            .await
            .map_err(|e| ReportError::Retrieval(format!("Failed to parse query result: {}", e)))?;

        Ok(documents(result))
    }
}

/// Documents of the first (only) query, in rank order
fn documents(response: QueryResponse) -> Vec<String> {
    response
        .documents
        .and_then(|per_query| per_query.into_iter().next())
        .unwrap_or_default()
        .into_iter()
        .flatten()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documents_of_first_query() {
        let response: QueryResponse = serde_json::from_str(
            r#"{"ids": [["a", "b", "c"]], "documents": [["first", null, "third"]]}"#,
        )
        .unwrap();
        assert_eq!(documents(response), vec!["first", "third"]);
    }

    #[test]
    fn missing_documents_are_empty() {
        let response: QueryResponse = serde_json::from_str(r#"{"ids": [[]]}"#).unwrap();
        assert!(documents(response).is_empty());
    }

    #[test]
    fn query_shape() {
        let body = serde_json::to_value(QueryRequest {
            query_embeddings: vec![vec![0.5, 0.25]],
            n_results: 2,
            include: ["documents"],
        })
        .unwrap();
        assert_eq!(body["n_results"], 2);
        assert_eq!(body["include"][0], "documents");
        assert_eq!(body["query_embeddings"][0][1], 0.25);
    }
}
