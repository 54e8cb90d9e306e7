//! Guideline retrieval
//!
//! Reports are grounded on passages from the breast imaging guidelines
//! stored in a vector database. Retrieval is best effort: a report can
//! always be drafted without context.

pub mod chroma;
pub mod embeddings;

pub use chroma::ChromaStore;
pub use embeddings::OpenAIEmbedder;

use async_trait::async_trait;
use sonoreport_core::ReportError;

/// Similarity search over stored guideline passages
#[async_trait]
pub trait GuidelineStore: Send + Sync {
    /// Up to `k` passages most similar to `query`, best match first
    async fn search(&self, query: &str, k: usize) -> Result<Vec<String>, ReportError>;
}

/// Fetch guideline context for a query.
///
/// Never fails: a missing or failing store yields no context.
pub async fn retrieve_context(
    store: Option<&dyn GuidelineStore>,
    query: &str,
    k: usize,
) -> Vec<String> {
    let Some(store) = store else {
        record_retrieval("disabled");
        return Vec::new();
    };

    match store.search(query, k).await {
        Ok(passages) => {
            tracing::debug!(passages = passages.len(), "Retrieved guideline context");
            record_retrieval("ok");
            passages
                .into_iter()
                .filter(|p| !p.trim().is_empty())
                .take(k)
                .collect()
        }
        Err(err) => {
            tracing::warn!(error = %err, "Guideline retrieval failed, drafting without context");
            record_retrieval("error");
            Vec::new()
        }
    }
}

fn record_retrieval(outcome: &'static str) {
    metrics::counter!("guideline_retrievals_total", "outcome" => outcome).increment(1);
}
