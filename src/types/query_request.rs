use serde::{Deserialize, Serialize};

/// Body of the outbound request to the answer service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QueryRequest {
    /// The trimmed user question.
    pub query: String,
}

impl QueryRequest {
    /// Create a new `QueryRequest`.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
        }
    }
}
