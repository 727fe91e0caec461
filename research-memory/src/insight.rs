//! Insight report generation
//!
//! Connects the current research cycle to semantically related past queries
//! from the memory store and names the current findings.

use std::sync::Arc;

use crate::error::Result;
use crate::record::Finding;
use crate::storage::{MemoryRecord, MemoryStore};

/// How many related records to pull from the memory store
const RELATED_LIMIT: usize = 5;

/// How many current findings the report names
const FINDING_LIMIT: usize = 3;

const FIRST_QUERY_MESSAGE: &str = "This is your first query on this topic.";

/// Builds insight reports against a memory store
pub struct InsightGenerator {
    store: Arc<MemoryStore>,
}

impl InsightGenerator {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }

    /// Produce the insight report for the current cycle.
    ///
    /// Searches the memory store for records related to `current_query` and
    /// partitions them by kind. With no related past queries the report is
    /// the first-query sentence; otherwise it lists each related past query
    /// verbatim and, when the batch is non-empty, up to
    /// [`FINDING_LIMIT`] current finding titles in input order.
    pub fn get_insights(
        &self,
        current_query: &str,
        current_findings: &[(Finding, String)],
    ) -> Result<String> {
        let related = self.store.query_related(current_query, RELATED_LIMIT)?;

        let past_queries: Vec<&MemoryRecord> = related
            .iter()
            .filter(|(record, _)| record.kind.is_query())
            .map(|(record, _)| record)
            .collect();

        if past_queries.is_empty() {
            return Ok(FIRST_QUERY_MESSAGE.to_string());
        }

        let mut lines = Vec::new();
        lines.push("Related to your previous research:".to_string());
        for record in &past_queries {
            lines.push(format!("- {}", record.text));
        }

        if !current_findings.is_empty() {
            lines.push(String::new());
            lines.push("Key connections in current findings:".to_string());
            for (finding, _) in current_findings.iter().take(FINDING_LIMIT) {
                lines.push(format!("- {}", finding.id()));
            }
        }

        Ok(lines.join("\n"))
    }
}
