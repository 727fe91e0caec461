//! Finding record types
//!
//! Typed inputs supplied by the retrieval collaborators. A finding is either
//! an academic paper or a code project; the variant is decided by the
//! collaborator that produced the record. [`Finding::from_value`] keeps the
//! legacy shape detection (presence of `title` vs `full_name`) available for
//! collaborators that still hand over raw JSON.

use serde::{Deserialize, Serialize};

use crate::error::{MemoryError, Result};

/// An academic paper surfaced for a query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaperRecord {
    /// Paper title, used as the graph node id
    pub title: String,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub year: Option<u16>,
    /// Abstract text, input to the topic heuristic
    #[serde(rename = "abstract", default)]
    pub abstract_text: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub citations: u32,
}

/// A code project surfaced for a query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectRecord {
    /// Repository full name (`owner/repo`), used as the graph node id
    pub full_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub stars: u32,
    #[serde(default)]
    pub url: String,
    /// Explicit topic tags, consumed verbatim by the topic extractor
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub readme_content: String,
    #[serde(default)]
    pub paper_references: Vec<String>,
}

/// A paper or project record surfaced for a query
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Finding {
    Paper(PaperRecord),
    Project(ProjectRecord),
}

impl Finding {
    /// Stable identifier of this finding: the paper title or project full name.
    pub fn id(&self) -> &str {
        match self {
            Self::Paper(paper) => &paper.title,
            Self::Project(project) => &project.full_name,
        }
    }

    /// Classify a raw JSON record by shape.
    ///
    /// A record with a `title` field is a paper, one with a `full_name` field
    /// is a project; anything else fails with
    /// [`MemoryError::MalformedRecord`]. Decode failures after
    /// classification are reported as malformed too.
    pub fn from_value(value: &serde_json::Value) -> Result<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| MemoryError::malformed("finding is not a JSON object"))?;

        if obj.contains_key("title") {
            let paper: PaperRecord = serde_json::from_value(value.clone())
                .map_err(|e| MemoryError::malformed(format!("invalid paper record: {}", e)))?;
            Ok(Self::Paper(paper))
        } else if obj.contains_key("full_name") {
            let project: ProjectRecord = serde_json::from_value(value.clone())
                .map_err(|e| MemoryError::malformed(format!("invalid project record: {}", e)))?;
            Ok(Self::Project(project))
        } else {
            Err(MemoryError::malformed(
                "record has neither a paper nor a project shape",
            ))
        }
    }

    /// Convert a batch of raw `(record, summary)` pairs.
    ///
    /// A malformed record never aborts the batch: it is logged, collected
    /// into the error list, and the remaining records are still converted.
    pub fn from_values(
        values: &[(serde_json::Value, String)],
    ) -> (Vec<(Finding, String)>, Vec<MemoryError>) {
        let mut findings = Vec::with_capacity(values.len());
        let mut errors = Vec::new();

        for (value, summary) in values {
            match Self::from_value(value) {
                Ok(finding) => findings.push((finding, summary.clone())),
                Err(e) => {
                    log::warn!("Skipping malformed finding: {}", e);
                    errors.push(e);
                }
            }
        }

        (findings, errors)
    }
}
