//! Topic extraction for finding records
//!
//! Projects carry explicit topic tags; papers get a naive keyword heuristic
//! over the abstract. The heuristic is a placeholder, not NLP-grade keyword
//! extraction — a proper topic model can replace it without changing the
//! graph store's contract.

use std::collections::BTreeSet;

use crate::record::{Finding, PaperRecord, ProjectRecord};

/// Maximum number of keywords extracted from a paper abstract
const MAX_PAPER_TOPICS: usize = 5;

/// Words this short or shorter are never keywords
const MIN_KEYWORD_CHARS: usize = 5;

/// Topic set for any finding.
pub fn finding_topics(finding: &Finding) -> BTreeSet<String> {
    match finding {
        Finding::Paper(paper) => paper_topics(paper),
        Finding::Project(project) => project_topics(project),
    }
}

/// Explicit project tags, case-normalized.
pub fn project_topics(project: &ProjectRecord) -> BTreeSet<String> {
    project
        .topics
        .iter()
        .map(|topic| topic.to_lowercase())
        .collect()
}

/// Naive keyword heuristic over the paper abstract.
///
/// Distinct whitespace-separated words longer than [`MIN_KEYWORD_CHARS`]
/// characters, lowercased and deduplicated by first appearance; the
/// [`MAX_PAPER_TOPICS`] longest are kept, ties going to the earlier word.
pub fn paper_topics(paper: &PaperRecord) -> BTreeSet<String> {
    let mut distinct: Vec<String> = Vec::new();
    for word in paper.abstract_text.split_whitespace() {
        let word = word.to_lowercase();
        if word.chars().count() <= MIN_KEYWORD_CHARS {
            continue;
        }
        if !distinct.contains(&word) {
            distinct.push(word);
        }
    }

    // Stable sort: ties keep first-appearance order
    distinct.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()));
    distinct.into_iter().take(MAX_PAPER_TOPICS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paper_with_abstract(text: &str) -> PaperRecord {
        PaperRecord {
            title: "Test".into(),
            authors: vec![],
            year: None,
            abstract_text: text.into(),
            url: String::new(),
            citations: 0,
        }
    }

    #[test]
    fn test_paper_topics_filters_short_words() {
        let paper = paper_with_abstract("graph neural network architectures summarized");
        let topics = paper_topics(&paper);

        // "graph" is exactly 5 characters and must be excluded
        let expected: BTreeSet<String> = ["neural", "network", "architectures", "summarized"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(topics, expected);
    }

    #[test]
    fn test_paper_topics_keeps_five_longest() {
        let paper = paper_with_abstract(
            "useful methods exploring reinforcement generalization benchmark datasets quickly",
        );
        let topics = paper_topics(&paper);

        assert_eq!(topics.len(), 5);
        // The five longest qualifying words survive
        assert!(topics.contains("reinforcement"));
        assert!(topics.contains("generalization"));
        assert!(topics.contains("exploring"));
        assert!(topics.contains("benchmark"));
        assert!(topics.contains("datasets"));
        // Shorter qualifiers are cut
        assert!(!topics.contains("useful"));
        assert!(!topics.contains("methods"));
    }

    #[test]
    fn test_paper_topics_tie_goes_to_earlier_word() {
        // Five 7-char words followed by another 7-char word: the sixth loses
        let paper = paper_with_abstract("alphaaa betaaaa gammaaa deltaaa epsilon omegaaa");
        let topics = paper_topics(&paper);

        assert_eq!(topics.len(), 5);
        assert!(topics.contains("alphaaa"));
        assert!(topics.contains("epsilon"));
        assert!(!topics.contains("omegaaa"));
    }

    #[test]
    fn test_paper_topics_deduplicates() {
        let paper = paper_with_abstract("transformers transformers transformers attention");
        let topics = paper_topics(&paper);

        let expected: BTreeSet<String> = ["transformers", "attention"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(topics, expected);
    }

    #[test]
    fn test_paper_topics_empty_abstract() {
        let paper = paper_with_abstract("");
        assert!(paper_topics(&paper).is_empty());
    }

    #[test]
    fn test_project_topics_lowercased_verbatim() {
        let project = ProjectRecord {
            full_name: "org/gnn-lib".into(),
            description: String::new(),
            stars: 0,
            url: String::new(),
            topics: vec!["Graph-Neural-Network".into(), "PyTorch".into()],
            readme_content: String::new(),
            paper_references: vec![],
        };

        let topics = project_topics(&project);
        let expected: BTreeSet<String> = ["graph-neural-network", "pytorch"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(topics, expected);
    }

    #[test]
    fn test_finding_topics_dispatch() {
        let finding = Finding::Paper(paper_with_abstract("quantum computing primitives"));
        let topics = finding_topics(&finding);
        assert!(topics.contains("quantum"));
        assert!(topics.contains("computing"));
        assert!(topics.contains("primitives"));
    }
}
