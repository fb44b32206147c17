//! Prompt templates for compliance checks and open questions.
//!
//! Both builders are pure: the same inputs always produce byte-identical
//! prompts. Passages appear in retrieval order, duplicates included, joined by
//! a horizontal-rule delimiter. Downstream readers rely on the numbered
//! five-section directive of the compliance template, so its wording is fixed.

use crate::index::RetrievedPassage;
use crate::rules::{Rule, catalogue_json};

/// Separator placed between consecutive passages.
pub const PASSAGE_DELIMITER: &str = "\n\n---\n\n";

/// Status tags the compliance directive asks the model to choose from.
pub const COMPLIANCE_STATUSES: [&str; 3] = ["COMPLIANT", "NON-COMPLIANT", "PARTIAL"];

const COMPLIANCE_PREAMBLE: &str = "You are a legal compliance expert analyzing contracts.";

const COMPLIANCE_DIRECTIVE: &str = "\
Provide a detailed compliance analysis with:
1. COMPLIANCE STATUS: [COMPLIANT/NON-COMPLIANT/PARTIAL]
2. APPLICABLE RULES: Which rules apply
3. EVIDENCE: Specific quotes from contracts
4. VIOLATIONS: Any issues found
5. REMEDIATION: Steps to fix issues";

const QA_PREAMBLE: &str =
    "Based on the following contract information, answer the question accurately.";

const QA_DIRECTIVE: &str = "Provide a clear, detailed answer with specific references.";

/// Which template a prompt was assembled from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    Compliance,
    Question,
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskKind::Compliance => write!(f, "compliance"),
            TaskKind::Question => write!(f, "question"),
        }
    }
}

/// Concatenate passage contents in order, separated by [`PASSAGE_DELIMITER`].
pub fn join_passages(passages: &[RetrievedPassage]) -> String {
    passages
        .iter()
        .map(|p| p.content.as_str())
        .collect::<Vec<_>>()
        .join(PASSAGE_DELIMITER)
}

/// Assemble the compliance-check prompt.
///
/// Every rule passed in is serialized with all of its fields; callers decide
/// which rules to inject.
pub fn build_compliance_prompt(
    rules: &[Rule],
    passages: &[RetrievedPassage],
    query: &str,
) -> String {
    format!(
        "{preamble}\n\n\
         COMPLIANCE RULES:\n{rules}\n\n\
         CONTRACT SECTIONS:\n{context}\n\n\
         QUERY: {query}\n\n\
         {directive}\n\n\
         Response:\n",
        preamble = COMPLIANCE_PREAMBLE,
        rules = catalogue_json(rules),
        context = join_passages(passages),
        query = query,
        directive = COMPLIANCE_DIRECTIVE,
    )
}

/// Assemble the open question-answering prompt. No rules are injected.
pub fn build_qa_prompt(passages: &[RetrievedPassage], question: &str) -> String {
    format!(
        "{preamble}\n\n\
         CONTRACT INFORMATION:\n{context}\n\n\
         QUESTION: {question}\n\n\
         {directive}\n\n\
         Answer:\n",
        preamble = QA_PREAMBLE,
        context = join_passages(passages),
        question = question,
        directive = QA_DIRECTIVE,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::Severity;
    use pretty_assertions::assert_eq;

    fn party_rule() -> Rule {
        Rule {
            id: "R1".into(),
            name: "Party ID".into(),
            description: "Parties must be identified.".into(),
            severity: Severity::High,
            check: "Parties named".into(),
            remediation: "Name the parties.".into(),
            related_columns: vec![],
        }
    }

    fn passages() -> Vec<RetrievedPassage> {
        vec![
            RetrievedPassage::new("Party A is Acme Corp.", "c1.txt"),
            RetrievedPassage::new("Party B is Globex Ltd.", "c2.txt"),
        ]
    }

    #[test]
    fn test_compliance_prompt_full_text() {
        let prompt = build_compliance_prompt(
            &[party_rule()],
            &passages(),
            "Are the contracting parties identified?",
        );
        let expected = r#"You are a legal compliance expert analyzing contracts.

COMPLIANCE RULES:
{
  "R1": {
    "name": "Party ID",
    "description": "Parties must be identified.",
    "severity": "HIGH",
    "check": "Parties named",
    "remediation": "Name the parties.",
    "related_columns": []
  }
}

CONTRACT SECTIONS:
Party A is Acme Corp.

---

Party B is Globex Ltd.

QUERY: Are the contracting parties identified?

Provide a detailed compliance analysis with:
1. COMPLIANCE STATUS: [COMPLIANT/NON-COMPLIANT/PARTIAL]
2. APPLICABLE RULES: Which rules apply
3. EVIDENCE: Specific quotes from contracts
4. VIOLATIONS: Any issues found
5. REMEDIATION: Steps to fix issues

Response:
"#;
        assert_eq!(prompt, expected);
    }

    #[test]
    fn test_qa_prompt_full_text() {
        let prompt = build_qa_prompt(&passages(), "Who is Party A?");
        let expected = "Based on the following contract information, answer the question accurately.

CONTRACT INFORMATION:
Party A is Acme Corp.

---

Party B is Globex Ltd.

QUESTION: Who is Party A?

Provide a clear, detailed answer with specific references.

Answer:
";
        assert_eq!(prompt, expected);
    }

    #[test]
    fn test_qa_prompt_has_no_rules() {
        let prompt = build_qa_prompt(&passages(), "Who is Party A?");
        assert!(!prompt.contains("COMPLIANCE RULES"));
        assert!(!prompt.contains("COMPLIANCE STATUS"));
    }

    #[test]
    fn test_duplicates_kept_in_order() {
        let dup = vec![
            RetrievedPassage::new("same", "c1.txt"),
            RetrievedPassage::new("other", "c2.txt"),
            RetrievedPassage::new("same", "c1.txt"),
        ];
        assert_eq!(join_passages(&dup), "same\n\n---\n\nother\n\n---\n\nsame");
    }

    #[test]
    fn test_empty_context() {
        let prompt = build_qa_prompt(&[], "Anything?");
        assert!(prompt.contains("CONTRACT INFORMATION:\n\n\nQUESTION: Anything?"));

        let prompt = build_compliance_prompt(&[], &[], "Anything?");
        assert!(prompt.contains("COMPLIANCE RULES:\n{}\n\nCONTRACT SECTIONS:\n\n\nQUERY"));
    }

    #[test]
    fn test_directive_has_five_numbered_sections() {
        let prompt = build_compliance_prompt(&[party_rule()], &passages(), "q");
        for (n, section) in [
            "COMPLIANCE STATUS",
            "APPLICABLE RULES",
            "EVIDENCE",
            "VIOLATIONS",
            "REMEDIATION",
        ]
        .iter()
        .enumerate()
        {
            assert!(prompt.contains(&format!("{}. {}:", n + 1, section)));
        }
        for status in COMPLIANCE_STATUSES {
            assert!(prompt.contains(status));
        }
    }

    #[test]
    fn test_task_kind_display() {
        assert_eq!(TaskKind::Compliance.to_string(), "compliance");
        assert_eq!(TaskKind::Question.to_string(), "question");
    }
}
