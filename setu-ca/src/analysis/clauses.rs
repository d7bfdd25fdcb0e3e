//! Flagged clause synthesis
//!
//! Which clauses get flagged is decided by `ClauseTier::for_score`; a
//! `ClauseSource` only supplies the content for each tier it is asked about.
//! Swapping the source (e.g. for a real contract scanner) therefore keeps the
//! cumulative two-threshold policy intact.

use async_trait::async_trait;

use super::scoring::ContractDocument;
use super::{ClauseTier, FlaggedClauseDraft, RiskScore, Severity};

#[async_trait]
pub trait ClauseSource: Send + Sync {
    fn name(&self) -> &'static str;

    async fn clause_for(&self, tier: ClauseTier, document: &ContractDocument<'_>) -> FlaggedClauseDraft;
}

/// Build the drafts for a score, in tier order
pub async fn synthesize(
    source: &dyn ClauseSource,
    score: RiskScore,
    document: &ContractDocument<'_>,
) -> Vec<FlaggedClauseDraft> {
    let mut drafts = Vec::new();
    for tier in ClauseTier::for_score(score) {
        drafts.push(source.clause_for(tier, document).await);
    }
    drafts
}

struct ClauseTemplate {
    clause_reference: &'static str,
    title: &'static str,
    severity: Severity,
    original_text: &'static str,
    explanation_ne: &'static str,
    recommendation: &'static str,
}

const PASSPORT_RETENTION: ClauseTemplate = ClauseTemplate {
    clause_reference: "Clause 7.1",
    title: "Passport Retention by Employer",
    severity: Severity::Illegal,
    original_text: "The employee shall surrender their passport to the employer for \
                    safekeeping during the employment period.",
    explanation_ne: "यो धाराले भन्छ कि रोजगारदाताले तपाईंको राहदानी राख्नेछ। \
                     कामदारको राहदानी जफत गर्नु गैरकानूनी हो।",
    recommendation: "NEVER surrender your passport. Employers are not allowed to keep \
                     workers' passports.",
};

const UNDEFINED_OVERTIME_PAY: ClauseTemplate = ClauseTemplate {
    clause_reference: "Clause 4.2",
    title: "Undefined Overtime Pay",
    severity: Severity::Warning,
    original_text: "The employee shall work additional hours as required by operational \
                    needs. Compensation for such hours will be determined by the employer.",
    explanation_ne: "यो धाराले ओभरटाइमको तलब कति हुने भनेर स्पष्ट गरेको छैन। \
                     रोजगारदाताले आफूखुसी निर्धारण गर्न सक्छ।",
    recommendation: "Ask for the overtime pay rate to be written into the contract \
                     before signing.",
};

/// Fixed reference content per tier; ignores the document
#[derive(Debug, Default, Clone, Copy)]
pub struct TemplateClauseSource;

impl TemplateClauseSource {
    fn template(tier: ClauseTier) -> &'static ClauseTemplate {
        match tier {
            ClauseTier::PassportRetention => &PASSPORT_RETENTION,
            ClauseTier::UndefinedOvertimePay => &UNDEFINED_OVERTIME_PAY,
        }
    }
}

#[async_trait]
impl ClauseSource for TemplateClauseSource {
    fn name(&self) -> &'static str {
        "template"
    }

    async fn clause_for(&self, tier: ClauseTier, _document: &ContractDocument<'_>) -> FlaggedClauseDraft {
        let t = Self::template(tier);
        FlaggedClauseDraft {
            clause_reference: t.clause_reference.to_string(),
            title: t.title.to_string(),
            severity: t.severity,
            original_text: t.original_text.to_string(),
            explanation_ne: t.explanation_ne.to_string(),
            recommendation: t.recommendation.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: ContractDocument<'static> = ContractDocument {
        employer_name: "Acme Corp",
        filename: "c.pdf",
        content: b"",
    };

    async fn references(score: i64) -> Vec<String> {
        synthesize(&TemplateClauseSource, RiskScore::new(score).unwrap(), &DOC)
            .await
            .into_iter()
            .map(|d| d.clause_reference)
            .collect()
    }

    #[tokio::test]
    async fn test_no_clauses_below_forty() {
        assert!(references(0).await.is_empty());
        assert!(references(39).await.is_empty());
    }

    #[tokio::test]
    async fn test_passport_only_between_forty_and_sixty() {
        assert_eq!(references(40).await, vec!["Clause 7.1"]);
        assert_eq!(references(59).await, vec!["Clause 7.1"]);
    }

    #[tokio::test]
    async fn test_both_clauses_from_sixty() {
        assert_eq!(references(60).await, vec!["Clause 7.1", "Clause 4.2"]);
        assert_eq!(references(95).await, vec!["Clause 7.1", "Clause 4.2"]);
    }

    #[tokio::test]
    async fn test_template_severities() {
        let drafts = synthesize(&TemplateClauseSource, RiskScore::new(80).unwrap(), &DOC).await;
        assert_eq!(drafts[0].severity, Severity::Illegal);
        assert_eq!(drafts[0].title, "Passport Retention by Employer");
        assert_eq!(drafts[1].severity, Severity::Warning);
        assert!(!drafts[1].explanation_ne.is_empty());
    }

    struct EchoSource;

    #[async_trait]
    impl ClauseSource for EchoSource {
        fn name(&self) -> &'static str {
            "echo"
        }

        async fn clause_for(&self, tier: ClauseTier, document: &ContractDocument<'_>) -> FlaggedClauseDraft {
            FlaggedClauseDraft {
                clause_reference: format!("{:?}", tier),
                title: document.employer_name.to_string(),
                severity: Severity::Info,
                original_text: String::new(),
                explanation_ne: String::new(),
                recommendation: String::new(),
            }
        }
    }

    #[tokio::test]
    async fn test_swapped_source_keeps_policy() {
        let drafts = synthesize(&EchoSource, RiskScore::new(45).unwrap(), &DOC).await;
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].clause_reference, "PassportRetention");
        assert_eq!(drafts[0].title, "Acme Corp");
    }
}
