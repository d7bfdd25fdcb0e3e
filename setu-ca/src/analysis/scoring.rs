//! Risk scoring strategies
//!
//! The analyzer only ever sees `dyn RiskScorer`, so a real contract-analysis
//! backend can replace the placeholder without touching persistence or
//! notification code.

use async_trait::async_trait;
use rand::Rng;

use super::RiskScore;

/// Lowest score the placeholder scorer draws
pub const PLACEHOLDER_MIN: u8 = 15;
/// Highest score the placeholder scorer draws
pub const PLACEHOLDER_MAX: u8 = 95;

/// The uploaded contract as seen by scoring and clause strategies
#[derive(Debug, Clone, Copy)]
pub struct ContractDocument<'a> {
    pub employer_name: &'a str,
    pub filename: &'a str,
    pub content: &'a [u8],
}

/// Produces a risk score for one contract
///
/// Implementations must be deterministic for a given configuration when used
/// in tests, and must always return a score in `0..=100` (enforced by
/// `RiskScore`).
#[async_trait]
pub trait RiskScorer: Send + Sync {
    /// Scorer name for logs
    fn name(&self) -> &'static str;

    async fn score(&self, document: &ContractDocument<'_>) -> RiskScore;
}

/// Stand-in for an AI scoring call: uniform random score in `15..=95`
#[derive(Debug, Default, Clone, Copy)]
pub struct PlaceholderScorer;

#[async_trait]
impl RiskScorer for PlaceholderScorer {
    fn name(&self) -> &'static str {
        "placeholder"
    }

    async fn score(&self, _document: &ContractDocument<'_>) -> RiskScore {
        let value = rand::thread_rng().gen_range(PLACEHOLDER_MIN..=PLACEHOLDER_MAX);
        RiskScore::clamped(value as i64)
    }
}

/// Always returns the same score
#[derive(Debug, Clone, Copy)]
pub struct FixedScorer(pub RiskScore);

impl FixedScorer {
    /// Out-of-range values saturate to `0..=100`
    pub fn new(value: i64) -> Self {
        Self(RiskScore::clamped(value))
    }
}

#[async_trait]
impl RiskScorer for FixedScorer {
    fn name(&self) -> &'static str {
        "fixed"
    }

    async fn score(&self, _document: &ContractDocument<'_>) -> RiskScore {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> ContractDocument<'static> {
        ContractDocument {
            employer_name: "Acme Corp",
            filename: "contract.pdf",
            content: b"%PDF-1.4",
        }
    }

    #[tokio::test]
    async fn test_placeholder_stays_in_band() {
        let scorer = PlaceholderScorer;
        for _ in 0..200 {
            let s = scorer.score(&doc()).await.value();
            assert!((PLACEHOLDER_MIN..=PLACEHOLDER_MAX).contains(&s), "score {}", s);
        }
    }

    #[tokio::test]
    async fn test_fixed_scorer() {
        assert_eq!(FixedScorer::new(72).score(&doc()).await.value(), 72);
        assert_eq!(FixedScorer::new(400).score(&doc()).await.value(), 100);
    }
}
