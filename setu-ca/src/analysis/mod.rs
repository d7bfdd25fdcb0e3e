//! Contract risk decision module
//!
//! Pure functions only: no database, no I/O. Everything here is a fixed
//! function of the risk score so it can be tested exhaustively.
//!
//! | Score    | Level  | Clause tiers                               |
//! |----------|--------|--------------------------------------------|
//! | 0..=39   | low    | none                                       |
//! | 40..=59  | medium | passport retention                         |
//! | 60..=69  | medium | passport retention, undefined overtime pay |
//! | 70..=100 | high   | passport retention, undefined overtime pay |

pub mod analyzer;
pub mod clauses;
pub mod scoring;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use setu_common::db::Language;

pub use analyzer::{AnalysisError, AnalysisReport, ContractAnalyzer, ContractUpload, FieldErrors};
pub use clauses::{ClauseSource, TemplateClauseSource};
pub use scoring::{ContractDocument, FixedScorer, PlaceholderScorer, RiskScorer};

/// Scores at or above this are high risk
pub const HIGH_RISK_THRESHOLD: u8 = 70;
/// Scores at or above this (and below high) are medium risk
pub const MEDIUM_RISK_THRESHOLD: u8 = 40;
/// Upper bound of the score range
pub const MAX_RISK_SCORE: u8 = 100;

/// Integer risk score in `0..=100`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RiskScore(u8);

impl RiskScore {
    /// Returns `None` for values outside `0..=100`
    pub fn new(value: i64) -> Option<Self> {
        u8::try_from(value)
            .ok()
            .filter(|v| *v <= MAX_RISK_SCORE)
            .map(Self)
    }

    /// Saturate into range; for scorers whose raw output may overshoot
    pub fn clamped(value: i64) -> Self {
        Self(value.clamp(0, MAX_RISK_SCORE as i64) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl fmt::Display for RiskScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/100", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Fixed thresholds; not configurable per call
    pub fn from_score(score: RiskScore) -> Self {
        match score.value() {
            s if s >= HIGH_RISK_THRESHOLD => RiskLevel::High,
            s if s >= MEDIUM_RISK_THRESHOLD => RiskLevel::Medium,
            _ => RiskLevel::Low,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }

    pub fn recommendation(&self) -> &'static Recommendation {
        &RECOMMENDATIONS[*self as usize]
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskLevel {
    type Err = setu_common::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(RiskLevel::Low),
            "medium" => Ok(RiskLevel::Medium),
            "high" => Ok(RiskLevel::High),
            other => Err(setu_common::Error::Decode(format!(
                "Unknown risk level: {}",
                other
            ))),
        }
    }
}

/// Bilingual overall recommendation for one risk bucket
#[derive(Debug, PartialEq, Eq)]
pub struct Recommendation {
    pub en: &'static str,
    pub ne: &'static str,
}

impl Recommendation {
    pub fn text(&self, language: Language) -> &'static str {
        match language {
            Language::En => self.en,
            Language::Ne => self.ne,
        }
    }
}

/// Indexed by `RiskLevel as usize`
static RECOMMENDATIONS: [Recommendation; 3] = [
    // Low
    Recommendation {
        en: "This contract appears to follow standard terms. Keep a signed copy and \
             confirm your salary and working hours before departure.",
        ne: "यो करार सामान्य सर्तहरू अनुसार देखिन्छ। प्रस्थान अघि तलब र कामका घण्टा \
             पुष्टि गर्नुहोस् र हस्ताक्षर गरिएको एक प्रति आफूसँग राख्नुहोस्।",
    },
    // Medium
    Recommendation {
        en: "Some clauses in this contract need attention. Review the flagged clauses \
             and ask your recruitment agency for written clarification before signing.",
        ne: "यस करारका केही धाराहरूमा ध्यान दिनुपर्छ। हस्ताक्षर गर्नु अघि चिन्हित \
             धाराहरू पढ्नुहोस् र म्यानपावर एजेन्सीसँग लिखित स्पष्टीकरण माग्नुहोस्।",
    },
    // High
    Recommendation {
        en: "This contract contains several concerning clauses regarding overtime pay, \
             passport confiscation, and contract termination. We strongly recommend \
             consulting with a legal advisor before signing.",
        ne: "यो करारमा ओभरटाइम भुक्तानी, राहदानी जफत, र करार समाप्तिका बारेमा \
             चिन्ताजनक धाराहरू छन्। हस्ताक्षर गर्नु अघि कानूनी सल्लाहकारसँग \
             परामर्श गर्न सिफारिस गरिन्छ।",
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Illegal,
    HighRisk,
    Warning,
    Info,
}

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::Illegal,
        Severity::HighRisk,
        Severity::Warning,
        Severity::Info,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Illegal => "illegal",
            Severity::HighRisk => "high_risk",
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }
}

impl FromStr for Severity {
    type Err = setu_common::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Severity::ALL
            .into_iter()
            .find(|sev| sev.as_str() == s)
            .ok_or_else(|| setu_common::Error::Decode(format!("Unknown severity: {}", s)))
    }
}

/// A category of risky clause the policy can flag
///
/// Tiers are cumulative: a score that reaches a tier's threshold also
/// reaches every earlier tier's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClauseTier {
    PassportRetention,
    UndefinedOvertimePay,
}

impl ClauseTier {
    /// In synthesis order
    pub const ALL: [ClauseTier; 2] = [ClauseTier::PassportRetention, ClauseTier::UndefinedOvertimePay];

    pub fn threshold(&self) -> u8 {
        match self {
            ClauseTier::PassportRetention => 40,
            ClauseTier::UndefinedOvertimePay => 60,
        }
    }

    pub fn for_score(score: RiskScore) -> Vec<ClauseTier> {
        Self::ALL
            .into_iter()
            .filter(|tier| score.value() >= tier.threshold())
            .collect()
    }
}

/// Clause content ready to persist
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlaggedClauseDraft {
    pub clause_reference: String,
    pub title: String,
    pub severity: Severity,
    pub original_text: String,
    pub explanation_ne: String,
    pub recommendation: String,
}

/// Everything derived from a score before persistence
#[derive(Debug, Clone)]
pub struct Assessment {
    pub score: RiskScore,
    pub level: RiskLevel,
    pub recommendation: &'static Recommendation,
    pub tiers: Vec<ClauseTier>,
}

impl Assessment {
    pub fn from_score(score: RiskScore) -> Self {
        let level = RiskLevel::from_score(score);
        Self {
            score,
            level,
            recommendation: level.recommendation(),
            tiers: ClauseTier::for_score(score),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(v: i64) -> RiskScore {
        RiskScore::new(v).unwrap()
    }

    #[test]
    fn test_score_range_is_enforced() {
        assert!(RiskScore::new(-1).is_none());
        assert!(RiskScore::new(101).is_none());
        assert_eq!(RiskScore::new(0).unwrap().value(), 0);
        assert_eq!(RiskScore::new(100).unwrap().value(), 100);
        assert_eq!(RiskScore::clamped(250).value(), 100);
        assert_eq!(RiskScore::clamped(-3).value(), 0);
    }

    #[test]
    fn test_level_boundaries() {
        assert_eq!(RiskLevel::from_score(score(0)), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(score(39)), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(score(40)), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(score(69)), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(score(70)), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(score(100)), RiskLevel::High);
    }

    #[test]
    fn test_level_is_total_over_range() {
        for v in 0..=100 {
            let level = RiskLevel::from_score(score(v));
            let expected = if v >= 70 {
                RiskLevel::High
            } else if v >= 40 {
                RiskLevel::Medium
            } else {
                RiskLevel::Low
            };
            assert_eq!(level, expected, "score {}", v);
        }
    }

    #[test]
    fn test_clause_tiers_are_cumulative() {
        assert!(ClauseTier::for_score(score(39)).is_empty());
        assert_eq!(
            ClauseTier::for_score(score(40)),
            vec![ClauseTier::PassportRetention]
        );
        assert_eq!(
            ClauseTier::for_score(score(59)),
            vec![ClauseTier::PassportRetention]
        );
        assert_eq!(
            ClauseTier::for_score(score(60)),
            vec![ClauseTier::PassportRetention, ClauseTier::UndefinedOvertimePay]
        );
        assert_eq!(ClauseTier::for_score(score(100)).len(), 2);
    }

    #[test]
    fn test_recommendation_table_is_per_level() {
        let low = RiskLevel::Low.recommendation();
        let medium = RiskLevel::Medium.recommendation();
        let high = RiskLevel::High.recommendation();
        assert_ne!(low, medium);
        assert_ne!(medium, high);
        assert!(high.en.contains("legal advisor"));
        assert_eq!(low.text(Language::Ne), low.ne);
    }

    #[test]
    fn test_level_and_severity_parse_back() {
        for level in [RiskLevel::Low, RiskLevel::Medium, RiskLevel::High] {
            assert_eq!(level.as_str().parse::<RiskLevel>().unwrap(), level);
        }
        for sev in Severity::ALL {
            assert_eq!(sev.as_str().parse::<Severity>().unwrap(), sev);
        }
        assert!("critical".parse::<Severity>().is_err());
    }
}
