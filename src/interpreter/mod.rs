//! Rule interpreter.
//!
//! Turns a rule's free-text description into a [`RuleEffect`]: a closed set
//! of worker-ordering transforms applied during allocation. Interpretation
//! happens once per rule, before the allocation loop; the loop only ever
//! sees the enum.
//!
//! # Vocabulary
//!
//! | Keywords | Effect |
//! |----------|--------|
//! | senior, experienced, expert | [`RuleEffect::QualificationOrder`] (descending) |
//! | balance, distribute, evenly | [`RuleEffect::UtilizationBalance`] |
//! | cost, budget, cheap | [`RuleEffect::CostMinimize`] |
//! | group, team | [`RuleEffect::GroupAffinity`] |
//!
//! Matching is case-insensitive substring matching. When several keywords
//! occur, the first row of the table wins. Text with no keyword is
//! [`RuleEffect::Inert`].
//!
//! An external [`RuleAdvisor`] may classify text instead; see
//! [`AdvisedInterpreter`] for the fallback contract.

mod advisor;
mod context;
mod ordering;

pub use advisor::{
    AdvisedInterpreter, AdvisorSession, RuleAdvisor, DEFAULT_ADVISOR_RUN_BUDGET,
    DEFAULT_ADVISOR_TIMEOUT,
};
pub use context::OrderingContext;
pub use ordering::{Adjustment, WorkerOrdering};

use serde::{Deserialize, Serialize};

/// The ordering effect of a rule on the eligible worker list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "camelCase")]
pub enum RuleEffect {
    /// Order by qualification tier.
    QualificationOrder { descending: bool },
    /// Least-utilized workers first.
    UtilizationBalance,
    /// Lowest qualification tier first.
    CostMinimize,
    /// Workers in the client's group first.
    GroupAffinity,
    /// No reordering.
    Inert,
}

/// Keyword vocabulary in precedence order.
pub const VOCABULARY: [(&str, RuleEffect); 11] = [
    ("senior", RuleEffect::QualificationOrder { descending: true }),
    ("experienced", RuleEffect::QualificationOrder { descending: true }),
    ("expert", RuleEffect::QualificationOrder { descending: true }),
    ("balance", RuleEffect::UtilizationBalance),
    ("distribute", RuleEffect::UtilizationBalance),
    ("evenly", RuleEffect::UtilizationBalance),
    ("cost", RuleEffect::CostMinimize),
    ("budget", RuleEffect::CostMinimize),
    ("cheap", RuleEffect::CostMinimize),
    ("group", RuleEffect::GroupAffinity),
    ("team", RuleEffect::GroupAffinity),
];

impl RuleEffect {
    /// Canonical keyword of this effect.
    pub fn keyword(&self) -> Option<&'static str> {
        match self {
            Self::QualificationOrder { descending: true } => Some("senior"),
            Self::QualificationOrder { descending: false } | Self::CostMinimize => Some("cost"),
            Self::UtilizationBalance => Some("balance"),
            Self::GroupAffinity => Some("group"),
            Self::Inert => None,
        }
    }

    /// Whether this effect never reorders.
    pub fn is_inert(&self) -> bool {
        matches!(self, Self::Inert)
    }
}

/// Classifies a description against the keyword vocabulary.
///
/// ```
/// use u_allocate::interpreter::{interpret, RuleEffect};
///
/// assert_eq!(interpret("Distribute work evenly"), RuleEffect::UtilizationBalance);
/// assert_eq!(interpret("Friday deploy freeze"), RuleEffect::Inert);
/// ```
pub fn interpret(description: &str) -> RuleEffect {
    let text = description.to_lowercase();
    VOCABULARY
        .iter()
        .find(|(keyword, _)| text.contains(keyword))
        .map(|(_, effect)| *effect)
        .unwrap_or(RuleEffect::Inert)
}

/// The word of `description` that selected `effect`: the first vocabulary
/// keyword for that effect occurring in the text, else the effect's own
/// keyword (an advisor may classify text that contains none).
///
/// ```
/// use u_allocate::interpreter::{matched_keyword, RuleEffect};
///
/// assert_eq!(matched_keyword("Stay within budget", RuleEffect::CostMinimize), Some("budget"));
/// assert_eq!(matched_keyword("Be frugal", RuleEffect::CostMinimize), Some("cost"));
/// ```
pub fn matched_keyword(description: &str, effect: RuleEffect) -> Option<&'static str> {
    let text = description.to_lowercase();
    VOCABULARY
        .iter()
        .find(|(keyword, e)| *e == effect && text.contains(keyword))
        .map(|(keyword, _)| *keyword)
        .or_else(|| effect.keyword())
}

/// Vocabulary keywords occurring in `text` (case-insensitive), in
/// vocabulary order.
pub fn keywords_in(text: &str) -> Vec<&'static str> {
    let text = text.to_lowercase();
    VOCABULARY
        .iter()
        .map(|(keyword, _)| *keyword)
        .filter(|keyword| text.contains(keyword))
        .collect()
}
