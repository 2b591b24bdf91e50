//! Worker ordering by composed rule effects.
//!
//! Effects are applied in rule-list order, each as a stable re-sort of the
//! previous result. The last rule therefore decides the primary order and
//! earlier rules act as successively lower-priority tie-breakers.

use std::cmp::Ordering;

use super::{matched_keyword, AdvisedInterpreter, OrderingContext, RuleEffect};
use crate::models::{BusinessRule, Worker};

#[derive(Debug, Clone)]
struct RuleSlot {
    rule_id: String,
    effect: RuleEffect,
    /// Word reported when this slot reorders workers.
    keyword: Option<&'static str>,
}

/// A rule whose effect changed the worker order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Adjustment<'o> {
    pub rule_id: &'o str,
    pub keyword: &'static str,
}

/// Composed ordering built from the active rules of a run.
///
/// # Example
/// ```
/// use u_allocate::interpreter::{OrderingContext, RuleEffect, WorkerOrdering};
/// use u_allocate::models::{Qualification, Worker};
///
/// let junior = Worker::new("W1").with_qualification(Qualification::Level(2));
/// let senior = Worker::new("W2").with_qualification(Qualification::Level(9));
/// let ordering = WorkerOrdering::new()
///     .with_effect("R1", RuleEffect::QualificationOrder { descending: true });
///
/// let mut workers = vec![&junior, &senior];
/// ordering.order(&mut workers, &OrderingContext::new());
/// assert_eq!(workers[0].id, "W2");
/// ```
#[derive(Debug, Clone, Default)]
pub struct WorkerOrdering {
    slots: Vec<RuleSlot>,
}

impl WorkerOrdering {
    /// Creates an empty (identity) ordering.
    pub fn new() -> Self {
        Self::default()
    }

    /// Interprets every active rule once, in list order.
    ///
    /// Each slot remembers the description word that selected its effect,
    /// so a rule worded "budget" is reported as "budget", not "cost".
    pub fn from_rules(rules: &[BusinessRule], interpreter: &AdvisedInterpreter<'_>) -> Self {
        let mut ordering = Self::new();
        let mut session = interpreter.session();
        for rule in rules.iter().filter(|r| r.active) {
            let effect = session.interpret(&rule.description);
            ordering.slots.push(RuleSlot {
                rule_id: rule.id.clone(),
                effect,
                keyword: matched_keyword(&rule.description, effect),
            });
        }
        ordering
    }

    /// Appends an effect attributed to `rule_id`, reported by its canonical
    /// keyword.
    pub fn with_effect(mut self, rule_id: impl Into<String>, effect: RuleEffect) -> Self {
        self.slots.push(RuleSlot {
            rule_id: rule_id.into(),
            effect,
            keyword: effect.keyword(),
        });
        self
    }

    /// Effects in application order.
    pub fn effects(&self) -> impl Iterator<Item = (&str, RuleEffect)> {
        self.slots.iter().map(|s| (s.rule_id.as_str(), s.effect))
    }

    /// Whether no effect can reorder anything.
    pub fn is_identity(&self) -> bool {
        self.slots.iter().all(|s| s.effect.is_inert())
    }

    /// Orders `workers` in place.
    ///
    /// Returns the rules whose effect changed the order, in application
    /// order.
    pub fn order(&self, workers: &mut [&Worker], context: &OrderingContext) -> Vec<Adjustment<'_>> {
        let mut changed = Vec::new();
        for slot in &self.slots {
            // inert effects carry no keyword
            let Some(keyword) = slot.keyword else {
                continue;
            };
            let before: Vec<&Worker> = workers.to_vec();
            workers.sort_by(|a, b| compare(slot.effect, a, b, context));
            let reordered = workers
                .iter()
                .zip(&before)
                .any(|(now, was)| !std::ptr::eq(*now, *was));
            if reordered {
                changed.push(Adjustment {
                    rule_id: &slot.rule_id,
                    keyword,
                });
            }
        }
        changed
    }
}

fn tier(worker: &Worker) -> f64 {
    worker.qualification.tier().unwrap_or(0.0)
}

fn compare(effect: RuleEffect, a: &Worker, b: &Worker, context: &OrderingContext) -> Ordering {
    match effect {
        RuleEffect::QualificationOrder { descending: true } => tier(b).total_cmp(&tier(a)),
        RuleEffect::QualificationOrder { descending: false } | RuleEffect::CostMinimize => {
            tier(a).total_cmp(&tier(b))
        }
        RuleEffect::UtilizationBalance => context
            .utilization_of(&a.id)
            .cmp(&context.utilization_of(&b.id)),
        RuleEffect::GroupAffinity => {
            // members of the client's group first
            let a_in = context.is_client_group(&a.group);
            let b_in = context.is_client_group(&b.group);
            b_in.cmp(&a_in)
        }
        RuleEffect::Inert => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Qualification;

    fn worker(id: &str, level: i64, group: &str) -> Worker {
        Worker::new(id)
            .with_qualification(Qualification::Level(level))
            .with_group(group)
    }

    fn ids(workers: &[&Worker]) -> Vec<String> {
        workers.iter().map(|w| w.id.clone()).collect()
    }

    #[test]
    fn test_qualification_descending() {
        let (a, b, c) = (worker("A", 3, ""), worker("B", 8, ""), worker("C", 5, ""));
        let mut list = vec![&a, &b, &c];
        let ordering =
            WorkerOrdering::new().with_effect("R1", RuleEffect::QualificationOrder { descending: true });
        let changed = ordering.order(&mut list, &OrderingContext::new());
        assert_eq!(ids(&list), vec!["B", "C", "A"]);
        assert_eq!(
            changed,
            vec![Adjustment {
                rule_id: "R1",
                keyword: "senior"
            }]
        );
    }

    #[test]
    fn test_cost_minimize() {
        let a = worker("A", 3, "");
        let b = Worker::new("B").with_qualification(Qualification::Title("Architect".into()));
        let c = worker("C", 1, "");
        let mut list = vec![&b, &a, &c];
        WorkerOrdering::new()
            .with_effect("R1", RuleEffect::CostMinimize)
            .order(&mut list, &OrderingContext::new());
        assert_eq!(ids(&list), vec!["C", "A", "B"]);
    }

    #[test]
    fn test_utilization_balance() {
        let (a, b) = (worker("A", 1, ""), worker("B", 1, ""));
        let mut list = vec![&a, &b];
        let ctx = OrderingContext::new().with_utilization("A", 4);
        WorkerOrdering::new()
            .with_effect("R1", RuleEffect::UtilizationBalance)
            .order(&mut list, &ctx);
        assert_eq!(ids(&list), vec!["B", "A"]);
    }

    #[test]
    fn test_group_affinity() {
        let (a, b, c) = (worker("A", 1, "X"), worker("B", 1, "Y"), worker("C", 1, "y"));
        let mut list = vec![&a, &b, &c];
        let ctx = OrderingContext::new().with_client_group("Y");
        WorkerOrdering::new()
            .with_effect("R1", RuleEffect::GroupAffinity)
            .order(&mut list, &ctx);
        assert_eq!(ids(&list), vec!["B", "C", "A"]);
    }

    #[test]
    fn test_earlier_rule_breaks_ties_of_later_rule() {
        // R1 orders by qualification; R2 (group) then decides the primary order.
        let a = worker("A", 2, "G");
        let b = worker("B", 9, "H");
        let c = worker("C", 7, "G");
        let mut list = vec![&a, &b, &c];
        let ctx = OrderingContext::new().with_client_group("G");
        WorkerOrdering::new()
            .with_effect("R1", RuleEffect::QualificationOrder { descending: true })
            .with_effect("R2", RuleEffect::GroupAffinity)
            .order(&mut list, &ctx);
        assert_eq!(ids(&list), vec!["C", "A", "B"]);
    }

    #[test]
    fn test_inert_and_unchanged_orderings_report_nothing() {
        let (a, b) = (worker("A", 9, ""), worker("B", 1, ""));
        let mut list = vec![&a, &b];
        let ordering = WorkerOrdering::new()
            .with_effect("R1", RuleEffect::Inert)
            .with_effect("R2", RuleEffect::QualificationOrder { descending: true });
        assert!(!ordering.is_identity());
        let changed = ordering.order(&mut list, &OrderingContext::new());
        assert!(changed.is_empty());
        assert_eq!(ids(&list), vec!["A", "B"]);
        assert!(WorkerOrdering::new().with_effect("R", RuleEffect::Inert).is_identity());
    }

    #[test]
    fn test_from_rules_skips_inactive() {
        let rules = vec![
            BusinessRule::new("R1", "Prefer senior staff"),
            BusinessRule::new("R2", "Balance load").inactive(),
            BusinessRule::new("R3", "Lunch at noon"),
        ];
        let ordering = WorkerOrdering::from_rules(&rules, &AdvisedInterpreter::new());
        let effects: Vec<_> = ordering.effects().collect();
        assert_eq!(
            effects,
            vec![
                ("R1", RuleEffect::QualificationOrder { descending: true }),
                ("R3", RuleEffect::Inert)
            ]
        );
    }

    #[test]
    fn test_adjustments_name_the_matched_word() {
        let (a, b) = (worker("A", 9, ""), worker("B", 1, "G"));
        let rules = vec![
            BusinessRule::new("R1", "Keep it cheap"),
            BusinessRule::new("R2", "Keep the team together"),
        ];
        let ordering = WorkerOrdering::from_rules(&rules, &AdvisedInterpreter::new());
        let mut list = vec![&a, &b];
        let ctx = OrderingContext::new().with_client_group("G");
        // R1 moves B up; R2 then agrees, so only R1 reorders.
        let changed = ordering.order(&mut list, &ctx);
        assert_eq!(ids(&list), vec!["B", "A"]);
        assert_eq!(
            changed,
            vec![Adjustment {
                rule_id: "R1",
                keyword: "cheap"
            }]
        );

        let mut list = vec![&a, &b];
        let team = WorkerOrdering::from_rules(&rules[1..], &AdvisedInterpreter::new());
        let changed = team.order(&mut list, &ctx);
        assert_eq!(changed[0].keyword, "team");
    }
}
