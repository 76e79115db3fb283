//! Hit policy resolution.
//!
//! Reduces the matching rules of one execution to the final output vectors,
//! or to a `NoMatch` / `HitPolicyConflict` outcome. Matches are always
//! processed in ascending sequence order, so the result depends only on the
//! committed rules and the inputs.

use std::cmp::Ordering;

use crate::types::{
    ColumnSchema, DecisionTable, EngineError, HitPolicy, InputVector, OutputVector, Rule, Value,
};

/// Resolved outputs plus every matching rule id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub outputs: Vec<OutputVector>,
    pub matched_rule_ids: Vec<String>,
}

/// A matching rule with its outputs typed in table column order.
struct Hit<'r> {
    rule: &'r Rule,
    values: Vec<Value>,
}

pub fn resolve(
    table: &DecisionTable,
    inputs: &InputVector,
    matches: &[&Rule],
) -> Result<Resolution, EngineError> {
    let mut ordered: Vec<&Rule> = matches.to_vec();
    ordered.sort_by_key(|r| r.sequence);
    let matched_rule_ids: Vec<String> = ordered.iter().map(|r| r.id.clone()).collect();

    let no_match = || EngineError::NoMatch {
        table_id: table.id().to_string(),
        inputs: inputs.clone(),
    };
    let conflict = || EngineError::HitPolicyConflict {
        table_id: table.id().to_string(),
        matched_rule_ids: matched_rule_ids.clone(),
    };

    let policy = table.hit_policy();
    if ordered.is_empty() {
        return if policy.is_single_hit() {
            Err(no_match())
        } else {
            Ok(Resolution {
                outputs: Vec::new(),
                matched_rule_ids,
            })
        };
    }

    let outputs = match policy {
        HitPolicy::Unique => match ordered.as_slice() {
            [only] => vec![only.outputs.clone()],
            _ => return Err(conflict()),
        },
        HitPolicy::First => {
            let first = ordered.first().ok_or_else(no_match)?;
            vec![first.outputs.clone()]
        }
        HitPolicy::Priority => {
            // Highest priority wins; among equals the earliest rule wins.
            let winner = ordered
                .iter()
                .max_by(|a, b| {
                    a.priority
                        .cmp(&b.priority)
                        .then_with(|| b.sequence.cmp(&a.sequence))
                })
                .ok_or_else(no_match)?;
            vec![winner.outputs.clone()]
        }
        HitPolicy::Any => {
            let hits = typed_hits(table, &ordered)?;
            let first = hits.first().ok_or_else(no_match)?;
            if hits.iter().any(|h| h.values != first.values) {
                return Err(conflict());
            }
            vec![first.rule.outputs.clone()]
        }
        // Each distinct output vector once, so rules that agree on every output
        // collapse into one entry while still being listed in matched_rule_ids.
        HitPolicy::Collect => distinct(typed_hits(table, &ordered)?)
            .into_iter()
            .map(|h| h.rule.outputs.clone())
            .collect(),
        HitPolicy::RuleOrder => ordered.iter().map(|r| r.outputs.clone()).collect(),
        HitPolicy::OutputOrder => {
            let mut hits = distinct(typed_hits(table, &ordered)?);
            let columns: Vec<&ColumnSchema> = table.outputs().collect();
            hits.sort_by(|a, b| {
                compare_rows(&columns, &a.values, &b.values)
                    .then_with(|| a.rule.sequence.cmp(&b.rule.sequence))
            });
            hits.into_iter().map(|h| h.rule.outputs.clone()).collect()
        }
    };

    Ok(Resolution {
        outputs,
        matched_rule_ids,
    })
}

fn typed_hits<'r>(table: &DecisionTable, rules: &[&'r Rule]) -> Result<Vec<Hit<'r>>, EngineError> {
    rules
        .iter()
        .map(|&rule| {
            let values = table
                .outputs()
                .map(|column| {
                    let raw = rule.outputs.get(&column.id).ok_or_else(|| {
                        EngineError::validation(
                            column.id.as_str(),
                            format!("rule {} has no output for this column", rule.id),
                        )
                    })?;
                    Value::parse(raw, column)
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Hit { rule, values })
        })
        .collect()
}

/// Keep the first hit of each value-identical output vector.
fn distinct(hits: Vec<Hit<'_>>) -> Vec<Hit<'_>> {
    let mut kept: Vec<Hit<'_>> = Vec::with_capacity(hits.len());
    for hit in hits {
        if !kept.iter().any(|k| k.values == hit.values) {
            kept.push(hit);
        }
    }
    kept
}

/// Lexicographic over output columns in table order.
fn compare_rows(columns: &[&ColumnSchema], a: &[Value], b: &[Value]) -> Ordering {
    columns
        .iter()
        .zip(a.iter().zip(b.iter()))
        .map(|(column, (x, y))| compare_cells(column, x, y))
        .find(|o| *o != Ordering::Equal)
        .unwrap_or(Ordering::Equal)
}

/// Numbers numerically, booleans `false < true`, labels by domain position
/// when the column has a label domain and lexicographically otherwise.
fn compare_cells(column: &ColumnSchema, a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => match (a.as_label(), b.as_label()) {
            (Some(x), Some(y)) if column.has_label_domain() => {
                let position = |l: &str| column.domain_position(l).unwrap_or(usize::MAX);
                position(x).cmp(&position(y))
            }
            (Some(x), Some(y)) => x.cmp(y),
            _ => Ordering::Equal,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ColumnType, Direction, TableSchema};
    use std::collections::BTreeMap;

    fn table(policy: HitPolicy) -> DecisionTable {
        DecisionTable {
            schema: TableSchema {
                id: "t".into(),
                name: "T".into(),
                column_ids: vec!["x".into(), "grade".into(), "amount".into()],
                hit_policy: policy,
            },
            columns: vec![
                ColumnSchema::new("x", vec![], ColumnType::String, Direction::Input),
                ColumnSchema::new(
                    "grade",
                    vec!["high".into(), "medium".into(), "low".into()],
                    ColumnType::Enum,
                    Direction::Output,
                ),
                ColumnSchema::new("amount", vec![], ColumnType::Number, Direction::Output),
            ],
        }
    }

    fn rule(sequence: u64, priority: i64, grade: &str, amount: &str) -> Rule {
        let mut outputs = BTreeMap::new();
        outputs.insert("grade".to_string(), grade.to_string());
        outputs.insert("amount".to_string(), amount.to_string());
        Rule {
            id: Rule::id_for_sequence(sequence),
            table_id: "t".into(),
            sequence,
            priority,
            inputs: [("x".to_string(), "-".to_string())].into_iter().collect(),
            outputs,
        }
    }

    fn run(policy: HitPolicy, rules: &[Rule]) -> Result<Resolution, EngineError> {
        let refs: Vec<&Rule> = rules.iter().collect();
        resolve(&table(policy), &InputVector::new(), &refs)
    }

    fn grades(res: &Resolution) -> Vec<(String, String)> {
        res.outputs
            .iter()
            .map(|o| (o["grade"].clone(), o["amount"].clone()))
            .collect()
    }

    #[test]
    fn single_hit_policies_fail_on_empty() {
        for policy in [HitPolicy::Unique, HitPolicy::First, HitPolicy::Priority, HitPolicy::Any] {
            let err = run(policy, &[]).unwrap_err();
            assert_eq!(err.code(), "NO_MATCH", "{policy}");
        }
    }

    #[test]
    fn collecting_policies_return_empty() {
        for policy in [HitPolicy::Collect, HitPolicy::RuleOrder, HitPolicy::OutputOrder] {
            let res = run(policy, &[]).unwrap();
            assert!(res.outputs.is_empty());
            assert!(res.matched_rule_ids.is_empty());
        }
    }

    #[test]
    fn unique_conflict_names_all_matches() {
        let rules = [rule(0, 0, "high", "1"), rule(3, 0, "low", "2"), rule(1, 0, "low", "3")];
        let err = run(HitPolicy::Unique, &rules).unwrap_err();
        assert_eq!(
            err,
            EngineError::HitPolicyConflict {
                table_id: "t".into(),
                matched_rule_ids: vec!["rule1".into(), "rule2".into(), "rule4".into()],
            }
        );
    }

    #[test]
    fn first_takes_lowest_sequence_even_if_unsorted() {
        let rules = [rule(5, 0, "low", "1"), rule(2, 0, "high", "2")];
        let res = run(HitPolicy::First, &rules).unwrap();
        assert_eq!(grades(&res), [("high".to_string(), "2".to_string())]);
        assert_eq!(res.matched_rule_ids, ["rule3", "rule6"]);
    }

    #[test]
    fn priority_max_then_earliest() {
        let rules = [
            rule(0, 1, "low", "1"),
            rule(1, 7, "medium", "2"),
            rule(2, 7, "high", "3"),
        ];
        let res = run(HitPolicy::Priority, &rules).unwrap();
        assert_eq!(grades(&res), [("medium".to_string(), "2".to_string())]);
    }

    #[test]
    fn any_requires_value_equal_outputs() {
        let agree = [rule(0, 0, "low", "1.0"), rule(1, 0, "low", "1")];
        let res = run(HitPolicy::Any, &agree).unwrap();
        assert_eq!(grades(&res), [("low".to_string(), "1.0".to_string())]);
        assert_eq!(res.matched_rule_ids.len(), 2);

        let disagree = [rule(0, 0, "low", "1"), rule(1, 0, "low", "2")];
        assert_eq!(run(HitPolicy::Any, &disagree).unwrap_err().code(), "HIT_POLICY_CONFLICT");
    }

    #[test]
    fn collect_cardinality_counts_distinct_outputs_not_rules() {
        let rules = [
            rule(0, 0, "low", "1"),
            rule(1, 0, "low", "1.00"),
            rule(2, 0, "high", "1"),
        ];
        let res = run(HitPolicy::Collect, &rules).unwrap();
        assert_eq!(res.matched_rule_ids, ["rule1", "rule2", "rule3"]);
        assert_eq!(
            grades(&res),
            [
                ("low".to_string(), "1".to_string()),
                ("high".to_string(), "1".to_string()),
            ]
        );
    }

    #[test]
    fn collect_deduplicates_rule_order_does_not() {
        let rules = [
            rule(0, 0, "low", "1"),
            rule(1, 0, "high", "2"),
            rule(2, 0, "low", "1"),
        ];
        let collect = run(HitPolicy::Collect, &rules).unwrap();
        assert_eq!(collect.outputs.len(), 2);
        assert_eq!(collect.matched_rule_ids.len(), 3);

        let ordered = run(HitPolicy::RuleOrder, &rules).unwrap();
        assert_eq!(
            grades(&ordered),
            [
                ("low".to_string(), "1".to_string()),
                ("high".to_string(), "2".to_string()),
                ("low".to_string(), "1".to_string()),
            ]
        );
    }

    #[test]
    fn output_order_sorts_by_domain_then_number() {
        let rules = [
            rule(0, 0, "low", "5"),
            rule(1, 0, "high", "20"),
            rule(2, 0, "medium", "1"),
            rule(3, 0, "high", "3"),
        ];
        let res = run(HitPolicy::OutputOrder, &rules).unwrap();
        assert_eq!(
            grades(&res),
            [
                ("high".to_string(), "3".to_string()),
                ("high".to_string(), "20".to_string()),
                ("medium".to_string(), "1".to_string()),
                ("low".to_string(), "5".to_string()),
            ]
        );
    }

    #[test]
    fn compare_cells_by_type() {
        let open = ColumnSchema::new("s", vec![], ColumnType::String, Direction::Output);
        assert_eq!(
            compare_cells(&open, &Value::Text("b".into()), &Value::Text("a".into())),
            Ordering::Greater
        );
        let flag = ColumnSchema::new("f", vec![], ColumnType::Boolean, Direction::Output);
        assert_eq!(
            compare_cells(&flag, &Value::Bool(false), &Value::Bool(true)),
            Ordering::Less
        );
    }
}
