use std::collections::{BTreeSet, HashMap};

use tracing::{debug, trace};

use crate::error::QueryError;
use crate::event::{AndClause, Condition, Event};
use crate::network::BayesNetwork;

/// A (possibly partial) assignment of values to variables.
pub type Assignment<'a> = HashMap<&'a str, &'a str>;

/// Values of `domain` that satisfy every condition in `conditions`.
///
/// Conditions compose by repeated filtering, so the result is the
/// intersection of what each condition admits.
#[must_use]
pub fn allowed_values<'d>(domain: &'d BTreeSet<String>, conditions: &BTreeSet<Condition>) -> Vec<&'d str> {
    domain
        .iter()
        .map(String::as_str)
        .filter(|value| conditions.iter().all(|c| c.admits(value)))
        .collect()
}

/// `P(event)`; disjunctions are expanded with inclusion-exclusion on the
/// first clause: `P(A or B) = P(A) + P(B) - P(A and B)`.
pub(crate) fn event_probability(network: &BayesNetwork, event: &Event) -> Result<f64, QueryError> {
    match event.clauses() {
        [] => Ok(0.0),
        [only] => clause_probability(network, only),
        [first, rest @ ..] => {
            let head = Event::from(first.clone());
            let tail = Event::from_clauses(rest.iter().cloned());
            let overlap = Event::and(&head, &tail);
            Ok(event_probability(network, &head)? + event_probability(network, &tail)?
                - event_probability(network, &overlap)?)
        }
    }
}

fn clause_probability(network: &BayesNetwork, clause: &AndClause) -> Result<f64, QueryError> {
    let mut assignment: Assignment<'_> = HashMap::with_capacity(network.len());
    let mut remaining: Vec<(&str, Vec<&str>)> = Vec::new();

    // Every variable must resolve before the unsatisfiable short-circuit.
    let constrained = clause
        .conditions()
        .iter()
        .map(|(variable, conditions)| {
            network
                .distribution(variable)
                .map(|distribution| (distribution, conditions))
                .ok_or_else(|| QueryError::UnknownVariable {
                    variable: variable.clone(),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    for (distribution, conditions) in constrained {
        let variable = distribution.variable();
        let allowed = allowed_values(distribution.values(), conditions);
        match allowed.len() {
            0 => {
                debug!(variable, "clause is unsatisfiable");
                return Ok(0.0);
            }
            1 => {
                assignment.insert(variable, allowed[0]);
            }
            _ => remaining.push((variable, allowed)),
        }
    }

    for distribution in network.distributions() {
        if !clause.mentions(distribution.variable()) {
            let domain = distribution.values().iter().map(String::as_str).collect();
            remaining.push((distribution.variable(), domain));
        }
    }

    trace!(
        pinned = assignment.len(),
        free = remaining.len(),
        assignments = remaining
            .iter()
            .fold(1usize, |acc, (_, values)| acc.saturating_mul(values.len())),
        "enumerating clause"
    );
    enumerate(network, &mut assignment, &remaining)
}

/// Branches on the first unresolved variable and recurses on the rest.
fn enumerate<'n>(
    network: &'n BayesNetwork,
    assignment: &mut Assignment<'n>,
    remaining: &[(&'n str, Vec<&'n str>)],
) -> Result<f64, QueryError> {
    let Some(((variable, values), rest)) = remaining.split_first() else {
        return joint_probability(network, assignment);
    };

    let mut total = 0.0;
    for value in values {
        assignment.insert(*variable, *value);
        total += enumerate(network, assignment, rest)?;
    }
    assignment.remove(variable);
    Ok(total)
}

pub(crate) fn joint_probability(network: &BayesNetwork, assignment: &Assignment<'_>) -> Result<f64, QueryError> {
    let lookup = |variable: &str| {
        assignment
            .get(variable)
            .copied()
            .ok_or_else(|| QueryError::IncompleteAssignment {
                variable: variable.to_string(),
            })
    };

    let mut result = 1.0;
    let mut parent_values = Vec::new();
    for distribution in network.distributions() {
        let value = lookup(distribution.variable())?;
        parent_values.clear();
        for parent in distribution.parents() {
            parent_values.push(lookup(parent)?);
        }
        let probability = distribution
            .probability(value, &parent_values)
            .ok_or_else(|| QueryError::MissingProbability {
                variable: distribution.variable().to_string(),
                key: std::iter::once(value)
                    .chain(parent_values.iter().copied())
                    .map(str::to_string)
                    .collect(),
            })?;
        result *= probability;
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distribution::ConditionalDistribution;

    fn network() -> BayesNetwork {
        BayesNetwork::builder()
            .add(
                ConditionalDistribution::for_variable("X")
                    .prior(0.2, "X1")
                    .prior(0.3, "X2")
                    .prior(0.5, "X3")
                    .build()
                    .unwrap(),
            )
            .add(
                ConditionalDistribution::for_variable("Y")
                    .prior(0.05, "Y1")
                    .prior(0.25, "Y2")
                    .prior(0.7, "Y3")
                    .build()
                    .unwrap(),
            )
            .build()
            .unwrap()
    }

    fn domain(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn allowed_values_filters_by_every_condition() {
        let d = domain(&["A", "B", "C"]);
        let none = BTreeSet::new();
        assert_eq!(allowed_values(&d, &none), vec!["A", "B", "C"]);

        let not_a_not_b = BTreeSet::from([Condition::not_equal("A"), Condition::not_equal("B")]);
        assert_eq!(allowed_values(&d, &not_a_not_b), vec!["C"]);

        let conflicting = BTreeSet::from([Condition::equal("A"), Condition::equal("B")]);
        assert!(allowed_values(&d, &conflicting).is_empty());

        let unknown = BTreeSet::from([Condition::equal("Z")]);
        assert!(allowed_values(&d, &unknown).is_empty());
    }

    #[test]
    fn empty_event_is_zero() {
        assert_eq!(event_probability(&network(), &Event::always_false()).unwrap(), 0.0);
    }

    #[test]
    fn empty_clause_is_one() {
        let p = event_probability(&network(), &Event::always_true()).unwrap();
        assert!((p - 1.0).abs() < 1e-12);
    }

    #[test]
    fn unsatisfiable_clause_is_zero() {
        let e = Event::and(&Event::var_equals("X", "X1"), &Event::var_equals("X", "X2"));
        assert_eq!(event_probability(&network(), &e).unwrap(), 0.0);
    }

    #[test]
    fn not_equal_sums_remaining_values() {
        let e = Event::var_not_equals("X", "X1");
        let p = event_probability(&network(), &e).unwrap();
        assert!((p - 0.8).abs() < 1e-12);
    }

    #[test]
    fn inclusion_exclusion_on_overlapping_clauses() {
        let e = Event::or(&Event::var_equals("X", "X3"), &Event::var_equals("Y", "Y2"));
        let p = event_probability(&network(), &e).unwrap();
        assert!((p - 5.0 / 8.0).abs() < 1e-12);
    }

    #[test]
    fn unknown_variable_aborts() {
        let e = Event::var_equals("Q", "Q1");
        assert_eq!(
            event_probability(&network(), &e),
            Err(QueryError::UnknownVariable {
                variable: "Q".to_string()
            })
        );
    }

    #[test]
    fn unknown_variable_beats_unsatisfiable_clause() {
        // "Z" sorts after "X", whose conditions alone make the clause impossible.
        let impossible_x = Event::var_equals("X", "X1") & Event::var_equals("X", "X2");
        let e = impossible_x & Event::var_equals("Z", "z");
        assert!(matches!(
            event_probability(&network(), &e),
            Err(QueryError::UnknownVariable { variable }) if variable == "Z"
        ));

        let e = Event::var_equals("X", "nope") & Event::var_equals("Z", "z");
        assert!(matches!(
            event_probability(&network(), &e),
            Err(QueryError::UnknownVariable { variable }) if variable == "Z"
        ));
    }

    #[test]
    fn missing_entry_aborts() {
        let incomplete = BayesNetwork::builder()
            .add(
                ConditionalDistribution::for_variable("X")
                    .prior(0.5, "X1")
                    .prior(0.5, "X2")
                    .build()
                    .unwrap(),
            )
            .add(
                ConditionalDistribution::for_variable("Y")
                    .parents(["X"])
                    .probability(1.0, "Y1", ["X1"])
                    .build()
                    .unwrap(),
            )
            .build()
            .unwrap();

        let err = event_probability(&incomplete, &Event::var_equals("Y", "Y1")).unwrap_err();
        assert_eq!(
            err,
            QueryError::MissingProbability {
                variable: "Y".to_string(),
                key: vec!["Y1".to_string(), "X2".to_string()],
            }
        );
    }
}
