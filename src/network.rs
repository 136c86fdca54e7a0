//! Bayesian networks and their probability queries.
//!
//! A [`BayesNetwork`] is an ordered list of [`ConditionalDistribution`]s,
//! one per variable. Parent lists define the edges of the underlying DAG.
//! The network is immutable once built and can be shared across threads.

use std::collections::{BTreeSet, HashMap, VecDeque};

use tracing::debug;

use crate::distribution::ConditionalDistribution;
use crate::error::{QueryError, ValidationError};
use crate::event::Event;
use crate::inference::{self, Assignment};

/// A discrete Bayesian network.
///
/// # Examples
///
/// ```
/// use bayesq::{BayesNetwork, ConditionalDistribution, Event};
///
/// let network = BayesNetwork::builder()
///     .add(ConditionalDistribution::for_variable("Rain")
///         .prior(0.2, "yes")
///         .prior(0.8, "no")
///         .build()
///         .unwrap())
///     .add(ConditionalDistribution::for_variable("Grass")
///         .parents(["Rain"])
///         .probability(0.9, "wet", ["yes"])
///         .probability(0.1, "dry", ["yes"])
///         .probability(0.2, "wet", ["no"])
///         .probability(0.8, "dry", ["no"])
///         .build()
///         .unwrap())
///     .build()
///     .unwrap();
///
/// let wet = Event::var_equals("Grass", "wet");
/// let p = network.query_probability(&wet).unwrap();
/// assert!((p - 0.34).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct BayesNetwork {
    distributions: Vec<ConditionalDistribution>,
    index: HashMap<String, usize>,
    order: Vec<usize>,
}

impl BayesNetwork {
    /// Creates an empty network builder.
    #[must_use]
    pub fn builder() -> BayesNetworkBuilder {
        BayesNetworkBuilder::new()
    }

    /// All distributions, in declaration order.
    #[must_use]
    pub fn distributions(&self) -> &[ConditionalDistribution] {
        &self.distributions
    }

    /// The distribution owning `variable`.
    #[must_use]
    pub fn distribution(&self, variable: &str) -> Option<&ConditionalDistribution> {
        self.index.get(variable).map(|&i| &self.distributions[i])
    }

    /// Variable names, in declaration order.
    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.distributions.iter().map(ConditionalDistribution::variable)
    }

    /// The domain of `variable`.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::UnknownVariable`] if the network has no such variable.
    pub fn values(&self, variable: &str) -> Result<&BTreeSet<String>, QueryError> {
        self.distribution(variable)
            .map(ConditionalDistribution::values)
            .ok_or_else(|| QueryError::UnknownVariable {
                variable: variable.to_string(),
            })
    }

    /// Variables ordered so that every parent precedes its children.
    ///
    /// Ties are broken by declaration order.
    #[must_use]
    pub fn topological_order(&self) -> Vec<&str> {
        self.order
            .iter()
            .map(|&i| self.distributions[i].variable())
            .collect()
    }

    /// Number of variables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.distributions.len()
    }

    /// Returns true if the network has no variables.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.distributions.is_empty()
    }

    /// Computes `P(event)` by exact enumeration.
    ///
    /// # Errors
    ///
    /// Fails if the event mentions a variable outside the network, or if a
    /// table lacks an entry for some assignment that must be summed.
    pub fn query_probability(&self, event: &Event) -> Result<f64, QueryError> {
        debug!(
            clauses = event.clauses().len(),
            variables = self.len(),
            "querying event probability"
        );
        self.check_variables(event)?;
        let p = inference::event_probability(self, event)?;
        Ok(p.clamp(0.0, 1.0))
    }

    /// Computes `P(event | evidence)` using Bayes' rule.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::ZeroProbabilityEvidence`] when the evidence is
    /// impossible, plus any error of [`Self::query_probability`].
    pub fn query_conditional(&self, event: &Event, evidence: &Event) -> Result<f64, QueryError> {
        self.check_variables(event)?;
        let evidence_p = self.query_probability(evidence)?;
        if evidence_p == 0.0 {
            return Err(QueryError::ZeroProbabilityEvidence);
        }
        let joint = self.query_probability(&Event::and(event, evidence))?;
        Ok((joint / evidence_p).clamp(0.0, 1.0))
    }

    /// Fails on the first variable, in name order, that the network lacks.
    fn check_variables(&self, event: &Event) -> Result<(), QueryError> {
        match event.variables().into_iter().find(|v| !self.index.contains_key(*v)) {
            Some(variable) => Err(QueryError::UnknownVariable {
                variable: variable.to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Product of every variable's conditional probability under a full
    /// assignment.
    ///
    /// # Errors
    ///
    /// Fails if the assignment misses a variable or a table lacks the entry.
    pub fn joint_probability(&self, assignment: &Assignment<'_>) -> Result<f64, QueryError> {
        inference::joint_probability(self, assignment)
    }
}

/// Builder for [`BayesNetwork`].
#[derive(Debug, Default, Clone)]
pub struct BayesNetworkBuilder {
    distributions: Vec<ConditionalDistribution>,
}

impl BayesNetworkBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a distribution.
    #[must_use]
    pub fn add(mut self, distribution: ConditionalDistribution) -> Self {
        self.distributions.push(distribution);
        self
    }

    /// Appends several distributions.
    #[must_use]
    pub fn extend(mut self, distributions: impl IntoIterator<Item = ConditionalDistribution>) -> Self {
        self.distributions.extend(distributions);
        self
    }

    /// Validates the structure and freezes the network.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] for duplicate variables, parents that
    /// are not part of the network, or cyclic parent relations.
    pub fn build(self) -> Result<BayesNetwork, ValidationError> {
        let mut index = HashMap::with_capacity(self.distributions.len());
        for (i, dist) in self.distributions.iter().enumerate() {
            if index.insert(dist.variable().to_string(), i).is_some() {
                return Err(ValidationError::DuplicateVariable {
                    variable: dist.variable().to_string(),
                });
            }
        }

        for dist in &self.distributions {
            for parent in dist.parents() {
                if !index.contains_key(parent) {
                    return Err(ValidationError::UnknownParent {
                        variable: dist.variable().to_string(),
                        parent: parent.clone(),
                    });
                }
            }
        }

        let order = topological_sort(&self.distributions, &index)?;
        debug!(variables = self.distributions.len(), "built bayes network");

        Ok(BayesNetwork {
            distributions: self.distributions,
            index,
            order,
        })
    }
}

/// Kahn's algorithm over the parent edges.
fn topological_sort(
    distributions: &[ConditionalDistribution],
    index: &HashMap<String, usize>,
) -> Result<Vec<usize>, ValidationError> {
    let mut pending: Vec<usize> = distributions.iter().map(|d| d.parents().len()).collect();
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); distributions.len()];
    for (child, dist) in distributions.iter().enumerate() {
        for parent in dist.parents() {
            children[index[parent]].push(child);
        }
    }

    let mut ready: VecDeque<usize> = (0..distributions.len()).filter(|&i| pending[i] == 0).collect();
    let mut order = Vec::with_capacity(distributions.len());
    while let Some(i) = ready.pop_front() {
        order.push(i);
        for &child in &children[i] {
            pending[child] -= 1;
            if pending[child] == 0 {
                ready.push_back(child);
            }
        }
    }

    if order.len() < distributions.len() {
        let mut variables: Vec<String> = (0..distributions.len())
            .filter(|&i| pending[i] > 0)
            .map(|i| distributions[i].variable().to_string())
            .collect();
        variables.sort();
        return Err(ValidationError::Cycle { variables });
    }
    Ok(order)
}
