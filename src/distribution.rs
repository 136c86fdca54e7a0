//! Conditional probability tables.
//!
//! A [`ConditionalDistribution`] holds `P(variable = v | parents = p...)`
//! keyed by `(v, p1, ..., pk)`. The variable's domain is never declared; it
//! is whatever appears as the first key component.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::error::ValidationError;

/// Maximum deviation from 1 tolerated when checking that a table row sums
/// to one.
pub const DEFAULT_NORMALIZATION_TOLERANCE: f64 = 1e-6;

/// One variable's conditional probability table.
///
/// # Examples
///
/// ```
/// use bayesq::ConditionalDistribution;
///
/// let reveal = ConditionalDistribution::for_variable("Reveal1")
///     .parents(["InitialChoice"])
///     .probability(1.0, "T", ["TT"])
///     .probability(0.0, "L", ["TT"])
///     .probability(0.5, "T", ["TL"])
///     .probability(0.5, "L", ["TL"])
///     .build()
///     .unwrap();
///
/// assert_eq!(reveal.probability("L", &["TL"]), Some(0.5));
/// assert!(reveal.values().contains("T"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionalDistribution {
    variable: String,
    parents: Vec<String>,
    probabilities: BTreeMap<Vec<String>, f64>,
    values: BTreeSet<String>,
    cells: CellIndex,
    tolerance: Option<f64>,
}

impl ConditionalDistribution {
    /// Starts building the distribution of `variable`.
    #[must_use]
    pub fn for_variable(variable: impl Into<String>) -> DistributionBuilder {
        DistributionBuilder::new(variable)
    }

    /// The variable this table belongs to.
    #[must_use]
    pub fn variable(&self) -> &str {
        &self.variable
    }

    /// Parent variables, in key order.
    #[must_use]
    pub fn parents(&self) -> &[String] {
        &self.parents
    }

    /// The full table keyed by `(value, parent values...)`.
    #[must_use]
    pub fn probabilities(&self) -> &BTreeMap<Vec<String>, f64> {
        &self.probabilities
    }

    /// The values this variable can take: every first key component.
    #[must_use]
    pub fn values(&self) -> &BTreeSet<String> {
        &self.values
    }

    /// Looks up `P(variable = value | parents = parent_values)`.
    ///
    /// `parent_values` must follow the order of [`Self::parents`].
    #[must_use]
    pub fn probability(&self, value: &str, parent_values: &[&str]) -> Option<f64> {
        self.cells.get(value, parent_values)
    }

    /// The row-sum tolerance this table was validated with, or `None` if
    /// it was built with [`DistributionBuilder::allow_unnormalized`].
    #[must_use]
    pub fn normalization_tolerance(&self) -> Option<f64> {
        self.tolerance
    }

    /// Returns true if every parent-value row sums to one within `tolerance`.
    #[must_use]
    pub fn is_normalized(&self, tolerance: f64) -> bool {
        row_sums(self.probabilities.iter())
            .values()
            .all(|sum| (sum - 1.0).abs() <= tolerance)
    }
}

/// Sums the probabilities of each parent-value combination.
fn row_sums<'a>(entries: impl Iterator<Item = (&'a Vec<String>, &'a f64)>) -> BTreeMap<&'a [String], f64> {
    let mut rows: BTreeMap<&[String], f64> = BTreeMap::new();
    for (key, probability) in entries {
        *rows.entry(&key[1..]).or_insert(0.0) += probability;
    }
    rows
}

/// Dense lookup table over the key components seen in the entries.
///
/// Each key position interns its strings to indices; a key maps to a cell
/// by mixed-radix offset, so lookups borrow the caller's `&str`s.
#[derive(Debug, Clone, PartialEq)]
struct CellIndex {
    positions: Vec<HashMap<String, usize>>,
    strides: Vec<usize>,
    cells: Vec<Option<f64>>,
}

impl CellIndex {
    fn new(arity: usize, probabilities: &BTreeMap<Vec<String>, f64>) -> Self {
        let mut positions: Vec<HashMap<String, usize>> = vec![HashMap::new(); arity];
        for key in probabilities.keys() {
            for (position, part) in positions.iter_mut().zip(key) {
                let next = position.len();
                position.entry(part.clone()).or_insert(next);
            }
        }

        let mut strides = vec![1; arity];
        for i in (0..arity.saturating_sub(1)).rev() {
            strides[i] = strides[i + 1] * positions[i + 1].len();
        }
        let size = positions.first().map_or(0, |p| p.len() * strides[0]);

        let mut index = Self {
            positions,
            strides,
            cells: vec![None; size],
        };
        for (key, &probability) in probabilities {
            if let Some(offset) = index.offset(key.iter().map(String::as_str)) {
                index.cells[offset] = Some(probability);
            }
        }
        index
    }

    fn offset<'a>(&self, key: impl Iterator<Item = &'a str>) -> Option<usize> {
        let mut offset = 0;
        let mut len = 0;
        for ((part, position), stride) in key.zip(&self.positions).zip(&self.strides) {
            offset += position.get(part)? * stride;
            len += 1;
        }
        (len == self.positions.len()).then_some(offset)
    }

    fn get(&self, value: &str, parent_values: &[&str]) -> Option<f64> {
        if parent_values.len() + 1 != self.positions.len() {
            return None;
        }
        let key = std::iter::once(value).chain(parent_values.iter().copied());
        self.offset(key).and_then(|offset| self.cells[offset])
    }
}

/// Mutable builder for [`ConditionalDistribution`].
///
/// Entries may be added before or after the parents are declared; all
/// validation happens in [`DistributionBuilder::build`]. Setting the same
/// key twice keeps the last probability.
#[derive(Debug, Clone)]
pub struct DistributionBuilder {
    variable: String,
    parents: Vec<String>,
    entries: BTreeMap<Vec<String>, f64>,
    tolerance: f64,
    check_normalization: bool,
}

impl DistributionBuilder {
    /// Creates a builder for `variable`.
    #[must_use]
    pub fn new(variable: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
            parents: Vec::new(),
            entries: BTreeMap::new(),
            tolerance: DEFAULT_NORMALIZATION_TOLERANCE,
            check_normalization: true,
        }
    }

    /// Declares the parent variables, replacing any earlier declaration.
    #[must_use]
    pub fn parents<I, S>(mut self, parents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parents = parents.into_iter().map(Into::into).collect();
        self
    }

    /// Sets `P(variable = value | parents = parent_values)`.
    #[must_use]
    pub fn probability<I, S>(mut self, probability: f64, value: impl Into<String>, parent_values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut key = vec![value.into()];
        key.extend(parent_values.into_iter().map(Into::into));
        self.entries.insert(key, probability);
        self
    }

    /// Sets `P(variable = value)` for a variable without parents.
    #[must_use]
    pub fn prior(self, probability: f64, value: impl Into<String>) -> Self {
        self.probability(probability, value, std::iter::empty::<String>())
    }

    /// Overrides the tolerance used by the normalization check.
    #[must_use]
    pub fn normalization_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Skips the check that each table row sums to one.
    #[must_use]
    pub fn allow_unnormalized(mut self) -> Self {
        self.check_normalization = false;
        self
    }

    /// Validates and freezes the table.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] when the name is empty, the parents are
    /// malformed, an entry has the wrong number of parent values or an
    /// invalid probability, or (unless disabled) a row does not sum to one.
    pub fn build(self) -> Result<ConditionalDistribution, ValidationError> {
        if self.variable.is_empty() {
            return Err(ValidationError::EmptyVariableName);
        }
        self.validate_parents()?;
        if self.entries.is_empty() {
            return Err(ValidationError::EmptyDistribution {
                variable: self.variable,
            });
        }

        let expected = self.parents.len();
        for (key, probability) in &self.entries {
            let actual = key.len() - 1;
            if actual != expected {
                return Err(ValidationError::ParentArity {
                    variable: self.variable.clone(),
                    key: key.clone(),
                    expected,
                    actual,
                });
            }
            if !probability.is_finite() || !(0.0..=1.0).contains(probability) {
                return Err(ValidationError::ProbabilityOutOfRange {
                    variable: self.variable.clone(),
                    key: key.clone(),
                    probability: *probability,
                });
            }
        }

        if self.check_normalization {
            self.validate_normalized()?;
        }

        let values = self.entries.keys().map(|key| key[0].clone()).collect();
        let cells = CellIndex::new(expected + 1, &self.entries);
        Ok(ConditionalDistribution {
            variable: self.variable,
            parents: self.parents,
            probabilities: self.entries,
            values,
            cells,
            tolerance: self.check_normalization.then_some(self.tolerance),
        })
    }

    fn validate_parents(&self) -> Result<(), ValidationError> {
        let mut seen = BTreeSet::new();
        for parent in &self.parents {
            if parent.is_empty() {
                return Err(ValidationError::EmptyVariableName);
            }
            if *parent == self.variable {
                return Err(ValidationError::SelfParent {
                    variable: self.variable.clone(),
                });
            }
            if !seen.insert(parent.as_str()) {
                return Err(ValidationError::DuplicateParent {
                    variable: self.variable.clone(),
                    parent: parent.clone(),
                });
            }
        }
        Ok(())
    }

    fn validate_normalized(&self) -> Result<(), ValidationError> {
        let rows = row_sums(self.entries.iter());
        for (parent_values, sum) in rows {
            if (sum - 1.0).abs() > self.tolerance {
                return Err(ValidationError::NotNormalized {
                    variable: self.variable.clone(),
                    parent_values: parent_values.to_vec(),
                    sum,
                });
            }
        }
        Ok(())
    }
}
