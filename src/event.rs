//! Event algebra over discrete random variables.
//!
//! An [`Event`] is kept in disjunctive normal form at all times: an OR of
//! [`AndClause`]s, each of which maps a variable to the set of
//! [`Condition`]s it must satisfy. AND distributes over the clause lists,
//! OR concatenates them and NOT applies De Morgan's laws, so every result
//! is again an OR of ANDs and the inference engine never sees a nested
//! expression.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::ops::{BitAnd, BitOr, Not};

use serde::{Deserialize, Serialize};

/// Whether a condition requires or excludes a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionKind {
    /// The variable must take the value.
    Equal,
    /// The variable must not take the value.
    NotEqual,
}

impl ConditionKind {
    /// Returns the opposite kind.
    #[must_use]
    pub const fn negate(self) -> Self {
        match self {
            Self::Equal => Self::NotEqual,
            Self::NotEqual => Self::Equal,
        }
    }
}

impl fmt::Display for ConditionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equal => write!(f, "="),
            Self::NotEqual => write!(f, "!="),
        }
    }
}

/// A constraint on a single variable's value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Condition {
    /// Equality or inequality.
    pub kind: ConditionKind,
    /// The value being compared against.
    pub value: String,
}

impl Condition {
    /// Creates an equality condition.
    #[must_use]
    pub fn equal(value: impl Into<String>) -> Self {
        Self {
            kind: ConditionKind::Equal,
            value: value.into(),
        }
    }

    /// Creates an inequality condition.
    #[must_use]
    pub fn not_equal(value: impl Into<String>) -> Self {
        Self {
            kind: ConditionKind::NotEqual,
            value: value.into(),
        }
    }

    /// Returns the logical negation of this condition.
    #[must_use]
    pub fn negate(&self) -> Self {
        Self {
            kind: self.kind.negate(),
            value: self.value.clone(),
        }
    }

    /// Returns true if `value` satisfies this condition.
    #[must_use]
    pub fn admits(&self, value: &str) -> bool {
        match self.kind {
            ConditionKind::Equal => self.value == value,
            ConditionKind::NotEqual => self.value != value,
        }
    }
}

/// A conjunction of per-variable conditions.
///
/// Conditions registered for the same variable accumulate; they narrow the
/// allowed values rather than replacing each other. Satisfiability is not
/// checked here; an impossible clause simply has probability zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AndClause {
    conditions: BTreeMap<String, BTreeSet<Condition>>,
}

impl AndClause {
    /// An empty clause, which is always true.
    #[must_use]
    pub fn always_true() -> Self {
        Self::default()
    }

    /// Creates a clause from a variable -> conditions map.
    #[must_use]
    pub fn of(conditions: BTreeMap<String, BTreeSet<Condition>>) -> Self {
        let conditions = conditions
            .into_iter()
            .filter(|(_, set)| !set.is_empty())
            .collect();
        Self { conditions }
    }

    /// A clause constraining `variable` to equal `value`.
    #[must_use]
    pub fn equal(variable: impl Into<String>, value: impl Into<String>) -> Self {
        Self::always_true().with(variable, Condition::equal(value))
    }

    /// A clause constraining `variable` to differ from `value`.
    #[must_use]
    pub fn not_equal(variable: impl Into<String>, value: impl Into<String>) -> Self {
        Self::always_true().with(variable, Condition::not_equal(value))
    }

    /// Adds a condition for `variable`.
    #[must_use]
    pub fn with(mut self, variable: impl Into<String>, condition: Condition) -> Self {
        self.conditions
            .entry(variable.into())
            .or_default()
            .insert(condition);
        self
    }

    /// Returns the variable -> conditions map.
    #[must_use]
    pub fn conditions(&self) -> &BTreeMap<String, BTreeSet<Condition>> {
        &self.conditions
    }

    /// Returns the conditions registered for `variable`, if any.
    #[must_use]
    pub fn conditions_for(&self, variable: &str) -> Option<&BTreeSet<Condition>> {
        self.conditions.get(variable)
    }

    /// Iterates over the constrained variables in name order.
    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.conditions.keys().map(String::as_str)
    }

    /// Returns true if `variable` is constrained by this clause.
    #[must_use]
    pub fn mentions(&self, variable: &str) -> bool {
        self.conditions.contains_key(variable)
    }

    /// Returns true if the clause has no conditions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Total number of conditions across all variables.
    #[must_use]
    pub fn condition_count(&self) -> usize {
        self.conditions.values().map(BTreeSet::len).sum()
    }

    /// Logical negation of this clause.
    ///
    /// `NOT (c1 AND c2 AND ...)` becomes `(NOT c1) OR (NOT c2) OR ...`, one
    /// single-condition clause per condition. The empty clause negates to
    /// the empty disjunction.
    #[must_use]
    pub fn negate(&self) -> Event {
        let clauses = self.conditions.iter().flat_map(|(variable, conditions)| {
            conditions
                .iter()
                .map(move |c| Self::always_true().with(variable.clone(), c.negate()))
        });
        Event::from_clauses(clauses)
    }

    /// Conjunction of two clauses; per-variable condition sets are unioned.
    #[must_use]
    pub fn concat(a: &Self, b: &Self) -> Self {
        let mut merged = a.clone();
        for (variable, conditions) in &b.conditions {
            merged
                .conditions
                .entry(variable.clone())
                .or_default()
                .extend(conditions.iter().cloned());
        }
        merged
    }
}

impl fmt::Display for AndClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.conditions.is_empty() {
            return write!(f, "TRUE");
        }
        let mut first = true;
        for (variable, conditions) in &self.conditions {
            for condition in conditions {
                if !first {
                    write!(f, " AND ")?;
                }
                first = false;
                write!(f, "{variable} {} {}", condition.kind, condition.value)?;
            }
        }
        Ok(())
    }
}

/// A probabilistic event: a disjunction of [`AndClause`]s.
///
/// # Examples
///
/// ```
/// use bayesq::Event;
///
/// let survived = Event::and(
///     &Event::var_equals("Reveal1", "L"),
///     &Event::var_equals("Reveal2", "L"),
/// );
/// assert_eq!(survived.clauses().len(), 1);
///
/// let either = Event::or(&Event::var_equals("X", "A"), &Event::var_equals("Y", "B"));
/// assert_eq!(Event::not(&either).to_string(), "X != A AND Y != B");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Event {
    clauses: Vec<AndClause>,
}

impl Event {
    /// Builds an event from zero or more clauses.
    #[must_use]
    pub fn from_clauses(clauses: impl IntoIterator<Item = AndClause>) -> Self {
        Self {
            clauses: clauses.into_iter().collect(),
        }
    }

    /// `variable = value`.
    #[must_use]
    pub fn var_equals(variable: impl Into<String>, value: impl Into<String>) -> Self {
        Self::from_clauses([AndClause::equal(variable, value)])
    }

    /// `variable != value`.
    #[must_use]
    pub fn var_not_equals(variable: impl Into<String>, value: impl Into<String>) -> Self {
        Self::from_clauses([AndClause::not_equal(variable, value)])
    }

    /// A single empty clause: always true.
    #[must_use]
    pub fn always_true() -> Self {
        Self::from_clauses([AndClause::always_true()])
    }

    /// No clauses: always false.
    #[must_use]
    pub fn always_false() -> Self {
        Self::default()
    }

    /// Logical AND. Yields `|e1| * |e2|` clauses, `e1` varying slowest.
    #[must_use]
    pub fn and(e1: &Self, e2: &Self) -> Self {
        let mut clauses = Vec::with_capacity(e1.clauses.len() * e2.clauses.len());
        for c1 in &e1.clauses {
            for c2 in &e2.clauses {
                clauses.push(AndClause::concat(c1, c2));
            }
        }
        Self { clauses }
    }

    /// Logical OR: concatenation of the clause lists.
    #[must_use]
    pub fn or(e1: &Self, e2: &Self) -> Self {
        let mut clauses = Vec::with_capacity(e1.clauses.len() + e2.clauses.len());
        clauses.extend(e1.clauses.iter().cloned());
        clauses.extend(e2.clauses.iter().cloned());
        Self { clauses }
    }

    /// Logical NOT via De Morgan's laws.
    ///
    /// Starts from "always true" and ANDs in the negation of each clause,
    /// which distributes the result back into OR-of-ANDs form.
    #[must_use]
    pub fn not(e: &Self) -> Self {
        e.clauses
            .iter()
            .fold(Self::always_true(), |acc, clause| Self::and(&acc, &clause.negate()))
    }

    /// AND of any number of events; the empty conjunction is always true.
    #[must_use]
    pub fn all<'a>(events: impl IntoIterator<Item = &'a Event>) -> Self {
        events
            .into_iter()
            .fold(Self::always_true(), |acc, e| Self::and(&acc, e))
    }

    /// OR of any number of events; the empty disjunction is always false.
    #[must_use]
    pub fn any<'a>(events: impl IntoIterator<Item = &'a Event>) -> Self {
        events
            .into_iter()
            .fold(Self::always_false(), |acc, e| Self::or(&acc, e))
    }

    /// The clauses of this event, in order.
    #[must_use]
    pub fn clauses(&self) -> &[AndClause] {
        &self.clauses
    }

    /// Returns true if the event has no clauses (always false).
    #[must_use]
    pub fn is_always_false(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Every variable mentioned in any clause.
    #[must_use]
    pub fn variables(&self) -> BTreeSet<&str> {
        self.clauses.iter().flat_map(AndClause::variables).collect()
    }
}

impl From<AndClause> for Event {
    fn from(clause: AndClause) -> Self {
        Self::from_clauses([clause])
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.clauses.as_slice() {
            [] => write!(f, "FALSE"),
            [only] => write!(f, "{only}"),
            clauses => {
                for (i, clause) in clauses.iter().enumerate() {
                    if i > 0 {
                        write!(f, " OR ")?;
                    }
                    write!(f, "({clause})")?;
                }
                Ok(())
            }
        }
    }
}

impl BitAnd for Event {
    type Output = Event;

    fn bitand(self, rhs: Self) -> Self::Output {
        Event::and(&self, &rhs)
    }
}

impl BitAnd for &Event {
    type Output = Event;

    fn bitand(self, rhs: Self) -> Self::Output {
        Event::and(self, rhs)
    }
}

impl BitOr for Event {
    type Output = Event;

    fn bitor(self, rhs: Self) -> Self::Output {
        Event::or(&self, &rhs)
    }
}

impl BitOr for &Event {
    type Output = Event;

    fn bitor(self, rhs: Self) -> Self::Output {
        Event::or(self, rhs)
    }
}

impl Not for Event {
    type Output = Event;

    fn not(self) -> Self::Output {
        Event::not(&self)
    }
}

impl Not for &Event {
    type Output = Event;

    fn not(self) -> Self::Output {
        Event::not(self)
    }
}
