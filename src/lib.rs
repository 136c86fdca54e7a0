//! # bayesq - exact inference over discrete Bayesian networks
//!
//! bayesq answers `P(event)` and `P(event | evidence)` for discrete
//! Bayesian networks given as conditional probability tables. Queries are
//! written in a small event algebra that always stays in disjunctive normal
//! form, and are evaluated by exact enumeration over the variables the
//! query leaves free.
//!
//! ## Core Concepts
//!
//! - **Event**: an OR of AND-clauses over `variable = value` / `variable != value`
//! - **ConditionalDistribution**: one variable's table given its parents
//! - **BayesNetwork**: the set of tables, validated as a DAG
//!
//! A built network is immutable, so any number of threads may query it
//! through a shared reference.
//!
//! ## Usage
//!
//! ```rust
//! use bayesq::{BayesNetwork, ConditionalDistribution, Event};
//!
//! let mut builder = BayesNetwork::builder().add(
//!     ConditionalDistribution::for_variable("InitialChoice")
//!         .prior(1.0 / 3.0, "TT")
//!         .prior(1.0 / 3.0, "TL")
//!         .prior(1.0 / 3.0, "LL")
//!         .build()?,
//! );
//! for i in 1..=3 {
//!     builder = builder.add(
//!         ConditionalDistribution::for_variable(format!("Reveal{i}"))
//!             .parents(["InitialChoice"])
//!             .probability(1.0, "T", ["TT"])
//!             .probability(0.0, "L", ["TT"])
//!             .probability(0.5, "T", ["TL"])
//!             .probability(0.5, "L", ["TL"])
//!             .probability(0.0, "T", ["LL"])
//!             .probability(1.0, "L", ["LL"])
//!             .build()?,
//!     );
//! }
//! let network = builder.build()?;
//!
//! let survived_two = Event::var_equals("Reveal1", "L") & Event::var_equals("Reveal2", "L");
//! let p = network.query_conditional(&Event::var_equals("Reveal3", "L"), &survived_two)?;
//! assert!((p - 0.9).abs() < 1e-9);
//! # Ok::<(), bayesq::BayesError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod definition;
pub mod distribution;
pub mod error;
pub mod event;
pub mod inference;
pub mod network;

// Re-export primary types at crate root for convenience
pub use definition::{NetworkDefinition, TableEntry, VariableDefinition};
pub use distribution::{ConditionalDistribution, DistributionBuilder, DEFAULT_NORMALIZATION_TOLERANCE};
pub use error::{BayesError, BayesResult, QueryError, ValidationError};
pub use event::{AndClause, Condition, ConditionKind, Event};
pub use inference::Assignment;
pub use network::{BayesNetwork, BayesNetworkBuilder};
