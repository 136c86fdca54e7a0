//! Exact inference by enumeration.
//!
//! Every query reduces to clause evaluation: each [`AndClause`] pins some
//! variables to a single value, restricts others to a subset of their
//! domain, and leaves the rest (nuisance variables) free. The engine sums
//! the joint probability over every assignment consistent with the clause.
//! Disjunctions are handled with inclusion-exclusion.
//!
//! [`AndClause`]: crate::event::AndClause

mod enumeration;

pub use enumeration::{allowed_values, Assignment};
pub(crate) use enumeration::{event_probability, joint_probability};
