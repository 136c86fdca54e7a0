//! Serializable network definitions.
//!
//! A [`NetworkDefinition`] is the JSON form of a [`BayesNetwork`], used to
//! load networks from configuration files:
//!
//! ```json
//! {
//!   "variables": [
//!     {
//!       "name": "Rain",
//!       "table": [
//!         { "value": "yes", "p": 0.2 },
//!         { "value": "no", "p": 0.8 }
//!       ]
//!     },
//!     {
//!       "name": "Grass",
//!       "parents": ["Rain"],
//!       "table": [
//!         { "value": "wet", "parents": ["yes"], "p": 0.9 },
//!         { "value": "dry", "parents": ["yes"], "p": 0.1 },
//!         { "value": "wet", "parents": ["no"], "p": 0.2 },
//!         { "value": "dry", "parents": ["no"], "p": 0.8 }
//!       ]
//!     }
//!   ]
//! }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::distribution::{ConditionalDistribution, DEFAULT_NORMALIZATION_TOLERANCE};
use crate::error::{BayesError, BayesResult};
use crate::network::BayesNetwork;

/// A whole network, in declaration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkDefinition {
    /// One entry per variable.
    pub variables: Vec<VariableDefinition>,
}

/// One variable's table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableDefinition {
    /// Variable name.
    pub name: String,

    /// Parent variables, in the order used by each entry's `parents`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parents: Vec<String>,

    /// Table entries.
    pub table: Vec<TableEntry>,

    /// Overrides the default row-sum tolerance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalization_tolerance: Option<f64>,

    /// Skips the row-sum check entirely.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub allow_unnormalized: bool,
}

/// `P(name = value | parents)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableEntry {
    /// The variable's value.
    pub value: String,

    /// Parent values, aligned with [`VariableDefinition::parents`].
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parents: Vec<String>,

    /// The conditional probability.
    #[serde(rename = "p")]
    pub probability: f64,
}

impl NetworkDefinition {
    /// Parses a definition from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`BayesError::Definition`] if the text is not a valid definition.
    pub fn from_json_str(json: &str) -> BayesResult<Self> {
        serde_json::from_str(json).map_err(|e| BayesError::definition(format!("invalid JSON: {e}")))
    }

    /// Reads and parses a definition file.
    ///
    /// # Errors
    ///
    /// Returns [`BayesError::Definition`] on I/O or parse failure.
    pub fn from_json_file(path: impl AsRef<Path>) -> BayesResult<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .map_err(|e| BayesError::definition(format!("failed to read {}: {e}", path.display())))?;
        Self::from_json_str(&json)
    }

    /// Renders the definition as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`BayesError::Definition`] if serialization fails.
    pub fn to_json_string_pretty(&self) -> BayesResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| BayesError::definition(format!("failed to serialize: {e}")))
    }

    /// Builds and validates the network.
    ///
    /// # Errors
    ///
    /// Returns [`BayesError::Validation`] if any table or the structure is invalid.
    pub fn into_network(self) -> BayesResult<BayesNetwork> {
        let mut builder = BayesNetwork::builder();
        for variable in self.variables {
            builder = builder.add(variable.into_distribution()?);
        }
        Ok(builder.build()?)
    }
}

impl VariableDefinition {
    fn into_distribution(self) -> BayesResult<ConditionalDistribution> {
        let mut builder = ConditionalDistribution::for_variable(self.name).parents(self.parents);
        for entry in self.table {
            builder = builder.probability(entry.probability, entry.value, entry.parents);
        }
        if let Some(tolerance) = self.normalization_tolerance {
            builder = builder.normalization_tolerance(tolerance);
        }
        if self.allow_unnormalized {
            builder = builder.allow_unnormalized();
        }
        Ok(builder.build()?)
    }
}

impl From<&ConditionalDistribution> for VariableDefinition {
    fn from(distribution: &ConditionalDistribution) -> Self {
        let table = distribution
            .probabilities()
            .iter()
            .map(|(key, &probability)| TableEntry {
                value: key[0].clone(),
                parents: key[1..].to_vec(),
                probability,
            })
            .collect();
        let tolerance = distribution.normalization_tolerance();
        #[allow(clippy::float_cmp)]
        let normalization_tolerance = tolerance.filter(|&t| t != DEFAULT_NORMALIZATION_TOLERANCE);
        Self {
            name: distribution.variable().to_string(),
            parents: distribution.parents().to_vec(),
            table,
            normalization_tolerance,
            allow_unnormalized: tolerance.is_none(),
        }
    }
}

impl From<&BayesNetwork> for NetworkDefinition {
    fn from(network: &BayesNetwork) -> Self {
        Self {
            variables: network.distributions().iter().map(VariableDefinition::from).collect(),
        }
    }
}

impl TryFrom<NetworkDefinition> for BayesNetwork {
    type Error = BayesError;

    fn try_from(definition: NetworkDefinition) -> Result<Self, Self::Error> {
        definition.into_network()
    }
}

impl BayesNetwork {
    /// Converts the network back into its serializable form.
    #[must_use]
    pub fn to_definition(&self) -> NetworkDefinition {
        NetworkDefinition::from(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use crate::event::Event;

    const SPRINKLER: &str = r#"{
        "variables": [
            { "name": "Rain", "table": [ { "value": "yes", "p": 0.2 }, { "value": "no", "p": 0.8 } ] },
            {
                "name": "Grass",
                "parents": ["Rain"],
                "table": [
                    { "value": "wet", "parents": ["yes"], "p": 0.9 },
                    { "value": "dry", "parents": ["yes"], "p": 0.1 },
                    { "value": "wet", "parents": ["no"], "p": 0.2 },
                    { "value": "dry", "parents": ["no"], "p": 0.8 }
                ]
            }
        ]
    }"#;

    #[test]
    fn test_parse_and_query() {
        let network = NetworkDefinition::from_json_str(SPRINKLER)
            .unwrap()
            .into_network()
            .unwrap();
        assert_eq!(network.len(), 2);
        let p = network
            .query_conditional(&Event::var_equals("Rain", "yes"), &Event::var_equals("Grass", "wet"))
            .unwrap();
        assert!((p - 0.18 / 0.34).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_json() {
        let err = NetworkDefinition::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, BayesError::Definition { .. }));
    }

    #[test]
    fn test_validation_error_surfaces() {
        let json = r#"{ "variables": [ { "name": "X", "table": [ { "value": "a", "p": 0.4 } ] } ] }"#;
        let err = NetworkDefinition::from_json_str(json)
            .unwrap()
            .into_network()
            .unwrap_err();
        assert!(matches!(
            err,
            BayesError::Validation(ValidationError::NotNormalized { .. })
        ));
    }

    #[test]
    fn test_allow_unnormalized_flag() {
        let json = r#"{ "variables": [ { "name": "X", "allow_unnormalized": true, "table": [ { "value": "a", "p": 0.4 } ] } ] }"#;
        let network = BayesNetwork::try_from(NetworkDefinition::from_json_str(json).unwrap()).unwrap();
        assert!(network.to_definition().variables[0].allow_unnormalized);
    }

    #[test]
    fn test_round_trip_preserves_network() {
        let network = NetworkDefinition::from_json_str(SPRINKLER)
            .unwrap()
            .into_network()
            .unwrap();
        let json = network.to_definition().to_json_string_pretty().unwrap();
        assert!(!json.contains("allow_unnormalized"));
        let rebuilt = NetworkDefinition::from_json_str(&json)
            .unwrap()
            .into_network()
            .unwrap();
        assert_eq!(rebuilt, network);
    }

    #[test]
    fn test_round_trip_keeps_loose_tolerance() {
        let json = r#"{ "variables": [ { "name": "X", "normalization_tolerance": 0.02, "table": [
            { "value": "a", "p": 0.33 }, { "value": "b", "p": 0.33 }, { "value": "c", "p": 0.33 }
        ] } ] }"#;
        let network = NetworkDefinition::from_json_str(json)
            .unwrap()
            .into_network()
            .unwrap();

        let saved = network.to_definition();
        assert_eq!(saved.variables[0].normalization_tolerance, Some(0.02));
        assert!(!saved.variables[0].allow_unnormalized);

        // The reloaded table is still validated against the loose tolerance.
        let rebuilt = saved.clone().into_network().unwrap();
        assert_eq!(rebuilt, network);

        let mut broken = saved;
        broken.variables[0].table[0].probability = 0.2;
        let err = broken.into_network().unwrap_err();
        assert!(matches!(
            err,
            BayesError::Validation(ValidationError::NotNormalized { .. })
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = NetworkDefinition::from_json_file("/nonexistent/network.json").unwrap_err();
        assert!(format!("{err}").contains("failed to read"));
    }
}
