//! Instance settings accepted by the `configure` command.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Consent state an instance starts with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DefaultConsent {
    /// Events flow immediately.
    #[default]
    In,
    /// Events wait until consent is given through `setConsent`.
    Pending,
}

/// Settings for one SDK instance.
///
/// The lowercase aliases accept keys from `BEACON__EDGE__*` variables.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EdgeConfig {
    /// Organization identifier merged into `gateway.imsOrgId`.
    #[validate(length(min = 1))]
    #[serde(alias = "imsorgid")]
    pub ims_org_id: String,
    /// Dataset merged into `collect.datasetId`.
    #[serde(default, alias = "datasetid")]
    pub dataset_id: Option<String>,
    /// Schema merged into `collect.schemaId`.
    #[serde(default, alias = "schemaid")]
    pub schema_id: Option<String>,
    /// Enables logging for this instance.
    #[serde(default)]
    pub debug: bool,
    /// When false, command failures are logged instead of returned.
    #[serde(default = "default_true", alias = "errorsenabled")]
    pub errors_enabled: bool,
    /// Initial consent state.
    #[serde(default, alias = "defaultconsent")]
    pub default_consent: DefaultConsent,
}

fn default_true() -> bool {
    true
}
