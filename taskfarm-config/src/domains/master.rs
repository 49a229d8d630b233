//! Master coordinator configuration

use serde::{Deserialize, Serialize};
use taskfarm_core::OrderingMode;

use crate::error::ConfigResult;
use crate::validation::Validatable;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MasterConfig {
    /// Order in which results are handed to the client
    pub ordering: OrderingMode,
}

impl Validatable for MasterConfig {
    fn validate(&self) -> ConfigResult<()> {
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "master"
    }
}
