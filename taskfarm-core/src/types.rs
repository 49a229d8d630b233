//! Policy and descriptor types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// Order in which completed results are handed to the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderingMode {
    /// Results become available in the order they arrive
    #[default]
    CompletionOrder,
    /// A result becomes available once every task submitted before it has
    /// completed
    SubmissionOrder,
}

impl OrderingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderingMode::CompletionOrder => "completion",
            OrderingMode::SubmissionOrder => "submission",
        }
    }
}

impl fmt::Display for OrderingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for OrderingMode {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "completion" | "completion_order" => Ok(OrderingMode::CompletionOrder),
            "submission" | "submission_order" => Ok(OrderingMode::SubmissionOrder),
            _ => Err(ParseError::InvalidOrderingMode(s.to_string())),
        }
    }
}

/// Opaque provisioning request handed to a worker provisioner.
///
/// Which variants are honoured is up to the provisioner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResourceDescriptor {
    /// Workers running inside the current process
    Local { count: usize },
    /// Already running remote nodes, addressed by URL
    Nodes { urls: Vec<String> },
    /// Deployment descriptor file, optionally restricted to one virtual node
    Descriptor {
        path: PathBuf,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        virtual_node: Option<String>,
    },
}

impl ResourceDescriptor {
    pub fn kind(&self) -> &'static str {
        match self {
            ResourceDescriptor::Local { .. } => "local",
            ResourceDescriptor::Nodes { .. } => "nodes",
            ResourceDescriptor::Descriptor { .. } => "descriptor",
        }
    }
}

/// Errors that can occur when parsing types
#[derive(Error, Debug, Clone)]
pub enum ParseError {
    #[error("Invalid ordering mode: '{0}'. Supported modes are: completion, submission")]
    InvalidOrderingMode(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ordering_mode_from_str() {
        assert_eq!(
            OrderingMode::from_str("completion").unwrap(),
            OrderingMode::CompletionOrder
        );
        assert_eq!(
            OrderingMode::from_str("SUBMISSION").unwrap(),
            OrderingMode::SubmissionOrder
        );
        assert!(OrderingMode::from_str("random").is_err());
        assert_eq!(OrderingMode::default(), OrderingMode::CompletionOrder);
    }

    #[test]
    fn test_resource_descriptor_serialization() {
        let descriptor = ResourceDescriptor::Local { count: 3 };
        assert_eq!(
            serde_json::to_value(&descriptor).unwrap(),
            json!({"type": "local", "count": 3})
        );

        let parsed: ResourceDescriptor = serde_json::from_value(json!({
            "type": "descriptor",
            "path": "/etc/farm/deploy.xml"
        }))
        .unwrap();
        assert_eq!(parsed.kind(), "descriptor");
    }
}
