//! Playback script for the mission-mint flow.
//!
//! A [`Script`] is an immutable, ordered list of [`Step`]s. Each step
//! activates one architectural [`Node`], carries a log message and a free-form
//! payload that observers show verbatim.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;

/// An architectural stage highlighted while the script plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Node {
    /// Stable identifier.
    pub id: &'static str,
    /// Display label.
    pub label: &'static str,
    /// Short description shown under the label.
    pub description: &'static str,
}

/// Node catalog. Step node indices are 1-based into this list; 0 means no node.
pub const NODES: [Node; 5] = [
    Node {
        id: "user",
        label: "User",
        description: "Start mission / Request mint",
    },
    Node {
        id: "ui",
        label: "MeeBot UI",
        description: "Frontend interface",
    },
    Node {
        id: "api",
        label: "MeeBot API",
        description: "Verifier & signer",
    },
    Node {
        id: "ipfs",
        label: "IPFS Storage",
        description: "Decentralized metadata",
    },
    Node {
        id: "chain",
        label: "Smart Contract",
        description: "MeeMissionNFT execution",
    },
];

/// Look up a node by its 1-based index.
pub fn node(index: usize) -> Option<&'static Node> {
    index.checked_sub(1).and_then(|i| NODES.get(i))
}

/// Severity tag of a step or log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Success => write!(f, "success"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// One scripted event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// Node activated by this step (1-based, 0 = none).
    pub node: usize,

    /// Human-readable log message.
    pub message: String,

    /// Structured payload shown verbatim by the data inspector.
    #[serde(default)]
    pub payload: Value,

    /// Severity of the log entry this step produces.
    #[serde(default)]
    pub severity: Severity,
}

impl Step {
    /// Create a step.
    pub fn new(node: usize, message: impl Into<String>, payload: Value, severity: Severity) -> Self {
        Self {
            node,
            message: message.into(),
            payload,
            severity,
        }
    }
}

/// Immutable ordered list of steps. Cloning is cheap.
#[derive(Debug, Clone, PartialEq)]
pub struct Script {
    steps: Arc<[Step]>,
}

impl Script {
    /// Build a script from steps without validation.
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            steps: steps.into(),
        }
    }

    /// The built-in mission-mint script: a completed mission travelling from
    /// the user through the API signer and IPFS to the NFT contract.
    pub fn mission_mint() -> Self {
        Self::new(vec![
            Step::new(
                1,
                "User interaction detected: Mission Completed.",
                json!({ "missionId": 101, "status": "completed" }),
                Severity::Info,
            ),
            Step::new(
                2,
                "MeeBot UI sending proof request to API server...",
                json!({ "missionId": 101, "proof": "0x_base64_proof_data" }),
                Severity::Info,
            ),
            Step::new(
                3,
                "API Verifying off-chain logic... SUCCESS.",
                json!({ "missionId": 101, "verified": true, "signer": "0xMeeBot_Admin" }),
                Severity::Success,
            ),
            Step::new(
                3,
                "Generating Cryptographic Signature...",
                json!({ "missionId": 101, "signature": "0x7f3...9a2b" }),
                Severity::Info,
            ),
            Step::new(
                4,
                "Uploading NFT Metadata to IPFS...",
                json!({ "ipfsHash": "QmXoyp...3n8", "name": "MeeBot Pioneer #001" }),
                Severity::Info,
            ),
            Step::new(
                5,
                "Calling Smart Contract: mintMissionReward()",
                json!({ "target": "0xUser_Address", "missionId": 101, "signature": "0x7f3...9a2b" }),
                Severity::Info,
            ),
            Step::new(
                5,
                "Blockchain Confirmation: Transaction Successful!",
                json!({ "txHash": "0x88c...d91e", "status": "confirmed" }),
                Severity::Success,
            ),
        ])
    }

    /// Parse and validate a script from a JSON array of steps.
    pub fn from_json(content: &str) -> Result<Self, ScriptError> {
        let steps: Vec<Step> = serde_json::from_str(content).map_err(ScriptError::Parse)?;
        if steps.is_empty() {
            return Err(ScriptError::Empty);
        }
        if let Some((index, step)) = steps
            .iter()
            .enumerate()
            .find(|(_, s)| s.node > NODES.len())
        {
            return Err(ScriptError::UnknownNode {
                index,
                node: step.node,
            });
        }
        Ok(Self::new(steps))
    }

    /// Load a script from a JSON file.
    pub fn load(path: &Path) -> Result<Self, ScriptError> {
        let content = std::fs::read_to_string(path).map_err(ScriptError::Io)?;
        Self::from_json(&content)
    }

    /// Serialize the steps as pretty JSON (the format [`Script::from_json`] reads).
    pub fn to_json(&self) -> Result<String, ScriptError> {
        serde_json::to_string_pretty(&*self.steps).map_err(ScriptError::Serialize)
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether the script has no steps.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Step at `index`.
    pub fn get(&self, index: usize) -> Option<&Step> {
        self.steps.get(index)
    }

    /// All steps in order.
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }
}

impl Default for Script {
    fn default() -> Self {
        Self::mission_mint()
    }
}

/// Errors that can occur when loading a script.
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    /// I/O error reading the script file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error parsing script JSON.
    #[error("Parse error: {0}")]
    Parse(#[source] serde_json::Error),

    /// Error serializing script JSON.
    #[error("Serialize error: {0}")]
    Serialize(#[source] serde_json::Error),

    /// Script contains no steps.
    #[error("Script has no steps")]
    Empty,

    /// A step targets a node outside the catalog.
    #[error("Step {index} targets unknown node {node}")]
    UnknownNode { index: usize, node: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mission_mint_script() {
        let script = Script::mission_mint();
        assert_eq!(script.len(), 7);
        assert_eq!(script.get(0).unwrap().node, 1);
        assert_eq!(script.get(6).unwrap().severity, Severity::Success);
        assert!(script.steps().iter().all(|s| node(s.node).is_some()));
    }

    #[test]
    fn test_node_lookup() {
        assert!(node(0).is_none());
        assert_eq!(node(1).unwrap().label, "User");
        assert_eq!(node(5).unwrap().id, "chain");
        assert!(node(6).is_none());
    }

    #[test]
    fn test_from_json() {
        let script = Script::from_json(
            r#"[
                {"node": 1, "message": "A", "severity": "info"},
                {"node": 2, "message": "B", "payload": {"k": 1}, "severity": "success"}
            ]"#,
        )
        .unwrap();
        assert_eq!(script.len(), 2);
        assert_eq!(script.get(0).unwrap().payload, Value::Null);
        assert_eq!(script.get(1).unwrap().payload["k"], 1);
    }

    #[test]
    fn test_from_json_rejects_empty() {
        assert!(matches!(Script::from_json("[]"), Err(ScriptError::Empty)));
    }

    #[test]
    fn test_from_json_rejects_unknown_node() {
        let err = Script::from_json(r#"[{"node": 9, "message": "x"}]"#).unwrap_err();
        assert!(matches!(err, ScriptError::UnknownNode { index: 0, node: 9 }));
    }

    #[test]
    fn test_from_json_rejects_bad_severity() {
        let err = Script::from_json(r#"[{"node": 1, "message": "x", "severity": "fatal"}]"#);
        assert!(matches!(err, Err(ScriptError::Parse(_))));
    }

    #[test]
    fn test_json_export_reloads() {
        let script = Script::mission_mint();
        let json = script.to_json().unwrap();
        assert_eq!(Script::from_json(&json).unwrap(), script);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("script.json");
        std::fs::write(&path, r#"[{"node": 3, "message": "sign"}]"#).unwrap();
        let script = Script::load(&path).unwrap();
        assert_eq!(script.get(0).unwrap().message, "sign");

        let missing = Script::load(&dir.path().join("missing.json"));
        assert!(matches!(missing, Err(ScriptError::Io(_))));
    }
}
