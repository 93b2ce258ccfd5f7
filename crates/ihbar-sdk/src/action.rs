//! Solana Actions wire types.

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ActionType {
    Action,
    Transaction,
}

/// Body of `GET /api/actions/<name>`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ActionGetResponse {
    #[serde(rename = "type")]
    pub kind: ActionType,
    pub title: String,
    pub icon: String,
    pub description: String,
    /// Ignored by clients whenever `links.actions` is present.
    pub label: String,
    pub links: ActionLinks,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ActionLinks {
    pub actions: Vec<LinkedAction>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LinkedAction {
    pub label: String,
    /// Link template, `{name}` placeholders are filled from `parameters`.
    pub href: String,
    pub parameters: Vec<ActionParameter>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ActionParameter {
    pub name: String,
    pub label: String,
    pub required: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ActionPostRequest {
    /// Base58 public key of the signing wallet.
    #[serde(default)]
    pub account: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ActionPostResponse {
    #[serde(rename = "type")]
    pub kind: ActionType,
    /// Base64 wire encoding of the unsigned transaction.
    pub transaction: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// `/actions.json` discovery document.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ActionsJson {
    pub rules: Vec<ActionRule>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActionRule {
    pub path_pattern: String,
    pub api_path: String,
}

impl ActionsJson {
    /// Map every path under `prefix` onto itself.
    pub fn identity(prefix: &str) -> Self {
        let pattern = format!("{}/**", prefix.trim_end_matches('/'));
        Self {
            rules: vec![ActionRule {
                path_pattern: pattern.clone(),
                api_path: pattern,
            }],
        }
    }
}
