use serde::{Deserialize, Serialize};

/// A partner bank that proposals can be submitted to.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bank {
    pub id: String,
    pub name: String,
    pub trading_name: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBank {
    pub id: Option<String>,
    pub name: String,
    pub trading_name: Option<String>,
}
