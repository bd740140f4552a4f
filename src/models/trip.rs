use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ServiceKind;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trip {
    pub id: String,
    pub owner: String,
    pub title: String,
    pub services: Vec<ServiceKind>,
    pub details: Value,
    pub created_at: String,
    pub updated_at: String,
}

/// Fields accepted by the trip backend on create.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTrip {
    pub owner: String,
    pub title: String,
    pub services: Vec<ServiceKind>,
    pub details: Value,
}
