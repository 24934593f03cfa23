use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct App {
    pub id: i64,
    pub user_id: i64,
    pub display_name: String,
    /// Billing tier of the owning user, if any
    pub owner_tier: Option<String>,
}
