use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::access::policy::Role;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ProfileRow {
    pub id: Uuid,
    pub role: String,
    pub full_name: Option<String>,
}

impl ProfileRow {
    /// `None` when the stored role is not one this service knows about.
    pub fn role(&self) -> Option<Role> {
        Role::parse(&self.role)
    }
}
