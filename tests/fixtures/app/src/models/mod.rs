use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub user_id: u64,
    pub display_name: String,
    pub email: Option<String>,
    #[serde(skip)]
    pub password_hash: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateUser {
    pub name: String,
    pub age: u8,
    #[serde(default)]
    pub role: Role,
}

#[derive(Debug, Default, Deserialize)]
pub enum Role {
    Admin,
    #[default]
    Member,
}
