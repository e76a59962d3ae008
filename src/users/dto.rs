use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::repo_types::{User, UserPatch};

/// Request body for CreateUser.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub full_name: String,
}

/// Request body for GetUser and DeleteUser.
#[derive(Debug, Deserialize)]
pub struct UserIdRequest {
    pub id: String,
}

/// Request body for UpdateUser. Absent fields are left unchanged.
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub id: String,
    pub email: Option<String>,
    pub password: Option<String>,
    pub full_name: Option<String>,
}

impl UpdateUserRequest {
    pub fn into_parts(self) -> (String, UserPatch) {
        let patch = UserPatch {
            email: self.email,
            password: self.password,
            full_name: self.full_name,
        };
        (self.id, patch)
    }
}

/// Request body for Login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
}

/// Public part of the user returned to the client.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
            full_name: u.full_name,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListUsersResponse {
    pub users: Vec<PublicUser>,
}
