//! Identity payloads and client-side form validation

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MIN_PASSWORD_LEN: usize = 6;
pub const MIN_USERNAME_LEN: usize = 3;
pub const MIN_FULL_NAME_LEN: usize = 2;

/// Input rejected on the client before any request is sent
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub username: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub is_admin: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginCredentials {
    pub email: String,
    pub password: String,
}

/// Body of `POST /api/auth/register`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterData {
    pub email: String,
    pub username: String,
    pub password: String,
    pub full_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: String,
}

/// Body of `PUT /api/auth/me`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub full_name: String,
}

/// Registration form as typed by the user, including the confirmation field
#[derive(Debug, Clone, Default)]
pub struct RegistrationForm {
    pub email: String,
    pub username: String,
    pub password: String,
    pub confirm_password: String,
    pub full_name: String,
}

impl RegistrationForm {
    /// Check the form in the same order the user sees the errors:
    /// confirmation, password length, username length, full name length.
    pub fn validate(self) -> Result<RegisterData, ValidationError> {
        if self.password != self.confirm_password {
            return Err(ValidationError::new("confirm_password", "Passwords do not match"));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ValidationError::new(
                "password",
                format!("Password must be at least {MIN_PASSWORD_LEN} characters"),
            ));
        }
        if self.username.chars().count() < MIN_USERNAME_LEN {
            return Err(ValidationError::new(
                "username",
                format!("Username must be at least {MIN_USERNAME_LEN} characters"),
            ));
        }
        if self.full_name.chars().count() < MIN_FULL_NAME_LEN {
            return Err(ValidationError::new(
                "full_name",
                format!("Full name must be at least {MIN_FULL_NAME_LEN} characters"),
            ));
        }

        Ok(RegisterData {
            email: self.email,
            username: self.username,
            password: self.password,
            full_name: self.full_name,
        })
    }
}
