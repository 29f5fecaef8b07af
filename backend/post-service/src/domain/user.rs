/// User account aggregate
///
/// Holds the password hash, never the password. Emails are stored trimmed and
/// lowercased so uniqueness is case-insensitive.
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::models::Role;
use crate::error::{ServiceError, ServiceResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    id: Uuid,
    name: String,
    email: String,
    password_hash: String,
    role: Role,
    created_at: DateTime<Utc>,
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn validate_name(name: &str) -> ServiceResult<()> {
    if name.trim().is_empty() {
        return Err(ServiceError::InvalidInput("name must not be empty".to_string()));
    }
    Ok(())
}

fn validate_email(email: &str) -> ServiceResult<()> {
    let valid = email
        .split_once('@')
        .map(|(local, domain)| !local.is_empty() && !domain.is_empty())
        .unwrap_or(false);
    if !valid {
        return Err(ServiceError::InvalidInput(format!("invalid email: {email}")));
    }
    Ok(())
}

impl User {
    /// New account with the `NORMAL` role
    pub fn register(
        name: impl Into<String>,
        email: &str,
        password_hash: String,
    ) -> ServiceResult<Self> {
        let name = name.into();
        validate_name(&name)?;
        let email = normalize_email(email);
        validate_email(&email)?;

        Ok(Self {
            id: Uuid::new_v4(),
            name: name.trim().to_string(),
            email,
            password_hash,
            role: Role::Normal,
            created_at: Utc::now(),
        })
    }

    /// Rebuild a user from stored fields
    pub fn restore(
        id: Uuid,
        name: String,
        email: String,
        password_hash: String,
        role: Role,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name,
            email,
            password_hash,
            role,
            created_at,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn password_hash(&self) -> &str {
        &self.password_hash
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn rename(&mut self, name: &str) -> ServiceResult<()> {
        validate_name(name)?;
        self.name = name.trim().to_string();
        Ok(())
    }

    pub fn change_email(&mut self, email: &str) -> ServiceResult<()> {
        let email = normalize_email(email);
        validate_email(&email)?;
        self.email = email;
        Ok(())
    }

    pub fn set_password_hash(&mut self, password_hash: String) {
        self.password_hash = password_hash;
    }

    pub fn set_role(&mut self, role: Role) {
        self.role = role;
    }
}
