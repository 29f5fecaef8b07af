/// User service - account registration, login and administration
///
/// Signup and login are the only operations without an identity; they hand
/// back an access token minted with the service's signing key. Everything
/// else goes through the rule table like the post operations do.
use crypto_core::jwt::JwtKeys;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::PasswordHasher;
use crate::domain::{
    normalize_email, AuthOutput, DeleteUserInput, Identity, ListUsersInput, LoginInput,
    SignupInput, UpdateUserInput, User, UserView,
};
use crate::error::{ServiceError, ServiceResult};
use crate::middleware::{authorize, Operation, Resource};
use crate::repository::UserGateway;

#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserGateway>,
    hasher: Arc<dyn PasswordHasher>,
    tokens: JwtKeys,
}

fn user_not_found(user_id: Uuid) -> ServiceError {
    ServiceError::NotFound(format!("user {user_id} not found"))
}

fn email_taken(email: &str) -> ServiceError {
    ServiceError::InvalidInput(format!("email {email} already registered"))
}

fn require_password(password: &str) -> ServiceResult<()> {
    if password.is_empty() {
        return Err(ServiceError::InvalidInput(
            "password must not be empty".to_string(),
        ));
    }
    Ok(())
}

impl UserService {
    pub fn new(
        users: Arc<dyn UserGateway>,
        hasher: Arc<dyn PasswordHasher>,
        tokens: JwtKeys,
    ) -> Self {
        Self {
            users,
            hasher,
            tokens,
        }
    }

    fn issue(&self, user: &User) -> ServiceResult<AuthOutput> {
        let token = self
            .tokens
            .generate_access_token(user.id(), user.name(), user.role())
            .map_err(|e| anyhow::anyhow!("Failed to issue access token: {e}"))?;

        Ok(AuthOutput {
            token,
            user: UserView::from(user),
        })
    }

    async fn load_user(&self, user_id: Uuid) -> ServiceResult<User> {
        self.users
            .find_user_by_id(user_id)
            .await?
            .ok_or_else(|| user_not_found(user_id))
    }

    /// Register a `NORMAL` account and log it in
    pub async fn signup(&self, input: SignupInput) -> ServiceResult<AuthOutput> {
        require_password(&input.password)?;
        let password_hash = self.hasher.hash(&input.password)?;
        let user = User::register(input.name, &input.email, password_hash)?;

        if !self.users.insert_user(&user).await? {
            return Err(email_taken(user.email()));
        }

        info!(user_id = %user.id(), "user signed up");
        self.issue(&user)
    }

    /// Unknown email and wrong password are indistinguishable to the caller
    pub async fn login(&self, input: LoginInput) -> ServiceResult<AuthOutput> {
        let rejected = || ServiceError::Unauthorized("invalid email or password".to_string());

        let Some(user) = self
            .users
            .find_user_by_email(&normalize_email(&input.email))
            .await?
        else {
            return Err(rejected());
        };

        if !self.hasher.verify(&input.password, user.password_hash())? {
            warn!(user_id = %user.id(), "login with wrong password");
            return Err(rejected());
        }

        info!(user_id = %user.id(), "user logged in");
        self.issue(&user)
    }

    /// Admin only
    pub async fn list_users(
        &self,
        identity: &Identity,
        input: ListUsersInput,
    ) -> ServiceResult<Vec<UserView>> {
        authorize(identity, Operation::ListUsers, Resource::None)?;

        let query = input
            .query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty());
        let users = self.users.find_users(query).await?;
        Ok(users.iter().map(UserView::from).collect())
    }

    /// Partial update; the account owner or an admin, role changes admin only
    pub async fn update_user(
        &self,
        identity: &Identity,
        input: UpdateUserInput,
    ) -> ServiceResult<UserView> {
        if input.is_empty() {
            return Err(ServiceError::InvalidInput(
                "at least one field must be provided".to_string(),
            ));
        }

        let mut user = self.load_user(input.user_id).await?;
        authorize(identity, Operation::UpdateUser, Resource::User(&user))?;
        if let Some(role) = input.role {
            authorize(identity, Operation::ChangeUserRole, Resource::User(&user))?;
            user.set_role(role);
        }

        if let Some(name) = &input.name {
            user.rename(name)?;
        }
        if let Some(email) = &input.email {
            user.change_email(email)?;
            if let Some(holder) = self.users.find_user_by_email(user.email()).await? {
                if holder.id() != user.id() {
                    return Err(email_taken(user.email()));
                }
            }
        }
        if let Some(password) = &input.password {
            require_password(password)?;
            user.set_password_hash(self.hasher.hash(password)?);
        }

        if !self.users.update_user(&user).await? {
            return Err(user_not_found(user.id()));
        }

        info!(
            user_id = %user.id(),
            by = %identity.id,
            role = %user.role(),
            "user updated"
        );
        Ok(UserView::from(&user))
    }

    /// Delete an account; the owner or an admin
    pub async fn delete_user(
        &self,
        identity: &Identity,
        input: DeleteUserInput,
    ) -> ServiceResult<()> {
        let user = self.load_user(input.user_id).await?;
        authorize(identity, Operation::DeleteUser, Resource::User(&user))?;

        if !self.users.delete_user(user.id()).await? {
            return Err(user_not_found(user.id()));
        }

        info!(user_id = %user.id(), by = %identity.id, "user deleted");
        Ok(())
    }
}
