use std::sync::Arc;

use tracing::info;

use super::{Credentials, is_blank, mask_email, or_not_found, user_conflict, validate_new_password};
use crate::domain::{NewUser, Role, User};
use crate::error::DomainError;
use crate::policy;
use crate::ports::UserRepository;
use crate::viewer::Viewer;
use crate::views::UserProfile;

/// Admin-side account creation.
#[derive(Debug, Clone, Default)]
pub struct CreateUserInput {
    pub login: String,
    pub email: String,
    pub password: String,
    pub password_confirmation: String,
    pub full_name: Option<String>,
    pub role: Option<String>,
}

/// Account edits. `profile_picture: Some(None)` clears the picture.
#[derive(Debug, Clone, Default)]
pub struct UpdateUserInput {
    pub login: Option<String>,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub password_confirmation: Option<String>,
    pub role: Option<String>,
    pub profile_picture: Option<Option<String>>,
}

/// Result of an account edit. `replaced_picture` names a file the caller
/// may now discard.
#[derive(Debug, Clone)]
pub struct UpdatedUser {
    pub user: User,
    pub replaced_picture: Option<String>,
}

#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserRepository>,
    credentials: Credentials,
}

impl UserService {
    pub fn new(users: Arc<dyn UserRepository>, credentials: Credentials) -> Self {
        Self { users, credentials }
    }

    pub async fn profile(&self, viewer: &Viewer, id: i32) -> Result<UserProfile, DomainError> {
        let profile = self
            .users
            .profile(id)
            .await?
            .ok_or_else(|| DomainError::not_found("User"))?;
        Ok(profile.redact(policy::profile_access(viewer, id)))
    }

    pub async fn list(&self, viewer: &Viewer) -> Result<Vec<UserProfile>, DomainError> {
        policy::require_admin(viewer).into_result()?;
        Ok(self.users.list_profiles().await?)
    }

    pub async fn count(&self) -> Result<u64, DomainError> {
        Ok(self.users.count().await?)
    }

    /// Create a confirmed account with an explicit role.
    pub async fn create(&self, viewer: &Viewer, input: CreateUserInput) -> Result<User, DomainError> {
        policy::require_admin(viewer).into_result()?;
        let user = self.insert_confirmed(input).await?;
        info!(user_id = user.id, role = %user.role, "User created by admin");
        Ok(user)
    }

    /// Create the configured administrator unless its login is taken.
    /// Returns `None` when the account already exists.
    pub async fn bootstrap_admin(
        &self,
        login: &str,
        email: &str,
        password: &str,
    ) -> Result<Option<User>, DomainError> {
        if self.users.find_by_login(login).await?.is_some() {
            return Ok(None);
        }
        let user = self
            .insert_confirmed(CreateUserInput {
                login: login.to_string(),
                email: email.to_string(),
                password: password.to_string(),
                password_confirmation: password.to_string(),
                full_name: None,
                role: Some(Role::Admin.as_str().to_string()),
            })
            .await?;
        info!(user_id = user.id, "Administrator account bootstrapped");
        Ok(Some(user))
    }

    async fn insert_confirmed(&self, input: CreateUserInput) -> Result<User, DomainError> {
        if is_blank(&input.login) || is_blank(&input.password) || is_blank(&input.email) {
            return Err(DomainError::validation(
                "Login, password, and email are required",
            ));
        }
        validate_new_password(&input.password, &input.password_confirmation)?;
        let role = match input.role.as_deref() {
            Some(raw) => raw.parse::<Role>()?,
            None => Role::User,
        };

        if self.users.find_by_login(&input.login).await?.is_some() {
            return Err(DomainError::conflict("Login already exists"));
        }
        if self.users.find_by_email(&input.email).await?.is_some() {
            return Err(DomainError::conflict("Email already registered"));
        }

        let full_name = input
            .full_name
            .filter(|n| !is_blank(n))
            .unwrap_or_else(|| input.login.clone());
        let new_user = NewUser {
            password_hash: self.credentials.passwords.hash(&input.password)?,
            login: input.login,
            email: input.email,
            full_name,
            role,
            email_confirmed: true,
            email_token: None,
        };
        self.users.insert(new_user).await.map_err(user_conflict)
    }

    pub async fn update(
        &self,
        viewer: &Viewer,
        id: i32,
        input: UpdateUserInput,
    ) -> Result<UpdatedUser, DomainError> {
        let member = viewer.require_member()?;
        let mut user = self
            .users
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("User"))?;

        let role = input.role.as_deref().map(str::parse::<Role>).transpose()?;
        let changes_role = role.is_some_and(|r| r != user.role);
        policy::update_user(viewer, id, changes_role).into_result()?;

        if let Some(password) = input.password.filter(|p| !p.is_empty()) {
            let confirmation = input.password_confirmation.unwrap_or_default();
            validate_new_password(&password, &confirmation)?;
            user.password_hash = self.credentials.passwords.hash(&password)?;
        }

        if let Some(login) = input.login.filter(|l| !is_blank(l) && *l != user.login) {
            if self
                .users
                .find_by_login(&login)
                .await?
                .is_some_and(|other| other.id != id)
            {
                return Err(DomainError::conflict("Login already exists"));
            }
            user.login = login;
        }

        if let Some(name) = input.full_name {
            user.full_name = if is_blank(&name) { user.login.clone() } else { name };
        }

        let mut reconfirm_token = None;
        if let Some(email) = input.email.filter(|e| !is_blank(e) && *e != user.email) {
            if self
                .users
                .find_by_email(&email)
                .await?
                .is_some_and(|other| other.id != id)
            {
                return Err(DomainError::conflict("Email already registered"));
            }
            user.email = email;
            if !member.is_admin() {
                let token = self.credentials.tokens.generate();
                user.email_confirmed = false;
                user.email_token = Some(token.clone());
                reconfirm_token = Some(token);
            }
        }

        if let Some(role) = role {
            user.role = role;
        }

        let mut replaced_picture = None;
        match input.profile_picture {
            Some(None) => replaced_picture = user.profile_picture.take(),
            Some(Some(_)) => {
                return Err(DomainError::validation(
                    "Profile pictures are uploaded through PATCH /users/pfp",
                ));
            }
            None => {}
        }

        let user = self.users.update(&user).await.map_err(user_conflict)?;
        info!(user_id = user.id, by = member.id, "User updated");

        if let Some(token) = reconfirm_token {
            info!(email = %mask_email(&user.email), "Email changed, confirmation required");
            self.credentials
                .send_confirmation(&user.email, &user.full_name, &token)
                .await;
        }

        Ok(UpdatedUser {
            user,
            replaced_picture,
        })
    }

    /// Point the viewer's profile at an already stored picture file. Returns
    /// the previous filename, if any.
    pub async fn set_profile_picture(
        &self,
        viewer: &Viewer,
        filename: String,
    ) -> Result<Option<String>, DomainError> {
        let member = viewer.require_member()?;
        let mut user = self
            .users
            .find_by_id(member.id)
            .await?
            .ok_or_else(|| DomainError::not_found("User"))?;
        let previous = user.profile_picture.replace(filename);
        self.users.update(&user).await?;
        info!(user_id = user.id, "Profile picture updated");
        Ok(previous)
    }

    pub async fn delete(&self, viewer: &Viewer, id: i32) -> Result<(), DomainError> {
        policy::delete_user(viewer).into_result()?;
        if viewer.owns(id) {
            return Err(DomainError::validation("Cannot delete your own account"));
        }
        self.users
            .delete(id)
            .await
            .map_err(|e| or_not_found(e, "User"))?;
        info!(user_id = id, "User deleted");
        Ok(())
    }
}
