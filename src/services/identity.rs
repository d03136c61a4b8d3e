use std::sync::Arc;

use mongodb::bson::oid::ObjectId;

use crate::auth::password::{hash_password, verify_password};
use crate::auth::token::TokenIssuer;
use crate::error::{AppError, AppResult};
use crate::models::user_model::{
    ChangePassword, CreateUser, Principal, ProfileUpdate, Role, SignIn, SignInResponse, SignUp,
    User,
};
use crate::repositories::Store;

/// Accounts, credentials and access tokens.
#[derive(Clone)]
pub struct IdentityService {
    store: Arc<dyn Store>,
    tokens: Arc<TokenIssuer>,
}

impl IdentityService {
    pub fn new(store: Arc<dyn Store>, tokens: Arc<TokenIssuer>) -> Self {
        IdentityService { store, tokens }
    }

    /// Public registration, always as a customer.
    pub async fn sign_up(&self, credentials: SignUp) -> AppResult<User> {
        self.register(credentials, Role::Customer).await
    }

    pub async fn create_user(&self, request: CreateUser) -> AppResult<User> {
        let (credentials, role) = request.split();
        self.register(credentials, role).await
    }

    async fn register(&self, credentials: SignUp, role: Role) -> AppResult<User> {
        self.ensure_username_free(&credentials.username, None).await?;

        let user = User {
            id: ObjectId::new(),
            username: credentials.username,
            password: hash_password(credentials.password).await?,
            age: credentials.age,
            role,
        };
        self.store.insert_user(&user).await?;
        tracing::info!(user_id = %user.id, username = %user.username, role = role.as_str(), "user registered");
        Ok(user)
    }

    pub async fn sign_in(&self, credentials: SignIn) -> AppResult<SignInResponse> {
        let Some(user) = self.store.find_user_by_username(&credentials.username).await? else {
            tracing::debug!(username = %credentials.username, "sign-in for unknown user");
            return Err(invalid_credentials());
        };
        if !verify_password(credentials.password, user.password.clone()).await? {
            tracing::debug!(username = %user.username, "sign-in with wrong password");
            return Err(invalid_credentials());
        }

        Ok(SignInResponse {
            access_token: self.tokens.issue(&user)?,
        })
    }

    pub async fn change_password(
        &self,
        principal: &Principal,
        request: ChangePassword,
    ) -> AppResult<()> {
        let mut user = self.find_user(principal.id).await?;
        if !verify_password(request.old_password, user.password.clone()).await? {
            return Err(AppError::Unauthorized("Old password is incorrect".to_string()));
        }
        user.password = hash_password(request.new_password).await?;
        self.store.save_user(&user).await?;
        tracing::info!(user_id = %user.id, "password changed");
        Ok(())
    }

    pub async fn update_profile(&self, id: ObjectId, update: ProfileUpdate) -> AppResult<User> {
        let mut user = self.find_user(id).await?;
        if let Some(username) = &update.username {
            self.ensure_username_free(username, Some(user.id)).await?;
        }
        update.apply(&mut user);
        self.store.save_user(&user).await?;
        Ok(user)
    }

    pub async fn find_user(&self, id: ObjectId) -> AppResult<User> {
        self.store
            .find_user(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Cannot find user with ID: {id}")))
    }

    pub async fn list_users(&self) -> AppResult<Vec<User>> {
        Ok(self.store.list_users().await?)
    }

    pub async fn remove_user(&self, id: ObjectId) -> AppResult<()> {
        let user = self.find_user(id).await?;
        let tickets = self.store.delete_tickets_by_user(user.id).await?;
        let history = self.store.delete_watch_history_by_user(user.id).await?;
        self.store.delete_user(user.id).await?;
        tracing::info!(user_id = %user.id, tickets, history, "user removed");
        Ok(())
    }

    async fn ensure_username_free(&self, username: &str, owner: Option<ObjectId>) -> AppResult<()> {
        match self.store.find_user_by_username(username).await? {
            Some(existing) if Some(existing.id) != owner => Err(AppError::Conflict(format!(
                "Username {username} is already taken"
            ))),
            _ => Ok(()),
        }
    }
}

fn invalid_credentials() -> AppError {
    AppError::Unauthorized("Invalid username or password".to_string())
}
