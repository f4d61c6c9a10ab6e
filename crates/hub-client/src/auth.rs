use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::Utc;
use rand_core::OsRng;
use tracing::{info, warn};

use hub_types::api::{AccountChanges, NewAccount, ProfileUpdate, RegisterRequest};
use hub_types::{Account, FrameStyle};

use crate::Hub;
use crate::error::{HubError, Result};

pub(crate) const MIN_PASSWORD_LEN: usize = 6;

const AVATAR_BASE: &str = "https://api.dicebear.com/7.x/avataaars/svg?seed=";

impl Hub {
    /// Create an account and sign it in.
    pub async fn register(&self, req: RegisterRequest) -> Result<Account> {
        let email = req.email.trim().to_string();
        let username = req.username.trim().to_string();

        if email.is_empty() || !email.contains('@') {
            return Err(HubError::Validation("a valid email is required"));
        }
        if username.is_empty() {
            return Err(HubError::Validation("username is required"));
        }
        if req.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(HubError::Validation("password must be at least 6 characters"));
        }
        if req.role.is_admin() {
            return Err(HubError::Validation("that role cannot be chosen at registration"));
        }

        if self.backend.account_by_email(&email).await?.is_some() {
            return Err(HubError::EmailTaken);
        }
        if self.backend.account_by_username(&username).await?.is_some() {
            return Err(HubError::UsernameTaken);
        }

        let password_hash = hash_password(&req.password)?;
        let display_name = req
            .display_name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| username.clone());
        let avatar = req
            .avatar
            .filter(|a| !a.trim().is_empty())
            .unwrap_or_else(|| format!("{}{}", AVATAR_BASE, username));

        let account = self
            .backend
            .insert_account(NewAccount {
                email,
                username,
                password_hash,
                display_name,
                avatar,
                bio: String::new(),
                role: req.role,
                frame_style: FrameStyle::None,
                is_shiny: false,
                is_online: true,
                is_verified: false,
            })
            .await?;

        info!("Registered account '{}'", account.username);
        self.session.set(account.clone()).await?;
        Ok(account)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Account> {
        let record = self
            .backend
            .account_by_email(email.trim())
            .await?
            .ok_or(HubError::InvalidCredentials)?;

        verify_password(password, &record.password_hash)?;

        let id = record.account.id;
        let account = self
            .backend
            .update_account(id, AccountChanges::presence(true, Utc::now()))
            .await?
            .unwrap_or(record.account);

        info!("Logged in as '{}'", account.username);
        self.session.set(account.clone()).await?;
        Ok(account)
    }

    /// Sign out. Marking the account offline is best effort; the local session
    /// is dropped either way.
    pub async fn logout(&self) -> Result<()> {
        if let Some(me) = self.session.current().await {
            if let Err(e) = self
                .backend
                .update_account(me.id, AccountChanges::presence(false, Utc::now()))
                .await
            {
                warn!("Could not mark '{}' offline: {}", me.username, e);
            }
            info!("Logged out '{}'", me.username);
        }
        self.session.clear().await
    }

    pub async fn update_profile(&self, update: ProfileUpdate) -> Result<Account> {
        let me = self.session.require().await?;
        let account = self
            .backend
            .update_account(me.id, update.into_changes(Utc::now()))
            .await?
            .ok_or(HubError::NotFound("account"))?;

        self.session.set(account.clone()).await?;
        Ok(account)
    }

    pub async fn change_password(&self, current: &str, new: &str, confirm: &str) -> Result<()> {
        if new != confirm {
            return Err(HubError::Validation("passwords do not match"));
        }
        if new.chars().count() < MIN_PASSWORD_LEN {
            return Err(HubError::Validation("password must be at least 6 characters"));
        }

        let me = self.session.require().await?;
        let record = self
            .backend
            .account_by_email(&me.email)
            .await?
            .ok_or(HubError::NotFound("account"))?;
        verify_password(current, &record.password_hash)?;

        let changes = AccountChanges {
            password_hash: Some(hash_password(new)?),
            updated_at: Some(Utc::now()),
            ..AccountChanges::default()
        };
        self.backend
            .update_account(me.id, changes)
            .await?
            .ok_or(HubError::NotFound("account"))?;

        info!("Password changed for '{}'", me.username);
        Ok(())
    }
}

fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| HubError::Hash(e.to_string()))
}

/// Any failure, including an unparseable stored hash, reads as bad credentials.
fn verify_password(password: &str, stored: &str) -> Result<()> {
    let parsed = PasswordHash::new(stored).map_err(|_| HubError::InvalidCredentials)?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| HubError::InvalidCredentials)
}
