use chrono::Utc;
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::{
    auth::Principal,
    error::{AppError, AppResult},
    models::{AuthResponse, LoginRequest, RegisterRequest, Role, User, UserResponse},
    password::PasswordService,
    repository::{RepositoryError, RepositoryState},
    token::TokenService,
};

/// Login name accepted for the bootstrap admin alongside the configured email.
const BOOTSTRAP_LOGIN: &str = "admin";
const ADMIN_FULL_NAME: &str = "Administrator";

/// AccountService
///
/// Registration, login and the bootstrap admin account.
#[derive(Clone)]
pub struct AccountService {
    repo: RepositoryState,
    tokens: TokenService,
    passwords: PasswordService,
    admin_email: String,
    admin_password: String,
}

impl AccountService {
    pub fn new(
        repo: RepositoryState,
        tokens: TokenService,
        passwords: PasswordService,
        admin_email: impl Into<String>,
        admin_password: impl Into<String>,
    ) -> Self {
        Self {
            repo,
            tokens,
            passwords,
            admin_email: admin_email.into(),
            admin_password: admin_password.into(),
        }
    }

    // Hashing is CPU-bound; it runs on the blocking pool.
    async fn hash_password(&self, plaintext: &str) -> AppResult<String> {
        let passwords = self.passwords.clone();
        let plaintext = plaintext.to_string();

        tokio::task::spawn_blocking(move || passwords.hash(&plaintext))
            .await
            .map_err(|e| AppError::Upstream(format!("hashing task failed: {e}")))?
            .map_err(|e| AppError::Upstream(e.to_string()))
    }

    async fn verify_password(&self, plaintext: &str, digest: &str) -> AppResult<bool> {
        let passwords = self.passwords.clone();
        let plaintext = plaintext.to_string();
        let digest = digest.to_string();

        tokio::task::spawn_blocking(move || passwords.verify(&plaintext, &digest))
            .await
            .map_err(|e| AppError::Upstream(format!("verification task failed: {e}")))
    }

    fn authenticated(&self, user: &User) -> AppResult<AuthResponse> {
        let token = self
            .tokens
            .issue(user.id, &user.email, user.role)
            .map_err(|e| AppError::Upstream(e.to_string()))?;

        Ok(AuthResponse {
            token,
            user: UserResponse::from(user),
        })
    }

    /// register
    ///
    /// Creates an employer or job seeker account and signs it in. Admin accounts cannot be
    /// registered. `company` is only kept for employers.
    pub async fn register(&self, req: RegisterRequest) -> AppResult<AuthResponse> {
        req.validate()?;

        let role: Role = req.role.trim().parse()?;
        if role == Role::Admin {
            return Err(AppError::invalid("Invalid role"));
        }

        // Stored the way login looks it up.
        let email = req.email.trim().to_string();

        if self.repo.find_user_by_email(&email).await?.is_some() {
            return Err(AppError::conflict("Email already registered"));
        }

        let company = match role {
            Role::Employer => req
                .company
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty()),
            _ => None,
        };

        let user = User {
            id: Uuid::new_v4(),
            email,
            password_hash: self.hash_password(&req.password).await?,
            role,
            full_name: req.full_name.trim().to_string(),
            company,
            created_at: Utc::now(),
        };

        // A concurrent registration can still win between the check and the insert.
        let user = self.repo.insert_user(&user).await.map_err(|e| match e {
            RepositoryError::Duplicate(_) => AppError::conflict("Email already registered"),
            other => other.into(),
        })?;

        tracing::info!(user_id = %user.id, role = %user.role, "account registered");
        self.authenticated(&user)
    }

    /// login
    ///
    /// Email and password against the stored digest. The bootstrap admin pair (the configured
    /// email, or plain `admin`, with the configured password) always signs in as the admin
    /// account, creating it first if it is missing.
    pub async fn login(&self, req: LoginRequest) -> AppResult<AuthResponse> {
        let email = req.email.trim();

        let is_bootstrap = (email == BOOTSTRAP_LOGIN || email == self.admin_email)
            && bool::from(req.password.as_bytes().ct_eq(self.admin_password.as_bytes()));
        if is_bootstrap {
            let admin = self.ensure_admin().await?;
            tracing::info!(user_id = %admin.id, "bootstrap admin signed in");
            return self.authenticated(&admin);
        }

        let invalid = || AppError::unauthenticated("Invalid credentials");

        let user = self
            .repo
            .find_user_by_email(email)
            .await?
            .ok_or_else(invalid)?;

        if !self.verify_password(&req.password, &user.password_hash).await? {
            tracing::warn!(user_id = %user.id, "login rejected: wrong password");
            return Err(invalid());
        }

        tracing::info!(user_id = %user.id, role = %user.role, "signed in");
        self.authenticated(&user)
    }

    /// ensure_admin
    ///
    /// Create-if-absent for the admin account keyed on the configured email. Safe to call on
    /// every startup. Fails with `Forbidden` when a non-admin account already holds that email.
    pub async fn ensure_admin(&self) -> AppResult<User> {
        if let Some(existing) = self.repo.find_user_by_email(&self.admin_email).await? {
            return Self::require_admin(existing);
        }

        let admin = User {
            id: Uuid::new_v4(),
            email: self.admin_email.clone(),
            password_hash: self.hash_password(&self.admin_password).await?,
            role: Role::Admin,
            full_name: ADMIN_FULL_NAME.to_string(),
            company: None,
            created_at: Utc::now(),
        };

        match self.repo.insert_user(&admin).await {
            Ok(admin) => {
                tracing::info!(user_id = %admin.id, email = %admin.email, "admin account created");
                Ok(admin)
            }
            // Another instance created it first.
            Err(RepositoryError::Duplicate(_)) => self
                .repo
                .find_user_by_email(&self.admin_email)
                .await?
                .ok_or_else(|| AppError::Upstream("admin account vanished".to_string()))
                .and_then(Self::require_admin),
            Err(e) => Err(e.into()),
        }
    }

    fn require_admin(user: User) -> AppResult<User> {
        if user.role != Role::Admin {
            tracing::warn!(
                user_id = %user.id,
                role = %user.role,
                "configured admin email belongs to a non-admin account"
            );
            return Err(AppError::forbidden(
                "Admin email is registered to a non-admin account",
            ));
        }
        Ok(user)
    }

    pub async fn current_user(&self, principal: &Principal) -> AppResult<UserResponse> {
        let user = self
            .repo
            .find_user(principal.id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;

        Ok(UserResponse::from(&user))
    }
}
