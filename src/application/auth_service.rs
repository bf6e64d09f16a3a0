//! Identity flows over the generic client verbs
//!
//! The only state touched here is the session token: `login` and `register`
//! write it, `logout` clears it.

use tracing::{info, warn};

use crate::domain::auth::{
    AuthResponse, LoginCredentials, ProfileUpdate, RegisterData, RegistrationForm, User,
};
use crate::infrastructure::api_client::ApiClient;
use crate::infrastructure::error::ApiError;

#[derive(Debug, Clone)]
pub struct AuthService {
    client: ApiClient,
}

impl AuthService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub fn is_authenticated(&self) -> bool {
        self.client.session().is_authenticated()
    }

    /// Validate the form, create the account, then log in with it
    pub async fn register(&self, form: RegistrationForm) -> Result<User, ApiError> {
        let data = form.validate()?;
        let user: User = self.client.post::<User, RegisterData>("/api/auth/register", &data).await?;
        info!("👤 Registered user {}", user.username);

        self.login(&LoginCredentials {
            email: data.email,
            password: data.password,
        })
        .await?;
        Ok(user)
    }

    pub async fn login(&self, credentials: &LoginCredentials) -> Result<AuthResponse, ApiError> {
        let auth: AuthResponse = self.client.post("/api/auth/login", credentials).await?;
        self.store_token(&auth.access_token)?;
        info!("🔓 Logged in as {}", credentials.email);
        Ok(auth)
    }

    pub fn logout(&self) -> Result<(), ApiError> {
        self.client.session().clear_token().map_err(|e| {
            ApiError::validation("session", format!("Failed to clear session: {e}"))
        })?;
        info!("👋 Logged out");
        Ok(())
    }

    pub async fn current_user(&self) -> Result<User, ApiError> {
        self.client.get("/api/auth/me").await
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<User, ApiError> {
        let user: User = self.client.put("/api/auth/me", update).await?;
        info!("✏️ Profile updated for {}", user.username);
        Ok(user)
    }

    /// User for a stored token. A token the backend rejects is cleared.
    pub async fn restore(&self) -> Option<User> {
        if !self.is_authenticated() {
            return None;
        }
        match self.current_user().await {
            Ok(user) => Some(user),
            Err(e) => {
                warn!("⚠️ Stored session is no longer valid: {}", e);
                if let Err(clear_err) = self.client.session().clear_token() {
                    warn!("Failed to clear stale token: {}", clear_err);
                }
                None
            }
        }
    }

    fn store_token(&self, token: &str) -> Result<(), ApiError> {
        self.client.session().set_token(token).map_err(|e| {
            ApiError::validation("session", format!("Failed to store session: {e}"))
        })
    }
}
