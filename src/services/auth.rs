use crate::{
    config::auth::AuthConfig,
    error::{AppError, AppResult},
    models::{user, User, UserModel},
    services::email::EmailService,
    utils::{
        encode_session_token, encode_verification_token, generate_reset_token, hash_password,
        password::verify_dummy, verify_password, verify_token, TokenPurpose,
    },
};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ActiveValue, ColumnTrait, DatabaseConnection, EntityTrait,
    QueryFilter, SqlErr,
};

/// Account lifecycle: registration, verification, login, password reset.
///
/// All durability guarantees live in the store: uniqueness via the
/// users-table unique indexes, reset-token consumption via a conditional
/// single-row UPDATE.
pub struct AuthService {
    db: DatabaseConnection,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            config: AuthConfig::from_env(),
        }
    }

    /// Register a new user (unverified) and send the verification email.
    ///
    /// The duplicate pre-check is best-effort; the unique indexes are the
    /// hard guarantee, so a losing racer still gets `DuplicateEmail`.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
        email_service: &EmailService,
    ) -> AppResult<UserModel> {
        if self.email_exists(email).await? {
            return Err(AppError::DuplicateEmail);
        }
        if self.username_exists(username).await? {
            return Err(AppError::Validation(
                "Username already in use".to_string(),
            ));
        }

        // Hashing failure aborts before anything is written.
        let password_hash = hash_password(password)?;
        let now = chrono::Utc::now().naive_utc();

        let new_user = user::ActiveModel {
            username: ActiveValue::Set(username.to_string()),
            email: ActiveValue::Set(email.to_string()),
            password_hash: ActiveValue::Set(password_hash),
            is_verified: ActiveValue::Set(false),
            reset_token: ActiveValue::Set(None),
            reset_token_created_at: ActiveValue::Set(None),
            created_at: ActiveValue::Set(now),
            updated_at: ActiveValue::Set(now),
            ..Default::default()
        };

        let user = match new_user.insert(&self.db).await {
            Ok(u) => u,
            Err(e) => {
                // The violated constraint decides the error kind, same as
                // the pre-checks above.
                return Err(match e.sql_err() {
                    Some(SqlErr::UniqueConstraintViolation(msg)) if msg.contains("username") => {
                        AppError::Validation("Username already in use".to_string())
                    }
                    Some(SqlErr::UniqueConstraintViolation(_)) => AppError::DuplicateEmail,
                    _ => e.into(),
                });
            }
        };

        let token = encode_verification_token(user.id)?;

        // The user row is committed; a failed or slow send must not undo it.
        if let Err(e) = email_service.send_verification_email(&user.email, &token).await {
            tracing::warn!("Failed to send verification email: {e}");
        }

        Ok(user)
    }

    /// Flip `is_verified` for the user bound by a signed verification token.
    /// Idempotent: re-verifying an already-verified user is a no-op success.
    pub async fn verify_email(&self, token: &str) -> AppResult<()> {
        let user_id = verify_token(token, TokenPurpose::Verification)?;

        let user = User::find_by_id(user_id)
            .one(&self.db)
            .await?
            .ok_or(AppError::TokenInvalid)?;

        if user.is_verified {
            return Ok(());
        }

        let now = chrono::Utc::now().naive_utc();
        let mut active: user::ActiveModel = user.into();
        active.is_verified = ActiveValue::Set(true);
        active.updated_at = ActiveValue::Set(now);
        active.update(&self.db).await?;
        Ok(())
    }

    /// Authenticate and issue a session token.
    ///
    /// Unknown email and wrong password both return `InvalidCredentials`;
    /// the unknown-email path burns a dummy hash so timing does not leak
    /// which half failed. Verification state is only revealed once the
    /// password has matched.
    pub async fn login(&self, email: &str, password: &str) -> AppResult<(UserModel, String)> {
        let user = User::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await?;

        let user = match user {
            Some(u) => u,
            None => {
                verify_dummy(password);
                return Err(AppError::InvalidCredentials);
            }
        };

        if !verify_password(password, &user.password_hash)? {
            return Err(AppError::InvalidCredentials);
        }

        if !user.is_verified {
            return Err(AppError::EmailNotVerified);
        }

        let token = encode_session_token(user.id)?;
        Ok((user, token))
    }

    /// Store a fresh opaque reset token on the user and send the reset
    /// email. Overwrites any pending token, so only the latest request is
    /// honored.
    pub async fn request_password_reset(
        &self,
        email: &str,
        email_service: &EmailService,
    ) -> AppResult<()> {
        let user = User::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await?
            .ok_or(AppError::UserNotFound)?;

        let token = generate_reset_token()?;
        let now = chrono::Utc::now().naive_utc();

        let user_email = user.email.clone();
        let mut active: user::ActiveModel = user.into();
        active.reset_token = ActiveValue::Set(Some(token.clone()));
        active.reset_token_created_at = ActiveValue::Set(Some(now));
        active.updated_at = ActiveValue::Set(now);
        active.update(&self.db).await?;

        if let Err(e) = email_service
            .send_password_reset_email(&user_email, &token)
            .await
        {
            tracing::warn!("Failed to send password reset email: {e}");
        }

        Ok(())
    }

    /// Consume a reset token: replace the password hash and clear the token
    /// in one conditional UPDATE keyed on the token itself. A token that was
    /// never issued, already consumed, or has aged past the TTL yields
    /// `TokenInvalid`.
    pub async fn confirm_password_reset(&self, token: &str, new_password: &str) -> AppResult<()> {
        let user = User::find()
            .filter(user::Column::ResetToken.eq(token))
            .one(&self.db)
            .await?
            .ok_or(AppError::TokenInvalid)?;

        let now = chrono::Utc::now().naive_utc();
        if let Some(created_at) = user.reset_token_created_at {
            let age = now.signed_duration_since(created_at);
            if age.num_seconds() > self.config.reset_token_ttl_seconds {
                return Err(AppError::TokenInvalid);
            }
        }

        let new_hash = hash_password(new_password)?;

        // Filtering on the token makes the clear + replace atomic with
        // respect to a concurrent consumer of the same token.
        let result = User::update_many()
            .col_expr(user::Column::PasswordHash, Expr::value(new_hash))
            .col_expr(user::Column::ResetToken, Expr::value(Option::<String>::None))
            .col_expr(
                user::Column::ResetTokenCreatedAt,
                Expr::value(Option::<chrono::NaiveDateTime>::None),
            )
            .col_expr(user::Column::UpdatedAt, Expr::value(now))
            .filter(user::Column::Id.eq(user.id))
            .filter(user::Column::ResetToken.eq(token))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(AppError::TokenInvalid);
        }

        Ok(())
    }

    async fn email_exists(&self, email: &str) -> AppResult<bool> {
        let found = User::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await?;
        Ok(found.is_some())
    }

    async fn username_exists(&self, username: &str) -> AppResult<bool> {
        let found = User::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await?;
        Ok(found.is_some())
    }
}
