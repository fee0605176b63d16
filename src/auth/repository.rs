use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::auth::models::{NewRefreshToken, NewUser, RefreshToken, User};
use crate::db::{DbPool, RepoError};
use crate::schema::{refresh_tokens, users};

/// Storage for users and their sessions.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a user. Fails with `RepoError::Conflict` when the email is taken.
    async fn create_user(&self, new_user: NewUser) -> Result<User, RepoError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError>;

    async fn create_session(&self, token: NewRefreshToken) -> Result<RefreshToken, RepoError>;

    async fn find_session(&self, id: Uuid) -> Result<Option<RefreshToken>, RepoError>;

    async fn find_session_by_hash(&self, token_hash: &str)
        -> Result<Option<RefreshToken>, RepoError>;

    async fn delete_session(&self, id: Uuid) -> Result<(), RepoError>;
}

pub struct PgUserRepository {
    pool: DbPool,
}

impl PgUserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create_user(&self, new_user: NewUser) -> Result<User, RepoError> {
        let mut conn = self.pool.get().await?;

        diesel::insert_into(users::table)
            .values(&new_user)
            .returning(User::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(|e| match e {
                diesel::result::Error::DatabaseError(
                    diesel::result::DatabaseErrorKind::UniqueViolation,
                    _,
                ) => RepoError::Conflict("email"),
                _ => e.into(),
            })
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let mut conn = self.pool.get().await?;

        Ok(users::table
            .filter(users::email.eq(email))
            .select(User::as_select())
            .first(&mut conn)
            .await
            .optional()?)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        let mut conn = self.pool.get().await?;

        Ok(users::table
            .filter(users::id.eq(id))
            .select(User::as_select())
            .first(&mut conn)
            .await
            .optional()?)
    }

    async fn create_session(&self, token: NewRefreshToken) -> Result<RefreshToken, RepoError> {
        let mut conn = self.pool.get().await?;

        Ok(diesel::insert_into(refresh_tokens::table)
            .values(&token)
            .returning(RefreshToken::as_returning())
            .get_result(&mut conn)
            .await?)
    }

    async fn find_session(&self, id: Uuid) -> Result<Option<RefreshToken>, RepoError> {
        let mut conn = self.pool.get().await?;

        Ok(refresh_tokens::table
            .filter(refresh_tokens::id.eq(id))
            .select(RefreshToken::as_select())
            .first(&mut conn)
            .await
            .optional()?)
    }

    async fn find_session_by_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<RefreshToken>, RepoError> {
        let mut conn = self.pool.get().await?;

        Ok(refresh_tokens::table
            .filter(refresh_tokens::token_hash.eq(token_hash))
            .select(RefreshToken::as_select())
            .first(&mut conn)
            .await
            .optional()?)
    }

    async fn delete_session(&self, id: Uuid) -> Result<(), RepoError> {
        let mut conn = self.pool.get().await?;

        diesel::delete(refresh_tokens::table.filter(refresh_tokens::id.eq(id)))
            .execute(&mut conn)
            .await?;
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<Uuid, User>>,
    sessions: RwLock<HashMap<Uuid, RefreshToken>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create_user(&self, new_user: NewUser) -> Result<User, RepoError> {
        let mut users = self.users.write().await;

        if users.values().any(|u| u.email == new_user.email) {
            return Err(RepoError::Conflict("email"));
        }

        let now = Utc::now().naive_utc();
        let user = User {
            id: Uuid::new_v4(),
            name: new_user.name,
            email: new_user.email,
            password_hash: new_user.password_hash,
            created_at: now,
            updated_at: now,
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        let users = self.users.read().await;
        Ok(users.get(&id).cloned())
    }

    async fn create_session(&self, token: NewRefreshToken) -> Result<RefreshToken, RepoError> {
        let mut sessions = self.sessions.write().await;

        let session = RefreshToken {
            id: Uuid::new_v4(),
            user_id: token.user_id,
            token_hash: token.token_hash,
            expires_at: token.expires_at,
            created_at: Utc::now().naive_utc(),
        };
        sessions.insert(session.id, session.clone());
        Ok(session)
    }

    async fn find_session(&self, id: Uuid) -> Result<Option<RefreshToken>, RepoError> {
        let sessions = self.sessions.read().await;
        Ok(sessions.get(&id).cloned())
    }

    async fn find_session_by_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<RefreshToken>, RepoError> {
        let sessions = self.sessions.read().await;
        Ok(sessions.values().find(|s| s.token_hash == token_hash).cloned())
    }

    async fn delete_session(&self, id: Uuid) -> Result<(), RepoError> {
        let mut sessions = self.sessions.write().await;
        sessions.remove(&id);
        Ok(())
    }
}
