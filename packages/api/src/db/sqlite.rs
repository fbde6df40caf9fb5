//! SQLite implementation of [`Datastore`].

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};

use super::Datastore;
use crate::error::StorageError;
use crate::models::{Album, Image, NewUser, Role, Session, User};
use crate::settings::DatabaseSettings;

#[derive(FromRow)]
struct UserRow {
    id: i64,
    name: String,
    username: String,
    password_hash: String,
    role: i64,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            name: row.name,
            username: row.username,
            password_hash: row.password_hash,
            role: Role::from_code(row.role),
        }
    }
}

#[derive(FromRow)]
struct AlbumRow {
    id: i64,
    name: String,
    id_user: i64,
}

impl From<AlbumRow> for Album {
    fn from(row: AlbumRow) -> Self {
        Album {
            id: row.id,
            name: row.name,
            owner_id: row.id_user,
        }
    }
}

#[derive(FromRow)]
struct ImageRow {
    id: i64,
    name: String,
    id_user: i64,
    id_album: i64,
}

impl From<ImageRow> for Image {
    fn from(row: ImageRow) -> Self {
        Image {
            id: row.id,
            name: row.name,
            owner_id: row.id_user,
            album_id: row.id_album,
        }
    }
}

#[derive(FromRow)]
struct SessionRow {
    id: String,
    id_user: i64,
    datetimestamp_lastlogin: DateTime<Utc>,
}

impl From<SessionRow> for Session {
    fn from(row: SessionRow) -> Self {
        Session {
            token: row.id,
            user_id: row.id_user,
            created_at: row.datetimestamp_lastlogin,
        }
    }
}

const USER_COLUMNS: &str = "SELECT id, name, username, password_hash, role FROM user";

/// Pool-backed datastore. Cloning shares the pool.
#[derive(Debug, Clone)]
pub struct SqlStore {
    pool: SqlitePool,
    query_timeout: Duration,
}

impl SqlStore {
    pub fn new(pool: SqlitePool, query_timeout: Duration) -> Self {
        Self {
            pool,
            query_timeout,
        }
    }

    /// Connect, migrate and wrap the pool.
    pub async fn connect(settings: &DatabaseSettings) -> Result<Self, StorageError> {
        let pool = super::connect(settings).await?;
        Ok(Self::new(pool, settings.query_timeout()))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Insert a user and return its id.
    pub async fn insert_user(&self, user: &NewUser) -> Result<i64, StorageError> {
        let id: (i64,) = self
            .bounded(
                sqlx::query_as(
                    "INSERT INTO user (name, username, password_hash, role) VALUES (?, ?, ?, ?) RETURNING id",
                )
                .bind(&user.name)
                .bind(&user.username)
                .bind(&user.password_hash)
                .bind(user.role.code())
                .fetch_one(&self.pool),
            )
            .await?;
        Ok(id.0)
    }

    async fn bounded<T, F>(&self, query: F) -> Result<T, StorageError>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        match tokio::time::timeout(self.query_timeout, query).await {
            Ok(result) => result.map_err(StorageError::from),
            Err(_) => Err(StorageError::Unavailable(format!(
                "query exceeded {}s",
                self.query_timeout.as_secs()
            ))),
        }
    }
}

impl Datastore for SqlStore {
    async fn user_by_username(&self, username: &str) -> Result<Option<User>, StorageError> {
        let row: Option<UserRow> = self
            .bounded(
                sqlx::query_as(&format!("{USER_COLUMNS} WHERE username = ?"))
                    .bind(username)
                    .fetch_optional(&self.pool),
            )
            .await?;
        Ok(row.map(User::from))
    }

    async fn user_by_id(&self, id: i64) -> Result<Option<User>, StorageError> {
        let row: Option<UserRow> = self
            .bounded(
                sqlx::query_as(&format!("{USER_COLUMNS} WHERE id = ?"))
                    .bind(id)
                    .fetch_optional(&self.pool),
            )
            .await?;
        Ok(row.map(User::from))
    }

    async fn regular_users(&self) -> Result<Vec<User>, StorageError> {
        let rows: Vec<UserRow> = self
            .bounded(
                sqlx::query_as(&format!("{USER_COLUMNS} WHERE role != ? ORDER BY name, id"))
                    .bind(Role::ADMIN_CODE)
                    .fetch_all(&self.pool),
            )
            .await?;
        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn album_by_id(&self, id: i64) -> Result<Option<Album>, StorageError> {
        let row: Option<AlbumRow> = self
            .bounded(
                sqlx::query_as("SELECT id, name, id_user FROM album WHERE id = ?")
                    .bind(id)
                    .fetch_optional(&self.pool),
            )
            .await?;
        Ok(row.map(Album::from))
    }

    async fn albums_for(&self, owner_id: i64) -> Result<Vec<Album>, StorageError> {
        let rows: Vec<AlbumRow> = self
            .bounded(
                sqlx::query_as("SELECT id, name, id_user FROM album WHERE id_user = ? ORDER BY name, id")
                    .bind(owner_id)
                    .fetch_all(&self.pool),
            )
            .await?;
        Ok(rows.into_iter().map(Album::from).collect())
    }

    async fn images_in(&self, album_id: i64, owner_id: i64) -> Result<Vec<Image>, StorageError> {
        let rows: Vec<ImageRow> = self
            .bounded(
                sqlx::query_as(
                    "SELECT id, name, id_user, id_album FROM image WHERE id_album = ? AND id_user = ? ORDER BY name, id",
                )
                .bind(album_id)
                .bind(owner_id)
                .fetch_all(&self.pool),
            )
            .await?;
        Ok(rows.into_iter().map(Image::from).collect())
    }

    async fn replace_session(&self, session: &Session) -> Result<(), StorageError> {
        let pool = &self.pool;
        self.bounded(async move {
            let mut tx = pool.begin().await?;
            sqlx::query("DELETE FROM session WHERE id_user = ?")
                .bind(session.user_id)
                .execute(&mut *tx)
                .await?;
            sqlx::query("INSERT INTO session (id, id_user, datetimestamp_lastlogin) VALUES (?, ?, ?)")
                .bind(&session.token)
                .bind(session.user_id)
                .bind(session.created_at)
                .execute(&mut *tx)
                .await?;
            tx.commit().await
        })
        .await
    }

    async fn session_by_token(&self, token: &str) -> Result<Option<Session>, StorageError> {
        let row: Option<SessionRow> = self
            .bounded(
                sqlx::query_as("SELECT id, id_user, datetimestamp_lastlogin FROM session WHERE id = ?")
                    .bind(token)
                    .fetch_optional(&self.pool),
            )
            .await?;
        Ok(row.map(Session::from))
    }

    async fn delete_session(&self, token: &str) -> Result<u64, StorageError> {
        let done = self
            .bounded(
                sqlx::query("DELETE FROM session WHERE id = ?")
                    .bind(token)
                    .execute(&self.pool),
            )
            .await?;
        Ok(done.rows_affected())
    }

    async fn delete_sessions_for(&self, user_id: i64) -> Result<u64, StorageError> {
        let done = self
            .bounded(
                sqlx::query("DELETE FROM session WHERE id_user = ?")
                    .bind(user_id)
                    .execute(&self.pool),
            )
            .await?;
        Ok(done.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store() -> SqlStore {
        SqlStore::connect(&DatabaseSettings::in_memory()).await.unwrap()
    }

    async fn add_user(store: &SqlStore, username: &str, role: Role) -> i64 {
        store
            .insert_user(&NewUser {
                name: username.to_uppercase(),
                username: username.into(),
                password_hash: "hash".into(),
                role,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_user_lookup_is_exact() {
        let store = store().await;
        let id = add_user(&store, "abey", Role::Regular).await;

        let user = store.user_by_username("abey").await.unwrap().unwrap();
        assert_eq!(user.id, id);
        assert_eq!(user.role, Role::Regular);

        assert!(store.user_by_username("ABEY").await.unwrap().is_none());
        assert!(store.user_by_username("abey\" OR \"1\"=\"1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_role_round_trips_through_storage() {
        let store = store().await;
        let admin = add_user(&store, "admin", Role::Admin).await;
        add_user(&store, "abey", Role::Regular).await;

        let stored: (i64,) = sqlx::query_as("SELECT role FROM user WHERE id = ?")
            .bind(admin)
            .fetch_one(store.pool())
            .await
            .unwrap();
        assert_eq!(stored.0, -7);

        let regular = store.regular_users().await.unwrap();
        assert_eq!(regular.len(), 1);
        assert_eq!(regular[0].username, "abey");
    }

    #[tokio::test]
    async fn test_replace_session_keeps_one_row_per_user() {
        let store = store().await;
        let id = add_user(&store, "abey", Role::Regular).await;
        let now = Utc::now();

        for token in ["first", "second"] {
            store
                .replace_session(&Session {
                    token: token.into(),
                    user_id: id,
                    created_at: now,
                })
                .await
                .unwrap();
        }

        assert!(store.session_by_token("first").await.unwrap().is_none());
        let session = store.session_by_token("second").await.unwrap().unwrap();
        assert_eq!(session.user_id, id);
        assert_eq!(session.created_at.timestamp(), now.timestamp());

        assert_eq!(store.delete_sessions_for(id).await.unwrap(), 1);
        assert_eq!(store.delete_session("second").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_images_are_scoped_to_owner() {
        let store = store().await;
        let owner = add_user(&store, "abey", Role::Regular).await;
        let other = add_user(&store, "bob", Role::Regular).await;

        let album: (i64,) = sqlx::query_as("INSERT INTO album (name, id_user) VALUES (?, ?) RETURNING id")
            .bind("Holidays")
            .bind(owner)
            .fetch_one(store.pool())
            .await
            .unwrap();
        sqlx::query("INSERT INTO image (name, id_user, id_album) VALUES (?, ?, ?)")
            .bind("beach.jpg")
            .bind(owner)
            .bind(album.0)
            .execute(store.pool())
            .await
            .unwrap();

        assert_eq!(store.albums_for(owner).await.unwrap().len(), 1);
        assert_eq!(store.album_by_id(album.0).await.unwrap().unwrap().owner_id, owner);
        assert_eq!(store.images_in(album.0, owner).await.unwrap().len(), 1);
        assert!(store.images_in(album.0, other).await.unwrap().is_empty());
    }
}
