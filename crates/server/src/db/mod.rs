use anyhow::Result;
use sqlx::{sqlite::SqlitePoolOptions, QueryBuilder, Sqlite, SqlitePool};
use std::path::Path;

mod models;

pub use models::*;

/// Filters applied when reading chat sessions
#[derive(Debug, Clone, Default)]
pub struct SessionQuery {
    /// Session owner; anonymous sessions are owned by the empty id
    pub user_id: String,
    pub workspace_id: String,
    pub doc_id: Option<String>,
    pub action: Option<bool>,
    pub session_id: Option<String>,
    pub limit: Option<u32>,
    pub skip: Option<u32>,
}

impl SessionQuery {
    pub fn new(user_id: &str, workspace_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            workspace_id: workspace_id.to_string(),
            ..Default::default()
        }
    }

    fn push_filters<'a>(&'a self, builder: &mut QueryBuilder<'a, Sqlite>) {
        builder.push(" WHERE workspace_id = ").push_bind(&self.workspace_id);
        builder.push(" AND user_id = ").push_bind(&self.user_id);
        if let Some(doc_id) = &self.doc_id {
            builder.push(" AND doc_id = ").push_bind(doc_id);
        }
        if let Some(action) = self.action {
            builder.push(" AND action = ").push_bind(action);
        }
        if let Some(session_id) = &self.session_id {
            builder.push(" AND id = ").push_bind(session_id);
        }
    }
}

#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn new(path: &str) -> Result<Self> {
        // Ensure the directory exists
        if let Some(parent) = Path::new(path).parent() {
            std::fs::create_dir_all(parent)?;
        }

        let database_url = format!("sqlite:{}?mode=rwc", path);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&database_url)
            .await?;

        Ok(Self { pool })
    }

    /// Single-connection in-memory database, migrated and ready to use
    #[cfg(test)]
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        let db = Self { pool };
        db.run_migrations().await?;
        Ok(db)
    }

    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT UNIQUE NOT NULL,
                password_hash TEXT NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS workspaces (
                id TEXT PRIMARY KEY,
                owner_id TEXT NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS workspace_members (
                workspace_id TEXT NOT NULL,
                user_id TEXT NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                PRIMARY KEY (workspace_id, user_id)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS doc_permissions (
                workspace_id TEXT NOT NULL,
                doc_id TEXT NOT NULL,
                user_id TEXT NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                PRIMARY KEY (workspace_id, doc_id, user_id)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS user_quotas (
                user_id TEXT PRIMARY KEY,
                plan TEXT NOT NULL,
                copilot_action_limit INTEGER
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS chat_sessions (
                id TEXT PRIMARY KEY,
                workspace_id TEXT NOT NULL,
                doc_id TEXT NOT NULL,
                user_id TEXT NOT NULL,
                action BOOLEAN NOT NULL DEFAULT 0,
                model TEXT NOT NULL,
                prompt_name TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_chat_sessions_owner ON chat_sessions (user_id, workspace_id, doc_id)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS chat_messages (
                id TEXT PRIMARY KEY,
                session_id TEXT NOT NULL REFERENCES chat_sessions(id),
                role TEXT NOT NULL,
                content TEXT NOT NULL,
                attachments TEXT NOT NULL DEFAULT '[]',
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        tracing::info!("Database migrations completed");
        Ok(())
    }

    // User operations
    pub async fn create_user(&self, user: &User) -> Result<()> {
        sqlx::query(
            "INSERT INTO users (id, email, password_hash) VALUES (?, ?, ?)",
        )
        .bind(&user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, password_hash, created_at FROM users WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    // Workspace operations
    pub async fn create_workspace(&self, workspace: &Workspace) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("INSERT INTO workspaces (id, owner_id) VALUES (?, ?)")
            .bind(&workspace.id)
            .bind(&workspace.owner_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("INSERT INTO workspace_members (workspace_id, user_id) VALUES (?, ?)")
            .bind(&workspace.id)
            .bind(&workspace.owner_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    pub async fn get_workspace(&self, id: &str) -> Result<Option<Workspace>> {
        let workspace = sqlx::query_as::<_, Workspace>(
            "SELECT id, owner_id, created_at FROM workspaces WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(workspace)
    }

    pub async fn add_workspace_member(&self, workspace_id: &str, user_id: &str) -> Result<()> {
        sqlx::query(
            "INSERT OR IGNORE INTO workspace_members (workspace_id, user_id) VALUES (?, ?)",
        )
        .bind(workspace_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn is_workspace_member(&self, workspace_id: &str, user_id: &str) -> Result<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM workspace_members WHERE workspace_id = ? AND user_id = ?",
        )
        .bind(workspace_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count > 0)
    }

    pub async fn grant_doc_access(&self, workspace_id: &str, doc_id: &str, user_id: &str) -> Result<()> {
        sqlx::query(
            "INSERT OR IGNORE INTO doc_permissions (workspace_id, doc_id, user_id) VALUES (?, ?, ?)",
        )
        .bind(workspace_id)
        .bind(doc_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn has_doc_grant(&self, workspace_id: &str, doc_id: &str, user_id: &str) -> Result<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM doc_permissions WHERE workspace_id = ? AND doc_id = ? AND user_id = ?",
        )
        .bind(workspace_id)
        .bind(doc_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count > 0)
    }

    // Quota operations
    pub async fn get_user_quota(&self, user_id: &str) -> Result<Option<UserQuota>> {
        let quota = sqlx::query_as::<_, UserQuota>(
            "SELECT user_id, plan, copilot_action_limit FROM user_quotas WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(quota)
    }

    pub async fn set_user_quota(&self, quota: &UserQuota) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO user_quotas (user_id, plan, copilot_action_limit)
            VALUES (?, ?, ?)
            ON CONFLICT(user_id) DO UPDATE SET
                plan = excluded.plan,
                copilot_action_limit = excluded.copilot_action_limit
            "#,
        )
        .bind(&quota.user_id)
        .bind(&quota.plan)
        .bind(quota.copilot_action_limit)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    // Chat session operations
    pub async fn create_chat_session(&self, session: &ChatSession) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO chat_sessions (id, workspace_id, doc_id, user_id, action, model, prompt_name, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&session.id)
        .bind(&session.workspace_id)
        .bind(&session.doc_id)
        .bind(&session.user_id)
        .bind(session.action)
        .bind(&session.model)
        .bind(&session.prompt_name)
        .bind(&session.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_chat_session(&self, id: &str) -> Result<Option<ChatSession>> {
        let session = sqlx::query_as::<_, ChatSession>(
            "SELECT id, workspace_id, doc_id, user_id, action, model, prompt_name, created_at FROM chat_sessions WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(session)
    }

    pub async fn count_chat_sessions(&self, query: &SessionQuery) -> Result<i64> {
        let mut builder = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM chat_sessions");
        query.push_filters(&mut builder);
        let count: i64 = builder.build_query_scalar().fetch_one(&self.pool).await?;
        Ok(count)
    }

    pub async fn list_chat_sessions(&self, query: &SessionQuery) -> Result<Vec<ChatSession>> {
        let mut builder = QueryBuilder::<Sqlite>::new(
            "SELECT id, workspace_id, doc_id, user_id, action, model, prompt_name, created_at FROM chat_sessions",
        );
        query.push_filters(&mut builder);
        builder.push(" ORDER BY created_at ASC, rowid ASC");
        // SQLite needs a LIMIT before an OFFSET; -1 means no limit
        if query.limit.is_some() || query.skip.is_some() {
            builder
                .push(" LIMIT ")
                .push_bind(query.limit.map(i64::from).unwrap_or(-1))
                .push(" OFFSET ")
                .push_bind(i64::from(query.skip.unwrap_or(0)));
        }
        let sessions = builder
            .build_query_as::<ChatSession>()
            .fetch_all(&self.pool)
            .await?;
        Ok(sessions)
    }

    // Message operations
    pub async fn save_chat_message(&self, message: &ChatMessage) -> Result<()> {
        sqlx::query(
            "INSERT INTO chat_messages (id, session_id, role, content, attachments, created_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&message.id)
        .bind(&message.session_id)
        .bind(&message.role)
        .bind(&message.content)
        .bind(&message.attachments)
        .bind(&message.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_messages_for_session(&self, session_id: &str) -> Result<Vec<ChatMessage>> {
        let messages = sqlx::query_as::<_, ChatMessage>(
            "SELECT id, session_id, role, content, attachments, created_at FROM chat_messages WHERE session_id = ? ORDER BY created_at ASC, rowid ASC",
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(messages)
    }
}
