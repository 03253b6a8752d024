use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use roster_common::{Role, User};

/// SQLite-backed user repository, the sole interface to the users table.
///
/// The connection is locked per query; callers never observe a
/// partially applied statement.
pub struct UserStore {
    conn: Mutex<Connection>,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("User already exists")]
    Conflict,
    #[error("IO error: {0}")]
    IoError(String),
}

const USER_COLUMNS: &str =
    "id, subject, email, display_name, role, is_active, created_at, last_login";

/// Raw row as stored: timestamps and role still text.
type UserRow = (
    i64,
    String,
    Option<String>,
    Option<String>,
    String,
    i64,
    String,
    Option<String>,
);

fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
    ))
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::DatabaseError(format!("Invalid timestamp '{}': {}", value, e)))
}

fn into_user(row: UserRow) -> Result<User, StoreError> {
    let (id, subject, email, display_name, role, is_active, created_at, last_login) = row;
    let role = Role::parse(&role).ok_or_else(|| {
        StoreError::DatabaseError(format!("Invalid role '{}' for user {}", role, id))
    })?;
    Ok(User {
        id,
        subject,
        email,
        display_name,
        role,
        is_active: is_active != 0,
        created_at: parse_timestamp(&created_at)?,
        last_login: last_login.as_deref().map(parse_timestamp).transpose()?,
    })
}

fn map_sqlite_error(e: rusqlite::Error) -> StoreError {
    match &e {
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            StoreError::Conflict
        }
        _ => StoreError::DatabaseError(e.to_string()),
    }
}

impl UserStore {
    /// Open (or create) the database at `database_url` and ensure the
    /// users table exists. Accepts `sqlite:<path>`, a bare path, or
    /// `:memory:`.
    pub fn new(database_url: &str) -> Result<Self, StoreError> {
        // Parse sqlite: prefix if present
        let path = database_url.strip_prefix("sqlite:").unwrap_or(database_url);

        // Create parent directories if needed
        if path != ":memory:" {
            if let Some(parent) = Path::new(path).parent() {
                std::fs::create_dir_all(parent).map_err(|e| StoreError::IoError(e.to_string()))?;
            }
        }

        let conn = Connection::open(path).map_err(|e| StoreError::DatabaseError(e.to_string()))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                subject TEXT NOT NULL UNIQUE,
                email TEXT UNIQUE,
                display_name TEXT,
                role TEXT NOT NULL DEFAULT 'user',
                is_active INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL,
                last_login TEXT
            )",
            [],
        )
        .map_err(|e| StoreError::DatabaseError(e.to_string()))?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_users_created_at ON users(created_at)",
            [],
        )
        .map_err(|e| StoreError::DatabaseError(e.to_string()))?;

        tracing::info!("User store initialized with database: {}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|e| StoreError::DatabaseError(e.to_string()))
    }

    fn query_by_id(conn: &Connection, id: i64) -> Result<Option<User>, StoreError> {
        conn.query_row(
            &format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS),
            params![id],
            read_row,
        )
        .optional()
        .map_err(map_sqlite_error)?
        .map(into_user)
        .transpose()
    }

    fn query_by_subject(conn: &Connection, subject: &str) -> Result<Option<User>, StoreError> {
        conn.query_row(
            &format!("SELECT {} FROM users WHERE subject = ?1", USER_COLUMNS),
            params![subject],
            read_row,
        )
        .optional()
        .map_err(map_sqlite_error)?
        .map(into_user)
        .transpose()
    }

    /// Look up a user by the identity provider's subject id.
    pub fn find_by_subject(&self, subject: &str) -> Result<Option<User>, StoreError> {
        let conn = self.lock()?;
        Self::query_by_subject(&conn, subject)
    }

    /// Look up a user by internal id.
    pub fn find_by_id(&self, id: i64) -> Result<Option<User>, StoreError> {
        let conn = self.lock()?;
        Self::query_by_id(&conn, id)
    }

    /// List all users, newest first.
    pub fn list_all(&self) -> Result<Vec<User>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM users ORDER BY created_at DESC, id DESC",
                USER_COLUMNS
            ))
            .map_err(|e| StoreError::DatabaseError(e.to_string()))?;

        let rows = stmt
            .query_map([], read_row)
            .map_err(|e| StoreError::DatabaseError(e.to_string()))?;

        let mut users = Vec::new();
        for row in rows {
            users.push(into_user(row.map_err(|e| StoreError::DatabaseError(e.to_string()))?)?);
        }
        Ok(users)
    }

    /// Insert a new user. Active by default; `created_at` is set here.
    /// A uniqueness violation on subject or email surfaces as
    /// [`StoreError::Conflict`].
    pub fn insert(
        &self,
        subject: &str,
        email: Option<&str>,
        display_name: Option<&str>,
        role: Role,
    ) -> Result<User, StoreError> {
        let conn = self.lock()?;
        let now = Utc::now();

        conn.execute(
            "INSERT INTO users (subject, email, display_name, role, is_active, created_at)
             VALUES (?1, ?2, ?3, ?4, 1, ?5)",
            params![subject, email, display_name, role.as_str(), now.to_rfc3339()],
        )
        .map_err(map_sqlite_error)?;

        let id = conn.last_insert_rowid();
        tracing::info!("Created user {} ({})", id, subject);

        Ok(User {
            id,
            subject: subject.to_string(),
            email: email.map(String::from),
            display_name: display_name.map(String::from),
            role,
            is_active: true,
            created_at: now,
            last_login: None,
        })
    }

    /// Set the active flag. Returns the updated user, or None when no
    /// row matches.
    pub fn set_active(&self, id: i64, is_active: bool) -> Result<Option<User>, StoreError> {
        let conn = self.lock()?;
        let changed = conn
            .execute(
                "UPDATE users SET is_active = ?1 WHERE id = ?2",
                params![is_active as i64, id],
            )
            .map_err(map_sqlite_error)?;

        if changed == 0 {
            return Ok(None);
        }
        Self::query_by_id(&conn, id)
    }

    /// Set the role. Returns the updated user, or None when no row
    /// matches.
    pub fn set_role(&self, id: i64, role: Role) -> Result<Option<User>, StoreError> {
        let conn = self.lock()?;
        let changed = conn
            .execute(
                "UPDATE users SET role = ?1 WHERE id = ?2",
                params![role.as_str(), id],
            )
            .map_err(map_sqlite_error)?;

        if changed == 0 {
            return Ok(None);
        }
        Self::query_by_id(&conn, id)
    }

    /// Stamp `last_login` with the current time and return the updated
    /// user, or None when the subject has no record.
    pub fn touch_last_login(&self, subject: &str) -> Result<Option<User>, StoreError> {
        let conn = self.lock()?;
        let now = Utc::now();
        let changed = conn
            .execute(
                "UPDATE users SET last_login = ?1 WHERE subject = ?2",
                params![now.to_rfc3339(), subject],
            )
            .map_err(map_sqlite_error)?;

        if changed == 0 {
            return Ok(None);
        }
        Self::query_by_subject(&conn, subject)
    }

    /// Delete a user by id. Returns false when no row matches.
    pub fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let conn = self.lock()?;
        let changed = conn
            .execute("DELETE FROM users WHERE id = ?1", params![id])
            .map_err(map_sqlite_error)?;
        Ok(changed > 0)
    }
}
