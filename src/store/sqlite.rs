use super::model::{Account, Workflow, WorkflowDraft, WorkflowSummary};
use super::{AccountStore, Result, WorkflowStore};
use crate::error::StoreError;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS accounts (
        id TEXT PRIMARY KEY,
        username TEXT NOT NULL UNIQUE,
        email TEXT,
        salt TEXT NOT NULL,
        password_hash TEXT NOT NULL,
        created_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS sessions (
        token TEXT PRIMARY KEY,
        account_id TEXT NOT NULL REFERENCES accounts(id) ON DELETE CASCADE,
        expires_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS workflows (
        id TEXT PRIMARY KEY,
        owner_id TEXT NOT NULL,
        name TEXT NOT NULL,
        nodes TEXT NOT NULL,
        connections TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_workflows_owner
        ON workflows(owner_id, updated_at);";

const WORKFLOW_COLUMNS: &str = "id, owner_id, name, nodes, connections, created_at, updated_at";
const SUMMARY_COLUMNS: &str = "id, owner_id, name, json_array_length(nodes), \
     json_array_length(connections), created_at, updated_at";

/// SQLite-backed store for accounts, sessions and workflows.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a SQLite database at the given path.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::Database(format!("Failed to create db directory: {}", e))
            })?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        let store = Self::init(conn)?;
        debug!(path = %path.display(), "SQLite store opened");
        Ok(store)
    }

    /// Open an in-memory database (for testing).
    pub fn in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| StoreError::Database(e.to_string()))
    }
}

fn now() -> DateTime<Utc> {
    // Stored with microsecond precision; truncate up front so values compare
    // equal after a round trip.
    parse_timestamp(&format_timestamp(Utc::now())).unwrap_or_else(|_| Utc::now())
}

fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| StoreError::Corrupt(format!("bad timestamp '{}': {}", raw, e)))
}

fn hash_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(b":");
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

type WorkflowRow = (String, String, String, String, String, String, String);
type SummaryRow = (String, String, String, i64, i64, String, String);
type AccountRow = (String, String, Option<String>, String);

fn workflow_from_row(row: WorkflowRow) -> Result<Workflow> {
    let (id, owner_id, name, nodes, connections, created_at, updated_at) = row;
    Ok(Workflow {
        nodes: serde_json::from_str(&nodes)
            .map_err(|e| StoreError::Corrupt(format!("workflow {} nodes: {}", id, e)))?,
        connections: serde_json::from_str(&connections)
            .map_err(|e| StoreError::Corrupt(format!("workflow {} connections: {}", id, e)))?,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
        id,
        owner_id,
        name,
    })
}

fn summary_from_row(row: SummaryRow) -> Result<WorkflowSummary> {
    let (id, owner_id, name, node_count, connection_count, created_at, updated_at) = row;
    Ok(WorkflowSummary {
        id,
        owner_id,
        name,
        node_count: node_count.max(0) as usize,
        connection_count: connection_count.max(0) as usize,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

fn account_from_row(row: AccountRow) -> Result<Account> {
    let (id, username, email, created_at) = row;
    Ok(Account {
        id,
        username,
        email,
        created_at: parse_timestamp(&created_at)?,
    })
}

fn load_workflow_with(conn: &Connection, id: &str, owner_id: &str) -> Result<Workflow> {
    let row: Option<WorkflowRow> = conn
        .query_row(
            &format!(
                "SELECT {} FROM workflows WHERE id = ?1 AND owner_id = ?2",
                WORKFLOW_COLUMNS
            ),
            params![id, owner_id],
            |r| {
                Ok((
                    r.get(0)?,
                    r.get(1)?,
                    r.get(2)?,
                    r.get(3)?,
                    r.get(4)?,
                    r.get(5)?,
                    r.get(6)?,
                ))
            },
        )
        .optional()?;
    row.map(workflow_from_row).unwrap_or(Err(StoreError::NotFound))
}

fn query_summaries(
    conn: &Connection,
    sql: &str,
    args: &[&dyn rusqlite::ToSql],
) -> Result<Vec<WorkflowSummary>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(args, |r| {
            Ok((
                r.get(0)?,
                r.get(1)?,
                r.get(2)?,
                r.get(3)?,
                r.get(4)?,
                r.get(5)?,
                r.get(6)?,
            ))
        })?
        .collect::<std::result::Result<Vec<SummaryRow>, _>>()?;
    rows.into_iter().map(summary_from_row).collect()
}

fn encode_graph(draft: &WorkflowDraft) -> Result<(String, String)> {
    let nodes = serde_json::to_string(&draft.graph.nodes)
        .map_err(|e| StoreError::Database(format!("Failed to encode nodes: {}", e)))?;
    let connections = serde_json::to_string(&draft.graph.connections)
        .map_err(|e| StoreError::Database(format!("Failed to encode connections: {}", e)))?;
    Ok((nodes, connections))
}

impl WorkflowStore for SqliteStore {
    fn load_workflow(&self, id: &str, owner_id: &str) -> Result<Workflow> {
        let conn = self.lock()?;
        load_workflow_with(&conn, id, owner_id)
    }

    fn save_workflow(&self, draft: WorkflowDraft) -> Result<Workflow> {
        let conn = self.lock()?;
        let (nodes, connections) = encode_graph(&draft)?;
        let ts = format_timestamp(now());

        let id = match &draft.id {
            Some(id) => {
                let changed = conn.execute(
                    "UPDATE workflows SET name = ?1, nodes = ?2, connections = ?3, updated_at = ?4
                     WHERE id = ?5 AND owner_id = ?6",
                    params![draft.name, nodes, connections, ts, id, draft.owner_id],
                )?;
                if changed == 0 {
                    return Err(StoreError::NotFound);
                }
                debug!(workflow_id = %id, owner_id = %draft.owner_id, "workflow updated");
                id.clone()
            }
            None => {
                let id = uuid::Uuid::new_v4().to_string();
                conn.execute(
                    "INSERT INTO workflows (id, owner_id, name, nodes, connections, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
                    params![id, draft.owner_id, draft.name, nodes, connections, ts],
                )?;
                debug!(workflow_id = %id, owner_id = %draft.owner_id, "workflow created");
                id
            }
        };

        load_workflow_with(&conn, &id, &draft.owner_id)
    }

    fn list_workflows(&self, owner_id: &str) -> Result<Vec<WorkflowSummary>> {
        let conn = self.lock()?;
        query_summaries(
            &conn,
            &format!(
                "SELECT {} FROM workflows WHERE owner_id = ?1
                 ORDER BY updated_at DESC, rowid DESC",
                SUMMARY_COLUMNS
            ),
            &[&owner_id],
        )
    }

    fn delete_workflow(&self, id: &str, owner_id: &str) -> Result<bool> {
        let conn = self.lock()?;
        let deleted = conn.execute(
            "DELETE FROM workflows WHERE id = ?1 AND owner_id = ?2",
            params![id, owner_id],
        )?;
        Ok(deleted > 0)
    }

    fn list_all_workflows(&self) -> Result<Vec<WorkflowSummary>> {
        let conn = self.lock()?;
        query_summaries(
            &conn,
            &format!(
                "SELECT {} FROM workflows ORDER BY updated_at DESC, rowid DESC",
                SUMMARY_COLUMNS
            ),
            &[],
        )
    }
}

impl AccountStore for SqliteStore {
    fn create_account(
        &self,
        username: &str,
        password: &str,
        email: Option<&str>,
    ) -> Result<Account> {
        let conn = self.lock()?;
        let taken: Option<String> = conn
            .query_row(
                "SELECT id FROM accounts WHERE username = ?1",
                params![username],
                |r| r.get(0),
            )
            .optional()?;
        if taken.is_some() {
            return Err(StoreError::Conflict("Username already exists".to_string()));
        }

        let account = Account {
            id: uuid::Uuid::new_v4().to_string(),
            username: username.to_string(),
            email: email.map(str::to_string),
            created_at: now(),
        };
        let salt = uuid::Uuid::new_v4().simple().to_string();
        conn.execute(
            "INSERT INTO accounts (id, username, email, salt, password_hash, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                account.id,
                account.username,
                account.email,
                salt,
                hash_password(&salt, password),
                format_timestamp(account.created_at)
            ],
        )?;
        debug!(account_id = %account.id, "account created");
        Ok(account)
    }

    fn verify_credentials(&self, username: &str, password: &str) -> Result<Option<Account>> {
        let conn = self.lock()?;
        let row: Option<(AccountRow, String, String)> = conn
            .query_row(
                "SELECT id, username, email, created_at, salt, password_hash
                 FROM accounts WHERE username = ?1",
                params![username],
                |r| {
                    Ok((
                        (r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?),
                        r.get(4)?,
                        r.get(5)?,
                    ))
                },
            )
            .optional()?;

        match row {
            Some((account, salt, hash)) if hash_password(&salt, password) == hash => {
                account_from_row(account).map(Some)
            }
            _ => Ok(None),
        }
    }

    fn find_account(&self, id: &str) -> Result<Option<Account>> {
        let conn = self.lock()?;
        let row: Option<AccountRow> = conn
            .query_row(
                "SELECT id, username, email, created_at FROM accounts WHERE id = ?1",
                params![id],
                |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)),
            )
            .optional()?;
        row.map(account_from_row).transpose()
    }

    fn list_accounts(&self) -> Result<Vec<Account>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, username, email, created_at FROM accounts ORDER BY created_at, rowid",
        )?;
        let rows = stmt
            .query_map([], |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)))?
            .collect::<std::result::Result<Vec<AccountRow>, _>>()?;
        rows.into_iter().map(account_from_row).collect()
    }

    fn create_session(&self, account_id: &str, ttl: Duration) -> Result<String> {
        let conn = self.lock()?;
        let token = uuid::Uuid::new_v4().simple().to_string();
        conn.execute(
            "INSERT INTO sessions (token, account_id, expires_at) VALUES (?1, ?2, ?3)",
            params![token, account_id, format_timestamp(Utc::now() + ttl)],
        )?;
        Ok(token)
    }

    fn resolve_session(&self, token: &str) -> Result<Option<String>> {
        let conn = self.lock()?;
        let row: Option<(String, String)> = conn
            .query_row(
                "SELECT account_id, expires_at FROM sessions WHERE token = ?1",
                params![token],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .optional()?;

        let Some((account_id, expires_at)) = row else {
            return Ok(None);
        };
        if parse_timestamp(&expires_at)? <= Utc::now() {
            conn.execute("DELETE FROM sessions WHERE token = ?1", params![token])?;
            debug!(account_id = %account_id, "expired session removed");
            return Ok(None);
        }
        Ok(Some(account_id))
    }
}
