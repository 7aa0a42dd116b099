//! Ephemeral DuckDB sessions over data product locations.
//!
//! A session is opened with one credential snapshot pushed into the
//! engine's object-storage settings. Products are registered as
//! `"domain"."product"` views, then queried with plain SQL.

mod result;
pub mod sanitize;
mod scan;

pub use result::{Cell, QueryResult};
pub use scan::{registration_sql, ScanKind};

use crate::catalog::CatalogResolver;
use crate::credentials::{CredentialProvider, Credentials};
use crate::error::QueryError;
use crate::name::ProductName;
use dmesh_common::config::EngineSettings;
use duckdb::Connection;
use sanitize::quote_literal;
use secrecy::ExposeSecret;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, TryLockError};

/// Opens query sessions using the provider's current credentials.
#[derive(Debug, Clone)]
pub struct QueryFederationBridge {
    credentials: Arc<CredentialProvider>,
    catalog: CatalogResolver,
    settings: EngineSettings,
    region: String,
}

impl QueryFederationBridge {
    pub fn new(
        credentials: Arc<CredentialProvider>,
        catalog: CatalogResolver,
        settings: EngineSettings,
        region: impl Into<String>,
    ) -> Self {
        Self {
            credentials,
            catalog,
            settings,
            region: region.into(),
        }
    }

    pub async fn open_session(&self) -> Result<QuerySession, QueryError> {
        let creds = self.credentials.current().await?;
        let setup = session_setup_sql(&self.settings, &self.region, &creds)?;

        let conn = tokio::task::spawn_blocking(move || {
            let conn = Connection::open_in_memory().map_err(|e| QueryError::EngineInitFailed {
                message: e.to_string(),
            })?;
            for statement in &setup {
                conn.execute_batch(statement)
                    .map_err(|e| QueryError::EngineInitFailed {
                        message: e.to_string(),
                    })?;
            }
            Ok::<_, QueryError>(conn)
        })
        .await
        .map_err(|e| QueryError::EngineInitFailed {
            message: format!("engine task failed: {}", e),
        })??;

        tracing::debug!(
            object_storage = self.settings.object_storage,
            source = %creds.source,
            "Query session opened"
        );

        Ok(QuerySession {
            inner: Arc::new(Mutex::new(Some(SessionState {
                conn,
                registered: HashMap::new(),
            }))),
            closed: Arc::new(AtomicBool::new(false)),
            install_extensions: self.settings.install_extensions,
        })
    }

    /// Resolve `product`, register it in a fresh session, run `sql`, and
    /// release the session on every path.
    pub async fn query_product(&self, product: &str, sql: &str) -> Result<QueryResult, anyhow::Error> {
        let descriptor = self.catalog.resolve(product).await?;
        let session = self.open_session().await?;

        let result = async {
            session
                .register_product(&descriptor.qualified_name, &descriptor.location)
                .await?;
            session.execute(sql).await
        }
        .await;

        session.close();
        Ok(result?)
    }
}

/// Statements run once on every new connection.
fn session_setup_sql(
    settings: &EngineSettings,
    region: &str,
    creds: &Credentials,
) -> Result<Vec<String>, QueryError> {
    let literal = |value: &str| {
        quote_literal(value).map_err(|e| QueryError::EngineInitFailed {
            message: e.to_string(),
        })
    };

    let mut statements = Vec::new();
    if let Some(mb) = settings.memory_limit_mb {
        statements.push(format!("SET memory_limit = '{}MB'", mb));
    }
    if settings.object_storage {
        if settings.install_extensions {
            statements.push("INSTALL httpfs".to_string());
        }
        statements.push("LOAD httpfs".to_string());
        statements.push(format!("SET s3_region = {}", literal(region)?));
        statements.push(format!("SET s3_access_key_id = {}", literal(&creds.access_key_id)?));
        statements.push(format!(
            "SET s3_secret_access_key = {}",
            literal(creds.secret_access_key.expose_secret())?
        ));
        if let Some(token) = &creds.session_token {
            statements.push(format!("SET s3_session_token = {}", literal(token.expose_secret())?));
        }
    }
    Ok(statements)
}

struct SessionState {
    conn: Connection,
    /// Registered view name -> physical location.
    registered: HashMap<ProductName, String>,
}

/// One engine connection plus the products registered on it.
///
/// Not meant for concurrent use; calls from one task at a time. `close`
/// is idempotent and later operations fail with `SessionClosed`.
///
/// Closing never waits for a statement still running on the connection:
/// the release is handed to the blocking pool and happens once that
/// statement returns.
pub struct QuerySession {
    inner: Arc<Mutex<Option<SessionState>>>,
    closed: Arc<AtomicBool>,
    install_extensions: bool,
}

impl std::fmt::Debug for QuerySession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuerySession")
            .field("open", &self.is_open())
            .field("registered", &self.registered())
            .finish()
    }
}

fn lock(inner: &Mutex<Option<SessionState>>) -> MutexGuard<'_, Option<SessionState>> {
    inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn release(state: Option<SessionState>) {
    if let Some(state) = state {
        if let Err((_, e)) = state.conn.close() {
            tracing::warn!(error = %e, "Error closing engine connection");
        }
        tracing::debug!("Query session closed");
    }
}

impl QuerySession {
    pub fn is_open(&self) -> bool {
        !self.closed.load(Ordering::Acquire)
    }

    /// Names registered so far, sorted. Empty while a statement is running.
    pub fn registered(&self) -> Vec<String> {
        let mut names: Vec<String> = match self.inner.try_lock() {
            Ok(guard) => guard
                .as_ref()
                .map(|s| s.registered.keys().map(ToString::to_string).collect())
                .unwrap_or_default(),
            Err(_) => Vec::new(),
        };
        names.sort();
        names
    }

    /// Expose `location` as the view `name`, using the scan function its path implies.
    pub async fn register_product(&self, name: &ProductName, location: &str) -> Result<(), QueryError> {
        let failed = |message: String| QueryError::RegistrationFailed {
            name: name.to_string(),
            message,
        };

        if !self.is_open() {
            return Err(QueryError::SessionClosed);
        }
        if location.trim().is_empty() {
            return Err(failed("product has no physical location".to_string()));
        }

        let kind = ScanKind::detect(location);
        let mut statements = Vec::new();
        if let Some(ext) = kind.extension() {
            if self.install_extensions {
                statements.push(format!("INSTALL {}", ext));
            }
            statements.push(format!("LOAD {}", ext));
        }
        statements.extend(registration_sql(name, location, kind).map_err(|e| failed(e.to_string()))?);

        let inner = self.inner.clone();
        let closed = self.closed.clone();
        let view = name.clone();
        let path = location.to_string();
        tokio::task::spawn_blocking(move || {
            let mut guard = lock(&inner);
            if closed.load(Ordering::Acquire) {
                return Err(QueryError::SessionClosed);
            }
            let state = guard.as_mut().ok_or(QueryError::SessionClosed)?;
            if state.registered.contains_key(&view) {
                return Err(QueryError::RegistrationFailed {
                    name: view.to_string(),
                    message: "already registered in this session".to_string(),
                });
            }
            for statement in &statements {
                state
                    .conn
                    .execute_batch(statement)
                    .map_err(|e| QueryError::RegistrationFailed {
                        name: view.to_string(),
                        message: e.to_string(),
                    })?;
            }
            state.registered.insert(view, path);
            Ok(())
        })
        .await
        .map_err(|e| failed(format!("engine task failed: {}", e)))??;

        tracing::debug!(product = %name, scan = %kind, "Registered data product");
        Ok(())
    }

    /// Run `sql` verbatim and materialize the whole result.
    pub async fn execute(&self, sql: &str) -> Result<QueryResult, QueryError> {
        if !self.is_open() {
            return Err(QueryError::SessionClosed);
        }
        let inner = self.inner.clone();
        let closed = self.closed.clone();
        let sql = sql.to_string();

        tokio::task::spawn_blocking(move || {
            let guard = lock(&inner);
            if closed.load(Ordering::Acquire) {
                return Err(QueryError::SessionClosed);
            }
            let state = guard.as_ref().ok_or(QueryError::SessionClosed)?;
            run_query(&state.conn, &sql)
        })
        .await
        .map_err(|e| QueryError::ExecutionFailed {
            message: format!("engine task failed: {}", e),
        })?
    }

    /// Release the connection. Safe to call any number of times, and
    /// returns immediately even while a statement holds the connection.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }

        match self.inner.try_lock() {
            Ok(mut guard) => release(guard.take()),
            Err(TryLockError::Poisoned(poisoned)) => release(poisoned.into_inner().take()),
            Err(TryLockError::WouldBlock) => {
                tracing::debug!("Statement still running, deferring session close");
                let inner = self.inner.clone();
                match tokio::runtime::Handle::try_current() {
                    Ok(handle) => {
                        handle.spawn_blocking(move || release(lock(&inner).take()));
                    }
                    // Outside a runtime there is no pool to defer to.
                    Err(_) => release(lock(&inner).take()),
                }
            }
        }
    }
}

impl Drop for QuerySession {
    fn drop(&mut self) {
        self.close();
    }
}

fn run_query(conn: &Connection, sql: &str) -> Result<QueryResult, QueryError> {
    let exec_failed = |e: duckdb::Error| QueryError::ExecutionFailed {
        message: e.to_string(),
    };
    let scan_failed = |e: duckdb::Error| QueryError::RowScanFailed {
        message: e.to_string(),
    };

    let mut stmt = conn.prepare(sql).map_err(exec_failed)?;
    let mut rows = stmt.query([]).map_err(exec_failed)?;
    let columns = rows
        .as_ref()
        .map(|s| s.column_names())
        .unwrap_or_default();

    let mut result = QueryResult {
        columns,
        rows: Vec::new(),
    };
    while let Some(row) = rows.next().map_err(scan_failed)? {
        let mut values = Vec::with_capacity(result.columns.len());
        for idx in 0..result.columns.len() {
            values.push(Cell::from_value_ref(row.get_ref(idx).map_err(scan_failed)?));
        }
        result.rows.push(values);
    }
    Ok(result)
}
