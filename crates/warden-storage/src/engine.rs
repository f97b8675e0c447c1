//! StorageEngine: owns the write connection, runs migrations on open, and
//! implements every store trait the engines depend on.

use std::path::Path;

use chrono::{DateTime, Utc};
use tracing::debug;

use warden_core::config::StorageConfig;
use warden_core::errors::WardenResult;
use warden_core::models::{BatchJob, Case, CaseEvent, CaseFilter, PolicyVersion, TakedownRequest};
use warden_core::traits::{
    CasOutcome, CaseTransition, IBatchJobStore, ICaseStore, IEventLog, IPolicyStore,
};

use crate::connection::WriteConnection;
use crate::migrations;
use crate::queries::{batch_ops, case_ops, event_ops, policy_ops, takedown_ops};

pub struct StorageEngine {
    conn: WriteConnection,
}

impl StorageEngine {
    /// Open (or create) a database file.
    pub fn open(path: &Path, busy_timeout_ms: u64) -> WardenResult<Self> {
        let engine = Self {
            conn: WriteConnection::open(path, busy_timeout_ms)?,
        };
        engine.initialize()?;
        Ok(engine)
    }

    pub fn from_config(config: &StorageConfig) -> WardenResult<Self> {
        Self::open(Path::new(&config.db_path), config.busy_timeout_ms)
    }

    /// Open a private in-memory database (for testing).
    pub fn open_in_memory() -> WardenResult<Self> {
        let engine = Self {
            conn: WriteConnection::open_in_memory()?,
        };
        engine.initialize()?;
        Ok(engine)
    }

    fn initialize(&self) -> WardenResult<()> {
        self.conn.with_conn_sync(|conn| {
            let version = migrations::run_migrations(conn)?;
            debug!(schema_version = version, "storage initialized");
            Ok(())
        })
    }

    /// Applied schema version.
    pub fn schema_version(&self) -> WardenResult<u32> {
        self.conn.with_conn_sync(migrations::current_version)
    }
}

impl ICaseStore for StorageEngine {
    fn get(&self, id: &str) -> WardenResult<Option<Case>> {
        self.conn.with_conn_sync(|conn| case_ops::get_case(conn, id))
    }

    fn insert(&self, case: &Case) -> WardenResult<()> {
        debug!(case_id = %case.id, "inserting case");
        self.conn.with_conn_sync(|conn| case_ops::insert_case(conn, case))
    }

    fn save(&self, case: &Case) -> WardenResult<()> {
        debug!(case_id = %case.id, status = %case.status, "saving case");
        self.conn.with_conn_sync(|conn| case_ops::upsert_case(conn, case))
    }

    fn query(&self, filter: &CaseFilter) -> WardenResult<Vec<Case>> {
        self.conn
            .with_conn_sync(|conn| case_ops::query_cases(conn, filter))
    }

    fn compare_and_swap_status(&self, transition: &CaseTransition) -> WardenResult<CasOutcome> {
        let outcome = self
            .conn
            .with_conn_sync(|conn| case_ops::compare_and_swap_status(conn, transition))?;
        if let CasOutcome::Conflict(current) = &outcome {
            debug!(
                case_id = %transition.case_id,
                expected = %transition.expected_status,
                actual = %current.status,
                "status swap lost a race"
            );
        }
        Ok(outcome)
    }

    fn resolve_takedown(
        &self,
        transition: &CaseTransition,
        request: &TakedownRequest,
    ) -> WardenResult<CasOutcome> {
        self.conn.with_conn_sync(|conn| {
            case_ops::swap_with(conn, transition, |tx| takedown_ops::update_takedown(tx, request))
        })
    }

    fn insert_takedown_request(&self, request: &TakedownRequest) -> WardenResult<()> {
        debug!(request_id = %request.id, case_id = %request.case_id, "inserting takedown request");
        self.conn
            .with_conn_sync(|conn| takedown_ops::insert_takedown(conn, request))
    }

    fn save_takedown_request(&self, request: &TakedownRequest) -> WardenResult<()> {
        self.conn
            .with_conn_sync(|conn| takedown_ops::update_takedown(conn, request))
    }

    fn get_takedown_request(&self, id: &str) -> WardenResult<Option<TakedownRequest>> {
        self.conn
            .with_conn_sync(|conn| takedown_ops::get_takedown(conn, id))
    }

    fn active_takedown_for_case(&self, case_id: &str) -> WardenResult<Option<TakedownRequest>> {
        self.conn
            .with_conn_sync(|conn| takedown_ops::active_for_case(conn, case_id))
    }

    fn takedowns_past_deadline(&self, now: DateTime<Utc>) -> WardenResult<Vec<TakedownRequest>> {
        self.conn
            .with_conn_sync(|conn| takedown_ops::past_deadline(conn, now))
    }

    fn pending_takedowns(&self) -> WardenResult<Vec<TakedownRequest>> {
        self.conn.with_conn_sync(takedown_ops::pending)
    }
}

impl IEventLog for StorageEngine {
    fn append_event(&self, event: &CaseEvent) -> WardenResult<()> {
        self.conn
            .with_conn_sync(|conn| event_ops::append_event(conn, event))
    }

    fn events_since(&self, case_id: &str, after: u64) -> WardenResult<Vec<CaseEvent>> {
        self.conn
            .with_conn_sync(|conn| event_ops::events_since(conn, case_id, after))
    }

    fn last_sequence(&self, case_id: &str) -> WardenResult<u64> {
        self.conn
            .with_conn_sync(|conn| event_ops::last_sequence(conn, case_id))
    }
}

impl IPolicyStore for StorageEngine {
    fn save_policy_version(&self, version: &PolicyVersion) -> WardenResult<()> {
        debug!(version = version.version, "persisting policy version");
        self.conn
            .with_conn_sync(|conn| policy_ops::insert_policy_version(conn, version))
    }

    fn get_policy_version(&self, version: u64) -> WardenResult<Option<PolicyVersion>> {
        self.conn
            .with_conn_sync(|conn| policy_ops::get_policy_version(conn, version))
    }

    fn latest_policy_version(&self) -> WardenResult<Option<PolicyVersion>> {
        self.conn.with_conn_sync(policy_ops::latest_policy_version)
    }
}

impl IBatchJobStore for StorageEngine {
    fn save_batch_job(&self, job: &BatchJob) -> WardenResult<()> {
        self.conn
            .with_conn_sync(|conn| batch_ops::upsert_batch_job(conn, job))
    }

    fn get_batch_job(&self, id: &str) -> WardenResult<Option<BatchJob>> {
        self.conn
            .with_conn_sync(|conn| batch_ops::get_batch_job(conn, id))
    }
}
