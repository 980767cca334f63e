//! In-memory sessions: one uploaded table plus the latest analysis of it.
//!
//! A session value is never mutated in place. Each interaction stores a new
//! value under the same id, and idle sessions are evicted by the cache.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use moka::sync::Cache;
use uuid::Uuid;

use crate::models::Table;
use crate::services::analysis::AnalysisReport;

#[derive(Debug, Clone)]
pub struct Session {
    pub id: Uuid,
    pub file_name: String,
    pub created_at: DateTime<Utc>,
    pub table: Arc<Table>,
    pub last_analysis: Option<Arc<AnalysisReport>>,
}

#[derive(Clone)]
pub struct SessionStore {
    cache: Cache<Uuid, Arc<Session>>,
}

impl SessionStore {
    pub fn new(max_sessions: u64, idle: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_sessions)
            .time_to_idle(idle)
            .build();
        Self { cache }
    }

    pub fn create(&self, file_name: String, table: Table) -> Arc<Session> {
        let session = Arc::new(Session {
            id: Uuid::new_v4(),
            file_name,
            created_at: Utc::now(),
            table: Arc::new(table),
            last_analysis: None,
        });
        self.cache.insert(session.id, session.clone());
        tracing::info!("Session {} created for {}", session.id, session.file_name);
        session
    }

    pub fn get(&self, id: &Uuid) -> Option<Arc<Session>> {
        self.cache.get(id)
    }

    /// Replaces the session with a copy carrying `report` as its latest analysis.
    pub fn record_analysis(&self, id: &Uuid, report: AnalysisReport) -> Option<Arc<Session>> {
        let current = self.cache.get(id)?;
        let next = Arc::new(Session {
            last_analysis: Some(Arc::new(report)),
            ..(*current).clone()
        });
        self.cache.insert(*id, next.clone());
        Some(next)
    }

    pub fn remove(&self, id: &Uuid) -> bool {
        let removed = self.cache.remove(id).is_some();
        if removed {
            tracing::info!("Session {} discarded", id);
        }
        removed
    }
}
