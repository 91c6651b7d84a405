//! Append-only usage ledger backed by SQLite
//!
//! Every generation attempt is recorded, successes and failures alike.
//! Rows are never updated or deleted: this is an audit log, not a cache.
//! The connection is opened and closed per operation; there is no
//! concurrent writer in this design.

use crate::log_debug;
use anyhow::{Context, Result};
use chrono::{Duration, Local};
use rusqlite::{Connection, params};
use std::path::{Path, PathBuf};

/// One persisted usage event.
#[derive(Debug, Clone)]
pub struct UsageRecord {
    pub timestamp: String,
    pub provider: String,
    pub model: String,
    pub tokens: u32,
    pub cost: f64,
    pub success: bool,
}

/// All-time aggregates.
#[derive(Debug, Clone, Default)]
pub struct TotalUsage {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub total_tokens: u64,
    pub total_cost: f64,
}

/// Aggregates for the current calendar month.
#[derive(Debug, Clone)]
pub struct MonthlyUsage {
    /// Month label, e.g. "August 2026"
    pub month: String,
    pub requests: u64,
    pub tokens: u64,
    pub cost: f64,
}

/// Per-(provider, model) aggregates, ordered by descending cost.
#[derive(Debug, Clone)]
pub struct ProviderUsage {
    pub provider: String,
    pub model: String,
    pub requests: u64,
    pub tokens: u64,
    pub cost: f64,
}

/// Tracks and reports on API usage and costs.
pub struct UsageTracker {
    db_path: PathBuf,
}

impl UsageTracker {
    /// Open (and lazily create) the ledger at the given path.
    pub fn new(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("cannot create data directory {}", parent.display()))?;
        }

        let tracker = Self {
            db_path: db_path.to_path_buf(),
        };
        tracker.init_schema()?;
        Ok(tracker)
    }

    fn connect(&self) -> Result<Connection> {
        Connection::open(&self.db_path)
            .with_context(|| format!("cannot open usage database {}", self.db_path.display()))
    }

    // Schema changes must stay additive (new columns only) so that
    // historical rows keep loading.
    fn init_schema(&self) -> Result<()> {
        let conn = self.connect()?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS usage (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp TEXT NOT NULL,
                provider TEXT NOT NULL,
                model TEXT NOT NULL,
                tokens INTEGER NOT NULL,
                cost REAL NOT NULL,
                success INTEGER NOT NULL
            )",
            [],
        )?;
        Ok(())
    }

    /// Record one usage event. Failed attempts carry tokens=0, cost=0.
    pub fn record_usage(
        &self,
        provider: &str,
        model: &str,
        tokens: u32,
        cost: f64,
        success: bool,
    ) -> Result<()> {
        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO usage (timestamp, provider, model, tokens, cost, success)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                Local::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string(),
                provider,
                model,
                tokens,
                cost,
                i32::from(success)
            ],
        )?;

        log_debug!(
            "Recorded usage: {provider}/{model} tokens={tokens} cost={cost:.4} success={success}"
        );
        Ok(())
    }

    /// All-time totals.
    pub fn total_usage(&self) -> Result<TotalUsage> {
        let conn = self.connect()?;
        let row = conn.query_row(
            "SELECT COUNT(*),
                    COALESCE(SUM(tokens), 0),
                    COALESCE(SUM(cost), 0.0),
                    COALESCE(SUM(CASE WHEN success = 1 THEN 1 ELSE 0 END), 0)
             FROM usage",
            [],
            |row| {
                Ok(TotalUsage {
                    total_requests: row.get(0)?,
                    total_tokens: row.get(1)?,
                    total_cost: row.get::<_, f64>(2)?,
                    successful_requests: row.get(3)?,
                })
            },
        )?;

        Ok(TotalUsage {
            total_cost: round4(row.total_cost),
            ..row
        })
    }

    /// Aggregates since the first instant of the current calendar month
    /// (local clock).
    pub fn monthly_usage(&self) -> Result<MonthlyUsage> {
        let now = Local::now();
        let first_of_month = now.format("%Y-%m-01T00:00:00").to_string();

        let conn = self.connect()?;
        let (requests, tokens, cost) = conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(tokens), 0), COALESCE(SUM(cost), 0.0)
             FROM usage WHERE timestamp >= ?1",
            params![first_of_month],
            |row| Ok((row.get(0)?, row.get(1)?, row.get::<_, f64>(2)?)),
        )?;

        Ok(MonthlyUsage {
            month: now.format("%B %Y").to_string(),
            requests,
            tokens,
            cost: round4(cost),
        })
    }

    /// Per-(provider, model) aggregates, most expensive first.
    pub fn usage_by_provider(&self) -> Result<Vec<ProviderUsage>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT provider, model, COUNT(*), SUM(tokens), SUM(cost)
             FROM usage
             GROUP BY provider, model
             ORDER BY SUM(cost) DESC",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(ProviderUsage {
                provider: row.get(0)?,
                model: row.get(1)?,
                requests: row.get(2)?,
                tokens: row.get(3)?,
                cost: round4(row.get::<_, f64>(4)?),
            })
        })?;

        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Most recent records within the lookback window, newest first,
    /// capped at 50.
    pub fn recent_usage(&self, days: i64) -> Result<Vec<UsageRecord>> {
        let cutoff = (Local::now() - Duration::days(days))
            .format("%Y-%m-%dT%H:%M:%S%.6f")
            .to_string();

        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT timestamp, provider, model, tokens, cost, success
             FROM usage
             WHERE timestamp >= ?1
             ORDER BY timestamp DESC
             LIMIT 50",
        )?;

        let rows = stmt.query_map(params![cutoff], |row| {
            Ok(UsageRecord {
                timestamp: row.get(0)?,
                provider: row.get(1)?,
                model: row.get(2)?,
                tokens: row.get(3)?,
                cost: round4(row.get::<_, f64>(4)?),
                success: row.get::<_, i32>(5)? != 0,
            })
        })?;

        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Whether the current month's aggregate cost has reached `limit`,
    /// alongside that cost. The ledger only reports; enforcement is the
    /// caller's policy decision.
    pub fn check_monthly_limit(&self, limit: f64) -> Result<(bool, f64)> {
        let current = self.monthly_usage()?.cost;
        Ok((current >= limit, current))
    }
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounding_keeps_four_decimals() {
        assert!((round4(0.123_456) - 0.1235).abs() < f64::EPSILON);
        assert!((round4(5.0) - 5.0).abs() < f64::EPSILON);
    }
}
