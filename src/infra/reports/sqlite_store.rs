use crate::core::reports::{Report, ReportError, ReportStatus, ReportStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Row, Sqlite};
use std::path::Path;

/// Report store on SQLite. Board order is submission order, which SQLite
/// gives us for free through the implicit rowid.
pub struct SqliteReportStore {
    pool: Pool<Sqlite>,
}

impl SqliteReportStore {
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        // Ensure the file exists if it's a file path
        let path_str = database_url.trim_start_matches("sqlite://");
        if !database_url.contains(":memory:") && !Path::new(path_str).exists() {
            if let Some(parent) = Path::new(path_str).parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::File::create(path_str)?;
        }

        let conn_str = if database_url.starts_with("sqlite:") {
            database_url.to_string()
        } else {
            format!("sqlite://{}", database_url)
        };

        let pool = SqlitePoolOptions::new().connect(&conn_str).await?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS reports (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                url TEXT NOT NULL,
                reported_by TEXT NOT NULL,
                reason TEXT NOT NULL,
                status TEXT NOT NULL,
                confidence INTEGER,
                report_count INTEGER NOT NULL DEFAULT 1,
                submitted_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl ReportStore for SqliteReportStore {
    async fn load_all(&self) -> Result<Vec<Report>, ReportError> {
        let rows = sqlx::query("SELECT * FROM reports ORDER BY rowid")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| ReportError::StorageError(e.to_string()))?;

        let mut reports = Vec::new();
        for row in rows {
            reports.push(row_to_report(&row)?);
        }
        Ok(reports)
    }

    async fn get(&self, id: &str) -> Result<Option<Report>, ReportError> {
        let row = sqlx::query("SELECT * FROM reports WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| ReportError::StorageError(e.to_string()))?;

        if let Some(row) = row {
            Ok(Some(row_to_report(&row)?))
        } else {
            Ok(None)
        }
    }

    async fn insert(&self, report: Report) -> Result<(), ReportError> {
        sqlx::query(
            r#"
            INSERT INTO reports (
                id, title, url, reported_by, reason, status,
                confidence, report_count, submitted_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&report.id)
        .bind(&report.title)
        .bind(&report.url)
        .bind(&report.reported_by)
        .bind(&report.reason)
        .bind(report.status.as_str())
        .bind(report.confidence.map(|c| c as i64))
        .bind(report.report_count as i64)
        .bind(report.submitted_at)
        .execute(&self.pool)
        .await
        .map_err(|e| ReportError::StorageError(e.to_string()))?;

        Ok(())
    }

    async fn update_status(
        &self,
        id: &str,
        status: ReportStatus,
        confidence: Option<u8>,
    ) -> Result<Option<Report>, ReportError> {
        let result = sqlx::query(
            "UPDATE reports SET status = ?, confidence = COALESCE(?, confidence) WHERE id = ?",
        )
        .bind(status.as_str())
        .bind(confidence.map(|c| c as i64))
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| ReportError::StorageError(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get(id).await
    }
}

fn row_to_report(row: &sqlx::sqlite::SqliteRow) -> Result<Report, ReportError> {
    let status_text: String = row.get("status");
    let status = ReportStatus::parse(&status_text)
        .ok_or_else(|| ReportError::StorageError(format!("unknown status '{status_text}'")))?;

    Ok(Report {
        id: row.get("id"),
        title: row.get("title"),
        url: row.get("url"),
        reported_by: row.get("reported_by"),
        reason: row.get("reason"),
        status,
        confidence: row.get::<Option<i64>, _>("confidence").map(|c| c as u8),
        report_count: row.get::<i64, _>("report_count") as u32,
        submitted_at: row.get::<DateTime<Utc>, _>("submitted_at"),
    })
}
