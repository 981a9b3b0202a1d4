//! 举报仓库实现

use application::ReportRepository;
use async_trait::async_trait;
use domain::{AbuseReport, RepositoryError};

use crate::db::{map_sqlx, DbPool};

pub struct PostgresReportRepository {
    pool: DbPool,
}

impl PostgresReportRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReportRepository for PostgresReportRepository {
    async fn append(&self, report: AbuseReport) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"INSERT INTO reports (room, reporter, target, text, created_at)
               VALUES ($1, $2, $3, $4, $5)"#,
        )
        .bind(report.room.as_str())
        .bind(report.reporter.as_str())
        .bind(report.target.as_str())
        .bind(&report.text)
        .bind(report.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(())
    }
}
