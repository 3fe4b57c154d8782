//! Job record persistence.
//!
//! Handlers talk to `JobRepository`; `PgJobRepository` is the Postgres implementation
//! (plain runtime-checked queries against the `jobs` table). `AppState` holds an
//! `Arc<dyn JobRepository>`.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::assistant::analysis::AnalysisResult;
use crate::models::job::{JobRow, JobStatus};

/// Shown on a freshly created job until analysis finishes.
pub const LOADING_PLACEHOLDER: &str = "Yükleniyor...";

#[async_trait]
pub trait JobRepository: Send + Sync {
    /// Inserts a job whose title and company are placeholders.
    async fn insert_placeholder(
        &self,
        description: Option<&str>,
        link: Option<&str>,
    ) -> Result<JobRow, sqlx::Error>;

    /// Overwrites the analysis columns of a job.
    async fn apply_analysis(
        &self,
        id: i32,
        analysis: &AnalysisResult,
    ) -> Result<Option<JobRow>, sqlx::Error>;

    /// All jobs, newest first.
    async fn list_jobs(&self) -> Result<Vec<JobRow>, sqlx::Error>;

    async fn get_job(&self, id: i32) -> Result<Option<JobRow>, sqlx::Error>;

    /// Returns whether a row was deleted.
    async fn delete_job(&self, id: i32) -> Result<bool, sqlx::Error>;

    async fn update_status(&self, id: i32, status: JobStatus)
        -> Result<Option<JobRow>, sqlx::Error>;

    async fn update_details(
        &self,
        id: i32,
        title: &str,
        company: &str,
    ) -> Result<Option<JobRow>, sqlx::Error>;

    /// Stores the latest generated letter on the job.
    async fn save_letter(&self, id: i32, letter: &str) -> Result<(), sqlx::Error>;
}

#[derive(Clone)]
pub struct PgJobRepository {
    pool: PgPool,
}

impl PgJobRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobRepository for PgJobRepository {
    async fn insert_placeholder(
        &self,
        description: Option<&str>,
        link: Option<&str>,
    ) -> Result<JobRow, sqlx::Error> {
        sqlx::query_as::<_, JobRow>(
            r#"
            INSERT INTO jobs (title, company, description, link)
            VALUES ($1, $1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(LOADING_PLACEHOLDER)
        .bind(description)
        .bind(link)
        .fetch_one(&self.pool)
        .await
    }

    async fn apply_analysis(
        &self,
        id: i32,
        analysis: &AnalysisResult,
    ) -> Result<Option<JobRow>, sqlx::Error> {
        sqlx::query_as::<_, JobRow>(
            r#"
            UPDATE jobs
            SET title = $2, company = $3, summary_tr = $4,
                language_reqs = $5, location = $6, score = $7
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&analysis.title)
        .bind(&analysis.company)
        .bind(&analysis.summary_tr)
        .bind(&analysis.language_reqs)
        .bind(&analysis.location)
        .bind(analysis.score)
        .fetch_optional(&self.pool)
        .await
    }

    async fn list_jobs(&self) -> Result<Vec<JobRow>, sqlx::Error> {
        sqlx::query_as::<_, JobRow>("SELECT * FROM jobs ORDER BY created_at DESC, id DESC")
            .fetch_all(&self.pool)
            .await
    }

    async fn get_job(&self, id: i32) -> Result<Option<JobRow>, sqlx::Error> {
        sqlx::query_as::<_, JobRow>("SELECT * FROM jobs WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn delete_job(&self, id: i32) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM jobs WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn update_status(
        &self,
        id: i32,
        status: JobStatus,
    ) -> Result<Option<JobRow>, sqlx::Error> {
        sqlx::query_as::<_, JobRow>("UPDATE jobs SET status = $2 WHERE id = $1 RETURNING *")
            .bind(id)
            .bind(status.as_str())
            .fetch_optional(&self.pool)
            .await
    }

    async fn update_details(
        &self,
        id: i32,
        title: &str,
        company: &str,
    ) -> Result<Option<JobRow>, sqlx::Error> {
        sqlx::query_as::<_, JobRow>(
            "UPDATE jobs SET title = $2, company = $3 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(title)
        .bind(company)
        .fetch_optional(&self.pool)
        .await
    }

    async fn save_letter(&self, id: i32, letter: &str) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE jobs SET motivation_letter = $2 WHERE id = $1")
            .bind(id)
            .bind(letter)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::{Arc, Mutex};

    use chrono::Utc;

    use super::*;

    /// Keeps job rows in a `Vec`, mirroring the column defaults of the `jobs` table.
    #[derive(Default)]
    pub struct InMemoryJobs {
        pub rows: Mutex<Vec<JobRow>>,
    }

    impl InMemoryJobs {
        pub fn new() -> Arc<Self> {
            Arc::new(Self::default())
        }

        /// Seeds a finished job and returns its id.
        pub fn seed(&self, title: &str, company: &str, description: &str) -> i32 {
            let mut rows = self.rows.lock().unwrap();
            let id = rows.iter().map(|r| r.id).max().unwrap_or(0) + 1;
            rows.push(JobRow {
                id,
                title: title.to_string(),
                company: company.to_string(),
                description: Some(description.to_string()),
                link: None,
                status: JobStatus::New.as_str().to_string(),
                score: Some(50),
                motivation_letter: None,
                summary_tr: None,
                language_reqs: None,
                location: None,
                created_at: Utc::now(),
            });
            id
        }

        pub fn row(&self, id: i32) -> Option<JobRow> {
            self.rows.lock().unwrap().iter().find(|r| r.id == id).cloned()
        }

        pub fn len(&self) -> usize {
            self.rows.lock().unwrap().len()
        }

        fn modify(&self, id: i32, f: impl FnOnce(&mut JobRow)) -> Option<JobRow> {
            let mut rows = self.rows.lock().unwrap();
            let row = rows.iter_mut().find(|r| r.id == id)?;
            f(row);
            Some(row.clone())
        }
    }

    #[async_trait]
    impl JobRepository for InMemoryJobs {
        async fn insert_placeholder(
            &self,
            description: Option<&str>,
            link: Option<&str>,
        ) -> Result<JobRow, sqlx::Error> {
            let id = self.seed(LOADING_PLACEHOLDER, LOADING_PLACEHOLDER, "");
            Ok(self
                .modify(id, |row| {
                    row.description = description.map(str::to_string);
                    row.link = link.map(str::to_string);
                    row.score = None;
                })
                .unwrap())
        }

        async fn apply_analysis(
            &self,
            id: i32,
            analysis: &AnalysisResult,
        ) -> Result<Option<JobRow>, sqlx::Error> {
            Ok(self.modify(id, |row| {
                row.title = analysis.title.clone();
                row.company = analysis.company.clone();
                row.summary_tr = Some(analysis.summary_tr.clone());
                row.language_reqs = Some(analysis.language_reqs.clone());
                row.location = Some(analysis.location.clone());
                row.score = Some(analysis.score);
            }))
        }

        async fn list_jobs(&self) -> Result<Vec<JobRow>, sqlx::Error> {
            let mut rows = self.rows.lock().unwrap().clone();
            rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
            Ok(rows)
        }

        async fn get_job(&self, id: i32) -> Result<Option<JobRow>, sqlx::Error> {
            Ok(self.row(id))
        }

        async fn delete_job(&self, id: i32) -> Result<bool, sqlx::Error> {
            let mut rows = self.rows.lock().unwrap();
            let before = rows.len();
            rows.retain(|r| r.id != id);
            Ok(rows.len() < before)
        }

        async fn update_status(
            &self,
            id: i32,
            status: JobStatus,
        ) -> Result<Option<JobRow>, sqlx::Error> {
            Ok(self.modify(id, |row| row.status = status.as_str().to_string()))
        }

        async fn update_details(
            &self,
            id: i32,
            title: &str,
            company: &str,
        ) -> Result<Option<JobRow>, sqlx::Error> {
            Ok(self.modify(id, |row| {
                row.title = title.to_string();
                row.company = company.to_string();
            }))
        }

        async fn save_letter(&self, id: i32, letter: &str) -> Result<(), sqlx::Error> {
            self.modify(id, |row| row.motivation_letter = Some(letter.to_string()));
            Ok(())
        }
    }
}
