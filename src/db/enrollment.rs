use color_eyre::{eyre::OptionExt, Result};
use libsql::params;

use super::helpers::{fetch_optional, fetch_scalar};
use super::models::EnrollmentRow;
use super::Db;
use crate::services::progress::{ProgressRepository, STATUS_COMPLETED};

const ENROLLMENT_COLUMNS: &str =
    "id, user_id, course_id, status, progress, enrolled_at, completed_at";

impl ProgressRepository for Db {
    async fn course_exists(&self, course_id: i64) -> Result<bool> {
        let conn = self.connect()?;
        let exists = fetch_scalar(
            &conn,
            "SELECT EXISTS(SELECT 1 FROM courses WHERE id = ?)",
            params![course_id],
        )
        .await?;
        Ok(exists != 0)
    }

    async fn get_enrollment(&self, user_id: i64, course_id: i64) -> Result<Option<EnrollmentRow>> {
        let conn = self.connect()?;
        fetch_optional(
            &conn,
            &format!(
                "SELECT {ENROLLMENT_COLUMNS} FROM enrollments WHERE user_id = ? AND course_id = ?"
            ),
            params![user_id, course_id],
        )
        .await
    }

    async fn create_enrollment(
        &self,
        user_id: i64,
        course_id: i64,
        enrolled_at: &str,
    ) -> Result<EnrollmentRow> {
        let conn = self.connect()?;
        let tx = conn.transaction().await?;

        let row = tx
            .query(
                &format!(
                    r#"
                    INSERT INTO enrollments (user_id, course_id, enrolled_at)
                    VALUES (?, ?, ?)
                    RETURNING {ENROLLMENT_COLUMNS}
                    "#
                ),
                params![user_id, course_id, enrolled_at],
            )
            .await?
            .next()
            .await?
            .ok_or_eyre("could not read back created enrollment")?;
        let enrollment = libsql::de::from_row::<EnrollmentRow>(&row)?;

        // Seed a zero-progress fact per lesson so later toggles have a row
        // to flip.
        tx.execute(
            r#"
            INSERT INTO lesson_progress (user_id, lesson_id)
            SELECT ?, id FROM lessons WHERE course_id = ?
            ON CONFLICT(user_id, lesson_id) DO NOTHING
            "#,
            params![user_id, course_id],
        )
        .await?;

        tx.commit().await?;

        tracing::info!(
            "enrollment {} created for user={user_id}, course={course_id}",
            enrollment.id
        );
        Ok(enrollment)
    }

    async fn lesson_course(&self, lesson_id: i64) -> Result<Option<i64>> {
        let conn = self.connect()?;
        let row = conn
            .query(
                "SELECT course_id FROM lessons WHERE id = ?",
                params![lesson_id],
            )
            .await?
            .next()
            .await?;

        match row {
            Some(row) => Ok(Some(row.get::<i64>(0)?)),
            None => Ok(None),
        }
    }

    async fn mark_lesson(
        &self,
        user_id: i64,
        lesson_id: i64,
        completed: bool,
        completed_at: Option<&str>,
    ) -> Result<()> {
        let conn = self.connect()?;
        conn.execute(
            r#"
            INSERT INTO lesson_progress (user_id, lesson_id, completed, completed_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(user_id, lesson_id) DO UPDATE SET
                completed = excluded.completed,
                completed_at = excluded.completed_at
            "#,
            params![user_id, lesson_id, completed, completed_at],
        )
        .await?;
        Ok(())
    }

    async fn add_lesson_time(&self, user_id: i64, lesson_id: i64, minutes: i64) -> Result<()> {
        let conn = self.connect()?;
        conn.execute(
            r#"
            INSERT INTO lesson_progress (user_id, lesson_id, time_spent_minutes)
            VALUES (?, ?, ?)
            ON CONFLICT(user_id, lesson_id) DO UPDATE SET
                time_spent_minutes = lesson_progress.time_spent_minutes + excluded.time_spent_minutes
            "#,
            params![user_id, lesson_id, minutes],
        )
        .await?;
        Ok(())
    }

    async fn total_lessons(&self, course_id: i64) -> Result<i64> {
        let conn = self.connect()?;
        fetch_scalar(
            &conn,
            "SELECT COUNT(*) FROM lessons WHERE course_id = ?",
            params![course_id],
        )
        .await
    }

    async fn completed_lesson_count(&self, user_id: i64, course_id: i64) -> Result<i64> {
        let conn = self.connect()?;
        fetch_scalar(
            &conn,
            r#"
            SELECT COUNT(*)
            FROM lesson_progress p
            JOIN lessons l ON l.id = p.lesson_id
            WHERE p.user_id = ? AND l.course_id = ? AND p.completed = 1
            "#,
            params![user_id, course_id],
        )
        .await
    }

    async fn set_progress(&self, enrollment_id: i64, progress: f64) -> Result<()> {
        let conn = self.connect()?;
        conn.execute(
            "UPDATE enrollments SET progress = ? WHERE id = ?",
            params![progress, enrollment_id],
        )
        .await?;
        Ok(())
    }

    async fn complete_enrollment(&self, enrollment_id: i64, completed_at: &str) -> Result<()> {
        let conn = self.connect()?;
        conn.execute(
            "UPDATE enrollments SET status = ?, progress = 100, completed_at = ? WHERE id = ?",
            params![STATUS_COMPLETED, completed_at, enrollment_id],
        )
        .await?;
        Ok(())
    }

    async fn set_enrollment_status(&self, enrollment_id: i64, status: &str) -> Result<()> {
        let conn = self.connect()?;
        conn.execute(
            "UPDATE enrollments SET status = ? WHERE id = ?",
            params![status, enrollment_id],
        )
        .await?;
        Ok(())
    }
}
