use color_eyre::{eyre::OptionExt, Result};
use libsql::params;

use super::helpers::{fetch_all, fetch_optional, fetch_scalar};
use super::models::{AnswerRow, AttemptRow, QuizSnapshot};
use super::Db;
use crate::services::assessment::{AssessmentRepository, NewAnswer};

const ATTEMPT_COLUMNS: &str =
    "id, token, user_id, quiz_id, started_at, completed_at, score, passed";

impl AssessmentRepository for Db {
    async fn get_attempt(&self, attempt_id: i64) -> Result<Option<AttemptRow>> {
        let conn = self.connect()?;
        fetch_optional(
            &conn,
            &format!("SELECT {ATTEMPT_COLUMNS} FROM quiz_attempts WHERE id = ?"),
            params![attempt_id],
        )
        .await
    }

    async fn attempt_count(&self, user_id: i64, quiz_id: i64) -> Result<i64> {
        let conn = self.connect()?;
        fetch_scalar(
            &conn,
            "SELECT COUNT(*) FROM quiz_attempts WHERE user_id = ? AND quiz_id = ?",
            params![user_id, quiz_id],
        )
        .await
    }

    async fn create_attempt(
        &self,
        user_id: i64,
        quiz_id: i64,
        token: &str,
        started_at: &str,
    ) -> Result<AttemptRow> {
        let conn = self.connect()?;
        let row = conn
            .query(
                &format!(
                    r#"
                    INSERT INTO quiz_attempts (token, user_id, quiz_id, started_at)
                    VALUES (?, ?, ?, ?)
                    RETURNING {ATTEMPT_COLUMNS}
                    "#
                ),
                params![token, user_id, quiz_id, started_at],
            )
            .await?
            .next()
            .await?
            .ok_or_eyre("could not read back created attempt")?;

        Ok(libsql::de::from_row::<AttemptRow>(&row)?)
    }

    async fn quiz_snapshot(&self, quiz_id: i64) -> Result<Option<QuizSnapshot>> {
        self.load_quiz_snapshot(quiz_id).await
    }

    async fn upsert_answer(&self, answer: NewAnswer) -> Result<()> {
        let conn = self.connect()?;
        conn.execute(
            r#"
            INSERT INTO quiz_answers (attempt_id, question_id, option_id, answer_text, is_correct, points_earned)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(attempt_id, question_id) DO UPDATE SET
                option_id = excluded.option_id,
                answer_text = excluded.answer_text,
                is_correct = excluded.is_correct,
                points_earned = excluded.points_earned
            "#,
            params![
                answer.attempt_id,
                answer.question_id,
                answer.option_id,
                answer.answer_text,
                answer.is_correct,
                answer.points_earned
            ],
        )
        .await?;

        tracing::info!(
            "answer stored for attempt={} question={}",
            answer.attempt_id,
            answer.question_id
        );
        Ok(())
    }

    async fn answered_count(&self, attempt_id: i64) -> Result<i64> {
        let conn = self.connect()?;
        fetch_scalar(
            &conn,
            "SELECT COUNT(*) FROM quiz_answers WHERE attempt_id = ?",
            params![attempt_id],
        )
        .await
    }

    async fn earned_points(&self, attempt_id: i64) -> Result<i64> {
        let conn = self.connect()?;
        fetch_scalar(
            &conn,
            "SELECT COALESCE(SUM(points_earned), 0) FROM quiz_answers WHERE attempt_id = ?",
            params![attempt_id],
        )
        .await
    }

    async fn finalize_attempt(
        &self,
        attempt_id: i64,
        completed_at: &str,
        score: f64,
        passed: bool,
    ) -> Result<()> {
        let conn = self.connect()?;
        // The IS NULL guard keeps a racing double-completion from rewriting
        // the frozen result.
        let affected = conn
            .execute(
                r#"
                UPDATE quiz_attempts
                SET completed_at = ?, score = ?, passed = ?
                WHERE id = ? AND completed_at IS NULL
                "#,
                params![completed_at, score, passed, attempt_id],
            )
            .await?;

        if affected == 0 {
            tracing::warn!("attempt {attempt_id} was already finalized, leaving it untouched");
        }
        Ok(())
    }

    async fn attempt_answers(&self, attempt_id: i64) -> Result<Vec<AnswerRow>> {
        let conn = self.connect()?;
        fetch_all(
            &conn,
            r#"
            SELECT a.id, a.attempt_id, a.question_id, a.option_id, a.answer_text,
                   a.is_correct, a.points_earned
            FROM quiz_answers a
            JOIN questions q ON q.id = a.question_id
            WHERE a.attempt_id = ?
            ORDER BY q.position
            "#,
            params![attempt_id],
        )
        .await
    }
}
