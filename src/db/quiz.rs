use color_eyre::Result;
use libsql::params;
use serde::Deserialize;

use super::helpers::{fetch_all, fetch_one, fetch_optional};
use super::models::{OptionSnapshot, QuestionSnapshot, QuizRow, QuizSnapshot, QuizStatsRow};
use super::Db;

#[derive(Deserialize)]
struct QuestionJoinRow {
    id: i64,
    points: i64,
}

#[derive(Deserialize)]
struct OptionJoinRow {
    id: i64,
    question_id: i64,
    is_correct: bool,
}

impl Db {
    pub async fn get_quiz(&self, quiz_id: i64) -> Result<Option<QuizRow>> {
        let conn = self.connect()?;
        fetch_optional(
            &conn,
            r#"
            SELECT id, course_id, title, passing_score, time_limit_minutes, max_attempts
            FROM quizzes
            WHERE id = ?
            "#,
            params![quiz_id],
        )
        .await
    }

    pub async fn course_quizzes(&self, course_id: i64) -> Result<Vec<QuizRow>> {
        let conn = self.connect()?;
        fetch_all(
            &conn,
            r#"
            SELECT id, course_id, title, passing_score, time_limit_minutes, max_attempts
            FROM quizzes
            WHERE course_id = ?
            ORDER BY id
            "#,
            params![course_id],
        )
        .await
    }

    /// Assemble the read snapshot the attempt engine works from: the quiz
    /// row plus its questions in evaluation order with their options.
    pub async fn load_quiz_snapshot(&self, quiz_id: i64) -> Result<Option<QuizSnapshot>> {
        let Some(quiz) = self.get_quiz(quiz_id).await? else {
            return Ok(None);
        };

        let conn = self.connect()?;

        let question_rows: Vec<QuestionJoinRow> = fetch_all(
            &conn,
            "SELECT id, points FROM questions WHERE quiz_id = ? ORDER BY position",
            params![quiz_id],
        )
        .await?;

        let option_rows: Vec<OptionJoinRow> = fetch_all(
            &conn,
            r#"
            SELECT o.id, o.question_id, o.is_correct
            FROM question_options o
            JOIN questions q ON q.id = o.question_id
            WHERE q.quiz_id = ?
            ORDER BY q.position, o.position
            "#,
            params![quiz_id],
        )
        .await?;

        let questions = question_rows
            .into_iter()
            .map(|q| QuestionSnapshot {
                id: q.id,
                points: q.points,
                options: option_rows
                    .iter()
                    .filter(|o| o.question_id == q.id)
                    .map(|o| OptionSnapshot {
                        id: o.id,
                        is_correct: o.is_correct,
                    })
                    .collect(),
            })
            .collect();

        Ok(Some(QuizSnapshot {
            id: quiz.id,
            course_id: quiz.course_id,
            passing_score: quiz.passing_score,
            time_limit_minutes: quiz.time_limit_minutes,
            max_attempts: quiz.max_attempts,
            questions,
        }))
    }

    /// Attempt count / average / best over completed attempts.
    pub async fn quiz_stats(&self, quiz_id: i64) -> Result<QuizStatsRow> {
        let conn = self.connect()?;
        fetch_one(
            &conn,
            r#"
            SELECT
                COUNT(*) AS attempts,
                COUNT(completed_at) AS completed_attempts,
                AVG(CASE WHEN completed_at IS NOT NULL THEN score END) AS average_score,
                MAX(CASE WHEN completed_at IS NOT NULL THEN score END) AS best_score
            FROM quiz_attempts
            WHERE quiz_id = ?
            "#,
            params![quiz_id],
        )
        .await
    }
}
