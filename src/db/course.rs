use color_eyre::{eyre::OptionExt, Result};
use libsql::params;

use super::helpers::{fetch_all, fetch_optional};
use super::models::{CourseRow, LessonRow, UserRow};
use super::Db;
use crate::models::CourseDefinition;

impl Db {
    pub async fn create_user(&self, display_name: &str) -> Result<i64> {
        let conn = self.connect()?;
        let user_id = conn
            .query(
                "INSERT INTO users (display_name) VALUES (?) RETURNING id",
                params![display_name],
            )
            .await?
            .next()
            .await?
            .ok_or_eyre("could not get user id")?
            .get::<i64>(0)?;

        tracing::info!("new user created: id={user_id}");
        Ok(user_id)
    }

    pub async fn get_user(&self, user_id: i64) -> Result<Option<UserRow>> {
        let conn = self.connect()?;
        fetch_optional(
            &conn,
            "SELECT id, display_name FROM users WHERE id = ?",
            params![user_id],
        )
        .await
    }

    /// Load a full course definition (lessons, quizzes, questions, options)
    /// atomically. Lesson and question positions are assigned from list
    /// order; the engine later consumes them strictly by that order.
    pub async fn load_course(&self, def: &CourseDefinition) -> Result<i64> {
        let conn = self.connect()?;
        let tx = conn.transaction().await?;

        let course_id = tx
            .query(
                "INSERT INTO courses (title) VALUES (?) RETURNING id",
                params![def.title.as_str()],
            )
            .await?
            .next()
            .await?
            .ok_or_eyre("could not get course id")?
            .get::<i64>(0)?;

        for (idx, lesson) in def.lessons.iter().enumerate() {
            tx.execute(
                "INSERT INTO lessons (course_id, title, position) VALUES (?, ?, ?)",
                params![course_id, lesson.title.as_str(), (idx + 1) as i64],
            )
            .await?;
        }

        for quiz in &def.quizzes {
            let quiz_id = tx
                .query(
                    r#"
                    INSERT INTO quizzes (course_id, title, passing_score, time_limit_minutes, max_attempts)
                    VALUES (?, ?, ?, ?, ?) RETURNING id
                    "#,
                    params![
                        course_id,
                        quiz.title.as_str(),
                        quiz.passing_score,
                        quiz.time_limit_minutes,
                        quiz.max_attempts
                    ],
                )
                .await?
                .next()
                .await?
                .ok_or_eyre("could not get quiz id")?
                .get::<i64>(0)?;

            for (q_idx, question) in quiz.questions.iter().enumerate() {
                let question_id = tx
                    .query(
                        r#"
                        INSERT INTO questions (quiz_id, position, content, points)
                        VALUES (?, ?, ?, ?) RETURNING id
                        "#,
                        params![
                            quiz_id,
                            (q_idx + 1) as i64,
                            question.content.as_str(),
                            question.points
                        ],
                    )
                    .await?
                    .next()
                    .await?
                    .ok_or_eyre("could not get question id")?
                    .get::<i64>(0)?;

                for (o_idx, option) in question.options.iter().enumerate() {
                    tx.execute(
                        r#"
                        INSERT INTO question_options (question_id, position, content, is_correct)
                        VALUES (?, ?, ?, ?)
                        "#,
                        params![
                            question_id,
                            (o_idx + 1) as i64,
                            option.text.as_str(),
                            option.is_answer
                        ],
                    )
                    .await?;
                }
            }
        }

        tx.commit().await?;

        tracing::info!(
            "course loaded: id={course_id}, lessons={}, quizzes={}",
            def.lessons.len(),
            def.quizzes.len()
        );
        Ok(course_id)
    }

    pub async fn get_course(&self, course_id: i64) -> Result<Option<CourseRow>> {
        let conn = self.connect()?;
        fetch_optional(
            &conn,
            "SELECT id, title FROM courses WHERE id = ?",
            params![course_id],
        )
        .await
    }

    pub async fn course_lessons(&self, course_id: i64) -> Result<Vec<LessonRow>> {
        let conn = self.connect()?;
        fetch_all(
            &conn,
            r#"
            SELECT id, course_id, title, position
            FROM lessons
            WHERE course_id = ?
            ORDER BY position
            "#,
            params![course_id],
        )
        .await
    }
}
