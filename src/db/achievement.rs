use color_eyre::{eyre::OptionExt, Result};
use libsql::params;

use super::helpers::{fetch_all, fetch_scalar};
use super::models::EarnedAchievementRow;
use super::Db;
use crate::services::achievements::{AchievementRepository, UserFacts};

impl AchievementRepository for Db {
    async fn user_facts(&self, user_id: i64) -> Result<UserFacts> {
        let conn = self.connect()?;

        let completed_lessons = fetch_scalar(
            &conn,
            "SELECT COUNT(*) FROM lesson_progress WHERE user_id = ? AND completed = 1",
            params![user_id],
        )
        .await?;

        let passed_quizzes = fetch_scalar(
            &conn,
            "SELECT COUNT(*) FROM quiz_attempts WHERE user_id = ? AND passed = 1",
            params![user_id],
        )
        .await?;

        let has_perfect_score = fetch_scalar(
            &conn,
            "SELECT EXISTS(SELECT 1 FROM quiz_attempts WHERE user_id = ? AND score >= 100)",
            params![user_id],
        )
        .await?
            != 0;

        Ok(UserFacts {
            completed_lessons,
            passed_quizzes,
            has_perfect_score,
        })
    }

    async fn ensure_achievement(
        &self,
        title: &str,
        description: &str,
        badge_type: &str,
        points: i64,
    ) -> Result<i64> {
        let conn = self.connect()?;

        conn.execute(
            r#"
            INSERT INTO achievements (title, description, badge_type, points)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(title) DO NOTHING
            "#,
            params![title, description, badge_type, points],
        )
        .await?;

        let id = conn
            .query(
                "SELECT id FROM achievements WHERE title = ?",
                params![title],
            )
            .await?
            .next()
            .await?
            .ok_or_eyre("achievement definition missing after ensure")?
            .get::<i64>(0)?;

        Ok(id)
    }

    async fn award_achievement(
        &self,
        user_id: i64,
        achievement_id: i64,
        earned_at: &str,
    ) -> Result<bool> {
        let conn = self.connect()?;
        // Insert-if-absent: the unique (user, achievement) index makes
        // concurrent evaluations award at most once.
        let affected = conn
            .execute(
                r#"
                INSERT INTO user_achievements (user_id, achievement_id, earned_at)
                VALUES (?, ?, ?)
                ON CONFLICT(user_id, achievement_id) DO NOTHING
                "#,
                params![user_id, achievement_id, earned_at],
            )
            .await?;

        Ok(affected > 0)
    }

    async fn user_achievements(&self, user_id: i64) -> Result<Vec<EarnedAchievementRow>> {
        let conn = self.connect()?;
        fetch_all(
            &conn,
            r#"
            SELECT a.id, a.title, a.description, a.badge_type, a.points, ua.earned_at
            FROM user_achievements ua
            JOIN achievements a ON a.id = ua.achievement_id
            WHERE ua.user_id = ?
            ORDER BY ua.earned_at DESC, a.id DESC
            "#,
            params![user_id],
        )
        .await
    }
}
