// Database model structs

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UserRow {
    pub id: i64,
    pub display_name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CourseRow {
    pub id: i64,
    pub title: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LessonRow {
    pub id: i64,
    pub course_id: i64,
    pub title: String,
    pub position: i64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QuizRow {
    pub id: i64,
    pub course_id: i64,
    pub title: String,
    pub passing_score: Option<i64>,
    pub time_limit_minutes: Option<i64>,
    pub max_attempts: Option<i64>,
}

/// One quiz attempt. `score` and `passed` are both null while the attempt is
/// in progress and both set once it completes; `completed_at` is the
/// completion marker.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AttemptRow {
    pub id: i64,
    pub token: String,
    pub user_id: i64,
    pub quiz_id: i64,
    pub started_at: String,
    pub completed_at: Option<String>,
    pub score: Option<f64>,
    pub passed: Option<bool>,
}

impl AttemptRow {
    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AnswerRow {
    pub id: i64,
    pub attempt_id: i64,
    pub question_id: i64,
    pub option_id: Option<i64>,
    pub answer_text: Option<String>,
    pub is_correct: Option<bool>,
    pub points_earned: i64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EnrollmentRow {
    pub id: i64,
    pub user_id: i64,
    pub course_id: i64,
    pub status: String,
    pub progress: f64,
    pub enrolled_at: String,
    pub completed_at: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EarnedAchievementRow {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub badge_type: Option<String>,
    pub points: i64,
    pub earned_at: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QuizStatsRow {
    pub attempts: i64,
    pub completed_attempts: i64,
    pub average_score: Option<f64>,
    pub best_score: Option<f64>,
}

// ---------------------------------------------------------------------------
// Read snapshots assembled for the engine (not table rows)
// ---------------------------------------------------------------------------

/// A quiz with its questions in evaluation order, as the attempt engine
/// consumes it. Read-only from the engine's perspective.
#[derive(Debug, Clone)]
pub struct QuizSnapshot {
    pub id: i64,
    pub course_id: i64,
    pub passing_score: Option<i64>,
    pub time_limit_minutes: Option<i64>,
    pub max_attempts: Option<i64>,
    pub questions: Vec<QuestionSnapshot>,
}

impl QuizSnapshot {
    pub fn total_points(&self) -> i64 {
        self.questions.iter().map(|q| q.points).sum()
    }

    pub fn question(&self, question_id: i64) -> Option<&QuestionSnapshot> {
        self.questions.iter().find(|q| q.id == question_id)
    }
}

#[derive(Debug, Clone)]
pub struct QuestionSnapshot {
    pub id: i64,
    pub points: i64,
    pub options: Vec<OptionSnapshot>,
}

#[derive(Debug, Clone)]
pub struct OptionSnapshot {
    pub id: i64,
    pub is_correct: bool,
}
