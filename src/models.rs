use serde::Deserialize;

use crate::names;

/// Course content as supplied by the authoring collaborator. Lessons and
/// questions are ordered by their place in these lists; the position the
/// engine evaluates them in is assigned at load time, never inferred later.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseDefinition {
    pub title: String,
    #[serde(default)]
    pub lessons: Vec<LessonDefinition>,
    #[serde(default)]
    pub quizzes: Vec<QuizDefinition>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonDefinition {
    pub title: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizDefinition {
    pub title: String,
    pub passing_score: Option<i64>,
    pub time_limit_minutes: Option<i64>,
    pub max_attempts: Option<i64>,
    pub questions: Vec<QuestionDefinition>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDefinition {
    pub content: String,
    #[serde(default = "default_points")]
    pub points: i64,
    pub options: Vec<OptionDefinition>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionDefinition {
    pub text: String,
    pub is_answer: bool,
}

fn default_points() -> i64 {
    names::DEFAULT_QUESTION_POINTS
}
