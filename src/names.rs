pub const USERS_URL: &str = "/users";
pub const COURSES_URL: &str = "/courses";

pub fn course_url(course_id: i64) -> String {
    format!("/courses/{course_id}")
}

pub fn enroll_url(course_id: i64) -> String {
    format!("/courses/{course_id}/enroll")
}

pub fn drop_enrollment_url(course_id: i64) -> String {
    format!("/courses/{course_id}/drop")
}

pub fn enrollment_url(user_id: i64, course_id: i64) -> String {
    format!("/users/{user_id}/courses/{course_id}/enrollment")
}

pub fn complete_lesson_url(lesson_id: i64) -> String {
    format!("/lessons/{lesson_id}/complete")
}

pub fn uncomplete_lesson_url(lesson_id: i64) -> String {
    format!("/lessons/{lesson_id}/incomplete")
}

pub fn lesson_time_url(lesson_id: i64) -> String {
    format!("/lessons/{lesson_id}/time")
}

pub fn start_attempt_url(quiz_id: i64) -> String {
    format!("/quizzes/{quiz_id}/attempts")
}

pub fn quiz_stats_url(quiz_id: i64) -> String {
    format!("/quizzes/{quiz_id}/stats")
}

pub fn attempt_url(attempt_id: i64) -> String {
    format!("/attempts/{attempt_id}")
}

pub fn submit_answer_url(attempt_id: i64) -> String {
    format!("/attempts/{attempt_id}/answers")
}

pub fn complete_attempt_url(attempt_id: i64) -> String {
    format!("/attempts/{attempt_id}/complete")
}

pub fn user_achievements_url(user_id: i64) -> String {
    format!("/users/{user_id}/achievements")
}

// Engine defaults
pub const DEFAULT_PASSING_SCORE: i64 = 70;
pub const DEFAULT_QUESTION_POINTS: i64 = 1;
