use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use crate::{
    rejections::{AppError, ResultExt},
    services::{
        self,
        progress::{
            DropOutcome, EnrollOutcome, MarkLessonOutcome, ProgressRepository, ProgressService,
        },
    },
    AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/courses/{course_id}/enroll", post(enroll))
        .route("/courses/{course_id}/drop", post(drop_enrollment))
        .route(
            "/users/{user_id}/courses/{course_id}/enrollment",
            get(get_enrollment),
        )
        .route("/lessons/{lesson_id}/complete", post(complete_lesson))
        .route("/lessons/{lesson_id}/incomplete", post(uncomplete_lesson))
        .route("/lessons/{lesson_id}/time", post(add_lesson_time))
}

#[derive(Deserialize)]
struct UserBody {
    user_id: i64,
}

#[derive(Deserialize)]
struct LessonTimeBody {
    user_id: i64,
    minutes: i64,
}

async fn enroll(
    State(state): State<AppState>,
    Path(course_id): Path<i64>,
    Json(body): Json<UserBody>,
) -> Result<impl IntoResponse, AppError> {
    let service = ProgressService::new(state.db.clone());
    let outcome = service
        .enroll(body.user_id, course_id)
        .await
        .reject("could not enroll user")?;

    match outcome {
        EnrollOutcome::Enrolled(enrollment) => Ok((StatusCode::CREATED, Json(enrollment))),
        EnrollOutcome::AlreadyEnrolled => Err(AppError::Conflict(
            "already enrolled in this course".to_string(),
        )),
        EnrollOutcome::CourseNotFound => Err(AppError::NotFound("course not found")),
    }
}

async fn drop_enrollment(
    State(state): State<AppState>,
    Path(course_id): Path<i64>,
    Json(body): Json<UserBody>,
) -> Result<impl IntoResponse, AppError> {
    let service = ProgressService::new(state.db.clone());
    let outcome = service
        .drop_enrollment(body.user_id, course_id)
        .await
        .reject("could not drop enrollment")?;

    match outcome {
        DropOutcome::Dropped => Ok(Json(json!({ "dropped": true }))),
        DropOutcome::NotEnrolled => Err(AppError::NotFound("enrollment not found")),
        DropOutcome::NotActive => Err(AppError::Conflict(
            "only active enrollments can be dropped".to_string(),
        )),
    }
}

async fn get_enrollment(
    State(state): State<AppState>,
    Path((user_id, course_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, AppError> {
    let enrollment = state
        .db
        .get_enrollment(user_id, course_id)
        .await
        .reject("could not get enrollment")?
        .ok_or(AppError::NotFound("enrollment not found"))?;

    Ok(Json(enrollment))
}

async fn complete_lesson(
    State(state): State<AppState>,
    Path(lesson_id): Path<i64>,
    Json(body): Json<UserBody>,
) -> Result<impl IntoResponse, AppError> {
    set_lesson(state, lesson_id, body.user_id, true).await
}

async fn uncomplete_lesson(
    State(state): State<AppState>,
    Path(lesson_id): Path<i64>,
    Json(body): Json<UserBody>,
) -> Result<impl IntoResponse, AppError> {
    set_lesson(state, lesson_id, body.user_id, false).await
}

/// Toggle the lesson fact, then drain the progress/achievement cascade.
async fn set_lesson(
    state: AppState,
    lesson_id: i64,
    user_id: i64,
    completed: bool,
) -> Result<Json<serde_json::Value>, AppError> {
    let service = ProgressService::new(state.db.clone());
    let outcome = service
        .set_lesson_completed(user_id, lesson_id, completed)
        .await
        .reject("could not update lesson progress")?;

    match outcome {
        MarkLessonOutcome::Marked { effects, .. } => {
            let pipeline = services::run_effects(&state.db, effects)
                .await
                .reject("could not apply progress effects")?;

            Ok(Json(json!({
                "completed": completed,
                "progress": pipeline.progress,
                "course_completed": pipeline.course_completed,
                "awarded": pipeline.awarded,
            })))
        }
        MarkLessonOutcome::LessonNotFound => Err(AppError::NotFound("lesson not found")),
    }
}

async fn add_lesson_time(
    State(state): State<AppState>,
    Path(lesson_id): Path<i64>,
    Json(body): Json<LessonTimeBody>,
) -> Result<impl IntoResponse, AppError> {
    let service = ProgressService::new(state.db.clone());
    let outcome = service
        .add_lesson_time(body.user_id, lesson_id, body.minutes)
        .await
        .reject("could not record lesson time")?;

    match outcome {
        MarkLessonOutcome::Marked { .. } => Ok(Json(json!({ "recorded": true }))),
        MarkLessonOutcome::LessonNotFound => Err(AppError::NotFound("lesson not found")),
    }
}
