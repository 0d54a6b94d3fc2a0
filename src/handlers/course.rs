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
    models::CourseDefinition,
    names,
    rejections::{AppError, ResultExt},
    AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(names::USERS_URL, post(create_user))
        .route(names::COURSES_URL, post(create_course))
        .route("/courses/{course_id}", get(get_course))
        .route("/quizzes/{quiz_id}/stats", get(quiz_stats))
}

#[derive(Deserialize)]
struct CreateUserBody {
    display_name: String,
}

async fn create_user(
    State(state): State<AppState>,
    Json(body): Json<CreateUserBody>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = state
        .db
        .create_user(&body.display_name)
        .await
        .reject("could not create user")?;

    Ok((StatusCode::CREATED, Json(json!({ "id": user_id }))))
}

async fn create_course(
    State(state): State<AppState>,
    Json(def): Json<CourseDefinition>,
) -> Result<impl IntoResponse, AppError> {
    let course_id = state
        .db
        .load_course(&def)
        .await
        .reject("could not load course")?;

    Ok((StatusCode::CREATED, Json(json!({ "id": course_id }))))
}

async fn get_course(
    State(state): State<AppState>,
    Path(course_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let course = state
        .db
        .get_course(course_id)
        .await
        .reject("could not get course")?
        .ok_or(AppError::NotFound("course not found"))?;

    let lessons = state
        .db
        .course_lessons(course_id)
        .await
        .reject("could not get lessons")?;

    let quizzes = state
        .db
        .course_quizzes(course_id)
        .await
        .reject("could not get quizzes")?;

    Ok(Json(json!({
        "course": course,
        "lessons": lessons,
        "quizzes": quizzes,
    })))
}

async fn quiz_stats(
    State(state): State<AppState>,
    Path(quiz_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    state
        .db
        .get_quiz(quiz_id)
        .await
        .reject("could not get quiz")?
        .ok_or(AppError::NotFound("quiz not found"))?;

    let stats = state
        .db
        .quiz_stats(quiz_id)
        .await
        .reject("could not get quiz stats")?;

    Ok(Json(stats))
}
