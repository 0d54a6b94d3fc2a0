mod common;

use common::{course, create_test_db, lessons, single_question_quiz};
use learnhall::db::Db;
use learnhall::services::achievements::{AchievementRepository, AchievementService};
use learnhall::services::assessment::{
    AssessmentService, StartAttemptOutcome, SubmitAnswerOutcome,
};
use learnhall::services::progress::{ProgressRepository, ProgressService};
use learnhall::services::{self, PipelineOutcome};

async fn complete_lesson(db: &Db, user_id: i64, lesson_id: i64) -> PipelineOutcome {
    let outcome = ProgressService::new(db.clone())
        .set_lesson_completed(user_id, lesson_id, true)
        .await
        .unwrap();
    match outcome {
        learnhall::services::progress::MarkLessonOutcome::Marked { effects, .. } => {
            services::run_effects(db, effects).await.unwrap()
        }
        _ => panic!("lesson should exist"),
    }
}

/// Answer the quiz's single question correctly, completing the attempt, and
/// drain the achievement cascade.
async fn pass_quiz(db: &Db, user_id: i64, quiz_id: i64) -> PipelineOutcome {
    let service = AssessmentService::new(db.clone());
    let attempt_id = match service.start_attempt(user_id, quiz_id).await.unwrap() {
        StartAttemptOutcome::Started(attempt) => attempt.id,
        _ => panic!("attempt should start"),
    };

    let snapshot = db.load_quiz_snapshot(quiz_id).await.unwrap().unwrap();
    let question = &snapshot.questions[0];
    let option = question.options.iter().find(|o| o.is_correct).unwrap().id;

    match service
        .submit_answer(attempt_id, question.id, Some(option), None)
        .await
        .unwrap()
    {
        SubmitAnswerOutcome::Completed { effects, .. } => {
            services::run_effects(db, effects).await.unwrap()
        }
        _ => panic!("single answer should complete the quiz"),
    }
}

fn awarded_titles(pipeline: &PipelineOutcome) -> Vec<&str> {
    pipeline.awarded.iter().map(|a| a.title.as_str()).collect()
}

#[tokio::test]
async fn first_completed_lesson_awards_first_steps_once() {
    let db = create_test_db().await;
    let user_id = db.create_user("Ada").await.unwrap();
    let course_id = db
        .load_course(&course("Course", lessons(2), vec![]))
        .await
        .unwrap();
    let course_lessons = db.course_lessons(course_id).await.unwrap();

    let pipeline = complete_lesson(&db, user_id, course_lessons[0].id).await;
    assert_eq!(awarded_titles(&pipeline), vec!["First Steps"]);

    // The second lesson changes the count but awards nothing new.
    let pipeline = complete_lesson(&db, user_id, course_lessons[1].id).await;
    assert!(pipeline.awarded.is_empty());
}

#[tokio::test]
async fn ten_lesson_milestone_awards_once_and_never_again() {
    let db = create_test_db().await;
    let user_id = db.create_user("Ada").await.unwrap();
    let course_id = db
        .load_course(&course("Long course", lessons(12), vec![]))
        .await
        .unwrap();
    let course_lessons = db.course_lessons(course_id).await.unwrap();

    let mut warrior_awards = 0;
    for lesson in &course_lessons {
        let pipeline = complete_lesson(&db, user_id, lesson.id).await;
        warrior_awards += pipeline
            .awarded
            .iter()
            .filter(|a| a.title == "Lesson Warrior")
            .count();
    }

    // Awarded exactly at the 10th lesson, silent on the 11th and 12th.
    assert_eq!(warrior_awards, 1);

    let facts = db.user_facts(user_id).await.unwrap();
    assert_eq!(facts.completed_lessons, 12);
}

#[tokio::test]
async fn milestone_survives_a_batched_count_jump() {
    // Facts jump straight from 0 to 12 before any evaluation runs; the
    // 10-lesson milestone must still land.
    let db = create_test_db().await;
    let user_id = db.create_user("Ada").await.unwrap();
    let course_id = db
        .load_course(&course("Course", lessons(12), vec![]))
        .await
        .unwrap();

    let now = chrono::Utc::now().to_rfc3339();
    for lesson in db.course_lessons(course_id).await.unwrap() {
        db.mark_lesson(user_id, lesson.id, true, Some(&now))
            .await
            .unwrap();
    }

    let awarded = AchievementService::new(db.clone())
        .evaluate(user_id)
        .await
        .unwrap();
    let titles: Vec<_> = awarded.iter().map(|a| a.title.as_str()).collect();
    assert!(titles.contains(&"Lesson Warrior"));
    assert!(titles.contains(&"First Steps"));
}

#[tokio::test]
async fn fifth_passed_quiz_awards_quiz_expert_exactly_once() {
    let db = create_test_db().await;
    let user_id = db.create_user("Ada").await.unwrap();
    let quizzes: Vec<_> = (1..=5)
        .map(|i| single_question_quiz(&format!("Quiz {i}"), None))
        .collect();
    let course_id = db
        .load_course(&course("Course", lessons(0), quizzes))
        .await
        .unwrap();
    let quiz_rows = db.course_quizzes(course_id).await.unwrap();

    let pipeline = pass_quiz(&db, user_id, quiz_rows[0].id).await;
    assert_eq!(
        awarded_titles(&pipeline),
        vec!["Quiz Master", "Perfect Score"]
    );

    for quiz in &quiz_rows[1..4] {
        let pipeline = pass_quiz(&db, user_id, quiz.id).await;
        assert!(pipeline.awarded.is_empty());
    }

    let pipeline = pass_quiz(&db, user_id, quiz_rows[4].id).await;
    assert_eq!(awarded_titles(&pipeline), vec!["Quiz Expert"]);

    // Facts unchanged since the award: nothing further to give.
    let again = AchievementService::new(db.clone())
        .evaluate(user_id)
        .await
        .unwrap();
    assert!(again.is_empty());
}

#[tokio::test]
async fn failed_attempts_never_feed_the_pass_count() {
    let db = create_test_db().await;
    let user_id = db.create_user("Ada").await.unwrap();
    let course_id = db
        .load_course(&course(
            "Course",
            lessons(0),
            vec![single_question_quiz("Quiz", None)],
        ))
        .await
        .unwrap();
    let quiz = db.course_quizzes(course_id).await.unwrap().remove(0);
    let snapshot = db.load_quiz_snapshot(quiz.id).await.unwrap().unwrap();
    let question = &snapshot.questions[0];
    let wrong = question.options.iter().find(|o| !o.is_correct).unwrap().id;

    let service = AssessmentService::new(db.clone());
    let attempt_id = match service.start_attempt(user_id, quiz.id).await.unwrap() {
        StartAttemptOutcome::Started(attempt) => attempt.id,
        _ => panic!("attempt should start"),
    };

    match service
        .submit_answer(attempt_id, question.id, Some(wrong), None)
        .await
        .unwrap()
    {
        SubmitAnswerOutcome::Completed { attempt, effects } => {
            assert!(!attempt.passed);
            let pipeline = services::run_effects(&db, effects).await.unwrap();
            assert!(pipeline.awarded.is_empty());
        }
        _ => panic!("expected completion"),
    }

    let facts = db.user_facts(user_id).await.unwrap();
    assert_eq!(facts.passed_quizzes, 0);
    assert!(!facts.has_perfect_score);
}

#[tokio::test]
async fn earned_listing_carries_badges_and_total_points() {
    let db = create_test_db().await;
    let user_id = db.create_user("Ada").await.unwrap();
    let course_id = db
        .load_course(&course(
            "Course",
            lessons(1),
            vec![single_question_quiz("Quiz", None)],
        ))
        .await
        .unwrap();
    let course_lessons = db.course_lessons(course_id).await.unwrap();
    let quiz = db.course_quizzes(course_id).await.unwrap().remove(0);

    complete_lesson(&db, user_id, course_lessons[0].id).await;
    pass_quiz(&db, user_id, quiz.id).await;

    let earned = AchievementService::new(db.clone())
        .earned(user_id)
        .await
        .unwrap();
    let titles: Vec<_> = earned.iter().map(|a| a.title.as_str()).collect();
    assert_eq!(titles.len(), 3);
    assert!(titles.contains(&"First Steps"));
    assert!(titles.contains(&"Quiz Master"));
    assert!(titles.contains(&"Perfect Score"));

    let first_steps = earned.iter().find(|a| a.title == "First Steps").unwrap();
    assert_eq!(first_steps.badge_type.as_deref(), Some("bronze"));
    assert_eq!(first_steps.points, 10);

    // 10 + 25 + 100
    let total: i64 = earned.iter().map(|a| a.points).sum();
    assert_eq!(total, 135);
}
