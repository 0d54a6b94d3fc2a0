use std::future::Future;

use color_eyre::Result;

use crate::db::models::EnrollmentRow;
use crate::db::Db;
use crate::utils::{self, round2};

use super::Effect;

pub const STATUS_ACTIVE: &str = "active";
pub const STATUS_COMPLETED: &str = "completed";
pub const STATUS_DROPPED: &str = "dropped";

// ---------------------------------------------------------------------------
// ProgressRepository trait (DIP: service defines the abstraction it needs)
// ---------------------------------------------------------------------------

#[cfg_attr(test, mockall::automock)]
pub trait ProgressRepository: Send + Sync {
    fn course_exists(&self, course_id: i64) -> impl Future<Output = Result<bool>> + Send;

    fn get_enrollment(
        &self,
        user_id: i64,
        course_id: i64,
    ) -> impl Future<Output = Result<Option<EnrollmentRow>>> + Send;

    /// Create the enrollment and seed a zero-progress fact for every lesson
    /// currently in the course, atomically.
    fn create_enrollment(
        &self,
        user_id: i64,
        course_id: i64,
        enrolled_at: &str,
    ) -> impl Future<Output = Result<EnrollmentRow>> + Send;

    /// The course a lesson belongs to, if the lesson exists.
    fn lesson_course(&self, lesson_id: i64) -> impl Future<Output = Result<Option<i64>>> + Send;

    /// Set the completion fact for `(user, lesson)`, creating it if the user
    /// was never seeded for this lesson.
    fn mark_lesson<'a>(
        &self,
        user_id: i64,
        lesson_id: i64,
        completed: bool,
        completed_at: Option<&'a str>,
    ) -> impl Future<Output = Result<()>> + Send;

    fn add_lesson_time(
        &self,
        user_id: i64,
        lesson_id: i64,
        minutes: i64,
    ) -> impl Future<Output = Result<()>> + Send;

    fn total_lessons(&self, course_id: i64) -> impl Future<Output = Result<i64>> + Send;

    fn completed_lesson_count(
        &self,
        user_id: i64,
        course_id: i64,
    ) -> impl Future<Output = Result<i64>> + Send;

    fn set_progress(
        &self,
        enrollment_id: i64,
        progress: f64,
    ) -> impl Future<Output = Result<()>> + Send;

    /// One-way transition: status completed, progress 100, completion stamp.
    fn complete_enrollment(
        &self,
        enrollment_id: i64,
        completed_at: &str,
    ) -> impl Future<Output = Result<()>> + Send;

    fn set_enrollment_status(
        &self,
        enrollment_id: i64,
        status: &str,
    ) -> impl Future<Output = Result<()>> + Send;
}

// ---------------------------------------------------------------------------
// Outcome types
// ---------------------------------------------------------------------------

pub enum EnrollOutcome {
    Enrolled(EnrollmentRow),
    /// An enrollment for (user, course) already exists; no duplicate row.
    AlreadyEnrolled,
    CourseNotFound,
}

pub enum MarkLessonOutcome {
    /// Fact stored; the caller owes a progress recompute for the course.
    Marked { course_id: i64, effects: Vec<Effect> },
    LessonNotFound,
}

/// Result of a progress recompute over fresh counts.
#[derive(Debug)]
pub struct ProgressUpdate {
    pub progress: f64,
    /// True only on the call that performed the active -> completed
    /// transition.
    pub completed_now: bool,
    pub effects: Vec<Effect>,
}

pub enum DropOutcome {
    Dropped,
    NotEnrolled,
    /// Only active enrollments can be dropped.
    NotActive,
}

/// Completion percentage over lesson counts, two decimal places, clamped to
/// [0, 100]. An empty course is 0%, never a division error.
pub fn completion_percentage(total_lessons: i64, completed_lessons: i64) -> f64 {
    if total_lessons <= 0 {
        return 0.0;
    }
    round2(completed_lessons as f64 / total_lessons as f64 * 100.0).clamp(0.0, 100.0)
}

// ---------------------------------------------------------------------------
// ProgressService
// ---------------------------------------------------------------------------

pub struct ProgressService<R: ProgressRepository = Db> {
    repo: R,
}

impl<R: ProgressRepository> ProgressService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub async fn enroll(&self, user_id: i64, course_id: i64) -> Result<EnrollOutcome> {
        if !self.repo.course_exists(course_id).await? {
            return Ok(EnrollOutcome::CourseNotFound);
        }

        if self.repo.get_enrollment(user_id, course_id).await?.is_some() {
            return Ok(EnrollOutcome::AlreadyEnrolled);
        }

        let enrolled_at = utils::now_rfc3339();
        let enrollment = self
            .repo
            .create_enrollment(user_id, course_id, &enrolled_at)
            .await?;

        tracing::info!("user {user_id} enrolled in course {course_id}");
        Ok(EnrollOutcome::Enrolled(enrollment))
    }

    /// Toggle a lesson-completion fact. The recompute itself runs as a
    /// returned effect, not here.
    pub async fn set_lesson_completed(
        &self,
        user_id: i64,
        lesson_id: i64,
        completed: bool,
    ) -> Result<MarkLessonOutcome> {
        let Some(course_id) = self.repo.lesson_course(lesson_id).await? else {
            return Ok(MarkLessonOutcome::LessonNotFound);
        };

        let completed_at = completed.then(utils::now_rfc3339);
        self.repo
            .mark_lesson(user_id, lesson_id, completed, completed_at.as_deref())
            .await?;

        tracing::info!("lesson {lesson_id} marked completed={completed} for user {user_id}");
        Ok(MarkLessonOutcome::Marked {
            course_id,
            effects: vec![Effect::RecomputeProgress { user_id, course_id }],
        })
    }

    pub async fn add_lesson_time(
        &self,
        user_id: i64,
        lesson_id: i64,
        minutes: i64,
    ) -> Result<MarkLessonOutcome> {
        let Some(course_id) = self.repo.lesson_course(lesson_id).await? else {
            return Ok(MarkLessonOutcome::LessonNotFound);
        };

        self.repo
            .add_lesson_time(user_id, lesson_id, minutes.max(0))
            .await?;

        // Time tracking never changes completion facts, so no effects.
        Ok(MarkLessonOutcome::Marked {
            course_id,
            effects: Vec::new(),
        })
    }

    /// Recompute enrollment progress from fresh counts. Progress always
    /// reflects the counts as of this call; the completed status is a
    /// one-way door and never regresses when lessons are unmarked later.
    pub async fn recompute_progress(
        &self,
        user_id: i64,
        course_id: i64,
    ) -> Result<Option<ProgressUpdate>> {
        let Some(enrollment) = self.repo.get_enrollment(user_id, course_id).await? else {
            // Lesson activity without an enrollment: nothing to aggregate.
            return Ok(None);
        };

        let total = self.repo.total_lessons(course_id).await?;
        let completed = self.repo.completed_lesson_count(user_id, course_id).await?;
        let progress = completion_percentage(total, completed);

        let completes =
            total > 0 && progress >= 100.0 && enrollment.status == STATUS_ACTIVE;

        if completes {
            let completed_at = utils::now_rfc3339();
            self.repo
                .complete_enrollment(enrollment.id, &completed_at)
                .await?;
            tracing::info!("enrollment {} completed for user {user_id}", enrollment.id);
        } else {
            self.repo.set_progress(enrollment.id, progress).await?;
        }

        Ok(Some(ProgressUpdate {
            progress: if completes { 100.0 } else { progress },
            completed_now: completes,
            effects: vec![Effect::EvaluateAchievements { user_id }],
        }))
    }

    pub async fn drop_enrollment(&self, user_id: i64, course_id: i64) -> Result<DropOutcome> {
        let Some(enrollment) = self.repo.get_enrollment(user_id, course_id).await? else {
            return Ok(DropOutcome::NotEnrolled);
        };

        if enrollment.status != STATUS_ACTIVE {
            return Ok(DropOutcome::NotActive);
        }

        self.repo
            .set_enrollment_status(enrollment.id, STATUS_DROPPED)
            .await?;

        tracing::info!("enrollment {} dropped by user {user_id}", enrollment.id);
        Ok(DropOutcome::Dropped)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn service(repo: MockProgressRepository) -> ProgressService<MockProgressRepository> {
        ProgressService::new(repo)
    }

    fn active_enrollment(progress: f64) -> EnrollmentRow {
        EnrollmentRow {
            id: 5,
            user_id: 1,
            course_id: 2,
            status: STATUS_ACTIVE.to_string(),
            progress,
            enrolled_at: chrono::Utc::now().to_rfc3339(),
            completed_at: None,
        }
    }

    #[test]
    fn percentage_is_rounded_and_safe_on_empty_course() {
        assert_eq!(completion_percentage(0, 0), 0.0);
        assert_eq!(completion_percentage(0, 3), 0.0);
        assert_eq!(completion_percentage(3, 1), 33.33);
        assert_eq!(completion_percentage(4, 4), 100.0);
    }

    #[tokio::test]
    async fn enroll_rejects_duplicates() {
        let mut repo = MockProgressRepository::new();
        repo.expect_course_exists()
            .returning(|_| Box::pin(async { Ok(true) }));
        repo.expect_get_enrollment()
            .returning(|_, _| Box::pin(async { Ok(Some(active_enrollment(0.0))) }));
        // No create_enrollment expectation: a duplicate row would panic here.

        let outcome = service(repo).enroll(1, 2).await.unwrap();
        assert!(matches!(outcome, EnrollOutcome::AlreadyEnrolled));
    }

    #[tokio::test]
    async fn enroll_creates_enrollment_for_new_user() {
        let mut repo = MockProgressRepository::new();
        repo.expect_course_exists()
            .returning(|_| Box::pin(async { Ok(true) }));
        repo.expect_get_enrollment()
            .returning(|_, _| Box::pin(async { Ok(None) }));
        repo.expect_create_enrollment()
            .returning(|_, _, _| Box::pin(async { Ok(active_enrollment(0.0)) }));

        let outcome = service(repo).enroll(1, 2).await.unwrap();
        assert!(matches!(outcome, EnrollOutcome::Enrolled(_)));
    }

    #[tokio::test]
    async fn lesson_toggle_owes_a_recompute_effect() {
        let mut repo = MockProgressRepository::new();
        repo.expect_lesson_course()
            .returning(|_| Box::pin(async { Ok(Some(2)) }));
        repo.expect_mark_lesson()
            .withf(|_, _, completed, completed_at| *completed && completed_at.is_some())
            .returning(|_, _, _, _| Box::pin(async { Ok(()) }));

        let outcome = service(repo).set_lesson_completed(1, 9, true).await.unwrap();
        match outcome {
            MarkLessonOutcome::Marked { course_id, effects } => {
                assert_eq!(course_id, 2);
                assert_eq!(
                    effects,
                    vec![Effect::RecomputeProgress {
                        user_id: 1,
                        course_id: 2
                    }]
                );
            }
            MarkLessonOutcome::LessonNotFound => panic!("lesson should exist"),
        }
    }

    #[tokio::test]
    async fn recompute_updates_progress_without_completing() {
        let mut repo = MockProgressRepository::new();
        repo.expect_get_enrollment()
            .returning(|_, _| Box::pin(async { Ok(Some(active_enrollment(25.0))) }));
        repo.expect_total_lessons()
            .returning(|_| Box::pin(async { Ok(4) }));
        repo.expect_completed_lesson_count()
            .returning(|_, _| Box::pin(async { Ok(2) }));
        repo.expect_set_progress()
            .withf(|_, progress| *progress == 50.0)
            .returning(|_, _| Box::pin(async { Ok(()) }));

        let update = service(repo)
            .recompute_progress(1, 2)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(update.progress, 50.0);
        assert!(!update.completed_now);
        assert_eq!(
            update.effects,
            vec![Effect::EvaluateAchievements { user_id: 1 }]
        );
    }

    #[tokio::test]
    async fn recompute_completes_enrollment_at_full_progress() {
        let mut repo = MockProgressRepository::new();
        repo.expect_get_enrollment()
            .returning(|_, _| Box::pin(async { Ok(Some(active_enrollment(75.0))) }));
        repo.expect_total_lessons()
            .returning(|_| Box::pin(async { Ok(4) }));
        repo.expect_completed_lesson_count()
            .returning(|_, _| Box::pin(async { Ok(4) }));
        repo.expect_complete_enrollment()
            .returning(|_, _| Box::pin(async { Ok(()) }));

        let update = service(repo)
            .recompute_progress(1, 2)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(update.progress, 100.0);
        assert!(update.completed_now);
    }

    #[tokio::test]
    async fn recompute_never_completes_twice() {
        let mut repo = MockProgressRepository::new();
        repo.expect_get_enrollment().returning(|_, _| {
            Box::pin(async {
                Ok(Some(EnrollmentRow {
                    status: STATUS_COMPLETED.to_string(),
                    progress: 100.0,
                    completed_at: Some(chrono::Utc::now().to_rfc3339()),
                    ..active_enrollment(100.0)
                }))
            })
        });
        repo.expect_total_lessons()
            .returning(|_| Box::pin(async { Ok(4) }));
        repo.expect_completed_lesson_count()
            .returning(|_, _| Box::pin(async { Ok(4) }));
        repo.expect_set_progress()
            .returning(|_, _| Box::pin(async { Ok(()) }));
        // No complete_enrollment expectation: a second transition would panic.

        let update = service(repo)
            .recompute_progress(1, 2)
            .await
            .unwrap()
            .unwrap();
        assert!(!update.completed_now);
    }

    #[tokio::test]
    async fn recompute_reflects_unmarked_lessons_but_keeps_status() {
        // Completed enrollment, then a lesson gets unmarked: the number
        // moves, the status does not.
        let mut repo = MockProgressRepository::new();
        repo.expect_get_enrollment().returning(|_, _| {
            Box::pin(async {
                Ok(Some(EnrollmentRow {
                    status: STATUS_COMPLETED.to_string(),
                    progress: 100.0,
                    ..active_enrollment(100.0)
                }))
            })
        });
        repo.expect_total_lessons()
            .returning(|_| Box::pin(async { Ok(4) }));
        repo.expect_completed_lesson_count()
            .returning(|_, _| Box::pin(async { Ok(3) }));
        repo.expect_set_progress()
            .withf(|_, progress| *progress == 75.0)
            .returning(|_, _| Box::pin(async { Ok(()) }));

        let update = service(repo)
            .recompute_progress(1, 2)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(update.progress, 75.0);
        assert!(!update.completed_now);
    }

    #[tokio::test]
    async fn empty_course_stays_at_zero_without_completing() {
        let mut repo = MockProgressRepository::new();
        repo.expect_get_enrollment()
            .returning(|_, _| Box::pin(async { Ok(Some(active_enrollment(0.0))) }));
        repo.expect_total_lessons()
            .returning(|_| Box::pin(async { Ok(0) }));
        repo.expect_completed_lesson_count()
            .returning(|_, _| Box::pin(async { Ok(0) }));
        repo.expect_set_progress()
            .withf(|_, progress| *progress == 0.0)
            .returning(|_, _| Box::pin(async { Ok(()) }));

        let update = service(repo)
            .recompute_progress(1, 2)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(update.progress, 0.0);
        assert!(!update.completed_now);
    }

    #[tokio::test]
    async fn drop_only_applies_to_active_enrollments() {
        let mut repo = MockProgressRepository::new();
        repo.expect_get_enrollment().returning(|_, _| {
            Box::pin(async {
                Ok(Some(EnrollmentRow {
                    status: STATUS_COMPLETED.to_string(),
                    ..active_enrollment(100.0)
                }))
            })
        });

        let outcome = service(repo).drop_enrollment(1, 2).await.unwrap();
        assert!(matches!(outcome, DropOutcome::NotActive));
    }
}
