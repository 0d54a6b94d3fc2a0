use std::future::Future;

use color_eyre::Result;
use serde::Serialize;

use crate::db::models::EarnedAchievementRow;
use crate::db::Db;
use crate::utils;

// ---------------------------------------------------------------------------
// Rule table
// ---------------------------------------------------------------------------

/// Everything the rule table looks at. A snapshot of one user's accumulated
/// learning facts, computed fresh per evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UserFacts {
    pub completed_lessons: i64,
    pub passed_quizzes: i64,
    /// Any completed attempt with a score of 100 or more.
    pub has_perfect_score: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Badge {
    Bronze,
    Silver,
    Gold,
    Platinum,
}

impl Badge {
    pub fn as_str(self) -> &'static str {
        match self {
            Badge::Bronze => "bronze",
            Badge::Silver => "silver",
            Badge::Gold => "gold",
            Badge::Platinum => "platinum",
        }
    }
}

pub struct Rule {
    /// Natural key; the stored achievement definition is created from the
    /// rule on first award.
    pub title: &'static str,
    pub description: &'static str,
    pub badge: Badge,
    pub points: i64,
    predicate: fn(&UserFacts) -> bool,
}

impl Rule {
    pub fn applies(&self, facts: &UserFacts) -> bool {
        (self.predicate)(facts)
    }
}

/// The fixed rule set. Milestone rules use `>=` rather than exact equality:
/// the held-check below keeps awarding idempotent, and a count that jumps
/// past a milestone in one batch still triggers it.
pub const RULES: &[Rule] = &[
    Rule {
        title: "First Steps",
        description: "Complete your first lesson",
        badge: Badge::Bronze,
        points: 10,
        predicate: |f| f.completed_lessons >= 1,
    },
    Rule {
        title: "Quiz Master",
        description: "Pass your first quiz",
        badge: Badge::Silver,
        points: 25,
        predicate: |f| f.passed_quizzes >= 1,
    },
    Rule {
        title: "Perfect Score",
        description: "Score 100% on a quiz",
        badge: Badge::Gold,
        points: 100,
        predicate: |f| f.has_perfect_score,
    },
    Rule {
        title: "Lesson Warrior",
        description: "Complete 10 lessons",
        badge: Badge::Bronze,
        points: 50,
        predicate: |f| f.completed_lessons >= 10,
    },
    Rule {
        title: "Knowledge Seeker",
        description: "Complete 25 lessons",
        badge: Badge::Silver,
        points: 100,
        predicate: |f| f.completed_lessons >= 25,
    },
    Rule {
        title: "Master Learner",
        description: "Complete 50 lessons",
        badge: Badge::Gold,
        points: 250,
        predicate: |f| f.completed_lessons >= 50,
    },
    Rule {
        title: "Quiz Expert",
        description: "Pass 5 quizzes",
        badge: Badge::Bronze,
        points: 75,
        predicate: |f| f.passed_quizzes >= 5,
    },
    Rule {
        title: "Theory Champion",
        description: "Pass 10 quizzes",
        badge: Badge::Silver,
        points: 150,
        predicate: |f| f.passed_quizzes >= 10,
    },
    Rule {
        title: "Grand Master",
        description: "Pass 25 quizzes",
        badge: Badge::Platinum,
        points: 500,
        predicate: |f| f.passed_quizzes >= 25,
    },
];

// ---------------------------------------------------------------------------
// AchievementRepository trait (DIP: service defines the abstraction it needs)
// ---------------------------------------------------------------------------

#[cfg_attr(test, mockall::automock)]
pub trait AchievementRepository: Send + Sync {
    fn user_facts(&self, user_id: i64) -> impl Future<Output = Result<UserFacts>> + Send;

    /// Create the achievement definition if missing; returns its id either
    /// way. Title is the natural key.
    fn ensure_achievement(
        &self,
        title: &str,
        description: &str,
        badge_type: &str,
        points: i64,
    ) -> impl Future<Output = Result<i64>> + Send;

    /// Atomic insert-if-absent of the award fact. Returns whether a new
    /// award was created.
    fn award_achievement(
        &self,
        user_id: i64,
        achievement_id: i64,
        earned_at: &str,
    ) -> impl Future<Output = Result<bool>> + Send;

    fn user_achievements(
        &self,
        user_id: i64,
    ) -> impl Future<Output = Result<Vec<EarnedAchievementRow>>> + Send;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AwardedAchievement {
    pub achievement_id: i64,
    pub title: String,
    pub badge: String,
    pub points: i64,
}

// ---------------------------------------------------------------------------
// AchievementService
// ---------------------------------------------------------------------------

pub struct AchievementService<R: AchievementRepository = Db> {
    repo: R,
}

impl<R: AchievementRepository> AchievementService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Evaluate the whole rule table against the user's fresh facts and
    /// award whatever newly applies. Idempotent: the unique award fact makes
    /// a re-run with unchanged facts award nothing.
    pub async fn evaluate(&self, user_id: i64) -> Result<Vec<AwardedAchievement>> {
        let facts = self.repo.user_facts(user_id).await?;
        let earned_at = utils::now_rfc3339();
        let mut newly_awarded = Vec::new();

        for rule in RULES {
            if !rule.applies(&facts) {
                continue;
            }

            let achievement_id = self
                .repo
                .ensure_achievement(rule.title, rule.description, rule.badge.as_str(), rule.points)
                .await?;

            if self
                .repo
                .award_achievement(user_id, achievement_id, &earned_at)
                .await?
            {
                tracing::info!("achievement '{}' awarded to user {user_id}", rule.title);
                newly_awarded.push(AwardedAchievement {
                    achievement_id,
                    title: rule.title.to_string(),
                    badge: rule.badge.as_str().to_string(),
                    points: rule.points,
                });
            }
        }

        Ok(newly_awarded)
    }

    pub async fn earned(&self, user_id: i64) -> Result<Vec<EarnedAchievementRow>> {
        self.repo.user_achievements(user_id).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
