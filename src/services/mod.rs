// Service layer: the progress & assessment engine.
//
// Each service owns one aggregate (attempts, enrollment progress,
// achievements) and defines the repository trait it needs; `Db` implements
// those traits in `src/db/`. State-changing operations return outcome enums
// plus follow-up `Effect`s instead of firing hidden callbacks; the caller
// drains the effects through `run_effects`.

pub mod achievements;
pub mod assessment;
pub mod progress;
pub mod scoring;

use std::collections::VecDeque;

use color_eyre::Result;
use serde::Serialize;

use crate::db::Db;

use achievements::{AchievementService, AwardedAchievement};
use progress::ProgressService;

/// Follow-up work a state-changing operation hands back to its caller.
/// Applied in causal order: a progress recompute may enqueue an achievement
/// evaluation, never the other way around.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    RecomputeProgress { user_id: i64, course_id: i64 },
    EvaluateAchievements { user_id: i64 },
}

/// Accumulated result of draining an effect queue.
#[derive(Debug, Default, Serialize)]
pub struct PipelineOutcome {
    /// Fresh enrollment progress, when a recompute ran.
    pub progress: Option<f64>,
    /// Whether an enrollment transitioned to completed in this cascade.
    pub course_completed: bool,
    /// Achievements newly awarded in this cascade.
    pub awarded: Vec<AwardedAchievement>,
}

/// Drain an effect queue against the database. Effects may enqueue further
/// effects (lesson toggle -> progress recompute -> achievement evaluation);
/// the queue preserves causal order.
pub async fn run_effects(db: &Db, effects: Vec<Effect>) -> Result<PipelineOutcome> {
    let mut queue: VecDeque<Effect> = effects.into();
    let mut outcome = PipelineOutcome::default();

    while let Some(effect) = queue.pop_front() {
        match effect {
            Effect::RecomputeProgress { user_id, course_id } => {
                let service = ProgressService::new(db.clone());
                if let Some(update) = service.recompute_progress(user_id, course_id).await? {
                    outcome.progress = Some(update.progress);
                    outcome.course_completed |= update.completed_now;
                    queue.extend(update.effects);
                }
            }
            Effect::EvaluateAchievements { user_id } => {
                let service = AchievementService::new(db.clone());
                outcome.awarded.extend(service.evaluate(user_id).await?);
            }
        }
    }

    Ok(outcome)
}
