use chrono::Utc;
use parking_lot::RwLock;

use super::{GoalProgress, GoalTracker, NewGoal};
use crate::emissions::ActivityCategory;
use crate::error::Result;

/// In-process goal tracker.
#[derive(Debug, Default)]
pub struct MemoryGoalTracker {
    goals: RwLock<Vec<GoalProgress>>,
}

impl MemoryGoalTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// All goals, including expired ones.
    pub fn goals(&self) -> Vec<GoalProgress> {
        self.goals.read().clone()
    }
}

impl GoalTracker for MemoryGoalTracker {
    fn update_all_goals_progress(&self, amount: f64, category: ActivityCategory) -> Result<()> {
        let now = Utc::now();
        for goal in self
            .goals
            .write()
            .iter_mut()
            .filter(|g| g.is_active(now) && g.category.counts(category))
        {
            goal.current_value += amount;
        }
        Ok(())
    }

    fn create_goal(&self, goal: NewGoal) -> Result<GoalProgress> {
        let mut guard = self.goals.write();
        let created = GoalProgress::from_new(format!("goal-{}", guard.len() + 1), goal, Utc::now());
        guard.push(created.clone());
        Ok(created)
    }

    fn active_goals(&self) -> Result<Vec<GoalProgress>> {
        let now = Utc::now();
        Ok(self
            .goals
            .read()
            .iter()
            .filter(|g| g.is_active(now))
            .cloned()
            .collect())
    }
}
