//! Goal-tracking collaborator boundary.
//!
//! A goal is an emissions ceiling over a time window. The tracker owns goal
//! identity and storage; the executor only creates goals, reads the active
//! ones and pushes progress deltas after an activity is logged.

pub mod memory;

pub use memory::MemoryGoalTracker;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::command::GoalPeriod;
use crate::emissions::ActivityCategory;
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalType {
    Daily,
    Weekly,
    Monthly,
}

impl From<GoalPeriod> for GoalType {
    fn from(period: GoalPeriod) -> Self {
        match period {
            GoalPeriod::Daily => GoalType::Daily,
            GoalPeriod::Weekly => GoalType::Weekly,
            GoalPeriod::Monthly => GoalType::Monthly,
        }
    }
}

/// Which activities count towards a goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalCategory {
    Total,
    Transport,
    Energy,
    Food,
    Waste,
}

impl GoalCategory {
    pub fn counts(self, category: ActivityCategory) -> bool {
        match self {
            GoalCategory::Total => true,
            GoalCategory::Transport => category == ActivityCategory::Transport,
            GoalCategory::Energy => category == ActivityCategory::Energy,
            GoalCategory::Food => category == ActivityCategory::Food,
            GoalCategory::Waste => category == ActivityCategory::Waste,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GoalCategory::Total => "total",
            GoalCategory::Transport => "transport",
            GoalCategory::Energy => "energy",
            GoalCategory::Food => "food",
            GoalCategory::Waste => "waste",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "total" => Some(GoalCategory::Total),
            "transport" => Some(GoalCategory::Transport),
            "energy" => Some(GoalCategory::Energy),
            "food" => Some(GoalCategory::Food),
            "waste" => Some(GoalCategory::Waste),
            _ => None,
        }
    }
}

impl GoalType {
    pub fn as_str(self) -> &'static str {
        match self {
            GoalType::Daily => "daily",
            GoalType::Weekly => "weekly",
            GoalType::Monthly => "monthly",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "daily" => Some(GoalType::Daily),
            "weekly" => Some(GoalType::Weekly),
            "monthly" => Some(GoalType::Monthly),
            _ => None,
        }
    }
}

/// Request to create a goal.
#[derive(Debug, Clone, PartialEq)]
pub struct NewGoal {
    pub title: String,
    pub description: String,
    pub goal_type: GoalType,
    pub category: GoalCategory,
    /// Ceiling in kg CO2-equivalent.
    pub target_value: f64,
    pub duration: Duration,
}

/// A goal as tracked by the collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalProgress {
    pub id: String,
    pub title: String,
    pub description: String,
    pub goal_type: GoalType,
    pub category: GoalCategory,
    pub target_value: f64,
    pub current_value: f64,
    pub started_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

impl GoalProgress {
    pub fn from_new(id: String, goal: NewGoal, started_at: DateTime<Utc>) -> Self {
        Self {
            id,
            title: goal.title,
            description: goal.description,
            goal_type: goal.goal_type,
            category: goal.category,
            target_value: goal.target_value,
            current_value: 0.0,
            started_at,
            ends_at: started_at + goal.duration,
        }
    }

    /// Share of the ceiling used so far, in percent. May exceed 100.
    pub fn progress_percent(&self) -> f64 {
        if self.target_value <= 0.0 {
            return 0.0;
        }
        self.current_value / self.target_value * 100.0
    }

    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        now >= self.started_at && now < self.ends_at
    }
}

/// Goal persistence and progress aggregation.
pub trait GoalTracker: Send + Sync {
    /// Add `amount` kg CO2 to every active goal that counts `category`.
    fn update_all_goals_progress(&self, amount: f64, category: ActivityCategory) -> Result<()>;

    fn create_goal(&self, goal: NewGoal) -> Result<GoalProgress>;

    /// Goals whose window contains now, oldest first.
    fn active_goals(&self) -> Result<Vec<GoalProgress>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn goal(target: f64, current: f64) -> GoalProgress {
        let started = Utc::now();
        GoalProgress {
            id: "g".into(),
            title: "Daily".into(),
            description: String::new(),
            goal_type: GoalType::Daily,
            category: GoalCategory::Total,
            target_value: target,
            current_value: current,
            started_at: started,
            ends_at: started + Duration::days(1),
        }
    }

    #[test]
    fn progress_is_percentage_of_target() {
        assert_relative_eq!(goal(10.0, 2.5).progress_percent(), 25.0);
        assert_relative_eq!(goal(10.0, 15.0).progress_percent(), 150.0);
        assert_relative_eq!(goal(0.0, 15.0).progress_percent(), 0.0);
    }

    #[test]
    fn activity_window_is_half_open() {
        let g = goal(10.0, 0.0);
        assert!(g.is_active(g.started_at));
        assert!(!g.is_active(g.ends_at));
    }

    #[test]
    fn total_goals_count_every_category() {
        for category in ActivityCategory::ALL {
            assert!(GoalCategory::Total.counts(category));
        }
        assert!(GoalCategory::Food.counts(ActivityCategory::Food));
        assert!(!GoalCategory::Food.counts(ActivityCategory::Energy));
    }
}
