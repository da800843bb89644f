//! Command execution.
//!
//! Dispatches an interpreted `VoiceCommand` to the storage and goal
//! collaborators and produces the natural-language reply. Nothing here
//! propagates an error: a misheard utterance must never take the app down,
//! so collaborator failures surface as [`SOMETHING_WENT_WRONG`].

pub mod knowledge;

use std::sync::Arc;

use chrono::Duration;
use tracing::{debug, info, warn};

use crate::command::{
    AddActivityParams, AskQuestionParams, CommandParams, ExecutionResult, GetStatsParams,
    SetGoalParams, StatsPeriod, VoiceCommand,
};
use crate::emissions::format_quantity;
use crate::error::{FootprintError, Result};
use crate::goals::{GoalCategory, GoalProgress, GoalTracker, GoalType, NewGoal};
use crate::storage::{ActivityRecord, ActivityStore, DashboardStats};

use knowledge::{Answer, NO_ACTIVE_GOAL, NO_INFORMATION};

pub const ADD_ACTIVITY_CLARIFICATION: &str =
    "I couldn't tell how much to log. Try \"log 5 km by car\".";
pub const SET_GOAL_CLARIFICATION: &str =
    "Please tell me the goal amount, for example \"set a daily goal of 10 kg\".";
pub const SOMETHING_WENT_WRONG: &str = "Sorry, something went wrong. Please try again.";
pub const HELP_MESSAGE: &str = "I can log activities (\"log 5 km by car\"), show statistics \
(\"how much today\"), set goals (\"set a daily goal of 10 kg\") and answer questions about \
your carbon footprint.";

pub struct CommandExecutor {
    activities: Arc<dyn ActivityStore>,
    goals: Arc<dyn GoalTracker>,
}

impl std::fmt::Debug for CommandExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandExecutor").finish_non_exhaustive()
    }
}

impl CommandExecutor {
    pub fn new(activities: Arc<dyn ActivityStore>, goals: Arc<dyn GoalTracker>) -> Self {
        Self { activities, goals }
    }

    pub fn execute(&self, command: &VoiceCommand) -> ExecutionResult {
        match self.try_execute(&command.parameters) {
            Ok(result) => {
                debug!(
                    intent = ?command.intent,
                    succeeded = result.succeeded,
                    "command executed"
                );
                result
            }
            Err(e) => {
                warn!(intent = ?command.intent, "command failed: {e}");
                ExecutionResult::failure(SOMETHING_WENT_WRONG)
            }
        }
    }

    fn try_execute(&self, params: &CommandParams) -> Result<ExecutionResult> {
        match params {
            CommandParams::AddActivity(p) => self.add_activity(p),
            CommandParams::GetStats(p) => self.stats(p),
            CommandParams::SetGoal(p) => self.set_goal(p),
            CommandParams::AskQuestion(p) => self.answer(p),
            CommandParams::Unknown => Ok(ExecutionResult::failure(HELP_MESSAGE)),
        }
    }

    fn add_activity(&self, params: &AddActivityParams) -> Result<ExecutionResult> {
        let (Some(category), Some(amount)) = (params.category, params.amount) else {
            return Ok(ExecutionResult::failure(ADD_ACTIVITY_CLARIFICATION));
        };

        let record = ActivityRecord {
            category,
            quantity: params.original_amount.unwrap_or(1.0),
            co2_amount: amount,
            note: params.description.clone(),
            created_at: chrono::Utc::now(),
        };
        let id = self.activities.add_activity(record)?;
        if id.is_empty() {
            return Err(FootprintError::Storage("activity was not stored".into()));
        }
        info!(%id, category = category.as_str(), co2 = amount, "activity logged");

        if let Err(e) = self.goals.update_all_goals_progress(amount, category) {
            warn!(%id, "goal progress update failed: {e}");
        }

        let response = match (params.original_amount, params.unit) {
            (Some(quantity), Some(unit)) => format!(
                "Logged {} {} of {}: {:.2} kg CO2.",
                format_quantity(quantity),
                unit.symbol(),
                category,
                amount
            ),
            _ => format!("Logged {amount:.2} kg CO2 for {category}."),
        };
        Ok(ExecutionResult::success(response))
    }

    fn stats(&self, params: &GetStatsParams) -> Result<ExecutionResult> {
        let stats = self.activities.dashboard_stats().unwrap_or_else(|e| {
            warn!("dashboard stats unavailable, reporting zeros: {e}");
            DashboardStats::default()
        });

        let mut response = match params.period {
            StatsPeriod::Today => {
                format!("Your footprint today is {:.2} kg CO2.", stats.today_total)
            }
            StatsPeriod::Yesterday => {
                format!("Your footprint yesterday was {:.2} kg CO2.", stats.yesterday_total)
            }
            StatsPeriod::ThisWeek => format!(
                "Your footprint this week is {:.2} kg CO2, a daily average of {:.2} kg.",
                stats.week_total, stats.weekly_average
            ),
            StatsPeriod::ThisMonth => {
                format!("Your footprint this month is {:.2} kg CO2.", stats.month_total)
            }
        };

        let daily_goal = self.active_goals().into_iter().find(|g| {
            g.goal_type == GoalType::Daily && g.category == GoalCategory::Total
        });
        if let Some(goal) = daily_goal {
            response.push_str(&format!(
                " You've used {:.0}% of your daily goal.",
                goal.progress_percent()
            ));
        }
        Ok(ExecutionResult::success(response))
    }

    fn set_goal(&self, params: &SetGoalParams) -> Result<ExecutionResult> {
        let Some(amount) = params.amount.filter(|a| *a > 0.0) else {
            return Ok(ExecutionResult::failure(SET_GOAL_CLARIFICATION));
        };

        let period = params.period;
        let goal = self.goals.create_goal(NewGoal {
            title: format!("{} CO2 goal", capitalize(period.label())),
            description: format!("Stay under {} kg CO2 {}", format_quantity(amount), period.label()),
            goal_type: GoalType::from(period),
            category: GoalCategory::Total,
            target_value: amount,
            duration: Duration::days(period.duration_days()),
        })?;
        info!(id = %goal.id, target = amount, period = period.label(), "goal created");

        Ok(ExecutionResult::success(format!(
            "Set a {} goal of {} kg CO2.",
            period.label(),
            format_quantity(amount)
        )))
    }

    fn answer(&self, params: &AskQuestionParams) -> Result<ExecutionResult> {
        let response = match knowledge::lookup(&params.question) {
            Some(Answer::Fixed(text)) => text.to_string(),
            Some(Answer::ActiveGoalProgress) => match self.active_goals().first() {
                Some(goal) => describe_progress(goal),
                None => NO_ACTIVE_GOAL.to_string(),
            },
            None => NO_INFORMATION.to_string(),
        };
        Ok(ExecutionResult::success(response))
    }

    /// Active goals, or none when the tracker is unavailable.
    fn active_goals(&self) -> Vec<GoalProgress> {
        self.goals.active_goals().unwrap_or_else(|e| {
            warn!("active goals unavailable: {e}");
            Vec::new()
        })
    }
}

fn describe_progress(goal: &GoalProgress) -> String {
    format!(
        "Your goal \"{}\" is at {:.0}% ({:.2} of {} kg CO2).",
        goal.title,
        goal.progress_percent(),
        goal.current_value,
        format_quantity(goal.target_value)
    )
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::GoalPeriod;
    use crate::emissions::{ActivityCategory, Unit};
    use crate::goals::MemoryGoalTracker;
    use crate::interpreter::CommandInterpreter;
    use crate::storage::MemoryStore;
    use approx::assert_relative_eq;

    struct Fixture {
        store: Arc<MemoryStore>,
        goals: Arc<MemoryGoalTracker>,
        executor: CommandExecutor,
        interpreter: CommandInterpreter,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let goals = Arc::new(MemoryGoalTracker::new());
        let executor = CommandExecutor::new(store.clone(), goals.clone());
        Fixture {
            store,
            goals,
            executor,
            interpreter: CommandInterpreter::new(),
        }
    }

    impl Fixture {
        fn run(&self, transcript: &str) -> ExecutionResult {
            self.executor.execute(&self.interpreter.interpret(transcript))
        }
    }

    /// Store that accepts writes but never produces an id.
    struct SilentStore;

    impl ActivityStore for SilentStore {
        fn add_activity(&self, _record: ActivityRecord) -> Result<String> {
            Ok(String::new())
        }

        fn dashboard_stats(&self) -> Result<DashboardStats> {
            Err(FootprintError::Storage("offline".into()))
        }
    }

    struct BrokenGoals;

    impl GoalTracker for BrokenGoals {
        fn update_all_goals_progress(&self, _: f64, _: ActivityCategory) -> Result<()> {
            Err(FootprintError::Goal("offline".into()))
        }

        fn create_goal(&self, _: NewGoal) -> Result<GoalProgress> {
            Err(FootprintError::Goal("offline".into()))
        }

        fn active_goals(&self) -> Result<Vec<GoalProgress>> {
            Err(FootprintError::Goal("offline".into()))
        }
    }

    fn add_params(amount: Option<f64>) -> CommandParams {
        CommandParams::AddActivity(AddActivityParams {
            category: Some(ActivityCategory::Food),
            amount,
            original_amount: None,
            unit: None,
            description: "ate a burger".into(),
        })
    }

    #[test]
    fn logs_activity_with_unit_and_updates_goals() {
        let fx = fixture();
        assert!(fx.run("set a daily goal of 10").succeeded);

        let result = fx.run("bugün 5 kilometre araç kullandım");
        assert!(result.succeeded);
        assert_eq!(result.response, "Logged 5 km of transport: 1.00 kg CO2.");

        let stored = fx.store.activities();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].category, ActivityCategory::Transport);
        assert_relative_eq!(stored[0].quantity, 5.0);
        assert_relative_eq!(stored[0].co2_amount, 1.0);
        assert_eq!(stored[0].note, "bugün 5 kilometre araç kullandım");

        assert_relative_eq!(fx.goals.goals()[0].current_value, 1.0);
    }

    #[test]
    fn activity_without_unit_reports_co2_and_category() {
        let fx = fixture();
        let result = fx
            .executor
            .execute(&VoiceCommand::new("ate a burger", add_params(Some(3.5))));
        assert!(result.succeeded);
        assert_eq!(result.response, "Logged 3.50 kg CO2 for food.");
        assert_relative_eq!(fx.store.activities()[0].quantity, 1.0);
    }

    #[test]
    fn missing_amount_asks_for_clarification_without_storing() {
        let fx = fixture();
        let result = fx
            .executor
            .execute(&VoiceCommand::new("ate a burger", add_params(None)));
        assert!(!result.succeeded);
        assert_eq!(result.response, ADD_ACTIVITY_CLARIFICATION);
        assert_eq!(fx.store.activity_count(), 0);

        let spoken = fx.run("log my car trip");
        assert_eq!(spoken.response, ADD_ACTIVITY_CLARIFICATION);
        assert_eq!(fx.store.activity_count(), 0);
    }

    #[test]
    fn empty_id_is_a_generic_failure() {
        let executor = CommandExecutor::new(Arc::new(SilentStore), Arc::new(MemoryGoalTracker::new()));
        let result = executor.execute(&VoiceCommand::new("ate a burger", add_params(Some(2.0))));
        assert!(!result.succeeded);
        assert_eq!(result.response, SOMETHING_WENT_WRONG);
    }

    #[test]
    fn goal_update_failure_does_not_fail_the_command() {
        let store = Arc::new(MemoryStore::new());
        let executor = CommandExecutor::new(store.clone(), Arc::new(BrokenGoals));
        let result = executor.execute(&VoiceCommand::new("ate a burger", add_params(Some(2.0))));
        assert!(result.succeeded);
        assert_eq!(store.activity_count(), 1);
    }

    #[test]
    fn stats_are_idempotent_and_report_daily_goal_progress() {
        let fx = fixture();
        fx.run("günlük 10 kilogram hedef belirle");
        fx.run("log 10 km");

        let first = fx.run("how much today");
        let second = fx.run("how much today");
        assert!(first.succeeded);
        assert_eq!(first, second);
        assert_eq!(
            first.response,
            "Your footprint today is 2.00 kg CO2. You've used 20% of your daily goal."
        );
    }

    #[test]
    fn weekly_stats_mention_daily_average() {
        let fx = fixture();
        fx.run("log 7 liter fuel");
        let result = fx.run("this week total");
        assert!(result.response.contains("this week is 16.10 kg"));
        assert!(result.response.contains("daily average of 2.30 kg"));
    }

    #[test]
    fn stats_fall_back_to_zero_when_store_fails() {
        let executor = CommandExecutor::new(Arc::new(SilentStore), Arc::new(BrokenGoals));
        let command = VoiceCommand::new(
            "rapor",
            CommandParams::GetStats(GetStatsParams {
                period: StatsPeriod::ThisMonth,
            }),
        );
        let result = executor.execute(&command);
        assert!(result.succeeded);
        assert_eq!(result.response, "Your footprint this month is 0.00 kg CO2.");
    }

    #[test]
    fn set_goal_creates_one_day_goal() {
        let fx = fixture();
        let result = fx.run("günlük 12 kilogram hedef belirle");
        assert!(result.succeeded);
        assert_eq!(result.response, "Set a daily goal of 12 kg CO2.");

        let goals = fx.goals.goals();
        assert_eq!(goals.len(), 1);
        assert_eq!(goals[0].goal_type, GoalType::Daily);
        assert_eq!(goals[0].category, GoalCategory::Total);
        assert_relative_eq!(goals[0].target_value, 12.0);
        assert_eq!(goals[0].ends_at - goals[0].started_at, Duration::days(1));
    }

    #[test]
    fn set_goal_requires_positive_amount() {
        let fx = fixture();
        for amount in [None, Some(0.0), Some(-3.0)] {
            let command = VoiceCommand::new(
                "set a goal",
                CommandParams::SetGoal(SetGoalParams {
                    amount,
                    period: GoalPeriod::Weekly,
                }),
            );
            let result = fx.executor.execute(&command);
            assert!(!result.succeeded);
            assert_eq!(result.response, SET_GOAL_CLARIFICATION);
        }
        assert!(fx.goals.goals().is_empty());
    }

    #[test]
    fn goal_creation_failure_is_generic() {
        let executor = CommandExecutor::new(Arc::new(MemoryStore::new()), Arc::new(BrokenGoals));
        let command = VoiceCommand::new(
            "set a goal of 5",
            CommandParams::SetGoal(SetGoalParams {
                amount: Some(5.0),
                period: GoalPeriod::Daily,
            }),
        );
        assert_eq!(executor.execute(&command), ExecutionResult::failure(SOMETHING_WENT_WRONG));
    }

    #[test]
    fn questions_always_succeed() {
        let fx = fixture();
        let definition = fx.run("karbon ayak izi nedir");
        assert!(definition.succeeded);
        assert_eq!(definition.response, knowledge::CARBON_FOOTPRINT_DEFINITION);

        let progress = fx.run("how is my progress");
        assert_eq!(progress.response, NO_ACTIVE_GOAL);

        let unknown = fx.run("who won the match");
        assert!(unknown.succeeded);
        assert_eq!(unknown.response, NO_INFORMATION);
    }

    #[test]
    fn progress_question_reports_first_active_goal() {
        let fx = fixture();
        fx.run("set a weekly goal of 40");
        fx.run("log 10 km");
        let result = fx.run("how is my progress");
        assert_eq!(
            result.response,
            "Your goal \"Weekly CO2 goal\" is at 5% (2.00 of 40 kg CO2)."
        );
    }

    #[test]
    fn unknown_returns_help_and_fails() {
        let fx = fixture();
        let result = fx.run("asdkjf");
        assert!(!result.succeeded);
        assert_eq!(result.response, HELP_MESSAGE);
    }

    #[test]
    fn unit_symbol_is_used_in_response() {
        let fx = fixture();
        let result = fx.executor.execute(&VoiceCommand::new(
            "2 hours of heating",
            CommandParams::AddActivity(AddActivityParams {
                category: Some(ActivityCategory::Energy),
                amount: Some(Unit::Hour.to_co2(2.0)),
                original_amount: Some(2.0),
                unit: Some(Unit::Hour),
                description: "2 hours of heating".into(),
            }),
        ));
        assert_eq!(result.response, "Logged 2 h of energy: 1.00 kg CO2.");
    }
}
