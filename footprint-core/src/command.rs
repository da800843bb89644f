//! Voice command data model.
//!
//! A `VoiceCommand` is created by the interpreter for each final transcript
//! and completed (executed flag + response) once the executor has run.
//! Parameters are a tagged union selected by the intent, so an `AddActivity`
//! command can never carry goal parameters and vice versa.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::emissions::{ActivityCategory, Unit};

/// Classified purpose of a transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Intent {
    AddActivity,
    GetStats,
    SetGoal,
    AskQuestion,
    Unknown,
}

/// Time window a statistics query refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StatsPeriod {
    #[default]
    Today,
    Yesterday,
    ThisWeek,
    ThisMonth,
}

impl StatsPeriod {
    pub fn label(self) -> &'static str {
        match self {
            StatsPeriod::Today => "today",
            StatsPeriod::Yesterday => "yesterday",
            StatsPeriod::ThisWeek => "this week",
            StatsPeriod::ThisMonth => "this month",
        }
    }
}

/// Window a spoken goal applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalPeriod {
    #[default]
    Daily,
    Weekly,
    Monthly,
}

impl GoalPeriod {
    pub fn duration_days(self) -> i64 {
        match self {
            GoalPeriod::Daily => 1,
            GoalPeriod::Weekly => 7,
            GoalPeriod::Monthly => 30,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            GoalPeriod::Daily => "daily",
            GoalPeriod::Weekly => "weekly",
            GoalPeriod::Monthly => "monthly",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddActivityParams {
    pub category: Option<ActivityCategory>,
    /// kg CO2-equivalent, already converted from `original_amount` when a unit was heard.
    pub amount: Option<f64>,
    /// Quantity as spoken, present only when a unit was recognised.
    pub original_amount: Option<f64>,
    pub unit: Option<Unit>,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetStatsParams {
    pub period: StatsPeriod,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetGoalParams {
    pub amount: Option<f64>,
    pub period: GoalPeriod,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AskQuestionParams {
    pub question: String,
}

/// Parameters extracted for each intent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum CommandParams {
    AddActivity(AddActivityParams),
    GetStats(GetStatsParams),
    SetGoal(SetGoalParams),
    AskQuestion(AskQuestionParams),
    Unknown,
}

impl CommandParams {
    pub fn intent(&self) -> Intent {
        match self {
            CommandParams::AddActivity(_) => Intent::AddActivity,
            CommandParams::GetStats(_) => Intent::GetStats,
            CommandParams::SetGoal(_) => Intent::SetGoal,
            CommandParams::AskQuestion(_) => Intent::AskQuestion,
            CommandParams::Unknown => Intent::Unknown,
        }
    }
}

/// One interpreted utterance and, once executed, its outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceCommand {
    pub transcript: String,
    pub intent: Intent,
    pub parameters: CommandParams,
    pub timestamp: DateTime<Utc>,
    pub executed: bool,
    pub response: Option<String>,
}

impl VoiceCommand {
    pub fn new(transcript: impl Into<String>, parameters: CommandParams) -> Self {
        Self::at(transcript, parameters, Utc::now())
    }

    pub fn at(
        transcript: impl Into<String>,
        parameters: CommandParams,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            transcript: transcript.into(),
            intent: parameters.intent(),
            parameters,
            timestamp,
            executed: false,
            response: None,
        }
    }

    /// Copy of this command marked executed with the given response.
    pub fn completed(&self, response: impl Into<String>) -> Self {
        Self {
            executed: true,
            response: Some(response.into()),
            ..self.clone()
        }
    }
}

/// Outcome of executing a command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    pub response: String,
    pub succeeded: bool,
}

impl ExecutionResult {
    pub fn success(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            succeeded: true,
        }
    }

    pub fn failure(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            succeeded: false,
        }
    }
}
