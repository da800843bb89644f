//! Transcript → intent classification.
//!
//! ## Rule table
//!
//! ```text
//! 1. action keyword or unit token      → AddActivity  (quantity, unit, category)
//! 2. statistics keyword                → GetStats     (period, default today)
//! 3. goal keyword                      → SetGoal      (amount, period, default daily)
//! 4. interrogative keyword             → AskQuestion  (raw transcript)
//! 5. otherwise                         → Unknown
//! ```
//!
//! Rules are evaluated in order and the first match wins. A transcript that
//! says both "log" and "how much" is an `AddActivity`. That precedence is part
//! of the observable contract and must not be reordered.

pub mod vocabulary;

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::command::{
    AddActivityParams, AskQuestionParams, CommandParams, GetStatsParams, Intent, SetGoalParams,
    VoiceCommand,
};
use crate::emissions::{ActivityCategory, Unit};

use vocabulary::{
    scan_category, scan_goal_period, scan_stats_period, NormalizedText, ACTION_KEYWORDS,
    GOAL_KEYWORDS, QUESTION_KEYWORDS, STATS_KEYWORDS, UNIT_KEYWORDS,
};

/// First standalone numeric literal plus the word right after it, if any.
/// Digits inside a word (`co2`) are not quantities.
static QUANTITY_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?P<value>[0-9]+(?:[.,][0-9]+)?)\s*(?P<unit>\p{L}+)?").expect("valid regex")
});

/// Category used when neither a unit nor a vocabulary word implies one.
pub const DEFAULT_CATEGORY: ActivityCategory = ActivityCategory::Transport;

/// A number heard in the transcript and the token that followed it.
#[derive(Debug, Clone, PartialEq)]
pub struct Quantity {
    pub value: f64,
    pub unit_token: Option<String>,
}

/// Find the first number in normalised text.
pub fn extract_quantity(text: &NormalizedText) -> Option<Quantity> {
    let caps = QUANTITY_REGEX.captures(text.as_str())?;
    let value = caps["value"].replace(',', ".").parse::<f64>().ok()?;
    Some(Quantity {
        value,
        unit_token: caps.name("unit").map(|m| m.as_str().to_string()),
    })
}

/// One row of the ordered classification table.
pub struct ClassificationRule {
    pub intent: Intent,
    pub matches: fn(&NormalizedText) -> bool,
    pub extract: fn(&NormalizedText, &str) -> CommandParams,
}

impl std::fmt::Debug for ClassificationRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassificationRule")
            .field("intent", &self.intent)
            .finish_non_exhaustive()
    }
}

/// Stateless classifier; construct once per session and share.
#[derive(Debug)]
pub struct CommandInterpreter {
    rules: Vec<ClassificationRule>,
}

impl Default for CommandInterpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandInterpreter {
    pub fn new() -> Self {
        Self {
            rules: default_rules(),
        }
    }

    /// Intents in evaluation order.
    pub fn precedence(&self) -> Vec<Intent> {
        self.rules.iter().map(|r| r.intent).collect()
    }

    pub fn classify(&self, transcript: &str) -> (Intent, CommandParams) {
        let text = NormalizedText::new(transcript);
        let raw = transcript.trim();

        let params = self
            .rules
            .iter()
            .find(|rule| (rule.matches)(&text))
            .map(|rule| (rule.extract)(&text, raw))
            .unwrap_or(CommandParams::Unknown);

        let intent = params.intent();
        debug!(intent = ?intent, normalized = text.as_str(), "transcript classified");
        (intent, params)
    }

    /// Classify and wrap in a fresh, not-yet-executed command.
    pub fn interpret(&self, transcript: &str) -> VoiceCommand {
        let (_, params) = self.classify(transcript);
        VoiceCommand::new(transcript.trim(), params)
    }
}

fn default_rules() -> Vec<ClassificationRule> {
    vec![
        ClassificationRule {
            intent: Intent::AddActivity,
            matches: |t| t.contains_any(ACTION_KEYWORDS) || t.contains_any(UNIT_KEYWORDS),
            extract: extract_activity,
        },
        ClassificationRule {
            intent: Intent::GetStats,
            matches: |t| t.contains_any(STATS_KEYWORDS),
            extract: |t, _| {
                CommandParams::GetStats(GetStatsParams {
                    period: scan_stats_period(t),
                })
            },
        },
        ClassificationRule {
            intent: Intent::SetGoal,
            matches: |t| t.contains_any(GOAL_KEYWORDS),
            extract: |t, _| {
                CommandParams::SetGoal(SetGoalParams {
                    amount: extract_quantity(t).map(|q| q.value),
                    period: scan_goal_period(t),
                })
            },
        },
        ClassificationRule {
            intent: Intent::AskQuestion,
            matches: |t| t.contains_any(QUESTION_KEYWORDS),
            extract: |_, raw| {
                CommandParams::AskQuestion(AskQuestionParams {
                    question: raw.to_string(),
                })
            },
        },
    ]
}

fn extract_activity(text: &NormalizedText, raw: &str) -> CommandParams {
    let quantity = extract_quantity(text);
    let unit = quantity
        .as_ref()
        .and_then(|q| q.unit_token.as_deref())
        .and_then(Unit::from_token);

    let (amount, original_amount) = match (&quantity, unit) {
        (Some(q), Some(unit)) => (Some(unit.to_co2(q.value)), Some(q.value)),
        (Some(q), None) => (Some(q.value), None),
        (None, _) => (None, None),
    };

    let category = unit
        .map(Unit::category)
        .or_else(|| scan_category(text))
        .unwrap_or(DEFAULT_CATEGORY);

    CommandParams::AddActivity(AddActivityParams {
        category: Some(category),
        amount,
        original_amount,
        unit,
        description: raw.to_string(),
    })
}
