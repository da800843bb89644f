//! Canned answers for `AskQuestion` commands.
//!
//! Each rule is a conjunction of keyword sets: the question must contain at
//! least one keyword from every set. Rules are checked in order.

use crate::interpreter::vocabulary::NormalizedText;

pub const CARBON_FOOTPRINT_DEFINITION: &str = "A carbon footprint is the total amount of \
greenhouse gases, expressed as kg of CO2-equivalent, caused directly and indirectly by your \
activities such as travel, energy use, food and waste.";

pub const REDUCTION_TIPS: &str = "To reduce your footprint: walk, cycle or use public \
transport for short trips, switch off devices you are not using, eat less red meat and \
recycle what you can.";

pub const NO_ACTIVE_GOAL: &str = "You don't have an active goal. Try \"set a daily goal of 10 kg\".";

pub const NO_INFORMATION: &str = "Sorry, I don't have information about that yet.";

const CARBON_WORDS: &[&str] = &[
    "carbon", "co2", "footprint", "emission", "emissions", "karbon*", "ayak izi", "emisyon*",
];
const WHAT_IS_WORDS: &[&str] = &["what is", "what s", "what does", "nedir", "ne demek", "ne anlama"];
const GOAL_WORDS: &[&str] = &[
    "goal", "goals", "target", "targets", "progress", "hedef*", "amaç*", "ilerleme*",
];
const WHAT_HOW_WORDS: &[&str] = &["what", "how", "ne", "nasıl", "kaç"];
const REDUCE_WORDS: &[&str] = &[
    "reduce", "reducing", "lower", "lowering", "cut", "save", "azalt*", "düşür*",
];
const HOW_WORDS: &[&str] = &["how", "nasıl"];

/// What a matching rule answers with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Answer {
    Fixed(&'static str),
    /// Title and progress of the first active goal.
    ActiveGoalProgress,
}

#[derive(Debug, Clone, Copy)]
pub struct KnowledgeRule {
    pub all_of: &'static [&'static [&'static str]],
    pub answer: Answer,
}

impl KnowledgeRule {
    fn matches(&self, question: &NormalizedText) -> bool {
        self.all_of.iter().all(|set| question.contains_any(set))
    }
}

pub const KNOWLEDGE_RULES: &[KnowledgeRule] = &[
    KnowledgeRule {
        all_of: &[CARBON_WORDS, WHAT_IS_WORDS],
        answer: Answer::Fixed(CARBON_FOOTPRINT_DEFINITION),
    },
    KnowledgeRule {
        all_of: &[GOAL_WORDS, WHAT_HOW_WORDS],
        answer: Answer::ActiveGoalProgress,
    },
    KnowledgeRule {
        all_of: &[REDUCE_WORDS, HOW_WORDS],
        answer: Answer::Fixed(REDUCTION_TIPS),
    },
];

/// First rule matching `question`, if any.
pub fn lookup(question: &str) -> Option<Answer> {
    let text = NormalizedText::new(question);
    KNOWLEDGE_RULES
        .iter()
        .find(|rule| rule.matches(&text))
        .map(|rule| rule.answer)
}
