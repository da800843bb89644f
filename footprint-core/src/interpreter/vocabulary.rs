//! Keyword vocabularies and the normalised word view they are matched against.
//!
//! Vocabularies are bilingual (English + Turkish). A keyword matches a whole
//! word unless it ends in [`STEM_MARKER`]: Turkish is agglutinative, so stems
//! like `kullan*` match any word they start (`kullandım`). English words list
//! their inflections explicitly, which keeps `car` from matching `carbon`.

use crate::command::{GoalPeriod, StatsPeriod};
use crate::emissions::ActivityCategory;

/// Trailing marker turning a keyword into a prefix match.
pub const STEM_MARKER: char = '*';

pub const ACTION_KEYWORDS: &[&str] = &[
    "add", "added", "log", "logged", "used", "consumed", "went", "took", "drove", "ekle*",
    "kaydet*", "kullan*", "tüket*", "gittim", "aldım", "bindim",
];

pub const UNIT_KEYWORDS: &[&str] = &[
    "km", "kilometre", "kilometres", "kilometer", "kilometers", "liter", "liters", "litre",
    "litres", "hour", "hours", "saat",
];

pub const STATS_KEYWORDS: &[&str] = &[
    "statistic",
    "statistics",
    "stats",
    "report",
    "how much",
    "total",
    "today",
    "this week",
    "istatistik*",
    "rapor*",
    "ne kadar",
    "toplam*",
    "bugün",
    "bu hafta",
];

pub const GOAL_KEYWORDS: &[&str] = &["goal", "goals", "target", "set", "hedef*", "belirle*"];

pub const QUESTION_KEYWORDS: &[&str] = &[
    "how", "why", "what", "who", "where", "when", "how many", "nasıl", "neden", "niye", "ne",
    "nedir", "kim", "nerede", "ne zaman", "kaç",
];

const TRANSPORT_WORDS: &[&str] = &[
    "car", "cars", "drive", "driving", "bus", "train", "flight", "flights", "fly", "flew",
    "taxi", "fuel", "petrol", "diesel", "araç*", "araba*", "otobüs*", "tren*", "uçak*",
    "taksi*", "metro*", "benzin*", "mazot*", "yakıt*",
];

const ENERGY_WORDS: &[&str] = &[
    "electric", "electricity", "power", "heating", "kwh", "energy", "air conditioner",
    "elektrik*", "ısıtma*", "doğalgaz*", "klima*", "enerji*",
];

const FOOD_WORDS: &[&str] = &[
    "meat", "beef", "chicken", "meal", "meals", "food", "ate", "eat", "eating", "lunch",
    "dinner", "breakfast", "et", "yemek*", "tavuk*", "sığır*", "yedim", "kahvaltı*",
];

const WASTE_WORDS: &[&str] = &[
    "waste", "trash", "garbage", "plastic", "recycl*", "çöp*", "atık*", "plastik*",
];

/// Secondary category scan order.
pub const CATEGORY_VOCABULARIES: &[(ActivityCategory, &[&str])] = &[
    (ActivityCategory::Transport, TRANSPORT_WORDS),
    (ActivityCategory::Energy, ENERGY_WORDS),
    (ActivityCategory::Food, FOOD_WORDS),
    (ActivityCategory::Waste, WASTE_WORDS),
];

/// Checked in this order; `today` last so "this week so far today" stays weekly.
pub const STATS_PERIODS: &[(StatsPeriod, &[&str])] = &[
    (StatsPeriod::Yesterday, &["yesterday", "dün"]),
    (StatsPeriod::ThisWeek, &["this week", "weekly", "bu hafta", "haftalık"]),
    (StatsPeriod::ThisMonth, &["this month", "monthly", "bu ay", "aylık"]),
    (StatsPeriod::Today, &["today", "bugün"]),
];

pub const GOAL_PERIODS: &[(GoalPeriod, &[&str])] = &[
    (GoalPeriod::Daily, &["daily", "day", "günlük", "her gün"]),
    (GoalPeriod::Weekly, &["weekly", "week", "haftalık", "hafta"]),
    (GoalPeriod::Monthly, &["monthly", "month", "aylık", "ay"]),
];

/// Lowercased transcript split into words.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedText {
    text: String,
    words: Vec<String>,
}

impl NormalizedText {
    /// Lowercase, split a number from the letters that follow it (`5km`), and
    /// collapse everything that is not a letter, digit or in-number decimal
    /// separator into single spaces. Digits after a letter stay in the word
    /// (`co2`).
    pub fn new(raw: &str) -> Self {
        let lowered = raw.to_lowercase();
        let chars: Vec<char> = lowered.chars().collect();
        let mut text = String::with_capacity(lowered.len());

        for (i, &c) in chars.iter().enumerate() {
            let prev = i.checked_sub(1).map(|p| chars[p]);
            let next = chars.get(i + 1).copied();

            let keep = c.is_alphanumeric()
                || ((c == '.' || c == ',')
                    && prev.is_some_and(|p| p.is_ascii_digit())
                    && next.is_some_and(|n| n.is_ascii_digit()));

            if !keep {
                push_space(&mut text);
                continue;
            }

            if prev.is_some_and(|p| p.is_ascii_digit()) && c.is_alphabetic() {
                push_space(&mut text);
            }
            text.push(c);
        }

        let text = text.trim().to_string();
        let words = text.split(' ').filter(|w| !w.is_empty()).map(String::from).collect();
        Self { text, words }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Whether `keyword` (one or more space-separated words) occurs.
    pub fn contains(&self, keyword: &str) -> bool {
        let parts: Vec<&str> = keyword.split_whitespace().collect();
        if parts.is_empty() || parts.len() > self.words.len() {
            return false;
        }
        self.words.windows(parts.len()).any(|window| {
            window
                .iter()
                .zip(parts.iter())
                .all(|(word, part)| word_matches(word, part))
        })
    }

    pub fn contains_any(&self, keywords: &[&str]) -> bool {
        keywords.iter().any(|k| self.contains(k))
    }
}

fn push_space(text: &mut String) {
    if !text.is_empty() && !text.ends_with(' ') {
        text.push(' ');
    }
}

fn word_matches(word: &str, keyword: &str) -> bool {
    match keyword.strip_suffix(STEM_MARKER) {
        Some(stem) => word.starts_with(stem),
        None => word == keyword,
    }
}

/// First category whose vocabulary occurs in the text.
pub fn scan_category(text: &NormalizedText) -> Option<ActivityCategory> {
    CATEGORY_VOCABULARIES
        .iter()
        .find(|(_, words)| text.contains_any(words))
        .map(|(category, _)| *category)
}

pub fn scan_stats_period(text: &NormalizedText) -> StatsPeriod {
    STATS_PERIODS
        .iter()
        .find(|(_, words)| text.contains_any(words))
        .map(|(period, _)| *period)
        .unwrap_or_default()
}

pub fn scan_goal_period(text: &NormalizedText) -> GoalPeriod {
    GOAL_PERIODS
        .iter()
        .find(|(_, words)| text.contains_any(words))
        .map(|(period, _)| *period)
        .unwrap_or_default()
}
