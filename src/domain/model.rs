use crate::utils::error::{ErrorKind, Result};
use crate::utils::validation::{
    validate_calendar_date, validate_non_empty_string, validate_pillar, validate_range, Validate,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

/// Birth data submitted for analysis. Serialized flat, as the basic endpoint expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    pub name: String,
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub gender: Gender,
    pub location: String,
}

impl Query {
    /// The nested profile shape the service echoes back and expects in follow-up calls.
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            name: self.name.clone(),
            birth_date: BirthDate {
                year: self.year,
                month: self.month,
                day: self.day,
                hour: self.hour,
            },
            gender: self.gender,
            location: self.location.clone(),
        }
    }
}

impl Validate for Query {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("name", &self.name)?;
        validate_non_empty_string("location", &self.location)?;
        validate_range("year", self.year, 1900, 2100)?;
        validate_range("month", self.month, 1, 12)?;
        validate_range("day", self.day, 1, 31)?;
        validate_range("hour", self.hour, 0, 23)?;
        validate_calendar_date("day", self.year, self.month, self.day)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: String,
    pub birth_date: BirthDate,
    pub gender: Gender,
    pub location: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BirthDate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
}

/// Per-element character counts over the eight pillar characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ElementCounts {
    #[serde(rename = "木")]
    pub wood: u32,
    #[serde(rename = "火")]
    pub fire: u32,
    #[serde(rename = "土")]
    pub earth: u32,
    #[serde(rename = "金")]
    pub metal: u32,
    #[serde(rename = "水")]
    pub water: u32,
}

impl ElementCounts {
    pub const TOTAL: u32 = 8;

    pub fn total(&self) -> u32 {
        self.wood + self.fire + self.earth + self.metal + self.water
    }

    pub fn entries(&self) -> [(&'static str, u32); 5] {
        [
            ("木", self.wood),
            ("火", self.fire),
            ("土", self.earth),
            ("金", self.metal),
            ("水", self.water),
        ]
    }
}

/// Phase-1 output. Field names follow the service's `bazi_result` object so the
/// value can be sent back verbatim with the interpretation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicResult {
    pub year_pillar: String,
    pub month_pillar: String,
    pub day_pillar: String,
    pub hour_pillar: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tiangang: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dizhi: Vec<String>,
    pub wuxing: ElementCounts,
    pub zodiac: String,
    pub nayin: String,
}

impl BasicResult {
    pub fn pillars(&self) -> [&str; 4] {
        [
            &self.year_pillar,
            &self.month_pillar,
            &self.day_pillar,
            &self.hour_pillar,
        ]
    }
}

impl Validate for BasicResult {
    fn validate(&self) -> Result<()> {
        validate_pillar("year_pillar", &self.year_pillar)?;
        validate_pillar("month_pillar", &self.month_pillar)?;
        validate_pillar("day_pillar", &self.day_pillar)?;
        validate_pillar("hour_pillar", &self.hour_pillar)?;

        for (field, parts) in [("tiangang", &self.tiangang), ("dizhi", &self.dizhi)] {
            if !parts.is_empty() && parts.len() != 4 {
                return Err(ErrorKind::validation(
                    field,
                    parts.join(","),
                    "Expected one entry per pillar",
                ));
            }
        }

        let total = self.wuxing.total();
        if total != ElementCounts::TOTAL {
            return Err(ErrorKind::validation(
                "wuxing",
                total,
                format!("Element counts must sum to {}", ElementCounts::TOTAL),
            ));
        }

        validate_non_empty_string("zodiac", &self.zodiac)?;
        validate_non_empty_string("nayin", &self.nayin)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Personality {
    pub traits: Vec<String>,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FortuneOutlook {
    pub career: String,
    pub wealth: String,
    pub health: String,
    pub relationship: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LuckyElements {
    pub colors: Vec<String>,
    pub numbers: Vec<u32>,
    pub directions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avoid_colors: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avoid_directions: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lifestyle_tips: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementStrength {
    pub count: u32,
    pub percentage: f64,
    pub strength: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ElementAnalysis {
    #[serde(default)]
    pub wuxing_strength: BTreeMap<String, ElementStrength>,
    #[serde(default)]
    pub favorable_elements: Vec<String>,
    #[serde(default)]
    pub unfavorable_elements: Vec<String>,
    #[serde(default)]
    pub missing_elements: Vec<String>,
    #[serde(default)]
    pub excessive_elements: Vec<String>,
}

/// Phase-2 output, produced by the interpretive service from a [`BasicResult`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterpretiveResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wuxing_analysis: Option<ElementAnalysis>,
    pub personality: Personality,
    pub fortune: FortuneOutlook,
    pub lucky_elements: LuckyElements,
    pub life_advice: Vec<String>,
    #[serde(deserialize_with = "score::deserialize")]
    pub balance_score: u8,
}

/// The eight compass directions a feng shui query can name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::North,
        Direction::NorthEast,
        Direction::East,
        Direction::SouthEast,
        Direction::South,
        Direction::SouthWest,
        Direction::West,
        Direction::NorthWest,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Direction::North => "北",
            Direction::NorthEast => "东北",
            Direction::East => "东",
            Direction::SouthEast => "东南",
            Direction::South => "南",
            Direction::SouthWest => "西南",
            Direction::West => "西",
            Direction::NorthWest => "西北",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Direction {
    type Err = ErrorKind;

    /// Accepts the Chinese label (with or without a trailing 方) or an English name.
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let label = trimmed.strip_suffix('方').unwrap_or(trimmed);
        let english = label.to_ascii_lowercase().replace(['-', '_', ' '], "");

        Direction::ALL
            .into_iter()
            .find(|d| d.label() == label)
            .or(match english.as_str() {
                "n" | "north" => Some(Direction::North),
                "ne" | "northeast" => Some(Direction::NorthEast),
                "e" | "east" => Some(Direction::East),
                "se" | "southeast" => Some(Direction::SouthEast),
                "s" | "south" => Some(Direction::South),
                "sw" | "southwest" => Some(Direction::SouthWest),
                "w" | "west" => Some(Direction::West),
                "nw" | "northwest" => Some(Direction::NorthWest),
                _ => None,
            })
            .ok_or_else(|| ErrorKind::validation("direction", s, "Unknown compass direction"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectionAdvice {
    pub element: String,
    pub color: String,
    pub beneficial: String,
    pub suggestions: Vec<String>,
}

impl Validate for DirectionAdvice {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("element", &self.element)?;
        if self.suggestions.is_empty() {
            return Err(ErrorKind::validation(
                "suggestions",
                "[]",
                "At least one suggestion is required",
            ));
        }
        Ok(())
    }
}

/// Chart-based consultation, one free-form section per topic
/// (`general`, `home`, `career`, `relationship`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChartAdvice(pub BTreeMap<String, serde_json::Value>);

impl ChartAdvice {
    pub fn topics(&self) -> impl Iterator<Item = (&str, &serde_json::Value)> {
        self.0.iter().map(|(topic, section)| (topic.as_str(), section))
    }

    pub fn section(&self, topic: &str) -> Option<&serde_json::Value> {
        self.0.get(topic)
    }
}

impl Validate for ChartAdvice {
    fn validate(&self) -> Result<()> {
        if self.0.is_empty() {
            return Err(ErrorKind::validation(
                "fengshui_advice",
                "{}",
                "At least one advice section is required",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LunarInfo {
    #[serde(default)]
    pub year: String,
    #[serde(default)]
    pub month: String,
    #[serde(default)]
    pub day: String,
    pub description: String,
    #[serde(default)]
    pub is_leap_month: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccurateLunar {
    #[serde(default)]
    pub lunar_year: String,
    #[serde(default)]
    pub lunar_month: String,
    #[serde(default)]
    pub lunar_day: String,
    pub lunar_date_str: String,
    #[serde(default)]
    pub bazi: String,
    #[serde(default)]
    pub wuxing: String,
    #[serde(default)]
    pub rilu: String,
    #[serde(default)]
    pub shenshou: String,
    #[serde(default)]
    pub sigong: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonalFortune {
    #[serde(deserialize_with = "score::deserialize")]
    pub score: u8,
    pub description: String,
    #[serde(default)]
    pub advice: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyFortune {
    pub date: NaiveDate,
    pub ganzhi: String,
    pub suitable: Vec<String>,
    pub unsuitable: Vec<String>,
    pub wealth_direction: String,
    #[serde(deserialize_with = "score::deserialize")]
    pub overall_score: u8,
    #[serde(default)]
    pub time_fortune: BTreeMap<String, String>,
    pub conflict_zodiac: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub personal_fortune: Option<PersonalFortune>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lunar_info: Option<LunarInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accurate_lunar: Option<AccurateLunar>,
    /// Set only on the locally generated stand-in used when the service is unreachable.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub placeholder: bool,
}

impl DailyFortune {
    pub fn score_label(&self) -> &'static str {
        match self.overall_score {
            80.. => "大吉",
            60..=79 => "中吉",
            40..=59 => "平",
            _ => "小凶",
        }
    }

    pub fn lunar_description(&self) -> Option<&str> {
        self.accurate_lunar
            .as_ref()
            .map(|l| l.lunar_date_str.as_str())
            .or_else(|| self.lunar_info.as_ref().map(|l| l.description.as_str()))
    }
}

impl Validate for DailyFortune {
    fn validate(&self) -> Result<()> {
        validate_pillar("ganzhi", &self.ganzhi)?;
        validate_non_empty_string("wealth_direction", &self.wealth_direction)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum ActivityType {
    Wedding,
    Moving,
    Business,
    #[default]
    General,
}

impl ActivityType {
    pub fn as_str(self) -> &'static str {
        match self {
            ActivityType::Wedding => "wedding",
            ActivityType::Moving => "moving",
            ActivityType::Business => "business",
            ActivityType::General => "general",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuspiciousDay {
    pub date: NaiveDate,
    #[serde(deserialize_with = "score::deserialize")]
    pub score: u8,
    pub reason: String,
    pub wealth_direction: String,
}

/// Both phases in one response (legacy single-call endpoint).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedAnalysis {
    #[serde(rename = "bazi_result")]
    pub basic: BasicResult,
    #[serde(rename = "analysis_result")]
    pub interpretation: InterpretiveResult,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyInfo {
    pub today_fortune: DailyFortune,
    #[serde(default)]
    pub auspicious_days: Vec<AuspiciousDay>,
    pub query_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompleteAnalysis {
    #[serde(rename = "bazi_result")]
    pub basic: BasicResult,
    #[serde(rename = "analysis_result")]
    pub interpretation: InterpretiveResult,
    #[serde(default)]
    pub daily_info: Option<DailyInfo>,
    /// Narrative sections whose layout varies by advice type; passed through for display.
    #[serde(default)]
    pub fengshui_advice: Option<serde_json::Value>,
    #[serde(default)]
    pub final_report: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.status.eq_ignore_ascii_case("healthy")
    }
}

/// 0-100 scores. The service emits some of these as floats (`75.0`), so any
/// finite number in range is accepted and rounded.
mod score {
    use serde::{de, Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<u8, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = f64::deserialize(deserializer)?;
        if !raw.is_finite() || !(0.0..=100.0).contains(&raw) {
            return Err(de::Error::custom(format!(
                "score {} outside 0-100",
                raw
            )));
        }
        Ok(raw.round() as u8)
    }
}
