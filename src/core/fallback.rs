//! Local stand-ins used when the analysis service cannot answer.
//!
//! [`FallbackAdvisoryResolver::resolve`] is total: every one of the eight
//! compass directions has a fixed entry, and any other input maps to a
//! neutral default. Every record it returns has a non-empty element and at
//! least one suggestion. [`FallbackAdvisoryResolver::daily_placeholder`]
//! returns a fortune flagged with `placeholder = true` so it is never shown
//! as a real reading.

use crate::domain::model::{DailyFortune, Direction, DirectionAdvice};
use chrono::NaiveDate;
use std::collections::BTreeMap;

struct AdviceEntry {
    element: &'static str,
    color: &'static str,
    beneficial: &'static str,
    suggestions: [&'static str; 3],
}

impl AdviceEntry {
    fn to_advice(&self) -> DirectionAdvice {
        DirectionAdvice {
            element: self.element.to_string(),
            color: self.color.to_string(),
            beneficial: self.beneficial.to_string(),
            suggestions: self.suggestions.iter().map(|s| s.to_string()).collect(),
        }
    }
}

const UNKNOWN: AdviceEntry = AdviceEntry {
    element: "未知",
    color: "中性色",
    beneficial: "平衡运势",
    suggestions: ["保持空间整洁", "通风透光", "摆放绿色植物"],
};

fn entry(direction: Direction) -> AdviceEntry {
    match direction {
        Direction::North => AdviceEntry {
            element: "水",
            color: "黑色、深蓝色",
            beneficial: "事业运、智慧运",
            suggestions: ["摆放水景装饰", "使用蓝黑色调", "放置镜子或玻璃制品"],
        },
        Direction::East => AdviceEntry {
            element: "木",
            color: "绿色、青色",
            beneficial: "健康运、家庭运",
            suggestions: ["摆放绿色植物", "使用木制家具", "保持空气流通"],
        },
        Direction::South => AdviceEntry {
            element: "火",
            color: "红色、紫色",
            beneficial: "名声运、桃花运",
            suggestions: ["使用红色装饰", "增加照明亮度", "摆放红色花卉"],
        },
        Direction::West => AdviceEntry {
            element: "金",
            color: "白色、金色",
            beneficial: "贵人运、财运",
            suggestions: ["摆放金属制品", "使用白色主调", "保持整洁明亮"],
        },
        Direction::SouthEast => AdviceEntry {
            element: "木",
            color: "绿色、青色",
            beneficial: "财运、学业运",
            suggestions: ["摆放富贵竹", "使用绿色装饰", "保持明亮通风"],
        },
        Direction::SouthWest => AdviceEntry {
            element: "土",
            color: "黄色、橙色",
            beneficial: "人际运、婚恋运",
            suggestions: ["摆放成双摆件", "使用暖色调", "保持温馨整洁"],
        },
        Direction::NorthEast => AdviceEntry {
            element: "土",
            color: "黄色、棕色",
            beneficial: "学业运、智慧运",
            suggestions: ["摆放书籍文具", "使用土色调", "保持安静整齐"],
        },
        Direction::NorthWest => AdviceEntry {
            element: "金",
            color: "白色、银色",
            beneficial: "事业运、权威运",
            suggestions: ["摆放金属饰品", "使用白银色调", "保持威严整洁"],
        },
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackAdvisoryResolver;

impl FallbackAdvisoryResolver {
    pub fn new() -> Self {
        Self
    }

    /// Advice for a free-form direction label; unrecognised input gets the neutral entry.
    pub fn resolve(&self, direction: &str) -> DirectionAdvice {
        match direction.parse::<Direction>() {
            Ok(direction) => self.resolve_direction(direction),
            Err(_) => UNKNOWN.to_advice(),
        }
    }

    pub fn resolve_direction(&self, direction: Direction) -> DirectionAdvice {
        entry(direction).to_advice()
    }

    pub fn daily_placeholder(&self, date: NaiveDate) -> DailyFortune {
        let strings = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();

        DailyFortune {
            date,
            ganzhi: "辛酉".to_string(),
            suitable: strings(&["安床", "牧养", "立卷", "求嗣"]),
            unsuitable: strings(&["掘井", "开渠"]),
            wealth_direction: "东南".to_string(),
            overall_score: 75,
            time_fortune: BTreeMap::from([("09:00-11:00".to_string(), "吉".to_string())]),
            conflict_zodiac: "兔".to_string(),
            personal_fortune: None,
            lunar_info: None,
            accurate_lunar: None,
            placeholder: true,
        }
    }
}
