#![allow(dead_code)]

use fengshui_client::domain::model::{Gender, Query};
use serde_json::{json, Value};

pub fn query(name: &str) -> Query {
    Query {
        name: name.to_string(),
        year: 1990,
        month: 6,
        day: 15,
        hour: 14,
        gender: Gender::Male,
        location: "北京".to_string(),
    }
}

pub fn bazi_result(year_pillar: &str) -> Value {
    json!({
        "year_pillar": year_pillar,
        "month_pillar": "乙丑",
        "day_pillar": "丙寅",
        "hour_pillar": "丁卯",
        "tiangang": ["甲", "乙", "丙", "丁"],
        "dizhi": ["子", "丑", "寅", "卯"],
        "wuxing": {"木": 2, "火": 2, "土": 2, "金": 1, "水": 1},
        "zodiac": "马",
        "nayin": "路旁土"
    })
}

pub fn basic_envelope(year_pillar: &str) -> Value {
    json!({
        "success": true,
        "data": {
            "user_info": {
                "name": "A",
                "birth_date": {"year": 1990, "month": 6, "day": 15, "hour": 14},
                "gender": "male",
                "location": "北京"
            },
            "bazi_result": bazi_result(year_pillar)
        },
        "timestamp": "2025-08-14T10:00:00"
    })
}

pub fn analysis_result() -> Value {
    json!({
        "personality": {
            "traits": ["性格温和", "富有创造力"],
            "strengths": ["责任心强"],
            "weaknesses": ["有时过于谨慎"]
        },
        "fortune": {
            "career": "事业稳步上升",
            "wealth": "财运平稳",
            "health": "注意休息",
            "relationship": "感情和谐"
        },
        "lucky_elements": {
            "colors": ["绿色", "蓝色"],
            "numbers": [3, 8],
            "directions": ["东方", "北方"]
        },
        "life_advice": ["保持积极心态", "多与朋友交流"],
        "balance_score": 72.5
    })
}

pub fn analysis_envelope() -> Value {
    json!({"success": true, "data": {"analysis_result": analysis_result()}})
}

pub fn daily_fortune(date: &str) -> Value {
    json!({
        "date": date,
        "ganzhi": "乙卯",
        "suitable": ["祭祀", "出行"],
        "unsuitable": ["动土"],
        "wealth_direction": "东北",
        "overall_score": 68,
        "time_fortune": {"07:00-09:00": "吉", "13:00-15:00": "凶"},
        "conflict_zodiac": "鸡"
    })
}
