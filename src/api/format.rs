use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value;

/// Area code → region name, in display order
pub const REGIONS: [(&str, &str); 17] = [
    ("02", "서울"),
    ("031", "경기"),
    ("032", "인천"),
    ("033", "강원"),
    ("041", "충남"),
    ("042", "대전"),
    ("043", "충북"),
    ("044", "세종"),
    ("051", "부산"),
    ("052", "울산"),
    ("053", "대구"),
    ("054", "경북"),
    ("055", "경남"),
    ("061", "전남"),
    ("062", "광주"),
    ("063", "전북"),
    ("064", "제주"),
];

pub fn region_name(code: &str) -> Option<&'static str> {
    REGIONS.iter().find(|(c, _)| *c == code).map(|(_, name)| *name)
}

/// "서울 중구" from `{"address": "서울 중구 세종대로 110", ...}`
pub fn region_from_address(address_information: &Value) -> String {
    let address = address_information
        .get("address")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let mut words = address.split_whitespace();
    match (words.next(), words.next()) {
        (Some(province), Some(city)) => format!("{} {}", province, city),
        (Some(province), None) => province.to_string(),
        _ => "주소 없음".to_string(),
    }
}

pub fn format_deadline(deadline: NaiveDate) -> String {
    deadline.format("%Y.%m.%d").to_string()
}

#[derive(Clone, Copy)]
enum Unit {
    Second,
    Minute,
    Hour,
    Day,
    Month,
    Year,
}

const MS_PER_DAY: f64 = 86_400_000.0;
const DAYS_PER_MONTH: f64 = 365.2425 / 12.0;

impl Unit {
    fn of(&self, ms: f64) -> f64 {
        match self {
            Unit::Second => ms / 1_000.0,
            Unit::Minute => ms / 60_000.0,
            Unit::Hour => ms / 3_600_000.0,
            Unit::Day => ms / MS_PER_DAY,
            Unit::Month => ms / MS_PER_DAY / DAYS_PER_MONTH,
            Unit::Year => ms / MS_PER_DAY / DAYS_PER_MONTH / 12.0,
        }
    }
}

/// (label, upper bound, unit to recompute with). Steps without a unit reuse the previous value.
const THRESHOLDS: [(&str, Option<f64>, Option<Unit>); 11] = [
    ("s", Some(44.0), Some(Unit::Second)),
    ("m", Some(89.0), None),
    ("mm", Some(44.0), Some(Unit::Minute)),
    ("h", Some(89.0), None),
    ("hh", Some(21.0), Some(Unit::Hour)),
    ("d", Some(35.0), None),
    ("dd", Some(25.0), Some(Unit::Day)),
    ("M", Some(45.0), None),
    ("MM", Some(10.0), Some(Unit::Month)),
    ("y", Some(17.0), None),
    ("yy", None, Some(Unit::Year)),
];

fn korean_label(label: &str, n: i64) -> String {
    match label {
        "s" => "몇 초".to_string(),
        "m" => "1분".to_string(),
        "mm" => format!("{}분", n),
        "h" => "한 시간".to_string(),
        "hh" => format!("{}시간", n),
        "d" => "하루".to_string(),
        "dd" => format!("{}일", n),
        "M" => "한 달".to_string(),
        "MM" => format!("{}달", n),
        "y" => "일 년".to_string(),
        _ => format!("{}년", n),
    }
}

/// Korean "n분 전" style distance from `now` to `then`
pub fn from_now_ko(then: NaiveDateTime, now: NaiveDateTime) -> String {
    let ms = (then - now).num_milliseconds() as f64;
    let mut value = 0.0;
    let mut phrase = String::new();

    for (i, (label, bound, unit)) in THRESHOLDS.iter().enumerate() {
        if let Some(unit) = unit {
            value = unit.of(ms);
        }
        let rounded = value.abs().round();
        let within = bound.map(|b| rounded <= b).unwrap_or(true);
        if within {
            // 1 minute reads as "a minute", 0 seconds as "a few seconds"
            let label = if rounded <= 1.0 && i > 0 { THRESHOLDS[i - 1].0 } else { *label };
            phrase = korean_label(label, rounded as i64);
            break;
        }
    }

    if value > 0.0 {
        format!("{} 후", phrase)
    } else {
        format!("{} 전", phrase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    fn ago(d: Duration) -> String {
        let now = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap().and_hms_opt(12, 0, 0).unwrap();
        from_now_ko(now - d, now)
    }

    #[test]
    fn relative_time_follows_thresholds() {
        assert_eq!(ago(Duration::seconds(10)), "몇 초 전");
        assert_eq!(ago(Duration::seconds(44)), "몇 초 전");
        assert_eq!(ago(Duration::seconds(45)), "1분 전");
        assert_eq!(ago(Duration::seconds(89)), "1분 전");
        assert_eq!(ago(Duration::seconds(90)), "2분 전");
        assert_eq!(ago(Duration::minutes(44)), "44분 전");
        assert_eq!(ago(Duration::minutes(45)), "한 시간 전");
        assert_eq!(ago(Duration::minutes(90)), "2시간 전");
        assert_eq!(ago(Duration::hours(21)), "21시간 전");
        assert_eq!(ago(Duration::hours(22)), "하루 전");
        assert_eq!(ago(Duration::hours(36)), "2일 전");
        assert_eq!(ago(Duration::days(25)), "25일 전");
        assert_eq!(ago(Duration::days(26)), "한 달 전");
        assert_eq!(ago(Duration::days(46)), "2달 전");
        assert_eq!(ago(Duration::days(300)), "10달 전");
        assert_eq!(ago(Duration::days(400)), "일 년 전");
        assert_eq!(ago(Duration::days(365 * 3)), "3년 전");
    }

    #[test]
    fn future_times_use_after_suffix() {
        let now = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap().and_hms_opt(12, 0, 0).unwrap();
        assert_eq!(from_now_ko(now + Duration::minutes(5), now), "5분 후");
    }

    #[test]
    fn region_is_first_two_words() {
        assert_eq!(region_from_address(&json!({"address": "경기 성남시 분당구 판교역로 1"})), "경기 성남시");
        assert_eq!(region_from_address(&json!({"x": "1"})), "주소 없음");
    }

    #[test]
    fn region_codes_keep_order() {
        assert_eq!(REGIONS[0], ("02", "서울"));
        assert_eq!(REGIONS[16], ("064", "제주"));
        assert_eq!(region_name("051"), Some("부산"));
        assert_eq!(region_name("099"), None);
    }

    #[test]
    fn deadline_uses_dots() {
        assert_eq!(format_deadline(NaiveDate::from_ymd_opt(2024, 1, 5).unwrap()), "2024.01.05");
    }
}
