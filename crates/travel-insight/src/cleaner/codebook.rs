//! Built-in survey codebooks.

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Activity type codes and their display names.
pub static ACTIVITY_TYPES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("1", "취식"),
        ("2", "쇼핑 / 구매"),
        ("3", "체험 활동 / 입장 및 관람"),
        ("4", "단순 구경 / 산책 / 걷기"),
        ("5", "휴식"),
        ("6", "기타 활동"),
        ("7", "환승/경유"),
        ("99", "없음"),
    ])
});

/// Lodging type codes and their display names.
pub static LODGING_TYPES: Lazy<HashMap<i64, &'static str>> = Lazy::new(|| {
    HashMap::from([
        (1, "호텔"),
        (2, "펜션"),
        (3, "콘도미니엄"),
        (4, "모텔/여관"),
        (5, "유스호스텔"),
        (6, "캠핑"),
        (7, "전통숙소"),
        (8, "민박"),
        (9, "기타"),
        (10, "게스트하우스"),
        (11, "리조트"),
        (12, "농어촌/휴양마을"),
    ])
});

/// Province (시도) names with their administrative code.
const PROVINCES: [(&str, i64); 19] = [
    ("서울특별시", 11),
    ("부산광역시", 26),
    ("대구광역시", 27),
    ("인천광역시", 28),
    ("광주광역시", 29),
    ("대전광역시", 30),
    ("울산광역시", 31),
    ("세종특별자치시", 36),
    ("경기도", 41),
    ("강원도", 42),
    ("강원특별자치도", 51),
    ("충청북도", 43),
    ("충청남도", 44),
    ("전라북도", 45),
    ("전라남도", 46),
    ("경상북도", 47),
    ("경상남도", 48),
    ("제주특별자치도", 50),
    ("제주도", 50),
];

/// Short forms in common use that do not follow the suffix rules.
const PROVINCE_ABBREVIATIONS: [(&str, i64); 6] = [
    ("충남", 44),
    ("충북", 43),
    ("경남", 48),
    ("경북", 47),
    ("전남", 46),
    ("전북", 45),
];

/// Every accepted spelling, longest first so `"강원특별자치도"` wins over
/// `"강원"`.
static PROVINCE_KEYS: Lazy<Vec<(String, i64)>> = Lazy::new(|| {
    let mut keys: Vec<(String, i64)> = Vec::new();
    let mut push = |name: String, code: i64| {
        if !name.is_empty() && !keys.iter().any(|(existing, _)| *existing == name) {
            keys.push((name, code));
        }
    };

    for (name, code) in PROVINCES {
        push(name.to_string(), code);
        for suffix in ["특별자치시", "특별자치도", "특별시", "광역시"] {
            if let Some(short) = name.strip_suffix(suffix) {
                push(short.to_string(), code);
            }
        }
        if let Some(short) = name.strip_suffix('도') {
            push(short.to_string(), code);
        }
    }
    for (name, code) in PROVINCE_ABBREVIATIONS {
        push(name.to_string(), code);
    }

    keys.sort_by(|a, b| b.0.chars().count().cmp(&a.0.chars().count()));
    keys
});

/// Display name of an activity type code.
pub fn activity_type_name(code: &str) -> Option<&'static str> {
    ACTIVITY_TYPES.get(code).copied()
}

/// Display name of a lodging type code.
pub fn lodging_type_name(code: i64) -> Option<&'static str> {
    LODGING_TYPES.get(&code).copied()
}

/// Province code of the first province named in `text`, longest name first.
pub fn province_code(text: &str) -> Option<i64> {
    PROVINCE_KEYS
        .iter()
        .find(|(name, _)| text.contains(name.as_str()))
        .map(|(_, code)| *code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activity_and_lodging_names() {
        assert_eq!(activity_type_name("3"), Some("체험 활동 / 입장 및 관람"));
        assert_eq!(activity_type_name("42"), None);
        assert_eq!(lodging_type_name(12), Some("농어촌/휴양마을"));
        assert_eq!(lodging_type_name(0), None);
    }

    #[test]
    fn test_province_codes() {
        assert_eq!(province_code("서울특별시 강남구"), Some(11));
        assert_eq!(province_code("부산"), Some(26));
        assert_eq!(province_code("경기 수원시"), Some(41));
        assert_eq!(province_code("충남 천안"), Some(44));
        assert_eq!(province_code("강원특별자치도 춘천시"), Some(51));
        assert_eq!(province_code("강원 속초"), Some(42));
        assert_eq!(province_code("제주"), Some(50));
        assert_eq!(province_code("해외"), None);
    }
}
