use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Schema version stamped into every emitted catalog.
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Placeholder written for hours/interval when a route carries no information.
pub const NO_INFO: &str = "정보 없음";

/// District label used for crawled fragments that cannot be attributed.
pub const UNKNOWN_DISTRICT: &str = "미확인";

/// One of Seoul's autonomous districts, with the alias keywords used to spot it in free text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct District {
    pub name: String,
    pub code: String,
    pub keywords: Vec<String>,
}

impl District {
    fn new(name: &str, code: &str, keywords: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            code: code.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }

    pub fn is_named_in(&self, text: &str) -> bool {
        text.contains(self.name.as_str())
    }

    /// True when `text` contains one of the alias keywords. Aliases overlap across
    /// districts (`강남` belongs to both 서초구 and 강남구), so callers try names first.
    pub fn has_alias_in(&self, text: &str) -> bool {
        self.keywords.iter().any(|k| text.contains(k.as_str()))
    }
}

/// Latitude/longitude box a stop must fall in to be accepted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl Bounds {
    pub const SEOUL: Bounds = Bounds {
        min_lat: 37.42,
        max_lat: 37.72,
        min_lng: 126.76,
        max_lng: 127.18,
    };

    pub fn contains_lat(&self, lat: f64) -> bool {
        (self.min_lat..=self.max_lat).contains(&lat)
    }

    pub fn contains_lng(&self, lng: f64) -> bool {
        (self.min_lng..=self.max_lng).contains(&lng)
    }

    pub fn contains(&self, lat: f64, lng: f64) -> bool {
        self.contains_lat(lat) && self.contains_lng(lng)
    }
}

/// Immutable reference data shared by every stage of the catalog engine.
///
/// Built once (usually via [`CatalogConfig::seoul`]) and handed to each component by
/// reference; nothing in the engine reads keyword or district tables from anywhere else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Closed district table, in canonical order. Ambiguous lines resolve to the first match.
    pub districts: Vec<District>,
    /// Suffix words that mark a token as a stop name.
    pub stop_keywords: Vec<String>,
    /// Schedule and administrative noise words that disqualify a token or line.
    pub exclude_keywords: Vec<String>,
    pub bounds: Bounds,
    pub schema_version: String,
    /// Source label written into the canonical document.
    pub source: String,
    pub no_info: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self::seoul()
    }
}

impl CatalogConfig {
    /// The 25 Seoul districts and the keyword tables the shuttle notices are written with.
    pub fn seoul() -> Self {
        let districts = vec![
            District::new("종로구", "110", &["종로", "광화문", "경복궁"]),
            District::new("중구", "100", &["중구", "명동", "을지로"]),
            District::new("용산구", "140", &["용산", "이태원", "한남"]),
            District::new("성동구", "133", &["성동", "왕십리", "성수"]),
            District::new("광진구", "143", &["광진", "건대", "구의"]),
            District::new("동대문구", "130", &["동대문", "청량리", "회기"]),
            District::new("중랑구", "131", &["중랑", "망우", "면목"]),
            District::new("성북구", "136", &["성북", "길음", "돈암"]),
            District::new("강북구", "305", &["강북", "수유", "미아"]),
            District::new("도봉구", "320", &["도봉", "창동", "쌍문"]),
            District::new("노원구", "350", &["노원", "상계", "중계"]),
            District::new("은평구", "380", &["은평", "연신내", "불광"]),
            District::new("서대문구", "120", &["서대문", "신촌", "홍제"]),
            District::new("마포구", "121", &["마포", "홍대", "합정"]),
            District::new("양천구", "158", &["양천", "목동", "신정"]),
            District::new("강서구", "157", &["강서", "화곡", "발산"]),
            District::new("구로구", "152", &["구로", "신도림", "개봉"]),
            District::new("금천구", "153", &["금천", "가산", "독산"]),
            District::new("영등포구", "150", &["영등포", "여의도", "당산"]),
            District::new("동작구", "156", &["동작", "사당", "노량진"]),
            District::new("관악구", "151", &["관악", "신림", "봉천"]),
            District::new("서초구", "137", &["서초", "강남", "양재"]),
            District::new("강남구", "135", &["강남", "역삼", "삼성"]),
            District::new("송파구", "138", &["송파", "잠실", "가락"]),
            District::new("강동구", "134", &["강동", "천호", "길동"]),
        ];

        let words = |list: &[&str]| list.iter().map(|w| w.to_string()).collect::<Vec<_>>();

        Self {
            districts,
            stop_keywords: words(&[
                "역", "정류장", "사거리", "삼거리", "오거리", "주민센터", "구청", "시장", "공원", "학교",
                "병원", "아파트", "마을", "입구", "앞", "건너",
            ]),
            exclude_keywords: words(&[
                "운행", "시간", "배차", "간격", "분", "시", "노선", "안내", "문의", "연락처",
            ]),
            bounds: Bounds::SEOUL,
            schema_version: SCHEMA_VERSION.to_string(),
            source: "자동 수집".to_string(),
            no_info: NO_INFO.to_string(),
        }
    }

    /// Number of districts in the closed set; the denominator of district coverage.
    pub fn district_count(&self) -> usize {
        self.districts.len()
    }

    pub fn is_known_district(&self, name: &str) -> bool {
        self.districts.iter().any(|d| d.name == name)
    }

    pub fn trace_loaded(&self) {
        info!(
            districts = self.districts.len(),
            stop_keywords = self.stop_keywords.len(),
            exclude_keywords = self.exclude_keywords.len(),
            schema_version = %self.schema_version,
            source = %self.source,
            "Loaded catalog config"
        );
        debug!(?self, "Catalog config loaded (full debug)");
    }
}
