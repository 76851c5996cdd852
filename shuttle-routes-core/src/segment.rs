//! Splits a text blob into per-district spans by scanning for district markers line by line.

use tracing::debug;

use crate::config::{CatalogConfig, District};

/// A contiguous run of lines attributed to one district.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistrictSpan {
    pub district: String,
    pub text: String,
}

pub struct DistrictSegmenter<'c> {
    config: &'c CatalogConfig,
}

impl<'c> DistrictSegmenter<'c> {
    pub fn new(config: &'c CatalogConfig) -> Self {
        Self { config }
    }

    /// First district, in canonical table order, that `text` names; failing that, the first
    /// whose alias it contains.
    pub fn identify(&self, text: &str) -> Option<&'c District> {
        self.resolve(text, None)
    }

    /// Like [`identify`](Self::identify), but an alias of the `open` district beats the
    /// aliases of districts earlier in the table.
    fn resolve(&self, line: &str, open: Option<&str>) -> Option<&'c District> {
        let districts = &self.config.districts;
        if let Some(named) = districts.iter().find(|d| d.is_named_in(line)) {
            return Some(named);
        }
        if let Some(open) = open.and_then(|name| districts.iter().find(|d| d.name == name)) {
            if open.has_alias_in(line) {
                return Some(open);
            }
        }
        districts.iter().find(|d| d.has_alias_in(line))
    }

    /// Spans in the order their district was first opened.
    ///
    /// Lines before the first marker are dropped. A district that is re-opened later in the
    /// same blob has the new lines appended to its existing span, so each district appears once.
    pub fn segment(&self, text: &str) -> Vec<DistrictSpan> {
        let mut spans: Vec<DistrictSpan> = Vec::new();
        let mut current: Option<usize> = None;

        for line in text.lines() {
            let open = current.map(|idx| spans[idx].district.as_str());
            if let Some(district) = self.resolve(line, open) {
                let already_open = current
                    .map(|idx| spans[idx].district == district.name)
                    .unwrap_or(false);
                if !already_open {
                    let idx = match spans.iter().position(|s| s.district == district.name) {
                        Some(idx) => idx,
                        None => {
                            spans.push(DistrictSpan {
                                district: district.name.clone(),
                                text: String::new(),
                            });
                            spans.len() - 1
                        }
                    };
                    debug!(district = %district.name, "Opened district span");
                    current = Some(idx);
                }
            }

            if let Some(idx) = current {
                let span = &mut spans[idx];
                if !span.text.is_empty() {
                    span.text.push('\n');
                }
                span.text.push_str(line);
            }
        }

        spans
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(text: &str) -> Vec<DistrictSpan> {
        let config = CatalogConfig::seoul();
        DistrictSegmenter::new(&config).segment(text)
    }

    #[test]
    fn drops_lines_before_first_marker() {
        let spans = segment("공지사항\n무료 셔틀 안내\n마포구 셔틀\n홍대입구역");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].district, "마포구");
        assert_eq!(spans[0].text, "마포구 셔틀\n홍대입구역");
    }

    #[test]
    fn switches_district_on_new_marker() {
        let spans = segment("마포구 셔틀\n망원시장 앞\n관악구 순환\n봉천역");
        let names: Vec<_> = spans.iter().map(|s| s.district.as_str()).collect();
        assert_eq!(names, vec!["마포구", "관악구"]);
        assert_eq!(spans[0].text, "마포구 셔틀\n망원시장 앞");
        assert_eq!(spans[1].text, "관악구 순환\n봉천역");
    }

    #[test]
    fn alias_of_open_district_does_not_split() {
        let spans = segment("영등포구 셔틀\n영등포역 1번출구\n여의도역");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text, "영등포구 셔틀\n영등포역 1번출구\n여의도역");
    }

    #[test]
    fn two_districts_on_one_line_go_to_first_in_table_order() {
        // 마포구 precedes 강서구 in the canonical table regardless of position in the line.
        let spans = segment("강서구·마포구 합동 셔틀");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].district, "마포구");
    }

    #[test]
    fn reopened_district_is_appended_to_its_span() {
        let spans = segment("마포구\n합정역\n관악구\n신림역\n마포구\n망원역");
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].text, "마포구\n합정역\n마포구\n망원역");
    }

    #[test]
    fn canonical_name_beats_earlier_alias() {
        // 서초구 lists 강남 as an alias and sits before 강남구 in the table.
        let spans = segment("강남구 무료 셔틀\n강남역\n역삼역");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].district, "강남구");
        assert_eq!(spans[0].text, "강남구 무료 셔틀\n강남역\n역삼역");
    }

    #[test]
    fn possessive_suffix_is_not_an_alias_hit() {
        // "마포구의" contains 광진구's alias 구의.
        let spans = segment("마포구의 무료 셔틀 안내\n합정역\n망원역");
        let names: Vec<_> = spans.iter().map(|s| s.district.as_str()).collect();
        assert_eq!(names, vec!["마포구"]);
        assert_eq!(spans[0].text, "마포구의 무료 셔틀 안내\n합정역\n망원역");
    }

    #[test]
    fn shared_alias_without_open_district_goes_to_first_in_table() {
        let config = CatalogConfig::seoul();
        let segmenter = DistrictSegmenter::new(&config);
        assert_eq!(segmenter.identify("강남역 앞").map(|d| d.name.as_str()), Some("서초구"));
        assert_eq!(
            segmenter.identify("강남구청 셔틀").map(|d| d.name.as_str()),
            Some("강남구")
        );
        assert_eq!(
            segmenter.identify("마포구의 셔틀").map(|d| d.name.as_str()),
            Some("마포구")
        );
    }

    #[test]
    fn identify_falls_back_to_none() {
        let config = CatalogConfig::seoul();
        let segmenter = DistrictSegmenter::new(&config);
        assert!(segmenter.identify("무료 셔틀버스 운행 안내").is_none());
        assert_eq!(segmenter.identify("잠실역").map(|d| d.name.as_str()), Some("송파구"));
    }
}
