use regex::Regex;

use crate::error::Result;

/// Operating hours and headway, taken from the first mention in a span.
pub struct ScheduleExtractor {
    hours: Regex,
    interval: Regex,
}

impl ScheduleExtractor {
    pub fn new() -> Result<Self> {
        Ok(Self {
            // The closing minute must follow the separator directly so "15시 20분 간격"
            // is not read as 15:20.
            hours: Regex::new(
                r"(\d{1,2})\s*[:시]\s*(\d{2})?\s*[~\-]\s*(\d{1,2})\s*[:시](\d{2})?",
            )?,
            // Leading guard keeps clock minutes ("18:00 30분") out of the range.
            interval: Regex::new(r"(?:^|[^\d:])(\d+)\s*(?:[~\-]\s*(\d+)\s*)?분")?,
        })
    }

    /// `HH:MM~HH:MM`, hours zero-padded and minutes defaulting to `00`.
    pub fn hours(&self, span: &str) -> Option<String> {
        let caps = self.hours.captures(span)?;
        let part = |hour_group: usize, minute_group: usize| {
            let hour = caps.get(hour_group).map_or("0", |g| g.as_str());
            let minute = caps.get(minute_group).map_or("00", |g| g.as_str());
            format!("{hour:0>2}:{minute}")
        };
        Some(format!("{}~{}", part(1, 2), part(3, 4)))
    }

    /// `N분` or `N~M분`.
    pub fn interval(&self, span: &str) -> Option<String> {
        let caps = self.interval.captures(span)?;
        let low = caps.get(1)?.as_str();
        Some(match caps.get(2) {
            Some(high) => format!("{low}~{}분", high.as_str()),
            None => format!("{low}분"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hours_are_padded_and_default_minutes() {
        let schedule = ScheduleExtractor::new().unwrap();
        assert_eq!(schedule.hours("운행 09:00~18:00").as_deref(), Some("09:00~18:00"));
        assert_eq!(schedule.hours("운행시간 7시~22시").as_deref(), Some("07:00~22:00"));
        assert_eq!(schedule.hours("9:30 - 17:00 운행").as_deref(), Some("09:30~17:00"));
        assert_eq!(schedule.hours("10시~15시 20분 간격").as_deref(), Some("10:00~15:00"));
        assert_eq!(schedule.hours("시간 미정"), None);
    }

    #[test]
    fn interval_single_and_range() {
        let schedule = ScheduleExtractor::new().unwrap();
        assert_eq!(schedule.interval("30분 간격").as_deref(), Some("30분"));
        assert_eq!(schedule.interval("배차 10~15분").as_deref(), Some("10~15분"));
        assert_eq!(schedule.interval("15-20분 간격 운행").as_deref(), Some("15~20분"));
        assert_eq!(schedule.interval("수시 운행"), None);
    }

    #[test]
    fn interval_ignores_clock_minutes() {
        let schedule = ScheduleExtractor::new().unwrap();
        let span = "영등포역 1번출구\n여의도역\n운행 09:00~18:00 30분 간격";
        assert_eq!(schedule.interval(span).as_deref(), Some("30분"));
        assert_eq!(schedule.hours(span).as_deref(), Some("09:00~18:00"));
    }

    #[test]
    fn only_first_mention_is_used() {
        let schedule = ScheduleExtractor::new().unwrap();
        let span = "평일 08:00~20:00 20분 간격\n주말 10:00~18:00 40분 간격";
        assert_eq!(schedule.hours(span).as_deref(), Some("08:00~20:00"));
        assert_eq!(schedule.interval(span).as_deref(), Some("20분"));
    }
}
