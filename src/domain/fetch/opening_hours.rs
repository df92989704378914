use chrono::Weekday;
use scraper::Html;

use crate::domain::model::{OpeningHours, WeeklyOpeningHours};

/// Scrapes the free-text weekly schedule of one canteen into a
/// [`WeeklyOpeningHours`] table.
///
/// Only the first non-blank schedule block of the document is read;
/// later blocks (special dates, semester-break schedules) are ignored.
/// That is a known simplification carried over from the source data,
/// which publishes the regular schedule first.
#[derive(Debug, Clone)]
pub struct OpeningHoursScraper {
    http: reqwest::blocking::Client,
}

impl OpeningHoursScraper {
    pub fn new() -> Self {
        Self::with_client(reqwest::blocking::Client::new())
    }

    pub fn with_client(client: reqwest::blocking::Client) -> Self {
        Self { http: client }
    }

    pub fn fetch_opening_hours(&self, url: &str) -> anyhow::Result<WeeklyOpeningHours> {
        let resp_text = self.http.get(url).send()?.error_for_status()?.text()?;
        let doc = Html::parse_document(&resp_text);
        Ok(self.parse_schedule(&doc))
    }

    pub(crate) fn parse_schedule(&self, doc: &Html) -> WeeklyOpeningHours {
        let block = doc
            .select(&selectors::SCHEDULE_BLOCK)
            .map(|elm| elm.text().collect::<String>())
            .find(|text| !text.trim().is_empty());

        match block {
            Some(text) => parse_schedule_text(&text),
            None => {
                log::warn!("opening hours document contains no schedule block");
                WeeklyOpeningHours::new()
            }
        }
    }
}

impl Default for OpeningHoursScraper {
    fn default() -> Self {
        Self::new()
    }
}

/// Collects every `<day>[–<day>] HH:MM–HH:MM` occurrence in the block.
/// A day range walks forward through the week, wrapping So → Mo, until
/// the end day has been covered; Sa.–Mo. therefore means Sat, Sun, Mon.
pub(crate) fn parse_schedule_text(text: &str) -> WeeklyOpeningHours {
    let mut table = WeeklyOpeningHours::new();

    for caps in re::SCHEDULE_REGEX.captures_iter(text) {
        let Some(start) = weekday_from_abbrev(&caps["start"]) else {
            continue;
        };
        let end = caps
            .name("end")
            .and_then(|m| weekday_from_abbrev(m.as_str()))
            .unwrap_or(start);

        let open = fractional_hour(&caps["oh"], &caps["om"]);
        let close = fractional_hour(&caps["ch"], &caps["cm"]);
        let (Some(open), Some(close)) = (open, close) else {
            log::warn!("skipping schedule entry with out-of-range time: {:?}", &caps[0]);
            continue;
        };
        let hours = OpeningHours::new(open, close);

        let mut day = start;
        loop {
            table.set(day, hours);
            if day == end {
                break;
            }
            day = day.succ();
        }
    }

    table
}

fn weekday_from_abbrev(abbrev: &str) -> Option<Weekday> {
    match abbrev {
        "Mo" => Some(Weekday::Mon),
        "Di" => Some(Weekday::Tue),
        "Mi" => Some(Weekday::Wed),
        "Do" => Some(Weekday::Thu),
        "Fr" => Some(Weekday::Fri),
        "Sa" => Some(Weekday::Sat),
        "So" => Some(Weekday::Sun),
        _ => None,
    }
}

fn fractional_hour(hours: &str, minutes: &str) -> Option<f32> {
    // parse: the pattern only matches digits
    let h: u32 = hours.parse().unwrap_or(u32::MAX);
    let m: u32 = minutes.parse().unwrap_or(u32::MAX);
    if h > 23 || m > 59 {
        return None;
    }
    Some(h as f32 + m as f32 / 60.0)
}

pub mod selectors {
    use scraper::Selector;

    lazy_static! {
        pub static ref SCHEDULE_BLOCK: Selector = Selector::parse("p").unwrap();
    }
}

pub mod re {
    use regex::Regex;

    lazy_static! {
        pub static ref SCHEDULE_REGEX: Regex = Regex::new(
            r"(?x)
            (?P<start>Mo|Di|Mi|Do|Fr|Sa|So)\.?
            (?:\s*[–—-]\s*(?P<end>Mo|Di|Mi|Do|Fr|Sa|So)\.?)?
            \s*(?P<oh>\d{1,2})[:.](?P<om>\d{2})
            \s*[–—-]\s*(?P<ch>\d{1,2})[:.](?P<cm>\d{2})"
        )
        .unwrap();
    }
}
