use std::collections::HashMap;

use anyhow::anyhow;
use chrono::NaiveDate;
use scraper::{ElementRef, Html};

use crate::domain::model::{day_key, Meal, Prices};

use super::err::ScrapeError;

// css classes the source puts on every row for zebra striping; everything
// else on a row is a diet/allergen marker
const COSMETIC_CLASSES: [&str; 3] = ["bg-color", "even", "odd"];

/// Scrapes the weekly menu document of one canteen into a Day Key → meals
/// mapping, covering every day panel the document contains.
#[derive(Debug, Clone)]
pub struct MenuScraper {
    http: reqwest::blocking::Client,
}

impl MenuScraper {
    pub fn new() -> Self {
        Self::with_client(reqwest::blocking::Client::new())
    }

    pub fn with_client(client: reqwest::blocking::Client) -> Self {
        Self { http: client }
    }

    pub fn fetch_menu(&self, url: &str) -> anyhow::Result<HashMap<String, Vec<Meal>>> {
        let menu_html = self.fetch_html(url)?;
        self.parse_menu(&menu_html)
    }

    fn fetch_html(&self, url: &str) -> anyhow::Result<Html> {
        let resp_text = self.http.get(url).send()?.error_for_status()?.text()?;
        Ok(Html::parse_document(&resp_text))
    }

    /// The i-th date heading belongs to the i-th day panel; the document
    /// never links them explicitly. A count mismatch therefore poisons
    /// the whole document and fails the parse.
    ///
    /// Within one panel, a malformed dish row is skipped and logged, but
    /// a panel without a menu table has nothing to fall back to and the
    /// day is dropped entirely.
    pub(crate) fn parse_menu(&self, doc: &Html) -> anyhow::Result<HashMap<String, Vec<Meal>>> {
        let headings: Vec<_> = doc.select(&selectors::DATE_HEADLINE).collect();
        let panels: Vec<_> = doc.select(&selectors::DAY_PANEL).collect();

        if headings.len() != panels.len() {
            return Err(ScrapeError::PanelCountMismatch {
                headings: headings.len(),
                panels: panels.len(),
            }
            .into());
        }

        let mut days = HashMap::new();
        for (heading, panel) in headings.into_iter().zip(panels) {
            let text: String = heading.text().collect();
            let Some(date) = extract_date(&text) else {
                log::warn!("skipping day panel: no date in heading {:?}", text.trim());
                continue;
            };

            match self.parse_day_panel(panel) {
                Ok(meals) => {
                    days.insert(day_key(date), meals);
                }
                Err(err) => {
                    log::warn!("dropping menu for {date}: {err}");
                }
            }
        }

        Ok(days)
    }

    fn parse_day_panel(&self, panel: ElementRef) -> Result<Vec<Meal>, ScrapeError> {
        let menu_table = panel
            .select(&selectors::MENU_TABLE)
            .next()
            .ok_or(ScrapeError::element_not_found("table", "menues"))?;

        let mut meals = vec![];
        for row in menu_table.select(&selectors::MENU_ROW) {
            match self.parse_menu_row(row) {
                Ok(meal) => meals.push(meal),
                Err(err) => log::warn!("skipping dish row: {err}"),
            }
        }

        // side dishes are optional; a day without them is still valid
        if let Some(extras_table) = panel.select(&selectors::EXTRAS_TABLE).next() {
            meals.extend(self.parse_extras_table(extras_table));
        } else {
            log::debug!("day panel has no extras table");
        }

        Ok(meals)
    }

    fn parse_menu_row(&self, tr: ElementRef) -> anyhow::Result<Meal> {
        let wrapper = tr
            .select(&selectors::MENU_WRAPPER)
            .next()
            .ok_or(anyhow!("no td with class \"menue-wrapper\""))?;

        let category: String = wrapper
            .select(&selectors::CATEGORY)
            .next()
            .ok_or(anyhow!("no span with class \"menue-category\""))?
            .text()
            .collect();
        let category = category.trim();
        if category.is_empty() {
            return Err(anyhow!(".menue-category contains no text"));
        }

        let name: String = wrapper
            .select(&selectors::DISH_DESC)
            .next()
            .ok_or(anyhow!("no span with class \"expand-nutr\""))?
            .children()
            .filter_map(|node| node.value().as_text())
            .map(|txt_node| <str as AsRef<str>>::as_ref(txt_node))
            .collect();
        let name = name.split_whitespace().collect::<Vec<_>>().join(" ");
        if name.is_empty() {
            return Err(anyhow!("dish description contains no text"));
        }

        // "3,50 €" -> 3.5; a row without a price element is a free or
        // unpriced dish and is recorded as 0.0
        let price = match wrapper.select(&selectors::PRICE).next() {
            Some(elm) => {
                let text: String = elm.text().collect();
                parse_price(&text).ok_or(anyhow!("malformed price text {:?}", text.trim()))?
            }
            None => 0.0,
        };

        let notes: Vec<String> = tr
            .value()
            .classes()
            .filter(|cls| !COSMETIC_CLASSES.contains(cls))
            .map(|cls| cls.to_owned())
            .collect();

        Ok(Meal::new(name, category, notes, Prices::student_only(price)))
    }

    /// The extras table lists side dishes per category block, one text
    /// line per dish, without per-dish prices.
    fn parse_extras_table(&self, table: ElementRef) -> Vec<Meal> {
        let mut extras = vec![];

        for wrapper in table.select(&selectors::MENU_WRAPPER) {
            let category = wrapper
                .select(&selectors::CATEGORY)
                .next()
                .map(|elm| elm.text().collect::<String>())
                // Fallback to the empty string as a category if none is given
                .unwrap_or_default();
            let category = category.trim();

            let Some(desc) = wrapper.select(&selectors::EXTRA_DESC).next() else {
                log::warn!("skipping extras block: no span with class \"menue-desc\"");
                continue;
            };

            for txt_node in desc.children().filter_map(|node| node.value().as_text()) {
                let line = txt_node.trim();
                if line.is_empty() {
                    continue;
                }
                extras.push(Meal::new(line, category, vec![], Prices::default()));
            }
        }

        extras
    }
}

impl Default for MenuScraper {
    fn default() -> Self {
        Self::new()
    }
}

fn extract_date(heading_text: &str) -> Option<NaiveDate> {
    re::DATE_REGEX
        .find(heading_text)
        .and_then(|m| NaiveDate::parse_from_str(m.as_str(), "%d.%m.%Y").ok())
}

fn parse_price(text: &str) -> Option<f64> {
    let token = text.trim().split_whitespace().next()?;
    token.replace(',', ".").parse().ok()
}

pub mod selectors {
    use scraper::Selector;

    lazy_static! {
        pub static ref DATE_HEADLINE: Selector =
            Selector::parse("h3.default-headline, h3.active-headline").unwrap();
        pub static ref DAY_PANEL: Selector =
            Selector::parse("div.default-panel, div.active-panel").unwrap();
        pub static ref MENU_TABLE: Selector = Selector::parse("table.menues").unwrap();
        pub static ref EXTRAS_TABLE: Selector = Selector::parse("table.extras").unwrap();
        pub static ref MENU_ROW: Selector = Selector::parse("tbody > tr").unwrap();
        pub static ref MENU_WRAPPER: Selector = Selector::parse("td.menue-wrapper").unwrap();
        pub static ref CATEGORY: Selector = Selector::parse("span.menue-category").unwrap();
        pub static ref DISH_DESC: Selector =
            Selector::parse("span.menue-desc span.expand-nutr").unwrap();
        pub static ref PRICE: Selector = Selector::parse("span.menue-price").unwrap();
        pub static ref EXTRA_DESC: Selector = Selector::parse("span.menue-desc").unwrap();
    }
}

pub mod re {
    use regex::Regex;

    lazy_static! {
        pub static ref DATE_REGEX: Regex = Regex::new(r"(\d{2}\.\d{2}\.\d{4})").unwrap();
    }
}
