use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::NaiveDate;

use crate::domain::fetch::{MenuScraper, OpeningHoursScraper};
use crate::domain::model::{day_key, CanteenInfo, Meal, OpeningHours, WeeklyOpeningHours};

use super::Mensa;

// identity of an adapter that overrides no API record
const FALLBACK_NAME: &str = "unknown";
const FALLBACK_CITY: &str = "unknown";
const FALLBACK_ADDRESS: &str = "unknown";
const FALLBACK_COORDINATES: (f64, f64) = (0.0, 0.0);

/// Where one scraped canteen publishes its two documents. Every canteen
/// configures both URLs individually; there is no shared naming rule.
#[derive(Debug, Clone)]
pub struct ScrapedSource {
    pub menu_url: String,
    pub opening_hours_url: String,
}

impl ScrapedSource {
    pub fn new(menu_url: impl Into<String>, opening_hours_url: impl Into<String>) -> Self {
        Self {
            menu_url: menu_url.into(),
            opening_hours_url: opening_hours_url.into(),
        }
    }
}

/// A canteen whose data is scraped from HTML instead of fetched as JSON.
///
/// The adapter may wrap the [`CanteenInfo`] of a canteen already known
/// from the API feed, shadowing it under the same id, or stand alone
/// with placeholder identity. It owns the menu mapping and the weekly
/// opening-hours table; a scrape pass replaces either wholesale.
#[derive(Debug)]
pub struct ScrapedMensa {
    id: u32,
    original: Option<CanteenInfo>,
    source: ScrapedSource,
    menu_scraper: MenuScraper,
    hours_scraper: OpeningHoursScraper,
    state: Mutex<ScrapedState>,
}

#[derive(Debug, Default)]
struct ScrapedState {
    meals: HashMap<String, Vec<Meal>>,
    opening_hours: WeeklyOpeningHours,
}

impl ScrapedMensa {
    /// Scrapes both documents eagerly. The adapter is useless without a
    /// first dataset, so any fetch or parse failure here is propagated
    /// instead of swallowed.
    pub fn new(
        id: u32,
        original: Option<CanteenInfo>,
        source: ScrapedSource,
    ) -> anyhow::Result<Self> {
        let mensa = Self {
            id,
            original,
            source,
            menu_scraper: MenuScraper::new(),
            hours_scraper: OpeningHoursScraper::new(),
            state: Mutex::default(),
        };
        mensa.refresh()?;
        Ok(mensa)
    }

    /// Re-scrapes both documents, replacing the held data wholesale.
    pub fn refresh(&self) -> anyhow::Result<()> {
        let meals = self.menu_scraper.fetch_menu(&self.source.menu_url)?;
        let hours = self
            .hours_scraper
            .fetch_opening_hours(&self.source.opening_hours_url)?;

        let mut state = self.lock_state();
        state.meals = meals;
        state.opening_hours = hours;
        Ok(())
    }

    fn refresh_menu(&self) -> anyhow::Result<()> {
        let meals = self.menu_scraper.fetch_menu(&self.source.menu_url)?;
        self.lock_state().meals = meals;
        Ok(())
    }

    pub fn source(&self) -> &ScrapedSource {
        &self.source
    }

    fn lock_state(&self) -> MutexGuard<'_, ScrapedState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[cfg(test)]
    pub(crate) fn with_state(
        id: u32,
        original: Option<CanteenInfo>,
        source: ScrapedSource,
        meals: HashMap<String, Vec<Meal>>,
        opening_hours: WeeklyOpeningHours,
    ) -> Self {
        Self {
            id,
            original,
            source,
            menu_scraper: MenuScraper::new(),
            hours_scraper: OpeningHoursScraper::new(),
            state: Mutex::new(ScrapedState {
                meals,
                opening_hours,
            }),
        }
    }
}

impl Mensa for ScrapedMensa {
    fn id(&self) -> u32 {
        self.id
    }

    fn name(&self) -> &str {
        self.original
            .as_ref()
            .map(CanteenInfo::name)
            .unwrap_or(FALLBACK_NAME)
    }

    fn city(&self) -> &str {
        self.original
            .as_ref()
            .map(CanteenInfo::city)
            .unwrap_or(FALLBACK_CITY)
    }

    fn address(&self) -> &str {
        self.original
            .as_ref()
            .map(CanteenInfo::address)
            .unwrap_or(FALLBACK_ADDRESS)
    }

    fn coordinates(&self) -> Option<(f64, f64)> {
        match &self.original {
            Some(info) => info.coordinates(),
            None => Some(FALLBACK_COORDINATES),
        }
    }

    fn meals(&self, date: NaiveDate) -> Vec<Meal> {
        let day = day_key(date);
        if let Some(meals) = self.lock_state().meals.get(&day) {
            return meals.clone();
        }

        // the menu document is scraped as a whole; one pass is the unit
        // of freshness and refreshes every day it contains
        if let Err(err) = self.refresh_menu() {
            log::warn!("menu re-scrape for mensa {} failed: {err}", self.id);
            return vec![];
        }

        // still absent after a fresh scrape means the canteen simply
        // serves nothing that day
        self.lock_state().meals.get(&day).cloned().unwrap_or_default()
    }

    fn is_open(&self, date: NaiveDate) -> bool {
        // open means "serves meals that day"; the source rarely keeps
        // menu and schedule consistent, so the schedule is not consulted
        !self.meals(date).is_empty()
    }

    fn opening_hours(&self, date: NaiveDate) -> OpeningHours {
        self.lock_state().opening_hours.on_date(date)
    }

    fn has_opening_hours(&self) -> bool {
        true
    }
}
