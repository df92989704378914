use chrono::NaiveDate;

use crate::cache::MensaCacheManager;
use crate::domain::fetch::ApiClient;
use crate::domain::model::{day_key, CanteenInfo, Meal, OpeningHours};

use super::Mensa;

/// A canteen served directly by the JSON API. Every per-date query goes
/// through the cache facade first and writes its fetch result back.
#[derive(Debug, Clone)]
pub struct ApiMensa {
    info: CanteenInfo,
    client: ApiClient,
    cache: MensaCacheManager,
}

impl ApiMensa {
    pub fn new(info: CanteenInfo, client: ApiClient, cache: MensaCacheManager) -> Self {
        Self {
            info,
            client,
            cache,
        }
    }

    pub fn info(&self) -> &CanteenInfo {
        &self.info
    }
}

impl Mensa for ApiMensa {
    fn id(&self) -> u32 {
        self.info.id()
    }

    fn name(&self) -> &str {
        self.info.name()
    }

    fn city(&self) -> &str {
        self.info.city()
    }

    fn address(&self) -> &str {
        self.info.address()
    }

    fn coordinates(&self) -> Option<(f64, f64)> {
        self.info.coordinates()
    }

    fn meals(&self, date: NaiveDate) -> Vec<Meal> {
        let day = day_key(date);
        if let Some(meals) = self.cache.cached_meals(self.id(), &day) {
            return meals;
        }

        match self.client.meals(self.id(), &day) {
            Ok(meals) => {
                self.cache.cache_meals(self.id(), &day, &meals);
                meals
            }
            Err(err) => {
                log::warn!("failed to fetch meals for mensa {} on {day}: {err}", self.id());
                vec![]
            }
        }
    }

    fn is_open(&self, date: NaiveDate) -> bool {
        let day = day_key(date);
        if let Some(is_open) = self.cache.cached_opening_times(self.id(), &day) {
            return is_open;
        }

        match self.client.is_open(self.id(), &day) {
            Ok(is_open) => {
                self.cache.cache_opening_times(self.id(), &day, is_open);
                is_open
            }
            Err(err) => {
                log::warn!(
                    "failed to fetch opening status for mensa {} on {day}: {err}",
                    self.id()
                );
                false
            }
        }
    }

    fn opening_hours(&self, _date: NaiveDate) -> OpeningHours {
        // the API only reports an open/closed flag per day
        OpeningHours::CLOSED
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::cache::FileCache;
    use crate::domain::model::Prices;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn unreachable_mensa(dir: &TempDir) -> ApiMensa {
        let info = CanteenInfo::new(187, "Mensa Academica", "Aachen", "Pontwall 3", None);
        // port 9 is unassigned on the loopback; requests fail immediately
        let client = ApiClient::with_base_url("http://127.0.0.1:9");
        let cache = MensaCacheManager::with_cache(Arc::new(FileCache::with_dir(dir.path())));
        ApiMensa::new(info, client, cache)
    }

    #[test]
    fn identity_delegates_to_the_record() {
        let dir = TempDir::new().unwrap();
        let mensa = unreachable_mensa(&dir);

        assert_eq!(mensa.id(), 187);
        assert_eq!(mensa.name(), "Mensa Academica");
        assert_eq!(mensa.city(), "Aachen");
        assert!(!mensa.has_opening_hours());
    }

    #[test]
    fn cached_meals_short_circuit_the_network() {
        let dir = TempDir::new().unwrap();
        let mensa = unreachable_mensa(&dir);
        let date = NaiveDate::from_ymd_opt(2024, 8, 7).unwrap();

        let meals = vec![Meal::new(
            "Gemüsecurry",
            "Vegetarisch",
            vec![],
            Prices::student_only(2.1),
        )];
        mensa.cache.cache_meals(187, "2024-08-07", &meals);

        assert_eq!(mensa.meals(date), meals);
    }

    #[test]
    fn fetch_failure_reads_as_empty_menu() {
        let dir = TempDir::new().unwrap();
        let mensa = unreachable_mensa(&dir);
        let date = NaiveDate::from_ymd_opt(2024, 8, 7).unwrap();

        assert!(mensa.meals(date).is_empty());
        assert!(!mensa.is_open(date));
    }

    #[test]
    fn cached_opening_status_short_circuits_the_network() {
        let dir = TempDir::new().unwrap();
        let mensa = unreachable_mensa(&dir);
        let date = NaiveDate::from_ymd_opt(2024, 8, 7).unwrap();

        mensa.cache.cache_opening_times(187, "2024-08-07", true);

        assert!(mensa.is_open(date));
    }
}
