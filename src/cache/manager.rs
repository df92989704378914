use std::sync::Arc;

use chrono::Duration;
use strum::IntoEnumIterator;
use strum_macros::{AsRefStr, Display, EnumIter};

use crate::domain::model::Meal;

use super::persistent::{now_millis, FileCache};

/// The two kinds of data this domain caches, each with its own key
/// namespace and TTL.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, AsRefStr, EnumIter)]
enum CacheKind {
    #[strum(serialize = "meals")]
    Meals,
    #[strum(serialize = "opening")]
    OpeningTimes,
}

impl CacheKind {
    // meals rarely change once published; schedules are reviewed weekly
    fn ttl(self) -> Duration {
        match self {
            CacheKind::Meals => Duration::days(30),
            CacheKind::OpeningTimes => Duration::days(7),
        }
    }

    fn key(self, mensa_id: u32, day: &str) -> String {
        format!("{}_{}_{}", self.as_ref(), mensa_id, day)
    }

    fn prefix(self, mensa_id: u32) -> String {
        format!("{}_{}_", self.as_ref(), mensa_id)
    }
}

/// Binds the generic [`FileCache`] to meal plans and opening status.
///
/// Keys are `meals_<id>_<day>` and `opening_<id>_<day>` with `<day>` a
/// Day Key. The manager shares its cache instance; cloning it is cheap
/// and every clone sees the same entries.
#[derive(Debug, Clone)]
pub struct MensaCacheManager {
    cache: Arc<FileCache>,
}

impl MensaCacheManager {
    pub fn new() -> Self {
        Self::with_cache(Arc::new(FileCache::new()))
    }

    pub fn with_cache(cache: Arc<FileCache>) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &FileCache {
        &self.cache
    }

    pub fn cache_meals(&self, mensa_id: u32, day: &str, meals: &[Meal]) {
        let kind = CacheKind::Meals;
        let expires_at = now_millis() + kind.ttl().num_milliseconds();
        self.cache.put_until(&kind.key(mensa_id, day), &meals, expires_at);
        log::debug!("cached {kind} for mensa {mensa_id} on {day}");
    }

    pub fn cached_meals(&self, mensa_id: u32, day: &str) -> Option<Vec<Meal>> {
        self.cache.get(&CacheKind::Meals.key(mensa_id, day))
    }

    pub fn has_cached_meals(&self, mensa_id: u32, day: &str) -> bool {
        self.cache.contains(&CacheKind::Meals.key(mensa_id, day))
    }

    pub fn remove_cached_meals(&self, mensa_id: u32, day: &str) -> bool {
        self.cache.remove(&CacheKind::Meals.key(mensa_id, day))
    }

    pub fn cache_opening_times(&self, mensa_id: u32, day: &str, is_open: bool) {
        let kind = CacheKind::OpeningTimes;
        let expires_at = now_millis() + kind.ttl().num_milliseconds();
        self.cache.put_until(&kind.key(mensa_id, day), &is_open, expires_at);
        log::debug!("cached {kind} for mensa {mensa_id} on {day}");
    }

    pub fn cached_opening_times(&self, mensa_id: u32, day: &str) -> Option<bool> {
        self.cache.get(&CacheKind::OpeningTimes.key(mensa_id, day))
    }

    pub fn has_cached_opening_times(&self, mensa_id: u32, day: &str) -> bool {
        self.cache.contains(&CacheKind::OpeningTimes.key(mensa_id, day))
    }

    pub fn remove_cached_opening_times(&self, mensa_id: u32, day: &str) -> bool {
        self.cache.remove(&CacheKind::OpeningTimes.key(mensa_id, day))
    }

    /// Drops every cached entry of one canteen, both kinds, all days.
    pub fn clear_mensa(&self, mensa_id: u32) {
        for kind in CacheKind::iter() {
            let prefix = kind.prefix(mensa_id);
            for key in self.cache.keys() {
                if key.starts_with(&prefix) {
                    self.cache.remove(&key);
                }
            }
        }
    }

    pub fn clear_expired(&self) -> usize {
        self.cache.clear_expired()
    }

    pub fn clear_all(&self) {
        self.cache.clear_all()
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

impl Default for MensaCacheManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::domain::model::Prices;
    use tempfile::TempDir;

    fn create_test_manager() -> (MensaCacheManager, TempDir) {
        let temp_dir = TempDir::new().expect("failed to create temp directory");
        let cache = Arc::new(FileCache::with_dir(temp_dir.path()));
        (MensaCacheManager::with_cache(cache), temp_dir)
    }

    fn meals() -> Vec<Meal> {
        vec![
            Meal::new(
                "Rindergulasch",
                "Klassiker",
                vec!["Rind".to_owned()],
                Prices::student_only(3.5),
            ),
            Meal::new("Pommes frites", "Hauptbeilagen", vec![], Prices::default()),
        ]
    }

    #[test]
    fn meals_roundtrip_before_ttl_elapses() {
        let (manager, _dir) = create_test_manager();

        manager.cache_meals(187, "2024-08-07", &meals());

        assert_eq!(manager.cached_meals(187, "2024-08-07"), Some(meals()));
        assert!(manager.has_cached_meals(187, "2024-08-07"));
    }

    #[test]
    fn meals_for_other_days_are_misses() {
        let (manager, _dir) = create_test_manager();

        manager.cache_meals(187, "2024-08-07", &meals());

        assert_eq!(manager.cached_meals(187, "2024-08-08"), None);
        assert_eq!(manager.cached_meals(96, "2024-08-07"), None);
    }

    #[test]
    fn opening_times_roundtrip() {
        let (manager, _dir) = create_test_manager();

        manager.cache_opening_times(187, "2024-08-07", true);
        manager.cache_opening_times(187, "2024-08-08", false);

        assert_eq!(manager.cached_opening_times(187, "2024-08-07"), Some(true));
        assert_eq!(manager.cached_opening_times(187, "2024-08-08"), Some(false));
        assert_eq!(manager.cached_opening_times(187, "2024-08-09"), None);
    }

    #[test]
    fn keys_follow_the_naming_scheme() {
        let (manager, _dir) = create_test_manager();

        manager.cache_meals(187, "2024-08-07", &meals());
        manager.cache_opening_times(187, "2024-08-07", true);

        let mut keys = manager.cache().keys();
        keys.sort();
        assert_eq!(
            keys,
            vec![
                "meals_187_2024-08-07".to_owned(),
                "opening_187_2024-08-07".to_owned()
            ]
        );
    }

    #[test]
    fn clear_mensa_only_touches_that_canteen() {
        let (manager, _dir) = create_test_manager();

        manager.cache_meals(187, "2024-08-07", &meals());
        manager.cache_opening_times(187, "2024-08-07", true);
        manager.cache_meals(96, "2024-08-07", &meals());

        manager.clear_mensa(187);

        assert_eq!(manager.cached_meals(187, "2024-08-07"), None);
        assert_eq!(manager.cached_opening_times(187, "2024-08-07"), None);
        assert_eq!(manager.cached_meals(96, "2024-08-07"), Some(meals()));
    }

    #[test]
    fn remove_reports_presence() {
        let (manager, _dir) = create_test_manager();

        manager.cache_meals(187, "2024-08-07", &meals());

        assert!(manager.remove_cached_meals(187, "2024-08-07"));
        assert!(!manager.remove_cached_meals(187, "2024-08-07"));
        assert!(!manager.remove_cached_opening_times(187, "2024-08-07"));
    }

    #[test]
    fn clones_share_one_cache() {
        let (manager, _dir) = create_test_manager();
        let clone = manager.clone();

        manager.cache_meals(187, "2024-08-07", &meals());

        assert_eq!(clone.cached_meals(187, "2024-08-07"), Some(meals()));
    }
}
