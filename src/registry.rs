use std::collections::HashMap;

use itertools::Itertools;

use crate::cache::MensaCacheManager;
use crate::domain::fetch::ApiClient;
use crate::domain::mensa::{ApiMensa, Mensa, ScrapedMensa, ScrapedSource};
use crate::domain::model::CanteenInfo;

/// Registry of the known canteens, keyed by id.
///
/// One instance is created at application startup and mutated only
/// through the explicit load/add operations below; there is no implicit
/// lazy population. All API-backed canteens share the registry's cache
/// facade.
pub struct OpenMensa {
    client: ApiClient,
    cache: MensaCacheManager,
    canteens: HashMap<u32, Box<dyn Mensa>>,
}

impl OpenMensa {
    pub fn new() -> Self {
        Self::with_parts(ApiClient::new(), MensaCacheManager::new())
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self::with_parts(ApiClient::with_base_url(base_url), MensaCacheManager::new())
    }

    pub fn with_parts(client: ApiClient, cache: MensaCacheManager) -> Self {
        Self {
            client,
            cache,
            canteens: HashMap::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        self.client.base_url()
    }

    pub fn cache_manager(&self) -> &MensaCacheManager {
        &self.cache
    }

    /// Walks `/canteens/` page by page until an empty page ends the
    /// pagination. Canteens from pages fetched before an error stay
    /// registered; the error itself is returned.
    pub fn load_canteens(&mut self) -> anyhow::Result<usize> {
        let mut page = 1;
        let mut loaded = 0;
        loop {
            let infos = self.client.canteens_page(page)?;
            if infos.is_empty() {
                break;
            }
            for info in infos {
                let mensa = ApiMensa::new(info, self.client.clone(), self.cache.clone());
                self.canteens.insert(mensa.id(), Box::new(mensa));
                loaded += 1;
            }
            page += 1;
        }

        log::info!("loaded {loaded} canteens from {}", self.client.base_url());
        Ok(loaded)
    }

    pub fn reload_canteens(&mut self) -> anyhow::Result<usize> {
        self.canteens.clear();
        self.load_canteens()
    }

    pub fn add_mensa(&mut self, mensa: Box<dyn Mensa>) {
        self.canteens.insert(mensa.id(), mensa);
    }

    /// Replaces (or creates) the entry for `id` with a scraped adapter.
    /// An entry already loaded from the API becomes the adapter's
    /// identity record, shadowed under the same id.
    pub fn add_override(&mut self, id: u32, source: ScrapedSource) -> anyhow::Result<()> {
        let original = self.canteens.get(&id).map(|mensa| {
            CanteenInfo::new(
                mensa.id(),
                mensa.name(),
                mensa.city(),
                mensa.address(),
                mensa.coordinates().map(|(lat, lon)| [lat, lon]),
            )
        });

        let mensa = ScrapedMensa::new(id, original, source)?;
        self.canteens.insert(id, Box::new(mensa));
        Ok(())
    }

    /// Installs the scraped adapters for the Aachen canteens whose menus
    /// the API does not carry. Each adapter scrapes eagerly, so this is
    /// a separate, explicit step after [`load_canteens`](Self::load_canteens)
    /// and fails if any of the documents is unreachable.
    pub fn apply_aachen_overrides(&mut self) -> anyhow::Result<()> {
        for (id, source) in aachen_sources() {
            self.add_override(id, source)?;
        }
        Ok(())
    }

    pub fn mensa(&self, id: u32) -> Option<&dyn Mensa> {
        self.canteens.get(&id).map(|mensa| mensa.as_ref())
    }

    /// Looks up `id`, fetching the canteen from the API if unknown.
    pub fn fetch_mensa(&mut self, id: u32) -> anyhow::Result<&dyn Mensa> {
        if !self.canteens.contains_key(&id) {
            let info = self.client.canteen(id)?;
            let mensa = ApiMensa::new(info, self.client.clone(), self.cache.clone());
            self.canteens.insert(id, Box::new(mensa));
        }

        // lookup: the entry was inserted above if it was missing
        Ok(self.canteens[&id].as_ref())
    }

    pub fn all(&self) -> impl Iterator<Item = &dyn Mensa> {
        self.canteens.values().map(|mensa| mensa.as_ref())
    }

    pub fn len(&self) -> usize {
        self.canteens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.canteens.is_empty()
    }

    /// Case-insensitive substring search over canteen names, sorted by
    /// name. An empty needle matches nothing.
    pub fn search(&self, needle: &str) -> Vec<&dyn Mensa> {
        if needle.is_empty() {
            return vec![];
        }

        let needle = needle.to_lowercase();
        self.all()
            .filter(|mensa| mensa.name().to_lowercase().contains(&needle))
            .sorted_by(|a, b| a.name().cmp(b.name()))
            .collect()
    }
}

impl Default for OpenMensa {
    fn default() -> Self {
        Self::new()
    }
}

/// The five Aachen canteens whose API entries lack menu data. Both
/// document URLs are spelled out per canteen; the pages do not follow
/// one naming rule.
pub fn aachen_sources() -> Vec<(u32, ScrapedSource)> {
    vec![
        (
            187,
            ScrapedSource::new(
                "https://www.studierendenwerk-aachen.de/speiseplaene/academica-w.html",
                "https://www.studierendenwerk-aachen.de/speiseplaene/academica-oeffnungszeiten.html",
            ),
        ),
        (
            96,
            ScrapedSource::new(
                "https://www.studierendenwerk-aachen.de/speiseplaene/vita-w.html",
                "https://www.studierendenwerk-aachen.de/speiseplaene/vita-oeffnungszeiten.html",
            ),
        ),
        (
            97,
            ScrapedSource::new(
                "https://www.studierendenwerk-aachen.de/speiseplaene/bayernallee-w.html",
                "https://www.studierendenwerk-aachen.de/speiseplaene/bayernallee-oeffnungszeiten.html",
            ),
        ),
        (
            95,
            ScrapedSource::new(
                "https://www.studierendenwerk-aachen.de/speiseplaene/ahornstrasse-w.html",
                "https://www.studierendenwerk-aachen.de/speiseplaene/ahornstrasse-oeffnungszeiten.html",
            ),
        ),
        (
            94,
            ScrapedSource::new(
                "https://www.studierendenwerk-aachen.de/speiseplaene/templergraben-w.html",
                "https://www.studierendenwerk-aachen.de/speiseplaene/templergraben-oeffnungszeiten.html",
            ),
        ),
    ]
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::cache::FileCache;
    use crate::domain::model::{Meal, OpeningHours};
    use chrono::NaiveDate;
    use std::sync::Arc;
    use tempfile::TempDir;

    struct StubMensa {
        id: u32,
        name: &'static str,
    }

    impl Mensa for StubMensa {
        fn id(&self) -> u32 {
            self.id
        }

        fn name(&self) -> &str {
            self.name
        }

        fn city(&self) -> &str {
            "Aachen"
        }

        fn address(&self) -> &str {
            ""
        }

        fn coordinates(&self) -> Option<(f64, f64)> {
            None
        }

        fn meals(&self, _date: NaiveDate) -> Vec<Meal> {
            vec![]
        }

        fn is_open(&self, _date: NaiveDate) -> bool {
            false
        }
    }

    fn registry_with(stubs: &[(u32, &'static str)]) -> (OpenMensa, TempDir) {
        let temp_dir = TempDir::new().expect("failed to create temp directory");
        let cache = MensaCacheManager::with_cache(Arc::new(FileCache::with_dir(temp_dir.path())));
        let mut registry = OpenMensa::with_parts(ApiClient::with_base_url("http://127.0.0.1:9"), cache);
        for &(id, name) in stubs {
            registry.add_mensa(Box::new(StubMensa { id, name }));
        }
        (registry, temp_dir)
    }

    #[test]
    fn lookup_by_id() {
        let (registry, _dir) = registry_with(&[(187, "Mensa Academica"), (96, "Mensa Vita")]);

        assert_eq!(registry.mensa(96).map(Mensa::name), Some("Mensa Vita"));
        assert!(registry.mensa(1).is_none());
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn add_replaces_an_entry_with_the_same_id() {
        let (mut registry, _dir) = registry_with(&[(187, "Mensa Academica")]);

        registry.add_mensa(Box::new(StubMensa {
            id: 187,
            name: "Academica (renamed)",
        }));

        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.mensa(187).map(Mensa::name),
            Some("Academica (renamed)")
        );
    }

    #[test]
    fn search_is_case_insensitive_and_sorted() {
        let (registry, _dir) = registry_with(&[
            (96, "Mensa Vita"),
            (187, "Mensa Academica"),
            (95, "Mensa Ahornstraße"),
            (42, "Bistro Templergraben"),
        ]);

        let hits = registry.search("mensa");

        let names: Vec<_> = hits.iter().map(|m| m.name()).collect();
        assert_eq!(
            names,
            vec!["Mensa Academica", "Mensa Ahornstraße", "Mensa Vita"]
        );
    }

    #[test]
    fn empty_needle_matches_nothing() {
        let (registry, _dir) = registry_with(&[(187, "Mensa Academica")]);

        assert!(registry.search("").is_empty());
    }

    #[test]
    fn default_opening_hours_read_as_closed() {
        let (registry, _dir) = registry_with(&[(187, "Mensa Academica")]);
        let mensa = registry.mensa(187).unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 8, 7).unwrap();

        assert_eq!(mensa.opening_hours(date), OpeningHours::CLOSED);
        assert!(!mensa.has_opening_hours());
    }

    #[test]
    fn aachen_sources_cover_the_known_ids() {
        let sources = aachen_sources();

        let ids: Vec<u32> = sources.iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec![187, 96, 97, 95, 94]);
        for (_, source) in &sources {
            assert!(source.menu_url.starts_with("https://"));
            assert!(source.opening_hours_url.starts_with("https://"));
        }
    }
}
