use serde::Deserialize;

use crate::domain::model::{CanteenInfo, Meal};

pub const DEFAULT_BASE_URL: &str = "https://openmensa.org/api/v2";

/// Thin blocking client for the OpenMensa JSON endpoints.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::blocking::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct DayInfo {
    closed: bool,
}

impl ApiClient {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::blocking::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::blocking::Client, base_url: impl Into<String>) -> Self {
        Self {
            http: client,
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// One page of the canteen list. An empty page ends the pagination.
    pub fn canteens_page(&self, page: u32) -> anyhow::Result<Vec<CanteenInfo>> {
        let url = format!("{}/canteens/?page={}", self.base_url, page);
        Ok(self.http.get(url).send()?.error_for_status()?.json()?)
    }

    pub fn canteen(&self, id: u32) -> anyhow::Result<CanteenInfo> {
        let url = format!("{}/canteens/{}", self.base_url, id);
        Ok(self.http.get(url).send()?.error_for_status()?.json()?)
    }

    /// Meals served by canteen `id` on the given Day Key.
    pub fn meals(&self, id: u32, day: &str) -> anyhow::Result<Vec<Meal>> {
        let url = format!("{}/canteens/{}/days/{}/meals/", self.base_url, id, day);
        Ok(self.http.get(url).send()?.error_for_status()?.json()?)
    }

    /// Whether canteen `id` is open on the given Day Key.
    pub fn is_open(&self, id: u32, day: &str) -> anyhow::Result<bool> {
        let url = format!("{}/canteens/{}/days/{}/", self.base_url, id, day);
        let day: DayInfo = self.http.get(url).send()?.error_for_status()?.json()?;
        Ok(!day.closed)
    }
}

impl Default for ApiClient {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn day_info_reads_the_closed_flag() {
        let day: DayInfo = serde_json::from_str(r#"{"date": "2024-08-07", "closed": true}"#).unwrap();
        assert!(day.closed);
    }
}
