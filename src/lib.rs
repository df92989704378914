//! Client library for the [OpenMensa](https://openmensa.org) canteen API.
//!
//! Canteens are looked up through an [`OpenMensa`] registry. Most of them
//! are plain wrappers around the JSON API; the Aachen canteens publish
//! their menus only as HTML and are backed by a scraping adapter instead.
//! Both kinds answer the same [`domain::mensa::Mensa`] contract and share
//! one persistent meal-plan cache.
//!
//! All I/O is synchronous and blocking. The crate does not install a
//! logger; embedders wire up their own `log` backend.

#[macro_use]
extern crate lazy_static;

pub mod cache;
pub mod domain;
pub mod registry;

pub use cache::{FileCache, MensaCacheManager};
pub use domain::mensa::{ApiMensa, Mensa, ScrapedMensa, ScrapedSource};
pub use domain::model::{day_key, CanteenInfo, Meal, OpeningHours, Prices, WeeklyOpeningHours};
pub use registry::OpenMensa;
