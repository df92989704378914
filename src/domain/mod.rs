pub mod fetch;
pub mod mensa;
pub mod model;
