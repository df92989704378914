mod api;
mod html_menu;
mod opening_hours;

pub use api::{ApiClient, DEFAULT_BASE_URL};
pub use html_menu::MenuScraper;
pub use opening_hours::OpeningHoursScraper;

pub mod err {
    use thiserror::Error;

    #[derive(Debug, Clone, Error)]
    pub enum ScrapeError {
        #[error("menu document has {headings} date headings but {panels} day panels")]
        PanelCountMismatch { headings: usize, panels: usize },

        #[error("no element {tag} with class(es) {:?}", &.cls[..])]
        ElementNotFound { tag: String, cls: Vec<String> },
    }

    impl ScrapeError {
        pub(super) fn element_not_found(tag: &str, cls: &str) -> Self {
            Self::ElementNotFound {
                tag: tag.to_owned(),
                cls: vec![cls.to_owned()],
            }
        }
    }
}
