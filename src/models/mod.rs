//! Core data models for articles and pages.

mod article;
mod page;

pub use article::{
    map_record, Article, FetchedPage, RawRecord, NO_CONTENT, UNKNOWN_AUTHOR, UNKNOWN_DATE,
    UNTITLED,
};
pub use page::{effective_page, PageKey, PageResult, FIRST_PAGE};
