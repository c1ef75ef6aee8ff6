#![allow(missing_docs)]

pub(crate) mod http;
pub(crate) mod pdf;
pub(crate) mod store;

pub(crate) use http::{assert_content_type, get_header};
pub(crate) use pdf::page_texts;
pub(crate) use store::MemoryRecordStore;
