//! Parsers and fetchers for the start page's data files.

pub mod backgrounds;
pub mod bookmarks;
pub mod feed;
pub mod fetch;
pub mod fragments;
pub mod links;
pub mod markup;
pub mod opml;
