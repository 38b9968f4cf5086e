//! podshelf: register podcast feeds by link and browse their latest episodes.

pub mod config;
pub mod feed;
pub mod ingest;
pub mod storage;
pub mod util;
pub mod web;
