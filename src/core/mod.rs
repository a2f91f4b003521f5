//! Record store, index generation and root lifecycle.
//!
//! Layering, bottom up: `record` and `codec` describe a record and its
//! on-disk forms; `resolver` and `record_store` read and write collections;
//! `dex` and `refresh` derive index records; `backup`, `assets` and
//! `lifecycle` create and upgrade a root.

pub mod assets;
pub mod backup;
pub mod codec;
pub mod config;
pub mod dex;
pub mod error;
pub mod lifecycle;
pub mod probe;
pub mod record;
pub mod record_store;
pub mod refresh;
pub mod report;
pub mod resolver;
pub mod stage;
pub mod time;
pub mod tui;
pub mod validate;
