//! newsroom: search, browse, save and archive NewsAPI articles.
//!
//! The store ([`storage`]) and API client ([`api`]) are driven through the
//! view-models in [`viewmodel`]; the `newsroom` binary is a thin CLI on top.

pub mod api;
pub mod config;
pub mod settings;
pub mod storage;
pub mod util;
pub mod viewmodel;
