//! Account storage, usage tracking, selection, and refresh modules.

pub mod account;
pub mod logger;
pub mod oauth;
pub mod router;
pub mod selection;
pub mod state_store;
pub mod storage;
pub mod usage;
