//! Account list management: canonical storage plus legacy-source migration.

mod migration;
mod store;

pub use migration::{merge_accounts, normalize_account};
pub use store::{load_accounts, save_accounts};
