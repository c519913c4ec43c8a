// Accounts module
// Persistence collaborator and operations on existing accounts

pub mod handlers;
pub mod models;
pub mod repository;
pub mod service;

pub use models::{Account, AccountView};
pub use repository::{AccountStore, InMemoryAccountStore, PgAccountStore};
pub use service::AccountService;
