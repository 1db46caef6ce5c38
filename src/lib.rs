pub mod api;
pub mod auth;
pub mod config;
pub mod debounce;
pub mod download;
pub mod error;
pub mod i18n;
pub mod models;
pub mod modules;
pub mod resource;
pub mod shell;
pub mod state;
pub mod storage;
pub mod ui;

pub use error::AppError;
pub use shell::{App, ModuleName};
pub use state::AppState;
