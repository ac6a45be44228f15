pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{LogNotifier, VocascanClient};
pub use config::SyncConfig;
pub use core::{
    selection::SelectionSync,
    server_validity::{ServerValidity, ValiditySettings},
    vocab_form::VocabForm,
};
pub use utils::error::{Result, SyncError};
