pub mod debounce;
pub mod form_gate;
pub mod request;
pub mod selection;
pub mod server_validity;
pub mod version;
pub mod vocab_form;

pub use crate::domain::model::{Group, Package, Selection, ServerInfo, ValidityStatus};
pub use crate::domain::ports::{Notifier, PackageRepository, ServerInfoSource};
pub use crate::utils::error::Result;
