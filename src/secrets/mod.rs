mod store;

pub use store::{resolve_credentials, CredentialStore};
