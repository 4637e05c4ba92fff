pub(crate) mod symbol_resolver;

pub use symbol_resolver::{is_crypto, is_foreign_listed, resolve};
