//! # Gatewayエンドポイント

pub mod redirect;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use redirect::{handle_get_object, handle_put_object};
