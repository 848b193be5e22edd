//! Token secrets and the persisted token triple.

pub mod record;
pub mod secret;
