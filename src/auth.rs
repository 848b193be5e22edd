//! Identifiers, scope lists, and token records shared by flows, credentials, and stores.

pub mod id;
pub mod scope;
pub mod token;

pub use id::*;
pub use scope::*;
pub use token::{record::*, secret::*};
