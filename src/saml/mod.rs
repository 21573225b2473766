//! SAML Service Provider configuration.
//!
//! This module turns stored SP settings into the configuration document the
//! SAML toolkit loads. It handles:
//! - SAML identifiers (NameID formats, bindings)
//! - The document types, with the toolkit's exact key names
//! - Assembly of a document from [`SpSettings`](crate::models::SpSettings)
//! - Loading the document into an [`SpConfig`]

mod assemble;
mod constants;
mod document;
mod sp_config;

pub use assemble::{AssemblyContext, assemble};
pub use constants::*;
pub use document::*;
pub use sp_config::SpConfig;
