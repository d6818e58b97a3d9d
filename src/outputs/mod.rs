//! Publishing the generated article.
//!
//! # Submodules
//!
//! - [`post`]: title extraction, signature enforcement and mutation input assembly
//! - [`hashnode`]: GraphQL client for the Hashnode API and response interpretation

pub mod hashnode;
pub mod post;
