//! STAC corpus utilities.
//!
//! Reading and writing the Glozz stand-off annotations of the STAC Settlers
//! of Catan corpus, rule-based annotation of the server's game events,
//! dialogue-act prediction for player turns and EDU splitting.

pub mod config;
pub mod corpus;
pub mod glozz;
pub mod models;
pub mod services;
