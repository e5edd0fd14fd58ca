//! Domain services used by websocket and HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! Service modules own business logic and persistence concerns so route
//! handlers can stay focused on protocol translation and transport
//! plumbing.

pub mod coach;
pub mod history;
pub mod maintenance;
pub mod profile;
pub mod responder;
