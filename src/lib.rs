//! Scene Narrator: turns a live scene graph into speech for players who
//! cannot see the screen.
//!
//! Resolves a readable label for whatever the cursor is on, reports what
//! is nearby and how to get there, and walks detail screens one section
//! at a time. The host supplies scene access, entity lookups and a speech
//! sink; everything here is synchronous and single-threaded.

pub mod core;
pub mod schema;

pub use crate::core::pipeline::{NarrationSink, Narrator, NarratorBuilder, NarratorError};
