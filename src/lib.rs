//! Backend library for the knowledge-telephone game.
//!
//! A piece of fictional knowledge is read by a player, explained to a
//! learner agent against the clock, and reconstituted by a generative model
//! into a mutated child entry. The lineage forms a browsable genealogy
//! forest rooted at five fixed seeds.
//!
//! Layering, leaves first: `db` persists Knowledge in SQLite; `genealogy`,
//! `orphans`, and `layout` are pure functions over an in-memory snapshot;
//! `seeds` holds the bootstrap entries; `ai_client` talks to the model;
//! `settings` is the JSON config file. The HTTP API and the maintenance CLI
//! live in `src/bin/`.

pub mod ai_client;
pub mod db;
pub mod genealogy;
pub mod layout;
pub mod orphans;
pub mod seeds;
pub mod settings;
