// src/core/mod.rs

pub mod catalog;
pub mod config_store;
pub mod history;
pub mod path_key;
pub mod paths;
pub mod resolver;
pub mod search;
pub mod sequencer;
