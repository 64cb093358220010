// src/lib.rs
pub mod config;
pub mod error;

pub mod io {
    pub mod columns;
    pub mod loader;
    pub mod mha;
    pub mod root;
    pub mod sqlite;
}

pub mod pipeline;
