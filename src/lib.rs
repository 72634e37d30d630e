//! Parametric rocket design service: a validated design graph, versioned
//! persistence, mass and stability analysis, and cutting-template export.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod geometry;
pub mod graph;
pub mod models;
pub mod physics;
pub mod service;
pub mod storage;

#[cfg(test)]
mod testing;
