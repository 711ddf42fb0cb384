//! keyplay library
//!
//! Builds printable keycap models by driving OpenSCAD: keycap parameters are
//! resolved from layered profile templates, turned into deterministic
//! compiler invocations and run on a bounded pool of worker threads.

pub mod catalog;
pub mod cli;
pub mod config;
pub mod constants;
pub mod doctor;
pub mod models;
pub mod render;
pub mod resolver;
