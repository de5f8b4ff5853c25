// src/lib.rs

//! Article Metrics Library
//!
//! Enriches a list of encyclopedia articles with readable prose size and
//! editorial quality, then republishes the list as a tabular dataset.

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
