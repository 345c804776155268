//! Interactive SVM classification dashboard.
//!
//! The computational core lives in [`analysis`] and works on plain data from
//! [`data`]; [`app`], [`state`] and [`ui`] are the egui front end.

pub mod analysis;
pub mod app;
pub mod classifier;
pub mod color;
pub mod config;
pub mod data;
pub mod error;
pub mod state;
pub mod ui;
