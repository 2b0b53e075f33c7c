// src/lib.rs

pub mod analyzer;
pub mod capture;
pub mod config;
pub mod controller;
pub mod curve;
pub mod effects;
pub mod graph;
pub mod recorder;
pub mod session;
pub mod visualizer;

pub use config::AppConfig;
pub use curve::{make_distortion_curve, parse_amount};
pub use recorder::Recording;
pub use session::{Controls, Session, SessionState};
