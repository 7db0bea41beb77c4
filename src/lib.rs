//! Upload a video, pick a target size, get back an ffmpeg re-encode that
//! approximates it.

pub mod app;
pub mod common;
pub mod config;
pub mod docs;
pub mod infrastructure;
pub mod modules;
pub mod routes;
pub mod state;
pub mod workers;
