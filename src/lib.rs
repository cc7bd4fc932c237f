//! elevan - turn a source link into a course with lessons and a quiz.
//!
//! The binary is a terminal front-end over the course backend. The library
//! holds everything it is built from so the integration tests can drive the
//! app without a terminal.

pub mod api;
pub mod app;
pub mod auth;
pub mod config;
pub mod debounce;
pub mod logging;
pub mod routes;
pub mod screens;
pub mod tasks;
pub mod ui;
pub mod workflow;
