//! Trivia quiz backend: question fetching, the quiz session state machine,
//! and locally persisted attempt history, exposed over a small HTTP/WebSocket API.

pub mod config;
pub mod domain;
pub mod error;
pub mod history;
pub mod manager;
pub mod protocol;
pub mod routes;
pub mod session;
pub mod state;
pub mod storage;
pub mod telemetry;
pub mod trivia;
pub mod util;
