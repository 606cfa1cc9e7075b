//! Interactive terminal chat against a running agent service.
//!
//! Each line is posted to `/api/agent`, then the newest message of the
//! session is fetched and rendered as markdown. Entry point:
//! `loop_runner::run_chat`.

pub mod banner;
pub mod commands;
pub mod input;
pub mod loop_runner;
pub mod renderer;
