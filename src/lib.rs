pub mod activity;
pub mod automate;
pub mod backfill;
pub mod cli;
pub mod error;
pub mod git;
pub mod hosting;
pub mod logging;
pub mod model;
pub mod plan;
pub mod templates;
pub mod util;
