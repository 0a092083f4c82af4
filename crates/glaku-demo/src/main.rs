//! Instanced city demo on top of the glaku context.
//!
//! `Esc` quits, `V` toggles the vignette of the composite pass.

mod app;
mod camera;
mod clock;
mod runtime;
mod scene;
mod shapes;

use anyhow::Result;
use glaku::logging::{init_logging, LoggingConfig};

use crate::runtime::{Runtime, RuntimeConfig};
use crate::scene::CityScene;

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    Runtime::run::<CityScene>(RuntimeConfig {
        title: "glaku city".to_string(),
        ..RuntimeConfig::default()
    })
}
