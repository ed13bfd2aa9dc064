use std::time::Duration;

use clap::builder::RangedU64ValueParser;
use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "hexlife-view", about = "Hexagonal viewer for a cellular automaton backend")]
pub struct Config {
    /// Initial window width in logical pixels
    #[arg(long, default_value_t = 1900.)]
    pub width: f64,

    /// Initial window height in logical pixels
    #[arg(long, default_value_t = 1000.)]
    pub height: f64,

    /// Initial half-extent of the camera frustum, in hexagon radii
    #[arg(long, default_value_t = 5., value_parser = positive_f32)]
    pub camera_radius: f32,

    /// Frustum growth per pixel of wheel scroll
    #[arg(long, default_value_t = crate::camera::ZOOM_SPEED, value_parser = positive_f32)]
    pub zoom_speed: f32,

    /// Use the built-in random world feed instead of a backend process
    #[arg(long)]
    pub demo: bool,

    /// Grid size served by the demo feed
    #[arg(long, default_value_t = 32, value_parser = RangedU64ValueParser::<usize>::new().range(1..))]
    pub demo_width: usize,

    /// Milliseconds between demo worlds
    #[arg(long, default_value_t = 500, value_parser = clap::value_parser!(u64).range(1..))]
    pub tick_ms: u64,

    /// Backend program and its arguments
    #[arg(
        value_name = "BACKEND",
        trailing_var_arg = true,
        allow_hyphen_values = true,
        required_unless_present = "demo"
    )]
    pub backend: Vec<String>,
}

impl Config {
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}

fn positive_f32(value: &str) -> Result<f32, String> {
    let parsed: f32 = value.parse().map_err(|err| format!("{err}"))?;
    if parsed.is_finite() && parsed > 0. {
        Ok(parsed)
    } else {
        Err(format!("{value} is not a positive number"))
    }
}
