pub mod app;
pub mod config;
pub mod dashboard;
pub mod explorer;
pub mod input;
pub mod keybinds;
pub mod onboarding;
pub mod route;
pub mod ui;

pub use config::Config;
