//! Settings come from a TOML file (`settings/dev.toml` in debug builds),
//! overridable through `ADMITGATE__SECTION__KEY` environment variables.
//! See `bin/settings_demo.rs` for a quick manual check.

mod cli;
pub use clap::Parser;
pub use cli::*;

mod settings;
pub use settings::*;
