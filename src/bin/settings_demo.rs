use admitgate::settings::*;

fn main() -> anyhow::Result<()> {
    // Load settings from the default location
    let project_settings = parse_settings(None)?;
    println!("Loaded settings: {:?}", project_settings);
    println!("Client config: {:?}", project_settings.client_config());

    // Attempt to load from an invalid path (expected to fail)
    let is_err = parse_settings(Some("")).is_err();
    println!("Error on invalid path: {:?}", is_err);

    // $ cargo run --bin settings_demo -- --settings=settings/release.toml
    // $ ADMITGATE__API__BASE_URL=http://127.0.0.1:9000 cargo run --bin settings_demo
    let cli = Cli::parse();
    let project_settings = parse_settings(cli.settings.as_deref())?;
    println!("Loaded settings: {:?}", project_settings);
    Ok(())
}
