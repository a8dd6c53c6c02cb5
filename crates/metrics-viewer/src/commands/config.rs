use mview_core::ViewerConfig;

pub fn show(config: &ViewerConfig) -> anyhow::Result<()> {
    print!("{}", config.to_toml_string()?);
    Ok(())
}
