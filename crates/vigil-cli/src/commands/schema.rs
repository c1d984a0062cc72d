//! Schema command - print a built-in validation schema.

use vigil::ValidationConfig;

pub fn run(preset: String) -> Result<(), Box<dyn std::error::Error>> {
    let config = ValidationConfig::preset(&preset).ok_or_else(|| {
        format!(
            "Unknown schema preset: {}. Use features_daily or weekly_sessions.",
            preset
        )
    })?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}
