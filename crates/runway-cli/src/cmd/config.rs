use super::Ctx;
use crate::output::print_json;
use clap::Subcommand;
use runway_core::config::WarnLevel;

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Show the effective configuration
    Show,
    /// Validate the config for common mistakes
    Validate,
}

pub fn run(ctx: &Ctx, subcmd: ConfigSubcommand) -> anyhow::Result<()> {
    match subcmd {
        ConfigSubcommand::Show => show(ctx),
        ConfigSubcommand::Validate => validate(ctx),
    }
}

fn show(ctx: &Ctx) -> anyhow::Result<()> {
    let config = ctx.config()?;
    if ctx.json {
        return print_json(&serde_json::json!({
            "root": ctx.root,
            "api_url": config.api_url,
            "timeout_secs": config.timeout_secs,
        }));
    }
    println!("root:         {}", ctx.root.display());
    println!("api_url:      {}", config.api_url);
    println!("timeout_secs: {}", config.timeout_secs);
    Ok(())
}

fn validate(ctx: &Ctx) -> anyhow::Result<()> {
    let config = ctx.config()?;
    let warnings = config.validate();

    if ctx.json {
        print_json(&serde_json::json!({ "warnings": warnings }))?;
    } else if warnings.is_empty() {
        println!("Config is valid. No warnings.");
    } else {
        for w in &warnings {
            let prefix = match w.level {
                WarnLevel::Warning => "warning",
                WarnLevel::Error => "error",
            };
            println!("[{prefix}] {}", w.message);
        }
    }

    if warnings.iter().any(|w| w.level == WarnLevel::Error) {
        anyhow::bail!("config validation found errors");
    }
    Ok(())
}
