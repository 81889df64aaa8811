use super::Ctx;
use crate::output::{print_json, print_no_campaign};
use anyhow::Context;
use runway_core::finale::FinalePhase;
use std::path::Path;

pub fn run(ctx: &Ctx, out: Option<&Path>) -> anyhow::Result<()> {
    let mut session = ctx.open_session()?;
    if session.dashboard().progress().is_none() {
        return print_no_campaign(ctx.json);
    }
    super::runtime()?.block_on(super::load(&mut session))?;

    let dashboard = session.dashboard();
    let percentage = dashboard.percentage();
    let phase = dashboard.finale().phase();

    let Some(image) = session.play_finale() else {
        if ctx.json {
            return print_json(&serde_json::json!({
                "phase": phase,
                "percentage": percentage,
                "ready": false,
            }));
        }
        if percentage < 100 {
            println!("The finale unlocks at 100%. Current progress: {percentage}%");
        } else {
            println!("Final look is not ready yet ({phase}). Try again shortly.");
        }
        return Ok(());
    };

    if let Some(path) = out {
        let bytes = crate::image::decode(image)?;
        runway_core::io::atomic_write(path, &bytes)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }

    if ctx.json {
        return print_json(&serde_json::json!({
            "phase": FinalePhase::Ready,
            "percentage": percentage,
            "ready": true,
            "written_to": out.map(|p| p.display().to_string()),
        }));
    }
    println!("Runway finale: the final look is ready.");
    if let Some(path) = out {
        println!("  Saved to {}", path.display());
    }
    Ok(())
}
