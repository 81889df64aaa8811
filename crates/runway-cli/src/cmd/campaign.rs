use super::Ctx;
use crate::output::print_json;
use anyhow::Context;
use base64::Engine as _;
use runway_core::api::RunwayRequest;
use runway_core::campaign::CampaignId;
use runway_core::store::ProgressStore;
use std::path::{Path, PathBuf};

/// Intake form values for `runway new`.
pub struct Intake {
    pub goal: String,
    pub date: String,
    pub color: String,
    pub designer: String,
    pub vibe: String,
    pub image: PathBuf,
}

pub fn new(ctx: &Ctx, intake: Intake) -> anyhow::Result<()> {
    let image = encode_image(&intake.image)?;
    let mut session = ctx.open_session()?;
    let request = RunwayRequest {
        goal: intake.goal,
        target_date: intake.date,
        vibe: intake.vibe,
        color: intake.color,
        designer: intake.designer,
        inspiration_image_base64: image,
    };

    let rt = super::runtime()?;
    let id = rt
        .block_on(session.create_campaign(request))
        .context("failed to generate runway; is the backend running?")?;
    rt.block_on(session.settle());

    if ctx.json {
        return print_json(&serde_json::json!({
            "campaign_id": id,
            "stages": session.dashboard().campaign().map(|c| c.len()),
        }));
    }
    println!("Created campaign '{id}'.");
    match session.dashboard().campaign() {
        Some(c) => println!("  Roadmap: {} stages", c.len()),
        None => println!("  Roadmap is still generating. Run: runway status"),
    }
    Ok(())
}

pub fn adopt(ctx: &Ctx, campaign_id: &str, goal: &str, date: &str) -> anyhow::Result<()> {
    let id = CampaignId::parse(campaign_id)?;
    let mut session = ctx.open_session()?;
    session
        .start_campaign(id.clone(), goal, date, None)
        .context("failed to save campaign")?;

    if ctx.json {
        return print_json(&serde_json::json!({
            "campaign_id": id,
            "goal": goal,
            "target_date": date,
        }));
    }
    println!("Now tracking campaign '{id}'.");
    Ok(())
}

/// Clears the state document without parsing it, so a corrupt file can
/// always be removed.
pub fn reset(ctx: &Ctx) -> anyhow::Result<()> {
    ctx.store()
        .clear()
        .context("failed to clear local progress")?;
    if ctx.json {
        return print_json(&serde_json::json!({ "reset": true }));
    }
    println!("Cleared the active campaign.");
    Ok(())
}

/// Read an image file as a `data:` URL, the format the backend expects.
fn encode_image(path: &Path) -> anyhow::Result<String> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("failed to read image {}", path.display()))?;
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
    Ok(format!("data:{mime};base64,{encoded}"))
}
