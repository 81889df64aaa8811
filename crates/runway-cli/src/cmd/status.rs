use super::Ctx;
use crate::output::{print_dashboard, print_json, print_no_campaign};
use anyhow::Context;
use chrono::Utc;
use runway_core::campaign::ImageSlot;
use runway_core::dashboard::CampaignView;
use runway_core::session::Event;
use std::path::{Path, PathBuf};

pub fn run(ctx: &Ctx, images: Option<&Path>) -> anyhow::Result<()> {
    let mut session = ctx.open_session()?;
    if session.dashboard().progress().is_none() {
        return print_no_campaign(ctx.json);
    }

    let events = super::runtime()?.block_on(session.load())?;
    if events.contains(&Event::FetchFailed) && !ctx.json {
        eprintln!("warning: could not reach the campaign backend");
    }
    if events.contains(&Event::FinaleFailed) && !ctx.json {
        eprintln!("warning: final look synthesis failed; it will be retried on the next change");
    }

    let Some(view) = session.view(Utc::now()) else {
        return print_no_campaign(ctx.json);
    };
    let saved = match images {
        Some(dir) => save_images(&view, dir)?,
        None => Vec::new(),
    };

    if ctx.json {
        return print_json(&view);
    }
    print_dashboard(&view);
    if let Some(dir) = images {
        println!();
        println!("Saved {} stage image(s) to {}", saved.len(), dir.display());
    }
    Ok(())
}

/// Write each ready stage image as `stage-<index>.<ext>`. Processing slots
/// are skipped.
fn save_images(view: &CampaignView<'_>, dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut saved = Vec::new();
    for item in &view.items {
        let ImageSlot::Ready(image) = item.image else {
            continue;
        };
        let path = dir.join(format!("stage-{}.{}", item.index, crate::image::extension(image)));
        let bytes = crate::image::decode(image)
            .with_context(|| format!("stage {} image", item.index))?;
        runway_core::io::atomic_write(&path, &bytes)
            .with_context(|| format!("failed to write {}", path.display()))?;
        saved.push(path);
    }
    Ok(saved)
}
