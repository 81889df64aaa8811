use super::Ctx;
use crate::output::{print_json, print_table};
use anyhow::Context;
use runway_core::store;

/// Past seasons. Only the most recent season is kept locally.
pub fn run(ctx: &Ctx) -> anyhow::Result<()> {
    let season = store::load_or_discard(&ctx.store())
        .context("failed to load local progress")?
        .filter(|p| !p.goal.is_empty() && !p.target_date.is_empty());

    if ctx.json {
        let seasons: Vec<serde_json::Value> = season
            .iter()
            .map(|p| {
                serde_json::json!({
                    "season": 1,
                    "campaign_id": p.campaign_id,
                    "goal": p.goal,
                    "target_date": p.target_date,
                    "started_at": p.started_at,
                })
            })
            .collect();
        return print_json(&seasons);
    }

    let Some(p) = season else {
        println!("Archive is empty.");
        return Ok(());
    };
    print_table(
        &["SEASON", "COLLECTION", "TARGET DATE", "CAMPAIGN"],
        vec![vec![
            "1".to_string(),
            format!("The {} Collection", p.goal),
            p.target_date.clone(),
            p.campaign_id.to_string(),
        ]],
    );
    Ok(())
}
