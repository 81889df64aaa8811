use super::Ctx;
use crate::output::print_json;
use anyhow::Context;
use runway_core::dashboard::ToggleOutcome;
use runway_core::RunwayError;

pub fn run(ctx: &Ctx, index: usize) -> anyhow::Result<()> {
    let mut session = ctx.open_session()?;
    if session.dashboard().progress().is_none() {
        return Err(RunwayError::NoActiveCampaign.into());
    }

    // apply the fetch only; a final-look request it starts is aborted if
    // the toggle drops progress below 100
    let rt = super::runtime()?;
    rt.block_on(session.fetch())?;
    let outcome = session
        .toggle(index)
        .with_context(|| format!("failed to toggle milestone {index}"))?;
    let events = rt.block_on(session.settle());

    let dashboard = session.dashboard();
    let percentage = dashboard.percentage();
    let finale = dashboard.finale().phase();

    if ctx.json {
        return print_json(&serde_json::json!({
            "index": index,
            "outcome": outcome,
            "percentage": percentage,
            "finale": finale,
            "events": events.iter().map(|e| format!("{e:?}")).collect::<Vec<_>>(),
        }));
    }

    match outcome {
        ToggleOutcome::Marked => println!("Marked milestone {index} complete. Progress: {percentage}%"),
        ToggleOutcome::Unmarked => println!("Unmarked milestone {index}. Progress: {percentage}%"),
        ToggleOutcome::Ignored => println!("No milestone {index}; nothing changed."),
    }
    if session.play_finale().is_some() {
        println!("Final look ready. Run: runway finale");
    }
    Ok(())
}
