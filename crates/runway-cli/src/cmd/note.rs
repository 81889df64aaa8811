use super::Ctx;
use crate::output::{print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use runway_core::progress::NOTE_SLOTS;
use runway_core::RunwayError;

#[derive(Subcommand)]
pub enum NoteSubcommand {
    /// Set the note in a slot (0-3); an empty text clears it
    Set { slot: usize, text: String },
    /// List all note slots
    List,
}

pub fn run(ctx: &Ctx, subcmd: NoteSubcommand) -> anyhow::Result<()> {
    match subcmd {
        NoteSubcommand::Set { slot, text } => set(ctx, slot, &text),
        NoteSubcommand::List => list(ctx),
    }
}

fn set(ctx: &Ctx, slot: usize, text: &str) -> anyhow::Result<()> {
    let mut session = ctx.open_session()?;
    session
        .set_note(slot, text)
        .with_context(|| format!("failed to set note {slot}"))?;
    if ctx.json {
        return print_json(&serde_json::json!({ "slot": slot, "text": text }));
    }
    println!("Saved note {slot}.");
    Ok(())
}

fn list(ctx: &Ctx) -> anyhow::Result<()> {
    let session = ctx.open_session()?;
    let progress = session
        .dashboard()
        .progress()
        .ok_or(RunwayError::NoActiveCampaign)?;

    if ctx.json {
        return print_json(&progress.notes);
    }
    let rows = (0..NOTE_SLOTS)
        .map(|slot| vec![slot.to_string(), progress.notes[slot].clone()])
        .collect();
    print_table(&["SLOT", "NOTE"], rows);
    Ok(())
}
