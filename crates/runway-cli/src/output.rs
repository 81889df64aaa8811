use runway_core::dashboard::CampaignView;
use serde::Serialize;

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}

pub fn print_table(headers: &[&str], rows: Vec<Vec<String>>) {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in &rows {
        for (i, cell) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }
    }

    let header_row: Vec<String> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| format!("{:width$}", h, width = widths[i]))
        .collect();
    println!("{}", header_row.join("  ").trim_end());

    let sep: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
    println!("{}", sep.join("  "));

    for row in &rows {
        let cells: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                let w = widths.get(i).copied().unwrap_or(0);
                format!("{:width$}", cell, width = w)
            })
            .collect();
        println!("{}", cells.join("  ").trim_end());
    }
}

pub fn print_no_campaign(json: bool) -> anyhow::Result<()> {
    if json {
        return print_json(&serde_json::json!({ "active": false }));
    }
    println!("No active campaign.");
    println!("Start one with: runway new --goal <goal> --date <YYYY-MM-DD> ...");
    Ok(())
}

/// Human-readable dashboard.
pub fn print_dashboard(view: &CampaignView<'_>) {
    println!("Season 1: The {} Collection", view.goal);
    println!(
        "Progress: {}% ({}/{})   Target: T-{}",
        view.percentage, view.completed_count, view.roadmap_len, view.countdown_days
    );

    match view.silhouette {
        Some(s) => println!(
            "Mannequin ({}%): head {}, body {}",
            view.percentage,
            if s.head { "filled" } else { "outline" },
            if s.body { "filled" } else { "outline" },
        ),
        None => println!("Final look ready. Run: runway finale"),
    }
    if view.finale == runway_core::finale::FinalePhase::Synthesizing {
        println!("Synthesizing final look...");
    }
    if view.awaiting_assets {
        println!("Awaiting assets.");
    }
    println!();

    let rows: Vec<Vec<String>> = view
        .items
        .iter()
        .map(|item| {
            vec![
                item.index.to_string(),
                if item.completed { "[x]" } else { "[ ]" }.to_string(),
                format!("{}%", item.stage.target_percentage),
                if item.revealed { "revealed" } else { "hidden" }.to_string(),
                if item.image_ready { "ready" } else { "processing" }.to_string(),
                item.stage.clothing_item.clone(),
                item.stage.milestone_task.clone(),
            ]
        })
        .collect();
    print_table(
        &["#", "DONE", "AT", "STATE", "IMAGE", "ITEM", "MILESTONE"],
        rows,
    );

    if view.notes.iter().any(|n| !n.is_empty()) {
        println!();
        println!("Notes:");
        for (slot, note) in view.notes.iter().enumerate() {
            if !note.is_empty() {
                println!("  {slot}: {note}");
            }
        }
    }
}
