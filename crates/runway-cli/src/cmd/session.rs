use super::{CliSession, Ctx};
use crate::output::{print_dashboard, print_no_campaign};
use chrono::Utc;
use runway_core::dashboard::ToggleOutcome;
use runway_core::session::Event;
use tokio::io::{AsyncBufReadExt, BufReader};

const HELP: &str = "commands: status | toggle N | note N TEXT | play | refresh | reset | help | quit";

#[derive(Debug, PartialEq, Eq)]
enum Input {
    Status,
    Toggle(usize),
    Note(usize, String),
    Play,
    Refresh,
    Reset,
    Help,
    Quit,
    Empty,
}

fn parse(line: &str) -> Result<Input, String> {
    let line = line.trim();
    let (word, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();
    let index = |s: &str| {
        s.parse::<usize>()
            .map_err(|_| format!("expected a number, got '{s}'"))
    };
    match word {
        "" => Ok(Input::Empty),
        "status" | "s" => Ok(Input::Status),
        "toggle" | "t" => index(rest).map(Input::Toggle),
        "note" | "n" => {
            let (slot, text) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
            Ok(Input::Note(index(slot)?, text.trim().to_string()))
        }
        "play" | "p" => Ok(Input::Play),
        "refresh" | "r" => Ok(Input::Refresh),
        "reset" => Ok(Input::Reset),
        "help" | "?" => Ok(Input::Help),
        "quit" | "q" | "exit" => Ok(Input::Quit),
        other => Err(format!("unknown command '{other}'. {HELP}")),
    }
}

pub fn run(ctx: &Ctx) -> anyhow::Result<()> {
    let mut session = ctx.open_session()?;
    if session.dashboard().progress().is_none() {
        return print_no_campaign(ctx.json);
    }
    super::runtime()?.block_on(event_loop(&mut session))
}

async fn event_loop(session: &mut CliSession) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    session.refresh();
    println!("{HELP}");

    loop {
        tokio::select! {
            Some(event) = session.next_event(), if session.has_pending() => {
                report(session, event);
            }
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match parse(&line) {
                    Ok(Input::Quit) => break,
                    Ok(Input::Reset) => {
                        session.reset()?;
                        println!("Cleared the active campaign.");
                        break;
                    }
                    Ok(input) => handle(session, input),
                    Err(msg) => println!("{msg}"),
                }
            }
        }
    }
    Ok(())
}

fn handle(session: &mut CliSession, input: Input) {
    match input {
        Input::Status => show(session),
        Input::Toggle(index) => match session.toggle(index) {
            Ok(ToggleOutcome::Ignored) => println!("No milestone {index}."),
            Ok(_) => show(session),
            Err(e) => println!("error: {e}"),
        },
        Input::Note(slot, text) => match session.set_note(slot, text) {
            Ok(()) => println!("Saved note {slot}."),
            Err(e) => println!("error: {e}"),
        },
        Input::Play => match session.play_finale() {
            Some(_) => println!("Playing the runway finale."),
            None => println!("The finale is not ready."),
        },
        Input::Refresh => {
            session.refresh();
        }
        Input::Help => println!("{HELP}"),
        Input::Quit | Input::Reset | Input::Empty => {}
    }
}

fn report(session: &CliSession, event: Event) {
    match event {
        Event::CampaignLoaded => show(session),
        Event::FetchFailed => println!("Could not reach the backend; showing last known data."),
        Event::FinaleReady => println!("Final look ready. Type 'play'."),
        Event::FinaleFailed => println!("Final look synthesis failed; change a milestone to retry."),
        Event::Discarded => {}
    }
}

fn show(session: &CliSession) {
    match session.view(Utc::now()) {
        Some(view) => print_dashboard(&view),
        None => println!("No active campaign."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands() {
        assert_eq!(parse("toggle 2"), Ok(Input::Toggle(2)));
        assert_eq!(parse("  t 0 "), Ok(Input::Toggle(0)));
        assert_eq!(
            parse("note 1 call the tailor"),
            Ok(Input::Note(1, "call the tailor".into()))
        );
        assert_eq!(parse("note 3"), Ok(Input::Note(3, String::new())));
        assert_eq!(parse(""), Ok(Input::Empty));
        assert_eq!(parse("q"), Ok(Input::Quit));
        assert_eq!(parse("reset"), Ok(Input::Reset));
    }

    #[test]
    fn rejects_bad_input() {
        assert!(parse("toggle x").is_err());
        assert!(parse("dance").is_err());
    }
}
