use rand::{Rng, SeedableRng, rngs::StdRng};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use solace_core::constants::{DEFAULT_PREFERENCES_FILE, DISPLAYED_TAG_COUNT};
use solace_core::config::{resolve_content_dir, scoring_from_values};
use solace_core::{
    ComfortSession, ContentGate, CoreConfig, FlowState, JsonFileSource, Preferences, Transition,
};

/// One line of user input while a question is on screen or the result is shown.
#[derive(Debug, PartialEq, Eq)]
enum Command {
    Choose(usize),
    Back,
    Forward,
    Result,
    NewVerses,
    Restart,
    Quit,
    Unknown,
}

impl Command {
    fn parse(line: &str) -> Self {
        let line = line.trim();
        if let Ok(n) = line.parse::<usize>() {
            return Command::Choose(n);
        }
        match line.to_ascii_lowercase().as_str() {
            "b" => Command::Back,
            "f" => Command::Forward,
            "r" => Command::Result,
            "n" => Command::NewVerses,
            "s" => Command::Restart,
            "q" | "quit" => Command::Quit,
            _ => Command::Unknown,
        }
    }
}

/// Main entry point for the interactive questionnaire
///
/// # Environment Variables
/// - `SOLACE_CONTENT_DIR`: content directory (default: `data/` found from the working directory)
/// - `SOLACE_PREFERENCES`: preferences file (default: "preferences.yaml")
/// - `SOLACE_COMPACT`: "true" or "1" selects the four-verse variant
/// - `SOLACE_DEFAULT_TAG`: fallback tag (default: "comfort")
/// - `SOLACE_SEED`: seed for reproducible draws
fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("solace=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let content_dir =
        resolve_content_dir(std::env::var_os("SOLACE_CONTENT_DIR").map(PathBuf::from))?;
    let preferences_path = std::env::var_os("SOLACE_PREFERENCES")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_PREFERENCES_FILE));
    let compact = std::env::var("SOLACE_COMPACT")
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false);
    let scoring = scoring_from_values(compact, std::env::var("SOLACE_DEFAULT_TAG").ok())?;
    let config = CoreConfig::new(content_dir, preferences_path, scoring)?;

    tracing::info!("++ Starting Solace with content from {}", config.content_dir().display());

    let prefs = Preferences::load(config.preferences_path())?;

    let mut gate = ContentGate::default();
    let content = gate.load_from(&JsonFileSource::in_dir(config.content_dir()))?;
    let mut session = ComfortSession::new(content, config.scoring().clone());

    let mut rng = match std::env::var("SOLACE_SEED").ok().and_then(|s| s.parse().ok()) {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout().lock();
    print_greeting(&prefs, &mut stdout)?;
    run(&mut session, stdin.lock(), stdout, &mut rng)
}

/// Shows the stored settings that carry over from the other tabs.
fn print_greeting<W: Write>(prefs: &Preferences, out: &mut W) -> anyhow::Result<()> {
    let repeat = if prefs.repeat_mode {
        format!("{} times", prefs.repeat_count)
    } else {
        "off".to_owned()
    };
    writeln!(
        out,
        "Recital collection: {}, repeat: {}",
        prefs.current_collection, repeat
    )?;
    Ok(())
}

/// Drives the session from line-based input until the user quits or input ends.
fn run<R: BufRead, W: Write, G: Rng + ?Sized>(
    session: &mut ComfortSession,
    mut input: R,
    mut out: W,
    rng: &mut G,
) -> anyhow::Result<()> {
    loop {
        if session.state() == &FlowState::Finished {
            writeln!(out, "[n] new verses  [s] start over  [q] quit")?;
        } else if session.current_question().is_none() {
            writeln!(out, "That path has no follow-up question. Starting over.")?;
            session.restart();
            continue;
        } else {
            print_question(session, &mut out)?;
        }
        write!(out, "> ")?;
        out.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Ok(());
        }

        match Command::parse(&line) {
            Command::Quit => return Ok(()),
            Command::Choose(n) => {
                let option_id = session
                    .current_question()
                    .and_then(|q| n.checked_sub(1).and_then(|i| q.options.get(i)))
                    .map(|o| o.id.clone());
                let Some(option_id) = option_id else {
                    writeln!(out, "Choose one of the listed numbers.")?;
                    continue;
                };
                let transition = session.select_option(&option_id, rng)?;
                report(session, transition, &mut out)?;
            }
            Command::Back => {
                if session.state() != &FlowState::Finished {
                    session.go_back()?;
                }
            }
            Command::Forward => {
                if session.state() != &FlowState::Finished {
                    let transition = session.go_next(rng)?;
                    report(session, transition, &mut out)?;
                }
            }
            Command::Result => match session.show_result(rng) {
                Ok(_) => print_result(session, &mut out)?,
                Err(e) => writeln!(out, "{}", e)?,
            },
            Command::NewVerses => {
                if session.new_selection(rng).is_ok() {
                    print_result(session, &mut out)?;
                }
            }
            Command::Restart => session.restart(),
            Command::Unknown => {
                writeln!(out, "Unknown command.")?;
            }
        }
    }
}

fn report<W: Write>(
    session: &ComfortSession,
    transition: Transition,
    out: &mut W,
) -> anyhow::Result<()> {
    match transition {
        Transition::Advanced { .. } => {}
        Transition::Completed => print_result(session, out)?,
        Transition::Reset { step, key } => {
            tracing::warn!(step, ?key, "questionnaire restarted");
            writeln!(out, "That path has no follow-up question. Starting over.")?;
        }
    }
    Ok(())
}

fn print_question<W: Write>(session: &ComfortSession, out: &mut W) -> anyhow::Result<()> {
    let (step, total) = session.progress();
    let Some(question) = session.current_question() else {
        return Ok(());
    };
    writeln!(out)?;
    writeln!(out, "({}/{}) {}", step, total, question.prompt)?;
    let selected = session.selected_option().map(|o| o.id.as_str());
    for (i, option) in question.options.iter().enumerate() {
        let marker = if selected == Some(option.id.as_str()) { "*" } else { " " };
        writeln!(out, " {}{}. {}", marker, i + 1, option.text)?;
    }
    if session.is_last_step() {
        writeln!(out, "[b] back  [r] see verses  [q] quit")?;
    } else {
        writeln!(out, "[b] back  [f] skip  [q] quit")?;
    }
    Ok(())
}

fn print_result<W: Write>(session: &ComfortSession, out: &mut W) -> anyhow::Result<()> {
    let Some(result) = session.recommendation() else {
        return Ok(());
    };
    let content = session.content();

    let feelings: Vec<&str> = result
        .top_tags(DISPLAYED_TAG_COUNT)
        .iter()
        .map(|t| content.describe_tag(t))
        .collect();
    writeln!(out)?;
    writeln!(out, "Tonight's feelings: {}", feelings.join(", "))?;
    writeln!(out)?;
    if result.is_empty() {
        writeln!(out, "No verses found.")?;
    }
    for verse in result.verses() {
        writeln!(out, "{}", verse.reference)?;
        writeln!(out, "  {}", verse.text)?;
    }

    let encouragement = content.encouragement_for(result.primary_tag());
    writeln!(out)?;
    writeln!(out, "{}", encouragement.message)?;
    writeln!(out, "{}", encouragement.closing)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use solace_core::{ComfortContent, ScoringConfig, Tag};
    use std::io::Cursor;
    use std::sync::Arc;

    const CONTENT: &str = r#"{
        "questions": [
            { "id": 1, "question": "How was today?", "options": [
                { "id": "a", "text": "Heavy", "tags": ["sorrow"] },
                { "id": "b", "text": "Fine", "tags": ["joy"] }
            ] },
            { "id": 2, "question": "What do you need?", "options": [
                { "id": "c", "text": "Rest", "tags": ["sorrow"] },
                { "id": "d", "text": "Thanks", "tags": ["joy"] }
            ] }
        ],
        "verses": [
            { "id": 1, "reference": "Psalm 34:18", "text": "Close to the brokenhearted.",
              "tags": ["sorrow", "comfort"] },
            { "id": 2, "reference": "Psalm 118:24", "text": "This is the day.", "tags": ["joy"] }
        ],
        "tagDescriptions": { "sorrow": "Sorrow" },
        "encouragementMessages": {
            "sorrow": { "message": "Tears are seen.", "closing": "Rest well" }
        }
    }"#;

    fn new_session() -> ComfortSession {
        let content = ComfortContent::from_json_str(CONTENT).unwrap();
        let scoring = ScoringConfig::standard(Tag::new("comfort").unwrap());
        ComfortSession::new(Arc::new(content), scoring)
    }

    fn drive(session: &mut ComfortSession, input: &str) -> String {
        let mut out = Vec::new();
        let mut rng = StdRng::seed_from_u64(3);
        run(session, Cursor::new(input), &mut out, &mut rng).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn greeting_reports_stored_settings() {
        let prefs = Preferences {
            current_collection: "wheel-of-gospel".into(),
            repeat_count: 4,
            ..Preferences::default()
        };
        let mut out = Vec::new();
        print_greeting(&prefs, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("wheel-of-gospel"));
        assert!(text.contains("4 times"));

        let prefs = Preferences {
            repeat_mode: false,
            ..Preferences::default()
        };
        let mut out = Vec::new();
        print_greeting(&prefs, &mut out).unwrap();
        assert!(String::from_utf8(out).unwrap().contains("repeat: off"));
    }

    #[test]
    fn parses_commands() {
        assert_eq!(Command::parse(" 2\n"), Command::Choose(2));
        assert_eq!(Command::parse("B"), Command::Back);
        assert_eq!(Command::parse("q"), Command::Quit);
        assert_eq!(Command::parse("x"), Command::Unknown);
    }

    #[test]
    fn answering_every_question_shows_verses() {
        let mut session = new_session();
        let output = drive(&mut session, "1\n1\nq\n");
        assert_eq!(session.state(), &FlowState::Finished);
        assert!(output.contains("Tonight's feelings: Sorrow"));
        assert!(output.contains("Psalm 34:18"));
        assert!(!output.contains("Psalm 118:24"));
        assert!(output.contains("Tears are seen."));
    }

    #[test]
    fn out_of_range_choice_is_rejected_and_input_end_stops() {
        let mut session = new_session();
        let output = drive(&mut session, "9\n");
        assert!(output.contains("Choose one of the listed numbers."));
        assert_eq!(session.step(), Some(0));
    }

    #[test]
    fn back_and_restart_return_to_first_question() {
        let mut session = new_session();
        drive(&mut session, "2\nb\n");
        assert_eq!(session.step(), Some(0));

        let mut session = new_session();
        drive(&mut session, "2\n1\ns\n");
        assert_eq!(session.step(), Some(0));
        assert!(session.recommendation().is_none());
    }

    #[test]
    fn result_before_last_step_is_refused() {
        let mut session = new_session();
        let output = drive(&mut session, "r\n");
        assert_eq!(session.step(), Some(0));
        assert!(output.contains("the result is available from the last question"));
    }
}
