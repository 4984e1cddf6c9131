//! Console quiz player.
//!
//! Usage:
//!   console-player                      — list open sessions and exit
//!   console-player <CODE> <NAME>        — join a session and play
//!
//! Answer questions by typing the option number; `quit` leaves.
//! The backend base URL comes from `QUIZLINK_API_URL` (default
//! `http://localhost:8000`), the socket URL from `QUIZLINK_WS_URL` or
//! scheme-swap derivation.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};

use quizlink::prelude::*;

/// The question currently on screen, if any.
#[derive(Default)]
struct Screen {
    question_id: Option<String>,
    option_count: usize,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let api = ApiClient::new()?;

    let (code, name) = match args.as_slice() {
        [code, name] => (code.clone(), name.clone()),
        [] => return list_sessions(api).await,
        _ => {
            eprintln!("usage: console-player [<SESSION_CODE> <NAME>]");
            std::process::exit(2);
        }
    };

    // -- Join over REST, remember who we are -----------------------------

    let joined = api.join_session(&code, &name).await?;
    println!("joined {code} as {} ({})", joined.display_name, joined.player_id);

    let store = SessionStore::new(MemoryStorage::new());
    store.save(
        PlayerIdentity {
            player_id: joined.player_id.clone(),
            display_name: joined.display_name.clone(),
            session_code: code.clone(),
            team: joined.team.clone(),
        },
        joined.player_token.clone(),
    )?;

    // -- Open the socket -------------------------------------------------

    let screen = Arc::new(Mutex::new(Screen::default()));
    let dispatcher = build_dispatcher(Arc::clone(&screen));

    let connection = ConnectionBuilder::new(&code, Role::Player)
        .credentials(Credentials::Player {
            player_id: joined.player_id,
            player_token: joined.player_token,
        })
        .on_message(move |msg| {
            dispatcher.dispatch(&msg);
        })
        .on_status(|status| println!("[{status}]"))
        .on_exhausted(|| {
            println!("connection lost for good — restart to rejoin");
        })
        .open()?;

    // -- Drive answers from stdin ----------------------------------------

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim().to_string();
        if line == "quit" {
            break;
        }
        let Ok(choice) = line.parse::<u32>() else {
            println!("type an option number, or `quit`");
            continue;
        };

        let current = {
            let screen = screen.lock().expect("screen lock");
            match &screen.question_id {
                Some(id) if (choice as usize) < screen.option_count => {
                    Some(id.clone())
                }
                Some(_) => None,
                None => None,
            }
        };
        match current {
            Some(question_id) => connection.send(ClientCommand::SubmitAnswer {
                question_id,
                option_index: choice,
            }),
            None => println!("no open question for that answer"),
        }
    }

    connection.close();
    store.clear();
    Ok(())
}

/// No arguments: show what can be joined, through the fetch cache so a
/// quick re-run within the TTL window costs no request.
async fn list_sessions(
    api: ApiClient,
) -> Result<(), Box<dyn std::error::Error>> {
    let api = Arc::new(api);
    let cache = FetchCache::new();
    let sessions = cache
        .run(Some("sessions"), Some(Duration::from_secs(30)), move || {
            let api = Arc::clone(&api);
            async move {
                api.list_sessions().await.map_err(|e| e.to_string())
            }
        })
        .await?;

    if sessions.is_empty() {
        println!("no open sessions");
    } else {
        for session in sessions.iter() {
            println!(
                "{}  {}  ({} players)",
                session.code,
                session.name,
                session.player_count.unwrap_or(0)
            );
        }
    }
    Ok(())
}

fn build_dispatcher(screen: Arc<Mutex<Screen>>) -> Dispatcher {
    let on_question = {
        let screen = Arc::clone(&screen);
        move |msg: &RawMessage| {
            let Some(PlayerEvent::Question {
                question_id,
                text,
                options,
                time_limit_secs,
                ..
            }) = PlayerEvent::from_raw(msg)
            else {
                return;
            };
            println!("\n{text}  ({time_limit_secs}s)");
            for (i, option) in options.iter().enumerate() {
                println!("  {i}) {option}");
            }
            let mut screen = screen.lock().expect("screen lock");
            screen.question_id = Some(question_id);
            screen.option_count = options.len();
        }
    };

    let on_result = {
        let screen = Arc::clone(&screen);
        move |msg: &RawMessage| {
            let Some(PlayerEvent::AnswerResult {
                correct,
                points_awarded,
                ..
            }) = PlayerEvent::from_raw(msg)
            else {
                return;
            };
            let points = points_awarded.unwrap_or(0);
            println!(
                "{} (+{points})",
                if correct { "correct!" } else { "wrong" }
            );
            screen.lock().expect("screen lock").question_id = None;
        }
    };

    Dispatcher::new()
        .on(tags::QUESTION, on_question)
        .on(tags::ANSWER_RESULT, on_result)
        .on(tags::GAME_INTRO, |msg: &RawMessage| {
            if let Some(PlayerEvent::GameIntro { game_name, round }) =
                PlayerEvent::from_raw(msg)
            {
                println!("\n=== round {round}: {game_name} ===");
            }
        })
        .on(tags::ROUND_RESULTS, |msg: &RawMessage| {
            let Some(PlayerEvent::RoundResults {
                round,
                your_score,
                standings,
            }) = PlayerEvent::from_raw(msg)
            else {
                return;
            };
            println!("\n--- round {round} results ---");
            if let Some(score) = your_score {
                println!("your score: {score}");
            }
            for standing in &standings {
                println!("  {}  {}", standing.team, standing.score);
            }
        })
        .on(tags::SESSION_ENDED, |msg: &RawMessage| {
            let reason = msg
                .property("reason")
                .and_then(|v| v.as_str())
                .unwrap_or("session over");
            println!("\n{reason}");
        })
}
