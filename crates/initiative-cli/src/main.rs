use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use contracts::{CharacterRecord, PlatformEvent, Settings, TokenRecord};
use initiative_api::serve;
use initiative_core::{
    InMemoryStore, InitiativeEngine, TabletopStore, INITIATIVE_BONUS_ATTRIBUTE,
};

fn print_usage() {
    println!("initiative-cli <command>");
    println!("commands:");
    println!("  serve [addr] [sqlite_path] [seed]");
    println!("    default addr: 127.0.0.1:8080");
    println!("  demo [seed] [goblins]");
    println!("    runs an offline grouped initiative pass and prints the queue");
}

fn parse_socket_addr(value: Option<&String>) -> Result<SocketAddr, String> {
    let raw = value.map(String::as_str).unwrap_or("127.0.0.1:8080");
    raw.parse::<SocketAddr>()
        .map_err(|_| format!("invalid addr: {raw}"))
}

fn parse_seed(value: Option<&String>) -> Result<u64, String> {
    let raw = value.map(String::as_str).unwrap_or("1337");
    raw.parse::<u64>().map_err(|_| format!("invalid seed: {raw}"))
}

fn default_sqlite_path() -> String {
    env::var("INITIATIVE_SQLITE_PATH")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| "initiative_campaign.sqlite".to_string())
}

fn parse_sqlite_path(value: Option<&String>) -> PathBuf {
    let raw = value
        .map(String::to_string)
        .filter(|path| !path.trim().is_empty())
        .unwrap_or_else(default_sqlite_path);
    PathBuf::from(raw)
}

fn run_demo(args: &[String]) -> Result<(), String> {
    let seed = parse_seed(args.get(2))?;
    let goblins = args
        .get(3)
        .map(|value| {
            value
                .parse::<usize>()
                .map_err(|_| format!("invalid goblin count: {value}"))
        })
        .transpose()?
        .unwrap_or(5);

    let mut store = InMemoryStore::new(seed);
    store.upsert_character(CharacterRecord {
        character_id: "char_goblin".to_string(),
        name: "Goblin".to_string(),
        controlled_by: Vec::new(),
    });
    store.set_attribute("char_goblin", INITIATIVE_BONUS_ATTRIBUTE, 2);
    store.upsert_character(CharacterRecord {
        character_id: "char_wolf".to_string(),
        name: "Wolf".to_string(),
        controlled_by: Vec::new(),
    });
    store.set_attribute("char_wolf", INITIATIVE_BONUS_ATTRIBUTE, 1);

    for index in 0..goblins {
        store.upsert_token(TokenRecord {
            token_id: format!("tok_goblin_{index}"),
            name: "goblin".to_string(),
            represents: Some("char_goblin".to_string()),
            page_id: "page_1".to_string(),
        });
    }
    store.upsert_token(TokenRecord {
        token_id: "tok_wolf".to_string(),
        name: "wolf".to_string(),
        represents: Some("char_wolf".to_string()),
        page_id: "page_1".to_string(),
    });

    let mut settings = Settings::default();
    settings.enable = true;
    settings.group = true;
    settings.max_per_group = Some(2);

    let mut engine = InitiativeEngine::new();
    engine.handle_event(
        &mut store,
        &mut settings,
        PlatformEvent::TurnOrderVisibility {
            open: true,
            previous_queue: None,
        },
    );

    let queue = store.turn_order().unwrap_or_default();
    println!("turn order ({} entries):", queue.len());
    for entry in &queue {
        println!("  pr={:>3}  {}", entry.pr, entry.id);
    }
    for index in 0..goblins {
        let id = format!("tok_goblin_{index}");
        let markers: Vec<String> = store.marker_set(&id).into_iter().collect();
        if !markers.is_empty() {
            println!("  {} markers: {}", id, markers.join(", "));
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    let command = args.get(1).map(String::as_str);

    match command {
        Some("serve") => {
            let addr = match parse_socket_addr(args.get(2)) {
                Ok(addr) => addr,
                Err(err) => {
                    eprintln!("error: {err}");
                    print_usage();
                    std::process::exit(2);
                }
            };
            let sqlite_path = parse_sqlite_path(args.get(3));
            let seed = match parse_seed(args.get(4)) {
                Ok(seed) => seed,
                Err(err) => {
                    eprintln!("error: {err}");
                    print_usage();
                    std::process::exit(2);
                }
            };
            println!("serving initiative api on http://{addr}");
            if let Err(err) = serve(addr, sqlite_path, seed).await {
                eprintln!("server error: {err}");
                std::process::exit(1);
            }
        }
        Some("demo") => {
            if let Err(err) = run_demo(&args) {
                eprintln!("error: {err}");
                print_usage();
                std::process::exit(2);
            }
        }
        _ => {
            print_usage();
        }
    }
}
