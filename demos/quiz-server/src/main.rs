//! A runnable quiz server with a couple of built-in collections.
//!
//! ```text
//! cargo run -p quiz-server
//! ```
//!
//! Then point any WebSocket client at ws://127.0.0.1:8080 and send
//! `{"type":"create_room","player_token":"me","player_name":"Me"}`.

use trivium::{TriviumError, TriviumServerBuilder};
use trivium_content::{Question, StaticContent};
use trivium_room::RoomConfig;

fn q(text: &str, options: [&str; 4], correct_index: usize) -> Question {
    Question {
        text: text.into(),
        options: options.map(String::from).to_vec(),
        correct_index,
    }
}

fn demo_content() -> StaticContent {
    StaticContent::new()
        .with_collection(
            "geography",
            vec![
                q("Capital of France?", ["Paris", "Lyon", "Nice", "Lille"], 0),
                q("Longest river?", ["Amazon", "Nile", "Yangtze", "Danube"], 1),
                q("Largest desert?", ["Gobi", "Sahara", "Antarctic", "Kalahari"], 2),
            ],
        )
        .with_collection(
            "rust",
            vec![
                q("Who owns a value after a move?", ["Both", "Neither", "The source", "The destination"], 3),
                q("Which keyword borrows mutably?", ["&mut", "ref", "mov", "mut&"], 0),
            ],
        )
}

#[tokio::main]
async fn main() -> Result<(), TriviumError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let bind = std::env::var("TRIVIUM_BIND").unwrap_or_else(|_| "127.0.0.1:8080".into());

    let server = TriviumServerBuilder::new()
        .bind(&bind)
        .room_config(RoomConfig::default())
        .build(demo_content())
        .await?;

    if let Ok(addr) = server.local_addr() {
        tracing::info!(%addr, "quiz server listening");
    }
    server.run().await
}
