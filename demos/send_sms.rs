use std::process::ExitCode;

use telegraf::{ElksClient, Message};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let from = std::env::var("TG_FROM").unwrap_or_else(|_| "Telegraf".to_owned());
    let to = std::env::var("TG_TO").unwrap_or_else(|_| "+46700000000".to_owned());
    let body =
        std::env::var("TG_MESSAGE").unwrap_or_else(|_| "Hello, upper east side".to_owned());

    let message = match Message::new(from, to, body) {
        Ok(message) => message,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    };

    let client = ElksClient::from_env();
    match client.send(&message).await {
        Ok(response) => {
            println!("Sent message for {}.", response.cost_to_string());
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}
