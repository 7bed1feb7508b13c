//! Ask the in-car assistant a question from the command line.
//!
//! ```sh
//! GEMINI_API_KEY=... cargo run --example drive_assistant -- "Any coffee nearby?" 37.78193 -122.40476
//! ASSISTANT_LOCATION_MODE=maps cargo run --example drive_assistant -- "Any coffee nearby?" 37.78193 -122.40476
//! ```

use display_error_chain::DisplayErrorChain;
use gemini_drive_assistant::{Assistant, GeoLocation};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    match do_main().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let error_chain = DisplayErrorChain::new(e.as_ref());
            eprintln!("{error_chain}");
            ExitCode::FAILURE
        }
    }
}

async fn do_main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let prompt = args
        .next()
        .unwrap_or_else(|| "What's a good place to stop for lunch?".to_string());

    let location = match (args.next(), args.next()) {
        (Some(latitude), Some(longitude)) => {
            Some(GeoLocation::new(latitude.parse()?, longitude.parse()?))
        }
        _ => None,
    };

    let assistant = Assistant::from_env()?;
    println!("Mode: {}", assistant.location_mode());
    println!("Question: {prompt}");
    if let Some(location) = location {
        println!("Location: {}, {}", location.latitude, location.longitude);
    }

    let reply = assistant.generate_response(&prompt, location).await;
    println!("\n{reply}");

    Ok(())
}
