use seatline_app::{AppState, BookingSession, Command, Notice};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn print_notices(notices: &[Notice]) {
    for notice in notices {
        println!("{}", notice);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "seatline_app=info,seatline_core=info,seatline_store=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = seatline_store::app_config::Config::load()?;
    tracing::info!("Using booking API at {}", config.api.base_url);

    let state = AppState::from_config(&config).await?;
    let mut session = BookingSession::new(state);

    println!("Seatline booking client. Type 'help' for commands.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if line.trim().is_empty() {
                    continue;
                }
                match line.parse::<Command>() {
                    Ok(Command::Quit) => break,
                    Ok(command) => print_notices(&session.dispatch(command).await),
                    Err(e) => println!("{}", e),
                }
            }
            timer = session.next_timer() => {
                print_notices(&session.handle_timer(timer).await);
            }
        }
    }

    if session.user_id().is_some() {
        print_notices(&session.logout());
    }
    Ok(())
}
