//! A terminal chat client built on the `parley` library.

#[macro_use]
extern crate tracing;

use std::env;
use std::io::Write as _;
use std::pin::pin;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use parley::SessionBuilder;
use parley::core::ERROR_MESSAGE;
use parley_http_transport::{HttpTransport, HttpTransportConfigBuilder};
use parley_model::{RequestConfig, Role, Turn};
use tokio::io::{self, AsyncBufRead, AsyncBufReadExt};
use tokio::select;
use tokio::time::sleep;

const BAR_CHAR: &str = "▎";
const UPLOAD_COMMAND: &str = "/upload";

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut transport_config = match env::var("PARLEY_API_URL") {
        Ok(base_url) => HttpTransportConfigBuilder::with_base_url(base_url),
        Err(_) => HttpTransportConfigBuilder::default(),
    };
    if let Ok(timeout) = env::var("PARLEY_TIMEOUT_SECS") {
        let Ok(secs) = timeout.parse::<u64>() else {
            eprintln!("PARLEY_TIMEOUT_SECS must be a number of seconds");
            return;
        };
        transport_config =
            transport_config.with_timeout(Duration::from_secs(secs));
    }
    if env::var("PARLEY_ALLOW_HTTP").is_ok_and(|v| v == "1") {
        transport_config = transport_config.with_force_https(false);
    }
    let transport = HttpTransport::new(transport_config.build());

    let mut request_config = RequestConfig::default();
    if let Ok(model) = env::var("PARLEY_MODEL") {
        request_config.model = model;
    }
    if let Ok(user_id) = env::var("PARLEY_USER_ID") {
        request_config.user_id = user_id;
    }

    let session = SessionBuilder::with_transport(transport)
        .with_config(request_config)
        .build();
    session.seed_greeting();
    if let Some(greeting) = session.transcript().get(0) {
        print_turn(greeting);
    }

    let progress_style = ProgressStyle::with_template("{spinner} {wide_msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");

    // Buffered bytes past the current line belong to the next ones.
    let mut stdin = io::BufReader::new(io::stdin());

    loop {
        print!("> ");
        std::io::stdout().flush().ok();

        let Some(line) = read_line(&mut stdin).await else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let progress_bar = ProgressBar::new_spinner();
        progress_bar.set_style(progress_style.clone());

        if let Some(path) = line.strip_prefix(UPLOAD_COMMAND) {
            let path = path.trim();
            if path.is_empty() {
                eprintln!("usage: {UPLOAD_COMMAND} <path>");
                continue;
            }
            progress_bar.set_message("📎 Uploading...");
            let result =
                with_spinner(&progress_bar, session.upload_file(path)).await;
            match result {
                Ok(Some(reply)) => {
                    println!("{}File uploaded successfully!", BAR_CHAR.green());
                    print_turn(&reply);
                }
                Ok(None) => {}
                Err(err) => {
                    eprintln!("{}{}", BAR_CHAR.bright_red(), err.bright_red());
                }
            }
            continue;
        }

        session.composer().set_draft(line);
        progress_bar.set_message("🤔 Thinking...");
        match with_spinner(&progress_bar, session.send_draft()).await {
            Ok(Some(reply)) => print_turn(&reply),
            Ok(None) => {}
            Err(err) => {
                debug!("transport error: {err}");
                print_turn(&Turn::system(ERROR_MESSAGE));
            }
        }
    }
}

/// Drives `fut` to completion while ticking the spinner.
async fn with_spinner<F: Future>(progress_bar: &ProgressBar, fut: F) -> F::Output {
    let mut fut = pin!(fut);
    let output = loop {
        progress_bar.inc(1);
        select! {
            output = &mut fut => break output,
            _ = sleep(Duration::from_millis(100)) => {}
        }
    };
    progress_bar.finish_and_clear();
    output
}

fn print_turn(turn: &Turn) {
    match turn.role() {
        Role::Assistant => {
            println!("{}🤖 {}", BAR_CHAR.bright_cyan(), turn.content().bright_white());
        }
        Role::System if turn.content() == ERROR_MESSAGE => {
            println!("{}{}", BAR_CHAR.bright_red(), turn.content().bright_red());
        }
        // The greeting is the only other system turn worth showing.
        Role::System => {
            for line in turn.content().lines() {
                println!("{}{}", BAR_CHAR.bright_yellow(), line.dimmed());
            }
        }
        Role::User => {}
    }
}

async fn read_line<R: AsyncBufRead + Unpin>(input: &mut R) -> Option<String> {
    let mut line = String::new();

    match input.read_line(&mut line).await {
        Ok(0) => None,
        Ok(_) => Some(line),
        Err(err) => {
            error!("error reading input: {}", err);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_read_lines_from_one_reader() {
        let mut input: &[u8] = b"Get METAR for KJFK\n/upload winds.csv\n";
        assert_eq!(
            read_line(&mut input).await.as_deref(),
            Some("Get METAR for KJFK\n")
        );
        assert_eq!(
            read_line(&mut input).await.as_deref(),
            Some("/upload winds.csv\n")
        );
        assert_eq!(read_line(&mut input).await, None);
    }
}
