use std::path::Path;

use anyhow::Result;
use colored::Colorize;
use wojtek_core::{ChatMessage, PersonaMode};
use wojtek_interaction::{ERROR_REPLY, SpeechOutcome};

use super::context::{AppContext, describe_source, write_data_uri};

pub async fn ask(text: &str, story: bool) -> Result<()> {
    let app = AppContext::load().await?;
    let mode = PersonaMode::from_story_flag(story);

    let reply = match app.client.generate_response(text, mode).await {
        Ok(reply) => reply,
        Err(e) => {
            tracing::error!("[Wojtek] Text completion failed: {}", e);
            ERROR_REPLY.to_string()
        }
    };

    let message = ChatMessage::model(reply);
    println!("{}", format!("[{}]", message.speaker_label(mode)).bright_magenta());
    for line in message.text.lines() {
        println!("{}", line.bright_blue());
    }
    Ok(())
}

pub async fn speak(text: &str) -> Result<()> {
    let app = AppContext::load().await?;
    match app.speech().speak(text).await {
        SpeechOutcome::Played => {}
        SpeechOutcome::Silent => {
            println!("{}", "Wojtek milczy (brak klucza API albo dźwięku).".bright_black())
        }
        SpeechOutcome::AlreadySpeaking | SpeechOutcome::Failed => {
            println!("{}", "Wojtek stracił głos. Szczegóły w logach.".yellow())
        }
    }
    Ok(())
}

pub async fn imagine(prompt: &str, out: Option<&Path>) -> Result<()> {
    let app = AppContext::load().await?;
    let uri = app.client.generate_image(prompt).await?;

    match out {
        Some(path) => {
            write_data_uri(&uri, path)?;
            println!("{}", format!("Wizja zapisana w {}", path.display()).green());
        }
        None => {
            println!("{}", format!("Wizja gotowa: {}", describe_source(uri.as_str())).green());
            println!("{}", "Użyj --out <plik>, żeby ją zapisać.".bright_black());
        }
    }
    Ok(())
}
