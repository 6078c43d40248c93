use std::borrow::Cow::{self, Borrowed, Owned};
use std::sync::Arc;

use anyhow::Result;
use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};
use wojtek_core::{ChatMessage, ImageSlot, MessageRole, PersonaMode};
use wojtek_infrastructure::JsonFileStore;
use wojtek_infrastructure::storage::json_file_store::RELOAD_INTERVAL;
use wojtek_interaction::{ChatSession, GalleryImage, SpeechController, SpeechOutcome};

use super::context::{AppContext, describe_source};

const COMMANDS: [&str; 4] = ["/story", "/say", "/gallery", "/help"];

/// Completion, highlighting and hints for REPL commands.
struct ChatHelper;

impl Helper for ChatHelper {}

impl Completer for ChatHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line = &line[..pos];
        if !line.starts_with('/') {
            return Ok((0, vec![]));
        }
        let candidates = COMMANDS
            .iter()
            .filter(|cmd| cmd.starts_with(line))
            .map(|cmd| Pair {
                display: cmd.to_string(),
                replacement: cmd.to_string(),
            })
            .collect();
        Ok((0, candidates))
    }
}

impl Highlighter for ChatHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if line.starts_with('/') {
            Owned(line.bright_cyan().to_string())
        } else {
            Borrowed(line)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Hinter for ChatHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let line = &line[..pos];
        if line.starts_with('/') && !line.contains(' ') {
            COMMANDS
                .iter()
                .find(|cmd| cmd.starts_with(line) && cmd.len() > line.len())
                .map(|cmd| cmd[line.len()..].to_string())
        } else {
            None
        }
    }
}

impl Validator for ChatHelper {}

fn print_message(index: usize, message: &ChatMessage, mode: PersonaMode) {
    let header = format!(
        "[{}] {} {}",
        index,
        message.speaker_label(mode),
        message.short_time()
    );
    match message.role {
        MessageRole::User => println!("{}", header.green()),
        MessageRole::Model => {
            println!("{}", header.bright_magenta());
            for line in message.text.lines() {
                println!("{}", line.bright_blue());
            }
        }
    }
}

fn print_help() {
    println!("{}", "/story     przełącz tryb (Demotywacja / Opowieści z Niemiec)".bright_black());
    println!("{}", "/say <n>   Wojtek czyta wiadomość nr n".bright_black());
    println!("{}", "/gallery   pokaż zapisane portrety".bright_black());
    println!("{}", "quit       wyjście".bright_black());
}

/// Speaks message `index` in the background so the prompt stays usable.
fn say(speech: &Arc<SpeechController>, session: &ChatSession, arg: &str) {
    let Ok(index) = arg.trim().parse::<usize>() else {
        println!("{}", "Użycie: /say <numer wiadomości>".yellow());
        return;
    };
    let Some(message) = session.message(index) else {
        println!("{}", format!("Nie ma wiadomości nr {index}").yellow());
        return;
    };

    let speech = Arc::clone(speech);
    let text = message.text.clone();
    tokio::spawn(async move {
        match speech.speak_message(index, &text).await {
            SpeechOutcome::Played | SpeechOutcome::Silent => {}
            SpeechOutcome::AlreadySpeaking => {
                println!("{}", format!("Wiadomość {index} już leci.").bright_black())
            }
            SpeechOutcome::Failed => {
                println!("{}", "Wojtek stracił głos. Szczegóły w logach.".yellow())
            }
        }
    });
}

fn print_portrait(image: &GalleryImage) {
    println!(
        "{} {} {}",
        image.slot.title().bold(),
        format!("[{}]", image.label()).bright_magenta(),
        describe_source(&image.source).bright_black()
    );
}

pub async fn run(story: bool) -> Result<()> {
    let app = AppContext::load().await?;
    let speech = Arc::new(app.speech());
    let gallery = app.gallery().await?;
    // Uploads from other processes show up in the previews
    let reload_task = JsonFileStore::watch(&app.file_store, RELOAD_INTERVAL);
    let preview_task = gallery.watch_storage();
    let mut session = ChatSession::new(Arc::clone(&app.client));
    session.set_mode(PersonaMode::from_story_flag(story));

    let mut rl = Editor::new()?;
    rl.set_helper(Some(ChatHelper));

    println!("{}", "=== Wojtek Germanek ===".bright_magenta().bold());
    println!("{}", session.mode().badge().bright_yellow());
    print_help();
    println!();
    print_portrait(&gallery.avatar());
    print_message(0, &session.messages()[0], session.mode());

    loop {
        match rl.readline(">> ") {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed == "quit" || trimmed == "exit" {
                    println!("{}", "Reset!".bright_green());
                    break;
                }
                if trimmed.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(trimmed);

                if trimmed == "/help" {
                    print_help();
                } else if trimmed == "/story" {
                    let mode = session.toggle_mode();
                    println!("{}", mode.badge().bright_yellow());
                } else if trimmed == "/gallery" {
                    for slot in ImageSlot::ALL {
                        print_portrait(&gallery.current(slot));
                    }
                } else if let Some(arg) = trimmed.strip_prefix("/say") {
                    say(&speech, &session, arg);
                } else if trimmed.starts_with('/') {
                    println!("{}", "Nieznana komenda".bright_black());
                } else {
                    let mode = session.mode();
                    if session.send(trimmed).await.is_some() {
                        let count = session.messages().len();
                        for index in count.saturating_sub(2)..count {
                            print_message(index, &session.messages()[index], mode);
                        }
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C. Wpisz 'quit', żeby wyjść.".yellow());
            }
            Err(ReadlineError::Eof) => {
                println!("{}", "Reset!".bright_green());
                break;
            }
            Err(err) => {
                eprintln!("{}", format!("Error: {err:?}").red());
                break;
            }
        }
    }

    reload_task.abort();
    preview_task.abort();
    Ok(())
}
