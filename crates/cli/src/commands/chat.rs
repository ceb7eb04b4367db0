//! `autochat chat` — Interactive or single-message chat mode.

use std::io::Write;
use std::num::NonZeroUsize;
use std::path::PathBuf;

use autochat_agent::prompts::{self, ContentType};
use autochat_config::AppConfig;
use autochat_core::conversation::Conversation;
use autochat_core::message::Role;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

pub struct ChatArgs {
    pub message: Option<String>,
    pub content_type: ContentType,
    pub prompt: Option<String>,
    pub documents: Vec<PathBuf>,
    pub temperature: Option<f32>,
    pub history_len: Option<NonZeroUsize>,
}

/// What a line typed at the prompt asks for.
#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Exit,
    Clear,
    History,
    Empty,
    Message(&'a str),
}

fn classify(line: &str) -> Input<'_> {
    match line.trim() {
        "" => Input::Empty,
        "exit" | "quit" => Input::Exit,
        "/clear" => Input::Clear,
        "/history" => Input::History,
        text => Input::Message(text),
    }
}

/// The system prompt for a chat session.
fn system_prompt(
    content_type: ContentType,
    prompt: Option<&str>,
    documents: &[String],
) -> String {
    let mut extension = String::new();
    if let Some(prompt) = prompt {
        extension.push('\n');
        extension.push_str(prompt);
    }
    extension.push_str(&prompts::document_extension(documents));
    prompts::system_prompt(content_type, &extension)
        .trim_start()
        .to_string()
}

fn read_documents(paths: &[PathBuf]) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    paths
        .iter()
        .map(|path| {
            std::fs::read_to_string(path)
                .map_err(|e| -> Box<dyn std::error::Error> {
                    format!("Failed to read document {}: {e}", path.display()).into()
                })
        })
        .collect()
}

pub async fn run(config: &AppConfig, args: ChatArgs) -> Result<(), Box<dyn std::error::Error>> {
    let provider = super::provider(config)?;
    let documents = read_documents(&args.documents)?;
    let temperature = args.temperature.unwrap_or(config.default_temperature);
    let history_len = args.history_len.unwrap_or(config.history_len);

    let mut conversation = super::conversation(config, provider).with_system_prompt(system_prompt(
        args.content_type,
        args.prompt.as_deref(),
        &documents,
    ));

    info!(
        content_type = %args.content_type,
        documents = documents.len(),
        temperature,
        history_len = history_len.get(),
        "Chat session started"
    );

    if let Some(message) = args.message {
        eprint!("  Thinking...");
        let reply = conversation
            .send(Role::User, message, temperature, history_len)
            .await;
        eprint!("\r              \r");
        println!("{}", reply?);
        return Ok(());
    }

    println!();
    println!("  autochat — interactive mode");
    println!();
    println!("  Model:         {}", conversation.model());
    println!("  Content type:  {}", args.content_type);
    println!("  Documents:     {}", documents.len());
    println!();
    println!("  Type your message and press Enter.");
    println!("  /clear resets the conversation, /history shows its size.");
    println!("  Type 'exit' or Ctrl+C to quit.");
    println!();

    repl(&mut conversation, temperature, history_len).await?;

    println!();
    println!("  Goodbye!");
    println!();
    Ok(())
}

async fn repl(
    conversation: &mut Conversation,
    temperature: f32,
    history_len: NonZeroUsize,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    print!("  You > ");
    std::io::stdout().flush()?;

    while let Some(line) = lines.next_line().await? {
        match classify(&line) {
            Input::Exit => break,
            Input::Empty => {}
            Input::Clear => {
                conversation.reset();
                println!("  (conversation cleared)");
            }
            Input::History => {
                let transcript = conversation.transcript();
                println!(
                    "  {} messages (~{} tokens), {} sent per request",
                    transcript.len(),
                    transcript.estimated_tokens(),
                    history_len.get().min(transcript.len())
                );
            }
            Input::Message(text) => {
                eprint!("  ...");
                match conversation
                    .send(Role::User, text, temperature, history_len)
                    .await
                {
                    Ok(reply) => {
                        eprint!("\r     \r");
                        println!();
                        for line in reply.lines() {
                            println!("  Assistant > {line}");
                        }
                        println!();
                    }
                    Err(e) => {
                        eprint!("\r     \r");
                        eprintln!("  [Error] {e}");
                        println!();
                    }
                }
            }
        }

        print!("  You > ");
        std::io::stdout().flush()?;
    }

    Ok(())
}
