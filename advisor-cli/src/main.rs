use advisor_core::chat::{Role, Transcript};
use advisor_core::config::AdvisorConfig;
use advisor_engine::controller::{ChatController, TurnOutcome};
use advisor_engine::hosted::HostedAssistant;
use advisor_providers::{files, parse, runtime};
use serde_json::json;
use std::io::Write as _;
use std::sync::Arc;
use tokio::io::AsyncBufReadExt;

fn print_welcome(cfg: &AdvisorConfig) {
    if !cfg.welcome_blurb.is_empty() {
        println!("{}\n", cfg.welcome_blurb);
    }
    if let Some(url) = &cfg.welcome_audio_url {
        println!("(welcome audio: {url})\n");
    }
    if !cfg.starters.is_empty() {
        println!("Try one of these to get started:");
        for (i, starter) in cfg.starters.iter().enumerate() {
            println!("  {}. {}", i + 1, starter);
        }
        println!();
    }
}

/// While the transcript is still empty, a bare number picks a starter prompt;
/// it is then submitted exactly as if typed.
fn resolve_input<'a>(line: &'a str, starters: &'a [String], transcript_empty: bool) -> &'a str {
    if transcript_empty {
        if let Ok(n) = line.trim().parse::<usize>() {
            if (1..=starters.len()).contains(&n) {
                return &starters[n - 1];
            }
        }
    }
    line
}

const TYPING: &str = "advisor is typing…";

fn show_typing() {
    print!("{TYPING}");
    let _ = std::io::stdout().flush();
}

/// Tracks how much of the open assistant entry has been printed, so each
/// hook call emits only the newly streamed tail. The typing indicator is
/// replaced by the reply prefix when the first token lands.
#[derive(Default)]
struct Renderer {
    entry: usize,
    printed: usize,
    cleared: bool,
}

impl Renderer {
    fn print_progress(&mut self, transcript: &Transcript) {
        let Some(last) = transcript.last() else { return };
        if last.role != Role::Assistant {
            return;
        }

        if !self.cleared {
            print!("\r{:width$}\r", "", width = TYPING.len());
            print!("advisor> ");
            self.cleared = true;
        }

        let idx = transcript.len() - 1;
        if idx != self.entry {
            self.entry = idx;
            self.printed = 0;
        }
        if self.printed < last.text.len() {
            print!("{}", &last.text[self.printed..]);
            self.printed = last.text.len();
            let _ = std::io::stdout().flush();
        }
    }
}

enum UserAction<'a> {
    Text(&'a str),
    File(&'a str),
}

async fn run_turn(ctl: &mut ChatController, action: UserAction<'_>) {
    show_typing();

    let mut renderer = Renderer::default();
    let mut result = match action {
        UserAction::Text(text) => {
            ctl.submit_text_with_hook(text, |t| renderer.print_progress(t))
                .await
        }
        UserAction::File(file_id) => {
            ctl.submit_file_with_hook(file_id, |t| renderer.print_progress(t))
                .await
        }
    };

    loop {
        match result {
            Ok(TurnOutcome::Completed) => {
                println!();
                return;
            }
            Ok(TurnOutcome::AwaitingToolOutputs { run_id, tool_calls }) => {
                // There is no local tool runner; answer every call with an
                // empty output so the run can finish.
                println!();
                println!(
                    "(assistant requested {} tool call(s); submitting empty outputs)",
                    tool_calls.len()
                );
                let stubs: Vec<_> = tool_calls
                    .iter()
                    .map(|call| json!({ "tool_call_id": call.id }))
                    .collect();

                show_typing();
                let mut renderer = Renderer::default();
                result = ctl
                    .submit_tool_outputs_with_hook(&json!(stubs), &run_id, |t| {
                        renderer.print_progress(t)
                    })
                    .await;
            }
            Err(e) => {
                println!();
                println!("(error: {e})");
                return;
            }
        }
    }
}

/// Uploads a local file to hosted storage, then submits the returned
/// identifier as a file message.
async fn upload_and_submit(ctl: &mut ChatController, cfg: &AdvisorConfig, path: &str) {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) => {
            println!("(upload failed: {e})");
            return;
        }
    };
    let filename = std::path::Path::new(path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload.bin");

    let req = files::build_upload_file(cfg, filename, "application/octet-stream", &bytes);
    let file_id = match runtime::execute(&req).await {
        Ok(resp) if resp.is_success() => match parse::parse_uploaded(&resp.body) {
            Ok(id) => id,
            Err(e) => {
                println!("(upload failed: {e})");
                return;
            }
        },
        Ok(resp) => {
            println!(
                "(upload failed: {})",
                parse::error_detail(&resp.body).unwrap_or_else(|| format!("status {}", resp.status))
            );
            return;
        }
        Err(e) => {
            println!("(upload failed: {e})");
            return;
        }
    };

    println!("(uploaded as {file_id})");
    run_turn(ctl, UserAction::File(&file_id)).await;
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cfg = Arc::new(AdvisorConfig::from_env()?);
    print_welcome(&cfg);

    let api = Arc::new(HostedAssistant::new(cfg.clone()));
    let mut ctl = ChatController::start(api).await?;
    println!(
        "(thread {} ready; type a message, /upload <path> to attach a file, /quit to leave)\n",
        ctl.thread_id()
    );

    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("you> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim().to_string();
        if line.is_empty() {
            continue;
        }
        if line == "/quit" {
            break;
        }
        if let Some(path) = line.strip_prefix("/upload ") {
            upload_and_submit(&mut ctl, &cfg, path.trim()).await;
            continue;
        }

        let input = resolve_input(&line, &cfg.starters, ctl.transcript().is_empty()).to_string();
        run_turn(&mut ctl, UserAction::Text(&input)).await;
    }

    Ok(())
}
