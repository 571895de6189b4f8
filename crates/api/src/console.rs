//! Interactive console loop
//!
//! Generic over the input and output streams so the loop can be driven
//! from a byte slice in tests and from stdin/stdout in the binary.

use std::io;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, Lines};
use tracing::debug;

use crate::commands::{parse_size, MenuCommand, Scenario};
use crate::simulation::{render_stats, Simulator};
use crate::utils::logging::log_rejected_input;

/// Requests started by the burst command.
pub const BURST_REQUESTS: usize = 32;

const RULE: &str = "=======================================";

struct Console<R, W> {
    lines: Lines<R>,
    output: W,
}

impl<R, W> Console<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    async fn say(&mut self, text: &str) -> io::Result<()> {
        self.output.write_all(text.as_bytes()).await?;
        self.output.flush().await
    }

    /// Print `text` and read the answer; `None` at end of input.
    async fn prompt(&mut self, text: &str) -> io::Result<Option<String>> {
        self.say(text).await?;
        self.lines.next_line().await
    }
}

/// Run the menu until the user exits or the input ends.
pub async fn run<R, W>(simulator: &Simulator, input: R, output: W) -> io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut console = Console { lines: input.lines(), output };

    loop {
        let menu = format!("{RULE}\n{}{RULE}\nYour choice: ", MenuCommand::menu());
        let Some(line) = console.prompt(&menu).await? else {
            break;
        };

        let command = match line.parse::<MenuCommand>() {
            Ok(command) => command,
            Err(e) => {
                log_rejected_input("menu", &e);
                console.say(&format!("{e}\n\n")).await?;
                continue;
            }
        };
        debug!(?command, "menu command selected");

        match command {
            MenuCommand::Exit => break,
            MenuCommand::Put(provider) | MenuCommand::Get(provider) => {
                let Some(size_line) =
                    console.prompt("What is the size of the blob (in bytes)? : ").await?
                else {
                    break;
                };
                let size = match parse_size(&size_line) {
                    Ok(size) => size,
                    Err(e) => {
                        log_rejected_input("size", &e);
                        console.say(&format!("{e}\n\n")).await?;
                        continue;
                    }
                };

                let Some(scenario_line) = console
                    .prompt("Outcome [s]uccess, [f]ailed, [r]etried (default success): ")
                    .await?
                else {
                    break;
                };
                let scenario = match scenario_line.parse::<Scenario>() {
                    Ok(scenario) => scenario,
                    Err(e) => {
                        log_rejected_input("scenario", &e);
                        console.say(&format!("{e}\n\n")).await?;
                        continue;
                    }
                };

                let summary = if matches!(command, MenuCommand::Put(_)) {
                    console.say("Performing PUT Blob\n").await?;
                    simulator.put_blob(provider, size, scenario).await
                } else {
                    console.say("Performing GET Blob\n").await?;
                    simulator.get_blob(provider, size, scenario).await
                };
                console.say(&format!("{summary}\n")).await?;
            }
            MenuCommand::Stats(provider) => {
                let entries = simulator.stats(provider).entries();
                console.say(&render_stats(&format!("{provider} Stats"), &entries)).await?;
            }
            MenuCommand::StatsAll => {
                console.say(&render_stats("Overall Stats", &simulator.stats_all())).await?;
            }
            MenuCommand::Burst => {
                let burst = simulator.burst(BURST_REQUESTS).await;
                console
                    .say(&format!(
                        "Burst of {} requests: {} succeeded, {} failed\n",
                        burst.requests, burst.succeeded, burst.failed
                    ))
                    .await?;
            }
        }
        console.say("\n").await?;
    }

    console.say("Bye!\n").await
}
