//! `firecmd ask`: one in-process agent invocation.

use std::io::Write;

use futures_util::StreamExt;

use firecmd_core::event::extract_events;
use firecmd_types::agent::AgentEvent;
use firecmd_types::config::AssistantConfig;
use firecmd_types::event::EventTag;

use crate::state::RuntimeState;

/// Run the agent on `prompt`, printing answer text to stdout as it streams.
/// Tool activity and the map events found in the answer go to stderr.
pub async fn ask(config: &AssistantConfig, prompt: &str, actor: &str, session: &str) -> anyhow::Result<()> {
    let state = RuntimeState::init(config)?;
    let agent = state.factory.create_agent(actor, session).await;

    let mut events = agent.stream(prompt);
    let mut stdout = std::io::stdout();
    let mut answer = String::new();
    while let Some(event) = events.next().await {
        match event {
            AgentEvent::Text { data } => {
                write!(stdout, "{data}")?;
                stdout.flush()?;
                answer.push_str(&data);
            }
            AgentEvent::ToolStart { name, .. } => {
                eprintln!("\n  {} {}", console::style("⚙").dim(), console::style(&name).cyan());
            }
            AgentEvent::ToolEnd { name, is_error: true, .. } => {
                eprintln!("  {} {name} failed", console::style("✗").red());
            }
            AgentEvent::ToolEnd { .. } => {}
            AgentEvent::Complete { rounds, .. } => {
                println!();
                tracing::debug!(rounds, "Answer complete");
                print_map_events(&answer);
            }
            AgentEvent::Error { message } => {
                println!();
                anyhow::bail!("agent failed: {message}");
            }
        }
    }
    Ok(())
}

fn print_map_events(answer: &str) {
    for tag in extract_events(answer) {
        let line = match tag {
            EventTag::Geocode(g) => format!("marker  {} ({:.6}, {:.6})", g.name, g.lat, g.lon),
            EventTag::Windy(w) => format!(
                "weather {} {:.1}°C wind {:.1} m/s @ {:.0}°",
                w.address, w.temp, w.wind_speed, w.wind_dir
            ),
        };
        eprintln!("  {} {}", console::style("◆").yellow(), console::style(line).dim());
    }
}
