//! Console chat surface and read-eval loop.

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use twcbot_conversation::{ChatSurface, ConversationFlow, Outbound, SessionKey};

pub(crate) struct ConsoleSurface {
    bot_name: String,
}

impl ConsoleSurface {
    pub(crate) fn new(bot_name: &str) -> Self {
        Self {
            bot_name: bot_name.to_owned(),
        }
    }
}

#[async_trait]
impl ChatSurface for ConsoleSurface {
    async fn emit(&self, _session: &SessionKey, outbound: Outbound) {
        println!("{}", render(&self.bot_name, &outbound));
    }

    async fn emit_activity(&self, session: &SessionKey, activity_id: &str) {
        tracing::debug!(session = %session, activity_id, "bot activity");
    }
}

/// Text shown for one outbound item.
pub(crate) fn render(bot_name: &str, outbound: &Outbound) -> String {
    match outbound {
        Outbound::Message(text) => format!("{bot_name}> {text}"),
        Outbound::Prompt(prompt) => prompt.trim_start_matches('\n').to_owned(),
        Outbound::Cards(cards) => cards
            .iter()
            .map(|card| match &card.icon_url {
                Some(icon) => format!("== {} ==\n{}\n[{icon}]", card.title, card.text),
                None => format!("== {} ==\n{}", card.title, card.text),
            })
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

/// Feeds stdin lines to `flow` until EOF or `quit`.
pub(crate) async fn run(flow: &ConversationFlow, session: &SessionKey) -> anyhow::Result<()> {
    tracing::info!(session = %session, "console chat started");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        if text.eq_ignore_ascii_case("quit") || text.eq_ignore_ascii_case("exit") {
            break;
        }
        if !flow.handle_message(session, text).await {
            println!("(try 'weather help')");
        }
    }
    Ok(())
}
