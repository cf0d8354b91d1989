//! `/help`, `/start`, `/ajuda` and bare greetings. Registered last among the
//! informational handlers (spec §4.4) so anything more specific gets a
//! chance first.

use async_trait::async_trait;

use crate::context::HandlerContext;
use crate::error::Result;
use crate::registry::Handler;

const HELP_TEXT: &str = "Posso te ajudar com:\n\
- lembretes: \"me lembra de beber agua em 10 min\"\n\
- listas: \"/list mercado add leite\", \"/list mercado\"\n\
- filmes: \"/filme nome do filme\"\n\
- marcar como feito: \"/feito mercado 1\"";

pub struct HelpHandler;

impl HelpHandler {
    pub fn new() -> Self {
        Self
    }
}

fn is_help_trigger(text: &str) -> bool {
    let lower = text.trim().to_lowercase();
    matches!(
        lower.as_str(),
        "/help" | "/start" | "/ajuda" | "help" | "ajuda" | "oi" | "ola" | "olá"
    )
}

#[async_trait]
impl Handler for HelpHandler {
    fn name(&self) -> &str {
        "help"
    }

    async fn handle(&self, _ctx: &HandlerContext, text: &str) -> Result<Option<String>> {
        if is_help_trigger(text) {
            Ok(Some(HELP_TEXT.to_string()))
        } else {
            Ok(None)
        }
    }
}
