//! `/list`, `/feito` and `/filme` — named-list operations (spec §8 scenario
//! 2: `"/list mercado add leite"`). `/filme` is sugar for `/list filmes add
//! <text>`; `/feito <lista> <id>` marks an item done by removing it.

use async_trait::async_trait;

use crate::context::HandlerContext;
use crate::error::Result;
use crate::registry::Handler;

pub struct ListHandler;

impl ListHandler {
    pub fn new() -> Self {
        Self
    }

    fn show(&self, ctx: &HandlerContext, name: &str) -> String {
        let items = ctx.lists.items(&ctx.owner, name);
        if items.is_empty() {
            return format!("Lista \"{name}\" esta vazia.");
        }
        let mut out = format!("Lista \"{name}\":\n");
        for item in items {
            out.push_str(&format!("- [{}] {}\n", item.id, item.text));
        }
        out
    }
}

#[async_trait]
impl Handler for ListHandler {
    fn name(&self) -> &str {
        "list"
    }

    async fn handle(&self, ctx: &HandlerContext, text: &str) -> Result<Option<String>> {
        let trimmed = text.trim();

        if let Some(rest) = trimmed.strip_prefix("/filme") {
            let title = rest.trim();
            if title.is_empty() {
                return Ok(Some(self.show(ctx, "filmes")));
            }
            return Ok(Some(match ctx.lists.add_item(&ctx.owner, "filmes", title) {
                Ok(item) => format!("Adicionado a \"filmes\": {} [{}]", item.text, item.id),
                Err(e) => format!("Nao consegui salvar: {e}"),
            }));
        }

        if let Some(rest) = trimmed.strip_prefix("/feito") {
            let mut parts = rest.trim().splitn(2, ' ');
            let name = parts.next().unwrap_or("").trim();
            let id_str = parts.next().unwrap_or("").trim();
            if name.is_empty() || id_str.is_empty() {
                return Ok(Some("uso: /feito <lista> <id>".to_string()));
            }
            let Ok(id) = id_str.parse::<u32>() else {
                return Ok(Some(format!("\"{id_str}\" nao e um id valido")));
            };
            return Ok(Some(match ctx.lists.remove_item(&ctx.owner, name, id) {
                Ok(true) => format!("Item {id} de \"{name}\" marcado como feito."),
                Ok(false) => format!("Nao encontrei o item {id} em \"{name}\"."),
                Err(e) => format!("Nao consegui atualizar: {e}"),
            }));
        }

        let Some(rest) = trimmed.strip_prefix("/list") else {
            return Ok(None);
        };
        let rest = rest.trim();
        if rest.is_empty() {
            let names = ctx.lists.list_names(&ctx.owner);
            return Ok(Some(if names.is_empty() {
                "Voce ainda nao tem nenhuma lista.".to_string()
            } else {
                format!("Suas listas: {}", names.join(", "))
            }));
        }

        let mut parts = rest.splitn(2, ' ');
        let name = parts.next().unwrap_or("").trim();
        let rest2 = parts.next().unwrap_or("").trim();

        if let Some(item_text) = rest2.strip_prefix("add").map(str::trim) {
            if item_text.is_empty() {
                return Ok(Some("uso: /list <nome> add <item>".to_string()));
            }
            return Ok(Some(match ctx.lists.add_item(&ctx.owner, name, item_text) {
                Ok(item) => format!("Adicionado a \"{name}\": {} [{}]", item.text, item.id),
                Err(e) => format!("Nao consegui salvar: {e}"),
            }));
        }

        if let Some(id_str) = rest2.strip_prefix("remove").map(str::trim) {
            let Ok(id) = id_str.parse::<u32>() else {
                return Ok(Some(format!("\"{id_str}\" nao e um id valido")));
            };
            return Ok(Some(match ctx.lists.remove_item(&ctx.owner, name, id) {
                Ok(true) => format!("Item {id} removido de \"{name}\"."),
                Ok(false) => format!("Nao encontrei o item {id} em \"{name}\"."),
                Err(e) => format!("Nao consegui atualizar: {e}"),
            }));
        }

        Ok(Some(self.show(ctx, name)))
    }
}
