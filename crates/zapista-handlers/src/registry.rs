//! The ordered handler chain (spec §4.4). A flat `Vec` of boxed handlers,
//! tried in order; the first non-null reply wins. No Before/After timing
//! split and no Allow/Block/Modify action enum — just `(ctx, text) ->
//! string | null`, matching the closed, small set the spec calls for.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, warn};

use crate::context::HandlerContext;
use crate::error::{HandlerError, Result};

#[async_trait]
pub trait Handler: Send + Sync {
    /// Stable name used in logs and error messages.
    fn name(&self) -> &str;

    async fn handle(&self, ctx: &HandlerContext, text: &str) -> Result<Option<String>>;
}

/// Runs handlers in registration order. In lenient mode (the default) a
/// failing handler is logged (name + a short content preview) and skipped;
/// it never fails the turn. In strict mode — set via
/// [`HandlerRegistry::strict`], meant for tests — a failure propagates.
pub struct HandlerRegistry {
    handlers: Vec<Arc<dyn Handler>>,
    strict: bool,
}

impl HandlerRegistry {
    pub fn new(handlers: Vec<Arc<dyn Handler>>) -> Self {
        Self {
            handlers,
            strict: false,
        }
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Runs the chain; returns the first handler's non-null reply, or
    /// `None` if every handler passed (meaning the LLM fallback should run).
    pub async fn run(&self, ctx: &HandlerContext, text: &str) -> Result<Option<String>> {
        for handler in &self.handlers {
            match handler.handle(ctx, text).await {
                Ok(Some(reply)) => return Ok(Some(reply)),
                Ok(None) => continue,
                Err(e) => {
                    let preview: String = text.chars().take(80).collect();
                    if self.strict {
                        return Err(HandlerError::Failed {
                            handler: handler.name().to_string(),
                            reason: e.to_string(),
                        });
                    }
                    error!(handler = handler.name(), content_preview = %preview, error = %e, "handler failed, skipping");
                    warn!("continuing handler chain after failure");
                }
            }
        }
        Ok(None)
    }
}
