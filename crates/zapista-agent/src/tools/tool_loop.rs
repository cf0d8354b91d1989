//! Tool execution loop — the LLM fallback step (spec §4.3 step 5).
//!
//! Flow: LLM → if it returns tool calls → execute each → append the
//! string result as a tool-role message → LLM again → repeat. Stops on
//! plain text, on hitting the iteration cap, or on a provider error.

use tracing::{debug, info, warn};

use zapista_core::llm::{ChatRequest, ChatResponse, LlmProvider, Message, ProviderError, ToolCall};

use super::{Tool, ToolResult};

/// Default cap on tool-call round-trips in a single turn (spec §4.3 step 5).
pub const MAX_ITERATIONS: usize = 20;

/// Runs the loop to completion, starting from `initial_request` (its
/// `messages` hold the conversation so far, ending with the user's turn).
/// Returns the final plain-text `ChatResponse`.
pub async fn run_tool_loop(
    provider: &dyn LlmProvider,
    initial_request: ChatRequest,
    tools: &[Box<dyn Tool>],
) -> Result<ChatResponse, ProviderError> {
    let mut messages = initial_request.messages.clone();
    let mut last_response: Option<ChatResponse> = None;

    for iteration in 0..MAX_ITERATIONS {
        let mut req = initial_request.clone();
        req.messages = messages.clone();

        debug!(iteration, "tool loop iteration");

        let response = provider.send(&req).await?;

        if response.tool_calls.is_empty() {
            info!(iteration, "tool loop complete — no more tool calls");
            return Ok(response);
        }

        messages.push(Message::assistant(&response.content));

        for call in &response.tool_calls {
            let result = execute_tool(tools, call).await;
            messages.push(Message::tool_result(&call.id, &result.content));
        }

        last_response = Some(response);
    }

    warn!(max_iterations = MAX_ITERATIONS, "tool loop hit maximum iterations");

    match last_response {
        Some(resp) => Ok(resp),
        None => Err(ProviderError::BadResponse(format!(
            "tool loop exceeded {MAX_ITERATIONS} iterations without a final response"
        ))),
    }
}

async fn execute_tool(tools: &[Box<dyn Tool>], call: &ToolCall) -> ToolResult {
    match tools.iter().find(|t| t.name() == call.name) {
        Some(tool) => {
            debug!(tool = %call.name, "executing tool");
            tool.execute(call.arguments.clone()).await
        }
        None => ToolResult::error(format!("unknown tool: {}", call.name)),
    }
}
