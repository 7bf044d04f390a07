//! Prompt templates for the reasoning loop.

use crate::tools::ToolRegistry;

use super::scratchpad::Scratchpad;

/// Render the full prompt for one model call: protocol instructions, the
/// tool list, the user's question, and the history so far. Ends with a
/// `Thought:` cue so the model continues the transcript.
pub fn build_prompt(query: &str, tools: &ToolRegistry, scratchpad: &Scratchpad) -> String {
    let tool_descriptions = tools
        .list_tools()
        .iter()
        .map(|t| format!("- **{}**: {}", t.name(), t.description()))
        .collect::<Vec<_>>()
        .join("\n");
    let tool_names = tools.names();
    let history = scratchpad.render();

    format!(
        r#"You are a helpful assistant. Answer the question below as best you can. You have access to the following tools:

{tool_descriptions}

Use the following format, with each keyword at the start of its own line:

Question: the question you must answer
Thought: reason about what to do next
Action: the tool to use, exactly one of [{tool_names}]
Action Input: the argument to pass to the tool
Observation: the tool's result (written by the system, never by you)
... (Thought/Action/Action Input/Observation can repeat)
Thought: I now know the final answer
Final Answer: the answer to the original question

Begin!

Question: {query}
{history}Thought:"#
    )
}

/// Re-prompt after malformed output: the full prompt again, the reply that
/// failed to parse, and an explicit format reminder.
pub(crate) fn build_correction_prompt(
    query: &str,
    tools: &ToolRegistry,
    scratchpad: &Scratchpad,
    invalid_output: &str,
) -> String {
    format!(
        r#"{base}

Your previous reply was:

{invalid_output}

That reply did not follow the required format. Reply again: either a 'Thought:' line followed by an 'Action:' line and an 'Action Input:' line, or a 'Thought:' line followed by a 'Final Answer:' line. Never write 'Observation:' lines yourself."#,
        base = build_prompt(query, tools, scratchpad),
    )
}
