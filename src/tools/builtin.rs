//! Built-in tools served by the binary
//!
//! Small tools that exercise each result shape the dispatcher supports:
//! plain text, structured content, business errors and cooperative
//! cancellation.

use std::time::Duration;

use serde::Serialize;

use super::metadata::{
    ArgumentType, DeploymentError, ToolAnnotations, ToolBuilder, ToolMetadata, ToolResult,
};
use super::registry::ToolRegistry;
use super::response::{ToolArguments, ToolError, ToolOutput};

/// Interval at which `countdown` checks its cancellation handle
const COUNTDOWN_TICK: Duration = Duration::from_millis(100);

/// Register the built-in tools with the registry
pub fn register_builtin_tools(registry: &mut ToolRegistry) -> Result<(), DeploymentError> {
    registry.add_tool(echo_tool()?)?;
    registry.add_tool(add_tool()?)?;
    registry.add_tool(word_stats_tool()?)?;
    registry.add_tool(countdown_tool()?)?;
    registry.add_tool(fail_tool()?)?;
    Ok(())
}

fn read_only() -> ToolAnnotations {
    ToolAnnotations {
        read_only_hint: Some(true),
        idempotent_hint: Some(true),
        ..Default::default()
    }
}

// ============================================================================
// echo
// ============================================================================

fn echo_tool() -> Result<ToolMetadata, DeploymentError> {
    ToolBuilder::new("echo")
        .title("Echo")
        .description("Returns the input unchanged")
        .argument("input", ArgumentType::String, "Text to echo back")
        .annotations(read_only())
        .build(echo_handler)
}

async fn echo_handler(args: ToolArguments) -> ToolResult {
    let input: String = args.get("input")?;
    Ok(ToolOutput::Text(input))
}

// ============================================================================
// add
// ============================================================================

fn add_tool() -> Result<ToolMetadata, DeploymentError> {
    ToolBuilder::new("add")
        .title("Add")
        .description("Adds two integers")
        .argument("a", ArgumentType::Integer, "First operand")
        .argument("b", ArgumentType::Integer, "Second operand")
        .annotations(read_only())
        .build(add_handler)
}

async fn add_handler(args: ToolArguments) -> ToolResult {
    let a: i64 = args.get("a")?;
    let b: i64 = args.get("b")?;
    let sum = a
        .checked_add(b)
        .ok_or_else(|| ToolError::message("integer overflow"))?;
    Ok(ToolOutput::Text(sum.to_string()))
}

// ============================================================================
// word_stats
// ============================================================================

#[derive(Debug, Serialize)]
struct WordStats {
    words: usize,
    characters: usize,
    lines: usize,
}

fn word_stats_tool() -> Result<ToolMetadata, DeploymentError> {
    ToolBuilder::new("word_stats")
        .title("Word statistics")
        .description("Counts words, characters and lines of a text")
        .argument("text", ArgumentType::String, "Text to analyse")
        .annotations(read_only())
        .structured_content()
        .build(word_stats_handler)
}

async fn word_stats_handler(args: ToolArguments) -> ToolResult {
    let text: String = args.get("text")?;
    ToolOutput::json(&WordStats {
        words: text.split_whitespace().count(),
        characters: text.chars().count(),
        lines: text.lines().count(),
    })
}

// ============================================================================
// countdown
// ============================================================================

fn countdown_tool() -> Result<ToolMetadata, DeploymentError> {
    ToolBuilder::new("countdown")
        .title("Countdown")
        .description("Waits for the given number of seconds; can be cancelled")
        .argument("seconds", ArgumentType::Integer, "Seconds to wait")
        .cancellation()
        .build(countdown_handler)
}

async fn countdown_handler(args: ToolArguments) -> ToolResult {
    let seconds: u64 = args.get("seconds")?;
    let cancellation = args.cancellation()?.clone();

    let ticks = seconds.saturating_mul(1000 / COUNTDOWN_TICK.as_millis() as u64);
    for _ in 0..ticks {
        cancellation.check()?;
        tokio::select! {
            _ = tokio::time::sleep(COUNTDOWN_TICK) => {}
            _ = cancellation.cancelled() => {}
        }
    }
    cancellation.check()?;

    Ok(ToolOutput::Text(format!("Countdown of {} seconds finished", seconds)))
}

// ============================================================================
// fail
// ============================================================================

fn fail_tool() -> Result<ToolMetadata, DeploymentError> {
    ToolBuilder::new("fail")
        .title("Fail")
        .description("Always fails with the given message")
        .argument("message", ArgumentType::String, "Failure message")
        .build(fail_handler)
}

async fn fail_handler(args: ToolArguments) -> ToolResult {
    let message: String = args.get("message")?;
    Err(ToolError::message(message))
}
