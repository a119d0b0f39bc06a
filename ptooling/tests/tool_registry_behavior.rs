use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use pprovider::{ToolCall, ToolDeclaration};
use ptooling::{
    DefaultToolRuntime, ToolError, ToolErrorKind, ToolExecutionContext, ToolRegistry, ToolRuntime,
    required_str,
};
use serde_json::{Value, json};

fn weather_declaration() -> ToolDeclaration {
    ToolDeclaration::new(
        "get_weather",
        "Current weather for a city",
        json!({
            "type": "OBJECT",
            "properties": {"city": {"type": "STRING"}},
            "required": ["city"]
        }),
    )
}

fn clock_declaration() -> ToolDeclaration {
    ToolDeclaration::new("clock", "Current time", json!({}))
}

fn fail_declaration() -> ToolDeclaration {
    ToolDeclaration::new("fail", "Always fails", json!({}))
}

fn runtime() -> DefaultToolRuntime {
    let mut registry = ToolRegistry::new();
    registry.register_fn(weather_declaration(), |args, context| async move {
        let city = required_str(&args, "city")?.to_string();
        tokio::time::sleep(Duration::from_millis(5)).await;
        let model = context.metadata.get("model").cloned().unwrap_or_default();
        Ok::<_, ToolError>(json!({"city": city, "forecast": "sunny", "asked_by": model}).to_string())
    });
    registry.register_sync_fn(clock_declaration(), |_args, _context| Ok("12:00".to_string()));
    registry.register_sync_fn(fail_declaration(), |_args, _context| {
        Err(ToolError::execution("backend unavailable"))
    });
    DefaultToolRuntime::new(Arc::new(registry))
}

#[tokio::test]
async fn gemini_style_declarations_dispatch_through_runtime() {
    let runtime = runtime();
    let call = ToolCall::new("call_1", "get_weather", r#"{"city":"Oslo"}"#);
    let declaration = weather_declaration();
    let context = ToolExecutionContext::new("inv-1").with_metadata("model", "gemini-pro");

    let result = runtime
        .execute(&call, Some(&declaration), &context)
        .await
        .expect("weather tool should succeed");

    assert_eq!(result.tool_call_id, "call_1");
    let output: Value = serde_json::from_str(&result.output).expect("output should be JSON");
    assert_eq!(
        output,
        json!({"asked_by": "gemini-pro", "city": "Oslo", "forecast": "sunny"})
    );
}

#[tokio::test]
async fn concurrent_executions_keep_call_order() {
    let runtime = runtime();
    let declarations = [weather_declaration(), clock_declaration(), fail_declaration()];
    let calls = [
        ToolCall::new("a", "get_weather", r#"{"city":"Paris"}"#),
        ToolCall::new("b", "clock", "{}"),
        ToolCall::new("c", "fail", "{}"),
    ];
    let context = ToolExecutionContext::new("inv-2");

    let outcomes = join_all(
        calls
            .iter()
            .zip(declarations.iter())
            .map(|(call, declaration)| runtime.execute(call, Some(declaration), &context)),
    )
    .await;

    assert_eq!(outcomes.len(), 3);
    assert_eq!(
        outcomes[0].as_ref().map(|result| result.tool_call_id.as_str()),
        Ok("a")
    );
    assert_eq!(
        outcomes[1].as_ref().map(|result| result.output.as_str()),
        Ok("12:00")
    );
    let error = outcomes[2].as_ref().expect_err("fail tool must fail");
    assert_eq!(error.kind, ToolErrorKind::Execution);
    assert_eq!(error.tool_name.as_deref(), Some("fail"));
}

#[tokio::test]
async fn arguments_that_miss_the_declared_schema_are_rejected_before_dispatch() {
    let runtime = runtime();
    let declaration = weather_declaration();

    let error = runtime
        .execute(
            &ToolCall::new("d", "get_weather", r#"{"town":"Rome"}"#),
            Some(&declaration),
            &ToolExecutionContext::new("inv-3"),
        )
        .await
        .expect_err("missing city must fail");

    assert_eq!(error.kind, ToolErrorKind::InvalidArguments);
    assert!(error.is_model_error());
}
