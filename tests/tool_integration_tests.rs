use mathexpert::tool_protocol::{ToolError, ToolParameterType, ToolRegistry};
use mathexpert::tool_protocols::{math_protocol, DIFF_VALUES, GET_HISTORY, SUM_VALUES};
use mathexpert::tools::MathTools;
use serde_json::json;
use std::sync::Arc;

async fn math_registry() -> (Arc<MathTools>, ToolRegistry) {
    let math = Arc::new(MathTools::new());
    let mut registry = ToolRegistry::new(Arc::new(math_protocol(math.clone())));
    registry.discover_tools_from_primary().await.unwrap();
    (math, registry)
}

#[tokio::test]
async fn test_registry_lists_exactly_the_math_tools() {
    let (_, registry) = math_registry().await;
    let names: Vec<&str> = registry
        .list_tools()
        .iter()
        .map(|m| m.name.as_str())
        .collect();
    assert_eq!(names, vec![DIFF_VALUES, SUM_VALUES, GET_HISTORY]);
    assert_eq!(registry.protocol().protocol_name(), "custom");
}

#[tokio::test]
async fn test_binary_tools_require_integer_operands() {
    let (_, registry) = math_registry().await;
    for name in [SUM_VALUES, DIFF_VALUES] {
        let metadata = registry.get_tool(name).unwrap().metadata();
        assert_eq!(metadata.parameters.len(), 2);
        for param in &metadata.parameters {
            assert!(param.required);
            assert_eq!(param.param_type, ToolParameterType::Integer);
        }

        let schema = metadata.input_schema();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["a"]["type"], "integer");
        assert_eq!(schema["required"], json!(["a", "b"]));
    }

    let history = registry.get_tool(GET_HISTORY).unwrap().metadata();
    assert!(history.parameters.is_empty());
}

#[tokio::test]
async fn test_tool_definitions_match_metadata() {
    let (_, registry) = math_registry().await;
    let definitions = registry.tool_definitions();
    assert_eq!(definitions.len(), 3);
    assert_eq!(definitions[0].name, DIFF_VALUES);
    assert_eq!(
        definitions[0].description,
        "Calculates the difference between two numbers"
    );
    assert_eq!(definitions[1].name, SUM_VALUES);
    assert_eq!(definitions[1].description, "Sums two numbers");
    assert_eq!(definitions[2].description, "Gets the operation history");
}

#[tokio::test]
async fn test_calls_through_the_registry_mutate_the_shared_tracker() {
    let (math, registry) = math_registry().await;

    let sum = registry
        .execute_tool(SUM_VALUES, json!({"a": 5, "b": 3}))
        .await
        .unwrap();
    assert!(sum.success);
    assert_eq!(sum.output, json!(8));

    let diff = registry
        .execute_tool(DIFF_VALUES, json!({"a": "10", "b": 4.0}))
        .await
        .unwrap();
    assert_eq!(diff.output, json!(6));

    let history = registry.execute_tool(GET_HISTORY, json!({})).await.unwrap();
    assert_eq!(history.output, json!("5 + 3 = 8\n10 - 4 = 6"));
    assert_eq!(math.recent_history(), "5 + 3 = 8\n10 - 4 = 6");
}

#[tokio::test]
async fn test_bad_parameters_fail_without_touching_the_log() {
    let (math, registry) = math_registry().await;

    let missing = registry
        .execute_tool(SUM_VALUES, json!({"a": 1}))
        .await
        .unwrap();
    assert!(!missing.success);
    assert!(missing.error.unwrap().contains("missing parameter 'b'"));

    let fractional = registry
        .execute_tool(DIFF_VALUES, json!({"a": 1.5, "b": 1}))
        .await
        .unwrap();
    assert!(!fractional.success);

    let overflow = registry
        .execute_tool(SUM_VALUES, json!({"a": i64::MAX, "b": 1}))
        .await
        .unwrap();
    assert!(!overflow.success);

    assert!(math.is_empty());
    assert_eq!(math.recent_history(), "No previous operations");
}

#[tokio::test]
async fn test_unknown_tool_is_an_error() {
    let (_, registry) = math_registry().await;
    let err = registry
        .execute_tool("multiply_values", json!({"a": 2, "b": 3}))
        .await
        .unwrap_err();
    assert_eq!(
        err.downcast_ref::<ToolError>(),
        Some(&ToolError::NotFound("multiply_values".to_string()))
    );
}

#[tokio::test]
async fn test_removed_tool_is_no_longer_listed() {
    let (_, mut registry) = math_registry().await;
    assert!(registry.remove_tool(GET_HISTORY).is_some());
    assert!(registry.remove_tool(GET_HISTORY).is_none());
    assert_eq!(registry.list_tools().len(), 2);
}
