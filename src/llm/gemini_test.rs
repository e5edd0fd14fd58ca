use super::*;

fn make_response(candidates: serde_json::Value) -> String {
    serde_json::json!({
        "candidates": candidates,
        "usageMetadata": { "promptTokenCount": 100, "candidatesTokenCount": 50, "totalTokenCount": 150 },
        "modelVersion": "gemini-2.0-flash"
    })
    .to_string()
}

#[test]
fn parse_text_response() {
    let json = make_response(serde_json::json!([
        { "content": { "parts": [{ "text": "Start with three sets." }], "role": "model" }, "finishReason": "STOP" }
    ]));
    let resp = parse_response(&json).unwrap();
    assert_eq!(resp.text, "Start with three sets.");
    assert_eq!(resp.model, "gemini-2.0-flash");
    assert_eq!(resp.stop_reason, "STOP");
    assert_eq!(resp.input_tokens, 100);
    assert_eq!(resp.output_tokens, 50);
}

#[test]
fn parse_joins_multiple_parts() {
    let json = make_response(serde_json::json!([
        { "content": { "parts": [{ "text": "Warm up first. " }, { "text": "Then lift." }] } }
    ]));
    let resp = parse_response(&json).unwrap();
    assert_eq!(resp.text, "Warm up first. Then lift.");
    // finishReason absent is tolerated.
    assert_eq!(resp.stop_reason, "");
}

#[test]
fn parse_no_candidates_errors() {
    let json = make_response(serde_json::json!([]));
    let err = parse_response(&json).unwrap_err();
    assert!(matches!(err, LlmError::ApiParse(_)));
}

#[test]
fn parse_missing_usage_defaults_to_zero() {
    let json = serde_json::json!({
        "candidates": [{ "content": { "parts": [{ "text": "ok" }] } }]
    })
    .to_string();
    let resp = parse_response(&json).unwrap();
    assert_eq!(resp.input_tokens, 0);
    assert_eq!(resp.output_tokens, 0);
    assert_eq!(resp.model, "");
}

#[test]
fn parse_malformed_json_errors() {
    let err = parse_response("not json at all").unwrap_err();
    assert!(matches!(err, LlmError::ApiParse(_)));
}

#[test]
fn assistant_role_maps_to_model() {
    assert_eq!(api_role("assistant"), "model");
    assert_eq!(api_role("user"), "user");
}

#[test]
fn request_body_uses_gemini_field_names() {
    let messages = [Message::user("hello"), Message::assistant("hi there")];
    let contents: Vec<RequestContent<'_>> = messages
        .iter()
        .map(|m| RequestContent {
            role: Some(api_role(&m.role)),
            parts: vec![RequestPart { text: &m.content }],
        })
        .collect();
    let body = ApiRequest {
        contents,
        system_instruction: Some(RequestContent {
            role: None,
            parts: vec![RequestPart { text: "You are a fitness coach." }],
        }),
        generation_config: GenerationConfig { max_output_tokens: 4000 },
    };

    let value = serde_json::to_value(&body).unwrap();
    assert_eq!(value["contents"][0]["role"], "user");
    assert_eq!(value["contents"][1]["role"], "model");
    assert_eq!(value["contents"][1]["parts"][0]["text"], "hi there");
    assert_eq!(value["systemInstruction"]["parts"][0]["text"], "You are a fitness coach.");
    assert_eq!(value["generationConfig"]["maxOutputTokens"], 4000);
    // Role is omitted on the system instruction, not serialized as null.
    assert!(value["systemInstruction"].get("role").is_none());
}
