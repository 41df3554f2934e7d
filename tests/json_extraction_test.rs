//! Tests for the JSON repair pipeline applied to reasoning-service
//! output before deserialization.

use leetplan::llm::json::{extract_json, remove_trailing_commas};

#[test]
fn extracts_clean_json_as_is() {
    let input = r#"{"new_topic": "Graph", "review_topics": ["DP"]}"#;
    let result = extract_json(input).unwrap();
    assert_eq!(result, input);
}

#[test]
fn extracts_from_markdown_fence() {
    let input = "```json\n{\"new_topic\": \"Graph\", \"review_topics\": []}\n```";
    let result = extract_json(input).unwrap();
    assert!(result.contains("\"new_topic\""));
    assert!(serde_json::from_str::<serde_json::Value>(&result).is_ok());
}

#[test]
fn extracts_object_surrounded_by_prose() {
    let input = r#"Sure! Here is today's focus:

{"new_topic": "Heap", "review_topics": ["Graph", "DP"], "rationale": "fading"}

Let me know if you'd like different topics."#;
    let result = extract_json(input).unwrap();
    let value: serde_json::Value = serde_json::from_str(&result).unwrap();
    assert_eq!(value["new_topic"], "Heap");
}

#[test]
fn repairs_trailing_commas() {
    let input = r#"{"recommendations": [{"number": 1, "estimated_minutes": 15,},], "rationale": "x",}"#;
    let result = extract_json(input).unwrap();
    let value: serde_json::Value = serde_json::from_str(&result).unwrap();
    assert_eq!(value["recommendations"][0]["number"], 1);
}

#[test]
fn repairs_smart_quotes() {
    let input = "{\u{201C}new_topic\u{201D}: \u{201C}Trie\u{201D}}";
    let result = extract_json(input).unwrap();
    let value: serde_json::Value = serde_json::from_str(&result).unwrap();
    assert_eq!(value["new_topic"], "Trie");
}

#[test]
fn braces_inside_string_values_do_not_break_extraction() {
    let input = r#"Answer: {"rationale": "practice f(x) = {1, 2} style sets", "new_topic": "Math"}"#;
    let result = extract_json(input).unwrap();
    let value: serde_json::Value = serde_json::from_str(&result).unwrap();
    assert_eq!(value["new_topic"], "Math");
}

#[test]
fn unterminated_fence_still_extracts() {
    let input = "```json\n{\"new_topic\": \"Stack\"}";
    let result = extract_json(input).unwrap();
    let value: serde_json::Value = serde_json::from_str(&result).unwrap();
    assert_eq!(value["new_topic"], "Stack");
}

#[test]
fn plain_prose_fails_with_error() {
    let result = extract_json("I am unable to produce a plan right now.");
    assert!(result.is_err());
    let message = result.unwrap_err().to_string();
    assert!(message.contains("Failed to extract valid JSON"));
}

#[test]
fn trailing_comma_removal_preserves_commas_inside_strings() {
    let input = r#"{"note": "a, b, c,", "n": 1}"#;
    assert_eq!(remove_trailing_commas(input), input);
}

#[test]
fn comma_before_brace_inside_a_string_is_not_stripped() {
    // The comma sits inside a value, directly followed by whitespace
    // and a closing brace; a non-string-aware scan would eat it.
    let input = r#"{"x": "a, }"}"#;
    assert_eq!(remove_trailing_commas(input), input);

    let mixed = r#"{"note": "sets end with , }", "n": 1,}"#;
    let repaired = remove_trailing_commas(mixed);
    let value: serde_json::Value = serde_json::from_str(&repaired).unwrap();
    assert_eq!(value["note"], "sets end with , }");
    assert_eq!(value["n"], 1);
}

#[test]
fn escaped_quotes_do_not_confuse_the_comma_scan() {
    let input = r#"{"quote": "he said \", }\" loudly", "n": 2}"#;
    assert_eq!(remove_trailing_commas(input), input);
}
