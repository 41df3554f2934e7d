//! Repair pipeline for semi-structured model output. The reasoning
//! service is asked for strict JSON but routinely wraps it in prose or
//! markdown fences, adds trailing commas, or uses smart quotes; every
//! consumer goes through [`extract_json`] before deserializing.

use anyhow::Result;

/// Remove trailing commas before `}` or `]` (invalid but common in
/// model output). Tracks string boundaries and escapes so commas inside
/// values are never touched.
pub fn remove_trailing_commas(json: &str) -> String {
    let chars: Vec<char> = json.chars().collect();
    let mut result = String::with_capacity(json.len());
    let mut in_string = false;
    let mut escape_next = false;
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];
        if escape_next {
            escape_next = false;
            result.push(ch);
            i += 1;
            continue;
        }
        match ch {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            ',' if !in_string => {
                let mut j = i + 1;
                while j < chars.len() && chars[j].is_whitespace() {
                    j += 1;
                }
                if j < chars.len() && matches!(chars[j], '}' | ']') {
                    // Trailing comma, skip it.
                    i += 1;
                    continue;
                }
            }
            _ => {}
        }
        result.push(ch);
        i += 1;
    }
    result
}

fn replace_smart_quotes(text: &str) -> String {
    text.replace(['\u{201C}', '\u{201D}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'")
}

/// Find the first balanced `{...}` object in `text`, tracking string
/// boundaries and escapes so braces inside values don't confuse the
/// scan. Returns byte offsets.
fn find_object_bounds(text: &str) -> Option<(usize, usize)> {
    let start = text.find('{')?;
    let mut depth = 0i32;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, ch) in text[start..].char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }
        match ch {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some((start, start + i + ch.len_utf8()));
                }
            }
            _ => {}
        }
    }
    None
}

fn parses(candidate: &str) -> bool {
    serde_json::from_str::<serde_json::Value>(candidate).is_ok()
}

/// Strip a leading markdown code fence (```json or bare ```), returning
/// the fenced body when present.
fn strip_code_fence(text: &str) -> Option<&str> {
    let rest = text.trim_start().strip_prefix("```")?;
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.trim_start();
    match rest.find("```") {
        Some(end) => Some(rest[..end].trim_end()),
        None => Some(rest), // unterminated fence, take everything after it
    }
}

/// Extract a JSON object from a raw model response.
///
/// Tries, in order: the text as-is, the body of a markdown code fence,
/// the first balanced object found by a string-aware scan, and finally
/// the same candidates after trailing-comma and smart-quote repair.
pub fn extract_json(text: &str) -> Result<String> {
    let trimmed = text.trim();
    if parses(trimmed) {
        return Ok(trimmed.to_string());
    }

    if let Some(fenced) = strip_code_fence(trimmed) {
        if parses(fenced) {
            return Ok(fenced.to_string());
        }
        if let Some((start, end)) = find_object_bounds(fenced) {
            let candidate = &fenced[start..end];
            if parses(candidate) {
                return Ok(candidate.to_string());
            }
        }
    }

    if let Some((start, end)) = find_object_bounds(trimmed) {
        let candidate = &trimmed[start..end];
        if parses(candidate) {
            return Ok(candidate.to_string());
        }

        // Repair pass over the extracted candidate.
        let repaired = remove_trailing_commas(&replace_smart_quotes(candidate));
        if parses(&repaired) {
            tracing::debug!("Extracted JSON after comma/quote repair");
            return Ok(repaired);
        }
    }

    // Last resort: repair the whole text and rescan.
    let repaired = remove_trailing_commas(&replace_smart_quotes(trimmed));
    if let Some((start, end)) = find_object_bounds(&repaired) {
        let candidate = &repaired[start..end];
        if parses(candidate) {
            tracing::debug!("Extracted JSON after whole-text repair");
            return Ok(candidate.to_string());
        }
    }

    anyhow::bail!(
        "Failed to extract valid JSON from response. Text length: {}, preview: {}",
        text.len(),
        text.chars().take(200).collect::<String>()
    )
}
