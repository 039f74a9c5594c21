use std::time::Duration;

use serde_json::Value;

use crate::{Error, HttpClient, Result};

const MAX_ATTEMPTS: usize = 2;

/// Builds a two-message chat transcript.
pub fn chat_messages(system: &str, user: &str) -> Vec<Value> {
	vec![
		serde_json::json!({ "role": "system", "content": system }),
		serde_json::json!({ "role": "user", "content": user }),
	]
}

/// Calls an OpenAI-compatible chat completions endpoint and returns the first choice's text.
///
/// A response without usable text is retried once; transport and HTTP status errors are not.
pub async fn complete(
	http: &HttpClient,
	cfg: &sift_config::LlmProviderConfig,
	messages: &[Value],
) -> Result<String> {
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = serde_json::json!({
		"model": cfg.model,
		"temperature": cfg.temperature,
		"messages": messages,
	});
	let mut last_err = None;

	for _ in 0..MAX_ATTEMPTS {
		let res = http
			.client()
			.post(&url)
			.timeout(Duration::from_millis(cfg.timeout_ms))
			.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
			.json(&body)
			.send()
			.await?;
		let json: Value = res.error_for_status()?.json().await?;

		match parse_completion_text(&json) {
			Ok(text) => return Ok(text),
			Err(err) => last_err = Some(err),
		}
	}

	Err(last_err.unwrap_or_else(|| Error::invalid_response("Completion response is empty.")))
}

fn parse_completion_text(json: &Value) -> Result<String> {
	let content = json
		.get("choices")
		.and_then(|v| v.as_array())
		.and_then(|arr| arr.first())
		.and_then(|choice| choice.get("message"))
		.and_then(|msg| msg.get("content"))
		.and_then(|c| c.as_str())
		.ok_or_else(|| Error::invalid_response("Completion response is missing message content."))?;
	let trimmed = content.trim();

	if trimmed.is_empty() {
		return Err(Error::invalid_response("Completion message content is empty."));
	}

	Ok(trimmed.to_string())
}
