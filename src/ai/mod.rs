use crate::config::Config;
use anyhow::{Context, Result, anyhow, bail};
use reqwest::blocking::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

pub fn test_connection(config: &Config) -> Result<String> {
    let api_key = config.resolve_ai_api_key().context(
        "AI API key is missing. Set `HabitCoach config set ai.api_key <KEY>` or `HABITCOACH_AI_API_KEY`.",
    )?;

    let system_prompt = "Return exactly one short, upbeat sentence confirming the coach is ready.";
    let user_prompt = "Health check for HabitCoach.";

    chat_completion(config, &api_key, system_prompt, user_prompt)
}

pub fn has_api_key(config: &Config) -> bool {
    config.resolve_ai_api_key().is_some()
}

/// One chat completion request. No retry: the caller decides what a failure means.
pub fn chat_completion(config: &Config, api_key: &str, system: &str, user: &str) -> Result<String> {
    let base_url = config.ai_api_base_url.clone();
    let model = config.ai_model.clone();
    let temperature = config.ai_temperature;
    let timeout_seconds = config.ai_timeout_seconds.max(5);
    let api_key = api_key.to_string();
    let system = system.to_string();
    let user = user.to_string();

    std::thread::spawn(move || {
        chat_completion_blocking(
            &base_url,
            &model,
            temperature,
            timeout_seconds,
            &api_key,
            &system,
            &user,
        )
    })
    .join()
    .map_err(|_| anyhow!("AI worker thread panicked"))?
}

fn chat_completion_blocking(
    base_url: &str,
    model: &str,
    temperature: f32,
    timeout_seconds: u64,
    api_key: &str,
    system: &str,
    user: &str,
) -> Result<String> {
    if api_key.trim().is_empty() {
        bail!("AI API key is empty");
    }

    let endpoint = format!("{}/chat/completions", base_url.trim_end_matches('/'));

    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {api_key}"))
            .context("Failed to build Authorization header")?,
    );

    let client = Client::builder()
        .timeout(Duration::from_secs(timeout_seconds))
        .default_headers(headers)
        .build()
        .context("Failed to create AI HTTP client")?;

    let request_body = json!({
        "model": model,
        "temperature": temperature,
        "messages": [
            {"role": "system", "content": system},
            {"role": "user", "content": user}
        ]
    });

    let response = client
        .post(endpoint)
        .json(&request_body)
        .send()
        .context("AI API request failed")?;

    let status = response.status();
    let body = response.text().context("Failed to read AI response body")?;

    if !status.is_success() {
        bail!("AI API error {}: {}", status, body);
    }

    let parsed: ChatCompletionResponse = serde_json::from_str(&body)
        .with_context(|| format!("Failed to parse AI response: {body}"))?;

    parsed
        .choices
        .first()
        .and_then(|choice| choice.message.content.clone())
        .filter(|content| !content.trim().is_empty())
        .ok_or_else(|| anyhow!("AI response did not include message.content"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::spawn_stub;
    use axum::Json;
    use axum::Router;
    use axum::http::{HeaderMap as AxumHeaders, StatusCode};
    use axum::response::IntoResponse;
    use axum::routing::post;
    use serde_json::Value;

    fn config_for(base_url: String) -> Config {
        Config {
            ai_api_base_url: base_url,
            ai_timeout_seconds: 5,
            ..Config::default()
        }
    }

    #[test]
    fn sends_system_and_user_messages() {
        let router = Router::new().route(
            "/chat/completions",
            post(|headers: AxumHeaders, Json(body): Json<Value>| async move {
                let authorized = headers
                    .get("authorization")
                    .and_then(|value| value.to_str().ok())
                    == Some("Bearer sk-test");
                let roles = body["messages"]
                    .as_array()
                    .map(|messages| {
                        messages
                            .iter()
                            .filter_map(|message| message["role"].as_str())
                            .collect::<Vec<_>>()
                            .join(",")
                    })
                    .unwrap_or_default();

                if authorized && roles == "system,user" {
                    Json(serde_json::json!({
                        "choices": [{"message": {"content": "    indented\nGrade: A\n\n"}}]
                    }))
                    .into_response()
                } else {
                    StatusCode::BAD_REQUEST.into_response()
                }
            }),
        );
        let base = spawn_stub(router);

        let content = chat_completion(&config_for(base), "sk-test", "system", "user")
            .expect("completion");
        assert_eq!(content, "    indented\nGrade: A\n\n");
    }

    #[test]
    fn authentication_error_is_reported() {
        let router = Router::new().route(
            "/chat/completions",
            post(|| async {
                (
                    StatusCode::UNAUTHORIZED,
                    r#"{"error":{"message":"Incorrect API key provided"}}"#,
                )
            }),
        );
        let base = spawn_stub(router);

        let error = chat_completion(&config_for(base), "sk-wrong", "system", "user")
            .expect_err("unauthorized");
        assert!(error.to_string().contains("401"));
    }

    #[test]
    fn empty_choices_are_an_error() {
        let router = Router::new().route(
            "/chat/completions",
            post(|| async { Json(serde_json::json!({ "choices": [] })) }),
        );
        let base = spawn_stub(router);

        assert!(chat_completion(&config_for(base), "sk-test", "system", "user").is_err());
    }

    #[test]
    fn whitespace_only_reply_is_an_error() {
        let router = Router::new().route(
            "/chat/completions",
            post(|| async {
                Json(serde_json::json!({ "choices": [{ "message": { "content": " \n " } }] }))
            }),
        );
        let base = spawn_stub(router);

        assert!(chat_completion(&config_for(base), "sk-test", "system", "user").is_err());
    }

    #[test]
    fn blank_key_is_rejected_without_request() {
        let error = chat_completion(&config_for("http://127.0.0.1:9".to_string()), " ", "s", "u")
            .expect_err("blank key");
        assert!(error.to_string().contains("empty"));
    }
}
