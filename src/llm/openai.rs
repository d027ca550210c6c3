use super::*;
use serde::Serialize;

pub const OPENAI_MODEL: &str = "gpt-3.5-turbo";

/// Persona instruction sent as the system message
pub const TURING_SYSTEM_PROMPT: &str = "You are participating in a Turing Test. \
    Always try to score maximum by mimicking a normal human being. \
    Your goal is to sound like a plain, practical human. \
    Avoid conversational fillers like 'Hmm, that's a good question,' or 'As an AI language model,' or 'I'm glad you asked.' \
    Do not use Gen Z slang or overly chatty tones. Be concise and direct. \
    Answer as a normal person would.";

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f64,
    max_tokens: u32,
    top_p: f64,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

fn build_request(prompt: &str) -> ChatCompletionRequest<'_> {
    ChatCompletionRequest {
        model: OPENAI_MODEL,
        messages: [
            ChatMessage {
                role: "system",
                content: TURING_SYSTEM_PROMPT,
            },
            ChatMessage {
                role: "user",
                content: prompt,
            },
        ],
        temperature: TEMPERATURE,
        max_tokens: MAX_OUTPUT_TOKENS,
        top_p: TOP_P,
    }
}

fn extract_text(response: ChatCompletionResponse) -> LlmResult<String> {
    let text = response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|message| message.content)
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty());

    text.ok_or_else(|| LlmError::ProviderApi {
        provider: Provider::OpenAi,
        message: response
            .error
            .and_then(|e| e.message)
            .unwrap_or_else(|| unknown_api_error(Provider::OpenAi)),
    })
}

pub(super) async fn generate(
    client: &reqwest::Client,
    base_url: &str,
    prompt: &str,
    api_key: &ApiKey,
) -> LlmResult<String> {
    let url = format!("{}/v1/chat/completions", base_url.trim_end_matches('/'));

    let request = client
        .post(&url)
        .bearer_auth(api_key.expose())
        .json(&build_request(prompt));

    let body = send(request, Provider::OpenAi).await?;
    let response: ChatCompletionResponse = decode(&body, Provider::OpenAi)?;
    extract_text(response)
}
