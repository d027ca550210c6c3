use super::*;
use serde::Serialize;

pub const GEMINI_MODEL: &str = "gemini-2.0-flash";
const TOP_K: u32 = 40;

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f64,
    top_p: f64,
    top_k: u32,
    max_output_tokens: u32,
    #[serde(rename = "responseMimeType")]
    response_mime_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

fn build_request(prompt: &str) -> GenerateContentRequest<'_> {
    GenerateContentRequest {
        contents: vec![Content {
            role: "user",
            parts: vec![RequestPart { text: prompt }],
        }],
        generation_config: GenerationConfig {
            temperature: TEMPERATURE,
            top_p: TOP_P,
            top_k: TOP_K,
            max_output_tokens: MAX_OUTPUT_TOKENS,
            response_mime_type: "text/plain",
        },
    }
}

/// Take `candidates[0].content.parts[0].text`, or explain why it is missing
fn extract_text(response: GenerateContentResponse) -> LlmResult<String> {
    let text = response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .and_then(|content| content.parts.into_iter().next())
        .and_then(|part| part.text)
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty());

    text.ok_or_else(|| LlmError::ProviderApi {
        provider: Provider::Gemini,
        message: response
            .error
            .and_then(|e| e.message)
            .unwrap_or_else(|| unknown_api_error(Provider::Gemini)),
    })
}

pub(super) async fn generate(
    client: &reqwest::Client,
    base_url: &str,
    prompt: &str,
    api_key: &ApiKey,
) -> LlmResult<String> {
    let url = format!(
        "{}/v1beta/models/{}:generateContent",
        base_url.trim_end_matches('/'),
        GEMINI_MODEL
    );

    let request = client
        .post(&url)
        .query(&[("key", api_key.expose())])
        .json(&build_request(prompt));

    let body = send(request, Provider::Gemini).await?;
    let response: GenerateContentResponse = decode(&body, Provider::Gemini)?;
    extract_text(response)
}
