use crate::config::VertexConfig;
use crate::models::contributions::Contributions;
use anyhow::{Result, anyhow};
use log::{error, info};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    role: String,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
    #[serde(rename = "topP")]
    top_p: f32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

/// Gemini on Vertex AI, authenticated with an OAuth access token.
pub struct GeminiClient {
    client: reqwest::Client,
    access_token: String,
    project: String,
    location: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(config: &VertexConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            access_token: config.access_token.clone(),
            project: config.project.clone(),
            location: config.location.clone(),
            model: config.model.clone(),
            base_url: config.api_url.trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/projects/{}/locations/{}/publishers/google/models/{}:generateContent",
            self.base_url, self.project, self.location, self.model
        )
    }

    /// Sends the prompt followed by each context document as one user turn and
    /// returns the text of the first candidate, which may be empty.
    async fn generate_content(&self, prompt: &str, context: &[String]) -> Result<String> {
        let parts = std::iter::once(prompt.to_string())
            .chain(context.iter().cloned())
            .map(|text| GeminiPart { text })
            .collect();

        let request = GeminiRequest {
            contents: vec![GeminiContent {
                role: "user".to_string(),
                parts,
            }],
            generation_config: GenerationConfig {
                temperature: 0.4,
                top_p: 0.95,
                max_output_tokens: 4096,
            },
        };

        let response = self.client
            .post(self.endpoint())
            .bearer_auth(&self.access_token)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!("Gemini API error {}: {}", status, error_text);
            return Err(anyhow!("Gemini API error {}: {}", status, error_text));
        }

        let gemini_response: GeminiResponse = response.json().await?;

        let text = gemini_response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().map(|p| p.text).collect::<String>())
            .unwrap_or_default();

        Ok(text)
    }

    /// Asks the model to summarize the aggregated contributions.
    pub async fn summarize_contributions(
        &self,
        prompt: &str,
        contributions: &Contributions,
    ) -> Result<String> {
        let data = serde_json::to_string(contributions)?;
        info!("Requesting contribution summary from {}", self.model);
        let summary = self.generate_content(prompt, &[data]).await?;
        info!("Received {} characters of summary", summary.len());
        Ok(summary)
    }
}
