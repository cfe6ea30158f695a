//! Google Gemini `generateContent` REST 클라이언트.
//!
//! API 키는 설정에 지정한 환경 변수에서 읽는다. 호출은 blocking 이며,
//! GUI에서는 작업 스레드에서 실행한다.
use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use super::prompt::{
    analysis_or_placeholder, analysis_prompt, estimate_prompt, parse_price_estimate,
    visualization_prompt,
};
use super::{classify_failure, AiError, AiService, ImagePayload};
use crate::config::AiSettings;
use crate::feasibility::{CalculationResults, ProjectInputs};

/// Gemini 클라이언트.
pub struct GeminiClient {
    client: Client,
    settings: AiSettings,
    api_key: String,
}

impl GeminiClient {
    /// 환경 변수에서 API 키를 읽어 클라이언트를 만든다.
    pub fn from_settings(settings: &AiSettings) -> Result<Self, AiError> {
        let api_key = std::env::var(&settings.api_key_env).unwrap_or_default();
        Self::with_key(settings, api_key)
    }

    /// 키를 직접 넘겨 만든다. 비었거나 "undefined"이면 설정 오류.
    pub fn with_key(settings: &AiSettings, api_key: String) -> Result<Self, AiError> {
        let key = api_key.trim();
        if key.is_empty() || key == "undefined" {
            return Err(AiError::MissingApiKey {
                env: settings.api_key_env.clone(),
            });
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| AiError::Request {
                reason: e.to_string(),
            })?;
        Ok(Self {
            client,
            settings: settings.clone(),
            api_key: key.to_string(),
        })
    }

    fn api_url(&self, model: &str) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.settings.base_url.trim_end_matches('/'),
            model
        )
    }

    fn generate(&self, model: &str, body: &GenerateRequest) -> Result<GenerateResponse, AiError> {
        let url = self.api_url(model);
        tracing::debug!(%url, "sending Gemini request");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .map_err(|e| {
                tracing::error!("Gemini request failed: {e}");
                AiError::Request {
                    reason: e.to_string(),
                }
            })?;

        let status = response.status();
        let text = response.text().unwrap_or_default();
        tracing::debug!(%status, "Gemini response");

        if !status.is_success() {
            let err = classify_failure(status.as_u16(), &text);
            tracing::warn!(%status, blocked = err.is_service_blocked(), "Gemini call rejected");
            return Err(err);
        }

        serde_json::from_str(&text).map_err(|e| AiError::InvalidResponse {
            reason: format!("JSON parse error: {e}"),
        })
    }
}

impl AiService for GeminiClient {
    fn estimate_plot_price(&self, location: &str, plot_size: f64) -> Result<f64, AiError> {
        let request = GenerateRequest::text(estimate_prompt(location, plot_size), None);
        let response = self.generate(&self.settings.text_model, &request)?;
        let price = parse_price_estimate(&response.text().unwrap_or_default());
        tracing::info!(location, plot_size, price, "plot price estimated");
        Ok(price)
    }

    fn generate_visualization(
        &self,
        image: &ImagePayload,
        prompt: &str,
    ) -> Result<ImagePayload, AiError> {
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: image.mime_type.clone(),
                            data: image.to_base64(),
                        },
                    },
                    Part::Text {
                        text: visualization_prompt(prompt),
                    },
                ],
            }],
            generation_config: None,
        };
        let response = self.generate(&self.settings.image_model, &request)?;
        let inline = response.first_image().ok_or(AiError::NoImage)?;
        let mut payload = ImagePayload::from_base64(&inline.data)?;
        if !inline.mime_type.is_empty() {
            payload.mime_type = inline.mime_type.clone();
        }
        Ok(payload)
    }

    fn analyze(
        &self,
        inputs: &ProjectInputs,
        results: &CalculationResults,
    ) -> Result<String, AiError> {
        let config = GenerationConfig {
            temperature: Some(self.settings.temperature),
            thinking_config: Some(ThinkingConfig { thinking_budget: 0 }),
        };
        let request = GenerateRequest::text(analysis_prompt(inputs, results), Some(config));
        let response = self.generate(&self.settings.text_model, &request)?;
        Ok(analysis_or_placeholder(response.text()))
    }
}

// --- generateContent 요청/응답 형식 ---

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

impl GenerateRequest {
    fn text(prompt: String, generation_config: Option<GenerationConfig>) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![Part::Text { text: prompt }],
            }],
            generation_config,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
    Other(serde_json::Value),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    #[serde(default)]
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    thinking_config: Option<ThinkingConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ThinkingConfig {
    thinking_budget: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

impl GenerateResponse {
    fn parts(&self) -> impl Iterator<Item = &Part> {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .into_iter()
            .flat_map(|c| c.parts.iter())
    }

    /// 첫 후보의 텍스트 조각을 이어 붙인다.
    fn text(&self) -> Option<String> {
        let joined: String = self
            .parts()
            .filter_map(|p| match p {
                Part::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        if joined.is_empty() {
            None
        } else {
            Some(joined)
        }
    }

    fn first_image(&self) -> Option<&InlineData> {
        self.parts().find_map(|p| match p {
            Part::InlineData { inline_data } if !inline_data.data.is_empty() => Some(inline_data),
            _ => None,
        })
    }
}
