//! 생성형 AI 보조 기능: 대지 가격 추정, 사진 편집 시각화, 사업성 분석 문장.
//!
//! 계산 엔진과는 독립적이며 실패해도 편집 중인 입력/결과에는 영향이 없다.

pub mod gemini;
pub mod prompt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::feasibility::{CalculationResults, ProjectInputs};

pub use gemini::GeminiClient;

/// AI 호출 오류 분류.
///
/// (a) 설정 누락, (b) 원격 서비스 비활성/제한, (c) 그 외 일반 오류.
#[derive(Debug, thiserror::Error)]
pub enum AiError {
    /// API 키 환경 변수가 비어 있음
    #[error("Configuration error: Gemini API key is missing. Set the {env} environment variable.")]
    MissingApiKey { env: String },
    /// Generative Language API가 비활성화되었거나 키 사용이 제한됨
    #[error("AI service is disabled or restricted for this key: {reason}")]
    ServiceDisabled { reason: String },
    /// 요청 실패
    #[error("AI request failed: {reason}")]
    Request { reason: String },
    /// 응답 형식 오류
    #[error("invalid AI response: {reason}")]
    InvalidResponse { reason: String },
    /// 응답에 이미지가 없음
    #[error("no image generated in response")]
    NoImage,
    /// 이미지 디코딩 오류
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
    /// base64 디코딩 오류
    #[error("base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),
}

impl AiError {
    /// 서비스 비활성/제한 오류인지. 화면에서 일반 오류와 구분해 안내한다.
    pub fn is_service_blocked(&self) -> bool {
        matches!(self, AiError::ServiceDisabled { .. })
    }

    /// 설정 누락 오류인지.
    pub fn is_configuration(&self) -> bool {
        matches!(self, AiError::MissingApiKey { .. })
    }
}

/// 응답 본문에 나타나는 서비스 차단 표식
const BLOCKED_MARKERS: [&str; 4] = [
    "SERVICE_DISABLED",
    "API_KEY_SERVICE_BLOCKED",
    "has not been used",
    "API_KEY_HTTP_REFERRER_BLOCKED",
];

/// HTTP 상태와 본문으로 실패를 분류한다.
pub fn classify_failure(status: u16, body: &str) -> AiError {
    if status == 403 || BLOCKED_MARKERS.iter().any(|m| body.contains(m)) {
        AiError::ServiceDisabled {
            reason: format!("HTTP {status}"),
        }
    } else {
        AiError::Request {
            reason: format!("HTTP {status}: {body}"),
        }
    }
}

/// 전송용 이미지. 원본 바이트와 MIME 타입을 함께 들고 다닌다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl ImagePayload {
    /// 바이트에서 형식을 판별해 만든다. 지원하지 않는 형식이면 오류.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self, AiError> {
        let format = image::guess_format(&data)?;
        let mime_type = match format {
            image::ImageFormat::Png => "image/png",
            image::ImageFormat::Jpeg => "image/jpeg",
            image::ImageFormat::WebP => "image/webp",
            image::ImageFormat::Gif => "image/gif",
            _ => "application/octet-stream",
        };
        Ok(Self {
            mime_type: mime_type.to_string(),
            data,
        })
    }

    /// `data:image/...;base64,` 접두어가 있든 없든 base64 문자열을 해석한다.
    pub fn from_base64(text: &str) -> Result<Self, AiError> {
        let trimmed = text.trim();
        let (mime, b64) = match trimmed.strip_prefix("data:") {
            Some(rest) => {
                let (header, body) = rest.split_once(',').ok_or_else(|| {
                    AiError::InvalidResponse {
                        reason: "data URL without payload".to_string(),
                    }
                })?;
                let mime = header.trim_end_matches(";base64").to_string();
                (Some(mime), body)
            }
            None => (None, trimmed),
        };
        let data = STANDARD.decode(b64)?;
        match mime {
            Some(mime_type) => Ok(Self { mime_type, data }),
            None => Self::from_bytes(data),
        }
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.data)
    }

    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.to_base64())
    }

    /// 이미지로 디코딩해 본다. 업로드/저장 전에 손상된 파일을 거른다.
    pub fn decode(&self) -> Result<image::DynamicImage, AiError> {
        Ok(image::load_from_memory(&self.data)?)
    }

    /// 저장 시 쓸 파일 확장자
    pub fn extension(&self) -> &'static str {
        match self.mime_type.as_str() {
            "image/jpeg" => "jpg",
            "image/webp" => "webp",
            "image/gif" => "gif",
            _ => "png",
        }
    }
}

/// AI 협력자 계약.
pub trait AiService {
    /// 위치와 면적으로 대지 총액[EUR]을 추정한다.
    fn estimate_plot_price(&self, location: &str, plot_size: f64) -> Result<f64, AiError>;
    /// 사진과 지시문으로 편집된 시각화 이미지를 만든다.
    fn generate_visualization(
        &self,
        image: &ImagePayload,
        prompt: &str,
    ) -> Result<ImagePayload, AiError>;
    /// 입력/결과를 바탕으로 짧은 사업성 분석(Markdown)을 작성한다.
    fn analyze(
        &self,
        inputs: &ProjectInputs,
        results: &CalculationResults,
    ) -> Result<String, AiError>;
}

/// API 키가 없을 때 쓰는 대체 구현. 모든 호출이 설정 오류를 돌려준다.
#[derive(Debug, Clone)]
pub struct UnconfiguredAi {
    pub env: String,
}

impl UnconfiguredAi {
    fn missing(&self) -> AiError {
        AiError::MissingApiKey {
            env: self.env.clone(),
        }
    }
}

impl AiService for UnconfiguredAi {
    fn estimate_plot_price(&self, _location: &str, _plot_size: f64) -> Result<f64, AiError> {
        Err(self.missing())
    }

    fn generate_visualization(
        &self,
        _image: &ImagePayload,
        _prompt: &str,
    ) -> Result<ImagePayload, AiError> {
        Err(self.missing())
    }

    fn analyze(
        &self,
        _inputs: &ProjectInputs,
        _results: &CalculationResults,
    ) -> Result<String, AiError> {
        Err(self.missing())
    }
}
