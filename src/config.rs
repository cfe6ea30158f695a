use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::feasibility::ProjectInputs;

/// 기본 설정 파일 경로
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// AI 서비스 연결 설정.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiSettings {
    /// API 키를 읽을 환경 변수 이름. 키 자체는 파일에 저장하지 않는다.
    pub api_key_env: String,
    pub base_url: String,
    /// 분석/가격 추정용 텍스트 모델
    pub text_model: String,
    /// 사진 편집용 이미지 모델
    pub image_model: String,
    /// 분석 응답 온도
    pub temperature: f32,
    pub timeout_secs: u64,
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            api_key_env: "GEMINI_API_KEY".to_string(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            text_model: "gemini-2.5-flash".to_string(),
            image_model: "gemini-2.5-flash-image".to_string(),
            temperature: 0.7,
            timeout_secs: 120,
        }
    }
}

/// 애플리케이션 설정을 표현한다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 언어 코드(auto/en/el)
    pub language: String,
    pub dark_mode: bool,
    /// 프로젝트 저장 파일 경로
    pub store_path: PathBuf,
    pub ai: AiSettings,
    /// 시작 시 입력값
    pub defaults: ProjectInputs,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            language: "auto".to_string(),
            dark_mode: false,
            store_path: PathBuf::from("projects.toml"),
            ai: AiSettings::default(),
            defaults: ProjectInputs::default(),
        }
    }
}

/// 설정 로드/저장 시 발생 가능한 오류를 표현한다.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 파일 입출력 오류
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML 역직렬화 오류
    #[error("config parse error: {0}")]
    Serde(#[from] toml::de::Error),
    /// TOML 직렬화 오류
    #[error("config serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// 지정한 경로에서 설정을 읽는다. 파일이 없으면 기본값을 그 경로에 저장한다.
pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
    if path.exists() {
        let content = fs::read_to_string(path)?;
        let cfg: Config = toml::from_str(&content)?;
        tracing::debug!(path = %path.display(), "config loaded");
        Ok(cfg)
    } else {
        let cfg = Config::default();
        cfg.save_to(path)?;
        tracing::info!(path = %path.display(), "default config written");
        Ok(cfg)
    }
}

impl Config {
    /// 설정을 지정한 경로에 저장한다.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_fills_defaults() {
        let cfg: Config = toml::from_str(
            r#"
dark_mode = true
[ai]
text_model = "gemini-x"
"#,
        )
        .expect("parse");
        assert!(cfg.dark_mode);
        assert_eq!(cfg.ai.text_model, "gemini-x");
        assert_eq!(cfg.ai.api_key_env, "GEMINI_API_KEY");
        assert_eq!(cfg.defaults, ProjectInputs::default());
    }

    #[test]
    fn missing_file_writes_default() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        let cfg = load_from(&path).expect("load");
        assert_eq!(cfg, Config::default());
        assert!(path.exists());
        assert_eq!(load_from(&path).expect("reload"), cfg);
    }

    #[test]
    fn save_to_writes_only_the_given_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("custom.toml");
        let cfg = Config {
            language: "el".into(),
            dark_mode: true,
            ..Config::default()
        };
        cfg.save_to(&path).expect("save");
        assert_eq!(load_from(&path).expect("reload"), cfg);
        assert!(!dir.path().join(DEFAULT_CONFIG_PATH).exists());
    }
}
