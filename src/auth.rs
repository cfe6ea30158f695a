//! 환경 변수로 설정하는 단순 접근 게이트.

/// 관리자 이메일 환경 변수
pub const ADMIN_EMAIL_ENV: &str = "DOMOS_ADMIN_EMAIL";
/// 관리자 비밀번호 환경 변수
pub const ADMIN_PASSWORD_ENV: &str = "DOMOS_ADMIN_PASSWORD";

/// 로그인 게이트. 두 값이 모두 없으면 열려 있다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessGate {
    Open,
    Credentials { email: String, password: String },
}

impl AccessGate {
    /// `DOMOS_ADMIN_EMAIL`/`DOMOS_ADMIN_PASSWORD`에서 게이트를 구성한다.
    pub fn from_env() -> Self {
        let email = std::env::var(ADMIN_EMAIL_ENV).unwrap_or_default();
        let password = std::env::var(ADMIN_PASSWORD_ENV).unwrap_or_default();
        Self::new(&email, &password)
    }

    pub fn new(email: &str, password: &str) -> Self {
        if email.trim().is_empty() && password.is_empty() {
            AccessGate::Open
        } else {
            AccessGate::Credentials {
                email: email.trim().to_string(),
                password: password.to_string(),
            }
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, AccessGate::Open)
    }

    /// 이메일은 대소문자/앞뒤 공백을 무시하고, 비밀번호는 정확히 비교한다.
    pub fn verify(&self, email: &str, password: &str) -> bool {
        match self {
            AccessGate::Open => true,
            AccessGate::Credentials {
                email: expected_email,
                password: expected_password,
            } => {
                email.trim().to_lowercase() == expected_email.to_lowercase()
                    && password == expected_password
            }
        }
    }
}
