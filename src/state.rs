//! 화면 상태와 갱신 규칙.
//!
//! 편집 중인 입력값, 다크 모드, 탭, AI 패널 상태를 하나의 [`AppState`]에 모으고
//! [`Message`] 하나씩 [`AppState::update`]로 적용한다. 외부 호출이 필요한 경우
//! [`Command`]를 돌려주고, 실행 결과는 다시 Message로 들어온다.

use std::time::{Duration, Instant};

use chrono::NaiveDate;

use crate::ai::{prompt::DEFAULT_DESIGN_PROMPT, AiError, ImagePayload};
use crate::auth::AccessGate;
use crate::config::Config;
use crate::feasibility::{calculate, CalculationResults, InputField, ProjectInputs};
use crate::i18n::Translator;
use crate::project::{default_project_name, find_duplicate_location, SavedProject};

/// 알림 표시 시간
pub const NOTIFICATION_TTL: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Overview,
    Breakdown,
    Design,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

/// 잠시 보였다 사라지는 알림. 문구는 언어팩 키로 들고 있다.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub kind: NoticeKind,
    pub key: &'static str,
    pub detail: Option<String>,
    posted_at: Option<Instant>,
}

impl Notification {
    /// 현재 언어로 표시할 문장. `{name}`/`{detail}` 자리에 상세 내용을 넣는다.
    pub fn text(&self, tr: &Translator) -> String {
        let detail = self.detail.clone().unwrap_or_default();
        tr.tf(self.key, &[("name", detail.clone()), ("detail", detail)])
    }
}

/// AI 실패 요약. 서비스 차단 여부와 메시지만 남긴다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AiFailure {
    pub blocked: bool,
    pub message: String,
}

impl From<&AiError> for AiFailure {
    fn from(err: &AiError) -> Self {
        Self {
            blocked: err.is_service_blocked(),
            message: err.to_string(),
        }
    }
}

impl From<AiError> for AiFailure {
    fn from(err: AiError) -> Self {
        Self::from(&err)
    }
}

/// AI 패널에 남는 오류.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelError {
    /// API 활성화 안내를 보여준다
    ServiceBlocked,
    Message(String),
}

impl PanelError {
    pub fn text(&self, tr: &Translator) -> String {
        match self {
            PanelError::ServiceBlocked => tr.t("ai.service_blocked"),
            PanelError::Message(m) => tr.tf("ai.error", &[("detail", m.clone())]),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalysisState {
    pub loading: bool,
    pub content: Option<String>,
    pub error: Option<PanelError>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DesignState {
    pub original: Option<ImagePayload>,
    pub generated: Option<ImagePayload>,
    pub prompt: String,
    pub loading: bool,
    pub error: Option<PanelError>,
}

impl Default for DesignState {
    fn default() -> Self {
        Self {
            original: None,
            generated: None,
            prompt: DEFAULT_DESIGN_PROMPT.to_string(),
            loading: false,
            error: None,
        }
    }
}

/// 저장 대화상자 단계.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveDialog {
    Closed,
    Naming { name: String },
    /// 같은 주소가 이미 저장되어 있어 확인을 받는 중
    DuplicateWarning { name: String },
}

/// 화면 이벤트.
#[derive(Debug, Clone)]
pub enum Message {
    SetField(InputField, f64),
    SetLocation(String),
    SetOwnerNotes(String),
    Clear,
    ToggleDarkMode,
    SelectTab(Tab),
    Login { email: String, password: String },
    Logout,
    OpenSaveDialog { today: NaiveDate },
    SetSaveName(String),
    ConfirmSave,
    SaveAnyway,
    CancelSave,
    ProjectSaved(Result<SavedProject, String>),
    RefreshProjects,
    ProjectsLoaded(Result<Vec<SavedProject>, String>),
    LoadProject(String),
    DeleteProject(String),
    ProjectDeleted(Result<String, String>),
    EstimatePrice,
    PriceEstimated(Result<f64, AiFailure>),
    RequestAnalysis,
    AnalysisReady(Result<String, AiFailure>),
    ImageSelected(ImagePayload),
    ImageRejected(String),
    SetDesignPrompt(String),
    GenerateDesign,
    DesignReady(Result<ImagePayload, AiFailure>),
    DismissNotification,
    Tick(Instant),
}

/// 외부 협력자 호출 요청.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SaveProject { name: String, inputs: ProjectInputs },
    DeleteProject { id: String },
    RefreshProjects,
    EstimatePrice { location: String, plot_size: f64 },
    Analyze {
        inputs: ProjectInputs,
        results: CalculationResults,
    },
    Visualize { image: ImagePayload, prompt: String },
}

/// 애플리케이션 전체 상태.
#[derive(Debug, Clone)]
pub struct AppState {
    pub inputs: ProjectInputs,
    pub dark_mode: bool,
    pub tab: Tab,
    pub authenticated: bool,
    pub analysis: AnalysisState,
    pub design: DesignState,
    pub projects: Vec<SavedProject>,
    pub loading_projects: bool,
    pub estimating_price: bool,
    pub save_dialog: SaveDialog,
    pub notification: Option<Notification>,
    gate: AccessGate,
}

impl AppState {
    pub fn new(config: &Config, gate: AccessGate) -> Self {
        Self {
            inputs: config.defaults.clone(),
            dark_mode: config.dark_mode,
            tab: Tab::Overview,
            authenticated: gate.is_open(),
            analysis: AnalysisState::default(),
            design: DesignState::default(),
            projects: Vec::new(),
            loading_projects: true,
            estimating_price: false,
            save_dialog: SaveDialog::Closed,
            notification: None,
            gate,
        }
    }

    /// 현재 입력값의 계산 결과. 캐시하지 않는다.
    pub fn results(&self) -> CalculationResults {
        calculate(&self.inputs)
    }

    pub fn login_required(&self) -> bool {
        !self.gate.is_open()
    }

    fn notify(&mut self, kind: NoticeKind, key: &'static str, detail: Option<String>) {
        self.notification = Some(Notification {
            kind,
            key,
            detail,
            posted_at: None,
        });
    }

    /// 입력이 바뀌면 이전 분석 결과는 더 이상 맞지 않으므로 지운다.
    fn inputs_changed(&mut self) {
        if self.analysis.content.is_some() {
            self.analysis.content = None;
            self.analysis.error = None;
        }
    }

    fn block_analysis_panel(&mut self) {
        self.analysis.error = Some(PanelError::ServiceBlocked);
    }

    /// 이벤트 하나를 적용하고, 필요하면 외부 호출을 돌려준다.
    pub fn update(&mut self, msg: Message) -> Option<Command> {
        match msg {
            Message::SetField(field, value) => {
                self.inputs.set(field, value);
                self.inputs_changed();
            }
            Message::SetLocation(location) => {
                self.inputs.location = location;
                self.inputs_changed();
            }
            Message::SetOwnerNotes(notes) => {
                self.inputs.owner_notes = if notes.is_empty() { None } else { Some(notes) };
                self.inputs_changed();
            }
            Message::Clear => {
                self.inputs = ProjectInputs::empty();
                self.analysis = AnalysisState::default();
                self.design = DesignState::default();
                self.estimating_price = false;
                self.tab = Tab::Overview;
                self.notify(NoticeKind::Success, "general.fields_cleared", None);
            }
            Message::ToggleDarkMode => self.dark_mode = !self.dark_mode,
            Message::SelectTab(tab) => self.tab = tab,
            Message::Login { email, password } => {
                if self.gate.verify(&email, &password) {
                    self.authenticated = true;
                    self.notify(NoticeKind::Success, "auth.welcome", None);
                } else {
                    tracing::warn!("rejected sign-in attempt");
                    self.notify(NoticeKind::Error, "auth.invalid", None);
                }
            }
            Message::Logout => {
                self.authenticated = !self.login_required();
                self.notify(NoticeKind::Success, "auth.logged_out", None);
            }
            Message::OpenSaveDialog { today } => {
                self.save_dialog = SaveDialog::Naming {
                    name: default_project_name(&self.inputs, today),
                };
            }
            Message::SetSaveName(name) => {
                if let SaveDialog::Naming { name: current } = &mut self.save_dialog {
                    *current = name;
                }
            }
            Message::ConfirmSave => {
                let SaveDialog::Naming { name } = &self.save_dialog else {
                    return None;
                };
                let name = name.trim().to_string();
                if name.is_empty() {
                    return None;
                }
                if find_duplicate_location(&self.projects, &self.inputs.location).is_some() {
                    self.save_dialog = SaveDialog::DuplicateWarning { name };
                    return None;
                }
                return Some(Command::SaveProject {
                    name,
                    inputs: self.inputs.clone(),
                });
            }
            Message::SaveAnyway => {
                if let SaveDialog::DuplicateWarning { name } = &self.save_dialog {
                    return Some(Command::SaveProject {
                        name: name.clone(),
                        inputs: self.inputs.clone(),
                    });
                }
            }
            Message::CancelSave => self.save_dialog = SaveDialog::Closed,
            Message::ProjectSaved(Ok(project)) => {
                self.projects.insert(0, project);
                self.save_dialog = SaveDialog::Closed;
                self.notify(NoticeKind::Success, "project.saved", None);
            }
            Message::ProjectSaved(Err(reason)) => {
                self.notify(NoticeKind::Error, "project.save_failed", Some(reason));
            }
            Message::RefreshProjects => {
                self.loading_projects = true;
                return Some(Command::RefreshProjects);
            }
            Message::ProjectsLoaded(result) => {
                self.loading_projects = false;
                match result {
                    Ok(projects) => self.projects = projects,
                    Err(reason) => {
                        self.notify(NoticeKind::Error, "project.load_failed", Some(reason))
                    }
                }
            }
            Message::LoadProject(id) => {
                if let Some(project) = self.projects.iter().find(|p| p.id == id).cloned() {
                    self.inputs = project.inputs;
                    self.analysis = AnalysisState::default();
                    self.tab = Tab::Overview;
                    self.notify(NoticeKind::Success, "project.loaded", Some(project.name));
                }
            }
            Message::DeleteProject(id) => return Some(Command::DeleteProject { id }),
            Message::ProjectDeleted(Ok(id)) => {
                self.projects.retain(|p| p.id != id);
                self.notify(NoticeKind::Success, "project.deleted", None);
            }
            Message::ProjectDeleted(Err(reason)) => {
                self.notify(NoticeKind::Error, "project.delete_failed", Some(reason));
            }
            Message::EstimatePrice => {
                if self.inputs.location.trim().is_empty() {
                    self.notify(NoticeKind::Error, "ai.need_location", None);
                    return None;
                }
                self.estimating_price = true;
                return Some(Command::EstimatePrice {
                    location: self.inputs.location.clone(),
                    plot_size: self.inputs.plot_size,
                });
            }
            Message::PriceEstimated(result) => {
                self.estimating_price = false;
                match result {
                    Ok(price) if price > 0.0 => {
                        self.inputs.plot_price = price;
                        self.inputs_changed();
                        self.notify(NoticeKind::Success, "ai.estimate_ok", None);
                    }
                    Ok(_) => {}
                    Err(failure) if failure.blocked => {
                        self.block_analysis_panel();
                        self.notify(NoticeKind::Error, "ai.service_blocked", None);
                    }
                    Err(failure) => {
                        tracing::warn!(reason = %failure.message, "price estimate failed");
                        self.notify(NoticeKind::Error, "ai.estimate_failed", None);
                    }
                }
            }
            Message::RequestAnalysis => {
                self.analysis = AnalysisState {
                    loading: true,
                    content: None,
                    error: None,
                };
                return Some(Command::Analyze {
                    inputs: self.inputs.clone(),
                    results: self.results(),
                });
            }
            Message::AnalysisReady(result) => {
                self.analysis.loading = false;
                match result {
                    Ok(text) => {
                        self.analysis.content = Some(text);
                        self.analysis.error = None;
                    }
                    Err(failure) => {
                        self.analysis.content = None;
                        self.analysis.error = Some(if failure.blocked {
                            PanelError::ServiceBlocked
                        } else {
                            PanelError::Message(failure.message)
                        });
                    }
                }
            }
            Message::ImageSelected(image) => {
                self.design.original = Some(image);
                self.design.generated = None;
                self.design.error = None;
            }
            Message::ImageRejected(reason) => {
                self.design.error = Some(PanelError::Message(reason));
            }
            Message::SetDesignPrompt(prompt) => self.design.prompt = prompt,
            Message::GenerateDesign => {
                let image = self.design.original.clone()?;
                self.design.loading = true;
                self.design.error = None;
                return Some(Command::Visualize {
                    image,
                    prompt: self.design.prompt.clone(),
                });
            }
            Message::DesignReady(result) => {
                self.design.loading = false;
                match result {
                    Ok(image) => self.design.generated = Some(image),
                    Err(failure) if failure.blocked => {
                        self.block_analysis_panel();
                        self.design.error = Some(PanelError::ServiceBlocked);
                    }
                    Err(failure) => {
                        self.design.error = Some(PanelError::Message(failure.message));
                    }
                }
            }
            Message::DismissNotification => self.notification = None,
            Message::Tick(now) => {
                let expired = match &mut self.notification {
                    Some(n) => match n.posted_at {
                        None => {
                            n.posted_at = Some(now);
                            false
                        }
                        Some(at) => now.duration_since(at) >= NOTIFICATION_TTL,
                    },
                    None => false,
                };
                if expired {
                    self.notification = None;
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    fn state() -> AppState {
        AppState::new(&Config::default(), AccessGate::Open)
    }

    fn saved(id: &str, location: &str) -> SavedProject {
        SavedProject {
            id: id.into(),
            name: format!("{id} name"),
            created_at: Utc::now(),
            inputs: ProjectInputs {
                location: location.into(),
                plot_size: 300.0,
                ..ProjectInputs::default()
            },
        }
    }

    fn blocked() -> AiFailure {
        AiFailure {
            blocked: true,
            message: "403".into(),
        }
    }

    #[test]
    fn editing_clears_previous_analysis() {
        let mut s = state();
        s.update(Message::AnalysisReady(Ok("looks good".into())));
        s.update(Message::SetField(InputField::SalePricePerSqm, 5000.0));
        assert_eq!(s.analysis, AnalysisState::default());
        assert_eq!(s.results().revenue_total, 400.0 * 5000.0);
    }

    #[test]
    fn clear_resets_everything_but_projects() {
        let mut s = state();
        s.update(Message::ProjectsLoaded(Ok(vec![saved("a", "Athens")])));
        s.update(Message::SelectTab(Tab::Design));
        s.update(Message::SetDesignPrompt("add trees".into()));
        s.update(Message::Clear);
        assert_eq!(s.inputs, ProjectInputs::empty());
        assert_eq!(s.tab, Tab::Overview);
        assert_eq!(s.design, DesignState::default());
        assert_eq!(s.projects.len(), 1);
        assert_eq!(
            s.notification.as_ref().map(|n| n.key),
            Some("general.fields_cleared")
        );
    }

    #[test]
    fn save_flow_warns_on_duplicate_location() {
        let mut s = state();
        s.update(Message::ProjectsLoaded(Ok(vec![saved("a", "athens, greece ")])));
        s.update(Message::OpenSaveDialog {
            today: NaiveDate::from_ymd_opt(2025, 1, 2).expect("date"),
        });
        assert_eq!(
            s.save_dialog,
            SaveDialog::Naming {
                name: "Athens, Greece".into()
            }
        );
        assert_eq!(s.update(Message::ConfirmSave), None);
        assert!(matches!(s.save_dialog, SaveDialog::DuplicateWarning { .. }));
        let cmd = s.update(Message::SaveAnyway);
        assert!(matches!(cmd, Some(Command::SaveProject { ref name, .. }) if name == "Athens, Greece"));
    }

    #[test]
    fn blank_save_name_is_ignored() {
        let mut s = state();
        s.update(Message::OpenSaveDialog {
            today: NaiveDate::from_ymd_opt(2025, 1, 2).expect("date"),
        });
        s.update(Message::SetSaveName("   ".into()));
        assert_eq!(s.update(Message::ConfirmSave), None);
        assert!(matches!(s.save_dialog, SaveDialog::Naming { .. }));
    }

    #[test]
    fn saved_project_goes_to_top_and_closes_dialog() {
        let mut s = state();
        s.update(Message::ProjectsLoaded(Ok(vec![saved("old", "Patra")])));
        s.update(Message::ProjectSaved(Ok(saved("new", "Volos"))));
        assert_eq!(s.projects[0].id, "new");
        assert_eq!(s.save_dialog, SaveDialog::Closed);
    }

    #[test]
    fn loading_a_project_copies_inputs() {
        let mut s = state();
        s.update(Message::ProjectsLoaded(Ok(vec![saved("a", "Patra")])));
        s.update(Message::SelectTab(Tab::Breakdown));
        s.update(Message::LoadProject("a".into()));
        assert_eq!(s.inputs.location, "Patra");
        assert_eq!(s.inputs.plot_size, 300.0);
        assert_eq!(s.tab, Tab::Overview);
        assert_eq!(s.notification.as_ref().and_then(|n| n.detail.clone()), Some("a name".into()));
        let tr = Translator::new("en");
        assert_eq!(s.notification.as_ref().map(|n| n.text(&tr)), Some("Loaded \"a name\"".into()));
    }

    #[test]
    fn delete_removes_after_confirmation_from_store() {
        let mut s = state();
        s.update(Message::ProjectsLoaded(Ok(vec![saved("a", "x"), saved("b", "y")])));
        assert_eq!(
            s.update(Message::DeleteProject("a".into())),
            Some(Command::DeleteProject { id: "a".into() })
        );
        assert_eq!(s.projects.len(), 2);
        s.update(Message::ProjectDeleted(Ok("a".into())));
        assert_eq!(s.projects.len(), 1);
        assert_eq!(s.projects[0].id, "b");
    }

    #[test]
    fn estimate_needs_location() {
        let mut s = state();
        s.update(Message::SetLocation("  ".into()));
        assert_eq!(s.update(Message::EstimatePrice), None);
        assert!(!s.estimating_price);
        assert_eq!(s.notification.as_ref().map(|n| n.key), Some("ai.need_location"));
    }

    #[test]
    fn positive_estimate_updates_plot_price() {
        let mut s = state();
        let cmd = s.update(Message::EstimatePrice);
        assert_eq!(
            cmd,
            Some(Command::EstimatePrice {
                location: "Athens, Greece".into(),
                plot_size: 500.0
            })
        );
        assert!(s.estimating_price);
        s.update(Message::PriceEstimated(Ok(210_000.0)));
        assert!(!s.estimating_price);
        assert_eq!(s.inputs.plot_price, 210_000.0);
    }

    #[test]
    fn zero_estimate_leaves_price_alone() {
        let mut s = state();
        s.update(Message::EstimatePrice);
        s.update(Message::PriceEstimated(Ok(0.0)));
        assert_eq!(s.inputs.plot_price, 150_000.0);
        assert!(s.notification.is_none());
    }

    #[test]
    fn blocked_estimate_marks_analysis_panel() {
        let mut s = state();
        s.update(Message::EstimatePrice);
        s.update(Message::PriceEstimated(Err(blocked())));
        assert_eq!(s.analysis.error, Some(PanelError::ServiceBlocked));
        assert_eq!(s.notification.as_ref().map(|n| n.kind), Some(NoticeKind::Error));
        assert_eq!(s.inputs.plot_price, 150_000.0);
    }

    #[test]
    fn analysis_request_carries_current_results() {
        let mut s = state();
        match s.update(Message::RequestAnalysis) {
            Some(Command::Analyze { results, .. }) => {
                assert_eq!(results, calculate(&ProjectInputs::default()))
            }
            other => panic!("unexpected command {other:?}"),
        }
        assert!(s.analysis.loading);
        s.update(Message::AnalysisReady(Err(AiFailure {
            blocked: false,
            message: "timeout".into(),
        })));
        assert!(!s.analysis.loading);
        assert_eq!(s.analysis.error, Some(PanelError::Message("timeout".into())));
    }

    #[test]
    fn design_needs_an_uploaded_image() {
        let mut s = state();
        assert_eq!(s.update(Message::GenerateDesign), None);
        let img = ImagePayload {
            mime_type: "image/png".into(),
            data: vec![1, 2, 3],
        };
        s.update(Message::ImageSelected(img.clone()));
        let cmd = s.update(Message::GenerateDesign);
        assert_eq!(
            cmd,
            Some(Command::Visualize {
                image: img,
                prompt: DEFAULT_DESIGN_PROMPT.into()
            })
        );
        s.update(Message::DesignReady(Err(blocked())));
        assert_eq!(s.design.error, Some(PanelError::ServiceBlocked));
        assert_eq!(s.analysis.error, Some(PanelError::ServiceBlocked));
    }

    #[test]
    fn collaborator_failures_leave_inputs_untouched() {
        let mut s = state();
        let before = s.inputs.clone();
        s.update(Message::ProjectSaved(Err("offline".into())));
        s.update(Message::ProjectDeleted(Err("offline".into())));
        s.update(Message::AnalysisReady(Err(blocked())));
        assert_eq!(s.inputs, before);
    }

    #[test]
    fn notification_expires_after_ttl() {
        let mut s = state();
        s.update(Message::ToggleDarkMode);
        s.update(Message::Clear);
        let t0 = Instant::now();
        s.update(Message::Tick(t0));
        s.update(Message::Tick(t0 + Duration::from_secs(1)));
        assert!(s.notification.is_some());
        s.update(Message::Tick(t0 + NOTIFICATION_TTL));
        assert!(s.notification.is_none());
        assert!(s.dark_mode);
    }

    #[test]
    fn gate_requires_matching_credentials() {
        let mut s = AppState::new(&Config::default(), AccessGate::new("a@b.gr", "pw"));
        assert!(!s.authenticated);
        s.update(Message::Login {
            email: "a@b.gr".into(),
            password: "nope".into(),
        });
        assert!(!s.authenticated);
        s.update(Message::Login {
            email: "A@B.GR".into(),
            password: "pw".into(),
        });
        assert!(s.authenticated);
        s.update(Message::Logout);
        assert!(!s.authenticated);
    }
}
