//! 실행 흐름: 오류 타입, 협력자 구성, 상태 명령 실행, 대화형 CLI 루프.

use std::path::Path;
use std::sync::Arc;

use chrono::Local;

use crate::ai::{AiError, AiService, GeminiClient, UnconfiguredAi};
use crate::auth::AccessGate;
use crate::config::{AiSettings, Config, ConfigError};
use crate::feasibility::ProjectInputs;
use crate::i18n::{self, Translator};
use crate::project::{FileProjectStore, ProjectStore, StoreError};
use crate::state::{AiFailure, AppState, Command, Message, SaveDialog};
use crate::ui_cli::{self, MenuChoice};

/// 애플리케이션 실행 중 발생 가능한 오류를 표현한다.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// 파일 입출력 오류
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// 설정 저장/로드 오류
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    /// 프로젝트 저장소 오류
    #[error("project store error: {0}")]
    Store(#[from] StoreError),
    /// AI 호출 오류
    #[error("{0}")]
    Ai(#[from] AiError),
    /// JSON 출력 오류
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// 로그인 실패
    #[error("access denied")]
    AccessDenied,
}

/// 스레드 간에 공유하는 AI 협력자
pub type SharedAi = Arc<dyn AiService + Send + Sync>;

/// 설정으로 AI 협력자를 만든다. 키가 없으면 호출마다 설정 오류를 내는 대체 구현.
pub fn ai_service(settings: &AiSettings) -> SharedAi {
    match GeminiClient::from_settings(settings) {
        Ok(client) => Arc::new(client),
        Err(err) => {
            // 키가 없는 실행은 정상 경로
            if err.is_configuration() {
                tracing::info!("AI features disabled: {err}");
            } else {
                tracing::warn!("AI features unavailable: {err}");
            }
            Arc::new(UnconfiguredAi {
                env: settings.api_key_env.clone(),
            })
        }
    }
}

/// 설정의 저장 경로로 파일 저장소를 연다.
pub fn open_store(config: &Config) -> FileProjectStore {
    FileProjectStore::new(config.store_path.clone())
}

/// 저장소 명령을 실행하고 결과 메시지를 만든다. AI 명령이면 None.
pub fn perform_store(store: &mut dyn ProjectStore, cmd: &Command) -> Option<Message> {
    let msg = match cmd {
        Command::SaveProject { name, inputs } => {
            Message::ProjectSaved(store.create(name, inputs).map_err(|e| e.to_string()))
        }
        Command::DeleteProject { id } => Message::ProjectDeleted(
            store.delete(id).map(|_| id.clone()).map_err(|e| e.to_string()),
        ),
        Command::RefreshProjects => {
            Message::ProjectsLoaded(store.list().map_err(|e| e.to_string()))
        }
        _ => return None,
    };
    Some(msg)
}

/// AI 명령을 실행하고 결과 메시지를 만든다. 저장소 명령이면 None.
pub fn perform_ai(ai: &dyn AiService, cmd: &Command) -> Option<Message> {
    let msg = match cmd {
        Command::EstimatePrice {
            location,
            plot_size,
        } => Message::PriceEstimated(
            ai.estimate_plot_price(location, *plot_size)
                .map_err(AiFailure::from),
        ),
        Command::Analyze { inputs, results } => {
            Message::AnalysisReady(ai.analyze(inputs, results).map_err(AiFailure::from))
        }
        Command::Visualize { image, prompt } => Message::DesignReady(
            ai.generate_visualization(image, prompt)
                .map_err(AiFailure::from),
        ),
        _ => return None,
    };
    Some(msg)
}

/// 메시지를 적용하고, 나온 명령을 동기적으로 실행해 다시 적용한다.
pub fn dispatch(
    state: &mut AppState,
    msg: Message,
    store: &mut dyn ProjectStore,
    ai: &dyn AiService,
) {
    let mut next = Some(msg);
    while let Some(msg) = next.take() {
        if let Some(cmd) = state.update(msg) {
            next = perform_store(store, &cmd).or_else(|| perform_ai(ai, &cmd));
        }
    }
}

/// 대화형 CLI 애플리케이션의 메인 루프를 실행한다.
pub fn run(config: &mut Config, config_path: &Path, tr: &mut Translator) -> Result<(), AppError> {
    let mut store = open_store(config);
    let ai = ai_service(&config.ai);
    let mut state = AppState::new(config, AccessGate::from_env());

    if !state.authenticated {
        login(&mut state, &mut store, ai.as_ref(), tr)?;
    }
    dispatch(&mut state, Message::RefreshProjects, &mut store, ai.as_ref());
    state.notification = None;

    println!("{}", tr.t("general.welcome"));
    loop {
        match ui_cli::main_menu(tr)? {
            MenuChoice::EditInputs => {
                for msg in ui_cli::edit_inputs(tr, &state.inputs)? {
                    dispatch(&mut state, msg, &mut store, ai.as_ref());
                }
                state.notification = None;
                ui_cli::print_report(tr, &state.inputs, &state.results());
            }
            MenuChoice::ShowResults => ui_cli::print_report(tr, &state.inputs, &state.results()),
            MenuChoice::EstimatePrice => {
                println!("{}", tr.t("ai.estimating"));
                dispatch(&mut state, Message::EstimatePrice, &mut store, ai.as_ref());
                flush_notification(&mut state, tr);
                if let Some(err) = &state.analysis.error {
                    ui_cli::print_panel_error(tr, err);
                }
            }
            MenuChoice::Analyze => {
                println!("{}", tr.t("ai.analyzing"));
                dispatch(&mut state, Message::RequestAnalysis, &mut store, ai.as_ref());
                ui_cli::print_analysis(tr, &state.analysis);
            }
            MenuChoice::SaveProject => save_interactive(&mut state, &mut store, ai.as_ref(), tr)?,
            MenuChoice::Projects => ui_cli::print_comparison(tr, &state.projects),
            MenuChoice::LoadProject => {
                if let Some(id) = ui_cli::pick_project(tr, &state.projects)? {
                    dispatch(&mut state, Message::LoadProject(id), &mut store, ai.as_ref());
                    flush_notification(&mut state, tr);
                    ui_cli::print_report(tr, &state.inputs, &state.results());
                }
            }
            MenuChoice::DeleteProject => {
                if let Some(id) = ui_cli::pick_project(tr, &state.projects)? {
                    if ui_cli::confirm(&tr.t("project.confirm_delete"))? {
                        dispatch(&mut state, Message::DeleteProject(id), &mut store, ai.as_ref());
                        flush_notification(&mut state, tr);
                    }
                }
            }
            MenuChoice::Clear => {
                dispatch(&mut state, Message::Clear, &mut store, ai.as_ref());
                flush_notification(&mut state, tr);
            }
            MenuChoice::Settings => {
                if ui_cli::handle_settings(tr, config)? {
                    let code = i18n::resolve_language("auto", Some(config.language.as_str()));
                    *tr = Translator::new(&code);
                    config.save_to(config_path)?;
                    println!("{}", tr.t("settings.saved"));
                }
            }
            MenuChoice::Logout => {
                dispatch(&mut state, Message::Logout, &mut store, ai.as_ref());
                flush_notification(&mut state, tr);
                if !state.authenticated {
                    login(&mut state, &mut store, ai.as_ref(), tr)?;
                }
            }
            MenuChoice::Exit => {
                config.save_to(config_path)?;
                println!("{}", tr.t("general.app_exit"));
                break;
            }
        }
    }
    Ok(())
}

const LOGIN_ATTEMPTS: usize = 3;

fn login(
    state: &mut AppState,
    store: &mut dyn ProjectStore,
    ai: &dyn AiService,
    tr: &Translator,
) -> Result<(), AppError> {
    println!("{}", tr.t("auth.title"));
    for _ in 0..LOGIN_ATTEMPTS {
        let (email, password) = ui_cli::read_credentials(tr)?;
        dispatch(state, Message::Login { email, password }, store, ai);
        flush_notification(state, tr);
        if state.authenticated {
            return Ok(());
        }
    }
    Err(AppError::AccessDenied)
}

fn save_interactive(
    state: &mut AppState,
    store: &mut dyn ProjectStore,
    ai: &dyn AiService,
    tr: &Translator,
) -> Result<(), AppError> {
    let today = Local::now().date_naive();
    dispatch(state, Message::OpenSaveDialog { today }, store, ai);
    let SaveDialog::Naming { name } = &state.save_dialog else {
        return Ok(());
    };
    let typed = ui_cli::read_with_default(&tr.t("project.name_prompt"), name)?;
    dispatch(state, Message::SetSaveName(typed), store, ai);
    dispatch(state, Message::ConfirmSave, store, ai);

    if let SaveDialog::DuplicateWarning { .. } = state.save_dialog {
        println!("{}", tr.t("project.duplicate_title"));
        println!(
            "{}",
            tr.tf("project.duplicate_body", &[("location", state.inputs.location.clone())])
        );
        let msg = if ui_cli::confirm(&tr.t("project.save_anyway"))? {
            Message::SaveAnyway
        } else {
            Message::CancelSave
        };
        dispatch(state, msg, store, ai);
    }
    flush_notification(state, tr);
    if state.save_dialog != SaveDialog::Closed {
        dispatch(state, Message::CancelSave, store, ai);
    }
    Ok(())
}

/// CLI에서는 알림을 바로 출력하고 지운다.
fn flush_notification(state: &mut AppState, tr: &Translator) {
    if let Some(n) = state.notification.take() {
        ui_cli::print_notification(tr, &n);
    }
}

/// 입력값 보고서를 출력한다(calc 명령).
pub fn print_calculation(
    tr: &Translator,
    inputs: &ProjectInputs,
    json: bool,
) -> Result<(), AppError> {
    let results = inputs.results();
    if json {
        let out = serde_json::json!({
            "inputs": inputs,
            "results": results,
            "warnings": inputs.warnings().iter().map(|w| w.key()).collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        ui_cli::print_report(tr, inputs, &results);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::ImagePayload;
    use crate::feasibility::CalculationResults;
    use crate::project::MemoryProjectStore;
    use crate::state::PanelError;

    struct FixedAi {
        price: f64,
    }

    impl AiService for FixedAi {
        fn estimate_plot_price(&self, _location: &str, _plot_size: f64) -> Result<f64, AiError> {
            Ok(self.price)
        }

        fn generate_visualization(
            &self,
            _image: &ImagePayload,
            _prompt: &str,
        ) -> Result<ImagePayload, AiError> {
            Err(AiError::ServiceDisabled {
                reason: "HTTP 403".into(),
            })
        }

        fn analyze(
            &self,
            _inputs: &ProjectInputs,
            results: &CalculationResults,
        ) -> Result<String, AiError> {
            Ok(format!("margin {:.1}", results.profit_margin))
        }
    }

    fn fixture() -> (AppState, MemoryProjectStore, FixedAi) {
        (
            AppState::new(&Config::default(), AccessGate::Open),
            MemoryProjectStore::new(),
            FixedAi { price: 99_000.0 },
        )
    }

    #[test]
    fn save_then_refresh_round_trips_through_store() {
        let (mut state, mut store, ai) = fixture();
        let cmd = Command::SaveProject {
            name: "Villa".into(),
            inputs: ProjectInputs::default(),
        };
        let msg = perform_store(&mut store, &cmd).expect("store command");
        dispatch(&mut state, msg, &mut store, &ai);
        assert_eq!(state.projects.len(), 1);
        dispatch(&mut state, Message::ProjectsLoaded(Ok(vec![])), &mut store, &ai);
        let msg = perform_store(&mut store, &Command::RefreshProjects).expect("store command");
        dispatch(&mut state, msg, &mut store, &ai);
        assert_eq!(state.projects[0].name, "Villa");
    }

    #[test]
    fn ai_commands_are_not_store_commands() {
        let (_, mut store, ai) = fixture();
        let cmd = Command::EstimatePrice {
            location: "Chania".into(),
            plot_size: 400.0,
        };
        assert!(perform_store(&mut store, &cmd).is_none());
        assert!(perform_ai(&ai, &Command::RefreshProjects).is_none());
        assert!(matches!(
            perform_ai(&ai, &cmd),
            Some(Message::PriceEstimated(Ok(p))) if p == 99_000.0
        ));
    }

    #[test]
    fn dispatch_runs_estimate_to_completion() {
        let (mut state, mut store, ai) = fixture();
        dispatch(&mut state, Message::EstimatePrice, &mut store, &ai);
        assert!(!state.estimating_price);
        assert_eq!(state.inputs.plot_price, 99_000.0);
    }

    #[test]
    fn dispatch_analysis_uses_live_results() {
        let (mut state, mut store, ai) = fixture();
        dispatch(&mut state, Message::RequestAnalysis, &mut store, &ai);
        assert_eq!(state.analysis.content.as_deref(), Some("margin 45.6"));
    }

    #[test]
    fn blocked_design_reaches_analysis_panel() {
        let (mut state, mut store, ai) = fixture();
        let img = ImagePayload {
            mime_type: "image/png".into(),
            data: vec![0],
        };
        dispatch(&mut state, Message::ImageSelected(img), &mut store, &ai);
        dispatch(&mut state, Message::GenerateDesign, &mut store, &ai);
        assert_eq!(state.analysis.error, Some(PanelError::ServiceBlocked));
        assert!(!state.design.loading);
    }

    #[test]
    fn missing_key_falls_back_to_unconfigured_service() {
        let settings = AiSettings {
            api_key_env: "DOMOS_TEST_KEY_NEVER_SET".into(),
            ..AiSettings::default()
        };
        let ai = ai_service(&settings);
        let err = ai
            .estimate_plot_price("Voula", 300.0)
            .expect_err("no key configured");
        assert!(err.is_configuration());
        assert!(err.to_string().contains("DOMOS_TEST_KEY_NEVER_SET"));
    }

    #[test]
    fn unconfigured_ai_reports_missing_key() {
        let ai = UnconfiguredAi {
            env: "NO_SUCH_KEY".into(),
        };
        let (mut state, mut store, _) = fixture();
        dispatch(&mut state, Message::RequestAnalysis, &mut store, &ai);
        match &state.analysis.error {
            Some(PanelError::Message(m)) => assert!(m.contains("NO_SUCH_KEY")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn deleting_unknown_id_surfaces_error_notice() {
        let (mut state, mut store, ai) = fixture();
        dispatch(&mut state, Message::DeleteProject("ghost".into()), &mut store, &ai);
        let n = state.notification.expect("notice");
        assert_eq!(n.key, "project.delete_failed");
    }
}
