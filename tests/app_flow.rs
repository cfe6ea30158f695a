use std::cell::Cell;

use chrono::NaiveDate;
use domos_feasibility::ai::{AiError, AiService, ImagePayload};
use domos_feasibility::app::dispatch;
use domos_feasibility::auth::AccessGate;
use domos_feasibility::config::Config;
use domos_feasibility::feasibility::{CalculationResults, InputField, InputWarning, ProjectInputs};
use domos_feasibility::project::{MemoryProjectStore, ProjectStore};
use domos_feasibility::state::{AppState, Message, NoticeKind, PanelError, SaveDialog};
use pretty_assertions::assert_eq;

/// 호출 횟수를 세는 가짜 AI.
#[derive(Default)]
struct ScriptedAi {
    blocked: bool,
    calls: Cell<usize>,
}

impl ScriptedAi {
    fn fail(&self) -> AiError {
        if self.blocked {
            AiError::ServiceDisabled {
                reason: "HTTP 403".into(),
            }
        } else {
            AiError::Request {
                reason: "HTTP 500: boom".into(),
            }
        }
    }
}

impl AiService for ScriptedAi {
    fn estimate_plot_price(&self, _location: &str, plot_size: f64) -> Result<f64, AiError> {
        self.calls.set(self.calls.get() + 1);
        if self.blocked {
            return Err(self.fail());
        }
        Ok(plot_size * 350.0)
    }

    fn generate_visualization(
        &self,
        image: &ImagePayload,
        _prompt: &str,
    ) -> Result<ImagePayload, AiError> {
        self.calls.set(self.calls.get() + 1);
        if self.blocked {
            return Err(self.fail());
        }
        Ok(ImagePayload {
            mime_type: image.mime_type.clone(),
            data: image.data.iter().rev().copied().collect(),
        })
    }

    fn analyze(
        &self,
        inputs: &ProjectInputs,
        results: &CalculationResults,
    ) -> Result<String, AiError> {
        self.calls.set(self.calls.get() + 1);
        if self.blocked {
            return Err(self.fail());
        }
        Ok(format!(
            "**{}**: profit {:.0}",
            inputs.location, results.profit_total
        ))
    }
}

fn open_state() -> AppState {
    AppState::new(&Config::default(), AccessGate::Open)
}

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 1).expect("date")
}

#[test]
fn save_load_and_delete_cycle() {
    let mut state = open_state();
    let mut store = MemoryProjectStore::new();
    let ai = ScriptedAi::default();

    dispatch(&mut state, Message::RefreshProjects, &mut store, &ai);
    assert!(!state.loading_projects);
    assert!(state.projects.is_empty());

    dispatch(&mut state, Message::SetLocation("Kifisia".into()), &mut store, &ai);
    dispatch(&mut state, Message::OpenSaveDialog { today: day() }, &mut store, &ai);
    dispatch(&mut state, Message::ConfirmSave, &mut store, &ai);
    assert_eq!(state.save_dialog, SaveDialog::Closed);
    assert_eq!(store.list().expect("list").len(), 1);
    let id = state.projects[0].id.clone();
    assert_eq!(state.projects[0].name, "Kifisia");

    dispatch(&mut state, Message::Clear, &mut store, &ai);
    assert_eq!(state.inputs, ProjectInputs::empty());
    dispatch(&mut state, Message::LoadProject(id.clone()), &mut store, &ai);
    assert_eq!(state.inputs.location, "Kifisia");
    assert_eq!(state.inputs.plot_size, 500.0);

    dispatch(&mut state, Message::DeleteProject(id), &mut store, &ai);
    assert!(state.projects.is_empty());
    assert!(store.list().expect("list").is_empty());
    assert_eq!(ai.calls.get(), 0);
}

#[test]
fn duplicate_location_can_be_cancelled() {
    let mut state = open_state();
    let mut store = MemoryProjectStore::new();
    let ai = ScriptedAi::default();
    store
        .create("existing", &ProjectInputs::default())
        .expect("create");
    dispatch(&mut state, Message::RefreshProjects, &mut store, &ai);

    dispatch(&mut state, Message::OpenSaveDialog { today: day() }, &mut store, &ai);
    dispatch(&mut state, Message::ConfirmSave, &mut store, &ai);
    assert_eq!(
        state.save_dialog,
        SaveDialog::DuplicateWarning {
            name: "Athens, Greece".into()
        }
    );
    dispatch(&mut state, Message::CancelSave, &mut store, &ai);
    assert_eq!(state.save_dialog, SaveDialog::Closed);
    assert_eq!(store.list().expect("list").len(), 1);
}

#[test]
fn estimate_then_analysis_reflect_new_price() {
    let mut state = open_state();
    let mut store = MemoryProjectStore::new();
    let ai = ScriptedAi::default();

    dispatch(&mut state, Message::EstimatePrice, &mut store, &ai);
    assert_eq!(state.inputs.plot_price, 175_000.0);
    assert_eq!(
        state.notification.as_ref().map(|n| (n.kind, n.key)),
        Some((NoticeKind::Success, "ai.estimate_ok"))
    );

    dispatch(&mut state, Message::RequestAnalysis, &mut store, &ai);
    // 1_680_000 - (175_000 + 720_000 + 44_750)
    assert_eq!(
        state.analysis.content.as_deref(),
        Some("**Athens, Greece**: profit 740250")
    );
    assert_eq!(ai.calls.get(), 2);
}

#[test]
fn blocked_service_shows_in_every_panel() {
    let mut state = open_state();
    let mut store = MemoryProjectStore::new();
    let ai = ScriptedAi {
        blocked: true,
        ..ScriptedAi::default()
    };
    let before = state.inputs.clone();

    dispatch(&mut state, Message::EstimatePrice, &mut store, &ai);
    assert_eq!(state.analysis.error, Some(PanelError::ServiceBlocked));
    assert_eq!(state.inputs, before);

    dispatch(
        &mut state,
        Message::ImageSelected(ImagePayload {
            mime_type: "image/png".into(),
            data: vec![1, 2, 3],
        }),
        &mut store,
        &ai,
    );
    dispatch(&mut state, Message::GenerateDesign, &mut store, &ai);
    assert_eq!(state.design.error, Some(PanelError::ServiceBlocked));
    assert!(state.design.generated.is_none());
    assert!(state.design.original.is_some());
}

#[test]
fn general_failure_keeps_its_message() {
    let mut state = open_state();
    let mut store = MemoryProjectStore::new();
    let ai = ScriptedAi::default();
    // 실패하는 쪽은 ServiceDisabled가 아닌 일반 오류
    let failing = FailingAnalysis;
    dispatch(&mut state, Message::RequestAnalysis, &mut store, &failing);
    match &state.analysis.error {
        Some(PanelError::Message(m)) => assert!(m.contains("HTTP 500")),
        other => panic!("unexpected {other:?}"),
    }
    assert!(!state.analysis.loading);

    dispatch(
        &mut state,
        Message::ImageSelected(ImagePayload {
            mime_type: "image/jpeg".into(),
            data: vec![1, 2, 3],
        }),
        &mut store,
        &ai,
    );
    dispatch(&mut state, Message::GenerateDesign, &mut store, &ai);
    assert_eq!(
        state.design.generated.as_ref().map(|g| g.data.clone()),
        Some(vec![3, 2, 1])
    );
}

struct FailingAnalysis;

impl AiService for FailingAnalysis {
    fn estimate_plot_price(&self, _location: &str, _plot_size: f64) -> Result<f64, AiError> {
        Ok(0.0)
    }

    fn generate_visualization(
        &self,
        _image: &ImagePayload,
        _prompt: &str,
    ) -> Result<ImagePayload, AiError> {
        Err(AiError::NoImage)
    }

    fn analyze(
        &self,
        _inputs: &ProjectInputs,
        _results: &CalculationResults,
    ) -> Result<String, AiError> {
        Err(AiError::Request {
            reason: "HTTP 500: boom".into(),
        })
    }
}

#[test]
fn negative_inputs_are_computed_and_flagged() {
    let mut state = open_state();
    let mut store = MemoryProjectStore::new();
    let ai = ScriptedAi::default();
    dispatch(
        &mut state,
        Message::SetField(InputField::SalePricePerSqm, -100.0),
        &mut store,
        &ai,
    );
    let r = state.results();
    assert_eq!(r.revenue_total, -40_000.0);
    assert_eq!(r.profit_margin, 0.0);
    assert_eq!(
        state.inputs.warnings(),
        vec![InputWarning::Negative(InputField::SalePricePerSqm)]
    );
}

#[test]
fn login_gate_blocks_until_credentials_match() {
    let mut state = AppState::new(&Config::default(), AccessGate::new("agent@domos.gr", "secret"));
    let mut store = MemoryProjectStore::new();
    let ai = ScriptedAi::default();
    assert!(state.login_required());
    dispatch(
        &mut state,
        Message::Login {
            email: "agent@domos.gr".into(),
            password: "wrong".into(),
        },
        &mut store,
        &ai,
    );
    assert!(!state.authenticated);
    assert_eq!(state.notification.as_ref().map(|n| n.key), Some("auth.invalid"));
    dispatch(
        &mut state,
        Message::Login {
            email: " agent@domos.gr ".into(),
            password: "secret".into(),
        },
        &mut store,
        &ai,
    );
    assert!(state.authenticated);
}
