#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

//! eframe/egui 기반 데스크톱 GUI 진입점.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::time::{Duration, Instant};
use std::{env, fs};

use chrono::Local;
use domos_feasibility::{
    ai::ImagePayload,
    app::{self, SharedAi},
    auth::AccessGate,
    config::{self, Config},
    feasibility::{
        cost_shares, margin_strength, risk_level, CalculationResults, InputField, MarginStrength,
        RiskGrade, RiskLevel, StrengthGrade,
    },
    format::{area, currency, percent},
    i18n::{self, Translator},
    logging,
    project::FileProjectStore,
    state::{AppState, Command, Message, NoticeKind, PanelError, SaveDialog, Tab},
};
use eframe::{egui, App, Frame};
use image::GenericImageView;
use rfd::FileDialog;

const ENABLE_API_URL: &str =
    "https://console.developers.google.com/apis/api/generativelanguage.googleapis.com/overview";
const KEY_RESTRICTIONS_URL: &str = "https://console.cloud.google.com/apis/credentials";

const GREEN: egui::Color32 = egui::Color32::from_rgb(22, 163, 74);
const LIGHT_GREEN: egui::Color32 = egui::Color32::from_rgb(132, 204, 22);
const YELLOW: egui::Color32 = egui::Color32::from_rgb(234, 179, 8);
const ORANGE: egui::Color32 = egui::Color32::from_rgb(249, 115, 22);
const RED: egui::Color32 = egui::Color32::from_rgb(220, 38, 38);

fn main() -> Result<(), eframe::Error> {
    logging::init(logging::DEFAULT_FILTER);

    // --lang xx / --lang=xx, --config path
    let mut cli_lang: Option<String> = None;
    let mut config_path = PathBuf::from(config::DEFAULT_CONFIG_PATH);
    let args: Vec<String> = env::args().collect();
    let mut i = 1;
    while i < args.len() {
        let a = &args[i];
        if let Some(val) = a.strip_prefix("--lang=") {
            cli_lang = Some(val.to_string());
        } else if let Some(val) = a.strip_prefix("--config=") {
            config_path = PathBuf::from(val);
        } else if (a == "--lang" || a == "-L") && i + 1 < args.len() {
            cli_lang = Some(args[i + 1].clone());
            i += 1;
        } else if a == "--config" && i + 1 < args.len() {
            config_path = PathBuf::from(&args[i + 1]);
            i += 1;
        }
        i += 1;
    }

    let app_cfg = config::load_from(&config_path).unwrap_or_else(|e| {
        tracing::error!("config load failed, using defaults: {e}");
        Config::default()
    });
    let lang = i18n::resolve_language(
        cli_lang.as_deref().unwrap_or("auto"),
        Some(app_cfg.language.as_str()),
    );

    let mut viewport = egui::ViewportBuilder::default().with_inner_size([1280.0, 860.0]);
    if let Some(icon) = load_app_icon() {
        viewport = viewport.with_icon(icon);
    }
    let options = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };
    eframe::run_native(
        "Domos Feasibility",
        options,
        Box::new(move |cc| {
            Box::new(GuiApp::new(
                cc.egui_ctx.clone(),
                app_cfg,
                config_path,
                Translator::new(&lang),
            ))
        }),
    )
}

fn load_app_icon() -> Option<egui::IconData> {
    let search = ["icon.png", "assets/icon.png", "../assets/icon.png"];
    let path = search.iter().find(|p| Path::new(*p).exists())?;
    let bytes = fs::read(path).ok()?;
    let img = image::load_from_memory(&bytes).ok()?;
    let (w, h) = img.dimensions();
    Some(egui::IconData {
        rgba: img.to_rgba8().into_raw(),
        width: w,
        height: h,
    })
}

/// 위치 문자열로 지도 검색 주소를 만든다.
fn map_url(location: &str) -> Option<String> {
    let location = location.trim();
    if location.is_empty() {
        return None;
    }
    reqwest::Url::parse_with_params("https://maps.google.com/maps", &[("q", location)])
        .ok()
        .map(String::from)
}

fn strength_color(grade: StrengthGrade) -> egui::Color32 {
    match grade {
        StrengthGrade::Excellent => GREEN,
        StrengthGrade::VeryGood => LIGHT_GREEN,
        StrengthGrade::Good => YELLOW,
        StrengthGrade::Moderate => ORANGE,
        StrengthGrade::HighRisk => RED,
    }
}

fn risk_color(grade: RiskGrade) -> egui::Color32 {
    match grade {
        RiskGrade::Minimal => GREEN,
        RiskGrade::Low => LIGHT_GREEN,
        RiskGrade::Moderate => YELLOW,
        RiskGrade::High => ORANGE,
        RiskGrade::Critical => RED,
    }
}

fn profit_color(value: f64) -> egui::Color32 {
    if value >= 0.0 {
        GREEN
    } else {
        RED
    }
}

/// 입력 필드별 DragValue 증분과 소수 자리
fn field_drag(field: InputField) -> (f64, usize) {
    match field {
        InputField::PlotSize => (1.0, 0),
        InputField::PlotPrice => (1000.0, 0),
        InputField::BuildingCoefficient => (0.01, 2),
        InputField::ConstructionCostPerSqm | InputField::SalePricePerSqm => (10.0, 0),
        InputField::MiscCostsPercent => (0.5, 1),
    }
}

fn to_texture(ctx: &egui::Context, name: &str, payload: &ImagePayload) -> Option<egui::TextureHandle> {
    let img = match payload.decode() {
        Ok(img) => img,
        Err(e) => {
            tracing::warn!("cannot display image: {e}");
            return None;
        }
    };
    let (w, h) = img.dimensions();
    let color = egui::ColorImage::from_rgba_unmultiplied(
        [w as usize, h as usize],
        img.to_rgba8().as_raw(),
    );
    Some(ctx.load_texture(name, color, egui::TextureOptions::LINEAR))
}

fn metric_card(ui: &mut egui::Ui, title: &str, value: &str, color: Option<egui::Color32>) {
    egui::Frame::group(ui.style()).show(ui, |ui| {
        ui.set_min_width(150.0);
        ui.vertical(|ui| {
            ui.label(egui::RichText::new(title).small());
            let mut text = egui::RichText::new(value).strong().size(18.0);
            if let Some(c) = color {
                text = text.color(c);
            }
            ui.label(text);
        });
    });
}

/// 이익률 강도 게이지: 5단 색 막대 위에 현재 위치 표시.
fn strength_gauge(ui: &mut egui::Ui, strength: &MarginStrength) {
    let desired = egui::vec2(ui.available_width().min(520.0), 16.0);
    let (rect, _) = ui.allocate_exact_size(desired, egui::Sense::hover());
    let painter = ui.painter_at(rect.expand(4.0));
    let colors = [RED, ORANGE, YELLOW, LIGHT_GREEN, GREEN];
    let seg = rect.width() / colors.len() as f32;
    for (i, c) in colors.iter().enumerate() {
        let min = egui::pos2(rect.left() + seg * i as f32, rect.top());
        painter.rect_filled(
            egui::Rect::from_min_size(min, egui::vec2(seg, rect.height())),
            0.0,
            *c,
        );
    }
    let x = rect.left() + rect.width() * (strength.position as f32 / 100.0);
    painter.line_segment(
        [egui::pos2(x, rect.top() - 3.0), egui::pos2(x, rect.bottom() + 3.0)],
        egui::Stroke::new(3.0, ui.visuals().strong_text_color()),
    );
}

fn risk_bar(ui: &mut egui::Ui, risk: &RiskLevel, label: String) {
    ui.add(
        egui::ProgressBar::new((risk.visual_width() / 100.0) as f32)
            .desired_width(ui.available_width().min(520.0))
            .fill(risk_color(risk.grade))
            .text(label),
    );
}

struct GuiApp {
    config: Config,
    config_path: PathBuf,
    tr: Translator,
    state: AppState,
    store: FileProjectStore,
    ai: SharedAi,
    ctx: egui::Context,
    tx: Sender<Message>,
    rx: Receiver<Message>,
    outbox: Vec<Message>,
    login_email: String,
    login_password: String,
    lang_input: String,
    show_settings: bool,
    settings_status: Option<String>,
    confirm_delete: Option<String>,
    original_tex: Option<egui::TextureHandle>,
    generated_tex: Option<egui::TextureHandle>,
    textures_dirty: bool,
}

impl GuiApp {
    fn new(ctx: egui::Context, config: Config, config_path: PathBuf, tr: Translator) -> Self {
        let (tx, rx) = channel();
        let store = app::open_store(&config);
        let ai = app::ai_service(&config.ai);
        let state = AppState::new(&config, AccessGate::from_env());
        let mut gui = Self {
            lang_input: config.language.clone(),
            config,
            config_path,
            tr,
            state,
            store,
            ai,
            ctx,
            tx,
            rx,
            outbox: Vec::new(),
            login_email: String::new(),
            login_password: String::new(),
            show_settings: false,
            settings_status: None,
            confirm_delete: None,
            original_tex: None,
            generated_tex: None,
            textures_dirty: false,
        };
        gui.dispatch(Message::RefreshProjects);
        gui
    }

    fn send(&mut self, msg: Message) {
        self.outbox.push(msg);
    }

    /// 메시지를 적용한다. 저장소 명령은 바로, AI 명령은 작업 스레드에서 실행한다.
    fn dispatch(&mut self, msg: Message) {
        let mut next = Some(msg);
        while let Some(msg) = next.take() {
            if matches!(
                msg,
                Message::ImageSelected(_) | Message::DesignReady(_) | Message::Clear
            ) {
                self.textures_dirty = true;
            }
            let Some(cmd) = self.state.update(msg) else {
                continue;
            };
            next = app::perform_store(&mut self.store, &cmd);
            if next.is_none() {
                self.spawn_ai(cmd);
            }
        }
    }

    fn spawn_ai(&self, cmd: Command) {
        let ai = self.ai.clone();
        let tx = self.tx.clone();
        let ctx = self.ctx.clone();
        std::thread::spawn(move || {
            if let Some(msg) = app::perform_ai(ai.as_ref(), &cmd) {
                if tx.send(msg).is_err() {
                    tracing::debug!("window closed before AI reply");
                }
                ctx.request_repaint();
            }
        });
    }

    fn flush(&mut self) {
        while let Ok(msg) = self.rx.try_recv() {
            self.dispatch(msg);
        }
        for msg in std::mem::take(&mut self.outbox) {
            self.dispatch(msg);
        }
    }

    fn refresh_textures(&mut self, ctx: &egui::Context) {
        if !self.textures_dirty {
            return;
        }
        self.textures_dirty = false;
        self.original_tex = self
            .state
            .design
            .original
            .as_ref()
            .and_then(|p| to_texture(ctx, "design_original", p));
        self.generated_tex = self
            .state
            .design
            .generated
            .as_ref()
            .and_then(|p| to_texture(ctx, "design_generated", p));
    }

    fn txt(&self, key: &str) -> String {
        self.tr.t(key)
    }

    fn ui_login(&mut self, ui: &mut egui::Ui) {
        ui.vertical_centered(|ui| {
            ui.add_space(120.0);
            ui.heading(self.txt("general.app_title"));
            ui.label(self.txt("auth.title"));
            ui.add_space(16.0);
            ui.add(
                egui::TextEdit::singleline(&mut self.login_email)
                    .hint_text(self.tr.t("auth.email"))
                    .desired_width(280.0),
            );
            let pw = ui.add(
                egui::TextEdit::singleline(&mut self.login_password)
                    .hint_text(self.tr.t("auth.password"))
                    .password(true)
                    .desired_width(280.0),
            );
            let enter = pw.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
            ui.add_space(8.0);
            if ui.button(self.txt("auth.sign_in")).clicked() || enter {
                let msg = Message::Login {
                    email: self.login_email.clone(),
                    password: std::mem::take(&mut self.login_password),
                };
                self.send(msg);
            }
        });
    }

    fn ui_top_bar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.heading(self.txt("general.app_title"));
            ui.separator();
            if ui.button(self.txt("gui.save_project")).clicked() {
                let today = Local::now().date_naive();
                self.send(Message::OpenSaveDialog { today });
            }
            if ui
                .button(self.txt("gui.clear"))
                .on_hover_text(self.txt("gui.clear_tip"))
                .clicked()
            {
                self.send(Message::Clear);
            }
            let theme = if self.state.dark_mode {
                self.txt("gui.light_mode")
            } else {
                self.txt("gui.dark_mode")
            };
            if ui.button(theme).clicked() {
                self.send(Message::ToggleDarkMode);
                self.config.dark_mode = !self.state.dark_mode;
                if let Err(e) = self.config.save_to(&self.config_path) {
                    tracing::warn!("could not persist theme: {e}");
                }
            }
            if ui.button(self.txt("settings.title")).clicked() {
                self.show_settings = true;
            }
            if self.state.login_required() && ui.button(self.txt("gui.sign_out")).clicked() {
                self.send(Message::Logout);
            }
        });
    }

    fn ui_inputs(&mut self, ui: &mut egui::Ui) {
        ui.heading(self.txt("gui.plot_details"));
        ui.add_space(6.0);

        ui.label(self.txt("field.location"));
        let mut location = self.state.inputs.location.clone();
        let resp = ui.add(
            egui::TextEdit::singleline(&mut location)
                .hint_text(self.tr.t("gui.location_hint"))
                .desired_width(f32::INFINITY),
        );
        if resp.changed() {
            self.send(Message::SetLocation(location));
        }
        ui.horizontal(|ui| {
            if self.state.estimating_price {
                ui.spinner();
                ui.label(self.txt("ai.estimating"));
            } else if ui
                .button(self.txt("gui.estimate_price"))
                .on_hover_text(self.txt("gui.estimate_tip"))
                .clicked()
            {
                self.send(Message::EstimatePrice);
            }
            if let Some(url) = map_url(&self.state.inputs.location) {
                ui.hyperlink_to(self.txt("gui.open_map"), url);
            }
        });

        ui.add_space(6.0);
        ui.label(self.txt("field.owner_notes"));
        let mut notes = self.state.inputs.owner_notes.clone().unwrap_or_default();
        let resp = ui.add(
            egui::TextEdit::multiline(&mut notes)
                .hint_text(self.tr.t("gui.notes_hint"))
                .desired_rows(3)
                .desired_width(f32::INFINITY),
        );
        if resp.changed() {
            self.send(Message::SetOwnerNotes(notes));
        }

        ui.add_space(8.0);
        egui::Grid::new("inputs_grid")
            .num_columns(2)
            .spacing([12.0, 8.0])
            .show(ui, |ui| {
                for field in InputField::ALL {
                    ui.label(self.tr.t(field.key()));
                    let mut value = self.state.inputs.get(field);
                    let (speed, decimals) = field_drag(field);
                    let resp = ui.add(
                        egui::DragValue::new(&mut value)
                            .speed(speed)
                            .max_decimals(decimals)
                            .suffix(format!(" {}", field.unit())),
                    );
                    if resp.changed() {
                        self.send(Message::SetField(field, value));
                    }
                    ui.end_row();
                }
            });

        for w in self.state.inputs.warnings() {
            ui.colored_label(ORANGE, format!("⚠ {}", w.text(&self.tr)));
        }
    }

    fn ui_projects(&mut self, ui: &mut egui::Ui) {
        ui.heading(self.txt("project.list_heading"));
        if self.state.loading_projects {
            ui.spinner();
            return;
        }
        if self.state.projects.is_empty() {
            ui.label(self.txt("project.none"));
            return;
        }
        let mut clicked: Option<Message> = None;
        let mut delete: Option<String> = None;
        egui::ScrollArea::vertical()
            .id_source("projects")
            .max_height(280.0)
            .show(ui, |ui| {
                for project in &self.state.projects {
                    let r = project.inputs.results();
                    egui::Frame::group(ui.style()).show(ui, |ui| {
                        ui.set_width(ui.available_width());
                        ui.label(egui::RichText::new(&project.name).strong());
                        ui.label(format!(
                            "{} · {}",
                            project.inputs.location,
                            project.created_at.with_timezone(&Local).format("%d/%m/%Y")
                        ));
                        ui.horizontal(|ui| {
                            ui.label(currency(r.construction_cost_total_incl_plot));
                            ui.colored_label(
                                profit_color(r.profit_margin),
                                percent(r.profit_margin, 1),
                            );
                            if ui.small_button(self.tr.t("gui.load")).clicked() {
                                clicked = Some(Message::LoadProject(project.id.clone()));
                            }
                            if ui.small_button(self.tr.t("gui.delete")).clicked() {
                                delete = Some(project.id.clone());
                            }
                        });
                    });
                }
            });
        if let Some(msg) = clicked {
            self.send(msg);
        }
        if delete.is_some() {
            self.confirm_delete = delete;
        }
    }

    fn ui_results(&mut self, ui: &mut egui::Ui) {
        let results = self.state.results();
        ui.horizontal_wrapped(|ui| {
            metric_card(
                ui,
                &self.tr.t("result.total_investment"),
                &currency(results.construction_cost_total_incl_plot),
                None,
            );
            metric_card(ui, &self.tr.t("result.revenue"), &currency(results.revenue_total), None);
            metric_card(
                ui,
                &self.tr.t("result.profit"),
                &currency(results.profit_total),
                Some(profit_color(results.profit_total)),
            );
            metric_card(
                ui,
                &self.tr.t("result.margin"),
                &percent(results.profit_margin, 1),
                Some(profit_color(results.profit_margin)),
            );
            metric_card(ui, &self.tr.t("result.roi"), &percent(results.roi, 1), None);
            metric_card(
                ui,
                &self.tr.t("result.buildable_area"),
                &area(results.max_buildable_area),
                None,
            );
            metric_card(
                ui,
                &self.tr.t("result.cost_per_sqm"),
                &currency(results.cost_per_sqm_incl_plot),
                None,
            );
        });

        ui.add_space(10.0);
        let strength = margin_strength(results.profit_margin);
        ui.horizontal(|ui| {
            ui.label(self.tr.t("result.strength"));
            ui.colored_label(
                strength_color(strength.grade),
                egui::RichText::new(self.tr.t(strength.grade.key())).strong(),
            );
        });
        strength_gauge(ui, &strength);
        ui.add_space(8.0);
        let risk = risk_level(results.profit_margin);
        ui.label(self.tr.t("risk.heading"));
        risk_bar(
            ui,
            &risk,
            format!("{} · {}", self.tr.t(risk.grade.key()), percent(risk.percent, 0)),
        );

        ui.add_space(12.0);
        ui.horizontal(|ui| {
            for (tab, key) in [
                (Tab::Overview, "tab.overview"),
                (Tab::Breakdown, "tab.breakdown"),
                (Tab::Design, "tab.design"),
            ] {
                if ui
                    .selectable_label(self.state.tab == tab, self.tr.t(key))
                    .clicked()
                {
                    self.send(Message::SelectTab(tab));
                }
            }
        });
        ui.separator();
        match self.state.tab {
            Tab::Overview => self.ui_analysis(ui),
            Tab::Breakdown => self.ui_breakdown(ui, &results),
            Tab::Design => self.ui_design(ui),
        }
    }

    fn ui_breakdown(&self, ui: &mut egui::Ui, results: &CalculationResults) {
        let inputs = &self.state.inputs;
        let shares = cost_shares(inputs, results);
        for (key, value, share, color) in [
            ("result.plot_share", inputs.plot_price, shares.plot, egui::Color32::from_rgb(30, 58, 138)),
            (
                "result.construction_share",
                results.construction_cost_total,
                shares.construction,
                egui::Color32::from_rgb(59, 130, 246),
            ),
            ("result.misc_share", results.misc_costs_value, shares.misc, egui::Color32::from_rgb(148, 163, 184)),
        ] {
            ui.horizontal(|ui| {
                ui.label(self.tr.t(key));
                ui.label(currency(value));
            });
            ui.add(
                egui::ProgressBar::new((share / 100.0).clamp(0.0, 1.0) as f32)
                    .fill(color)
                    .text(percent(share, 1)),
            );
            ui.add_space(4.0);
        }
        ui.separator();
        egui::Grid::new("breakdown_grid")
            .num_columns(2)
            .striped(true)
            .show(ui, |ui| {
                for (key, value) in [
                    ("result.buildable_area", area(results.max_buildable_area)),
                    ("result.construction_cost", currency(results.construction_cost_total)),
                    ("result.misc_costs", currency(results.misc_costs_value)),
                    (
                        "result.total_investment",
                        currency(results.construction_cost_total_incl_plot),
                    ),
                    ("result.cost_per_sqm", currency(results.cost_per_sqm_incl_plot)),
                    ("result.revenue", currency(results.revenue_total)),
                    ("result.profit", currency(results.profit_total)),
                ] {
                    ui.label(self.tr.t(key));
                    ui.label(value);
                    ui.end_row();
                }
            });
    }

    fn ui_panel_error(&self, ui: &mut egui::Ui, err: &PanelError) {
        egui::Frame::group(ui.style()).show(ui, |ui| {
            match err {
                PanelError::ServiceBlocked => {
                    ui.colored_label(ORANGE, egui::RichText::new(self.tr.t("ai.service_blocked")).strong());
                    ui.label(self.tr.t("ai.enable_api_hint"));
                    ui.horizontal(|ui| {
                        ui.hyperlink_to(self.tr.t("gui.enable_api"), ENABLE_API_URL);
                        ui.hyperlink_to(self.tr.t("gui.fix_key"), KEY_RESTRICTIONS_URL);
                    });
                }
                PanelError::Message(_) => {
                    ui.colored_label(RED, err.text(&self.tr));
                }
            }
        });
    }

    fn ui_analysis(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.vertical(|ui| {
                ui.strong(self.tr.t("ai.analysis_heading"));
                ui.label(egui::RichText::new(self.tr.t("gui.analysis_tip")).small());
            });
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let loading = self.state.analysis.loading;
                let label = if loading {
                    self.tr.t("ai.analyzing")
                } else {
                    self.tr.t("gui.analyze")
                };
                if ui.add_enabled(!loading, egui::Button::new(label)).clicked() {
                    self.send(Message::RequestAnalysis);
                }
                if loading {
                    ui.spinner();
                }
            });
        });
        ui.add_space(6.0);
        if let Some(err) = &self.state.analysis.error {
            self.ui_panel_error(ui, err);
        }
        if let Some(text) = &self.state.analysis.content {
            egui::Frame::group(ui.style()).show(ui, |ui| {
                ui.set_width(ui.available_width());
                // **굵게** 표시만 반영한다
                for line in text.lines() {
                    ui.horizontal_wrapped(|ui| {
                        for (i, part) in line.split("**").enumerate() {
                            if i % 2 == 1 {
                                ui.label(egui::RichText::new(part).strong());
                            } else if !part.is_empty() {
                                ui.label(part);
                            }
                        }
                    });
                }
            });
        }
    }

    fn ui_design(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if ui.button(self.tr.t("gui.upload_photo")).clicked() {
                if let Some(path) = FileDialog::new()
                    .add_filter("image", &["png", "jpg", "jpeg", "webp"])
                    .pick_file()
                {
                    let msg = match fs::read(&path)
                        .map_err(|e| e.to_string())
                        .and_then(|b| ImagePayload::from_bytes(b).map_err(|e| e.to_string()))
                        .and_then(|p| p.decode().map(|_| p).map_err(|e| e.to_string()))
                    {
                        Ok(payload) => Message::ImageSelected(payload),
                        Err(reason) => Message::ImageRejected(reason),
                    };
                    self.send(msg);
                }
            }
            ui.label(egui::RichText::new(self.tr.t("gui.upload_tip")).small());
        });

        let max_w = (ui.available_width() / 2.0 - 12.0).max(160.0);
        ui.columns(2, |cols| {
            cols[0].strong(self.tr.t("gui.original"));
            match &self.original_tex {
                Some(tex) => {
                    cols[0].add(
                        egui::Image::from_texture(egui::load::SizedTexture::from_handle(tex))
                            .max_width(max_w),
                    );
                }
                None => {
                    cols[0].label(self.tr.t("gui.no_photo"));
                }
            }
            cols[1].strong(self.tr.t("gui.generated"));
            if self.state.design.loading {
                cols[1].spinner();
            } else if let Some(tex) = &self.generated_tex {
                cols[1].add(
                    egui::Image::from_texture(egui::load::SizedTexture::from_handle(tex))
                        .max_width(max_w),
                );
            }
        });

        ui.add_space(6.0);
        let mut prompt = self.state.design.prompt.clone();
        let resp = ui.add(
            egui::TextEdit::multiline(&mut prompt)
                .desired_rows(2)
                .desired_width(f32::INFINITY),
        );
        if resp.changed() {
            self.send(Message::SetDesignPrompt(prompt));
        }
        ui.horizontal(|ui| {
            let ready = self.state.design.original.is_some() && !self.state.design.loading;
            if ui
                .add_enabled(ready, egui::Button::new(self.tr.t("gui.generate_design")))
                .clicked()
            {
                self.send(Message::GenerateDesign);
            }
            if let Some(generated) = &self.state.design.generated {
                if ui.button(self.tr.t("gui.save_image")).clicked() {
                    save_image(generated);
                }
            }
        });
        if let Some(err) = &self.state.design.error {
            self.ui_panel_error(ui, err);
        }
    }

    fn ui_dialogs(&mut self, ctx: &egui::Context) {
        match self.state.save_dialog.clone() {
            SaveDialog::Closed => {}
            SaveDialog::Naming { mut name } => {
                egui::Window::new(self.txt("gui.save_project"))
                    .collapsible(false)
                    .resizable(false)
                    .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
                    .show(ctx, |ui| {
                        ui.label(self.tr.t("project.name_prompt"));
                        if ui.text_edit_singleline(&mut name).changed() {
                            self.outbox.push(Message::SetSaveName(name.clone()));
                        }
                        ui.horizontal(|ui| {
                            let enabled = !name.trim().is_empty();
                            if ui
                                .add_enabled(enabled, egui::Button::new(self.tr.t("gui.save")))
                                .clicked()
                            {
                                self.outbox.push(Message::ConfirmSave);
                            }
                            if ui.button(self.tr.t("gui.cancel")).clicked() {
                                self.outbox.push(Message::CancelSave);
                            }
                        });
                    });
            }
            SaveDialog::DuplicateWarning { .. } => {
                egui::Window::new(self.txt("project.duplicate_title"))
                    .collapsible(false)
                    .resizable(false)
                    .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
                    .show(ctx, |ui| {
                        ui.label(self.tr.tf(
                            "project.duplicate_body",
                            &[("location", self.state.inputs.location.clone())],
                        ));
                        ui.horizontal(|ui| {
                            if ui.button(self.tr.t("project.save_anyway")).clicked() {
                                self.outbox.push(Message::SaveAnyway);
                            }
                            if ui.button(self.tr.t("gui.cancel")).clicked() {
                                self.outbox.push(Message::CancelSave);
                            }
                        });
                    });
            }
        }

        if let Some(id) = self.confirm_delete.clone() {
            egui::Window::new(self.txt("gui.delete"))
                .collapsible(false)
                .resizable(false)
                .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
                .show(ctx, |ui| {
                    ui.label(self.tr.t("project.confirm_delete"));
                    ui.horizontal(|ui| {
                        if ui.button(self.tr.t("gui.delete")).clicked() {
                            self.outbox.push(Message::DeleteProject(id.clone()));
                            self.confirm_delete = None;
                        }
                        if ui.button(self.tr.t("gui.cancel")).clicked() {
                            self.confirm_delete = None;
                        }
                    });
                });
        }

        if self.show_settings {
            let mut open = true;
            egui::Window::new(self.txt("settings.title"))
                .collapsible(false)
                .resizable(false)
                .open(&mut open)
                .show(ctx, |ui| {
                    ui.label(self.tr.t("settings.language"));
                    egui::ComboBox::from_id_source("lang_choice")
                        .selected_text(self.lang_input.clone())
                        .show_ui(ui, |ui| {
                            ui.selectable_value(&mut self.lang_input, "auto".into(), "auto");
                            ui.selectable_value(&mut self.lang_input, "en".into(), "English");
                            ui.selectable_value(&mut self.lang_input, "el".into(), "Ελληνικά");
                        });
                    ui.label(format!(
                        "{}: {}",
                        self.tr.t("settings.store_path"),
                        self.store.path().display()
                    ));
                    ui.label(format!(
                        "{}: {}",
                        self.tr.t("settings.api_key_env"),
                        self.config.ai.api_key_env
                    ));
                    if ui.button(self.tr.t("gui.save")).clicked() {
                        self.config.language = self.lang_input.clone();
                        self.config.dark_mode = self.state.dark_mode;
                        let code = i18n::resolve_language("auto", Some(self.config.language.as_str()));
                        self.tr = Translator::new(&code);
                        self.settings_status = Some(match self.config.save_to(&self.config_path) {
                            Ok(()) => self.tr.t("settings.saved"),
                            Err(e) => format!("{}: {e}", self.tr.t("general.error_prefix")),
                        });
                    }
                    if let Some(msg) = &self.settings_status {
                        ui.label(msg);
                    }
                });
            self.show_settings = open;
        }
    }

    fn ui_toast(&mut self, ctx: &egui::Context) {
        let Some(n) = &self.state.notification else {
            return;
        };
        let text = n.text(&self.tr);
        let color = match n.kind {
            NoticeKind::Success => GREEN,
            NoticeKind::Error => RED,
        };
        let mut dismiss = false;
        egui::Area::new(egui::Id::new("toast"))
            .anchor(egui::Align2::RIGHT_BOTTOM, [-16.0, -16.0])
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    ui.horizontal(|ui| {
                        ui.colored_label(color, text);
                        if ui.small_button("✕").clicked() {
                            dismiss = true;
                        }
                    });
                });
            });
        if dismiss {
            self.send(Message::DismissNotification);
        }
        ctx.request_repaint_after(Duration::from_millis(250));
    }
}

fn save_image(image: &ImagePayload) {
    let Some(path) = FileDialog::new()
        .set_file_name(format!("domos-design.{}", image.extension()))
        .save_file()
    else {
        return;
    };
    match fs::write(&path, &image.data) {
        Ok(()) => tracing::info!(path = %path.display(), "design image saved"),
        Err(e) => tracing::error!("could not save design image: {e}"),
    }
}

impl App for GuiApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        self.flush();
        self.dispatch(Message::Tick(Instant::now()));
        self.refresh_textures(ctx);

        ctx.set_visuals(if self.state.dark_mode {
            egui::Visuals::dark()
        } else {
            egui::Visuals::light()
        });

        if !self.state.authenticated {
            egui::CentralPanel::default().show(ctx, |ui| self.ui_login(ui));
            self.ui_toast(ctx);
            return;
        }

        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| self.ui_top_bar(ui));

        egui::SidePanel::left("inputs")
            .resizable(true)
            .min_width(280.0)
            .default_width(340.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    self.ui_inputs(ui);
                    ui.separator();
                    self.ui_projects(ui);
                });
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical()
                .auto_shrink([false; 2])
                .show(ui, |ui| self.ui_results(ui));
        });

        self.ui_dialogs(ctx);
        self.ui_toast(ctx);
    }
}
