use std::io::{self, Write};

use crate::app::AppError;
use crate::config::Config;
use crate::feasibility::{
    cost_shares, margin_strength, parse_amount, risk_level, CalculationResults, InputField,
    ProjectInputs,
};
use crate::format::{area, currency, grouped, percent};
use crate::i18n::Translator;
use crate::project::{compare, SavedProject};
use crate::state::{AnalysisState, Message, Notification, NoticeKind, PanelError};

/// 메인 메뉴 선택지를 표현한다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    EditInputs,
    ShowResults,
    EstimatePrice,
    Analyze,
    SaveProject,
    Projects,
    LoadProject,
    DeleteProject,
    Clear,
    Settings,
    Logout,
    Exit,
}

const MENU: [(&str, &str, MenuChoice); 12] = [
    ("1", "menu.edit", MenuChoice::EditInputs),
    ("2", "menu.results", MenuChoice::ShowResults),
    ("3", "menu.estimate", MenuChoice::EstimatePrice),
    ("4", "menu.analyze", MenuChoice::Analyze),
    ("5", "menu.save", MenuChoice::SaveProject),
    ("6", "menu.projects", MenuChoice::Projects),
    ("7", "menu.load", MenuChoice::LoadProject),
    ("8", "menu.delete", MenuChoice::DeleteProject),
    ("9", "menu.clear", MenuChoice::Clear),
    ("10", "menu.settings", MenuChoice::Settings),
    ("11", "menu.logout", MenuChoice::Logout),
    ("0", "menu.exit", MenuChoice::Exit),
];

/// 메인 메뉴를 표시하고 선택값을 반환한다.
pub fn main_menu(tr: &Translator) -> Result<MenuChoice, AppError> {
    println!("\n=== {} ===", tr.t("general.app_title"));
    for (code, key, _) in MENU {
        println!("{code:>2}) {}", tr.t(key));
    }
    loop {
        let sel = read_line(&format!("{}: ", tr.t("menu.select")))?;
        if let Some(choice) = menu_choice(&sel) {
            return Ok(choice);
        }
        println!("{}", tr.t("menu.invalid"));
    }
}

fn menu_choice(input: &str) -> Option<MenuChoice> {
    MENU.iter()
        .find(|(code, _, _)| *code == input.trim())
        .map(|(_, _, choice)| *choice)
}

/// 입력값을 하나씩 묻는다. 빈 입력은 현재 값을 유지한다.
pub fn edit_inputs(tr: &Translator, current: &ProjectInputs) -> Result<Vec<Message>, AppError> {
    println!("\n-- {} --", tr.t("menu.edit"));
    println!("{}", tr.t("input.keep_hint"));
    let mut out = Vec::new();

    let location = read_with_default(&tr.t("field.location"), &current.location)?;
    if location != current.location {
        out.push(Message::SetLocation(location));
    }
    for field in InputField::ALL {
        let value = current.get(field);
        let prompt = format!("{} [{}]", tr.t(field.key()), field.unit());
        let typed = read_with_default(&prompt, &value.to_string())?;
        let parsed = parse_amount(&typed);
        if parsed != value {
            out.push(Message::SetField(field, parsed));
        }
    }
    let notes = current.owner_notes.clone().unwrap_or_default();
    let typed = read_with_default(&tr.t("field.owner_notes"), &notes)?;
    if typed != notes {
        out.push(Message::SetOwnerNotes(typed));
    }
    Ok(out)
}

/// 입력값, 결과, 게이지, 원가 구성, 경고를 출력한다.
pub fn print_report(tr: &Translator, inputs: &ProjectInputs, results: &CalculationResults) {
    println!("\n-- {} --", tr.t("result.inputs_heading"));
    println!("{:<28} {}", tr.t("field.location"), inputs.location);
    for field in InputField::ALL {
        println!(
            "{:<28} {} {}",
            tr.t(field.key()),
            grouped(inputs.get(field), 2),
            field.unit()
        );
    }

    println!("\n-- {} --", tr.t("result.heading"));
    let rows = [
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
        ("result.margin", percent(results.profit_margin, 1)),
        ("result.roi", percent(results.roi, 1)),
    ];
    for (key, value) in rows {
        println!("{:<28} {value}", tr.t(key));
    }

    let strength = margin_strength(results.profit_margin);
    let risk = risk_level(results.profit_margin);
    println!(
        "{:<28} {} ({})",
        tr.t("result.strength"),
        tr.t(strength.grade.key()),
        percent(strength.position, 0)
    );
    println!(
        "{:<28} {} ({})",
        tr.t("result.risk"),
        tr.t(risk.grade.key()),
        percent(risk.percent, 0)
    );

    let shares = cost_shares(inputs, results);
    println!("\n-- {} --", tr.t("result.breakdown"));
    for (key, value) in [
        ("result.plot_share", shares.plot),
        ("result.construction_share", shares.construction),
        ("result.misc_share", shares.misc),
    ] {
        println!("{:<28} {}", tr.t(key), percent(value, 1));
    }

    let warnings = inputs.warnings();
    if !warnings.is_empty() {
        println!("\n{}", tr.t("result.warnings"));
        for w in warnings {
            println!("  ! {}", w.text(tr));
        }
    }
}

pub fn print_analysis(tr: &Translator, analysis: &AnalysisState) {
    if let Some(err) = &analysis.error {
        print_panel_error(tr, err);
    } else if let Some(text) = &analysis.content {
        println!("\n-- {} --\n{text}", tr.t("ai.analysis_heading"));
    }
}

pub fn print_panel_error(tr: &Translator, err: &PanelError) {
    println!("{}", err.text(tr));
    if *err == PanelError::ServiceBlocked {
        println!("{}", tr.t("ai.enable_api_hint"));
    }
}

/// 저장된 프로젝트 목록. `show`/`delete`에 넘길 id를 함께 보여준다.
pub fn project_list_lines(tr: &Translator, projects: &[SavedProject]) -> Vec<String> {
    if projects.is_empty() {
        return vec![tr.t("project.none")];
    }
    let mut lines = vec![format!(
        "{:<36}  {:<24} {:<20} {}",
        tr.t("project.col_id"),
        tr.t("project.col_name"),
        tr.t("field.location"),
        tr.t("project.col_created"),
    )];
    lines.extend(projects.iter().map(|p| {
        format!(
            "{:<36}  {:<24} {:<20} {}",
            p.id,
            p.name,
            p.inputs.location,
            p.created_at.format("%d/%m/%Y %H:%M"),
        )
    }));
    lines
}

/// 저장된 프로젝트 비교표. 행마다 입력값에서 다시 계산한다.
pub fn comparison_lines(tr: &Translator, projects: &[SavedProject]) -> Vec<String> {
    if projects.is_empty() {
        return vec![tr.t("project.none")];
    }
    let mut lines = vec![format!(
        "{:>3}  {:<24} {:<20} {:>14} {:>14} {:>14} {:>8}",
        "#",
        tr.t("project.col_name"),
        tr.t("field.location"),
        tr.t("result.total_investment"),
        tr.t("result.revenue"),
        tr.t("result.profit"),
        tr.t("result.margin"),
    )];
    lines.extend(compare(projects).iter().enumerate().map(|(i, row)| {
        format!(
            "{:>3}  {:<24} {:<20} {:>14} {:>14} {:>14} {:>8}",
            i + 1,
            row.name,
            row.location,
            currency(row.total_investment),
            currency(row.revenue),
            currency(row.profit),
            percent(row.margin, 1),
        )
    }));
    lines
}

pub fn print_project_list(tr: &Translator, projects: &[SavedProject]) {
    println!("\n-- {} --", tr.t("project.list_heading"));
    for line in project_list_lines(tr, projects) {
        println!("{line}");
    }
}

pub fn print_comparison(tr: &Translator, projects: &[SavedProject]) {
    println!("\n-- {} --", tr.t("project.compare_heading"));
    for line in comparison_lines(tr, projects) {
        println!("{line}");
    }
}

/// 목록에서 번호로 프로젝트를 고른다. 빈 입력이면 취소.
pub fn pick_project(tr: &Translator, projects: &[SavedProject]) -> Result<Option<String>, AppError> {
    print_comparison(tr, projects);
    if projects.is_empty() {
        return Ok(None);
    }
    loop {
        let sel = read_line(&format!("{}: ", tr.t("project.pick")))?;
        let sel = sel.trim();
        if sel.is_empty() {
            return Ok(None);
        }
        match sel.parse::<usize>() {
            Ok(n) if (1..=projects.len()).contains(&n) => return Ok(Some(projects[n - 1].id.clone())),
            _ => println!("{}", tr.t("menu.invalid")),
        }
    }
}

/// 설정 메뉴를 처리한다. 변경이 있으면 true.
pub fn handle_settings(tr: &Translator, cfg: &mut Config) -> Result<bool, AppError> {
    println!("\n-- {} --", tr.t("settings.title"));
    println!("{}: {}", tr.t("settings.language"), cfg.language);
    println!("{}: {}", tr.t("settings.store_path"), cfg.store_path.display());
    println!("1) auto  2) English  3) Ελληνικά");
    let sel = read_line(&format!("{}: ", tr.t("settings.pick_language")))?;
    let lang = match sel.trim() {
        "" => return Ok(false),
        "1" => "auto",
        "2" => "en",
        "3" => "el",
        _ => {
            println!("{}", tr.t("menu.invalid"));
            return Ok(false);
        }
    };
    let changed = cfg.language != lang;
    cfg.language = lang.to_string();
    Ok(changed)
}

pub fn read_credentials(tr: &Translator) -> Result<(String, String), AppError> {
    let email = read_line(&format!("{}: ", tr.t("auth.email")))?;
    let password = read_line(&format!("{}: ", tr.t("auth.password")))?;
    Ok((email.trim().to_string(), password.trim_end_matches(['\r', '\n']).to_string()))
}

pub fn print_notification(tr: &Translator, n: &Notification) {
    let mark = match n.kind {
        NoticeKind::Success => "✓",
        NoticeKind::Error => "✗",
    };
    println!("{mark} {}", n.text(tr));
}

/// y/N 확인.
pub fn confirm(prompt: &str) -> Result<bool, AppError> {
    let ans = read_line(&format!("{prompt} [y/N]: "))?;
    Ok(is_yes(&ans))
}

fn is_yes(ans: &str) -> bool {
    matches!(ans.trim().to_lowercase().as_str(), "y" | "yes" | "ν" | "ναι")
}

/// 기본값을 보여주고 읽는다. 빈 입력이면 기본값.
pub fn read_with_default(prompt: &str, default: &str) -> Result<String, AppError> {
    let s = read_line(&format!("{prompt} ({default}): "))?;
    let s = s.trim();
    Ok(if s.is_empty() {
        default.to_string()
    } else {
        s.to_string()
    })
}

fn read_line(prompt: &str) -> Result<String, AppError> {
    print!("{prompt}");
    io::stdout().flush()?;
    let mut buf = String::new();
    if io::stdin().read_line(&mut buf)? == 0 {
        return Err(AppError::Io(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "input closed",
        )));
    }
    Ok(buf)
}
