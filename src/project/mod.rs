//! 저장된 프로젝트 레코드와 보조 함수.

pub mod store;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::feasibility::{calculate, ProjectInputs};

pub use store::{FileProjectStore, MemoryProjectStore, ProjectStore, StoreError};

/// 저장된 프로젝트. 생성 후 수정하지 않는다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedProject {
    /// 저장소가 부여한 식별자
    pub id: String,
    pub name: String,
    /// 생성 시각(저장소가 부여)
    pub created_at: DateTime<Utc>,
    pub inputs: ProjectInputs,
}

/// 비교 목록의 한 행. 저장된 입력값에서 매번 다시 계산한다.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectSummary {
    pub id: String,
    pub name: String,
    pub location: String,
    pub created_at: DateTime<Utc>,
    pub total_investment: f64,
    pub revenue: f64,
    pub profit: f64,
    pub margin: f64,
}

impl From<&SavedProject> for ProjectSummary {
    fn from(p: &SavedProject) -> Self {
        let r = calculate(&p.inputs);
        Self {
            id: p.id.clone(),
            name: p.name.clone(),
            location: p.inputs.location.clone(),
            created_at: p.created_at,
            total_investment: r.construction_cost_total_incl_plot,
            revenue: r.revenue_total,
            profit: r.profit_total,
            margin: r.profit_margin,
        }
    }
}

/// 저장 목록 순서를 유지한 비교표를 만든다.
pub fn compare(projects: &[SavedProject]) -> Vec<ProjectSummary> {
    projects.iter().map(ProjectSummary::from).collect()
}

/// 저장 대화상자의 기본 이름. 위치가 있으면 위치, 없으면 날짜 기반 이름.
pub fn default_project_name(inputs: &ProjectInputs, today: NaiveDate) -> String {
    let location = inputs.location.trim();
    if location.is_empty() {
        format!("Project {}", today.format("%d/%m/%Y"))
    } else {
        location.to_string()
    }
}

/// 같은 주소(대소문자/앞뒤 공백 무시)로 이미 저장된 프로젝트를 찾는다.
pub fn find_duplicate_location<'a>(
    projects: &'a [SavedProject],
    location: &str,
) -> Option<&'a SavedProject> {
    let needle = location.trim().to_lowercase();
    projects
        .iter()
        .find(|p| p.inputs.location.trim().to_lowercase() == needle)
}
