//! 프로젝트 저장소. 파일(TOML) 백엔드와 메모리 백엔드를 제공한다.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::SavedProject;
use crate::feasibility::ProjectInputs;

/// 저장소 작업 중 발생 가능한 오류.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// 파일 입출력 오류
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// 저장 파일 파싱 오류
    #[error("store file is corrupt: {0}")]
    Parse(#[from] toml::de::Error),
    /// 저장 파일 직렬화 오류
    #[error("could not serialize projects: {0}")]
    Serialize(#[from] toml::ser::Error),
    /// 없는 프로젝트 id
    #[error("project not found: {0}")]
    NotFound(String),
}

/// 저장된 프로젝트의 생성/목록/삭제 계약.
///
/// id와 생성 시각은 저장소가 부여하고, 목록은 최신순으로 돌려준다.
pub trait ProjectStore {
    fn create(&mut self, name: &str, inputs: &ProjectInputs) -> Result<SavedProject, StoreError>;
    fn list(&self) -> Result<Vec<SavedProject>, StoreError>;
    fn delete(&mut self, id: &str) -> Result<(), StoreError>;

    /// id로 한 건을 찾는다.
    fn get(&self, id: &str) -> Result<SavedProject, StoreError> {
        self.list()?
            .into_iter()
            .find(|p| p.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }
}

fn new_record(name: &str, inputs: &ProjectInputs) -> SavedProject {
    SavedProject {
        id: Uuid::new_v4().to_string(),
        name: name.trim().to_string(),
        created_at: Utc::now(),
        inputs: inputs.clone(),
    }
}

fn newest_first(projects: &mut [SavedProject]) {
    projects.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

/// 파일 하나에 전체 목록을 담는 형식.
#[derive(Debug, Default, Serialize, Deserialize)]
struct ProjectFile {
    #[serde(default)]
    projects: Vec<SavedProject>,
}

/// TOML 파일 기반 저장소. 파일이 없으면 빈 목록으로 본다.
#[derive(Debug, Clone)]
pub struct FileProjectStore {
    path: PathBuf,
}

impl FileProjectStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<ProjectFile, StoreError> {
        if !self.path.exists() {
            return Ok(ProjectFile::default());
        }
        let content = fs::read_to_string(&self.path)?;
        Ok(toml::from_str(&content)?)
    }

    /// 임시 파일에 쓴 뒤 rename 하여 중간 상태가 남지 않게 한다.
    fn write(&self, file: &ProjectFile) -> Result<(), StoreError> {
        let content = toml::to_string_pretty(file)?;
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir)?;
            }
        }
        let tmp = self.path.with_extension("toml.tmp");
        fs::write(&tmp, content)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl ProjectStore for FileProjectStore {
    fn create(&mut self, name: &str, inputs: &ProjectInputs) -> Result<SavedProject, StoreError> {
        let mut file = self.read()?;
        let record = new_record(name, inputs);
        file.projects.insert(0, record.clone());
        self.write(&file)?;
        tracing::info!(id = %record.id, name = %record.name, "project saved");
        Ok(record)
    }

    fn list(&self) -> Result<Vec<SavedProject>, StoreError> {
        let mut projects = self.read()?.projects;
        newest_first(&mut projects);
        tracing::debug!(count = projects.len(), path = %self.path.display(), "projects listed");
        Ok(projects)
    }

    fn delete(&mut self, id: &str) -> Result<(), StoreError> {
        let mut file = self.read()?;
        let before = file.projects.len();
        file.projects.retain(|p| p.id != id);
        if file.projects.len() == before {
            return Err(StoreError::NotFound(id.to_string()));
        }
        self.write(&file)?;
        tracing::info!(id, "project deleted");
        Ok(())
    }
}

/// 메모리 저장소. 테스트와 저장 경로가 없는 실행에 쓴다.
#[derive(Debug, Default, Clone)]
pub struct MemoryProjectStore {
    projects: Vec<SavedProject>,
}

impl MemoryProjectStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProjectStore for MemoryProjectStore {
    fn create(&mut self, name: &str, inputs: &ProjectInputs) -> Result<SavedProject, StoreError> {
        let record = new_record(name, inputs);
        self.projects.insert(0, record.clone());
        Ok(record)
    }

    fn list(&self) -> Result<Vec<SavedProject>, StoreError> {
        let mut projects = self.projects.clone();
        newest_first(&mut projects);
        Ok(projects)
    }

    fn delete(&mut self, id: &str) -> Result<(), StoreError> {
        let before = self.projects.len();
        self.projects.retain(|p| p.id != id);
        if self.projects.len() == before {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }
}
