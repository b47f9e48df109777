//! On-disk projects: per-project config and response files.
//!
//! ```text
//! <root>/
//!   <project>/
//!     config.json      ProjectConfig
//!     json_files/      response files referenced by endpoints
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::control::state::{port_from_number_or_string, EndpointConfig, SendBlock, ServerAddress};
use crate::project::names::validate_name;
use crate::project::ProjectError;

const CONFIG_FILE: &str = "config.json";
const FILES_DIR: &str = "json_files";

const SAMPLE_FILES: &[(&str, &str)] = &[
    (
        "success_response.json",
        r#"{
    "code": 200,
    "message": "ok",
    "data": {
        "id": 12345,
        "name": "sample",
        "timestamp": "2024-01-01T12:00:00Z"
    }
}
"#,
    ),
    (
        "error_response.json",
        r#"{
    "code": 500,
    "message": "internal server error",
    "error": "request processing failed"
}
"#,
    ),
];

/// Persisted project configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    pub ip: String,
    #[serde(deserialize_with = "port_from_number_or_string")]
    pub port: u16,
    pub endpoints: Vec<EndpointConfig>,
    pub send_blocks: Vec<SendBlock>,
}

impl ProjectConfig {
    pub fn address(&self) -> ServerAddress {
        ServerAddress::new(self.ip.clone(), self.port)
    }
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            ip: "127.0.0.1".to_string(),
            port: 29800,
            endpoints: vec![
                EndpointConfig::new("audit task result", "/api/audioTask/getAuditTaskResult"),
                EndpointConfig::new("test1", "/api/test1"),
                EndpointConfig::new("test2", "/api/test2"),
                EndpointConfig::new("test3", "/api/test3"),
                EndpointConfig::new("test4", "/api/test4"),
            ],
            send_blocks: Vec::new(),
        }
    }
}

/// Entry returned by [`ProjectStore::list_projects`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectInfo {
    pub name: String,
}

/// Filesystem-backed project collaborator.
#[derive(Debug, Clone)]
pub struct ProjectStore {
    root: PathBuf,
}

impl ProjectStore {
    /// Open `root`, creating it and `default_project` (with sample files) if missing.
    pub async fn open(root: impl Into<PathBuf>, default_project: &str) -> Result<Self, ProjectError> {
        let store = Self { root: root.into() };
        validate_name(default_project)?;

        let files = store.root.join(default_project).join(FILES_DIR);
        tokio::fs::create_dir_all(&files).await?;

        for (name, content) in SAMPLE_FILES {
            let path = files.join(name);
            if !tokio::fs::try_exists(&path).await? {
                tokio::fs::write(&path, content).await?;
            }
        }

        tracing::info!(root = %store.root.display(), project = default_project, "Project store opened");
        Ok(store)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn project_dir(&self, project: &str) -> Result<PathBuf, ProjectError> {
        validate_name(project)?;
        Ok(self.root.join(project))
    }

    async fn existing_project_dir(&self, project: &str) -> Result<PathBuf, ProjectError> {
        let dir = self.project_dir(project)?;
        if !tokio::fs::try_exists(&dir).await? {
            return Err(ProjectError::NotFound(format!("project {project}")));
        }
        Ok(dir)
    }

    async fn file_path(&self, project: &str, file: &str) -> Result<PathBuf, ProjectError> {
        validate_name(file)?;
        Ok(self.existing_project_dir(project).await?.join(FILES_DIR).join(file))
    }

    /// All project directories under the root, sorted by name.
    pub async fn list_projects(&self) -> Result<Vec<ProjectInfo>, ProjectError> {
        let mut projects = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_dir() {
                if let Some(name) = entry.file_name().to_str() {
                    projects.push(ProjectInfo { name: name.to_string() });
                }
            }
        }
        projects.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(projects)
    }

    /// Create a new project with the default config.
    pub async fn create_project(&self, project: &str) -> Result<(), ProjectError> {
        let dir = self.project_dir(project)?;
        if tokio::fs::try_exists(&dir).await? {
            return Err(ProjectError::AlreadyExists(project.to_string()));
        }

        tokio::fs::create_dir_all(dir.join(FILES_DIR)).await?;
        self.save_config(project, &ProjectConfig::default()).await?;
        tracing::info!(project, "Project created");
        Ok(())
    }

    /// Load a project's config; a project without `config.json` gets the default.
    pub async fn load_config(&self, project: &str) -> Result<ProjectConfig, ProjectError> {
        let path = self.existing_project_dir(project).await?.join(CONFIG_FILE);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(project, "No config file, using defaults");
                return Ok(ProjectConfig::default());
            }
            Err(e) => return Err(e.into()),
        };

        serde_json::from_str(&content).map_err(|source| ProjectError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub async fn save_config(&self, project: &str, config: &ProjectConfig) -> Result<(), ProjectError> {
        let path = self.existing_project_dir(project).await?.join(CONFIG_FILE);
        let json = serde_json::to_string_pretty(config).map_err(ProjectError::InvalidJson)?;
        tokio::fs::write(&path, json).await?;
        tracing::debug!(project, path = %path.display(), "Project config saved");
        Ok(())
    }

    /// Raw bytes of a response file.
    pub async fn response_file(&self, project: &str, file: &str) -> Result<Vec<u8>, ProjectError> {
        let path = self.file_path(project, file).await?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(ProjectError::NotFound(format!("file {file}")))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// `*.json` file names in the project's response directory, sorted.
    pub async fn list_files(&self, project: &str) -> Result<Vec<String>, ProjectError> {
        let dir = self.existing_project_dir(project).await?.join(FILES_DIR);
        let mut files = Vec::new();
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(files),
            Err(e) => return Err(e.into()),
        };

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                    files.push(name.to_string());
                }
            }
        }
        files.sort();
        Ok(files)
    }

    pub async fn read_file(&self, project: &str, file: &str) -> Result<String, ProjectError> {
        let bytes = self.response_file(project, file).await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Write a response file. `content` must be valid JSON.
    pub async fn save_file(&self, project: &str, file: &str, content: &str) -> Result<(), ProjectError> {
        let path = self.file_path(project, file).await?;
        serde_json::from_str::<serde_json::Value>(content).map_err(ProjectError::InvalidJson)?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, content).await?;
        tracing::info!(project, file, "Response file saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store() -> (tempfile::TempDir, ProjectStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = ProjectStore::open(dir.path().join("projects"), "default").await.unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn open_seeds_default_project() {
        let (_dir, store) = store().await;
        let files = store.list_files("default").await.unwrap();
        assert_eq!(files, vec!["error_response.json", "success_response.json"]);

        let projects = store.list_projects().await.unwrap();
        assert_eq!(projects, vec![ProjectInfo { name: "default".into() }]);
    }

    #[tokio::test]
    async fn missing_config_yields_defaults_and_round_trips() {
        let (_dir, store) = store().await;
        assert_eq!(store.load_config("default").await.unwrap(), ProjectConfig::default());

        let mut cfg = ProjectConfig::default();
        cfg.port = 31000;
        cfg.endpoints = vec![EndpointConfig::new("echo", "/api/echo").inactive()];
        store.save_config("default", &cfg).await.unwrap();
        assert_eq!(store.load_config("default").await.unwrap(), cfg);
    }

    #[tokio::test]
    async fn legacy_config_with_string_port_loads() {
        let (_dir, store) = store().await;
        let legacy = r#"{"ip":"0.0.0.0","port":"29800","endpoints":[{"path":"/api/test1","response_file":"","is_active":true}]}"#;
        tokio::fs::write(store.root().join("default").join(CONFIG_FILE), legacy)
            .await
            .unwrap();

        let cfg = store.load_config("default").await.unwrap();
        assert_eq!(cfg.port, 29800);
        assert_eq!(cfg.endpoints.len(), 1);
        assert!(cfg.send_blocks.is_empty());
    }

    #[tokio::test]
    async fn create_project_rejects_duplicates_and_bad_names() {
        let (_dir, store) = store().await;
        store.create_project("alpha").await.unwrap();
        assert!(matches!(
            store.create_project("alpha").await,
            Err(ProjectError::AlreadyExists(_))
        ));
        assert!(matches!(
            store.create_project("../escape").await,
            Err(ProjectError::InvalidName(_))
        ));

        let names: Vec<_> = store.list_projects().await.unwrap().into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["alpha", "default"]);
        assert_eq!(store.load_config("alpha").await.unwrap(), ProjectConfig::default());
    }

    #[tokio::test]
    async fn save_file_requires_json() {
        let (_dir, store) = store().await;
        assert!(matches!(
            store.save_file("default", "bad.json", "{not json").await,
            Err(ProjectError::InvalidJson(_))
        ));
        assert!(matches!(
            store.save_file("default", "../x.json", "{}").await,
            Err(ProjectError::InvalidName(_))
        ));

        store.save_file("default", "ok.json", r#"{"a":1}"#).await.unwrap();
        assert_eq!(store.read_file("default", "ok.json").await.unwrap(), r#"{"a":1}"#);
    }

    #[tokio::test]
    async fn missing_things_are_not_found() {
        let (_dir, store) = store().await;
        assert!(matches!(
            store.response_file("default", "nope.json").await,
            Err(ProjectError::NotFound(_))
        ));
        assert!(matches!(
            store.load_config("ghost").await,
            Err(ProjectError::NotFound(_))
        ));
    }
}
