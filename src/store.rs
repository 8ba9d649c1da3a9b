//! Per-user letterhead and project records, persisted as a JSON file.
//!
//! One anonymous local user owns one `user.json` holding their letterhead
//! assets (manually entered, or cropped out of a PDF) and lightweight project
//! records. This is deliberately CRUD-level glue around the crop pipeline's
//! artifacts.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use log::debug;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Error type for store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to access store file: {0}")]
    Io(#[from] std::io::Error),
    #[error("store file is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("a manual letterhead requires a company name")]
    MissingCompanyName,
}

/// A stored header asset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Letterhead {
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub kind: LetterheadKind,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LetterheadKind {
    /// Entered through the form, with optional contact details and logo.
    Manual {
        company_name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        address: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        phone: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        email: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        website: Option<String>,
        /// Encoded logo image payload
        #[serde(default, skip_serializing_if = "Option::is_none")]
        logo: Option<String>,
    },
    /// Cropped out of a PDF first page.
    Cropped {
        /// Encoded header image payload
        image: String,
    },
}

/// Form input for a manual letterhead.
#[derive(Debug, Clone, Default)]
pub struct ManualEntry {
    /// Record name; falls back to the company name when empty
    pub name: String,
    pub company_name: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    pub website: String,
    pub logo: Option<String>,
}

/// A lightweight project record referencing a letterhead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub letterhead_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct UserData {
    user_id: String,
    letterheads: Vec<Letterhead>,
    projects: Vec<Project>,
}

/// JSON-file-backed store for one anonymous local user.
pub struct AssetStore {
    path: PathBuf,
    data: UserData,
}

impl AssetStore {
    /// Open the store under `dir`, creating a fresh user record if absent.
    pub fn open(dir: &Path) -> Result<Self, StoreError> {
        fs::create_dir_all(dir)?;
        let path = dir.join("user.json");

        let data = if path.exists() {
            serde_json::from_str(&fs::read_to_string(&path)?)?
        } else {
            let data = UserData {
                user_id: format!("user_{}", Uuid::new_v4()),
                letterheads: Vec::new(),
                projects: Vec::new(),
            };
            debug!("initialized store for {}", data.user_id);
            data
        };

        Ok(Self { path, data })
    }

    pub fn user_id(&self) -> &str {
        &self.data.user_id
    }

    pub fn letterheads(&self) -> &[Letterhead] {
        &self.data.letterheads
    }

    pub fn projects(&self) -> &[Project] {
        &self.data.projects
    }

    /// Record a letterhead cropped out of a PDF.
    pub fn add_cropped(&mut self, name: &str, image: String) -> Letterhead {
        let record = Letterhead {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            kind: LetterheadKind::Cropped { image },
            created_at: Utc::now().to_rfc3339(),
        };
        self.data.letterheads.push(record.clone());
        record
    }

    /// Record a manually entered letterhead.
    pub fn add_manual(&mut self, entry: ManualEntry) -> Result<Letterhead, StoreError> {
        let company_name = entry.company_name.trim();
        if company_name.is_empty() {
            return Err(StoreError::MissingCompanyName);
        }
        let name = if entry.name.trim().is_empty() {
            company_name.to_string()
        } else {
            entry.name.trim().to_string()
        };

        let optional = |value: String| {
            let value = value.trim().to_string();
            (!value.is_empty()).then_some(value)
        };

        let record = Letterhead {
            id: Uuid::new_v4().to_string(),
            name,
            kind: LetterheadKind::Manual {
                company_name: company_name.to_string(),
                address: optional(entry.address),
                phone: optional(entry.phone),
                email: optional(entry.email),
                website: optional(entry.website),
                logo: entry.logo,
            },
            created_at: Utc::now().to_rfc3339(),
        };
        self.data.letterheads.push(record.clone());
        Ok(record)
    }

    /// Record a project, optionally linked to a stored letterhead.
    pub fn add_project(&mut self, name: &str, letterhead_id: Option<&str>) -> Project {
        let now = Utc::now().to_rfc3339();
        let record = Project {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            letterhead_id: letterhead_id.map(str::to_string),
            created_at: now.clone(),
            updated_at: now,
        };
        self.data.projects.push(record.clone());
        record
    }

    /// Persist the store; the file is replaced atomically.
    pub fn save(&self) -> Result<(), StoreError> {
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string_pretty(&self.data)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}
