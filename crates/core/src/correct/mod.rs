//! Correction orchestration utilities.
//! This module pairs chunk artifact files into projects, runs an external
//! text corrector over them in bounded waves and recombines the results
//! into final SRT text.

use crate::merge;
use anyhow::Result;
use async_trait::async_trait;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Number of projects corrected concurrently per wave.
pub const DEFAULT_WAVE_SIZE: usize = 5;

/// Reference material handed to the corrector alongside the text.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReferenceConfig {
    pub characters: Vec<String>,
    pub movies: Vec<String>,
    pub documents: Vec<PathBuf>,
}

/// Corrects a newline-separated text segment.
/// Implementations must return the same number of lines as the input;
/// the recombination step assumes but does not verify this.
#[async_trait]
pub trait Corrector: Send + Sync + Clone {
    async fn correct_text(&self, text: &str, config: &ReferenceConfig) -> Result<String>;
}

pub mod gemini;

/// One pair of chunk artifact files identified by a shared filename prefix.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Project {
    pub id: String,
    pub structure_path: Option<PathBuf>,
    pub text_path: Option<PathBuf>,
}

/// What happened to a single project. A failure never affects siblings;
/// the project stays eligible for a rerun without re-pairing its files.
#[derive(Debug, Clone, PartialEq)]
pub enum ProjectOutcome {
    Completed {
        original_text: String,
        corrected_text: String,
        final_srt: String,
    },
    Failed {
        message: String,
    },
}

/// Per-project result of a correction run.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectReport {
    pub id: String,
    pub outcome: ProjectOutcome,
}

/// Group artifact files into projects by their filename prefix up to the
/// first underscore. `num&timecodes` names bind the structure slot and
/// `text` names the text slot; anything else is ignored with a warning.
/// Projects come back sorted id-numerically.
pub fn pair_files<I>(paths: I) -> Vec<Project>
where
    I: IntoIterator<Item = PathBuf>,
{
    let mut projects: BTreeMap<String, Project> = BTreeMap::new();
    for path in paths {
        let Some(name) = path.file_name().map(|n| n.to_string_lossy().to_string()) else {
            continue;
        };
        let id = match name.split_once('_') {
            Some((prefix, _)) if !prefix.is_empty() => prefix.to_string(),
            _ => {
                warn!("ignoring {name}: no underscore-delimited project id");
                continue;
            }
        };
        let project = projects.entry(id.clone()).or_insert_with(|| Project {
            id,
            ..Project::default()
        });
        if name.contains("num&timecodes") {
            project.structure_path = Some(path);
        } else if name.contains("text") {
            project.text_path = Some(path);
        } else {
            warn!("ignoring {name}: neither a structure nor a text file");
        }
    }
    let mut list: Vec<Project> = projects.into_values().collect();
    list.sort_by(|a, b| match (a.id.parse::<u64>(), b.id.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        _ => a.id.cmp(&b.id),
    });
    list
}

/// Run the corrector over every project in fixed-size waves.
/// Each wave completes fully before the next starts and a failing project
/// is recorded in its report rather than aborting the run.
pub async fn correct_all<C>(
    projects: &[Project],
    corrector: C,
    config: &ReferenceConfig,
    wave_size: usize,
) -> Vec<ProjectReport>
where
    C: Corrector,
{
    let wave_size = wave_size.max(1);
    let mut reports = Vec::with_capacity(projects.len());
    let total = projects.len();
    for (w, wave) in projects.chunks(wave_size).enumerate() {
        debug!("starting wave {} with {} projects", w + 1, wave.len());
        let results = join_all(
            wave.iter()
                .map(|project| correct_project(project, corrector.clone(), config)),
        )
        .await;
        reports.extend(results);
        info!("completed {}/{} projects", reports.len(), total);
    }
    reports
}

/// Correct one project end to end: read its text file, run the corrector
/// and recombine with the structure file. All failure paths collapse into
/// a `Failed` outcome carrying the message.
async fn correct_project<C>(
    project: &Project,
    corrector: C,
    config: &ReferenceConfig,
) -> ProjectReport
where
    C: Corrector,
{
    let outcome = match run_correction(project, corrector, config).await {
        Ok(outcome) => outcome,
        Err(err) => {
            warn!("project {} failed: {err:#}", project.id);
            ProjectOutcome::Failed {
                message: format!("{err:#}"),
            }
        }
    };
    ProjectReport {
        id: project.id.clone(),
        outcome,
    }
}

async fn run_correction<C>(
    project: &Project,
    corrector: C,
    config: &ReferenceConfig,
) -> Result<ProjectOutcome>
where
    C: Corrector,
{
    let (structure_path, text_path) = match (&project.structure_path, &project.text_path) {
        (Some(s), Some(t)) => (s, t),
        _ => {
            return Ok(ProjectOutcome::Failed {
                message: "missing paired structure or text file".to_string(),
            })
        }
    };
    let original_text = fs::read_to_string(text_path)?;
    info!("correcting project {}", project.id);
    let corrected_text = corrector.correct_text(&original_text, config).await?;
    let structure = fs::read_to_string(structure_path)?;
    let final_srt = merge::merge_chunk(&structure, &corrected_text);
    Ok(ProjectOutcome::Completed {
        original_text,
        corrected_text,
        final_srt,
    })
}

/// Read the text-like reference documents from `config`, skipping anything
/// that cannot be inlined as plain text.
pub fn read_reference_documents(config: &ReferenceConfig) -> Vec<(String, String)> {
    let mut docs = Vec::new();
    for path in &config.documents {
        if !is_text_like(path) {
            warn!("skipping non-text reference document {}", path.display());
            continue;
        }
        match fs::read_to_string(path) {
            Ok(content) => {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default();
                docs.push((name, content));
            }
            Err(err) => warn!("could not read {}: {err}", path.display()),
        }
    }
    docs
}

fn is_text_like(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("txt") | Some("md") | Some("csv")
    )
}
