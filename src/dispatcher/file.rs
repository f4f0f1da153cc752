//! File-mode dispatcher (C7) — recursively renders every template JSON file
//! under a directory to a PDF alongside it.
//!
//! Grounded on the "collect errors without failing the batch" shape of
//! `run_job`-style batch runners in the wider example pack: one file's
//! failure is logged and tallied, not propagated to abort the whole walk.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use walkdir::WalkDir;

use crate::cancel::CancelSignal;
use crate::error::{RenderError, Result};
use crate::model::RenderRequest;
use crate::pipeline::Pipeline;

/// Outcome of rendering a single template file.
#[derive(Debug)]
pub struct FileJobOutcome {
    /// The template file that was processed.
    pub input_path: PathBuf,
    /// Result of the render: `Ok(output_path)` or the error that occurred.
    pub result: std::result::Result<PathBuf, String>,
}

/// Summary of a full directory scan.
#[derive(Debug, Default)]
pub struct FileDispatchSummary {
    /// Successful and failed per-file outcomes, in completion order.
    pub outcomes: Vec<FileJobOutcome>,
}

impl FileDispatchSummary {
    /// Count of files that rendered successfully.
    pub fn success_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    /// Count of files that failed.
    pub fn failure_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_err()).count()
    }
}

/// Recursively renders every `*.json` template file under `templates_root`,
/// writing `<outputRoot>/<documentType>_<jobId hex>.pdf` for each.
///
/// Files are processed concurrently via the pipeline's blocking executor;
/// a failure on one file is logged and counted but never aborts the scan.
pub async fn run(
    pipeline: Arc<Pipeline>,
    templates_root: &Path,
    output_root: &Path,
    cancel: CancelSignal,
) -> FileDispatchSummary {
    if !templates_root.exists() {
        log::warn!(
            "⚠️ Templates root {} does not exist, creating it (0 files to render)",
            templates_root.display()
        );
        if let Err(e) = tokio::fs::create_dir_all(templates_root).await {
            log::error!("❌ Failed to create templates root {}: {e}", templates_root.display());
        }
    }

    let files: Vec<PathBuf> = WalkDir::new(templates_root)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "json"))
        .map(|entry| entry.path().to_path_buf())
        .collect();

    log::info!(" File dispatcher found {} template file(s) under {}", files.len(), templates_root.display());

    let mut tasks = Vec::with_capacity(files.len());
    for file in files {
        let pipeline = Arc::clone(&pipeline);
        let output_root = output_root.to_path_buf();
        let cancel = cancel.clone();
        tasks.push(tokio::spawn(async move {
            render_one(pipeline, file, output_root, cancel).await
        }));
    }

    let mut outcomes = Vec::with_capacity(tasks.len());
    for task in tasks {
        match task.await {
            Ok(outcome) => outcomes.push(outcome),
            Err(join_error) => log::error!("❌ File-mode render task panicked: {join_error}"),
        }
    }

    let summary = FileDispatchSummary { outcomes };
    log::info!(
        "✅ File dispatcher finished: {} succeeded, {} failed",
        summary.success_count(),
        summary.failure_count()
    );
    summary
}

async fn render_one(
    pipeline: Arc<Pipeline>,
    input_path: PathBuf,
    output_root: PathBuf,
    cancel: CancelSignal,
) -> FileJobOutcome {
    let result = render_one_inner(&pipeline, &input_path, &output_root, &cancel).await;

    if let Err(e) = &result {
        log::warn!("⚠️ Template file {} failed: {e}", input_path.display());
    }

    FileJobOutcome {
        input_path,
        result: result.map_err(|e| e.to_string()),
    }
}

async fn render_one_inner(
    pipeline: &Arc<Pipeline>,
    input_path: &Path,
    output_root: &Path,
    cancel: &CancelSignal,
) -> Result<PathBuf> {
    let contents = tokio::fs::read_to_string(input_path)
        .await
        .map_err(|e| RenderError::IoTemplate {
            path: input_path.display().to_string(),
            source: e.to_string(),
        })?;

    let template = serde_json::from_str(&contents).map_err(|e| RenderError::IoTemplate {
        path: input_path.display().to_string(),
        source: e.to_string(),
    })?;

    let request = RenderRequest::new(None, template);
    let job_id = request.job_id.clone();
    let document_type = request.template.document_type.clone();

    let pipeline = Arc::clone(pipeline);
    let cancel_for_blocking = cancel.clone();
    let render_result = tokio::task::spawn_blocking(move || pipeline.execute(&request, &cancel_for_blocking))
        .await
        .map_err(|e| RenderError::RenderPdf(format!("render task panicked: {e}")))??;

    let id_no_dashes: String = job_id.chars().filter(|c| *c != '-').collect();
    let output_path = output_root.join(format!("{document_type}_{id_no_dashes}.pdf"));

    if let Some(parent) = output_path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(|e| RenderError::IoOutput {
            path: output_path.display().to_string(),
            source: e.to_string(),
        })?;
    }

    tokio::fs::write(&output_path, &render_result.pdf_bytes)
        .await
        .map_err(|e| RenderError::IoOutput {
            path: output_path.display().to_string(),
            source: e.to_string(),
        })?;

    Ok(output_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_counts() {
        let summary = FileDispatchSummary {
            outcomes: vec![
                FileJobOutcome { input_path: PathBuf::from("a.json"), result: Ok(PathBuf::from("a.pdf")) },
                FileJobOutcome { input_path: PathBuf::from("b.json"), result: Err("boom".to_string()) },
            ],
        };
        assert_eq!(summary.success_count(), 1);
        assert_eq!(summary.failure_count(), 1);
    }
}
