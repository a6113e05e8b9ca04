//! LaTeX rendering — compiles the tailored source with `pdflatex` as a subprocess.
//!
//! Compilation happens in a scratch `TempDir`, so `.aux`/`.log`/`.out` files never
//! reach the output directory. A non-zero exit that still produced a PDF is reported
//! as a warning, matching how pdflatex behaves in nonstopmode.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;
use tokio::process::Command;
use tracing::{info, warn};

/// File name of the tailored source written next to the PDF.
pub const TEX_FILENAME: &str = "tailored_resume.tex";
/// Lines of compiler output kept in a `CompileFailed` error.
const LOG_TAIL_LINES: usize = 20;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Could not find '{0}'. Is LaTeX installed and on PATH?")]
    CompilerNotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("pdflatex exited with {status} and produced no PDF:\n{log_tail}")]
    CompileFailed { status: String, log_tail: String },
}

/// A compiled PDF held in memory.
#[derive(Debug, Clone)]
pub struct RenderedPdf {
    pub job_name: String,
    pub bytes: Vec<u8>,
    /// False when pdflatex reported problems but still wrote a PDF.
    pub clean: bool,
}

/// Files written by `compile_to_dir`.
#[derive(Debug, Clone)]
pub struct RenderOutput {
    pub tex_path: PathBuf,
    pub pdf_path: PathBuf,
    pub clean: bool,
}

/// `resume_<Company>` with every run of characters outside `[A-Za-z0-9_-]` replaced by `-`.
pub fn job_name(company: &str) -> String {
    static UNSAFE: OnceLock<Regex> = OnceLock::new();
    let unsafe_chars = UNSAFE.get_or_init(|| Regex::new(r"[^A-Za-z0-9_-]+").expect("valid regex"));

    let cleaned = unsafe_chars.replace_all(company.trim(), "-");
    if cleaned.is_empty() {
        "resume_tailored".to_string()
    } else {
        format!("resume_{cleaned}")
    }
}

/// Compiles `latex` and returns the PDF bytes. Nothing is left on disk.
pub async fn render_pdf(
    latex: &str,
    company: &str,
    pdflatex_bin: &str,
) -> Result<RenderedPdf, RenderError> {
    let job_name = job_name(company);
    let scratch = tempfile::tempdir()?;

    let (pdf_path, clean) = compile_in(scratch.path(), latex, &job_name, pdflatex_bin).await?;
    let bytes = tokio::fs::read(&pdf_path).await?;

    Ok(RenderedPdf {
        job_name,
        bytes,
        clean,
    })
}

/// Writes `tailored_resume.tex` and `<job_name>.pdf` into `out_dir`.
pub async fn compile_to_dir(
    latex: &str,
    company: &str,
    out_dir: &Path,
    pdflatex_bin: &str,
) -> Result<RenderOutput, RenderError> {
    tokio::fs::create_dir_all(out_dir).await?;
    let tex_path = out_dir.join(TEX_FILENAME);
    tokio::fs::write(&tex_path, latex).await?;

    let rendered = render_pdf(latex, company, pdflatex_bin).await?;
    let pdf_path = out_dir.join(format!("{}.pdf", rendered.job_name));
    tokio::fs::write(&pdf_path, &rendered.bytes).await?;

    info!("Wrote {} and {}", tex_path.display(), pdf_path.display());

    Ok(RenderOutput {
        tex_path,
        pdf_path,
        clean: rendered.clean,
    })
}

async fn compile_in(
    dir: &Path,
    latex: &str,
    job_name: &str,
    pdflatex_bin: &str,
) -> Result<(PathBuf, bool), RenderError> {
    tokio::fs::write(dir.join(TEX_FILENAME), latex).await?;

    info!("Compiling LaTeX to {job_name}.pdf...");
    let output = Command::new(pdflatex_bin)
        .arg("-interaction=nonstopmode")
        .arg(format!("-jobname={job_name}"))
        .arg(TEX_FILENAME)
        .current_dir(dir)
        .output()
        .await
        .map_err(|e| match e.kind() {
            ErrorKind::NotFound => RenderError::CompilerNotFound(pdflatex_bin.to_string()),
            _ => RenderError::Io(e),
        })?;

    let pdf_path = dir.join(format!("{job_name}.pdf"));
    let produced = tokio::fs::try_exists(&pdf_path).await?;

    if !produced {
        return Err(RenderError::CompileFailed {
            status: output.status.to_string(),
            log_tail: log_tail(&output.stdout, &output.stderr),
        });
    }

    if !output.status.success() {
        warn!("pdflatex finished with potential formatting issues. Check the PDF.");
    }

    Ok((pdf_path, output.status.success()))
}

/// Last few lines of compiler output; pdflatex reports errors on stdout.
fn log_tail(stdout: &[u8], stderr: &[u8]) -> String {
    let combined = format!(
        "{}{}",
        String::from_utf8_lossy(stdout),
        String::from_utf8_lossy(stderr)
    );
    let lines: Vec<&str> = combined.lines().collect();
    let start = lines.len().saturating_sub(LOG_TAIL_LINES);
    lines[start..].join("\n")
}
