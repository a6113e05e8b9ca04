//! Command-line interface: argument definitions and the interactive prompts used by
//! `autoresume tailor`.

use std::io::{self, BufRead, Read, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};

use crate::scoring::SelectionBudget;

#[derive(Debug, Parser)]
#[command(name = "autoresume", version, about = "Tailor a LaTeX resume to a job description")]
pub struct Cli {
    /// JSON file of category weights (defaults to AUTORESUME_WEIGHTS_PATH, then all 1.0)
    #[arg(long, global = true)]
    pub weights: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Analyze a job description, rank resume bullets, rewrite and compile the resume
    Tailor {
        /// Company name used for the output PDF (prompted if omitted)
        #[arg(long)]
        company: Option<String>,

        /// Job description file (read from stdin if neither this nor --clipboard is given)
        #[arg(long, conflicts_with = "clipboard")]
        jd: Option<PathBuf>,

        /// Take the job description from the system clipboard
        #[arg(long)]
        clipboard: bool,

        #[arg(long, default_value = "resume.tex")]
        resume: PathBuf,

        #[arg(long, default_value = ".")]
        out_dir: PathBuf,

        /// Write the full run report as JSON
        #[arg(long)]
        report: Option<PathBuf>,

        /// Compile without asking
        #[arg(long)]
        yes: bool,

        #[command(flatten)]
        budget: BudgetArgs,
    },

    /// Score bullets offline from a JSON request (no model calls)
    Score {
        #[arg(long)]
        input: PathBuf,

        #[command(flatten)]
        budget: BudgetArgs,
    },

    /// Run the HTTP API
    Serve,
}

#[derive(Debug, Clone, Default, Args)]
pub struct BudgetArgs {
    /// Keep at most N bullets
    #[arg(long, conflicts_with = "max_chars")]
    pub max_bullets: Option<usize>,

    /// Keep bullets up to a total of N characters
    #[arg(long)]
    pub max_chars: Option<usize>,
}

impl BudgetArgs {
    /// `None` when neither flag was given, so a budget in the input file still applies.
    pub fn budget(&self) -> Option<SelectionBudget> {
        match (self.max_bullets, self.max_chars) {
            (Some(n), _) => Some(SelectionBudget::MaxCount(n)),
            (None, Some(n)) => Some(SelectionBudget::MaxLength(n)),
            (None, None) => None,
        }
    }
}

/// Prints `prompt` and reads one trimmed line. Returns `None` on EOF.
pub fn prompt_line<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    prompt: &str,
) -> io::Result<Option<String>> {
    write!(output, "{prompt}")?;
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

/// Asks until the answer is Y or N (case-insensitive). EOF counts as no.
pub fn confirm<R: BufRead, W: Write>(input: &mut R, output: &mut W, question: &str) -> io::Result<bool> {
    loop {
        let Some(answer) = prompt_line(input, output, &format!("{question} (Y/N): "))? else {
            return Ok(false);
        };
        match answer.to_ascii_lowercase().as_str() {
            "y" | "yes" => return Ok(true),
            "n" | "no" => return Ok(false),
            _ => writeln!(output, "Type 'Y' or 'N'.")?,
        }
    }
}

/// Reads a pasted job description until EOF.
pub fn read_pasted_text<R: Read>(input: &mut R) -> io::Result<String> {
    let mut text = String::new();
    input.read_to_string(&mut text)?;
    Ok(text.trim().to_string())
}

/// Reads the system clipboard as text.
pub fn read_clipboard() -> anyhow::Result<String> {
    let mut clipboard = arboard::Clipboard::new().context("Could not open the system clipboard")?;
    let text = clipboard
        .get_text()
        .context("Clipboard does not contain text")?;
    Ok(text.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_budget_flags() {
        assert_eq!(BudgetArgs::default().budget(), None);
        let args = BudgetArgs {
            max_bullets: Some(4),
            max_chars: None,
        };
        assert_eq!(args.budget(), Some(SelectionBudget::MaxCount(4)));
        let args = BudgetArgs {
            max_bullets: None,
            max_chars: Some(900),
        };
        assert_eq!(args.budget(), Some(SelectionBudget::MaxLength(900)));
    }

    #[test]
    fn test_budget_flags_conflict() {
        let result = Cli::try_parse_from([
            "autoresume",
            "score",
            "--input",
            "s.json",
            "--max-bullets",
            "3",
            "--max-chars",
            "100",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_tailor_defaults() {
        let cli = Cli::try_parse_from(["autoresume", "tailor", "--company", "Acme"]).unwrap();
        match cli.command {
            Commands::Tailor {
                company,
                resume,
                yes,
                jd,
                ..
            } => {
                assert_eq!(company.as_deref(), Some("Acme"));
                assert_eq!(resume, PathBuf::from("resume.tex"));
                assert!(!yes);
                assert!(jd.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_clipboard_flag() {
        let cli = Cli::try_parse_from(["autoresume", "tailor", "--clipboard"]).unwrap();
        assert!(matches!(cli.command, Commands::Tailor { clipboard: true, .. }));

        let result = Cli::try_parse_from(["autoresume", "tailor", "--clipboard", "--jd", "jd.txt"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_global_weights_flag_after_subcommand() {
        let cli = Cli::try_parse_from(["autoresume", "serve", "--weights", "w.json"]).unwrap();
        assert_eq!(cli.weights, Some(PathBuf::from("w.json")));
    }

    #[test]
    fn test_confirm_reprompts_on_invalid_input() {
        let mut input = Cursor::new("maybe\n\ny\n");
        let mut output = Vec::new();
        assert!(confirm(&mut input, &mut output, "Compile PDF?").unwrap());

        let printed = String::from_utf8(output).unwrap();
        assert_eq!(printed.matches("Compile PDF? (Y/N): ").count(), 3);
        assert_eq!(printed.matches("Type 'Y' or 'N'.").count(), 2);
    }

    #[test]
    fn test_confirm_no_and_eof() {
        let mut output = Vec::new();
        assert!(!confirm(&mut Cursor::new("N\n"), &mut output, "Q?").unwrap());
        assert!(!confirm(&mut Cursor::new(""), &mut output, "Q?").unwrap());
    }

    #[test]
    fn test_prompt_line_trims() {
        let mut output = Vec::new();
        let line = prompt_line(&mut Cursor::new("  Google \n"), &mut output, "Company: ").unwrap();
        assert_eq!(line.as_deref(), Some("Google"));
        assert_eq!(output, b"Company: ");
    }

    #[test]
    fn test_read_pasted_text() {
        let text = read_pasted_text(&mut Cursor::new("\nSenior Go engineer\nRemote\n\n")).unwrap();
        assert_eq!(text, "Senior Go engineer\nRemote");
    }
}
