// PDF rendering of the tailored LaTeX via an external pdflatex process.

pub mod latex;

pub use latex::{compile_to_dir, render_pdf, RenderError};
