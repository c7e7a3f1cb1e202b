//! Compile entry point: two input strings in, analysed component and
//! generated files out.

use serde::{Deserialize, Serialize};

use crate::emit::{self, NoFormatter, SourceFormatter, TemplateFiles};
use crate::error::{Reporter, Result};
use crate::ir::TemplateComponent;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompileOutput {
    pub component: TemplateComponent,
    pub files: TemplateFiles,
}

/// Compile annotated markup plus a stylesheet into every configured output
/// format.
///
/// With `halt_on_errors = false` the compilation never fails: diagnostics are
/// logged and a best-effort output is produced. With `true`, the first
/// diagnostic aborts with [`crate::error::CompileError::Halted`].
pub fn compile(
    markup: &str,
    css: &str,
    template_id: &str,
    halt_on_errors: bool,
) -> Result<CompileOutput> {
    compile_with_formatter(markup, css, template_id, halt_on_errors, &NoFormatter)
}

/// [`compile`] with an external source pretty-printer. Formatter failures are
/// tolerated; the unformatted text is used as a fallback.
pub fn compile_with_formatter(
    markup: &str,
    css: &str,
    template_id: &str,
    halt_on_errors: bool,
    formatter: &dyn SourceFormatter,
) -> Result<CompileOutput> {
    let reporter = Reporter::new(halt_on_errors);
    let component = crate::builder::build_component(markup, css, &reporter)?;
    let files = emit::emit_all(&component, template_id, formatter);
    Ok(CompileOutput { component, files })
}
