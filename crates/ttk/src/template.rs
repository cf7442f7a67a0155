//! Engine configuration and the render entry points.

use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;

use bon::Builder;
use indexmap::IndexMap;

use crate::diagnostics::{Diagnostics, Level, TracingDiagnostics};
use crate::interpreter::{
    BlockDef, Context, FileSystemLoader, Filter, NativeBlock, StashView, TemplateError, TemplateLoader,
    render_template,
};
use crate::lexer::{self, Chomp, LexerOptions, Token};
use crate::parser::{self, Document, ParseError, ParseOptions};
use crate::types::{Exception, Vars};

/// A configured template engine.
///
/// A `Template` is immutable once built and can render any number of
/// sources. Every render gets its own variable stash, block table and
/// filter aliases.
///
/// # Example
///
/// ```
/// use ttk::{BlockSource, Template, vars};
///
/// let template = Template::builder()
///     .trim(true)
///     .blocks([("greet".to_string(), BlockSource::text("Hello, [% name %]!"))].into())
///     .build();
///
/// let out = template
///     .process("  [% INCLUDE greet name = 'World' %]  ", &vars! {})
///     .unwrap();
/// assert_eq!(out, "Hello, World!");
/// ```
#[derive(Builder)]
#[builder(on(String, into))]
pub struct Template {
    /// Trim leading and trailing whitespace from the output and from every
    /// named block's output.
    #[builder(default)]
    pub(crate) trim: bool,

    /// Expand `$var` and `${ expr }` in plain text.
    #[builder(default)]
    pub(crate) interpolate: bool,

    /// Recognize reserved words in any case.
    #[builder(default)]
    pub(crate) anycase: bool,

    #[builder(default)]
    pub(crate) v1dollar: bool,

    #[builder(default)]
    pub(crate) pre_chomp: Chomp,

    #[builder(default)]
    pub(crate) post_chomp: Chomp,

    #[builder(default = "[%".to_string())]
    pub(crate) start_tag: String,

    #[builder(default = "%]".to_string())]
    pub(crate) end_tag: String,

    /// Predefined blocks, available to `INCLUDE`, `PROCESS` and `WRAPPER`.
    #[builder(default)]
    pub(crate) blocks: IndexMap<String, BlockSource>,

    /// Caller filters. These shadow built-in filters of the same name.
    #[builder(default)]
    pub(crate) filters: IndexMap<String, Filter>,

    /// Directories searched, in order, for external templates.
    #[builder(default = vec![PathBuf::from(".")])]
    pub(crate) include_path: Vec<PathBuf>,

    #[builder(default = Arc::new(FileSystemLoader) as Arc<dyn TemplateLoader>)]
    pub(crate) loader: Arc<dyn TemplateLoader>,

    /// Maximum nesting of block invocations.
    #[builder(default = 64)]
    pub(crate) max_depth: usize,

    /// Maximum iterations of a single `WHILE` loop.
    #[builder(default = 1000)]
    pub(crate) max_while: usize,

    /// Trace every grammar rule to the diagnostics sink.
    #[builder(default)]
    pub(crate) debug: bool,
}

impl Default for Template {
    fn default() -> Self {
        Template::builder().build()
    }
}

impl Template {
    pub fn new() -> Self {
        Self::default()
    }

    /// The lexer settings implied by this configuration.
    pub fn lexer_options(&self) -> LexerOptions {
        LexerOptions {
            start_tag: self.start_tag.clone(),
            end_tag: self.end_tag.clone(),
            pre_chomp: self.pre_chomp,
            post_chomp: self.post_chomp,
            interpolate: self.interpolate,
            anycase: self.anycase,
        }
    }

    /// Tokenize `source` without parsing it.
    ///
    /// # Errors
    ///
    /// Returns an error for an unterminated quoted string.
    pub fn tokenize(&self, source: &str) -> Result<Vec<Token>, ParseError> {
        lexer::tokenize(source, &self.lexer_options())
    }

    /// Tokenize and parse `source`.
    ///
    /// # Errors
    ///
    /// Returns the first syntax error.
    pub fn compile(&self, source: &str) -> Result<Document, ParseError> {
        self.compile_with(source, &TracingDiagnostics)
    }

    pub(crate) fn compile_with(&self, source: &str, diagnostics: &dyn Diagnostics) -> Result<Document, ParseError> {
        let tokens = self.tokenize(source)?;
        let options = ParseOptions {
            v1dollar: self.v1dollar,
            trace: self.debug,
        };
        parser::parse(&tokens, source, options, diagnostics)
    }

    /// Render `source` with `vars`, logging through `tracing`.
    ///
    /// The caller's data is never modified.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::Parse`] when the source or a predefined
    /// block does not parse, and [`TemplateError::Exception`] for an
    /// exception no `TRY` block caught.
    pub fn process(&self, source: &str, vars: &Vars) -> Result<String, TemplateError> {
        self.process_with(source, vars, &TracingDiagnostics)
    }

    /// Like [`process`](Self::process), reporting diagnostics to `diagnostics`.
    ///
    /// # Errors
    ///
    /// See [`process`](Self::process).
    pub fn process_with(
        &self,
        source: &str,
        vars: &Vars,
        diagnostics: &dyn Diagnostics,
    ) -> Result<String, TemplateError> {
        let document = self.compile_with(source, diagnostics)?;
        let mut ctx = Context::new(self, vars, diagnostics);
        for (name, block) in &self.blocks {
            let def = match block {
                BlockSource::Text(text) => BlockDef::Document(Rc::new(self.compile_with(text, diagnostics)?)),
                BlockSource::Native(f) => BlockDef::Native(Arc::clone(f)),
            };
            ctx.blocks.insert(name.clone(), def);
        }
        diagnostics.record(
            Level::Debug,
            &format!("rendering with {} predefined blocks", self.blocks.len()),
        );
        render_template(&document, &mut ctx)
    }
}

/// A predefined block: template text, or a Rust closure that reads the
/// stash and returns output.
#[derive(Clone)]
pub enum BlockSource {
    Text(String),
    Native(NativeBlock),
}

impl BlockSource {
    pub fn text(source: impl Into<String>) -> Self {
        BlockSource::Text(source.into())
    }

    pub fn native(f: impl Fn(&StashView<'_>) -> Result<String, Exception> + Send + Sync + 'static) -> Self {
        BlockSource::Native(Arc::new(f))
    }
}

impl From<&str> for BlockSource {
    fn from(source: &str) -> Self {
        BlockSource::text(source)
    }
}

impl From<String> for BlockSource {
    fn from(source: String) -> Self {
        BlockSource::Text(source)
    }
}

/// Render `source` with the default configuration.
///
/// # Example
///
/// ```
/// use ttk::{render, vars};
///
/// let out = render("Hello [% name %]!", &vars! { "name" => "World" }).unwrap();
/// assert_eq!(out, "Hello World!");
/// ```
///
/// # Errors
///
/// See [`Template::process`].
pub fn render(source: &str, vars: &Vars) -> Result<String, TemplateError> {
    Template::default().process(source, vars)
}
