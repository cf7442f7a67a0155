//! Runtime state for one render call.

use std::mem;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::Template;
use crate::diagnostics::{Diagnostics, Level};
use crate::interpreter::error::not_found;
use crate::interpreter::filters::{FilterFn, FilterRegistry};
use crate::interpreter::loader::LoadError;
use crate::interpreter::stash::{Stash, StashView};
use crate::parser::Document;
use crate::types::{Exception, Vars};

/// A block implemented in Rust.
pub type NativeBlock = Arc<dyn Fn(&StashView<'_>) -> Result<String, Exception> + Send + Sync>;

/// A block ready to run.
#[derive(Clone)]
pub(crate) enum BlockDef {
    Document(Rc<Document>),
    Native(NativeBlock),
}

/// State saved around an `INCLUDE` so the included block cannot change
/// the caller's variables, blocks or filter aliases.
pub(crate) struct Saved {
    stash: Stash,
    blocks: IndexMap<String, BlockDef>,
    aliases: IndexMap<String, Rc<FilterFn>>,
}

/// Everything a render needs besides the AST: the stash, the block table,
/// the filters and the recursion depth. Created per render call.
pub(crate) struct Context<'t> {
    pub(crate) config: &'t Template,
    pub(crate) stash: Stash,
    pub(crate) blocks: IndexMap<String, BlockDef>,
    pub(crate) filters: FilterRegistry<'t>,
    pub(crate) diagnostics: &'t dyn Diagnostics,
    depth: usize,
}

impl<'t> Context<'t> {
    pub(crate) fn new(config: &'t Template, vars: &Vars, diagnostics: &'t dyn Diagnostics) -> Self {
        Context {
            config,
            stash: Stash::new(vars),
            blocks: IndexMap::new(),
            filters: FilterRegistry::new(&config.filters),
            diagnostics,
            depth: 0,
        }
    }

    pub(crate) fn log(&self, level: Level, message: &str) {
        self.diagnostics.record(level, message);
    }

    /// Make the BLOCKs defined in `document` available by name.
    pub(crate) fn register(&mut self, document: &Document) {
        for (name, block) in &document.blocks {
            self.blocks
                .insert(name.clone(), BlockDef::Document(Rc::clone(block)));
        }
    }

    /// Enter a block invocation, enforcing the recursion limit.
    pub(crate) fn enter(&mut self, name: &str) -> Result<(), Exception> {
        if self.depth >= self.config.max_depth {
            return Err(Exception::new(
                "recursion",
                format!(
                    "{name}: maximum recursion depth of {} exceeded",
                    self.config.max_depth
                ),
            ));
        }
        self.depth += 1;
        Ok(())
    }

    pub(crate) fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Switch to a deep copy of the current state.
    pub(crate) fn isolate(&mut self) -> Saved {
        let stash = self.stash.isolated();
        Saved {
            stash: mem::replace(&mut self.stash, stash),
            blocks: self.blocks.clone(),
            aliases: self.filters.aliases(),
        }
    }

    pub(crate) fn restore(&mut self, saved: Saved) {
        self.stash = saved.stash;
        self.blocks = saved.blocks;
        self.filters.restore_aliases(saved.aliases);
    }

    /// Look up a block by name, loading and compiling a template file of
    /// that name when no block is defined. Loaded files are cached for the
    /// rest of the render.
    pub(crate) fn find_block(&mut self, name: &str) -> Result<BlockDef, Exception> {
        if let Some(block) = self.blocks.get(name) {
            return Ok(block.clone());
        }
        let text = self.load_text(name)?;
        let document = self
            .config
            .compile_with(&text, self.diagnostics)
            .map_err(|e| Exception::new("parse", format!("{name}: {e}")))?;
        let block = BlockDef::Document(Rc::new(document));
        self.blocks.insert(name.to_string(), block.clone());
        Ok(block)
    }

    /// Read a template file through the loader, trying each include
    /// directory in order.
    pub(crate) fn load_text(&self, name: &str) -> Result<String, Exception> {
        let path = Path::new(name);
        let candidates: Vec<PathBuf> = if path.is_absolute() {
            vec![path.to_path_buf()]
        } else {
            self.config
                .include_path
                .iter()
                .map(|dir| dir.join(path))
                .collect()
        };

        for candidate in candidates {
            match self.config.loader.load(&candidate) {
                Ok(text) => {
                    self.log(Level::Debug, &format!("loaded '{}'", candidate.display()));
                    return Ok(text);
                }
                Err(LoadError::NotFound { .. }) => {}
                Err(e @ LoadError::Io { .. }) => return Err(Exception::new("file", e.to_string())),
            }
        }
        self.log(Level::Warn, &format!("template '{name}' not found"));
        Err(not_found(
            "file.not_found",
            name,
            self.blocks.keys().map(String::as_str),
        ))
    }
}
