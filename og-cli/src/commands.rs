//! Command execution against the persisted editor.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use og_core::{
    export_file_name, resolve_background, template_to_json, Editor, EditorError, ElementPatch,
    FileStorage, FontLoadOutcome, FontSource, Position, Size, TemplateId, TemplatePatch, Variable,
    VariablePatch,
};
use og_renderer::{ExportFormat, TemplateRasterizer};

use crate::error::CliError;
use crate::fonts::GoogleFontsLoader;
use crate::{
    Command, ElementCommand, ExportCommand, FontCommand, StudioConfig, TemplateCommand, VarCommand,
};

/// An editor session bound to a data directory.
pub struct Studio {
    config: StudioConfig,
    editor: Editor,
    loader: GoogleFontsLoader,
}

impl Studio {
    /// Open the editor state in `config.data_dir`, creating the directory if needed.
    ///
    /// Google fonts whose faces are already on disk are marked as loaded.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory cannot be opened or its state is corrupt.
    pub fn open(config: StudioConfig) -> Result<Self, CliError> {
        let storage = FileStorage::open(&config.data_dir)?;
        let mut editor = Editor::with_storage(Arc::new(storage))?;

        let mut loader = GoogleFontsLoader::new(config.fonts_dir())?;
        if let Some(ref base) = config.fonts_url {
            loader = loader.with_base_url(base.clone());
        }

        let cached: Vec<String> = editor
            .fonts()
            .pending_google()
            .filter(|font| loader.cached_faces(&font.family) > 0)
            .map(|font| font.family.clone())
            .collect();
        for family in cached {
            editor.set_font_loaded(&family, true);
        }

        tracing::debug!(
            "Opened studio at {} with {} templates",
            config.data_dir.display(),
            editor.templates().len()
        );
        Ok(Self {
            config,
            editor,
            loader,
        })
    }

    /// The underlying editor.
    #[must_use]
    pub fn editor(&self) -> &Editor {
        &self.editor
    }

    /// Run one command, writing human-readable results to `out`.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by the editor, the exporter or the font loader.
    pub async fn execute(
        &mut self,
        command: Command,
        out: &mut impl Write,
    ) -> Result<(), CliError> {
        match command {
            Command::Template(action) => self.template(action, out),
            Command::Element { template, action } => {
                self.editor.set_current_template(Some(template))?;
                self.element(action, out)
            }
            Command::Var { template, action } => {
                self.editor.set_current_template(Some(template))?;
                self.variable(action, out)
            }
            Command::Font(action) => self.font(action, out).await,
            Command::Grid {
                enabled,
                size,
                show,
            } => self.grid(enabled, size, show, out),
            Command::Lint { template } => self.lint(template, out),
            Command::Import { file } => {
                let json = std::fs::read_to_string(&file)?;
                let id = self.editor.import_template_json(&json)?;
                writeln!(out, "{id}")?;
                Ok(())
            }
            Command::Export(action) => self.export(action, out),
        }
    }

    fn template(&mut self, action: TemplateCommand, out: &mut impl Write) -> Result<(), CliError> {
        match action {
            TemplateCommand::New { name, description } => {
                let id = self.editor.create_template(name, description);
                writeln!(out, "{id}")?;
            }
            TemplateCommand::List => {
                for template in self.editor.templates() {
                    writeln!(
                        out,
                        "{}\t{}\t{} elements\t{} variables",
                        template.id,
                        template.name,
                        template.elements.len(),
                        template.variables.len()
                    )?;
                }
            }
            TemplateCommand::Show { id } => {
                let template = self
                    .editor
                    .template(id)
                    .ok_or(EditorError::TemplateNotFound(id))?;
                writeln!(out, "{}", template_to_json(template)?)?;
            }
            TemplateCommand::Delete { id } => {
                self.editor.delete_template(id)?;
                writeln!(out, "Deleted {id}")?;
            }
            TemplateCommand::Duplicate { id } => {
                let copy = self.editor.duplicate_template(id)?;
                writeln!(out, "{copy}")?;
            }
            TemplateCommand::Update {
                id,
                name,
                description,
                background,
            } => {
                let patch = TemplatePatch {
                    name,
                    description,
                    canvas_background: background.map(|b| resolve_background(&b).to_string()),
                };
                self.editor.update_template(id, &patch)?;
                writeln!(out, "Updated {id}")?;
            }
        }
        Ok(())
    }

    fn element(&mut self, action: ElementCommand, out: &mut impl Write) -> Result<(), CliError> {
        match action {
            ElementCommand::Add { kind } => {
                let id = self.editor.add_element(kind)?;
                writeln!(out, "{id}")?;
            }
            ElementCommand::List => {
                let template = self
                    .editor
                    .current_template()
                    .ok_or(EditorError::NoTemplateSelected)?;
                for element in &template.elements {
                    let mut flags = String::new();
                    if element.locked {
                        flags.push_str(" locked");
                    }
                    if !element.visible {
                        flags.push_str(" hidden");
                    }
                    writeln!(
                        out,
                        "{}\t{}\t({}, {})\t{}x{}{flags}",
                        element.id,
                        element.kind(),
                        element.position.x,
                        element.position.y,
                        element.size.width,
                        element.size.height
                    )?;
                }
            }
            ElementCommand::Delete { id } => {
                self.editor.delete_element(id)?;
                writeln!(out, "Deleted {id}")?;
            }
            ElementCommand::Duplicate { id } => {
                let copy = self.editor.duplicate_element(id)?;
                writeln!(out, "{copy}")?;
            }
            ElementCommand::Move { id, x, y } => {
                self.editor.move_element(id, Position::new(x, y))?;
                writeln!(out, "Moved {id}")?;
            }
            ElementCommand::Resize { id, width, height } => {
                self.editor.resize_element(id, Size::new(width, height))?;
                writeln!(out, "Resized {id}")?;
            }
            ElementCommand::Drag { id, dx, dy } => {
                let position = self.editor.drag_element(id, dx, dy)?;
                writeln!(out, "({}, {})", position.x, position.y)?;
            }
            ElementCommand::Reorder { id, direction } => {
                if self.editor.reorder_element(id, direction)? {
                    writeln!(out, "Moved {id} {direction}")?;
                } else {
                    writeln!(out, "{id} cannot move {direction}")?;
                }
            }
            ElementCommand::Update { id, patch } => {
                let patch: ElementPatch =
                    serde_json::from_str(&patch).map_err(CliError::InvalidPatch)?;
                self.editor.update_element(id, &patch)?;
                writeln!(out, "Updated {id}")?;
            }
        }
        Ok(())
    }

    fn variable(&mut self, action: VarCommand, out: &mut impl Write) -> Result<(), CliError> {
        match action {
            VarCommand::Add {
                key,
                label,
                default,
                description,
            } => {
                let mut variable = Variable::new(key.as_str(), default);
                if let Some(label) = label {
                    variable = variable.with_label(label);
                }
                variable.description = description;
                self.editor.add_variable(variable)?;
                writeln!(out, "Added {{{{{key}}}}}")?;
            }
            VarCommand::Remove { key } => {
                self.editor.remove_variable(&key)?;
                writeln!(out, "Removed {{{{{key}}}}}")?;
            }
            VarCommand::Update {
                key,
                label,
                default,
                description,
            } => {
                let patch = VariablePatch {
                    label,
                    default_value: default,
                    description,
                };
                self.editor.update_variable(&key, &patch)?;
                writeln!(out, "Updated {{{{{key}}}}}")?;
            }
        }
        Ok(())
    }

    async fn font(&mut self, action: FontCommand, out: &mut impl Write) -> Result<(), CliError> {
        match action {
            FontCommand::List => {
                for font in self.editor.fonts().fonts() {
                    let source = match font.source {
                        FontSource::Bundled => "bundled",
                        FontSource::Google => "google",
                    };
                    let weights = font
                        .weights
                        .iter()
                        .map(u16::to_string)
                        .collect::<Vec<_>>()
                        .join(",");
                    let state = if font.loaded { "loaded" } else { "pending" };
                    writeln!(out, "{}\t{source}\t{weights}\t{state}", font.family)?;
                }
            }
            FontCommand::Add { family, weights } => {
                match self
                    .editor
                    .load_google_font(&self.loader, &family, &weights)
                    .await
                {
                    Ok(FontLoadOutcome::Loaded(font)) => {
                        writeln!(out, "Loaded {} ({} faces)", font.family, font.faces)?;
                    }
                    Ok(FontLoadOutcome::AlreadyPresent) => {
                        writeln!(out, "{family} is already registered")?;
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            FontCommand::Reload => {
                let failures = self.editor.reload_pending_fonts(&self.loader).await;
                for (family, e) in &failures {
                    writeln!(out, "{family}: {e}")?;
                }
                if !failures.is_empty() {
                    return Err(CliError::FontsFailed(failures.len()));
                }
                writeln!(out, "All fonts loaded")?;
            }
        }
        Ok(())
    }

    fn grid(
        &mut self,
        enabled: Option<bool>,
        size: Option<u32>,
        show: Option<bool>,
        out: &mut impl Write,
    ) -> Result<(), CliError> {
        if let Some(enabled) = enabled {
            self.editor.set_grid_enabled(enabled);
        }
        if let Some(size) = size {
            self.editor.set_grid_size(size);
        }
        if let Some(show) = show {
            self.editor.set_show_grid(show);
        }
        let grid = self.editor.grid();
        writeln!(
            out,
            "enabled={} size={} show={}",
            grid.enabled,
            grid.size(),
            grid.show
        )?;
        Ok(())
    }

    fn lint(&mut self, only: Option<TemplateId>, out: &mut impl Write) -> Result<(), CliError> {
        let ids: Vec<TemplateId> = match only {
            Some(id) => vec![id],
            None => self.editor.templates().iter().map(|t| t.id).collect(),
        };
        let mut found = 0;
        for id in ids {
            self.editor.set_current_template(Some(id))?;
            for stale in self.editor.lint() {
                writeln!(out, "{id}\t{}\t{{{{{}}}}}", stale.element_id, stale.key)?;
                found += 1;
            }
        }
        if found == 0 {
            writeln!(out, "No stale placeholders")?;
        }
        Ok(())
    }

    fn export(&mut self, action: ExportCommand, out: &mut impl Write) -> Result<(), CliError> {
        let (id, path, format, vars) = match action {
            ExportCommand::Json { id, out: path } => {
                let template = self
                    .editor
                    .export_template(id)
                    .ok_or(EditorError::TemplateNotFound(id))?;
                let path = path.unwrap_or_else(|| default_path(&template.name, "json"));
                write_file(&path, template_to_json(template)?.as_bytes())?;
                writeln!(out, "{}", path.display())?;
                return Ok(());
            }
            ExportCommand::Png {
                id,
                out: path,
                vars,
            } => (id, path, ExportFormat::Png, vars),
            ExportCommand::Svg {
                id,
                out: path,
                vars,
            } => (id, path, ExportFormat::Svg, vars),
        };

        for (key, value) in vars {
            self.editor.set_variable_value(key, value);
        }
        let template = self
            .editor
            .export_template(id)
            .ok_or(EditorError::TemplateNotFound(id))?;
        let rasterizer = TemplateRasterizer::new(self.config.export_config());
        let bytes = rasterizer.export(template, &self.editor.variable_scope(template), format)?;

        let path = path.unwrap_or_else(|| default_path(&template.name, format.extension()));
        write_file(&path, &bytes)?;
        tracing::info!(
            "Exported {} ({} bytes) to {}",
            template.name,
            bytes.len(),
            path.display()
        );
        writeln!(out, "{}", path.display())?;
        Ok(())
    }
}

fn default_path(template_name: &str, extension: &str) -> PathBuf {
    PathBuf::from(export_file_name(template_name, extension))
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<(), CliError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, bytes)?;
    Ok(())
}
