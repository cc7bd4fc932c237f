//! Sections the content was cut into; edit, prune, then generate materials.

use crossterm::event::KeyCode;

use super::{
    clamp_selection, move_selection, require_session, Command, Effect, Notification, Outcome,
    ScreenState,
};
use crate::api::Chunk;
use crate::routes::Route;
use crate::ui::dialogs::{ConfirmDialog, ConfirmSelection};
use crate::ui::form_field::{Form, FormField, NamedField};
use crate::ui::keybindings::ShortcutContext;

pub struct ChunksScreen {
    pub course_id: String,
    pub chunks: Vec<Chunk>,
    pub selected: usize,
    pub loading: bool,
    /// Edit dialog for the chunk with this id
    pub editor: Option<(String, Form)>,
    pub saving: bool,
    pub confirm: ConfirmDialog,
    pending_delete: Option<String>,
    /// Tests and lessons are being generated
    pub generating: bool,
}

impl ChunksScreen {
    pub fn new(course_id: &str) -> Self {
        Self {
            course_id: course_id.to_string(),
            chunks: Vec::new(),
            selected: 0,
            loading: false,
            editor: None,
            saving: false,
            confirm: ConfirmDialog::new(),
            pending_delete: None,
            generating: false,
        }
    }

    pub fn selected_chunk(&self) -> Option<&Chunk> {
        self.chunks.get(self.selected)
    }

    fn open_editor(&mut self) {
        if let Some(chunk) = self.selected_chunk() {
            let form = Form::new(vec![
                NamedField::new(
                    "chunk_title",
                    "Title",
                    FormField::text_input(&chunk.chunk_title, "Section title"),
                )
                .required(),
                NamedField::new(
                    "chunk_content",
                    "Content",
                    FormField::text_area(&chunk.chunk_content, "Section text"),
                ),
            ]);
            self.editor = Some((chunk.chunk_id.clone(), form));
        }
    }

    fn handle_editor_key(&mut self, key: KeyCode) -> Vec<Effect> {
        let Some((chunk_id, form)) = self.editor.as_mut() else {
            return Vec::new();
        };
        match key {
            KeyCode::Esc => {
                self.editor = None;
                Vec::new()
            }
            KeyCode::F(2) => {
                if self.saving {
                    return Vec::new();
                }
                let Some(original) = self.chunks.iter().find(|c| c.chunk_id == *chunk_id) else {
                    self.editor = None;
                    return Vec::new();
                };
                let updated = Chunk {
                    chunk_title: form.value("chunk_title"),
                    chunk_content: form.value("chunk_content"),
                    ..original.clone()
                };
                self.saving = true;
                vec![Effect::Run(Command::UpdateChunk(updated))]
            }
            _ => {
                form.handle_key(key);
                Vec::new()
            }
        }
    }

    fn finish(&mut self) -> Vec<Effect> {
        if self.generating {
            return Vec::new();
        }
        if self.chunks.is_empty() {
            return vec![Effect::Notify(Notification::error(
                "There are no chunks to generate from",
            ))];
        }
        self.generating = true;
        vec![
            Effect::Notify(Notification::info("Generating tests and lessons...")),
            Effect::Run(Command::GenerateMaterials(self.course_id.clone())),
        ]
    }
}

impl ScreenState for ChunksScreen {
    fn handle_key(&mut self, key: KeyCode) -> Vec<Effect> {
        if self.confirm.visible {
            let choice = self.confirm.handle_key(key);
            let pending = if choice.is_some() {
                self.pending_delete.take()
            } else {
                None
            };
            return match (choice, pending) {
                (Some(ConfirmSelection::Yes), Some(chunk_id)) => {
                    vec![Effect::Run(Command::DeleteChunk(chunk_id))]
                }
                _ => Vec::new(),
            };
        }
        if self.editor.is_some() {
            return self.handle_editor_key(key);
        }
        if move_selection(&mut self.selected, self.chunks.len(), key) {
            return Vec::new();
        }
        match key {
            KeyCode::Char('e') | KeyCode::Enter => {
                self.open_editor();
                Vec::new()
            }
            KeyCode::Char('d') => {
                if let Some(chunk) = self.selected_chunk() {
                    let message = format!("Delete \"{}\"?", chunk.chunk_title);
                    self.pending_delete = Some(chunk.chunk_id.clone());
                    self.confirm.show("Delete chunk", message);
                }
                Vec::new()
            }
            KeyCode::Char('f') | KeyCode::F(2) => self.finish(),
            _ => Vec::new(),
        }
    }

    fn apply(&mut self, outcome: Outcome) -> Vec<Effect> {
        match outcome {
            Outcome::Session(snapshot) => {
                let route = Route::Chunks(self.course_id.clone());
                require_session(&snapshot, &route, || {
                    self.loading = true;
                    vec![Effect::Run(Command::LoadChunks(self.course_id.clone()))]
                })
            }
            Outcome::ChunksLoaded(result) => {
                self.loading = false;
                match result {
                    Ok(chunks) => {
                        self.chunks = chunks;
                        self.selected = clamp_selection(self.selected, self.chunks.len());
                        Vec::new()
                    }
                    Err(e) => vec![Effect::Notify(Notification::failed(
                        "Could not load chunks",
                        &e,
                    ))],
                }
            }
            Outcome::ChunkUpdated(result) => {
                self.saving = false;
                match result {
                    Ok(chunk) => {
                        if let Some(slot) =
                            self.chunks.iter_mut().find(|c| c.chunk_id == chunk.chunk_id)
                        {
                            *slot = chunk;
                        }
                        self.editor = None;
                        vec![Effect::Notify(Notification::success("Chunk saved"))]
                    }
                    Err(e) => vec![Effect::Notify(Notification::failed(
                        "Could not save chunk",
                        &e,
                    ))],
                }
            }
            Outcome::ChunkDeleted { chunk_id, result } => match result {
                Ok(()) => {
                    self.chunks.retain(|c| c.chunk_id != chunk_id);
                    self.selected = clamp_selection(self.selected, self.chunks.len());
                    vec![Effect::Notify(Notification::success("Chunk deleted"))]
                }
                Err(e) => vec![Effect::Notify(Notification::failed(
                    "Could not delete chunk",
                    &e,
                ))],
            },
            Outcome::MaterialsGenerated(result) => {
                self.generating = false;
                match result {
                    Ok(()) => vec![Effect::navigate(Route::Chat(self.course_id.clone()))],
                    Err(e) => vec![Effect::Notify(Notification::failed(
                        "Could not generate tests and lessons",
                        &e,
                    ))],
                }
            }
            _ => Vec::new(),
        }
    }

    fn is_capturing(&self) -> bool {
        self.editor.is_some() || self.confirm.visible
    }

    fn shortcut_context(&self) -> ShortcutContext {
        if self.editor.is_some() {
            ShortcutContext::Editor
        } else {
            ShortcutContext::List
        }
    }
}
