use crate::backend::rest::UploadRequest;
use crate::backend::types::{
    FinishedEvent, LastExecutionResponse, RunAction, SourcesResponse, StatusEvent, UploadResponse,
};
use crate::engine::{progress, translate};
use std::path::PathBuf;

pub const MSG_SELECT_FILE: &str = "Selecciona al menos un archivo para cargar.";
pub const MSG_UPLOADING: &str = "Cargando archivos...";
pub const MSG_UPLOAD_OK: &str = "Fuentes guardadas. Ejecuta la etapa que necesites.";
pub const MSG_UPLOAD_RETRY: &str = "No se pudo cargar. Reintenta.";
pub const MSG_SOURCES_ERROR: &str = "No se pudieron leer las fuentes configuradas.";
pub const MSG_RUN_FINISHED: &str = "Proceso finalizado. Archivo actualizado y listo para el negocio.";

/// When the cleaned output file was last written, as far as the panel knows.
#[derive(Debug, Clone, PartialEq)]
pub enum LastExecution {
    Loading,
    At(String),
    NeverRun,
    Unreachable,
}

impl LastExecution {
    pub fn display(&self) -> &str {
        match self {
            LastExecution::Loading => "Cargando...",
            LastExecution::At(date) => date.as_str(),
            LastExecution::NeverRun => "No se ha ejecutado aún",
            LastExecution::Unreachable => "Error al contactar al servidor",
        }
    }
}

/// Source paths the backend reports as configured.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceConfig {
    pub training_path: Option<String>,
    pub dolar_path: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceSlot {
    Training,
    Dolar,
}

impl SourceSlot {
    pub fn label(self) -> &'static str {
        match self {
            SourceSlot::Training => "CSV de propiedades (entrenamiento)",
            SourceSlot::Dolar => "CSV de dólar",
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogLine {
    pub time: String,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct PanelState {
    pub last_execution: LastExecution,
    pub sources: SourceConfig,
    pub sources_status: Option<String>,
    pub status_log: Vec<LogLine>,
    pub is_running: bool,
    pub current_action: Option<RunAction>,
    pub progress: u8,
    pub training_file: Option<PathBuf>,
    pub dolar_file: Option<PathBuf>,
    pub upload_status: String,
    pub uploading: bool,
    pub channel_connected: bool,
}

impl Default for PanelState {
    fn default() -> Self {
        Self::new()
    }
}

impl PanelState {
    pub fn new() -> Self {
        Self {
            last_execution: LastExecution::Loading,
            sources: SourceConfig::default(),
            sources_status: None,
            status_log: Vec::with_capacity(64),
            is_running: false,
            current_action: None,
            progress: 0,
            training_file: None,
            dolar_file: None,
            upload_status: String::new(),
            uploading: false,
            channel_connected: false,
        }
    }

    fn push_log(&mut self, text: String) {
        let time = chrono::Local::now().format("%H:%M:%S").to_string();
        self.status_log.push(LogLine { time, text });
    }

    pub fn messages(&self) -> impl Iterator<Item = &str> {
        self.status_log.iter().map(|l| l.text.as_str())
    }

    pub fn apply_last_execution(&mut self, result: anyhow::Result<LastExecutionResponse>) {
        self.last_execution = match result {
            Ok(resp) if resp.file_exists => match resp.last_execution_date {
                Some(date) => LastExecution::At(date),
                None => LastExecution::NeverRun,
            },
            Ok(_) => LastExecution::NeverRun,
            Err(e) => {
                tracing::warn!("last execution fetch failed: {:#}", e);
                LastExecution::Unreachable
            }
        };
    }

    pub fn apply_sources(&mut self, result: anyhow::Result<SourcesResponse>) {
        match result {
            Ok(resp) => {
                self.sources = SourceConfig {
                    training_path: resp.training_path,
                    dolar_path: resp.dolar_path,
                };
                self.sources_status = None;
            }
            Err(e) => {
                tracing::warn!("sources fetch failed: {:#}", e);
                self.sources = SourceConfig::default();
                self.sources_status = Some(MSG_SOURCES_ERROR.to_string());
            }
        }
    }

    /// Enter `running(action)` unless a run is already in progress.
    /// Returns the action to emit, or `None` for a no-op.
    pub fn start_run(&mut self, action: RunAction) -> Option<RunAction> {
        if self.is_running {
            return None;
        }
        self.current_action = Some(action);
        self.status_log.clear();
        self.push_log(format!(
            "Preparando ejecución de {}.",
            action.label().to_lowercase()
        ));
        self.is_running = true;
        self.progress = progress::RUN_START;
        Some(action)
    }

    pub fn on_status(&mut self, event: &StatusEvent) {
        let friendly = translate::business_message(&event.message).into_owned();
        self.push_log(friendly);
        if self.is_running {
            self.progress = progress::advance(self.progress);
        }
    }

    /// Terminal event: the only way out of `running`.
    pub fn on_finished(&mut self, event: &FinishedEvent) {
        if let Some(ref date) = event.last_execution_date {
            self.last_execution = LastExecution::At(date.clone());
        }
        self.is_running = false;
        self.current_action = None;
        self.progress = progress::COMPLETE;
        self.push_log(MSG_RUN_FINISHED.to_string());
    }

    pub fn select_file(&mut self, slot: SourceSlot, path: Option<PathBuf>) {
        match slot {
            SourceSlot::Training => self.training_file = path,
            SourceSlot::Dolar => self.dolar_file = path,
        }
    }

    pub fn selected_file(&self, slot: SourceSlot) -> Option<&PathBuf> {
        match slot {
            SourceSlot::Training => self.training_file.as_ref(),
            SourceSlot::Dolar => self.dolar_file.as_ref(),
        }
    }

    pub fn configured_path(&self, slot: SourceSlot) -> Option<&str> {
        match slot {
            SourceSlot::Training => self.sources.training_path.as_deref(),
            SourceSlot::Dolar => self.sources.dolar_path.as_deref(),
        }
    }

    /// Validate the selection and mark the upload in flight.
    /// `None` means no request should be sent.
    pub fn begin_upload(&mut self) -> Option<UploadRequest> {
        if self.uploading {
            return None;
        }
        if self.training_file.is_none() && self.dolar_file.is_none() {
            self.upload_status = MSG_SELECT_FILE.to_string();
            return None;
        }
        self.uploading = true;
        self.upload_status = MSG_UPLOADING.to_string();
        Some(UploadRequest {
            training: self.training_file.clone(),
            dolar: self.dolar_file.clone(),
        })
    }

    pub fn finish_upload(&mut self, result: anyhow::Result<UploadResponse>) {
        match result {
            Ok(UploadResponse { error: Some(error), .. }) => {
                tracing::warn!(%error, "upload rejected by server");
                self.upload_status = error;
            }
            Ok(resp) => {
                if let Some(saved) = resp.saved {
                    if saved.training.is_some() {
                        self.sources.training_path = saved.training;
                    }
                    if saved.dolar.is_some() {
                        self.sources.dolar_path = saved.dolar;
                    }
                }
                tracing::info!(
                    message = resp.message.as_deref().unwrap_or_default(),
                    "sources uploaded"
                );
                self.upload_status = MSG_UPLOAD_OK.to_string();
            }
            Err(e) => {
                tracing::error!("upload failed: {:#}", e);
                self.upload_status = MSG_UPLOAD_RETRY.to_string();
            }
        }
        self.uploading = false;
    }

    pub fn progress_label(&self) -> String {
        if self.is_running {
            let action = self.current_action.unwrap_or(RunAction::Full);
            format!("Ejecutando {}", action.label())
        } else if self.progress == progress::COMPLETE {
            "Datos listos y actualizados".to_string()
        } else {
            "Listo para ejecutar el pipeline".to_string()
        }
    }

    pub fn progress_hint(&self) -> &'static str {
        if self.is_running {
            "Puedes seguir trabajando: te avisaremos cuando esté listo."
        } else {
            "Elige qué etapa ejecutar según lo que necesites actualizar."
        }
    }

    pub fn run_button_label(&self, action: RunAction) -> &'static str {
        if self.is_running && self.current_action == Some(action) {
            "Procesando..."
        } else {
            action.button_label()
        }
    }

    pub fn upload_button_label(&self) -> &'static str {
        if self.uploading {
            "Cargando..."
        } else {
            "Guardar fuentes"
        }
    }
}
