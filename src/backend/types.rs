use serde::Deserialize;

/// One of the three pipeline stages the backend can run on request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunAction {
    Full,
    Clean,
    Convert,
}

impl RunAction {
    /// Outbound Socket.IO event that starts this stage.
    pub fn event_name(self) -> &'static str {
        match self {
            RunAction::Full => "run_full",
            RunAction::Clean => "run_clean",
            RunAction::Convert => "run_convert",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RunAction::Full => "Pipeline completo",
            RunAction::Clean => "Limpieza",
            RunAction::Convert => "Conversión",
        }
    }

    /// Text on the stage's trigger button while idle.
    pub fn button_label(self) -> &'static str {
        match self {
            RunAction::Full => "Pipeline completo",
            RunAction::Clean => "Solo limpieza",
            RunAction::Convert => "Solo conversión",
        }
    }

    /// The backend reports the full pipeline as "all" in event payloads.
    pub fn from_backend(action: &str) -> Option<Self> {
        match action {
            "all" | "full" => Some(RunAction::Full),
            "clean" => Some(RunAction::Clean),
            "convert" => Some(RunAction::Convert),
            _ => None,
        }
    }
}

/// GET /api/last-execution
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LastExecutionResponse {
    #[serde(default)]
    pub file_exists: bool,
    pub last_execution_date: Option<String>,
}

/// GET /api/sources
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct SourcesResponse {
    pub training_path: Option<String>,
    pub dolar_path: Option<String>,
}

/// POST /api/upload-source. Business errors come back as `error` with a 400.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct UploadResponse {
    pub error: Option<String>,
    pub message: Option<String>,
    pub saved: Option<SavedPaths>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct SavedPaths {
    pub training: Option<String>,
    pub dolar: Option<String>,
}

/// Inbound `status` event payload.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct StatusEvent {
    pub message: String,
    pub action: Option<String>,
}

/// Inbound `pipeline_finished` event payload.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct FinishedEvent {
    pub last_execution_date: Option<String>,
    pub action: Option<String>,
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names() {
        assert_eq!(RunAction::Full.event_name(), "run_full");
        assert_eq!(RunAction::Clean.event_name(), "run_clean");
        assert_eq!(RunAction::Convert.event_name(), "run_convert");
    }

    #[test]
    fn test_backend_action_names() {
        assert_eq!(RunAction::from_backend("all"), Some(RunAction::Full));
        assert_eq!(RunAction::from_backend("clean"), Some(RunAction::Clean));
        assert_eq!(RunAction::from_backend("bogus"), None);
    }

    #[test]
    fn test_finished_event_null_date() {
        let ev: FinishedEvent = serde_json::from_str(
            r#"{"message":"Proceso all completado.","last_execution_date":null,"action":"all"}"#,
        )
        .unwrap();
        assert_eq!(ev.last_execution_date, None);
        assert_eq!(ev.action.as_deref(), Some("all"));
    }

    #[test]
    fn test_sources_ignores_unknown_fields() {
        let s: SourcesResponse = serde_json::from_str(
            r#"{"training_path":"/u/entrenamiento.csv","dolar_path":null,"defaults":true}"#,
        )
        .unwrap();
        assert_eq!(s.training_path.as_deref(), Some("/u/entrenamiento.csv"));
        assert_eq!(s.dolar_path, None);
    }
}
