//! HTTP API server implementation

use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::Html,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use utoipa::{OpenApi, ToSchema};

use crate::core::catalog::{ExampleInput, LanguageOption};
use crate::core::client::Translator;
use crate::core::errors::ErrorKind;
use crate::core::models::{
    BackendKind, LanguagePair, TranslationRequest, Variant, MAX_TEMPERATURE, MIN_TEMPERATURE,
};

const INDEX_HTML: &str = include_str!("../../assets/index.html");

/// Pending translations, one per browser session
#[derive(Debug, Clone, Default)]
pub struct SessionSlots {
    pending: Arc<Mutex<HashMap<String, CancellationToken>>>,
}

/// Holds a session's slot until the translation finishes or is dropped
#[derive(Debug)]
pub struct SlotGuard {
    slots: SessionSlots,
    session_id: String,
    token: CancellationToken,
}

impl SlotGuard {
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        self.slots.lock().remove(&self.session_id);
    }
}

impl SessionSlots {
    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, CancellationToken>> {
        self.pending.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Claim the slot for `session_id`; `None` while another call is pending
    pub fn try_acquire(&self, session_id: &str) -> Option<SlotGuard> {
        let mut pending = self.lock();
        if pending.contains_key(session_id) {
            return None;
        }
        let token = CancellationToken::new();
        pending.insert(session_id.to_string(), token.clone());
        Some(SlotGuard {
            slots: self.clone(),
            session_id: session_id.to_string(),
            token,
        })
    }

    /// Cancel the pending call for `session_id`, if any
    pub fn cancel(&self, session_id: &str) -> bool {
        match self.lock().get(session_id) {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    pub fn is_pending(&self, session_id: &str) -> bool {
        self.lock().contains_key(session_id)
    }
}

/// Application state
#[derive(Clone)]
pub struct AppState {
    translator: Arc<Translator>,
    sessions: SessionSlots,
}

impl AppState {
    pub fn new(translator: Translator) -> Self {
        Self {
            translator: Arc::new(translator),
            sessions: SessionSlots::default(),
        }
    }
}

/// Health check response
#[derive(Serialize, ToSchema)]
struct HealthResponse {
    status: String,
    service: String,
    version: String,
    variant: Variant,
}

#[derive(Serialize, ToSchema)]
struct ModelInfo {
    name: String,
    backend: BackendKind,
    model: String,
    supports_sampling: bool,
}

#[derive(Serialize, ToSchema)]
struct TemperatureRange {
    min: f32,
    max: f32,
    step: f32,
    default: f32,
}

/// Everything the form needs to build its controls
#[derive(Serialize, ToSchema)]
struct OptionsResponse {
    variant: Variant,
    title: String,
    languages: Vec<LanguageOption>,
    domains: Vec<String>,
    default_pair: LanguagePair,
    default_domain: Option<String>,
    model_selectable: bool,
    models: Vec<ModelInfo>,
    default_model: Option<String>,
    temperature: Option<TemperatureRange>,
    examples: Vec<ExampleInput>,
}

/// Translation form submission
#[derive(Debug, Deserialize, ToSchema)]
pub struct TranslateBody {
    /// Browser session; at most one pending translation per session
    #[serde(default)]
    pub session_id: Option<String>,
    pub text: String,
    pub source_language: String,
    pub target_language: String,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub temperature: Option<f32>,
}

/// Text for the result box
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TranslateReply {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub completed_at: String,
}

#[derive(Serialize, ToSchema)]
struct ClearResponse {
    source_text: String,
    result: String,
    status: String,
}

#[derive(Deserialize, ToSchema)]
pub struct CancelBody {
    pub session_id: String,
}

#[derive(Serialize, ToSchema)]
struct CancelResponse {
    cancelled: bool,
}

/// Error response
#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize, ToSchema)]
pub struct ErrorDetail {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

#[derive(OpenApi)]
#[openapi(
    paths(health_check, get_options, translate, swap_languages, clear_form, cancel_translation),
    components(schemas(
        HealthResponse,
        ModelInfo,
        TemperatureRange,
        OptionsResponse,
        TranslateBody,
        TranslateReply,
        ClearResponse,
        CancelBody,
        CancelResponse,
        ErrorResponse,
        ErrorDetail,
        LanguagePair,
        LanguageOption,
        ExampleInput,
        ErrorKind,
        Variant,
        BackendKind
    ))
)]
struct ApiDoc;

/// Form page
async fn index(State(state): State<Arc<AppState>>) -> Html<String> {
    Html(INDEX_HTML.replace("{{title}}", state.translator.variant().title()))
}

/// Health check handler
#[utoipa::path(get, path = "/health", responses((status = 200, description = "Service is up", body = HealthResponse)))]
async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        variant: state.translator.variant(),
    })
}

/// Selector contents for the running variant
#[utoipa::path(get, path = "/api/options", responses((status = 200, description = "Selector contents", body = OptionsResponse)))]
async fn get_options(State(state): State<Arc<AppState>>) -> Json<OptionsResponse> {
    let translator = &state.translator;
    let variant = translator.variant();
    let catalog = translator.catalog();

    let models = translator
        .registry()
        .iter()
        .map(|m| ModelInfo {
            name: m.display_name.clone(),
            backend: m.backend.kind(),
            model: m.backend.model().to_string(),
            supports_sampling: m.capabilities.supports_sampling,
        })
        .collect();

    let temperature = variant.adjustable_temperature().then(|| TemperatureRange {
        min: MIN_TEMPERATURE,
        max: MAX_TEMPERATURE,
        step: 0.1,
        default: translator.default_temperature(),
    });

    Json(OptionsResponse {
        variant,
        title: variant.title().to_string(),
        languages: catalog.languages.clone(),
        domains: catalog.domains.clone(),
        default_pair: catalog.default_pair.clone(),
        default_domain: catalog.default_domain.clone(),
        model_selectable: variant.selectable_model(),
        models,
        default_model: translator.default_model().map(str::to_string),
        temperature,
        examples: catalog.examples.clone(),
    })
}

/// Build the request the variant allows from a form submission
fn request_from_body(translator: &Translator, body: TranslateBody) -> TranslationRequest {
    let variant = translator.variant();
    let default_model = translator.default_model().unwrap_or_default().to_string();

    let model = if variant.selectable_model() {
        body.model.filter(|m| !m.is_empty()).unwrap_or(default_model)
    } else {
        default_model
    };

    let mut request = TranslationRequest::new(body.text, body.source_language, body.target_language, model);
    if variant.adjustable_temperature() {
        request.temperature = Some(body.temperature.unwrap_or(translator.default_temperature()));
    }
    if variant.uses_domain() {
        request.domain = body
            .domain
            .filter(|d| !d.is_empty())
            .or_else(|| translator.catalog().default_domain.clone());
    }
    request
}

/// Translate one submission
#[utoipa::path(
    post,
    path = "/api/translate",
    request_body = TranslateBody,
    responses(
        (status = 200, description = "Translation or a displayable error", body = TranslateReply),
        (status = 409, description = "A translation is already pending for this session", body = ErrorResponse)
    )
)]
async fn translate(
    State(state): State<Arc<AppState>>,
    Json(body): Json<TranslateBody>,
) -> Result<Json<TranslateReply>, (StatusCode, Json<ErrorResponse>)> {
    let session_id = body.session_id.clone();
    let guard = match session_id.as_deref() {
        Some(id) => match state.sessions.try_acquire(id) {
            Some(guard) => Some(guard),
            None => {
                debug!("Rejecting overlapping submission for session {}", id);
                return Err((
                    StatusCode::CONFLICT,
                    Json(ErrorResponse {
                        error: ErrorDetail {
                            message: "翻譯進行中，請稍候或先取消。".to_string(),
                            code: Some("translation_pending".to_string()),
                        },
                    }),
                ));
            }
        },
        None => None,
    };

    let request = request_from_body(&state.translator, body);
    let token = guard
        .as_ref()
        .map(|g| g.token().clone())
        .unwrap_or_else(CancellationToken::new);

    let result = state.translator.translate_with_cancel(&request, &token).await;
    drop(guard);

    Ok(Json(TranslateReply {
        text: result.text,
        error: result.error,
        model: result.model,
        completed_at: chrono::Utc::now().to_rfc3339(),
    }))
}

/// Exchange source and target language
#[utoipa::path(post, path = "/api/swap", request_body = LanguagePair, responses((status = 200, description = "Swapped pair", body = LanguagePair)))]
async fn swap_languages(Json(pair): Json<LanguagePair>) -> Json<LanguagePair> {
    Json(pair.swap())
}

/// Empty the input and result boxes
#[utoipa::path(post, path = "/api/clear", responses((status = 200, description = "Empty form", body = ClearResponse)))]
async fn clear_form() -> Json<ClearResponse> {
    Json(ClearResponse {
        source_text: String::new(),
        result: String::new(),
        status: "已清除，請輸入新文本".to_string(),
    })
}

/// Cancel a session's pending translation
#[utoipa::path(post, path = "/api/cancel", request_body = CancelBody, responses((status = 200, description = "Whether a pending call was cancelled", body = CancelResponse)))]
async fn cancel_translation(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CancelBody>,
) -> Json<CancelResponse> {
    let cancelled = state.sessions.cancel(&body.session_id);
    if cancelled {
        info!("Cancelled translation for session {}", body.session_id);
    }
    Json(CancelResponse { cancelled })
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Build the router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health_check))
        .route("/api/options", get(get_options))
        .route("/api/translate", post(translate))
        .route("/api/swap", post(swap_languages))
        .route("/api/clear", post(clear_form))
        .route("/api/cancel", post(cancel_translation))
        .route("/api-docs/openapi.json", get(openapi_json))
        .with_state(Arc::new(state))
}

/// Run the HTTP server
pub async fn run_server(translator: Translator, host: String, port: u16) -> anyhow::Result<()> {
    let variant = translator.variant();
    let app = router(AppState::new(translator));

    // Bind address
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;

    info!("Starting {} translator on {}", variant, addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
