#[derive(Debug, Serialize)]
struct EventResponse {
    schema_version: String,
    outcomes: Vec<CommandOutcome>,
}

#[derive(Debug, Serialize)]
struct TurnOrderResponse {
    schema_version: String,
    open: bool,
    entries: Vec<TurnEntry>,
}

#[derive(Debug, Serialize)]
struct ChatLogResponse {
    schema_version: String,
    lines: Vec<ChatLogLine>,
}

#[derive(Debug, Serialize)]
struct ChatLogLine {
    speaker: String,
    message: String,
}

#[derive(Debug, Deserialize)]
struct UpsertCharacterRequest {
    character: CharacterRecord,
    #[serde(default)]
    attributes: Vec<(String, i64)>,
}

#[derive(Debug, Deserialize)]
struct SetPageRequest {
    page_id: String,
}

#[derive(Debug, Serialize)]
struct AckResponse {
    schema_version: String,
    ok: bool,
}

fn ack() -> AckResponse {
    AckResponse {
        schema_version: SCHEMA_VERSION_V1.to_string(),
        ok: true,
    }
}

async fn submit_event(
    State(state): State<AppState>,
    Json(event): Json<PlatformEvent>,
) -> Result<Json<EventResponse>, HttpApiError> {
    let mut api = state.inner.lock().await;
    let outcomes = api
        .handle_event(event)
        .map_err(HttpApiError::from_persistence)?;
    Ok(Json(EventResponse {
        schema_version: SCHEMA_VERSION_V1.to_string(),
        outcomes,
    }))
}

async fn submit_command(
    State(state): State<AppState>,
    Json(payload): Json<CommandPayload>,
) -> Result<Json<CommandOutcome>, HttpApiError> {
    let mut api = state.inner.lock().await;
    let outcome = api
        .apply_command(payload)
        .map_err(HttpApiError::from_persistence)?;
    Ok(Json(outcome))
}

async fn get_turn_order(
    State(state): State<AppState>,
) -> Result<Json<TurnOrderResponse>, HttpApiError> {
    let api = state.inner.lock().await;
    let entries = api.turn_order();
    Ok(Json(TurnOrderResponse {
        schema_version: SCHEMA_VERSION_V1.to_string(),
        open: entries.is_some(),
        entries: entries.unwrap_or_default(),
    }))
}

async fn get_settings(State(state): State<AppState>) -> Result<Json<Settings>, HttpApiError> {
    let api = state.inner.lock().await;
    Ok(Json(api.settings().clone()))
}

async fn get_chat_log(
    State(state): State<AppState>,
) -> Result<Json<ChatLogResponse>, HttpApiError> {
    let api = state.inner.lock().await;
    let lines = api
        .chat_lines()
        .map_err(HttpApiError::from_persistence)?
        .into_iter()
        .map(|(speaker, message)| ChatLogLine { speaker, message })
        .collect();
    Ok(Json(ChatLogResponse {
        schema_version: SCHEMA_VERSION_V1.to_string(),
        lines,
    }))
}

async fn upsert_token(
    State(state): State<AppState>,
    Json(token): Json<TokenRecord>,
) -> Result<Json<AckResponse>, HttpApiError> {
    let mut api = state.inner.lock().await;
    api.upsert_token(&token)
        .map_err(HttpApiError::from_persistence)?;
    Ok(Json(ack()))
}

async fn upsert_character(
    State(state): State<AppState>,
    Json(request): Json<UpsertCharacterRequest>,
) -> Result<Json<AckResponse>, HttpApiError> {
    let mut api = state.inner.lock().await;
    api.upsert_character(&request.character, &request.attributes)
        .map_err(HttpApiError::from_persistence)?;
    Ok(Json(ack()))
}

async fn set_active_page(
    State(state): State<AppState>,
    Json(request): Json<SetPageRequest>,
) -> Result<Json<AckResponse>, HttpApiError> {
    let mut api = state.inner.lock().await;
    api.set_active_page(&request.page_id)
        .map_err(HttpApiError::from_persistence)?;
    Ok(Json(ack()))
}
