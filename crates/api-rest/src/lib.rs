//! # API REST
//!
//! REST API for the PHR engine.
//!
//! Handles:
//! - HTTP endpoints with axum, one generic set of routes for every entity type
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialisation, CORS, status codes)
//!
//! Uses `api-shared` for wire types and `phr-core` controllers for behaviour.

#![warn(rust_2018_idioms)]

mod convert;
mod error;

pub use error::ApiError;

use api_shared::{
    BucketDto, CardDto, DetailRes, EntityInfo, ErrorRes, FieldInfo, FormReq, HealthRes,
    HealthService, ListEntitiesRes, ListRecordsRes, NavigationDto, OptionInfo, QuickAddReq,
    RecordRes, RowDto, SectionInfo, SectionSummaryDto, SingletonRes, SubmitRes,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post, put},
    Router,
};
use phr_core::{
    CoreConfig, DeleteOutcome, DetailController, DetailForm, EntityType, ListController,
    PhrError, QuickAddController, RecordId, RecordStore, SingletonController,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::{IntoParams, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

/// Application state shared by every handler.
///
/// Holds the record store behind a trait object so the same router serves the hosted
/// backend in production and an in-memory store in tests.
#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn RecordStore>,
    cfg: Arc<CoreConfig>,
    singletons: Arc<SingletonController<dyn RecordStore>>,
}

impl AppState {
    pub fn new(store: Arc<dyn RecordStore>, cfg: Arc<CoreConfig>) -> Self {
        let singletons = Arc::new(SingletonController::new(store.clone(), cfg.clone()));
        Self {
            store,
            cfg,
            singletons,
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        list_entities,
        list_records,
        quick_add,
        create_record,
        get_record,
        update_record,
        delete_record,
        get_singleton,
        update_section,
    ),
    components(schemas(
        HealthRes,
        ErrorRes,
        OptionInfo,
        FieldInfo,
        SectionInfo,
        EntityInfo,
        ListEntitiesRes,
        CardDto,
        BucketDto,
        ListRecordsRes,
        QuickAddReq,
        RecordRes,
        FormReq,
        NavigationDto,
        SubmitRes,
        RowDto,
        DetailRes,
        SectionSummaryDto,
        SingletonRes,
    ))
)]
pub struct ApiDoc;

/// Build the REST router with Swagger UI and permissive CORS.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/entities", get(list_entities))
        .route("/entities/:entity", get(list_records).post(create_record))
        .route("/entities/:entity/quick-add", post(quick_add))
        .route(
            "/entities/:entity/:id",
            get(get_record).put(update_record).delete(delete_record),
        )
        .route("/singletons/:entity", get(get_singleton))
        .route("/singletons/:entity/sections/:section", put(update_section))
        .merge(
            SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn parse_entity(raw: &str) -> Result<EntityType, ApiError> {
    raw.parse::<EntityType>().map_err(ApiError::from)
}

fn apply_values<S: RecordStore + ?Sized>(
    form: &mut DetailForm<S>,
    req: FormReq,
) -> Result<(), ApiError> {
    for (field, value) in req.values {
        form.set(&field, value)?;
    }
    if let Some(rows) = req.children {
        form.clear_child_rows()?;
        for row in rows {
            let index = form.add_child_row()?;
            for (field, value) in row {
                form.set_child(index, &field, value)?;
            }
        }
    }
    Ok(())
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DeleteParams {
    /// Must be `true` for the record to be deleted.
    #[serde(default)]
    pub confirm: bool,
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
///
/// Used for monitoring and load balancer health checks; does not contact the store.
async fn health() -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    get,
    path = "/entities",
    responses(
        (status = 200, description = "Schema of every entity type", body = ListEntitiesRes)
    )
)]
/// Describe every entity type: fields, options, visibility rules and sections.
async fn list_entities() -> Json<ListEntitiesRes> {
    Json(ListEntitiesRes {
        entities: EntityType::ALL
            .into_iter()
            .map(|entity| convert::entity_info(entity.schema()))
            .collect(),
    })
}

#[utoipa::path(
    get,
    path = "/entities/{entity}",
    params(("entity" = String, Path, description = "Entity collection name")),
    responses(
        (status = 200, description = "Records grouped for display, newest first", body = ListRecordsRes),
        (status = 400, description = "Entity is a singleton", body = ErrorRes),
        (status = 404, description = "Unknown entity", body = ErrorRes),
        (status = 502, description = "Store failure", body = ErrorRes)
    )
)]
/// List the records of one entity type
///
/// # Errors
/// Returns `502 Bad Gateway` with "Failed to fetch <entities>" if the store call fails.
#[axum::debug_handler]
async fn list_records(
    State(state): State<AppState>,
    Path(entity): Path<String>,
) -> Result<Json<ListRecordsRes>, ApiError> {
    let entity = parse_entity(&entity)?;
    let snapshot = ListController::new(state.store.clone(), state.cfg.clone())
        .load(entity)
        .await?;

    Ok(Json(ListRecordsRes {
        entity: entity.collection().to_owned(),
        count: snapshot.len(),
        buckets: snapshot.buckets().into_iter().map(convert::bucket_dto).collect(),
    }))
}

#[utoipa::path(
    post,
    path = "/entities/{entity}/quick-add",
    params(("entity" = String, Path, description = "Entity collection name")),
    request_body = QuickAddReq,
    responses(
        (status = 201, description = "Record created", body = RecordRes),
        (status = 204, description = "Blank name; nothing created"),
        (status = 400, description = "Entity does not support quick add", body = ErrorRes),
        (status = 409, description = "A record with this name already exists", body = ErrorRes),
        (status = 502, description = "Store failure", body = ErrorRes)
    )
)]
/// Add a record from a name alone
///
/// Duplicate detection runs against a freshly loaded list and ignores case.
#[axum::debug_handler]
async fn quick_add(
    State(state): State<AppState>,
    Path(entity): Path<String>,
    Json(req): Json<QuickAddReq>,
) -> Result<Response, ApiError> {
    let entity = parse_entity(&entity)?;
    let mut snapshot = ListController::new(state.store.clone(), state.cfg.clone())
        .load(entity)
        .await?;
    let mut input = req.name;

    let added = QuickAddController::new(state.store.clone(), state.cfg.clone())
        .submit(&mut snapshot, &mut input)
        .await?;

    Ok(match added {
        Some(record) => (
            StatusCode::CREATED,
            Json(RecordRes {
                record: convert::record_value(&record),
            }),
        )
            .into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    })
}

#[utoipa::path(
    post,
    path = "/entities/{entity}",
    params(("entity" = String, Path, description = "Entity collection name")),
    request_body = FormReq,
    responses(
        (status = 201, description = "Record created", body = SubmitRes),
        (status = 400, description = "Unknown field or singleton entity", body = ErrorRes),
        (status = 422, description = "Required fields missing", body = ErrorRes),
        (status = 502, description = "Store failure", body = ErrorRes)
    )
)]
/// Create a record from a full form
///
/// Values are draft text as a user would type them; conversion, trimming and conditional
/// nulling happen in the core.
#[axum::debug_handler]
async fn create_record(
    State(state): State<AppState>,
    Path(entity): Path<String>,
    Json(req): Json<FormReq>,
) -> Result<(StatusCode, Json<SubmitRes>), ApiError> {
    let entity = parse_entity(&entity)?;
    let mut form = DetailForm::add(state.store.clone(), state.cfg.clone(), entity)?;
    apply_values(&mut form, req)?;
    let navigation = form.submit().await?;

    Ok((
        StatusCode::CREATED,
        Json(SubmitRes {
            navigation: convert::navigation_dto(&navigation),
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/entities/{entity}/{id}",
    params(
        ("entity" = String, Path, description = "Entity collection name"),
        ("id" = String, Path, description = "Record id")
    ),
    responses(
        (status = 200, description = "Record detail with every row expanded", body = DetailRes),
        (status = 404, description = "Record not found", body = ErrorRes),
        (status = 502, description = "Store failure", body = ErrorRes)
    )
)]
/// Read one record
#[axum::debug_handler]
async fn get_record(
    State(state): State<AppState>,
    Path((entity, id)): Path<(String, String)>,
) -> Result<Json<DetailRes>, ApiError> {
    let entity = parse_entity(&entity)?;
    let mut view = DetailController::new(state.store.clone(), state.cfg.clone())
        .load(entity, &RecordId::new(id))
        .await?;
    view.toggle_show_more();
    Ok(Json(convert::detail_res(&view)))
}

#[utoipa::path(
    put,
    path = "/entities/{entity}/{id}",
    params(
        ("entity" = String, Path, description = "Entity collection name"),
        ("id" = String, Path, description = "Record id")
    ),
    request_body = FormReq,
    responses(
        (status = 200, description = "Record updated", body = SubmitRes),
        (status = 404, description = "Record not found", body = ErrorRes),
        (status = 422, description = "Required fields missing", body = ErrorRes),
        (status = 502, description = "Store failure", body = ErrorRes)
    )
)]
/// Update a record
///
/// Fields absent from the request keep their stored values.
#[axum::debug_handler]
async fn update_record(
    State(state): State<AppState>,
    Path((entity, id)): Path<(String, String)>,
    Json(req): Json<FormReq>,
) -> Result<Json<SubmitRes>, ApiError> {
    let entity = parse_entity(&entity)?;
    let mut form = DetailForm::edit(
        state.store.clone(),
        state.cfg.clone(),
        entity,
        RecordId::new(id),
    )
    .await?;
    apply_values(&mut form, req)?;
    let navigation = form.submit().await?;

    Ok(Json(SubmitRes {
        navigation: convert::navigation_dto(&navigation),
    }))
}

#[utoipa::path(
    delete,
    path = "/entities/{entity}/{id}",
    params(
        ("entity" = String, Path, description = "Entity collection name"),
        ("id" = String, Path, description = "Record id"),
        DeleteParams
    ),
    responses(
        (status = 200, description = "Record deleted", body = SubmitRes),
        (status = 404, description = "Record not found", body = ErrorRes),
        (status = 409, description = "Confirmation missing; nothing deleted", body = ErrorRes),
        (status = 502, description = "Store failure", body = ErrorRes)
    )
)]
/// Delete a record
///
/// Requires `?confirm=true`. Without it the store is never called.
#[axum::debug_handler]
async fn delete_record(
    State(state): State<AppState>,
    Path((entity, id)): Path<(String, String)>,
    Query(params): Query<DeleteParams>,
) -> Result<Json<SubmitRes>, ApiError> {
    let entity = parse_entity(&entity)?;
    let controller = DetailController::new(state.store.clone(), state.cfg.clone());
    let view = controller.load(entity, &RecordId::new(id)).await?;

    let confirmed = params.confirm;
    match controller.delete(&view, |_| confirmed).await? {
        DeleteOutcome::Deleted(navigation) => Ok(Json(SubmitRes {
            navigation: convert::navigation_dto(&navigation),
        })),
        DeleteOutcome::Cancelled => Err(PhrError::ConfirmationRequired(entity).into()),
    }
}

#[utoipa::path(
    get,
    path = "/singletons/{entity}",
    params(("entity" = String, Path, description = "Singleton entity name")),
    responses(
        (status = 200, description = "Singleton row with section summaries", body = SingletonRes),
        (status = 400, description = "Entity is not a singleton", body = ErrorRes),
        (status = 502, description = "Store failure", body = ErrorRes)
    )
)]
/// Read a singleton entity, creating its empty row on first access
#[axum::debug_handler]
async fn get_singleton(
    State(state): State<AppState>,
    Path(entity): Path<String>,
) -> Result<Json<SingletonRes>, ApiError> {
    let entity = parse_entity(&entity)?;
    let (record, summaries) = state.singletons.summaries(entity).await?;
    Ok(Json(convert::singleton_res(
        &record,
        summaries,
        entity.collection(),
    )))
}

#[utoipa::path(
    put,
    path = "/singletons/{entity}/sections/{section}",
    params(
        ("entity" = String, Path, description = "Singleton entity name"),
        ("section" = String, Path, description = "Section key")
    ),
    request_body = FormReq,
    responses(
        (status = 200, description = "Section updated", body = SubmitRes),
        (status = 400, description = "Unknown section or field outside the section", body = ErrorRes),
        (status = 502, description = "Store failure", body = ErrorRes)
    )
)]
/// Update one section of a singleton
///
/// Only the section's fields are written; the rest of the row is untouched. For a section with
/// a child entity, `children` replaces that entity's rows for this singleton.
#[axum::debug_handler]
async fn update_section(
    State(state): State<AppState>,
    Path((entity, section)): Path<(String, String)>,
    Json(req): Json<FormReq>,
) -> Result<Json<SubmitRes>, ApiError> {
    let entity = parse_entity(&entity)?;
    let record = state.singletons.load(entity).await?;
    let mut form = DetailForm::edit_section(
        state.store.clone(),
        state.cfg.clone(),
        entity,
        record.id,
        &section,
    )
    .await?;
    apply_values(&mut form, req)?;
    let navigation = form.submit().await?;

    Ok(Json(SubmitRes {
        navigation: convert::navigation_dto(&navigation),
    }))
}
