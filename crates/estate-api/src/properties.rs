use axum::{
    Extension,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use estate_search::{
    Coordinates, FilterOptions, LocationFilter, PriceRange, TypeFilter, filter_properties,
    format_inr, price::PRICE_CEILING,
};
use estate_types::api::{Claims, CreatedResponse, PropertyInput};

use crate::auth::{AppState, db_call};
use crate::convert;
use crate::error::ApiError;
use crate::extract::{Json, Path, Query};
use crate::validation;

#[derive(Debug, Default, Deserialize)]
pub struct PropertyQuery {
    #[serde(rename = "type", default)]
    pub kind: TypeFilter,
    /// One of the preset range keys (`0-500000`, `20000000+`, ...).
    pub price_range: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub radius_km: Option<f64>,
}

impl PropertyQuery {
    /// Explicit bounds win over a preset key. A location needs both
    /// coordinates; the radius falls back to `default_radius_km`.
    pub fn to_filter(&self, default_radius_km: f64) -> Result<FilterOptions, ApiError> {
        let price = match (self.min_price, self.max_price, &self.price_range) {
            (None, None, None) => None,
            (None, None, Some(key)) => Some(PriceRange::from_key(key)),
            (min, max, _) => {
                let range = PriceRange::new(min.unwrap_or(0.0), max.unwrap_or(PRICE_CEILING));
                if range.min > range.max {
                    return Err(ApiError::BadRequest(
                        "min_price must not exceed max_price".into(),
                    ));
                }
                Some(range)
            }
        };

        let location = match (self.lat, self.lng) {
            (None, None) => None,
            (Some(lat), Some(lng)) => {
                let radius_km = self.radius_km.unwrap_or(default_radius_km);
                if !(radius_km > 0.0) {
                    return Err(ApiError::BadRequest("radius_km must be positive".into()));
                }
                Some(LocationFilter {
                    center: Coordinates::new(lat, lng),
                    radius_km,
                })
            }
            _ => {
                return Err(ApiError::BadRequest(
                    "lat and lng must be given together".into(),
                ));
            }
        };

        Ok(FilterOptions {
            kind: self.kind,
            price,
            location,
        })
    }
}

/// GET /properties. Every listing, newest first, narrowed by the query.
pub async fn list_properties(
    State(state): State<AppState>,
    Query(query): Query<PropertyQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let options = query.to_filter(state.search_radius_km)?;
    let rows = db_call(&state, |db| db.list_properties()).await?;
    let all = convert::properties(rows)?;
    Ok(Json(filter_properties(&all, &options)))
}

/// GET /properties/{id}. Counts as a view.
pub async fn get_property(
    State(state): State<AppState>,
    Path(property_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let pid = property_id.to_string();
    let row = db_call(&state, move |db| -> anyhow::Result<_> {
        if !db.increment_views(&pid)? {
            return Ok(None);
        }
        db.get_property(&pid)
    })
    .await?
    .ok_or(ApiError::NotFound("Property"))?;

    Ok(Json(convert::property_with_owner(row)?))
}

/// POST /properties. The caller becomes the owner.
pub async fn create_property(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(input): Json<PropertyInput>,
) -> Result<impl IntoResponse, ApiError> {
    validation::property(&input)?;

    let property_id = Uuid::new_v4();
    let asking = format_inr(input.price);
    let (pid, uid) = (property_id.to_string(), claims.sub.to_string());
    db_call(&state, move |db| db.insert_property(&pid, &uid, &input)).await?;

    info!("User {} listed property {} at {}", claims.sub, property_id, asking);
    Ok((StatusCode::CREATED, Json(CreatedResponse { id: property_id })))
}

/// PUT /properties/{id}. Owner edit. Someone else's listing is a 404.
pub async fn update_property(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(property_id): Path<Uuid>,
    Json(input): Json<PropertyInput>,
) -> Result<impl IntoResponse, ApiError> {
    validation::property(&input)?;

    let (pid, uid) = (property_id.to_string(), claims.sub.to_string());
    let row = db_call(&state, move |db| -> anyhow::Result<_> {
        if !db.update_owned_property(&pid, &uid, &input)? {
            return Ok(None);
        }
        db.get_property(&pid)
    })
    .await?
    .ok_or(ApiError::NotFound("Property"))?;

    Ok(Json(convert::property_with_owner(row)?))
}

/// DELETE /properties/{id}. Owner delete, images included.
pub async fn delete_property(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(property_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let (pid, uid) = (property_id.to_string(), claims.sub.to_string());
    let removed = db_call(&state, move |db| db.delete_owned_property(&pid, &uid)).await?;
    if !removed {
        return Err(ApiError::NotFound("Property"));
    }

    if let Err(e) = state.storage.delete_property_images(property_id).await {
        warn!("Property {} deleted but images remain: {}", property_id, e);
    }
    Ok(StatusCode::NO_CONTENT)
}

/// GET /me/properties
pub async fn my_properties(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let uid = claims.sub.to_string();
    let rows = db_call(&state, move |db| db.list_properties_by_user(&uid)).await?;
    Ok(Json(convert::properties(rows)?))
}
