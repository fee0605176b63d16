use axum::{extract::State, Json};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::diseases::models::{Disease, DiseaseFilter, DiseaseQuery, PlantType};
use crate::error::{ApiError, ApiResult, ValidationErrors};
use crate::extract::{PathParam, QueryParams};
use crate::response::DataResponse;
use crate::AppState;

// GET /diseases?plant_type=&search=
pub async fn index(
    State(state): State<AppState>,
    _auth: AuthUser,
    QueryParams(query): QueryParams<DiseaseQuery>,
) -> ApiResult<Json<DataResponse<Vec<Disease>>>> {
    let filter = parse_filter(query)?;
    let diseases = state.diseases.list_active(&filter).await?;
    Ok(Json(DataResponse::new(diseases)))
}

// GET /diseases/{id}
pub async fn show(
    State(state): State<AppState>,
    _auth: AuthUser,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult<Json<DataResponse<Disease>>> {
    let disease = state
        .diseases
        .find_active(id)
        .await?
        .ok_or(ApiError::NotFound("Disease"))?;
    Ok(Json(DataResponse::new(disease)))
}

fn parse_filter(query: DiseaseQuery) -> Result<DiseaseFilter, ApiError> {
    let plant_type = match query.plant_type.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(raw.parse::<PlantType>().map_err(|_| {
            ValidationErrors::single("plant_type", "The selected plant type is invalid.")
        })?),
    };

    let search = query
        .search
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    Ok(DiseaseFilter { plant_type, search })
}


#[cfg(test)]
mod route_tests {
    use crate::diseases::catalog::default_catalog;
    use crate::diseases::DiseaseRepository;
    use crate::test_support::{closed_port_url, TestApp};
    use axum::http::{Method, StatusCode};

    #[tokio::test]
    async fn test_list_filters_by_plant_type_and_hides_inactive() {
        let app = TestApp::new(&closed_port_url().await).await;
        let mut retired = default_catalog().remove(3);
        retired.name = "Black Scurf".to_string();
        retired.is_active = false;
        app.diseases.create(retired).await.unwrap();
        let token = app.register("ada@example.com").await;

        let (status, body) = app
            .send(Method::GET, "/api/diseases?plant_type=potato", Some(&token))
            .await;
        assert_eq!(status, StatusCode::OK);
        let rows = body["data"].as_array().unwrap();
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|d| d["plant_type"] == "potato"));
        assert!(rows.iter().all(|d| d["is_active"] == true));
        assert!(rows.iter().all(|d| d["name"] != "Black Scurf"));
    }

    #[tokio::test]
    async fn test_search_by_name() {
        let app = TestApp::new(&closed_port_url().await).await;
        let token = app.register("ada@example.com").await;

        let (status, body) = app
            .send(Method::GET, "/api/diseases?search=early", Some(&token))
            .await;
        assert_eq!(status, StatusCode::OK);
        let rows = body["data"].as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|d| d["name"] == "Early Blight"));

        let (status, body) = app
            .send(Method::GET, "/api/diseases?plant_type=corn", Some(&token))
            .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["errors"]["plant_type"].is_array());
    }

    #[tokio::test]
    async fn test_show_active_and_inactive() {
        let app = TestApp::new(&closed_port_url().await).await;
        let mut retired = default_catalog().remove(0);
        retired.is_active = false;
        let retired = app.diseases.create(retired).await.unwrap();
        let token = app.register("ada@example.com").await;

        let (_, list) = app.send(Method::GET, "/api/diseases", Some(&token)).await;
        let id = list["data"][0]["id"].as_str().unwrap().to_string();

        let (status, body) = app
            .send(Method::GET, &format!("/api/diseases/{}", id), Some(&token))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["id"], id.as_str());
        assert!(body["data"]["treatment"].is_string());

        let (status, body) = app
            .send(Method::GET, &format!("/api/diseases/{}", retired.id), Some(&token))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Disease not found");
    }

    #[tokio::test]
    async fn test_malformed_id_is_json_not_found() {
        let app = TestApp::new(&closed_port_url().await).await;
        let token = app.register("ada@example.com").await;

        let (status, body) = app
            .send(Method::GET, "/api/diseases/not-a-uuid", Some(&token))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Record not found");
    }
}
