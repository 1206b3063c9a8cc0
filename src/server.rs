// src/server.rs

use crate::load::LoadCache;
use crate::pipeline::run_pipeline;
use crate::render::{html::render_page, RenderModel};
use std::{convert::Infallible, sync::Arc};
use tracing::{error, info};
use warp::{http::StatusCode, reject::Rejection, reply::Reply, Filter};

pub const SERVICE: &str = "ventas-eda";

/// All routes: `GET /`, `GET /api/dashboard`, `GET /health`.
pub fn routes(
    cache: Arc<LoadCache>,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let health = warp::path("health")
        .and(warp::path::end())
        .and(warp::get())
        .and_then(health_check);

    let api = warp::path!("api" / "dashboard")
        .and(warp::get())
        .and(with_cache(cache.clone()))
        .and_then(dashboard_json);

    let page = warp::path::end()
        .and(warp::get())
        .and(with_cache(cache))
        .and_then(dashboard_page);

    health.or(api).or(page).with(warp::trace::request())
}

fn with_cache(
    cache: Arc<LoadCache>,
) -> impl Filter<Extract = (Arc<LoadCache>,), Error = Infallible> + Clone {
    warp::any().map(move || Arc::clone(&cache))
}

async fn health_check() -> Result<impl Reply, Rejection> {
    Ok(warp::reply::json(&serde_json::json!({
        "status": "healthy",
        "service": SERVICE
    })))
}

/// The first load reads the file, so the pipeline runs on the blocking pool.
async fn rerun(cache: Arc<LoadCache>) -> Option<RenderModel> {
    match tokio::task::spawn_blocking(move || run_pipeline(&cache)).await {
        Ok(model) => Some(model),
        Err(e) => {
            error!("pipeline task failed: {}", e);
            None
        }
    }
}

async fn dashboard_page(cache: Arc<LoadCache>) -> Result<warp::reply::Response, Rejection> {
    match rerun(cache).await {
        Some(model) => {
            info!(halted = model.is_halted(), "rendered dashboard");
            Ok(warp::reply::html(render_page(&model)).into_response())
        }
        None => Ok(warp::reply::with_status(
            warp::reply::html("pipeline failed".to_string()),
            StatusCode::INTERNAL_SERVER_ERROR,
        )
        .into_response()),
    }
}

async fn dashboard_json(cache: Arc<LoadCache>) -> Result<warp::reply::Response, Rejection> {
    match rerun(cache).await {
        Some(model) => Ok(warp::reply::json(&model).into_response()),
        None => Ok(warp::reply::with_status(
            warp::reply::json(&serde_json::json!({ "error": "pipeline failed" })),
            StatusCode::INTERNAL_SERVER_ERROR,
        )
        .into_response()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn cache_for(content: &str) -> (NamedTempFile, Arc<LoadCache>) {
        let mut tmp = NamedTempFile::new().unwrap();
        tmp.write_all(content.as_bytes()).unwrap();
        let cache = Arc::new(LoadCache::new(tmp.path()));
        (tmp, cache)
    }

    const EXAMPLE: &str = "Producto,Categoria,cantidad,precio_unitario,mes,año\n\
                           A,X,2,10,1,2023\n\
                           B,X,1,5,1,2023\n";

    #[tokio::test]
    async fn test_health_check() {
        let (_tmp, cache) = cache_for(EXAMPLE);
        let resp = warp::test::request()
            .method("GET")
            .path("/health")
            .reply(&routes(cache))
            .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: serde_json::Value = serde_json::from_slice(resp.body()).unwrap();
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["service"], SERVICE);
    }

    #[tokio::test]
    async fn index_serves_dashboard_html() {
        let (_tmp, cache) = cache_for(EXAMPLE);
        let resp = warp::test::request()
            .path("/")
            .reply(&routes(cache.clone()))
            .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = String::from_utf8(resp.body().to_vec()).unwrap();
        assert!(body.contains("$25.00"));
        assert!(body.contains("<svg"));
        assert!(cache.is_loaded());
    }

    #[tokio::test]
    async fn index_shows_banner_on_bad_schema() {
        let (_tmp, cache) = cache_for("Producto,cantidad,precio_unitario,mes,año\nA,1,1,1,2023\n");
        let resp = warp::test::request().path("/").reply(&routes(cache)).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = String::from_utf8(resp.body().to_vec()).unwrap();
        assert!(body.contains("Error al cargar los datos: Falta la columna requerida: Categoria"));
        assert!(!body.contains("<svg"));
    }

    #[tokio::test]
    async fn api_returns_model_json() {
        let (_tmp, cache) = cache_for(EXAMPLE);
        let resp = warp::test::request()
            .path("/api/dashboard")
            .reply(&routes(cache))
            .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: serde_json::Value = serde_json::from_slice(resp.body()).unwrap();
        assert_eq!(body["status"], "dashboard");
        assert_eq!(body["sections"][4]["value"], "$25.00");
    }

    #[tokio::test]
    async fn unknown_path_is_not_found() {
        let (_tmp, cache) = cache_for(EXAMPLE);
        let resp = warp::test::request()
            .path("/nope")
            .reply(&routes(cache))
            .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
