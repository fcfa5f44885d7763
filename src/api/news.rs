use super::{route_both, with_meta, ApiError, ApiResult};
use crate::content::flatten_html;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use cms_core::storage;
use cms_core::{News, Promotion, Record};
use serde_json::{json, Value};

pub fn routes(prefix: &str) -> Router<AppState> {
    let p = prefix.trim_end_matches('/');
    let mut router = Router::new();
    router = route_both(router, &format!("{p}/"), get(list_news));
    router = route_both(router, &format!("{p}/latest"), get(latest));
    router = route_both(router, &format!("{p}/promotions"), get(promotions));
    router = route_both(router, &format!("{p}/:id"), get(news_detail));
    router
}

fn news_view(state: &AppState, news: &News) -> Value {
    let media: Vec<Value> = news
        .active_media()
        .into_iter()
        .map(|m| {
            json!({
                "type": m.media_type,
                "url": state.media_url(&m.file),
                "caption": m.caption,
            })
        })
        .collect();

    json!({
        "id": news.id(),
        "image": state.media_url(&news.image),
        "title": news.title,
        "description": news.description,
        "date": news.formatted_date(),
        "author": news.author,
        "category": news.category,
        "tags": news.tags_list(),
        "full_content": flatten_html(&news.full_content),
        "media": media,
        "related_links": news.related_links_list(),
    })
}

fn promotion_view(state: &AppState, promotion: &Promotion) -> Value {
    let view = json!({
        "id": promotion.id(),
        "image": state.media_url(&promotion.image),
        "title": promotion.title,
        "description": promotion.description,
        "category": promotion.category,
        "tags": promotion.tags_list(),
        "full_content": flatten_html(&promotion.full_content),
        "media": promotion.media_list(),
        "related_links": promotion.related_links_list(),
        "validUntil": promotion.valid_until(),
        "terms": promotion.terms_list(),
        "fecha_inicio": promotion.fecha_inicio,
        "fecha_fin": promotion.fecha_fin,
    });
    with_meta(view, &promotion.meta)
}

/// Active news, most recently published first.
async fn newest_published(state: &AppState) -> ApiResult<Json<Value>> {
    let mut news = storage::list_active::<News>(state.storage()).await?;
    news.sort_by(|a, b| {
        (b.fecha_publicacion, b.id()).cmp(&(a.fecha_publicacion, a.id()))
    });
    Ok(Json(Value::Array(
        news.iter().map(|n| news_view(state, n)).collect(),
    )))
}

async fn list_news(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    newest_published(&state).await
}

async fn news_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let id: i64 = id.parse().map_err(|_| ApiError::not_found("Not found."))?;
    let news = storage::get_active::<News>(state.storage(), id)
        .await?
        .ok_or_else(|| ApiError::not_found("Not found."))?;
    Ok(Json(news_view(&state, &news)))
}

async fn latest(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    newest_published(&state).await
}

async fn promotions(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let mut promotions = storage::list_active::<Promotion>(state.storage()).await?;
    promotions.sort_by(|a, b| (b.fecha_inicio, b.id()).cmp(&(a.fecha_inicio, a.id())));
    Ok(Json(Value::Array(
        promotions.iter().map(|p| promotion_view(&state, p)).collect(),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::{get_json, test_state};
    use axum::http::StatusCode;
    use chrono::{NaiveDate, TimeZone, Utc};
    use cms_core::{MediaType, NewsMedia, RecordMeta};

    #[tokio::test]
    async fn detail_flattens_rich_text_and_dates() {
        let state = test_state();
        let mut news = News {
            title: "Nueva sucursal".to_string(),
            image: "news/sucursal.jpg".to_string(),
            tags: "sucursal, apertura".to_string(),
            fecha_publicacion: Some(Utc.with_ymd_and_hms(2024, 9, 21, 12, 0, 0).unwrap()),
            full_content: "<p>A</p><ul><li>B</li><li>C</li></ul>".to_string(),
            media: vec![NewsMedia {
                media_type: MediaType::Video,
                file: "news/video.mp4".to_string(),
                caption: "Recorrido".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        };
        let id = storage::save(state.storage(), &mut news).await.unwrap();

        let app = routes("/api/news").with_state(state);
        let (status, body) = get_json(app, &format!("/api/news/{id}/")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["date"], "21 de septiembre, 2024");
        assert_eq!(body["tags"], json!(["sucursal", "apertura"]));
        assert_eq!(
            body["full_content"],
            json!([
                {"type": "paragraph", "content": "A"},
                {"type": "list", "content": ["B", "C"]}
            ])
        );
        assert_eq!(body["media"][0]["type"], "video");
        assert_eq!(body["image"], "http://localhost:8000/media/news/sucursal.jpg");
    }

    #[tokio::test]
    async fn list_is_newest_publication_first() {
        let state = test_state();
        for (title, month, day) in [("Septiembre", 9, 21), ("Marzo", 3, 3), ("Diciembre", 12, 30)] {
            let mut news = News {
                title: title.to_string(),
                fecha_publicacion: Some(Utc.with_ymd_and_hms(2024, month, day, 9, 0, 0).unwrap()),
                ..Default::default()
            };
            storage::save(state.storage(), &mut news).await.unwrap();
        }
        let app = routes("/api/news").with_state(state);

        for uri in ["/api/news/", "/api/news/latest/"] {
            let (status, body) = get_json(app.clone(), uri).await;
            assert_eq!(status, StatusCode::OK);
            let titles: Vec<&str> = body
                .as_array()
                .unwrap()
                .iter()
                .map(|n| n["title"].as_str().unwrap())
                .collect();
            assert_eq!(titles, vec!["Diciembre", "Septiembre", "Marzo"], "{uri}");
        }
    }

    #[tokio::test]
    async fn inactive_news_is_hidden() {
        let state = test_state();
        let mut news = News {
            title: "Borrador".to_string(),
            meta: RecordMeta::inactive(),
            ..Default::default()
        };
        let id = storage::save(state.storage(), &mut news).await.unwrap();

        let app = routes("/api/news").with_state(state);
        let (status, _) = get_json(app.clone(), &format!("/api/news/{id}")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (_, body) = get_json(app, "/api/news/").await;
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn promotions_newest_start_first() {
        let state = test_state();
        for (title, start) in [("Enero", 1), ("Marzo", 3), ("Febrero", 2)] {
            let mut promotion = Promotion {
                title: title.to_string(),
                fecha_inicio: NaiveDate::from_ymd_opt(2025, start, 1),
                fecha_fin: NaiveDate::from_ymd_opt(2025, start, 28),
                terms: "Aplican condiciones".to_string(),
                ..Default::default()
            };
            storage::save(state.storage(), &mut promotion).await.unwrap();
        }

        let app = routes("/api/news").with_state(state);
        let (_, body) = get_json(app, "/api/news/promotions/").await;
        let titles: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["title"].as_str().unwrap())
            .collect();
        assert_eq!(titles, vec!["Marzo", "Febrero", "Enero"]);
        assert_eq!(body[0]["validUntil"], "28 de marzo, 2025");
        assert_eq!(body[0]["terms"], json!(["Aplican condiciones"]));
        assert_eq!(body[0]["is_active"], true);
    }
}
