//! `/api/financial-guidance/`: saving tips, the education slider and the FAQ.

use super::{route_both, with_meta, ApiError, ApiResult};
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use cms_core::storage;
use cms_core::{FaqItem, Record, SavingTip, SliderSlide};
use serde_json::{json, Value};

pub fn routes(prefix: &str) -> Router<AppState> {
    let p = prefix.trim_end_matches('/');
    let mut router = Router::new();
    router = ordered::<SavingTip>(router, &format!("{p}/saving-tips"));
    router = ordered::<SliderSlide>(router, &format!("{p}/slider-slides"));
    router = ordered::<FaqItem>(router, &format!("{p}/faq"));
    router
}

trait Guidance: Record {
    fn order(&self) -> u32;
    fn view(&self, state: &AppState) -> Value;
}

impl Guidance for SavingTip {
    fn order(&self) -> u32 {
        self.order
    }

    fn view(&self, _state: &AppState) -> Value {
        json!({
            "id": self.id(),
            "title": self.title,
            "description": self.description,
            "content": self.content,
            "link": self.link,
            "order": self.order,
        })
    }
}

impl Guidance for SliderSlide {
    fn order(&self) -> u32 {
        self.order
    }

    fn view(&self, state: &AppState) -> Value {
        json!({
            "id": self.id(),
            "image_url": state.media_url(&self.image_url),
            "title": self.title,
            "description": self.description,
            "order": self.order,
        })
    }
}

impl Guidance for FaqItem {
    fn order(&self) -> u32 {
        self.order
    }

    fn view(&self, _state: &AppState) -> Value {
        json!({
            "id": self.id(),
            "question": self.question,
            "answer": self.answer,
            "order": self.order,
        })
    }
}

fn ordered<T: Guidance>(router: Router<AppState>, base: &str) -> Router<AppState> {
    let router = route_both(router, &format!("{base}/"), get(list::<T>));
    route_both(router, &format!("{base}/:id"), get(detail::<T>))
}

async fn list<T: Guidance>(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let mut rows = storage::list_active::<T>(state.storage()).await?;
    rows.sort_by_key(|row| (row.order(), row.id()));
    Ok(Json(Value::Array(
        rows.iter()
            .map(|row| with_meta(row.view(&state), row.meta()))
            .collect(),
    )))
}

async fn detail<T: Guidance>(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let id: i64 = id.parse().map_err(|_| ApiError::not_found("Not found."))?;
    let row = storage::get_active::<T>(state.storage(), id)
        .await?
        .ok_or_else(|| ApiError::not_found("Not found."))?;
    Ok(Json(with_meta(row.view(&state), row.meta())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::{get_json, test_state};
    use axum::http::StatusCode;
    use cms_core::RecordMeta;

    #[tokio::test]
    async fn faq_orders_by_order_then_id() {
        let state = test_state();
        for (question, order) in [("¿Cómo ahorro?", 2), ("¿Qué es un CD?", 1), ("¿Tasa?", 1)] {
            let mut item = FaqItem {
                question: question.to_string(),
                answer: "Respuesta".to_string(),
                order,
                ..Default::default()
            };
            storage::save(state.storage(), &mut item).await.unwrap();
        }
        let app = routes("/api/financial-guidance").with_state(state);
        let (_, body) = get_json(app, "/api/financial-guidance/faq/").await;
        let questions: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|f| f["question"].as_str().unwrap())
            .collect();
        assert_eq!(questions, vec!["¿Qué es un CD?", "¿Tasa?", "¿Cómo ahorro?"]);
    }

    #[tokio::test]
    async fn inactive_tip_is_hidden_from_detail() {
        let state = test_state();
        let mut tip = SavingTip {
            title: "Ahorra primero".to_string(),
            meta: RecordMeta::inactive(),
            ..Default::default()
        };
        let id = storage::save(state.storage(), &mut tip).await.unwrap();
        let app = routes("/api/financial-guidance").with_state(state);

        let (status, _) = get_json(app.clone(), &format!("/api/financial-guidance/saving-tips/{id}/")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (_, body) = get_json(app, "/api/financial-guidance/saving-tips").await;
        assert_eq!(body, json!([]));
    }
}
