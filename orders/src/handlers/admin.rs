use actix_web::{
    get, post,
    web::{self, Json},
};
use common::{
    context::Context,
    entities::order::{Order, OrderStatus},
    error::{self, AddCode},
};
use serde::Deserialize;

use crate::service::order::OrderService;

#[derive(Debug, Deserialize)]
pub struct OrderFilter {
    pub status: Option<String>,
}

#[get("/api/admin/orders")]
pub async fn get_admin_orders(
    context: Context,
    filter: web::Query<OrderFilter>,
) -> error::Result<Json<Vec<Order<String>>>> {
    let status = match filter.into_inner().status {
        Some(status) => Some(status.parse::<OrderStatus>().code(400)?),
        None => None,
    };
    Ok(Json(OrderService::new(context).list(status).await?))
}

#[post("/api/admin/orders/{id}/approve")]
pub async fn admin_approve_order(
    context: Context,
    id: web::Path<String>,
) -> error::Result<Json<Order<String>>> {
    Ok(Json(OrderService::new(context).approve(&id).await?))
}

#[cfg(test)]
mod tests {
    use actix_web::{
        test::{self, init_service},
        web::Data,
        App,
    };
    use common::context::test_context::TestState;
    use serde_json::{json, Value};

    #[actix_web::test]
    async fn status_filter_and_order() {
        let state = TestState::new();
        let app = init_service(
            App::new()
                .app_data(Data::new(state.state.clone()))
                .configure(crate::configure),
        )
        .await;

        let mut ids = Vec::new();
        for name in ["first", "second", "third"] {
            let req = test::TestRequest::post()
                .uri("/api/orders")
                .set_json(json!({ "designName": name }))
                .to_request();
            let order: Value = test::call_and_read_body_json(&app, req).await;
            ids.push(order["id"].as_str().unwrap().to_string());
        }

        let req = test::TestRequest::post()
            .uri(&format!("/api/orders/{}/submit", ids[1]))
            .to_request();
        test::call_service(&app, req).await;

        let req = test::TestRequest::get()
            .uri("/api/admin/orders")
            .insert_header(("Authorization", state.admin_bearer()))
            .to_request();
        let all: Vec<Value> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(all.len(), 3);
        for pair in all.windows(2) {
            assert!(pair[0]["createdAt"].as_i64() >= pair[1]["createdAt"].as_i64());
        }

        let req = test::TestRequest::get()
            .uri("/api/admin/orders?status=pending_admin_approval")
            .insert_header(("Authorization", state.admin_bearer()))
            .to_request();
        let pending: Vec<Value> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0]["id"], ids[1].as_str());

        let req = test::TestRequest::get()
            .uri("/api/admin/orders?status=lost")
            .insert_header(("Authorization", state.admin_bearer()))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status().as_u16(), 400);

        let req = test::TestRequest::post()
            .uri(&format!("/api/admin/orders/{}/approve", ids[1]))
            .insert_header(("Authorization", state.admin_bearer()))
            .to_request();
        let approved: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(approved["status"], "submitted_to_pcm");
    }
}
