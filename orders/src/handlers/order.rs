use actix_web::{
    get, post, put,
    web::{self, Json},
};
use common::{
    context::Context,
    entities::order::{Order, OrderConfigChange, Quote, RecipientBatch},
    error,
};

use crate::service::order::OrderService;

#[post("/api/orders")]
pub async fn post_order(
    context: Context,
    Json(fields): web::Json<OrderConfigChange>,
) -> error::Result<Json<Order<String>>> {
    Ok(Json(OrderService::new(context).create_draft(fields).await?))
}

#[get("/api/orders")]
pub async fn get_orders(context: Context) -> error::Result<Json<Vec<Order<String>>>> {
    Ok(Json(OrderService::new(context).list(None).await?))
}

#[get("/api/orders/{id}")]
pub async fn get_order(context: Context, id: web::Path<String>) -> error::Result<Json<Order<String>>> {
    Ok(Json(OrderService::new(context).find(&id).await?))
}

#[put("/api/orders/{id}/config")]
pub async fn put_order_config(
    context: Context,
    id: web::Path<String>,
    Json(change): web::Json<OrderConfigChange>,
) -> error::Result<Json<Order<String>>> {
    Ok(Json(
        OrderService::new(context).update_config(&id, change).await?,
    ))
}

#[post("/api/orders/{id}/recipients")]
pub async fn post_recipients(
    context: Context,
    id: web::Path<String>,
    Json(batch): web::Json<RecipientBatch>,
) -> error::Result<Json<Order<String>>> {
    Ok(Json(
        OrderService::new(context)
            .append_recipients(&id, batch.recipients)
            .await?,
    ))
}

#[post("/api/orders/{id}/submit")]
pub async fn submit_order(
    context: Context,
    id: web::Path<String>,
) -> error::Result<Json<Order<String>>> {
    Ok(Json(OrderService::new(context).submit(&id).await?))
}

#[post("/api/orders/{id}/approve")]
pub async fn approve_order(
    context: Context,
    id: web::Path<String>,
) -> error::Result<Json<Order<String>>> {
    Ok(Json(OrderService::new(context).approve(&id).await?))
}

#[post("/api/orders/{id}/reject")]
pub async fn reject_order(
    context: Context,
    id: web::Path<String>,
) -> error::Result<Json<Order<String>>> {
    Ok(Json(OrderService::new(context).reject(&id).await?))
}

#[get("/api/orders/{id}/quote")]
pub async fn get_quote(context: Context, id: web::Path<String>) -> error::Result<Json<Quote>> {
    Ok(Json(OrderService::new(context).quote(&id).await?))
}

#[cfg(test)]
mod tests {
    use actix_web::{
        test::{self, init_service},
        web::Data,
        App,
    };
    use common::{
        api::test_print_api::PrintCall,
        context::test_context::TestState,
        entities::{order::Order, product::ProductType},
    };
    use mongodb::bson::oid::ObjectId;
    use serde_json::{json, Value};

    fn recipient(name: &str) -> Value {
        json!({
            "firstName": name,
            "lastName": "Lovelace",
            "address1": "12 Analytical St",
            "city": "Clearwater",
            "state": "FL",
            "zipCode": "33755"
        })
    }

    fn draft() -> Value {
        json!({
            "designType": "single",
            "designId": "4412",
            "designName": "Spring Sale",
            "designSize": "68",
            "mailClass": "Standard",
            "mailDate": "2024-05-01",
            "returnAddress": {
                "firstName": "Acme",
                "address1": "1 Main St",
                "city": "Tampa",
                "state": "FL",
                "zipCode": "33601"
            }
        })
    }

    macro_rules! app {
        ($state:expr) => {
            init_service(
                App::new()
                    .app_data(Data::new($state.state.clone()))
                    .configure(crate::configure),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn draft_is_created_and_readable_without_auth() {
        let state = TestState::new();
        let app = app!(state);

        let req = test::TestRequest::post()
            .uri("/api/orders")
            .set_json(draft())
            .to_request();
        let order: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(order["status"], "draft");
        assert_eq!(order["productType"], "postcard");
        assert_eq!(order["recipients"], json!([]));

        let req = test::TestRequest::get()
            .uri(&format!("/api/orders/{}", order["id"].as_str().unwrap()))
            .to_request();
        let found: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(found, order);

        let req = test::TestRequest::get()
            .uri(&format!("/api/orders/{}", ObjectId::new().to_hex()))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status().as_u16(), 404);

        let req = test::TestRequest::get().uri("/api/orders").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status().as_u16(), 401);
    }

    #[actix_web::test]
    async fn config_merges_fields() {
        let state = TestState::new();
        let app = app!(state);

        let req = test::TestRequest::post()
            .uri("/api/orders")
            .set_json(draft())
            .to_request();
        let order: Value = test::call_and_read_body_json(&app, req).await;
        let id = order["id"].as_str().unwrap();

        let req = test::TestRequest::put()
            .uri(&format!("/api/orders/{}/config", id))
            .set_json(json!({ "mailClass": "FirstClass", "brochureFold": "Tri-Fold" }))
            .to_request();
        let changed: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(changed["mailClass"], "FirstClass");
        assert_eq!(changed["brochureFold"], "Tri-Fold");
        assert_eq!(changed["designId"], "4412");
        assert!(changed["updatedAt"].as_i64() >= order["updatedAt"].as_i64());
    }

    #[actix_web::test]
    async fn appending_recipients_is_associative() {
        let state = TestState::new();
        let app = app!(state);

        let mut ids = Vec::new();
        for _ in 0..2 {
            let req = test::TestRequest::post()
                .uri("/api/orders")
                .set_json(draft())
                .to_request();
            let order: Value = test::call_and_read_body_json(&app, req).await;
            ids.push(order["id"].as_str().unwrap().to_string());
        }

        for batch in [vec![recipient("a")], vec![recipient("b")]] {
            let req = test::TestRequest::post()
                .uri(&format!("/api/orders/{}/recipients", ids[0]))
                .set_json(json!({ "recipients": batch }))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert!(resp.status().is_success());
        }

        let req = test::TestRequest::post()
            .uri(&format!("/api/orders/{}/recipients", ids[1]))
            .set_json(json!({ "recipients": [recipient("a"), recipient("b")] }))
            .to_request();
        let together: Value = test::call_and_read_body_json(&app, req).await;

        let req = test::TestRequest::get()
            .uri(&format!("/api/orders/{}", ids[0]))
            .to_request();
        let separate: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(separate["recipients"], together["recipients"]);
        assert_eq!(together["recipients"][1]["firstName"], "b");
    }

    #[actix_web::test]
    async fn invalid_recipient_is_rejected_whole_batch() {
        let state = TestState::new();
        let app = app!(state);

        let req = test::TestRequest::post()
            .uri("/api/orders")
            .set_json(draft())
            .to_request();
        let order: Value = test::call_and_read_body_json(&app, req).await;
        let id = order["id"].as_str().unwrap();

        let req = test::TestRequest::post()
            .uri(&format!("/api/orders/{}/recipients", id))
            .set_json(json!({ "recipients": [recipient("a"), { "firstName": "b" }] }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status().as_u16(), 400);
        let body: Value = test::read_body_json(resp).await;
        assert!(body["error"].as_str().unwrap().contains("zipCode"));

        let req = test::TestRequest::get()
            .uri(&format!("/api/orders/{}", id))
            .to_request();
        let stored: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(stored["recipients"], json!([]));
    }

    #[actix_web::test]
    async fn recipients_in_draft_or_config_are_validated() {
        let state = TestState::new();
        let app = app!(state);

        let mut body = draft();
        body["recipients"] = json!([{ "firstName": "OnlyName" }]);
        let req = test::TestRequest::post()
            .uri("/api/orders")
            .set_json(body)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status().as_u16(), 400);

        let mut body = draft();
        body["recipients"] = json!([recipient("a")]);
        let req = test::TestRequest::post()
            .uri("/api/orders")
            .set_json(body)
            .to_request();
        let order: Value = test::call_and_read_body_json(&app, req).await;
        let id = order["id"].as_str().unwrap();

        let req = test::TestRequest::put()
            .uri(&format!("/api/orders/{}/config", id))
            .set_json(json!({ "recipients": [{ "lastName": "x" }] }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status().as_u16(), 400);
        let body: Value = test::read_body_json(resp).await;
        assert!(body["error"].as_str().unwrap().contains("address1"));

        let req = test::TestRequest::get()
            .uri(&format!("/api/orders/{}", id))
            .to_request();
        let stored: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(stored["recipients"], order["recipients"]);
    }

    #[actix_web::test]
    async fn explicit_null_clears_config_fields() {
        let state = TestState::new();
        let app = app!(state);

        let mut body = draft();
        body["brochureFold"] = json!("Bi-Fold");
        let req = test::TestRequest::post()
            .uri("/api/orders")
            .set_json(body)
            .to_request();
        let order: Value = test::call_and_read_body_json(&app, req).await;
        let id = order["id"].as_str().unwrap();
        assert_eq!(order["brochureFold"], "Bi-Fold");

        let req = test::TestRequest::put()
            .uri(&format!("/api/orders/{}/config", id))
            .set_json(json!({ "brochureFold": null, "mailDate": null }))
            .to_request();
        let changed: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(changed["brochureFold"], Value::Null);
        assert_eq!(changed["mailDate"], Value::Null);
        assert_eq!(changed["designId"], "4412");
        assert_eq!(changed["returnAddress"]["city"], "Tampa");
    }

    #[actix_web::test]
    async fn submit_is_permissive() {
        let state = TestState::new();
        let app = app!(state);

        let req = test::TestRequest::post()
            .uri("/api/orders")
            .set_json(draft())
            .to_request();
        let order: Value = test::call_and_read_body_json(&app, req).await;
        let id = order["id"].as_str().unwrap();

        let req = test::TestRequest::post()
            .uri(&format!("/api/orders/{}/reject", id))
            .insert_header(("Authorization", state.admin_bearer()))
            .to_request();
        let rejected: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(rejected["status"], "rejected");

        for _ in 0..2 {
            let req = test::TestRequest::post()
                .uri(&format!("/api/orders/{}/submit", id))
                .to_request();
            let submitted: Value = test::call_and_read_body_json(&app, req).await;
            assert_eq!(submitted["status"], "pending_admin_approval");
        }
    }

    #[actix_web::test]
    async fn approve_sends_flattened_order_once() {
        let state = TestState::new();
        let app = app!(state);

        let req = test::TestRequest::post()
            .uri("/api/orders")
            .set_json(draft())
            .to_request();
        let order: Value = test::call_and_read_body_json(&app, req).await;
        let id = order["id"].as_str().unwrap().to_string();

        let req = test::TestRequest::post()
            .uri(&format!("/api/orders/{}/recipients", id))
            .set_json(json!({ "recipients": [recipient("a")] }))
            .to_request();
        test::call_service(&app, req).await;

        let req = test::TestRequest::post()
            .uri(&format!("/api/orders/{}/submit", id))
            .to_request();
        test::call_service(&app, req).await;

        let req = test::TestRequest::post()
            .uri(&format!("/api/orders/{}/approve", id))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status().as_u16(), 401);

        let req = test::TestRequest::post()
            .uri(&format!("/api/orders/{}/approve", id))
            .insert_header(("Authorization", state.admin_bearer()))
            .to_request();
        let approved: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(approved["status"], "submitted_to_pcm");
        assert_eq!(approved["externalReference"], format!("approve-{}", id));
        assert_eq!(approved["pcmOrderId"], format!("pcm-approve-{}", id));
        assert_eq!(approved["pcmResponse"]["status"], "received");

        let calls = state.print.calls();
        assert_eq!(calls.len(), 1);
        let PrintCall::CreateOrder {
            product,
            request,
            idempotency_key,
        } = &calls[0]
        else {
            panic!("expected an order call, got {:?}", calls);
        };
        assert_eq!(*product, ProductType::Postcard);
        assert_eq!(idempotency_key, &format!("approve-{}", id));
        assert_eq!(request.recipients[0].address.address, "12 Analytical St");

        // already submitted, so a second approval fails without another call
        let req = test::TestRequest::post()
            .uri(&format!("/api/orders/{}/approve", id))
            .insert_header(("Authorization", state.admin_bearer()))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status().as_u16(), 400);
        assert_eq!(state.print.calls().len(), 1);
    }

    #[actix_web::test]
    async fn approve_from_other_statuses_leaves_order_unchanged() {
        let state = TestState::new();
        let app = app!(state);
        let orders = state.repository::<Order<ObjectId>>();

        for path in [None, Some("reject")] {
            let req = test::TestRequest::post()
                .uri("/api/orders")
                .set_json(draft())
                .to_request();
            let order: Value = test::call_and_read_body_json(&app, req).await;
            let id = order["id"].as_str().unwrap().to_string();

            if let Some(path) = path {
                let req = test::TestRequest::post()
                    .uri(&format!("/api/orders/{}/{}", id, path))
                    .insert_header(("Authorization", state.admin_bearer()))
                    .to_request();
                test::call_service(&app, req).await;
            }

            let object_id: ObjectId = id.parse().unwrap();
            let before = orders
                .find("id", &mongodb::bson::Bson::ObjectId(object_id))
                .await
                .unwrap();

            let req = test::TestRequest::post()
                .uri(&format!("/api/orders/{}/approve", id))
                .insert_header(("Authorization", state.admin_bearer()))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status().as_u16(), 400);

            let after = orders
                .find("id", &mongodb::bson::Bson::ObjectId(object_id))
                .await
                .unwrap();
            assert_eq!(before, after);
        }
        assert!(state.print.calls().is_empty());
    }

    #[actix_web::test]
    async fn failed_fulfillment_keeps_order_pending() {
        let state = TestState::new();
        let app = app!(state);

        let req = test::TestRequest::post()
            .uri("/api/orders")
            .set_json(draft())
            .to_request();
        let order: Value = test::call_and_read_body_json(&app, req).await;
        let id = order["id"].as_str().unwrap().to_string();

        let req = test::TestRequest::post()
            .uri(&format!("/api/orders/{}/submit", id))
            .to_request();
        test::call_service(&app, req).await;

        state.print.set_failing(true);
        let req = test::TestRequest::post()
            .uri(&format!("/api/orders/{}/approve", id))
            .insert_header(("Authorization", state.admin_bearer()))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status().as_u16(), 500);

        let req = test::TestRequest::get()
            .uri(&format!("/api/orders/{}", id))
            .to_request();
        let stored: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(stored["status"], "pending_admin_approval");
        assert_eq!(stored["pcmOrderId"], Value::Null);
        assert_eq!(stored["externalReference"], Value::Null);
    }

    #[actix_web::test]
    async fn quote_uses_recipient_count() {
        let state = TestState::new();
        let app = app!(state);

        let req = test::TestRequest::post()
            .uri("/api/orders")
            .set_json(draft())
            .to_request();
        let order: Value = test::call_and_read_body_json(&app, req).await;
        let id = order["id"].as_str().unwrap().to_string();

        let req = test::TestRequest::post()
            .uri(&format!("/api/orders/{}/recipients", id))
            .set_json(json!({ "recipients": [recipient("a"), recipient("b"), recipient("c")] }))
            .to_request();
        test::call_service(&app, req).await;

        let req = test::TestRequest::get()
            .uri(&format!("/api/orders/{}/quote", id))
            .to_request();
        let quote: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(quote["quantity"], 3);
        assert_eq!(quote["unitPrice"], 1.14);
        assert_eq!(quote["total"], 3.42);
    }
}
