use actix_web::{
    post,
    web::{self, Json},
};
use common::{context::Context, entities::order::Order, error};

use crate::service::paypal::{Checkout, PaymentTarget, PaypalService};

#[post("/api/payments/paypal/orders")]
pub async fn create_paypal_order(
    context: Context,
    Json(target): web::Json<PaymentTarget>,
) -> error::Result<Json<Checkout>> {
    Ok(Json(PaypalService::new(context).create_checkout(target).await?))
}

#[post("/api/payments/paypal/orders/{id}/capture")]
pub async fn capture_paypal_order(
    context: Context,
    id: web::Path<String>,
    Json(target): web::Json<PaymentTarget>,
) -> error::Result<Json<Order<String>>> {
    Ok(Json(
        PaypalService::new(context).capture(&id, target).await?,
    ))
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
    async fn checkout_and_capture_record_payment() {
        let state = TestState::new();
        let app = init_service(
            App::new()
                .app_data(Data::new(state.state.clone()))
                .configure(orders::configure)
                .configure(crate::configure),
        )
        .await;

        let recipient = json!({
            "firstName": "Ada",
            "lastName": "Lovelace",
            "address1": "12 Analytical St",
            "city": "Clearwater",
            "state": "FL",
            "zipCode": "33755"
        });
        let req = test::TestRequest::post()
            .uri("/api/orders")
            .set_json(json!({
                "designSize": "68",
                "mailClass": "Standard",
                "recipients": [recipient.clone(), recipient]
            }))
            .to_request();
        let order: Value = test::call_and_read_body_json(&app, req).await;
        let order_id = order["id"].as_str().unwrap().to_string();

        let req = test::TestRequest::post()
            .uri("/api/payments/paypal/orders")
            .set_json(json!({ "orderId": order_id }))
            .to_request();
        let checkout: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(checkout["id"], "PAYPAL-1");
        assert_eq!(checkout["amount"], 2.28);
        assert_eq!(checkout["approveUrl"], "https://paypal.test/approve/PAYPAL-1");

        let req = test::TestRequest::post()
            .uri("/api/payments/paypal/orders/PAYPAL-1/capture")
            .set_json(json!({ "orderId": order_id }))
            .to_request();
        let captured: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(captured["payment"]["provider"], "paypal");
        assert_eq!(captured["payment"]["paypalOrderId"], "PAYPAL-1");
        assert_eq!(captured["payment"]["status"], "COMPLETED");
        assert_eq!(captured["payment"]["amount"], 2.28);
        assert_eq!(captured["status"], "draft");
    }

    #[actix_web::test]
    async fn capture_for_another_order_is_rejected() {
        let state = TestState::new();
        let app = init_service(
            App::new()
                .app_data(Data::new(state.state.clone()))
                .configure(orders::configure)
                .configure(crate::configure),
        )
        .await;

        let recipient = json!({
            "firstName": "Ada",
            "lastName": "Lovelace",
            "address1": "12 Analytical St",
            "city": "Clearwater",
            "state": "FL",
            "zipCode": "33755"
        });
        let mut ids = Vec::new();
        for _ in 0..2 {
            let req = test::TestRequest::post()
                .uri("/api/orders")
                .set_json(json!({ "designSize": "68", "recipients": [recipient.clone()] }))
                .to_request();
            let order: Value = test::call_and_read_body_json(&app, req).await;
            ids.push(order["id"].as_str().unwrap().to_string());
        }

        let req = test::TestRequest::post()
            .uri("/api/payments/paypal/orders")
            .set_json(json!({ "orderId": ids[0] }))
            .to_request();
        let checkout: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(checkout["id"], "PAYPAL-1");

        let req = test::TestRequest::post()
            .uri("/api/payments/paypal/orders/PAYPAL-1/capture")
            .set_json(json!({ "orderId": ids[1] }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status().as_u16(), 400);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Payment does not belong to this order");

        let req = test::TestRequest::get()
            .uri(&format!("/api/orders/{}", ids[1]))
            .to_request();
        let other: Value = test::call_and_read_body_json(&app, req).await;
        assert!(other["payment"].is_null());
    }

    #[actix_web::test]
    async fn empty_order_cannot_be_paid() {
        let state = TestState::new();
        let app = init_service(
            App::new()
                .app_data(Data::new(state.state.clone()))
                .configure(orders::configure)
                .configure(crate::configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/orders")
            .set_json(json!({ "designSize": "68" }))
            .to_request();
        let order: Value = test::call_and_read_body_json(&app, req).await;

        let req = test::TestRequest::post()
            .uri("/api/payments/paypal/orders")
            .set_json(json!({ "orderId": order["id"] }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status().as_u16(), 400);
    }
}
