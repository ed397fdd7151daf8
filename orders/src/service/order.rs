use chrono::Utc;
use common::{
    api::pcm::{PcmOrderRequest, PrintApiObject},
    context::Context,
    entities::{
        address::Recipient,
        order::{
            validate_recipients, DesignType, Order, OrderConfigChange, OrderEvent, OrderStatus,
            Quote,
        },
        price::PriceTable,
        product::{MailClass, ProductType},
    },
    error::{self, AddCode},
    parse_id,
    pricing::{current_table, total_for},
};
use mongodb::bson::{oid::ObjectId, Bson};

pub fn idempotency_key(id: &ObjectId) -> String {
    format!("approve-{}", id.to_hex())
}

pub struct OrderService {
    context: Context,
}

impl OrderService {
    pub fn new(context: Context) -> Self {
        Self { context }
    }

    async fn find_stored(&self, id: &str) -> error::Result<Order<ObjectId>> {
        let orders = self.context.try_get_repository::<Order<ObjectId>>()?;
        let id = parse_id(id, "Order not found")?;

        orders
            .find("id", &Bson::ObjectId(id))
            .await?
            .ok_or_else(|| anyhow::anyhow!("Order not found").code(404))
    }

    async fn save(&self, mut order: Order<ObjectId>) -> error::Result<Order<ObjectId>> {
        let orders = self.context.try_get_repository::<Order<ObjectId>>()?;
        order.updated_at = Utc::now().timestamp_micros();
        orders.update(&order).await?;
        Ok(order)
    }

    async fn apply(&self, id: &str, event: OrderEvent) -> error::Result<Order<ObjectId>> {
        let mut order = self.find_stored(id).await?;
        let Some(next) = order.status.transition(event) else {
            let action = match event {
                OrderEvent::Submit => "submitted",
                OrderEvent::Approve => "approved",
                OrderEvent::Reject => "rejected",
            };
            return Err(anyhow::anyhow!(
                "Order with status {} cannot be {}",
                order.status.as_str(),
                action
            )
            .code(400));
        };
        order.status = next;
        Ok(order)
    }

    pub async fn create_draft(&self, fields: OrderConfigChange) -> error::Result<Order<String>> {
        fields.validate()?;
        let orders = self.context.try_get_repository::<Order<ObjectId>>()?;

        let now = Utc::now().timestamp_micros();
        let mut order = Order {
            id: ObjectId::new(),
            design_type: DesignType::default(),
            design_id: None,
            design_name: None,
            design_size: None,
            product_type: ProductType::default(),
            is_custom_design: false,
            custom_design_url: None,
            mail_class: MailClass::default(),
            mail_date: None,
            brochure_fold: None,
            return_address: None,
            recipients: Vec::new(),
            status: OrderStatus::Draft,
            external_reference: None,
            pcm_order_id: None,
            pcm_response: None,
            payment: None,
            created_at: now,
            updated_at: now,
        };
        fields.apply(&mut order);

        orders.insert(&order).await?;
        log::info!("Draft order {} created", order.id);

        Ok(order.stringify())
    }

    pub async fn find(&self, id: &str) -> error::Result<Order<String>> {
        Ok(self.find_stored(id).await?.stringify())
    }

    /// Used by the payment flow, which records captures on the stored order.
    pub async fn find_for_update(&self, id: &str) -> error::Result<Order<ObjectId>> {
        self.find_stored(id).await
    }

    pub async fn store(&self, order: Order<ObjectId>) -> error::Result<Order<String>> {
        Ok(self.save(order).await?.stringify())
    }

    /// All orders, newest first. `status` narrows the list.
    pub async fn list(&self, status: Option<OrderStatus>) -> error::Result<Vec<Order<String>>> {
        self.context.auth().require_admin()?;

        let orders = self.context.try_get_repository::<Order<ObjectId>>()?;
        let mut result = match status {
            Some(status) => {
                orders
                    .find_many("status", &Bson::String(status.as_str().to_string()))
                    .await?
            }
            None => orders.find_all(0, u32::MAX).await?,
        };
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(result.into_iter().map(Order::stringify).collect())
    }

    pub async fn update_config(
        &self,
        id: &str,
        change: OrderConfigChange,
    ) -> error::Result<Order<String>> {
        change.validate()?;
        let mut order = self.find_stored(id).await?;
        change.apply(&mut order);
        Ok(self.save(order).await?.stringify())
    }

    /// Validates every recipient before appending any of them. No dedup.
    pub async fn append_recipients(
        &self,
        id: &str,
        recipients: Vec<Recipient>,
    ) -> error::Result<Order<String>> {
        validate_recipients(&recipients)?;

        let mut order = self.find_stored(id).await?;
        order.recipients.extend(recipients);
        Ok(self.save(order).await?.stringify())
    }

    pub async fn submit(&self, id: &str) -> error::Result<Order<String>> {
        let order = self.apply(id, OrderEvent::Submit).await?;
        let order = self.save(order).await?;
        log::info!("Order {} submitted for approval", order.id);
        Ok(order.stringify())
    }

    /// Forwards a pending order to the print provider. Nothing is stored unless PCM accepts it.
    pub async fn approve(&self, id: &str) -> error::Result<Order<String>> {
        self.context.auth().require_admin()?;

        let mut order = self.apply(id, OrderEvent::Approve).await?;

        let key = idempotency_key(&order.id);
        let request = PcmOrderRequest::from_order(&order, &key);

        let print = self.context.try_get_manual::<PrintApiObject>()?;
        let response = print
            .create_order(order.product_type, &request, &key)
            .await
            .map_err(|e| {
                log::warn!("PCM rejected order {}: {:#}", order.id, e.inner());
                e
            })?;

        if order.external_reference.is_none() {
            order.external_reference = Some(request.ext_ref_nbr);
        }
        order.pcm_order_id = response.order_id;
        order.pcm_response = Some(response.raw);

        let order = self.save(order).await?;
        log::info!(
            "Order {} approved and sent to PCM as {}",
            order.id,
            order.pcm_order_id.as_deref().unwrap_or("unknown")
        );
        Ok(order.stringify())
    }

    pub async fn reject(&self, id: &str) -> error::Result<Order<String>> {
        self.context.auth().require_admin()?;

        let order = self.apply(id, OrderEvent::Reject).await?;
        let order = self.save(order).await?;
        log::info!("Order {} rejected", order.id);
        Ok(order.stringify())
    }

    pub async fn quote(&self, id: &str) -> error::Result<Quote> {
        let order = self.find_stored(id).await?;

        let prices = self.context.try_get_repository::<PriceTable<ObjectId>>()?;
        let (table, _) = current_table(&prices).await?;

        let size = order.design_size.clone().unwrap_or_default();
        let quantity = order.recipients.len() as u32;
        let unit_price = table.price_for(order.product_type, &size, order.mail_class, quantity);

        Ok(Quote {
            order_id: order.id.to_hex(),
            product_type: order.product_type,
            size,
            mail_class: order.mail_class,
            quantity,
            unit_price,
            total: total_for(unit_price, quantity),
        })
    }
}
