use common::entities::{
    admin_user::PublicAdmin,
    order::{Order, OrderStatus},
};

use crate::api::{ApiClient, ApiError};

/// Admin session and the order list it manages.
pub struct AdminStore {
    api: ApiClient,
    user: Option<PublicAdmin>,
    orders: Vec<Order<String>>,
    filter: Option<OrderStatus>,
}

impl AdminStore {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            user: None,
            orders: Vec::new(),
            filter: None,
        }
    }

    pub fn user(&self) -> Option<&PublicAdmin> {
        self.user.as_ref()
    }

    pub fn is_logged_in(&self) -> bool {
        self.api.token().is_some()
    }

    pub fn orders(&self) -> &[Order<String>] {
        &self.orders
    }

    pub fn pending(&self) -> usize {
        self.orders
            .iter()
            .filter(|o| o.status == OrderStatus::PendingAdminApproval)
            .count()
    }

    pub async fn login(&mut self, username: &str, password: &str) -> anyhow::Result<&PublicAdmin> {
        let token = self.api.login(username, password).await?;
        log::info!("Logged in as {}", token.user.username);
        Ok(self.user.insert(token.user))
    }

    /// Resumes a session from a stored token.
    pub async fn restore(&mut self, token: String) -> anyhow::Result<&PublicAdmin> {
        self.api.set_token(Some(token));
        let user = self.api.me().await;
        let user = self.guard(user)?;
        Ok(self.user.insert(user))
    }

    pub fn logout(&mut self) {
        self.api.set_token(None);
        self.user = None;
        self.orders.clear();
    }

    /// Drops the session when the backend no longer accepts the token.
    fn guard<T>(&mut self, result: anyhow::Result<T>) -> anyhow::Result<T> {
        if let Err(err) = &result {
            if ApiError::is_unauthorized(err) {
                log::warn!("Admin session expired");
                self.logout();
            }
        }
        result
    }

    pub async fn load_orders(
        &mut self,
        filter: Option<OrderStatus>,
    ) -> anyhow::Result<&[Order<String>]> {
        let orders = self.api.admin_orders(filter).await;
        self.orders = self.guard(orders)?;
        self.filter = filter;
        Ok(&self.orders)
    }

    fn replace(&mut self, order: Order<String>) {
        let keep = self.filter.map_or(true, |status| status == order.status);
        match self.orders.iter().position(|o| o.id == order.id) {
            Some(idx) if keep => self.orders[idx] = order,
            Some(idx) => {
                self.orders.remove(idx);
            }
            None if keep => self.orders.insert(0, order),
            None => {}
        }
    }

    pub async fn approve(&mut self, id: &str) -> anyhow::Result<Order<String>> {
        let order = self.api.approve(id).await;
        let order = self.guard(order)?;
        self.replace(order.clone());
        Ok(order)
    }

    pub async fn reject(&mut self, id: &str) -> anyhow::Result<Order<String>> {
        let order = self.api.reject(id).await;
        let order = self.guard(order)?;
        self.replace(order.clone());
        Ok(order)
    }
}
