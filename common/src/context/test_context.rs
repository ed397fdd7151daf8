use std::sync::Arc;

use mongodb::bson::oid::ObjectId;

use crate::{
    api::{
        paypal::PaymentApiObject, pcm::PrintApiObject, test_payment_api::TestPaymentApi,
        test_print_api::TestPrintApi,
    },
    auth::{Auth, Identity},
    config::Config,
    entities::{admin_user::AdminUser, order::Order, price::PriceTable, template::Template},
    repository::{test_repository::TestRepository, RepositoryObject},
};

use super::ServiceState;

/// State backed by in-memory repositories and recording API doubles.
pub struct TestState {
    pub state: Arc<ServiceState>,
    pub print: Arc<TestPrintApi>,
    pub payments: Arc<TestPaymentApi>,
}

impl TestState {
    pub fn new() -> Self {
        let print = Arc::new(TestPrintApi::new());
        let payments = Arc::new(TestPaymentApi::new());

        let mut state = ServiceState::new(Config::test());
        state.insert::<Order<ObjectId>>(Arc::new(TestRepository::<Order<ObjectId>>::new()));
        state.insert::<Template<ObjectId>>(Arc::new(TestRepository::<Template<ObjectId>>::new()));
        state.insert::<PriceTable<ObjectId>>(Arc::new(TestRepository::<PriceTable<ObjectId>>::new()));
        state.insert::<AdminUser>(Arc::new(TestRepository::<AdminUser>::new()));
        state.insert_manual::<PrintApiObject>(print.clone());
        state.insert_manual::<PaymentApiObject>(payments.clone());

        Self {
            state: Arc::new(state),
            print,
            payments,
        }
    }

    pub fn repository<T: 'static>(&self) -> RepositoryObject<T> {
        self.state
            .repositories
            .get::<RepositoryObject<T>>()
            .cloned()
            .unwrap()
    }

    pub fn admin(&self) -> Auth {
        Auth::Admin(Identity {
            id: ObjectId::new(),
            username: "admin".to_string(),
            role: "admin".to_string(),
        })
    }

    /// Bearer header value for an admin signed with the test secret.
    pub fn admin_bearer(&self) -> String {
        let token = self.admin().to_token(&self.state.config.jwt).unwrap();
        format!("Bearer {}", token)
    }
}

impl Default for TestState {
    fn default() -> Self {
        Self::new()
    }
}
