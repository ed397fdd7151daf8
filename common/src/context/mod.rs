use std::sync::Arc;

use actix_web::{dev::Payload, web::Data, FromRequest, HttpRequest};
use anyhow::anyhow;
use type_map::concurrent::TypeMap;

use crate::{
    auth::Auth,
    config::Config,
    error::{self, AddCode, ServiceError},
    repository::RepositoryObject,
};

pub mod test_context;

pub struct ServiceState {
    pub repositories: TypeMap,
    pub client: reqwest::Client,
    pub config: Config,
}

impl ServiceState {
    pub fn new(config: Config) -> Self {
        Self {
            repositories: TypeMap::new(),
            client: reqwest::Client::new(),
            config,
        }
    }

    pub fn insert<T: 'static>(&mut self, repository: RepositoryObject<T>) {
        self.repositories.insert(repository);
    }

    pub fn insert_manual<T: Send + Sync + 'static>(&mut self, value: T) {
        self.repositories.insert(value);
    }
}

#[derive(Clone)]
pub struct HandlerContext {
    pub user_auth: Auth,
}

#[derive(Clone)]
pub struct Context(pub Arc<ServiceState>, pub HandlerContext);

impl FromRequest for Context {
    type Error = ServiceError;

    type Future = futures_util::future::LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        fn from_request_inner(req: &HttpRequest, _payload: &mut Payload) -> error::Result<Context> {
            let Some(state) = req.app_data::<Data<Arc<ServiceState>>>() else {
                return Err(anyhow!("No state provided").code(500));
            };

            let token = req
                .headers()
                .get("Authorization")
                .and_then(|x| x.to_str().ok())
                .and_then(|x| x.strip_prefix("Bearer ")); // remove prefix

            let user_auth = match token {
                Some(token) => Auth::from_token(token, &state.config.jwt)?,
                None => Auth::None,
            };

            Ok(Context(state.get_ref().clone(), HandlerContext { user_auth }))
        }
        let result = from_request_inner(req, payload);

        Box::pin(async move { result })
    }
}

impl Context {
    pub fn auth(&self) -> &Auth {
        &self.1.user_auth
    }

    pub fn config(&self) -> &Config {
        &self.0.config
    }

    pub fn try_get_repository<T: 'static>(&self) -> error::Result<RepositoryObject<T>> {
        self.0
            .repositories
            .get::<RepositoryObject<T>>()
            .cloned()
            .ok_or(
                anyhow!(
                    "Repository for type {} not found",
                    std::any::type_name::<T>()
                )
                .code(500),
            )
    }

    pub fn try_get_manual<T: 'static + Clone>(&self) -> error::Result<T> {
        self.0.repositories.get::<T>().cloned().ok_or(
            anyhow!("State for type {} not found", std::any::type_name::<T>()).code(500),
        )
    }
}
