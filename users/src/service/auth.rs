use chrono::Utc;
use common::{
    auth::{Auth, Identity},
    context::Context,
    entities::admin_user::{AdminUser, Login, PublicAdmin, Token},
    error::{self, AddCode},
};
use mongodb::bson::{oid::ObjectId, Bson};
use rand::{distributions::Alphanumeric, Rng};

/// Same answer for an unknown user and a wrong password.
const INVALID_CREDENTIALS: &str = "Invalid username or password";

pub fn hash_password(password: &str, salt: &str) -> String {
    sha256::digest(format!("{}{}", password, salt))
}

pub fn new_admin(username: String, password: &str, role: String) -> AdminUser {
    let salt: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect();

    AdminUser {
        id: ObjectId::new(),
        username,
        password: hash_password(password, &salt),
        salt,
        role,
        created_at: Utc::now().timestamp_micros(),
    }
}

pub struct AuthService {
    context: Context,
}

impl AuthService {
    pub fn new(context: Context) -> Self {
        Self { context }
    }

    pub async fn login(&self, login: &Login) -> error::Result<Token> {
        let admins = self.context.try_get_repository::<AdminUser>()?;

        let Some(admin) = admins
            .find("username", &Bson::String(login.username.clone()))
            .await?
        else {
            log::info!("Login attempt for unknown admin {}", login.username);
            return Err(anyhow::anyhow!(INVALID_CREDENTIALS).code(401));
        };

        if hash_password(&login.password, &admin.salt) != admin.password {
            log::info!("Wrong password for admin {}", login.username);
            return Err(anyhow::anyhow!(INVALID_CREDENTIALS).code(401));
        }

        let identity = Identity {
            id: admin.id,
            username: admin.username,
            role: admin.role,
        };
        let user = PublicAdmin::from(&identity);
        let token = Auth::Admin(identity).to_token(&self.context.config().jwt)?;

        Ok(Token { token, user })
    }

    pub fn me(&self) -> error::Result<PublicAdmin> {
        let identity = self.context.auth().require_admin()?;
        Ok(identity.into())
    }
}
