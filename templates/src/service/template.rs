use chrono::Utc;
use common::{
    api::pcm::{EditorMode, PrintApiObject},
    context::Context,
    entities::{
        product::ProductType,
        template::{DesignSummary, Template},
    },
    error::{self, AddCode},
    parse_id,
};
use mongodb::bson::{oid::ObjectId, Bson};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTemplate {
    pub external_design_id: String,
    pub name: String,
    pub size: Option<String>,
    pub preview_url: Option<String>,
    pub is_public: Option<bool>,
    pub allow_personalize: Option<bool>,
    #[serde(rename = "type")]
    pub product_type: Option<ProductType>,
    pub raw_data: Option<Value>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateChange {
    pub external_design_id: Option<String>,
    pub name: Option<String>,
    pub size: Option<String>,
    pub preview_url: Option<String>,
    pub is_public: Option<bool>,
    pub allow_personalize: Option<bool>,
    #[serde(rename = "type")]
    pub product_type: Option<ProductType>,
    pub raw_data: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditorLink {
    pub url: String,
}

pub struct TemplateService {
    context: Context,
}

impl TemplateService {
    pub fn new(context: Context) -> Self {
        Self { context }
    }

    async fn find_stored(&self, id: &str) -> error::Result<Template<ObjectId>> {
        let templates = self.context.try_get_repository::<Template<ObjectId>>()?;
        let id = parse_id(id, "Template not found")?;

        templates
            .find("id", &Bson::ObjectId(id))
            .await?
            .ok_or_else(|| anyhow::anyhow!("Template not found").code(404))
    }

    async fn ensure_unique(&self, external_design_id: &str) -> error::Result<()> {
        let templates = self.context.try_get_repository::<Template<ObjectId>>()?;

        let existing = templates
            .find(
                "externalDesignId",
                &Bson::String(external_design_id.to_string()),
            )
            .await?;

        if existing.is_some() {
            return Err(anyhow::anyhow!(
                "Template for design {} already exists",
                external_design_id
            )
            .code(400));
        }
        Ok(())
    }

    async fn store(&self, template: Template<ObjectId>) -> error::Result<Template<String>> {
        let templates = self.context.try_get_repository::<Template<ObjectId>>()?;
        templates.insert(&template).await?;
        log::info!(
            "Template {} created for design {}",
            template.id,
            template.external_design_id
        );
        Ok(template.stringify())
    }

    async fn save(&self, mut template: Template<ObjectId>) -> error::Result<Template<String>> {
        let templates = self.context.try_get_repository::<Template<ObjectId>>()?;
        template.updated_at = Utc::now().timestamp_micros();
        templates.update(&template).await?;
        Ok(template.stringify())
    }

    pub async fn create(&self, template: CreateTemplate) -> error::Result<Template<String>> {
        self.context.auth().require_admin()?;

        if template.external_design_id.trim().is_empty() {
            return Err(anyhow::anyhow!("externalDesignId is required").code(400));
        }
        self.ensure_unique(&template.external_design_id).await?;

        let now = Utc::now().timestamp_micros();
        self.store(Template {
            id: ObjectId::new(),
            external_design_id: template.external_design_id,
            name: template.name,
            size: template.size.unwrap_or_default(),
            preview_url: template.preview_url,
            is_public: template.is_public.unwrap_or(false),
            allow_personalize: template.allow_personalize.unwrap_or(false),
            product_type: template.product_type.unwrap_or_default(),
            raw_data: template.raw_data,
            deleted: false,
            created_at: now,
            updated_at: now,
        })
        .await
    }

    pub async fn create_from_external(&self, payload: Value) -> error::Result<Template<String>> {
        self.context.auth().require_admin()?;

        let Some(summary) = DesignSummary::extract(&payload) else {
            return Err(anyhow::anyhow!("Design payload has no design id").code(400));
        };
        self.ensure_unique(&summary.design_id).await?;

        let now = Utc::now().timestamp_micros();
        self.store(Template {
            id: ObjectId::new(),
            external_design_id: summary.design_id,
            name: summary.name,
            size: summary.size,
            preview_url: summary.preview_url,
            is_public: false,
            allow_personalize: false,
            product_type: summary.product_type,
            raw_data: Some(payload),
            deleted: false,
            created_at: now,
            updated_at: now,
        })
        .await
    }

    /// Every live template, newest first.
    pub async fn list(&self) -> error::Result<Vec<Template<String>>> {
        self.context.auth().require_admin()?;

        let templates = self.context.try_get_repository::<Template<ObjectId>>()?;
        let mut result = templates
            .find_many("deleted", &Bson::Boolean(false))
            .await?;
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(result.into_iter().map(Template::stringify).collect())
    }

    pub async fn list_public(&self) -> error::Result<Vec<Template<String>>> {
        let templates = self.context.try_get_repository::<Template<ObjectId>>()?;
        let mut result: Vec<_> = templates
            .find_many("isPublic", &Bson::Boolean(true))
            .await?
            .into_iter()
            .filter(|t| !t.deleted)
            .collect();
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(result.into_iter().map(Template::stringify).collect())
    }

    /// Soft-deleted templates are still returned here.
    pub async fn find(&self, id: &str) -> error::Result<Template<String>> {
        Ok(self.find_stored(id).await?.stringify())
    }

    pub async fn change(&self, id: &str, change: TemplateChange) -> error::Result<Template<String>> {
        self.context.auth().require_admin()?;
        let mut template = self.find_stored(id).await?;

        if let Some(external_design_id) = change.external_design_id {
            if external_design_id != template.external_design_id {
                self.ensure_unique(&external_design_id).await?;
                template.external_design_id = external_design_id;
            }
        }
        if let Some(name) = change.name {
            template.name = name;
        }
        if let Some(size) = change.size {
            template.size = size;
        }
        if let Some(preview_url) = change.preview_url {
            template.preview_url = Some(preview_url);
        }
        if let Some(is_public) = change.is_public {
            template.is_public = is_public;
        }
        if let Some(allow_personalize) = change.allow_personalize {
            template.allow_personalize = allow_personalize;
        }
        if let Some(product_type) = change.product_type {
            template.product_type = product_type;
        }
        if let Some(raw_data) = change.raw_data {
            template.raw_data = Some(raw_data);
        }

        self.save(template).await
    }

    pub async fn set_public(&self, id: &str, value: Option<bool>) -> error::Result<Template<String>> {
        self.context.auth().require_admin()?;
        let mut template = self.find_stored(id).await?;
        template.is_public = value.unwrap_or(!template.is_public);
        self.save(template).await
    }

    pub async fn set_personalize(
        &self,
        id: &str,
        value: Option<bool>,
    ) -> error::Result<Template<String>> {
        self.context.auth().require_admin()?;
        let mut template = self.find_stored(id).await?;
        template.allow_personalize = value.unwrap_or(!template.allow_personalize);
        self.save(template).await
    }

    pub async fn set_type(
        &self,
        id: &str,
        product_type: ProductType,
    ) -> error::Result<Template<String>> {
        self.context.auth().require_admin()?;
        let mut template = self.find_stored(id).await?;
        template.product_type = product_type;
        self.save(template).await
    }

    pub async fn soft_delete(&self, id: &str) -> error::Result<Template<String>> {
        self.context.auth().require_admin()?;
        let mut template = self.find_stored(id).await?;
        template.deleted = true;
        log::info!("Template {} deleted", template.id);
        self.save(template).await
    }

    pub async fn restore(&self, id: &str) -> error::Result<Template<String>> {
        self.context.auth().require_admin()?;
        let mut template = self.find_stored(id).await?;
        template.deleted = false;
        self.save(template).await
    }

    /// Removes the design at the print provider first, then the local record.
    pub async fn delete_external(&self, id: &str) -> error::Result<Template<String>> {
        self.context.auth().require_admin()?;
        let template = self.find_stored(id).await?;

        let print = self.context.try_get_manual::<PrintApiObject>()?;
        print.delete_design(&template.external_design_id).await?;

        let templates = self.context.try_get_repository::<Template<ObjectId>>()?;
        templates.delete("id", &template.id).await?;

        log::info!(
            "Template {} and design {} removed",
            template.id,
            template.external_design_id
        );
        Ok(template.stringify())
    }

    pub async fn editor(&self, id: &str, mode: EditorMode) -> error::Result<EditorLink> {
        let template = self.find_stored(id).await?;

        match mode {
            EditorMode::Admin => {
                self.context.auth().require_admin()?;
            }
            EditorMode::Personalize => {
                if template.deleted {
                    return Err(anyhow::anyhow!("Template not found").code(404));
                }
                if !template.allow_personalize {
                    return Err(
                        anyhow::anyhow!("Template does not allow personalization").code(400)
                    );
                }
            }
        }

        let print = self.context.try_get_manual::<PrintApiObject>()?;
        let url = print
            .editor_url(&template.external_design_id, mode)
            .await?;

        Ok(EditorLink { url })
    }
}
