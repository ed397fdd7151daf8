use common::{
    api::pcm::{
        AddressingPreferences, PcmAddress, PcmRecipient, PrintApiObject, ProofKind, ProofRequest,
        ProofUrls,
    },
    context::Context,
    entities::{
        address::Recipient,
        template::{ProofInput, Template},
    },
    error::{self, AddCode, WithMessage},
    parse_id,
};
use mongodb::bson::{oid::ObjectId, Bson};
use serde_json::Value;

pub struct ProofService {
    context: Context,
}

impl ProofService {
    pub fn new(context: Context) -> Self {
        Self { context }
    }

    async fn design_id(&self, template_id: &str) -> error::Result<String> {
        let templates = self.context.try_get_repository::<Template<ObjectId>>()?;
        let id = parse_id(template_id, "Template not found")?;

        match templates.find("id", &Bson::ObjectId(id)).await? {
            Some(template) if !template.deleted => Ok(template.external_design_id),
            _ => Err(anyhow::anyhow!("Template not found").code(404)),
        }
    }

    fn recipient(value: Value) -> error::Result<PcmRecipient> {
        let recipient: Recipient = serde_json::from_value(value)
            .map_err(|e| anyhow::anyhow!("Invalid proof recipient: {}", e).code(400))?;
        recipient
            .validate()
            .map_err(|e| anyhow::anyhow!("Invalid proof recipient: {}", e).code(400))?;
        Ok(PcmRecipient::from(&recipient))
    }

    pub async fn generate(&self, kind: ProofKind, input: ProofInput) -> error::Result<ProofUrls> {
        let design_id = match &input.template_id {
            Some(template_id) => Some(self.design_id(template_id).await?),
            None => None,
        };

        let has_design = match kind {
            ProofKind::Postcard => design_id.is_some() || input.front.is_some(),
            ProofKind::Letter => design_id.is_some() || input.letter.is_some(),
        };
        if !has_design {
            return Err(anyhow::anyhow!("Proof needs a templateId or an inline design").code(400));
        }

        let request = ProofRequest {
            size: input.size,
            proof_format: input.format,
            mail_class: input.mail_class,
            design_id,
            front: input.front,
            back: input.back,
            letter: input.letter,
            addressing: AddressingPreferences::default(),
            recipient: Self::recipient(input.recipient)?,
            return_address: input.return_address.as_ref().map(PcmAddress::from),
        };

        let print = self.context.try_get_manual::<PrintApiObject>()?;
        print
            .generate_proof(kind, &request)
            .await
            .map_err(|e| {
                log::warn!("Proof generation failed: {:#}", e.inner());
                e
            })
            .with_message("Proof generation failed")
    }
}
