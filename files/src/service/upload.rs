use std::path::PathBuf;

use actix_multipart::Multipart;
use actix_web::web;
use common::{
    context::Context,
    entities::upload::Upload,
    error::{self, AddCode},
};
use futures_util::StreamExt;
use mongodb::bson::oid::ObjectId;

pub const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Lowercased alphanumeric extension of `filename`, if it has one.
fn extension(filename: &str) -> Option<String> {
    let (_, ext) = filename.rsplit_once('.')?;
    let ext: String = ext
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect();
    (!ext.is_empty()).then_some(ext)
}

pub struct UploadService {
    context: Context,
}

impl UploadService {
    pub fn new(context: Context) -> Self {
        Self { context }
    }

    pub async fn store_letter(&self, mut payload: Multipart) -> error::Result<Upload> {
        let mut content: Vec<u8> = Vec::new();
        let mut original_name = None;
        let mut found = false;

        while let Some(item) = payload.next().await {
            let mut field =
                item.map_err(|e| anyhow::anyhow!("Invalid multipart payload: {}", e).code(400))?;

            if field.name() != "file" {
                continue;
            }
            if found {
                return Err(anyhow::anyhow!("Only one file can be uploaded at a time").code(400));
            }
            found = true;
            original_name = field
                .content_disposition()
                .get_filename()
                .map(str::to_string);

            while let Some(chunk) = field.next().await {
                let data =
                    chunk.map_err(|e| anyhow::anyhow!("Upload interrupted: {}", e).code(400))?;
                if content.len() + data.len() > MAX_UPLOAD_BYTES {
                    return Err(anyhow::anyhow!("File exceeds the 20 MB limit").code(400));
                }
                content.extend_from_slice(&data);
            }
        }

        if !found {
            return Err(anyhow::anyhow!("'file' field is required").code(400));
        }

        let filename = match original_name.as_deref().and_then(extension) {
            Some(ext) => format!("{}.{}", ObjectId::new().to_hex(), ext),
            None => ObjectId::new().to_hex(),
        };

        let config = self.context.config();
        let dir = PathBuf::from(&config.upload_dir);
        let path = dir.join(&filename);
        let size = content.len();

        web::block(move || -> std::io::Result<()> {
            std::fs::create_dir_all(&dir)?;
            std::fs::write(path, content)
        })
        .await??;

        log::info!("Stored upload {} ({} bytes)", filename, size);

        Ok(Upload {
            url: format!(
                "{}/uploads/{}",
                config.public_url.trim_end_matches('/'),
                filename
            ),
            filename,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::extension;

    #[test]
    fn extensions_are_cleaned() {
        assert_eq!(extension("letter.PDF").as_deref(), Some("pdf"));
        assert_eq!(extension("a.b.docx").as_deref(), Some("docx"));
        assert_eq!(extension("scan.p d-f").as_deref(), Some("pdf"));
        assert_eq!(extension("README"), None);
        assert_eq!(extension("trailing."), None);
    }
}
