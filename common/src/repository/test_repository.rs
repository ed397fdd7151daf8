use std::sync::Mutex;

use async_trait::async_trait;
use mongodb::bson::{self, oid::ObjectId, Bson, Document};
use serde::{de::DeserializeOwned, Serialize};

use crate::error;

use super::{Entity, Repository};

pub struct TestRepository<T> {
    _t: std::marker::PhantomData<T>,
    pub db: Mutex<Vec<Document>>,
}

impl<T> TestRepository<T> {
    pub fn new() -> Self {
        Self {
            _t: std::marker::PhantomData,
            db: Mutex::new(Vec::new()),
        }
    }
}

impl<T> Default for TestRepository<T> {
    fn default() -> Self {
        Self::new()
    }
}

fn matches(document: &Document, field: &str, value: &Bson) -> bool {
    document.get(field) == Some(value)
}

#[async_trait]
impl<T> Repository<T> for TestRepository<T>
where
    T: Entity + Serialize + DeserializeOwned + Send + Sync,
{
    async fn insert(&self, item: &T) -> error::Result<bool> {
        let document = bson::to_document(item)?;
        let mut db = self.db.lock().unwrap();

        let id = Bson::ObjectId(item.id());
        let contains = db.iter().any(|x| matches(x, "id", &id));
        if !contains {
            db.push(document);
        }
        Ok(!contains)
    }

    async fn find(&self, field: &str, value: &Bson) -> error::Result<Option<T>> {
        let db = self.db.lock().unwrap();
        let found = db.iter().find(|x| matches(x, field, value)).cloned();
        Ok(found.map(bson::from_document).transpose()?)
    }

    async fn find_many(&self, field: &str, value: &Bson) -> error::Result<Vec<T>> {
        let db = self.db.lock().unwrap();
        Ok(db
            .iter()
            .filter(|x| matches(x, field, value))
            .cloned()
            .map(bson::from_document)
            .collect::<Result<_, _>>()?)
    }

    async fn find_all(&self, skip: u32, limit: u32) -> error::Result<Vec<T>> {
        let db = self.db.lock().unwrap();
        Ok(db
            .iter()
            .skip(skip as usize)
            .take(limit as usize)
            .cloned()
            .map(bson::from_document)
            .collect::<Result<_, _>>()?)
    }

    async fn update(&self, item: &T) -> error::Result<bool> {
        let document = bson::to_document(item)?;
        let mut db = self.db.lock().unwrap();

        let id = Bson::ObjectId(item.id());
        let Some(slot) = db.iter_mut().find(|x| matches(x, "id", &id)) else {
            return Ok(false);
        };
        *slot = document;
        Ok(true)
    }

    async fn delete(&self, field: &str, id: &ObjectId) -> error::Result<Option<T>> {
        let mut db = self.db.lock().unwrap();
        let value = Bson::ObjectId(*id);
        let Some(pos) = db.iter().position(|x| matches(x, field, &value)) else {
            return Ok(None);
        };
        Ok(Some(bson::from_document(db.remove(pos))?))
    }
}
