//! Typed adapters over the REST collections.
//!
//! Each adapter builds a [`RequestDescriptor`], dispatches it through the
//! client and decodes the envelope's payload. Envelope metadata (status,
//! headers, timing, error message) is carried over unchanged.

use crate::descriptor::{MediaUpload, RequestDescriptor};
use crate::{Client, Error, ResponseEnvelope, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::marker::PhantomData;

/// One REST collection, e.g. `/posts`.
///
/// Reads are anonymous; writes require authorization.
#[derive(Debug)]
pub struct Resource<'a, T> {
    client: &'a Client,
    path: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<'a, T> Resource<'a, T>
where
    T: DeserializeOwned,
{
    pub(crate) fn new(client: &'a Client, path: &'static str) -> Self {
        Self {
            client,
            path,
            _marker: PhantomData,
        }
    }

    /// Lists items, passing `query` through as query parameters.
    ///
    /// # Errors
    ///
    /// [`Error::Decode`] if any element does not decode into `T`.
    pub async fn list(&self, query: &[(&str, &str)]) -> Result<ResponseEnvelope<Vec<T>>> {
        let descriptor = RequestDescriptor::builder()
            .get(self.path)
            .query_params(query.iter().map(|(k, v)| (k.to_string(), v.to_string())))
            .build()?;
        self.client.fetch(&descriptor).await
    }

    /// Fetches one item by id.
    pub async fn get(&self, id: u64) -> Result<ResponseEnvelope<T>> {
        let descriptor = RequestDescriptor::builder()
            .get(format!("{}/{}", self.path, id))
            .build()?;
        self.client.fetch(&descriptor).await
    }

    /// Creates an item from the fields of `body`.
    pub async fn create<B>(&self, body: &B) -> Result<ResponseEnvelope<T>>
    where
        B: Serialize,
    {
        let descriptor = RequestDescriptor::builder()
            .post(self.path)
            .form(form_fields(body)?)
            .requires_authorization(true)
            .build()?;
        self.client.fetch(&descriptor).await
    }

    /// Updates an item with the fields of `body`.
    pub async fn update<B>(&self, id: u64, body: &B) -> Result<ResponseEnvelope<T>>
    where
        B: Serialize,
    {
        let descriptor = RequestDescriptor::builder()
            .post(format!("{}/{}", self.path, id))
            .form(form_fields(body)?)
            .requires_authorization(true)
            .build()?;
        self.client.fetch(&descriptor).await
    }

    /// Deletes an item. Without `force`, trashable items go to the trash.
    ///
    /// The payload shape differs between trashing and deleting, so it is
    /// returned as raw JSON.
    pub async fn delete(&self, id: u64, force: bool) -> Result<ResponseEnvelope<Value>> {
        let mut builder = RequestDescriptor::builder()
            .delete(format!("{}/{}", self.path, id))
            .requires_authorization(true);
        if force {
            builder = builder.query("force", "true");
        }
        self.client.fetch(&builder.build()?).await
    }
}

impl Resource<'_, crate::models::Media> {
    /// Uploads one file to the media library.
    pub async fn upload(&self, upload: MediaUpload) -> Result<ResponseEnvelope<crate::models::Media>> {
        let descriptor = RequestDescriptor::builder()
            .post(self.path)
            .media(upload)
            .requires_authorization(true)
            .build()?;
        self.client.fetch(&descriptor).await
    }
}

/// Flattens a serializable struct into form fields.
///
/// Arrays become repeated `key[]` fields and nested objects `key[sub]`
/// fields; `null` values are left out.
///
/// # Errors
///
/// [`Error::Construction`] unless `body` serializes to a JSON object.
pub fn form_fields<B>(body: &B) -> Result<Vec<(String, String)>>
where
    B: Serialize,
{
    let value = serde_json::to_value(body)
        .map_err(|e| Error::Construction(format!("Failed to serialize form: {}", e)))?;
    let Value::Object(map) = value else {
        return Err(Error::Construction(
            "Form body must serialize to an object".to_string(),
        ));
    };

    let mut fields = Vec::new();
    for (key, value) in map {
        flatten(key, value, &mut fields);
    }
    Ok(fields)
}

fn flatten(key: String, value: Value, fields: &mut Vec<(String, String)>) {
    match value {
        Value::Null => {}
        Value::String(s) => fields.push((key, s)),
        Value::Bool(_) | Value::Number(_) => fields.push((key, value.to_string())),
        Value::Array(items) => {
            for item in items {
                flatten(format!("{}[]", key), item, fields);
            }
        }
        Value::Object(map) => {
            for (sub, item) in map {
                flatten(format!("{}[{}]", key, sub), item, fields);
            }
        }
    }
}
