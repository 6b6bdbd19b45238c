//! # Credential Schemas
//!
//! A schema is a JSON Schema (Draft 2020-12) document persisted to the
//! ledger's blob store and referenced from credentials via
//! `credentialSchema`. During verification, every subject record is
//! validated against the fetched schema.
//!
//! Authoring flow: build a [`Schema`], attach the JSON Schema document and
//! author DID, then [`Schema::write()`] it as a signed blob transaction.
//! Verifying flow: the [`SchemaSource`] capability fetches the schema by
//! blob id; the in-process ledger implements it directly.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use vcl_core::{BlobId, Did};
use vcl_crypto::KeyProvider;
use vcl_ledger::{Blob, BlobError, Ledger, Receipt, Transaction};

/// Errors from schema authoring, storage, and validation.
#[derive(Error, Debug)]
pub enum SchemaError {
    /// The document is not a valid JSON Schema.
    #[error("invalid JSON schema: {0}")]
    InvalidSchema(String),

    /// A subject record violated the schema.
    #[error("schema violation at {path}: {message}")]
    Violation {
        /// JSON Pointer to the violating field.
        path: String,
        /// Human-readable description of the violation.
        message: String,
    },

    /// No schema blob with this identifier.
    #[error("schema not found: {0}")]
    NotFound(BlobId),

    /// The stored blob is not a JSON document.
    #[error("malformed schema blob: {0}")]
    Malformed(String),

    /// The schema has no author DID set.
    #[error("schema author is not set")]
    MissingAuthor,

    /// The ledger rejected the schema blob transaction.
    #[error("schema store failed: {0}")]
    Store(String),
}

/// Compile a JSON Schema document, rejecting invalid schemas.
fn compile(schema: &Value) -> Result<jsonschema::Validator, SchemaError> {
    jsonschema::options()
        .with_draft(jsonschema::Draft::Draft202012)
        .build(schema)
        .map_err(|e| SchemaError::InvalidSchema(e.to_string()))
}

/// Validate a subject record against a JSON Schema document.
///
/// Returns the first violation, with its JSON Pointer path.
pub fn validate_subject(schema: &Value, subject: &Value) -> Result<(), SchemaError> {
    let validator = compile(schema)?;
    if let Some(err) = validator.iter_errors(subject).next() {
        return Err(SchemaError::Violation {
            path: err.instance_path.to_string(),
            message: err.to_string(),
        });
    }
    Ok(())
}

/// An authored credential schema bound to a blob identifier.
#[derive(Debug, Clone)]
pub struct Schema {
    id: BlobId,
    author: Option<Did>,
    schema: Value,
}

impl Schema {
    /// Start a new schema with a fresh random blob identifier.
    pub fn new() -> Self {
        Self {
            id: BlobId::random(),
            author: None,
            schema: Value::Null,
        }
    }

    /// The blob identifier this schema will be (or was) stored under.
    pub fn id(&self) -> &BlobId {
        &self.id
    }

    /// The authoring DID, if set.
    pub fn author(&self) -> Option<&Did> {
        self.author.as_ref()
    }

    /// The JSON Schema document.
    pub fn json_schema(&self) -> &Value {
        &self.schema
    }

    /// Attach the JSON Schema document, verifying that it compiles.
    pub fn set_json_schema(&mut self, schema: Value) -> Result<&mut Self, SchemaError> {
        compile(&schema)?;
        self.schema = schema;
        Ok(self)
    }

    /// Set the authoring DID.
    pub fn set_author(&mut self, author: Did) -> &mut Self {
        self.author = Some(author);
        self
    }

    /// Build the blob carrying this schema's canonical bytes.
    pub fn to_blob(&self) -> Result<Blob, SchemaError> {
        let author = self.author.clone().ok_or(SchemaError::MissingAuthor)?;
        Blob::from_json(self.id, &self.schema, author).map_err(|e| SchemaError::Store(e.to_string()))
    }

    /// Persist the schema as a signed blob transaction.
    ///
    /// `author_key` is any [`KeyProvider`] backend holding the author
    /// DID's currently-registered key.
    pub fn write(
        &self,
        ledger: &Ledger,
        author_key: &dyn KeyProvider,
    ) -> Result<Receipt, SchemaError> {
        let blob = self.to_blob()?;
        let signature = blob
            .sign(author_key)
            .map_err(|e| SchemaError::Store(e.to_string()))?;
        ledger
            .submit(Transaction::BlobStore { blob, signature })
            .map_err(|e| SchemaError::Store(e.to_string()))
    }

    /// Load a schema back from the ledger's blob store.
    pub fn read(ledger: &Ledger, id: BlobId) -> Result<Self, SchemaError> {
        let stored = ledger.get_blob(&id).map_err(|e| match e {
            BlobError::NotFound(id) => SchemaError::NotFound(id),
            other => SchemaError::Malformed(other.to_string()),
        })?;
        let schema: Value = serde_json::from_slice(&stored.bytes)
            .map_err(|e| SchemaError::Malformed(e.to_string()))?;
        compile(&schema)?;
        Ok(Self {
            id,
            author: Some(stored.author),
            schema,
        })
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self::new()
    }
}

/// Capability for fetching credential schemas during verification.
#[async_trait]
pub trait SchemaSource: Send + Sync {
    /// Fetch the JSON Schema document stored under `id`.
    async fn fetch_schema(&self, id: &BlobId) -> Result<Value, SchemaError>;
}

#[async_trait]
impl SchemaSource for Ledger {
    async fn fetch_schema(&self, id: &BlobId) -> Result<Value, SchemaError> {
        let stored = self.get_blob(id).map_err(|e| match e {
            BlobError::NotFound(id) => SchemaError::NotFound(id),
            other => SchemaError::Malformed(other.to_string()),
        })?;
        serde_json::from_slice(&stored.bytes).map_err(|e| SchemaError::Malformed(e.to_string()))
    }
}
