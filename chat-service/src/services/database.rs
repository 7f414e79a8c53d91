//! Database operations for the chat service.
//!
//! Holds OCR fragments, user profiles and medicine records in MongoDB, and
//! implements the [`DocumentTextStore`] boundary the context cache fetches
//! grounding text through.

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::doc,
    options::{IndexOptions, ReplaceOptions},
    Client as MongoClient, Collection, Database, IndexModel,
};
use service_core::error::AppError;

use crate::models::{Medicine, MedicineRecord, OcrFragment, UserProfile};
use crate::services::grounding::{aggregate_fragments, DocumentTextStore, GroundingText};

#[derive(Clone)]
pub struct ChatDb {
    client: MongoClient,
    db: Database,
}

impl ChatDb {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, AppError> {
        tracing::info!(uri = %uri, "Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri).await.map_err(|e| {
            tracing::error!("Failed to connect to MongoDB at {}: {}", uri, e);
            AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
        })?;
        let db = client.database(database);
        tracing::info!(database = %database, "Successfully connected to MongoDB database");
        Ok(Self { client, db })
    }

    pub async fn initialize_indexes(&self) -> Result<(), AppError> {
        tracing::info!("Creating MongoDB indexes for chat-service");

        let fragment_index = IndexModel::builder()
            .keys(doc! { "user_email": 1, "created_at": 1 })
            .options(
                IndexOptions::builder()
                    .name("fragment_user_time_idx".to_string())
                    .build(),
            )
            .build();
        self.fragments()
            .create_index(fragment_index, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create fragment index: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;

        let user_index = IndexModel::builder()
            .keys(doc! { "user_email": 1 })
            .options(
                IndexOptions::builder()
                    .name("user_email_idx".to_string())
                    .unique(true)
                    .build(),
            )
            .build();
        self.users().create_index(user_index, None).await.map_err(|e| {
            tracing::error!("Failed to create user index: {}", e);
            AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
        })?;

        let medicine_index = IndexModel::builder()
            .keys(doc! { "user_email": 1 })
            .options(
                IndexOptions::builder()
                    .name("medicine_user_idx".to_string())
                    .unique(true)
                    .build(),
            )
            .build();
        self.medicines()
            .create_index(medicine_index, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create medicine index: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;

        tracing::info!("Successfully created all MongoDB indexes");
        Ok(())
    }

    pub fn fragments(&self) -> Collection<OcrFragment> {
        self.db.collection("ocr_fragments")
    }

    pub fn users(&self) -> Collection<UserProfile> {
        self.db.collection("users")
    }

    pub fn medicines(&self) -> Collection<MedicineRecord> {
        self.db.collection("medical_info")
    }

    /// All fragments for a user in insertion order.
    pub async fn list_fragments(&self, user_email: &str) -> Result<Vec<OcrFragment>, AppError> {
        let cursor = self
            .fragments()
            .find(doc! { "user_email": user_email }, None)
            .await?;
        let fragments: Vec<OcrFragment> = cursor.try_collect().await?;
        Ok(fragments)
    }

    /// Create or replace a user's profile. An existing profile's creation
    /// time carries over into the replacement.
    pub async fn upsert_profile(&self, profile: &UserProfile) -> Result<(), AppError> {
        let existing = self
            .users()
            .find_one(doc! { "user_email": &profile.user_email }, None)
            .await?;
        let profile = profile.clone().preserving_created_at(existing.as_ref());

        self.users()
            .replace_one(
                doc! { "user_email": &profile.user_email },
                &profile,
                ReplaceOptions::builder().upsert(true).build(),
            )
            .await?;
        Ok(())
    }

    pub async fn user_exists(&self, user_email: &str) -> Result<bool, AppError> {
        let profile = self
            .users()
            .find_one(doc! { "user_email": user_email }, None)
            .await?;
        Ok(profile.is_some())
    }

    /// Push a medicine into the user's record, creating it on first use.
    pub async fn add_medicine(
        &self,
        user_email: &str,
        medicine: Medicine,
    ) -> Result<MedicineRecord, AppError> {
        let mut record = self
            .medicines()
            .find_one(doc! { "user_email": user_email }, None)
            .await?
            .unwrap_or_else(|| MedicineRecord::new(user_email.to_string()));

        record.medicines.push(medicine);
        record.updated_at = chrono::Utc::now();

        self.medicines()
            .replace_one(
                doc! { "user_email": user_email },
                &record,
                ReplaceOptions::builder().upsert(true).build(),
            )
            .await?;

        Ok(record)
    }

    pub async fn health_check(&self) -> Result<(), AppError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl DocumentTextStore for ChatDb {
    async fn fetch_aggregated_text(
        &self,
        user_email: &str,
    ) -> Result<GroundingText, anyhow::Error> {
        let fragments = self
            .list_fragments(user_email)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to load fragments: {}", e))?;
        Ok(aggregate_fragments(&fragments))
    }

    async fn append_fragment(&self, fragment: &OcrFragment) -> Result<(), anyhow::Error> {
        self.fragments()
            .insert_one(fragment, None)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to store fragment: {}", e))?;
        Ok(())
    }
}
