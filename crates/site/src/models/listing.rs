//! Listing records and their document encoding.
//!
//! The stored field names (`name`, `model`, `whatsapp`, `city`, `year`,
//! `price`, `km`, `description`, `created`, `owner`, `uid`, `image`) are
//! the collection's existing schema and must not drift: the same records
//! are read back by field name in every query this application makes.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use carlot_core::{ListingId, Phone, UserId};

use crate::firebase::firestore::{Document, Value};

/// Name of the listings collection.
pub const COLLECTION: &str = "cars";

/// A reference to one stored listing photo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    /// Owner account id (part of the blob path).
    pub uid: UserId,
    /// Opaque unique blob name (part of the blob path).
    pub name: String,
    /// Durable retrieval URL written into the record.
    pub url: String,
}

impl ImageRef {
    /// The object-store path this reference points at.
    #[must_use]
    pub fn blob_path(&self) -> String {
        format!("images/{}/{}", self.uid, self.name)
    }

    fn to_value(&self) -> Value {
        let mut fields = BTreeMap::new();
        fields.insert("uid".to_owned(), Value::string(self.uid.as_str()));
        fields.insert("name".to_owned(), Value::string(&self.name));
        fields.insert("url".to_owned(), Value::string(&self.url));
        Value::map(fields)
    }

    fn from_value(value: &Value) -> Result<Self, ListingDecodeError> {
        let fields = value
            .as_map()
            .ok_or(ListingDecodeError::WrongType("image"))?;
        Ok(Self {
            uid: UserId::new(require_str(fields, "uid")?),
            name: require_str(fields, "name")?.to_owned(),
            url: require_str(fields, "url")?.to_owned(),
        })
    }
}

/// A published vehicle listing.
#[derive(Debug, Clone, PartialEq)]
pub struct Listing {
    /// Store-assigned record id.
    pub id: ListingId,
    /// Vehicle name, upper-cased at creation.
    pub name: String,
    pub model: String,
    pub year: String,
    pub km: String,
    pub price: String,
    pub city: String,
    pub whatsapp: String,
    pub description: String,
    /// Creation instant; listings sort newest-first by this field.
    pub created: DateTime<Utc>,
    /// Seller display name.
    pub owner: String,
    /// Seller account id.
    pub uid: UserId,
    /// Photos, in upload-completion order. Non-empty at creation.
    pub images: Vec<ImageRef>,
}

impl Listing {
    /// The cover photo shown on cards, when any survived decoding.
    #[must_use]
    pub fn cover(&self) -> Option<&ImageRef> {
        self.images.first()
    }

    /// Decode a listing from its stored document.
    ///
    /// # Errors
    ///
    /// Returns [`ListingDecodeError`] when the document is missing its id
    /// or a required field, or a field has an unexpected type.
    pub fn from_document(document: &Document) -> Result<Self, ListingDecodeError> {
        let id = document.id().ok_or(ListingDecodeError::MissingId)?;
        let fields = &document.fields;

        let images = fields
            .get("image")
            .and_then(Value::as_array)
            .ok_or(ListingDecodeError::MissingField("image"))?
            .iter()
            .map(ImageRef::from_value)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            id: ListingId::new(id),
            name: require_str(fields, "name")?.to_owned(),
            model: require_str(fields, "model")?.to_owned(),
            year: require_str(fields, "year")?.to_owned(),
            km: require_str(fields, "km")?.to_owned(),
            price: require_str(fields, "price")?.to_owned(),
            city: require_str(fields, "city")?.to_owned(),
            whatsapp: require_str(fields, "whatsapp")?.to_owned(),
            description: require_str(fields, "description")?.to_owned(),
            created: *fields
                .get("created")
                .and_then(Value::as_timestamp)
                .ok_or(ListingDecodeError::MissingField("created"))?,
            owner: require_str(fields, "owner")?.to_owned(),
            uid: UserId::new(require_str(fields, "uid")?),
            images,
        })
    }
}

/// Validated form fields for a listing about to be created.
#[derive(Debug, Clone)]
pub struct NewListing {
    pub name: String,
    pub model: String,
    pub year: String,
    pub km: String,
    pub price: String,
    pub city: String,
    pub whatsapp: Phone,
    pub description: String,
}

impl NewListing {
    /// Encode the create-request fields: form fields (name upper-cased),
    /// ownership, creation instant, and the photo array.
    #[must_use]
    pub fn into_fields(
        self,
        images: &[ImageRef],
        owner_uid: &UserId,
        owner_name: &str,
        created: DateTime<Utc>,
    ) -> BTreeMap<String, Value> {
        let mut fields = BTreeMap::new();
        fields.insert("name".to_owned(), Value::string(self.name.to_uppercase()));
        fields.insert("model".to_owned(), Value::string(self.model));
        fields.insert("year".to_owned(), Value::string(self.year));
        fields.insert("km".to_owned(), Value::string(self.km));
        fields.insert("price".to_owned(), Value::string(self.price));
        fields.insert("city".to_owned(), Value::string(self.city));
        fields.insert(
            "whatsapp".to_owned(),
            Value::string(self.whatsapp.into_inner()),
        );
        fields.insert("description".to_owned(), Value::string(self.description));
        fields.insert("created".to_owned(), Value::timestamp(created));
        fields.insert("owner".to_owned(), Value::string(owner_name));
        fields.insert("uid".to_owned(), Value::string(owner_uid.as_str()));
        fields.insert(
            "image".to_owned(),
            Value::array(images.iter().map(ImageRef::to_value).collect()),
        );
        fields
    }
}

/// Errors decoding a stored document into a [`Listing`].
#[derive(Debug, Error)]
pub enum ListingDecodeError {
    /// The document carried no resource name.
    #[error("listing document has no id")]
    MissingId,
    /// A required field is absent.
    #[error("listing document is missing field: {0}")]
    MissingField(&'static str),
    /// A field holds a value of an unexpected type.
    #[error("listing field {0} has the wrong type")]
    WrongType(&'static str),
}

fn require_str<'a>(
    fields: &'a BTreeMap<String, Value>,
    key: &'static str,
) -> Result<&'a str, ListingDecodeError> {
    fields
        .get(key)
        .ok_or(ListingDecodeError::MissingField(key))?
        .as_str()
        .ok_or(ListingDecodeError::WrongType(key))
}
