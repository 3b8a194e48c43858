use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::config::EditorConfig;
use crate::event::Generation;
use crate::AppError;

// --- Typed IDs ---

macro_rules! typed_id {
    ($name:ident) => {
        #[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(s: impl Into<String>) -> Self {
                Self(s.into())
            }
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

typed_id!(CarId);

/// Branch and owner identifiers arrive either as JSON strings or numbers.
/// The original representation is kept so the record round-trips unchanged.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
#[serde(untagged)]
pub enum Identifier {
    Number(i64),
    Text(String),
    /// Fractional or beyond `i64`.
    OtherNumber(Number),
}

impl Identifier {
    /// Mirrors the falsy check of the web form: `""` and `0` count as unset.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Number(n) => *n == 0,
            Self::Text(s) => s.is_empty(),
            Self::OtherNumber(n) => n.as_f64() == Some(0.0),
        }
    }

    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Number(n) => Value::from(*n),
            Self::Text(s) => Value::from(s.as_str()),
            Self::OtherNumber(n) => Value::Number(n.clone()),
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
            Self::OtherNumber(n) => write!(f, "{n}"),
        }
    }
}

impl From<&str> for Identifier {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Identifier {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for Identifier {
    fn from(n: i64) -> Self {
        Self::Number(n)
    }
}

/// Auth context of the signed-in branch manager, injected by the shell.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionContext {
    pub assigned_branch_id: Option<Identifier>,
}

impl SessionContext {
    pub fn with_branch(branch_id: impl Into<Identifier>) -> Self {
        Self {
            assigned_branch_id: Some(branch_id.into()),
        }
    }
}

// --- Status ---

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CarStatus {
    #[default]
    Unset,
    Approved,
    Rejected,
    Returned,
}

impl CarStatus {
    const WITHOUT_OWNER: [Self; 2] = [Self::Unset, Self::Approved];
    const WITH_OWNER: [Self; 4] = [Self::Unset, Self::Approved, Self::Rejected, Self::Returned];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unset => "",
            Self::Approved => "Approved",
            Self::Rejected => "Rejected",
            Self::Returned => "Returned",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "" => Some(Self::Unset),
            "Approved" => Some(Self::Approved),
            "Rejected" => Some(Self::Rejected),
            "Returned" => Some(Self::Returned),
            _ => None,
        }
    }

    /// Statuses selectable in the form. Rejecting or returning a car only makes
    /// sense once it has an owner.
    #[must_use]
    pub fn options(has_owner: bool) -> &'static [Self] {
        if has_owner {
            &Self::WITH_OWNER
        } else {
            &Self::WITHOUT_OWNER
        }
    }
}

impl fmt::Display for CarStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for CarStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for CarStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw
            .as_deref()
            .and_then(Self::parse)
            .unwrap_or_default())
    }
}

// --- Fields ---

/// Editable fields, named as the web form and the API name them.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum CarField {
    Brand,
    Model,
    Year,
    Description,
    RentalRate,
    BranchId,
    Status,
}

impl CarField {
    /// Validation order.
    pub const REQUIRED: [Self; 7] = [
        Self::Brand,
        Self::Model,
        Self::Year,
        Self::Description,
        Self::RentalRate,
        Self::BranchId,
        Self::Status,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Brand => "brand",
            Self::Model => "model",
            Self::Year => "year",
            Self::Description => "description",
            Self::RentalRate => "rentalRate",
            Self::BranchId => "branchId",
            Self::Status => "status",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Brand => "Brand",
            Self::Model => "Model",
            Self::Year => "Year",
            Self::Description => "Description",
            Self::RentalRate => "Rental Rate",
            Self::BranchId => "Branch",
            Self::Status => "Status",
        }
    }

    #[must_use]
    pub fn required_message(self) -> String {
        format!("{} is required", self.label())
    }
}

impl fmt::Display for CarField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FieldUpdateError {
    #[error("unknown field '{0}'")]
    UnknownField(String),
    #[error("'{0}' is not a known car status")]
    UnknownStatus(String),
}

impl FromStr for CarField {
    type Err = FieldUpdateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::REQUIRED
            .into_iter()
            .find(|f| f.name() == s)
            .ok_or_else(|| FieldUpdateError::UnknownField(s.to_string()))
    }
}

// --- Reference data ---

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Branch {
    pub branch_id: Identifier,
    #[serde(default)]
    pub branch_name: String,
    #[serde(default)]
    pub location: String,
}

impl Branch {
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} - {}", self.branch_name, self.location)
    }
}

// --- Image ---

pub const OCTET_STREAM: &str = "application/octet-stream";

/// A file picked by the user. Held in memory until submitted.
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ImageFile {
    pub file_name: String,
    pub content_type: Option<String>,
    #[serde(with = "serde_bytes")]
    pub bytes: Vec<u8>,
}

impl ImageFile {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: None,
            bytes,
        }
    }

    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Content type reported by the shell, else sniffed from the magic bytes.
    #[must_use]
    pub fn resolved_content_type(&self) -> String {
        if let Some(ct) = self.content_type.as_deref().filter(|ct| !ct.trim().is_empty()) {
            return ct.to_string();
        }
        image::guess_format(&self.bytes)
            .map(|format| format.to_mime_type().to_string())
            .unwrap_or_else(|_| OCTET_STREAM.to_string())
    }
}

// Bytes are not useful in logs.
impl fmt::Debug for ImageFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageFile")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("size_bytes", &self.bytes.len())
            .finish()
    }
}

// --- Car record (wire) ---

fn text_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(s)) => Ok(s),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(other) => Err(de::Error::custom(format!(
            "expected a string or number, got {other}"
        ))),
    }
}

/// A numeric input as fetched. The web form treats a fetched `0` as empty,
/// while a typed `"0"` is a value.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FetchedNumber {
    pub text: String,
    pub is_zero: bool,
}

impl<'de> Deserialize<'de> for FetchedNumber {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let is_zero_number = |n: &Number| n.as_f64() == Some(0.0);
        match Option::<Value>::deserialize(deserializer)? {
            None | Some(Value::Null) => Ok(Self::default()),
            Some(Value::String(text)) => Ok(Self {
                text,
                is_zero: false,
            }),
            Some(Value::Number(n)) => Ok(Self {
                text: n.to_string(),
                is_zero: is_zero_number(&n),
            }),
            Some(other) => Err(de::Error::custom(format!(
                "expected a string or number, got {other}"
            ))),
        }
    }
}

// Distinguishes an explicit `null` from an absent key.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Car as returned by `GET /cars/{id}`.
#[derive(Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CarRecord {
    #[serde(default, deserialize_with = "text_or_number")]
    pub brand: String,
    #[serde(default, deserialize_with = "text_or_number")]
    pub model: String,
    #[serde(default)]
    pub year: FetchedNumber,
    #[serde(default, deserialize_with = "text_or_number")]
    pub description: String,
    #[serde(default)]
    pub rental_rate: FetchedNumber,
    #[serde(default)]
    pub branch_id: Option<Identifier>,
    #[serde(default)]
    pub status: CarStatus,
    #[serde(default, deserialize_with = "present")]
    pub owner_id: Option<Option<Identifier>>,
    /// Stored image reference. Never sent back: the form only uploads new files.
    #[serde(default)]
    pub image: Option<Value>,
    /// Everything else the API returned (id, timestamps, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// --- Form ---

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CarForm {
    pub brand: String,
    pub model: String,
    pub year: String,
    pub description: String,
    pub rental_rate: String,
    pub branch_id: Option<Identifier>,
    pub status: CarStatus,
    pub owner_id: Option<Identifier>,
    pub image: Option<ImageFile>,
    pub extra: Map<String, Value>,
    /// Numeric fields still holding a fetched `0`.
    #[serde(default)]
    pub fetched_zero: Vec<CarField>,
}

impl CarForm {
    /// Populates the form from a fetched record. A record without a branch
    /// falls back to the manager's assigned branch; any staged image is dropped.
    #[must_use]
    pub fn from_record(record: CarRecord, session: &SessionContext) -> Self {
        let branch_id = record
            .branch_id
            .filter(|id| !id.is_blank())
            .or_else(|| session.assigned_branch_id.clone());

        let mut extra = record.extra;
        let owner_id = match record.owner_id {
            Some(Some(id)) => Some(id),
            Some(None) => {
                extra.insert("ownerId".into(), Value::Null);
                None
            }
            None => None,
        };

        let fetched_zero = [
            (CarField::Year, record.year.is_zero),
            (CarField::RentalRate, record.rental_rate.is_zero),
        ]
        .into_iter()
        .filter_map(|(field, zero)| zero.then_some(field))
        .collect();

        Self {
            brand: record.brand,
            model: record.model,
            year: record.year.text,
            description: record.description,
            rental_rate: record.rental_rate.text,
            branch_id,
            status: record.status,
            owner_id,
            image: None,
            extra,
            fetched_zero,
        }
    }

    pub fn set_field(&mut self, field: CarField, value: String) -> Result<(), FieldUpdateError> {
        self.fetched_zero.retain(|f| *f != field);
        match field {
            CarField::Brand => self.brand = value,
            CarField::Model => self.model = value,
            CarField::Year => self.year = value,
            CarField::Description => self.description = value,
            CarField::RentalRate => self.rental_rate = value,
            CarField::BranchId => {
                self.branch_id = if value.is_empty() {
                    None
                } else {
                    Some(Identifier::Text(value))
                };
            }
            CarField::Status => {
                self.status = CarStatus::parse(&value)
                    .ok_or(FieldUpdateError::UnknownStatus(value))?;
            }
        }
        Ok(())
    }

    /// Current value as the form input displays it.
    #[must_use]
    pub fn value(&self, field: CarField) -> String {
        match field {
            CarField::Brand => self.brand.clone(),
            CarField::Model => self.model.clone(),
            CarField::Year => self.year.clone(),
            CarField::Description => self.description.clone(),
            CarField::RentalRate => self.rental_rate.clone(),
            CarField::BranchId => self
                .branch_id
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default(),
            CarField::Status => self.status.as_str().to_string(),
        }
    }

    #[must_use]
    pub fn has_owner(&self) -> bool {
        self.owner_id.as_ref().is_some_and(|id| !id.is_blank())
    }

    #[must_use]
    pub fn status_options(&self) -> &'static [CarStatus] {
        CarStatus::options(self.has_owner())
    }

    /// JSON document sent as the `carDto` part. The image is always `null`;
    /// the file itself travels in its own part.
    #[must_use]
    pub fn to_dto(&self) -> Value {
        let mut dto = self.extra.clone();
        dto.insert("brand".into(), Value::from(self.brand.as_str()));
        dto.insert("model".into(), Value::from(self.model.as_str()));
        dto.insert("year".into(), numeric_or_text(&self.year));
        dto.insert("description".into(), Value::from(self.description.as_str()));
        dto.insert("rentalRate".into(), numeric_or_text(&self.rental_rate));
        dto.insert(
            "branchId".into(),
            self.branch_id
                .as_ref()
                .map_or_else(|| Value::from(""), Identifier::to_json),
        );
        dto.insert("status".into(), Value::from(self.status.as_str()));
        if let Some(owner) = &self.owner_id {
            dto.insert("ownerId".into(), owner.to_json());
        }
        dto.insert("image".into(), Value::Null);
        Value::Object(dto)
    }
}

fn numeric_or_text(raw: &str) -> Value {
    let trimmed = raw.trim();
    if let Ok(n) = trimmed.parse::<i64>() {
        return Value::from(n);
    }
    trimmed
        .parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map_or_else(|| Value::from(raw), Value::Number)
}

// --- Validation errors ---

/// Per-field messages in validation order.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidationErrors(Vec<(CarField, String)>);

impl ValidationErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: CarField, message: impl Into<String>) {
        let message = message.into();
        if let Some(slot) = self.0.iter_mut().find(|(f, _)| *f == field) {
            slot.1 = message;
        } else {
            self.0.push((field, message));
        }
    }

    #[must_use]
    pub fn get(&self, field: CarField) -> Option<&str> {
        self.0
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, m)| m.as_str())
    }

    #[must_use]
    pub fn contains(&self, field: CarField) -> bool {
        self.get(field).is_some()
    }

    pub fn fields(&self) -> impl Iterator<Item = CarField> + '_ {
        self.0.iter().map(|(f, _)| *f)
    }

    pub fn iter(&self) -> impl Iterator<Item = (CarField, &str)> {
        self.0.iter().map(|(f, m)| (*f, m.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}

// --- Model ---

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct Model {
    pub config: EditorConfig,

    // View lifetime
    pub car_id: Option<CarId>,
    pub session: SessionContext,
    pub generation: Generation,
    pub is_open: bool,

    // Form
    pub form: CarForm,
    pub branches: Vec<Branch>,
    pub errors: ValidationErrors,

    // FormSessionState
    pub loading: bool,
    pub success: bool,

    pub submit_in_flight: bool,
    pub redirect_pending: bool,

    pub load_error: Option<AppError>,
    pub submit_error: Option<AppError>,
}

impl Model {
    /// Starts a fresh view lifetime. Continuations issued before this call
    /// carry an older generation and are dropped.
    pub fn open(&mut self, car_id: CarId, session: SessionContext) -> Generation {
        self.generation = self.generation.next();
        self.car_id = Some(car_id);
        self.session = session;
        self.is_open = true;
        self.form = CarForm::default();
        self.branches.clear();
        self.errors.clear();
        self.loading = false;
        self.success = false;
        self.submit_in_flight = false;
        self.redirect_pending = false;
        self.load_error = None;
        self.submit_error = None;
        self.generation
    }

    pub fn close(&mut self) {
        self.generation = self.generation.next();
        self.is_open = false;
        self.loading = false;
        self.submit_in_flight = false;
        self.redirect_pending = false;
    }

    #[must_use]
    pub fn accepts(&self, generation: Generation) -> bool {
        self.is_open && self.generation == generation
    }

    pub fn clear_errors(&mut self) {
        self.load_error = None;
        self.submit_error = None;
    }
}
