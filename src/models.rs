// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! This module defines the request and response data structures used by
//! the REST API and the record store. All wire types use camelCase JSON
//! field names and derive `ToSchema` for OpenAPI documentation.
//!
//! ## Wallet Address Type
//!
//! The [`WalletAddress`] newtype wraps Ethereum-style addresses. Addresses are
//! normalized to lowercase when a record is created so owner lookups are
//! case-insensitive.
//!
//! ## Record Shapes
//!
//! A submission carries one of two payload shapes ([`HealthPayload`]):
//!
//! - **Metric reading**: a single `dataType` with a positive integer `value`
//!   and its `unit` (e.g. heart rate 72 bpm)
//! - **Health profile**: a flat set of personal fields (name, age, blood
//!   pressure, heart rate, sugar, blood group)
//!
//! Each shape has its own validation rules.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{de::Error as _, Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

// =============================================================================
// Wallet Address Type
// =============================================================================

/// Ethereum-compatible wallet address wrapper.
///
/// # Example
///
/// ```rust,ignore
/// let addr = WalletAddress::from("0x742d35Cc6634C0532925a3b844Bc9e7595f4aB12");
/// assert_eq!(addr.normalized().0, "0x742d35cc6634c0532925a3b844bc9e7595f4ab12");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WalletAddress(pub String);

impl WalletAddress {
    /// Lowercase, whitespace-trimmed form used for storage and comparison.
    pub fn normalized(&self) -> Self {
        WalletAddress(self.0.trim().to_ascii_lowercase())
    }

    /// Case-insensitive comparison.
    pub fn matches(&self, other: &WalletAddress) -> bool {
        self.0.trim().eq_ignore_ascii_case(other.0.trim())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for WalletAddress {
    fn from(value: String) -> Self {
        WalletAddress(value)
    }
}

impl From<&str> for WalletAddress {
    fn from(value: &str) -> Self {
        WalletAddress(value.to_string())
    }
}

impl From<WalletAddress> for String {
    fn from(value: WalletAddress) -> Self {
        value.0
    }
}

// =============================================================================
// Validation
// =============================================================================

/// A request body that parsed but violates the record schema.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

fn require_positive(field: &str, value: i64) -> Result<(), ValidationError> {
    if value <= 0 {
        return Err(ValidationError::new(format!(
            "{field} must be a positive integer"
        )));
    }
    Ok(())
}

fn require_non_empty(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new(format!("{field} is required")));
    }
    Ok(())
}

// =============================================================================
// Transaction Status
// =============================================================================

/// Lifecycle status of the transaction anchoring a record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TxStatus {
    /// Record created or transaction sent, no receipt yet
    #[default]
    Pending,
    /// Receipt observed with a success status
    Confirmed,
    /// Receipt observed with a failure status
    Failed,
}

impl TxStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, TxStatus::Pending)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TxStatus::Pending => "pending",
            TxStatus::Confirmed => "confirmed",
            TxStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for TxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TxStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TxStatus::Pending),
            "confirmed" => Ok(TxStatus::Confirmed),
            "failed" => Ok(TxStatus::Failed),
            other => Err(ValidationError::new(format!(
                "txStatus must be one of pending, confirmed, failed (got `{other}`)"
            ))),
        }
    }
}

// =============================================================================
// Metric Reading
// =============================================================================

/// The fixed set of metric kinds a reading can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum MetricKind {
    HeartRate,
    BloodPressure,
    Glucose,
    Steps,
    Weight,
    Sleep,
}

impl MetricKind {
    pub const ALL: [MetricKind; 6] = [
        MetricKind::HeartRate,
        MetricKind::BloodPressure,
        MetricKind::Glucose,
        MetricKind::Steps,
        MetricKind::Weight,
        MetricKind::Sleep,
    ];

    /// Unit shown next to the value when the submitter does not choose one.
    pub fn default_unit(self) -> &'static str {
        match self {
            MetricKind::HeartRate => "bpm",
            MetricKind::BloodPressure => "mmHg",
            MetricKind::Glucose => "mg/dL",
            MetricKind::Steps => "steps",
            MetricKind::Weight => "lbs",
            MetricKind::Sleep => "hours",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MetricKind::HeartRate => "heartRate",
            MetricKind::BloodPressure => "bloodPressure",
            MetricKind::Glucose => "glucose",
            MetricKind::Steps => "steps",
            MetricKind::Weight => "weight",
            MetricKind::Sleep => "sleep",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MetricKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MetricKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ValidationError::new(format!("unknown data type `{s}`")))
    }
}

/// A single health metric reading.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MetricReading {
    /// The metric kind (e.g. `heartRate`).
    #[serde(alias = "metricKind")]
    pub data_type: MetricKind,
    /// Magnitude, a positive integer.
    pub value: i64,
    /// Unit string (e.g. `bpm`).
    pub unit: String,
}

impl MetricReading {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_positive("value", self.value)?;
        require_non_empty("unit", &self.unit)
    }
}

// =============================================================================
// Health Profile
// =============================================================================

/// ABO/Rh blood groups accepted in a profile.
pub const BLOOD_GROUPS: [&str; 8] = ["A+", "A-", "B+", "B-", "AB+", "AB-", "O+", "O-"];

/// Flat personal health record.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HealthProfile {
    pub name: String,
    pub age: i64,
    /// Systolic/diastolic, e.g. `120/80`.
    pub blood_pressure: String,
    pub heart_rate: i64,
    pub sugar: i64,
    pub blood_group: String,
}

impl HealthProfile {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("name", &self.name)?;
        require_positive("age", self.age)?;
        require_positive("heartRate", self.heart_rate)?;
        require_positive("sugar", self.sugar)?;
        validate_blood_pressure(&self.blood_pressure)?;

        if !BLOOD_GROUPS.contains(&self.blood_group.as_str()) {
            return Err(ValidationError::new(format!(
                "bloodGroup must be one of {}",
                BLOOD_GROUPS.join(", ")
            )));
        }
        Ok(())
    }
}

fn validate_blood_pressure(raw: &str) -> Result<(), ValidationError> {
    let invalid = || ValidationError::new("bloodPressure must look like `120/80`");

    let (systolic, diastolic) = raw.trim().split_once('/').ok_or_else(invalid)?;
    let systolic: i64 = systolic.trim().parse().map_err(|_| invalid())?;
    let diastolic: i64 = diastolic.trim().parse().map_err(|_| invalid())?;

    if systolic <= 0 || diastolic <= 0 {
        return Err(invalid());
    }
    Ok(())
}

// =============================================================================
// Payload Union
// =============================================================================

/// The submitted health data, in one of the two record shapes.
///
/// Serialized untagged (the fields are flattened into the record). On input,
/// a body carrying `dataType` (or `metricKind`) is a metric reading; any other
/// body is parsed as a profile.
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
#[serde(untagged)]
pub enum HealthPayload {
    Metric(MetricReading),
    Profile(HealthProfile),
}

impl HealthPayload {
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            HealthPayload::Metric(reading) => reading.validate(),
            HealthPayload::Profile(profile) => profile.validate(),
        }
    }

    pub fn metric(kind: MetricKind, value: i64, unit: impl Into<String>) -> Self {
        HealthPayload::Metric(MetricReading {
            data_type: kind,
            value,
            unit: unit.into(),
        })
    }

    /// Short label used in logs.
    pub fn label(&self) -> String {
        match self {
            HealthPayload::Metric(reading) => {
                format!("{} {} {}", reading.data_type, reading.value, reading.unit)
            }
            HealthPayload::Profile(profile) => format!("profile of {}", profile.name),
        }
    }
}

impl<'de> Deserialize<'de> for HealthPayload {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let fields = serde_json::Map::<String, serde_json::Value>::deserialize(deserializer)?;
        let is_metric = fields.contains_key("dataType") || fields.contains_key("metricKind");
        let value = serde_json::Value::Object(fields);

        if is_metric {
            serde_json::from_value(value)
                .map(HealthPayload::Metric)
                .map_err(D::Error::custom)
        } else {
            serde_json::from_value(value)
                .map(HealthPayload::Profile)
                .map_err(D::Error::custom)
        }
    }
}

// =============================================================================
// Health Records
// =============================================================================

/// A persisted health data submission and its transaction lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HealthRecord {
    /// Unique identifier, generated at creation.
    pub id: String,
    /// Owner wallet, lowercase.
    #[serde(alias = "ownerAddress")]
    pub wallet_address: WalletAddress,
    /// Submitted data (flattened).
    #[serde(flatten)]
    pub payload: HealthPayload,
    /// Hash of the anchoring transaction, once sent.
    #[serde(alias = "transactionHash")]
    pub tx_hash: Option<String>,
    /// Transaction status.
    #[serde(alias = "transactionStatus")]
    pub tx_status: TxStatus,
    /// Creation time, set server-side.
    #[serde(alias = "createdAt")]
    pub timestamp: DateTime<Utc>,
}

/// Request to create a health record.
///
/// `txHash` and `txStatus` are accepted for compatibility with existing
/// clients, but a new record must start without a hash and in `pending`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CreateHealthRecordRequest {
    /// The submitting wallet.
    #[serde(alias = "ownerAddress")]
    pub wallet_address: WalletAddress,
    /// Submitted data (flattened).
    #[serde(flatten)]
    pub payload: HealthPayload,
    #[serde(default, alias = "transactionHash")]
    pub tx_hash: Option<String>,
    #[serde(default, alias = "transactionStatus")]
    pub tx_status: Option<TxStatus>,
}

impl CreateHealthRecordRequest {
    pub fn new(wallet_address: impl Into<WalletAddress>, payload: HealthPayload) -> Self {
        Self {
            wallet_address: wallet_address.into(),
            payload,
            tx_hash: None,
            tx_status: Some(TxStatus::Pending),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.wallet_address.is_empty() {
            return Err(ValidationError::new("walletAddress is required"));
        }
        if self.tx_hash.is_some() {
            return Err(ValidationError::new(
                "txHash must be null when a record is created",
            ));
        }
        if let Some(status) = self.tx_status {
            if status != TxStatus::Pending {
                return Err(ValidationError::new(
                    "txStatus must be pending when a record is created",
                ));
            }
        }
        self.payload.validate()
    }
}

/// Request to attach or advance the transaction of a record.
///
/// Fields are optional on the wire so that missing values are reported as a
/// validation error rather than a parse failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTransactionRequest {
    /// Transaction hash (0x-prefixed).
    #[serde(default, alias = "transactionHash")]
    pub tx_hash: Option<String>,
    /// New status: `pending`, `confirmed` or `failed`.
    #[serde(default, alias = "transactionStatus")]
    pub tx_status: Option<String>,
}

impl UpdateTransactionRequest {
    pub fn new(tx_hash: impl Into<String>, tx_status: TxStatus) -> Self {
        Self {
            tx_hash: Some(tx_hash.into()),
            tx_status: Some(tx_status.to_string()),
        }
    }

    /// Check presence of both fields and parse the status.
    pub fn parse(&self) -> Result<(String, TxStatus), ValidationError> {
        let hash = self
            .tx_hash
            .as_deref()
            .map(str::trim)
            .filter(|hash| !hash.is_empty());
        let status = self
            .tx_status
            .as_deref()
            .map(str::trim)
            .filter(|status| !status.is_empty());

        match (hash, status) {
            (Some(hash), Some(status)) => Ok((hash.to_string(), status.parse()?)),
            _ => Err(ValidationError::new("txHash and txStatus are required")),
        }
    }
}
