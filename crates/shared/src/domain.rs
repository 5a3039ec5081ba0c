use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

id_newtype!(ApplyId);
id_newtype!(DesignId);
id_newtype!(DeviceId);
id_newtype!(PolicyId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApplyStatus {
    InProgress,
    Completed,
    Failed,
    Canceling,
    Canceled,
    Suspended,
}

impl ApplyStatus {
    pub const ALL: [ApplyStatus; 6] = [
        Self::InProgress,
        Self::Completed,
        Self::Failed,
        Self::Canceling,
        Self::Canceled,
        Self::Suspended,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::InProgress => "IN_PROGRESS",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
            Self::Canceling => "CANCELING",
            Self::Canceled => "CANCELED",
            Self::Suspended => "SUSPENDED",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, String> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(raw.trim()))
            .ok_or_else(|| {
                "apply status must be one of: IN_PROGRESS, COMPLETED, FAILED, CANCELING, CANCELED, SUSPENDED"
                    .to_string()
            })
    }
}

impl std::fmt::Display for ApplyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RollbackStatus {
    InProgress,
    Completed,
    Failed,
    Suspended,
}

impl RollbackStatus {
    pub const ALL: [RollbackStatus; 4] = [
        Self::InProgress,
        Self::Completed,
        Self::Failed,
        Self::Suspended,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::InProgress => "IN_PROGRESS",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
            Self::Suspended => "SUSPENDED",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, String> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(raw.trim()))
            .ok_or_else(|| {
                "rollback status must be one of: IN_PROGRESS, COMPLETED, FAILED, SUSPENDED"
                    .to_string()
            })
    }
}

impl std::fmt::Display for RollbackStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<RollbackStatus> for ApplyStatus {
    fn from(value: RollbackStatus) -> Self {
        match value {
            RollbackStatus::InProgress => Self::InProgress,
            RollbackStatus::Completed => Self::Completed,
            RollbackStatus::Failed => Self::Failed,
            RollbackStatus::Suspended => Self::Suspended,
        }
    }
}

/// Where a record stands with respect to rollback.
///
/// `Requested` covers records flagged with `executeRollback` whose rollback
/// status has not been reported by the backend yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RollbackState {
    NotRequested,
    Requested,
    Reported(RollbackStatus),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Boot,
    Shutdown,
    Connect,
    Disconnect,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Boot => "boot",
            Self::Shutdown => "shutdown",
            Self::Connect => "connect",
            Self::Disconnect => "disconnect",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Procedure {
    #[serde(rename = "operationID")]
    pub operation_id: i64,
    pub operation: Operation,
    #[serde(rename = "targetCPUID", default, skip_serializing_if = "Option::is_none")]
    pub target_cpu_id: Option<DeviceId>,
    #[serde(rename = "targetDeviceID")]
    pub target_device_id: DeviceId,
    #[serde(default)]
    pub dependencies: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcedureResult {
    #[serde(rename = "operationID")]
    pub operation_id: i64,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyRecord {
    #[serde(rename = "applyID")]
    pub id: ApplyId,
    pub status: ApplyStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rollback_status: Option<RollbackStatus>,
    #[serde(default)]
    pub execute_rollback: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suspended_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resumed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canceled_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub procedures: Vec<Procedure>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub apply_result: Vec<ProcedureResult>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rollback_procedures: Vec<Procedure>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rollback_result: Vec<ProcedureResult>,
}

impl ApplyRecord {
    pub fn rollback_state(&self) -> RollbackState {
        match (self.rollback_status, self.execute_rollback) {
            (Some(status), _) => RollbackState::Reported(status),
            (None, true) => RollbackState::Requested,
            (None, false) => RollbackState::NotRequested,
        }
    }

    pub fn is_rollback(&self) -> bool {
        self.rollback_status.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DesignStatus {
    InProgress,
    Completed,
    Failed,
    Canceled,
}

impl DesignStatus {
    pub const ALL: [DesignStatus; 4] = [
        Self::InProgress,
        Self::Completed,
        Self::Failed,
        Self::Canceled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::InProgress => "IN_PROGRESS",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
            Self::Canceled => "CANCELED",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, String> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(raw.trim()))
            .ok_or_else(|| {
                "design status must be one of: IN_PROGRESS, COMPLETED, FAILED, CANCELED".to_string()
            })
    }
}

impl std::fmt::Display for DesignStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One bound pair of a tolerance criterion, e.g. CPU usage rate below 80.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToleranceCriterion {
    pub target: String,
    pub metric: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lower: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upper: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignConditions {
    #[serde(default)]
    pub tolerance_criteria: Vec<ToleranceCriterion>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignRecord {
    #[serde(rename = "designID")]
    pub id: DesignId,
    pub status: DesignStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub conditions: DesignConditions,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub procedures: Vec<Procedure>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceAttribute {
    #[serde(rename = "capacityMiB", default, skip_serializing_if = "Option::is_none")]
    pub capacity_mib: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_cores: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    #[serde(rename = "deviceID")]
    pub device_id: DeviceId,
    #[serde(rename = "type")]
    pub device_type: String,
    #[serde(default)]
    pub attribute: DeviceAttribute,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub device: Device,
    #[serde(default)]
    pub detected: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PolicyCategory {
    NodeConfigurationPolicy,
    SystemOperationPolicy,
}

impl PolicyCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NodeConfigurationPolicy => "NodeConfigurationPolicy",
            Self::SystemOperationPolicy => "SystemOperationPolicy",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, String> {
        match raw.trim() {
            "NodeConfigurationPolicy" | "node" => Ok(Self::NodeConfigurationPolicy),
            "SystemOperationPolicy" | "system" => Ok(Self::SystemOperationPolicy),
            _ => Err(
                "policy category must be one of: NodeConfigurationPolicy, SystemOperationPolicy"
                    .to_string(),
            ),
        }
    }
}

impl std::fmt::Display for PolicyCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Policy {
    #[serde(rename = "policyID")]
    pub id: PolicyId,
    pub category: PolicyCategory,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub policy: serde_json::Value,
}

/// Body for creating or replacing a policy; the backend assigns the id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyDraft {
    pub category: PolicyCategory,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub policy: serde_json::Value,
}
