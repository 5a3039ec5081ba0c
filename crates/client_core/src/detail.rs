//! Detail views: a design or apply record joined with device metadata.
//!
//! The record and the resource list are fetched concurrently and their
//! failures are tracked separately, so a missing resource list still leaves
//! the procedure table usable with empty device columns.

use std::collections::HashMap;

use shared::{
    domain::{
        ApplyId, ApplyRecord, DesignId, DesignRecord, DeviceId, Operation, Procedure, Resource,
        RollbackState, ToleranceCriterion,
    },
    error::ApiError,
};
use tracing::warn;

use crate::{error::ClientError, LayoutClient};

#[derive(Debug, Clone, PartialEq)]
pub struct ProcedureRow {
    pub operation_id: i64,
    pub operation: Operation,
    pub target_cpu_id: Option<DeviceId>,
    pub target_device_id: DeviceId,
    pub device_type: Option<String>,
    pub capacity_mib: Option<u64>,
    pub total_cores: Option<u32>,
    pub dependencies: Vec<i64>,
}

pub fn procedure_rows(procedures: &[Procedure], resources: &[Resource]) -> Vec<ProcedureRow> {
    let devices: HashMap<&DeviceId, &Resource> = resources
        .iter()
        .map(|resource| (&resource.device.device_id, resource))
        .collect();

    procedures
        .iter()
        .map(|procedure| {
            let device = devices
                .get(&procedure.target_device_id)
                .map(|resource| &resource.device);
            ProcedureRow {
                operation_id: procedure.operation_id,
                operation: procedure.operation,
                target_cpu_id: procedure.target_cpu_id.clone(),
                target_device_id: procedure.target_device_id.clone(),
                device_type: device.map(|device| device.device_type.clone()),
                capacity_mib: device.and_then(|device| device.attribute.capacity_mib),
                total_cores: device.and_then(|device| device.attribute.total_cores),
                dependencies: procedure.dependencies.clone(),
            }
        })
        .collect()
}

pub fn format_criterion_bounds(criterion: &ToleranceCriterion) -> String {
    match (criterion.lower, criterion.upper) {
        (Some(lower), Some(upper)) => format!("{lower} - {upper}"),
        (Some(lower), None) => format!(">= {lower}"),
        (None, Some(upper)) => format!("<= {upper}"),
        (None, None) => String::new(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOrigin {
    Layout,
    Resources,
}

impl FetchOrigin {
    pub fn label(self) -> &'static str {
        match self {
            Self::Layout => "layout",
            Self::Resources => "resources",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchFailure {
    pub origin: FetchOrigin,
    pub message: String,
    pub api: Option<ApiError>,
}

impl FetchFailure {
    fn new(origin: FetchOrigin, err: &ClientError) -> Self {
        warn!(origin = origin.label(), error = %err, "detail fetch failed");
        Self {
            origin,
            message: err.to_string(),
            api: err.api_error().cloned(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DesignDetail {
    pub design: Option<DesignRecord>,
    pub resources: Vec<Resource>,
    pub errors: Vec<FetchFailure>,
}

impl DesignDetail {
    pub fn procedure_rows(&self) -> Vec<ProcedureRow> {
        self.design
            .as_ref()
            .map(|design| procedure_rows(&design.procedures, &self.resources))
            .unwrap_or_default()
    }

    pub fn tolerance_criteria(&self) -> &[ToleranceCriterion] {
        self.design
            .as_ref()
            .map(|design| design.conditions.tolerance_criteria.as_slice())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ApplyDetail {
    pub apply: Option<ApplyRecord>,
    pub resources: Vec<Resource>,
    pub errors: Vec<FetchFailure>,
}

impl ApplyDetail {
    pub fn procedure_rows(&self) -> Vec<ProcedureRow> {
        self.apply
            .as_ref()
            .map(|apply| procedure_rows(&apply.procedures, &self.resources))
            .unwrap_or_default()
    }

    /// Rollback plan rows; empty until a rollback has been requested.
    pub fn rollback_rows(&self) -> Vec<ProcedureRow> {
        match &self.apply {
            Some(apply) if apply.rollback_state() != RollbackState::NotRequested => {
                procedure_rows(&apply.rollback_procedures, &self.resources)
            }
            _ => Vec::new(),
        }
    }
}

fn collect<T>(
    result: Result<T, ClientError>,
    origin: FetchOrigin,
    errors: &mut Vec<FetchFailure>,
) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            errors.push(FetchFailure::new(origin, &err));
            None
        }
    }
}

pub async fn load_design_detail(client: &LayoutClient, id: &DesignId) -> DesignDetail {
    let (design, resources) = futures::join!(client.get_design(id), client.list_resources());
    let mut errors = Vec::new();
    let design = collect(design, FetchOrigin::Layout, &mut errors);
    let resources = collect(resources, FetchOrigin::Resources, &mut errors).unwrap_or_default();
    DesignDetail {
        design,
        resources,
        errors,
    }
}

pub async fn load_apply_detail(client: &LayoutClient, id: &ApplyId) -> ApplyDetail {
    let (apply, resources) = futures::join!(client.get_apply(id), client.list_resources());
    let mut errors = Vec::new();
    let apply = collect(apply, FetchOrigin::Layout, &mut errors);
    let resources = collect(resources, FetchOrigin::Resources, &mut errors).unwrap_or_default();
    ApplyDetail {
        apply,
        resources,
        errors,
    }
}

#[cfg(test)]
#[path = "tests/detail_tests.rs"]
mod tests;
