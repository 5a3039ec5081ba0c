use super::*;
use crate::test_support::{apply_json, client_for, spawn_backend, MockBackend};
use serde_json::json;

fn resources() -> Vec<Resource> {
    serde_json::from_value(json!([
        {"device": {"deviceID": "cpu-1", "type": "CPU", "attribute": {"totalCores": 32}}},
        {"device": {"deviceID": "mem-1", "type": "memory", "attribute": {"capacityMiB": 8192}}}
    ]))
    .expect("resources")
}

fn procedures() -> Vec<Procedure> {
    serde_json::from_value(json!([
        {"operationID": 1, "operation": "shutdown", "targetDeviceID": "cpu-1", "dependencies": []},
        {"operationID": 2, "operation": "connect", "targetCPUID": "cpu-1",
         "targetDeviceID": "mem-1", "dependencies": [1]},
        {"operationID": 3, "operation": "boot", "targetDeviceID": "cpu-9", "dependencies": [2]}
    ]))
    .expect("procedures")
}

#[test]
fn procedure_rows_join_device_metadata() {
    let rows = procedure_rows(&procedures(), &resources());

    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].device_type.as_deref(), Some("CPU"));
    assert_eq!(rows[0].total_cores, Some(32));
    assert_eq!(rows[1].capacity_mib, Some(8192));
    assert_eq!(rows[1].target_cpu_id, Some(DeviceId::from("cpu-1")));
    assert_eq!(rows[1].dependencies, vec![1]);
}

#[test]
fn unknown_devices_keep_empty_columns() {
    let rows = procedure_rows(&procedures(), &[]);
    assert!(rows.iter().all(|row| row.device_type.is_none()));

    let rows = procedure_rows(&procedures(), &resources());
    assert_eq!(rows[2].target_device_id.as_str(), "cpu-9");
    assert!(rows[2].device_type.is_none());
    assert!(rows[2].capacity_mib.is_none());
}

#[test]
fn criterion_bounds_render_open_sides() {
    let criterion = |lower, upper| ToleranceCriterion {
        target: "CPU".to_string(),
        metric: "usageRate".to_string(),
        lower,
        upper,
    };
    assert_eq!(format_criterion_bounds(&criterion(Some(10.0), Some(80.0))), "10 - 80");
    assert_eq!(format_criterion_bounds(&criterion(None, Some(80.5))), "<= 80.5");
    assert_eq!(format_criterion_bounds(&criterion(Some(1.0), None)), ">= 1");
    assert_eq!(format_criterion_bounds(&criterion(None, None)), "");
}

#[tokio::test]
async fn design_detail_combines_design_and_resources() {
    let backend = MockBackend::default();
    backend.designs.lock().await.push(json!({
        "designID": "design-1",
        "status": "COMPLETED",
        "conditions": {"toleranceCriteria": [
            {"target": "CPU", "metric": "usageRate", "upper": 80.0}
        ]},
        "procedures": serde_json::to_value(procedures()).expect("procedures json"),
    }));
    backend.resources.lock().await.extend(
        resources()
            .into_iter()
            .map(|resource| serde_json::to_value(resource).expect("resource json")),
    );
    let client = client_for(&spawn_backend(backend).await);

    let detail = load_design_detail(&client, &"design-1".into()).await;

    assert!(detail.errors.is_empty());
    assert_eq!(detail.tolerance_criteria().len(), 1);
    let rows = detail.procedure_rows();
    assert_eq!(rows[1].capacity_mib, Some(8192));
}

#[tokio::test]
async fn both_fetch_failures_are_reported_independently() {
    let backend = MockBackend::default();
    *backend.fail_resources.lock().await = true;
    let client = client_for(&spawn_backend(backend).await);

    let detail = load_design_detail(&client, &"missing".into()).await;

    assert!(detail.design.is_none());
    let origins: Vec<FetchOrigin> = detail.errors.iter().map(|err| err.origin).collect();
    assert_eq!(origins, [FetchOrigin::Layout, FetchOrigin::Resources]);
    assert_eq!(
        detail.errors[1].api.as_ref().map(|api| api.code.as_str()),
        Some("E50000")
    );
    assert!(detail.procedure_rows().is_empty());
}

#[tokio::test]
async fn resource_failure_leaves_apply_detail_usable() {
    let backend = MockBackend::default();
    let mut record = apply_json("apply-1", "CANCELED", Some("IN_PROGRESS"));
    record["procedures"] = serde_json::to_value(procedures()).expect("procedures json");
    record["rollbackProcedures"] = json!([
        {"operationID": 10, "operation": "disconnect", "targetCPUID": "cpu-1",
         "targetDeviceID": "mem-1", "dependencies": []}
    ]);
    backend.applies.lock().await.push(record);
    *backend.fail_resources.lock().await = true;
    let client = client_for(&spawn_backend(backend).await);

    let detail = load_apply_detail(&client, &"apply-1".into()).await;

    assert_eq!(detail.errors.len(), 1);
    assert_eq!(detail.errors[0].origin, FetchOrigin::Resources);
    assert_eq!(detail.procedure_rows().len(), 3);
    assert_eq!(detail.rollback_rows().len(), 1);
    assert!(detail.rollback_rows()[0].device_type.is_none());
}

#[test]
fn rollback_rows_are_hidden_until_rollback_is_requested() {
    let mut apply: ApplyRecord = serde_json::from_value(json!({
        "applyID": "apply-1",
        "status": "IN_PROGRESS",
        "rollbackProcedures": [
            {"operationID": 10, "operation": "disconnect", "targetDeviceID": "mem-1"}
        ]
    }))
    .expect("apply");
    let detail = ApplyDetail {
        apply: Some(apply.clone()),
        ..ApplyDetail::default()
    };
    assert!(detail.rollback_rows().is_empty());

    apply.execute_rollback = true;
    let detail = ApplyDetail {
        apply: Some(apply),
        ..ApplyDetail::default()
    };
    assert_eq!(detail.rollback_rows().len(), 1);
}
