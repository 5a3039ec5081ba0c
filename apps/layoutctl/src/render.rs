//! Plain-text rendering of lists and detail views.

use client_core::{
    detail::{format_criterion_bounds, ApplyDetail, DesignDetail, FetchFailure, ProcedureRow},
    format::{format_duration, format_timestamp},
    DerivedStatus,
};
use shared::domain::{ApplyRecord, DesignRecord, Policy, RollbackState};

fn table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|header| header.len()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let line = |cells: Vec<&str>| {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, &width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = vec![line(headers.to_vec())];
    out.extend(
        rows.iter()
            .map(|row| line(row.iter().map(String::as_str).collect())),
    );
    out.join("\n")
}

fn optional<T: ToString>(value: Option<T>) -> String {
    value.map(|value| value.to_string()).unwrap_or_default()
}

pub fn actions_text(derived: &DerivedStatus) -> String {
    derived
        .active_actions
        .iter()
        .map(|action| action.label())
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn apply_table<'a>(
    records: impl IntoIterator<Item = &'a ApplyRecord>,
    derive: impl Fn(&ApplyRecord) -> DerivedStatus,
) -> String {
    let rows: Vec<Vec<String>> = records
        .into_iter()
        .map(|record| {
            let derived = derive(record);
            vec![
                record.id.to_string(),
                derived.phase_text.to_string(),
                derived.status_text.to_string(),
                format_timestamp(record.started_at),
                format_timestamp(record.ended_at),
                format_duration(record.started_at, record.ended_at),
                actions_text(&derived),
            ]
        })
        .collect();
    table(
        &["ID", "PHASE", "STATUS", "STARTED", "ENDED", "DURATION", "ACTIONS"],
        &rows,
    )
}

pub fn design_table<'a>(records: impl IntoIterator<Item = &'a DesignRecord>) -> String {
    let rows: Vec<Vec<String>> = records
        .into_iter()
        .map(|record| {
            vec![
                record.id.to_string(),
                record.status.to_string(),
                format_timestamp(record.started_at),
                format_timestamp(record.ended_at),
                format_duration(record.started_at, record.ended_at),
            ]
        })
        .collect();
    table(&["ID", "STATUS", "STARTED", "ENDED", "DURATION"], &rows)
}

pub fn procedure_table(rows: &[ProcedureRow]) -> String {
    let rows: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            vec![
                row.operation_id.to_string(),
                row.operation.as_str().to_string(),
                optional(row.target_cpu_id.as_ref()),
                row.target_device_id.to_string(),
                optional(row.device_type.as_ref()),
                optional(row.capacity_mib),
                optional(row.total_cores),
                row.dependencies
                    .iter()
                    .map(i64::to_string)
                    .collect::<Vec<_>>()
                    .join(","),
            ]
        })
        .collect();
    table(
        &[
            "OP", "OPERATION", "CPU", "DEVICE", "TYPE", "CAPACITY_MIB", "CORES", "DEPENDS_ON",
        ],
        &rows,
    )
}

pub fn fetch_errors(errors: &[FetchFailure]) -> String {
    errors
        .iter()
        .map(|failure| {
            format!(
                "error: failed to load {}: {}",
                failure.origin.label(),
                failure.message
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn apply_detail(detail: &ApplyDetail, derived: &DerivedStatus) -> String {
    let mut sections = Vec::new();
    if !detail.errors.is_empty() {
        sections.push(fetch_errors(&detail.errors));
    }
    let Some(apply) = &detail.apply else {
        return sections.join("\n\n");
    };

    let rollback = match apply.rollback_state() {
        RollbackState::NotRequested => "not requested".to_string(),
        RollbackState::Requested => "requested".to_string(),
        RollbackState::Reported(status) => status.to_string(),
    };
    let mut fields = vec![
        format!("ID:         {}", apply.id),
        format!("Phase:      {}", derived.phase_text),
        format!("Status:     {}", derived.status_text),
        format!("Rollback:   {rollback}"),
        format!("Started:    {}", format_timestamp(apply.started_at)),
        format!("Ended:      {}", format_timestamp(apply.ended_at)),
        format!(
            "Duration:   {}",
            format_duration(apply.started_at, apply.ended_at)
        ),
    ];
    for (label, value) in [
        ("Suspended:  ", apply.suspended_at),
        ("Resumed:    ", apply.resumed_at),
        ("Canceled:   ", apply.canceled_at),
    ] {
        if value.is_some() {
            fields.push(format!("{label}{}", format_timestamp(value)));
        }
    }
    fields.push(format!("Actions:    {}", actions_text(derived)));
    sections.push(fields.join("\n"));

    sections.push(format!(
        "Procedures\n{}",
        procedure_table(&detail.procedure_rows())
    ));
    let rollback_rows = detail.rollback_rows();
    if !rollback_rows.is_empty() {
        sections.push(format!(
            "Rollback procedures\n{}",
            procedure_table(&rollback_rows)
        ));
    }
    sections.join("\n\n")
}

pub fn design_detail(detail: &DesignDetail) -> String {
    let mut sections = Vec::new();
    if !detail.errors.is_empty() {
        sections.push(fetch_errors(&detail.errors));
    }
    let Some(design) = &detail.design else {
        return sections.join("\n\n");
    };

    let mut fields = vec![
        format!("ID:         {}", design.id),
        format!("Status:     {}", design.status),
        format!("Started:    {}", format_timestamp(design.started_at)),
        format!("Ended:      {}", format_timestamp(design.ended_at)),
        format!(
            "Duration:   {}",
            format_duration(design.started_at, design.ended_at)
        ),
    ];
    if let Some(cause) = &design.cause {
        fields.push(format!("Cause:      {cause}"));
    }
    sections.push(fields.join("\n"));

    let criteria: Vec<Vec<String>> = detail
        .tolerance_criteria()
        .iter()
        .map(|criterion| {
            vec![
                criterion.target.clone(),
                criterion.metric.clone(),
                format_criterion_bounds(criterion),
            ]
        })
        .collect();
    if !criteria.is_empty() {
        sections.push(format!(
            "Tolerance criteria\n{}",
            table(&["TARGET", "METRIC", "RANGE"], &criteria)
        ));
    }
    sections.push(format!(
        "Procedures\n{}",
        procedure_table(&detail.procedure_rows())
    ));
    sections.join("\n\n")
}

pub fn policy_table(policies: &[Policy]) -> String {
    let rows: Vec<Vec<String>> = policies
        .iter()
        .map(|policy| {
            vec![
                policy.id.to_string(),
                policy.category.to_string(),
                policy.title.clone(),
                if policy.enabled { "yes" } else { "no" }.to_string(),
            ]
        })
        .collect();
    table(&["ID", "CATEGORY", "TITLE", "ENABLED"], &rows)
}

#[cfg(test)]
mod tests {
    use client_core::{derive_status, ControlAction};
    use serde_json::json;
    use shared::domain::ApplyStatus;

    use super::*;

    fn apply(value: serde_json::Value) -> ApplyRecord {
        serde_json::from_value(value).expect("apply record")
    }

    #[test]
    fn table_pads_columns_to_widest_cell() {
        let rendered = table(
            &["ID", "STATUS"],
            &[
                vec!["a".to_string(), "IN_PROGRESS".to_string()],
                vec!["long-id".to_string(), "".to_string()],
            ],
        );
        assert_eq!(rendered, "ID       STATUS\na        IN_PROGRESS\nlong-id");
    }

    #[test]
    fn apply_table_shows_derived_phase_and_actions() {
        let records = [
            apply(json!({"applyID": "test-0001", "status": "IN_PROGRESS"})),
            apply(json!({"applyID": "test-0002", "status": "CANCELED", "rollbackStatus": "SUSPENDED"})),
        ];
        let rendered = apply_table(&records, |record| {
            derive_status(Some(record.status), record.rollback_status, true)
        });
        let lines: Vec<&str> = rendered.lines().collect();
        assert!(lines[1].contains("Apply") && lines[1].contains("Cancel, Rollback"));
        assert!(lines[2].contains("Rollback") && lines[2].contains("Forced Termination, Resume"));
    }

    #[test]
    fn apply_detail_reports_requested_rollback() {
        let record = apply(json!({
            "applyID": "a-1",
            "status": "CANCELING",
            "executeRollback": true
        }));
        let derived = derive_status(Some(record.status), record.rollback_status, true);
        let rendered = apply_detail(
            &ApplyDetail {
                apply: Some(record),
                ..ApplyDetail::default()
            },
            &derived,
        );
        assert!(rendered.contains("Rollback:   requested"));
        assert!(rendered.contains("Status:     Canceling"));
    }

    #[test]
    fn actions_text_uses_labels() {
        let derived = DerivedStatus {
            phase_text: "Apply",
            status_text: "Suspended",
            active_actions: vec![ControlAction::ForcedTermination, ControlAction::Resume],
        };
        assert_eq!(actions_text(&derived), "Forced Termination, Resume");
        assert_eq!(
            actions_text(&derive_status(Some(ApplyStatus::Completed), None, true)),
            ""
        );
    }
}
