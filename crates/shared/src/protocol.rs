use serde::{Deserialize, Serialize};

use crate::domain::{ApplyRecord, DesignRecord, Policy, Resource};

/// Paged list envelope shared by the layout services.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPage<T> {
    #[serde(default)]
    pub count: usize,
    #[serde(default)]
    pub total_count: usize,
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignListPage {
    #[serde(default)]
    pub total_count: usize,
    #[serde(default, alias = "designs")]
    pub data: Vec<DesignRecord>,
}

pub type ApplyListPage = ListPage<ApplyRecord>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceListPage {
    #[serde(default)]
    pub count: usize,
    #[serde(default, alias = "data")]
    pub resources: Vec<Resource>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyListPage {
    #[serde(default)]
    pub total_count: usize,
    #[serde(default, alias = "data")]
    pub policies: Vec<Policy>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitQuery {
    pub limit: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceQuery {
    pub detail: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// Body returned by `PUT /layout-apply/{id}`; kept loose because the
/// services answer with different shapes per action.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ControlResponse {
    #[serde(default)]
    pub body: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn design_list_accepts_designs_key() {
        let page: DesignListPage = serde_json::from_str(
            r#"{"totalCount": 1, "designs": [{"designID": "d-1", "status": "COMPLETED"}]}"#,
        )
        .expect("decode design page");
        assert_eq!(page.data.len(), 1);
        assert_eq!(page.data[0].id.as_str(), "d-1");
    }

    #[test]
    fn apply_list_tolerates_missing_counts() {
        let page: ApplyListPage =
            serde_json::from_str(r#"{"data": [{"applyID": "a-1", "status": "FAILED"}]}"#)
                .expect("decode apply page");
        assert_eq!(page.count, 0);
        assert_eq!(page.data.len(), 1);
    }
}
