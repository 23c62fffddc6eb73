//! Read-only security group audit
//!
//! Lists every security group with its ingress rules and the instances that
//! reference it. Nothing is modified.

use crate::aws::ec2::{ResourceOperations, SecurityGroup, Tags};
use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use comfy_table::{Cell, ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};
use serde::Serialize;
use service_cleaner_common::defaults::{FILE_TIMESTAMP_FORMAT, SG_REPORT_FILE_PREFIX};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// One audited group
#[derive(Debug, Clone, PartialEq)]
pub struct GroupAudit {
    pub region: String,
    pub group: SecurityGroup,
    pub attached_instances: Vec<String>,
    /// Dependent lookup failure, if any
    pub error: Option<String>,
}

/// Report row: one per ingress source, or one for a group without rules
#[derive(Debug, Clone, Copy, Serialize)]
struct AuditRow<'a> {
    #[serde(rename = "Region")]
    region: &'a str,
    #[serde(rename = "OwnerId")]
    owner_id: Option<&'a str>,
    #[serde(rename = "SG Name")]
    group_name: Option<&'a str>,
    #[serde(rename = "SG Id")]
    group_id: &'a str,
    #[serde(rename = "VpcId")]
    vpc_id: Option<&'a str>,
    #[serde(rename = "FromPort")]
    from_port: Option<i32>,
    #[serde(rename = "ToPort")]
    to_port: Option<i32>,
    #[serde(rename = "IpProtocol")]
    ip_protocol: Option<&'a str>,
    #[serde(rename = "Source")]
    source: Option<&'a str>,
    #[serde(rename = "Instances")]
    instances: &'a [String],
    #[serde(rename = "Tags")]
    tags: Option<&'a Tags>,
    #[serde(rename = "Errors", skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
}

/// Audit every security group in one region. A listing failure yields no
/// entries; a failed dependent lookup is kept on the entry.
pub async fn audit_region<C: ResourceOperations>(client: &C, region: &str) -> Vec<GroupAudit> {
    let groups = match client.list_security_groups().await {
        Ok(groups) => groups,
        Err(e) => {
            error!(region = %region, error = %e, "Failed to list security groups");
            return Vec::new();
        }
    };

    info!(region = %region, count = groups.len(), "Auditing security groups");

    let mut audits = Vec::with_capacity(groups.len());
    for group in groups {
        let (attached_instances, error) = match client.list_dependent_instances(&group.group_id).await {
            Ok(ids) => (ids, None),
            Err(e) => {
                warn!(region = %region, group_id = %group.group_id, error = %e, "Dependent lookup failed");
                (Vec::new(), Some(e.to_string()))
            }
        };

        audits.push(GroupAudit {
            region: region.to_string(),
            group,
            attached_instances,
            error,
        });
    }
    audits
}

fn rows(audits: &[GroupAudit]) -> Vec<AuditRow<'_>> {
    audits
        .iter()
        .flat_map(|audit| {
            let base = AuditRow {
                region: &audit.region,
                owner_id: audit.group.owner_id.as_deref(),
                group_name: audit.group.group_name.as_deref(),
                group_id: &audit.group.group_id,
                vpc_id: audit.group.vpc_id.as_deref(),
                from_port: None,
                to_port: None,
                ip_protocol: None,
                source: None,
                instances: &audit.attached_instances,
                tags: audit.group.tags.as_ref(),
                error: audit.error.as_deref(),
            };

            if audit.group.ingress.is_empty() {
                return vec![base];
            }

            audit
                .group
                .ingress
                .iter()
                .map(|rule| AuditRow {
                    from_port: rule.from_port,
                    to_port: rule.to_port,
                    ip_protocol: rule.ip_protocol.as_deref(),
                    source: Some(rule.source.as_str()),
                    ..base
                })
                .collect()
        })
        .collect()
}

/// Audit report path for a run started at `now`
pub fn report_path(dir: &Path, now: DateTime<Local>) -> PathBuf {
    dir.join(format!(
        "{SG_REPORT_FILE_PREFIX}{}.json",
        now.format(FILE_TIMESTAMP_FORMAT)
    ))
}

/// Write the audit as a JSON array of rows
pub fn write_report(path: &Path, audits: &[GroupAudit]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let file = File::create(path)
        .with_context(|| format!("Failed to create report {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), &rows(audits))
        .with_context(|| format!("Failed to write report {}", path.display()))?;

    info!(path = %path.display(), groups = audits.len(), "Security group report written");
    Ok(())
}

/// Console table, one line per group
pub fn render_table(audits: &[GroupAudit]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Region"),
            Cell::new("SG Id"),
            Cell::new("SG Name"),
            Cell::new("Ingress"),
            Cell::new("Instances"),
        ]);

    for audit in audits {
        let ingress = audit
            .group
            .ingress
            .iter()
            .map(|r| {
                let ports = match (r.from_port, r.to_port) {
                    (Some(from), Some(to)) if from == to => from.to_string(),
                    (Some(from), Some(to)) => format!("{from}-{to}"),
                    _ => "all".to_string(),
                };
                format!(
                    "{}/{} from {}",
                    r.ip_protocol.as_deref().unwrap_or("-"),
                    ports,
                    r.source
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        let instances = if audit.attached_instances.is_empty() {
            "N/A".to_string()
        } else {
            audit.attached_instances.join(", ")
        };

        table.add_row(vec![
            Cell::new(&audit.region),
            Cell::new(&audit.group.group_id),
            Cell::new(audit.group.group_name.as_deref().unwrap_or("-")),
            Cell::new(if ingress.is_empty() { "-".to_string() } else { ingress }),
            Cell::new(instances),
        ]);
    }

    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aws::AwsError;
    use crate::aws::ec2::{IngressRule, MockResourceOperations};
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn group(id: &str, ingress: Vec<IngressRule>) -> SecurityGroup {
        SecurityGroup {
            group_id: id.to_string(),
            group_name: Some(format!("{id}-name")),
            ingress,
            ..Default::default()
        }
    }

    fn ssh_from(source: &str) -> IngressRule {
        IngressRule {
            ip_protocol: Some("tcp".to_string()),
            from_port: Some(22),
            to_port: Some(22),
            source: source.to_string(),
        }
    }

    #[tokio::test]
    async fn audit_never_deletes() {
        let mut mock = MockResourceOperations::new();
        mock.expect_list_security_groups()
            .returning(|| Ok(vec![group("sg-1", Vec::new()), group("sg-2", Vec::new())]));
        mock.expect_list_dependent_instances().returning(|id| {
            if id == "sg-2" {
                Err(AwsError::Throttled {
                    code: "RequestLimitExceeded".to_string(),
                    message: "slow down".to_string(),
                })
            } else {
                Ok(vec!["i-1".to_string()])
            }
        });
        mock.expect_delete_security_group().never();

        let audits = audit_region(&mock, "us-east-1").await;

        assert_eq!(audits.len(), 2);
        assert_eq!(audits[0].attached_instances, vec!["i-1".to_string()]);
        assert!(audits[0].error.is_none());
        assert!(audits[1].error.is_some());
    }

    #[tokio::test]
    async fn list_failure_yields_nothing() {
        let mut mock = MockResourceOperations::new();
        mock.expect_list_security_groups().returning(|| {
            Err(AwsError::Unauthorized {
                code: "AuthFailure".to_string(),
                message: "bad credentials".to_string(),
            })
        });

        assert!(audit_region(&mock, "us-east-1").await.is_empty());
    }

    #[test]
    fn one_row_per_ingress_source() {
        let audits = vec![
            GroupAudit {
                region: "eu-west-1".to_string(),
                group: group("sg-1", vec![ssh_from("10.0.0.0/8"), ssh_from("sg-peer")]),
                attached_instances: Vec::new(),
                error: None,
            },
            GroupAudit {
                region: "eu-west-1".to_string(),
                group: group("sg-2", Vec::new()),
                attached_instances: Vec::new(),
                error: None,
            },
        ];

        let rows = rows(&audits);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1].source, Some("sg-peer"));
        assert_eq!(rows[2].group_id, "sg-2");
        assert_eq!(rows[2].source, None);
    }

    #[test]
    fn report_is_written_as_json_rows() {
        let dir = TempDir::new().unwrap();
        let now = Local.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let path = report_path(dir.path(), now);
        assert!(path.ends_with("SG_report_2024-Jan-02_03-04-05.json"));

        let audits = vec![GroupAudit {
            region: "us-east-1".to_string(),
            group: group("sg-1", vec![ssh_from("0.0.0.0/0")]),
            attached_instances: vec!["i-1".to_string()],
            error: None,
        }];
        write_report(&path, &audits).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json[0]["SG Id"], "sg-1");
        assert_eq!(json[0]["FromPort"], 22);
        assert_eq!(json[0]["Source"], "0.0.0.0/0");
        assert_eq!(json[0]["Instances"][0], "i-1");
        assert!(json[0].get("Errors").is_none());

        let table = render_table(&audits).to_string();
        assert!(table.contains("tcp/22 from 0.0.0.0/0"));
    }
}
