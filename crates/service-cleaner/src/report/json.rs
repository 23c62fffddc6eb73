//! JSON report file with one section per resource kind

use super::OutcomeReporter;
use crate::aws::ec2::{Image, Instance, SecurityGroup, Snapshot, Tags, Volume};
use crate::record::{BatchAction, OutcomeRecord, Subject};
use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use serde::Serialize;
use service_cleaner_common::ResourceKind;
use service_cleaner_common::defaults::{FILE_TIMESTAMP_FORMAT, REPORT_FILE_PREFIX};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct InstanceRow {
    operation_done: &'static str,
    instance_id: String,
    instance_type: Option<String>,
    availability_zone: Option<String>,
    region: String,
    private_ip_address: Option<String>,
    public_dns_name: String,
    state: Option<String>,
    subnet_id: Option<String>,
    vpc_id: Option<String>,
    root_device_type: Option<String>,
    volumes: String,
    #[serde(rename = "SecurityGroups Name")]
    security_group_names: String,
    security_groups: String,
    tags: Option<Tags>,
    errors: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct VolumeRow {
    operation_done: &'static str,
    volume_id: String,
    availability_zone: Option<String>,
    region: String,
    state: String,
    iops: Option<i32>,
    volume_type: Option<String>,
    tags: Option<Tags>,
    errors: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct SnapshotRow {
    operation_done: &'static str,
    #[serde(rename = "SnapshotID")]
    snapshot_id: String,
    volume_id: Option<String>,
    region: String,
    errors: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct ImageRow {
    operation_done: &'static str,
    image_id: String,
    name: Option<String>,
    region: String,
    owner_id: Option<String>,
    image_type: Option<String>,
    creation_date: Option<String>,
    tags: Option<Tags>,
    errors: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct SecurityGroupRow {
    operation_done: &'static str,
    #[serde(rename = "SG Id")]
    group_id: String,
    #[serde(rename = "SG Name")]
    group_name: Option<String>,
    owner_id: Option<String>,
    region: String,
    vpc_id: Option<String>,
    instances: Vec<String>,
    errors: Option<String>,
}

/// Failure that concerns a whole batch rather than one resource
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct BatchRow {
    operation_done: &'static str,
    batch: BatchAction,
    region: String,
    instance_ids: Vec<String>,
    errors: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Row {
    Instance(InstanceRow),
    Volume(VolumeRow),
    Snapshot(SnapshotRow),
    Image(ImageRow),
    SecurityGroup(SecurityGroupRow),
    Batch(BatchRow),
}

#[derive(Debug, Default, Serialize)]
struct Sections {
    #[serde(rename = "EC2")]
    instances: Vec<Row>,
    #[serde(rename = "Volumes")]
    volumes: Vec<Row>,
    #[serde(rename = "Snapshots")]
    snapshots: Vec<Row>,
    #[serde(rename = "Images")]
    images: Vec<Row>,
    #[serde(rename = "SG")]
    security_groups: Vec<Row>,
}

impl Sections {
    fn for_kind(&mut self, kind: ResourceKind) -> &mut Vec<Row> {
        match kind {
            ResourceKind::Instance => &mut self.instances,
            ResourceKind::Volume => &mut self.volumes,
            ResourceKind::Snapshot => &mut self.snapshots,
            ResourceKind::Image => &mut self.images,
            ResourceKind::SecurityGroup => &mut self.security_groups,
        }
    }
}

#[derive(Debug, Serialize)]
struct Document<'a> {
    generated_at: String,
    dry_run: bool,
    account_id: &'a str,
    sections: &'a Sections,
}

fn join_display<I: IntoIterator<Item = String>>(items: I) -> String {
    items.into_iter().collect::<Vec<_>>().join(", ")
}

fn instance_row(label: &'static str, region: &str, i: &Instance, errors: Option<String>) -> InstanceRow {
    InstanceRow {
        operation_done: label,
        instance_id: i.instance_id.clone(),
        instance_type: i.instance_type.clone(),
        availability_zone: i.availability_zone.clone(),
        region: region.to_string(),
        private_ip_address: i.private_ip.clone(),
        public_dns_name: i.public_dns.clone().unwrap_or_else(|| "N/A".to_string()),
        state: i.state.clone(),
        subnet_id: i.subnet_id.clone(),
        vpc_id: i.vpc_id.clone(),
        root_device_type: i.root_device_type.clone(),
        volumes: join_display(i.volumes.iter().map(|v| {
            format!("{}({})", v.volume_id, v.status.as_deref().unwrap_or("unknown"))
        })),
        security_group_names: join_display(
            i.security_groups
                .iter()
                .map(|g| g.group_name.clone().unwrap_or_default()),
        ),
        security_groups: join_display(i.security_groups.iter().map(|g| g.group_id.clone())),
        tags: i.tags.clone(),
        errors,
    }
}

fn volume_row(label: &'static str, region: &str, v: &Volume, errors: Option<String>) -> VolumeRow {
    VolumeRow {
        operation_done: label,
        volume_id: v.volume_id.clone(),
        availability_zone: v.availability_zone.clone(),
        region: region.to_string(),
        state: v.state.clone(),
        iops: v.iops,
        volume_type: v.volume_type.clone(),
        tags: v.tags.clone(),
        errors,
    }
}

fn image_row(label: &'static str, region: &str, i: &Image, errors: Option<String>) -> ImageRow {
    ImageRow {
        operation_done: label,
        image_id: i.image_id.clone(),
        name: i.name.clone(),
        region: region.to_string(),
        owner_id: i.owner_id.clone(),
        image_type: i.image_type.clone(),
        creation_date: i.creation_date.clone(),
        tags: i.tags.clone(),
        errors,
    }
}

fn snapshot_row(label: &'static str, region: &str, s: &Snapshot, errors: Option<String>) -> SnapshotRow {
    SnapshotRow {
        operation_done: label,
        snapshot_id: s.snapshot_id.clone(),
        volume_id: s.volume_id.clone(),
        region: region.to_string(),
        errors,
    }
}

fn security_group_row(
    label: &'static str,
    region: &str,
    g: &SecurityGroup,
    instances: &[String],
    errors: Option<String>,
) -> SecurityGroupRow {
    SecurityGroupRow {
        operation_done: label,
        group_id: g.group_id.clone(),
        group_name: g.group_name.clone(),
        owner_id: g.owner_id.clone(),
        region: region.to_string(),
        vpc_id: g.vpc_id.clone(),
        instances: instances.to_vec(),
        errors,
    }
}

fn to_row(record: &OutcomeRecord) -> Row {
    let label = record.decision_label();
    let region = record.region.as_str();
    let errors = record.error.as_ref().map(ToString::to_string);

    match &record.subject {
        Subject::Instance(i) => Row::Instance(instance_row(label, region, i, errors)),
        Subject::Volume(v) => Row::Volume(volume_row(label, region, v, errors)),
        Subject::Snapshot(s) => Row::Snapshot(snapshot_row(label, region, s, errors)),
        Subject::Image(i) => Row::Image(image_row(label, region, i, errors)),
        Subject::SecurityGroup {
            group,
            attached_instances,
        } => Row::SecurityGroup(security_group_row(
            label,
            region,
            group,
            attached_instances,
            errors,
        )),
        Subject::Batch {
            action,
            instance_ids,
        } => Row::Batch(BatchRow {
            operation_done: label,
            batch: *action,
            region: region.to_string(),
            instance_ids: instance_ids.clone(),
            errors,
        }),
    }
}

/// Collects records into per-kind sections and writes them as one JSON
/// document on [`finish`](OutcomeReporter::finish).
pub struct JsonReport {
    path: PathBuf,
    account_id: String,
    dry_run: bool,
    started_at: DateTime<Local>,
    sections: Sections,
}

impl JsonReport {
    /// Report file named after the current time inside `dir`
    pub fn new(dir: &Path, account_id: &str, dry_run: bool) -> Self {
        let started_at = Local::now();
        let file_name = format!(
            "{REPORT_FILE_PREFIX}{}.json",
            started_at.format(FILE_TIMESTAMP_FORMAT)
        );
        Self {
            path: dir.join(file_name),
            account_id: account_id.to_string(),
            dry_run,
            started_at,
            sections: Sections::default(),
        }
    }

    /// Where the report will be written
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl OutcomeReporter for JsonReport {
    fn record(&mut self, record: &OutcomeRecord) {
        self.sections.for_kind(record.kind).push(to_row(record));
    }

    fn finish(&mut self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let file = File::create(&self.path)
            .with_context(|| format!("Failed to create report {}", self.path.display()))?;

        let document = Document {
            generated_at: self.started_at.to_rfc3339(),
            dry_run: self.dry_run,
            account_id: &self.account_id,
            sections: &self.sections,
        };
        serde_json::to_writer_pretty(BufWriter::new(file), &document)
            .with_context(|| format!("Failed to write report {}", self.path.display()))?;

        info!(path = %self.path.display(), "Report written");
        Ok(())
    }
}
