//! The shared hourly health CSV (L-CSV): one file handle, one global
//! mutex, used by every active source's sampler. Lazy creation means no
//! file appears for an hour with zero snapshots (P11).

use super::HealthSnapshot;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

const HEADER: &[&str] = &[
    "timestamp",
    "timestamp_str",
    "source_name",
    "rtmp_url",
    "media_state",
    "media_duration",
    "media_time",
    "is_visible",
    "scene_name",
    "obs_fps",
    "dropped_frames",
    "buffer_level",
    "gstreamer_state",
    "pipeline_healthy",
    "pipeline_warnings",
    "frame_drop_rate",
    "health_score",
    "issues",
    "poll_count",
    "visibility_problematic",
    "visibility_issue_type",
];

#[derive(Default)]
struct SourceSummary {
    count: u64,
    score_sum: u64,
    issue_counts: HashMap<String, u64>,
}

struct CsvMeta {
    hour: DateTime<Utc>,
    path: PathBuf,
    summary: HashMap<String, SourceSummary>,
}

pub struct HourlyCsv {
    meta: Mutex<Option<CsvMeta>>,
}

impl HourlyCsv {
    pub fn new() -> Self {
        Self { meta: Mutex::new(None) }
    }

    pub async fn append(&self, dir: &Path, snapshot: &HealthSnapshot) -> std::io::Result<()> {
        let bucket = motherstream_common::time::hour_bucket(snapshot.timestamp);
        let mut guard = self.meta.lock().await;

        let rolled_over = matches!(&*guard, Some(state) if state.hour != bucket);
        if rolled_over {
            if let Some(state) = guard.take() {
                Self::write_report(&state).await?;
            }
        }

        if guard.is_none() {
            let stamp = motherstream_common::time::hour_stamp(bucket);
            let path = dir.join(format!("stream-health-{stamp}.csv"));
            *guard = Some(CsvMeta { hour: bucket, path, summary: HashMap::new() });
        }

        let state = guard.as_mut().expect("just initialized above");
        let path = state.path.clone();
        let row = row_for(snapshot);
        tokio::task::spawn_blocking(move || -> std::io::Result<()> {
            let needs_header = !path.exists();
            let file = std::fs::OpenOptions::new().create(true).append(true).open(&path)?;
            let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
            if needs_header {
                writer.write_record(HEADER)?;
            }
            writer.write_record(&row)?;
            writer.flush()
        })
        .await
        .expect("health csv writer task panicked")?;

        let summary = state.summary.entry(snapshot.source_name.clone()).or_default();
        summary.count += 1;
        summary.score_sum += snapshot.health_score as u64;
        for issue in &snapshot.issues {
            *summary.issue_counts.entry(issue.clone()).or_insert(0) += 1;
        }

        Ok(())
    }

    async fn write_report(state: &CsvMeta) -> std::io::Result<()> {
        let report_path = state.path.with_file_name(format!(
            "{}-report.txt",
            state.path.file_stem().unwrap_or_default().to_string_lossy()
        ));
        let mut report = format!("Hourly health report for {}\n", state.path.display());
        for (source, summary) in &state.summary {
            let avg = if summary.count > 0 { summary.score_sum as f64 / summary.count as f64 } else { 0.0 };
            report.push_str(&format!("- {source}: {} samples, avg score {:.1}\n", summary.count, avg));
            for (issue, count) in &summary.issue_counts {
                report.push_str(&format!("    {issue}: {count}\n"));
            }
        }
        tokio::fs::write(report_path, report).await
    }
}

fn row_for(s: &HealthSnapshot) -> Vec<String> {
    vec![
        s.timestamp.timestamp().to_string(),
        s.timestamp.to_rfc3339(),
        s.source_name.clone(),
        s.rtmp_url.clone(),
        format!("{:?}", s.media_state),
        s.media_duration.to_string(),
        s.media_time.to_string(),
        s.is_visible.to_string(),
        s.scene_name.clone(),
        s.obs_fps.to_string(),
        s.dropped_frames.to_string(),
        s.buffer_level.to_string(),
        s.pipeline_state.to_string(),
        s.pipeline_healthy.to_string(),
        s.pipeline_warnings.join("; "),
        s.frame_drop_rate.to_string(),
        s.health_score.to_string(),
        s.issues.join("; "),
        s.poll_count.to_string(),
        s.visibility_problematic.to_string(),
        s.visibility_issue_type.clone().unwrap_or_default(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compositor::MediaState;
    use crate::health::sampler::PipelineState;
    use chrono::TimeZone;

    fn snapshot_at(hour: u32, source: &str) -> HealthSnapshot {
        HealthSnapshot {
            timestamp: Utc.with_ymd_and_hms(2026, 7, 27, hour, 30, 0).unwrap(),
            source_name: source.to_string(),
            rtmp_url: "rtmp://example/live/a".to_string(),
            media_state: MediaState::Playing,
            media_duration: 100.0,
            media_time: 10.0,
            is_visible: true,
            scene_name: "Motherstream".to_string(),
            obs_fps: 30.0,
            dropped_frames: 0,
            buffer_level: 0.0,
            pipeline_state: PipelineState::Playing,
            pipeline_healthy: true,
            pipeline_warnings: vec![],
            frame_drop_rate: 0.0,
            health_score: 100,
            issues: vec![],
            poll_count: 1,
            visibility_problematic: false,
            visibility_issue_type: None,
        }
    }

    #[tokio::test]
    async fn no_file_created_until_first_append() {
        let dir = tempfile::tempdir().unwrap();
        let csv = HourlyCsv::new();
        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert!(entries.is_empty());

        csv.append(dir.path(), &snapshot_at(3, "a")).await.unwrap();
        let files: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(files.len(), 1);
        assert!(files[0].starts_with("stream-health-"));
    }

    #[tokio::test]
    async fn hour_rollover_creates_a_new_file_and_a_report() {
        let dir = tempfile::tempdir().unwrap();
        let csv = HourlyCsv::new();

        csv.append(dir.path(), &snapshot_at(3, "a")).await.unwrap();
        csv.append(dir.path(), &snapshot_at(4, "a")).await.unwrap();

        let files: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert!(files.iter().any(|f| f.contains("030000.csv")));
        assert!(files.iter().any(|f| f.contains("040000.csv")));
        assert!(files.iter().any(|f| f.contains("030000-report.txt")));
    }
}
