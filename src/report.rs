use arc_accounting_shared::StatsResult;
use chrono::DateTime;
use std::fmt::Write;

const NOT_AVAILABLE: &str = "N/A";

fn format_duration(seconds: Option<i64>) -> String {
    let Some(seconds) = seconds else {
        return NOT_AVAILABLE.to_string();
    };
    let days = seconds / 86_400;
    let hours = (seconds % 86_400) / 3_600;
    let minutes = (seconds % 3_600) / 60;
    let secs = seconds % 60;
    if days > 0 {
        format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, secs)
    } else {
        format!("{:02}:{:02}:{:02}", hours, minutes, secs)
    }
}

fn format_volume(bytes: Option<i64>) -> String {
    const UNITS: [&str; 6] = ["B", "KiB", "MiB", "GiB", "TiB", "PiB"];

    let Some(bytes) = bytes else {
        return NOT_AVAILABLE.to_string();
    };
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.2} {}", value, UNITS[unit])
    }
}

fn format_time(epoch: Option<i64>) -> String {
    epoch
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

pub fn render_text(stats: &StatsResult) -> String {
    let rows = [
        ("Number of jobs", stats.count.to_string()),
        ("Total WallTime", format_duration(stats.walltime)),
        ("Total CPU user time", format_duration(stats.cpu_user_time)),
        ("Total CPU kernel time", format_duration(stats.cpu_kernel_time)),
        ("Total stage-in volume", format_volume(stats.stage_in)),
        ("Total stage-out volume", format_volume(stats.stage_out)),
        ("First job submitted", format_time(stats.range_start)),
        ("Last job finished", format_time(stats.range_end)),
    ];

    let mut out = String::new();
    for (label, value) in rows {
        let _ = writeln!(out, "{:<24}{}", format!("{}:", label), value);
    }
    out
}

pub fn render_json(stats: &StatsResult) -> serde_json::Result<String> {
    serde_json::to_string_pretty(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Some(59)), "00:00:59");
        assert_eq!(format_duration(Some(3_661)), "01:01:01");
        assert_eq!(format_duration(Some(90_061)), "1d 01:01:01");
        assert_eq!(format_duration(None), "N/A");
    }

    #[test]
    fn test_format_volume() {
        assert_eq!(format_volume(Some(512)), "512 B");
        assert_eq!(format_volume(Some(1536)), "1.50 KiB");
        assert_eq!(format_volume(Some(3 * 1024 * 1024 * 1024)), "3.00 GiB");
        assert_eq!(format_volume(None), "N/A");
    }

    #[test]
    fn test_render_empty_result() {
        let text = render_text(&StatsResult::default());
        assert!(text.starts_with("Number of jobs:         0\n"));
        assert!(text.contains("Total WallTime:         N/A"));
        assert!(text.contains("Last job finished:      N/A"));
    }

    #[test]
    fn test_render_text() {
        let stats = StatsResult {
            count: 3,
            walltime: Some(60),
            cpu_user_time: Some(48),
            cpu_kernel_time: Some(6),
            stage_in: Some(2048),
            stage_out: Some(60),
            range_start: Some(1_704_067_200),
            range_end: Some(1_704_070_800),
        };
        let text = render_text(&stats);

        assert!(text.contains("Total WallTime:         00:01:00"));
        assert!(text.contains("Total stage-in volume:  2.00 KiB"));
        assert!(text.contains("First job submitted:    2024-01-01 00:00:00 UTC"));
        assert!(text.contains("Last job finished:      2024-01-01 01:00:00 UTC"));
    }

    #[test]
    fn test_render_json() {
        let json = render_json(&StatsResult {
            count: 2,
            walltime: Some(30),
            ..Default::default()
        })
        .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["count"], 2);
        assert_eq!(value["walltime"], 30);
        assert!(value["stage_in"].is_null());
    }
}
