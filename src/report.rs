use chrono::{Local, TimeZone};
use serde::Deserialize;

use crate::error::{ConvertError, ConvertResult};
use crate::model::{assemble_pull_name, EntryIdGenerator, PullEntry};

const REPORT_FIGHTS_ENDPOINT: &str = "https://www.warcraftlogs.com/v1/report/fights";

/// Fights payload of the combat log service. `start` is epoch milliseconds;
/// fight times are millisecond offsets from it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportResponse {
    #[serde(default)]
    pub start: i64,
    #[serde(default)]
    pub end: i64,
    pub error: Option<String>,
    pub fights: Option<Vec<ReportFight>>,
}

/// `boss == 0` marks a trash fight.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportFight {
    pub id: i64,
    pub start_time: i64,
    pub end_time: i64,
    pub boss_percentage: Option<i64>,
    pub last_phase_for_percentage_display: Option<i64>,
    pub last_phase_is_intermission: Option<bool>,
    pub boss: i64,
}

/// The path segment following `reports/` in a report URL.
pub fn report_id_from_url(url: &str) -> ConvertResult<String> {
    let Some((_, after_marker)) = url.split_once("reports/") else {
        return Err(ConvertError::InvalidReportUrl(url.to_string()));
    };

    let report_id = after_marker
        .split(['/', '?', '#'])
        .next()
        .unwrap_or_default();
    if report_id.is_empty() {
        return Err(ConvertError::InvalidReportUrl(url.to_string()));
    }

    Ok(report_id.to_string())
}

/// Shape the boss fights of a report into pull entries. Pull numbering is the
/// 1-based position among boss fights, not the service's fight id.
pub fn entries_from_report(report: &ReportResponse) -> ConvertResult<Vec<PullEntry>> {
    if let Some(message) = report.error.as_deref() {
        return Err(ConvertError::Remote(message.to_string()));
    }

    let fights = report.fights.as_deref().unwrap_or_default();
    let ids = EntryIdGenerator::new();
    let mut entries = Vec::new();

    for fight in fights.iter().filter(|fight| fight.boss != 0) {
        let pull_number = entries.len() + 1;
        let pull_time = local_time_of_day(report.start + fight.start_time)?;

        let duration_seconds = (fight.end_time - fight.start_time).max(0) / 1000;
        let duration = format!("{}:{:02}", duration_seconds / 60, duration_seconds % 60);

        let boss_health = fight.boss_percentage.map(remaining_health_percent);
        let phase = fight
            .last_phase_for_percentage_display
            .filter(|phase| *phase > 0)
            .map(|phase| {
                if fight.last_phase_is_intermission.unwrap_or(false) {
                    format!("I{phase}")
                } else {
                    format!("P{phase}")
                }
            });

        entries.push(PullEntry {
            id: ids.next_id(),
            name: assemble_pull_name(
                &pull_number.to_string(),
                phase.as_deref(),
                boss_health.as_deref(),
                Some(&duration),
            ),
            pull_time,
        });
    }

    if entries.is_empty() {
        return Err(ConvertError::EmptyReport);
    }

    Ok(entries)
}

/// The service reports the inverse percentage scaled by 100; remaining boss
/// health is `floor(100 - value / 100)`.
fn remaining_health_percent(inverse_scaled: i64) -> String {
    let remaining = (100.0 - inverse_scaled as f64 / 100.0).floor();
    format!("{}", remaining as i64)
}

fn local_time_of_day(epoch_ms: i64) -> ConvertResult<String> {
    let pull_instant = Local
        .timestamp_millis_opt(epoch_ms)
        .single()
        .ok_or_else(|| ConvertError::Remote(format!("Report timestamp out of range: {epoch_ms}")))?;

    Ok(pull_instant.format("%H:%M:%S").to_string())
}

/// Fetch a report by URL and shape its boss fights into pull entries.
/// One GET, no retries; a failed fetch is re-triggered by the user.
pub async fn fetch_report_entries(report_url: &str, api_key: &str) -> ConvertResult<Vec<PullEntry>> {
    fetch_from_endpoint(REPORT_FIGHTS_ENDPOINT, report_url, api_key).await
}

pub(crate) async fn fetch_from_endpoint(
    endpoint: &str,
    report_url: &str,
    api_key: &str,
) -> ConvertResult<Vec<PullEntry>> {
    let report_id = report_id_from_url(report_url)?;
    let request_url = format!("{endpoint}/{report_id}?api_key={api_key}&translate=true");

    tracing::debug!(%report_id, "Requesting report fights");

    let response = reqwest::get(&request_url)
        .await
        .map_err(|error| ConvertError::Remote(error.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(ConvertError::Remote(format!(
            "Service responded with status {status}"
        )));
    }

    let body = response
        .text()
        .await
        .map_err(|error| ConvertError::Remote(error.to_string()))?;
    let report = serde_json::from_str::<ReportResponse>(&body)
        .map_err(|error| ConvertError::Remote(format!("Unreadable report payload: {error}")))?;

    entries_from_report(&report)
}

#[cfg(test)]
mod tests {
    use super::{entries_from_report, fetch_from_endpoint, report_id_from_url, ReportResponse};
    use crate::error::ConvertError;
    use chrono::{Local, TimeZone};
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn report_json() -> serde_json::Value {
        serde_json::json!({
            "start": 1_700_000_000_000_i64,
            "end": 1_700_003_600_000_i64,
            "fights": [
                {
                    "id": 1,
                    "startTime": 0,
                    "endTime": 30_000,
                    "boss": 0
                },
                {
                    "id": 2,
                    "startTime": 60_000,
                    "endTime": 264_000,
                    "bossPercentage": 5188,
                    "lastPhaseForPercentageDisplay": 2,
                    "lastPhaseIsIntermission": false,
                    "boss": 2922
                },
                {
                    "id": 3,
                    "startTime": 300_000,
                    "endTime": 302_000,
                    "bossPercentage": 9990,
                    "lastPhaseForPercentageDisplay": 1,
                    "lastPhaseIsIntermission": true,
                    "boss": 2922
                }
            ]
        })
    }

    fn parsed_report() -> ReportResponse {
        serde_json::from_value(report_json()).expect("Test report JSON should deserialize")
    }

    fn expected_local_clock(epoch_ms: i64) -> String {
        Local
            .timestamp_millis_opt(epoch_ms)
            .single()
            .expect("Test epoch should map to a local time")
            .format("%H:%M:%S")
            .to_string()
    }

    #[test]
    fn extracts_report_ids_from_urls() {
        let url = "https://www.warcraftlogs.com/reports/a1b2C3d4E5f6?fight=12";
        assert_eq!(
            report_id_from_url(url).expect("Expected a report id"),
            "a1b2C3d4E5f6"
        );

        let url = "https://www.warcraftlogs.com/reports/a1b2C3d4E5f6/";
        assert_eq!(
            report_id_from_url(url).expect("Expected a report id"),
            "a1b2C3d4E5f6"
        );
    }

    #[test]
    fn rejects_urls_without_a_report_segment() {
        let error = report_id_from_url("https://www.warcraftlogs.com/guilds/1234")
            .expect_err("Expected a malformed URL error");
        assert!(matches!(error, ConvertError::InvalidReportUrl(_)));

        let error = report_id_from_url("https://www.warcraftlogs.com/reports/")
            .expect_err("Expected a malformed URL error");
        assert!(matches!(error, ConvertError::InvalidReportUrl(_)));
    }

    #[test]
    fn shapes_boss_fights_and_skips_trash() {
        let entries =
            entries_from_report(&parsed_report()).expect("Expected entries from the report");

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "Pull 1: P2 - 48% (3:24)");
        assert_eq!(
            entries[0].pull_time,
            expected_local_clock(1_700_000_000_000_i64 + 60_000)
        );
        assert_eq!(entries[1].name, "Pull 2: I1 - 0% (0:02)");
    }

    #[test]
    fn report_error_field_fails_the_conversion() {
        let report: ReportResponse = serde_json::from_value(serde_json::json!({
            "error": "Report does not exist"
        }))
        .expect("Test report JSON should deserialize");

        let error = entries_from_report(&report).expect_err("Expected a remote error");
        assert!(matches!(error, ConvertError::Remote(_)));
    }

    #[test]
    fn report_without_boss_fights_is_empty() {
        let report: ReportResponse = serde_json::from_value(serde_json::json!({
            "start": 1_700_000_000_000_i64,
            "end": 1_700_000_100_000_i64,
            "fights": [
                { "id": 1, "startTime": 0, "endTime": 30_000, "boss": 0 }
            ]
        }))
        .expect("Test report JSON should deserialize");

        let error = entries_from_report(&report).expect_err("Expected an empty report error");
        assert!(matches!(error, ConvertError::EmptyReport));

        let report: ReportResponse =
            serde_json::from_value(serde_json::json!({ "start": 0, "end": 0, "fights": [] }))
                .expect("Test report JSON should deserialize");
        let error = entries_from_report(&report).expect_err("Expected an empty report error");
        assert!(matches!(error, ConvertError::EmptyReport));
    }

    #[tokio::test]
    async fn fetches_and_shapes_a_report_over_http() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/a1b2C3d4E5f6"))
            .and(query_param("api_key", "test-key"))
            .and(query_param("translate", "true"))
            .respond_with(ResponseTemplate::new(200).set_body_json(report_json()))
            .mount(&server)
            .await;

        let entries = fetch_from_endpoint(
            &server.uri(),
            "https://www.warcraftlogs.com/reports/a1b2C3d4E5f6",
            "test-key",
        )
        .await
        .expect("Expected the mocked fetch to succeed");

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "Pull 1: P2 - 48% (3:24)");
    }

    #[tokio::test]
    async fn non_success_status_fails_with_a_remote_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let error = fetch_from_endpoint(
            &server.uri(),
            "https://www.warcraftlogs.com/reports/a1b2C3d4E5f6",
            "bad-key",
        )
        .await
        .expect_err("Expected the mocked fetch to fail");

        assert!(matches!(error, ConvertError::Remote(_)));
    }
}
