use log::debug;
use serde_json::json;
use snafu::prelude::*;
use std::time::Duration;

use council_voting::TallyResult;

use crate::app::config_reader::AppConfig;
use crate::app::*;

/// Printed in place of the narrative when the text-generation service is
/// unreachable or returns garbage. The tally itself is never affected.
pub const FALLBACK_TEXT: &str = "The votes have been counted and the results are in. \
Congratulations to the newly elected council members, and thank you to every candidate \
and voter for taking part in this election.";

/// Builds the deterministic prompt for the announcement text.
pub fn build_prompt(contest_name: &str, tally: &TallyResult) -> String {
    let ranking: Vec<String> = tally
        .ranking
        .iter()
        .map(|rc| format!("{}. {}: {} votes", rc.rank, rc.name, rc.votes))
        .collect();
    let elected = tally.elected_names();
    let elected = if elected.is_empty() {
        "none".to_string()
    } else {
        elected.join(", ")
    };
    format!(
        "You are announcing the results of the election \"{}\".\n\
         Final ranking:\n{}\n\n\
         Elected candidates: {}.\n\n\
         Write a short announcement (3 to 5 sentences) that:\n\
         1. congratulates the elected candidates by name,\n\
         2. mentions the turnout of {} out of {} registered voters,\n\
         3. thanks every candidate for standing,\n\
         4. keeps a warm but formal tone.\n\
         Answer with the announcement text only, no markup.",
        contest_name,
        ranking.join("\n"),
        elected,
        tally.voters_voted,
        tally.total_voters,
    )
}

/// Calls the text-generation service and returns the announcement text.
///
/// The API key is read from the environment and sent as a request header;
/// neither the key nor the full request is ever logged.
pub fn generate(config: &AppConfig, prompt: &str) -> AppResult<String> {
    let settings = config.summary();
    let var = settings.api_key_env().to_string();
    let api_key = std::env::var(&var)
        .ok()
        .filter(|k| !k.is_empty())
        .context(ApiKeyMissingSnafu { var })?;

    let url = format!(
        "{}/models/{}:generateContent",
        settings.endpoint().trim_end_matches('/'),
        settings.model()
    );
    debug!("generate: POST {}", url);

    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(settings.timeout_seconds()))
        .build()
        .context(SummaryRequestSnafu)?;
    let body = json!({ "contents": [{ "parts": [{ "text": prompt }] }] });
    let response = client
        .post(&url)
        .header("x-goog-api-key", api_key)
        .json(&body)
        .send()
        .context(SummaryRequestSnafu)?;
    ensure!(response.status().is_success(), SummaryResponseSnafu);

    let payload: serde_json::Value = response.json().context(SummaryRequestSnafu)?;
    let text = payload
        .pointer("/candidates/0/content/parts/0/text")
        .and_then(|v| v.as_str())
        .context(SummaryResponseSnafu)?;
    Ok(text.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use council_voting::*;

    fn tally_of(data: &[(&str, u64)], seats: usize) -> TallyResult {
        let mut store = ElectionStore::new();
        for (name, _) in data {
            store.add_candidate(name).unwrap();
        }
        let emails: Vec<String> = (0..10).map(|i| format!("v{}@x.com", i)).collect();
        store.add_voters(&emails);
        let mut next = 0usize;
        let ids: Vec<CandidateId> = store.candidates().iter().map(|c| c.id).collect();
        for (idx, (_, votes)) in data.iter().enumerate() {
            for _ in 0..*votes {
                let mut session = VoterSession::new();
                session.login(&store, &emails[next]).unwrap();
                next += 1;
                session
                    .toggle(&ElectionRules::DEFAULT_RULES, ids[idx])
                    .unwrap();
                session.submit(&mut store).unwrap();
            }
        }
        let rules = ElectionRules {
            max_selections: 9,
            elected_seats: seats,
        };
        ranked_tally(&store, &rules)
    }

    #[test]
    fn prompt_names_the_elected_and_the_turnout() {
        let tally = tally_of(&[("Anna", 3), ("Bob", 1), ("Clara", 2)], 2);
        let prompt = build_prompt("Staff council", &tally);
        assert!(prompt.contains("Staff council"));
        assert!(prompt.contains("1. Anna: 3 votes"));
        assert!(prompt.contains("2. Clara: 2 votes"));
        assert!(prompt.contains("Elected candidates: Anna, Clara."));
        assert!(prompt.contains("6 out of 10 registered voters"));
    }

    #[test]
    fn prompt_handles_an_empty_election() {
        let tally = ranked_tally(&ElectionStore::new(), &ElectionRules::DEFAULT_RULES);
        let prompt = build_prompt("Staff council", &tally);
        assert!(prompt.contains("Elected candidates: none."));
    }

    #[test]
    fn missing_api_key_is_reported_by_variable_name() {
        let config = AppConfig {
            summary: Some(crate::app::config_reader::SummarySettings {
                api_key_env: Some("COUNCILVOTE_TEST_NO_SUCH_KEY".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let err = generate(&config, "prompt").unwrap_err();
        assert!(matches!(err, AppError::ApiKeyMissing { .. }));
        assert!(format!("{}", err).contains("COUNCILVOTE_TEST_NO_SUCH_KEY"));
    }
}
