//! `tmsubmit request-doi`: mint a DOI for an event's submitted pointings.

use serde_json::Value;

use crate::config::Config;
use crate::credentials;
use crate::submit::{Creator, DoiRequest, SubmissionApi, TreasureMapClient};

use super::{DoiArgs, token_store};

pub(super) fn cmd_request_doi(config: &Config, args: &DoiArgs) -> Result<(), String> {
    let creators = args
        .creator
        .iter()
        .map(|c| parse_creator(c))
        .collect::<Result<Vec<_>, _>>()?;

    let credential = credentials::resolve_credential(
        args.api_token.as_deref(),
        &token_store(config)?,
        config.fallback_identity.as_deref(),
    )
    .map_err(|e| e.to_string())?;

    let base_url = args.api_url.as_deref().unwrap_or(&config.api_base_url);
    let client = TreasureMapClient::new(base_url)
        .map_err(|e| format!("failed to create HTTP client: {e}"))?;

    let response = request_doi(&client, &credential.token, args, &creators)?;
    let json = serde_json::to_string_pretty(&response)
        .map_err(|e| format!("failed to serialize response: {e}"))?;
    println!("{json}");
    Ok(())
}

fn request_doi(
    api: &dyn SubmissionApi,
    api_token: &str,
    args: &DoiArgs,
    creators: &[Creator],
) -> Result<Value, String> {
    tracing::info!(graceid = %args.graceid, group = ?args.group, "requesting DOI");
    let response = api
        .request_doi(&DoiRequest {
            api_token,
            graceid: &args.graceid,
            doi_group_id: args.group.as_deref(),
            creators,
        })
        .map_err(|e| {
            tracing::warn!(error = %e, "DOI request failed");
            format!("DOI request failed: {e}")
        })?;
    tracing::info!(%response, "DOI requested");
    Ok(response)
}

/// Parse `Name:Affiliation`.
fn parse_creator(value: &str) -> Result<Creator, String> {
    let (name, affiliation) = value
        .split_once(':')
        .ok_or_else(|| format!("creator '{value}' must be Name:Affiliation"))?;
    let (name, affiliation) = (name.trim(), affiliation.trim());
    if name.is_empty() {
        return Err(format!("creator '{value}' has an empty name"));
    }
    Ok(Creator {
        name: name.to_string(),
        affiliation: affiliation.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::submit::tests::FakeApi;

    fn args(group: Option<&str>) -> DoiArgs {
        DoiArgs {
            graceid: "S190814bv".into(),
            group: group.map(Into::into),
            creator: Vec::new(),
            api_token: None,
            api_url: None,
        }
    }

    #[test]
    fn request_sends_group_and_creators() {
        let api = FakeApi::new(&[]);
        let creators = vec![parse_creator("MG:Kipac").unwrap()];

        let response = request_doi(&api, "secret", &args(Some("DECam")), &creators).unwrap();

        assert_eq!(api.call_count(), 1);
        let body = &api.calls.borrow()[0];
        assert_eq!(body["api_token"], "secret");
        assert_eq!(body["graceid"], "S190814bv");
        assert_eq!(body["doi_group_id"], "DECam");
        assert_eq!(body["creators"][0]["name"], "MG");
        assert_eq!(body["creators"][0]["affiliation"], "Kipac");
        assert!(response["DOI URL"].is_string());
    }

    #[test]
    fn request_omits_absent_group_and_creators() {
        let api = FakeApi::new(&[]);

        request_doi(&api, "secret", &args(None), &[]).unwrap();

        let body = &api.calls.borrow()[0];
        let fields = body.as_object().unwrap();
        assert!(!fields.contains_key("doi_group_id"));
        assert!(!fields.contains_key("creators"));
        assert_eq!(fields.len(), 2);
    }

    #[test]
    fn parses_name_and_affiliation() {
        let creator = parse_creator("MG: Kipac").unwrap();
        assert_eq!(creator.name, "MG");
        assert_eq!(creator.affiliation, "Kipac");
    }

    #[test]
    fn rejects_missing_separator() {
        assert!(parse_creator("MG").is_err());
        assert!(parse_creator(":UW Madison").is_err());
    }
}
