//! Names and Role Provisioning Services client

use std::{collections::HashSet, sync::OnceLock};

use regex::Regex;
use reqwest::header::{HeaderMap, LINK};
use tracing::debug;

use super::{PlatformClient, ServiceRequest};
use crate::{
    Error, Result,
    message::{LaunchMessage, MemberResponse, media_types, scopes},
};

/// Roster service for one launch
#[derive(Debug)]
pub struct NrpService<'a> {
    client: &'a PlatformClient,
    members_url: String,
}

impl<'a> NrpService<'a> {
    /// Bind to the NRPS endpoint of `msg`
    pub fn new(client: &'a PlatformClient, msg: &LaunchMessage) -> Result<Self> {
        let endpoint = msg.nrps_endpoint.as_ref().ok_or_else(|| {
            Error::Validation(
                "launch has no names and roles provisioning service endpoint".to_string(),
            )
        })?;

        Ok(Self {
            client,
            members_url: endpoint.context_memberships_url.clone(),
        })
    }

    /// Fetch the whole roster, following `rel="next"` links.
    ///
    /// Any failed page aborts the call; no partial roster is returned.
    /// A `next` link to a page already fetched is an error.
    pub async fn get_members(&self) -> Result<MemberResponse> {
        const OP: &str = "GetMembers";

        let mut roster = MemberResponse::default();
        let mut next = Some(self.members_url.clone());
        let mut visited = HashSet::new();
        let mut page = 0_usize;

        while let Some(url) = next {
            if !visited.insert(url.clone()) {
                return Err(Error::remote(OP, format!("pagination loop at {url}")));
            }
            page += 1;
            let result = self
                .client
                .do_service_request(
                    ServiceRequest::new(&[scopes::CONTEXT_MEMBERSHIP_READONLY], url.as_str())
                        .accept(media_types::MEMBERSHIP_CONTAINER),
                )
                .await?
                .ensure_success(OP)?;

            let body: MemberResponse = result.json(OP)?;
            debug!(page, members = body.members.len(), url = %url, "Fetched roster page");

            if page == 1 {
                roster.id = body.id;
                roster.context = body.context;
            }
            roster.members.extend(body.members);

            next = next_page_url(&result.headers);
        }

        Ok(roster)
    }
}

fn next_link_regex() -> &'static Regex {
    static NEXT_LINK: OnceLock<Regex> = OnceLock::new();
    NEXT_LINK.get_or_init(|| {
        Regex::new(r#"<([^>]+)>\s*;\s*rel="?next"?"#).expect("next-link pattern is valid")
    })
}

/// URL of the `rel="next"` entry across all `Link` headers
fn next_page_url(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(LINK)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(|value| {
            next_link_regex()
                .captures(value)
                .map(|caps| caps[1].to_string())
        })
}
