//! Assignment and Grade Services client

use reqwest::Method;
use tracing::{debug, info};
use url::Url;

use super::{PlatformClient, ServiceRequest};
use crate::{
    Error, Result,
    message::{Grade, GradeResult, LaunchMessage, LineItem, media_types, scopes},
};

/// Grade services for one launch.
///
/// Holds the scopes and endpoint URLs granted by the launch's AGS claim.
#[derive(Debug)]
pub struct AgService<'a> {
    client: &'a PlatformClient,
    scopes: Vec<String>,
    line_items_url: Option<String>,
    line_item_url: Option<String>,
}

impl<'a> AgService<'a> {
    /// Bind to the AGS endpoint of `msg`
    pub fn new(client: &'a PlatformClient, msg: &LaunchMessage) -> Result<Self> {
        let endpoint = msg.ags_endpoint.as_ref().ok_or_else(|| {
            Error::Validation("launch has no assignment and grade services endpoint".to_string())
        })?;

        Ok(Self {
            client,
            scopes: endpoint.scope.clone(),
            line_items_url: endpoint.lineitems.clone(),
            line_item_url: endpoint.lineitem.clone(),
        })
    }

    /// Whether the platform granted `scope`
    #[must_use]
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.iter().any(|s| s == scope)
    }

    /// Line item bound to the launching resource link, if any
    #[must_use]
    pub fn line_item_url(&self) -> Option<&str> {
        self.line_item_url.as_deref()
    }

    fn require_scope(&self, scope: &str) -> Result<()> {
        if self.has_scope(scope) {
            Ok(())
        } else {
            Err(Error::Validation(format!("missing necessary scope: {scope:?}")))
        }
    }

    /// Return the line item whose `tag` equals the candidate's, creating it when absent.
    ///
    /// The returned item is always the platform's copy, which may differ from
    /// the candidate (assigned id, corrected maximum).
    pub async fn find_or_create_line_item(&self, candidate: &LineItem) -> Result<LineItem> {
        const OP: &str = "FindOrCreateLineItem";

        self.require_scope(scopes::LINE_ITEM)?;
        let url = self
            .line_items_url
            .as_deref()
            .ok_or_else(|| Error::Validation("missing line items url".to_string()))?;

        debug!(url = %url, tag = ?candidate.tag, "Looking up existing line items");
        let existing: Vec<LineItem> = self
            .client
            .do_service_request(
                ServiceRequest::new(self.scopes.as_slice(), url)
                    .accept(media_types::LINE_ITEM_CONTAINER),
            )
            .await?
            .ensure_success(OP)?
            .json(OP)?;

        if let Some(found) = existing.into_iter().find(|item| item.tag == candidate.tag) {
            debug!(id = ?found.id, "Found existing line item");
            return Ok(found);
        }

        let request = ServiceRequest::new(self.scopes.as_slice(), url)
            .method(Method::POST)
            .json(candidate)?
            .content_type(media_types::LINE_ITEM)
            .accept(media_types::LINE_ITEM);

        let created: LineItem = self
            .client
            .do_service_request(request)
            .await?
            .ensure_success(OP)?
            .json(OP)?;

        info!(id = ?created.id, tag = ?created.tag, "Created line item");
        Ok(created)
    }

    /// Publish `grade` to `line_item`
    pub async fn put_grade(&self, line_item: &LineItem, grade: &Grade) -> Result<()> {
        const OP: &str = "PutGrade";

        self.require_scope(scopes::SCORE)?;
        let url = sub_resource_url(line_item, "scores")?;

        let request = ServiceRequest::new(self.scopes.as_slice(), url.as_str())
            .method(Method::POST)
            .json(grade)?
            .content_type(media_types::SCORE);

        self.client
            .do_service_request(request)
            .await?
            .ensure_success(OP)?;

        debug!(url = %url, user = %grade.user_id, "Score published");
        Ok(())
    }

    /// Current results for `line_item`
    pub async fn get_results(&self, line_item: &LineItem) -> Result<Vec<GradeResult>> {
        const OP: &str = "GetResults";

        self.require_scope(scopes::RESULT_READONLY)?;
        let url = sub_resource_url(line_item, "results")?;

        self.client
            .do_service_request(
                ServiceRequest::new(self.scopes.as_slice(), url.as_str())
                    .accept(media_types::RESULT_CONTAINER),
            )
            .await?
            .ensure_success(OP)?
            .json(OP)
    }
}

/// Append `segment` to the line item's URL path, keeping its query string
fn sub_resource_url(line_item: &LineItem, segment: &str) -> Result<Url> {
    let id = line_item
        .id
        .as_deref()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| Error::Validation("line item has no id".to_string()))?;

    let mut url =
        Url::parse(id).map_err(|e| Error::Validation(format!("invalid line item id: {e}")))?;
    let path = format!("{}/{segment}", url.path().trim_end_matches('/'));
    url.set_path(&path);
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str) -> LineItem {
        LineItem {
            id: Some(id.to_string()),
            ..LineItem::default()
        }
    }

    #[test]
    fn scores_url_appends_to_path() {
        let url = sub_resource_url(&item("https://lms.example.edu/lineitems/9"), "scores").unwrap();
        assert_eq!(url.as_str(), "https://lms.example.edu/lineitems/9/scores");
    }

    #[test]
    fn scores_url_keeps_query_string() {
        // GIVEN: a platform that puts routing data in the query string
        let line_item = item("https://lms.example.edu/lineitems/9/?type_id=3");

        // WHEN: building the scores URL
        let url = sub_resource_url(&line_item, "scores").unwrap();

        // THEN: the segment lands in the path and the query survives
        assert_eq!(url.as_str(), "https://lms.example.edu/lineitems/9/scores?type_id=3");
    }

    #[test]
    fn line_item_without_id_is_rejected() {
        let err = sub_resource_url(&LineItem::default(), "scores").unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }
}
