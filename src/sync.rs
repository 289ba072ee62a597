//! Reconciliation driver: computes the per-asset label delta between the
//! remote state and the desired state derived from this run's reports, and
//! issues the create/delete calls.
//!
//! Best effort by design: a single asset's API hiccup is logged and must not
//! block labeling for the rest of the fleet.

use std::collections::BTreeSet;

use crate::radar::RadarClient;
use crate::reports::{label_base, DesiredLabels};

#[derive(Debug, Default, PartialEq, Eq)]
pub struct SyncTotals {
    pub assets: usize,
    pub labels_added: usize,
    pub labels_deleted: usize,
}

/// Reconcile every remote asset against the desired labels.
///
/// A remote label is deleted iff its base appeared in some report this run
/// and its exact string is not desired for the asset. Every desired label is
/// (re-)issued as an add; the server answers 409 for labels already present,
/// which counts as nothing.
pub async fn reconcile(client: &mut RadarClient, desired: &DesiredLabels) -> SyncTotals {
    let mut totals = SyncTotals::default();
    let dry_run = !client.can_write();

    let assets = match client.list_assets().await {
        Ok(assets) => assets,
        Err(e) => {
            tracing::error!("Failed to retrieve assets: {e}");
            return totals;
        }
    };

    let empty = BTreeSet::new();
    for (asset_id, asset_identifier) in &assets {
        totals.assets += 1;
        tracing::info!("Syncing labels for asset {asset_identifier}");

        let current = match client.list_labels(asset_id).await {
            Ok(current) => current,
            Err(e) => {
                tracing::error!("Failed to retrieve labels for asset {asset_identifier}: {e}");
                continue;
            }
        };
        let wanted = desired.for_asset(asset_identifier).unwrap_or(&empty);

        let mut deleted = 0usize;
        for (label, label_id) in &current {
            if desired.base_processed(label_base(label)) && !wanted.contains(label) {
                match client.delete_label(asset_id, label_id).await {
                    Ok(_) => deleted += 1,
                    Err(e) => {
                        tracing::error!(
                            "Failed to delete label {label} from asset {asset_identifier}: {e}"
                        );
                    }
                }
            }
        }
        if dry_run {
            tracing::info!(
                "(TEST) {deleted} label(s) would be deleted for asset {asset_identifier}"
            );
        } else {
            tracing::info!("{deleted} label(s) deleted for asset {asset_identifier}");
        }

        let mut added = 0usize;
        for label in wanted {
            match client.add_label(asset_id, label).await {
                Ok(true) => added += 1,
                Ok(false) => {}
                Err(e) => {
                    tracing::error!(
                        "Failed to add label {label} to asset {asset_identifier}: {e}"
                    );
                }
            }
        }
        if dry_run {
            tracing::info!("(TEST) {added} label(s) would be added for asset {asset_identifier}");
        } else {
            tracing::info!("{added} label(s) added for asset {asset_identifier}");
        }

        totals.labels_deleted += deleted;
        totals.labels_added += added;
    }

    totals
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;

    use super::*;
    use crate::radar::endpoints::Endpoints;
    use crate::radar::error::RadarError;
    use crate::radar::testing::{MockTransport, StubSigner};
    use crate::radar::transport::{ApiRequest, ApiResponse, Method, Transport};
    use crate::reports::DesiredLabels;

    struct SharedTransport(Arc<MockTransport>);

    #[async_trait]
    impl Transport for SharedTransport {
        async fn execute(&self, request: &ApiRequest) -> Result<ApiResponse, RadarError> {
            self.0.execute(request).await
        }
    }

    fn client_with_script(responses: Vec<ApiResponse>) -> (RadarClient, Arc<MockTransport>) {
        let live = Arc::new(MockTransport::new(responses));
        let canned = Arc::new(MockTransport::new(vec![]));
        let client = RadarClient::with_transports(
            Box::new(SharedTransport(live.clone())),
            Box::new(SharedTransport(canned)),
            Some(Box::new(StubSigner)),
            Endpoints::production(),
            true,
            true,
        );
        (client, live)
    }

    fn one_asset() -> ApiResponse {
        MockTransport::response(200, r#"[{"id":"a1","identifier":"26706"}]"#)
    }

    #[tokio::test]
    async fn test_stale_label_replaced_by_new_percentage() {
        // Remote has "Oil Change - 70%", reports now say "Oil Change - 90%":
        // one delete plus one add, not an update.
        let (mut client, live) = client_with_script(vec![
            one_asset(),
            MockTransport::response(
                200,
                r#"{"items":[{"name":"Oil Change - 70%","id":"l1"}]}"#,
            ),
            MockTransport::response(204, ""),
            MockTransport::response(201, ""),
        ]);
        let mut desired = DesiredLabels::default();
        desired.insert("26706", "Oil Change", "90%");

        let totals = reconcile(&mut client, &desired).await;
        assert_eq!(
            totals,
            SyncTotals {
                assets: 1,
                labels_added: 1,
                labels_deleted: 1,
            }
        );

        let requests = live.requests.lock().unwrap();
        assert_eq!(requests[2].method, Method::Delete);
        assert!(requests[2].url.ends_with("/assets/a1/labels/l1"));
        assert_eq!(requests[3].method, Method::Post);
        assert_eq!(
            requests[3].body.as_ref().unwrap()["name"].as_str().unwrap(),
            "Oil Change - 90%"
        );
    }

    #[tokio::test]
    async fn test_unprocessed_base_is_never_deleted() {
        // "Fridge Temp" came from another system; its base was not in any
        // report this run, so it survives even though it is not desired.
        let (mut client, live) = client_with_script(vec![
            one_asset(),
            MockTransport::response(
                200,
                r#"{"items":[{"name":"Fridge Temp - 50%","id":"l1"}]}"#,
            ),
            MockTransport::response(201, ""),
        ]);
        let mut desired = DesiredLabels::default();
        desired.insert("26706", "Oil Change", "90%");

        let totals = reconcile(&mut client, &desired).await;
        assert_eq!(totals.labels_deleted, 0);
        assert_eq!(totals.labels_added, 1);
        let requests = live.requests.lock().unwrap();
        assert!(requests.iter().all(|r| r.method != Method::Delete));
    }

    #[tokio::test]
    async fn test_desired_label_already_present_not_deleted_409_not_counted() {
        let (mut client, live) = client_with_script(vec![
            one_asset(),
            MockTransport::response(
                200,
                r#"{"items":[{"name":"Oil Change - 90%","id":"l1"}]}"#,
            ),
            MockTransport::response(409, ""),
        ]);
        let mut desired = DesiredLabels::default();
        desired.insert("26706", "Oil Change", "90%");

        let totals = reconcile(&mut client, &desired).await;
        // Exact match: no delete issued; add answered 409 and not counted
        assert_eq!(totals.labels_deleted, 0);
        assert_eq!(totals.labels_added, 0);
        assert_eq!(live.requests.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_asset_absent_from_reports_still_loses_processed_bases() {
        // The base was processed for a different asset; matching is global.
        let (mut client, _) = client_with_script(vec![
            one_asset(),
            MockTransport::response(
                200,
                r#"{"items":[{"name":"Oil Change - 70%","id":"l1"}]}"#,
            ),
            MockTransport::response(204, ""),
        ]);
        let mut desired = DesiredLabels::default();
        desired.insert("99999", "Oil Change", "90%");

        let totals = reconcile(&mut client, &desired).await;
        assert_eq!(totals.labels_deleted, 1);
        assert_eq!(totals.labels_added, 0);
    }

    #[tokio::test]
    async fn test_full_test_run_walks_fixture_fleet() {
        use crate::radar::transport::FixtureTransport;

        let live = Arc::new(MockTransport::new(vec![]));
        let mut client = RadarClient::with_transports(
            Box::new(SharedTransport(live.clone())),
            Box::new(FixtureTransport),
            None,
            Endpoints::production(),
            false,
            false,
        );
        let mut desired = DesiredLabels::default();
        desired.insert("26706", "PM Service and Inspect", "95%");

        let totals = reconcile(&mut client, &desired).await;
        // Five fixture assets; each carries "PM Service and Inspect - 90%",
        // whose base was reprocessed, so each is counted as a would-be delete.
        assert_eq!(totals.assets, 5);
        assert_eq!(totals.labels_deleted, 5);
        // Only asset 26706 has a desired label to add
        assert_eq!(totals.labels_added, 1);
        assert!(live.requests.lock().unwrap().is_empty());
    }
}
