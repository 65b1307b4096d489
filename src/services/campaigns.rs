use std::sync::Arc;
use uuid::Uuid;

use super::error::ServiceResult;
use super::{report, validate, Notice, Notifier};
use crate::demo;
use crate::store::{CampaignStatus, NewRecoveryCampaign, RecoveryCampaign, Store, StoreError};

/// Recovery-campaign operations
#[derive(Clone)]
pub struct CampaignService {
    store: Arc<Store>,
    notifier: Arc<dyn Notifier>,
}

impl CampaignService {
    pub fn new(store: Arc<Store>, notifier: Arc<dyn Notifier>) -> Self {
        Self { store, notifier }
    }

    /// Campaigns, newest first, optionally narrowed to one status
    pub async fn get_campaigns(
        &self,
        status: Option<CampaignStatus>,
    ) -> ServiceResult<Vec<RecoveryCampaign>> {
        self.store
            .list_campaigns(status)
            .await
            .map_err(|e| report(self.notifier.as_ref(), "Error fetching campaigns", e.into()))
    }

    pub async fn create_campaign(
        &self,
        campaign: NewRecoveryCampaign,
    ) -> ServiceResult<RecoveryCampaign> {
        let notifier = self.notifier.as_ref();
        validate::new_campaign(&campaign)
            .map_err(|e| report(notifier, "Error creating campaign", e))?;

        let campaign = self
            .store
            .insert_campaigns(vec![campaign])
            .await
            .map_err(|e| report(notifier, "Error creating campaign", e.into()))?
            .pop()
            .ok_or_else(|| {
                report(
                    notifier,
                    "Error creating campaign",
                    StoreError::Serialization("insert returned no row".to_string()).into(),
                )
            })?;

        tracing::info!(campaign_id = %campaign.id, name = %campaign.name, "Campaign created");
        notifier.notify(Notice::success(
            "Campaign created",
            "Recovery campaign has been created successfully",
        ));
        Ok(campaign)
    }

    pub async fn update_campaign_status(
        &self,
        id: Uuid,
        status: CampaignStatus,
    ) -> ServiceResult<RecoveryCampaign> {
        let campaign = self
            .store
            .update_campaign_status(id, status)
            .await
            .map_err(|e| report(self.notifier.as_ref(), "Error updating campaign", e.into()))?;

        tracing::info!(campaign_id = %id, status = %status, "Campaign status changed");
        self.notifier.notify(Notice::success(
            "Campaign updated",
            format!("Campaign status changed to {}", status),
        ));
        Ok(campaign)
    }

    /// Insert the stock demo campaigns
    pub async fn generate_demo_campaigns(&self) -> ServiceResult<Vec<RecoveryCampaign>> {
        let stored = self
            .store
            .insert_campaigns(demo::demo_campaigns())
            .await
            .map_err(|e| {
                report(self.notifier.as_ref(), "Error generating demo campaigns", e.into())
            })?;

        tracing::info!(count = stored.len(), "Demo campaigns generated");
        self.notifier.notify(Notice::success(
            "Demo campaigns generated",
            format!("{} recovery campaigns have been created", stored.len()),
        ));
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::RecordingNotifier;
    use crate::services::ServiceError;

    fn service() -> (CampaignService, Arc<RecordingNotifier>) {
        let store = Arc::new(Store::open_in_memory().unwrap());
        let notifier = Arc::new(RecordingNotifier::default());
        (CampaignService::new(store, notifier.clone()), notifier)
    }

    #[tokio::test]
    async fn test_create_and_list() {
        let (campaigns, notifier) = service();

        let created = campaigns
            .create_campaign(
                NewRecoveryCampaign::new("Spring Sale", CampaignStatus::Draft).channel("Email"),
            )
            .await
            .unwrap();
        assert_eq!(created.status, CampaignStatus::Draft);
        assert_eq!(notifier.last().unwrap().title, "Campaign created");

        let listed = campaigns.get_campaigns(None).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "Spring Sale");
    }

    #[tokio::test]
    async fn test_empty_name_rejected() {
        let (campaigns, notifier) = service();

        let err = campaigns
            .create_campaign(NewRecoveryCampaign::new("", CampaignStatus::Active))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert!(notifier.last().unwrap().is_destructive());
        assert!(campaigns.get_campaigns(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_status_notice() {
        let (campaigns, notifier) = service();
        let created = campaigns.generate_demo_campaigns().await.unwrap();
        assert_eq!(created.len(), 3);
        assert_eq!(
            notifier.last().unwrap().description,
            "3 recovery campaigns have been created"
        );

        let draft = created
            .iter()
            .find(|c| c.status == CampaignStatus::Draft)
            .unwrap();
        let updated = campaigns
            .update_campaign_status(draft.id, CampaignStatus::Active)
            .await
            .unwrap();
        assert_eq!(updated.status, CampaignStatus::Active);

        let notice = notifier.last().unwrap();
        assert_eq!(notice.title, "Campaign updated");
        assert_eq!(notice.description, "Campaign status changed to active");

        let active = campaigns
            .get_campaigns(Some(CampaignStatus::Active))
            .await
            .unwrap();
        assert_eq!(active.len(), 3);
    }

    #[tokio::test]
    async fn test_update_unknown_campaign() {
        let (campaigns, notifier) = service();

        let err = campaigns
            .update_campaign_status(Uuid::new_v4(), CampaignStatus::Archived)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(notifier.last().unwrap().title, "Error updating campaign");
    }
}
