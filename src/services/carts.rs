use rand::Rng;
use std::sync::Arc;
use uuid::Uuid;

use super::error::ServiceResult;
use super::{report, validate, Notice, Notifier};
use crate::demo;
use crate::store::{AbandonedCart, CartFilter, CartPatch, NewAbandonedCart, Store, StoreError};

/// Abandoned-cart operations
#[derive(Clone)]
pub struct CartService {
    store: Arc<Store>,
    notifier: Arc<dyn Notifier>,
}

impl CartService {
    pub fn new(store: Arc<Store>, notifier: Arc<dyn Notifier>) -> Self {
        Self { store, notifier }
    }

    /// Carts matching `filter`, newest abandonment first
    pub async fn get_abandoned_carts(&self, filter: &CartFilter) -> ServiceResult<Vec<AbandonedCart>> {
        self.store
            .list_carts(filter)
            .await
            .map_err(|e| report(self.notifier.as_ref(), "Error fetching carts", e.into()))
    }

    pub async fn get_cart(&self, id: Uuid) -> ServiceResult<AbandonedCart> {
        self.store
            .get_cart(id)
            .await
            .map_err(|e| report(self.notifier.as_ref(), "Error fetching carts", e.into()))
    }

    /// Insert one cart and return the stored row
    pub async fn add_abandoned_cart(&self, cart: NewAbandonedCart) -> ServiceResult<AbandonedCart> {
        let notifier = self.notifier.as_ref();
        validate::new_cart(&cart).map_err(|e| report(notifier, "Error adding cart", e))?;

        let mut stored = self
            .store
            .insert_carts(vec![cart])
            .await
            .map_err(|e| report(notifier, "Error adding cart", e.into()))?;

        let cart = stored.pop().ok_or_else(|| {
            report(
                notifier,
                "Error adding cart",
                StoreError::Serialization("insert returned no row".to_string()).into(),
            )
        })?;

        tracing::info!(cart_id = %cart.id, user_email = %cart.user_email, "Abandoned cart logged");
        notifier.notify(Notice::success(
            "Cart saved",
            "Abandoned cart has been logged successfully",
        ));
        Ok(cart)
    }

    pub async fn mark_cart_as_recovered(&self, id: Uuid) -> ServiceResult<AbandonedCart> {
        let cart = self
            .store
            .update_cart(id, &CartPatch::recovered())
            .await
            .map_err(|e| report(self.notifier.as_ref(), "Error updating cart", e.into()))?;

        tracing::info!(cart_id = %id, "Cart marked as recovered");
        self.notifier.notify(Notice::success(
            "Cart recovered",
            "Cart has been marked as recovered",
        ));
        Ok(cart)
    }

    /// Insert `count` random carts in one batch
    pub async fn generate_demo_carts(&self, count: usize) -> ServiceResult<Vec<AbandonedCart>> {
        let carts = self.build_demo_carts(&mut rand::rng(), count)?;
        self.insert_demo_carts(carts).await
    }

    /// Same as [`generate_demo_carts`](Self::generate_demo_carts) with a caller-supplied generator
    pub async fn generate_demo_carts_with<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        count: usize,
    ) -> ServiceResult<Vec<AbandonedCart>> {
        let carts = self.build_demo_carts(rng, count)?;
        self.insert_demo_carts(carts).await
    }

    fn build_demo_carts<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        count: usize,
    ) -> ServiceResult<Vec<NewAbandonedCart>> {
        validate::demo_count(count)
            .map_err(|e| report(self.notifier.as_ref(), "Error generating demo data", e))?;
        Ok(demo::demo_carts(rng, count, chrono::Utc::now()))
    }

    async fn insert_demo_carts(&self, carts: Vec<NewAbandonedCart>) -> ServiceResult<Vec<AbandonedCart>> {
        let notifier = self.notifier.as_ref();
        let stored = self
            .store
            .insert_carts(carts)
            .await
            .map_err(|e| report(notifier, "Error generating demo data", e.into()))?;

        tracing::info!(count = stored.len(), "Demo carts generated");
        notifier.notify(Notice::success(
            "Demo data generated",
            format!("{} abandoned carts have been created", stored.len()),
        ));
        Ok(stored)
    }
}
