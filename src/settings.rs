use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use sea_orm::ActiveValue::NotSet;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    db::OrmConn,
    entity::platform_settings::{ActiveModel as SettingsActive, Entity as Settings},
    error::AppResult,
};

fn default_commission_rate() -> Decimal {
    Decimal::new(500, 2) // 5.00%
}

/// Process-wide platform configuration, loaded once at startup and cached.
/// `reload` re-reads the row so a rate change can be picked up without a
/// restart; past orders are never re-priced.
pub struct PlatformSettings {
    commission_rate: RwLock<Decimal>,
}

impl PlatformSettings {
    /// Read the settings row, creating it with defaults on first boot.
    pub async fn load(orm: &OrmConn) -> AppResult<Self> {
        let rate = match Settings::find().one(orm).await? {
            Some(row) => row.platform_commission_rate,
            None => {
                let row = SettingsActive {
                    id: Set(Uuid::new_v4()),
                    platform_commission_rate: Set(default_commission_rate()),
                    created_at: NotSet,
                    updated_at: NotSet,
                }
                .insert(orm)
                .await?;
                row.platform_commission_rate
            }
        };

        Ok(Self {
            commission_rate: RwLock::new(rate),
        })
    }

    pub async fn commission_rate(&self) -> Decimal {
        *self.commission_rate.read().await
    }

    pub async fn reload(&self, orm: &OrmConn) -> AppResult<()> {
        let rate = Settings::find()
            .one(orm)
            .await?
            .map(|row| row.platform_commission_rate)
            .unwrap_or_else(default_commission_rate);

        *self.commission_rate.write().await = rate;
        tracing::info!(commission_rate = %rate, "platform settings reloaded");
        Ok(())
    }
}
