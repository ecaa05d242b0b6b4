//! Anonymous access to an invite through its secret token.
//!
//! Every failure to resolve looks the same to the caller, whether the token
//! is malformed, unknown, or points at a follow-up that does not exist.

use std::sync::Arc;

use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use uuid::Uuid;

use crate::application::database::DbConn;
use crate::application::error::{AppError, Result};
use crate::models::invite::{self, Followup};
use crate::models::prelude::*;
use crate::models::student;
use crate::services::security::TokenGenerator;

#[derive(Clone)]
pub struct TokenGateway {
    db: DbConn,
    tokens: Arc<dyn TokenGenerator>,
}

impl TokenGateway {
    /// `tokens` is the generator that minted the links this gateway serves;
    /// its shape check screens input before the lookup.
    pub fn new(db: DbConn, tokens: Arc<dyn TokenGenerator>) -> Self {
        Self { db, tokens }
    }

    /// Resolve a token to its invite. Never mutates.
    pub async fn resolve(&self, token: &str) -> Result<invite::Model> {
        if !self.tokens.accepts(token) {
            tracing::debug!("Rejected malformed invite token");
            return Err(AppError::invalid_link());
        }

        Invite::find()
            .filter(invite::Column::SecretToken.eq(token))
            .one(&self.db)
            .await?
            .ok_or_else(AppError::invalid_link)
    }

    /// Resolve a token together with its recipient, for rendering.
    pub async fn resolve_with_recipient(
        &self,
        token: &str,
    ) -> Result<(invite::Model, student::Model)> {
        let invite = self.resolve(token).await?;
        let recipient = self.recipient_of(&invite).await?;
        Ok((invite, recipient))
    }

    /// Recipient of an invite already resolved through a link.
    pub async fn recipient_of(&self, invite: &invite::Model) -> Result<student::Model> {
        Student::find_by_id(invite.recipient_id)
            .one(&self.db)
            .await?
            .ok_or_else(AppError::invalid_link)
    }
}

/// Parse a follow-up id from a link and find it on the invite.
pub fn find_followup<'a>(invite: &'a invite::Model, raw_id: &str) -> Result<&'a Followup> {
    let id = Uuid::parse_str(raw_id).map_err(|_| AppError::invalid_link())?;
    invite.followups.get(id).ok_or_else(AppError::invalid_link)
}
