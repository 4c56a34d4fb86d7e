//! Entity identity resolution
//!
//! Maps the run target (entity id or site URL) to the entity's tenant and page
//! URL template.

use crate::models::EntityTarget;
use async_trait::async_trait;
use kingsroom_common::config::EntityConfig;
use thiserror::Error;

/// Placeholder in page URL templates replaced by the candidate identifier
pub const ID_PLACEHOLDER: &str = "{id}";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IdentityError {
    #[error("Unknown entity: {0}")]
    UnknownEntity(String),

    #[error("Invalid entity configuration for {0}: {1}")]
    InvalidConfig(String, String),
}

/// Resolved entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityContext {
    pub entity_id: String,
    /// Storage namespace for the entity's captures
    pub tenant: String,
    pub page_url_template: String,
}

impl EntityContext {
    pub fn page_url(&self, identifier: u64) -> String {
        self.page_url_template
            .replace(ID_PLACEHOLDER, &identifier.to_string())
    }
}

#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn resolve(&self, target: &EntityTarget) -> Result<EntityContext, IdentityError>;
}

/// Resolver over the configured entity list
#[derive(Debug, Clone, Default)]
pub struct StaticIdentityResolver {
    entities: Vec<EntityConfig>,
}

impl StaticIdentityResolver {
    pub fn new(entities: Vec<EntityConfig>) -> Self {
        Self { entities }
    }

    fn context(entity: &EntityConfig) -> Result<EntityContext, IdentityError> {
        if !entity.page_url_template.contains(ID_PLACEHOLDER) {
            return Err(IdentityError::InvalidConfig(
                entity.id.clone(),
                format!("page_url_template has no {} placeholder", ID_PLACEHOLDER),
            ));
        }
        let tenant = if entity.tenant.trim().is_empty() {
            entity.id.clone()
        } else {
            entity.tenant.clone()
        };
        Ok(EntityContext {
            entity_id: entity.id.clone(),
            tenant,
            page_url_template: entity.page_url_template.clone(),
        })
    }
}

fn normalize_url(url: &str) -> &str {
    url.trim()
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_start_matches("www.")
        .trim_end_matches('/')
}

#[async_trait]
impl IdentityResolver for StaticIdentityResolver {
    async fn resolve(&self, target: &EntityTarget) -> Result<EntityContext, IdentityError> {
        let found = match target {
            EntityTarget::EntityId(id) => self.entities.iter().find(|e| e.id == id.trim()),
            EntityTarget::Url(url) => {
                let wanted = normalize_url(url);
                self.entities.iter().find(|e| {
                    let base = normalize_url(&e.base_url);
                    !base.is_empty() && wanted.starts_with(base)
                })
            }
        };
        match found {
            Some(entity) => Self::context(entity),
            None => Err(IdentityError::UnknownEntity(target.to_string())),
        }
    }
}
