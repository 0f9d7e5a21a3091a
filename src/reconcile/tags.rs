use std::collections::HashMap;

use crate::kuma::{MonitorService, TagId};
use crate::session::{self, Session};

/// Colour given to tags created during a sync.
pub const TAG_COLOR: &str = "#4299e1";

/// Maps tag names to ids, creating missing tags on first use.
#[derive(Debug, Default)]
pub struct TagResolver {
    cache: HashMap<String, TagId>,
}

impl TagResolver {
    /// Resolves `name` to a tag id.
    ///
    /// Returns `Ok(None)` for an empty name or when the tag could be neither
    /// found nor created; tagging never blocks the caller.
    ///
    /// # Errors
    ///
    /// Only fatal session errors are returned.
    pub async fn resolve<S: MonitorService>(
        &mut self,
        session: &mut Session<S>,
        name: &str,
    ) -> session::Result<Option<TagId>> {
        if name.is_empty() {
            return Ok(None);
        }
        if let Some(&id) = self.cache.get(name) {
            return Ok(Some(id));
        }

        match lookup_or_create(session, name).await {
            Ok(id) => {
                self.cache.insert(name.to_owned(), id);
                Ok(Some(id))
            }
            Err(err) if err.is_fatal() => Err(err),
            Err(err) => {
                log::warn!("Could not resolve tag '{name}': {err}");
                Ok(None)
            }
        }
    }
}

async fn lookup_or_create<S: MonitorService>(
    session: &mut Session<S>,
    name: &str,
) -> session::Result<TagId> {
    let tags = session.list_tags().await?;
    if let Some(tag) = tags.into_iter().find(|tag| tag.name == name) {
        return Ok(tag.id);
    }

    let id = session.create_tag(name, TAG_COLOR).await?;
    log::info!("Created new tag '{name}' (ID: {id})");
    Ok(id)
}
