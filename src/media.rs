//! Media URL Builder
//!
//! Signed image URLs for group pictures and user avatars. The bearer token travels as a
//! query parameter, so these URLs are credentials: they are never logged, and callers
//! should avoid persisting them or passing them to third parties.

use crate::host::HostMetadata;
use crate::token::TokenService;
use std::sync::Arc;

/// Whose picture to fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSubject {
    Group(String),
    User(String),
}

impl ImageSubject {
    /// Selector form used by callers that track the conversation kind as a flag.
    pub fn from_flag(is_private_group: bool, group_id: &str, user_id: &str) -> Self {
        if is_private_group {
            ImageSubject::Group(group_id.to_string())
        } else {
            ImageSubject::User(user_id.to_string())
        }
    }
}

pub fn image_path(subject: &ImageSubject) -> String {
    match subject {
        ImageSubject::Group(group_id) => format!("groups/{}/picture", group_id),
        ImageSubject::User(user_id) => format!("users/{}/profile-picture", user_id),
    }
}

pub struct MediaUrlBuilder {
    host: Arc<dyn HostMetadata>,
    tokens: Arc<TokenService>,
}

impl MediaUrlBuilder {
    pub fn new(host: Arc<dyn HostMetadata>, tokens: Arc<TokenService>) -> Self {
        Self { host, tokens }
    }

    pub fn build_image_url(
        &self,
        is_private_group: bool,
        group_id: &str,
        user_id: &str,
        host_app_id: &str,
    ) -> Option<String> {
        self.image_url(
            &ImageSubject::from_flag(is_private_group, group_id, user_id),
            host_app_id,
        )
    }

    /// `<base><path>?token=<token>`, or `None` without a base address or token.
    pub fn image_url(&self, subject: &ImageSubject, host_app_id: &str) -> Option<String> {
        let Some(base) = self.host.api_base_url(host_app_id) else {
            tracing::debug!(host_app_id, "No API base URL; image URL unavailable");
            return None;
        };
        let token = self.tokens.get_token(host_app_id)?;
        Some(format!("{}{}?token={}", base, image_path(subject), token))
    }
}
