//! Ad records and the enumerated create/update schema.
//!
//! The feed treats an [`Ad`] as opaque apart from its id and the two
//! searchable text fields.  Everything the admin desk may change goes through
//! [`NewAd`] or [`AdUpdate`], which name every writable field explicitly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::store::StoreError;

/// Stable store-assigned identifier.
pub type AdId = i64;

pub const DEFAULT_TITLE: &str = "Untitled Ad";
pub const DEFAULT_DESCRIPTION: &str = "No description provided";
pub const PLACEHOLDER_IMAGE_URL: &str =
    "https://via.placeholder.com/300x200/4F46E5/FFFFFF?text=No+Image";

// ───────────────────────────────────────── record ────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ad {
    pub id: AdId,
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub smart_link: String,
    #[serde(default)]
    pub clicks: u64,
    pub created_at: DateTime<Utc>,
}

impl Ad {
    /// Case-insensitive substring match on title or description.
    /// `needle_lower` must already be lower-cased.
    pub fn matches(&self, needle_lower: &str) -> bool {
        if needle_lower.is_empty() {
            return true;
        }
        self.title.to_lowercase().contains(needle_lower)
            || self.description.to_lowercase().contains(needle_lower)
    }
}

// ───────────────────────────────────────── schema ────────────

/// Fields supplied when creating an ad.  Raw form input; see [`NewAd::normalise`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewAd {
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub smart_link: String,
}

impl NewAd {
    /// Trim every field, apply defaults to the optional ones and validate the
    /// smart link.
    pub fn normalise(self) -> Result<NewAd, StoreError> {
        let smart_link = self.smart_link.trim().to_string();
        validate_link(&smart_link)?;
        Ok(NewAd {
            title: or_default(&self.title, DEFAULT_TITLE),
            description: or_default(&self.description, DEFAULT_DESCRIPTION),
            image_url: or_default(&self.image_url, PLACEHOLDER_IMAGE_URL),
            smart_link,
        })
    }
}

/// Partial update.  A field applies only when it is `Some` and non-empty
/// after trimming.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub smart_link: Option<String>,
}

impl AdUpdate {
    /// Apply to `ad` in place.  Nothing is written unless the whole update is
    /// valid.
    pub fn apply_to(&self, ad: &mut Ad) -> Result<(), StoreError> {
        let title = effective(&self.title);
        let description = effective(&self.description);
        let image_url = effective(&self.image_url);
        let smart_link = effective(&self.smart_link);

        if title.is_none() && description.is_none() && image_url.is_none() && smart_link.is_none()
        {
            return Err(StoreError::EmptyUpdate);
        }
        if let Some(link) = smart_link {
            validate_link(link)?;
        }

        if let Some(v) = title {
            ad.title = v.to_string();
        }
        if let Some(v) = description {
            ad.description = v.to_string();
        }
        if let Some(v) = image_url {
            ad.image_url = v.to_string();
        }
        if let Some(v) = smart_link {
            ad.smart_link = v.to_string();
        }
        Ok(())
    }
}

// ───────────────────────────────────────── stats ─────────────

/// Aggregate numbers shown on the admin dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct AdStats {
    pub total_ads: usize,
    pub total_clicks: u64,
    pub average_clicks_per_ad: f64,
    pub top_performing: Option<Ad>,
}

impl AdStats {
    pub fn from_ads(ads: &[Ad]) -> Self {
        let total_ads = ads.len();
        let total_clicks: u64 = ads.iter().map(|a| a.clicks).sum();
        let average_clicks_per_ad = if total_ads > 0 {
            total_clicks as f64 / total_ads as f64
        } else {
            0.0
        };
        // Most clicks wins; ties go to the lowest id.
        let top_performing = ads
            .iter()
            .max_by(|a, b| a.clicks.cmp(&b.clicks).then_with(|| b.id.cmp(&a.id)))
            .cloned();
        Self {
            total_ads,
            total_clicks,
            average_clicks_per_ad,
            top_performing,
        }
    }
}

// ───────────────────────────────────────── helpers ───────────

fn or_default(value: &str, fallback: &str) -> String {
    let v = value.trim();
    if v.is_empty() {
        fallback.to_string()
    } else {
        v.to_string()
    }
}

fn effective(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Smart links must be absolute `http`/`https` URLs with a host.
pub fn validate_link(link: &str) -> Result<(), StoreError> {
    if link.is_empty() {
        return Err(StoreError::Validation("Smart link is required".into()));
    }
    let rest = link
        .strip_prefix("https://")
        .or_else(|| link.strip_prefix("http://"))
        .ok_or_else(|| StoreError::Validation("Please enter a valid URL for the Smart Link".into()))?;
    let host = rest.split(['/', '?', '#']).next().unwrap_or("");
    if host.is_empty() || host.contains(char::is_whitespace) {
        return Err(StoreError::Validation(
            "Please enter a valid URL for the Smart Link".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
pub(crate) fn sample_ad(id: AdId, title: &str, description: &str) -> Ad {
    Ad {
        id,
        title: title.to_string(),
        description: description.to_string(),
        image_url: PLACEHOLDER_IMAGE_URL.to_string(),
        smart_link: format!("https://example.com/offer/{id}"),
        clicks: 0,
        created_at: DateTime::<Utc>::from_timestamp(1_700_000_000 + id, 0).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_is_case_insensitive_over_title_and_description() {
        let ad = sample_ad(1, "Summer SALE", "Cheap flights to Lisbon");
        assert!(ad.matches("sale"));
        assert!(ad.matches("lisbon"));
        assert!(ad.matches(""));
        assert!(!ad.matches("porto"));
    }

    #[test]
    fn create_applies_defaults_and_requires_link() {
        let normalised = NewAd {
            title: "  ".into(),
            description: String::new(),
            image_url: String::new(),
            smart_link: " https://shop.example.com/deal ".into(),
        }
        .normalise()
        .unwrap();
        assert_eq!(normalised.title, DEFAULT_TITLE);
        assert_eq!(normalised.description, DEFAULT_DESCRIPTION);
        assert_eq!(normalised.image_url, PLACEHOLDER_IMAGE_URL);
        assert_eq!(normalised.smart_link, "https://shop.example.com/deal");

        let missing = NewAd::default().normalise();
        assert!(matches!(missing, Err(StoreError::Validation(_))));
    }

    #[test]
    fn invalid_links_are_rejected() {
        assert!(validate_link("ftp://example.com").is_err());
        assert!(validate_link("https://").is_err());
        assert!(validate_link("example.com").is_err());
        assert!(validate_link("http://example.com?x=1").is_ok());
    }

    #[test]
    fn update_with_only_empty_fields_is_rejected() {
        let mut ad = sample_ad(3, "Old", "Desc");
        let update = AdUpdate {
            title: Some("   ".into()),
            description: Some(String::new()),
            ..AdUpdate::default()
        };
        assert!(matches!(update.apply_to(&mut ad), Err(StoreError::EmptyUpdate)));
        assert_eq!(ad.title, "Old");
    }

    #[test]
    fn update_touches_only_named_fields() {
        let mut ad = sample_ad(3, "Old", "Desc");
        let update = AdUpdate {
            title: Some(" New ".into()),
            ..AdUpdate::default()
        };
        update.apply_to(&mut ad).unwrap();
        assert_eq!(ad.title, "New");
        assert_eq!(ad.description, "Desc");
    }

    #[test]
    fn invalid_link_in_update_leaves_record_untouched() {
        let mut ad = sample_ad(4, "Keep", "Desc");
        let update = AdUpdate {
            title: Some("Changed".into()),
            smart_link: Some("not a url".into()),
            ..AdUpdate::default()
        };
        assert!(update.apply_to(&mut ad).is_err());
        assert_eq!(ad.title, "Keep");
    }

    #[test]
    fn stats_handle_empty_and_ties() {
        let empty = AdStats::from_ads(&[]);
        assert_eq!(empty.total_ads, 0);
        assert_eq!(empty.average_clicks_per_ad, 0.0);
        assert!(empty.top_performing.is_none());

        let mut a = sample_ad(1, "a", "");
        let mut b = sample_ad(2, "b", "");
        a.clicks = 4;
        b.clicks = 4;
        let stats = AdStats::from_ads(&[b, a]);
        assert_eq!(stats.total_clicks, 8);
        assert_eq!(stats.average_clicks_per_ad, 4.0);
        assert_eq!(stats.top_performing.map(|ad| ad.id), Some(1));
    }
}
