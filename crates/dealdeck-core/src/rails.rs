//! Curation rails and free-text search over the offer collection.

use crate::offers::Offer;

/// A curated UI rail, selected by one of the offer's curation flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rail {
    Featured,
    HiddenGems,
    Underrated,
    DeveloperPack,
}

impl Rail {
    /// Parses `featured`, `hidden-gems`, `underrated` or `developer-pack`
    /// (underscores accepted too).
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "featured" => Some(Self::Featured),
            "hidden-gems" => Some(Self::HiddenGems),
            "underrated" => Some(Self::Underrated),
            "developer-pack" | "github" => Some(Self::DeveloperPack),
            _ => None,
        }
    }

    #[must_use]
    pub fn includes(self, offer: &Offer) -> bool {
        match self {
            Self::Featured => offer.is_featured,
            Self::HiddenGems => offer.is_hidden_gem,
            Self::Underrated => offer.is_underrated,
            Self::DeveloperPack => offer.github_offer,
        }
    }

    #[must_use]
    pub fn select(self, offers: &[Offer]) -> Vec<&Offer> {
        offers.iter().filter(|o| self.includes(o)).collect()
    }
}

#[must_use]
pub fn featured(offers: &[Offer]) -> Vec<&Offer> {
    Rail::Featured.select(offers)
}

#[must_use]
pub fn hidden_gems(offers: &[Offer]) -> Vec<&Offer> {
    Rail::HiddenGems.select(offers)
}

#[must_use]
pub fn underrated(offers: &[Offer]) -> Vec<&Offer> {
    Rail::Underrated.select(offers)
}

#[must_use]
pub fn developer_pack(offers: &[Offer]) -> Vec<&Offer> {
    Rail::DeveloperPack.select(offers)
}

/// Lower-cased search terms.
///
/// Every whitespace-separated term must appear in the offer's name, offer
/// text, description or tags. No terms matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchTerms(Vec<String>);

impl SearchTerms {
    #[must_use]
    pub fn parse(query: &str) -> Self {
        Self(query.split_whitespace().map(str::to_lowercase).collect())
    }

    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn matches(&self, offer: &Offer) -> bool {
        if self.0.is_empty() {
            return true;
        }
        let haystack = searchable_text(offer);
        self.0.iter().all(|term| haystack.contains(term.as_str()))
    }
}

/// Case-insensitive search; see [`SearchTerms`].
#[must_use]
pub fn search<'a>(offers: &'a [Offer], query: &str) -> Vec<&'a Offer> {
    let terms = SearchTerms::parse(query);
    offers.iter().filter(|offer| terms.matches(offer)).collect()
}

fn searchable_text(offer: &Offer) -> String {
    let mut text = String::with_capacity(
        offer.name.len() + offer.offer.len() + offer.description.len() + 16,
    );
    for part in [&offer.name, &offer.offer, &offer.description] {
        text.push_str(&part.to_lowercase());
        text.push('\n');
    }
    for tag in &offer.tags {
        text.push_str(&tag.to_lowercase());
        text.push('\n');
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_offer(id: i64, name: &str, tags: &[&str]) -> Offer {
        Offer {
            id,
            name: name.to_string(),
            offer: "Free for students".to_string(),
            tags: tags.iter().map(|t| (*t).to_string()).collect(),
            ..Offer::default()
        }
    }

    #[test]
    fn rails_filter_by_flag_and_keep_order() {
        let mut a = make_offer(1, "A", &[]);
        a.is_featured = true;
        a.is_underrated = true;
        let mut b = make_offer(2, "B", &[]);
        b.is_hidden_gem = true;
        let mut c = make_offer(3, "C", &[]);
        c.is_featured = true;
        c.github_offer = true;
        let offers = vec![a, b, c];

        let ids = |v: Vec<&Offer>| v.iter().map(|o| o.id).collect::<Vec<_>>();
        assert_eq!(ids(featured(&offers)), vec![1, 3]);
        assert_eq!(ids(hidden_gems(&offers)), vec![2]);
        assert_eq!(ids(underrated(&offers)), vec![1]);
        assert_eq!(ids(developer_pack(&offers)), vec![3]);
    }

    #[test]
    fn search_matches_tags_case_insensitively() {
        let offers = vec![
            make_offer(1, "Copilot", &["AI", "Coding"]),
            make_offer(2, "Figma", &["Design"]),
        ];
        let found = search(&offers, "coding");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, 1);
    }

    #[test]
    fn search_requires_every_term() {
        let offers = vec![make_offer(1, "GitHub Copilot", &["AI"])];
        assert_eq!(search(&offers, "copilot ai").len(), 1);
        assert!(search(&offers, "copilot design").is_empty());
    }

    #[test]
    fn rail_names_parse_loosely() {
        assert_eq!(Rail::parse("hidden_gems"), Some(Rail::HiddenGems));
        assert_eq!(Rail::parse(" Featured "), Some(Rail::Featured));
        assert_eq!(Rail::parse("github"), Some(Rail::DeveloperPack));
        assert_eq!(Rail::parse("trending"), None);
    }

    #[test]
    fn search_terms_report_blankness() {
        assert!(SearchTerms::parse("  ").is_blank());
        assert!(!SearchTerms::parse("ai").is_blank());
    }

    #[test]
    fn blank_query_returns_everything() {
        let offers = vec![make_offer(1, "A", &[]), make_offer(2, "B", &[])];
        assert_eq!(search(&offers, "   ").len(), 2);
    }
}
