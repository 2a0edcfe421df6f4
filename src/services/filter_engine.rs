//! Platform, date-range, minimum-engagement and content filtering over
//! normalized posts.

use std::collections::BTreeSet;

use chrono::{ DateTime, Utc };

use crate::{ errors::FilterError, models::{ Platform, Post } };

/// User-selected constraints for one filter-and-render cycle.
///
/// An empty platform set matches nothing and is rejected up front rather
/// than being read as "all platforms".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterCriteria {
    pub platforms: BTreeSet<Platform>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub min_engagement: u64,
    /// Lowercased terms; a post matches if its content contains any of them.
    /// Empty means no content constraint.
    pub search_terms: Vec<String>,
}

impl FilterCriteria {
    pub fn new(
        platforms: impl IntoIterator<Item = Platform>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        min_engagement: u64
    ) -> Result<Self, FilterError> {
        let criteria = Self {
            platforms: platforms.into_iter().collect(),
            start,
            end,
            min_engagement,
            search_terms: Vec::new(),
        };
        criteria.validate()?;
        Ok(criteria)
    }

    /// Restrict to posts mentioning any of the comma separated terms.
    pub fn with_search(mut self, raw: &str) -> Self {
        self.search_terms = raw
            .split(',')
            .map(|term| term.trim().to_lowercase())
            .filter(|term| !term.is_empty())
            .collect();
        self
    }

    pub fn validate(&self) -> Result<(), FilterError> {
        if self.platforms.is_empty() {
            return Err(FilterError::EmptySelection);
        }
        if self.start > self.end {
            return Err(FilterError::InvalidRange {
                start: self.start,
                end: self.end,
            });
        }
        Ok(())
    }

    /// Both range bounds are inclusive.
    pub fn matches(&self, post: &Post) -> bool {
        self.platforms.contains(&post.platform) &&
            self.start <= post.timestamp &&
            post.timestamp <= self.end &&
            post.total_engagement() >= self.min_engagement &&
            self.mentions_search_term(post)
    }

    fn mentions_search_term(&self, post: &Post) -> bool {
        if self.search_terms.is_empty() {
            return true;
        }
        let content = post.content.to_lowercase();
        self.search_terms.iter().any(|term| content.contains(term.as_str()))
    }
}

/// Stable filter: the result is the subsequence of `posts` that matches, in
/// input order.
pub fn filter_posts(posts: &[Post], criteria: &FilterCriteria) -> Result<Vec<Post>, FilterError> {
    criteria.validate()?;

    Ok(
        posts
            .iter()
            .filter(|post| criteria.matches(post))
            .cloned()
            .collect()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use crate::models::Engagement;

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, d, 0, 0, 0).unwrap()
    }

    fn post(id: &str, platform: Platform, d: u32, likes: u64) -> Post {
        Post {
            id: id.to_string(),
            platform,
            author: "author".to_string(),
            timestamp: day(d),
            content: format!("post {}", id),
            url: None,
            community: None,
            engagement: Engagement::new(likes, 0, 0),
        }
    }

    fn sample() -> Vec<Post> {
        vec![
            post("a", Platform::Reddit, 1, 7),
            post("b", Platform::Twitter, 2, 11),
            post("c", Platform::LinkedIn, 3, 50),
            post("d", Platform::Reddit, 5, 1),
            post("e", Platform::Twitter, 4, 20)
        ]
    }

    fn ids(posts: &[Post]) -> Vec<&str> {
        posts
            .iter()
            .map(|p| p.id.as_str())
            .collect()
    }

    #[test]
    fn keeps_matching_posts_in_input_order() {
        let criteria = FilterCriteria::new(
            [Platform::Reddit, Platform::Twitter],
            day(1),
            day(4),
            5
        ).unwrap();

        let filtered = filter_posts(&sample(), &criteria).unwrap();
        assert_eq!(ids(&filtered), vec!["a", "b", "e"]);
    }

    #[test]
    fn range_bounds_are_inclusive() {
        let criteria = FilterCriteria::new(Platform::ALL, day(2), day(3), 0).unwrap();
        let filtered = filter_posts(&sample(), &criteria).unwrap();
        assert_eq!(ids(&filtered), vec!["b", "c"]);
    }

    #[test]
    fn min_engagement_is_inclusive() {
        let criteria = FilterCriteria::new(Platform::ALL, day(1), day(31), 11).unwrap();
        let filtered = filter_posts(&sample(), &criteria).unwrap();
        assert_eq!(ids(&filtered), vec!["b", "c", "e"]);
    }

    #[test]
    fn filtering_is_idempotent() {
        let criteria = FilterCriteria::new([Platform::Twitter], day(1), day(31), 0).unwrap();
        let once = filter_posts(&sample(), &criteria).unwrap();
        let twice = filter_posts(&once, &criteria).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn output_is_a_subsequence_of_input() {
        let input = sample();
        let criteria = FilterCriteria::new(Platform::ALL, day(1), day(31), 10).unwrap();
        let filtered = filter_posts(&input, &criteria).unwrap();

        let mut cursor = input.iter();
        for kept in &filtered {
            assert!(cursor.any(|p| p == kept));
        }
    }

    #[test]
    fn empty_selection_is_rejected() {
        assert_eq!(
            FilterCriteria::new(Vec::<Platform>::new(), day(1), day(2), 0).unwrap_err(),
            FilterError::EmptySelection
        );

        let criteria = FilterCriteria {
            platforms: BTreeSet::new(),
            start: day(1),
            end: day(2),
            min_engagement: 0,
            search_terms: Vec::new(),
        };
        assert_eq!(filter_posts(&sample(), &criteria).unwrap_err(), FilterError::EmptySelection);
    }

    #[test]
    fn inverted_range_is_rejected() {
        let err = FilterCriteria::new(Platform::ALL, day(3), day(1), 0).unwrap_err();
        assert_eq!(err, FilterError::InvalidRange { start: day(3), end: day(1) });
    }

    #[test]
    fn search_matches_any_term_ignoring_case() {
        let mut posts = sample();
        posts[0].content = "New DIABETES pathway".to_string();
        posts[2].content = "Heart disease clinic".to_string();

        let criteria = FilterCriteria::new(Platform::ALL, day(1), day(31), 0)
            .unwrap()
            .with_search("diabetes, heart disease ,");
        assert_eq!(criteria.search_terms, vec!["diabetes", "heart disease"]);

        let filtered = filter_posts(&posts, &criteria).unwrap();
        assert_eq!(ids(&filtered), vec!["a", "c"]);
    }

    #[test]
    fn blank_search_matches_everything() {
        let criteria = FilterCriteria::new(Platform::ALL, day(1), day(31), 0)
            .unwrap()
            .with_search(" , ");
        assert!(criteria.search_terms.is_empty());
        assert_eq!(filter_posts(&sample(), &criteria).unwrap().len(), 5);
    }

    #[test]
    fn huge_engagement_filters_without_overflow() {
        let mut posts = sample();
        posts[0].engagement = Engagement::new(u64::MAX, u64::MAX, u64::MAX);
        let criteria = FilterCriteria::new(Platform::ALL, day(1), day(31), u64::MAX).unwrap();
        assert_eq!(ids(&filter_posts(&posts, &criteria).unwrap()), vec!["a"]);
    }

    #[test]
    fn empty_input_yields_empty_output() {
        let criteria = FilterCriteria::new(Platform::ALL, day(1), day(2), 0).unwrap();
        assert!(filter_posts(&[], &criteria).unwrap().is_empty());
    }
}
