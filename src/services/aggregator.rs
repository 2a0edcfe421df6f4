//! Summary statistics over a filtered set of posts.

use std::{ cmp::Ordering, collections::{ BTreeMap, HashSet } };

use chrono::NaiveDate;

use crate::models::{ Platform, Post };

/// Aggregated view handed to the presentation layer.
///
/// Every platform has an entry in the per-platform maps, zero when absent,
/// and means over no posts are `0.0`. Engagement sums saturate rather than
/// wrap.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub total_posts: usize,
    pub total_engagement: u64,
    pub mean_engagement: f64,
    pub max_engagement: u64,
    pub counts: BTreeMap<Platform, usize>,
    pub totals: BTreeMap<Platform, u64>,
    pub means: BTreeMap<Platform, f64>,
    /// Distinct author names across all platforms.
    pub unique_authors: usize,
    /// Post count per UTC calendar day; days without posts are absent.
    pub posts_by_day: BTreeMap<NaiveDate, usize>,
    pub top_posts: Vec<Post>,
}

pub fn aggregate(posts: &[Post], top_k: usize) -> Summary {
    let mut counts: BTreeMap<Platform, usize> = Platform::ALL.iter().map(|p| (*p, 0)).collect();
    let mut totals: BTreeMap<Platform, u64> = Platform::ALL.iter().map(|p| (*p, 0)).collect();

    let mut posts_by_day: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    let mut authors: HashSet<&str> = HashSet::new();

    let mut total_engagement: u64 = 0;
    let mut max_engagement = 0;

    for post in posts {
        let engagement = post.total_engagement();
        *counts.entry(post.platform).or_default() += 1;
        let platform_total = totals.entry(post.platform).or_default();
        *platform_total = platform_total.saturating_add(engagement);
        total_engagement = total_engagement.saturating_add(engagement);
        max_engagement = max_engagement.max(engagement);
        *posts_by_day.entry(post.timestamp.date_naive()).or_default() += 1;
        authors.insert(post.author.as_str());
    }

    let means = counts
        .iter()
        .map(|(platform, count)| (*platform, mean(totals[platform], *count)))
        .collect();

    Summary {
        total_posts: posts.len(),
        total_engagement,
        mean_engagement: mean(total_engagement, posts.len()),
        max_engagement,
        counts,
        totals,
        means,
        unique_authors: authors.len(),
        posts_by_day,
        top_posts: top_k_posts(posts, top_k),
    }
}

/// Highest engagement first; equal engagement goes to the earlier post, and
/// fully tied posts keep their input order.
pub fn rank_by_engagement(posts: &[Post]) -> Vec<Post> {
    let mut ranked = posts.to_vec();
    ranked.sort_by(compare_rank);
    ranked
}

pub fn top_k_posts(posts: &[Post], k: usize) -> Vec<Post> {
    if k == 0 {
        return Vec::new();
    }
    let mut ranked = rank_by_engagement(posts);
    ranked.truncate(k);
    ranked
}

fn compare_rank(a: &Post, b: &Post) -> Ordering {
    b.total_engagement()
        .cmp(&a.total_engagement())
        .then_with(|| a.timestamp.cmp(&b.timestamp))
}

fn mean(total: u64, count: usize) -> f64 {
    if count == 0 { 0.0 } else { (total as f64) / (count as f64) }
}
