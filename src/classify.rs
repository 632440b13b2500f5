use crate::Category;

/// Ordered rule table. Earlier rows win, so a headline mentioning both an
/// election and bitcoin is political. Anything unmatched is cultural.
pub const CATEGORY_RULES: &[(Category, &[&str])] = &[
    (
        Category::Political,
        &[
            "trump", "biden", "election", "politic", "government", "congress", "senate",
            "president", "kamala", "maga", "dem", "gop",
        ],
    ),
    (
        Category::Breaking,
        &["breaking", "alert", "urgent", "just in", "developing", "live"],
    ),
    (
        Category::Tech,
        &[
            "crypto", "bitcoin", "btc", "eth", "ethereum", "nft", "blockchain", "stock", "market",
            "tech", "ai", "chatgpt", "apple", "google", "tesla", "meta", "microsoft",
        ],
    ),
    (
        Category::Viral,
        &[
            "video", "viral", "meme", "watch", "tiktok", "youtube", "clip", "trending", "views",
            "lol", "omg", "wtf",
        ],
    ),
    (
        Category::Celebrity,
        &[
            "kardashian", "taylor swift", "swift", "beyonce", "drake", "kanye", "celeb", "singer",
            "actor", "rihanna", "bieber", "ariana", "selena", "chris brown", "cardi",
        ],
    ),
];

pub fn classify(text: &str) -> Category {
    let lower = text.to_lowercase();
    CATEGORY_RULES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|keyword| lower.contains(keyword)))
        .map(|(category, _)| *category)
        .unwrap_or(Category::Cultural)
}
