//! Runtime configuration definitions.
//!
//! Every database-backed setting is declared once in [`ALL_CONFIGS`]: its
//! key, value type, default and metadata. Startup seeds missing rows from
//! here and keeps the stored metadata in sync.
//!
//! To add a setting, add its key to [`keys`] and a [`ConfigDef`] entry.

use super::types::ValueType;

pub mod categories {
    pub const REWARDS: &str = "rewards";
    pub const PAGINATION: &str = "pagination";
    pub const STATISTICS: &str = "statistics";
    pub const SITE: &str = "site";
    pub const AUTH: &str = "auth";
}

pub struct ConfigDef {
    pub key: &'static str,
    pub value_type: ValueType,
    pub default_fn: fn() -> String,
    pub requires_restart: bool,
    pub is_sensitive: bool,
    pub category: &'static str,
    pub description: &'static str,
}

pub mod keys {
    // Tutorial rewards
    pub const TUTORIAL_LIKE_SCORE: &str = "TUTORIAL_LIKE_SCORE";
    pub const TUTORIAL_LIKE_COIN: &str = "TUTORIAL_LIKE_COIN";
    pub const TUTORIAL_VIEW_SCORE: &str = "TUTORIAL_VIEW_SCORE";
    pub const TUTORIAL_VIEW_COIN: &str = "TUTORIAL_VIEW_COIN";
    pub const TUTORIAL_UPVOTE_SCORE: &str = "TUTORIAL_UPVOTE_SCORE";
    pub const TUTORIAL_UPVOTE_COIN: &str = "TUTORIAL_UPVOTE_COIN";
    pub const TUTORIAL_DOWNVOTE_SCORE: &str = "TUTORIAL_DOWNVOTE_SCORE";
    pub const TUTORIAL_DOWNVOTE_COIN: &str = "TUTORIAL_DOWNVOTE_COIN";

    // Comment rewards
    pub const TUTORIAL_COMMENT_LIKE_SCORE: &str = "TUTORIAL_COMMENT_LIKE_SCORE";
    pub const TUTORIAL_COMMENT_LIKE_COIN: &str = "TUTORIAL_COMMENT_LIKE_COIN";
    pub const TUTORIAL_COMMENT_UPVOTE_SCORE: &str = "TUTORIAL_COMMENT_UPVOTE_SCORE";
    pub const TUTORIAL_COMMENT_UPVOTE_COIN: &str = "TUTORIAL_COMMENT_UPVOTE_COIN";
    pub const TUTORIAL_COMMENT_DOWNVOTE_SCORE: &str = "TUTORIAL_COMMENT_DOWNVOTE_SCORE";
    pub const TUTORIAL_COMMENT_DOWNVOTE_COIN: &str = "TUTORIAL_COMMENT_DOWNVOTE_COIN";

    // Exam rewards
    pub const EXAM_LIKE_SCORE: &str = "EXAM_LIKE_SCORE";
    pub const EXAM_LIKE_COIN: &str = "EXAM_LIKE_COIN";

    // Pagination
    pub const LEARNING_TUTORIAL_ARCHIVE_PAGINATE_BY: &str =
        "LEARNING_TUTORIAL_ARCHIVE_PAGINATE_BY";
    pub const USER_PANEL_PAGINATE_BY: &str = "USER_PANEL_PAGINATE_BY";

    // Statistics
    pub const USER_PANEL_STATISTICS_LAST_MONTH_COUNT: &str =
        "USER_PANEL_STATISTICS_LAST_MONTH_COUNT";

    // Site text
    pub const WEBSITE_KEYWORDS: &str = "WEBSITE_KEYWORDS";
    pub const WEBSITE_DESCRIPTION: &str = "WEBSITE_DESCRIPTION";

    // Auth
    pub const AUTH_JWT_SECRET: &str = "AUTH_JWT_SECRET";
    pub const AUTH_SESSION_HOURS: &str = "AUTH_SESSION_HOURS";
    pub const AUTH_REMEMBER_ME_DAYS: &str = "AUTH_REMEMBER_ME_DAYS";
    pub const AUTH_EMAIL_CONFIRM_HOURS: &str = "AUTH_EMAIL_CONFIRM_HOURS";
}

const fn reward(
    key: &'static str,
    default_fn: fn() -> String,
    description: &'static str,
) -> ConfigDef {
    ConfigDef {
        key,
        value_type: ValueType::Int,
        default_fn,
        requires_restart: false,
        is_sensitive: false,
        category: categories::REWARDS,
        description,
    }
}

pub static ALL_CONFIGS: &[ConfigDef] = &[
    reward(
        keys::TUTORIAL_LIKE_SCORE,
        || "5".to_string(),
        "Score given to a tutorial's author for each like",
    ),
    reward(
        keys::TUTORIAL_LIKE_COIN,
        || "5".to_string(),
        "Coins given to a tutorial's author for each like",
    ),
    reward(
        keys::TUTORIAL_VIEW_SCORE,
        || "1".to_string(),
        "Score given to a user the first time they view a tutorial",
    ),
    reward(
        keys::TUTORIAL_VIEW_COIN,
        || "1".to_string(),
        "Coins given to a user the first time they view a tutorial",
    ),
    reward(
        keys::TUTORIAL_UPVOTE_SCORE,
        || "0".to_string(),
        "Score given to a tutorial's author for each upvote",
    ),
    reward(
        keys::TUTORIAL_UPVOTE_COIN,
        || "0".to_string(),
        "Coins given to a tutorial's author for each upvote",
    ),
    reward(
        keys::TUTORIAL_DOWNVOTE_SCORE,
        || "0".to_string(),
        "Score given to a tutorial's author for each downvote (may be negative)",
    ),
    reward(
        keys::TUTORIAL_DOWNVOTE_COIN,
        || "0".to_string(),
        "Coins given to a tutorial's author for each downvote (may be negative)",
    ),
    reward(
        keys::TUTORIAL_COMMENT_LIKE_SCORE,
        || "3".to_string(),
        "Score given to a comment's author for each like",
    ),
    reward(
        keys::TUTORIAL_COMMENT_LIKE_COIN,
        || "3".to_string(),
        "Coins given to a comment's author for each like",
    ),
    reward(
        keys::TUTORIAL_COMMENT_UPVOTE_SCORE,
        || "0".to_string(),
        "Score given to a comment's author for each upvote",
    ),
    reward(
        keys::TUTORIAL_COMMENT_UPVOTE_COIN,
        || "0".to_string(),
        "Coins given to a comment's author for each upvote",
    ),
    reward(
        keys::TUTORIAL_COMMENT_DOWNVOTE_SCORE,
        || "0".to_string(),
        "Score given to a comment's author for each downvote",
    ),
    reward(
        keys::TUTORIAL_COMMENT_DOWNVOTE_COIN,
        || "0".to_string(),
        "Coins given to a comment's author for each downvote",
    ),
    reward(
        keys::EXAM_LIKE_SCORE,
        || "0".to_string(),
        "Score given to an exam's designer for each like",
    ),
    reward(
        keys::EXAM_LIKE_COIN,
        || "0".to_string(),
        "Coins given to an exam's designer for each like",
    ),
    ConfigDef {
        key: keys::LEARNING_TUTORIAL_ARCHIVE_PAGINATE_BY,
        value_type: ValueType::Int,
        default_fn: || "30".to_string(),
        requires_restart: false,
        is_sensitive: false,
        category: categories::PAGINATION,
        description: "Tutorials per page in the public archive",
    },
    ConfigDef {
        key: keys::USER_PANEL_PAGINATE_BY,
        value_type: ValueType::Int,
        default_fn: || "15".to_string(),
        requires_restart: false,
        is_sensitive: false,
        category: categories::PAGINATION,
        description: "Items per page in the user panel lists",
    },
    ConfigDef {
        key: keys::USER_PANEL_STATISTICS_LAST_MONTH_COUNT,
        value_type: ValueType::Int,
        default_fn: || "5".to_string(),
        requires_restart: false,
        is_sensitive: false,
        category: categories::STATISTICS,
        description: "Number of Jalali months shown in the user panel view chart",
    },
    ConfigDef {
        key: keys::WEBSITE_KEYWORDS,
        value_type: ValueType::String,
        default_fn: || "آموزش، مجازآموز، برنامه نویسی".to_string(),
        requires_restart: false,
        is_sensitive: false,
        category: categories::SITE,
        description: "Meta keywords returned with public pages",
    },
    ConfigDef {
        key: keys::WEBSITE_DESCRIPTION,
        value_type: ValueType::String,
        default_fn: || "مجازآموز، بستری برای اشتراک آموزش".to_string(),
        requires_restart: false,
        is_sensitive: false,
        category: categories::SITE,
        description: "Meta description returned with public pages",
    },
    ConfigDef {
        key: keys::AUTH_JWT_SECRET,
        value_type: ValueType::String,
        default_fn: || crate::utils::generate_secure_token(32),
        requires_restart: false,
        is_sensitive: true,
        category: categories::AUTH,
        description: "Secret used to sign session and e-mail confirmation tokens",
    },
    ConfigDef {
        key: keys::AUTH_SESSION_HOURS,
        value_type: ValueType::Int,
        default_fn: || "12".to_string(),
        requires_restart: false,
        is_sensitive: false,
        category: categories::AUTH,
        description: "Lifetime of a session token without remember-me",
    },
    ConfigDef {
        key: keys::AUTH_REMEMBER_ME_DAYS,
        value_type: ValueType::Int,
        default_fn: || "14".to_string(),
        requires_restart: false,
        is_sensitive: false,
        category: categories::AUTH,
        description: "Lifetime of a persistent remember-me session",
    },
    ConfigDef {
        key: keys::AUTH_EMAIL_CONFIRM_HOURS,
        value_type: ValueType::Int,
        default_fn: || "72".to_string(),
        requires_restart: false,
        is_sensitive: false,
        category: categories::AUTH,
        description: "Validity of e-mail confirmation links",
    },
];

pub fn get_def(key: &str) -> Option<&'static ConfigDef> {
    ALL_CONFIGS.iter().find(|def| def.key == key)
}

pub fn all_keys() -> impl Iterator<Item = &'static str> {
    ALL_CONFIGS.iter().map(|def| def.key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_configs_keys_unique() {
        let mut keys: Vec<_> = ALL_CONFIGS.iter().map(|d| d.key).collect();
        let original_len = keys.len();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), original_len, "Duplicate keys in ALL_CONFIGS");
    }

    #[test]
    fn test_reward_defaults() {
        let like = get_def(keys::TUTORIAL_LIKE_SCORE).unwrap();
        assert_eq!((like.default_fn)(), "5");
        let comment_like = get_def(keys::TUTORIAL_COMMENT_LIKE_COIN).unwrap();
        assert_eq!((comment_like.default_fn)(), "3");
        assert_eq!((get_def(keys::EXAM_LIKE_SCORE).unwrap().default_fn)(), "0");
    }

    #[test]
    fn test_jwt_secret_is_sensitive_and_generated() {
        let def = get_def(keys::AUTH_JWT_SECRET).unwrap();
        assert!(def.is_sensitive);
        let a = (def.default_fn)();
        let b = (def.default_fn)();
        assert_eq!(a.len(), 64);
        assert_ne!(a, b);
    }

    #[test]
    fn test_int_defaults_parse() {
        for def in ALL_CONFIGS.iter().filter(|d| d.value_type == ValueType::Int) {
            assert!(
                (def.default_fn)().parse::<i64>().is_ok(),
                "{} default is not an integer",
                def.key
            );
        }
    }
}
