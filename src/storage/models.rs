use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};

/// Moderation state shared by tutorials, comments and exams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize_repr, Deserialize_repr)]
#[repr(i32)]
pub enum ConfirmStatus {
    Disproved = -1,
    Waiting = 0,
    Confirmed = 1,
}

impl ConfirmStatus {
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    pub fn from_i32(v: i32) -> Option<Self> {
        match v {
            -1 => Some(Self::Disproved),
            0 => Some(Self::Waiting),
            1 => Some(Self::Confirmed),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Waiting => "در انتظار تایید",
            Self::Confirmed => "تایید شده",
            Self::Disproved => "رد شده",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr, Deserialize_repr)]
#[repr(i32)]
pub enum AnswerStatus {
    Incorrect = -1,
    Blank = 0,
    Correct = 1,
}

impl AnswerStatus {
    /// Classify a participant's answer against the correct choice.
    pub fn classify(answer: Option<i32>, correct: Option<i32>) -> Self {
        match answer {
            None => Self::Blank,
            Some(a) if Some(a) == correct => Self::Correct,
            Some(_) => Self::Incorrect,
        }
    }

    pub fn from_i32(v: i32) -> Self {
        match v {
            1 => Self::Correct,
            -1 => Self::Incorrect,
            _ => Self::Blank,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr, Deserialize_repr)]
#[repr(i32)]
pub enum ParticipationStatus {
    InProgress = 1,
    WaitingForMark = 2,
    Completed = 3,
}

impl ParticipationStatus {
    pub fn from_i32(v: i32) -> Self {
        match v {
            2 => Self::WaitingForMark,
            3 => Self::Completed,
            _ => Self::InProgress,
        }
    }
}

/// One page of results plus the numbers a paginator needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u64,
    pub page_size: u64,
    pub total: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, page: u64, page_size: u64, total: u64) -> Self {
        let total_pages = if page_size == 0 {
            0
        } else {
            total.div_ceil(page_size)
        };
        Self {
            items,
            page,
            page_size,
            total,
            total_pages,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            page_size: self.page_size,
            total: self.total,
            total_pages: self.total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_answers() {
        assert_eq!(AnswerStatus::classify(None, Some(2)), AnswerStatus::Blank);
        assert_eq!(AnswerStatus::classify(Some(2), Some(2)), AnswerStatus::Correct);
        assert_eq!(AnswerStatus::classify(Some(3), Some(2)), AnswerStatus::Incorrect);
    }

    #[test]
    fn confirm_status_serializes_as_integer() {
        assert_eq!(serde_json::to_string(&ConfirmStatus::Disproved).unwrap(), "-1");
        assert_eq!(ConfirmStatus::from_i32(1), Some(ConfirmStatus::Confirmed));
        assert_eq!(ConfirmStatus::from_i32(7), None);
        assert_eq!(ConfirmStatus::Waiting.label(), "در انتظار تایید");
    }

    #[test]
    fn page_counts_round_up() {
        let page = Page::new(vec![1, 2], 1, 2, 5);
        assert_eq!(page.total_pages, 3);
        let empty: Page<i32> = Page::new(vec![], 1, 15, 0);
        assert_eq!(empty.total_pages, 0);
    }
}
