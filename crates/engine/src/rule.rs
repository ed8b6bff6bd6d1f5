//! What counts as a notable change for a bot.

use watcher_core::{AlertReason, WatchValue};

/// Direction of change that deserves a notification.
#[derive(Debug, Clone, PartialEq)]
pub enum Rule {
    /// Only keys never seen before (new listings).
    NewKey,
    /// New key or a numeric drop, optionally only strictly below a threshold.
    Decrease { below: Option<f64> },
    /// Flag switched from absent/false to true.
    BecameTrue,
    /// New key or any value change.
    AnyChange,
}

impl Rule {
    /// Decide whether moving from `previous` to `current` qualifies.
    ///
    /// Pure function of its inputs; `previous` is `None` for unseen keys.
    pub fn assess(&self, previous: Option<&WatchValue>, current: &WatchValue) -> Option<AlertReason> {
        match self {
            Rule::NewKey => previous.is_none().then_some(AlertReason::NewKey),

            Rule::Decrease { below } => {
                let now = current.as_f64()?;
                if let Some(limit) = below {
                    if now >= *limit {
                        return None;
                    }
                }
                match previous {
                    None => Some(AlertReason::Decreased { below: *below }),
                    Some(prev) => match prev.as_f64() {
                        Some(before) if now < before => Some(AlertReason::Decreased { below: *below }),
                        Some(_) => None,
                        // Stored value of another type: treat like a fresh key.
                        None => Some(AlertReason::Decreased { below: *below }),
                    },
                }
            }

            Rule::BecameTrue => {
                if current.as_bool() != Some(true) {
                    return None;
                }
                match previous.and_then(WatchValue::as_bool) {
                    Some(true) => None,
                    _ => Some(AlertReason::BecameTrue),
                }
            }

            Rule::AnyChange => match previous {
                None => Some(AlertReason::NewKey),
                Some(prev) if prev != current => Some(AlertReason::Changed),
                Some(_) => None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(n: f64) -> WatchValue {
        WatchValue::Number(n)
    }

    #[test]
    fn test_new_key_rule() {
        let rule = Rule::NewKey;
        assert_eq!(rule.assess(None, &"x".into()), Some(AlertReason::NewKey));
        assert_eq!(rule.assess(Some(&"x".into()), &"y".into()), None);
    }

    #[test]
    fn test_decrease_without_threshold() {
        let rule = Rule::Decrease { below: None };
        assert!(rule.assess(None, &num(10.0)).is_some());
        assert!(rule.assess(Some(&num(499.0)), &num(449.0)).is_some());
        assert!(rule.assess(Some(&num(449.0)), &num(449.0)).is_none());
        assert!(rule.assess(Some(&num(449.0)), &num(499.0)).is_none());
    }

    #[test]
    fn test_decrease_with_threshold() {
        let rule = Rule::Decrease { below: Some(400.0) };
        assert!(rule.assess(None, &num(420.0)).is_none());
        assert!(rule.assess(None, &num(399.0)).is_some());
        assert!(rule.assess(Some(&num(420.0)), &num(410.0)).is_none());
        assert!(rule.assess(Some(&num(420.0)), &num(390.0)).is_some());
        assert!(rule.assess(Some(&num(400.0)), &num(400.0)).is_none());
    }

    #[test]
    fn test_decrease_ignores_non_numeric() {
        let rule = Rule::Decrease { below: None };
        assert!(rule.assess(None, &WatchValue::Flag(true)).is_none());
    }

    #[test]
    fn test_became_true() {
        let rule = Rule::BecameTrue;
        assert_eq!(rule.assess(None, &true.into()), Some(AlertReason::BecameTrue));
        assert_eq!(rule.assess(Some(&false.into()), &true.into()), Some(AlertReason::BecameTrue));
        assert_eq!(rule.assess(Some(&true.into()), &true.into()), None);
        assert_eq!(rule.assess(None, &false.into()), None);
        assert_eq!(rule.assess(Some(&true.into()), &false.into()), None);
    }

    #[test]
    fn test_any_change() {
        let rule = Rule::AnyChange;
        assert_eq!(rule.assess(None, &num(1.0)), Some(AlertReason::NewKey));
        assert_eq!(rule.assess(Some(&num(1.0)), &num(2.0)), Some(AlertReason::Changed));
        assert_eq!(rule.assess(Some(&num(1.0)), &num(1.0)), None);
    }
}
