//! Settings resolution from CLI flags and environment.

use clap::ValueEnum;
use std::path::PathBuf;
use thiserror::Error;
use watcher_ledger::DEFAULT_THB_TO_CHF;
use watcher_runner::DeliveryPolicy;

/// Which bot to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BotKind {
    ShopSale,
    ProductSale,
    PriceDeal,
    Budget,
}

impl BotKind {
    /// Name used in paths and logs.
    pub fn slug(&self) -> &'static str {
        match self {
            BotKind::ShopSale => "shop-sale",
            BotKind::ProductSale => "product-sale",
            BotKind::PriceDeal => "price-deal",
            BotKind::Budget => "budget",
        }
    }

    /// Prefix of bot-specific environment variables.
    pub fn env_prefix(&self) -> &'static str {
        match self {
            BotKind::ShopSale => "SHOP_SALE",
            BotKind::ProductSale => "PRODUCT_SALE",
            BotKind::PriceDeal => "PRICE_DEAL",
            BotKind::Budget => "BUDGET",
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum SettingsError {
    #[error("Missing {0}")]
    Missing(String),

    #[error("Invalid value for {name}: {value:?}")]
    Invalid { name: String, value: String },
}

/// Values given on the command line; they win over the environment.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub dry_run: bool,
    pub data_dir: Option<PathBuf>,
    pub targets: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TelegramCredentials {
    pub token: String,
    pub chat_id: String,
}

/// Everything a bot run needs, resolved once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub bot: BotKind,
    pub data_dir: PathBuf,
    /// Targets list or bot config file; unused by the budget bot.
    pub targets_file: PathBuf,
    pub dry_run: bool,
    pub delivery_policy: DeliveryPolicy,
    /// `None` only for watcher bots in dry-run mode.
    pub telegram: Option<TelegramCredentials>,
    pub thb_to_chf: f64,
}

/// `1/true/yes/y/on`, case-insensitive.
pub fn parse_bool_env(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "y" | "on"
    )
}

impl Settings {
    pub fn resolve(
        bot: BotKind,
        cli: &CliOverrides,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, SettingsError> {
        // Empty variables count as unset.
        let var = |name: &str| env(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let prefix = bot.env_prefix();

        let dry_run = cli.dry_run || var("DRY_RUN").map_or(false, |v| parse_bool_env(&v));

        let data_dir = cli
            .data_dir
            .clone()
            .or_else(|| var(&format!("{}_DATA_DIR", prefix)).map(PathBuf::from))
            .or_else(|| var("WATCHER_DATA_DIR").map(|root| PathBuf::from(root).join(bot.slug())))
            .unwrap_or_else(|| PathBuf::from("bots").join(bot.slug()).join("data"));

        let targets_file = cli
            .targets
            .clone()
            .or_else(|| var(&format!("{}_TARGETS_FILE", prefix)).map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("bots").join(bot.slug()).join("targets.json"));

        let delivery_policy = match var("WATCHER_DELIVERY_POLICY") {
            Some(value) => value.parse().map_err(|_| SettingsError::Invalid {
                name: "WATCHER_DELIVERY_POLICY".to_string(),
                value,
            })?,
            None => DeliveryPolicy::default(),
        };

        let thb_to_chf = match var("BUDGET_THB_TO_CHF") {
            Some(value) => value
                .parse::<f64>()
                .ok()
                .filter(|rate| rate.is_finite() && *rate > 0.0)
                .ok_or_else(|| SettingsError::Invalid {
                    name: "BUDGET_THB_TO_CHF".to_string(),
                    value,
                })?,
            None => DEFAULT_THB_TO_CHF,
        };

        // The budget bot has its own receiving bot; the others share one.
        let lookup_order = |suffix: &str| -> [String; 2] {
            let shared = format!("TELEGRAM_{}", suffix);
            let own = format!("{}_TELEGRAM_{}", prefix, suffix);
            if bot == BotKind::Budget {
                [own, shared]
            } else {
                [shared, own]
            }
        };
        let first_set = |names: [String; 2]| -> Result<String, String> {
            names
                .iter()
                .find_map(|name| var(name.as_str()))
                .ok_or_else(|| names[0].clone())
        };
        let token = first_set(lookup_order("BOT_TOKEN"));
        let chat_id = first_set(lookup_order("CHAT_ID"));

        let telegram = match (token, chat_id) {
            (Ok(token), Ok(chat_id)) => Some(TelegramCredentials { token, chat_id }),
            // The budget bot must poll its queue even when dry.
            _ if dry_run && bot != BotKind::Budget => None,
            (Err(name), _) | (_, Err(name)) => return Err(SettingsError::Missing(name)),
        };

        Ok(Self {
            bot,
            data_dir,
            targets_file,
            dry_run,
            delivery_policy,
            telegram,
            thb_to_chf,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_parse_bool_env() {
        for yes in ["1", "true", "YES", "y", " On "] {
            assert!(parse_bool_env(yes), "{}", yes);
        }
        for no in ["0", "false", "", "nope"] {
            assert!(!parse_bool_env(no), "{}", no);
        }
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::resolve(
            BotKind::ShopSale,
            &CliOverrides::default(),
            env(&[("TELEGRAM_BOT_TOKEN", "t"), ("TELEGRAM_CHAT_ID", "42")]),
        )
        .unwrap();

        assert_eq!(settings.data_dir, PathBuf::from("bots/shop-sale/data"));
        assert_eq!(settings.targets_file, PathBuf::from("bots/shop-sale/targets.json"));
        assert_eq!(settings.delivery_policy, DeliveryPolicy::ConfirmedSend);
        assert!(!settings.dry_run);
        assert_eq!(
            settings.telegram,
            Some(TelegramCredentials {
                token: "t".to_string(),
                chat_id: "42".to_string()
            })
        );
        assert_eq!(settings.thb_to_chf, DEFAULT_THB_TO_CHF);
    }

    #[test]
    fn test_data_dir_precedence() {
        let vars = [
            ("DRY_RUN", "1"),
            ("PRICE_DEAL_DATA_DIR", "/srv/deal"),
            ("WATCHER_DATA_DIR", "/srv/watch"),
        ];

        let from_cli = Settings::resolve(
            BotKind::PriceDeal,
            &CliOverrides {
                data_dir: Some(PathBuf::from("/tmp/cli")),
                ..Default::default()
            },
            env(&vars),
        )
        .unwrap();
        assert_eq!(from_cli.data_dir, PathBuf::from("/tmp/cli"));

        let from_bot_var =
            Settings::resolve(BotKind::PriceDeal, &CliOverrides::default(), env(&vars)).unwrap();
        assert_eq!(from_bot_var.data_dir, PathBuf::from("/srv/deal"));

        let from_root = Settings::resolve(
            BotKind::PriceDeal,
            &CliOverrides::default(),
            env(&[("DRY_RUN", "1"), ("WATCHER_DATA_DIR", "/srv/watch")]),
        )
        .unwrap();
        assert_eq!(from_root.data_dir, PathBuf::from("/srv/watch/price-deal"));
    }

    #[test]
    fn test_targets_file_precedence() {
        let vars = [("DRY_RUN", "yes"), ("PRODUCT_SALE_TARGETS_FILE", "/etc/p.json")];
        let settings =
            Settings::resolve(BotKind::ProductSale, &CliOverrides::default(), env(&vars)).unwrap();
        assert_eq!(settings.targets_file, PathBuf::from("/etc/p.json"));

        let cli = CliOverrides {
            targets: Some(PathBuf::from("mine.json")),
            ..Default::default()
        };
        let settings = Settings::resolve(BotKind::ProductSale, &cli, env(&vars)).unwrap();
        assert_eq!(settings.targets_file, PathBuf::from("mine.json"));
    }

    #[test]
    fn test_shared_credentials_win_for_watchers() {
        let vars = [
            ("TELEGRAM_BOT_TOKEN", "shared"),
            ("SHOP_SALE_TELEGRAM_BOT_TOKEN", "own"),
            ("SHOP_SALE_TELEGRAM_CHAT_ID", "7"),
        ];
        let settings =
            Settings::resolve(BotKind::ShopSale, &CliOverrides::default(), env(&vars)).unwrap();
        let telegram = settings.telegram.unwrap();
        assert_eq!(telegram.token, "shared");
        assert_eq!(telegram.chat_id, "7");
    }

    #[test]
    fn test_budget_prefers_own_credentials() {
        let vars = [
            ("TELEGRAM_BOT_TOKEN", "shared"),
            ("TELEGRAM_CHAT_ID", "1"),
            ("BUDGET_TELEGRAM_BOT_TOKEN", "budget"),
        ];
        let settings =
            Settings::resolve(BotKind::Budget, &CliOverrides::default(), env(&vars)).unwrap();
        let telegram = settings.telegram.unwrap();
        assert_eq!(telegram.token, "budget");
        assert_eq!(telegram.chat_id, "1");
    }

    #[test]
    fn test_missing_credentials() {
        let err = Settings::resolve(
            BotKind::ShopSale,
            &CliOverrides::default(),
            env(&[("TELEGRAM_BOT_TOKEN", "t"), ("TELEGRAM_CHAT_ID", "  ")]),
        )
        .unwrap_err();
        assert_eq!(err, SettingsError::Missing("TELEGRAM_CHAT_ID".to_string()));

        // Dry run lifts the requirement for watchers, not for the budget bot.
        let dry = CliOverrides {
            dry_run: true,
            ..Default::default()
        };
        let settings = Settings::resolve(BotKind::ShopSale, &dry, env(&[])).unwrap();
        assert_eq!(settings.telegram, None);

        let err = Settings::resolve(BotKind::Budget, &dry, env(&[])).unwrap_err();
        assert_eq!(
            err,
            SettingsError::Missing("BUDGET_TELEGRAM_BOT_TOKEN".to_string())
        );
    }

    #[test]
    fn test_invalid_values() {
        let base = [("DRY_RUN", "1")];

        let err = Settings::resolve(
            BotKind::ShopSale,
            &CliOverrides::default(),
            env(&[base[0], ("WATCHER_DELIVERY_POLICY", "yolo")]),
        )
        .unwrap_err();
        assert!(matches!(err, SettingsError::Invalid { ref name, .. } if name == "WATCHER_DELIVERY_POLICY"));

        let settings = Settings::resolve(
            BotKind::ShopSale,
            &CliOverrides::default(),
            env(&[base[0], ("WATCHER_DELIVERY_POLICY", "best-effort")]),
        )
        .unwrap();
        assert_eq!(settings.delivery_policy, DeliveryPolicy::BestEffort);

        let err = Settings::resolve(
            BotKind::ShopSale,
            &CliOverrides::default(),
            env(&[base[0], ("BUDGET_THB_TO_CHF", "-1")]),
        )
        .unwrap_err();
        assert!(matches!(err, SettingsError::Invalid { ref name, .. } if name == "BUDGET_THB_TO_CHF"));
    }
}
